use async_trait::async_trait;
use log::debug;
use serde::Deserialize;
use serde::de::DeserializeOwned;

use super::{AddressComponents, GeocodeError, Geocoder, SearchResult};
use crate::map::coordinates::WGS84Coordinate;

const DEFAULT_BASE_URL: &str = "https://nominatim.openstreetmap.org";
const USER_AGENT: &str = concat!(
  "precinct-map/",
  env!("CARGO_PKG_VERSION"),
  " (reverse geocoding of map clicks)"
);

#[derive(Debug, Deserialize)]
struct ReverseResponse {
  #[serde(default)]
  address: AddressComponents,
}

#[derive(Debug, Deserialize)]
struct SearchItem {
  lat: String,
  lon: String,
  display_name: String,
}

impl SearchItem {
  fn into_result(self) -> Option<SearchResult> {
    let coordinate = WGS84Coordinate::new(self.lat.parse().ok()?, self.lon.parse().ok()?);
    Some(SearchResult {
      name: self.display_name,
      coordinate,
    })
  }
}

/// OpenStreetMap Nominatim.
#[derive(Debug)]
pub struct NominatimGeocoder {
  base_url: String,
  client: surf::Client,
}

impl NominatimGeocoder {
  #[must_use]
  pub fn new(base_url: Option<String>) -> Self {
    Self {
      base_url: base_url
        .unwrap_or_else(|| DEFAULT_BASE_URL.to_string())
        .trim_end_matches('/')
        .to_string(),
      client: surf::Client::new(),
    }
  }

  fn reverse_url(&self, coordinate: WGS84Coordinate) -> String {
    format!(
      "{}/reverse?format=jsonv2&lat={}&lon={}&addressdetails=1",
      self.base_url, coordinate.lat, coordinate.lon
    )
  }

  fn search_url(&self, query: &str) -> String {
    format!(
      "{}/search?format=json&limit=5&q={}",
      self.base_url,
      urlencoding::encode(query)
    )
  }

  async fn get_json<T: DeserializeOwned>(&self, url: &str) -> Result<T, GeocodeError> {
    debug!("Requesting {url}");
    let mut response = self
      .client
      .get(url)
      .header("User-Agent", USER_AGENT)
      .send()
      .await
      .map_err(|e| GeocodeError::Transport(e.to_string()))?;
    if !response.status().is_success() {
      return Err(GeocodeError::Transport(format!(
        "status {}",
        response.status()
      )));
    }
    response
      .body_json::<T>()
      .await
      .map_err(|e| GeocodeError::Decode(e.to_string()))
  }
}

#[async_trait]
impl Geocoder for NominatimGeocoder {
  fn name(&self) -> &'static str {
    "OpenStreetMap Nominatim"
  }

  async fn reverse(
    &self,
    coordinate: WGS84Coordinate,
  ) -> Result<AddressComponents, GeocodeError> {
    // Points nominatim cannot place come back as `{"error": ...}` without an address.
    let response: ReverseResponse = self.get_json(&self.reverse_url(coordinate)).await?;
    Ok(response.address)
  }

  async fn search(&self, query: &str) -> Result<Vec<SearchResult>, GeocodeError> {
    let items: Vec<SearchItem> = self.get_json(&self.search_url(query)).await?;
    Ok(items.into_iter().filter_map(SearchItem::into_result).collect())
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn urls() {
    let geocoder = NominatimGeocoder::new(Some("http://localhost:8080/".to_string()));
    assert_eq!(
      geocoder.reverse_url(WGS84Coordinate::new(46.5, -96.25)),
      "http://localhost:8080/reverse?format=jsonv2&lat=46.5&lon=-96.25&addressdetails=1"
    );
    assert_eq!(
      geocoder.search_url("Fargo, ND"),
      "http://localhost:8080/search?format=json&limit=5&q=Fargo%2C%20ND"
    );
  }

  #[test]
  fn decode_reverse_response() {
    let response: ReverseResponse = serde_json::from_str(
      r#"{"place_id": 1, "address": {"road": "Main Ave", "city": "Fargo",
          "state": "North Dakota", "postcode": "58103", "country": "United States"}}"#,
    )
    .unwrap();
    assert_eq!(response.address.road.as_deref(), Some("Main Ave"));

    let error: ReverseResponse = serde_json::from_str(r#"{"error": "Unable to geocode"}"#).unwrap();
    assert!(error.address.is_empty());
  }

  #[test]
  fn decode_search_items() {
    let items: Vec<SearchItem> = serde_json::from_str(
      r#"[{"lat": "46.877", "lon": "-96.789", "display_name": "Fargo"},
          {"lat": "x", "lon": "1", "display_name": "Broken"}]"#,
    )
    .unwrap();
    let results: Vec<_> = items.into_iter().filter_map(SearchItem::into_result).collect();
    assert_eq!(results.len(), 1);
    assert_eq!(results[0].name, "Fargo");
  }
}
