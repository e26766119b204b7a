use std::fmt::Display;
use std::sync::Arc;

use async_trait::async_trait;
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{map::coordinates::WGS84Coordinate, panel::AddressDisplay};

mod coordinate_parser;
mod nominatim;

pub use coordinate_parser::CoordinateParser;
pub use nominatim::NominatimGeocoder;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GeocodeError {
  #[error("Geocoding request failed: {0}")]
  Transport(String),
  #[error("Could not decode geocoding response: {0}")]
  Decode(String),
}

/// Structured address of a reverse geocoding result.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AddressComponents {
  pub house_number: Option<String>,
  pub road: Option<String>,
  pub city: Option<String>,
  pub village: Option<String>,
  pub town: Option<String>,
  pub state: Option<String>,
  pub postcode: Option<String>,
}

impl AddressComponents {
  fn present(value: Option<&String>) -> Option<&str> {
    value.map(|v| v.trim()).filter(|v| !v.is_empty())
  }

  /// House number, road, city (or village, or town), state and postcode, skipping absent
  /// ones.
  fn parts(&self) -> Vec<&str> {
    let locality = Self::present(self.city.as_ref())
      .or_else(|| Self::present(self.village.as_ref()))
      .or_else(|| Self::present(self.town.as_ref()));
    [
      Self::present(self.house_number.as_ref()),
      Self::present(self.road.as_ref()),
      locality,
      Self::present(self.state.as_ref()),
      Self::present(self.postcode.as_ref()),
    ]
    .into_iter()
    .flatten()
    .collect()
  }

  #[must_use]
  pub fn is_empty(&self) -> bool {
    self.parts().is_empty()
  }
}

/// Joins the present address components, or "Address not found" if there are none.
#[must_use]
pub fn format_address(address: &AddressComponents) -> String {
  let parts = address.parts();
  if parts.is_empty() {
    crate::panel::ADDRESS_NOT_FOUND.to_string()
  } else {
    parts.join(", ")
  }
}

/// A location found by a search.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchResult {
  pub name: String,
  pub coordinate: WGS84Coordinate,
}

impl Display for SearchResult {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    write!(f, "{} ({})", self.name, self.coordinate)
  }
}

/// A geocoding service.
#[async_trait]
pub trait Geocoder: Send + Sync {
  fn name(&self) -> &str;

  async fn reverse(&self, coordinate: WGS84Coordinate)
  -> Result<AddressComponents, GeocodeError>;

  /// Locations matching `query`, best match first.
  async fn search(&self, query: &str) -> Result<Vec<SearchResult>, GeocodeError>;
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum GeocoderConfig {
  Nominatim { base_url: Option<String> },
  /// Addresses are never found, searches only accept coordinates.
  Disabled,
}

impl Default for GeocoderConfig {
  fn default() -> Self {
    Self::Nominatim { base_url: None }
  }
}

impl GeocoderConfig {
  #[must_use]
  pub fn build(&self) -> Option<Arc<dyn Geocoder>> {
    match self {
      GeocoderConfig::Nominatim { base_url } => {
        Some(Arc::new(NominatimGeocoder::new(base_url.clone())))
      }
      GeocoderConfig::Disabled => None,
    }
  }
}

/// Shorter queries are not searched.
pub const MIN_QUERY_LENGTH: usize = 2;

/// Resolves a search query. Coordinates are parsed locally, everything else goes to the
/// geocoder.
pub async fn search_location(
  parser: &CoordinateParser,
  geocoder: Option<&dyn Geocoder>,
  query: &str,
) -> Result<Option<SearchResult>, GeocodeError> {
  let query = query.trim();
  if query.chars().count() < MIN_QUERY_LENGTH {
    debug!("Ignoring search '{query}', shorter than {MIN_QUERY_LENGTH} characters");
    return Ok(None);
  }
  if let Some(result) = parser.parse_coordinate(query) {
    info!("Parsed coordinate input '{query}' as {}", result.coordinate);
    return Ok(Some(result));
  }
  let Some(geocoder) = geocoder else {
    return Ok(None);
  };
  debug!("Searching '{query}' with {}", geocoder.name());
  Ok(geocoder.search(query).await?.into_iter().next())
}

/// One issued geocoding operation. Only the latest generation may be applied.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeocodeRequest {
  pub generation: u64,
  pub coordinate: WGS84Coordinate,
}

/// Last request wins ordering for asynchronous lookups. Each request captures the generation
/// current when it was issued, and its result is only applied while that generation is still
/// the latest.
#[derive(Debug, Default)]
pub struct GeocodingGateway {
  latest: u64,
}

impl GeocodingGateway {
  #[must_use]
  pub fn new() -> Self {
    Self::default()
  }

  /// Starts a new generation, superseding any request in flight.
  pub fn next_generation(&mut self) -> u64 {
    self.latest += 1;
    self.latest
  }

  /// Issues a reverse geocoding request for `coordinate`.
  pub fn issue(&mut self, coordinate: WGS84Coordinate) -> GeocodeRequest {
    GeocodeRequest {
      generation: self.next_generation(),
      coordinate,
    }
  }

  /// Supersedes the request in flight without issuing a new one.
  pub fn cancel(&mut self) {
    self.next_generation();
  }

  #[must_use]
  pub fn is_current(&self, generation: u64) -> bool {
    generation == self.latest
  }

  /// The address display for a finished request, or `None` if it was superseded.
  #[must_use]
  pub fn complete(
    &self,
    request: &GeocodeRequest,
    outcome: Result<AddressComponents, GeocodeError>,
  ) -> Option<AddressDisplay> {
    if !self.is_current(request.generation) {
      debug!(
        "Discarding superseded address for {} (generation {}, latest {})",
        request.coordinate, request.generation, self.latest
      );
      return None;
    }
    Some(match outcome {
      Ok(address) if address.is_empty() => AddressDisplay::NotFound,
      Ok(address) => AddressDisplay::Found(format_address(&address)),
      Err(e) => {
        warn!("Reverse geocoding of {} failed: {e}", request.coordinate);
        AddressDisplay::NotFound
      }
    })
  }
}
