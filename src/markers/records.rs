use itertools::Itertools;
use log::warn;
use proj4rs::{proj::Proj, transform::transform};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::{boundary::DataLoadError, map::coordinates::WGS84Coordinate};

/// A symbol layer record that cannot be placed on the map.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Invalid {layer} record {index}: {reason}")]
pub struct InvalidRecord {
  pub layer: &'static str,
  pub index: usize,
  pub reason: String,
}

#[derive(Error, Debug)]
#[error("Cannot build projection: {0}")]
pub struct ProjectionError(String);

/// Text of a loosely typed field. Numbers are formatted, null and missing fields are empty.
fn text(value: Option<&Value>) -> String {
  match value {
    Some(Value::String(s)) => s.trim().to_string(),
    Some(Value::Number(n)) => n.to_string(),
    Some(Value::Bool(b)) => b.to_string(),
    _ => String::new(),
  }
}

/// A number that may also come as a numeric string.
fn number(value: Option<&Value>) -> Option<f64> {
  match value? {
    Value::Number(n) => n.as_f64(),
    Value::String(s) => s.trim().parse().ok(),
    _ => None,
  }
}

fn parse_records(layer: &'static str, data: &[u8]) -> Result<Vec<Value>, DataLoadError> {
  serde_json::from_slice(data).map_err(|source| DataLoadError::Json {
    layer: layer.to_string(),
    source,
  })
}

/// Keeps the valid records, logging every skipped one.
fn keep_valid<T>(records: impl Iterator<Item = Result<T, InvalidRecord>>) -> Vec<T> {
  records
    .filter_map(|record| record.inspect_err(|e| warn!("Skipping record: {e}")).ok())
    .collect()
}

/// A polling place and the precincts it serves.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PollingLocation {
  pub coordinate: WGS84Coordinate,
  pub precincts: Vec<String>,
  pub county: String,
  pub name: String,
  pub address: String,
  pub city: String,
  pub zip_code: String,
  pub polling_hours: String,
}

impl PollingLocation {
  const LAYER: &'static str = "polling location";

  fn from_value(index: usize, value: &Value) -> Result<Self, InvalidRecord> {
    let invalid = |reason: &str| InvalidRecord {
      layer: Self::LAYER,
      index,
      reason: reason.to_string(),
    };
    let record = value.as_object().ok_or_else(|| invalid("not an object"))?;
    let lat = number(record.get("latitude")).ok_or_else(|| invalid("missing latitude"))?;
    let lon = number(record.get("longitude")).ok_or_else(|| invalid("missing longitude"))?;
    let coordinate = WGS84Coordinate::new(lat, lon);
    if !coordinate.is_valid() {
      return Err(invalid("coordinate out of range"));
    }

    Ok(Self {
      coordinate,
      precincts: split_precincts(&text(record.get("Precincts_list"))),
      county: text(record.get("County")),
      name: text(record.get("PollingLocation")),
      address: text(record.get("Address")),
      city: text(record.get("City")),
      zip_code: text(record.get("ZipCode")),
      polling_hours: text(record.get("PollingHours")),
    })
  }

  #[must_use]
  pub fn popup(&self) -> String {
    format!(
      "County: {}\nPolling Location: {}\nAddress: {}\nCity: {}\nZip Code: {}\nPolling Hours: {}",
      self.county, self.name, self.address, self.city, self.zip_code, self.polling_hours
    )
  }
}

/// Splits a comma separated precinct list. Repeated precincts are kept once, in first-seen
/// order.
#[must_use]
pub fn split_precincts(list: &str) -> Vec<String> {
  list
    .split(',')
    .map(str::trim)
    .filter(|p| !p.is_empty())
    .unique()
    .map(ToString::to_string)
    .collect()
}

/// Parses the polling location list. Records without a usable coordinate are skipped.
pub fn parse_polling_locations(data: &[u8]) -> Result<Vec<PollingLocation>, DataLoadError> {
  let records = parse_records("polling_locations", data)?;
  Ok(keep_valid(
    records
      .iter()
      .enumerate()
      .map(|(index, value)| PollingLocation::from_value(index, value)),
  ))
}

/// Reprojects spherical web mercator (EPSG:3857) meters to WGS84 degrees.
pub struct WebMercatorProjection {
  from: Proj,
  to: Proj,
}

impl WebMercatorProjection {
  const WEB_MERCATOR: &'static str = "+proj=merc +a=6378137 +b=6378137 +lat_ts=0 +lon_0=0 +x_0=0 +y_0=0 +k=1 +units=m +no_defs";
  const WGS84: &'static str = "+proj=longlat +datum=WGS84 +no_defs";

  pub fn new() -> Result<Self, ProjectionError> {
    Self::between(Self::WEB_MERCATOR, Self::WGS84)
  }

  fn between(from: &str, to: &str) -> Result<Self, ProjectionError> {
    let build = |definition: &str| {
      Proj::from_proj_string(definition)
        .map_err(|e| ProjectionError(format!("{definition}: {e}")))
    };
    Ok(Self {
      from: build(from)?,
      to: build(to)?,
    })
  }

  #[must_use]
  pub fn to_wgs84(&self, x: f64, y: f64) -> Option<WGS84Coordinate> {
    let mut point = (x, y, 0.0);
    transform(&self.from, &self.to, &mut point).ok()?;
    // Geographic output is in radians.
    Some(WGS84Coordinate::new(point.1.to_degrees(), point.0.to_degrees()))
      .filter(WGS84Coordinate::is_valid)
  }
}

/// A post office, already in geographic coordinates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PostOffice {
  pub coordinate: WGS84Coordinate,
  pub address: String,
}

impl PostOffice {
  const LAYER: &'static str = "post office";

  fn from_value(
    index: usize,
    value: &Value,
    projection: &WebMercatorProjection,
  ) -> Result<Self, InvalidRecord> {
    let invalid = |reason: &str| InvalidRecord {
      layer: Self::LAYER,
      index,
      reason: reason.to_string(),
    };
    let record = value.as_object().ok_or_else(|| invalid("not an object"))?;
    let x = number(record.get("x")).ok_or_else(|| invalid("missing x"))?;
    let y = number(record.get("y")).ok_or_else(|| invalid("missing y"))?;
    let coordinate = projection
      .to_wgs84(x, y)
      .ok_or_else(|| invalid("coordinate cannot be reprojected"))?;
    Ok(Self {
      coordinate,
      address: text(record.get("ADDRESS")),
    })
  }
}

/// Parses the post office list, reprojecting each record from web mercator.
pub fn parse_post_offices(data: &[u8]) -> Result<Vec<PostOffice>, DataLoadError> {
  let records = parse_records("post_offices", data)?;
  let projection =
    WebMercatorProjection::new().map_err(|source| DataLoadError::Projection {
      layer: "post_offices".to_string(),
      source,
    })?;
  Ok(keep_valid(records.iter().enumerate().map(|(index, value)| {
    PostOffice::from_value(index, value, &projection)
  })))
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::test_utils::load_resource;
  use assert_approx_eq::assert_approx_eq;
  use rstest::rstest;

  #[rstest]
  #[case("Fargo 2, Fargo 1", &["Fargo 2", "Fargo 1"])]
  #[case("101", &["101"])]
  #[case(" A ,, B ", &["A", "B"])]
  #[case("", &[])]
  #[case("A, B, A,B", &["A", "B"])]
  fn precinct_lists(#[case] list: &str, #[case] expected: &[&str]) {
    assert_eq!(split_precincts(list), expected);
  }

  #[test]
  fn polling_locations_skip_invalid_records() {
    let locations = parse_polling_locations(&load_resource("polling_locations.json")).unwrap();
    assert_eq!(locations.len(), 4);

    let civic = &locations[0];
    assert_eq!(civic.precincts, ["Fargo 2", "Fargo 1"]);
    assert_eq!(civic.zip_code, "58102");
    assert!(civic.popup().contains("Polling Location: Civic Center"));

    assert_eq!(locations[3].precincts, ["101"]);
  }

  #[test]
  fn numeric_strings_are_coordinates() {
    let locations = parse_polling_locations(
      br#"[{"latitude": "46.9", "longitude": "-96.8", "Precincts_list": "A"},
           {"latitude": 95, "longitude": 0},
           "garbage"]"#,
    )
    .unwrap();
    assert_eq!(locations.len(), 1);
    assert_eq!(locations[0].coordinate, WGS84Coordinate::new(46.9, -96.8));
  }

  #[test]
  fn non_list_is_a_load_error() {
    assert!(parse_polling_locations(b"{").is_err());
  }

  #[test]
  fn web_mercator_to_wgs84() {
    let projection = WebMercatorProjection::new().unwrap();
    let coordinate = projection.to_wgs84(-10_774_613.514, 5_922_020.400).unwrap();
    assert_approx_eq!(coordinate.lat, 46.877, 1e-6);
    assert_approx_eq!(coordinate.lon, -96.79, 1e-6);

    let origin = projection.to_wgs84(0., 0.).unwrap();
    assert_approx_eq!(origin.lat, 0., 1e-9);
    assert_approx_eq!(origin.lon, 0., 1e-9);
  }

  #[test]
  fn unknown_projection_is_a_projection_error() {
    let Err(source) = WebMercatorProjection::between("+proj=no_such_projection", "+proj=longlat")
    else {
      panic!("unknown projection was accepted");
    };
    let error = DataLoadError::Projection {
      layer: "post_offices".to_string(),
      source,
    };
    assert!(error.to_string().starts_with("Cannot reproject post_offices data"));
    assert!(std::error::Error::source(&error).is_some());
  }

  #[test]
  fn post_offices_are_reprojected() {
    let offices = parse_post_offices(&load_resource("post_offices.json")).unwrap();
    assert_eq!(offices.len(), 2);
    assert_approx_eq!(offices[0].coordinate.lat, 46.877, 1e-5);
    assert_approx_eq!(offices[0].coordinate.lon, -96.79, 1e-5);
    assert_eq!(offices[1].address, "220 E Rosser Ave, Bismarck");
  }
}
