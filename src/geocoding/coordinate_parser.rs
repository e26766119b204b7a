use regex::Regex;

use super::SearchResult;
use crate::map::coordinates::WGS84Coordinate;

/// Parses coordinate literals typed into the search box.
pub struct CoordinateParser {
  decimal_regex: Regex,
  dms_regex: Regex,
}

impl Default for CoordinateParser {
  fn default() -> Self {
    Self::new()
  }
}

impl CoordinateParser {
  #[must_use]
  pub fn new() -> Self {
    Self {
      // "46.87, -96.79", "46.87,-96.79" or "46.87 -96.79"
      decimal_regex: Regex::new(r"^\s*(-?\d+\.?\d*)\s*[,\s]\s*(-?\d+\.?\d*)\s*$").unwrap(),
      // "46°52'N 96°47'W", optionally with seconds and a comma
      dms_regex: Regex::new(
        r#"^\s*(\d+)°\s*(\d+)'\s*(?:(\d+(?:\.\d+)?)"\s*)?([NS])\s*[,\s]\s*(\d+)°\s*(\d+)'\s*(?:(\d+(?:\.\d+)?)"\s*)?([EW])\s*$"#,
      )
      .unwrap(),
    }
  }

  /// Decimal degrees are tried before degrees/minutes/seconds.
  #[must_use]
  pub fn parse_coordinate(&self, input: &str) -> Option<SearchResult> {
    let coordinate = self.parse_decimal(input).or_else(|| self.parse_dms(input))?;
    Some(SearchResult {
      name: format!("{:.4}°, {:.4}°", coordinate.lat, coordinate.lon),
      coordinate,
    })
  }

  fn parse_decimal(&self, input: &str) -> Option<WGS84Coordinate> {
    let caps = self.decimal_regex.captures(input)?;
    let lat: f64 = caps.get(1)?.as_str().parse().ok()?;
    let lon: f64 = caps.get(2)?.as_str().parse().ok()?;
    Some(WGS84Coordinate::new(lat, lon)).filter(WGS84Coordinate::is_valid)
  }

  fn parse_dms(&self, input: &str) -> Option<WGS84Coordinate> {
    let caps = self.dms_regex.captures(input)?;
    let part = |idx: usize| -> Option<f64> {
      caps
        .get(idx)
        .map_or(Some(0.), |m| m.as_str().parse().ok())
    };

    let mut lat = part(1)? + part(2)? / 60. + part(3)? / 3600.;
    let mut lon = part(5)? + part(6)? / 60. + part(7)? / 3600.;
    if caps.get(4)?.as_str() == "S" {
      lat = -lat;
    }
    if caps.get(8)?.as_str() == "W" {
      lon = -lon;
    }
    Some(WGS84Coordinate::new(lat, lon)).filter(WGS84Coordinate::is_valid)
  }
}
