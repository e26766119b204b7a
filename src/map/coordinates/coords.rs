use std::fmt::Display;

use geo::Point;
use serde::{Deserialize, Serialize};

/// Mean earth radius used by the spherical web mercator projection.
pub const EARTH_RADIUS: f64 = 6_378_137.0;

/// A geographic coordinate in degrees.
#[derive(Debug, PartialEq, Copy, Clone, Default, Serialize, Deserialize)]
pub struct WGS84Coordinate {
  pub lat: f64,
  pub lon: f64,
}

impl WGS84Coordinate {
  #[must_use]
  pub fn new(lat: f64, lon: f64) -> Self {
    Self { lat, lon }
  }

  /// Whether the coordinate lies within the valid latitude/longitude ranges.
  #[must_use]
  pub fn is_valid(&self) -> bool {
    (-90.0..=90.0).contains(&self.lat) && (-180.0..=180.0).contains(&self.lon)
  }
}

impl Display for WGS84Coordinate {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    write!(f, "{:.2}, {:.2}", self.lat, self.lon)
  }
}

/// `geo` points are `x = lon`, `y = lat`.
impl From<WGS84Coordinate> for Point<f64> {
  fn from(coord: WGS84Coordinate) -> Self {
    Point::new(coord.lon, coord.lat)
  }
}

impl From<geo::Coord<f64>> for WGS84Coordinate {
  fn from(coord: geo::Coord<f64>) -> Self {
    WGS84Coordinate {
      lat: coord.y,
      lon: coord.x,
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use assert_approx_eq::assert_approx_eq;

  #[test]
  fn coordinate_to_point_swaps_axes() {
    let coord = WGS84Coordinate::new(46.8772, -96.7898);
    let point = Point::from(coord);
    assert_approx_eq!(point.x(), -96.7898);
    assert_approx_eq!(point.y(), 46.8772);
    assert_eq!(WGS84Coordinate::from(point.0), coord);
  }

  #[test]
  fn validity() {
    assert!(WGS84Coordinate::new(46.9, -96.8).is_valid());
    assert!(!WGS84Coordinate::new(91.0, 0.0).is_valid());
    assert!(!WGS84Coordinate::new(0.0, -181.0).is_valid());
  }

  #[test]
  fn display_uses_two_decimals() {
    assert_eq!(
      WGS84Coordinate::new(46.877_2, -96.789_8).to_string(),
      "46.88, -96.79"
    );
  }
}
