use geo::BoundingRect;
use serde::{Deserialize, Serialize};

use super::WGS84Coordinate;

/// A lat/lon aligned bounding box, e.g. the bounds of a feature collection.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
  max_lon: f64,
  min_lon: f64,
  max_lat: f64,
  min_lat: f64,
}

impl Default for BoundingBox {
  fn default() -> Self {
    Self::new()
  }
}

impl BoundingBox {
  #[must_use]
  pub fn new() -> Self {
    Self::get_invalid()
  }

  #[must_use]
  pub fn get_invalid() -> Self {
    Self {
      max_lon: f64::MIN,
      min_lon: f64::MAX,
      max_lat: f64::MIN,
      min_lat: f64::MAX,
    }
  }

  pub fn from_iterator<I: IntoIterator<Item = WGS84Coordinate>>(positions: I) -> Self {
    let mut bb = Self::get_invalid();
    positions
      .into_iter()
      .for_each(|pos| bb.add_coordinate(pos));
    bb
  }

  /// The bounds of a `geo` geometry, invalid for empty geometries.
  pub fn of_geometry<G: BoundingRect<f64>>(geometry: &G) -> Self {
    let rect: Option<geo::Rect<f64>> = geometry.bounding_rect().into();
    rect.map_or_else(Self::get_invalid, |rect| {
      Self::from_iterator([
        WGS84Coordinate::from(rect.min()),
        WGS84Coordinate::from(rect.max()),
      ])
    })
  }

  #[must_use]
  pub fn center(&self) -> WGS84Coordinate {
    WGS84Coordinate {
      lat: f64::midpoint(self.max_lat, self.min_lat),
      lon: f64::midpoint(self.max_lon, self.min_lon),
    }
  }

  #[must_use]
  pub fn min(&self) -> WGS84Coordinate {
    WGS84Coordinate::new(self.min_lat, self.min_lon)
  }

  #[must_use]
  pub fn max(&self) -> WGS84Coordinate {
    WGS84Coordinate::new(self.max_lat, self.max_lon)
  }

  #[must_use]
  pub fn is_valid(&self) -> bool {
    self.min_lat <= self.max_lat && self.min_lon <= self.max_lon
  }

  pub fn add_coordinate(&mut self, coord: WGS84Coordinate) {
    self.min_lat = self.min_lat.min(coord.lat);
    self.min_lon = self.min_lon.min(coord.lon);
    self.max_lat = self.max_lat.max(coord.lat);
    self.max_lon = self.max_lon.max(coord.lon);
  }

  #[must_use]
  pub fn extend(self, bb: &Self) -> Self {
    if !self.is_valid() {
      return *bb;
    }

    if !bb.is_valid() {
      return self;
    }

    Self {
      min_lon: self.min_lon.min(bb.min_lon),
      min_lat: self.min_lat.min(bb.min_lat),
      max_lon: self.max_lon.max(bb.max_lon),
      max_lat: self.max_lat.max(bb.max_lat),
    }
  }

  #[must_use]
  pub fn width(&self) -> f64 {
    self.max_lon - self.min_lon
  }

  #[must_use]
  pub fn height(&self) -> f64 {
    self.max_lat - self.min_lat
  }

  /// Corners as `[lon, lat]` pairs, the envelope layout used by the R-tree.
  #[must_use]
  pub fn corners(&self) -> ([f64; 2], [f64; 2]) {
    ([self.min_lon, self.min_lat], [self.max_lon, self.max_lat])
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use geo::{LineString, Polygon};

  #[test]
  fn default_is_invalid() {
    assert!(!BoundingBox::default().is_valid());
  }

  #[test]
  fn from_coordinates() {
    let bb = BoundingBox::from_iterator([
      WGS84Coordinate::new(46.0, -97.0),
      WGS84Coordinate::new(47.0, -96.0),
    ]);
    assert!(bb.is_valid());
    assert_eq!(bb.center(), WGS84Coordinate::new(46.5, -96.5));
    assert!((bb.width() - 1.0).abs() < f64::EPSILON);
    assert!((bb.height() - 1.0).abs() < f64::EPSILON);
  }

  #[test]
  fn extend_ignores_invalid() {
    let bb = BoundingBox::from_iterator([WGS84Coordinate::new(1.0, 1.0)]);
    assert_eq!(bb.extend(&BoundingBox::default()), bb);
    assert_eq!(BoundingBox::default().extend(&bb), bb);

    let other = BoundingBox::from_iterator([WGS84Coordinate::new(-1.0, 3.0)]);
    let merged = bb.extend(&other);
    assert_eq!(merged.min(), WGS84Coordinate::new(-1.0, 1.0));
    assert_eq!(merged.max(), WGS84Coordinate::new(1.0, 3.0));
  }

  #[test]
  fn of_polygon() {
    let polygon = Polygon::new(
      LineString::from(vec![(0.0, 0.0), (2.0, 0.0), (2.0, 1.0), (0.0, 0.0)]),
      vec![],
    );
    let bb = BoundingBox::of_geometry(&polygon);
    assert_eq!(bb.min(), WGS84Coordinate::new(0.0, 0.0));
    assert_eq!(bb.max(), WGS84Coordinate::new(1.0, 2.0));
  }
}
