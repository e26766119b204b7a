use geo::{LineString, MultiPolygon, Polygon};
use serde_json::{Map, Value};

use crate::boundary::BoundaryFeature;

/// Reads a fixture from `tests/resources`.
pub fn load_resource(name: &str) -> Vec<u8> {
  let path = std::path::Path::new(env!("CARGO_MANIFEST_DIR"))
    .join("tests")
    .join("resources")
    .join(name);
  std::fs::read(&path).unwrap_or_else(|e| panic!("cannot read {}: {e}", path.display()))
}

/// Axis aligned square ring with its south west corner at `(lat, lon)`.
fn square_ring(lat: f64, lon: f64, size: f64) -> LineString<f64> {
  LineString::from(vec![
    (lon, lat),
    (lon + size, lat),
    (lon + size, lat + size),
    (lon, lat + size),
    (lon, lat),
  ])
}

pub struct FeatureBuilder {
  exterior: LineString<f64>,
  holes: Vec<LineString<f64>>,
  properties: Map<String, Value>,
}

impl FeatureBuilder {
  pub fn square(lat: f64, lon: f64, size: f64) -> Self {
    Self {
      exterior: square_ring(lat, lon, size),
      holes: Vec::new(),
      properties: Map::new(),
    }
  }

  pub fn with_hole(mut self, lat: f64, lon: f64, size: f64) -> Self {
    self.holes.push(square_ring(lat, lon, size));
    self
  }

  pub fn with_property(mut self, key: &str, value: impl Into<Value>) -> Self {
    self.properties.insert(key.to_string(), value.into());
    self
  }

  pub fn named(self, key: &str, name: &str) -> Self {
    self.with_property(key, name)
  }

  pub fn build(self) -> BoundaryFeature {
    BoundaryFeature::new(
      MultiPolygon(vec![Polygon::new(self.exterior, self.holes)]),
      self.properties,
    )
  }
}
