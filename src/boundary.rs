use std::collections::HashMap;
use std::fmt::Display;
use std::sync::Arc;

use geo::MultiPolygon;
use log::{error, info};
use rstar::{AABB, RTree, RTreeObject};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

use crate::{
  datasource::{DataSource, TransportError},
  map::coordinates::{BoundingBox, WGS84Coordinate},
  markers::ProjectionError,
};

/// Parsing of `GeoJSON` feature collections.
mod geojson;
pub use geojson::parse_feature_collection;

#[derive(Error, Debug)]
pub enum DataLoadError {
  #[error("Failed to fetch {layer} data: {source}")]
  Transport {
    layer: String,
    #[source]
    source: TransportError,
  },
  #[error("{layer} data is not valid JSON: {source}")]
  Json {
    layer: String,
    #[source]
    source: serde_json::Error,
  },
  #[error("{layer} data is not a feature collection: {reason}")]
  NotAFeatureCollection { layer: String, reason: String },
  #[error("Cannot reproject {layer} data: {source}")]
  Projection {
    layer: String,
    #[source]
    source: ProjectionError,
  },
}

/// The polygon datasets the map resolves clicks against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BoundaryLayer {
  County,
  Legislative,
  Tribal,
  Precinct,
}

impl BoundaryLayer {
  /// The property that names a feature of this layer.
  #[must_use]
  pub fn identifier_property(&self) -> &'static str {
    match self {
      BoundaryLayer::County | BoundaryLayer::Tribal => "NAME",
      BoundaryLayer::Legislative => "DISTRICT",
      BoundaryLayer::Precinct => "Name",
    }
  }

  #[must_use]
  pub fn name(&self) -> &'static str {
    match self {
      BoundaryLayer::County => "county",
      BoundaryLayer::Legislative => "legislative",
      BoundaryLayer::Tribal => "tribal",
      BoundaryLayer::Precinct => "precinct",
    }
  }
}

impl Display for BoundaryLayer {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    write!(f, "{}", self.name())
  }
}

/// A polygon feature with its property bag.
#[derive(Debug, Clone, PartialEq)]
pub struct BoundaryFeature {
  pub geometry: MultiPolygon<f64>,
  pub properties: Map<String, Value>,
  bounds: BoundingBox,
}

impl BoundaryFeature {
  #[must_use]
  pub fn new(geometry: MultiPolygon<f64>, properties: Map<String, Value>) -> Self {
    let bounds = BoundingBox::of_geometry(&geometry);
    Self {
      geometry,
      properties,
      bounds,
    }
  }

  /// A property as text. Numbers are formatted, everything but strings and numbers is absent.
  #[must_use]
  pub fn property(&self, name: &str) -> Option<String> {
    match self.properties.get(name)? {
      Value::String(s) => Some(s.clone()),
      Value::Number(n) => Some(n.to_string()),
      _ => None,
    }
  }

  #[must_use]
  pub fn bounds(&self) -> BoundingBox {
    self.bounds
  }
}

/// R-tree entry pointing back at a feature by its position in the dataset.
#[derive(Debug, Clone)]
struct FeatureEnvelope {
  idx: usize,
  bounds: BoundingBox,
}

impl RTreeObject for FeatureEnvelope {
  type Envelope = AABB<[f64; 2]>;

  fn envelope(&self) -> Self::Envelope {
    let (min, max) = self.bounds.corners();
    AABB::from_corners(min, max)
  }
}

/// An immutable collection of polygon features for one layer. Feature order is the order of the
/// source collection.
#[derive(Debug)]
pub struct BoundaryDataset {
  layer: BoundaryLayer,
  features: Vec<BoundaryFeature>,
  index: RTree<FeatureEnvelope>,
}

impl BoundaryDataset {
  #[must_use]
  pub fn new(layer: BoundaryLayer, features: Vec<BoundaryFeature>) -> Self {
    let index = RTree::bulk_load(
      features
        .iter()
        .enumerate()
        .filter(|(_, f)| f.bounds.is_valid())
        .map(|(idx, f)| FeatureEnvelope {
          idx,
          bounds: f.bounds,
        })
        .collect(),
    );
    Self {
      layer,
      features,
      index,
    }
  }

  #[must_use]
  pub fn layer(&self) -> BoundaryLayer {
    self.layer
  }

  #[must_use]
  pub fn features(&self) -> &[BoundaryFeature] {
    &self.features
  }

  #[must_use]
  pub fn len(&self) -> usize {
    self.features.len()
  }

  #[must_use]
  pub fn is_empty(&self) -> bool {
    self.features.is_empty()
  }

  /// Indices of the features whose bounds contain `coordinate`, in dataset order.
  #[must_use]
  pub fn candidates(&self, coordinate: WGS84Coordinate) -> Vec<usize> {
    let mut candidates: Vec<usize> = self
      .index
      .locate_in_envelope_intersecting(&AABB::from_point([coordinate.lon, coordinate.lat]))
      .map(|e| e.idx)
      .collect();
    candidates.sort_unstable();
    candidates
  }

  /// The first feature whose `property` equals `value`.
  #[must_use]
  pub fn feature_by_property(&self, property: &str, value: &str) -> Option<&BoundaryFeature> {
    self
      .features
      .iter()
      .find(|f| f.property(property).as_deref() == Some(value))
  }

  /// The bounds of all features.
  #[must_use]
  pub fn bounds(&self) -> BoundingBox {
    self
      .features
      .iter()
      .fold(BoundingBox::default(), |acc, f| acc.extend(&f.bounds))
  }
}

/// Holds the loaded boundary datasets. A layer that failed to load is simply absent.
#[derive(Debug, Default)]
pub struct BoundaryStore {
  datasets: HashMap<BoundaryLayer, Arc<BoundaryDataset>>,
}

impl BoundaryStore {
  #[must_use]
  pub fn new() -> Self {
    Self::default()
  }

  /// Fetches and parses one layer. On success the layer's dataset is replaced wholesale, on
  /// failure the layer is left empty.
  pub async fn load(
    &mut self,
    source: &dyn DataSource,
    layer: BoundaryLayer,
    location: &str,
  ) -> Result<Arc<BoundaryDataset>, DataLoadError> {
    let result = async {
      let data = source
        .get(location)
        .await
        .map_err(|source| DataLoadError::Transport {
          layer: layer.to_string(),
          source,
        })?;
      parse_feature_collection(layer, &data)
    }
    .await;

    match result {
      Ok(dataset) => {
        info!("Loaded {layer} layer with {} features", dataset.len());
        let dataset = Arc::new(dataset);
        self.datasets.insert(layer, dataset.clone());
        Ok(dataset)
      }
      Err(e) => {
        error!("Error loading {layer} layer: {e}");
        self.datasets.remove(&layer);
        Err(e)
      }
    }
  }

  pub fn insert(&mut self, dataset: BoundaryDataset) {
    self.datasets.insert(dataset.layer(), Arc::new(dataset));
  }

  #[must_use]
  pub fn dataset(&self, layer: BoundaryLayer) -> Option<&BoundaryDataset> {
    self.datasets.get(&layer).map(AsRef::as_ref)
  }

  #[must_use]
  pub fn is_loaded(&self, layer: BoundaryLayer) -> bool {
    self.datasets.contains_key(&layer)
  }

  /// Exact match lookup on the layer's identifying property, used for selector driven selection.
  #[must_use]
  pub fn get_feature_by_identifier(
    &self,
    layer: BoundaryLayer,
    value: &str,
  ) -> Option<&BoundaryFeature> {
    self
      .dataset(layer)?
      .feature_by_property(layer.identifier_property(), value)
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::{datasource::MemoryDataSource, test_utils::*};

  #[test]
  fn property_formats_numbers() {
    let feature = FeatureBuilder::square(0., 0., 1.)
      .with_property("DISTRICT", 27)
      .with_property("NAME", "Cass")
      .with_property("flag", true)
      .build();
    assert_eq!(feature.property("DISTRICT").as_deref(), Some("27"));
    assert_eq!(feature.property("NAME").as_deref(), Some("Cass"));
    assert_eq!(feature.property("flag"), None);
    assert_eq!(feature.property("missing"), None);
  }

  #[test]
  fn candidates_are_in_dataset_order() {
    let dataset = BoundaryDataset::new(
      BoundaryLayer::County,
      vec![
        FeatureBuilder::square(0., 0., 10.).named("NAME", "Big").build(),
        FeatureBuilder::square(20., 20., 1.).named("NAME", "Far").build(),
        FeatureBuilder::square(1., 1., 2.).named("NAME", "Small").build(),
      ],
    );
    assert_eq!(
      dataset.candidates(WGS84Coordinate::new(2., 2.)),
      vec![0, 2]
    );
    assert!(dataset.candidates(WGS84Coordinate::new(50., 50.)).is_empty());
  }

  #[test]
  fn dataset_bounds_cover_all_features() {
    let dataset = BoundaryDataset::new(
      BoundaryLayer::County,
      vec![
        FeatureBuilder::square(0., 0., 1.).build(),
        FeatureBuilder::square(5., 5., 1.).build(),
      ],
    );
    let bounds = dataset.bounds();
    assert_eq!(bounds.min(), WGS84Coordinate::new(0., 0.));
    assert_eq!(bounds.max(), WGS84Coordinate::new(6., 6.));
  }

  #[tokio::test]
  async fn failed_layer_loads_independently() {
    let source = MemoryDataSource::new()
      .with_entry("county.geojson", load_resource("counties.geojson"))
      .with_entry("precinct.geojson", "not json");

    let mut store = BoundaryStore::new();
    assert!(
      store
        .load(&source, BoundaryLayer::County, "county.geojson")
        .await
        .is_ok()
    );
    assert!(matches!(
      store
        .load(&source, BoundaryLayer::Precinct, "precinct.geojson")
        .await,
      Err(DataLoadError::Json { .. })
    ));
    assert!(matches!(
      store
        .load(&source, BoundaryLayer::Legislative, "missing.geojson")
        .await,
      Err(DataLoadError::Transport { .. })
    ));

    assert!(store.is_loaded(BoundaryLayer::County));
    assert!(!store.is_loaded(BoundaryLayer::Precinct));
    assert!(!store.is_loaded(BoundaryLayer::Legislative));
  }

  #[tokio::test]
  async fn lookup_by_identifier() {
    let source =
      MemoryDataSource::new().with_entry("county.geojson", load_resource("counties.geojson"));
    let mut store = BoundaryStore::new();
    let _ = store
      .load(&source, BoundaryLayer::County, "county.geojson")
      .await;

    let cass = store.get_feature_by_identifier(BoundaryLayer::County, "Cass");
    assert_eq!(
      cass.and_then(|f| f.property("NAME")).as_deref(),
      Some("Cass")
    );
    assert!(
      store
        .get_feature_by_identifier(BoundaryLayer::County, "Atlantis")
        .is_none()
    );
    assert!(
      store
        .get_feature_by_identifier(BoundaryLayer::Tribal, "Cass")
        .is_none()
    );
  }
}
