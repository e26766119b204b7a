use geo::{Intersects, Point};

use crate::{
  boundary::{BoundaryDataset, BoundaryFeature},
  map::coordinates::WGS84Coordinate,
};

/// Point in polygon test. Points on a boundary edge are contained.
#[must_use]
pub fn contains(point: WGS84Coordinate, feature: &BoundaryFeature) -> bool {
  let point: Point<f64> = point.into();
  feature.geometry.intersects(&point)
}

/// The first feature of `dataset` containing `coordinate`, in dataset order.
#[must_use]
pub fn resolve_feature(
  coordinate: WGS84Coordinate,
  dataset: &BoundaryDataset,
) -> Option<&BoundaryFeature> {
  dataset
    .candidates(coordinate)
    .into_iter()
    .map(|idx| &dataset.features()[idx])
    .find(|feature| contains(coordinate, feature))
}

/// Resolves `coordinate` to the `property` of the first containing feature. A missing dataset
/// resolves nothing.
#[must_use]
pub fn resolve(
  coordinate: WGS84Coordinate,
  dataset: Option<&BoundaryDataset>,
  property: &str,
) -> Option<String> {
  resolve_feature(coordinate, dataset?)?.property(property)
}
