use geo::MultiPolygon;
use serde::{Deserialize, Serialize};

use super::{
  coordinates::{BoundingBox, WGS84Coordinate},
  style::Style,
};

/// Identifies a polygon layer added to a surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct LayerHandle(pub u64);

/// Identifies a marker added to a surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct MarkerHandle(pub u64);

/// The marker classes drawn on the map.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum IconKind {
  /// The marker of the currently chosen location.
  Location,
  PollingLocation,
  HighlightedPollingLocation,
  PostOffice,
}

impl IconKind {
  #[must_use]
  pub fn name(&self) -> &'static str {
    match self {
      IconKind::Location => "Location",
      IconKind::PollingLocation => "Polling place",
      IconKind::HighlightedPollingLocation => "Polling place for selected precinct",
      IconKind::PostOffice => "Post office",
    }
  }
}

/// A square marker icon anchored at its bottom center.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Icon {
  pub kind: IconKind,
  pub size: f64,
}

impl Icon {
  #[must_use]
  pub fn new(kind: IconKind, size: f64) -> Self {
    Self { kind, size }
  }
}

/// One styled polygon of a layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PolygonShape {
  pub geometry: MultiPolygon<f64>,
  pub style: Style,
}

impl PolygonShape {
  #[must_use]
  pub fn new(geometry: MultiPolygon<f64>, style: Style) -> Self {
    Self { geometry, style }
  }
}

/// The rendering collaborator. Everything that ends up visible on the map goes through here;
/// how it is drawn is up to the implementation.
pub trait RenderSurface {
  /// Adds a layer of polygons on top of all existing layers.
  fn add_polygon_layer(&mut self, shapes: Vec<PolygonShape>) -> LayerHandle;
  /// Removing an unknown layer is a no-op.
  fn remove_layer(&mut self, handle: LayerHandle);
  /// Moves a layer above all others.
  fn bring_to_front(&mut self, handle: LayerHandle);
  fn add_marker(
    &mut self,
    coordinate: WGS84Coordinate,
    icon: Icon,
    popup: Option<String>,
  ) -> MarkerHandle;
  fn set_icon(&mut self, handle: MarkerHandle, icon: Icon);
  /// Removing an unknown marker is a no-op.
  fn remove_marker(&mut self, handle: MarkerHandle);
  fn fit_bounds(&mut self, bounds: BoundingBox);
  fn set_view(&mut self, center: WGS84Coordinate, zoom: f64);
  fn center(&self) -> WGS84Coordinate;
  fn zoom(&self) -> f64;
}
