use std::{collections::BTreeMap, sync::Arc};

use log::trace;
use serde::{Deserialize, Serialize};

use super::{
  coordinates::{BoundingBox, WGS84Coordinate},
  surface::{Icon, LayerHandle, MarkerHandle, PolygonShape, RenderSurface},
};

pub const MIN_ZOOM: f64 = 0.;
pub const MAX_ZOOM: f64 = 19.;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SceneLayer {
  pub handle: LayerHandle,
  pub shapes: Vec<PolygonShape>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SceneMarker {
  pub handle: MarkerHandle,
  pub coordinate: WGS84Coordinate,
  pub icon: Icon,
  pub popup: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct View {
  pub center: WGS84Coordinate,
  pub zoom: f64,
}

/// A retained-mode `RenderSurface`: it keeps what is on the map so a client can fetch and draw
/// it. Layers are stored bottom to top and shared between clones.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Scene {
  layers: Vec<Arc<SceneLayer>>,
  markers: BTreeMap<MarkerHandle, SceneMarker>,
  view: View,
  next_handle: u64,
}

impl Scene {
  #[must_use]
  pub fn new(center: WGS84Coordinate, zoom: f64) -> Self {
    Self {
      layers: Vec::new(),
      markers: BTreeMap::new(),
      view: View {
        center,
        zoom: zoom.clamp(MIN_ZOOM, MAX_ZOOM),
      },
      next_handle: 1,
    }
  }

  fn next_handle(&mut self) -> u64 {
    let id = self.next_handle;
    self.next_handle += 1;
    id
  }

  /// Layers from bottom to top.
  pub fn layers(&self) -> impl DoubleEndedIterator<Item = &SceneLayer> {
    self.layers.iter().map(AsRef::as_ref)
  }

  #[must_use]
  pub fn layer(&self, handle: LayerHandle) -> Option<&SceneLayer> {
    self.layers().find(|l| l.handle == handle)
  }

  #[must_use]
  pub fn layer_count(&self) -> usize {
    self.layers.len()
  }

  #[must_use]
  pub fn marker(&self, handle: MarkerHandle) -> Option<&SceneMarker> {
    self.markers.get(&handle)
  }

  pub fn markers(&self) -> impl Iterator<Item = &SceneMarker> {
    self.markers.values()
  }

  #[must_use]
  pub fn view(&self) -> View {
    self.view
  }
}

impl Default for Scene {
  fn default() -> Self {
    Self::new(WGS84Coordinate::default(), MIN_ZOOM)
  }
}

impl RenderSurface for Scene {
  fn add_polygon_layer(&mut self, shapes: Vec<PolygonShape>) -> LayerHandle {
    let handle = LayerHandle(self.next_handle());
    trace!("Adding layer {handle:?} with {} shapes", shapes.len());
    self.layers.push(Arc::new(SceneLayer { handle, shapes }));
    handle
  }

  fn remove_layer(&mut self, handle: LayerHandle) {
    self.layers.retain(|l| l.handle != handle);
  }

  fn bring_to_front(&mut self, handle: LayerHandle) {
    if let Some(idx) = self.layers.iter().position(|l| l.handle == handle) {
      let layer = self.layers.remove(idx);
      self.layers.push(layer);
    }
  }

  fn add_marker(
    &mut self,
    coordinate: WGS84Coordinate,
    icon: Icon,
    popup: Option<String>,
  ) -> MarkerHandle {
    let handle = MarkerHandle(self.next_handle());
    self.markers.insert(
      handle,
      SceneMarker {
        handle,
        coordinate,
        icon,
        popup,
      },
    );
    handle
  }

  fn set_icon(&mut self, handle: MarkerHandle, icon: Icon) {
    if let Some(marker) = self.markers.get_mut(&handle) {
      marker.icon = icon;
    }
  }

  fn remove_marker(&mut self, handle: MarkerHandle) {
    self.markers.remove(&handle);
  }

  fn fit_bounds(&mut self, bounds: BoundingBox) {
    if !bounds.is_valid() {
      return;
    }
    let extent = bounds.width().max(bounds.height());
    let zoom = if extent > 0. {
      (360. / extent).log2().floor()
    } else {
      MAX_ZOOM
    };
    self.view = View {
      center: bounds.center(),
      zoom: zoom.clamp(MIN_ZOOM, MAX_ZOOM),
    };
  }

  fn set_view(&mut self, center: WGS84Coordinate, zoom: f64) {
    self.view = View {
      center,
      zoom: zoom.clamp(MIN_ZOOM, MAX_ZOOM),
    };
  }

  fn center(&self) -> WGS84Coordinate {
    self.view.center
  }

  fn zoom(&self) -> f64 {
    self.view.zoom
  }
}
