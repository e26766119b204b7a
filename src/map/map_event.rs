use serde::{Deserialize, Serialize};

use super::coordinates::WGS84Coordinate;

/// The user-toggleable overlays.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ToggleLayer {
  County,
  Precinct,
  Legislative,
  Tribal,
}

/// A raw interaction with the map. All interactions go through the selection state machine in
/// the order they arrive.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum MapEvent {
  /// A click on the map.
  Click { coordinate: WGS84Coordinate },
  /// A choice in the county selector. An empty name clears the selection.
  SelectCounty { name: String },
  /// A layer checkbox changed.
  ToggleLayer { layer: ToggleLayer, enabled: bool },
  /// The map finished zooming to `zoom`.
  ZoomEnd { zoom: f64 },
  /// A free text location search.
  Search { query: String },
  Shutdown,
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn click_from_json() {
    let event: MapEvent =
      serde_json::from_str(r#"{"type":"click","coordinate":{"lat":46.9,"lon":-96.8}}"#).unwrap();
    assert_eq!(
      event,
      MapEvent::Click {
        coordinate: WGS84Coordinate::new(46.9, -96.8)
      }
    );
  }

  #[test]
  fn toggle_from_json() {
    let event: MapEvent =
      serde_json::from_str(r#"{"type":"toggle_layer","layer":"precinct","enabled":false}"#)
        .unwrap();
    assert_eq!(
      event,
      MapEvent::ToggleLayer {
        layer: ToggleLayer::Precinct,
        enabled: false
      }
    );
  }

  #[test]
  fn shutdown_from_json() {
    let event: MapEvent = serde_json::from_str(r#"{"type":"shutdown"}"#).unwrap();
    assert_eq!(event, MapEvent::Shutdown);
  }
}
