use std::collections::HashMap;

use log::debug;

use crate::{
  config::IconSizing,
  map::{
    coordinates::WGS84Coordinate,
    surface::{Icon, IconKind, MarkerHandle, RenderSurface},
  },
};

mod records;

pub use records::{
  InvalidRecord, PollingLocation, PostOffice, ProjectionError, WebMercatorProjection,
  parse_polling_locations, parse_post_offices, split_precincts,
};

/// Size of the chosen location marker.
pub const LOCATION_ICON_SIZE: f64 = 25.;

pub const PRECINCT_UNAVAILABLE: &str =
  "Precinct information unavailable for this county. Check the ND SoS website (https://www.sos.nd.gov/).";

/// Polling place markers by the precincts they serve.
#[derive(Debug, Clone, Default)]
pub struct MarkerIndex {
  by_precinct: HashMap<String, Vec<MarkerHandle>>,
}

impl MarkerIndex {
  /// Adds `marker` to the markers serving `precinct`. A marker is listed once per precinct.
  pub fn insert(&mut self, precinct: &str, marker: MarkerHandle) {
    let markers = self.by_precinct.entry(precinct.to_string()).or_default();
    if !markers.contains(&marker) {
      markers.push(marker);
    }
  }

  /// The markers serving `precinct`, empty for unknown precincts.
  #[must_use]
  pub fn markers_for(&self, precinct: &str) -> &[MarkerHandle] {
    self
      .by_precinct
      .get(precinct)
      .map(Vec::as_slice)
      .unwrap_or_default()
  }

  #[must_use]
  pub fn precinct_count(&self) -> usize {
    self.by_precinct.len()
  }
}

/// Text of the chosen location marker.
#[must_use]
pub fn location_popup(
  coordinate: WGS84Coordinate,
  precinct: Option<&str>,
  district: Option<&str>,
) -> String {
  let precinct = precinct.map_or_else(
    || PRECINCT_UNAVAILABLE.to_string(),
    |p| format!("Precinct: {p}"),
  );
  format!(
    "{precinct}\nDistrict: {}\n{coordinate}",
    district.unwrap_or("N/A")
  )
}

/// Owns every marker on the map: polling places, post offices and the chosen location.
#[derive(Debug, Default)]
pub struct MarkerRegistry {
  sizing: IconSizing,
  polling_locations: Vec<MarkerHandle>,
  index: MarkerIndex,
  highlighted: Vec<MarkerHandle>,
  post_offices: Vec<MarkerHandle>,
  location: Option<MarkerHandle>,
}

impl MarkerRegistry {
  #[must_use]
  pub fn new(sizing: IconSizing) -> Self {
    Self {
      sizing,
      ..Self::default()
    }
  }

  #[must_use]
  pub fn icon(&self, kind: IconKind, zoom: f64) -> Icon {
    let size = match kind {
      IconKind::Location => LOCATION_ICON_SIZE,
      IconKind::PollingLocation => self.sizing.polling_location.size_at(zoom),
      IconKind::HighlightedPollingLocation => {
        self.sizing.highlighted_polling_location.size_at(zoom)
      }
      IconKind::PostOffice => self.sizing.post_office.size_at(zoom),
    };
    Icon::new(kind, size)
  }

  /// Adds one marker per polling place and indexes it under each precinct it serves.
  pub fn populate_polling_locations<S: RenderSurface + ?Sized>(
    &mut self,
    surface: &mut S,
    locations: &[PollingLocation],
  ) {
    let icon = self.icon(IconKind::PollingLocation, surface.zoom());
    for location in locations {
      let marker = surface.add_marker(location.coordinate, icon, Some(location.popup()));
      for precinct in &location.precincts {
        self.index.insert(precinct, marker);
      }
      self.polling_locations.push(marker);
    }
    debug!(
      "Added {} polling places serving {} precincts",
      locations.len(),
      self.index.precinct_count()
    );
  }

  pub fn populate_post_offices<S: RenderSurface + ?Sized>(
    &mut self,
    surface: &mut S,
    offices: &[PostOffice],
  ) {
    let icon = self.icon(IconKind::PostOffice, surface.zoom());
    for office in offices {
      let marker = surface.add_marker(office.coordinate, icon, Some(office.address.clone()));
      self.post_offices.push(marker);
    }
  }

  /// Restores the default icon on every highlighted marker.
  pub fn clear_highlighted<S: RenderSurface + ?Sized>(&mut self, surface: &mut S) {
    let icon = self.icon(IconKind::PollingLocation, surface.zoom());
    for marker in self.highlighted.drain(..) {
      surface.set_icon(marker, icon);
    }
  }

  /// Highlights the polling places of `precinct`. Previously highlighted markers are always
  /// restored, a precinct without polling places leaves nothing highlighted.
  pub fn highlight_for_precinct<S: RenderSurface + ?Sized>(
    &mut self,
    surface: &mut S,
    precinct: Option<&str>,
  ) {
    self.clear_highlighted(surface);
    let Some(precinct) = precinct else {
      return;
    };
    let icon = self.icon(IconKind::HighlightedPollingLocation, surface.zoom());
    for &marker in self.index.markers_for(precinct) {
      surface.set_icon(marker, icon);
      self.highlighted.push(marker);
    }
  }

  /// Resizes every marker for the current zoom. Highlighted markers are resized after the plain
  /// polling places so they keep their highlight.
  pub fn update_icons_on_zoom<S: RenderSurface + ?Sized>(&self, surface: &mut S) {
    let zoom = surface.zoom();
    let polling = self.icon(IconKind::PollingLocation, zoom);
    let highlighted = self.icon(IconKind::HighlightedPollingLocation, zoom);
    let post_office = self.icon(IconKind::PostOffice, zoom);

    for &marker in &self.polling_locations {
      surface.set_icon(marker, polling);
    }
    for &marker in &self.highlighted {
      surface.set_icon(marker, highlighted);
    }
    for &marker in &self.post_offices {
      surface.set_icon(marker, post_office);
    }
  }

  /// Places the chosen location marker, replacing the previous one.
  pub fn place_location_marker<S: RenderSurface + ?Sized>(
    &mut self,
    surface: &mut S,
    coordinate: WGS84Coordinate,
    precinct: Option<&str>,
    district: Option<&str>,
  ) {
    self.clear_location_marker(surface);
    let icon = self.icon(IconKind::Location, surface.zoom());
    let popup = location_popup(coordinate, precinct, district);
    self.location = Some(surface.add_marker(coordinate, icon, Some(popup)));
  }

  pub fn clear_location_marker<S: RenderSurface + ?Sized>(&mut self, surface: &mut S) {
    if let Some(marker) = self.location.take() {
      surface.remove_marker(marker);
    }
  }

  #[must_use]
  pub fn highlighted(&self) -> &[MarkerHandle] {
    &self.highlighted
  }

  #[must_use]
  pub fn index(&self) -> &MarkerIndex {
    &self.index
  }

  #[must_use]
  pub fn location_marker(&self) -> Option<MarkerHandle> {
    self.location
  }

  #[must_use]
  pub fn polling_locations(&self) -> &[MarkerHandle] {
    &self.polling_locations
  }

  #[must_use]
  pub fn post_offices(&self) -> &[MarkerHandle] {
    &self.post_offices
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::map::scene::Scene;
  use assert_approx_eq::assert_approx_eq;

  fn location(lat: f64, precincts: &str) -> PollingLocation {
    PollingLocation {
      coordinate: WGS84Coordinate::new(lat, -97.),
      precincts: split_precincts(precincts),
      county: "Cass".to_string(),
      name: format!("Place {lat}"),
      address: String::new(),
      city: String::new(),
      zip_code: String::new(),
      polling_hours: String::new(),
    }
  }

  fn registry(scene: &mut Scene) -> MarkerRegistry {
    let mut registry = MarkerRegistry::new(IconSizing::default());
    registry.populate_polling_locations(
      scene,
      &[
        location(46.0, "A, B"),
        location(46.5, "B"),
        location(47.0, "C"),
      ],
    );
    registry
  }

  fn kind(scene: &Scene, marker: MarkerHandle) -> Option<IconKind> {
    scene.marker(marker).map(|m| m.icon.kind)
  }

  #[test]
  fn index_maps_precincts_to_many_markers() {
    let mut scene = Scene::default();
    let registry = registry(&mut scene);
    let all = registry.polling_locations();
    assert_eq!(registry.index().markers_for("A"), &all[..1]);
    assert_eq!(registry.index().markers_for("B"), &all[..2]);
    assert!(registry.index().markers_for("Z").is_empty());
  }

  #[test]
  fn repeated_precinct_indexes_marker_once() {
    let mut scene = Scene::default();
    let mut registry = MarkerRegistry::new(IconSizing::default());
    let mut repeated = location(46.0, "A");
    repeated.precincts = vec!["A".to_string(), "A".to_string()];
    registry.populate_polling_locations(&mut scene, &[repeated, location(46.5, "A, A, B")]);

    let all = registry.polling_locations().to_vec();
    assert_eq!(registry.index().markers_for("A"), &all[..]);
    assert_eq!(registry.index().markers_for("B"), &all[1..]);

    registry.highlight_for_precinct(&mut scene, Some("A"));
    assert_eq!(registry.highlighted(), &all[..]);
    registry.highlight_for_precinct(&mut scene, None);
    assert_eq!(kind(&scene, all[0]), Some(IconKind::PollingLocation));
  }

  #[test]
  fn highlight_replaces_previous_highlight() {
    let mut scene = Scene::default();
    let mut registry = registry(&mut scene);
    let all = registry.polling_locations().to_vec();

    registry.highlight_for_precinct(&mut scene, Some("B"));
    assert_eq!(registry.highlighted(), &all[..2]);
    assert_eq!(
      kind(&scene, all[1]),
      Some(IconKind::HighlightedPollingLocation)
    );

    registry.highlight_for_precinct(&mut scene, Some("C"));
    assert_eq!(registry.highlighted(), &all[2..]);
    assert_eq!(kind(&scene, all[0]), Some(IconKind::PollingLocation));
    assert_eq!(kind(&scene, all[1]), Some(IconKind::PollingLocation));

    registry.highlight_for_precinct(&mut scene, Some("Z"));
    assert!(registry.highlighted().is_empty());
    assert_eq!(kind(&scene, all[2]), Some(IconKind::PollingLocation));

    registry.highlight_for_precinct(&mut scene, Some("A"));
    registry.highlight_for_precinct(&mut scene, None);
    assert!(registry.highlighted().is_empty());
  }

  #[test]
  fn zoom_resizes_every_class() {
    let mut scene = Scene::new(WGS84Coordinate::default(), 7.);
    let mut registry = registry(&mut scene);
    registry.populate_post_offices(
      &mut scene,
      &[PostOffice {
        coordinate: WGS84Coordinate::new(46.8, -96.8),
        address: "Main".to_string(),
      }],
    );
    registry.highlight_for_precinct(&mut scene, Some("C"));

    scene.set_view(WGS84Coordinate::default(), 12.);
    registry.update_icons_on_zoom(&mut scene);

    let polling = scene.marker(registry.polling_locations()[0]).unwrap().icon;
    assert_eq!(polling.kind, IconKind::PollingLocation);
    assert_approx_eq!(polling.size, 34.);
    let highlighted = scene.marker(registry.polling_locations()[2]).unwrap().icon;
    assert_eq!(highlighted.kind, IconKind::HighlightedPollingLocation);
    assert_approx_eq!(highlighted.size, 34.);
    let office = scene.marker(registry.post_offices()[0]).unwrap().icon;
    assert_approx_eq!(office.size, 17.);
  }

  #[test]
  fn location_marker_is_replaced() {
    let mut scene = Scene::default();
    let mut registry = MarkerRegistry::new(IconSizing::default());
    registry.place_location_marker(&mut scene, WGS84Coordinate::new(1., 2.), None, None);
    let first = registry.location_marker().unwrap();
    registry.place_location_marker(
      &mut scene,
      WGS84Coordinate::new(46.876, -96.789),
      Some("Fargo 1"),
      Some("45"),
    );
    let second = registry.location_marker().unwrap();
    assert!(scene.marker(first).is_none());
    assert_eq!(
      scene.marker(second).and_then(|m| m.popup.clone()).as_deref(),
      Some("Precinct: Fargo 1\nDistrict: 45\n46.88, -96.79")
    );

    registry.clear_location_marker(&mut scene);
    assert!(scene.marker(second).is_none());
    assert_eq!(scene.markers().count(), 0);
  }

  #[test]
  fn popup_without_precinct() {
    let popup = location_popup(WGS84Coordinate::new(46.0, -100.0), None, None);
    assert!(popup.starts_with(PRECINCT_UNAVAILABLE));
    assert!(popup.contains("District: N/A"));
  }
}
