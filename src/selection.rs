use std::collections::HashMap;

use log::{debug, info, warn};
use serde::{Deserialize, Serialize};

use crate::{
  auditor::AuditorDirectory,
  boundary::{BoundaryLayer, BoundaryStore},
  config::{AllowedCountySet, Config},
  geocoding::{
    AddressComponents, GeocodeError, GeocodeRequest, GeocodingGateway, SearchResult,
  },
  map::{
    coordinates::WGS84Coordinate,
    map_event::{MapEvent, ToggleLayer},
    style::Style,
    surface::{LayerHandle, PolygonShape, RenderSurface},
  },
  markers::MarkerRegistry,
  panel::{AddressDisplay, AuditorTable, Panel, PrecinctLegend},
  precincts::{PrecinctContext, PrecinctOverlays},
  resolver::resolve,
};

mod map_data;
pub use map_data::MapData;

/// What the user has chosen. County, precinct and district always come from the same
/// interaction.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Selection {
  coordinate: Option<WGS84Coordinate>,
  county: Option<String>,
  precinct: Option<String>,
  district: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SelectionState {
  Empty,
  Located,
}

impl Selection {
  /// The result of resolving `coordinate`. Precinct and district are only kept for a county
  /// with precinct detail.
  #[must_use]
  pub fn located(
    coordinate: WGS84Coordinate,
    county: Option<String>,
    precinct: Option<String>,
    district: Option<String>,
    allowed_counties: &AllowedCountySet,
  ) -> Self {
    let detailed = county
      .as_deref()
      .is_some_and(|county| allowed_counties.contains(county));
    Self {
      coordinate: Some(coordinate),
      county,
      precinct: precinct.filter(|_| detailed),
      district: district.filter(|_| detailed),
    }
  }

  /// A county chosen in the selector. The coordinate is kept, precinct and district are
  /// cleared.
  #[must_use]
  pub fn with_county(&self, county: &str) -> Self {
    Self {
      coordinate: self.coordinate,
      county: Some(county.to_string()),
      precinct: None,
      district: None,
    }
  }

  #[must_use]
  pub fn state(&self) -> SelectionState {
    if self.coordinate.is_some() {
      SelectionState::Located
    } else {
      SelectionState::Empty
    }
  }

  #[must_use]
  pub fn coordinate(&self) -> Option<WGS84Coordinate> {
    self.coordinate
  }

  #[must_use]
  pub fn county(&self) -> Option<&str> {
    self.county.as_deref()
  }

  #[must_use]
  pub fn precinct(&self) -> Option<&str> {
    self.precinct.as_deref()
  }

  #[must_use]
  pub fn district(&self) -> Option<&str> {
    self.district.as_deref()
  }
}

/// Asynchronous work requested by a transition. Its completion comes back as another call
/// into the map.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
  ReverseGeocode(GeocodeRequest),
  Search { generation: u64, query: String },
  Shutdown,
}


/// One interactive map and its whole state graph. Every transition runs to completion before
/// the next one starts, asynchronous results re-enter through `on_geocode_completed` and
/// `on_search_completed`.
pub struct PrecinctMap<S: RenderSurface> {
  surface: S,
  allowed_counties: AllowedCountySet,
  click_zoom_threshold: f64,
  boundaries: BoundaryStore,
  auditors: AuditorDirectory,
  selection: Selection,
  panel: Panel,
  boundary_layers: HashMap<BoundaryLayer, LayerHandle>,
  highlighted_county: Option<LayerHandle>,
  overlays: PrecinctOverlays,
  markers: MarkerRegistry,
  geocoding: GeocodingGateway,
  searches: GeocodingGateway,
}

impl<S: RenderSurface> PrecinctMap<S> {
  /// Draws the loaded data onto `surface` with the default checkbox states.
  pub fn new(mut surface: S, config: &Config, data: MapData) -> Self {
    let mut markers = MarkerRegistry::new(config.icon_sizing);
    markers.populate_polling_locations(&mut surface, &data.polling_locations);
    markers.populate_post_offices(&mut surface, &data.post_offices);

    let panel = Panel {
      county_names: data.auditors.county_names(),
      ..Panel::default()
    };

    let mut map = Self {
      surface,
      allowed_counties: config.allowed_counties.clone(),
      click_zoom_threshold: config.click_zoom_threshold,
      boundaries: data.boundaries,
      auditors: data.auditors,
      selection: Selection::default(),
      panel,
      boundary_layers: HashMap::new(),
      highlighted_county: None,
      overlays: PrecinctOverlays::new(),
      markers,
      geocoding: GeocodingGateway::new(),
      searches: GeocodingGateway::new(),
    };
    map.sync_boundary_layers();
    info!(
      "Map ready with {} counties in the selector",
      map.panel.county_names.len()
    );
    map
  }

  /// Dispatches one interaction.
  pub fn handle_event(&mut self, event: MapEvent) -> Vec<Command> {
    debug!("Handling {event:?}");
    match event {
      MapEvent::Click { coordinate } => self.on_click(coordinate),
      MapEvent::SelectCounty { name } => {
        self.on_county_selected(&name);
        Vec::new()
      }
      MapEvent::ToggleLayer { layer, enabled } => {
        self.on_layer_toggle(layer, enabled);
        Vec::new()
      }
      MapEvent::ZoomEnd { zoom } => {
        self.on_zoom_end(zoom);
        Vec::new()
      }
      MapEvent::Search { query } => self.on_search(query),
      MapEvent::Shutdown => vec![Command::Shutdown],
    }
  }

  /// Clears everything derived from the previous selection, resolves the coordinate against
  /// the county, precinct and legislative layers, commits the new selection and redraws from
  /// it.
  pub fn on_click(&mut self, coordinate: WGS84Coordinate) -> Vec<Command> {
    self.clear_derived_state();
    self.panel.address = AddressDisplay::Fetching;

    let county = self.resolve(coordinate, BoundaryLayer::County);
    let precinct = self.resolve(coordinate, BoundaryLayer::Precinct);
    let district = self.resolve(coordinate, BoundaryLayer::Legislative);
    self.selection = Selection::located(
      coordinate,
      county,
      precinct,
      district,
      &self.allowed_counties,
    );
    debug!(
      "Resolved {coordinate} to county {:?}, precinct {:?}, district {:?}",
      self.selection.county(),
      self.selection.precinct(),
      self.selection.district()
    );

    let zoom = self.surface.zoom().max(self.click_zoom_threshold);
    self.surface.set_view(coordinate, zoom);

    let selection = self.selection.clone();
    self.panel.county_dropdown = selection.county().unwrap_or_default().to_string();
    if let Some(county) = selection.county() {
      self.show_auditor(county);
      self.markers.place_location_marker(
        &mut self.surface,
        coordinate,
        selection.precinct(),
        selection.district(),
      );
    } else {
      self.panel.auditor_table = AuditorTable::hidden();
    }
    self.show_precincts(selection.county());
    self.highlight_county(selection.county());
    self
      .markers
      .highlight_for_precinct(&mut self.surface, selection.precinct());
    self.apply_layer_order();

    vec![Command::ReverseGeocode(self.geocoding.issue(coordinate))]
  }

  /// A county chosen in the selector. An empty name clears the selection.
  pub fn on_county_selected(&mut self, name: &str) {
    self.clear_derived_state();

    if name.is_empty() {
      self.selection = Selection::default();
      self.panel.county_dropdown.clear();
      self.panel.auditor_table = AuditorTable::hidden();
      self.panel.precinct_legend = PrecinctLegend::EnablePrecinctLayer;
      self.panel.address = AddressDisplay::Idle;
      self.geocoding.cancel();
      return;
    }

    self.selection = self.selection.with_county(name);
    self.panel.county_dropdown = name.to_string();
    if let Some(feature) = self
      .boundaries
      .get_feature_by_identifier(BoundaryLayer::County, name)
    {
      self.surface.fit_bounds(feature.bounds());
    }
    self.show_auditor(name);
    self.highlight_county(Some(name));
    self.show_precincts(Some(name));
    self.apply_layer_order();
  }

  /// A layer checkbox changed. While precinct mode is active the county layer stays visible
  /// and its checkbox ignores changes.
  pub fn on_layer_toggle(&mut self, layer: ToggleLayer, enabled: bool) {
    let checkboxes = &mut self.panel.checkboxes;
    match layer {
      ToggleLayer::Precinct => {
        checkboxes.precinct.checked = enabled;
      }
      ToggleLayer::County if !checkboxes.county.enabled => {
        debug!("County layer is locked while precinct mode is active");
        return;
      }
      ToggleLayer::County => checkboxes.county.checked = enabled,
      ToggleLayer::Legislative => checkboxes.legislative.checked = enabled,
      ToggleLayer::Tribal => checkboxes.tribal.checked = enabled,
    }
    checkboxes.apply_precinct_rule();
    self.sync_boundary_layers();

    let county = self.selection.county().map(ToString::to_string);
    match layer {
      ToggleLayer::Precinct => self.show_precincts(county.as_deref()),
      ToggleLayer::County => self.highlight_county(county.as_deref()),
      ToggleLayer::Legislative | ToggleLayer::Tribal => {}
    }
    self.apply_layer_order();
  }

  /// Resizes all markers for the new zoom.
  pub fn on_zoom_end(&mut self, zoom: f64) {
    let center = self.surface.center();
    self.surface.set_view(center, zoom);
    self.markers.update_icons_on_zoom(&mut self.surface);
  }

  /// Starts a location search, superseding any search in flight.
  pub fn on_search(&mut self, query: String) -> Vec<Command> {
    vec![Command::Search {
      generation: self.searches.next_generation(),
      query,
    }]
  }

  /// A search found a location. It is handled like a click on it.
  pub fn on_location_found(&mut self, result: &SearchResult) -> Vec<Command> {
    info!("Location found: {result}");
    self.on_click(result.coordinate)
  }

  pub fn on_search_completed(
    &mut self,
    generation: u64,
    outcome: Result<Option<SearchResult>, GeocodeError>,
  ) -> Vec<Command> {
    if !self.searches.is_current(generation) {
      debug!("Discarding superseded search result (generation {generation})");
      return Vec::new();
    }
    match outcome {
      Ok(Some(result)) => self.on_location_found(&result),
      Ok(None) => {
        info!("Search found nothing");
        Vec::new()
      }
      Err(e) => {
        warn!("Search failed: {e}");
        Vec::new()
      }
    }
  }

  /// Applies a reverse geocoding result unless a newer request superseded it.
  pub fn on_geocode_completed(
    &mut self,
    request: &GeocodeRequest,
    outcome: Result<AddressComponents, GeocodeError>,
  ) {
    if let Some(address) = self.geocoding.complete(request, outcome) {
      self.panel.address = address;
    }
  }

  fn resolve(&self, coordinate: WGS84Coordinate, layer: BoundaryLayer) -> Option<String> {
    resolve(
      coordinate,
      self.boundaries.dataset(layer),
      layer.identifier_property(),
    )
  }

  fn clear_derived_state(&mut self) {
    self.overlays.clear(&mut self.surface);
    self.markers.clear_highlighted(&mut self.surface);
    self.clear_highlighted_county();
    self.markers.clear_location_marker(&mut self.surface);
  }

  fn clear_highlighted_county(&mut self) {
    if let Some(layer) = self.highlighted_county.take() {
      self.surface.remove_layer(layer);
    }
  }

  /// Highlights `county` if the county layer is checked and the county has precinct detail.
  /// The previous highlight is always cleared.
  fn highlight_county(&mut self, county: Option<&str>) {
    self.clear_highlighted_county();
    let Some(county) = county else {
      return;
    };
    if !self.panel.checkboxes.county.checked || !self.allowed_counties.contains(county) {
      return;
    }
    let Some(feature) = self
      .boundaries
      .get_feature_by_identifier(BoundaryLayer::County, county)
    else {
      return;
    };
    let shape = PolygonShape::new(feature.geometry.clone(), Style::highlighted_county());
    self.highlighted_county = Some(self.surface.add_polygon_layer(vec![shape]));
  }

  fn show_precincts(&mut self, county: Option<&str>) {
    let context = PrecinctContext {
      precincts: self.boundaries.dataset(BoundaryLayer::Precinct),
      allowed_counties: &self.allowed_counties,
      precinct_layer_enabled: self.panel.checkboxes.precinct.checked,
    };
    self.panel.precinct_legend =
      self
        .overlays
        .show_precincts_for_county(&mut self.surface, county, context);
  }

  fn show_auditor(&mut self, county: &str) {
    self.panel.auditor_table = self
      .auditors
      .get(county)
      .map_or_else(AuditorTable::hidden, AuditorTable::showing);
  }

  fn layer_shapes(&self, layer: BoundaryLayer) -> Vec<PolygonShape> {
    let Some(dataset) = self.boundaries.dataset(layer) else {
      return Vec::new();
    };
    dataset
      .features()
      .iter()
      .map(|feature| {
        let style = match layer {
          BoundaryLayer::County => {
            let allowed = feature
              .property(layer.identifier_property())
              .is_some_and(|name| self.allowed_counties.contains(&name));
            if allowed {
              Style::allowed_county()
            } else {
              Style::other_county()
            }
          }
          BoundaryLayer::Legislative => Style::legislative(),
          BoundaryLayer::Tribal => Style::tribal(),
          BoundaryLayer::Precinct => Style::default(),
        };
        PolygonShape::new(feature.geometry.clone(), style)
      })
      .collect()
  }

  /// Adds or removes the county, legislative and tribal layers to match their checkboxes.
  fn sync_boundary_layers(&mut self) {
    let checkboxes = self.panel.checkboxes;
    for (layer, visible) in [
      (BoundaryLayer::County, checkboxes.county.checked),
      (BoundaryLayer::Legislative, checkboxes.legislative.checked),
      (BoundaryLayer::Tribal, checkboxes.tribal.checked),
    ] {
      let shown = self.boundary_layers.contains_key(&layer);
      if visible && !shown && self.boundaries.is_loaded(layer) {
        let shapes = self.layer_shapes(layer);
        let handle = self.surface.add_polygon_layer(shapes);
        self.boundary_layers.insert(layer, handle);
      } else if !visible && let Some(handle) = self.boundary_layers.remove(&layer) {
        self.surface.remove_layer(handle);
      }
    }
    if !checkboxes.county.checked {
      self.clear_highlighted_county();
    }
  }

  /// Legislative and tribal boundaries stay above everything else.
  fn apply_layer_order(&mut self) {
    for layer in [BoundaryLayer::Legislative, BoundaryLayer::Tribal] {
      if let Some(&handle) = self.boundary_layers.get(&layer) {
        self.surface.bring_to_front(handle);
      }
    }
  }

  #[must_use]
  pub fn selection(&self) -> &Selection {
    &self.selection
  }

  #[must_use]
  pub fn panel(&self) -> &Panel {
    &self.panel
  }

  #[must_use]
  pub fn surface(&self) -> &S {
    &self.surface
  }

  #[must_use]
  pub fn markers(&self) -> &MarkerRegistry {
    &self.markers
  }

  #[must_use]
  pub fn precinct_overlays(&self) -> &PrecinctOverlays {
    &self.overlays
  }

  #[must_use]
  pub fn highlighted_county_layer(&self) -> Option<LayerHandle> {
    self.highlighted_county
  }

  #[must_use]
  pub fn boundary_layer(&self, layer: BoundaryLayer) -> Option<LayerHandle> {
    self.boundary_layers.get(&layer).copied()
  }
}
