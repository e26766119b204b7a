use std::collections::HashMap;

use itertools::Itertools;
use log::debug;

use crate::{
  boundary::{BoundaryDataset, BoundaryFeature, BoundaryLayer},
  config::AllowedCountySet,
  map::{
    style::{Color, PRECINCT_PALETTE, Style},
    surface::{LayerHandle, PolygonShape, RenderSurface},
  },
  panel::{LegendEntry, PrecinctLegend},
};

/// Property of a precinct feature naming its county.
pub const PRECINCT_COUNTY_PROPERTY: &str = "County";

/// Precinct colors of one county, in first-seen order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PrecinctColorAssignment {
  county: String,
  colors: Vec<(String, Color)>,
  index: HashMap<String, usize>,
}

impl PrecinctColorAssignment {
  fn new(county: &str) -> Self {
    Self {
      county: county.to_string(),
      ..Self::default()
    }
  }

  fn assign(&mut self, precinct: String) {
    if self.index.contains_key(&precinct) {
      return;
    }
    let color = PRECINCT_PALETTE[self.colors.len() % PRECINCT_PALETTE.len()];
    self.index.insert(precinct.clone(), self.colors.len());
    self.colors.push((precinct, color));
  }

  #[must_use]
  pub fn county(&self) -> &str {
    &self.county
  }

  #[must_use]
  pub fn color_of(&self, precinct: &str) -> Option<Color> {
    self.index.get(precinct).map(|&idx| self.colors[idx].1)
  }

  /// Precincts with their colors, in first-seen order.
  pub fn iter(&self) -> impl Iterator<Item = (&str, Color)> {
    self.colors.iter().map(|(name, color)| (name.as_str(), *color))
  }

  #[must_use]
  pub fn len(&self) -> usize {
    self.colors.len()
  }

  #[must_use]
  pub fn is_empty(&self) -> bool {
    self.colors.is_empty()
  }

  /// Legend entries sorted by precinct name.
  #[must_use]
  pub fn legend_entries(&self) -> Vec<LegendEntry> {
    self
      .iter()
      .map(|(name, color)| LegendEntry::new(name, color))
      .sorted_by(|a, b| a.name.cmp(&b.name))
      .collect()
  }
}

fn precincts_of<'a>(
  precincts: &'a BoundaryDataset,
  county: &'a str,
) -> impl Iterator<Item = (&'a BoundaryFeature, String)> + 'a {
  let name_property = BoundaryLayer::Precinct.identifier_property();
  precincts.features().iter().filter_map(move |feature| {
    if feature.property(PRECINCT_COUNTY_PROPERTY).as_deref() != Some(county) {
      return None;
    }
    Some((feature, feature.property(name_property)?))
  })
}

/// Assigns each distinct precinct of `county` the next palette color, in dataset order. The
/// palette repeats when a county has more precincts than colors.
#[must_use]
pub fn generate_precinct_color_map(
  precincts: &BoundaryDataset,
  county: &str,
) -> PrecinctColorAssignment {
  let mut assignment = PrecinctColorAssignment::new(county);
  for (_, name) in precincts_of(precincts, county) {
    assignment.assign(name);
  }
  assignment
}

/// Inputs of a precinct visualization run.
#[derive(Debug, Clone, Copy)]
pub struct PrecinctContext<'a> {
  pub precincts: Option<&'a BoundaryDataset>,
  pub allowed_counties: &'a AllowedCountySet,
  pub precinct_layer_enabled: bool,
}

/// The precinct overlays currently drawn, and the assignment they were drawn with.
#[derive(Debug, Default)]
pub struct PrecinctOverlays {
  layers: Vec<LayerHandle>,
  assignment: Option<PrecinctColorAssignment>,
}

impl PrecinctOverlays {
  #[must_use]
  pub fn new() -> Self {
    Self::default()
  }

  /// Removes every precinct overlay.
  pub fn clear<S: RenderSurface + ?Sized>(&mut self, surface: &mut S) {
    for layer in self.layers.drain(..) {
      surface.remove_layer(layer);
    }
    self.assignment = None;
  }

  /// Draws one overlay per precinct feature of `county` and returns the legend to show. Previous
  /// overlays are always removed first.
  pub fn show_precincts_for_county<S: RenderSurface + ?Sized>(
    &mut self,
    surface: &mut S,
    county: Option<&str>,
    context: PrecinctContext<'_>,
  ) -> PrecinctLegend {
    self.clear(surface);

    let Some(county) = county.filter(|_| context.precinct_layer_enabled) else {
      return PrecinctLegend::EnablePrecinctLayer;
    };
    if !context.allowed_counties.contains(county) {
      return PrecinctLegend::UnavailableForCounty;
    }
    let Some(precincts) = context.precincts else {
      return PrecinctLegend::Entries(Vec::new());
    };

    let assignment = generate_precinct_color_map(precincts, county);
    for (feature, name) in precincts_of(precincts, county) {
      let Some(color) = assignment.color_of(&name) else {
        continue;
      };
      let shape = PolygonShape::new(feature.geometry.clone(), Style::precinct(color));
      self.layers.push(surface.add_polygon_layer(vec![shape]));
    }
    debug!(
      "Showing {} precincts of {county} in {} overlays",
      assignment.len(),
      self.layers.len()
    );

    let legend = PrecinctLegend::Entries(assignment.legend_entries());
    self.assignment = Some(assignment);
    legend
  }

  #[must_use]
  pub fn layers(&self) -> &[LayerHandle] {
    &self.layers
  }

  #[must_use]
  pub fn assignment(&self) -> Option<&PrecinctColorAssignment> {
    self.assignment.as_ref()
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::{map::scene::Scene, test_utils::FeatureBuilder};

  fn precinct(county: &str, name: &str, lat: f64) -> BoundaryFeature {
    FeatureBuilder::square(lat, 0., 1.)
      .with_property(PRECINCT_COUNTY_PROPERTY, county)
      .named("Name", name)
      .build()
  }

  fn dataset() -> BoundaryDataset {
    BoundaryDataset::new(
      BoundaryLayer::Precinct,
      vec![
        precinct("Cass", "Fargo 2", 0.),
        precinct("Ward", "Minot 1", 1.),
        precinct("Cass", "Fargo 1", 2.),
        precinct("Cass", "Fargo 2", 3.),
        precinct("Cass", "Casselton", 4.),
      ],
    )
  }

  #[test]
  fn colors_follow_first_seen_order() {
    let assignment = generate_precinct_color_map(&dataset(), "Cass");
    assert_eq!(
      assignment.iter().collect::<Vec<_>>(),
      vec![
        ("Fargo 2", PRECINCT_PALETTE[0]),
        ("Fargo 1", PRECINCT_PALETTE[1]),
        ("Casselton", PRECINCT_PALETTE[2]),
      ]
    );
    assert_eq!(assignment.color_of("Minot 1"), None);
  }

  #[test]
  fn colors_are_deterministic() {
    let dataset = dataset();
    assert_eq!(
      generate_precinct_color_map(&dataset, "Cass"),
      generate_precinct_color_map(&dataset, "Cass")
    );
  }

  #[test]
  fn palette_cycles() {
    let features = (0_i32..40)
      .map(|i| precinct("Cass", &format!("P{i:02}"), f64::from(i)))
      .collect();
    let dataset = BoundaryDataset::new(BoundaryLayer::Precinct, features);
    let assignment = generate_precinct_color_map(&dataset, "Cass");
    assert_eq!(assignment.len(), 40);
    assert_eq!(assignment.color_of("P32"), Some(PRECINCT_PALETTE[0]));
    assert_eq!(assignment.color_of("P39"), Some(PRECINCT_PALETTE[7]));
  }

  #[test]
  fn legend_is_sorted_by_name() {
    let names: Vec<_> = generate_precinct_color_map(&dataset(), "Cass")
      .legend_entries()
      .into_iter()
      .map(|e| e.name)
      .collect();
    assert_eq!(names, ["Casselton", "Fargo 1", "Fargo 2"]);
  }

  #[test]
  fn overlays_replace_previous_county() {
    let dataset = dataset();
    let allowed = AllowedCountySet::new(["Cass", "Ward"]);
    let context = PrecinctContext {
      precincts: Some(&dataset),
      allowed_counties: &allowed,
      precinct_layer_enabled: true,
    };
    let mut scene = Scene::default();
    let mut overlays = PrecinctOverlays::new();

    let legend = overlays.show_precincts_for_county(&mut scene, Some("Cass"), context);
    assert_eq!(legend.entries().len(), 3);
    assert_eq!(scene.layer_count(), 4);

    let legend = overlays.show_precincts_for_county(&mut scene, Some("Ward"), context);
    assert_eq!(legend.entries().len(), 1);
    assert_eq!(scene.layer_count(), 1);

    overlays.clear(&mut scene);
    assert_eq!(scene.layer_count(), 0);
    assert!(overlays.assignment().is_none());
  }

  #[test]
  fn preconditions_select_the_legend_message() {
    let dataset = dataset();
    let allowed = AllowedCountySet::new(["Cass"]);
    let mut context = PrecinctContext {
      precincts: Some(&dataset),
      allowed_counties: &allowed,
      precinct_layer_enabled: true,
    };
    let mut scene = Scene::default();
    let mut overlays = PrecinctOverlays::new();

    assert_eq!(
      overlays.show_precincts_for_county(&mut scene, Some("Ward"), context),
      PrecinctLegend::UnavailableForCounty
    );
    assert_eq!(
      overlays.show_precincts_for_county(&mut scene, None, context),
      PrecinctLegend::EnablePrecinctLayer
    );

    context.precinct_layer_enabled = false;
    assert_eq!(
      overlays.show_precincts_for_county(&mut scene, Some("Cass"), context),
      PrecinctLegend::EnablePrecinctLayer
    );
    assert_eq!(scene.layer_count(), 0);

    context.precinct_layer_enabled = true;
    context.precincts = None;
    assert_eq!(
      overlays.show_precincts_for_county(&mut scene, Some("Cass"), context),
      PrecinctLegend::Entries(vec![])
    );
  }
}
