use serde::{Deserialize, Serialize};

use crate::{
  auditor::AuditorInfo,
  map::{
    style::{Color, Style},
    surface::IconKind,
  },
};

pub const FETCHING_ADDRESS: &str = "Fetching address...";
pub const ADDRESS_NOT_FOUND: &str = "Address not found";
pub const ENABLE_PRECINCT_LAYER: &str = "Enable the precinct layer and select a county to see precincts.";
pub const UNAVAILABLE_FOR_COUNTY: &str = "Precinct information is unavailable for this county.";

/// Alpha of the legend swatches.
pub const SWATCH_ALPHA: f32 = 0.55;

/// The free text address display.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", content = "address", rename_all = "snake_case")]
pub enum AddressDisplay {
  /// No location chosen yet.
  #[default]
  Idle,
  Fetching,
  Found(String),
  NotFound,
}

impl AddressDisplay {
  #[must_use]
  pub fn text(&self) -> &str {
    match self {
      AddressDisplay::Idle => "",
      AddressDisplay::Fetching => FETCHING_ADDRESS,
      AddressDisplay::Found(address) => address,
      AddressDisplay::NotFound => ADDRESS_NOT_FOUND,
    }
  }
}

/// A precinct and its swatch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LegendEntry {
  pub name: String,
  pub color: Color,
  pub swatch: String,
}

impl LegendEntry {
  #[must_use]
  pub fn new(name: &str, color: Color) -> Self {
    Self {
      name: name.to_string(),
      color,
      swatch: color.to_rgba_css(SWATCH_ALPHA),
    }
  }
}

/// The precinct legend. The two messages are distinct states.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", content = "entries", rename_all = "snake_case")]
pub enum PrecinctLegend {
  #[default]
  EnablePrecinctLayer,
  UnavailableForCounty,
  /// Precincts in lexicographic order.
  Entries(Vec<LegendEntry>),
}

impl PrecinctLegend {
  #[must_use]
  pub fn message(&self) -> Option<&'static str> {
    match self {
      PrecinctLegend::EnablePrecinctLayer => Some(ENABLE_PRECINCT_LAYER),
      PrecinctLegend::UnavailableForCounty => Some(UNAVAILABLE_FOR_COUNTY),
      PrecinctLegend::Entries(_) => None,
    }
  }

  #[must_use]
  pub fn entries(&self) -> &[LegendEntry] {
    match self {
      PrecinctLegend::Entries(entries) => entries,
      _ => &[],
    }
  }
}

/// The four labelled auditor fields, shown and hidden as a unit.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditorTable {
  pub visible: bool,
  pub rows: Vec<(String, String)>,
}

impl AuditorTable {
  #[must_use]
  pub fn showing(info: &AuditorInfo) -> Self {
    Self {
      visible: true,
      rows: vec![
        ("County".to_string(), info.county.clone()),
        ("Auditor".to_string(), info.auditor.clone()),
        ("Phone/Fax/Email".to_string(), info.contact.clone()),
        ("Address".to_string(), info.address.clone()),
      ],
    }
  }

  #[must_use]
  pub fn hidden() -> Self {
    Self::default()
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Checkbox {
  pub checked: bool,
  pub enabled: bool,
}

impl Checkbox {
  #[must_use]
  pub fn new(checked: bool) -> Self {
    Self {
      checked,
      enabled: true,
    }
  }
}

/// Checkbox states of the boundary layers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LayerCheckboxes {
  pub county: Checkbox,
  pub precinct: Checkbox,
  pub legislative: Checkbox,
  pub tribal: Checkbox,
}

impl Default for LayerCheckboxes {
  fn default() -> Self {
    let mut checkboxes = Self {
      county: Checkbox::new(true),
      precinct: Checkbox::new(true),
      legislative: Checkbox::new(false),
      tribal: Checkbox::new(false),
    };
    checkboxes.apply_precinct_rule();
    checkboxes
  }
}

impl LayerCheckboxes {
  /// While precinct mode is active the county layer stays checked and cannot be toggled.
  pub fn apply_precinct_rule(&mut self) {
    if self.precinct.checked {
      self.county.checked = true;
      self.county.enabled = false;
    } else {
      self.county.enabled = true;
    }
  }
}

/// How a legend line is drawn.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum LegendSymbol {
  Line(Style),
  Icon(IconKind),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StaticLegendItem {
  pub label: String,
  pub symbol: LegendSymbol,
}

impl StaticLegendItem {
  fn line(label: &str, style: Style) -> Self {
    Self {
      label: label.to_string(),
      symbol: LegendSymbol::Line(style),
    }
  }

  fn icon(kind: IconKind) -> Self {
    Self {
      label: kind.name().to_string(),
      symbol: LegendSymbol::Icon(kind),
    }
  }
}

/// The fixed layer legend.
#[must_use]
pub fn layers_legend() -> Vec<StaticLegendItem> {
  vec![
    StaticLegendItem::line("Legislative", Style::legislative()),
    StaticLegendItem::line("Tribal", Style::tribal()),
    StaticLegendItem::line("Counties with precinct info", Style::allowed_county()),
    StaticLegendItem::line("Other Counties", Style::other_county().with_opacity(1.)),
  ]
}

/// The fixed icon legend.
#[must_use]
pub fn icon_legend() -> Vec<StaticLegendItem> {
  vec![
    StaticLegendItem::icon(IconKind::PollingLocation),
    StaticLegendItem::icon(IconKind::HighlightedPollingLocation),
    StaticLegendItem::icon(IconKind::PostOffice),
  ]
}

/// Everything the map exposes besides the map itself.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Panel {
  /// County names for the selector, in auditor table order.
  pub county_names: Vec<String>,
  /// Current selector value, empty for none.
  pub county_dropdown: String,
  pub auditor_table: AuditorTable,
  pub address: AddressDisplay,
  pub precinct_legend: PrecinctLegend,
  pub checkboxes: LayerCheckboxes,
  pub layers_legend: Vec<StaticLegendItem>,
  pub icon_legend: Vec<StaticLegendItem>,
}

impl Default for Panel {
  fn default() -> Self {
    Self {
      county_names: Vec::new(),
      county_dropdown: String::new(),
      auditor_table: AuditorTable::hidden(),
      address: AddressDisplay::Idle,
      precinct_legend: PrecinctLegend::default(),
      checkboxes: LayerCheckboxes::default(),
      layers_legend: layers_legend(),
      icon_legend: icon_legend(),
    }
  }
}
