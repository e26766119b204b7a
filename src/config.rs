use std::collections::BTreeSet;
use std::path::PathBuf;

use dirs::home_dir;
use log::error;
use serde::{Deserialize, Serialize};

use crate::{geocoding::GeocoderConfig, map::coordinates::WGS84Coordinate};

/// Counties with precinct level detail. Every other county is drawn muted and never highlighted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AllowedCountySet(BTreeSet<String>);

impl AllowedCountySet {
  pub fn new<I, S>(counties: I) -> Self
  where
    I: IntoIterator<Item = S>,
    S: Into<String>,
  {
    Self(counties.into_iter().map(Into::into).collect())
  }

  #[must_use]
  pub fn contains(&self, county: &str) -> bool {
    self.0.contains(county)
  }

  pub fn iter(&self) -> impl Iterator<Item = &str> {
    self.0.iter().map(String::as_str)
  }
}

impl Default for AllowedCountySet {
  fn default() -> Self {
    Self::new([
      "Cass",
      "Grand Forks",
      "Burleigh",
      "Ward",
      "Williams",
      "Stark",
      "Morton",
      "Richland",
      "Rolette",
      "Sioux",
      "Benson",
      "McKenzie",
      "Mountrail",
    ])
  }
}

/// Locations of the static datasets, relative to `Config::data_base` unless absolute.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatasetPaths {
  pub county: String,
  pub legislative: String,
  pub tribal: String,
  pub precinct: String,
  pub polling_locations: String,
  pub post_offices: String,
  pub county_auditor: String,
}

impl Default for DatasetPaths {
  fn default() -> Self {
    Self {
      county: "boundaries/County.geojson".to_string(),
      legislative: "boundaries/Legislative.geojson".to_string(),
      tribal: "boundaries/Tribal.geojson".to_string(),
      precinct: "boundaries/Precincts.geojson".to_string(),
      polling_locations: "symbols/PollingLocations.json".to_string(),
      post_offices: "symbols/PostOffices.json".to_string(),
      county_auditor: "county/CountyAuditor.csv".to_string(),
    }
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct InitialView {
  pub center: WGS84Coordinate,
  pub zoom: f64,
}

impl Default for InitialView {
  fn default() -> Self {
    Self {
      center: WGS84Coordinate::new(46.8772, -96.7898),
      zoom: 7.,
    }
  }
}

/// Zoom dependent size of one marker class: `clamp(zoom * scale + min_size, min_size, max_size)`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct IconScale {
  pub scale: f64,
  pub min_size: f64,
  pub max_size: f64,
}

impl IconScale {
  #[must_use]
  pub fn size_at(&self, zoom: f64) -> f64 {
    (zoom * self.scale + self.min_size)
      .max(self.min_size)
      .min(self.max_size)
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct IconSizing {
  pub polling_location: IconScale,
  pub highlighted_polling_location: IconScale,
  pub post_office: IconScale,
}

impl Default for IconSizing {
  fn default() -> Self {
    let polling = IconScale {
      scale: 2.,
      min_size: 10.,
      max_size: 50.,
    };
    Self {
      polling_location: polling,
      highlighted_polling_location: polling,
      post_office: IconScale {
        scale: 1.,
        min_size: 5.,
        max_size: 50.,
      },
    }
  }
}

/// Settings of the map engine. The process wide settings are merged from the environment, the
/// config file and the defaults, in that order of precedence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
  #[serde(skip)]
  pub config_path: Option<PathBuf>,
  pub data_base: Option<String>,
  pub datasets: DatasetPaths,
  pub allowed_counties: AllowedCountySet,
  pub initial_view: InitialView,
  pub click_zoom_threshold: f64,
  pub icon_sizing: IconSizing,
  pub geocoder: GeocoderConfig,
  pub listen_port: u16,
}

impl Config {
  #[must_use]
  pub fn new() -> Self {
    let from_file = Self::from_file();
    let config_path = Self::config_dir();

    let mut merged = from_file.clone().unwrap_or_default();
    merged.config_path = config_path;
    if let Ok(data_base) = std::env::var("PRECINCT_MAP_DATA_URL") {
      merged.data_base = Some(data_base);
    }
    if merged.data_base.is_none() {
      merged.data_base = merged.config_path.as_ref().map(|p| {
        p.join("data")
          .to_string_lossy()
          .into_owned()
      });
    }

    if merged.config_path.is_some() && from_file.is_none() {
      merged.init_cfg_file();
    }

    merged
  }

  fn config_dir() -> Option<PathBuf> {
    std::env::var("PRECINCT_MAP_CONFIG")
      .ok()
      .map(PathBuf::from)
      .or_else(|| home_dir().map(|p| p.join(".config").join("precinct-map")))
  }

  fn from_file() -> Option<Self> {
    let config_path = Self::config_dir()?.join("config.json");

    serde_json::from_str(&std::fs::read_to_string(&config_path).ok()?)
      .inspect_err(|e| error!("Failed to read config file: {e}"))
      .ok()
  }

  fn init_cfg_file(&self) {
    let Some(path) = &self.config_path else {
      return;
    };
    if !path.exists() {
      let _ = std::fs::create_dir_all(path).inspect_err(|e| {
        error!("Failed to create config directory: {e}");
      });
    }

    let path = path.join("config.json");
    if !path.exists() {
      match serde_json::to_string_pretty(self) {
        Ok(config) => {
          let _ = std::fs::write(path, config).inspect_err(|e| {
            error!("Failed to write config file: {e}");
          });
        }
        Err(e) => error!("Failed to serialize config: {e}"),
      }
    }
  }
}

impl Default for Config {
  fn default() -> Self {
    Self {
      config_path: None,
      data_base: None,
      datasets: DatasetPaths::default(),
      allowed_counties: AllowedCountySet::default(),
      initial_view: InitialView::default(),
      click_zoom_threshold: 8.,
      icon_sizing: IconSizing::default(),
      geocoder: GeocoderConfig::default(),
      listen_port: crate::DEFAULT_PORT,
    }
  }
}
