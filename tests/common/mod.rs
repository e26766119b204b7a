#![allow(dead_code)]

use std::path::PathBuf;

use precinct_map::{
  config::{Config, DatasetPaths},
  datasource::MemoryDataSource,
  map::scene::Scene,
  selection::{MapData, PrecinctMap},
};

pub fn resource_path(name: &str) -> PathBuf {
  PathBuf::from(env!("CARGO_MANIFEST_DIR"))
    .join("tests")
    .join("resources")
    .join(name)
}

pub fn resource(name: &str) -> Vec<u8> {
  std::fs::read(resource_path(name)).expect("Fixture missing")
}

/// All fixtures under the default dataset paths.
pub fn fixture_source() -> MemoryDataSource {
  let paths = DatasetPaths::default();
  MemoryDataSource::new()
    .with_entry(&paths.county, resource("counties.geojson"))
    .with_entry(&paths.precinct, resource("precincts.geojson"))
    .with_entry(&paths.legislative, resource("legislative.geojson"))
    .with_entry(&paths.tribal, resource("tribal.geojson"))
    .with_entry(&paths.polling_locations, resource("polling_locations.json"))
    .with_entry(&paths.post_offices, resource("post_offices.json"))
    .with_entry(&paths.county_auditor, resource("county_auditor.csv"))
}

pub async fn fixture_map() -> PrecinctMap<Scene> {
  let config = Config::default();
  let data = MapData::load(&fixture_source(), &config.datasets).await;
  let scene = Scene::new(config.initial_view.center, config.initial_view.zoom);
  PrecinctMap::new(scene, &config, data)
}
