use log::error;

use crate::{
  auditor::AuditorDirectory,
  boundary::{BoundaryLayer, BoundaryStore},
  config::DatasetPaths,
  datasource::DataSource,
  markers::{PollingLocation, PostOffice, parse_polling_locations, parse_post_offices},
};

/// Everything loaded at startup. Each dataset loads on its own, a failed one stays empty.
#[derive(Debug, Default)]
pub struct MapData {
  pub boundaries: BoundaryStore,
  pub auditors: AuditorDirectory,
  pub polling_locations: Vec<PollingLocation>,
  pub post_offices: Vec<PostOffice>,
}

impl MapData {
  pub async fn load(source: &dyn DataSource, paths: &DatasetPaths) -> Self {
    let mut data = Self::default();

    for (layer, location) in [
      (BoundaryLayer::County, &paths.county),
      (BoundaryLayer::Legislative, &paths.legislative),
      (BoundaryLayer::Tribal, &paths.tribal),
      (BoundaryLayer::Precinct, &paths.precinct),
    ] {
      // Failures are logged by the store.
      let _ = data.boundaries.load(source, layer, location).await;
    }

    data.polling_locations = match source.get(&paths.polling_locations).await {
      Ok(bytes) => parse_polling_locations(&bytes)
        .inspect_err(|e| error!("Error loading polling locations: {e}"))
        .unwrap_or_default(),
      Err(e) => {
        error!("Error loading polling locations: {e}");
        Vec::new()
      }
    };

    data.post_offices = match source.get(&paths.post_offices).await {
      Ok(bytes) => parse_post_offices(&bytes)
        .inspect_err(|e| error!("Error loading post offices: {e}"))
        .unwrap_or_default(),
      Err(e) => {
        error!("Error loading post offices: {e}");
        Vec::new()
      }
    };

    data.auditors = AuditorDirectory::load(source, &paths.county_auditor)
      .await
      .inspect_err(|e| error!("Error loading county auditor info: {e}"))
      .unwrap_or_default();

    data
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::{datasource::MemoryDataSource, test_utils::load_resource};

  #[tokio::test]
  async fn missing_datasets_degrade_independently() {
    let paths = DatasetPaths::default();
    let source = MemoryDataSource::new()
      .with_entry(&paths.county, load_resource("counties.geojson"))
      .with_entry(&paths.precinct, "{\"type\": \"Feature\"}")
      .with_entry(&paths.polling_locations, load_resource("polling_locations.json"));

    let data = MapData::load(&source, &paths).await;
    assert!(data.boundaries.is_loaded(BoundaryLayer::County));
    assert!(!data.boundaries.is_loaded(BoundaryLayer::Precinct));
    assert!(!data.boundaries.is_loaded(BoundaryLayer::Legislative));
    assert_eq!(data.polling_locations.len(), 4);
    assert!(data.post_offices.is_empty());
    assert!(data.auditors.is_empty());
  }
}
