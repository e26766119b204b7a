use std::collections::HashMap;

use csv::ReaderBuilder;
use log::{info, warn};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::datasource::{DataSource, TransportError};

#[derive(Error, Debug)]
pub enum ParseError {
  #[error("Failed to fetch county auditor table: {0}")]
  Transport(#[from] TransportError),
  #[error("County auditor table is not valid CSV: {0}")]
  Csv(#[from] csv::Error),
}

/// One row of the county auditor table.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditorInfo {
  #[serde(rename = "County", default)]
  pub county: String,
  #[serde(rename = "Auditor", default)]
  pub auditor: String,
  #[serde(rename = "Phone/Fax/Email", default)]
  pub contact: String,
  #[serde(rename = "Address", default)]
  pub address: String,
}

/// County auditor contacts keyed by county, remembering the row order of the table.
#[derive(Debug, Clone, Default)]
pub struct AuditorDirectory {
  rows: Vec<AuditorInfo>,
  by_county: HashMap<String, usize>,
}

impl AuditorDirectory {
  /// Parses a CSV with a header row. Rows without a county are dropped, a later row for the
  /// same county replaces the earlier one.
  pub fn parse(data: &[u8]) -> Result<Self, ParseError> {
    let mut reader = ReaderBuilder::new()
      .has_headers(true)
      .flexible(true)
      .trim(csv::Trim::All)
      .from_reader(data);

    reader.headers()?;
    let mut directory = Self::default();
    for (idx, row) in reader.deserialize::<AuditorInfo>().enumerate() {
      match row {
        Ok(row) if row.county.is_empty() => {}
        Ok(row) => directory.insert(row),
        Err(e) => warn!("Skipping county auditor row {idx}: {e}"),
      }
    }
    Ok(directory)
  }

  pub async fn load(source: &dyn DataSource, location: &str) -> Result<Self, ParseError> {
    let data = source.get(location).await?;
    let directory = Self::parse(&data)?;
    info!("Loaded {} county auditor rows", directory.len());
    Ok(directory)
  }

  fn insert(&mut self, row: AuditorInfo) {
    if let Some(&idx) = self.by_county.get(&row.county) {
      self.rows[idx] = row;
    } else {
      self.by_county.insert(row.county.clone(), self.rows.len());
      self.rows.push(row);
    }
  }

  #[must_use]
  pub fn get(&self, county: &str) -> Option<&AuditorInfo> {
    self.by_county.get(county).map(|&idx| &self.rows[idx])
  }

  /// County names in table order, for the county selector.
  #[must_use]
  pub fn county_names(&self) -> Vec<String> {
    self.rows.iter().map(|r| r.county.clone()).collect()
  }

  #[must_use]
  pub fn len(&self) -> usize {
    self.rows.len()
  }

  #[must_use]
  pub fn is_empty(&self) -> bool {
    self.rows.is_empty()
  }
}
