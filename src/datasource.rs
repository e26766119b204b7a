use std::collections::HashMap;
use std::path::PathBuf;

use async_trait::async_trait;
use log::{debug, error};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum TransportError {
  #[error("Request to {url} failed: {message}")]
  Request { url: String, message: String },
  #[error("Request to {url} returned status {status}")]
  Status { url: String, status: u16 },
  #[error("Could not read {path}: {source}")]
  Io {
    path: PathBuf,
    #[source]
    source: std::io::Error,
  },
  #[error("No data at {location}")]
  Missing { location: String },
}

/// Fetches static datasets. `location` is a path relative to the source's base, or an absolute
/// URL.
#[async_trait]
pub trait DataSource: Send + Sync {
  async fn get(&self, location: &str) -> Result<Vec<u8>, TransportError>;
}

fn is_url(location: &str) -> bool {
  location.starts_with("http://") || location.starts_with("https://")
}

/// Picks a http source for URLs and a file source for everything else.
#[must_use]
pub fn data_source_for(base: &str) -> Box<dyn DataSource> {
  if is_url(base) {
    Box::new(HttpDataSource::new(base))
  } else {
    Box::new(FileDataSource::new(PathBuf::from(base)))
  }
}

/// Loads datasets over http.
#[derive(Debug)]
pub struct HttpDataSource {
  base_url: String,
  client: surf::Client,
}

impl HttpDataSource {
  #[must_use]
  pub fn new(base_url: &str) -> Self {
    Self {
      base_url: base_url.trim_end_matches('/').to_string(),
      client: surf::Client::new(),
    }
  }

  fn url_for(&self, location: &str) -> String {
    if is_url(location) {
      location.to_string()
    } else {
      format!("{}/{}", self.base_url, location.trim_start_matches('/'))
    }
  }
}

#[async_trait]
impl DataSource for HttpDataSource {
  async fn get(&self, location: &str) -> Result<Vec<u8>, TransportError> {
    let url = self.url_for(location);
    debug!("Fetching {url}");
    let mut response = self
      .client
      .get(&url)
      .send()
      .await
      .inspect_err(|e| error!("Error when fetching {url}: {e}"))
      .map_err(|e| TransportError::Request {
        url: url.clone(),
        message: e.to_string(),
      })?;

    if !response.status().is_success() {
      return Err(TransportError::Status {
        url,
        status: response.status().into(),
      });
    }

    response
      .body_bytes()
      .await
      .map_err(|e| TransportError::Request {
        url,
        message: e.to_string(),
      })
  }
}

/// Loads datasets from a directory.
#[derive(Debug, Clone)]
pub struct FileDataSource {
  root: PathBuf,
}

impl FileDataSource {
  #[must_use]
  pub fn new(root: PathBuf) -> Self {
    Self { root }
  }
}

#[async_trait]
impl DataSource for FileDataSource {
  async fn get(&self, location: &str) -> Result<Vec<u8>, TransportError> {
    let path = self.root.join(location);
    debug!("Reading {}", path.display());
    tokio::fs::read(&path)
      .await
      .map_err(|source| TransportError::Io { path, source })
  }
}

/// Serves datasets from memory, for embedding and tests.
#[derive(Debug, Clone, Default)]
pub struct MemoryDataSource {
  entries: HashMap<String, Vec<u8>>,
}

impl MemoryDataSource {
  #[must_use]
  pub fn new() -> Self {
    Self::default()
  }

  #[must_use]
  pub fn with_entry(mut self, location: &str, data: impl Into<Vec<u8>>) -> Self {
    self.entries.insert(location.to_string(), data.into());
    self
  }
}

#[async_trait]
impl DataSource for MemoryDataSource {
  async fn get(&self, location: &str) -> Result<Vec<u8>, TransportError> {
    self
      .entries
      .get(location)
      .cloned()
      .ok_or_else(|| TransportError::Missing {
        location: location.to_string(),
      })
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn http_urls_are_joined_with_base() {
    let source = HttpDataSource::new("https://example.org/data/");
    assert_eq!(
      source.url_for("/County.geojson"),
      "https://example.org/data/County.geojson"
    );
    assert_eq!(
      source.url_for("https://other.org/x.json"),
      "https://other.org/x.json"
    );
  }

  #[tokio::test]
  async fn file_source_reads_relative_paths() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("a.json"), b"[]").unwrap();
    let source = FileDataSource::new(dir.path().to_path_buf());

    assert_eq!(source.get("a.json").await.unwrap(), b"[]");
    assert!(matches!(
      source.get("missing.json").await,
      Err(TransportError::Io { .. })
    ));
  }

  #[tokio::test]
  async fn memory_source_reports_missing_entries() {
    let source = MemoryDataSource::new().with_entry("a", "x");
    assert_eq!(source.get("a").await.unwrap(), b"x");
    assert!(matches!(
      source.get("b").await,
      Err(TransportError::Missing { .. })
    ));
  }
}
