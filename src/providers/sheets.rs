//! Sheet sources: where CSV exports come from.
//!
//! The tracker's inputs all live in spreadsheets published as CSV. A
//! [`SheetSource`] hands back the raw CSV text for a sheet id; the Google
//! source downloads the public export, the local source reads previously
//! saved files for offline runs.

use anyhow::{Context, Result, bail};
use async_trait::async_trait;
use std::path::PathBuf;
use tracing::debug;

#[async_trait]
pub trait SheetSource: Send + Sync {
    async fn fetch_csv(&self, id: &str) -> Result<String>;
}

pub struct GoogleSheetSource {
    base_url: String,
    client: reqwest::Client,
}

impl GoogleSheetSource {
    pub fn new(base_url: &str) -> Self {
        GoogleSheetSource {
            base_url: base_url.to_string(),
            client: reqwest::Client::new(),
        }
    }
}

#[async_trait]
impl SheetSource for GoogleSheetSource {
    async fn fetch_csv(&self, id: &str) -> Result<String> {
        let url = format!(
            "{}/spreadsheets/d/{}/export?format=csv",
            self.base_url, id
        );
        debug!("Downloading sheet {id} from {url}");
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .with_context(|| format!("Failed to download sheet {id}"))?;
        if !response.status().is_success() {
            bail!("Failed to download sheet {}: HTTP {}", id, response.status());
        }
        response
            .text()
            .await
            .with_context(|| format!("Failed to read sheet {id} body"))
    }
}

/// Reads `<data_dir>/<id>.csv`; `id` doubles as the file stem.
pub struct LocalSheetSource {
    data_dir: PathBuf,
}

impl LocalSheetSource {
    pub fn new<P: Into<PathBuf>>(data_dir: P) -> Self {
        LocalSheetSource {
            data_dir: data_dir.into(),
        }
    }
}

#[async_trait]
impl SheetSource for LocalSheetSource {
    async fn fetch_csv(&self, id: &str) -> Result<String> {
        let path = self.data_dir.join(format!("{id}.csv"));
        debug!("Reading sheet {id} from {}", path.display());
        tokio::fs::read_to_string(&path)
            .await
            .with_context(|| format!("Failed to read sheet file: {}", path.display()))
    }
}
