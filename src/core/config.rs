use crate::core::market::HistoryVariant;
use anyhow::{Context, Result, bail};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::{fs, path::PathBuf};
use tracing::debug;

pub const DEFAULT_SHEETS_BASE_URL: &str = "https://docs.google.com";
const DEFAULT_GENERATION_DIR: &str = "data/gen";

/// Spreadsheet ids (or file stems when running from local data).
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct SheetsConfig {
    pub transactions: String,
    pub live_market: String,
    /// symbol -> history sheet id
    #[serde(default)]
    pub history: HashMap<String, String>,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct SheetsProviderConfig {
    pub base_url: String,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ProvidersConfig {
    pub sheets: Option<SheetsProviderConfig>,
}

impl Default for ProvidersConfig {
    fn default() -> Self {
        ProvidersConfig {
            sheets: Some(SheetsProviderConfig {
                base_url: DEFAULT_SHEETS_BASE_URL.to_string(),
            }),
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct AppConfig {
    /// Default currency every value is reported in (EUR or USD).
    pub currency: String,
    #[serde(default)]
    pub history_variant: HistoryVariant,
    pub sheets: SheetsConfig,
    #[serde(default)]
    pub providers: ProvidersConfig,
    /// Read sheet exports from `data_dir` instead of downloading.
    #[serde(default)]
    pub use_local_data: bool,
    pub data_dir: Option<String>,
    pub generation_dir: Option<String>,
    /// Maps sheet symbols onto the standard used by the market data,
    /// matched case-insensitively.
    #[serde(default)]
    pub symbol_aliases: HashMap<String, String>,
}

impl AppConfig {
    pub fn load() -> Result<Self> {
        debug!("Loading default config");
        let config_path = Self::default_config_path()?;
        Self::load_from_path(&config_path)
    }

    pub fn default_config_path() -> Result<PathBuf> {
        let proj_dirs = ProjectDirs::from("dev", "folio", "folio")
            .context("Could not determine project directories")?;
        Ok(proj_dirs.config_dir().join("config.yaml"))
    }

    pub fn load_from_path<P: AsRef<std::path::Path>>(path: P) -> Result<Self> {
        let config_str = fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read config file: {}", path.as_ref().display()))?;

        let mut config: Self = serde_yaml::from_str(&config_str)
            .with_context(|| format!("Failed to parse config file: {}", path.as_ref().display()))?;
        config.validate()?;
        debug!("Successfully loaded config");
        Ok(config)
    }

    fn validate(&mut self) -> Result<()> {
        self.currency = self.currency.trim().to_uppercase();
        // Currency alignment pivots between exactly these two.
        if self.currency != "EUR" && self.currency != "USD" {
            bail!("Unsupported default currency: {}", self.currency);
        }
        if self.sheets.transactions.is_empty() {
            bail!("No transactions sheet configured");
        }
        if self.sheets.live_market.is_empty() {
            bail!("No live market sheet configured");
        }
        if self.use_local_data && self.data_dir.is_none() {
            bail!("use_local_data requires data_dir to be set");
        }
        Ok(())
    }

    pub fn generation_path(&self) -> PathBuf {
        self.generation_dir
            .as_deref()
            .unwrap_or(DEFAULT_GENERATION_DIR)
            .into()
    }

    pub fn sheets_base_url(&self) -> &str {
        self.providers
            .sheets
            .as_ref()
            .map_or(DEFAULT_SHEETS_BASE_URL, |p| &p.base_url)
    }
}
