// ⚙️ Configuration - JSON config file + environment overrides
// Everything optional: with no file and no env vars the CLI runs on the
// built-in synonym table and default thresholds.

use crate::budget::BudgetLine;
use crate::synonyms::SynonymTable;
use crate::trend::TrendConfig;
use anyhow::{Context as AnyhowContext, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::debug;

/// Environment variables read by [`AppConfig::apply_env`]
pub const ENV_DATA: &str = "LEDGER_DATA";
pub const ENV_SYNONYMS: &str = "LEDGER_SYNONYMS";
pub const ENV_THRESHOLD: &str = "LEDGER_THRESHOLD";
pub const ENV_BIND: &str = "LEDGER_BIND";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Sheet export (CSV) to analyse
    pub data_path: Option<PathBuf>,

    /// Synonym table (JSON); built-in construction defaults when unset
    pub synonyms_path: Option<PathBuf>,

    /// Minimum price increase (percent) that raises an alert
    pub threshold_percent: f64,

    /// Keep only the N largest price increases
    pub max_alerts: Option<usize>,

    /// How long the server reuses a loaded sheet
    pub cache_ttl_secs: u64,

    /// Planned spend per category
    pub budget: Vec<BudgetLine>,

    /// Server listen address
    pub bind_addr: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        AppConfig {
            data_path: None,
            synonyms_path: None,
            threshold_percent: 5.0,
            max_alerts: None,
            cache_ttl_secs: 300,
            budget: Vec::new(),
            bind_addr: "0.0.0.0:3000".to_string(),
        }
    }
}

impl AppConfig {
    /// Load config from a JSON file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read config file: {:?}", path.as_ref()))?;

        AppConfig::from_json_str(&content)
    }

    pub fn from_json_str(json: &str) -> Result<Self> {
        serde_json::from_str(json).context("Failed to parse config JSON")
    }

    /// File (if given) then environment overrides
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(p) => AppConfig::from_file(p)?,
            None => AppConfig::default(),
        };
        config.apply_env()?;
        debug!(?config, "Configuration loaded");
        Ok(config)
    }

    /// Apply `LEDGER_*` environment variables
    pub fn apply_env(&mut self) -> Result<()> {
        self.apply_overrides(|key| std::env::var(key).ok())
    }

    /// Apply overrides from any key lookup (environment, test map)
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(path) = lookup(ENV_DATA) {
            self.data_path = Some(PathBuf::from(path));
        }
        if let Some(path) = lookup(ENV_SYNONYMS) {
            self.synonyms_path = Some(PathBuf::from(path));
        }
        if let Some(raw) = lookup(ENV_THRESHOLD) {
            self.threshold_percent = raw
                .trim()
                .parse()
                .with_context(|| format!("Invalid {}: {:?}", ENV_THRESHOLD, raw))?;
        }
        if let Some(addr) = lookup(ENV_BIND) {
            self.bind_addr = addr;
        }
        Ok(())
    }

    /// Synonym table from `synonyms_path`, or the built-in defaults
    pub fn synonym_table(&self) -> Result<SynonymTable> {
        match &self.synonyms_path {
            Some(path) => SynonymTable::from_file(path),
            None => Ok(SynonymTable::construction_defaults()),
        }
    }

    pub fn trend_config(&self) -> TrendConfig {
        TrendConfig {
            threshold_percent: self.threshold_percent,
            max_results: self.max_alerts,
        }
    }

    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_secs)
    }
}

// ============================================================================
// TESTS
// ============================================================================
