use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::data::chart::ChartKind;
use crate::data::loader::LoadOptions;

/// Environment variable pointing at a config file.
pub const CONFIG_ENV: &str = "RUSTY_DASHBOARD_CONFIG";
/// Config file looked up in the working directory otherwise.
pub const CONFIG_FILE: &str = "rusty-dashboard.json";

// ---------------------------------------------------------------------------
// Dashboard configuration
// ---------------------------------------------------------------------------

/// User preferences. Every field is optional in the file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DashboardConfig {
    /// Rows shown in the preview table.
    pub preview_rows: usize,
    /// Bin count for histograms.
    pub histogram_bins: usize,
    /// Column parsed as timestamps on load (name as written in the file).
    pub date_column: String,
    /// Initial text of the fill-missing input.
    pub default_fill: String,
    /// Chart kind selected after a file is loaded.
    pub default_chart: ChartKind,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            preview_rows: 5,
            histogram_bins: 20,
            date_column: "Date".to_string(),
            default_fill: "0".to_string(),
            default_chart: ChartKind::Line,
        }
    }
}

impl DashboardConfig {
    pub fn load_options(&self) -> LoadOptions {
        LoadOptions {
            date_column: self.date_column.clone(),
        }
    }

    /// Read a config file.
    pub fn from_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading {}", path.display()))?;
        serde_json::from_str(&text).with_context(|| format!("parsing {}", path.display()))
    }

    /// Config from `$RUSTY_DASHBOARD_CONFIG` or `./rusty-dashboard.json`.
    /// A missing file means defaults; a broken one is logged and ignored.
    pub fn discover() -> Self {
        let path = std::env::var_os(CONFIG_ENV)
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(CONFIG_FILE));
        if !path.exists() {
            log::debug!("No config at {}, using defaults", path.display());
            return Self::default();
        }
        match Self::from_file(&path) {
            Ok(config) => {
                log::info!("Loaded config from {}", path.display());
                config
            }
            Err(e) => {
                log::warn!("Ignoring config: {e:#}");
                Self::default()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cfg.json");
        std::fs::write(&path, r#"{ "histogram_bins": 8, "default_chart": "Scatter" }"#).unwrap();
        let config = DashboardConfig::from_file(&path).unwrap();
        assert_eq!(config.histogram_bins, 8);
        assert_eq!(config.default_chart, ChartKind::Scatter);
        assert_eq!(config.preview_rows, 5);
        assert_eq!(config.load_options().date_column, "Date");
    }

    #[test]
    fn test_broken_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cfg.json");
        std::fs::write(&path, "{ not json").unwrap();
        assert!(DashboardConfig::from_file(&path).is_err());
    }
}
