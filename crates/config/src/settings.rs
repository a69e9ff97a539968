// Application settings
// Loaded from ~/.config/stockgrid/settings.json

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use stockgrid_core::{GridConfig, SortDirection, WindowParams};

/// Environment variable that overrides `api.baseUrl`.
pub const API_URL_ENV: &str = "STOCKGRID_API_URL";

const MAX_PAGE_SIZE: u32 = 500;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("cannot read {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("cannot parse {path}: {source}")]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    // Backend
    #[serde(rename = "api.baseUrl")]
    pub api_base_url: String,

    #[serde(rename = "api.timeoutSecs")]
    pub api_timeout_secs: u64,

    // Paging
    #[serde(rename = "grid.pageSize")]
    pub page_size: u32,

    #[serde(rename = "grid.sort")]
    pub sort: SortDirection,

    // Navigation and scrolling, in rows
    #[serde(rename = "grid.lookaheadRows")]
    pub lookahead_rows: usize,

    #[serde(rename = "grid.scrollPaddingRows")]
    pub scroll_padding_rows: usize,

    #[serde(rename = "grid.loadMoreThresholdRows")]
    pub load_more_threshold_rows: usize,

    #[serde(rename = "grid.bufferRows")]
    pub buffer_rows: usize,

    #[serde(rename = "grid.overscanRows")]
    pub overscan_rows: usize,

    // Logging
    #[serde(rename = "log.file")]
    pub log_file: Option<PathBuf>,  // None = stockgrid.log next to settings.json

    #[serde(rename = "log.filter")]
    pub log_filter: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            api_base_url: "http://localhost:5000".to_string(),
            api_timeout_secs: 15,
            page_size: 50,
            sort: SortDirection::Asc,
            lookahead_rows: 5,
            scroll_padding_rows: 2,
            load_more_threshold_rows: 10,
            buffer_rows: 5,
            overscan_rows: 3,
            log_file: None,
            log_filter: "info".to_string(),
        }
    }
}

/// Values given on the command line or in the environment. They win over
/// the settings file.
#[derive(Debug, Clone, Default)]
pub struct SettingsOverrides {
    pub api_url: Option<String>,
    pub page_size: Option<u32>,
}

impl Settings {
    /// Get the config directory
    pub fn config_dir() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("stockgrid")
    }

    /// Get the settings file path
    pub fn config_path() -> PathBuf {
        Self::config_dir().join("settings.json")
    }

    /// Load settings from disk, falling back to defaults. Creates a commented
    /// default file on first run.
    pub fn load() -> Self {
        let path = Self::config_path();

        if !path.exists() {
            if let Err(e) = Self::write_default_file(&path) {
                eprintln!("Error writing default settings.json: {}", e);
            }
            return Self::default();
        }

        match Self::load_from(&path) {
            Ok(settings) => settings,
            Err(e) => {
                eprintln!("{}", e);
                eprintln!("Using default settings");
                Self::default()
            }
        }
    }

    /// Load settings from a specific file. Lines starting with `//` are
    /// comments; missing keys take their defaults.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;

        // Strip comments (lines starting with //)
        let cleaned: String = contents
            .lines()
            .filter(|line| !line.trim().starts_with("//"))
            .collect::<Vec<_>>()
            .join("\n");

        let settings: Settings = serde_json::from_str(&cleaned).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(settings.sanitized())
    }

    /// Apply command-line and environment overrides.
    pub fn with_overrides(mut self, overrides: SettingsOverrides) -> Self {
        if let Some(url) = overrides.api_url.filter(|u| !u.trim().is_empty()) {
            self.api_base_url = url.trim().to_string();
        }
        if let Some(size) = overrides.page_size {
            self.page_size = size;
        }
        self.sanitized()
    }

    fn sanitized(mut self) -> Self {
        self.page_size = self.page_size.clamp(1, MAX_PAGE_SIZE);
        self.api_timeout_secs = self.api_timeout_secs.max(1);
        self.api_base_url = self.api_base_url.trim_end_matches('/').to_string();
        if self.log_filter.trim().is_empty() {
            self.log_filter = "info".to_string();
        }
        self
    }

    pub fn api_timeout(&self) -> Duration {
        Duration::from_secs(self.api_timeout_secs)
    }

    /// Where log lines go.
    pub fn log_path(&self) -> PathBuf {
        self.log_file
            .clone()
            .unwrap_or_else(|| Self::config_dir().join("stockgrid.log"))
    }

    /// Grid tuning for a terminal host, where one row is one line.
    pub fn grid_config(&self) -> GridConfig {
        GridConfig {
            page_size: self.page_size,
            sort: self.sort,
            lookahead_rows: self.lookahead_rows,
            scroll_padding_rows: self.scroll_padding_rows,
            load_more_threshold_rows: self.load_more_threshold_rows,
            window: WindowParams {
                item_height: 1,
                buffer_size: self.buffer_rows,
                overscan: self.overscan_rows,
                fallback_count: self.page_size as usize,
            },
        }
    }

    /// Create default settings file with comments
    pub fn write_default_file(path: &Path) -> std::io::Result<()> {
        // Ensure directory exists
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let default_config = r#"{
    // Catalog backend
    "api.baseUrl": "http://localhost:5000",
    "api.timeoutSecs": 15,

    // Paging ("asc" or "desc" by item code)
    "grid.pageSize": 50,
    "grid.sort": "asc",

    // Navigation and scrolling (rows)
    "grid.lookaheadRows": 5,
    "grid.scrollPaddingRows": 2,
    "grid.loadMoreThresholdRows": 10,
    "grid.bufferRows": 5,
    "grid.overscanRows": 3,

    // Logging (null = stockgrid.log in this directory; RUST_LOG overrides the filter)
    "log.file": null,
    "log.filter": "info"
}
"#;

        fs::write(path, default_config)
    }

    /// Get the config file path for display
    pub fn config_path_display() -> String {
        Self::config_path().to_string_lossy().to_string()
    }
}
