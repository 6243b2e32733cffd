//! Configuration loading
//!
//! `Config` is read from `~/.config/fnschema/config.toml` when present and
//! falls back to defaults section by section:
//!
//! ```toml
//! [general]
//! log_file = "/tmp/fnschema.log"
//! log_level = "debug"
//!
//! [editor]
//! property_naming = "next_free"
//!
//! [ui]
//! builder_width = 55
//! show_help = true
//! ```

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::schema::PropertyNaming;

/// Main configuration structure loaded from config.toml
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub general: GeneralConfig,
    pub editor: EditorConfig,
    pub ui: UiConfig,
}

impl Config {
    /// Load configuration from the default location, falling back to defaults
    pub fn load() -> Result<Self> {
        match Self::default_config_path() {
            Some(path) if path.exists() => Self::load_from(&path),
            _ => Ok(Config::default()),
        }
    }

    /// Load configuration from an explicit file
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;
        Ok(config)
    }

    /// Get the config directory path (~/.config/fnschema)
    pub fn config_dir() -> Option<PathBuf> {
        dirs::home_dir().map(|p| p.join(".config").join("fnschema"))
    }

    /// Get the default config file path
    pub fn default_config_path() -> Option<PathBuf> {
        Self::config_dir().map(|p| p.join("config.toml"))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Where tracing output goes; the terminal belongs to the editor
    pub log_file: PathBuf,
    /// `EnvFilter` directive used when `RUST_LOG` is not set
    pub log_level: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_file: std::env::temp_dir().join("fnschema.log"),
            log_level: "debug".to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct EditorConfig {
    pub property_naming: PropertyNaming,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct UiConfig {
    /// Width of the builder pane, in percent of the screen
    pub builder_width: u16,
    /// Show the key hint bar
    pub show_help: bool,
}

impl Default for UiConfig {
    fn default() -> Self {
        Self {
            builder_width: 50,
            show_help: true,
        }
    }
}

impl UiConfig {
    /// Builder width clamped so both panes stay usable
    pub fn builder_percent(&self) -> u16 {
        self.builder_width.clamp(20, 80)
    }
}
