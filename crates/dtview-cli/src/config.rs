//! Configuration loading

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::info;

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub boards: BoardsConfig,
    #[serde(default)]
    pub output: OutputConfig,
    #[serde(default, rename = "context")]
    pub contexts: Vec<ContextConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BoardsConfig {
    /// Path to the board index file
    #[serde(default = "default_boards_path")]
    pub path: PathBuf,
}

impl Default for BoardsConfig {
    fn default() -> Self {
        Self {
            path: default_boards_path(),
        }
    }
}

fn default_boards_path() -> PathBuf {
    PathBuf::from("./boards/index.toml")
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    #[serde(default)]
    pub format: OutputFormat,
    /// Print tooltips under each item in text output
    #[serde(default)]
    pub show_tooltips: bool,
    /// Seconds to wait for a stable graph snapshot
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            format: OutputFormat::Text,
            show_tooltips: false,
            timeout_secs: default_timeout(),
        }
    }
}

fn default_timeout() -> u64 {
    5
}

/// One build to show an overview for
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContextConfig {
    pub name: String,
    /// Graph snapshot (JSON)
    pub graph: PathBuf,
    /// Board identifier for the board database
    #[serde(default)]
    pub board: Option<String>,
}

/// Load configuration from file
pub fn load_config(path: &Path) -> Result<Config> {
    if path.exists() {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        info!(path = %path.display(), contexts = config.contexts.len(), "Loaded configuration");
        Ok(config)
    } else {
        info!(
            path = %path.display(),
            "Configuration file not found, using defaults"
        );
        Ok(Config::default())
    }
}

/// Save default configuration to file
pub fn save_default_config(path: &Path) -> Result<()> {
    let config = Config {
        boards: BoardsConfig::default(),
        output: OutputConfig::default(),
        contexts: vec![ContextConfig {
            name: "app".to_string(),
            graph: PathBuf::from("build/zephyr/dtview.json"),
            board: Some("nrf52840dk_nrf52840".to_string()),
        }],
    };

    let mut content = String::from("# dtview configuration\n# format = \"text\" | \"json\"\n\n");
    content.push_str(&toml::to_string_pretty(&config)?);
    std::fs::write(path, content)?;
    Ok(())
}
