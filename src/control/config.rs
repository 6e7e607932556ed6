//! Configuration loading for the headless runner.

use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::simulation::scheduler::{DEFAULT_POWER, SimulationConfig};
use crate::simulation::types::{DEFAULT_PAYLOAD, NodeId};

/// Log verbosity accepted in `config.toml`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Trace,
    Debug,
    #[default]
    Info,
    Warn,
    Error,
}

impl LogLevel {
    pub fn to_level_filter(self) -> log::LevelFilter {
        match self {
            LogLevel::Trace => log::LevelFilter::Trace,
            LogLevel::Debug => log::LevelFilter::Debug,
            LogLevel::Info => log::LevelFilter::Info,
            LogLevel::Warn => log::LevelFilter::Warn,
            LogLevel::Error => log::LevelFilter::Error,
        }
    }
}

/// Settings for a simulator run, read from `config.toml`.
///
/// Every key is optional; missing keys take the defaults below.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct SimulatorConfig {
    /// Node that originates injected messages.
    pub origin_node_id: NodeId,
    /// Power for created nodes when the origin node is absent.
    pub default_power: u32,
    /// Payload carried by injected messages.
    pub payload: String,
    pub log_level: LogLevel,
    /// Reload the simulation when the scene file changes on disk.
    pub watch_scene: bool,
}

impl Default for SimulatorConfig {
    fn default() -> Self {
        Self {
            origin_node_id: 0,
            default_power: DEFAULT_POWER,
            payload: DEFAULT_PAYLOAD.to_string(),
            log_level: LogLevel::default(),
            watch_scene: true,
        }
    }
}

impl SimulatorConfig {
    /// Load configuration from a TOML file.
    ///
    /// # Arguments
    /// * `config_path` - Path to the config.toml file
    ///
    /// # Returns
    /// * `Ok(SimulatorConfig)` if the file was successfully loaded and parsed
    /// * `Err(String)` with a descriptive error message otherwise
    pub fn load(config_path: &Path) -> Result<Self, String> {
        let content = std::fs::read_to_string(config_path).map_err(|e| format!("Failed to read config file: {}", e))?;

        Self::parse(&content)
    }

    /// Load the file if it exists. `Ok(None)` means there is no file and the
    /// caller should fall back to defaults.
    pub fn load_if_exists(config_path: &Path) -> Result<Option<Self>, String> {
        if config_path.exists() {
            Self::load(config_path).map(Some)
        } else {
            Ok(None)
        }
    }

    pub fn parse(content: &str) -> Result<Self, String> {
        toml::from_str(content).map_err(|e| format!("Failed to parse config file: {}", e))
    }

    /// Derive the config path from a scene file path.
    ///
    /// Replaces the scene filename with "config.toml" in the same directory.
    pub fn config_path_from_scene(scene_path: &Path) -> PathBuf {
        scene_path.parent().unwrap_or(Path::new(".")).join("config.toml")
    }

    /// Engine-level part of the configuration.
    pub fn simulation_config(&self) -> SimulationConfig {
        SimulationConfig {
            origin_node_id: self.origin_node_id,
            default_power: self.default_power,
            payload: self.payload.clone(),
        }
    }
}
