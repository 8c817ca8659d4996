//! Runtime configuration.
//!
//! Configuration is loaded in the following order (later overrides earlier):
//! 1. Default values
//! 2. YAML config file (if specified via SCENEFSM_CONFIG)
//! 3. Environment variables

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Host configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Program to run.
    pub program: ProgramConfig,
    /// Tick loop and activation settings.
    pub runtime: RuntimeConfig,
}

impl Config {
    /// Loads configuration from file, then applies environment variable overrides.
    pub fn load() -> Result<Self, ConfigError> {
        let mut config = Self::default();

        if let Ok(path) = std::env::var("SCENEFSM_CONFIG") {
            config = Self::from_file(&path)?;
        }

        config.apply_env_overrides();
        config.validate()?;

        Ok(config)
    }

    /// Loads configuration from a YAML file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::IoError(path.to_path_buf(), e))?;
        let config: Config = serde_yaml::from_str(&content)
            .map_err(|e| ConfigError::ParseError(path.to_path_buf(), e.to_string()))?;
        Ok(config)
    }

    /// Loads configuration from environment variables only.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        config.apply_env_overrides();
        config
    }

    fn apply_env_overrides(&mut self) {
        self.program.apply_env_overrides();
        self.runtime.apply_env_overrides();
    }

    /// Checks values that serde cannot.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.runtime.validate()
    }

    /// Saves configuration to a YAML file.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let path = path.as_ref();
        let content = serde_yaml::to_string(self)
            .map_err(|e| ConfigError::ParseError(path.to_path_buf(), e.to_string()))?;
        std::fs::write(path, content).map_err(|e| ConfigError::IoError(path.to_path_buf(), e))?;
        Ok(())
    }
}

/// Program source configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProgramConfig {
    /// Path to the state machine program.
    pub path: PathBuf,
}

impl Default for ProgramConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("./machine.fsm"),
        }
    }
}

impl ProgramConfig {
    fn apply_env_overrides(&mut self) {
        if let Ok(path) = std::env::var("SCENEFSM_PROGRAM") {
            self.path = PathBuf::from(path);
        }
    }
}

/// Runtime configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RuntimeConfig {
    /// Interval between interpreter ticks in milliseconds.
    pub tick_interval_ms: u64,
    /// Time the simulated activator takes per load or unload.
    pub activation_latency_ms: u64,
    /// Print every transition to stdout.
    pub echo_transitions: bool,
    /// Capacity of the transition broadcast channel.
    pub transition_buffer: usize,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            tick_interval_ms: 16,
            activation_latency_ms: 0,
            echo_transitions: true,
            transition_buffer: 64,
        }
    }
}

impl RuntimeConfig {
    fn apply_env_overrides(&mut self) {
        if let Ok(ms) = std::env::var("SCENEFSM_TICK_MS") {
            if let Ok(n) = ms.parse() {
                self.tick_interval_ms = n;
            }
        }

        if let Ok(ms) = std::env::var("SCENEFSM_ACTIVATION_LATENCY_MS") {
            if let Ok(n) = ms.parse() {
                self.activation_latency_ms = n;
            }
        }

        if let Ok(echo) = std::env::var("SCENEFSM_ECHO_TRANSITIONS") {
            self.echo_transitions = echo == "1" || echo.to_lowercase() == "true";
        }
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.tick_interval_ms == 0 {
            return Err(ConfigError::ValidationError(
                "tick_interval_ms must be greater than zero".to_string(),
            ));
        }
        if self.transition_buffer == 0 {
            return Err(ConfigError::ValidationError(
                "transition_buffer must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }

    /// Returns the tick interval as Duration.
    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms)
    }

    /// Returns the activation latency as Duration.
    pub fn activation_latency(&self) -> Duration {
        Duration::from_millis(self.activation_latency_ms)
    }
}

/// Configuration error.
#[derive(Debug)]
pub enum ConfigError {
    IoError(PathBuf, std::io::Error),
    ParseError(PathBuf, String),
    ValidationError(String),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::IoError(path, e) => {
                write!(f, "failed to read config file '{}': {}", path.display(), e)
            }
            ConfigError::ParseError(path, e) => {
                write!(f, "failed to parse config file '{}': {}", path.display(), e)
            }
            ConfigError::ValidationError(msg) => {
                write!(f, "configuration validation failed: {}", msg)
            }
        }
    }
}

impl std::error::Error for ConfigError {}
