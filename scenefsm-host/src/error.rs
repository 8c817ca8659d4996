//! Host error types.

use crate::config::ConfigError;
use thiserror::Error;

/// Host errors.
#[derive(Debug, Error)]
pub enum HostError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("core error: {0}")]
    Core(#[from] scenefsm_core::CoreError),

    #[error("config error: {0}")]
    Config(#[from] ConfigError),

    #[error("program '{path}' has {errors} error(s)")]
    InvalidProgram { path: String, errors: usize },

    #[error("runner shutting down")]
    ShuttingDown,
}

impl HostError {
    /// Returns a stable error code.
    pub fn error_code(&self) -> &'static str {
        match self {
            HostError::Io(_) => "IO_ERROR",
            HostError::Core(e) => e.error_code(),
            HostError::Config(_) => "CONFIG_ERROR",
            HostError::InvalidProgram { .. } => "INVALID_PROGRAM",
            HostError::ShuttingDown => "SHUTTING_DOWN",
        }
    }
}
