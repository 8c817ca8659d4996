//! Core error types.

use thiserror::Error;

/// Errors from compiling or running a state machine program.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("unknown event: {name}")]
    UnknownEvent { name: String },

    #[error("invalid program: {errors} error(s)")]
    InvalidProgram { errors: usize },

    #[error("program has no start state")]
    NoStartState,

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl CoreError {
    /// Returns a stable error code for display and scripting.
    pub fn error_code(&self) -> &'static str {
        match self {
            CoreError::UnknownEvent { .. } => "UNKNOWN_EVENT",
            CoreError::InvalidProgram { .. } => "INVALID_PROGRAM",
            CoreError::NoStartState => "NO_START_STATE",
            CoreError::Io(_) => "IO_ERROR",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes() {
        let err = CoreError::UnknownEvent {
            name: "jump".into(),
        };
        assert_eq!(err.error_code(), "UNKNOWN_EVENT");
        assert_eq!(err.to_string(), "unknown event: jump");

        let err = CoreError::InvalidProgram { errors: 3 };
        assert_eq!(err.to_string(), "invalid program: 3 error(s)");
        assert_eq!(CoreError::NoStartState.error_code(), "NO_START_STATE");
    }
}
