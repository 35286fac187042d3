//! Error types for gdmlview.

use std::path::PathBuf;

use thiserror::Error;

use crate::state::ApplicationState;

/// Boxed error carried by failed commands.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// The main error type for the command bus and shared infrastructure.
#[derive(Error, Debug)]
pub enum GdmlviewError {
    /// No command is registered under the given path.
    #[error("command '{0}' not found")]
    CommandNotFound(String),

    /// A command with the given path is already registered.
    #[error("command '{0}' already exists")]
    CommandExists(String),

    /// The command exists but is not available in the current state.
    #[error("command '{command}' is not available in state {state}")]
    IllegalApplicationState {
        command: String,
        state: ApplicationState,
    },

    /// A mandatory parameter was not supplied.
    #[error("command '{command}' is missing parameter '{parameter}'")]
    MissingParameter { command: String, parameter: String },

    /// A parameter could not be interpreted.
    #[error("command '{command}': invalid value '{value}' for parameter '{parameter}'")]
    InvalidParameter {
        command: String,
        parameter: String,
        value: String,
    },

    /// The command was accepted but its handler failed.
    #[error("command '{command}' failed")]
    CommandFailed {
        command: String,
        #[source]
        source: BoxError,
    },

    /// A line of a macro file failed.
    #[error("macro {path}:{line} failed")]
    MacroFailed {
        path: PathBuf,
        line: usize,
        #[source]
        source: Box<GdmlviewError>,
    },

    /// Macros nested deeper than the command bus allows.
    #[error("macro nesting too deep at {0}")]
    MacroNesting(PathBuf),

    /// I/O error.
    #[error("I/O error")]
    IoError(#[from] std::io::Error),

    /// JSON serialization error.
    #[error("JSON error")]
    JsonError(#[from] serde_json::Error),
}

impl GdmlviewError {
    /// Wraps a handler error for the given command.
    pub fn command_failed(
        command: impl Into<String>,
        source: impl Into<BoxError>,
    ) -> Self {
        Self::CommandFailed {
            command: command.into(),
            source: source.into(),
        }
    }
}

/// A specialized Result type for gdmlview operations.
pub type Result<T> = std::result::Result<T, GdmlviewError>;

/// Formats an error followed by each of its sources, separated by `": "`.
pub fn error_chain(err: &(dyn std::error::Error + 'static)) -> String {
    let mut text = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        text.push_str(": ");
        text.push_str(&cause.to_string());
        source = cause.source();
    }
    text
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_chain() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "no such file");
        let inner = GdmlviewError::from(io);
        let outer = GdmlviewError::command_failed("/gdmlview/update", inner);
        assert_eq!(
            error_chain(&outer),
            "command '/gdmlview/update' failed: I/O error: no such file"
        );
    }
}
