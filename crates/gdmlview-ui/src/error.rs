//! Error types for sessions.

use thiserror::Error;

/// Errors that end a session.
#[derive(Error, Debug)]
pub enum SessionError {
    /// No session is registered under the requested name.
    #[error("unrecognized session \"{0}\"")]
    UnknownSession(String),

    /// The session's input or output failed.
    #[error("terminal I/O failed")]
    Io(#[from] std::io::Error),
}

/// A specialized Result type for session operations.
pub type Result<T> = std::result::Result<T, SessionError>;
