//! Interactive sessions for gdmlview.
//!
//! Sessions are created by name from a [`SessionRegistry`]. Which names are
//! available depends on the enabled features: `csh` is always built, `tcsh`
//! (with command history) comes with the `tcsh` feature.

// Documentation lints - internal functions don't need exhaustive panic/error docs
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::must_use_candidate)]

pub mod error;
pub mod session;
pub mod shell;
pub mod terminal;

pub use error::{Result, SessionError};
pub use session::{build_session_registry, CommandExecutor, Session, SessionRegistry};
#[cfg(feature = "tcsh")]
pub use shell::TcshShell;
pub use shell::{CshShell, Shell};
pub use terminal::{resolve_directory, resolve_path, TerminalSession};
