//! Application state used to gate command availability.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Lifecycle state of the simulation kernel.
///
/// Commands declare the states they are available in; the [`UiManager`]
/// refuses a command issued in any other state.
///
/// [`UiManager`]: crate::UiManager
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum ApplicationState {
    /// Kernel constructed, no geometry or physics built yet.
    #[default]
    PreInit,
    /// Kernel initialized and waiting for commands.
    Idle,
}

impl ApplicationState {
    /// All states, for commands available everywhere.
    pub const ALL: [ApplicationState; 2] = [ApplicationState::PreInit, ApplicationState::Idle];
}

impl fmt::Display for ApplicationState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::PreInit => f.write_str("PreInit"),
            Self::Idle => f.write_str("Idle"),
        }
    }
}
