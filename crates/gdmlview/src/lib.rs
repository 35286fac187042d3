//! The gdmlview application.
//!
//! Wires the command bus from `gdmlview-core`, the detector from
//! `gdmlview-geometry` and the sessions from `gdmlview-ui` to an in-process
//! kernel: a run manager owning the live geometry, a primary generator, and a
//! visualization manager with text and JSON drivers.

// Documentation lints - internal functions don't need exhaustive panic/error docs
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::must_use_candidate)]

pub mod app;
pub mod cli;
pub mod generator;
pub mod physics;
pub mod random;
pub mod run;
pub mod vis;

pub use app::{startup_commands, Application, Kernel};
pub use cli::{launch, Cli, StartupError};
pub use generator::{Event, PrimaryGeneratorAction, PrimaryVertex};
pub use run::{RunError, RunManager, RunSummary};
pub use vis::{VisError, VisManager};
