//! Core abstractions for gdmlview.
//!
//! This crate provides the pieces every other gdmlview crate builds on:
//! - [`FactoryRegistry`], the name-keyed constructor registry used to pick
//!   sessions, graphics drivers and primary generators at runtime
//! - [`UiManager`] and the [`Messenger`] trait, the string-keyed command bus
//! - [`ApplicationState`] for command availability
//! - [`Options`] loaded from JSON

// Documentation lints - internal functions don't need exhaustive panic/error docs
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::missing_errors_doc)]
// Builder patterns return Self which doesn't need must_use
#![allow(clippy::must_use_candidate)]

pub mod command;
pub mod error;
pub mod options;
pub mod registry;
pub mod state;

pub use command::{
    tokenize, Command, CommandTarget, DirectoryListing, Messenger, Parameter, ParameterKind,
    UiManager,
};
pub use error::{error_chain, BoxError, GdmlviewError, Result};
pub use options::Options;
pub use registry::FactoryRegistry;
pub use state::ApplicationState;
