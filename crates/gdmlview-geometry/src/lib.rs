//! Geometry for gdmlview.
//!
//! - [`GeometryStore`] holds the live solids and volumes
//! - [`gdml`] reads GDML documents into the store
//! - [`GeometryConstructor`] is the pluggable build strategy, with
//!   [`GdmlGeometryConstructor`] as the default
//! - [`DetectorConstruction`] owns the active strategy and rebuilds the world
//!   from it, purging the store first
//! - [`DetectorMessenger`] and [`GdmlGeometryMessenger`] expose the
//!   `/gdmlview/` commands

// Documentation lints - internal functions don't need exhaustive panic/error docs
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::missing_errors_doc)]
// Builder patterns return Self which doesn't need must_use
#![allow(clippy::must_use_candidate)]
// GDML attribute names are mirrored in field names
#![allow(clippy::similar_names)]

pub mod constructor;
pub mod detector;
pub mod error;
pub mod gdml;
pub mod messenger;
pub mod solid;
pub mod store;
pub mod volume;

pub use constructor::{GdmlGeometryConstructor, GeometryConstructor};
pub use detector::{DetectorConstruction, DetectorState, WorldRuntime};
pub use error::{GeometryError, Result};
pub use gdml::GdmlDocument;
pub use messenger::{DetectorContext, DetectorMessenger, GdmlGeometryMessenger};
pub use solid::{BooleanOp, Shape, Solid};
pub use store::{GeometryStore, VolumeNode};
pub use volume::{
    LogicalVolume, LogicalVolumeId, PhysicalVolume, PhysicalVolumeId, SolidId, VisAttributes,
};
