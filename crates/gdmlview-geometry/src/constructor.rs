//! Geometry construction strategies.
//!
//! A [`GeometryConstructor`] builds a world into an empty
//! [`GeometryStore`]. [`DetectorConstruction`](crate::DetectorConstruction)
//! owns exactly one and swaps or reconfigures it through downcasting.

use std::any::Any;
use std::path::{Path, PathBuf};

use crate::error::{GeometryError, Result};
use crate::gdml::{GdmlDocument, DEFAULT_SETUP};
use crate::store::GeometryStore;
use crate::volume::PhysicalVolumeId;

/// A strategy that builds a world volume.
pub trait GeometryConstructor: Any {
    /// Returns a reference to self as `Any` for downcasting.
    fn as_any(&self) -> &dyn Any;

    /// Returns a mutable reference to self as `Any` for downcasting.
    fn as_any_mut(&mut self) -> &mut dyn Any;

    /// Short name used in messages.
    fn name(&self) -> &str;

    /// Builds the geometry into `store` and returns the world placement.
    ///
    /// The store is empty and open when this is called. On error the caller
    /// purges whatever was added.
    fn construct(&mut self, store: &mut GeometryStore) -> Result<PhysicalVolumeId>;
}

/// Builds the world from a GDML file.
#[derive(Debug, Clone)]
pub struct GdmlGeometryConstructor {
    gdml_file: PathBuf,
    setup_name: String,
}

impl Default for GdmlGeometryConstructor {
    fn default() -> Self {
        Self {
            gdml_file: PathBuf::new(),
            setup_name: DEFAULT_SETUP.to_string(),
        }
    }
}

impl GdmlGeometryConstructor {
    /// Creates a constructor with no file and the default setup.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a constructor reading `path`.
    pub fn with_file(path: impl Into<PathBuf>) -> Self {
        Self {
            gdml_file: path.into(),
            ..Self::default()
        }
    }

    /// Builder: selects the setup to build.
    #[must_use]
    pub fn with_setup(mut self, setup: impl Into<String>) -> Self {
        self.setup_name = setup.into();
        self
    }

    /// Sets the file read by the next construction.
    pub fn read(&mut self, path: impl Into<PathBuf>) {
        self.gdml_file = path.into();
    }

    /// Sets the setup used by the next construction.
    pub fn select_setup(&mut self, setup: impl Into<String>) {
        self.setup_name = setup.into();
    }

    pub fn gdml_file(&self) -> &Path {
        &self.gdml_file
    }

    pub fn setup_name(&self) -> &str {
        &self.setup_name
    }
}

impl GeometryConstructor for GdmlGeometryConstructor {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }

    fn name(&self) -> &str {
        "gdml"
    }

    fn construct(&mut self, store: &mut GeometryStore) -> Result<PhysicalVolumeId> {
        if self.gdml_file.as_os_str().is_empty() {
            return Err(GeometryError::NoSource);
        }
        let document = GdmlDocument::read_file(&self.gdml_file)?;
        let world = document.build(store, &self.setup_name)?;

        // The reader hides the world; the viewer shows it.
        let world_lv = store.physical_volume(world).logical();
        store.logical_volume_mut(world_lv).set_vis_attributes(None);

        log::info!(
            "constructed '{}' (setup '{}'): {} physical volumes",
            self.gdml_file.display(),
            self.setup_name,
            store.num_physical_volumes()
        );
        Ok(world)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_path_is_no_source() {
        let mut constructor = GdmlGeometryConstructor::new();
        let mut store = GeometryStore::new();
        assert!(matches!(
            constructor.construct(&mut store),
            Err(GeometryError::NoSource)
        ));
        assert!(store.is_empty());
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let mut constructor = GdmlGeometryConstructor::with_file("/nonexistent/detector.gdml");
        let mut store = GeometryStore::new();
        let err = constructor.construct(&mut store).unwrap_err();
        assert!(matches!(err, GeometryError::Io { .. }));
    }

    #[test]
    fn test_configuration() {
        let mut constructor = GdmlGeometryConstructor::with_file("a.gdml").with_setup("Alt");
        assert_eq!(constructor.setup_name(), "Alt");
        constructor.read("b.gdml");
        constructor.select_setup("Default");
        assert_eq!(constructor.gdml_file(), Path::new("b.gdml"));
        assert_eq!(constructor.setup_name(), "Default");
        assert_eq!(constructor.name(), "gdml");
    }
}
