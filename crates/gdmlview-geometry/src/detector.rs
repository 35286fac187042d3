//! The geometry strategy holder.

use crate::constructor::{GdmlGeometryConstructor, GeometryConstructor};
use crate::error::{GeometryError, Result};
use crate::store::GeometryStore;
use crate::volume::PhysicalVolumeId;

/// Runtime services the detector needs during a rebuild.
///
/// Implemented by the run manager, which owns the store and the world
/// registration.
pub trait WorldRuntime {
    fn geometry_store(&mut self) -> &mut GeometryStore;

    /// Registers `world` as the world to simulate and draw.
    fn define_world_volume(&mut self, world: PhysicalVolumeId);

    /// Forgets the registered world.
    fn clear_world_volume(&mut self);
}

/// Whether a world is currently built.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DetectorState {
    #[default]
    Clean,
    Built,
}

/// Owns the active geometry constructor and rebuilds the world from it.
///
/// Configuration never touches the live geometry; only [`rebuild`] does,
/// and it always tears the previous world down first.
///
/// [`rebuild`]: DetectorConstruction::rebuild
pub struct DetectorConstruction {
    constructor: Box<dyn GeometryConstructor>,
    state: DetectorState,
}

impl Default for DetectorConstruction {
    fn default() -> Self {
        Self::new()
    }
}

impl DetectorConstruction {
    /// Creates a holder with an unconfigured GDML constructor.
    pub fn new() -> Self {
        Self::with_constructor(Box::new(GdmlGeometryConstructor::new()))
    }

    pub fn with_constructor(constructor: Box<dyn GeometryConstructor>) -> Self {
        Self {
            constructor,
            state: DetectorState::Clean,
        }
    }

    pub fn state(&self) -> DetectorState {
        self.state
    }

    pub fn is_built(&self) -> bool {
        self.state == DetectorState::Built
    }

    pub fn constructor(&self) -> &dyn GeometryConstructor {
        self.constructor.as_ref()
    }

    /// Applies `f` to the active constructor if it is a `G`.
    ///
    /// The change takes effect at the next rebuild. Fails without calling
    /// `f` if another constructor type is active.
    pub fn configure<G, R>(&mut self, f: impl FnOnce(&mut G) -> R) -> Result<R>
    where
        G: GeometryConstructor,
    {
        let active = self.constructor.name().to_string();
        match self.constructor.as_any_mut().downcast_mut::<G>() {
            Some(constructor) => Ok(f(constructor)),
            None => Err(GeometryError::WrongConstructor {
                expected: std::any::type_name::<G>(),
                active,
            }),
        }
    }

    /// Replaces the active constructor and returns the previous one.
    ///
    /// The live world is left alone until the next rebuild.
    pub fn set_geometry_constructor(
        &mut self,
        constructor: Box<dyn GeometryConstructor>,
    ) -> Box<dyn GeometryConstructor> {
        log::info!("geometry constructor set to '{}'", constructor.name());
        std::mem::replace(&mut self.constructor, constructor)
    }

    /// Tears down the current world and constructs a new one.
    ///
    /// On failure the store is left empty, no world is registered and the
    /// holder is `Clean`.
    pub fn rebuild(&mut self, runtime: &mut dyn WorldRuntime) -> Result<PhysicalVolumeId> {
        runtime.clear_world_volume();
        runtime.geometry_store().clean();
        self.state = DetectorState::Clean;

        match self.constructor.construct(runtime.geometry_store()) {
            Ok(world) => {
                runtime.define_world_volume(world);
                self.state = DetectorState::Built;
                log::info!("world rebuilt by '{}'", self.constructor.name());
                Ok(world)
            }
            Err(err) => {
                runtime.geometry_store().clean();
                log::debug!("construction by '{}' failed: {err}", self.constructor.name());
                Err(err)
            }
        }
    }
}

impl std::fmt::Debug for DetectorConstruction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DetectorConstruction")
            .field("constructor", &self.constructor.name())
            .field("state", &self.state)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct Runtime {
        store: GeometryStore,
        world: Option<PhysicalVolumeId>,
    }

    impl WorldRuntime for Runtime {
        fn geometry_store(&mut self) -> &mut GeometryStore {
            &mut self.store
        }

        fn define_world_volume(&mut self, world: PhysicalVolumeId) {
            self.world = Some(world);
        }

        fn clear_world_volume(&mut self) {
            self.world = None;
        }
    }

    #[test]
    fn test_initial_state() {
        let detector = DetectorConstruction::new();
        assert_eq!(detector.state(), DetectorState::Clean);
        assert_eq!(detector.constructor().name(), "gdml");
    }

    #[test]
    fn test_rebuild_without_source_stays_clean() {
        let mut detector = DetectorConstruction::new();
        let mut runtime = Runtime::default();
        let err = detector.rebuild(&mut runtime).unwrap_err();
        assert!(matches!(err, GeometryError::NoSource));
        assert!(!detector.is_built());
        assert!(runtime.world.is_none());
        assert!(runtime.store.is_empty());
    }

    #[test]
    fn test_configure_gdml() {
        let mut detector = DetectorConstruction::new();
        detector
            .configure(|gdml: &mut GdmlGeometryConstructor| gdml.read("world.gdml"))
            .unwrap();
        let file = detector
            .configure(|gdml: &mut GdmlGeometryConstructor| gdml.gdml_file().to_path_buf())
            .unwrap();
        assert_eq!(file, std::path::Path::new("world.gdml"));
        assert_eq!(detector.state(), DetectorState::Clean);
    }
}
