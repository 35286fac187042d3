//! Run management: application state, the live world and event loops.

use gdmlview_core::{ApplicationState, Command, GdmlviewError, Messenger, Parameter, ParameterKind};
use gdmlview_geometry::{
    DetectorConstruction, GeometryError, GeometryStore, PhysicalVolumeId, WorldRuntime,
};
use rand::rngs::StdRng;
use thiserror::Error;

use crate::app::Kernel;
use crate::generator::{Event, PrimaryGeneratorAction};
use crate::physics::{GeantinoPhysicsList, PhysicsList, PhysicsTable};

/// Errors raised by run control.
#[derive(Error, Debug)]
pub enum RunError {
    /// Building the detector failed.
    #[error("detector construction failed")]
    Geometry(#[from] GeometryError),

    /// No world volume is registered.
    #[error("no world volume defined - check the geometry and /gdmlview/update")]
    NoWorld,

    /// A run was requested before initialization.
    #[error("kernel is not initialized - use /run/initialize")]
    NotInitialized,

    /// The requested primary generator is not registered.
    #[error("unknown primary generator '{0}'")]
    UnknownGenerator(String),

    /// Negative event counts are rejected.
    #[error("invalid number of events: {0}")]
    InvalidEventCount(i64),
}

/// Outcome of one `beam_on`.
#[derive(Debug, Clone, PartialEq)]
pub struct RunSummary {
    pub run_id: u64,
    pub events: Vec<Event>,
}

/// Owns the geometry store, the world registration and the run state.
pub struct RunManager {
    state: ApplicationState,
    store: GeometryStore,
    world: Option<PhysicalVolumeId>,
    physics: Box<dyn PhysicsList>,
    physics_table: Option<PhysicsTable>,
    next_run_id: u64,
}

impl Default for RunManager {
    fn default() -> Self {
        Self::new(Box::new(GeantinoPhysicsList::default()))
    }
}

impl RunManager {
    pub fn new(physics: Box<dyn PhysicsList>) -> Self {
        Self {
            state: ApplicationState::PreInit,
            store: GeometryStore::new(),
            world: None,
            physics,
            physics_table: None,
            next_run_id: 0,
        }
    }

    pub fn state(&self) -> ApplicationState {
        self.state
    }

    pub fn store(&self) -> &GeometryStore {
        &self.store
    }

    pub fn world(&self) -> Option<PhysicalVolumeId> {
        self.world
    }

    pub fn physics_table(&self) -> Option<&PhysicsTable> {
        self.physics_table.as_ref()
    }

    /// Builds the detector if none is built, constructs physics once and
    /// enters `Idle`.
    ///
    /// A failed detector build leaves the state unchanged.
    pub fn initialize(&mut self, detector: &mut DetectorConstruction) -> Result<(), RunError> {
        if !detector.is_built() || self.world.is_none() {
            detector.rebuild(self)?;
        }
        if self.physics_table.is_none() {
            let table = self.physics.construct();
            log::info!(
                "physics list '{}': {} particles, {} processes",
                self.physics.name(),
                table.particles.len(),
                table.processes.len()
            );
            self.physics_table = Some(table);
        }
        self.store.close();
        self.state = ApplicationState::Idle;
        log::info!("run manager initialized");
        Ok(())
    }

    /// Generates `events` events with the active primary generator.
    pub fn beam_on(
        &mut self,
        events: i64,
        generator: &mut PrimaryGeneratorAction,
        rng: &mut StdRng,
    ) -> Result<RunSummary, RunError> {
        if self.state != ApplicationState::Idle {
            return Err(RunError::NotInitialized);
        }
        if self.world.is_none() {
            return Err(RunError::NoWorld);
        }
        let count = u64::try_from(events).map_err(|_| RunError::InvalidEventCount(events))?;

        self.store.close();
        let run_id = self.next_run_id;
        self.next_run_id += 1;
        let events: Vec<Event> = (0..count)
            .map(|id| generator.generate_primaries(id, rng))
            .collect();
        log::info!("run {run_id}: {} events processed", events.len());
        Ok(RunSummary { run_id, events })
    }
}

impl WorldRuntime for RunManager {
    fn geometry_store(&mut self) -> &mut GeometryStore {
        &mut self.store
    }

    fn define_world_volume(&mut self, world: PhysicalVolumeId) {
        log::debug!("world volume {world} defined");
        self.world = Some(world);
    }

    fn clear_world_volume(&mut self) {
        self.world = None;
    }
}

/// Handles `/run/initialize` and `/run/beamOn`.
#[derive(Debug, Default)]
pub struct RunMessenger;

impl Messenger<Kernel> for RunMessenger {
    fn directories(&self) -> Vec<(String, String)> {
        vec![("/run/".to_string(), "Run control".to_string())]
    }

    fn commands(&self) -> Vec<Command> {
        vec![
            Command::new("/run/initialize")
                .guidance("Build the detector if needed, construct physics and enter Idle."),
            Command::new("/run/beamOn")
                .guidance("Generate primaries for the given number of events.")
                .parameter(Parameter::new("numberOfEvents", ParameterKind::Integer).omittable("1"))
                .available_for(&[ApplicationState::Idle]),
        ]
    }

    fn set_new_value(
        &self,
        target: &mut Kernel,
        command: &Command,
        args: &[String],
    ) -> gdmlview_core::Result<()> {
        let outcome = match command.path() {
            "/run/initialize" => target.initialize(),
            "/run/beamOn" => {
                let events = args[0].parse::<i64>().map_err(|_| GdmlviewError::InvalidParameter {
                    command: command.path().to_string(),
                    parameter: "numberOfEvents".to_string(),
                    value: args[0].clone(),
                })?;
                target.beam_on(events).map(|_| ())
            }
            other => return Err(GdmlviewError::CommandNotFound(other.to_string())),
        };
        outcome.map_err(|err| GdmlviewError::command_failed(command.path(), err))
    }
}

#[cfg(test)]
mod tests {
    use gdmlview_geometry::{
        GeometryConstructor, LogicalVolume, PhysicalVolume, Result as GeometryResult, Shape,
        Solid,
    };
    use rand::SeedableRng;

    use super::*;

    struct UnitBox;

    impl GeometryConstructor for UnitBox {
        fn as_any(&self) -> &dyn std::any::Any {
            self
        }

        fn as_any_mut(&mut self) -> &mut dyn std::any::Any {
            self
        }

        fn name(&self) -> &str {
            "unit-box"
        }

        fn construct(&mut self, store: &mut GeometryStore) -> GeometryResult<PhysicalVolumeId> {
            let solid = store.add_solid(Solid::new(
                "Box",
                Shape::Box {
                    half: glam::DVec3::ONE,
                },
            ))?;
            let lv = store.add_logical_volume(LogicalVolume::new("World", solid, "G4_AIR"))?;
            Ok(store.add_physical_volume(PhysicalVolume::world("World", lv)))
        }
    }

    #[test]
    fn test_initialize_builds_once() {
        let mut run = RunManager::default();
        let mut detector = DetectorConstruction::with_constructor(Box::new(UnitBox));
        run.initialize(&mut detector).unwrap();
        assert_eq!(run.state(), ApplicationState::Idle);
        assert!(run.store().is_closed());
        let generation = run.store().generation();

        run.initialize(&mut detector).unwrap();
        assert_eq!(run.store().generation(), generation);
        assert_eq!(run.physics_table().unwrap().production_cut, 1.0);
    }

    #[test]
    fn test_initialize_failure_keeps_preinit() {
        let mut run = RunManager::default();
        let mut detector = DetectorConstruction::new();
        let err = run.initialize(&mut detector).unwrap_err();
        assert!(matches!(err, RunError::Geometry(GeometryError::NoSource)));
        assert_eq!(run.state(), ApplicationState::PreInit);
        assert!(run.world().is_none());
    }

    #[test]
    fn test_beam_on() {
        let mut run = RunManager::default();
        let mut generator = PrimaryGeneratorAction::new();
        let mut rng = StdRng::seed_from_u64(5);
        assert!(matches!(
            run.beam_on(1, &mut generator, &mut rng),
            Err(RunError::NotInitialized)
        ));

        let mut detector = DetectorConstruction::with_constructor(Box::new(UnitBox));
        run.initialize(&mut detector).unwrap();
        let first = run.beam_on(3, &mut generator, &mut rng).unwrap();
        assert_eq!(first.run_id, 0);
        assert_eq!(first.events.len(), 3);
        let second = run.beam_on(0, &mut generator, &mut rng).unwrap();
        assert_eq!(second.run_id, 1);
        assert!(second.events.is_empty());
        assert!(matches!(
            run.beam_on(-2, &mut generator, &mut rng),
            Err(RunError::InvalidEventCount(-2))
        ));

        run.clear_world_volume();
        assert!(matches!(
            run.beam_on(1, &mut generator, &mut rng),
            Err(RunError::NoWorld)
        ));
    }
}
