//! Commands under `/gdmlview/`.

use gdmlview_core::{
    ApplicationState, Command, GdmlviewError, Messenger, Parameter, ParameterKind, Result,
};

use crate::constructor::GdmlGeometryConstructor;
use crate::detector::{DetectorConstruction, WorldRuntime};

/// Access to the detector holder and its runtime from a command target.
pub trait DetectorContext {
    fn detector(&mut self) -> &mut DetectorConstruction;

    /// Borrows the holder and the runtime together for a rebuild.
    fn detector_and_runtime(&mut self) -> (&mut DetectorConstruction, &mut dyn WorldRuntime);
}

const DIRECTORY: &str = "/gdmlview/";

/// Handles `/gdmlview/update`.
#[derive(Debug, Default)]
pub struct DetectorMessenger;

impl<C: DetectorContext> Messenger<C> for DetectorMessenger {
    fn directories(&self) -> Vec<(String, String)> {
        vec![(DIRECTORY.to_string(), "GDML viewer commands".to_string())]
    }

    fn commands(&self) -> Vec<Command> {
        vec![Command::new("/gdmlview/update")
            .guidance("Tear down the current world and rebuild it from the")
            .guidance("configured geometry source.")
            .available_for(&[ApplicationState::Idle])]
    }

    fn set_new_value(&self, target: &mut C, command: &Command, _args: &[String]) -> Result<()> {
        let (detector, runtime) = target.detector_and_runtime();
        detector
            .rebuild(runtime)
            .map(|_| ())
            .map_err(|err| GdmlviewError::command_failed(command.path(), err))
    }
}

/// Handles `/gdmlview/read` and `/gdmlview/setup`.
#[derive(Debug, Default)]
pub struct GdmlGeometryMessenger;

impl<C: DetectorContext> Messenger<C> for GdmlGeometryMessenger {
    fn commands(&self) -> Vec<Command> {
        let states = [ApplicationState::PreInit, ApplicationState::Idle];
        vec![
            Command::new("/gdmlview/read")
                .guidance("Set the GDML file read by the next build.")
                .guidance("Use /gdmlview/update to rebuild after initialization.")
                .parameter(Parameter::new("file", ParameterKind::String).omittable(""))
                .available_for(&states),
            Command::new("/gdmlview/setup")
                .guidance("Select the GDML setup used by the next build.")
                .parameter(Parameter::new("setup", ParameterKind::String))
                .available_for(&states),
        ]
    }

    fn set_new_value(&self, target: &mut C, command: &Command, args: &[String]) -> Result<()> {
        let value = args.first().cloned().unwrap_or_default();
        let detector = target.detector();
        let outcome = match command.path() {
            "/gdmlview/read" => {
                detector.configure(|gdml: &mut GdmlGeometryConstructor| gdml.read(&value))
            }
            "/gdmlview/setup" => {
                detector.configure(|gdml: &mut GdmlGeometryConstructor| gdml.select_setup(&value))
            }
            other => return Err(GdmlviewError::CommandNotFound(other.to_string())),
        };
        outcome.map_err(|err| GdmlviewError::command_failed(command.path(), err))?;
        log::info!("{} {value}", command.path());
        Ok(())
    }
}
