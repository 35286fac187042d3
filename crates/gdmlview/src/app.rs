//! The kernel every command acts on, and the application wiring it to the
//! command bus.

use std::io::Write;
use std::path::Path;

use gdmlview_core::{
    ApplicationState, Command, CommandTarget, DirectoryListing, Options, UiManager,
};
use gdmlview_geometry::{
    DetectorConstruction, DetectorContext, DetectorMessenger, GdmlGeometryMessenger,
    WorldRuntime,
};
use gdmlview_ui::CommandExecutor;
use rand::rngs::StdRng;

use crate::generator::{GeneratorMessenger, PrimaryGeneratorAction};
use crate::run::{RunError, RunManager, RunMessenger, RunSummary};
use crate::vis::{VisError, VisManager, VisMessenger};

/// Run manager, detector holder, visualization and primary generation,
/// constructed once and passed to every command.
pub struct Kernel {
    run: RunManager,
    detector: DetectorConstruction,
    vis: VisManager,
    generator: PrimaryGeneratorAction,
    rng: StdRng,
    output: Box<dyn Write>,
}

impl Kernel {
    /// Creates a kernel printing to standard output.
    pub fn new(rng: StdRng) -> Self {
        Self::with_output(rng, Box::new(std::io::stdout()))
    }

    pub fn with_output(rng: StdRng, output: Box<dyn Write>) -> Self {
        Self {
            run: RunManager::default(),
            detector: DetectorConstruction::new(),
            vis: VisManager::new(),
            generator: PrimaryGeneratorAction::new(),
            rng,
            output,
        }
    }

    pub fn run(&self) -> &RunManager {
        &self.run
    }

    pub fn detector_construction(&self) -> &DetectorConstruction {
        &self.detector
    }

    pub fn vis(&self) -> &VisManager {
        &self.vis
    }

    pub fn vis_mut(&mut self) -> &mut VisManager {
        &mut self.vis
    }

    pub fn generator(&self) -> &PrimaryGeneratorAction {
        &self.generator
    }

    pub fn generator_mut(&mut self) -> &mut PrimaryGeneratorAction {
        &mut self.generator
    }

    /// Writes one line of command output.
    pub fn print(&mut self, line: &str) -> gdmlview_core::Result<()> {
        writeln!(self.output, "{line}")?;
        Ok(())
    }

    pub fn initialize(&mut self) -> Result<(), RunError> {
        self.run.initialize(&mut self.detector)
    }

    /// Runs `events` events and hands their primaries to the scene.
    pub fn beam_on(&mut self, events: i64) -> Result<RunSummary, RunError> {
        let summary = self
            .run
            .beam_on(events, &mut self.generator, &mut self.rng)?;
        self.vis.record_events(&summary.events);
        Ok(summary)
    }

    /// Draws the live world into the current viewer.
    pub fn flush(&mut self) -> Result<&str, VisError> {
        self.vis.flush(self.run.store(), self.run.world())
    }
}

impl CommandTarget for Kernel {
    fn application_state(&self) -> ApplicationState {
        self.run.state()
    }
}

impl DetectorContext for Kernel {
    fn detector(&mut self) -> &mut DetectorConstruction {
        &mut self.detector
    }

    fn detector_and_runtime(&mut self) -> (&mut DetectorConstruction, &mut dyn WorldRuntime) {
        (&mut self.detector, &mut self.run)
    }
}

/// The command bus and the kernel it drives.
pub struct Application {
    ui: UiManager<Kernel>,
    kernel: Kernel,
}

impl Application {
    /// Registers every messenger on a fresh command bus.
    pub fn new(kernel: Kernel) -> gdmlview_core::Result<Self> {
        let mut ui = UiManager::new();
        ui.add_messenger(Box::new(DetectorMessenger))?;
        ui.add_messenger(Box::new(GdmlGeometryMessenger))?;
        ui.add_messenger(Box::new(RunMessenger))?;
        ui.add_messenger(Box::new(GeneratorMessenger))?;
        ui.add_messenger(Box::new(VisMessenger))?;
        log::debug!("{} commands registered", ui.command_paths().count());
        Ok(Self { ui, kernel })
    }

    pub fn kernel(&self) -> &Kernel {
        &self.kernel
    }

    pub fn kernel_mut(&mut self) -> &mut Kernel {
        &mut self.kernel
    }

    pub fn ui(&self) -> &UiManager<Kernel> {
        &self.ui
    }

    pub fn execute_macro(&mut self, path: &Path) -> gdmlview_core::Result<()> {
        self.ui.execute_macro(&mut self.kernel, path)
    }

    /// Applies each startup command in order and returns the failed lines.
    ///
    /// A failure does not stop the remaining commands.
    pub fn run_startup(&mut self, commands: &[String]) -> Vec<String> {
        let mut failed = Vec::new();
        for line in commands {
            if let Err(err) = self.ui.apply_command(&mut self.kernel, line) {
                log::warn!("{line}: {}", gdmlview_core::error_chain(&err));
                failed.push(line.clone());
            }
        }
        failed
    }
}

impl CommandExecutor for Application {
    fn apply_command(&mut self, line: &str) -> gdmlview_core::Result<()> {
        self.ui.apply_command(&mut self.kernel, line)
    }

    fn list(&self, directory: &str) -> Option<DirectoryListing> {
        self.ui.list(directory)
    }

    fn find_command(&self, path: &str) -> Option<Command> {
        self.ui.find_command(path).cloned()
    }

    fn application_state(&self) -> ApplicationState {
        self.kernel.application_state()
    }
}

/// The command sequence run before the session starts.
pub fn startup_commands(gdml_file: &str, options: &Options) -> Vec<String> {
    let mut commands = vec![
        format!("/gdmlview/read \"{gdml_file}\""),
        format!("/gdmlview/setup {}", options.setup_name),
        "/run/initialize".to_string(),
        "/vis/scene/create".to_string(),
        format!("/vis/open {} {}", options.vis_driver, options.viewer_size()),
        "/vis/viewer/flush".to_string(),
    ];
    if options.draw_trajectories {
        commands.push("/vis/scene/add/trajectories".to_string());
    }
    if let Some(path) = &options.startup_macro {
        commands.push(format!("/control/execute \"{}\"", path.display()));
    }
    commands
}
