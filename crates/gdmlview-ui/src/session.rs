//! Sessions and the registry they are created from.

use gdmlview_core::{ApplicationState, Command, DirectoryListing, FactoryRegistry};

use crate::error::Result;

/// What a session needs from the application: a command bus.
pub trait CommandExecutor {
    /// Applies one command line.
    fn apply_command(&mut self, line: &str) -> gdmlview_core::Result<()>;

    /// Lists a command directory, or `None` if it does not exist.
    fn list(&self, directory: &str) -> Option<DirectoryListing>;

    fn find_command(&self, path: &str) -> Option<Command>;

    fn application_state(&self) -> ApplicationState;
}

/// An interactive front end driving a [`CommandExecutor`].
pub trait Session {
    fn name(&self) -> &str;

    /// Runs the session until the user ends it.
    fn session_start(&mut self, executor: &mut dyn CommandExecutor) -> Result<()>;
}

/// Sessions keyed by name, created from the program arguments.
pub type SessionRegistry = FactoryRegistry<[String], dyn Session>;

/// Registers every session compiled into this build.
pub fn build_session_registry() -> SessionRegistry {
    use crate::shell::CshShell;
    use crate::terminal::TerminalSession;

    let mut registry = SessionRegistry::new();
    registry.register("csh", |args: &[String]| -> Box<dyn Session> {
        log::debug!("creating csh session with {} arguments", args.len());
        Box::new(TerminalSession::stdio(CshShell))
    });

    #[cfg(feature = "tcsh")]
    registry.register("tcsh", |args: &[String]| -> Box<dyn Session> {
        log::debug!("creating tcsh session with {} arguments", args.len());
        Box::new(TerminalSession::stdio(crate::shell::TcshShell::default()))
    });

    log::info!("sessions available: {}", registry.ids().join(", "));
    registry
}
