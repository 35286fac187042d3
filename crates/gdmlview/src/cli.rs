//! Command-line interface and startup sequence.

use std::path::PathBuf;

use clap::Parser;
use gdmlview_core::{error_chain, GdmlviewError, Options};
use gdmlview_ui::{build_session_registry, SessionError};
use thiserror::Error;

use crate::app::{startup_commands, Application, Kernel};
use crate::random;

#[derive(Parser, Debug, Clone)]
#[command(name = "gdmlview", version)]
#[command(about = "Interactive viewer for GDML detector geometries", long_about = None)]
pub struct Cli {
    /// Interactive session to start; an empty name runs the startup commands only
    #[arg(short, long, default_value = "qt")]
    pub shell: String,

    /// GDML file to load
    #[arg(short = 'f', long = "gdml-file", value_name = "FILE")]
    pub gdml_file: Option<String>,

    /// GDML file to load, when --gdml-file is not given
    #[arg(value_name = "FILE", conflicts_with = "gdml_file")]
    pub file: Option<String>,

    /// JSON options file
    #[arg(short, long, value_name = "PATH")]
    pub options: Option<PathBuf>,

    /// Raise the log level (-v info, -vv debug)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,
}

impl Cli {
    /// The GDML file named by the flag or the positional argument.
    ///
    /// An empty name counts as absent.
    pub fn gdml_source(&self) -> Option<&str> {
        self.gdml_file
            .as_deref()
            .or(self.file.as_deref())
            .filter(|path| !path.is_empty())
    }

    pub fn log_level(&self) -> log::LevelFilter {
        match self.verbose {
            0 => log::LevelFilter::Warn,
            1 => log::LevelFilter::Info,
            _ => log::LevelFilter::Debug,
        }
    }
}

/// Failures that end the program before or after the session.
#[derive(Error, Debug)]
pub enum StartupError {
    #[error("missing file operand")]
    MissingSource,

    #[error("failed to load options")]
    Options(#[source] GdmlviewError),

    #[error("failed to set up the command bus")]
    Commands(#[source] GdmlviewError),

    #[error(transparent)]
    Session(#[from] SessionError),

    /// A path the quoted startup commands cannot carry.
    #[error("cannot pass path containing '\"' to startup commands: {0}")]
    QuotedPath(String),
}

impl StartupError {
    /// The line printed to stderr when startup fails.
    pub fn report(&self) -> String {
        format!("gdmlview: {}", error_chain(self))
    }
}

/// Runs the startup sequence, then the session selected by `cli`.
///
/// `args` are the program arguments handed to the session constructor.
pub fn launch(cli: &Cli, args: &[String]) -> Result<(), StartupError> {
    let options = match &cli.options {
        Some(path) => Options::from_json_file(path).map_err(StartupError::Options)?,
        None => Options::default(),
    };
    let source = cli.gdml_source().ok_or(StartupError::MissingSource)?;
    let startup_macro = options.startup_macro.as_ref().map(|p| p.display().to_string());
    for path in std::iter::once(source).chain(startup_macro.as_deref()) {
        if path.contains('"') {
            return Err(StartupError::QuotedPath(path.to_string()));
        }
    }

    let mut session = if cli.shell.is_empty() {
        log::info!("no session requested, running in batch mode");
        None
    } else {
        let registry = build_session_registry();
        let session = registry
            .create(&cli.shell, args)
            .ok_or_else(|| SessionError::UnknownSession(cli.shell.clone()))?;
        Some(session)
    };

    let rng = random::configure(random::default_policy(options.seed).as_ref());
    let mut app = Application::new(Kernel::new(rng)).map_err(StartupError::Commands)?;

    let failed = app.run_startup(&startup_commands(source, &options));
    if !failed.is_empty() {
        log::warn!("{} startup commands failed", failed.len());
    }

    if let Some(session) = session.as_mut() {
        log::info!("starting {} session", session.name());
        session.session_start(&mut app)?;
    }
    Ok(())
}
