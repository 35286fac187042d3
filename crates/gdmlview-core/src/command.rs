//! String-keyed command bus.
//!
//! Commands live in a directory tree (`/gdmlview/read`, `/vis/viewer/flush`).
//! Components expose their commands through a [`Messenger`]; the
//! [`UiManager`] owns every messenger, validates arguments and application
//! state, and routes each accepted command line to its messenger.

use std::collections::BTreeMap;
use std::path::Path;

use crate::error::{GdmlviewError, Result};
use crate::state::ApplicationState;

const MAX_MACRO_DEPTH: usize = 16;
const EXECUTE_COMMAND: &str = "/control/execute";

/// Type of a command parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParameterKind {
    String,
    Integer,
    Double,
    Boolean,
}

impl ParameterKind {
    /// Lower-case name shown in command help.
    pub fn label(self) -> &'static str {
        match self {
            Self::String => "string",
            Self::Integer => "integer",
            Self::Double => "double",
            Self::Boolean => "boolean",
        }
    }
}

/// A single positional command parameter.
#[derive(Debug, Clone)]
pub struct Parameter {
    name: String,
    kind: ParameterKind,
    omittable: bool,
    default: String,
    candidates: Vec<String>,
}

impl Parameter {
    /// Creates a mandatory parameter.
    pub fn new(name: impl Into<String>, kind: ParameterKind) -> Self {
        Self {
            name: name.into(),
            kind,
            omittable: false,
            default: String::new(),
            candidates: Vec::new(),
        }
    }

    /// Makes the parameter omittable, substituting `default` when absent.
    pub fn omittable(mut self, default: impl Into<String>) -> Self {
        self.omittable = true;
        self.default = default.into();
        self
    }

    /// Restricts accepted values to `candidates`.
    pub fn candidates<I, S>(mut self, candidates: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.candidates = candidates.into_iter().map(Into::into).collect();
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> ParameterKind {
        self.kind
    }

    pub fn is_omittable(&self) -> bool {
        self.omittable
    }

    /// Value substituted when an omittable parameter is absent.
    pub fn default_value(&self) -> Option<&str> {
        self.omittable.then_some(self.default.as_str())
    }

    pub fn candidate_values(&self) -> &[String] {
        &self.candidates
    }

    fn validate(&self, command: &str, value: &str) -> Result<()> {
        let well_typed = match self.kind {
            ParameterKind::String => true,
            ParameterKind::Integer => value.parse::<i64>().is_ok(),
            ParameterKind::Double => value.parse::<f64>().is_ok(),
            ParameterKind::Boolean => parse_bool(value).is_some(),
        };
        let allowed = self.candidates.is_empty() || self.candidates.iter().any(|c| c == value);
        if well_typed && allowed {
            Ok(())
        } else {
            Err(GdmlviewError::InvalidParameter {
                command: command.to_string(),
                parameter: self.name.clone(),
                value: value.to_string(),
            })
        }
    }
}

/// Interprets the boolean spellings accepted by command parameters.
pub fn parse_bool(value: &str) -> Option<bool> {
    match value.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

/// A command definition: path, guidance, parameters and availability.
#[derive(Debug, Clone)]
pub struct Command {
    path: String,
    guidance: Vec<String>,
    parameters: Vec<Parameter>,
    states: Vec<ApplicationState>,
}

impl Command {
    /// Creates a command available in every state.
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            guidance: Vec::new(),
            parameters: Vec::new(),
            states: ApplicationState::ALL.to_vec(),
        }
    }

    /// Appends a line of guidance text.
    pub fn guidance(mut self, text: impl Into<String>) -> Self {
        self.guidance.push(text.into());
        self
    }

    /// Appends a positional parameter.
    pub fn parameter(mut self, parameter: Parameter) -> Self {
        self.parameters.push(parameter);
        self
    }

    /// Restricts the command to the given states.
    pub fn available_for(mut self, states: &[ApplicationState]) -> Self {
        self.states = states.to_vec();
        self
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    /// Directory containing the command, with trailing slash.
    pub fn directory(&self) -> &str {
        self.path
            .rfind('/')
            .map_or("/", |idx| &self.path[..=idx])
    }

    pub fn guidance_lines(&self) -> &[String] {
        &self.guidance
    }

    pub fn parameters(&self) -> &[Parameter] {
        &self.parameters
    }

    pub fn is_available(&self, state: ApplicationState) -> bool {
        self.states.contains(&state)
    }

    /// Matches tokens to parameters, filling defaults and checking types.
    ///
    /// Surplus tokens are folded into a trailing string parameter.
    pub fn parse_arguments(&self, tokens: &[String]) -> Result<Vec<String>> {
        let count = self.parameters.len();
        let folds = tokens.len() > count
            && self
                .parameters
                .last()
                .is_some_and(|p| p.kind == ParameterKind::String);

        if tokens.len() > count && !folds {
            return Err(GdmlviewError::InvalidParameter {
                command: self.path.clone(),
                parameter: "(unexpected)".to_string(),
                value: tokens[count..].join(" "),
            });
        }

        let mut values = Vec::with_capacity(count);
        for (i, parameter) in self.parameters.iter().enumerate() {
            let value = if folds && i + 1 == count {
                tokens[i..].join(" ")
            } else if let Some(token) = tokens.get(i) {
                token.clone()
            } else if parameter.omittable {
                parameter.default.clone()
            } else {
                return Err(GdmlviewError::MissingParameter {
                    command: self.path.clone(),
                    parameter: parameter.name.clone(),
                });
            };
            parameter.validate(&self.path, &value)?;
            values.push(value);
        }
        Ok(values)
    }
}

/// Anything commands are applied to must report its application state.
pub trait CommandTarget {
    fn application_state(&self) -> ApplicationState;
}

/// A group of commands forwarding to one component of the target `C`.
pub trait Messenger<C> {
    /// Command directories introduced by this messenger, with guidance.
    fn directories(&self) -> Vec<(String, String)> {
        Vec::new()
    }

    /// The commands this messenger handles.
    fn commands(&self) -> Vec<Command>;

    /// Applies an accepted command with validated arguments.
    fn set_new_value(&self, target: &mut C, command: &Command, args: &[String]) -> Result<()>;
}

/// Contents of one command directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirectoryListing {
    pub path: String,
    pub guidance: String,
    pub directories: Vec<String>,
    pub commands: Vec<String>,
}

enum Handler {
    Messenger(usize),
    Execute,
}

struct Entry {
    command: Command,
    handler: Handler,
}

/// Command registry and dispatcher.
pub struct UiManager<C> {
    directories: BTreeMap<String, String>,
    commands: BTreeMap<String, Entry>,
    messengers: Vec<Box<dyn Messenger<C>>>,
}

impl<C: CommandTarget> Default for UiManager<C> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C: CommandTarget> UiManager<C> {
    /// Creates a manager holding only the built-in `/control/` commands.
    pub fn new() -> Self {
        let mut manager = Self {
            directories: BTreeMap::new(),
            commands: BTreeMap::new(),
            messengers: Vec::new(),
        };
        manager.add_directory("/", "Command tree root");
        manager.add_directory("/control/", "Macro and session control");
        let execute = Command::new(EXECUTE_COMMAND)
            .guidance("Execute the commands of a macro file, stopping at the first failure")
            .parameter(Parameter::new("macroFile", ParameterKind::String));
        manager.commands.insert(
            EXECUTE_COMMAND.to_string(),
            Entry {
                command: execute,
                handler: Handler::Execute,
            },
        );
        manager
    }

    fn add_directory(&mut self, path: &str, guidance: &str) {
        let path = normalize_directory(path);
        let mut parent = String::from("/");
        for segment in path.split('/').filter(|s| !s.is_empty()) {
            parent.push_str(segment);
            parent.push('/');
            self.directories.entry(parent.clone()).or_default();
        }
        self.directories.entry("/".to_string()).or_default();
        let slot = self.directories.entry(path).or_default();
        if slot.is_empty() {
            *slot = guidance.to_string();
        }
    }

    /// Registers a messenger and all of its commands.
    ///
    /// Fails without registering anything if one of its command paths is
    /// already taken.
    pub fn add_messenger(&mut self, messenger: Box<dyn Messenger<C>>) -> Result<()> {
        let commands = messenger.commands();
        if let Some(taken) = commands
            .iter()
            .find(|c| self.commands.contains_key(c.path()))
        {
            return Err(GdmlviewError::CommandExists(taken.path().to_string()));
        }

        for (path, guidance) in messenger.directories() {
            self.add_directory(&path, &guidance);
        }

        let index = self.messengers.len();
        for command in commands {
            self.add_directory(command.directory(), "");
            log::debug!("registered command {}", command.path());
            self.commands.insert(
                command.path().to_string(),
                Entry {
                    command,
                    handler: Handler::Messenger(index),
                },
            );
        }
        self.messengers.push(messenger);
        Ok(())
    }

    /// Looks up a command by its full path.
    pub fn find_command(&self, path: &str) -> Option<&Command> {
        self.commands.get(path).map(|entry| &entry.command)
    }

    /// Returns true if `path` names a known directory.
    pub fn is_directory(&self, path: &str) -> bool {
        self.directories.contains_key(&normalize_directory(path))
    }

    /// Lists the immediate subdirectories and commands of a directory.
    pub fn list(&self, path: &str) -> Option<DirectoryListing> {
        let path = normalize_directory(path);
        let guidance = self.directories.get(&path)?.clone();
        let directories = self
            .directories
            .keys()
            .filter(|d| parent_directory(d) == Some(path.as_str()))
            .cloned()
            .collect();
        let commands = self
            .commands
            .values()
            .filter(|e| e.command.directory() == path)
            .map(|e| e.command.path().to_string())
            .collect();
        Some(DirectoryListing {
            path,
            guidance,
            directories,
            commands,
        })
    }

    /// All registered command paths in sorted order.
    pub fn command_paths(&self) -> impl Iterator<Item = &str> {
        self.commands.keys().map(String::as_str)
    }

    /// Parses and applies one command line to `target`.
    ///
    /// Blank lines and `#` comments are accepted and ignored.
    pub fn apply_command(&self, target: &mut C, line: &str) -> Result<()> {
        self.apply_at_depth(target, line, 0)
    }

    fn apply_at_depth(&self, target: &mut C, line: &str, depth: usize) -> Result<()> {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            return Ok(());
        }

        let tokens = tokenize(line);
        let Some((path, rest)) = tokens.split_first() else {
            return Ok(());
        };
        let entry = self
            .commands
            .get(path.as_str())
            .ok_or_else(|| GdmlviewError::CommandNotFound(path.clone()))?;

        let state = target.application_state();
        if !entry.command.is_available(state) {
            return Err(GdmlviewError::IllegalApplicationState {
                command: path.clone(),
                state,
            });
        }

        let args = entry.command.parse_arguments(rest)?;
        log::debug!("applying {path} {args:?}");
        match entry.handler {
            Handler::Messenger(index) => {
                self.messengers[index].set_new_value(target, &entry.command, &args)
            }
            Handler::Execute => self.execute_at_depth(target, Path::new(&args[0]), depth + 1),
        }
    }

    /// Applies every line of a macro file in order, stopping at the first
    /// failing line.
    pub fn execute_macro(&self, target: &mut C, path: &Path) -> Result<()> {
        self.execute_at_depth(target, path, 1)
    }

    fn execute_at_depth(&self, target: &mut C, path: &Path, depth: usize) -> Result<()> {
        if depth > MAX_MACRO_DEPTH {
            return Err(GdmlviewError::MacroNesting(path.to_path_buf()));
        }
        let text = std::fs::read_to_string(path)?;
        log::info!("executing macro {}", path.display());
        for (number, line) in text.lines().enumerate() {
            self.apply_at_depth(target, line, depth)
                .map_err(|source| GdmlviewError::MacroFailed {
                    path: path.to_path_buf(),
                    line: number + 1,
                    source: Box::new(source),
                })?;
        }
        Ok(())
    }
}

/// Splits a command line on whitespace, keeping double-quoted runs together.
pub fn tokenize(line: &str) -> Vec<String> {
    let mut tokens = Vec::new();
    let mut current = String::new();
    let mut quoted = false;
    let mut pending = false;

    for ch in line.chars() {
        match ch {
            '"' => {
                quoted = !quoted;
                pending = true;
            }
            c if c.is_whitespace() && !quoted => {
                if pending {
                    tokens.push(std::mem::take(&mut current));
                    pending = false;
                }
            }
            c => {
                current.push(c);
                pending = true;
            }
        }
    }
    if pending {
        tokens.push(current);
    }
    tokens
}

fn normalize_directory(path: &str) -> String {
    let trimmed = path.trim_matches('/');
    if trimmed.is_empty() {
        "/".to_string()
    } else {
        format!("/{trimmed}/")
    }
}

fn parent_directory(path: &str) -> Option<&str> {
    if path == "/" {
        return None;
    }
    let inner = &path[..path.len() - 1];
    inner.rfind('/').map(|idx| &path[..=idx])
}
