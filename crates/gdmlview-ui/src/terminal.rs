//! Line-oriented terminal session.
//!
//! Besides command lines, the terminal understands a few navigation
//! commands of its own:
//!
//! | Input | Effect |
//! |---|---|
//! | `cd [dir]` | change the current command directory (`/` if omitted) |
//! | `ls [dir]`, `lc [dir]` | list a command directory |
//! | `pwd` | print the current command directory |
//! | `help [path]` | show a command's guidance or list a directory |
//! | `exit` | end the session |
//!
//! Relative command paths are resolved against the current directory.

use std::io::{self, BufRead, Stdout, StdinLock, Write};

use gdmlview_core::{error_chain, tokenize, Command};

use crate::error::Result;
use crate::session::{CommandExecutor, Session};
use crate::shell::Shell;

/// Resolves `path` against the directory `current`, folding `.` and `..`.
///
/// The result is absolute and has no trailing slash, except for the root.
pub fn resolve_path(current: &str, path: &str) -> String {
    let joined = if path.starts_with('/') {
        path.to_string()
    } else {
        format!("{current}/{path}")
    };
    let mut segments: Vec<&str> = Vec::new();
    for segment in joined.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                segments.pop();
            }
            other => segments.push(other),
        }
    }
    format!("/{}", segments.join("/"))
}

/// Like [`resolve_path`], with the trailing slash directories carry.
pub fn resolve_directory(current: &str, path: &str) -> String {
    let resolved = resolve_path(current, path);
    if resolved == "/" {
        resolved
    } else {
        resolved + "/"
    }
}

enum Flow {
    Continue,
    Exit,
}

/// A session reading commands from `R` and writing to `W`.
pub struct TerminalSession<S, R, W> {
    shell: S,
    input: R,
    output: W,
    directory: String,
}

impl<S: Shell> TerminalSession<S, StdinLock<'static>, Stdout> {
    /// A session on the process's standard input and output.
    pub fn stdio(shell: S) -> Self {
        Self::new(shell, io::stdin().lock(), io::stdout())
    }
}

impl<S: Shell, R: BufRead, W: Write> TerminalSession<S, R, W> {
    pub fn new(shell: S, input: R, output: W) -> Self {
        Self {
            shell,
            input,
            output,
            directory: "/".to_string(),
        }
    }

    /// Current command directory, with trailing slash.
    pub fn directory(&self) -> &str {
        &self.directory
    }

    pub fn shell(&self) -> &S {
        &self.shell
    }

    /// Consumes the session, returning its output sink.
    pub fn into_output(self) -> W {
        self.output
    }

    fn dispatch(&mut self, executor: &mut dyn CommandExecutor, line: &str) -> io::Result<Flow> {
        let (head, rest) = line.split_once(char::is_whitespace).unwrap_or((line, ""));
        let args = tokenize(rest);
        let arg = args.first().map(String::as_str);

        match head {
            "exit" => return Ok(Flow::Exit),
            "pwd" => writeln!(self.output, "{}", self.directory)?,
            "cd" => {
                let target = resolve_directory(&self.directory, arg.unwrap_or("/"));
                if executor.list(&target).is_some() {
                    self.directory = target;
                } else {
                    writeln!(self.output, "directory <{target}> is not found")?;
                }
            }
            "ls" | "lc" => {
                let target = resolve_directory(&self.directory, arg.unwrap_or("."));
                self.print_listing(executor, &target)?;
            }
            "help" => match arg {
                None => {
                    let current = self.directory.clone();
                    self.print_listing(executor, &current)?;
                }
                Some(path) => {
                    let resolved = resolve_path(&self.directory, path);
                    if let Some(command) = executor.find_command(&resolved) {
                        self.print_help(&command)?;
                    } else {
                        let directory = resolve_directory(&self.directory, path);
                        self.print_listing(executor, &directory)?;
                    }
                }
            },
            _ => {
                let path = resolve_path(&self.directory, head);
                let command_line = if rest.is_empty() {
                    path
                } else {
                    format!("{path} {rest}")
                };
                if let Err(err) = executor.apply_command(&command_line) {
                    log::debug!("command refused: {command_line}");
                    writeln!(self.output, "{}", error_chain(&err))?;
                }
            }
        }
        Ok(Flow::Continue)
    }

    fn print_listing(&mut self, executor: &dyn CommandExecutor, directory: &str) -> io::Result<()> {
        let Some(listing) = executor.list(directory) else {
            return writeln!(self.output, "directory <{directory}> is not found");
        };

        writeln!(self.output, "Command directory path : {}", listing.path)?;
        if !listing.guidance.is_empty() {
            writeln!(self.output, "{}", listing.guidance)?;
        }
        writeln!(self.output, " Sub-directories :")?;
        for sub in &listing.directories {
            let guidance = executor.list(sub).map(|l| l.guidance).unwrap_or_default();
            writeln!(self.output, "   {sub:<24}{guidance}")?;
        }
        writeln!(self.output, " Commands :")?;
        for path in &listing.commands {
            let name = path.strip_prefix(listing.path.as_str()).unwrap_or(path);
            let summary = executor
                .find_command(path)
                .and_then(|c| c.guidance_lines().first().cloned())
                .unwrap_or_default();
            writeln!(self.output, "   {name:<24}* {summary}")?;
        }
        Ok(())
    }

    fn print_help(&mut self, command: &Command) -> io::Result<()> {
        writeln!(self.output, "Command {}", command.path())?;
        writeln!(self.output, "Guidance :")?;
        for line in command.guidance_lines() {
            writeln!(self.output, "{line}")?;
        }
        for parameter in command.parameters() {
            writeln!(self.output, " Parameter : {}", parameter.name())?;
            writeln!(self.output, "  Parameter type  : {}", parameter.kind().label())?;
            writeln!(self.output, "  Omittable       : {}", parameter.is_omittable())?;
            if let Some(default) = parameter.default_value() {
                writeln!(self.output, "  Default value   : \"{default}\"")?;
            }
            if !parameter.candidate_values().is_empty() {
                writeln!(
                    self.output,
                    "  Candidates      : {}",
                    parameter.candidate_values().join(" ")
                )?;
            }
        }
        Ok(())
    }
}

impl<S: Shell, R: BufRead, W: Write> Session for TerminalSession<S, R, W> {
    fn name(&self) -> &str {
        self.shell.name()
    }

    fn session_start(&mut self, executor: &mut dyn CommandExecutor) -> Result<()> {
        log::info!("{} session started", self.shell.name());
        let mut buffer = String::new();
        loop {
            let prompt = self
                .shell
                .prompt(executor.application_state(), &self.directory);
            write!(self.output, "{prompt}")?;
            self.output.flush()?;

            buffer.clear();
            if self.input.read_line(&mut buffer)? == 0 {
                writeln!(self.output)?;
                break;
            }
            let raw = buffer.trim();
            if raw.is_empty() || raw.starts_with('#') {
                continue;
            }

            let line = match self.shell.expand(raw) {
                Ok(line) => line,
                Err(message) => {
                    writeln!(self.output, "{message}")?;
                    continue;
                }
            };
            if line != raw {
                writeln!(self.output, "{line}")?;
            }
            self.shell.record(&line);

            if self.shell.builtin(&line, &mut self.output)? {
                continue;
            }
            if let Flow::Exit = self.dispatch(executor, &line)? {
                break;
            }
        }
        log::info!("{} session ended", self.shell.name());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_path() {
        assert_eq!(resolve_path("/", "run/beamOn"), "/run/beamOn");
        assert_eq!(resolve_path("/vis/", "open"), "/vis/open");
        assert_eq!(resolve_path("/vis/scene/", "../open"), "/vis/open");
        assert_eq!(resolve_path("/vis/", "/run/initialize"), "/run/initialize");
        assert_eq!(resolve_path("/", ".."), "/");
        assert_eq!(resolve_path("/vis/", "./viewer//flush"), "/vis/viewer/flush");
    }

    #[test]
    fn test_resolve_directory() {
        assert_eq!(resolve_directory("/", "gdmlview"), "/gdmlview/");
        assert_eq!(resolve_directory("/gdmlview/", ".."), "/");
        assert_eq!(resolve_directory("/vis/scene/", "."), "/vis/scene/");
    }
}
