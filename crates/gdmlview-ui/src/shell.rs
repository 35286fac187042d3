//! Line-editing flavours for terminal sessions.

use std::io::{self, Write};

use gdmlview_core::ApplicationState;

/// Prompt and line handling specific to one shell flavour.
pub trait Shell {
    fn name(&self) -> &'static str;

    fn prompt(&self, state: ApplicationState, directory: &str) -> String;

    /// Rewrites an input line before execution.
    ///
    /// Returns a message for the user if the line cannot be expanded.
    fn expand(&mut self, line: &str) -> Result<String, String> {
        Ok(line.to_string())
    }

    /// Called with every line that is about to be executed.
    fn record(&mut self, _line: &str) {}

    /// Handles shell-specific commands. Returns true if `line` was consumed.
    fn builtin(&mut self, _line: &str, _out: &mut dyn Write) -> io::Result<bool> {
        Ok(false)
    }
}

/// Plain shell: state prompt, no history.
#[derive(Debug, Clone, Copy, Default)]
pub struct CshShell;

impl Shell for CshShell {
    fn name(&self) -> &'static str {
        "csh"
    }

    fn prompt(&self, state: ApplicationState, _directory: &str) -> String {
        format!("{state}> ")
    }
}

/// Shell with numbered history and `!!` / `!n` recall.
#[cfg(feature = "tcsh")]
#[derive(Debug, Clone, Default)]
pub struct TcshShell {
    history: Vec<String>,
}

#[cfg(feature = "tcsh")]
impl TcshShell {
    pub fn history(&self) -> &[String] {
        &self.history
    }
}

#[cfg(feature = "tcsh")]
impl Shell for TcshShell {
    fn name(&self) -> &'static str {
        "tcsh"
    }

    fn prompt(&self, _state: ApplicationState, directory: &str) -> String {
        format!("gdmlview({})[{directory}]> ", self.history.len() + 1)
    }

    fn expand(&mut self, line: &str) -> Result<String, String> {
        let Some(reference) = line.strip_prefix('!') else {
            return Ok(line.to_string());
        };
        if reference == "!" {
            return self
                .history
                .last()
                .cloned()
                .ok_or_else(|| "!!: event not found".to_string());
        }
        reference
            .parse::<usize>()
            .ok()
            .and_then(|n| n.checked_sub(1))
            .and_then(|index| self.history.get(index))
            .cloned()
            .ok_or_else(|| format!("{line}: event not found"))
    }

    fn record(&mut self, line: &str) {
        self.history.push(line.to_string());
    }

    fn builtin(&mut self, line: &str, out: &mut dyn Write) -> io::Result<bool> {
        if line != "history" {
            return Ok(false);
        }
        for (index, entry) in self.history.iter().enumerate() {
            writeln!(out, "{:>4}  {entry}", index + 1)?;
        }
        Ok(true)
    }
}
