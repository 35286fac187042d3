//! Configuration options for gdmlview.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Application options, usually read from a JSON file given with `--options`.
///
/// Every field has a default, so a partial file only overrides what it names.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Options {
    /// Graphics driver opened at startup.
    pub vis_driver: String,

    /// Viewer width in pixels.
    pub viewer_width: u32,

    /// Viewer height in pixels.
    pub viewer_height: u32,

    /// GDML setup selected by the geometry reader.
    pub setup_name: String,

    /// Fixed random seed. `None` seeds from the system time.
    pub seed: Option<u64>,

    /// Macro executed after startup, before the session begins.
    pub startup_macro: Option<PathBuf>,

    /// Whether the startup scene draws trajectories.
    pub draw_trajectories: bool,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            vis_driver: "ATree".to_string(),
            viewer_width: 800,
            viewer_height: 600,
            setup_name: "Default".to_string(),
            seed: None,
            startup_macro: None,
            draw_trajectories: true,
        }
    }
}

impl Options {
    /// Parses options from a JSON string.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Reads options from a JSON file.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)?;
        let options = Self::from_json(&text)?;
        log::info!("loaded options from {}", path.display());
        Ok(options)
    }

    /// Serializes the options as pretty JSON.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Viewer size in the `WIDTHxHEIGHT` form accepted by `/vis/open`.
    pub fn viewer_size(&self) -> String {
        format!("{}x{}", self.viewer_width, self.viewer_height)
    }
}
