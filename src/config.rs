//! Session configuration: defaults for tools, tempo and samples loaded from ~/.musepaint/config.yaml.

use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::composition::{ToolSettings, DEFAULT_REVERB_AMOUNT, DEFAULT_TEMPO};
use crate::note::{Effect, Instrument, DEFAULT_PITCH};

/// Errors reading an explicit config file.
#[derive(Debug)]
pub enum ConfigError {
    Io(std::io::Error),
    Parse(serde_yaml::Error),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Io(e) => write!(f, "config read error: {e}"),
            ConfigError::Parse(e) => write!(f, "config parse error: {e}"),
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::Io(e) => Some(e),
            ConfigError::Parse(e) => Some(e),
        }
    }
}

impl From<std::io::Error> for ConfigError {
    fn from(e: std::io::Error) -> Self {
        ConfigError::Io(e)
    }
}

impl From<serde_yaml::Error> for ConfigError {
    fn from(e: serde_yaml::Error) -> Self {
        ConfigError::Parse(e)
    }
}

/// Session configuration loaded from YAML. Missing keys take their defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MusePaintConfig {
    /// Directory holding instrument WAV files. None = ~/.musepaint/samples.
    pub samples_dir: Option<PathBuf>,
    pub tempo: f64,
    /// Reverb wet/dry amount, 0–100.
    pub reverb_amount: f64,
    pub brush_size: f64,
    pub pitch: u8,
    pub instrument: Instrument,
    pub effect: Effect,
}

impl Default for MusePaintConfig {
    fn default() -> Self {
        Self {
            samples_dir: None,
            tempo: DEFAULT_TEMPO,
            reverb_amount: DEFAULT_REVERB_AMOUNT,
            brush_size: crate::composition::tools::DEFAULT_BRUSH_SIZE,
            pitch: DEFAULT_PITCH,
            instrument: Instrument::default(),
            effect: Effect::default(),
        }
    }
}

impl MusePaintConfig {
    /// Load config from the standard path (~/.musepaint/config.yaml).
    /// Returns None if the file doesn't exist or doesn't parse.
    pub fn load() -> Option<Self> {
        let path = Self::default_path()?;
        let content = std::fs::read_to_string(path).ok()?;
        serde_yaml::from_str(&content).ok()
    }

    /// Load config from an explicit path.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Ok(serde_yaml::from_str(&content)?)
    }

    pub fn default_path() -> Option<PathBuf> {
        Some(dirs::home_dir()?.join(".musepaint").join("config.yaml"))
    }

    /// The configured samples directory, or ~/.musepaint/samples.
    pub fn samples_dir(&self) -> PathBuf {
        self.samples_dir.clone().unwrap_or_else(|| {
            dirs::home_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join(".musepaint")
                .join("samples")
        })
    }

    /// Apply the configured pitch, brush, instrument and effect to `tools`.
    pub fn apply_to_tools(&self, tools: &mut ToolSettings) {
        tools.set_pitch(self.pitch);
        tools.set_brush_size(self.brush_size);
        tools.set_instrument(self.instrument);
        tools.set_effect(self.effect);
    }
}
