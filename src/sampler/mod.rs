//! Sampler capability: the voice-triggering backend the scheduler drives.
//!
//! The scheduler only ever talks to a [`Sampler`]: load an instrument, start
//! and stop voices, set the reverb mix. Implementations must be safe to call
//! from both scheduler workers at once.

pub mod engine;
pub mod recording;
pub mod resource;

pub use engine::{EngineSampler, SilentSampler};
pub use recording::{RecordingSampler, SamplerCall};
pub use resource::{InstrumentLibrary, SampleData};

use std::fmt;
use std::path::PathBuf;

use tracing::debug;

use crate::note::MAX_PITCH;

/// MIDI channel every voice is played on.
pub const DEFAULT_CHANNEL: u8 = 0;

/// Velocity of a note's own voice.
pub const NOTE_VELOCITY: u8 = 64;

const MAX_VELOCITY: i16 = 127;

/// Delay line time in seconds. Fixed; not exposed to the scheduler.
pub const DELAY_TIME_SECS: f32 = 0.2;
/// Delay feedback in percent.
pub const DELAY_FEEDBACK_PERCENT: f32 = 30.0;
/// Delay wet/dry mix in percent.
pub const DELAY_WET_DRY_PERCENT: f32 = 40.0;

/// Errors reported by a sampler.
#[derive(Debug)]
pub enum SamplerError {
    /// No sample file exists for the requested resource.
    ResourceMissing(PathBuf),
    /// WAV decoding or I/O error.
    Decode(hound::Error),
    /// The sample file contains no audio.
    Empty(String),
    /// Unsupported bit depth or format.
    UnsupportedFormat(String),
    /// The audio engine rejected a command.
    Engine(String),
}

impl fmt::Display for SamplerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SamplerError::ResourceMissing(path) => {
                write!(f, "instrument resource not found: {}", path.display())
            }
            SamplerError::Decode(e) => write!(f, "WAV error: {e}"),
            SamplerError::Empty(id) => write!(f, "instrument resource {id} contains no samples"),
            SamplerError::UnsupportedFormat(s) => write!(f, "unsupported format: {s}"),
            SamplerError::Engine(e) => write!(f, "audio engine error: {e}"),
        }
    }
}

impl std::error::Error for SamplerError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            SamplerError::Decode(e) => Some(e),
            _ => None,
        }
    }
}

impl From<hound::Error> for SamplerError {
    fn from(e: hound::Error) -> Self {
        SamplerError::Decode(e)
    }
}

/// A sampler-based synthesizer.
pub trait Sampler: Send + Sync {
    /// Load the instrument sample identified by `resource_id` (e.g. `piano.wav`).
    fn load_instrument(&self, resource_id: &str) -> Result<(), SamplerError>;

    /// Start a voice. `pitch` and `velocity` are within 0–127.
    fn start_voice(&self, pitch: u8, velocity: u8, channel: u8);

    /// Release every voice playing `pitch`.
    fn stop_voice(&self, pitch: u8, channel: u8);

    /// Reverb wet/dry mix in percent (0–100).
    fn set_reverb_mix(&self, percent: f32);

    /// Release every pitch on `channel`.
    fn silence_all(&self, channel: u8) {
        for pitch in 0..=MAX_PITCH {
            self.stop_voice(pitch, channel);
        }
    }
}

/// Range policy applied where computed voices meet the sampler.
///
/// Velocities are clamped into 0–127. A pitch outside 0–127 has no sensible
/// nearest note, so such voices are dropped.
pub struct VoiceRange;

impl VoiceRange {
    /// Admit a computed voice, returning the `(pitch, velocity)` to play.
    pub fn admit(pitch: i16, velocity: i16) -> Option<(u8, u8)> {
        let pitch = match u8::try_from(pitch) {
            Ok(p) if p <= MAX_PITCH => p,
            _ => {
                debug!(pitch, "voice outside MIDI range dropped");
                return None;
            }
        };
        let velocity = velocity.clamp(0, MAX_VELOCITY) as u8;
        Some((pitch, velocity))
    }
}
