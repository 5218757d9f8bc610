//! Audio and visual effects, and the effect dispatch that expands a note into voices.
//!
//! Dispatch is a pure function of `(pitch, effect)`. Offsets and velocities are
//! returned unclamped; range handling belongs to the sampler boundary
//! (see [`crate::sampler::VoiceRange`]).

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::ParseNameError;

/// Audio effect applied when a note plays.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Effect {
    #[default]
    None,
    Echo,
    Sparkle,
    /// Visual-only: produces no extra voices.
    Wave,
    Cascade,
    Harmony,
    Arpeggio,
}

/// Visual effect drawn around a note. Never consulted by the scheduler.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VisualEffect {
    #[default]
    None,
    Ripple,
    Starburst,
    Shimmer,
    Pulse,
    Orbit,
}

/// Velocity of echo and sparkle voices.
const SOFT_VELOCITY: i16 = 32;
/// Velocity of harmony and arpeggio voices.
const CHORD_VELOCITY: i16 = 48;
/// Velocity of the first cascade voice; each later step is 10 softer.
const CASCADE_VELOCITY: i16 = 64;

const MAJOR_TRIAD: [i16; 3] = [0, 4, 7];
const MAJOR_ARPEGGIO: [i16; 4] = [0, 4, 7, 12];

/// One extra voice produced by an effect.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EffectVoice {
    /// Delay relative to the note's own start.
    pub delay: Duration,
    /// Absolute pitch (may fall outside 0–127).
    pub pitch: i16,
    /// Velocity (may fall outside 0–127).
    pub velocity: i16,
}

impl EffectVoice {
    fn new(delay_secs: f64, pitch: i16, velocity: i16) -> Self {
        Self {
            delay: Duration::from_secs_f64(delay_secs),
            pitch,
            velocity,
        }
    }
}

impl Effect {
    /// Every effect, in picker order.
    pub const ALL: [Effect; 7] = [
        Effect::None,
        Effect::Echo,
        Effect::Sparkle,
        Effect::Wave,
        Effect::Cascade,
        Effect::Harmony,
        Effect::Arpeggio,
    ];

    pub fn display_name(self) -> &'static str {
        match self {
            Effect::None => "None",
            Effect::Echo => "Echo",
            Effect::Sparkle => "Sparkle",
            Effect::Wave => "Wave",
            Effect::Cascade => "Cascade",
            Effect::Harmony => "Harmony",
            Effect::Arpeggio => "Arpeggio",
        }
    }

    /// Expand a note at `pitch` into this effect's extra voices.
    ///
    /// | Effect   | Voices                                                 |
    /// |----------|--------------------------------------------------------|
    /// | echo     | pitch, velocity 32, delay 0.2                          |
    /// | sparkle  | pitch+12, velocity 32, delay 0.1                       |
    /// | cascade  | pitch+4i, velocity 64−10i, delay 0.15i, i in 0..=3     |
    /// | harmony  | pitch+{0,4,7}, velocity 48, delay 0                    |
    /// | arpeggio | pitch+{0,4,7,12}, velocity 48, delay 0.1·index         |
    /// | none/wave| nothing                                                |
    pub fn voices(self, pitch: u8) -> Vec<EffectVoice> {
        let pitch = i16::from(pitch);
        match self {
            Effect::None | Effect::Wave => Vec::new(),
            Effect::Echo => vec![EffectVoice::new(0.2, pitch, SOFT_VELOCITY)],
            Effect::Sparkle => vec![EffectVoice::new(0.1, pitch + 12, SOFT_VELOCITY)],
            Effect::Cascade => (0..4i16)
                .map(|i| {
                    EffectVoice::new(0.15 * f64::from(i), pitch + 4 * i, CASCADE_VELOCITY - 10 * i)
                })
                .collect(),
            Effect::Harmony => MAJOR_TRIAD
                .iter()
                .map(|&interval| EffectVoice::new(0.0, pitch + interval, CHORD_VELOCITY))
                .collect(),
            Effect::Arpeggio => MAJOR_ARPEGGIO
                .iter()
                .enumerate()
                .map(|(index, &interval)| {
                    EffectVoice::new(0.1 * index as f64, pitch + interval, CHORD_VELOCITY)
                })
                .collect(),
        }
    }
}

impl VisualEffect {
    pub const ALL: [VisualEffect; 6] = [
        VisualEffect::None,
        VisualEffect::Ripple,
        VisualEffect::Starburst,
        VisualEffect::Shimmer,
        VisualEffect::Pulse,
        VisualEffect::Orbit,
    ];

    pub fn display_name(self) -> &'static str {
        match self {
            VisualEffect::None => "None",
            VisualEffect::Ripple => "Ripple",
            VisualEffect::Starburst => "Starburst",
            VisualEffect::Shimmer => "Shimmer",
            VisualEffect::Pulse => "Pulse",
            VisualEffect::Orbit => "Orbit",
        }
    }
}

impl fmt::Display for Effect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

impl fmt::Display for VisualEffect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

impl FromStr for Effect {
    type Err = ParseNameError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = super::normalize_name(s);
        Self::ALL
            .into_iter()
            .find(|e| super::normalize_name(e.display_name()) == wanted)
            .ok_or_else(|| ParseNameError::new("effect", s))
    }
}

impl FromStr for VisualEffect {
    type Err = ParseNameError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = super::normalize_name(s);
        Self::ALL
            .into_iter()
            .find(|e| super::normalize_name(e.display_name()) == wanted)
            .ok_or_else(|| ParseNameError::new("visual effect", s))
    }
}
