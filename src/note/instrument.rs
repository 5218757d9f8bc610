//! Sampler instruments: program numbers and sample resource identifiers.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::ParseNameError;

/// An instrument the sampler can load.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Instrument {
    None,
    #[default]
    Piano,
    Violin,
    Flute,
    Guitar,
    Trumpet,
    Marimba,
    MusicBox,
}

impl Instrument {
    /// Every instrument, in picker order.
    pub const ALL: [Instrument; 8] = [
        Instrument::None,
        Instrument::Piano,
        Instrument::Violin,
        Instrument::Flute,
        Instrument::Guitar,
        Instrument::Trumpet,
        Instrument::Marimba,
        Instrument::MusicBox,
    ];

    /// Human-readable name shown in the instrument picker.
    pub fn display_name(self) -> &'static str {
        match self {
            Instrument::None => "None",
            Instrument::Piano => "Piano",
            Instrument::Violin => "Violin",
            Instrument::Flute => "Flute",
            Instrument::Guitar => "Guitar",
            Instrument::Trumpet => "Trumpet",
            Instrument::Marimba => "Marimba",
            Instrument::MusicBox => "Music Box",
        }
    }

    /// General MIDI program number for this instrument.
    pub fn program_number(self) -> u8 {
        match self {
            Instrument::None => 1,
            Instrument::Piano => 0,
            Instrument::Violin => 40,
            Instrument::Flute => 73,
            Instrument::Guitar => 24,
            Instrument::Trumpet => 56,
            Instrument::Marimba => 12,
            Instrument::MusicBox => 10,
        }
    }

    /// Sample resource file name (e.g. `musicbox.wav`). `None` has no resource.
    pub fn resource_id(self) -> Option<String> {
        match self {
            Instrument::None => None,
            other => {
                let stem: String = other
                    .display_name()
                    .chars()
                    .filter(|c| !c.is_whitespace())
                    .collect::<String>()
                    .to_lowercase();
                Some(format!("{stem}.wav"))
            }
        }
    }
}

impl fmt::Display for Instrument {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

impl FromStr for Instrument {
    type Err = ParseNameError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = super::normalize_name(s);
        Self::ALL
            .into_iter()
            .find(|i| super::normalize_name(i.display_name()) == wanted)
            .ok_or_else(|| ParseNameError::new("instrument", s))
    }
}
