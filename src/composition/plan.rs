//! Composition timing: where each note lands for a given tempo.
//!
//! Note `i` starts at `i * 0.5 / tempo` seconds and the run completes at
//! `n * 0.5 / tempo`. Offsets are computed from the index rather than
//! accumulated, so long compositions do not drift. Offsets too large for a
//! `Duration` saturate at `Duration::MAX`.

use std::time::Duration;

use tracing::warn;

use super::DEFAULT_TEMPO;

/// Spacing between consecutive notes at tempo 1.0, in seconds.
pub const NOTE_SPACING_SECS: f64 = 0.5;

/// Start offsets for every note of a composition, plus its end.
#[derive(Debug, Clone, PartialEq)]
pub struct CompositionPlan {
    tempo: f64,
    offsets: Vec<Duration>,
    completion: Duration,
}

impl CompositionPlan {
    /// Plan `note_count` notes at `tempo`. A non-positive tempo falls back to 1.0.
    pub fn new(note_count: usize, tempo: f64) -> Self {
        let tempo = if tempo.is_finite() && tempo > 0.0 {
            tempo
        } else {
            warn!(tempo, "invalid tempo; planning at {DEFAULT_TEMPO}");
            DEFAULT_TEMPO
        };
        let step = NOTE_SPACING_SECS / tempo;
        let at = |i: usize| {
            Duration::try_from_secs_f64(i as f64 * step).unwrap_or(Duration::MAX)
        };
        Self {
            tempo,
            offsets: (0..note_count).map(at).collect(),
            completion: at(note_count),
        }
    }

    pub fn tempo(&self) -> f64 {
        self.tempo
    }

    /// Start offset of each note, in composition order.
    pub fn offsets(&self) -> &[Duration] {
        &self.offsets
    }

    /// When the playing flag clears after a natural run.
    pub fn completion(&self) -> Duration {
        self.completion
    }
}
