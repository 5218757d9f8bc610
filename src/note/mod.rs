//! Note data model: the unit a canvas tap produces.
//!
//! A [`Note`] carries everything needed to play and draw one tap: pitch,
//! instrument, audio effect, plus opaque drawing metadata (color, position,
//! size, visual effect). Notes are immutable once created.

pub mod effect;
pub mod instrument;
pub mod pitch;

pub use effect::{Effect, EffectVoice, VisualEffect};
pub use instrument::Instrument;
pub use pitch::{note_name, DEFAULT_PITCH, MAX_PITCH};

use std::fmt;

use uuid::Uuid;

/// Unique identifier generated when a note is created.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NoteId(Uuid);

impl NoteId {
    fn generate() -> Self {
        Self(Uuid::new_v4())
    }
}

impl fmt::Display for NoteId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// A position on the canvas. Opaque to the scheduler.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// RGBA color with components in 0.0–1.0. Opaque to the scheduler.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Color {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

impl Color {
    pub const BLUE: Color = Color::rgb(0.0, 0.478, 1.0);

    pub const fn rgb(r: f32, g: f32, b: f32) -> Self {
        Self { r, g, b, a: 1.0 }
    }
}

impl Default for Color {
    fn default() -> Self {
        Self::BLUE
    }
}

/// A placed note.
#[derive(Debug, Clone, PartialEq)]
pub struct Note {
    id: NoteId,
    pitch: u8,
    color: Color,
    position: Point,
    size: f64,
    instrument: Instrument,
    effect: Effect,
    visual_effect: VisualEffect,
}

impl Note {
    /// Create a note with a fresh id. `pitch` above 127 is clamped.
    pub fn new(
        pitch: u8,
        color: Color,
        position: Point,
        size: f64,
        instrument: Instrument,
        effect: Effect,
        visual_effect: VisualEffect,
    ) -> Self {
        Self {
            id: NoteId::generate(),
            pitch: pitch.min(MAX_PITCH),
            color,
            position,
            size,
            instrument,
            effect,
            visual_effect,
        }
    }

    pub fn id(&self) -> NoteId {
        self.id
    }

    pub fn pitch(&self) -> u8 {
        self.pitch
    }

    pub fn color(&self) -> Color {
        self.color
    }

    pub fn position(&self) -> Point {
        self.position
    }

    /// Brush size the note was drawn with.
    pub fn size(&self) -> f64 {
        self.size
    }

    pub fn instrument(&self) -> Instrument {
        self.instrument
    }

    pub fn effect(&self) -> Effect {
        self.effect
    }

    pub fn visual_effect(&self) -> VisualEffect {
        self.visual_effect
    }

    /// Extra voices this note's effect adds on top of its own voice.
    pub fn effect_voices(&self) -> Vec<EffectVoice> {
        self.effect.voices(self.pitch)
    }
}

/// Error returned when parsing an instrument or effect name fails.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseNameError {
    kind: &'static str,
    input: String,
}

impl ParseNameError {
    fn new(kind: &'static str, input: &str) -> Self {
        Self {
            kind,
            input: input.to_string(),
        }
    }
}

impl fmt::Display for ParseNameError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown {}: {}", self.kind, self.input)
    }
}

impl std::error::Error for ParseNameError {}

/// Lower-case and drop separators so "Music Box", "music_box" and "musicbox" match.
fn normalize_name(s: &str) -> String {
    s.chars()
        .filter(|c| !c.is_whitespace() && *c != '_' && *c != '-')
        .flat_map(char::to_lowercase)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn note(pitch: u8, effect: Effect) -> Note {
        Note::new(
            pitch,
            Color::default(),
            Point::new(10.0, 20.0),
            30.0,
            Instrument::Piano,
            effect,
            VisualEffect::Ripple,
        )
    }

    #[test]
    fn ids_are_unique() {
        let a = note(60, Effect::None);
        let b = note(60, Effect::None);
        assert_ne!(a.id(), b.id());
    }

    #[test]
    fn fields_are_preserved() {
        let n = note(64, Effect::Echo);
        assert_eq!(n.pitch(), 64);
        assert_eq!(n.position(), Point::new(10.0, 20.0));
        assert_eq!(n.size(), 30.0);
        assert_eq!(n.instrument(), Instrument::Piano);
        assert_eq!(n.effect(), Effect::Echo);
        assert_eq!(n.visual_effect(), VisualEffect::Ripple);
        assert_eq!(n.color(), Color::BLUE);
    }

    #[test]
    fn pitch_is_clamped_to_midi_range() {
        assert_eq!(note(200, Effect::None).pitch(), MAX_PITCH);
    }

    #[test]
    fn effect_voices_ignore_drawing_metadata() {
        let a = Note::new(
            60,
            Color::rgb(1.0, 0.0, 0.0),
            Point::new(0.0, 0.0),
            10.0,
            Instrument::Flute,
            Effect::Harmony,
            VisualEffect::Orbit,
        );
        let b = note(60, Effect::Harmony);
        assert_eq!(a.effect_voices(), b.effect_voices());
    }

    #[test]
    fn normalize() {
        assert_eq!(normalize_name("Music Box"), "musicbox");
        assert_eq!(normalize_name("music-box"), "musicbox");
    }
}
