//! Current drawing tool selection.

use tracing::warn;

use crate::note::{Color, Effect, Instrument, Note, Point, VisualEffect, DEFAULT_PITCH, MAX_PITCH};

/// Default brush size in canvas points.
pub const DEFAULT_BRUSH_SIZE: f64 = 30.0;

/// Settings new notes are created from.
#[derive(Debug, Clone, PartialEq)]
pub struct ToolSettings {
    color: Color,
    pitch: u8,
    instrument: Instrument,
    effect: Effect,
    visual_effect: VisualEffect,
    brush_size: f64,
}

impl Default for ToolSettings {
    fn default() -> Self {
        Self {
            color: Color::default(),
            pitch: DEFAULT_PITCH,
            instrument: Instrument::default(),
            effect: Effect::default(),
            visual_effect: VisualEffect::default(),
            brush_size: DEFAULT_BRUSH_SIZE,
        }
    }
}

impl ToolSettings {
    pub fn color(&self) -> Color {
        self.color
    }

    pub fn set_color(&mut self, color: Color) {
        self.color = color;
    }

    pub fn pitch(&self) -> u8 {
        self.pitch
    }

    /// Pitches above 127 are clamped.
    pub fn set_pitch(&mut self, pitch: u8) {
        self.pitch = pitch.min(MAX_PITCH);
    }

    pub fn instrument(&self) -> Instrument {
        self.instrument
    }

    pub fn set_instrument(&mut self, instrument: Instrument) {
        self.instrument = instrument;
    }

    pub fn effect(&self) -> Effect {
        self.effect
    }

    pub fn set_effect(&mut self, effect: Effect) {
        self.effect = effect;
    }

    pub fn visual_effect(&self) -> VisualEffect {
        self.visual_effect
    }

    pub fn set_visual_effect(&mut self, visual_effect: VisualEffect) {
        self.visual_effect = visual_effect;
    }

    pub fn brush_size(&self) -> f64 {
        self.brush_size
    }

    /// Set the brush size. Non-positive and non-finite sizes are ignored.
    pub fn set_brush_size(&mut self, size: f64) {
        if !(size.is_finite() && size > 0.0) {
            warn!(size, "brush size must be positive");
            return;
        }
        self.brush_size = size;
    }

    /// A fresh note at `position` drawn with these settings.
    pub fn note_at(&self, position: Point) -> Note {
        Note::new(
            self.pitch,
            self.color,
            position,
            self.brush_size,
            self.instrument,
            self.effect,
            self.visual_effect,
        )
    }
}
