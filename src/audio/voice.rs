//! Sampler voices: repitched sample playback (or a sine tone) with attack/release ramps.

use std::f64::consts::TAU;
use std::sync::Arc;

use crate::note::pitch::{midi_to_freq, pitch_ratio};
use crate::sampler::resource::SAMPLE_ROOT_PITCH;
use crate::sampler::SampleData;

/// Voices beyond this count steal the oldest one.
pub const MAX_VOICES: usize = 32;

const ATTACK_SECS: f32 = 0.005;
const RELEASE_SECS: f32 = 0.15;
/// Level of the fallback tone relative to full velocity.
const TONE_LEVEL: f32 = 0.3;

enum Source {
    Sample { data: Arc<SampleData>, position: f64, step: f64 },
    Tone { phase: f64, step: f64 },
}

/// One sounding voice.
pub struct Voice {
    pitch: u8,
    gain: f32,
    source: Source,
    level: f32,
    attack_step: f32,
    release_step: f32,
    releasing: bool,
}

impl Voice {
    /// Start a voice. Without an instrument sample a sine tone is used.
    pub fn new(
        pitch: u8,
        velocity: u8,
        instrument: Option<&Arc<SampleData>>,
        sample_rate: u32,
    ) -> Self {
        let rate = sample_rate.max(1) as f32;
        let source = match instrument {
            Some(data) => Source::Sample {
                data: data.clone(),
                position: 0.0,
                step: pitch_ratio(pitch, SAMPLE_ROOT_PITCH) * f64::from(data.sample_rate())
                    / f64::from(sample_rate.max(1)),
            },
            None => Source::Tone {
                phase: 0.0,
                step: midi_to_freq(pitch) / f64::from(sample_rate.max(1)),
            },
        };
        Self {
            pitch,
            gain: f32::from(velocity) / 127.0,
            source,
            level: 0.0,
            attack_step: 1.0 / (ATTACK_SECS * rate),
            release_step: 1.0 / (RELEASE_SECS * rate),
            releasing: false,
        }
    }

    pub fn pitch(&self) -> u8 {
        self.pitch
    }

    pub fn is_releasing(&self) -> bool {
        self.releasing
    }

    /// Begin the release ramp.
    pub fn release(&mut self) {
        self.releasing = true;
    }

    /// Whether the voice has gone silent for good.
    pub fn is_finished(&self) -> bool {
        let exhausted = match &self.source {
            Source::Sample { data, position, .. } => *position >= data.len() as f64,
            Source::Tone { .. } => false,
        };
        exhausted || (self.releasing && self.level <= 0.0)
    }

    /// Produce the next mono sample.
    pub fn next_sample(&mut self) -> f32 {
        if self.releasing {
            self.level = (self.level - self.release_step).max(0.0);
        } else if self.level < 1.0 {
            self.level = (self.level + self.attack_step).min(1.0);
        }

        let raw = match &mut self.source {
            Source::Sample {
                data,
                position,
                step,
            } => {
                let s = data.read(*position);
                *position += *step;
                s
            }
            Source::Tone { phase, step } => {
                let s = (*phase * TAU).sin() as f32 * TONE_LEVEL;
                *phase = (*phase + *step).fract();
                s
            }
        };
        raw * self.gain * self.level
    }
}

/// Fixed-capacity pool of voices.
pub struct VoiceBank {
    voices: Vec<Voice>,
    sample_rate: u32,
}

impl VoiceBank {
    pub fn new(sample_rate: u32) -> Self {
        Self {
            voices: Vec::with_capacity(MAX_VOICES),
            sample_rate,
        }
    }

    /// Start a voice, stealing the oldest when full.
    pub fn note_on(&mut self, pitch: u8, velocity: u8, instrument: Option<&Arc<SampleData>>) {
        if self.voices.len() >= MAX_VOICES {
            self.voices.remove(0);
        }
        self.voices
            .push(Voice::new(pitch, velocity, instrument, self.sample_rate));
    }

    pub fn note_off(&mut self, pitch: u8) {
        for voice in self.voices.iter_mut().filter(|v| v.pitch() == pitch) {
            voice.release();
        }
    }

    pub fn all_notes_off(&mut self) {
        for voice in &mut self.voices {
            voice.release();
        }
    }

    pub fn active(&self) -> usize {
        self.voices.len()
    }

    /// Mix every voice into one mono sample, dropping finished voices.
    pub fn next_sample(&mut self) -> f32 {
        let mix = self.voices.iter_mut().map(Voice::next_sample).sum();
        self.voices.retain(|v| !v.is_finished());
        mix
    }
}
