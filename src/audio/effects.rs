//! Sampler effect chain: fixed feedback delay followed by a Schroeder reverb.
//!
//! ```text
//! voices ──→ [Delay 0.2s, fb 30%, wet 40%] ──→ [Reverb, wet = mix] ──→ limiter
//! ```

use crate::sampler::{DELAY_FEEDBACK_PERCENT, DELAY_TIME_SECS, DELAY_WET_DRY_PERCENT};

/// Single-tap feedback delay with a wet/dry mix.
pub struct FeedbackDelay {
    buffer: Vec<f32>,
    write_pos: usize,
    feedback: f32,
    wet: f32,
}

impl FeedbackDelay {
    pub fn new(delay_secs: f32, feedback: f32, wet: f32, sample_rate: u32) -> Self {
        let len = ((delay_secs * sample_rate as f32) as usize).max(1);
        Self {
            buffer: vec![0.0; len],
            write_pos: 0,
            feedback: feedback.clamp(0.0, 0.95),
            wet: wet.clamp(0.0, 1.0),
        }
    }

    /// The sampler's fixed delay: 0.2s, 30% feedback, 40% wet.
    pub fn sampler_default(sample_rate: u32) -> Self {
        Self::new(
            DELAY_TIME_SECS,
            DELAY_FEEDBACK_PERCENT / 100.0,
            DELAY_WET_DRY_PERCENT / 100.0,
            sample_rate,
        )
    }

    pub fn delay_samples(&self) -> usize {
        self.buffer.len()
    }

    pub fn process(&mut self, input: f32) -> f32 {
        let delayed = self.buffer[self.write_pos];
        self.buffer[self.write_pos] = input + delayed * self.feedback;
        self.write_pos = (self.write_pos + 1) % self.buffer.len();
        input * (1.0 - self.wet) + delayed * self.wet
    }
}

struct Comb {
    buffer: Vec<f32>,
    pos: usize,
    feedback: f32,
    damp: f32,
    filter_state: f32,
}

impl Comb {
    fn new(len: usize, feedback: f32, damp: f32) -> Self {
        Self {
            buffer: vec![0.0; len.max(1)],
            pos: 0,
            feedback,
            damp,
            filter_state: 0.0,
        }
    }

    fn process(&mut self, input: f32) -> f32 {
        let output = self.buffer[self.pos];
        self.filter_state = output * (1.0 - self.damp) + self.filter_state * self.damp;
        self.buffer[self.pos] = input + self.filter_state * self.feedback;
        self.pos = (self.pos + 1) % self.buffer.len();
        output
    }
}

struct Allpass {
    buffer: Vec<f32>,
    pos: usize,
    gain: f32,
}

impl Allpass {
    fn new(len: usize, gain: f32) -> Self {
        Self {
            buffer: vec![0.0; len.max(1)],
            pos: 0,
            gain,
        }
    }

    fn process(&mut self, input: f32) -> f32 {
        let delayed = self.buffer[self.pos];
        let output = -self.gain * input + delayed;
        self.buffer[self.pos] = input + self.gain * output;
        self.pos = (self.pos + 1) % self.buffer.len();
        output
    }
}

/// Large-hall Schroeder reverb: four parallel combs into two allpasses.
pub struct Reverb {
    combs: [Comb; 4],
    allpasses: [Allpass; 2],
    wet: f32,
}

const COMB_DELAYS_MS: [f32; 4] = [29.7, 37.1, 41.1, 43.7];
const ALLPASS_DELAYS_MS: [f32; 2] = [5.0, 1.7];
/// Hall-sized rooms stretch the base delays.
const HALL_SCALE: f32 = 1.6;
const HALL_FEEDBACK: f32 = 0.84;
const HALL_DAMP: f32 = 0.3;

impl Reverb {
    pub fn new(sample_rate: u32) -> Self {
        let samples = |ms: f32| (ms * HALL_SCALE * sample_rate as f32 / 1000.0) as usize;
        Self {
            combs: COMB_DELAYS_MS.map(|ms| Comb::new(samples(ms), HALL_FEEDBACK, HALL_DAMP)),
            allpasses: ALLPASS_DELAYS_MS.map(|ms| Allpass::new(samples(ms), 0.5)),
            wet: 0.5,
        }
    }

    /// Wet/dry mix, 0.0–1.0.
    pub fn set_mix(&mut self, wet: f32) {
        self.wet = wet.clamp(0.0, 1.0);
    }

    pub fn mix(&self) -> f32 {
        self.wet
    }

    pub fn process(&mut self, input: f32) -> f32 {
        let combed: f32 = self.combs.iter_mut().map(|c| c.process(input)).sum::<f32>() * 0.25;
        let diffused = self
            .allpasses
            .iter_mut()
            .fold(combed, |signal, ap| ap.process(signal));
        input * (1.0 - self.wet) + diffused * self.wet
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const RATE: u32 = 44100;

    #[test]
    fn delay_length_matches_fixed_time() {
        let d = FeedbackDelay::sampler_default(RATE);
        assert_eq!(d.delay_samples(), 8820);
    }

    #[test]
    fn delay_echoes_an_impulse() {
        let mut d = FeedbackDelay::new(0.5, 0.3, 0.4, 20); // 10 samples
        assert_eq!(d.delay_samples(), 10);
        let first = d.process(1.0);
        assert!((first - 0.6).abs() < 1e-6, "dry part passes immediately");

        // tail[k] is the output k + 1 samples after the impulse.
        let tail: Vec<f32> = (0..25).map(|_| d.process(0.0)).collect();
        assert!(tail[..9].iter().all(|&s| s == 0.0));
        assert!((tail[9] - 0.4).abs() < 1e-6, "first echo after 10 samples");
        assert!((tail[19] - 0.4 * 0.3).abs() < 1e-6, "second echo scaled by feedback");
    }

    #[test]
    fn dry_reverb_is_transparent() {
        let mut r = Reverb::new(RATE);
        r.set_mix(0.0);
        for x in [0.5, -0.25, 1.0] {
            assert!((r.process(x) - x).abs() < 1e-6);
        }
    }

    #[test]
    fn wet_reverb_has_a_tail() {
        let mut r = Reverb::new(RATE);
        r.set_mix(1.0);
        r.process(1.0);
        let tail: Vec<f32> = (0..RATE as usize / 4).map(|_| r.process(0.0)).collect();
        assert!(tail.iter().any(|s| s.abs() > 1e-3));
    }

    #[test]
    fn reverb_stays_finite() {
        let mut r = Reverb::new(RATE);
        r.set_mix(1.0);
        for i in 0..RATE {
            let x = if i % 1000 == 0 { 1.0 } else { 0.0 };
            assert!(r.process(x).is_finite());
        }
    }

    #[test]
    fn mix_is_clamped() {
        let mut r = Reverb::new(RATE);
        r.set_mix(3.0);
        assert_eq!(r.mix(), 1.0);
    }
}
