//! Master limiter: hard ceiling on the sampler output.

/// Output ceiling applied after the effect chain.
pub const DEFAULT_CEILING: f32 = 0.95;

/// Hard limiter clamping samples to `[-ceiling, ceiling]`.
#[derive(Debug, Clone)]
pub struct Limiter {
    ceiling: f32,
}

impl Limiter {
    pub fn new(ceiling: f32) -> Self {
        debug_assert!(ceiling > 0.0 && ceiling <= 1.0);
        Self { ceiling }
    }

    #[inline]
    pub fn process(&self, sample: f32) -> f32 {
        sample.clamp(-self.ceiling, self.ceiling)
    }
}

impl Default for Limiter {
    fn default() -> Self {
        Self::new(DEFAULT_CEILING)
    }
}
