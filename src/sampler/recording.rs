//! Recording sampler: captures every call with a timestamp instead of making sound.
//!
//! Used by tests to assert on the exact trigger timeline, and by the CLI's
//! dry-run mode to print it.

use std::collections::HashSet;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::{Duration, Instant};

use super::{Sampler, SamplerError};
use crate::schedule::ManualExecutor;

/// One call made on the sampler.
#[derive(Debug, Clone, PartialEq)]
pub enum SamplerCall {
    LoadInstrument(String),
    StartVoice { pitch: u8, velocity: u8, channel: u8 },
    StopVoice { pitch: u8, channel: u8 },
    SetReverbMix(f32),
}

/// A call and the time it was made.
#[derive(Debug, Clone, PartialEq)]
pub struct Recorded {
    pub at: Duration,
    pub call: SamplerCall,
}

enum Clock {
    Wall(Instant),
    Virtual(Arc<ManualExecutor>),
}

impl Clock {
    fn now(&self) -> Duration {
        match self {
            Clock::Wall(start) => start.elapsed(),
            Clock::Virtual(exec) => exec.now(),
        }
    }
}

/// A sampler that records calls.
pub struct RecordingSampler {
    clock: Clock,
    log: Mutex<Vec<Recorded>>,
    missing: Mutex<HashSet<String>>,
}

impl RecordingSampler {
    /// Timestamps calls with wall-clock time since creation.
    pub fn new() -> Self {
        Self::with_clock(Clock::Wall(Instant::now()))
    }

    /// Timestamps calls with the virtual time of `exec`.
    pub fn on_virtual_clock(exec: Arc<ManualExecutor>) -> Self {
        Self::with_clock(Clock::Virtual(exec))
    }

    fn with_clock(clock: Clock) -> Self {
        Self {
            clock,
            log: Mutex::new(Vec::new()),
            missing: Mutex::new(HashSet::new()),
        }
    }

    /// Make `load_instrument` fail for `resource_id`.
    pub fn mark_missing(&self, resource_id: &str) {
        self.missing
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(resource_id.to_string());
    }

    /// Every recorded call with its timestamp.
    pub fn recorded(&self) -> Vec<Recorded> {
        self.log.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }

    /// Every recorded call, without timestamps.
    pub fn calls(&self) -> Vec<SamplerCall> {
        self.recorded().into_iter().map(|r| r.call).collect()
    }

    /// Voice starts as `(time, pitch, velocity)`.
    pub fn starts(&self) -> Vec<(Duration, u8, u8)> {
        self.recorded()
            .into_iter()
            .filter_map(|r| match r.call {
                SamplerCall::StartVoice {
                    pitch, velocity, ..
                } => Some((r.at, pitch, velocity)),
                _ => None,
            })
            .collect()
    }

    /// Voice stops as `(time, pitch)`.
    pub fn stops(&self) -> Vec<(Duration, u8)> {
        self.recorded()
            .into_iter()
            .filter_map(|r| match r.call {
                SamplerCall::StopVoice { pitch, .. } => Some((r.at, pitch)),
                _ => None,
            })
            .collect()
    }

    /// Forget everything recorded so far.
    pub fn reset(&self) {
        self.log.lock().unwrap_or_else(PoisonError::into_inner).clear();
    }

    fn record(&self, call: SamplerCall) {
        let at = self.clock.now();
        self.log
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(Recorded { at, call });
    }
}

impl Default for RecordingSampler {
    fn default() -> Self {
        Self::new()
    }
}

impl Sampler for RecordingSampler {
    fn load_instrument(&self, resource_id: &str) -> Result<(), SamplerError> {
        self.record(SamplerCall::LoadInstrument(resource_id.to_string()));
        let missing = self
            .missing
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .contains(resource_id);
        if missing {
            Err(SamplerError::ResourceMissing(resource_id.into()))
        } else {
            Ok(())
        }
    }

    fn start_voice(&self, pitch: u8, velocity: u8, channel: u8) {
        self.record(SamplerCall::StartVoice {
            pitch,
            velocity,
            channel,
        });
    }

    fn stop_voice(&self, pitch: u8, channel: u8) {
        self.record(SamplerCall::StopVoice { pitch, channel });
    }

    fn set_reverb_mix(&self, percent: f32) {
        self.record(SamplerCall::SetReverbMix(percent));
    }
}
