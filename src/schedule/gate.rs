//! Playback gate: the playing flag plus the epoch tokens scheduled callbacks check.
//!
//! Composition state is one atomic word: the run epoch shifted left by one,
//! with the low bit set while playing. A callback captured with epoch `e`
//! may fire only while the word equals `e << 1 | 1`, so a stop followed by a
//! fresh start can never revive callbacks from the earlier run.
//!
//! A separate silence epoch covers voice starts. Every stop bumps it, which
//! drops effect voices that were queued before the stop.

use std::sync::atomic::{AtomicU64, Ordering};

const PLAYING: u64 = 1;

/// Shared playback state checked by scheduled callbacks at fire time.
#[derive(Debug, Default)]
pub struct PlaybackGate {
    run: AtomicU64,
    silence: AtomicU64,
}

impl PlaybackGate {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a new composition run and return its epoch.
    pub fn begin(&self) -> u64 {
        let mut current = self.run.load(Ordering::Acquire);
        loop {
            let epoch = (current >> 1) + 1;
            match self.run.compare_exchange_weak(
                current,
                (epoch << 1) | PLAYING,
                Ordering::AcqRel,
                Ordering::Acquire,
            ) {
                Ok(_) => return epoch,
                Err(actual) => current = actual,
            }
        }
    }

    /// Whether the composition is playing.
    pub fn is_playing(&self) -> bool {
        self.run.load(Ordering::Acquire) & PLAYING != 0
    }

    /// Whether run `epoch` is still the live, playing run.
    pub fn is_current(&self, epoch: u64) -> bool {
        self.run.load(Ordering::Acquire) == (epoch << 1) | PLAYING
    }

    /// Mark run `epoch` as naturally finished.
    ///
    /// Returns `false` if the run was already stopped or superseded.
    pub fn finish(&self, epoch: u64) -> bool {
        self.run
            .compare_exchange(
                (epoch << 1) | PLAYING,
                epoch << 1,
                Ordering::AcqRel,
                Ordering::Acquire,
            )
            .is_ok()
    }

    /// Stop the current run and invalidate pending voice starts.
    ///
    /// Returns whether a run was playing.
    pub fn stop(&self) -> bool {
        self.silence.fetch_add(1, Ordering::AcqRel);
        self.run.fetch_and(!PLAYING, Ordering::AcqRel) & PLAYING != 0
    }

    /// Current silence epoch, captured when a voice start is scheduled.
    pub fn silence_epoch(&self) -> u64 {
        self.silence.load(Ordering::Acquire)
    }

    /// Whether no stop happened since `silence_epoch` was captured.
    pub fn voices_allowed(&self, silence_epoch: u64) -> bool {
        self.silence.load(Ordering::Acquire) == silence_epoch
    }
}
