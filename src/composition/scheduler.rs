//! Playback scheduler: turns notes into timed sampler voices.
//!
//! Two sequential executors carry all deferred work. The voice executor owns
//! instrument loads, voice starts and their matching stops. The composition
//! executor walks a composition, handing each note to the voice path at its
//! planned offset. Neither ever blocks the caller.
//!
//! Cancellation is cooperative. Composition callbacks carry the run epoch
//! from [`PlaybackGate::begin`] and do nothing once it is no longer current.
//! Voice starts carry the gate's silence epoch, so a stop also drops effect
//! voices that had not started yet. A voice that did start always gets its
//! stop.

use std::io;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use tracing::{debug, info, warn};

use super::plan::CompositionPlan;
use super::{ChangeFeed, CompositionState, StateChange};
use crate::note::{note_name, Instrument, Note, Point};
use crate::sampler::{Sampler, VoiceRange, DEFAULT_CHANNEL, NOTE_VELOCITY};
use crate::schedule::{Executor, PlaybackGate, Worker};

/// How long every voice sounds before its stop.
pub const VOICE_DURATION: Duration = Duration::from_millis(500);

/// Drives a [`Sampler`] from notes and compositions.
#[derive(Clone)]
pub struct PlaybackScheduler {
    inner: Arc<Inner>,
}

struct Inner {
    sampler: Arc<dyn Sampler>,
    voices: Arc<dyn Executor>,
    composition: Arc<dyn Executor>,
    /// Last instrument loaded successfully.
    loaded: Mutex<Option<Instrument>>,
}

impl PlaybackScheduler {
    pub fn new(
        sampler: Arc<dyn Sampler>,
        voices: Arc<dyn Executor>,
        composition: Arc<dyn Executor>,
    ) -> Self {
        Self {
            inner: Arc::new(Inner {
                sampler,
                voices,
                composition,
                loaded: Mutex::new(None),
            }),
        }
    }

    /// A scheduler running on two dedicated worker threads.
    pub fn with_workers(sampler: Arc<dyn Sampler>) -> io::Result<Self> {
        let voices = Worker::spawn("musepaint-voices")?;
        let composition = Worker::spawn("musepaint-composition")?;
        Ok(Self::new(sampler, Arc::new(voices), Arc::new(composition)))
    }

    /// Place a note at `position` with the current tools and play it.
    pub fn add_note(&self, state: &mut CompositionState, position: Point) -> Note {
        let note = state.tools().note_at(position);
        debug!(
            id = %note.id(),
            pitch = %note_name(note.pitch()),
            instrument = %note.instrument(),
            effect = %note.effect(),
            "note added"
        );
        state.push_note(note.clone());
        self.play_note(state, &note);
        note
    }

    /// Play one note now: its own voice plus any effect voices.
    pub fn play_note(&self, state: &CompositionState, note: &Note) {
        self.inner.trigger(note, state.gate());
    }

    /// Replay every note in order, spaced by `0.5 / tempo` seconds.
    ///
    /// The note list is captured now; edits made while playing do not affect
    /// the running composition.
    pub fn play_composition(&self, state: &CompositionState) {
        let gate = Arc::clone(state.gate());
        let feed = Arc::clone(state.feed());
        let epoch = gate.begin();
        feed.publish(StateChange::PlaybackStarted);

        let notes = state.notes().to_vec();
        let plan = CompositionPlan::new(notes.len(), state.tempo());
        info!(notes = notes.len(), tempo = plan.tempo(), epoch, "composition playback started");

        let inner = Arc::clone(&self.inner);
        self.inner.composition.schedule(
            Duration::ZERO,
            Box::new(move || inner.run_composition(epoch, notes, plan, gate, feed)),
        );
    }

    /// Stop composition playback and silence every pitch.
    ///
    /// The silence runs on the voice executor, after any voice start that
    /// was already in flight when the gate closed.
    pub fn stop_composition(&self, state: &CompositionState) {
        if state.gate().stop() {
            info!("composition playback stopped");
            state.feed().publish(StateChange::PlaybackStopped);
        }
        let sampler = Arc::clone(&self.inner.sampler);
        self.inner.voices.schedule(
            Duration::ZERO,
            Box::new(move || sampler.silence_all(DEFAULT_CHANNEL)),
        );
    }

    /// Remove every note. Playback and sound are left alone.
    pub fn clear(&self, state: &mut CompositionState) {
        debug!(notes = state.len(), "composition cleared");
        state.clear_notes();
    }

    /// Set the reverb amount (0–100) and forward it to the sampler.
    pub fn set_reverb_amount(&self, state: &mut CompositionState, amount: f64) {
        let amount = if amount.is_nan() {
            state.reverb_amount()
        } else {
            amount.clamp(0.0, 100.0)
        };
        state.store_reverb_amount(amount);
        self.inner.sampler.set_reverb_mix(amount as f32);
    }
}

impl Inner {
    fn trigger(self: &Arc<Self>, note: &Note, gate: &Arc<PlaybackGate>) {
        let silence = gate.silence_epoch();

        let instrument = note.instrument();
        let inner = Arc::clone(self);
        self.voices
            .schedule(Duration::ZERO, Box::new(move || inner.ensure_instrument(instrument)));

        self.start_voice(
            Duration::ZERO,
            i16::from(note.pitch()),
            i16::from(NOTE_VELOCITY),
            gate,
            silence,
        );
        for voice in note.effect_voices() {
            self.start_voice(voice.delay, voice.pitch, voice.velocity, gate, silence);
        }
    }

    fn ensure_instrument(&self, instrument: Instrument) {
        let Some(resource) = instrument.resource_id() else {
            return;
        };
        let mut loaded = self.loaded.lock().unwrap_or_else(PoisonError::into_inner);
        if *loaded == Some(instrument) {
            return;
        }
        match self.sampler.load_instrument(&resource) {
            Ok(()) => {
                debug!(%instrument, resource = %resource, "instrument loaded");
                *loaded = Some(instrument);
            }
            Err(e) => {
                warn!(%instrument, error = %e, "instrument load failed; keeping previous sound");
            }
        }
    }

    fn start_voice(
        self: &Arc<Self>,
        delay: Duration,
        pitch: i16,
        velocity: i16,
        gate: &Arc<PlaybackGate>,
        silence: u64,
    ) {
        let Some((pitch, velocity)) = VoiceRange::admit(pitch, velocity) else {
            return;
        };
        let inner = Arc::clone(self);
        let gate = Arc::clone(gate);
        self.voices.schedule(
            delay,
            Box::new(move || {
                if !gate.voices_allowed(silence) {
                    debug!(pitch, "voice dropped after stop");
                    return;
                }
                inner.sampler.start_voice(pitch, velocity, DEFAULT_CHANNEL);
                let sampler = Arc::clone(&inner.sampler);
                inner.voices.schedule(
                    VOICE_DURATION,
                    Box::new(move || sampler.stop_voice(pitch, DEFAULT_CHANNEL)),
                );
            }),
        );
    }

    fn run_composition(
        self: Arc<Self>,
        epoch: u64,
        notes: Vec<Note>,
        plan: CompositionPlan,
        gate: Arc<PlaybackGate>,
        feed: Arc<ChangeFeed>,
    ) {
        if !gate.is_current(epoch) {
            return;
        }
        for (note, offset) in notes.into_iter().zip(plan.offsets().iter().copied()) {
            let inner = Arc::clone(&self);
            let gate = Arc::clone(&gate);
            self.composition.schedule(
                offset,
                Box::new(move || {
                    if gate.is_current(epoch) {
                        inner.trigger(&note, &gate);
                    }
                }),
            );
        }
        self.composition.schedule(
            plan.completion(),
            Box::new(move || {
                if gate.finish(epoch) {
                    info!(epoch, "composition playback finished");
                    feed.publish(StateChange::PlaybackFinished);
                }
            }),
        );
    }
}
