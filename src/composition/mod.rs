//! Composition state: the notes placed so far, tempo, tools, and who is listening.
//!
//! [`CompositionState`] is the context object every [`PlaybackScheduler`]
//! operation takes. It owns the note list and the current tool settings, and
//! shares the [`PlaybackGate`] with callbacks already queued on the workers.
//! UI layers observe it through [`CompositionState::subscribe`].

pub mod plan;
pub mod scheduler;
pub mod tools;

pub use plan::{CompositionPlan, NOTE_SPACING_SECS};
pub use scheduler::{PlaybackScheduler, VOICE_DURATION};
pub use tools::ToolSettings;

use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::{Arc, Mutex, PoisonError};

use tracing::warn;

use crate::note::{Note, NoteId};
use crate::schedule::PlaybackGate;

/// Default tempo multiplier.
pub const DEFAULT_TEMPO: f64 = 1.0;
/// Default reverb wet/dry amount, 0–100.
pub const DEFAULT_REVERB_AMOUNT: f64 = 50.0;

/// A change observers may want to redraw for.
#[derive(Debug, Clone, PartialEq)]
pub enum StateChange {
    NoteAdded(NoteId),
    Cleared,
    PlaybackStarted,
    /// The composition ran to its end.
    PlaybackFinished,
    /// The composition was stopped explicitly.
    PlaybackStopped,
    TempoChanged(f64),
    ReverbChanged(f64),
}

/// Fan-out of [`StateChange`]s to every live subscriber.
#[derive(Debug, Default)]
pub struct ChangeFeed {
    subscribers: Mutex<Vec<Sender<StateChange>>>,
}

impl ChangeFeed {
    pub fn subscribe(&self) -> Receiver<StateChange> {
        let (tx, rx) = mpsc::channel();
        self.subscribers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(tx);
        rx
    }

    /// Send `change` to every subscriber, forgetting those that hung up.
    pub fn publish(&self, change: StateChange) {
        self.subscribers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .retain(|tx| tx.send(change.clone()).is_ok());
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscribers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}

/// One drawing session's composition.
#[derive(Debug)]
pub struct CompositionState {
    notes: Vec<Note>,
    tempo: f64,
    reverb_amount: f64,
    tools: ToolSettings,
    gate: Arc<PlaybackGate>,
    feed: Arc<ChangeFeed>,
}

impl CompositionState {
    pub fn new() -> Self {
        Self {
            notes: Vec::new(),
            tempo: DEFAULT_TEMPO,
            reverb_amount: DEFAULT_REVERB_AMOUNT,
            tools: ToolSettings::default(),
            gate: Arc::new(PlaybackGate::new()),
            feed: Arc::new(ChangeFeed::default()),
        }
    }

    /// Notes in placement order, which is also playback order.
    pub fn notes(&self) -> &[Note] {
        &self.notes
    }

    pub fn len(&self) -> usize {
        self.notes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.notes.is_empty()
    }

    pub fn tempo(&self) -> f64 {
        self.tempo
    }

    /// Set the tempo multiplier. Zero, negative and non-finite values are ignored.
    pub fn set_tempo(&mut self, tempo: f64) {
        if !(tempo.is_finite() && tempo > 0.0) {
            warn!(tempo, "tempo must be positive; keeping {}", self.tempo);
            return;
        }
        self.tempo = tempo;
        self.feed.publish(StateChange::TempoChanged(tempo));
    }

    pub fn reverb_amount(&self) -> f64 {
        self.reverb_amount
    }

    pub fn tools(&self) -> &ToolSettings {
        &self.tools
    }

    pub fn tools_mut(&mut self) -> &mut ToolSettings {
        &mut self.tools
    }

    /// Whether a composition playback is running.
    pub fn is_playing(&self) -> bool {
        self.gate.is_playing()
    }

    pub fn subscribe(&self) -> Receiver<StateChange> {
        self.feed.subscribe()
    }

    pub(crate) fn gate(&self) -> &Arc<PlaybackGate> {
        &self.gate
    }

    pub(crate) fn feed(&self) -> &Arc<ChangeFeed> {
        &self.feed
    }

    pub(crate) fn push_note(&mut self, note: Note) {
        let id = note.id();
        self.notes.push(note);
        self.feed.publish(StateChange::NoteAdded(id));
    }

    pub(crate) fn clear_notes(&mut self) {
        self.notes.clear();
        self.feed.publish(StateChange::Cleared);
    }

    pub(crate) fn store_reverb_amount(&mut self, amount: f64) {
        self.reverb_amount = amount;
        self.feed.publish(StateChange::ReverbChanged(amount));
    }
}

impl Default for CompositionState {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::note::Point;

    #[test]
    fn defaults() {
        let state = CompositionState::new();
        assert!(state.is_empty());
        assert_eq!(state.tempo(), 1.0);
        assert_eq!(state.reverb_amount(), 50.0);
        assert!(!state.is_playing());
    }

    #[test]
    fn set_tempo_accepts_values_outside_ui_range() {
        let mut state = CompositionState::new();
        state.set_tempo(4.0);
        assert_eq!(state.tempo(), 4.0);
        state.set_tempo(0.1);
        assert_eq!(state.tempo(), 0.1);
    }

    #[test]
    fn set_tempo_rejects_non_positive() {
        let mut state = CompositionState::new();
        state.set_tempo(0.0);
        state.set_tempo(-1.0);
        state.set_tempo(f64::NAN);
        state.set_tempo(f64::INFINITY);
        assert_eq!(state.tempo(), 1.0);
    }

    #[test]
    fn subscribers_see_changes_in_order() {
        let mut state = CompositionState::new();
        let rx = state.subscribe();
        let note = state.tools().note_at(Point::new(1.0, 2.0));
        let id = note.id();
        state.push_note(note);
        state.set_tempo(2.0);
        state.clear_notes();

        let seen: Vec<StateChange> = rx.try_iter().collect();
        assert_eq!(
            seen,
            vec![
                StateChange::NoteAdded(id),
                StateChange::TempoChanged(2.0),
                StateChange::Cleared,
            ]
        );
    }

    #[test]
    fn dropped_subscribers_are_pruned() {
        let feed = ChangeFeed::default();
        let keep = feed.subscribe();
        drop(feed.subscribe());
        assert_eq!(feed.subscriber_count(), 2);
        feed.publish(StateChange::Cleared);
        assert_eq!(feed.subscriber_count(), 1);
        assert_eq!(keep.try_recv(), Ok(StateChange::Cleared));
    }
}
