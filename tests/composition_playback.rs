//! Composition playback on a virtual clock: timeline, stop, restart, effects.
//!
//! Both scheduler executors share one `ManualExecutor`, and the recording
//! sampler stamps every call with its virtual time, so delays are checked
//! exactly.

use std::sync::mpsc::Receiver;
use std::sync::Arc;
use std::time::Duration;

use musepaint::composition::{CompositionState, PlaybackScheduler, StateChange};
use musepaint::note::{Effect, Point};
use musepaint::sampler::RecordingSampler;
use musepaint::schedule::ManualExecutor;

struct Rig {
    exec: Arc<ManualExecutor>,
    sampler: Arc<RecordingSampler>,
    scheduler: PlaybackScheduler,
    state: CompositionState,
}

fn ms(n: u64) -> Duration {
    Duration::from_millis(n)
}

/// A rig with `pitches` already tapped in and their voices finished.
/// The recording is cleared, so only composition playback shows up.
fn rig_with_notes(pitches: &[u8]) -> Rig {
    let exec = Arc::new(ManualExecutor::new());
    let sampler = Arc::new(RecordingSampler::on_virtual_clock(exec.clone()));
    let scheduler = PlaybackScheduler::new(sampler.clone(), exec.clone(), exec.clone());
    let mut state = CompositionState::new();
    for (i, &pitch) in pitches.iter().enumerate() {
        state.tools_mut().set_pitch(pitch);
        scheduler.add_note(&mut state, Point::new(i as f64 * 10.0, 0.0));
    }
    exec.run_until_idle();
    sampler.reset();
    Rig {
        exec,
        sampler,
        scheduler,
        state,
    }
}

fn start_times(rig: &Rig, since: Duration) -> Vec<Duration> {
    rig.sampler
        .starts()
        .into_iter()
        .map(|(t, _, _)| t - since)
        .collect()
}

fn drain(rx: &Receiver<StateChange>) -> Vec<StateChange> {
    rx.try_iter().collect()
}

#[test]
fn three_notes_at_unit_tempo() {
    let rig = rig_with_notes(&[60, 64, 67]);
    let t0 = rig.exec.now();
    let rx = rig.state.subscribe();

    rig.scheduler.play_composition(&rig.state);
    assert!(rig.state.is_playing());

    rig.exec.advance_to(t0 + ms(1499));
    assert!(rig.state.is_playing());
    assert_eq!(start_times(&rig, t0), vec![ms(0), ms(500), ms(1000)]);

    rig.exec.advance_to(t0 + ms(1500));
    assert!(!rig.state.is_playing());
    assert_eq!(
        drain(&rx),
        vec![StateChange::PlaybackStarted, StateChange::PlaybackFinished]
    );

    let pitches: Vec<u8> = rig.sampler.starts().into_iter().map(|(_, p, _)| p).collect();
    assert_eq!(pitches, vec![60, 64, 67]);
}

#[test]
fn doubling_tempo_halves_spacing() {
    let mut rig = rig_with_notes(&[60, 62, 64]);
    rig.state.set_tempo(2.0);
    let t0 = rig.exec.now();

    rig.scheduler.play_composition(&rig.state);
    rig.exec.advance_to(t0 + ms(749));
    assert!(rig.state.is_playing());
    rig.exec.advance_to(t0 + ms(750));
    assert!(!rig.state.is_playing());
    assert_eq!(start_times(&rig, t0), vec![ms(0), ms(250), ms(500)]);
}

#[test]
fn vanishing_tempo_plays_first_note_and_waits() {
    let mut rig = rig_with_notes(&[60, 64, 67]);
    rig.state.set_tempo(1e-20);
    let t0 = rig.exec.now();

    rig.scheduler.play_composition(&rig.state);
    rig.exec.advance(Duration::from_secs(24 * 3600));
    assert!(rig.state.is_playing());
    assert_eq!(start_times(&rig, t0), vec![ms(0)]);

    rig.scheduler.stop_composition(&rig.state);
    assert!(!rig.state.is_playing());
}

#[test]
fn empty_composition_finishes_at_once() {
    let rig = rig_with_notes(&[]);
    rig.scheduler.play_composition(&rig.state);
    assert!(rig.state.is_playing());
    rig.exec.run_pending();
    assert!(!rig.state.is_playing());
    assert!(rig.sampler.calls().is_empty());
}

#[test]
fn stop_cancels_remaining_notes() {
    let rig = rig_with_notes(&[60, 64, 67]);
    let t0 = rig.exec.now();
    let rx = rig.state.subscribe();

    rig.scheduler.play_composition(&rig.state);
    rig.exec.advance_to(t0 + ms(600));
    rig.scheduler.stop_composition(&rig.state);
    assert!(!rig.state.is_playing());

    rig.exec.run_until_idle();
    assert_eq!(start_times(&rig, t0), vec![ms(0), ms(500)]);

    // Voices that already started still get their own stop.
    let late_stops: Vec<(Duration, u8)> = rig
        .sampler
        .stops()
        .into_iter()
        .filter(|(t, _)| *t != t0 + ms(600))
        .map(|(t, p)| (t - t0, p))
        .collect();
    assert_eq!(late_stops, vec![(ms(500), 60), (ms(1000), 64)]);

    let silenced = rig
        .sampler
        .stops()
        .into_iter()
        .filter(|(t, _)| *t == t0 + ms(600))
        .count();
    assert_eq!(silenced, 128);

    assert_eq!(
        drain(&rx),
        vec![StateChange::PlaybackStarted, StateChange::PlaybackStopped]
    );
}

#[test]
fn replay_after_stop_ignores_the_old_run() {
    let rig = rig_with_notes(&[60, 64, 67]);
    let t0 = rig.exec.now();
    let rx = rig.state.subscribe();

    rig.scheduler.play_composition(&rig.state);
    rig.exec.advance_to(t0 + ms(600));
    rig.scheduler.stop_composition(&rig.state);
    let t1 = rig.exec.now();
    rig.scheduler.play_composition(&rig.state);

    // The first run would have completed here.
    rig.exec.advance_to(t0 + ms(1500));
    assert!(rig.state.is_playing());

    rig.exec.advance_to(t1 + ms(1500));
    assert!(!rig.state.is_playing());

    let starts = start_times(&rig, t0);
    let second = t1 - t0;
    assert_eq!(
        starts,
        vec![
            ms(0),
            ms(500),
            second,
            second + ms(500),
            second + ms(1000)
        ]
    );

    let finished = drain(&rx)
        .into_iter()
        .filter(|c| *c == StateChange::PlaybackFinished)
        .count();
    assert_eq!(finished, 1);
}

#[test]
fn notes_added_while_playing_are_not_replayed() {
    let mut rig = rig_with_notes(&[60, 64]);
    let t0 = rig.exec.now();
    rig.scheduler.play_composition(&rig.state);
    rig.exec.run_pending();

    rig.state.tools_mut().set_pitch(90);
    rig.scheduler.add_note(&mut rig.state, Point::default());
    rig.scheduler.clear(&mut rig.state);
    assert!(rig.state.is_empty());

    rig.exec.advance_to(t0 + ms(1000));
    let pitches: Vec<u8> = rig.sampler.starts().into_iter().map(|(_, p, _)| p).collect();
    assert_eq!(pitches, vec![60, 90, 64]);
    assert!(!rig.state.is_playing());
}

#[test]
fn composition_replays_effects() {
    let exec = Arc::new(ManualExecutor::new());
    let sampler = Arc::new(RecordingSampler::on_virtual_clock(exec.clone()));
    let scheduler = PlaybackScheduler::new(sampler.clone(), exec.clone(), exec.clone());
    let mut state = CompositionState::new();
    state.tools_mut().set_effect(Effect::Harmony);
    scheduler.add_note(&mut state, Point::default());
    state.tools_mut().set_effect(Effect::Sparkle);
    scheduler.add_note(&mut state, Point::default());
    exec.run_until_idle();
    sampler.reset();
    let t0 = exec.now();

    scheduler.play_composition(&state);
    exec.run_until_idle();

    let starts: Vec<(Duration, u8, u8)> = sampler
        .starts()
        .into_iter()
        .map(|(t, p, v)| (t - t0, p, v))
        .collect();
    assert_eq!(
        starts,
        vec![
            (ms(0), 60, 64),
            (ms(0), 60, 48),
            (ms(0), 64, 48),
            (ms(0), 67, 48),
            (ms(500), 60, 64),
            (ms(600), 72, 32),
        ]
    );
}

#[test]
fn failed_instrument_load_does_not_block_voices() {
    let exec = Arc::new(ManualExecutor::new());
    let sampler = Arc::new(RecordingSampler::on_virtual_clock(exec.clone()));
    sampler.mark_missing("piano.wav");
    let scheduler = PlaybackScheduler::new(sampler.clone(), exec.clone(), exec.clone());
    let mut state = CompositionState::new();

    scheduler.add_note(&mut state, Point::default());
    exec.run_until_idle();
    assert_eq!(sampler.starts(), vec![(ms(0), 60, 64)]);
}

#[test]
fn add_note_keeps_call_order() {
    let rig = rig_with_notes(&[72, 48, 60, 55]);
    let pitches: Vec<u8> = rig.state.notes().iter().map(|n| n.pitch()).collect();
    assert_eq!(pitches, vec![72, 48, 60, 55]);
    let xs: Vec<f64> = rig.state.notes().iter().map(|n| n.position().x).collect();
    assert_eq!(xs, vec![0.0, 10.0, 20.0, 30.0]);
}
