//! Engine pipeline: scheduler → engine sampler → audio callback, without hardware.
//!
//! Uses the offline sender/callback pair so the rendered output can be
//! inspected directly.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use musepaint::audio::{self, callback::AudioCallback};
use musepaint::composition::{CompositionState, PlaybackScheduler};
use musepaint::note::{Effect, Instrument, Point};
use musepaint::sampler::{EngineSampler, InstrumentLibrary};
use musepaint::schedule::ManualExecutor;

const SAMPLE_RATE: u32 = 22050;

fn write_wav(path: &Path, samples: &[i16], sample_rate: u32) {
    let spec = hound::WavSpec {
        channels: 1,
        sample_rate,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };
    let mut writer = hound::WavWriter::create(path, spec).unwrap();
    for &s in samples {
        writer.write_sample(s).unwrap();
    }
    writer.finalize().unwrap();
}

fn pipeline(samples_dir: &Path) -> (Arc<ManualExecutor>, PlaybackScheduler, AudioCallback) {
    let (sender, callback) = audio::offline(2, SAMPLE_RATE);
    let sampler = EngineSampler::new(sender, InstrumentLibrary::new(samples_dir, SAMPLE_RATE));
    let exec = Arc::new(ManualExecutor::new());
    let scheduler = PlaybackScheduler::new(Arc::new(sampler), exec.clone(), exec.clone());
    (exec, scheduler, callback)
}

fn peak(buf: &[f32]) -> f32 {
    buf.iter().fold(0.0f32, |m, s| m.max(s.abs()))
}

fn render(callback: &mut AudioCallback, secs: f64) -> Vec<f32> {
    let frames = (secs * f64::from(SAMPLE_RATE)) as usize;
    let mut out = vec![0.0f32; frames * 2];
    callback.process(&mut out);
    out
}

#[test]
fn tapped_note_sounds_with_loaded_sample() {
    let dir = tempfile::tempdir().unwrap();
    let tone: Vec<i16> = (0..SAMPLE_RATE)
        .map(|i| ((i as f32 * 0.05).sin() * 16000.0) as i16)
        .collect();
    write_wav(&dir.path().join("marimba.wav"), &tone, 44100);

    let (exec, scheduler, mut callback) = pipeline(dir.path());
    let mut state = CompositionState::new();
    state.tools_mut().set_instrument(Instrument::Marimba);
    scheduler.add_note(&mut state, Point::new(100.0, 100.0));
    exec.run_pending();

    let out = render(&mut callback, 0.2);
    assert!(peak(&out) > 0.05);
    assert_eq!(callback.active_voices(), 1);

    // The scheduled stop releases the voice.
    exec.advance(Duration::from_millis(500));
    render(&mut callback, 0.5);
    assert_eq!(callback.active_voices(), 0);
}

#[test]
fn missing_sample_falls_back_to_tone() {
    let dir = tempfile::tempdir().unwrap();
    let (exec, scheduler, mut callback) = pipeline(dir.path());
    let mut state = CompositionState::new();
    scheduler.add_note(&mut state, Point::default());
    exec.run_pending();

    let out = render(&mut callback, 0.1);
    assert!(peak(&out) > 0.01);
}

#[test]
fn harmony_starts_four_voices() {
    let dir = tempfile::tempdir().unwrap();
    let (exec, scheduler, mut callback) = pipeline(dir.path());
    let mut state = CompositionState::new();
    state.tools_mut().set_effect(Effect::Harmony);
    scheduler.add_note(&mut state, Point::default());
    exec.run_pending();

    render(&mut callback, 0.05);
    assert_eq!(callback.active_voices(), 4);
}

#[test]
fn stop_composition_silences_everything() {
    let dir = tempfile::tempdir().unwrap();
    let (exec, scheduler, mut callback) = pipeline(dir.path());
    let mut state = CompositionState::new();
    for pitch in [60, 64, 67] {
        state.tools_mut().set_pitch(pitch);
        scheduler.add_note(&mut state, Point::default());
    }
    exec.run_pending();
    render(&mut callback, 0.05);
    assert_eq!(callback.active_voices(), 3);

    scheduler.stop_composition(&state);
    exec.run_pending();
    render(&mut callback, 0.5);
    assert_eq!(callback.active_voices(), 0);
}

#[test]
fn output_stays_under_ceiling() {
    let dir = tempfile::tempdir().unwrap();
    let (exec, scheduler, mut callback) = pipeline(dir.path());
    let mut state = CompositionState::new();
    scheduler.set_reverb_amount(&mut state, 100.0);
    state.tools_mut().set_effect(Effect::Arpeggio);
    for pitch in [48, 52, 55, 60, 64, 67, 72] {
        state.tools_mut().set_pitch(pitch);
        scheduler.add_note(&mut state, Point::default());
    }
    exec.advance(Duration::from_millis(400));

    let out = render(&mut callback, 1.0);
    assert!(peak(&out) <= 0.95 + 1e-6);
}
