//! MusePaint: place a handful of notes on a virtual canvas, then replay them.
//!
//! Each pitch becomes one tap at a random canvas position (seeded, so runs
//! repeat). After the taps the whole composition plays back at the chosen
//! tempo. Ctrl-C stops playback.

use std::path::PathBuf;
use std::sync::mpsc::{self, RecvTimeoutError};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use anyhow::Context;
use clap::Parser;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use musepaint::audio::AudioEngine;
use musepaint::composition::{
    CompositionPlan, CompositionState, PlaybackScheduler, StateChange, VOICE_DURATION,
};
use musepaint::config::MusePaintConfig;
use musepaint::note::{note_name, Effect, Instrument, Point};
use musepaint::sampler::{
    EngineSampler, InstrumentLibrary, RecordingSampler, Sampler, SamplerCall, SilentSampler,
};

const CANVAS_WIDTH: f64 = 400.0;
const CANVAS_HEIGHT: f64 = 800.0;
/// Extra time allowed past the planned end before giving up on playback.
const FINISH_GRACE: Duration = Duration::from_secs(2);

/// Drawing-to-music engine: tap notes, then replay the composition.
#[derive(Parser, Debug)]
#[command(name = "musepaint")]
#[command(version, about)]
struct Cli {
    /// Config file (default: ~/.musepaint/config.yaml)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Directory holding instrument WAV files
    #[arg(long)]
    samples: Option<PathBuf>,

    /// Tempo multiplier; 2.0 plays twice as fast
    #[arg(long)]
    tempo: Option<f64>,

    /// Reverb amount, 0–100
    #[arg(long)]
    reverb: Option<f64>,

    /// Instrument for every note (e.g. piano, "music box")
    #[arg(long)]
    instrument: Option<Instrument>,

    /// Audio effect for every note (echo, sparkle, cascade, ...)
    #[arg(long)]
    effect: Option<Effect>,

    /// Comma-separated MIDI pitches to place, in order
    #[arg(long, value_delimiter = ',', default_values_t = [60u8, 64, 67, 72])]
    pitches: Vec<u8>,

    /// Seed for canvas positions
    #[arg(long, default_value_t = 42)]
    seed: u64,

    /// Record sampler calls instead of opening an audio device
    #[arg(long)]
    dry_run: bool,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("musepaint=info")),
        )
        .init();

    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => MusePaintConfig::load_from(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => MusePaintConfig::load().unwrap_or_default(),
    };

    let mut state = CompositionState::new();
    config.apply_to_tools(state.tools_mut());
    if let Some(instrument) = cli.instrument {
        state.tools_mut().set_instrument(instrument);
    }
    if let Some(effect) = cli.effect {
        state.tools_mut().set_effect(effect);
    }
    state.set_tempo(cli.tempo.unwrap_or(config.tempo));

    let recorder = cli.dry_run.then(|| Arc::new(RecordingSampler::new()));
    // The engine must outlive playback; cpal stops the stream on drop.
    let (sampler, _engine): (Arc<dyn Sampler>, Option<AudioEngine>) = match &recorder {
        Some(rec) => (rec.clone() as Arc<dyn Sampler>, None),
        None => match AudioEngine::new() {
            Ok(engine) => {
                let samples_dir = cli.samples.clone().unwrap_or_else(|| config.samples_dir());
                info!(samples = %samples_dir.display(), "using instrument samples");
                let library = InstrumentLibrary::new(samples_dir, engine.sample_rate());
                let sampler = EngineSampler::new(engine.voice_sender(), library);
                (Arc::new(sampler) as Arc<dyn Sampler>, Some(engine))
            }
            Err(e) => {
                warn!(error = %e, "audio engine unavailable; continuing silently");
                (Arc::new(SilentSampler) as Arc<dyn Sampler>, None)
            }
        },
    };

    let scheduler =
        PlaybackScheduler::with_workers(sampler).context("starting scheduler workers")?;
    scheduler.set_reverb_amount(&mut state, cli.reverb.unwrap_or(config.reverb_amount));

    let (interrupt_tx, interrupt_rx) = mpsc::channel();
    ctrlc::set_handler(move || {
        let _ = interrupt_tx.send(());
    })
    .context("installing Ctrl-C handler")?;

    // Tap the notes in, one per voice length.
    let mut rng = ChaCha8Rng::seed_from_u64(cli.seed);
    for &pitch in &cli.pitches {
        state.tools_mut().set_pitch(pitch);
        let position = Point::new(
            rng.gen_range(0.0..CANVAS_WIDTH),
            rng.gen_range(0.0..CANVAS_HEIGHT),
        );
        let note = scheduler.add_note(&mut state, position);
        println!(
            "tap  {:<4} at ({:>5.1}, {:>5.1})  {} / {}",
            note_name(note.pitch()),
            position.x,
            position.y,
            note.instrument(),
            note.effect()
        );
        thread::sleep(VOICE_DURATION);
    }
    thread::sleep(VOICE_DURATION);

    let plan = CompositionPlan::new(state.len(), state.tempo());
    println!(
        "playing {} notes at tempo {:.2} ({:.2}s)",
        state.len(),
        state.tempo(),
        plan.completion().as_secs_f64()
    );

    let events = state.subscribe();
    scheduler.play_composition(&state);

    let limit = plan.completion().saturating_add(FINISH_GRACE);
    let started = Instant::now();
    loop {
        if interrupt_rx.try_recv().is_ok() {
            scheduler.stop_composition(&state);
            println!("stopped.");
            break;
        }
        match events.recv_timeout(Duration::from_millis(50)) {
            Ok(StateChange::PlaybackFinished) => break,
            Ok(_) => {}
            Err(RecvTimeoutError::Timeout) if started.elapsed() > limit => {
                warn!("playback did not finish in time");
                break;
            }
            Err(RecvTimeoutError::Timeout) => {}
            Err(RecvTimeoutError::Disconnected) => break,
        }
    }

    // Let the last voices ring out.
    thread::sleep(VOICE_DURATION * 2);

    if let Some(rec) = recorder {
        println!("sampler log:");
        for entry in rec.recorded() {
            println!("{:>8.3}s  {}", entry.at.as_secs_f64(), describe(&entry.call));
        }
    }

    println!("done.");
    Ok(())
}

fn describe(call: &SamplerCall) -> String {
    match call {
        SamplerCall::LoadInstrument(id) => format!("load     {id}"),
        SamplerCall::StartVoice {
            pitch, velocity, ..
        } => format!("start    {:<4} vel {velocity}", note_name(*pitch)),
        SamplerCall::StopVoice { pitch, .. } => format!("stop     {}", note_name(*pitch)),
        SamplerCall::SetReverbMix(mix) => format!("reverb   {mix:.0}%"),
    }
}
