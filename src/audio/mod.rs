//! Audio engine: cpal output stream fed by a lock-free command queue.
//!
//! The engine owns the cpal stream and stays on the thread that built it.
//! Scheduler workers talk to the audio thread through a [`VoiceSender`],
//! which wraps the ring buffer producer so it can be shared across threads.

pub mod callback;
pub mod command;
pub mod effects;
pub mod limiter;
pub mod voice;

use std::sync::{Arc, Mutex};

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use ringbuf::{
    traits::{Producer, Split},
    HeapProd, HeapRb,
};
use tracing::{error, info};

pub use command::VoiceCommand;
pub use limiter::Limiter;

use callback::AudioCallback;

/// Ring buffer capacity (number of commands).
const RING_BUFFER_CAPACITY: usize = 1024;

/// Audio engine errors.
#[derive(Debug)]
pub enum AudioError {
    /// No audio output device found.
    NoOutputDevice,
    /// Failed to query device configuration.
    DeviceConfig(String),
    /// Failed to build the audio stream.
    StreamBuild(String),
    /// Failed to start the audio stream.
    StreamPlay(String),
    /// Ring buffer is full: audio thread is not draining fast enough.
    BufferFull,
}

impl std::fmt::Display for AudioError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AudioError::NoOutputDevice => write!(f, "no audio output device found"),
            AudioError::DeviceConfig(e) => write!(f, "device config error: {e}"),
            AudioError::StreamBuild(e) => write!(f, "stream build error: {e}"),
            AudioError::StreamPlay(e) => write!(f, "stream play error: {e}"),
            AudioError::BufferFull => write!(f, "audio command ring buffer is full"),
        }
    }
}

impl std::error::Error for AudioError {}

/// Thread-safe handle for sending [`VoiceCommand`]s to the audio thread.
#[derive(Clone)]
pub struct VoiceSender {
    producer: Arc<Mutex<HeapProd<VoiceCommand>>>,
}

impl VoiceSender {
    fn new(producer: HeapProd<VoiceCommand>) -> Self {
        Self {
            producer: Arc::new(Mutex::new(producer)),
        }
    }

    /// Queue a command; fails when the audio thread has fallen behind.
    pub fn send(&self, cmd: VoiceCommand) -> Result<(), AudioError> {
        let mut producer = self
            .producer
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        producer.try_push(cmd).map_err(|_| AudioError::BufferFull)
    }
}

/// The audio engine. Owns the cpal stream.
///
/// `cpal::Stream` is not `Send`, so the engine lives on the thread that
/// created it; hand [`AudioEngine::voice_sender`] to other threads.
pub struct AudioEngine {
    _stream: cpal::Stream,
    sender: VoiceSender,
    sample_rate: u32,
}

impl AudioEngine {
    /// Create and start the audio engine with the default output device.
    pub fn new() -> Result<Self, AudioError> {
        let host = cpal::default_host();
        let device = host
            .default_output_device()
            .ok_or(AudioError::NoOutputDevice)?;

        let config = device
            .default_output_config()
            .map_err(|e| AudioError::DeviceConfig(e.to_string()))?;

        let sample_rate = config.sample_rate().0;
        let channels = config.channels();

        Self::build_with_device(&device, sample_rate, channels)
    }

    fn build_with_device(
        device: &cpal::Device,
        sample_rate: u32,
        channels: u16,
    ) -> Result<Self, AudioError> {
        let rb = HeapRb::<VoiceCommand>::new(RING_BUFFER_CAPACITY);
        let (producer, consumer) = rb.split();

        let mut audio_callback = AudioCallback::new(consumer, channels, sample_rate);

        let stream_config = cpal::StreamConfig {
            channels,
            sample_rate: cpal::SampleRate(sample_rate),
            buffer_size: cpal::BufferSize::Default,
        };

        let err_fn = |err: cpal::StreamError| {
            error!(%err, "audio stream error");
        };

        let stream = device
            .build_output_stream(
                &stream_config,
                move |data: &mut [f32], _: &cpal::OutputCallbackInfo| {
                    audio_callback.process(data);
                },
                err_fn,
                None,
            )
            .map_err(|e| AudioError::StreamBuild(e.to_string()))?;

        stream
            .play()
            .map_err(|e| AudioError::StreamPlay(e.to_string()))?;

        info!(sample_rate, channels, "audio engine started");

        Ok(Self {
            _stream: stream,
            sender: VoiceSender::new(producer),
            sample_rate,
        })
    }

    /// A cloneable handle onto the command queue.
    pub fn voice_sender(&self) -> VoiceSender {
        self.sender.clone()
    }

    /// Get the sample rate of the audio stream.
    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }
}

/// A sender/callback pair wired to each other without a device, for offline rendering.
pub fn offline(channels: u16, sample_rate: u32) -> (VoiceSender, AudioCallback) {
    let rb = HeapRb::<VoiceCommand>::new(RING_BUFFER_CAPACITY);
    let (producer, consumer) = rb.split();
    (
        VoiceSender::new(producer),
        AudioCallback::new(consumer, channels, sample_rate),
    )
}
