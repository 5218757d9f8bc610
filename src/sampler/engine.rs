//! Samplers that drive the audio engine, or nothing at all.

use tracing::{debug, warn};

use super::{InstrumentLibrary, Sampler, SamplerError};
use crate::audio::{VoiceCommand, VoiceSender};

/// Sampler backed by the cpal audio engine.
///
/// Instrument samples come from an [`InstrumentLibrary`]; voice commands go
/// through the engine's ring buffer. The channel argument is accepted for
/// interface parity; the engine renders a single channel.
pub struct EngineSampler {
    sender: VoiceSender,
    library: InstrumentLibrary,
}

impl EngineSampler {
    pub fn new(sender: VoiceSender, library: InstrumentLibrary) -> Self {
        Self { sender, library }
    }

    pub fn library(&self) -> &InstrumentLibrary {
        &self.library
    }

    fn send(&self, cmd: VoiceCommand) {
        if let Err(e) = self.sender.send(cmd) {
            warn!(error = %e, "voice command dropped");
        }
    }
}

impl Sampler for EngineSampler {
    fn load_instrument(&self, resource_id: &str) -> Result<(), SamplerError> {
        let data = self.library.load(resource_id)?;
        self.sender
            .send(VoiceCommand::LoadInstrument(data))
            .map_err(|e| SamplerError::Engine(e.to_string()))
    }

    fn start_voice(&self, pitch: u8, velocity: u8, _channel: u8) {
        self.send(VoiceCommand::NoteOn { pitch, velocity });
    }

    fn stop_voice(&self, pitch: u8, _channel: u8) {
        self.send(VoiceCommand::NoteOff { pitch });
    }

    fn set_reverb_mix(&self, percent: f32) {
        self.send(VoiceCommand::SetReverbMix(percent.clamp(0.0, 100.0) / 100.0));
    }

    fn silence_all(&self, _channel: u8) {
        self.send(VoiceCommand::AllNotesOff);
    }
}

/// A sampler that accepts every call and makes no sound.
///
/// Stands in when no output device is available.
#[derive(Debug, Default)]
pub struct SilentSampler;

impl Sampler for SilentSampler {
    fn load_instrument(&self, resource_id: &str) -> Result<(), SamplerError> {
        debug!(resource = resource_id, "silent sampler: load ignored");
        Ok(())
    }

    fn start_voice(&self, _pitch: u8, _velocity: u8, _channel: u8) {}

    fn stop_voice(&self, _pitch: u8, _channel: u8) {}

    fn set_reverb_mix(&self, _percent: f32) {}

    fn silence_all(&self, _channel: u8) {}
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio;
    use crate::sampler::resource::tests::wav_bytes_f32;
    use crate::sampler::DEFAULT_CHANNEL;

    fn sampler_with_dir(dir: &std::path::Path) -> (EngineSampler, audio::callback::AudioCallback) {
        let (sender, callback) = audio::offline(1, 8000);
        (
            EngineSampler::new(sender, InstrumentLibrary::new(dir, 8000)),
            callback,
        )
    }

    #[test]
    fn missing_resource_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let (sampler, _cb) = sampler_with_dir(dir.path());
        let err = sampler.load_instrument("violin.wav").unwrap_err();
        assert!(matches!(err, SamplerError::ResourceMissing(_)));
    }

    #[test]
    fn loaded_instrument_drives_voices() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("flute.wav"),
            wav_bytes_f32(&vec![0.5; 4000], 8000, 1),
        )
        .unwrap();
        let (sampler, mut cb) = sampler_with_dir(dir.path());

        sampler.load_instrument("flute.wav").unwrap();
        sampler.start_voice(60, 127, DEFAULT_CHANNEL);
        let mut out = vec![0.0f32; 1000];
        cb.process(&mut out);
        assert_eq!(cb.active_voices(), 1);
        assert!(out.iter().any(|s| s.abs() > 0.05));

        sampler.silence_all(DEFAULT_CHANNEL);
        let mut tail = vec![0.0f32; 4000];
        cb.process(&mut tail);
        assert_eq!(cb.active_voices(), 0);
    }

    #[test]
    fn stop_voice_releases_pitch() {
        let dir = tempfile::tempdir().unwrap();
        let (sampler, mut cb) = sampler_with_dir(dir.path());
        sampler.start_voice(60, 64, DEFAULT_CHANNEL);
        sampler.start_voice(67, 64, DEFAULT_CHANNEL);
        sampler.stop_voice(60, DEFAULT_CHANNEL);
        let mut out = vec![0.0f32; 4000];
        cb.process(&mut out);
        assert_eq!(cb.active_voices(), 1);
    }

    #[test]
    fn silent_sampler_accepts_everything() {
        let s = SilentSampler;
        assert!(s.load_instrument("anything.wav").is_ok());
        s.start_voice(60, 64, 0);
        s.silence_all(0);
    }
}
