//! Audio callback: runs on the cpal audio thread.
//!
//! Drains sampler commands from the ring buffer, renders the voice bank
//! through the delay and reverb, limits, and fans the mono mix out to every
//! output channel.

use std::sync::Arc;

use ringbuf::traits::Consumer;
use ringbuf::HeapCons;

use super::command::VoiceCommand;
use super::effects::{FeedbackDelay, Reverb};
use super::limiter::Limiter;
use super::voice::VoiceBank;
use crate::sampler::SampleData;

/// State owned by the audio thread.
pub struct AudioCallback {
    consumer: HeapCons<VoiceCommand>,
    voices: VoiceBank,
    instrument: Option<Arc<SampleData>>,
    delay: FeedbackDelay,
    reverb: Reverb,
    limiter: Limiter,
    channels: u16,
}

impl AudioCallback {
    pub fn new(consumer: HeapCons<VoiceCommand>, channels: u16, sample_rate: u32) -> Self {
        Self {
            consumer,
            voices: VoiceBank::new(sample_rate),
            instrument: None,
            delay: FeedbackDelay::sampler_default(sample_rate),
            reverb: Reverb::new(sample_rate),
            limiter: Limiter::default(),
            channels: channels.max(1),
        }
    }

    fn apply(&mut self, cmd: VoiceCommand) {
        match cmd {
            VoiceCommand::LoadInstrument(data) => self.instrument = Some(data),
            VoiceCommand::NoteOn { pitch, velocity } => {
                self.voices
                    .note_on(pitch, velocity, self.instrument.as_ref());
            }
            VoiceCommand::NoteOff { pitch } => self.voices.note_off(pitch),
            VoiceCommand::AllNotesOff => self.voices.all_notes_off(),
            VoiceCommand::SetReverbMix(mix) => self.reverb.set_mix(mix),
        }
    }

    /// Fill `output` (interleaved) with the next block.
    pub fn process(&mut self, output: &mut [f32]) {
        while let Some(cmd) = self.consumer.try_pop() {
            self.apply(cmd);
        }

        for frame in output.chunks_mut(usize::from(self.channels)) {
            let dry = self.voices.next_sample();
            let delayed = self.delay.process(dry);
            let wet = self.reverb.process(delayed);
            let sample = self.limiter.process(wet);
            frame.fill(sample);
        }
    }

    pub fn active_voices(&self) -> usize {
        self.voices.active()
    }
}
