//! Commands sent from scheduler threads to the audio thread via ring buffer.

use std::sync::Arc;

use crate::sampler::SampleData;

/// A sampler command for the audio thread.
#[derive(Debug, Clone)]
pub enum VoiceCommand {
    /// Replace the instrument sample new voices play.
    LoadInstrument(Arc<SampleData>),
    /// Start a voice.
    NoteOn { pitch: u8, velocity: u8 },
    /// Release every voice playing `pitch`.
    NoteOff { pitch: u8 },
    /// Release every voice.
    AllNotesOff,
    /// Reverb wet/dry mix, 0.0–1.0.
    SetReverbMix(f32),
}

#[cfg(test)]
mod tests {
    use super::*;
    use ringbuf::{
        traits::{Consumer, Producer, Split},
        HeapRb,
    };

    #[test]
    fn ordering_preserved_through_ring() {
        let rb = HeapRb::<VoiceCommand>::new(8);
        let (mut prod, mut cons) = rb.split();

        prod.try_push(VoiceCommand::NoteOn {
            pitch: 60,
            velocity: 64,
        })
        .unwrap();
        prod.try_push(VoiceCommand::NoteOff { pitch: 60 }).unwrap();
        prod.try_push(VoiceCommand::AllNotesOff).unwrap();

        assert!(matches!(
            cons.try_pop(),
            Some(VoiceCommand::NoteOn {
                pitch: 60,
                velocity: 64
            })
        ));
        assert!(matches!(
            cons.try_pop(),
            Some(VoiceCommand::NoteOff { pitch: 60 })
        ));
        assert!(matches!(cons.try_pop(), Some(VoiceCommand::AllNotesOff)));
        assert!(cons.try_pop().is_none());
    }

    #[test]
    fn full_ring_rejects_push() {
        let rb = HeapRb::<VoiceCommand>::new(1);
        let (mut prod, _cons) = rb.split();
        prod.try_push(VoiceCommand::AllNotesOff).unwrap();
        assert!(prod.try_push(VoiceCommand::AllNotesOff).is_err());
    }
}
