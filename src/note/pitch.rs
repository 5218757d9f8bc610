//! MIDI pitch helpers: naming and frequency conversion.

/// Highest valid MIDI pitch.
pub const MAX_PITCH: u8 = 127;

/// Default pitch for new notes (middle C).
pub const DEFAULT_PITCH: u8 = 60;

const NAMES: [&str; 12] = [
    "C", "C#", "D", "D#", "E", "F", "F#", "G", "G#", "A", "A#", "B",
];

/// Scientific pitch name, e.g. `C4` for 60 and `A#4` for 70.
pub fn note_name(pitch: u8) -> String {
    let octave = i32::from(pitch / 12) - 1;
    format!("{}{}", NAMES[usize::from(pitch % 12)], octave)
}

/// Convert a MIDI pitch to frequency in Hz (A4 = 440 Hz).
pub fn midi_to_freq(pitch: u8) -> f64 {
    440.0 * 2.0f64.powf((f64::from(pitch) - 69.0) / 12.0)
}

/// Playback-rate ratio that shifts a sample recorded at `root` to `pitch`.
pub fn pitch_ratio(pitch: u8, root: u8) -> f64 {
    2.0f64.powf((f64::from(pitch) - f64::from(root)) / 12.0)
}
