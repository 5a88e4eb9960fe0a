//! Small helpers shared by the synthesis engine: note/frequency conversion, envelopes, LFOs
//! and millisecond clocks.

pub mod ahdsr;
pub mod lfo;
pub mod time;

// -------------------------------------------------------------------------------------------------

/// Frequency of MIDI note 69 (A4) in Hz.
const A4_FREQUENCY: f32 = 440.0;

// -------------------------------------------------------------------------------------------------

/// Convert a MIDI note number to a frequency in Hz (equal temperament, A4 = 440 Hz).
pub fn midi_to_hz(note: f32) -> f32 {
    A4_FREQUENCY * 2.0_f32.powf((note - 69.0) / 12.0)
}

/// Key position scaling for note dependent parameters.
///
/// Positive sensitivities attenuate low notes, negative ones attenuate high notes. The result
/// is clamped into the range `[0.1, 1.0]`. A sensitivity of 0 applies no scaling.
pub fn key_sense_magnitude(sensitivity: i32, note: u8, divisor: f32) -> f32 {
    if sensitivity == 0 {
        return 1.0;
    }
    let note = note as f32;
    let sensitivity = sensitivity as f32;
    let magnitude = if sensitivity > 0.0 {
        1.0 - sensitivity * (128.0 - note) / divisor
    } else {
        1.0 + sensitivity * note / divisor
    };
    magnitude.clamp(0.1, 1.0)
}

// -------------------------------------------------------------------------------------------------
