//! Audio and voice output collaborators, which play what the engine sets up.

use crate::{
    filter::FilterSpec,
    utils::{
        ahdsr::{AdsrParameters, EnvelopeStage},
        lfo::Lfo,
        time::Millis,
    },
    voice::VoiceKey,
    waveform::Wavetable,
};

// -------------------------------------------------------------------------------------------------

mod simulated;
pub use simulated::{SimulatedAudioOutput, SimulatedVoice, SimulatedVoiceOutput};

// -------------------------------------------------------------------------------------------------

/// Echo effect settings of the audio output.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EchoSettings {
    pub delay_ms: u16,
    pub decay: f32,
    /// Wet amount, 0 disables the echo.
    pub mix: f32,
}

impl Default for EchoSettings {
    fn default() -> Self {
        Self {
            delay_ms: 300,
            decay: 0.5,
            mix: 0.0,
        }
    }
}

// -------------------------------------------------------------------------------------------------

/// Controls the final audio output stage: mixer volume, echo effect and playback state.
///
/// The engine pauses the output around expensive work, so implementations should make
/// pausing and resuming cheap.
pub trait AudioOutput {
    /// True while the output is paused.
    fn is_paused(&self) -> bool;
    /// Pause playback without dropping any voices.
    fn pause(&mut self);
    /// Resume from paused playback.
    fn resume(&mut self);

    /// Get actual output volume.
    fn volume(&self) -> f32;
    /// Set a new output volume in range \[0, 1\].
    fn set_volume(&mut self, volume: f32);

    /// Apply new echo effect settings.
    fn set_echo(&mut self, echo: EchoSettings);
}

// -------------------------------------------------------------------------------------------------

/// Everything a voice output needs to start playing a note.
#[derive(Debug, Clone)]
pub struct NoteSpec<'a> {
    /// Initial frequency in Hz.
    pub frequency: f32,
    /// Amplifier envelope of the note.
    pub envelope: AdsrParameters,
    /// Initial single cycle waveform.
    pub waveform: &'a Wavetable,
    /// Initial filter, `None` for pass-through.
    pub filter: Option<FilterSpec>,
    /// Tremolo LFO, multiplied with the amplitude.
    pub amplitude_lfo: Option<Lfo>,
    /// Vibrato LFO, bending the pitch in octaves.
    pub bend_lfo: Option<Lfo>,
}

/// Plays notes with a hardware style amplifier envelope, and reports the envelope's state so
/// the engine can follow it with wavetable swaps.
///
/// Released notes continue to play their release stage until they fade out on their own.
pub trait VoiceOutput {
    /// Start playing a note. An already playing note with the same key gets replaced.
    fn press(&mut self, key: VoiceKey, note: &NoteSpec, now: Millis);
    /// Start the release stage of a note.
    fn release(&mut self, key: VoiceKey, now: Millis);
    /// Release all playing notes.
    fn release_all(&mut self, now: Millis);

    fn set_frequency(&mut self, key: VoiceKey, frequency: f32);
    fn set_waveform(&mut self, key: VoiceKey, waveform: &Wavetable);
    fn set_filter(&mut self, key: VoiceKey, filter: Option<FilterSpec>);
    fn set_amplitude_lfo(&mut self, key: VoiceKey, lfo: Option<Lfo>);
    fn set_bend_lfo(&mut self, key: VoiceKey, lfo: Option<Lfo>);

    /// Envelope stage and level of a pressed note at the given time, `None` when the note is
    /// not playing.
    fn envelope_state(&mut self, key: VoiceKey, now: Millis) -> Option<(EnvelopeStage, f32)>;
}
