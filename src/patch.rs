//! Typed sound patches, their editor operations and persistence.

use crate::{filter::FilterParams, modulation::LfoParams, operator::OperatorBank, voice::VcaParams};

// -------------------------------------------------------------------------------------------------

mod document;
mod editor;
mod parameters;
mod storage;

pub use document::PatchDocument;
pub use editor::{EditClass, Increment, PatchValue};
pub use parameters::{
    AdditiveField, EffectorField, FilterField, OscillatorField, ParameterDescriptor, ParameterRef,
    SoundField, VcaField,
};
pub use storage::{MemoryPatchStorage, PatchStorage};

// -------------------------------------------------------------------------------------------------

/// Maximum length of a sound name.
pub const SOUND_NAME_LENGTH: usize = 12;

// -------------------------------------------------------------------------------------------------

/// Global settings of a sound.
#[derive(Debug, Clone, PartialEq)]
pub struct SoundParams {
    /// Storage bank, 0..=9.
    pub bank: u8,
    /// Sound slot in the bank, 0..=999.
    pub sound: u16,
    pub name: String,
    /// Amplitude LFO.
    pub tremolo: LfoParams,
    /// Pitch LFO.
    pub vibrato: LfoParams,
    /// Mixer volume, 1..=9.
    pub volume: u8,
    /// Frequency offset of the unison voice in Hz. 0 disables unison.
    pub unison: u8,
    /// Normalize the output level by the sum of the audible amplitudes.
    pub adjust_level: bool,
    /// Pitch bend range in semitones.
    pub pitch_bend: u8,
    /// Glide time (positive) or rate (negative) in seconds, 0 disables glides.
    pub portamento: f32,
}

impl Default for SoundParams {
    fn default() -> Self {
        Self {
            bank: 0,
            sound: 0,
            name: "NO NAME".to_string(),
            tremolo: LfoParams::default(),
            vibrato: LfoParams::default(),
            volume: 5,
            unison: 0,
            adjust_level: true,
            pitch_bend: 2,
            portamento: 0.0,
        }
    }
}

// -------------------------------------------------------------------------------------------------

/// Echo and silence timeout settings of a sound.
#[derive(Debug, Clone, PartialEq)]
pub struct EffectorParams {
    pub echo_delay_ms: u16,
    pub echo_decay: f32,
    /// Wet amount of the echo, 0 disables it.
    pub echo_mix: f32,
    /// Seconds without MIDI input after which the editor takes over again.
    pub pause_secs: u8,
}

impl Default for EffectorParams {
    fn default() -> Self {
        Self {
            echo_delay_ms: 300,
            echo_decay: 0.5,
            echo_mix: 0.0,
            pause_secs: 5,
        }
    }
}

// -------------------------------------------------------------------------------------------------

/// All settings of a sound.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SoundPatch {
    pub sound: SoundParams,
    /// Algorithm, FM operators and additive partials.
    pub oscillators: OperatorBank,
    pub filter: FilterParams,
    pub effector: EffectorParams,
    pub vca: VcaParams,
}
