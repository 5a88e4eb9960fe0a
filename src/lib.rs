#![doc = include_str!("../README.md")]

// private mods (will be partly re-exported)
mod algorithm;
mod device;
mod engine;
mod envelope;
mod error;
mod filter;
mod midi;
mod modulation;
mod operator;
mod output;
mod parameter;
mod patch;
mod pitch;
mod scheduler;
mod voice;
mod waveform;

// public, flat re-exports
pub use error::Error;

pub use algorithm::{
    evaluate_algorithm, evaluate_algorithm_index, output_adjust, AlgorithmId, WavetableSet,
};
pub use envelope::{EnvelopePhase, PhaseThresholds, PhaseTracker, ENVELOPE_PHASE_COUNT};
pub use operator::{
    AdditiveParams, EnvelopeFactors, OperatorBank, OperatorParams, ADDITIVE_COUNT,
    OPERATOR_COUNT,
};
pub use waveform::{
    evaluate_waveform, SampledWaves, WaveKind, WaveformParams, Wavetable, SAMPLED_WAVE_SLOTS,
    SAMPLE_VOLUME, WAVETABLE_SIZE,
};

pub use filter::{
    FilterAdsrCurve, FilterBank, FilterKind, FilterParams, FilterResponse, FilterSlot,
    FilterSlotState, FilterSpec, FILTER_ADSR_STEPS,
};
pub use modulation::{
    LfoParams, ModulationChange, ModulationMode, SoundModulation, MODULATION_WHEEL,
};
pub use pitch::{PitchState, GEOMETRIC_PROGRESSION, PITCH_BEND_CENTER};
pub use voice::{VcaParams, Voice, VoiceAllocator, VoiceKey};

pub use patch::{
    EditClass, EffectorParams, Increment, MemoryPatchStorage, ParameterRef, PatchDocument,
    PatchStorage, PatchValue, SoundParams, SoundPatch, SOUND_NAME_LENGTH,
};

pub use midi::{MidiEvent, SequencerEvent, MIDI_PITCH_BEND_CENTER};
pub use output::{
    AudioOutput, EchoSettings, NoteSpec, SimulatedAudioOutput, SimulatedVoice,
    SimulatedVoiceOutput, VoiceOutput,
};
pub use device::{
    BusGuard, BusLock, Display, EncoderDevice, MidiInput, WaveSampler, ENCODER_COUNT,
};

pub use engine::{EngineConfig, SynthEngine};
pub use scheduler::{EncoderBinding, Scheduler};

// public mods
pub mod utils;

pub mod parameters {
    //! Typed descriptors of all patch parameters.

    pub use super::parameter::{
        BooleanParameter, EnumParameter, FloatParameter, IntegerParameter, Parameter,
        ParameterType, TextParameter,
    };
    pub use super::patch::{
        AdditiveField, EffectorField, FilterField, OscillatorField, ParameterDescriptor,
        SoundField, VcaField,
    };
}
