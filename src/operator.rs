//! FM operator and additive oscillator state.

use crate::{envelope::EnvelopePhase, waveform::WaveKind};

// -------------------------------------------------------------------------------------------------

/// Number of FM operators in a sound.
pub const OPERATOR_COUNT: usize = 4;
/// Number of additive sine partials in a sound.
pub const ADDITIVE_COUNT: usize = 8;

/// Maximum operator and partial amplitude or feedback value.
pub const LEVEL_MAX: f32 = 255.0;
/// Maximum sample index offset a modulator operator produces.
pub const MODULATION_MAX: f32 = 50.0;

// -------------------------------------------------------------------------------------------------

/// Per envelope phase level scaling of an operator.
///
/// `*_factor` values scale modulator operators, `*_additive` values scale operators and
/// partials which are mixed into the audio output.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EnvelopeFactors {
    pub attack_factor: f32,
    pub attack_additive: f32,
    pub decay_factor: f32,
    pub decay_additive: f32,
    pub sustain_factor: f32,
    pub sustain_additive: f32,
}

impl Default for EnvelopeFactors {
    fn default() -> Self {
        Self {
            attack_factor: 1.0,
            attack_additive: 1.0,
            decay_factor: 1.0,
            decay_additive: 1.0,
            sustain_factor: 1.0,
            sustain_additive: 1.0,
        }
    }
}

impl EnvelopeFactors {
    /// Multiplicative scaling for modulators in the given phase.
    pub fn factor(&self, phase: EnvelopePhase) -> f32 {
        phase.interpolate(self.attack_factor, self.decay_factor, self.sustain_factor)
    }

    /// Scaling for audio outputs in the given phase.
    pub fn additive(&self, phase: EnvelopePhase) -> f32 {
        phase.interpolate(
            self.attack_additive,
            self.decay_additive,
            self.sustain_additive,
        )
    }
}

// -------------------------------------------------------------------------------------------------

/// One FM operator.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OperatorParams {
    pub wave: WaveKind,
    /// Integer part of the frequency ratio, 1..=99.
    pub frequency: u8,
    /// Fractional part of the frequency ratio in 1/100, 0..=99.
    pub detune: u8,
    pub amplitude: u8,
    pub feedback: u8,
    pub envelope: EnvelopeFactors,
    pub muted: bool,
}

impl OperatorParams {
    pub fn new(frequency: u8, amplitude: u8, feedback: u8) -> Self {
        Self {
            wave: WaveKind::Sine,
            frequency,
            detune: 0,
            amplitude,
            feedback,
            envelope: EnvelopeFactors::default(),
            muted: false,
        }
    }

    /// Frequency ratio relative to the note's fundamental.
    pub fn ratio(&self) -> f32 {
        frequency_ratio(self.frequency, self.detune)
    }

    /// Output level of the operator in the given phase. Audio outputs are scaled into the full
    /// sample range (multiplied with the output normalization `adjust`), modulators into the
    /// modulation index range.
    pub fn level(&self, phase: EnvelopePhase, audio_output: bool, adjust: f32) -> f32 {
        if self.muted {
            0.0
        } else if audio_output {
            audio_level(self.amplitude, adjust) * self.envelope.additive(phase)
        } else {
            self.amplitude as f32 / LEVEL_MAX * MODULATION_MAX * self.envelope.factor(phase)
        }
    }
}

// -------------------------------------------------------------------------------------------------

/// One additive sine partial.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AdditiveParams {
    pub frequency: u8,
    pub detune: u8,
    pub amplitude: u8,
    pub muted: bool,
}

impl AdditiveParams {
    pub fn new(frequency: u8) -> Self {
        Self {
            frequency,
            detune: 0,
            amplitude: 0,
            muted: false,
        }
    }

    pub fn ratio(&self) -> f32 {
        frequency_ratio(self.frequency, self.detune)
    }

    /// True when the partial contributes to the output.
    pub fn is_audible(&self) -> bool {
        self.amplitude > 0 && !self.muted
    }
}

// -------------------------------------------------------------------------------------------------

/// Operators and additive partials of a sound, together with the algorithm which wires them.
#[derive(Debug, Clone, PartialEq)]
pub struct OperatorBank {
    pub algorithm: crate::AlgorithmId,
    pub operators: [OperatorParams; OPERATOR_COUNT],
    pub additive: [AdditiveParams; ADDITIVE_COUNT],
}

impl Default for OperatorBank {
    fn default() -> Self {
        let modulator = OperatorParams::new(2, 10, 1);
        let carrier = OperatorParams::new(1, 255, 0);
        Self {
            algorithm: crate::AlgorithmId::default(),
            operators: [modulator, carrier, modulator, carrier],
            additive: std::array::from_fn(|i| AdditiveParams::new(i as u8 + 1)),
        }
    }
}

// -------------------------------------------------------------------------------------------------

pub(crate) fn frequency_ratio(frequency: u8, detune: u8) -> f32 {
    (frequency as f32 * 100.0 + detune as f32) / 100.0
}

pub(crate) fn audio_level(amplitude: u8, adjust: f32) -> f32 {
    amplitude as f32 * adjust / LEVEL_MAX * crate::waveform::SAMPLE_VOLUME
}

// -------------------------------------------------------------------------------------------------
