//! Discrete envelope phases which select one of the pre-rendered wavetables of a voice.

use strum::IntoEnumIterator;

use crate::utils::ahdsr::EnvelopeStage;

// -------------------------------------------------------------------------------------------------

/// Number of envelope phases and thus wavetables per sound.
pub const ENVELOPE_PHASE_COUNT: usize = 7;

// -------------------------------------------------------------------------------------------------

/// A subdivision of the amplifier envelope's attack and decay stages.
///
/// Each phase has its own wavetable, rendered with operator levels interpolated between the
/// operator's attack, decay and sustain factors.
#[derive(
    Debug,
    Default,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    strum::Display,
    strum::EnumIter,
)]
pub enum EnvelopePhase {
    #[default]
    AttackStart,
    AttackMiddle,
    AttackEnd,
    DecayStart,
    DecayMiddle,
    DecayEnd,
    Sustain,
}

impl EnvelopePhase {
    pub fn from_index(index: usize) -> Option<Self> {
        Self::iter().nth(index)
    }

    pub fn index(self) -> usize {
        self as usize
    }

    /// Interpolate a value between the attack, decay and sustain waypoints of the phase.
    pub fn interpolate(self, attack: f32, decay: f32, sustain: f32) -> f32 {
        match self {
            Self::AttackStart => attack,
            Self::AttackMiddle => attack + (decay - attack) / 3.0,
            Self::AttackEnd => attack + (decay - attack) / 3.0 * 2.0,
            Self::DecayStart => decay,
            Self::DecayMiddle => decay + (sustain - decay) / 3.0,
            Self::DecayEnd => decay + (sustain - decay) / 3.0 * 2.0,
            Self::Sustain => sustain,
        }
    }
}

// -------------------------------------------------------------------------------------------------

/// Level thresholds which move a voice from one envelope phase to the next.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PhaseThresholds {
    attack_middle: f32,
    attack_end: f32,
    decay_middle: f32,
    decay_end: f32,
}

impl PhaseThresholds {
    /// Thresholds for a note with the given (velocity scaled) attack and sustain levels:
    /// attack splits at 1/3 and 2/3 of the attack level, decay at 2/3 and 1/3 of the
    /// distance from sustain to attack level.
    pub fn new(attack_level: f32, sustain_level: f32) -> Self {
        let range = attack_level - sustain_level;
        Self {
            attack_middle: attack_level / 3.0,
            attack_end: attack_level / 3.0 * 2.0,
            decay_middle: range / 3.0 * 2.0 + sustain_level,
            decay_end: range / 3.0 + sustain_level,
        }
    }
}

// -------------------------------------------------------------------------------------------------

/// Tracks the envelope phase of a single voice from polled amplifier envelope states.
#[derive(Debug, Clone, PartialEq)]
pub struct PhaseTracker {
    thresholds: PhaseThresholds,
    stage: Option<EnvelopeStage>,
    phase: EnvelopePhase,
}

impl PhaseTracker {
    pub fn new(thresholds: PhaseThresholds) -> Self {
        Self {
            thresholds,
            stage: None,
            phase: EnvelopePhase::AttackStart,
        }
    }

    /// The last evaluated phase.
    pub fn phase(&self) -> EnvelopePhase {
        self.phase
    }

    /// Apply a polled envelope stage and level. Returns the new phase when it changed.
    pub fn update(&mut self, stage: EnvelopeStage, level: f32) -> Option<EnvelopePhase> {
        let mut phase = self.phase;
        if self.stage != Some(stage) {
            self.stage = Some(stage);
            phase = match stage {
                EnvelopeStage::Decay => EnvelopePhase::DecayStart,
                EnvelopeStage::Sustain => EnvelopePhase::Sustain,
                _ => EnvelopePhase::AttackStart,
            };
        }
        match stage {
            EnvelopeStage::Attack => {
                if level >= self.thresholds.attack_end {
                    phase = EnvelopePhase::AttackEnd;
                } else if level >= self.thresholds.attack_middle {
                    phase = EnvelopePhase::AttackMiddle;
                }
            }
            EnvelopeStage::Decay => {
                if level < self.thresholds.decay_end {
                    phase = EnvelopePhase::DecayEnd;
                } else if level < self.thresholds.decay_middle {
                    phase = EnvelopePhase::DecayMiddle;
                }
            }
            _ => {}
        }
        if phase != self.phase {
            self.phase = phase;
            Some(phase)
        } else {
            None
        }
    }
}

// -------------------------------------------------------------------------------------------------
