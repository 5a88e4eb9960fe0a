//! Linear ADSR envelope with a separate attack peak level, as used by the voice amplifier.
//!
//! The envelope is advanced by elapsed wall-clock time instead of per sample, so it can
//! mirror a hardware amplitude envelope which is only polled every now and then.

use std::time::Duration;

use crate::Error;

// -------------------------------------------------------------------------------------------------

/// Current processing stage in a [`AdsrEnvelope`].
#[derive(
    Debug, Default, Clone, Copy, PartialEq, Eq, Hash, strum::Display, strum::EnumString,
)]
pub enum EnvelopeStage {
    #[default]
    /// Before attack and after release (zero volume).
    Idle,
    Attack,
    Decay,
    Sustain,
    Release,
}

// -------------------------------------------------------------------------------------------------

/// ADSR envelope parameters that define the envelope shape for a [`AdsrEnvelope`].
#[derive(Debug, Clone, PartialEq)]
pub struct AdsrParameters {
    attack_time: Duration,
    attack_level: f32,
    decay_time: Duration,
    sustain_level: f32,
    release_time: Duration,
}

impl AdsrParameters {
    /// Create new ADSR parameters. Levels must be in range \[0.0, 1.0\].
    pub fn new(
        attack_time: Duration,
        attack_level: f32,
        decay_time: Duration,
        sustain_level: f32,
        release_time: Duration,
    ) -> Result<Self, Error> {
        let mut parameters = Self {
            attack_time,
            attack_level: 0.0,
            decay_time,
            sustain_level: 0.0,
            release_time,
        };
        parameters.set_attack_level(attack_level)?;
        parameters.set_sustain_level(sustain_level)?;
        Ok(parameters)
    }

    /// Get attack time duration.
    pub fn attack_time(&self) -> Duration {
        self.attack_time
    }
    /// Set the attack time. Attack can be zero to completely skip the attack stage.
    pub fn set_attack_time(&mut self, time: Duration) {
        self.attack_time = time;
    }

    /// Get the peak level, reached at the end of the attack stage.
    pub fn attack_level(&self) -> f32 {
        self.attack_level
    }
    /// Set the peak level.
    pub fn set_attack_level(&mut self, level: f32) -> Result<(), Error> {
        if !(0.0..=1.0).contains(&level) {
            return Err(Error::ParameterError(format!(
                "Invalid attack level: {}. Must be in range [0.0, 1.0]",
                level
            )));
        }
        self.attack_level = level;
        Ok(())
    }

    /// Get decay time duration.
    pub fn decay_time(&self) -> Duration {
        self.decay_time
    }
    /// Set the time it takes to move from the attack level to the sustain level.
    pub fn set_decay_time(&mut self, time: Duration) {
        self.decay_time = time;
    }

    /// Get the sustain level.
    pub fn sustain_level(&self) -> f32 {
        self.sustain_level
    }
    /// Set the sustain level.
    pub fn set_sustain_level(&mut self, level: f32) -> Result<(), Error> {
        if !(0.0..=1.0).contains(&level) {
            return Err(Error::ParameterError(format!(
                "Invalid sustain level: {}. Must be in range [0.0, 1.0]",
                level
            )));
        }
        self.sustain_level = level;
        Ok(())
    }

    /// Get release time duration.
    pub fn release_time(&self) -> Duration {
        self.release_time
    }
    /// Set the time it takes to fade out from the level at note off to silence.
    pub fn set_release_time(&mut self, time: Duration) {
        self.release_time = time;
    }
}

impl Default for AdsrParameters {
    fn default() -> Self {
        Self {
            attack_time: Duration::from_millis(200),
            attack_level: 1.0,
            decay_time: Duration::from_millis(300),
            sustain_level: 0.5,
            release_time: Duration::from_millis(200),
        }
    }
}

// -------------------------------------------------------------------------------------------------

/// Linear ADSR envelope with externally defined parameter state.
///
/// Parameters are defined in an external struct which must be passed to the advance function.
#[derive(Debug, Default, Clone)]
pub struct AdsrEnvelope {
    stage: EnvelopeStage,
    release_output: f32,
    output: f32,
}

impl AdsrEnvelope {
    const SILENCE: f32 = 0.001; // -60dB

    /// Create a new ADSR envelope in idle state.
    pub fn new() -> Self {
        Self {
            stage: EnvelopeStage::Idle,
            release_output: 0.0,
            output: 0.0,
        }
    }

    /// Return the envelope's current stage.
    #[inline(always)]
    pub fn stage(&self) -> EnvelopeStage {
        self.stage
    }

    /// Return the envelope's current (last advanced) output value.
    #[inline(always)]
    pub fn output(&self) -> f32 {
        self.output
    }

    /// Start the attack stage, or skip it when there's no attack time.
    pub fn note_on(&mut self, parameters: &AdsrParameters) {
        if parameters.attack_time.is_zero() {
            self.output = parameters.attack_level;
            self.enter_decay(parameters);
        } else {
            self.output = 0.0;
            self.stage = EnvelopeStage::Attack;
        }
    }

    /// Start the release stage from the current output level.
    pub fn note_off(&mut self, parameters: &AdsrParameters) {
        self.release_output = self.output;
        if parameters.release_time.is_zero() || self.output <= Self::SILENCE {
            self.reset();
        } else {
            self.stage = EnvelopeStage::Release;
        }
    }

    /// Immediately stop and set state to Idle.
    pub fn reset(&mut self) {
        self.output = 0.0;
        self.release_output = 0.0;
        self.stage = EnvelopeStage::Idle;
    }

    /// Move the envelope forward by the given amount of time and return the new output.
    /// Stage transitions happen in between, so large steps pass through multiple stages.
    pub fn advance(&mut self, parameters: &AdsrParameters, elapsed: Duration) -> f32 {
        let mut remaining = elapsed.as_secs_f32();
        while remaining > 0.0 {
            match self.stage {
                EnvelopeStage::Attack => {
                    let target = parameters.attack_level;
                    let rate = target / parameters.attack_time.as_secs_f32();
                    if self.output >= target || rate <= 0.0 {
                        self.output = target;
                        self.enter_decay(parameters);
                        continue;
                    }
                    let needed = (target - self.output) / rate;
                    if remaining < needed {
                        self.output += rate * remaining;
                        remaining = 0.0;
                    } else {
                        self.output = target;
                        remaining -= needed;
                        self.enter_decay(parameters);
                    }
                }
                EnvelopeStage::Decay => {
                    let target = parameters.sustain_level;
                    let range = (parameters.attack_level - target).abs();
                    let rate = range / parameters.decay_time.as_secs_f32();
                    let distance = (self.output - target).abs();
                    if distance <= f32::EPSILON || rate <= 0.0 {
                        self.output = target;
                        self.stage = EnvelopeStage::Sustain;
                        continue;
                    }
                    let needed = distance / rate;
                    if remaining < needed {
                        // attack level may be below the sustain level
                        if self.output > target {
                            self.output -= rate * remaining;
                        } else {
                            self.output += rate * remaining;
                        }
                        remaining = 0.0;
                    } else {
                        self.output = target;
                        remaining -= needed;
                        self.stage = EnvelopeStage::Sustain;
                    }
                }
                EnvelopeStage::Release => {
                    let rate = self.release_output / parameters.release_time.as_secs_f32();
                    self.output -= rate * remaining;
                    remaining = 0.0;
                    if self.output <= Self::SILENCE {
                        self.reset();
                    }
                }
                EnvelopeStage::Sustain | EnvelopeStage::Idle => {
                    // nothing to do
                    break;
                }
            }
        }
        self.output
    }

    fn enter_decay(&mut self, parameters: &AdsrParameters) {
        if parameters.decay_time.is_zero() {
            self.output = parameters.sustain_level;
            self.stage = EnvelopeStage::Sustain;
        } else {
            self.stage = EnvelopeStage::Decay;
        }
    }
}

// -------------------------------------------------------------------------------------------------
