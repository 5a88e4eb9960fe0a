use std::fmt::Display;

use strum::IntoEnumIterator;

use crate::Error;

use super::{
    AdditiveField, EffectorField, FilterField, OscillatorField, ParameterDescriptor, ParameterRef,
    SoundField, SoundPatch, VcaField,
};

// -------------------------------------------------------------------------------------------------

/// A plain patch value. Enum and boolean values are represented by their index.
#[derive(Debug, Clone, PartialEq)]
pub enum PatchValue {
    Int(i32),
    Float(f32),
    Text(String),
}

impl Display for PatchValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Int(value) => write!(f, "{value}"),
            Self::Float(value) => write!(f, "{value}"),
            Self::Text(value) => write!(f, "'{value}'"),
        }
    }
}

// -------------------------------------------------------------------------------------------------

/// An editor change of a patch value, as produced by a rotary encoder.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Increment {
    /// Move integer and enum values by whole steps. Oscillator floats move by tenths, other
    /// floats by their smallest displayed digit.
    Step(i32),
    /// Add `step * 10^exponent` to a value.
    Digit { exponent: i32, step: i32 },
    /// Rotate the text character at `cursor` by `step` characters.
    Character { cursor: usize, step: i32 },
}

/// What needs to be recomputed after a parameter changed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, strum::Display)]
pub enum EditClass {
    /// Operator, partial or algorithm changes: all wavetables need to be regenerated.
    Oscillator,
    /// Everything else: sound parameters only need to be applied.
    Parameter,
}

impl ParameterRef {
    pub fn edit_class(&self) -> EditClass {
        match self {
            Self::Algorithm | Self::Oscillator(..) | Self::Additive(..) => EditClass::Oscillator,
            _ => EditClass::Parameter,
        }
    }
}

// -------------------------------------------------------------------------------------------------

impl SoundPatch {
    /// Current value of a parameter. Returns `None` for out of range oscillator indices.
    pub fn value(&self, parameter: ParameterRef) -> Option<PatchValue> {
        use PatchValue::{Float, Int, Text};
        let value = match parameter {
            ParameterRef::Sound(field) => {
                let sound = &self.sound;
                match field {
                    SoundField::Bank => Int(sound.bank as i32),
                    SoundField::Sound => Int(sound.sound as i32),
                    SoundField::Name => Text(sound.name.clone()),
                    SoundField::Tremolo => Int(variant_index(sound.tremolo.mode)),
                    SoundField::TremoloRate => Float(sound.tremolo.rate),
                    SoundField::TremoloScale => Float(sound.tremolo.scale),
                    SoundField::Vibrato => Int(variant_index(sound.vibrato.mode)),
                    SoundField::VibratoRate => Float(sound.vibrato.rate),
                    SoundField::VibratoScale => Float(sound.vibrato.scale),
                    SoundField::Volume => Int(sound.volume as i32),
                    SoundField::Unison => Int(sound.unison as i32),
                    SoundField::AdjustLevel => Int(sound.adjust_level as i32),
                    SoundField::PitchBend => Int(sound.pitch_bend as i32),
                    SoundField::Portamento => Float(sound.portamento),
                }
            }
            ParameterRef::Algorithm => Int(variant_index(self.oscillators.algorithm)),
            ParameterRef::Oscillator(index, field) => {
                let operator = self.oscillators.operators.get(index)?;
                let envelope = &operator.envelope;
                match field {
                    OscillatorField::Waveshape => Int(variant_index(operator.wave)),
                    OscillatorField::Frequency => Int(operator.frequency as i32),
                    OscillatorField::FrequencyDecimal => Int(operator.detune as i32),
                    OscillatorField::Amplitude => Int(operator.amplitude as i32),
                    OscillatorField::Feedback => Int(operator.feedback as i32),
                    OscillatorField::AttackFactor => Float(envelope.attack_factor),
                    OscillatorField::AttackAdditive => Float(envelope.attack_additive),
                    OscillatorField::DecayFactor => Float(envelope.decay_factor),
                    OscillatorField::DecayAdditive => Float(envelope.decay_additive),
                    OscillatorField::SustainFactor => Float(envelope.sustain_factor),
                    OscillatorField::SustainAdditive => Float(envelope.sustain_additive),
                    OscillatorField::Muted => Int(operator.muted as i32),
                }
            }
            ParameterRef::Additive(index, field) => {
                let partial = self.oscillators.additive.get(index)?;
                match field {
                    AdditiveField::Frequency => Int(partial.frequency as i32),
                    AdditiveField::FrequencyDecimal => Int(partial.detune as i32),
                    AdditiveField::Amplitude => Int(partial.amplitude as i32),
                    AdditiveField::Muted => Int(partial.muted as i32),
                }
            }
            ParameterRef::Filter(field) => {
                let filter = &self.filter;
                match field {
                    FilterField::Kind => Int(variant_index(filter.kind)),
                    FilterField::Frequency => Int(filter.frequency),
                    FilterField::Resonance => Float(filter.resonance),
                    FilterField::Modulation => Int(variant_index(filter.modulation)),
                    FilterField::LfoRate => Float(filter.lfo_rate),
                    FilterField::LfoDepth => Int(filter.lfo_depth),
                    FilterField::KeySense => Int(filter.key_sense),
                    FilterField::AdsrFrequencyMax => Int(filter.adsr_frequency_max),
                    FilterField::AdsrResonanceMax => Float(filter.adsr_resonance_max),
                    FilterField::StartLevel => Float(filter.start_level),
                    FilterField::AttackTime => Float(filter.attack_time),
                    FilterField::DecayTime => Float(filter.decay_time),
                    FilterField::SustainLevel => Float(filter.sustain_level),
                    FilterField::SustainRelease => Float(filter.sustain_release),
                    FilterField::EndLevel => Float(filter.end_level),
                    FilterField::AdsrVelocity => Float(filter.adsr_velocity),
                }
            }
            ParameterRef::Effector(field) => {
                let effector = &self.effector;
                match field {
                    EffectorField::EchoDelay => Int(effector.echo_delay_ms as i32),
                    EffectorField::EchoDecay => Float(effector.echo_decay),
                    EffectorField::EchoMix => Float(effector.echo_mix),
                    EffectorField::PauseSecs => Int(effector.pause_secs as i32),
                }
            }
            ParameterRef::Vca(field) => {
                let vca = &self.vca;
                match field {
                    VcaField::AttackLevel => Float(vca.attack_level),
                    VcaField::Attack => Float(vca.attack),
                    VcaField::Decay => Float(vca.decay),
                    VcaField::Sustain => Float(vca.sustain),
                    VcaField::Release => Float(vca.release),
                    VcaField::KeySense => Int(vca.key_sense),
                }
            }
        };
        Some(value)
    }

    /// Set a parameter value. Values of the wrong type or out of the parameter's range are
    /// rejected with a [`Error::ParameterError`] and leave the patch untouched.
    pub fn set_value(&mut self, parameter: ParameterRef, value: PatchValue) -> Result<(), Error> {
        let value = validate(&parameter.descriptor(), value).ok_or_else(|| {
            Error::ParameterError(format!("Invalid value for parameter '{parameter}'"))
        })?;
        let (int, float) = match &value {
            PatchValue::Int(value) => (*value, *value as f32),
            PatchValue::Float(value) => (*value as i32, *value),
            PatchValue::Text(_) => (0, 0.0),
        };
        match parameter {
            ParameterRef::Sound(field) => {
                let sound = &mut self.sound;
                match field {
                    SoundField::Bank => sound.bank = int as u8,
                    SoundField::Sound => sound.sound = int as u16,
                    SoundField::Name => {
                        if let PatchValue::Text(name) = value {
                            sound.name = name;
                        }
                    }
                    SoundField::Tremolo => sound.tremolo.mode = nth_variant(int),
                    SoundField::TremoloRate => sound.tremolo.rate = float,
                    SoundField::TremoloScale => sound.tremolo.scale = float,
                    SoundField::Vibrato => sound.vibrato.mode = nth_variant(int),
                    SoundField::VibratoRate => sound.vibrato.rate = float,
                    SoundField::VibratoScale => sound.vibrato.scale = float,
                    SoundField::Volume => sound.volume = int as u8,
                    SoundField::Unison => sound.unison = int as u8,
                    SoundField::AdjustLevel => sound.adjust_level = int != 0,
                    SoundField::PitchBend => sound.pitch_bend = int as u8,
                    SoundField::Portamento => sound.portamento = float,
                }
            }
            ParameterRef::Algorithm => self.oscillators.algorithm = nth_variant(int),
            ParameterRef::Oscillator(index, field) => {
                let operator = self
                    .oscillators
                    .operators
                    .get_mut(index)
                    .ok_or_else(|| invalid_index(parameter))?;
                let envelope = &mut operator.envelope;
                match field {
                    OscillatorField::Waveshape => operator.wave = nth_variant(int),
                    OscillatorField::Frequency => operator.frequency = int as u8,
                    OscillatorField::FrequencyDecimal => operator.detune = int as u8,
                    OscillatorField::Amplitude => operator.amplitude = int as u8,
                    OscillatorField::Feedback => operator.feedback = int as u8,
                    OscillatorField::AttackFactor => envelope.attack_factor = float,
                    OscillatorField::AttackAdditive => envelope.attack_additive = float,
                    OscillatorField::DecayFactor => envelope.decay_factor = float,
                    OscillatorField::DecayAdditive => envelope.decay_additive = float,
                    OscillatorField::SustainFactor => envelope.sustain_factor = float,
                    OscillatorField::SustainAdditive => envelope.sustain_additive = float,
                    OscillatorField::Muted => operator.muted = int != 0,
                }
            }
            ParameterRef::Additive(index, field) => {
                let partial = self
                    .oscillators
                    .additive
                    .get_mut(index)
                    .ok_or_else(|| invalid_index(parameter))?;
                match field {
                    AdditiveField::Frequency => partial.frequency = int as u8,
                    AdditiveField::FrequencyDecimal => partial.detune = int as u8,
                    AdditiveField::Amplitude => partial.amplitude = int as u8,
                    AdditiveField::Muted => partial.muted = int != 0,
                }
            }
            ParameterRef::Filter(field) => {
                let filter = &mut self.filter;
                match field {
                    FilterField::Kind => filter.kind = nth_variant(int),
                    FilterField::Frequency => filter.frequency = int,
                    FilterField::Resonance => filter.resonance = float,
                    FilterField::Modulation => filter.modulation = nth_variant(int),
                    FilterField::LfoRate => filter.lfo_rate = float,
                    FilterField::LfoDepth => filter.lfo_depth = int,
                    FilterField::KeySense => filter.key_sense = int,
                    FilterField::AdsrFrequencyMax => filter.adsr_frequency_max = int,
                    FilterField::AdsrResonanceMax => filter.adsr_resonance_max = float,
                    FilterField::StartLevel => filter.start_level = float,
                    FilterField::AttackTime => filter.attack_time = float,
                    FilterField::DecayTime => filter.decay_time = float,
                    FilterField::SustainLevel => filter.sustain_level = float,
                    FilterField::SustainRelease => filter.sustain_release = float,
                    FilterField::EndLevel => filter.end_level = float,
                    FilterField::AdsrVelocity => filter.adsr_velocity = float,
                }
            }
            ParameterRef::Effector(field) => {
                let effector = &mut self.effector;
                match field {
                    EffectorField::EchoDelay => effector.echo_delay_ms = int as u16,
                    EffectorField::EchoDecay => effector.echo_decay = float,
                    EffectorField::EchoMix => effector.echo_mix = float,
                    EffectorField::PauseSecs => effector.pause_secs = int as u8,
                }
            }
            ParameterRef::Vca(field) => {
                let vca = &mut self.vca;
                match field {
                    VcaField::AttackLevel => vca.attack_level = float,
                    VcaField::Attack => vca.attack = float,
                    VcaField::Decay => vca.decay = float,
                    VcaField::Sustain => vca.sustain = float,
                    VcaField::Release => vca.release = float,
                    VcaField::KeySense => vca.key_sense = int,
                }
            }
        }
        Ok(())
    }

    /// Apply an editor increment to a parameter. Values which run out of the parameter's range
    /// wrap around to the opposite range end. Returns the new value.
    pub fn increment_value(
        &mut self,
        parameter: ParameterRef,
        increment: Increment,
    ) -> Result<PatchValue, Error> {
        let current = self
            .value(parameter)
            .ok_or_else(|| invalid_index(parameter))?;
        let next = match (parameter.descriptor(), current, increment) {
            (ParameterDescriptor::Float(param), PatchValue::Float(value), increment) => {
                let delta = match increment {
                    Increment::Step(step) if matches!(parameter, ParameterRef::Oscillator(..)) => {
                        step as f32 / 10.0
                    }
                    Increment::Step(step) => step as f32 * 10f32.powi(-(param.precision() as i32)),
                    Increment::Digit { exponent, step } => step as f32 * 10f32.powi(exponent),
                    Increment::Character { .. } => return Err(invalid_increment(parameter)),
                };
                PatchValue::Float(param.wrap_value(value + delta))
            }
            (ParameterDescriptor::Integer(param), PatchValue::Int(value), increment) => {
                let delta = match increment {
                    Increment::Step(step) => step,
                    Increment::Digit { exponent, step } => {
                        (step as f32 * 10f32.powi(exponent)).round() as i32
                    }
                    Increment::Character { .. } => return Err(invalid_increment(parameter)),
                };
                PatchValue::Int(param.wrap_value(value + delta))
            }
            (ParameterDescriptor::Enum(param), PatchValue::Int(value), Increment::Step(step)) => {
                PatchValue::Int(param.wrap_index(value + step) as i32)
            }
            (ParameterDescriptor::Boolean(_), PatchValue::Int(value), Increment::Step(step)) => {
                let value = value + step;
                PatchValue::Int(if value < 0 {
                    1
                } else if value > 1 {
                    0
                } else {
                    value
                })
            }
            (
                ParameterDescriptor::Text(param),
                PatchValue::Text(text),
                Increment::Character { cursor, step },
            ) => PatchValue::Text(param.rotate_character(&text, cursor, step)),
            _ => return Err(invalid_increment(parameter)),
        };
        self.set_value(parameter, next.clone())?;
        Ok(next)
    }

    /// Display string of a parameter value. Amplitudes of muted oscillators show as `MUT`.
    pub fn formatted_value(&self, parameter: ParameterRef) -> Option<String> {
        let muted = match parameter {
            ParameterRef::Oscillator(index, OscillatorField::Amplitude) => {
                self.oscillators.operators.get(index)?.muted
            }
            ParameterRef::Additive(index, AdditiveField::Amplitude) => {
                self.oscillators.additive.get(index)?.muted
            }
            _ => false,
        };
        if muted {
            return Some("MUT".to_string());
        }
        let string = match (parameter.descriptor(), self.value(parameter)?) {
            (ParameterDescriptor::Float(param), PatchValue::Float(value)) => {
                param.value_to_string(value, false)
            }
            (ParameterDescriptor::Integer(param), PatchValue::Int(value)) => {
                param.value_to_string(value)
            }
            (ParameterDescriptor::Enum(param), PatchValue::Int(value)) => {
                param.value_to_string(value.max(0) as usize)
            }
            (ParameterDescriptor::Boolean(param), PatchValue::Int(value)) => {
                param.value_to_string(value != 0)
            }
            (ParameterDescriptor::Text(param), PatchValue::Text(text)) => param.pad(&text),
            (_, value) => value.to_string(),
        };
        Some(string)
    }
}

// -------------------------------------------------------------------------------------------------

/// Check a value against a descriptor, converting enum names and boolean strings to indices.
fn validate(descriptor: &ParameterDescriptor, value: PatchValue) -> Option<PatchValue> {
    match (descriptor, value) {
        (ParameterDescriptor::Float(param), PatchValue::Float(value)) => {
            param.range().contains(&value).then_some(PatchValue::Float(value))
        }
        (ParameterDescriptor::Float(param), PatchValue::Int(value)) => {
            let value = value as f32;
            param.range().contains(&value).then_some(PatchValue::Float(value))
        }
        (ParameterDescriptor::Integer(param), PatchValue::Int(value)) => {
            param.range().contains(&value).then_some(PatchValue::Int(value))
        }
        (ParameterDescriptor::Enum(param), PatchValue::Int(index)) => {
            param.contains(index).then_some(PatchValue::Int(index))
        }
        (ParameterDescriptor::Enum(param), PatchValue::Text(name)) => param
            .index_of(&name)
            .map(|index| PatchValue::Int(index as i32)),
        (ParameterDescriptor::Boolean(_), PatchValue::Int(value)) => {
            (value == 0 || value == 1).then_some(PatchValue::Int(value))
        }
        (ParameterDescriptor::Boolean(param), PatchValue::Text(text)) => param
            .string_to_value(&text)
            .map(|value| PatchValue::Int(value as i32)),
        (ParameterDescriptor::Text(param), PatchValue::Text(text)) => {
            Some(PatchValue::Text(param.clamp_value(&text)))
        }
        _ => None,
    }
}

fn variant_index<E: IntoEnumIterator + PartialEq>(value: E) -> i32 {
    E::iter().position(|v| v == value).unwrap_or(0) as i32
}

fn nth_variant<E: IntoEnumIterator + Default>(index: i32) -> E {
    E::iter().nth(index.max(0) as usize).unwrap_or_default()
}

fn invalid_index(parameter: ParameterRef) -> Error {
    Error::ParameterError(format!("Invalid oscillator index in '{parameter}'"))
}

fn invalid_increment(parameter: ParameterRef) -> Error {
    Error::ParameterError(format!("Invalid increment for parameter '{parameter}'"))
}

// -------------------------------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{algorithm::AlgorithmId, filter::FilterKind, waveform::WaveKind};

    #[test]
    fn get_and_set() -> Result<(), Box<Error>> {
        let mut patch = SoundPatch::default();
        let amplitude = ParameterRef::Oscillator(1, OscillatorField::Amplitude);
        assert_eq!(patch.value(amplitude), Some(PatchValue::Int(255)));
        patch.set_value(amplitude, PatchValue::Int(100))?;
        assert_eq!(patch.oscillators.operators[1].amplitude, 100);

        patch.set_value(
            ParameterRef::Filter(FilterField::Kind),
            PatchValue::Text("LPF2".to_string()),
        )?;
        assert_eq!(patch.filter.kind, FilterKind::LowPassTracked);
        patch.set_value(ParameterRef::Algorithm, PatchValue::Int(10))?;
        assert_eq!(patch.oscillators.algorithm, AlgorithmId::Split3);
        patch.set_value(ParameterRef::Vca(VcaField::Attack), PatchValue::Int(2))?;
        assert_eq!(patch.vca.attack, 2.0);

        // rejected values leave the patch untouched
        assert!(patch.set_value(amplitude, PatchValue::Int(256)).is_err());
        assert!(patch
            .set_value(ParameterRef::Sound(SoundField::Volume), PatchValue::Float(3.0))
            .is_err());
        assert!(patch
            .set_value(ParameterRef::Oscillator(4, OscillatorField::Muted), PatchValue::Int(1))
            .is_err());
        assert_eq!(patch.oscillators.operators[1].amplitude, 100);
        assert_eq!(
            patch.value(ParameterRef::Additive(8, AdditiveField::Amplitude)),
            None
        );
        Ok(())
    }

    #[test]
    fn wrap_around_increments() -> Result<(), Box<Error>> {
        let mut patch = SoundPatch::default();
        let volume = ParameterRef::Sound(SoundField::Volume);
        patch.set_value(volume, PatchValue::Int(9))?;
        assert_eq!(patch.increment_value(volume, Increment::Step(1))?, PatchValue::Int(1));
        assert_eq!(patch.increment_value(volume, Increment::Step(-1))?, PatchValue::Int(9));

        let wave = ParameterRef::Oscillator(0, OscillatorField::Waveshape);
        assert_eq!(patch.increment_value(wave, Increment::Step(-1))?, PatchValue::Int(10));
        assert_eq!(patch.oscillators.operators[0].wave, WaveKind::Sampled4);

        let muted = ParameterRef::Additive(3, AdditiveField::Muted);
        assert_eq!(patch.increment_value(muted, Increment::Step(1))?, PatchValue::Int(1));
        assert_eq!(patch.increment_value(muted, Increment::Step(1))?, PatchValue::Int(0));

        let text = Increment::Character { cursor: 0, step: 1 };
        assert!(patch.increment_value(volume, text).is_err());
        Ok(())
    }

    #[test]
    fn float_increments() -> Result<(), Box<Error>> {
        let mut patch = SoundPatch::default();
        let factor = ParameterRef::Oscillator(2, OscillatorField::DecayFactor);
        assert_eq!(patch.increment_value(factor, Increment::Step(1))?, PatchValue::Float(0.0));
        assert_eq!(patch.increment_value(factor, Increment::Step(3))?, PatchValue::Float(0.3));

        let portamento = ParameterRef::Sound(SoundField::Portamento);
        let tenth = Increment::Digit {
            exponent: -1,
            step: 1,
        };
        assert_eq!(patch.increment_value(portamento, tenth)?, PatchValue::Float(0.1));
        let seconds = Increment::Digit {
            exponent: 0,
            step: -6,
        };
        // -5.9 runs out of range: wraps to the maximum
        assert_eq!(patch.increment_value(portamento, seconds)?, PatchValue::Float(5.0));

        let resonance = ParameterRef::Filter(FilterField::Resonance);
        assert_eq!(patch.increment_value(resonance, Increment::Step(1))?, PatchValue::Float(1.01));
        Ok(())
    }

    #[test]
    fn name_editing() -> Result<(), Box<Error>> {
        let mut patch = SoundPatch::default();
        let name = ParameterRef::Sound(SoundField::Name);
        let next = patch.increment_value(name, Increment::Character { cursor: 0, step: 1 })?;
        assert_eq!(next, PatchValue::Text("OO NAME     ".to_string()));
        assert_eq!(patch.sound.name, "OO NAME     ");
        assert!(patch.increment_value(name, Increment::Step(1)).is_err());
        Ok(())
    }

    #[test]
    fn formatting() -> Result<(), Box<Error>> {
        let mut patch = SoundPatch::default();
        let amplitude = ParameterRef::Oscillator(0, OscillatorField::Amplitude);
        assert_eq!(patch.formatted_value(amplitude).as_deref(), Some(" 10"));
        patch.set_value(ParameterRef::Oscillator(0, OscillatorField::Muted), PatchValue::Int(1))?;
        assert_eq!(patch.formatted_value(amplitude).as_deref(), Some("MUT"));

        let format = |patch: &SoundPatch, parameter| patch.formatted_value(parameter);
        assert_eq!(
            format(&patch, ParameterRef::Sound(SoundField::Portamento)).as_deref(),
            Some("+0.000")
        );
        assert_eq!(
            format(&patch, ParameterRef::Sound(SoundField::Sound)).as_deref(),
            Some("000")
        );
        assert_eq!(
            format(&patch, ParameterRef::Filter(FilterField::Frequency)).as_deref(),
            Some(" +2000")
        );
        assert_eq!(
            format(&patch, ParameterRef::Filter(FilterField::Kind)).as_deref(),
            Some("PASS")
        );
        assert_eq!(
            format(&patch, ParameterRef::Sound(SoundField::AdjustLevel)).as_deref(),
            Some("ON")
        );
        assert_eq!(
            format(&patch, ParameterRef::Sound(SoundField::Name)).as_deref(),
            Some("NO NAME     ")
        );
        Ok(())
    }

    #[test]
    fn edit_classes() {
        assert_eq!(ParameterRef::Algorithm.edit_class(), EditClass::Oscillator);
        assert_eq!(
            ParameterRef::Additive(0, AdditiveField::Amplitude).edit_class(),
            EditClass::Oscillator
        );
        assert_eq!(
            ParameterRef::Vca(VcaField::Release).edit_class(),
            EditClass::Parameter
        );
    }
}
