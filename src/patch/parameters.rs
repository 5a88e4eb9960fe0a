use std::{fmt::Display, str::FromStr};

use four_cc::FourCC;
use strum::IntoEnumIterator;

use crate::{
    algorithm::AlgorithmId,
    filter::FilterKind,
    modulation::ModulationMode,
    operator::{ADDITIVE_COUNT, OPERATOR_COUNT},
    parameter::{
        BooleanParameter, EnumParameter, FloatParameter, IntegerParameter, Parameter,
        TextParameter,
    },
    waveform::WaveKind,
};

use super::SOUND_NAME_LENGTH;

// -------------------------------------------------------------------------------------------------

/// Global sound settings. Display names are the persisted document keys.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, strum::Display, strum::EnumString, strum::EnumIter,
)]
pub enum SoundField {
    #[strum(serialize = "BANK")]
    Bank,
    #[strum(serialize = "SOUND")]
    Sound,
    #[strum(serialize = "SOUND_NAME")]
    Name,
    #[strum(serialize = "AMPLITUDE")]
    Tremolo,
    #[strum(serialize = "LFO_RATE_A")]
    TremoloRate,
    #[strum(serialize = "LFO_SCALE_A")]
    TremoloScale,
    #[strum(serialize = "VIBR")]
    Vibrato,
    #[strum(serialize = "LFO_RATE_B")]
    VibratoRate,
    #[strum(serialize = "LFO_SCALE_B")]
    VibratoScale,
    #[strum(serialize = "VOLUME")]
    Volume,
    #[strum(serialize = "UNISON")]
    Unison,
    #[strum(serialize = "ADJUST_LEVEL")]
    AdjustLevel,
    #[strum(serialize = "PITCH_BEND")]
    PitchBend,
    #[strum(serialize = "PORTAMENT")]
    Portamento,
}

/// FM operator settings.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, strum::Display, strum::EnumString, strum::EnumIter,
)]
#[strum(serialize_all = "snake_case")]
pub enum OscillatorField {
    Waveshape,
    Frequency,
    #[strum(serialize = "freq_decimal")]
    FrequencyDecimal,
    Amplitude,
    Feedback,
    AttackFactor,
    AttackAdditive,
    DecayFactor,
    DecayAdditive,
    SustainFactor,
    SustainAdditive,
    Muted,
}

/// Additive partial settings.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, strum::Display, strum::EnumString, strum::EnumIter,
)]
#[strum(serialize_all = "snake_case")]
pub enum AdditiveField {
    Frequency,
    #[strum(serialize = "freq_decimal")]
    FrequencyDecimal,
    Amplitude,
    Muted,
}

/// Voice filter settings.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, strum::Display, strum::EnumString, strum::EnumIter,
)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum FilterField {
    #[strum(serialize = "TYPE")]
    Kind,
    Frequency,
    Resonance,
    Modulation,
    LfoRate,
    #[strum(serialize = "LFO_FQMAX")]
    LfoDepth,
    #[strum(serialize = "FILTER_KEYSENSE")]
    KeySense,
    #[strum(serialize = "ADSR_FQMAX")]
    AdsrFrequencyMax,
    #[strum(serialize = "ADSR_QfMAX")]
    AdsrResonanceMax,
    StartLevel,
    AttackTime,
    DecayTime,
    SustainLevel,
    SustainRelease,
    EndLevel,
    AdsrVelocity,
}

/// Echo effect and silence timeout settings.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, strum::Display, strum::EnumString, strum::EnumIter,
)]
pub enum EffectorField {
    #[strum(serialize = "ECHO_DELAY_MS")]
    EchoDelay,
    #[strum(serialize = "ECHO_DECAY")]
    EchoDecay,
    #[strum(serialize = "ECHO_MIX")]
    EchoMix,
    #[strum(serialize = "PAUSE_SEC")]
    PauseSecs,
}

/// Amplifier envelope settings.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, strum::Display, strum::EnumString, strum::EnumIter,
)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum VcaField {
    AttackLevel,
    Attack,
    Decay,
    Sustain,
    Release,
    #[strum(serialize = "KEYSENSE")]
    KeySense,
}

// -------------------------------------------------------------------------------------------------

/// Addresses a single value of a [`SoundPatch`](super::SoundPatch).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ParameterRef {
    Sound(SoundField),
    Algorithm,
    /// An operator field, with operator index 0..4.
    Oscillator(usize, OscillatorField),
    /// A partial field, with partial index 0..8.
    Additive(usize, AdditiveField),
    Filter(FilterField),
    Effector(EffectorField),
    Vca(VcaField),
}

impl ParameterRef {
    const SOUND: &'static str = "SOUND";
    const OSCILLATORS: &'static str = "OSCILLATORS";
    const ALGORITHM: &'static str = "algorithm";
    const ADDITIVE: &'static str = "ADDITIVEWAVE";
    const FILTER: &'static str = "FILTER";
    const EFFECTOR: &'static str = "EFFECTOR";
    const VCA: &'static str = "VCA";

    /// All patch parameters, in document order.
    pub fn all() -> Vec<ParameterRef> {
        let mut all = Vec::new();
        all.extend(SoundField::iter().map(Self::Sound));
        all.push(Self::Algorithm);
        for index in 0..OPERATOR_COUNT {
            all.extend(OscillatorField::iter().map(|f| Self::Oscillator(index, f)));
        }
        for index in 0..ADDITIVE_COUNT {
            all.extend(AdditiveField::iter().map(|f| Self::Additive(index, f)));
        }
        all.extend(FilterField::iter().map(Self::Filter));
        all.extend(EffectorField::iter().map(Self::Effector));
        all.extend(VcaField::iter().map(Self::Vca));
        all
    }

    /// Document key of the parameter, e.g. `SOUND.VOLUME` or `OSCILLATORS.2.amplitude`.
    pub fn key(&self) -> String {
        match self {
            Self::Sound(field) => format!("{}.{}", Self::SOUND, field),
            Self::Algorithm => format!("{}.{}", Self::OSCILLATORS, Self::ALGORITHM),
            Self::Oscillator(index, field) => format!("{}.{}.{}", Self::OSCILLATORS, index, field),
            Self::Additive(index, field) => format!("{}.{}.{}", Self::ADDITIVE, index, field),
            Self::Filter(field) => format!("{}.{}", Self::FILTER, field),
            Self::Effector(field) => format!("{}.{}", Self::EFFECTOR, field),
            Self::Vca(field) => format!("{}.{}", Self::VCA, field),
        }
    }

    /// Parse a document key. Returns `None` for unknown keys and out of range indices.
    pub fn from_key(key: &str) -> Option<Self> {
        let parts = key.split('.').collect::<Vec<_>>();
        match parts.as_slice() {
            [Self::SOUND, field] => field.parse().ok().map(Self::Sound),
            [Self::OSCILLATORS, Self::ALGORITHM] => Some(Self::Algorithm),
            [Self::OSCILLATORS, index, field] => {
                let index = parse_index(index, OPERATOR_COUNT)?;
                field.parse().ok().map(|f| Self::Oscillator(index, f))
            }
            [Self::ADDITIVE, index, field] => {
                let index = parse_index(index, ADDITIVE_COUNT)?;
                field.parse().ok().map(|f| Self::Additive(index, f))
            }
            [Self::FILTER, field] => field.parse().ok().map(Self::Filter),
            [Self::EFFECTOR, field] => field.parse().ok().map(Self::Effector),
            [Self::VCA, field] => field.parse().ok().map(Self::Vca),
            _ => None,
        }
    }

    /// Range, default and display format of the parameter.
    pub fn descriptor(&self) -> ParameterDescriptor {
        use ParameterDescriptor::*;
        match *self {
            Self::Sound(field) => match field {
                SoundField::Bank => Integer(int(b"bank", "Bank", 0..=9, 0).with_width(1, false)),
                SoundField::Sound => Integer(int(b"snd ", "Sound", 0..=999, 0).with_width(3, true)),
                SoundField::Name => Text(TextParameter::new(
                    FourCC(*b"name"),
                    "Name",
                    SOUND_NAME_LENGTH,
                    "NO NAME",
                )),
                SoundField::Tremolo => Enum(choice(b"trem", "Tremolo", ModulationMode::Off)),
                SoundField::TremoloRate => Float(lfo(b"trrt", "Tremolo Rate", 4.0)),
                SoundField::TremoloScale => Float(lfo(b"trsc", "Tremolo Scale", 1.8)),
                SoundField::Vibrato => Enum(choice(b"vibr", "Vibrato", ModulationMode::Off)),
                SoundField::VibratoRate => Float(lfo(b"vbrt", "Vibrato Rate", 4.0)),
                SoundField::VibratoScale => Float(lfo(b"vbsc", "Vibrato Scale", 1.8)),
                SoundField::Volume => Integer(int(b"vol ", "Volume", 1..=9, 5).with_width(1, false)),
                SoundField::Unison => Integer(int(b"unis", "Unison", 0..=9, 0).with_width(1, false)),
                SoundField::AdjustLevel => {
                    Boolean(BooleanParameter::new(FourCC(*b"adjl"), "Adjust Level", true))
                }
                SoundField::PitchBend => {
                    Integer(int(b"bend", "Pitch Bend", 0..=12, 2).with_width(1, false))
                }
                SoundField::Portamento => Float(
                    float(b"port", "Portamento", -5.0..=5.0, 0.0)
                        .with_format(6, 3)
                        .with_sign()
                        .with_unit("s"),
                ),
            },
            Self::Algorithm => Enum(choice(b"algo", "Algorithm", AlgorithmId::default())),
            Self::Oscillator(_, field) => match field {
                OscillatorField::Waveshape => Enum(choice(b"wave", "Waveshape", WaveKind::Sine)),
                OscillatorField::Frequency => Integer(ratio(b"freq", "Frequency", 1..=99, 1)),
                OscillatorField::FrequencyDecimal => {
                    Integer(ratio(b"fdec", "Frequency Decimal", 0..=99, 0))
                }
                OscillatorField::Amplitude => Integer(ratio(b"ampl", "Amplitude", 0..=255, 0)),
                OscillatorField::Feedback => Integer(ratio(b"fdbk", "Feedback", 0..=255, 0)),
                OscillatorField::AttackFactor => Float(factor(b"atkf", "Attack Factor")),
                OscillatorField::AttackAdditive => Float(factor(b"atka", "Attack Additive")),
                OscillatorField::DecayFactor => Float(factor(b"dcyf", "Decay Factor")),
                OscillatorField::DecayAdditive => Float(factor(b"dcya", "Decay Additive")),
                OscillatorField::SustainFactor => Float(factor(b"susf", "Sustain Factor")),
                OscillatorField::SustainAdditive => Float(factor(b"susa", "Sustain Additive")),
                OscillatorField::Muted => {
                    Boolean(BooleanParameter::new(FourCC(*b"mute"), "Muted", false))
                }
            },
            Self::Additive(_, field) => match field {
                AdditiveField::Frequency => Integer(ratio(b"afrq", "Frequency", 1..=99, 1)),
                AdditiveField::FrequencyDecimal => {
                    Integer(ratio(b"afdc", "Frequency Decimal", 0..=99, 0))
                }
                AdditiveField::Amplitude => Integer(ratio(b"aamp", "Amplitude", 0..=255, 0)),
                AdditiveField::Muted => {
                    Boolean(BooleanParameter::new(FourCC(*b"amut"), "Muted", false))
                }
            },
            Self::Filter(field) => match field {
                FilterField::Kind => Enum(choice(b"ftyp", "Filter", FilterKind::Pass)),
                FilterField::Frequency => Integer(
                    int(b"fcut", "Frequency", -10000..=10000, 2000)
                        .with_width(6, false)
                        .with_sign(),
                ),
                FilterField::Resonance => Float(
                    float(b"fres", "Resonance", 0.0..=5.0, 1.0).with_format(6, 2),
                ),
                FilterField::Modulation => {
                    Enum(choice(b"fmod", "Modulation", ModulationMode::Off))
                }
                FilterField::LfoRate => Float(
                    float(b"flfr", "LFO Rate", 0.0..=99.99, 1.2)
                        .with_format(6, 2)
                        .with_unit("Hz"),
                ),
                FilterField::LfoDepth => Integer(
                    int(b"flfd", "LFO Depth", 0..=10000, 1000).with_width(6, false),
                ),
                FilterField::KeySense => Integer(
                    int(b"fkey", "Key Sense", -9..=9, 0)
                        .with_width(3, false)
                        .with_sign(),
                ),
                FilterField::AdsrFrequencyMax => Integer(
                    int(b"fafq", "ADSR Frequency", -10000..=10000, 1000)
                        .with_width(6, false)
                        .with_sign(),
                ),
                FilterField::AdsrResonanceMax => Float(
                    float(b"fare", "ADSR Resonance", -5.0..=5.0, 0.0)
                        .with_format(6, 2)
                        .with_sign(),
                ),
                FilterField::StartLevel => Float(level(b"fstl", "Start Level", 0.5)),
                FilterField::AttackTime => Float(time(b"fatk", "Attack Time", 1.0)),
                FilterField::DecayTime => Float(time(b"fdcy", "Decay Time", 3.0)),
                FilterField::SustainLevel => Float(level(b"fsus", "Sustain Level", 0.6)),
                FilterField::SustainRelease => Float(time(b"fsrl", "Sustain Release", 5.0)),
                FilterField::EndLevel => Float(level(b"fend", "End Level", 0.0)),
                FilterField::AdsrVelocity => Float(
                    float(b"fvel", "ADSR Velocity", 0.0..=5.0, 0.0).with_format(5, 1),
                ),
            },
            Self::Effector(field) => match field {
                EffectorField::EchoDelay => Integer(
                    int(b"edly", "Echo Delay", 0..=1000, 300).with_width(4, false),
                ),
                EffectorField::EchoDecay => Float(level(b"edcy", "Echo Decay", 0.5)),
                EffectorField::EchoMix => Float(level(b"emix", "Echo Mix", 0.0)),
                EffectorField::PauseSecs => Integer(
                    int(b"paus", "Pause Seconds", 1..=30, 5).with_width(4, false),
                ),
            },
            Self::Vca(field) => match field {
                VcaField::AttackLevel => Float(level(b"vatl", "Attack Level", 1.0)),
                VcaField::Attack => Float(time(b"vatk", "Attack", 0.2)),
                VcaField::Decay => Float(time(b"vdcy", "Decay", 0.3)),
                VcaField::Sustain => Float(level(b"vsus", "Sustain", 0.5)),
                VcaField::Release => Float(time(b"vrel", "Release", 0.2)),
                VcaField::KeySense => Integer(
                    int(b"vkey", "Key Sense", -9..=9, 0)
                        .with_width(2, false)
                        .with_sign(),
                ),
            },
        }
    }
}

impl Display for ParameterRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.key())
    }
}

impl FromStr for ParameterRef {
    type Err = crate::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_key(s)
            .ok_or_else(|| crate::Error::ParameterError(format!("Unknown parameter '{s}'")))
    }
}

fn parse_index(index: &str, count: usize) -> Option<usize> {
    index.parse::<usize>().ok().filter(|i| *i < count)
}

// -------------------------------------------------------------------------------------------------

/// Descriptor of a patch parameter.
#[derive(Debug, Clone, PartialEq)]
pub enum ParameterDescriptor {
    Float(FloatParameter),
    Integer(IntegerParameter),
    Enum(EnumParameter),
    Boolean(BooleanParameter),
    Text(TextParameter),
}

impl ParameterDescriptor {
    /// Access the descriptor as dyn [`Parameter`].
    pub fn as_parameter(&self) -> &dyn Parameter {
        match self {
            Self::Float(param) => param,
            Self::Integer(param) => param,
            Self::Enum(param) => param,
            Self::Boolean(param) => param,
            Self::Text(param) => param,
        }
    }
}

fn int(
    id: &[u8; 4],
    name: &'static str,
    range: std::ops::RangeInclusive<i32>,
    default: i32,
) -> IntegerParameter {
    IntegerParameter::new(FourCC(*id), name, range, default)
}

fn ratio(
    id: &[u8; 4],
    name: &'static str,
    range: std::ops::RangeInclusive<i32>,
    default: i32,
) -> IntegerParameter {
    int(id, name, range, default).with_width(3, false)
}

fn float(
    id: &[u8; 4],
    name: &'static str,
    range: std::ops::RangeInclusive<f32>,
    default: f32,
) -> FloatParameter {
    FloatParameter::new(FourCC(*id), name, range, default)
}

fn lfo(id: &[u8; 4], name: &'static str, default: f32) -> FloatParameter {
    float(id, name, 0.0..=20.0, default).with_format(6, 3)
}

fn factor(id: &[u8; 4], name: &'static str) -> FloatParameter {
    float(id, name, 0.0..=1.0, 1.0).with_format(3, 1)
}

fn level(id: &[u8; 4], name: &'static str, default: f32) -> FloatParameter {
    float(id, name, 0.0..=1.0, default).with_format(4, 2)
}

fn time(id: &[u8; 4], name: &'static str, default: f32) -> FloatParameter {
    float(id, name, 0.0..=9.99, default)
        .with_format(4, 2)
        .with_unit("s")
}

fn choice<E: IntoEnumIterator + ToString + PartialEq>(
    id: &[u8; 4],
    name: &'static str,
    default: E,
) -> EnumParameter {
    EnumParameter::new(FourCC(*id), name, default)
}

// -------------------------------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;

    #[test]
    fn keys() {
        let volume = ParameterRef::Sound(SoundField::Volume);
        assert_eq!(volume.key(), "SOUND.VOLUME");
        let amplitude = ParameterRef::Oscillator(2, OscillatorField::Amplitude);
        assert_eq!(amplitude.key(), "OSCILLATORS.2.amplitude");
        assert_eq!(
            ParameterRef::Filter(FilterField::AdsrResonanceMax).key(),
            "FILTER.ADSR_QfMAX"
        );
        assert_eq!(
            ParameterRef::Additive(7, AdditiveField::FrequencyDecimal).key(),
            "ADDITIVEWAVE.7.freq_decimal"
        );
        assert_eq!(ParameterRef::Algorithm.key(), "OSCILLATORS.algorithm");
        assert_eq!(ParameterRef::Vca(VcaField::AttackLevel).key(), "VCA.ATTACK_LEVEL");

        assert_eq!(ParameterRef::from_key("OSCILLATORS.4.amplitude"), None);
        assert_eq!(ParameterRef::from_key("SOUND.UNKNOWN"), None);
        assert!("FILTER.LFO_FQMAX".parse::<ParameterRef>().is_ok());
    }

    #[test]
    fn all_keys_round_trip() {
        let all = ParameterRef::all();
        assert_eq!(all.len(), 14 + 1 + 4 * 12 + 8 * 4 + 16 + 4 + 6);
        let keys = all.iter().map(|r| r.key()).collect::<HashSet<_>>();
        assert_eq!(keys.len(), all.len());
        for parameter in all {
            assert_eq!(ParameterRef::from_key(&parameter.key()), Some(parameter));
        }
    }

    #[test]
    fn descriptors() {
        for parameter in ParameterRef::all() {
            let descriptor = parameter.descriptor();
            assert!(!descriptor.as_parameter().name().is_empty());
        }
        let ParameterDescriptor::Enum(algorithm) = ParameterRef::Algorithm.descriptor() else {
            panic!("expected an enum parameter");
        };
        assert_eq!(algorithm.values().len(), 11);
        assert_eq!(algorithm.values()[10], "10:<1>*(2+3+4)");
    }
}
