//! Fixed length wavetables and the primitive wave generators they are built from.

use std::{f32::consts::TAU, fmt::Debug};

use rand::{rngs::SmallRng, Rng, SeedableRng};
use strum::IntoEnumIterator;

// -------------------------------------------------------------------------------------------------

/// Number of samples in a single wavetable.
pub const WAVETABLE_SIZE: usize = 512;
/// Maximum absolute sample value in a wavetable.
pub const SAMPLE_VOLUME: f32 = 32000.0;
/// Number of externally sampled waves which can be used as oscillator sources.
pub const SAMPLED_WAVE_SLOTS: usize = 4;

// -------------------------------------------------------------------------------------------------

/// Available oscillator wave shapes.
#[derive(
    Debug,
    Default,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    strum::Display,
    strum::EnumString,
    strum::EnumIter,
    strum::VariantNames,
)]
pub enum WaveKind {
    #[default]
    #[strum(serialize = "Sin")]
    Sine,
    #[strum(serialize = "Saw")]
    Saw,
    #[strum(serialize = "Tri")]
    Triangle,
    /// Square with a 50% duty cycle.
    #[strum(serialize = "Sqr")]
    Square,
    /// `|sin|`
    #[strum(serialize = "aSi")]
    AbsSine,
    /// `max(sin, 0)`
    #[strum(serialize = "+Si")]
    HalfSine,
    #[strum(serialize = "Noi")]
    Noise,
    #[strum(serialize = "WV1")]
    Sampled1,
    #[strum(serialize = "WV2")]
    Sampled2,
    #[strum(serialize = "WV3")]
    Sampled3,
    #[strum(serialize = "WV4")]
    Sampled4,
}

impl WaveKind {
    /// Look up a wave kind by its stable patch index.
    pub fn from_index(index: usize) -> Option<Self> {
        Self::iter().nth(index)
    }

    /// Stable patch index of the wave kind.
    pub fn index(self) -> usize {
        self as usize
    }

    fn sampled_slot(self) -> Option<usize> {
        match self {
            Self::Sampled1 => Some(0),
            Self::Sampled2 => Some(1),
            Self::Sampled3 => Some(2),
            Self::Sampled4 => Some(3),
            _ => None,
        }
    }
}

// -------------------------------------------------------------------------------------------------

/// One fixed length buffer of signed 16 bit samples in range `[-32000, 32000]`.
#[derive(Clone, PartialEq, Eq)]
pub struct Wavetable {
    samples: [i16; WAVETABLE_SIZE],
}

impl Debug for Wavetable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Wavetable")
            .field("len", &self.samples.len())
            .field("peak", &self.peak())
            .finish()
    }
}

impl Default for Wavetable {
    fn default() -> Self {
        Self::silent()
    }
}

impl Wavetable {
    /// A wavetable with all samples set to zero.
    pub fn silent() -> Self {
        Self {
            samples: [0; WAVETABLE_SIZE],
        }
    }

    /// A single sine cycle at full sample volume.
    pub fn sine() -> Self {
        let mut samples = [0; WAVETABLE_SIZE];
        for (t, sample) in samples.iter_mut().enumerate() {
            *sample = ((TAU * t as f32 / WAVETABLE_SIZE as f32).sin() * SAMPLE_VOLUME) as i16;
        }
        Self { samples }
    }

    /// Create a wavetable from float samples, clamping them into the valid sample range.
    /// Missing samples are filled with silence, excess samples get ignored.
    pub fn from_samples(values: &[f32]) -> Self {
        let mut samples = [0; WAVETABLE_SIZE];
        for (sample, value) in samples.iter_mut().zip(values) {
            *sample = value.clamp(-SAMPLE_VOLUME, SAMPLE_VOLUME) as i16;
        }
        Self { samples }
    }

    /// Access to the raw samples.
    #[inline(always)]
    pub fn samples(&self) -> &[i16] {
        &self.samples
    }

    /// Largest absolute sample value.
    pub fn peak(&self) -> i16 {
        self.samples
            .iter()
            .map(|s| s.saturating_abs())
            .max()
            .unwrap_or(0)
    }
}

// -------------------------------------------------------------------------------------------------

/// Externally sampled waves (e.g. from a microphone) used by the `WV1`..`WV4` wave kinds.
#[derive(Debug, Clone, Default)]
pub struct SampledWaves {
    waves: [Option<Vec<i16>>; SAMPLED_WAVE_SLOTS],
}

impl SampledWaves {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the wave for the given slot. Waves which don't have exactly [`WAVETABLE_SIZE`]
    /// samples are kept, but render as white noise.
    pub fn set(&mut self, slot: usize, samples: Vec<i16>) {
        if slot >= SAMPLED_WAVE_SLOTS {
            log::warn!("Ignoring sampled wave for invalid slot {slot}");
            return;
        }
        if samples.len() != WAVETABLE_SIZE {
            log::warn!(
                "Sampled wave {} has {} samples and will render as noise",
                slot + 1,
                samples.len()
            );
        }
        self.waves[slot] = Some(samples);
    }

    pub fn clear(&mut self, slot: usize) {
        if let Some(wave) = self.waves.get_mut(slot) {
            *wave = None;
        }
    }

    /// The wave of the given slot, if it's set and has the right length.
    pub fn get(&self, slot: usize) -> Option<&[i16]> {
        self.waves
            .get(slot)
            .and_then(|w| w.as_deref())
            .filter(|w| w.len() == WAVETABLE_SIZE)
    }
}

// -------------------------------------------------------------------------------------------------

/// Arguments for [`evaluate_waveform`].
#[derive(Debug, Clone, Copy)]
pub struct WaveformParams<'a> {
    /// Output amplitude in sample units.
    pub amplitude: f32,
    /// Number of wave cycles within the wavetable (1.0 = fundamental).
    pub ratio: f32,
    /// Optional per sample weights, applied after modulation.
    pub envelope: Option<&'a [f32]>,
    /// Optional modulator, used as signed sample index offset.
    pub modulator: Option<&'a [f32]>,
    /// Circular rotation of the modulator, 0..=255 maps to a full wavetable.
    pub phase_shift: u8,
}

impl<'a> WaveformParams<'a> {
    pub fn new(amplitude: f32, ratio: f32) -> Self {
        Self {
            amplitude,
            ratio,
            envelope: None,
            modulator: None,
            phase_shift: 0,
        }
    }

    pub fn with_modulator(mut self, modulator: &'a [f32], phase_shift: u8) -> Self {
        self.modulator = Some(modulator);
        self.phase_shift = phase_shift;
        self
    }

    pub fn with_envelope(mut self, envelope: &'a [f32]) -> Self {
        self.envelope = Some(envelope);
        self
    }
}

/// Render one wavetable sized buffer of the given wave kind.
///
/// The carrier shape is read at `(t + modulator[t]) mod 512` when a modulator is present.
/// White noise ignores the modulator: it is seeded from the integer part of the frequency
/// ratio, so the same patch always produces the same noise table. Sampled waves without a
/// valid sample buffer fall back to white noise. The result is clamped to `±SAMPLE_VOLUME`.
pub fn evaluate_waveform(
    kind: WaveKind,
    params: &WaveformParams,
    sampled: &SampledWaves,
) -> Vec<f32> {
    let (shape, modulated) = match kind {
        WaveKind::Sine => (sine_shape(params.ratio), true),
        WaveKind::AbsSine => (map(sine_shape(params.ratio), f32::abs), true),
        WaveKind::HalfSine => (map(sine_shape(params.ratio), |v| v.max(0.0)), true),
        WaveKind::Saw => (saw_shape(params.ratio), true),
        WaveKind::Triangle => (triangle_shape(params.ratio), true),
        WaveKind::Square => (square_shape(params.ratio), true),
        WaveKind::Noise => (noise_shape(params.ratio), false),
        WaveKind::Sampled1 | WaveKind::Sampled2 | WaveKind::Sampled3 | WaveKind::Sampled4 => {
            let slot = kind.sampled_slot().unwrap_or_default();
            match sampled.get(slot) {
                Some(wave) => (
                    wave.iter().map(|s| *s as f32 / SAMPLE_VOLUME).collect(),
                    true,
                ),
                None => (noise_shape(params.ratio), false),
            }
        }
    };

    let mut wave = match params.modulator {
        Some(modulator) if modulated => {
            let modulator = rotate(modulator, params.phase_shift);
            (0..WAVETABLE_SIZE)
                .map(|t| {
                    let offset = modulator[t].clamp(-SAMPLE_VOLUME, SAMPLE_VOLUME) as i32;
                    let index = (t as i32 + offset).rem_euclid(WAVETABLE_SIZE as i32);
                    shape[index as usize]
                })
                .collect::<Vec<_>>()
        }
        _ => shape,
    };

    for (t, sample) in wave.iter_mut().enumerate() {
        let weight = params
            .envelope
            .and_then(|e| e.get(t).copied())
            .unwrap_or(1.0);
        *sample = (*sample * weight * params.amplitude).clamp(-SAMPLE_VOLUME, SAMPLE_VOLUME);
    }
    wave
}

// -------------------------------------------------------------------------------------------------

fn map(mut wave: Vec<f32>, f: impl Fn(f32) -> f32) -> Vec<f32> {
    wave.iter_mut().for_each(|v| *v = f(*v));
    wave
}

/// Rotate the modulator by `512 * shift / 255` samples. Full or empty rotations are skipped.
fn rotate(modulator: &[f32], phase_shift: u8) -> Vec<f32> {
    let mut rotated = vec![0.0; WAVETABLE_SIZE];
    for (t, value) in rotated.iter_mut().enumerate() {
        *value = modulator.get(t).copied().unwrap_or(0.0);
    }
    let shift = WAVETABLE_SIZE * phase_shift as usize / 255;
    if shift > 0 && shift < WAVETABLE_SIZE - 1 {
        rotated.rotate_right(shift);
    }
    rotated
}

/// Length of one wave segment in samples, for `divisions` segments per cycle.
fn cycle_len(ratio: f32, divisions: f32) -> usize {
    let ratio = ratio.max(f32::EPSILON);
    ((WAVETABLE_SIZE as f32 / ratio / divisions) as usize).max(1)
}

fn sine_shape(ratio: f32) -> Vec<f32> {
    (0..WAVETABLE_SIZE)
        .map(|t| (TAU * ratio * t as f32 / WAVETABLE_SIZE as f32).sin())
        .collect()
}

fn saw_shape(ratio: f32) -> Vec<f32> {
    let step = 2.0 / cycle_len(ratio, 1.0) as f32;
    let mut value = -1.0;
    let mut wave = Vec::with_capacity(WAVETABLE_SIZE);
    for _ in 0..WAVETABLE_SIZE {
        wave.push(value);
        value += step;
        if value >= 1.0 {
            value = -1.0;
        }
    }
    wave
}

fn triangle_shape(ratio: f32) -> Vec<f32> {
    let step = 2.0 / cycle_len(ratio, 4.0) as f32;
    let mut rising = true;
    let mut value: f32 = 0.0;
    let mut wave = Vec::with_capacity(WAVETABLE_SIZE);
    for _ in 0..WAVETABLE_SIZE {
        wave.push(value);
        value += if rising { step } else { -step };
        if value > 1.0 {
            value = 1.0;
            rising = false;
        } else if value < -1.0 {
            value = -1.0;
            rising = true;
        }
    }
    wave
}

fn square_shape(ratio: f32) -> Vec<f32> {
    let cycle = cycle_len(ratio, 2.0);
    let mut high = true;
    let mut wave = Vec::with_capacity(WAVETABLE_SIZE);
    for t in 0..WAVETABLE_SIZE {
        wave.push(if high { 1.0 } else { -1.0 });
        if (t + 1) % cycle == 0 {
            high = !high;
        }
    }
    wave
}

fn noise_shape(ratio: f32) -> Vec<f32> {
    let mut rng = SmallRng::seed_from_u64(ratio.max(0.0) as u64);
    let max = SAMPLE_VOLUME as i32 - 1;
    (0..WAVETABLE_SIZE)
        .map(|_| rng.random_range(-max..=max) as f32 / SAMPLE_VOLUME)
        .collect()
}

// -------------------------------------------------------------------------------------------------
