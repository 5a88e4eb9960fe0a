//! Per voice filters, modulated by a shared LFO and a velocity scaled filter envelope.

use crate::{
    modulation::ModulationMode,
    utils::{
        key_sense_magnitude,
        lfo::Lfo,
        midi_to_hz,
        time::{elapsed_secs, Millis},
    },
};

// -------------------------------------------------------------------------------------------------

pub(crate) mod adsr;
pub(crate) mod slot;

pub use adsr::{FilterAdsrCurve, FILTER_ADSR_STEPS};
pub use slot::{FilterSlot, FilterSlotState};

// -------------------------------------------------------------------------------------------------

/// Key sensitivity divisor for the filter envelope velocity.
const KEY_SENSE_DIVISOR: f32 = 1280.0;

// -------------------------------------------------------------------------------------------------

/// Voice filter types. `*2` types add the note's frequency to the cutoff (key tracking).
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
pub enum FilterKind {
    #[default]
    #[strum(serialize = "PASS")]
    Pass,
    #[strum(serialize = "LPF")]
    LowPass,
    #[strum(serialize = "HPF")]
    HighPass,
    #[strum(serialize = "BPF")]
    BandPass,
    #[strum(serialize = "NOTCH")]
    Notch,
    #[strum(serialize = "LPF2")]
    LowPassTracked,
    #[strum(serialize = "HPF2")]
    HighPassTracked,
    #[strum(serialize = "BPF2")]
    BandPassTracked,
    #[strum(serialize = "NOTCH2")]
    NotchTracked,
}

impl FilterKind {
    /// Biquad response of the filter kind, `None` for pass-through.
    pub fn response(self) -> Option<FilterResponse> {
        match self {
            Self::Pass => None,
            Self::LowPass | Self::LowPassTracked => Some(FilterResponse::LowPass),
            Self::HighPass | Self::HighPassTracked => Some(FilterResponse::HighPass),
            Self::BandPass | Self::BandPassTracked => Some(FilterResponse::BandPass),
            Self::Notch | Self::NotchTracked => Some(FilterResponse::Notch),
        }
    }

    /// True for filter kinds which follow the note frequency.
    pub fn is_key_tracked(self) -> bool {
        matches!(
            self,
            Self::LowPassTracked | Self::HighPassTracked | Self::BandPassTracked | Self::NotchTracked
        )
    }
}

/// Biquad filter responses of the voice output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, strum::Display)]
pub enum FilterResponse {
    LowPass,
    HighPass,
    BandPass,
    Notch,
}

/// Filter settings as applied to a voice.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FilterSpec {
    pub response: FilterResponse,
    /// Cutoff frequency in Hz, never negative.
    pub cutoff: f32,
    /// Q factor, never negative.
    pub resonance: f32,
}

impl FilterSpec {
    /// Create a filter for the given kind. Returns `None` for pass-through filters.
    pub fn new(kind: FilterKind, cutoff: f32, resonance: f32) -> Option<Self> {
        kind.response().map(|response| Self {
            response,
            cutoff: cutoff.max(0.0),
            resonance: resonance.max(0.0),
        })
    }
}

// -------------------------------------------------------------------------------------------------

/// Filter settings of a sound.
#[derive(Debug, Clone, PartialEq)]
pub struct FilterParams {
    pub kind: FilterKind,
    /// Base cutoff frequency in Hz (±10000).
    pub frequency: i32,
    pub resonance: f32,
    pub modulation: ModulationMode,
    pub lfo_rate: f32,
    /// Cutoff depth of the LFO in Hz.
    pub lfo_depth: i32,
    pub key_sense: i32,
    /// Cutoff offset at full envelope level in Hz.
    pub adsr_frequency_max: i32,
    /// Resonance offset at full envelope level.
    pub adsr_resonance_max: f32,
    pub start_level: f32,
    pub attack_time: f32,
    pub decay_time: f32,
    pub sustain_level: f32,
    pub sustain_release: f32,
    pub end_level: f32,
    /// Velocity sensitivity of the envelope depth.
    pub adsr_velocity: f32,
}

impl Default for FilterParams {
    fn default() -> Self {
        Self {
            kind: FilterKind::Pass,
            frequency: 2000,
            resonance: 1.0,
            modulation: ModulationMode::Off,
            lfo_rate: 1.2,
            lfo_depth: 1000,
            key_sense: 0,
            adsr_frequency_max: 1000,
            adsr_resonance_max: 0.0,
            start_level: 0.5,
            attack_time: 1.0,
            decay_time: 3.0,
            sustain_level: 0.6,
            sustain_release: 5.0,
            end_level: 0.0,
            adsr_velocity: 0.0,
        }
    }
}

// -------------------------------------------------------------------------------------------------

/// Fixed pool of voice filters with their shared LFO and envelope curve.
#[derive(Debug, Clone)]
pub struct FilterBank {
    slots: Vec<FilterSlot>,
    curve: FilterAdsrCurve,
    lfo: Option<Lfo>,
    lfo_start: Millis,
    modulation_value: u8,
}

impl FilterBank {
    pub fn new(size: usize) -> Self {
        Self {
            slots: vec![FilterSlot::default(); size],
            curve: FilterAdsrCurve::default(),
            lfo: None,
            lfo_start: 0,
            modulation_value: 0,
        }
    }

    /// Regenerate the envelope curve and LFO from changed filter settings.
    pub fn rebuild(&mut self, params: &FilterParams, now: Millis) {
        self.curve = FilterAdsrCurve::generate(params);
        self.lfo = match params.modulation {
            ModulationMode::Off => None,
            ModulationMode::On | ModulationMode::ModWheel => Some(Lfo::new(
                params.lfo_rate,
                params.lfo_depth as f32,
                0.0,
            )),
        };
        self.lfo_start = now;
    }

    pub fn curve(&self) -> &FilterAdsrCurve {
        &self.curve
    }

    pub fn slot(&self, index: usize) -> Option<&FilterSlot> {
        self.slots.get(index)
    }

    /// Number of slots which are not idle.
    pub fn active_count(&self) -> usize {
        self.slots.iter().filter(|s| !s.is_idle()).count()
    }

    /// Remember the latest modulation wheel value for mod wheel controlled LFOs.
    pub fn set_modulation_value(&mut self, value: u8) {
        self.modulation_value = value;
    }

    /// Acquire the first idle slot for a new note. `note` is the plain MIDI note without
    /// unison offset. Returns `None` when all slots are in use.
    pub fn acquire(
        &mut self,
        params: &FilterParams,
        velocity: u8,
        note: u8,
        now: Millis,
    ) -> Option<usize> {
        let index = self.slots.iter().position(|s| s.is_idle())?;
        let magnitude = key_sense_magnitude(params.key_sense, note, KEY_SENSE_DIVISOR);
        let velocity = (velocity as f32 * magnitude) as u8;
        let note_frequency = midi_to_hz(note as f32);
        let tracked = if params.kind.is_key_tracked() {
            note_frequency
        } else {
            0.0
        };
        let spec = FilterSpec::new(
            params.kind,
            tracked + params.frequency as f32,
            params.resonance,
        );
        self.slots[index].trigger(now, velocity, note_frequency, spec);
        log::debug!("Acquired filter slot {index} (velocity {velocity})");
        Some(index)
    }

    /// Return a slot to the pool.
    pub fn release(&mut self, index: usize) {
        if let Some(slot) = self.slots.get_mut(index) {
            slot.release();
        }
    }

    /// Release all slots.
    pub fn release_all(&mut self) {
        self.slots.iter_mut().for_each(FilterSlot::release);
    }

    /// Current cutoff offset of the filter LFO.
    pub fn lfo_delta(&self, params: &FilterParams, now: Millis) -> f32 {
        let Some(lfo) = &self.lfo else {
            return 0.0;
        };
        let amount = match params.modulation {
            ModulationMode::Off => return 0.0,
            ModulationMode::On => 127.0,
            ModulationMode::ModWheel => self.modulation_value as f32,
        };
        lfo.value_at(elapsed_secs(self.lfo_start, now)) * amount / 127.0
    }

    /// Recompute the filters of all active slots at the given time.
    pub fn update(&mut self, params: &FilterParams, now: Millis) {
        let lfo_delta = self.lfo_delta(params, now);
        for slot in self.slots.iter_mut().filter(|s| !s.is_idle()) {
            let elapsed = slot.advance(now);
            if params.kind == FilterKind::Pass {
                slot.set_spec(None);
                continue;
            }
            let velocity_scale = 1.0 + slot.velocity() as f32 / 127.0 * params.adsr_velocity;
            let level = self.curve.sample(elapsed) * velocity_scale;
            let tracked = if params.kind.is_key_tracked() {
                slot.note_frequency()
            } else {
                0.0
            };
            let cutoff = tracked
                + params.frequency as f32
                + lfo_delta
                + (level * params.adsr_frequency_max as f32).trunc();
            let resonance = params.resonance + (level * params.adsr_resonance_max).trunc();
            slot.set_spec(FilterSpec::new(params.kind, cutoff, resonance));
        }
    }
}

// -------------------------------------------------------------------------------------------------
