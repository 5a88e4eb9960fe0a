//! Tremolo and vibrato LFOs of a sound and their modulation wheel control.

use crate::utils::lfo::Lfo;

// -------------------------------------------------------------------------------------------------

/// MIDI controller number of the modulation wheel.
pub const MODULATION_WHEEL: u8 = 1;

// -------------------------------------------------------------------------------------------------

/// How an LFO gets applied.
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
pub enum ModulationMode {
    #[default]
    #[strum(serialize = "OFF")]
    Off,
    /// Always on with full depth.
    #[strum(serialize = "ON")]
    On,
    /// Depth follows the modulation wheel.
    #[strum(serialize = "MODLT")]
    ModWheel,
}

// -------------------------------------------------------------------------------------------------

/// Rate, depth and mode of a tremolo or vibrato LFO.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LfoParams {
    pub mode: ModulationMode,
    pub rate: f32,
    pub scale: f32,
}

impl Default for LfoParams {
    fn default() -> Self {
        Self {
            mode: ModulationMode::Off,
            rate: 4.0,
            scale: 1.8,
        }
    }
}

/// Which of the sound LFOs changed with a control change.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ModulationChange {
    pub tremolo: bool,
    pub vibrato: bool,
}

impl ModulationChange {
    pub fn any(&self) -> bool {
        self.tremolo || self.vibrato
    }
}

// -------------------------------------------------------------------------------------------------

/// The currently active tremolo (amplitude) and vibrato (bend) LFOs of a sound.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SoundModulation {
    tremolo: Option<Lfo>,
    vibrato: Option<Lfo>,
}

impl SoundModulation {
    const TREMOLO_OFFSET: f32 = 1.0;
    const VIBRATO_OFFSET: f32 = 0.0;

    pub fn new() -> Self {
        Self::default()
    }

    /// Amplitude LFO for new and active voices.
    pub fn tremolo(&self) -> Option<Lfo> {
        self.tremolo
    }

    /// Bend LFO for new and active voices.
    pub fn vibrato(&self) -> Option<Lfo> {
        self.vibrato
    }

    /// Rebuild both LFOs from the sound settings. Mod wheel controlled LFOs get removed
    /// until the next control change arrives.
    pub fn rebuild(&mut self, tremolo: &LfoParams, vibrato: &LfoParams) {
        self.tremolo = Self::build(tremolo, Self::TREMOLO_OFFSET);
        self.vibrato = Self::build(vibrato, Self::VIBRATO_OFFSET);
    }

    /// Apply a modulation wheel value to mod wheel controlled LFOs.
    pub fn control_change(
        &mut self,
        value: u8,
        tremolo: &LfoParams,
        vibrato: &LfoParams,
    ) -> ModulationChange {
        ModulationChange {
            tremolo: Self::apply_wheel(&mut self.tremolo, tremolo, value, Self::TREMOLO_OFFSET),
            vibrato: Self::apply_wheel(&mut self.vibrato, vibrato, value, Self::VIBRATO_OFFSET),
        }
    }

    fn build(params: &LfoParams, offset: f32) -> Option<Lfo> {
        match params.mode {
            ModulationMode::On => Some(Lfo::new(params.rate, params.scale, offset)),
            ModulationMode::Off | ModulationMode::ModWheel => None,
        }
    }

    fn apply_wheel(lfo: &mut Option<Lfo>, params: &LfoParams, value: u8, offset: f32) -> bool {
        if params.mode != ModulationMode::ModWheel {
            return false;
        }
        let scale = params.scale * value as f32 / 127.0;
        if value == 0 {
            *lfo = None;
        } else if let Some(lfo) = lfo.as_mut() {
            lfo.set_scale(scale);
        } else {
            *lfo = Some(Lfo::new(params.rate, scale, offset));
        }
        true
    }
}

// -------------------------------------------------------------------------------------------------
