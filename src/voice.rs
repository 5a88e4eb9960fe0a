//! Sounding notes and their amplifier settings.

use std::{fmt::Display, time::Duration};

use crate::{
    envelope::{EnvelopePhase, PhaseThresholds, PhaseTracker},
    pitch::PitchState,
    utils::{ahdsr::AdsrParameters, key_sense_magnitude},
    Error,
};

// -------------------------------------------------------------------------------------------------

mod allocator;
pub use allocator::VoiceAllocator;

// -------------------------------------------------------------------------------------------------

/// Key sensitivity divisor for the amplifier levels.
const KEY_SENSE_DIVISOR: f32 = 850.0;

// -------------------------------------------------------------------------------------------------

/// Identifies a voice: the MIDI note, offset by 1000 for the detuned unison voice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct VoiceKey(u16);

impl VoiceKey {
    const UNISON_OFFSET: u16 = 1000;

    pub fn new(note: u8, unison: bool) -> Self {
        if unison {
            Self(note as u16 + Self::UNISON_OFFSET)
        } else {
            Self(note as u16)
        }
    }

    /// The plain MIDI note number.
    pub fn note(self) -> u8 {
        (self.0 % Self::UNISON_OFFSET) as u8
    }

    pub fn is_unison(self) -> bool {
        self.0 >= Self::UNISON_OFFSET
    }

    pub fn id(self) -> u16 {
        self.0
    }
}

impl Display for VoiceKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

// -------------------------------------------------------------------------------------------------

/// Amplifier envelope settings of a sound.
#[derive(Debug, Clone, PartialEq)]
pub struct VcaParams {
    /// Peak level at the end of the attack, 0..=1.
    pub attack_level: f32,
    /// Attack time in seconds.
    pub attack: f32,
    pub decay: f32,
    /// Sustain level, 0..=1.
    pub sustain: f32,
    pub release: f32,
    pub key_sense: i32,
}

impl Default for VcaParams {
    fn default() -> Self {
        Self {
            attack_level: 1.0,
            attack: 0.2,
            decay: 0.3,
            sustain: 0.5,
            release: 0.2,
            key_sense: 0,
        }
    }
}

impl VcaParams {
    /// Attack and sustain levels for a note, scaled by velocity and key position.
    pub fn levels(&self, velocity: u8, note: u8) -> (f32, f32) {
        let magnitude = key_sense_magnitude(self.key_sense, note, KEY_SENSE_DIVISOR);
        let scale = |level: f32| (velocity as f32 * level * magnitude / 127.0).clamp(0.0, 1.0);
        (scale(self.attack_level), scale(self.sustain))
    }

    /// Envelope parameters for a note with the given levels.
    pub fn envelope(&self, attack_level: f32, sustain_level: f32) -> Result<AdsrParameters, Error> {
        AdsrParameters::new(
            secs(self.attack),
            attack_level,
            secs(self.decay),
            sustain_level,
            secs(self.release),
        )
    }
}

fn secs(value: f32) -> Duration {
    Duration::from_secs_f32(value.max(0.0))
}

// -------------------------------------------------------------------------------------------------

/// A sounding note.
#[derive(Debug, Clone)]
pub struct Voice {
    /// Note and unison flag of the voice.
    key: VoiceKey,
    /// Note-on velocity.
    velocity: u8,
    /// Assigned slot in the filter bank, if any.
    filter_slot: Option<usize>,
    /// Glide and bend state.
    pitch: PitchState,
    /// Wavetable selection along the amplifier envelope.
    phase: PhaseTracker,
}

impl Voice {
    pub fn new(
        key: VoiceKey,
        velocity: u8,
        filter_slot: Option<usize>,
        pitch: PitchState,
        thresholds: PhaseThresholds,
    ) -> Self {
        Self {
            key,
            velocity,
            filter_slot,
            pitch,
            phase: PhaseTracker::new(thresholds),
        }
    }

    pub fn key(&self) -> VoiceKey {
        self.key
    }

    pub fn velocity(&self) -> u8 {
        self.velocity
    }

    pub fn filter_slot(&self) -> Option<usize> {
        self.filter_slot
    }

    pub fn pitch(&self) -> &PitchState {
        &self.pitch
    }

    pub fn pitch_mut(&mut self) -> &mut PitchState {
        &mut self.pitch
    }

    /// The currently selected wavetable phase.
    pub fn phase(&self) -> EnvelopePhase {
        self.phase.phase()
    }

    pub fn phase_tracker_mut(&mut self) -> &mut PhaseTracker {
        &mut self.phase
    }
}

// -------------------------------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn voice_keys() {
        let key = VoiceKey::new(60, false);
        let unison = VoiceKey::new(60, true);
        assert_eq!((key.id(), unison.id()), (60, 1060));
        assert_eq!(unison.note(), 60);
        assert!(unison.is_unison() && !key.is_unison());
        assert_eq!(unison.to_string(), "1060");
    }

    #[test]
    fn amplifier_levels() {
        let vca = VcaParams::default();
        let (attack, sustain) = vca.levels(127, 60);
        assert_eq!((attack, sustain), (1.0, 0.5));
        let (attack, sustain) = vca.levels(0, 60);
        assert_eq!((attack, sustain), (0.0, 0.0));

        let vca = VcaParams {
            key_sense: 5,
            ..VcaParams::default()
        };
        // 1 - 5 * (128 - 43) / 850 = 0.5
        let (attack, sustain) = vca.levels(127, 43);
        assert!((attack - 0.5).abs() < 1e-5);
        assert!((sustain - 0.25).abs() < 1e-5);
    }

    #[test]
    fn amplifier_envelope() -> Result<(), Box<Error>> {
        let vca = VcaParams::default();
        let envelope = vca.envelope(0.8, 0.4)?;
        assert!((envelope.attack_time().as_secs_f32() - 0.2).abs() < 1e-6);
        assert_eq!(envelope.sustain_level(), 0.4);
        Ok(())
    }
}
