//! Portamento glides and pitch bend offsets of a single voice.

use crate::utils::midi_to_hz;

// -------------------------------------------------------------------------------------------------

/// Frequency ratio of one semitone, used by constant rate glides.
pub const GEOMETRIC_PROGRESSION: f32 = 1.059463094;

/// Pitch bend value which applies no bend.
///
/// Note that this deliberately differs from the MIDI center value 8192: existing sounds were
/// tuned against this center.
pub const PITCH_BEND_CENTER: f32 = 8292.0;

// -------------------------------------------------------------------------------------------------

/// Glide and bend state of a voice.
///
/// The `portamento` setting selects the glide mode: positive values glide in a constant time
/// of `portamento` seconds, negative values glide with a constant rate of one semitone per
/// `|portamento|` seconds. Zero disables glides.
#[derive(Debug, Clone, PartialEq)]
pub struct PitchState {
    target: f32,
    from: f32,
    ratio: f32,
    progression: f32,
    elapsed: f32,
    bend_range: f32,
    bend_offset: f32,
}

impl PitchState {
    /// Create a new pitch state for a note.
    ///
    /// `target` is the note's frequency (including unison offsets), `from` the frequency to glide
    /// from and `bend_range` the frequency distance a full pitch bend moves the note.
    pub fn new(target: f32, from: f32, bend_range: f32, portamento: f32) -> Self {
        let gliding = portamento != 0.0 && from != target;
        Self {
            target,
            from: if gliding { from } else { target },
            ratio: if gliding { 0.0 } else { 1.0 },
            progression: if target >= from {
                GEOMETRIC_PROGRESSION
            } else {
                1.0 / GEOMETRIC_PROGRESSION
            },
            elapsed: 0.0,
            bend_range,
            bend_offset: 0.0,
        }
    }

    /// Create a pitch state for the given MIDI note, with a bend range in semitones.
    pub fn for_note(
        note: u8,
        offset: f32,
        from: Option<f32>,
        bend_semitones: u8,
        portamento: f32,
    ) -> Self {
        let original = midi_to_hz(note as f32);
        let target = original + offset;
        let bend_range = midi_to_hz(note as f32 + bend_semitones as f32) - original;
        Self::new(target, from.unwrap_or(target), bend_range, portamento)
    }

    /// Frequency the note glides to.
    pub fn target(&self) -> f32 {
        self.target
    }

    /// Glide progress in range \[0, 1\].
    pub fn ratio(&self) -> f32 {
        self.ratio
    }

    pub fn is_gliding(&self) -> bool {
        self.ratio < 1.0
    }

    /// Current frequency including glide and bend.
    pub fn frequency(&self) -> f32 {
        let glide = if self.ratio >= 1.0 {
            self.target
        } else {
            self.from + self.ratio * (self.target - self.from)
        };
        glide + self.bend_offset
    }

    /// Advance the glide by the given number of seconds. Returns true when the frequency
    /// changed.
    pub fn advance(&mut self, seconds: f32, portamento: f32) -> bool {
        if !self.is_gliding() || seconds <= 0.0 {
            return false;
        }
        if portamento == 0.0 {
            self.ratio = 1.0;
            return true;
        }
        self.elapsed += seconds;
        let ratio = if portamento > 0.0 {
            self.elapsed / portamento
        } else {
            let hz = self.from * self.progression.powf(self.elapsed / -portamento);
            (hz - self.from) / (self.target - self.from)
        };
        self.ratio = ratio.clamp(self.ratio, 1.0);
        true
    }

    /// Apply a 14 bit pitch bend value.
    pub fn set_bend(&mut self, value: u16) {
        self.bend_offset = self.bend_range * (value as f32 - PITCH_BEND_CENTER) / PITCH_BEND_CENTER;
    }
}

// -------------------------------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_glide() {
        let pitch = PitchState::for_note(69, 0.0, Some(220.0), 2, 0.0);
        assert!(!pitch.is_gliding());
        assert_eq!(pitch.frequency(), 440.0);
        let pitch = PitchState::for_note(69, 3.0, None, 2, 1.0);
        assert!(!pitch.is_gliding());
        assert_eq!(pitch.frequency(), 443.0);
    }

    #[test]
    fn constant_time_glide() {
        let mut pitch = PitchState::new(440.0, 220.0, 0.0, 2.0);
        assert_eq!(pitch.frequency(), 220.0);
        assert!(pitch.advance(0.5, 2.0));
        assert_eq!(pitch.ratio(), 0.25);
        assert_eq!(pitch.frequency(), 275.0);
        pitch.advance(1.0, 2.0);
        assert_eq!(pitch.ratio(), 0.75);
        pitch.advance(5.0, 2.0);
        assert_eq!(pitch.ratio(), 1.0);
        assert_eq!(pitch.frequency(), 440.0);
        assert!(!pitch.advance(1.0, 2.0));
    }

    #[test]
    fn constant_rate_glide() {
        // one octave up, one semitone per 0.1 seconds
        let mut pitch = PitchState::new(440.0, 220.0, 0.0, -0.1);
        let mut last = pitch.ratio();
        for _ in 0..11 {
            pitch.advance(0.1, -0.1);
            assert!(pitch.ratio() >= last);
            assert!(pitch.ratio() <= 1.0);
            last = pitch.ratio();
        }
        // 11 semitones: ~415 Hz
        assert!((pitch.frequency() - 415.3).abs() < 0.5);
        pitch.advance(0.2, -0.1);
        assert_eq!(pitch.frequency(), 440.0);

        // and down again
        let mut pitch = PitchState::new(220.0, 440.0, 0.0, -0.1);
        pitch.advance(0.1, -0.1);
        assert!((pitch.frequency() - 415.3).abs() < 0.5);
    }

    #[test]
    fn pitch_bend() {
        let mut pitch = PitchState::for_note(69, 0.0, None, 12, 0.0);
        pitch.set_bend(8292);
        assert_eq!(pitch.frequency(), 440.0);
        pitch.set_bend(16383);
        assert!((pitch.frequency() - (440.0 + 440.0 * 8091.0 / 8292.0)).abs() < 0.01);
        pitch.set_bend(0);
        assert!((pitch.frequency() - 0.0).abs() < 0.01);
    }
}
