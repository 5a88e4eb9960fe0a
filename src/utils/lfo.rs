//! Low frequency oscillators for modulation.

// -------------------------------------------------------------------------------------------------

/// Free running triangle LFO which is evaluated at absolute points in time.
///
/// The output is `offset + scale * triangle(rate * t)`, starting at `offset` and rising first.
/// Evaluating by time instead of by sample makes the LFO usable from the cooperative control
/// loop, where ticks arrive at irregular intervals.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Lfo {
    rate: f32,
    scale: f32,
    offset: f32,
}

impl Lfo {
    pub fn new(rate: f32, scale: f32, offset: f32) -> Self {
        Self {
            rate,
            scale,
            offset,
        }
    }

    /// Rate in Hz.
    pub fn rate(&self) -> f32 {
        self.rate
    }

    pub fn scale(&self) -> f32 {
        self.scale
    }
    /// Set a new depth, keeping rate and offset.
    pub fn set_scale(&mut self, scale: f32) {
        self.scale = scale;
    }

    pub fn offset(&self) -> f32 {
        self.offset
    }

    /// Evaluate the LFO at the given time in seconds.
    pub fn value_at(&self, secs: f32) -> f32 {
        let phase = (self.rate * secs).fract();
        // 0 -> 1 -> -1 -> 0
        let value = if phase < 0.25 {
            4.0 * phase
        } else if phase < 0.75 {
            2.0 - 4.0 * phase
        } else {
            4.0 * phase - 4.0
        };
        self.offset + self.scale * value
    }
}

// -------------------------------------------------------------------------------------------------
