//! Piecewise linear filter envelope, sampled by the time since a note was triggered.

use super::FilterParams;

// -------------------------------------------------------------------------------------------------

/// Resolution of the whole filter envelope curve.
pub const FILTER_ADSR_STEPS: usize = 126;
/// Steps per envelope segment when the envelope has no duration.
const SEGMENT_STEPS: usize = FILTER_ADSR_STEPS / 3;

// -------------------------------------------------------------------------------------------------

/// Filter envelope curve: start level → 1.0 → sustain level → end level, with levels in
/// range `[0, 1]`.
///
/// Each segment gets a share of the fixed step resolution that is proportional to its
/// duration, so the shape of the curve does not depend on how often it is sampled.
#[derive(Debug, Clone, PartialEq)]
pub struct FilterAdsrCurve {
    levels: Vec<f32>,
    span: f32,
}

impl Default for FilterAdsrCurve {
    fn default() -> Self {
        Self::generate(&FilterParams::default())
    }
}

impl FilterAdsrCurve {
    /// Build a new curve from the given filter settings.
    pub fn generate(params: &FilterParams) -> Self {
        let span = params.attack_time + params.decay_time + params.sustain_release;
        let step = span / FILTER_ADSR_STEPS as f32;
        let steps = |time: f32| {
            if step <= 0.0 {
                SEGMENT_STEPS
            } else {
                (time / step) as usize
            }
        };

        let mut levels = Vec::with_capacity(FILTER_ADSR_STEPS + 4);

        // attack
        let start = params.start_level;
        levels.push(start);
        let duration = steps(params.attack_time);
        for tm in 1..=duration {
            levels.push(linear(tm, duration, start, 1.0));
        }

        // decay
        levels.push(1.0);
        let sustain = params.sustain_level;
        let duration = steps(params.decay_time);
        for tm in 1..=duration {
            levels.push(linear(tm, duration, 1.0, sustain));
        }
        levels.push(sustain);

        // sustain-release
        let start = sustain;
        let end = params.end_level;
        let duration = steps(params.sustain_release);
        for tm in 0..duration {
            levels.push(linear(tm, duration, start, end));
        }
        levels.push(end);

        Self { levels, span }
    }

    /// Total duration of the curve in seconds.
    pub fn span(&self) -> f32 {
        self.span
    }

    /// All curve levels.
    pub fn levels(&self) -> &[f32] {
        &self.levels
    }

    /// Curve level at the given number of seconds after the trigger. Times at or beyond the
    /// curve's span return the end level. A curve without any span stays at its start level.
    pub fn sample(&self, elapsed: f32) -> f32 {
        let (Some(first), Some(last)) = (self.levels.first(), self.levels.last()) else {
            return 0.0;
        };
        if self.span <= 0.0 {
            return *first;
        }
        if elapsed >= self.span {
            return *last;
        }
        let position = elapsed.max(0.0) / self.span * self.levels.len() as f32;
        let index = (position as usize).min(self.levels.len() - 1);
        self.levels[index]
    }
}

// -------------------------------------------------------------------------------------------------

fn linear(tm: usize, duration: usize, start: f32, end: f32) -> f32 {
    ((end - start) / duration as f32 * tm as f32 + start).clamp(0.0, 1.0)
}

// -------------------------------------------------------------------------------------------------
