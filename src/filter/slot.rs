use crate::utils::time::{elapsed_secs, Millis};

use super::FilterSpec;

// -------------------------------------------------------------------------------------------------

/// Lifecycle state of a [`FilterSlot`].
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, strum::Display)]
pub enum FilterSlotState {
    /// Free for a new note.
    #[default]
    Idle,
    /// Acquired by a note, but not yet updated.
    Triggered,
    /// Evolving with the time since the trigger.
    Running,
}

// -------------------------------------------------------------------------------------------------

/// One voice filter of the [`FilterBank`](super::FilterBank) pool.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FilterSlot {
    state: FilterSlotState,
    trigger_time: Millis,
    velocity: u8,
    note_frequency: f32,
    spec: Option<FilterSpec>,
}

impl FilterSlot {
    /// Sentinel elapsed time of idle slots.
    pub const INACTIVE: f32 = -1.0;

    pub fn state(&self) -> FilterSlotState {
        self.state
    }

    pub fn is_idle(&self) -> bool {
        self.state == FilterSlotState::Idle
    }

    /// Key sensitivity scaled note-on velocity.
    pub fn velocity(&self) -> u8 {
        self.velocity
    }

    /// Frequency of the note which triggered the slot.
    pub fn note_frequency(&self) -> f32 {
        self.note_frequency
    }

    /// Current filter settings, `None` for pass-through filters and idle slots.
    pub fn spec(&self) -> Option<FilterSpec> {
        self.spec
    }

    /// Seconds since the trigger, 0 while triggered and [`Self::INACTIVE`] when idle.
    pub fn elapsed(&self, now: Millis) -> f32 {
        match self.state {
            FilterSlotState::Idle => Self::INACTIVE,
            FilterSlotState::Triggered => 0.0,
            FilterSlotState::Running => elapsed_secs(self.trigger_time, now),
        }
    }

    pub(super) fn trigger(
        &mut self,
        now: Millis,
        velocity: u8,
        note_frequency: f32,
        spec: Option<FilterSpec>,
    ) {
        self.state = FilterSlotState::Triggered;
        self.trigger_time = now;
        self.velocity = velocity;
        self.note_frequency = note_frequency;
        self.spec = spec;
    }

    /// Move a triggered slot into running state and return its elapsed time.
    pub(super) fn advance(&mut self, now: Millis) -> f32 {
        let elapsed = self.elapsed(now);
        if self.state == FilterSlotState::Triggered {
            self.state = FilterSlotState::Running;
        }
        elapsed
    }

    pub(super) fn set_spec(&mut self, spec: Option<FilterSpec>) {
        self.spec = spec;
    }

    pub(super) fn release(&mut self) {
        *self = Self::default();
    }
}
