use std::{
    cell::Cell,
    rc::Rc,
    time::{Duration, Instant},
};

// -------------------------------------------------------------------------------------------------

/// Millisecond time stamps, as used by all scheduler and voice timers.
pub type Millis = u64;

/// Elapsed seconds between two millisecond time stamps. Never negative.
pub fn elapsed_secs(since: Millis, now: Millis) -> f32 {
    now.saturating_sub(since) as f32 / 1000.0
}

// -------------------------------------------------------------------------------------------------

/// A monotonic millisecond clock which also knows how to yield for a while.
pub trait Clock {
    /// Current time in milliseconds since some arbitrary, fixed start point.
    fn now_ms(&self) -> Millis;
    /// Give up control for the given duration.
    fn sleep(&self, duration: Duration);
}

// -------------------------------------------------------------------------------------------------

/// Wall-clock based [`Clock`] implementation.
#[derive(Debug, Clone)]
pub struct SystemClock {
    start: Instant,
}

impl SystemClock {
    pub fn new() -> Self {
        Self {
            start: Instant::now(),
        }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for SystemClock {
    fn now_ms(&self) -> Millis {
        self.start.elapsed().as_millis() as Millis
    }

    fn sleep(&self, duration: Duration) {
        if !duration.is_zero() {
            std::thread::sleep(duration);
        } else {
            std::thread::yield_now();
        }
    }
}

// -------------------------------------------------------------------------------------------------

/// Manually driven [`Clock`] for tests and offline rendering.
///
/// Clones share the same time, so a test can keep a handle while the scheduler owns another.
/// Sleeping advances the shared time.
#[derive(Debug, Clone, Default)]
pub struct ManualClock {
    now: Rc<Cell<Millis>>,
}

impl ManualClock {
    pub fn new(start: Millis) -> Self {
        Self {
            now: Rc::new(Cell::new(start)),
        }
    }

    /// Move time forward by the given number of milliseconds.
    pub fn advance(&self, millis: Millis) {
        self.now.set(self.now.get() + millis);
    }

    pub fn set(&self, now: Millis) {
        self.now.set(now);
    }
}

impl Clock for ManualClock {
    fn now_ms(&self) -> Millis {
        self.now.get()
    }

    fn sleep(&self, duration: Duration) {
        self.advance(duration.as_millis() as Millis);
    }
}

// -------------------------------------------------------------------------------------------------
