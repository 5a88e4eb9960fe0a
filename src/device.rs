//! Hardware collaborators of the scheduler: MIDI input, rotary encoders, display and the
//! wave sampler, plus the lock of the bus which display and encoders share.

use crate::{midi::MidiEvent, patch::ParameterRef, waveform::Wavetable, Error};

// -------------------------------------------------------------------------------------------------

/// Number of rotary encoders and buttons of an [`EncoderDevice`].
pub const ENCODER_COUNT: usize = 8;

// -------------------------------------------------------------------------------------------------

/// Non-blocking source of MIDI events.
pub trait MidiInput {
    /// Fetch the next pending event, if any. Must never block.
    fn poll(&mut self) -> Result<Option<MidiEvent>, Error>;
}

/// A crossbeam channel receiver can be used as MIDI input, e.g. to feed events from a separate
/// MIDI driver thread. A disconnected channel simply delivers no more events.
impl MidiInput for crossbeam_channel::Receiver<MidiEvent> {
    fn poll(&mut self) -> Result<Option<MidiEvent>, Error> {
        match self.try_recv() {
            Ok(event) => Ok(Some(event)),
            Err(crossbeam_channel::TryRecvError::Empty)
            | Err(crossbeam_channel::TryRecvError::Disconnected) => Ok(None),
        }
    }
}

// -------------------------------------------------------------------------------------------------

/// An 8 channel rotary encoder unit with push buttons and a slide switch.
///
/// All reads go through the shared bus, so callers hold a [`BusGuard`] while reading.
pub trait EncoderDevice {
    /// Slide switch position: 0 for fine, everything else for coarse edits.
    fn switch(&mut self) -> Result<i32, Error>;
    /// Signed rotation of the given encoder since the last read.
    fn rotary_increment(&mut self, index: usize) -> Result<i32, Error>;
    /// True while the given encoder's button is pressed.
    fn button(&mut self, index: usize) -> Result<bool, Error>;
}

// -------------------------------------------------------------------------------------------------

/// Mutual exclusion for the bus which display and encoders share.
pub trait BusLock {
    /// Try to acquire the bus. Fails with [`Error::BusError`] when the bus is busy.
    fn acquire(&mut self) -> Result<(), Error>;
    /// Release a previously acquired bus.
    fn release(&mut self);
}

/// Holds an acquired [`BusLock`] and releases it when dropped.
pub struct BusGuard<'a> {
    lock: &'a mut dyn BusLock,
}

impl<'a> BusGuard<'a> {
    pub fn acquire(lock: &'a mut dyn BusLock) -> Result<Self, Error> {
        lock.acquire()?;
        Ok(Self { lock })
    }
}

impl Drop for BusGuard<'_> {
    fn drop(&mut self) {
        self.lock.release();
    }
}

// -------------------------------------------------------------------------------------------------

/// Shows the editor state. Displays only read engine state.
pub trait Display {
    /// Draw the given waveform.
    fn show_wavetable(&mut self, wavetable: &Wavetable);
    /// Show a parameter with its formatted value.
    fn show_parameter(&mut self, parameter: &ParameterRef, value: &str);
}

// -------------------------------------------------------------------------------------------------

/// Captures a single waveform cycle, e.g. from a microphone.
pub trait WaveSampler {
    /// Capture a wave, normalized to the wavetable's sample range. Returns `None` when
    /// nothing could be captured.
    fn sample(&mut self) -> Option<Vec<i16>>;
}

// -------------------------------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct CountingLock {
        locked: bool,
        acquired: usize,
    }

    impl BusLock for CountingLock {
        fn acquire(&mut self) -> Result<(), Error> {
            if self.locked {
                return Err(Error::BusError("Bus is busy".to_string()));
            }
            self.locked = true;
            self.acquired += 1;
            Ok(())
        }

        fn release(&mut self) {
            self.locked = false;
        }
    }

    #[test]
    fn bus_guard_releases() -> Result<(), Box<Error>> {
        let mut lock = CountingLock::default();
        {
            let _guard = BusGuard::acquire(&mut lock)?;
        }
        assert!(!lock.locked);
        lock.locked = true;
        assert!(BusGuard::acquire(&mut lock).is_err());
        assert_eq!(lock.acquired, 1);
        Ok(())
    }

    #[test]
    fn channel_midi_input() -> Result<(), Box<Error>> {
        let (sender, mut receiver) = crossbeam_channel::unbounded::<MidiEvent>();
        assert_eq!(receiver.poll()?, None);
        assert!(sender.send(MidiEvent::NoteOff { note: 60 }).is_ok());
        assert_eq!(receiver.poll()?, Some(MidiEvent::NoteOff { note: 60 }));
        drop(sender);
        assert_eq!(receiver.poll()?, None);
        Ok(())
    }
}
