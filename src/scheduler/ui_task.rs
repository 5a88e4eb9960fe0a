use crate::{
    device::{BusGuard, EncoderDevice, ENCODER_COUNT},
    output::{AudioOutput, VoiceOutput},
    patch::{Increment, ParameterDescriptor, ParameterRef, SOUND_NAME_LENGTH},
    utils::time::{Clock, Millis},
    Error,
};

use super::{DisplayUpdate, Scheduler};

// -------------------------------------------------------------------------------------------------

/// Encoder which releases all playing notes when its button gets pressed.
const ALL_NOTES_OFF_BUTTON: usize = 7;

/// Minimum rotary increment which counts as a turn. Smaller values are contact bounce.
const ROTARY_THRESHOLD: i32 = 2;

/// Increment magnification with the slide switch in the coarse position.
const COARSE_MAGNIFICATION: i32 = 5;

// -------------------------------------------------------------------------------------------------

/// What a rotary encoder edits.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub enum EncoderBinding {
    #[default]
    Unbound,
    /// Increment the parameter's value. Text parameters rotate the character under the cursor.
    Parameter(ParameterRef),
    /// Move the text cursor.
    TextCursor,
}

/// A change read from the encoder unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum EncoderEvent {
    Switch(i32),
    Rotary { index: usize, increment: i32 },
    Button(usize),
}

/// Last read encoder state and the encoder bindings.
#[derive(Debug, Clone, PartialEq)]
pub(super) struct UiTaskState {
    switch: i32,
    buttons: [bool; ENCODER_COUNT],
    bindings: [EncoderBinding; ENCODER_COUNT],
    cursor: usize,
    /// Time of the last editor task step.
    last_step: Option<Millis>,
}

impl UiTaskState {
    pub fn new() -> Self {
        Self {
            switch: 0,
            buttons: [false; ENCODER_COUNT],
            bindings: [EncoderBinding::Unbound; ENCODER_COUNT],
            cursor: 0,
            last_step: None,
        }
    }

    pub fn bind(&mut self, index: usize, binding: EncoderBinding) -> Result<(), Error> {
        let slot = self
            .bindings
            .get_mut(index)
            .ok_or_else(|| Error::ParameterError(format!("Invalid encoder index {index}")))?;
        *slot = binding;
        Ok(())
    }

    fn magnification(&self) -> i32 {
        if self.switch == 0 {
            1
        } else {
            COARSE_MAGNIFICATION
        }
    }

    /// Read the encoder until the first change. The switch is read first, then rotary and
    /// button of each encoder in turn.
    fn read(&mut self, encoder: &mut dyn EncoderDevice) -> Result<Option<EncoderEvent>, Error> {
        let switch = encoder.switch()?;
        if switch != self.switch {
            self.switch = switch;
            return Ok(Some(EncoderEvent::Switch(switch)));
        }
        for index in 0..ENCODER_COUNT {
            let increment = encoder.rotary_increment(index)?;
            if increment.abs() >= ROTARY_THRESHOLD {
                return Ok(Some(EncoderEvent::Rotary { index, increment }));
            }
            let pressed = encoder.button(index)?;
            let was_pressed = std::mem::replace(&mut self.buttons[index], pressed);
            if pressed && !was_pressed {
                return Ok(Some(EncoderEvent::Button(index)));
            }
        }
        Ok(None)
    }
}

// -------------------------------------------------------------------------------------------------

impl<C: Clock, V: VoiceOutput, A: AudioOutput> Scheduler<C, V, A> {
    /// One step of the editor task: read the encoders and apply a change, or apply
    /// debounced edits when nothing changed.
    pub(super) fn ui_task(&mut self) {
        let now = self.clock.now_ms();
        if !self.editor_mode {
            let interval = self.engine.config().play_editor_interval_ms;
            let last_step = self.ui_state.last_step;
            if last_step.is_some_and(|last| now.saturating_sub(last) < interval) {
                return;
            }
        }
        self.ui_state.last_step = Some(now);

        let event = match self.read_encoder() {
            Ok(event) => event,
            Err(err) => {
                log::warn!("Failed to read encoders, retrying: {err}");
                return;
            }
        };
        match event {
            Some(event) => {
                self.enter_editor_mode();
                self.handle_encoder_event(event, now);
            }
            None => self.apply_debounced_edits(now),
        }
    }

    fn read_encoder(&mut self) -> Result<Option<EncoderEvent>, Error> {
        let Some(encoder) = self.encoder.as_deref_mut() else {
            return Ok(None);
        };
        let bus = self.bus.as_deref_mut();
        let _guard = bus.map(|bus| BusGuard::acquire(bus)).transpose()?;
        self.ui_state.read(encoder)
    }

    fn handle_encoder_event(&mut self, event: EncoderEvent, now: Millis) {
        match event {
            EncoderEvent::Switch(switch) => {
                log::debug!(
                    "Slide switch {switch}: edit magnification x{}",
                    self.ui_state.magnification()
                );
            }
            EncoderEvent::Rotary { index, increment } => {
                let direction = increment.signum();
                match self.ui_state.bindings[index] {
                    EncoderBinding::Unbound => {}
                    EncoderBinding::TextCursor => {
                        self.ui_state.cursor = (self.ui_state.cursor as i32 + direction)
                            .rem_euclid(SOUND_NAME_LENGTH as i32)
                            as usize;
                    }
                    EncoderBinding::Parameter(parameter) => {
                        self.edit_parameter(parameter, direction, now);
                    }
                }
            }
            EncoderEvent::Button(index) => {
                if index == ALL_NOTES_OFF_BUTTON {
                    self.engine.all_notes_off(now);
                }
            }
        }
    }

    fn edit_parameter(&mut self, parameter: ParameterRef, direction: i32, now: Millis) {
        let increment = match parameter.descriptor() {
            ParameterDescriptor::Text(_) => Increment::Character {
                cursor: self.ui_state.cursor,
                step: direction,
            },
            _ => Increment::Step(direction * self.ui_state.magnification()),
        };
        match self.engine.increment_parameter(parameter, increment) {
            Ok(value) => {
                log::debug!("{parameter} = {value}");
                self.mark_edit(parameter.edit_class(), now);
                self.refresh_display(DisplayUpdate::Parameter(parameter));
            }
            Err(err) => log::warn!("Failed to edit {parameter}: {err}"),
        }
    }
}

// -------------------------------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use std::{cell::RefCell, rc::Rc};

    use super::*;
    use crate::{
        device::BusLock,
        midi::MidiEvent,
        patch::{MemoryPatchStorage, OscillatorField, PatchValue, SoundField},
        scheduler::tests::{scheduler, RecordingDisplay},
        utils::time::ManualClock,
    };

    /// Encoder whose state the test changes through a shared handle.
    #[derive(Clone, Default)]
    struct FakeEncoder {
        state: Rc<RefCell<FakeEncoderState>>,
    }

    #[derive(Default)]
    struct FakeEncoderState {
        switch: i32,
        rotary: [i32; ENCODER_COUNT],
        buttons: [bool; ENCODER_COUNT],
        fail: bool,
    }

    impl FakeEncoder {
        fn turn(&self, index: usize, increment: i32) {
            self.state.borrow_mut().rotary[index] = increment;
        }
    }

    impl EncoderDevice for FakeEncoder {
        fn switch(&mut self) -> Result<i32, Error> {
            let state = self.state.borrow();
            if state.fail {
                return Err(Error::BusError("No acknowledge".to_string()));
            }
            Ok(state.switch)
        }

        fn rotary_increment(&mut self, index: usize) -> Result<i32, Error> {
            Ok(std::mem::take(&mut self.state.borrow_mut().rotary[index]))
        }

        fn button(&mut self, index: usize) -> Result<bool, Error> {
            Ok(self.state.borrow().buttons[index])
        }
    }

    #[derive(Clone, Default)]
    struct SharedBus {
        locked: Rc<RefCell<bool>>,
    }

    impl BusLock for SharedBus {
        fn acquire(&mut self) -> Result<(), Error> {
            let mut locked = self.locked.borrow_mut();
            if *locked {
                return Err(Error::BusError("Bus is busy".to_string()));
            }
            *locked = true;
            Ok(())
        }

        fn release(&mut self) {
            *self.locked.borrow_mut() = false;
        }
    }

    #[test]
    fn rotary_edits() -> Result<(), Box<Error>> {
        let clock = ManualClock::new(0);
        let encoder = FakeEncoder::default();
        let bus = SharedBus::default();
        let display = RecordingDisplay::default();
        let mut scheduler = scheduler(&clock, MemoryPatchStorage::new())
            .with_encoder(encoder.clone(), bus.clone())
            .with_display(display.clone());
        let volume = ParameterRef::Sound(SoundField::Volume);
        scheduler.bind_encoder(0, EncoderBinding::Parameter(volume))?;

        // bounce
        encoder.turn(0, 1);
        scheduler.tick();
        assert!(!scheduler.has_pending_edits());

        encoder.turn(0, 2);
        scheduler.tick();
        assert_eq!(scheduler.engine().patch().sound.volume, 6);
        assert!(scheduler.has_pending_edits());
        assert_eq!(
            display.parameters.borrow().last(),
            Some(&(volume, "6".to_string()))
        );
        assert!(!*bus.locked.borrow());

        encoder.state.borrow_mut().switch = 1;
        scheduler.tick();
        encoder.turn(0, -3);
        scheduler.tick();
        assert_eq!(scheduler.engine().patch().sound.volume, 1);
        Ok(())
    }

    #[test]
    fn play_mode_throttles_encoder_reads() -> Result<(), Box<Error>> {
        let clock = ManualClock::new(0);
        let encoder = FakeEncoder::default();
        let (sender, receiver) = crossbeam_channel::unbounded::<MidiEvent>();
        let mut scheduler = scheduler(&clock, MemoryPatchStorage::new())
            .with_midi_input(receiver)
            .with_encoder(encoder.clone(), SharedBus::default());
        let volume = ParameterRef::Sound(SoundField::Volume);
        scheduler.bind_encoder(0, EncoderBinding::Parameter(volume))?;
        scheduler.tick();

        assert!(sender
            .send(MidiEvent::NoteOn {
                note: 60,
                velocity: 100
            })
            .is_ok());
        scheduler.tick();
        assert!(!scheduler.is_editor_mode());

        // the editor task waits for its interval while playing
        encoder.turn(0, 2);
        scheduler.tick();
        assert!(!scheduler.is_editor_mode());
        assert_eq!(scheduler.engine().patch().sound.volume, 5);

        clock.advance(10);
        scheduler.tick();
        assert!(scheduler.is_editor_mode());
        assert_eq!(scheduler.engine().patch().sound.volume, 6);
        Ok(())
    }

    #[test]
    fn debounced_setup() -> Result<(), Box<Error>> {
        let clock = ManualClock::new(0);
        let encoder = FakeEncoder::default();
        let mut scheduler = scheduler(&clock, MemoryPatchStorage::new())
            .with_encoder(encoder.clone(), SharedBus::default());
        let volume = ParameterRef::Sound(SoundField::Volume);
        let amplitude = ParameterRef::Oscillator(1, OscillatorField::Amplitude);
        scheduler.bind_encoder(0, EncoderBinding::Parameter(volume))?;
        scheduler.bind_encoder(1, EncoderBinding::Parameter(amplitude))?;

        encoder.turn(0, 2);
        scheduler.tick();
        let volume_before = scheduler.engine().audio_output().volume();
        clock.advance(2000);
        scheduler.tick();
        assert!(scheduler.has_pending_edits());
        clock.advance(1);
        scheduler.tick();
        assert!(!scheduler.has_pending_edits());
        assert!(scheduler.engine().audio_output().volume() > volume_before);
        // still editing: audio stays paused
        assert!(scheduler.engine().audio_output().is_paused());

        encoder.turn(1, -2);
        scheduler.tick();
        assert!(scheduler.engine().is_regenerate_pending());
        clock.advance(3000);
        scheduler.tick();
        assert!(scheduler.engine().is_regenerate_pending());
        clock.advance(1001);
        scheduler.tick();
        assert!(!scheduler.engine().is_regenerate_pending());
        Ok(())
    }

    #[test]
    fn name_editing() -> Result<(), Box<Error>> {
        let clock = ManualClock::new(0);
        let encoder = FakeEncoder::default();
        let mut scheduler = scheduler(&clock, MemoryPatchStorage::new())
            .with_encoder(encoder.clone(), SharedBus::default());
        let name = ParameterRef::Sound(SoundField::Name);
        scheduler.bind_encoder(0, EncoderBinding::TextCursor)?;
        scheduler.bind_encoder(1, EncoderBinding::Parameter(name))?;
        assert!(scheduler
            .bind_encoder(ENCODER_COUNT, EncoderBinding::Unbound)
            .is_err());

        encoder.turn(0, 2);
        scheduler.tick();
        encoder.turn(1, 2);
        scheduler.tick();
        assert_eq!(
            scheduler.engine().patch().value(name),
            Some(PatchValue::Text("NP NAME     ".to_string()))
        );
        Ok(())
    }

    #[test]
    fn buttons_and_bus_errors() -> Result<(), Box<Error>> {
        let clock = ManualClock::new(0);
        let encoder = FakeEncoder::default();
        let mut scheduler = scheduler(&clock, MemoryPatchStorage::new())
            .with_encoder(encoder.clone(), SharedBus::default());
        scheduler.engine_mut().note_on(60, 100, 0)?;

        encoder.state.borrow_mut().fail = true;
        encoder.state.borrow_mut().buttons[ALL_NOTES_OFF_BUTTON] = true;
        scheduler.tick();
        assert_eq!(scheduler.engine().voices().len(), 1);

        encoder.state.borrow_mut().fail = false;
        scheduler.tick();
        assert!(scheduler.engine().voices().is_empty());

        // held buttons trigger once
        scheduler.engine_mut().note_on(62, 100, 0)?;
        scheduler.tick();
        assert_eq!(scheduler.engine().voices().len(), 1);
        Ok(())
    }
}
