//! Cooperative scheduling of the MIDI and the editor (encoder) task.

use std::time::Duration;

use crossbeam_queue::ArrayQueue;

use crate::{
    device::{BusGuard, BusLock, Display, EncoderDevice, MidiInput, WaveSampler},
    engine::SynthEngine,
    envelope::EnvelopePhase,
    midi::SequencerEvent,
    output::{AudioOutput, VoiceOutput},
    patch::{EditClass, ParameterRef, PatchStorage, PatchValue, SoundField},
    utils::time::{Clock, Millis},
    Error,
};

// -------------------------------------------------------------------------------------------------

mod midi_task;
mod ui_task;

pub use ui_task::EncoderBinding;

use midi_task::MidiTaskState;
use ui_task::UiTaskState;

// -------------------------------------------------------------------------------------------------

/// Time stamps of the latest not yet applied edits.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
struct PendingEdits {
    parameter: Option<Millis>,
    oscillator: Option<Millis>,
}

/// What to show on the display.
#[derive(Debug, Clone, Copy, PartialEq)]
enum DisplayUpdate {
    Parameter(ParameterRef),
    Wavetable,
}

// -------------------------------------------------------------------------------------------------

/// Runs the MIDI task and the editor task of a [`SynthEngine`] in turns.
///
/// The scheduler is either in *play mode*, where MIDI input gets serviced preferentially, or
/// in *editor mode*, where the audio output is paused and encoder edits get applied. Editing
/// enters editor mode, notes from MIDI or the sequencer leave it, and a MIDI input which stays
/// silent for the sound's pause time returns to it.
///
/// Each [`tick`](Self::tick) first fully services the MIDI task, then the editor task, then
/// yields via the [`Clock`].
pub struct Scheduler<C: Clock, V: VoiceOutput, A: AudioOutput> {
    engine: SynthEngine<V, A>,
    clock: C,
    storage: Box<dyn PatchStorage>,
    midi_input: Option<Box<dyn MidiInput>>,
    encoder: Option<Box<dyn EncoderDevice>>,
    bus: Option<Box<dyn BusLock>>,
    display: Option<Box<dyn Display>>,
    sampler: Option<Box<dyn WaveSampler>>,
    sequencer: ArrayQueue<SequencerEvent>,
    editor_mode: bool,
    pending_edits: PendingEdits,
    midi_state: MidiTaskState,
    ui_state: UiTaskState,
}

impl<C: Clock, V: VoiceOutput, A: AudioOutput> Scheduler<C, V, A> {
    /// Create a new scheduler for the given engine. The scheduler starts in editor mode.
    pub fn new(engine: SynthEngine<V, A>, clock: C, storage: impl PatchStorage + 'static) -> Self {
        let sequencer = ArrayQueue::new(engine.config().sequencer_capacity.max(1));
        let now = clock.now_ms();
        let mut scheduler = Self {
            engine,
            clock,
            storage: Box::new(storage),
            midi_input: None,
            encoder: None,
            bus: None,
            display: None,
            sampler: None,
            sequencer,
            editor_mode: true,
            pending_edits: PendingEdits::default(),
            midi_state: MidiTaskState::new(now),
            ui_state: UiTaskState::new(),
        };
        scheduler.engine.audio_output_mut().pause();
        scheduler
    }

    /// Attach a MIDI input.
    pub fn with_midi_input(mut self, midi_input: impl MidiInput + 'static) -> Self {
        self.midi_input = Some(Box::new(midi_input));
        self
    }

    /// Attach an encoder unit, which shares the given bus with the display.
    pub fn with_encoder(
        mut self,
        encoder: impl EncoderDevice + 'static,
        bus: impl BusLock + 'static,
    ) -> Self {
        self.encoder = Some(Box::new(encoder));
        self.bus = Some(Box::new(bus));
        self
    }

    pub fn with_display(mut self, display: impl Display + 'static) -> Self {
        self.display = Some(Box::new(display));
        self
    }

    pub fn with_sampler(mut self, sampler: impl WaveSampler + 'static) -> Self {
        self.sampler = Some(Box::new(sampler));
        self
    }

    pub fn engine(&self) -> &SynthEngine<V, A> {
        &self.engine
    }

    pub fn engine_mut(&mut self) -> &mut SynthEngine<V, A> {
        &mut self.engine
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }

    pub fn is_editor_mode(&self) -> bool {
        self.editor_mode
    }

    /// True while edits wait for their debounce time to elapse.
    pub fn has_pending_edits(&self) -> bool {
        self.pending_edits != PendingEdits::default()
    }

    // ---------------------------------------------------------------------------------------------

    /// Run one scheduling round: the MIDI task, then the editor task, then yield.
    ///
    /// The MIDI task applies all pending MIDI events (up to the configured batch size) on
    /// every tick. In play mode the editor task only runs once per editor interval, so live
    /// MIDI input is never held back by encoder reads.
    pub fn tick(&mut self) {
        self.midi_task();
        self.ui_task();
        let yield_ms = self.engine.config().yield_ms;
        self.clock.sleep(Duration::from_millis(yield_ms));
    }

    /// Append an event to the test sequencer.
    pub fn push_sequence(&self, event: SequencerEvent) -> Result<(), Error> {
        self.sequencer
            .push(event)
            .map_err(|event| Error::SendError(format!("Sequencer queue is full, dropped {event:?}")))
    }

    /// Replace all queued sequencer events.
    pub fn set_sequence(
        &mut self,
        events: impl IntoIterator<Item = SequencerEvent>,
    ) -> Result<(), Error> {
        while self.sequencer.pop().is_some() {}
        self.midi_state.reset_wait();
        for event in events {
            self.push_sequence(event)?;
        }
        Ok(())
    }

    /// Number of sequencer events which did not play yet.
    pub fn sequence_len(&self) -> usize {
        self.sequencer.len()
    }

    /// Bind a rotary encoder to a parameter.
    pub fn bind_encoder(&mut self, index: usize, binding: EncoderBinding) -> Result<(), Error> {
        self.ui_state.bind(index, binding)
    }

    // ---------------------------------------------------------------------------------------------

    /// Load a patch from the storage and set it up. Failures are logged and keep the current
    /// patch: returns false then.
    pub fn load_patch(&mut self, bank: u8, sound: u16) -> bool {
        let now = self.clock.now_ms();
        let was_paused = self.engine.audio_output().is_paused();
        self.engine.audio_output_mut().pause();
        let loaded = match self.storage.load(bank, sound) {
            Ok(document) => self.engine.apply_document(&document, now),
            Err(err) => Err(err),
        };
        let success = match loaded {
            Ok(()) => {
                self.set_sound_slot(bank, sound);
                self.pending_edits = PendingEdits::default();
                self.refresh_display(DisplayUpdate::Wavetable);
                true
            }
            Err(err) => {
                log::warn!("Failed to load sound {sound:03} of bank {bank}: {err}");
                false
            }
        };
        if !was_paused {
            self.engine.audio_output_mut().resume();
        }
        success
    }

    /// Save the current patch to the storage. Failures are logged and keep the current
    /// patch unchanged: returns false then.
    pub fn save_patch(&mut self, bank: u8, sound: u16) -> bool {
        let mut document = self.engine.to_document();
        for (field, value) in [(SoundField::Bank, bank as i32), (SoundField::Sound, sound as i32)] {
            document.insert(ParameterRef::Sound(field).key(), PatchValue::Int(value));
        }
        match self.storage.save(bank, sound, &document) {
            Ok(()) => {
                self.set_sound_slot(bank, sound);
                log::info!("Saved sound {sound:03} to bank {bank}");
                true
            }
            Err(err) => {
                log::warn!("Failed to save sound {sound:03} to bank {bank}: {err}");
                false
            }
        }
    }

    /// Name of a stored sound, if the storage has one.
    pub fn sound_name(&mut self, bank: u8, sound: u16) -> Option<String> {
        self.storage.sound_name(bank, sound)
    }

    /// Capture a wave with the attached sampler into the given sampled wave slot, and
    /// regenerate the wavetables with it.
    pub fn capture_sampled_wave(&mut self, slot: usize) -> Result<(), Error> {
        let sampler = self
            .sampler
            .as_mut()
            .ok_or_else(|| Error::ParameterError("No wave sampler attached".to_string()))?;
        let samples = sampler.sample().ok_or(Error::SampleError(0))?;
        self.engine.set_sampled_wave(slot, samples)?;
        let now = self.clock.now_ms();
        self.engine.setup_synthesizer(true, now);
        self.refresh_display(DisplayUpdate::Wavetable);
        log::info!("Captured sampled wave {}", slot + 1);
        Ok(())
    }

    // ---------------------------------------------------------------------------------------------

    fn set_sound_slot(&mut self, bank: u8, sound: u16) {
        for (field, value) in [(SoundField::Bank, bank as i32), (SoundField::Sound, sound as i32)] {
            if let Err(err) = self
                .engine
                .set_parameter(ParameterRef::Sound(field), PatchValue::Int(value))
            {
                log::warn!("Failed to set sound slot: {err}");
            }
        }
    }

    /// Pause audio and service the editor preferentially.
    fn enter_editor_mode(&mut self) {
        if !self.editor_mode {
            self.editor_mode = true;
            self.engine.audio_output_mut().pause();
            log::info!("Entering editor mode");
        }
    }

    /// Apply pending edits and resume audio for playing.
    fn enter_play_mode(&mut self, now: Millis) {
        if self.editor_mode {
            self.editor_mode = false;
            self.apply_pending_edits(now);
            self.engine.audio_output_mut().resume();
            log::info!("Entering play mode");
        }
    }

    /// Remember an edit for a deferred setup.
    fn mark_edit(&mut self, class: EditClass, now: Millis) {
        match class {
            EditClass::Oscillator => self.pending_edits.oscillator = Some(now),
            EditClass::Parameter => self.pending_edits.parameter = Some(now),
        }
    }

    /// Set up the synthesizer when pending edits did not change for their debounce time.
    fn apply_debounced_edits(&mut self, now: Millis) {
        let config = self.engine.config();
        let elapsed = |time: Option<Millis>, timeout: Millis| {
            time.is_some_and(|time| now.saturating_sub(time) > timeout)
        };
        if elapsed(self.pending_edits.oscillator, config.oscillator_debounce_ms)
            || elapsed(self.pending_edits.parameter, config.parameter_debounce_ms)
        {
            self.apply_pending_edits(now);
        }
    }

    fn apply_pending_edits(&mut self, now: Millis) {
        let pending = std::mem::take(&mut self.pending_edits);
        if pending.oscillator.is_some() {
            self.engine.setup_synthesizer(true, now);
            self.refresh_display(DisplayUpdate::Wavetable);
        } else if pending.parameter.is_some() {
            self.engine.setup_synthesizer(false, now);
        }
    }

    fn refresh_display(&mut self, update: DisplayUpdate) {
        let Some(display) = self.display.as_deref_mut() else {
            return;
        };
        let bus = self.bus.as_deref_mut();
        let _guard = match bus.map(|bus| BusGuard::acquire(bus)).transpose() {
            Ok(guard) => guard,
            Err(err) => {
                log::warn!("Skipping display update: {err}");
                return;
            }
        };
        match update {
            DisplayUpdate::Parameter(parameter) => {
                if let Some(value) = self.engine.formatted_parameter(parameter) {
                    display.show_parameter(&parameter, &value);
                }
            }
            DisplayUpdate::Wavetable => {
                display.show_wavetable(self.engine.wavetable(EnvelopePhase::Sustain));
            }
        }
    }
}

// -------------------------------------------------------------------------------------------------

#[cfg(test)]
pub(crate) mod tests {
    use std::{cell::RefCell, rc::Rc};

    use super::*;
    use crate::{
        engine::EngineConfig,
        midi::MidiEvent,
        output::{SimulatedAudioOutput, SimulatedVoiceOutput},
        patch::MemoryPatchStorage,
        utils::time::ManualClock,
        waveform::{Wavetable, WAVETABLE_SIZE},
        SoundPatch,
    };

    pub type TestScheduler = Scheduler<ManualClock, SimulatedVoiceOutput, SimulatedAudioOutput>;

    pub fn scheduler(clock: &ManualClock, storage: MemoryPatchStorage) -> TestScheduler {
        let engine = SynthEngine::new(
            EngineConfig::default(),
            SoundPatch::default(),
            SimulatedVoiceOutput::new(),
            SimulatedAudioOutput::new(),
            clock.now_ms(),
        );
        Scheduler::new(engine, clock.clone(), storage)
    }

    /// Records everything shown on the display.
    #[derive(Clone, Default)]
    pub struct RecordingDisplay {
        pub parameters: Rc<RefCell<Vec<(ParameterRef, String)>>>,
        pub wavetables: Rc<RefCell<usize>>,
    }

    impl Display for RecordingDisplay {
        fn show_wavetable(&mut self, _wavetable: &Wavetable) {
            *self.wavetables.borrow_mut() += 1;
        }

        fn show_parameter(&mut self, parameter: &ParameterRef, value: &str) {
            self.parameters
                .borrow_mut()
                .push((*parameter, value.to_string()));
        }
    }

    struct FixedSampler(Option<Vec<i16>>);

    impl WaveSampler for FixedSampler {
        fn sample(&mut self) -> Option<Vec<i16>> {
            self.0.clone()
        }
    }

    #[test]
    fn starts_in_editor_mode() {
        let clock = ManualClock::new(0);
        let mut scheduler = scheduler(&clock, MemoryPatchStorage::new());
        assert!(scheduler.is_editor_mode());
        assert!(scheduler.engine().audio_output().is_paused());
        scheduler.tick();
        assert!(scheduler.is_editor_mode());
        assert_eq!(clock.now_ms(), 0);
    }

    #[test]
    fn patches() {
        let clock = ManualClock::new(0);
        let mut storage = MemoryPatchStorage::new();
        let mut patch = SoundPatch::default();
        patch.sound.name = "PIANO".to_string();
        patch.sound.volume = 8;
        assert!(storage.save(1, 7, &patch.to_document()).is_ok());

        let display = RecordingDisplay::default();
        let mut scheduler = scheduler(&clock, storage).with_display(display.clone());
        assert!(scheduler.load_patch(1, 7));
        assert_eq!(scheduler.engine().patch().sound.name, "PIANO");
        assert_eq!(scheduler.engine().patch().sound.bank, 1);
        assert_eq!(scheduler.engine().patch().sound.sound, 7);
        assert!(scheduler.engine().audio_output().is_paused());
        assert_eq!(*display.wavetables.borrow(), 1);

        assert!(!scheduler.load_patch(2, 0));
        assert_eq!(scheduler.engine().patch().sound.name, "PIANO");

        assert!(scheduler.save_patch(3, 1));
        assert_eq!(scheduler.sound_name(3, 1).as_deref(), Some("PIANO"));
        assert_eq!(scheduler.engine().patch().sound.bank, 3);
        assert_eq!(scheduler.engine().patch().sound.sound, 1);
    }

    #[test]
    fn unavailable_storage() {
        let clock = ManualClock::new(0);
        let mut storage = MemoryPatchStorage::new();
        storage.set_available(false);
        let mut scheduler = scheduler(&clock, storage);
        assert!(!scheduler.save_patch(0, 1));
        assert_eq!(*scheduler.engine().patch(), SoundPatch::default());
        assert!(!scheduler.load_patch(0, 1));
        assert_eq!(*scheduler.engine().patch(), SoundPatch::default());
    }

    #[test]
    fn sampled_waves() -> Result<(), Box<Error>> {
        let clock = ManualClock::new(0);
        let mut scheduler = scheduler(&clock, MemoryPatchStorage::new());
        assert!(scheduler.capture_sampled_wave(0).is_err());

        let mut scheduler =
            scheduler.with_sampler(FixedSampler(Some(vec![1000; WAVETABLE_SIZE])));
        scheduler.capture_sampled_wave(1)?;
        assert!(scheduler.engine().sampled_waves().get(1).is_some());

        let mut scheduler = scheduler.with_sampler(FixedSampler(Some(vec![0; 10])));
        assert_eq!(
            scheduler.capture_sampled_wave(2),
            Err(Error::SampleError(10))
        );
        let mut scheduler = scheduler.with_sampler(FixedSampler(None));
        assert_eq!(
            scheduler.capture_sampled_wave(2),
            Err(Error::SampleError(0))
        );
        Ok(())
    }

    #[test]
    fn sequencer_queue() -> Result<(), Box<Error>> {
        let clock = ManualClock::new(0);
        let mut scheduler = scheduler(&clock, MemoryPatchStorage::new());
        scheduler.set_sequence([
            SequencerEvent::NoteOn {
                note: 60,
                velocity: 100,
            },
            SequencerEvent::Wait(2),
            SequencerEvent::NoteOff { note: 60 },
        ])?;
        assert_eq!(scheduler.sequence_len(), 3);

        scheduler.tick();
        assert!(!scheduler.is_editor_mode());
        assert_eq!(scheduler.engine().voices().len(), 1);
        // wait event, then two waiting steps
        for _ in 0..3 {
            scheduler.tick();
            assert_eq!(scheduler.engine().voices().len(), 1);
        }
        scheduler.tick();
        assert!(scheduler.engine().voices().is_empty());
        assert_eq!(scheduler.sequence_len(), 0);
        Ok(())
    }

    #[test]
    fn full_sequencer_queue() {
        let clock = ManualClock::new(0);
        let engine = SynthEngine::new(
            EngineConfig {
                sequencer_capacity: 2,
                ..EngineConfig::default()
            },
            SoundPatch::default(),
            SimulatedVoiceOutput::new(),
            SimulatedAudioOutput::new(),
            0,
        );
        let scheduler = Scheduler::new(engine, clock, MemoryPatchStorage::new());
        let event = SequencerEvent::NoteOff { note: 1 };
        assert!(scheduler.push_sequence(event).is_ok());
        assert!(scheduler.push_sequence(event).is_ok());
        assert!(matches!(
            scheduler.push_sequence(event),
            Err(Error::SendError(_))
        ));
    }

    #[test]
    fn program_change() {
        let clock = ManualClock::new(0);
        let mut storage = MemoryPatchStorage::new();
        let mut patch = SoundPatch::default();
        patch.sound.unison = 2;
        assert!(storage.save(0, 5, &patch.to_document()).is_ok());

        let (sender, receiver) = crossbeam_channel::unbounded::<MidiEvent>();
        let mut scheduler = scheduler(&clock, storage).with_midi_input(receiver);
        assert!(scheduler
            .push_sequence(SequencerEvent::ProgramChange { bank: 0, sound: 5 })
            .is_ok());
        scheduler.tick();
        assert_eq!(scheduler.engine().patch().sound.unison, 2);

        assert!(sender
            .send(MidiEvent::NoteOn {
                note: 60,
                velocity: 90
            })
            .is_ok());
        scheduler.tick();
        assert_eq!(scheduler.engine().voices().len(), 2);
    }
}
