use crate::{
    midi::{MidiEvent, SequencerEvent},
    output::{AudioOutput, VoiceOutput},
    utils::time::{Clock, Millis},
};

use super::Scheduler;

// -------------------------------------------------------------------------------------------------

/// Bookkeeping of the MIDI task.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) struct MidiTaskState {
    /// Time of the last note, control or bend event.
    last_event: Millis,
    /// Remaining MIDI task steps until the sequencer plays its next event.
    wait_count: u32,
}

impl MidiTaskState {
    pub fn new(now: Millis) -> Self {
        Self {
            last_event: now,
            wait_count: 0,
        }
    }

    pub fn reset_wait(&mut self) {
        self.wait_count = 0;
    }
}

// -------------------------------------------------------------------------------------------------

impl<C: Clock, V: VoiceOutput, A: AudioOutput> Scheduler<C, V, A> {
    /// One step of the MIDI task: apply all pending MIDI events up to the configured batch
    /// size, advance all voices, then play the next sequencer event.
    pub(super) fn midi_task(&mut self) {
        for _ in 0..self.engine.config().midi_events_per_tick.max(1) {
            let Some(event) = self.receive_midi_event() else {
                break;
            };
            let now = self.clock.now_ms();
            self.handle_midi_event(event, now);
        }
        let now = self.clock.now_ms();
        self.engine.update(now);
        self.sequencer_step(now);
    }

    /// Fetch the next relevant MIDI event. Unknown events (e.g. active sensing) get skipped for
    /// a short grace window, so a flood of them can't starve real events.
    fn receive_midi_event(&mut self) -> Option<MidiEvent> {
        let start = self.clock.now_ms();
        loop {
            let event = match self.midi_input.as_mut().map(|input| input.poll()) {
                Some(Ok(event)) => event,
                Some(Err(err)) => {
                    log::warn!("Failed to read MIDI input: {err}");
                    None
                }
                None => None,
            };
            let now = self.clock.now_ms();
            self.check_midi_idle(now);
            match event {
                Some(MidiEvent::Unknown) => {
                    if now.saturating_sub(start) < self.engine.config().midi_grace_ms {
                        continue;
                    }
                    return None;
                }
                Some(event) => return Some(event),
                None => return None,
            }
        }
    }

    /// Return to editor mode when no MIDI events arrived for the sound's pause time.
    fn check_midi_idle(&mut self, now: Millis) {
        let timeout = self.engine.patch().effector.pause_secs as Millis * 1000;
        if !self.editor_mode && now.saturating_sub(self.midi_state.last_event) > timeout {
            log::info!("No MIDI events for {} seconds", timeout / 1000);
            self.enter_editor_mode();
        }
    }

    fn handle_midi_event(&mut self, event: MidiEvent, now: Millis) {
        if matches!(event, MidiEvent::Unknown) {
            return;
        }
        self.midi_state.last_event = now;
        if matches!(event, MidiEvent::NoteOn { .. } | MidiEvent::NoteOff { .. }) {
            self.enter_play_mode(now);
        }
        if let Err(err) = self.engine.process(event, now) {
            log::warn!("Failed to process MIDI event {event:?}: {err}");
        }
    }

    fn sequencer_step(&mut self, now: Millis) {
        if self.midi_state.wait_count > 0 {
            self.midi_state.wait_count -= 1;
            return;
        }
        match self.sequencer.pop() {
            Some(SequencerEvent::Wait(count)) => self.midi_state.wait_count = count,
            Some(SequencerEvent::NoteOn { note, velocity }) => {
                self.handle_midi_event(MidiEvent::NoteOn { note, velocity }, now)
            }
            Some(SequencerEvent::NoteOff { note }) => {
                self.handle_midi_event(MidiEvent::NoteOff { note }, now)
            }
            Some(SequencerEvent::ProgramChange { bank, sound }) => {
                self.load_patch(bank, sound);
            }
            None => {}
        }
    }
}

// -------------------------------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use crate::{
        engine::{EngineConfig, SynthEngine},
        midi::MidiEvent,
        output::{AudioOutput, SimulatedAudioOutput, SimulatedVoiceOutput},
        patch::{MemoryPatchStorage, SoundPatch},
        scheduler::{tests::scheduler, Scheduler},
        utils::time::{Clock, ManualClock},
        voice::VoiceKey,
    };

    #[test]
    fn notes_leave_editor_mode() {
        let clock = ManualClock::new(0);
        let (sender, receiver) = crossbeam_channel::unbounded::<MidiEvent>();
        let mut scheduler = scheduler(&clock, MemoryPatchStorage::new()).with_midi_input(receiver);

        assert!(sender
            .send(MidiEvent::ControlChange {
                controller: 7,
                value: 1
            })
            .is_ok());
        scheduler.tick();
        assert!(scheduler.is_editor_mode());

        assert!(sender
            .send(MidiEvent::NoteOn {
                note: 64,
                velocity: 80
            })
            .is_ok());
        scheduler.tick();
        assert!(!scheduler.is_editor_mode());
        assert!(!scheduler.engine().audio_output().is_paused());
        assert!(scheduler.engine().voices().contains(VoiceKey::new(64, false)));
        assert_eq!(clock.now_ms(), 0);
    }

    #[test]
    fn pending_events_apply_in_one_tick() {
        let clock = ManualClock::new(0);
        let (sender, receiver) = crossbeam_channel::unbounded::<MidiEvent>();
        let mut scheduler = scheduler(&clock, MemoryPatchStorage::new()).with_midi_input(receiver);
        for note in 60..65 {
            assert!(sender
                .send(MidiEvent::NoteOn {
                    note,
                    velocity: 100
                })
                .is_ok());
        }
        scheduler.tick();
        assert!(!scheduler.is_editor_mode());
        assert_eq!(scheduler.engine().voices().len(), 5);
        assert!(sender.is_empty());
        assert_eq!(clock.now_ms(), 0);
    }

    #[test]
    fn batch_size_limits_events_per_tick() {
        let clock = ManualClock::new(0);
        let engine = SynthEngine::new(
            EngineConfig {
                midi_events_per_tick: 2,
                ..EngineConfig::default()
            },
            SoundPatch::default(),
            SimulatedVoiceOutput::new(),
            SimulatedAudioOutput::new(),
            0,
        );
        let (sender, receiver) = crossbeam_channel::unbounded::<MidiEvent>();
        let mut scheduler = Scheduler::new(engine, clock.clone(), MemoryPatchStorage::new())
            .with_midi_input(receiver);
        for note in 60..65 {
            assert!(sender
                .send(MidiEvent::NoteOn {
                    note,
                    velocity: 100
                })
                .is_ok());
        }
        scheduler.tick();
        assert_eq!(scheduler.engine().voices().len(), 2);
        scheduler.tick();
        scheduler.tick();
        assert_eq!(scheduler.engine().voices().len(), 5);
    }

    #[test]
    fn idle_timeout() {
        let clock = ManualClock::new(0);
        let (sender, receiver) = crossbeam_channel::unbounded::<MidiEvent>();
        let mut scheduler = scheduler(&clock, MemoryPatchStorage::new()).with_midi_input(receiver);
        assert!(sender.send(MidiEvent::NoteOff { note: 60 }).is_ok());
        scheduler.tick();
        assert!(!scheduler.is_editor_mode());

        // default pause time is 5 seconds
        clock.advance(5000);
        scheduler.tick();
        assert!(!scheduler.is_editor_mode());
        clock.advance(1);
        scheduler.tick();
        assert!(scheduler.is_editor_mode());
        assert!(scheduler.engine().audio_output().is_paused());
    }

    #[test]
    fn unknown_events_are_skipped() {
        let clock = ManualClock::new(0);
        let (sender, receiver) = crossbeam_channel::unbounded::<MidiEvent>();
        let mut scheduler = scheduler(&clock, MemoryPatchStorage::new()).with_midi_input(receiver);
        for _ in 0..3 {
            assert!(sender.send(MidiEvent::Unknown).is_ok());
        }
        assert!(sender
            .send(MidiEvent::NoteOn {
                note: 60,
                velocity: 100
            })
            .is_ok());
        scheduler.tick();
        assert_eq!(scheduler.engine().voices().len(), 1);
        assert!(sender.is_empty());
    }
}
