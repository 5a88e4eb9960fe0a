//! The synthesizer engine: voices, filters, wavetables and sound LFOs of the current patch.

use crate::{
    algorithm::WavetableSet,
    envelope::{EnvelopePhase, PhaseThresholds},
    filter::FilterBank,
    midi::MidiEvent,
    modulation::{SoundModulation, MODULATION_WHEEL},
    output::{AudioOutput, EchoSettings, NoteSpec, VoiceOutput},
    patch::{EditClass, Increment, ParameterRef, PatchDocument, PatchValue, SoundPatch},
    pitch::PitchState,
    utils::{
        midi_to_hz,
        time::{elapsed_secs, Millis},
    },
    voice::{Voice, VoiceAllocator, VoiceKey},
    waveform::{SampledWaves, Wavetable, SAMPLED_WAVE_SLOTS, WAVETABLE_SIZE},
    Error,
};

// -------------------------------------------------------------------------------------------------

/// Static engine and scheduler settings.
#[derive(Debug, Clone, PartialEq)]
pub struct EngineConfig {
    /// Sample rate of the audio output in Hz.
    pub sample_rate: u32,
    /// Maximum number of simultaneously sounding voices, including unison voices.
    pub max_voices: usize,
    /// Time window in which unknown MIDI events are skipped in favour of real ones.
    pub midi_grace_ms: Millis,
    /// Idle time after a parameter edit before the sound gets set up again.
    pub parameter_debounce_ms: Millis,
    /// Idle time after an oscillator edit before the wavetables get regenerated.
    pub oscillator_debounce_ms: Millis,
    /// Scheduler sleep time per tick.
    pub yield_ms: Millis,
    /// Minimum time between two editor task steps in play mode. The editor task runs on every
    /// tick in editor mode.
    pub play_editor_interval_ms: Millis,
    /// Maximum number of MIDI events a single tick applies.
    pub midi_events_per_tick: usize,
    /// Capacity of the test sequencer's event queue.
    pub sequencer_capacity: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            sample_rate: 22050,
            max_voices: 12,
            midi_grace_ms: 50,
            parameter_debounce_ms: 2000,
            oscillator_debounce_ms: 4000,
            yield_ms: 0,
            play_editor_interval_ms: 10,
            midi_events_per_tick: 16,
            sequencer_capacity: 256,
        }
    }
}

// -------------------------------------------------------------------------------------------------

/// Owns all synthesizer state of the current patch and drives a [`VoiceOutput`] and
/// [`AudioOutput`] with it.
///
/// The engine is not time aware on its own: all calls which depend on time get the current
/// time passed, and [`update`](Self::update) must be called periodically to advance
/// portamento glides, filter envelopes and the envelope phase wavetable swaps.
pub struct SynthEngine<V: VoiceOutput, A: AudioOutput> {
    config: EngineConfig,
    patch: SoundPatch,
    voices: VoiceAllocator,
    filters: FilterBank,
    modulation: SoundModulation,
    wavetables: WavetableSet,
    sampled_waves: SampledWaves,
    regenerate_pending: bool,
    last_frequency: Option<f32>,
    pitch_bend: Option<u16>,
    last_update: Millis,
    voice_output: V,
    audio_output: A,
}

impl<V: VoiceOutput, A: AudioOutput> SynthEngine<V, A> {
    /// Create a new engine with the given patch and set it up.
    pub fn new(
        config: EngineConfig,
        patch: SoundPatch,
        voice_output: V,
        audio_output: A,
        now: Millis,
    ) -> Self {
        let voices = VoiceAllocator::new(config.max_voices);
        let filters = FilterBank::new(config.max_voices);
        let mut engine = Self {
            config,
            patch,
            voices,
            filters,
            modulation: SoundModulation::new(),
            wavetables: WavetableSet::default(),
            sampled_waves: SampledWaves::new(),
            regenerate_pending: true,
            last_frequency: None,
            pitch_bend: None,
            last_update: now,
            voice_output,
            audio_output,
        };
        engine.setup_synthesizer(true, now);
        engine
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn patch(&self) -> &SoundPatch {
        &self.patch
    }

    pub fn voices(&self) -> &VoiceAllocator {
        &self.voices
    }

    pub fn filters(&self) -> &FilterBank {
        &self.filters
    }

    pub fn modulation(&self) -> &SoundModulation {
        &self.modulation
    }

    pub fn voice_output(&self) -> &V {
        &self.voice_output
    }

    pub fn voice_output_mut(&mut self) -> &mut V {
        &mut self.voice_output
    }

    pub fn audio_output(&self) -> &A {
        &self.audio_output
    }

    pub fn audio_output_mut(&mut self) -> &mut A {
        &mut self.audio_output
    }

    /// The wavetable of the given envelope phase.
    pub fn wavetable(&self, phase: EnvelopePhase) -> &Wavetable {
        self.wavetables.get(phase)
    }

    /// True when oscillator edits have not been rendered into the wavetables yet.
    pub fn is_regenerate_pending(&self) -> bool {
        self.regenerate_pending
    }

    // ---------------------------------------------------------------------------------------------

    /// Start playing a note. A velocity of 0 releases the note instead. With unison enabled
    /// a second, detuned voice gets started along.
    pub fn note_on(&mut self, note: u8, velocity: u8, now: Millis) -> Result<(), Error> {
        if velocity == 0 {
            self.note_off(note, now);
            return Ok(());
        }
        if self.regenerate_pending {
            self.regenerate_wavetables();
        }
        self.start_voice(VoiceKey::new(note, false), 0.0, velocity, now)?;
        if self.patch.sound.unison > 0 {
            let offset = self.patch.sound.unison as f32;
            self.start_voice(VoiceKey::new(note, true), offset, velocity, now)?;
        }
        self.last_frequency = Some(midi_to_hz(note as f32));
        Ok(())
    }

    /// Release a note and its unison voice.
    pub fn note_off(&mut self, note: u8, now: Millis) {
        for unison in [false, true] {
            if let Some(voice) = self.voices.remove(VoiceKey::new(note, unison)) {
                self.stop_voice(&voice, now);
            }
        }
    }

    /// Release all voices and return all filter slots.
    pub fn all_notes_off(&mut self, now: Millis) {
        for voice in self.voices.drain() {
            self.stop_voice(&voice, now);
        }
        self.voice_output.release_all(now);
        self.filters.release_all();
        log::debug!("All notes off");
    }

    /// Apply a MIDI event.
    pub fn process(&mut self, event: MidiEvent, now: Millis) -> Result<(), Error> {
        match event {
            MidiEvent::NoteOn { note, velocity } => self.note_on(note, velocity, now)?,
            MidiEvent::NoteOff { note } => self.note_off(note, now),
            MidiEvent::ControlChange { controller, value } => {
                if controller == MODULATION_WHEEL {
                    self.modulation_wheel(value, now);
                }
            }
            MidiEvent::PitchBend { value } => self.pitch_bend(value),
            MidiEvent::Unknown => {}
        }
        Ok(())
    }

    /// Advance glides, filters and envelope phases of all voices to the given time.
    pub fn update(&mut self, now: Millis) {
        let seconds = elapsed_secs(self.last_update, now);
        self.last_update = now;
        let portamento = self.patch.sound.portamento;
        self.filters.update(&self.patch.filter, now);
        for voice in self.voices.voices_mut() {
            let key = voice.key();
            if voice.pitch_mut().advance(seconds, portamento) {
                self.voice_output
                    .set_frequency(key, voice.pitch().frequency());
            }
            if let Some(slot) = voice.filter_slot() {
                let spec = self.filters.slot(slot).and_then(|s| s.spec());
                self.voice_output.set_filter(key, spec);
            }
            if let Some((stage, level)) = self.voice_output.envelope_state(key, now) {
                if let Some(phase) = voice.phase_tracker_mut().update(stage, level) {
                    self.voice_output
                        .set_waveform(key, self.wavetables.get(phase));
                }
            }
        }
    }

    // ---------------------------------------------------------------------------------------------

    /// Apply the current patch to the outputs: volume, echo, LFOs, filters and, when requested
    /// or pending, freshly generated wavetables. Audio is paused while setting up.
    pub fn setup_synthesizer(&mut self, regenerate: bool, now: Millis) {
        let was_paused = self.audio_output.is_paused();
        self.audio_output.pause();

        self.audio_output
            .set_volume(self.patch.sound.volume as f32 / 10.0);
        let effector = &self.patch.effector;
        self.audio_output.set_echo(EchoSettings {
            delay_ms: effector.echo_delay_ms,
            decay: effector.echo_decay,
            mix: effector.echo_mix,
        });

        self.modulation
            .rebuild(&self.patch.sound.tremolo, &self.patch.sound.vibrato);
        if regenerate || self.regenerate_pending {
            self.regenerate_wavetables();
        }
        self.filters.rebuild(&self.patch.filter, now);
        self.filters.update(&self.patch.filter, now);

        for voice in self.voices.voices_mut() {
            let key = voice.key();
            self.voice_output
                .set_amplitude_lfo(key, self.modulation.tremolo());
            self.voice_output.set_bend_lfo(key, self.modulation.vibrato());
            self.voice_output
                .set_waveform(key, self.wavetables.get(voice.phase()));
            if let Some(slot) = voice.filter_slot() {
                let spec = self.filters.slot(slot).and_then(|s| s.spec());
                self.voice_output.set_filter(key, spec);
            }
        }

        if !was_paused {
            self.audio_output.resume();
        }
        log::debug!(
            "Set up sound '{}' (regenerate: {})",
            self.patch.sound.name.trim_end(),
            regenerate
        );
    }

    /// Replace the current patch with one from a document and set it up.
    pub fn apply_document(&mut self, document: &PatchDocument, now: Millis) -> Result<(), Error> {
        self.patch = SoundPatch::try_from_document(document)?;
        self.setup_synthesizer(true, now);
        log::info!(
            "Loaded sound {:03} '{}' of bank {}",
            self.patch.sound.sound,
            self.patch.sound.name.trim_end(),
            self.patch.sound.bank
        );
        Ok(())
    }

    /// Serialize the current patch.
    pub fn to_document(&self) -> PatchDocument {
        self.patch.to_document()
    }

    // ---------------------------------------------------------------------------------------------

    /// Set a patch value. Changes take effect with the next [`setup_synthesizer`] call, so
    /// edits can be collected before doing the costly setup.
    ///
    /// [`setup_synthesizer`]: Self::setup_synthesizer
    pub fn set_parameter(&mut self, parameter: ParameterRef, value: PatchValue) -> Result<(), Error> {
        self.patch.set_value(parameter, value)?;
        self.mark_edited(parameter);
        Ok(())
    }

    /// Increment a patch value, wrapping around at the parameter's bounds, and return the
    /// new value. Like [`set_parameter`](Self::set_parameter), this only marks the change.
    pub fn increment_parameter(
        &mut self,
        parameter: ParameterRef,
        increment: Increment,
    ) -> Result<PatchValue, Error> {
        let value = self.patch.increment_value(parameter, increment)?;
        self.mark_edited(parameter);
        Ok(value)
    }

    /// Display string of a patch value.
    pub fn formatted_parameter(&self, parameter: ParameterRef) -> Option<String> {
        self.patch.formatted_value(parameter)
    }

    /// Replace one of the sampled waves. Waves must have exactly [`WAVETABLE_SIZE`] samples.
    pub fn set_sampled_wave(&mut self, slot: usize, samples: Vec<i16>) -> Result<(), Error> {
        if samples.len() != WAVETABLE_SIZE {
            return Err(Error::SampleError(samples.len()));
        }
        if slot >= SAMPLED_WAVE_SLOTS {
            return Err(Error::ParameterError(format!(
                "Invalid sampled wave slot {slot}"
            )));
        }
        self.sampled_waves.set(slot, samples);
        self.regenerate_pending = true;
        Ok(())
    }

    pub fn sampled_waves(&self) -> &SampledWaves {
        &self.sampled_waves
    }

    // ---------------------------------------------------------------------------------------------

    fn mark_edited(&mut self, parameter: ParameterRef) {
        if parameter.edit_class() == EditClass::Oscillator {
            self.regenerate_pending = true;
        }
    }

    fn regenerate_wavetables(&mut self) {
        self.wavetables = WavetableSet::generate(
            &self.patch.oscillators,
            self.patch.sound.adjust_level,
            &self.sampled_waves,
        );
        self.regenerate_pending = false;
        log::debug!("Regenerated wavetables");
    }

    fn start_voice(
        &mut self,
        key: VoiceKey,
        offset: f32,
        velocity: u8,
        now: Millis,
    ) -> Result<(), Error> {
        if let Some(voice) = self.voices.make_room(key) {
            self.stop_voice(&voice, now);
        }
        let note = key.note();
        let (attack_level, sustain_level) = self.patch.vca.levels(velocity, note);
        let envelope = self.patch.vca.envelope(attack_level, sustain_level)?;

        let filter_slot = self
            .filters
            .acquire(&self.patch.filter, velocity, note, now);
        let filter = filter_slot
            .and_then(|slot| self.filters.slot(slot))
            .and_then(|s| s.spec());

        let sound = &self.patch.sound;
        let mut pitch = PitchState::for_note(
            note,
            offset,
            self.last_frequency.map(|frequency| frequency + offset),
            sound.pitch_bend,
            sound.portamento,
        );
        if let Some(bend) = self.pitch_bend {
            pitch.set_bend(bend);
        }

        let spec = NoteSpec {
            frequency: pitch.frequency(),
            envelope,
            waveform: self.wavetables.get(EnvelopePhase::AttackStart),
            filter,
            amplitude_lfo: self.modulation.tremolo(),
            bend_lfo: self.modulation.vibrato(),
        };
        self.voice_output.press(key, &spec, now);
        log::debug!("Note on {key} (velocity {velocity}, filter slot {filter_slot:?})");

        let thresholds = PhaseThresholds::new(attack_level, sustain_level);
        self.voices
            .insert(Voice::new(key, velocity, filter_slot, pitch, thresholds));
        Ok(())
    }

    fn stop_voice(&mut self, voice: &Voice, now: Millis) {
        self.voice_output.release(voice.key(), now);
        if let Some(slot) = voice.filter_slot() {
            self.filters.release(slot);
        }
    }

    fn modulation_wheel(&mut self, value: u8, now: Millis) {
        self.filters.set_modulation_value(value);
        let sound = &self.patch.sound;
        let change = self
            .modulation
            .control_change(value, &sound.tremolo, &sound.vibrato);
        if change.any() {
            for key in self.voices.keys() {
                if change.tremolo {
                    self.voice_output
                        .set_amplitude_lfo(key, self.modulation.tremolo());
                }
                if change.vibrato {
                    self.voice_output.set_bend_lfo(key, self.modulation.vibrato());
                }
            }
        }
        self.filters.update(&self.patch.filter, now);
    }

    fn pitch_bend(&mut self, value: u16) {
        self.pitch_bend = Some(value);
        for voice in self.voices.voices_mut() {
            voice.pitch_mut().set_bend(value);
            self.voice_output
                .set_frequency(voice.key(), voice.pitch().frequency());
        }
    }
}

// -------------------------------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        algorithm::AlgorithmId,
        filter::{FilterKind, FilterSlotState},
        operator::OperatorParams,
        modulation::ModulationMode,
        output::{SimulatedAudioOutput, SimulatedVoiceOutput},
        patch::{SoundField, VcaField},
        utils::ahdsr::EnvelopeStage,
    };

    type TestEngine = SynthEngine<SimulatedVoiceOutput, SimulatedAudioOutput>;

    fn engine(patch: SoundPatch) -> TestEngine {
        SynthEngine::new(
            EngineConfig::default(),
            patch,
            SimulatedVoiceOutput::new(),
            SimulatedAudioOutput::new(),
            0,
        )
    }

    #[test]
    fn setup() {
        let mut patch = SoundPatch::default();
        patch.sound.volume = 7;
        patch.effector.echo_mix = 0.25;
        let engine = engine(patch);
        assert!(!engine.is_regenerate_pending());
        assert!(!engine.audio_output().is_paused());
        assert!((engine.audio_output().volume() - 0.7).abs() < 1e-6);
        assert_eq!(engine.audio_output().echo().mix, 0.25);
        assert_eq!(engine.audio_output().pause_count(), 1);
        assert!(engine.wavetable(EnvelopePhase::Sustain).peak() > 0);
    }

    #[test]
    fn notes() -> Result<(), Box<Error>> {
        let mut engine = engine(SoundPatch::default());
        engine.note_on(60, 100, 0)?;
        engine.note_on(64, 100, 0)?;
        assert_eq!(engine.voices().len(), 2);
        assert_eq!(engine.filters().active_count(), 2);
        assert_eq!(engine.voice_output().len(), 2);

        engine.process(MidiEvent::NoteOn { note: 60, velocity: 0 }, 10)?;
        assert_eq!(engine.voices().len(), 1);
        assert_eq!(engine.filters().active_count(), 1);
        assert_eq!(
            engine
                .voice_output()
                .voice(VoiceKey::new(60, false))
                .map(|v| v.stage()),
            Some(EnvelopeStage::Release)
        );

        engine.all_notes_off(20);
        assert!(engine.voices().is_empty());
        assert_eq!(engine.filters().active_count(), 0);
        Ok(())
    }

    #[test]
    fn voice_stealing() -> Result<(), Box<Error>> {
        let mut engine = engine(SoundPatch::default());
        for note in 0..12 {
            engine.note_on(40 + note, 100, note as Millis)?;
        }
        let oldest = VoiceKey::new(40, false);
        let oldest_slot = engine.voices().get(oldest).and_then(|v| v.filter_slot());
        assert_eq!(oldest_slot, Some(0));
        engine.update(20);
        assert_eq!(
            engine.filters().slot(0).map(|s| s.state()),
            Some(FilterSlotState::Running)
        );
        assert_eq!(engine.filters().active_count(), 12);

        // the 13th note steals the oldest voice and reuses its filter slot
        engine.note_on(52, 100, 30)?;
        let newest = VoiceKey::new(52, false);
        assert_eq!(engine.voices().len(), 12);
        assert!(!engine.voices().contains(oldest));
        assert_eq!(
            engine.voice_output().voice(oldest).map(|v| v.stage()),
            Some(EnvelopeStage::Release)
        );
        assert_eq!(
            engine.voices().get(newest).and_then(|v| v.filter_slot()),
            oldest_slot
        );
        assert_eq!(
            engine.filters().slot(0).map(|s| s.state()),
            Some(FilterSlotState::Triggered)
        );
        assert_eq!(engine.filters().active_count(), 12);

        engine.note_off(52, 40);
        assert_eq!(engine.filters().slot(0).map(|s| s.is_idle()), Some(true));
        assert_eq!(engine.filters().active_count(), 11);
        Ok(())
    }

    #[test]
    fn unison_voices() -> Result<(), Box<Error>> {
        let mut patch = SoundPatch::default();
        patch.sound.unison = 3;
        let mut engine = engine(patch);
        engine.note_on(69, 127, 0)?;
        let plain = engine.voices().get(VoiceKey::new(69, false));
        let unison = engine.voices().get(VoiceKey::new(69, true));
        assert_eq!(plain.map(|v| v.pitch().frequency()), Some(440.0));
        assert_eq!(unison.map(|v| v.pitch().frequency()), Some(443.0));
        engine.note_off(69, 10);
        assert!(engine.voices().is_empty());
        Ok(())
    }

    #[test]
    fn envelope_phase_wavetables() -> Result<(), Box<Error>> {
        let mut engine = engine(SoundPatch::default());
        let key = VoiceKey::new(60, false);
        engine.note_on(60, 127, 0)?;
        engine.update(50);
        assert_eq!(
            engine.voices().get(key).map(|v| v.phase()),
            Some(EnvelopePhase::AttackStart)
        );
        engine.update(100);
        assert_eq!(
            engine.voices().get(key).map(|v| v.phase()),
            Some(EnvelopePhase::AttackMiddle)
        );
        engine.update(1000);
        let phase = engine.voices().get(key).map(|v| v.phase());
        assert_eq!(phase, Some(EnvelopePhase::Sustain));
        let sustain = engine.wavetable(EnvelopePhase::Sustain).clone();
        assert_eq!(
            engine.voice_output().voice(key).map(|v| v.waveform()),
            Some(&sustain)
        );
        Ok(())
    }

    #[test]
    fn velocity_scaled_attack_phases() -> Result<(), Box<Error>> {
        let patch = SoundPatch::default();
        let bank = &patch.oscillators;
        assert_eq!(bank.algorithm, AlgorithmId::Chain2);
        assert_eq!(bank.operators[0], OperatorParams::new(2, 10, 1));
        assert_eq!(bank.operators[1], OperatorParams::new(1, 255, 0));
        let mut engine = engine(patch);
        let key = VoiceKey::new(60, false);
        let attack_start = engine.wavetable(EnvelopePhase::AttackStart).clone();
        let attack_middle = engine.wavetable(EnvelopePhase::AttackMiddle).clone();

        // velocity 100: attack level 100/127, thresholds at 0.2625 and 0.525
        engine.note_on(60, 100, 0)?;
        engine.update(50);
        // 50 of 200 ms attack: level 0.197
        assert_eq!(
            engine.voices().get(key).map(|v| v.phase()),
            Some(EnvelopePhase::AttackStart)
        );
        assert_eq!(
            engine.voice_output().voice(key).map(|v| v.waveform()),
            Some(&attack_start)
        );

        // 80 ms: level 0.315
        engine.update(80);
        assert_eq!(
            engine.voices().get(key).map(|v| v.phase()),
            Some(EnvelopePhase::AttackMiddle)
        );
        assert_eq!(
            engine.voice_output().voice(key).map(|v| v.waveform()),
            Some(&attack_middle)
        );

        // 150 ms: level 0.591
        engine.update(150);
        assert_eq!(
            engine.voices().get(key).map(|v| v.phase()),
            Some(EnvelopePhase::AttackEnd)
        );

        // the same patch always renders the same tables
        let regenerated = WavetableSet::generate(
            &engine.patch().oscillators,
            engine.patch().sound.adjust_level,
            engine.sampled_waves(),
        );
        assert_eq!(regenerated.get(EnvelopePhase::AttackStart), &attack_start);
        Ok(())
    }

    #[test]
    fn portamento_and_bend() -> Result<(), Box<Error>> {
        let mut patch = SoundPatch::default();
        patch.sound.portamento = 1.0;
        let mut engine = engine(patch);
        engine.note_on(57, 127, 0)?;
        engine.note_on(69, 127, 0)?;
        let key = VoiceKey::new(69, false);
        let frequency = |engine: &TestEngine| engine.voice_output().voice(key).map(|v| v.frequency());
        assert_eq!(frequency(&engine), Some(220.0));
        engine.update(500);
        assert_eq!(frequency(&engine), Some(330.0));
        engine.update(1500);
        assert_eq!(frequency(&engine), Some(440.0));

        engine.process(MidiEvent::PitchBend { value: 16584 }, 1500)?;
        let bent = frequency(&engine).unwrap_or_default();
        assert!((bent - midi_to_hz(71.0)).abs() < 1e-2);
        Ok(())
    }

    #[test]
    fn modulation_wheel() -> Result<(), Box<Error>> {
        let mut patch = SoundPatch::default();
        patch.sound.tremolo.mode = ModulationMode::ModWheel;
        let mut engine = engine(patch);
        let key = VoiceKey::new(60, false);
        engine.note_on(60, 100, 0)?;
        assert_eq!(engine.voice_output().voice(key).and_then(|v| v.amplitude_lfo()), None);

        let wheel = MidiEvent::ControlChange {
            controller: MODULATION_WHEEL,
            value: 127,
        };
        engine.process(wheel, 10)?;
        let scale = engine
            .voice_output()
            .voice(key)
            .and_then(|v| v.amplitude_lfo())
            .map(|lfo| lfo.scale())
            .unwrap_or_default();
        assert!((scale - engine.patch().sound.tremolo.scale).abs() < 1e-5);
        assert_eq!(engine.voice_output().voice(key).and_then(|v| v.bend_lfo()), None);
        Ok(())
    }

    #[test]
    fn edits() -> Result<(), Box<Error>> {
        let mut engine = engine(SoundPatch::default());
        engine.increment_parameter(ParameterRef::Algorithm, Increment::Step(1))?;
        assert!(engine.is_regenerate_pending());
        engine.note_on(60, 100, 0)?;
        assert!(!engine.is_regenerate_pending());

        engine.set_parameter(ParameterRef::Sound(SoundField::Volume), PatchValue::Int(9))?;
        assert!(!engine.is_regenerate_pending());
        assert!((engine.audio_output().volume() - 0.5).abs() < 1e-6);
        engine.setup_synthesizer(false, 10);
        assert!((engine.audio_output().volume() - 0.9).abs() < 1e-6);

        assert_eq!(
            engine.formatted_parameter(ParameterRef::Vca(VcaField::Release)),
            Some("0.20".to_string())
        );
        Ok(())
    }

    #[test]
    fn documents_and_samples() -> Result<(), Box<Error>> {
        let mut patch = SoundPatch::default();
        patch.filter.kind = FilterKind::LowPass;
        let mut engine = engine(SoundPatch::default());
        engine.apply_document(&patch.to_document(), 0)?;
        assert_eq!(engine.patch().filter.kind, FilterKind::LowPass);
        assert!(engine
            .apply_document(&PatchDocument::new(), 0)
            .is_err());
        assert_eq!(engine.to_document(), patch.to_document());

        assert_eq!(
            engine.set_sampled_wave(0, vec![0; 100]),
            Err(Error::SampleError(100))
        );
        engine.set_sampled_wave(0, vec![0; WAVETABLE_SIZE])?;
        assert!(engine.is_regenerate_pending());
        assert!(engine.sampled_waves().get(0).is_some());
        Ok(())
    }
}
