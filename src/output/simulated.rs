use std::{collections::HashMap, f32::consts::PI, time::Duration};

use crate::{
    filter::{FilterResponse, FilterSpec},
    utils::{
        ahdsr::{AdsrEnvelope, AdsrParameters, EnvelopeStage},
        lfo::Lfo,
        time::{elapsed_secs, Millis},
    },
    voice::VoiceKey,
    waveform::{Wavetable, SAMPLE_VOLUME, WAVETABLE_SIZE},
};

use super::{AudioOutput, EchoSettings, NoteSpec, VoiceOutput};

// -------------------------------------------------------------------------------------------------

/// [`AudioOutput`] which only remembers its state, for tests and offline rendering.
#[derive(Debug, Clone)]
pub struct SimulatedAudioOutput {
    paused: bool,
    volume: f32,
    echo: EchoSettings,
    pause_count: usize,
}

impl SimulatedAudioOutput {
    pub fn new() -> Self {
        Self {
            paused: false,
            volume: 1.0,
            echo: EchoSettings::default(),
            pause_count: 0,
        }
    }

    pub fn echo(&self) -> EchoSettings {
        self.echo
    }

    /// How often the output got paused so far.
    pub fn pause_count(&self) -> usize {
        self.pause_count
    }
}

impl Default for SimulatedAudioOutput {
    fn default() -> Self {
        Self::new()
    }
}

impl AudioOutput for SimulatedAudioOutput {
    fn is_paused(&self) -> bool {
        self.paused
    }

    fn pause(&mut self) {
        if !self.paused {
            self.paused = true;
            self.pause_count += 1;
        }
    }

    fn resume(&mut self) {
        self.paused = false;
    }

    fn volume(&self) -> f32 {
        self.volume
    }

    fn set_volume(&mut self, volume: f32) {
        self.volume = volume.clamp(0.0, 1.0);
    }

    fn set_echo(&mut self, echo: EchoSettings) {
        self.echo = echo;
    }
}

// -------------------------------------------------------------------------------------------------

/// State of a note in a [`SimulatedVoiceOutput`].
#[derive(Debug, Clone)]
pub struct SimulatedVoice {
    envelope: AdsrEnvelope,
    parameters: AdsrParameters,
    frequency: f32,
    waveform: Wavetable,
    filter: Option<FilterSpec>,
    amplitude_lfo: Option<Lfo>,
    bend_lfo: Option<Lfo>,
    pressed: Millis,
    updated: Millis,
    phase: f32,
    lowpass: f32,
}

impl SimulatedVoice {
    pub fn frequency(&self) -> f32 {
        self.frequency
    }

    pub fn waveform(&self) -> &Wavetable {
        &self.waveform
    }

    pub fn filter(&self) -> Option<FilterSpec> {
        self.filter
    }

    pub fn amplitude_lfo(&self) -> Option<Lfo> {
        self.amplitude_lfo
    }

    pub fn bend_lfo(&self) -> Option<Lfo> {
        self.bend_lfo
    }

    pub fn stage(&self) -> EnvelopeStage {
        self.envelope.stage()
    }

    fn advance_to(&mut self, now: Millis) {
        if now > self.updated {
            let elapsed = Duration::from_millis(now - self.updated);
            self.envelope.advance(&self.parameters, elapsed);
            self.updated = now;
        }
    }
}

// -------------------------------------------------------------------------------------------------

/// [`VoiceOutput`] which runs the crate's own [`AdsrEnvelope`] per note, driven by the
/// engine's time stamps, and which can render the notes into a mono sample buffer.
///
/// Rendering is a plain wavetable oscillator with a one pole low-pass approximation of the
/// note filters. It's meant for previews and tests, not as a hardware replacement.
#[derive(Debug, Clone, Default)]
pub struct SimulatedVoiceOutput {
    voices: HashMap<VoiceKey, SimulatedVoice>,
}

impl SimulatedVoiceOutput {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of notes which are still audible, including released ones.
    pub fn len(&self) -> usize {
        self.voices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.voices.is_empty()
    }

    pub fn voice(&self, key: VoiceKey) -> Option<&SimulatedVoice> {
        self.voices.get(&key)
    }

    /// Advance all envelopes to the given time and drop notes which faded out.
    pub fn advance_to(&mut self, now: Millis) {
        for voice in self.voices.values_mut() {
            voice.advance_to(now);
        }
        self.voices
            .retain(|_, voice| voice.envelope.stage() != EnvelopeStage::Idle);
    }

    /// Render all notes into the given mono buffer, starting at time `now`. Envelopes and
    /// LFOs get evaluated once per buffer.
    pub fn render(&mut self, output: &mut [f32], sample_rate: u32, now: Millis) {
        output.fill(0.0);
        self.advance_to(now);
        let sample_rate = sample_rate.max(1) as f32;
        for voice in self.voices.values_mut() {
            let time = elapsed_secs(voice.pressed, now);
            let mut amplitude = voice.envelope.output();
            if let Some(lfo) = &voice.amplitude_lfo {
                amplitude *= lfo.value_at(time).max(0.0);
            }
            let bend = voice.bend_lfo.map(|lfo| lfo.value_at(time)).unwrap_or(0.0);
            let frequency = voice.frequency * 2f32.powf(bend);
            let step = frequency * WAVETABLE_SIZE as f32 / sample_rate;
            let smoothing = match voice.filter {
                Some(FilterSpec {
                    response: FilterResponse::LowPass,
                    cutoff,
                    ..
                }) => 1.0 - (-2.0 * PI * cutoff / sample_rate).exp(),
                _ => 1.0,
            };
            let samples = voice.waveform.samples();
            for out in output.iter_mut() {
                let index = voice.phase as usize % WAVETABLE_SIZE;
                let sample = samples[index] as f32 / SAMPLE_VOLUME;
                voice.lowpass += smoothing * (sample - voice.lowpass);
                *out += voice.lowpass * amplitude;
                voice.phase = (voice.phase + step) % WAVETABLE_SIZE as f32;
            }
        }
    }
}

impl VoiceOutput for SimulatedVoiceOutput {
    fn press(&mut self, key: VoiceKey, note: &NoteSpec, now: Millis) {
        let mut envelope = AdsrEnvelope::new();
        envelope.note_on(&note.envelope);
        let voice = SimulatedVoice {
            envelope,
            parameters: note.envelope.clone(),
            frequency: note.frequency,
            waveform: note.waveform.clone(),
            filter: note.filter,
            amplitude_lfo: note.amplitude_lfo,
            bend_lfo: note.bend_lfo,
            pressed: now,
            updated: now,
            phase: 0.0,
            lowpass: 0.0,
        };
        self.voices.insert(key, voice);
    }

    fn release(&mut self, key: VoiceKey, now: Millis) {
        if let Some(voice) = self.voices.get_mut(&key) {
            voice.advance_to(now);
            voice.envelope.note_off(&voice.parameters);
            if voice.envelope.stage() == EnvelopeStage::Idle {
                self.voices.remove(&key);
            }
        }
    }

    fn release_all(&mut self, now: Millis) {
        let keys = self.voices.keys().copied().collect::<Vec<_>>();
        for key in keys {
            self.release(key, now);
        }
    }

    fn set_frequency(&mut self, key: VoiceKey, frequency: f32) {
        if let Some(voice) = self.voices.get_mut(&key) {
            voice.frequency = frequency;
        }
    }

    fn set_waveform(&mut self, key: VoiceKey, waveform: &Wavetable) {
        if let Some(voice) = self.voices.get_mut(&key) {
            voice.waveform = waveform.clone();
        }
    }

    fn set_filter(&mut self, key: VoiceKey, filter: Option<FilterSpec>) {
        if let Some(voice) = self.voices.get_mut(&key) {
            voice.filter = filter;
        }
    }

    fn set_amplitude_lfo(&mut self, key: VoiceKey, lfo: Option<Lfo>) {
        if let Some(voice) = self.voices.get_mut(&key) {
            voice.amplitude_lfo = lfo;
        }
    }

    fn set_bend_lfo(&mut self, key: VoiceKey, lfo: Option<Lfo>) {
        if let Some(voice) = self.voices.get_mut(&key) {
            voice.bend_lfo = lfo;
        }
    }

    fn envelope_state(&mut self, key: VoiceKey, now: Millis) -> Option<(EnvelopeStage, f32)> {
        let voice = self.voices.get_mut(&key)?;
        voice.advance_to(now);
        Some((voice.envelope.stage(), voice.envelope.output()))
    }
}

// -------------------------------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Error;

    fn note(waveform: &Wavetable) -> Result<NoteSpec<'_>, Error> {
        Ok(NoteSpec {
            frequency: 440.0,
            envelope: AdsrParameters::new(
                Duration::from_millis(100),
                1.0,
                Duration::from_millis(100),
                0.5,
                Duration::from_millis(100),
            )?,
            waveform,
            filter: None,
            amplitude_lfo: None,
            bend_lfo: None,
        })
    }

    #[test]
    fn envelope_polling() -> Result<(), Box<Error>> {
        let waveform = Wavetable::sine();
        let mut output = SimulatedVoiceOutput::new();
        let key = VoiceKey::new(69, false);
        output.press(key, &note(&waveform)?, 1000);

        let (stage, level) = output.envelope_state(key, 1050).unwrap();
        assert_eq!(stage, EnvelopeStage::Attack);
        assert!((level - 0.5).abs() < 1e-3);
        let (stage, level) = output.envelope_state(key, 1300).unwrap();
        assert_eq!(stage, EnvelopeStage::Sustain);
        assert!((level - 0.5).abs() < 1e-3);

        output.release(key, 1300);
        assert_eq!(output.voice(key).map(|v| v.stage()), Some(EnvelopeStage::Release));
        output.advance_to(1500);
        assert!(output.is_empty());
        assert_eq!(output.envelope_state(key, 1500), None);
        Ok(())
    }

    #[test]
    fn rendering() -> Result<(), Box<Error>> {
        let waveform = Wavetable::sine();
        let mut output = SimulatedVoiceOutput::new();
        let mut buffer = vec![0.0; 256];
        output.render(&mut buffer, 22050, 0);
        assert!(buffer.iter().all(|s| *s == 0.0));

        output.press(VoiceKey::new(69, false), &note(&waveform)?, 0);
        output.render(&mut buffer, 22050, 300);
        let peak = buffer.iter().fold(0.0f32, |peak, s| peak.max(s.abs()));
        assert!(peak > 0.3 && peak <= 0.5 + 1e-3);
        Ok(())
    }

    #[test]
    fn audio_output_state() {
        let mut output = SimulatedAudioOutput::new();
        output.pause();
        output.pause();
        assert!(output.is_paused());
        output.resume();
        assert!(!output.is_paused());
        assert_eq!(output.pause_count(), 1);
        output.set_volume(1.5);
        assert_eq!(output.volume(), 1.0);
    }
}
