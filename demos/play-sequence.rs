//! Renders a short chord sequence with the built-in test sequencer into a wav file, using the
//! simulated voice and audio outputs and a manually driven clock.

use std::path::PathBuf;

use arg::{parse_args, Args};

use picofm::{
    utils::time::{Clock, ManualClock, Millis},
    AudioOutput, EngineConfig, MemoryPatchStorage, Scheduler, SequencerEvent,
    SimulatedAudioOutput, SimulatedVoiceOutput, SoundPatch, SynthEngine,
};

// -------------------------------------------------------------------------------------------------

const DEFAULT_LOG_LEVEL: log::Level = if cfg!(debug_assertions) {
    log::Level::Debug
} else {
    log::Level::Warn
};

/// Milliseconds of audio rendered per scheduler round.
const FRAME_MS: Millis = 10;
/// Time to let released notes fade out after the sequence finished.
const TAIL_MS: Millis = 2000;

// -------------------------------------------------------------------------------------------------

#[derive(Args, Debug, Default)]
struct Arguments {
    #[arg(short = "o", long = "output")]
    /// Write the rendered sequence into the given wav file. Defaults to \"play-sequence.wav\".
    output_path: Option<PathBuf>,
    #[arg(short = "l", long = "log-level")]
    /// Set logging level to \"debug\", \"info\", \"warn\" or \"error\".
    /// By default \"debug\" in dev builds and \"warn\" in release builds.
    log_level: Option<log::Level>,
}

// -------------------------------------------------------------------------------------------------

fn chord(notes: &[u8], velocity: u8, length: u32) -> Vec<SequencerEvent> {
    let mut events = notes
        .iter()
        .map(|&note| SequencerEvent::NoteOn { note, velocity })
        .collect::<Vec<_>>();
    events.push(SequencerEvent::Wait(length));
    events.extend(notes.iter().map(|&note| SequencerEvent::NoteOff { note }));
    events.push(SequencerEvent::Wait(length / 4));
    events
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Parse arguments and init logger
    let args = parse_args::<Arguments>();
    simple_logger::SimpleLogger::new()
        .with_level(args.log_level.unwrap_or(DEFAULT_LOG_LEVEL).to_level_filter())
        .init()?;

    // Create a sound with a short glide between the chords
    let mut patch = SoundPatch::default();
    patch.sound.name = "DEMO CHORDS".to_string();
    patch.sound.portamento = 0.08;

    let config = EngineConfig::default();
    let sample_rate = config.sample_rate;
    let clock = ManualClock::new(0);
    let engine = SynthEngine::new(
        config,
        patch,
        SimulatedVoiceOutput::new(),
        SimulatedAudioOutput::new(),
        clock.now_ms(),
    );
    let mut scheduler = Scheduler::new(engine, clock.clone(), MemoryPatchStorage::new());

    // Schedule a little chord progression
    let sequence = [
        chord(&[48, 60, 64, 67], 100, 50),
        chord(&[45, 60, 64, 69], 90, 50),
        chord(&[41, 60, 65, 69], 90, 50),
        chord(&[43, 59, 62, 67], 110, 80),
    ];
    scheduler.set_sequence(sequence.into_iter().flatten())?;

    // Render frames until the sequence played and the tail faded out
    let output_path = args
        .output_path
        .unwrap_or_else(|| PathBuf::from("play-sequence.wav"));
    let spec = hound::WavSpec {
        channels: 1,
        sample_rate,
        bits_per_sample: 32,
        sample_format: hound::SampleFormat::Float,
    };
    let mut writer = hound::WavWriter::create(&output_path, spec)?;

    let mut frame_start: Millis = 0;
    let mut tail_start: Option<Millis> = None;
    let mut buffer = Vec::new();
    loop {
        clock.set(frame_start.max(clock.now_ms()));
        scheduler.tick();

        let frame_samples = ((frame_start + FRAME_MS) * sample_rate as Millis / 1000
            - frame_start * sample_rate as Millis / 1000) as usize;
        buffer.resize(frame_samples, 0.0);
        let (paused, volume) = {
            let audio_output = scheduler.engine().audio_output();
            (audio_output.is_paused(), audio_output.volume())
        };
        scheduler
            .engine_mut()
            .voice_output_mut()
            .render(&mut buffer, sample_rate, frame_start);
        for sample in &buffer {
            let sample = if paused { 0.0 } else { sample * volume * 0.25 };
            writer.write_sample(sample.clamp(-1.0, 1.0))?;
        }

        frame_start += FRAME_MS;
        if scheduler.sequence_len() == 0 {
            let tail_start = *tail_start.get_or_insert(frame_start);
            if frame_start - tail_start >= TAIL_MS {
                break;
            }
        }
    }
    writer.finalize()?;

    log::info!(
        "Rendered {} seconds into '{}'",
        frame_start as f32 / 1000.0,
        output_path.display()
    );
    Ok(())
}
