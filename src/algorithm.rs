//! FM algorithm graphs: wire the operators of an [`OperatorBank`] into wavetables.

use strum::IntoEnumIterator;

use crate::{
    envelope::{EnvelopePhase, ENVELOPE_PHASE_COUNT},
    operator::{audio_level, OperatorBank, LEVEL_MAX, OPERATOR_COUNT},
    waveform::{evaluate_waveform, SampledWaves, WaveKind, WaveformParams, Wavetable},
};

// -------------------------------------------------------------------------------------------------

/// Operator topologies. `<n>` is an operator with self feedback, `*` modulates, `+` mixes.
#[derive(
    Debug,
    Default,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    strum::Display,
    strum::EnumString,
    strum::EnumIter,
    strum::VariantNames,
)]
pub enum AlgorithmId {
    #[default]
    #[strum(serialize = "0:<1>*2")]
    Chain2,
    #[strum(serialize = "1:<1>+2")]
    Mix2,
    #[strum(serialize = "2:<1>+2+<3>+4")]
    Mix4,
    #[strum(serialize = "3:(<1>+<2>*3)*4")]
    MixedChain,
    #[strum(serialize = "4:<1>*2*3*4")]
    Chain4,
    #[strum(serialize = "5:<1>*2+<3>*4")]
    TwoChains,
    #[strum(serialize = "6:<1>+<2>*3*4")]
    MixChain3,
    #[strum(serialize = "7:<1>+<2>*3+<4>")]
    MixChainMix,
    #[strum(serialize = "8:<1>*(2+3)+<4>")]
    SplitMix,
    #[strum(serialize = "9:<1>*(2*3+4)")]
    SplitChain,
    #[strum(serialize = "10:<1>*(2+3+4)")]
    Split3,
}

impl AlgorithmId {
    pub fn from_index(index: usize) -> Option<Self> {
        Self::iter().nth(index)
    }

    pub fn index(self) -> usize {
        self as usize
    }

    /// Operators which are mixed directly into the audio output.
    pub fn audio_outputs(self) -> &'static [usize] {
        match self {
            Self::Chain2 => &[1],
            // both mixed operators are audible, so both count for the level adjustment
            Self::Mix2 => &[0, 1],
            Self::Mix4 => &[0, 1, 2, 3],
            Self::MixedChain | Self::Chain4 => &[3],
            Self::TwoChains => &[1, 3],
            Self::MixChain3 => &[0, 3],
            Self::MixChainMix => &[0, 2, 3],
            Self::SplitMix => &[1, 2, 3],
            Self::SplitChain => &[2, 3],
            Self::Split3 => &[1, 2, 3],
        }
    }
}

// -------------------------------------------------------------------------------------------------

/// Renders single operators of a bank for one envelope phase.
struct OperatorGraph<'a> {
    bank: &'a OperatorBank,
    sampled: &'a SampledWaves,
    phase: EnvelopePhase,
    adjust: f32,
    outputs: &'static [usize],
}

impl OperatorGraph<'_> {
    fn level(&self, op: usize) -> f32 {
        let audio_output = self.outputs.contains(&op);
        self.bank.operators[op].level(self.phase, audio_output, self.adjust)
    }

    fn render(&self, op: usize, amplitude: f32, modulator: Option<&[f32]>) -> Vec<f32> {
        let params = &self.bank.operators[op];
        let mut args = WaveformParams::new(amplitude, params.ratio());
        if let Some(modulator) = modulator {
            args = args.with_modulator(modulator, params.feedback);
        }
        evaluate_waveform(params.wave, &args, self.sampled)
    }

    /// An unmodulated operator.
    fn plain(&self, op: usize) -> Vec<f32> {
        self.render(op, self.level(op), None)
    }

    /// The first operator of a chain: self modulated with a base wave of the feedback
    /// amplitude when it has feedback, else plain.
    fn head(&self, op: usize) -> Vec<f32> {
        let feedback = self.bank.operators[op].feedback;
        if feedback > 0 {
            let base = self.render(op, feedback as f32, None);
            self.render(op, self.level(op), Some(&base))
        } else {
            self.plain(op)
        }
    }

    /// An operator modulated by the given input, phase shifted by the operator's feedback.
    fn modulated(&self, op: usize, input: &[f32]) -> Vec<f32> {
        self.render(op, self.level(op), Some(input))
    }
}

fn mix(waves: &[&[f32]]) -> Vec<f32> {
    let mut out = waves.first().map(|w| w.to_vec()).unwrap_or_default();
    for wave in waves.iter().skip(1) {
        for (o, s) in out.iter_mut().zip(wave.iter()) {
            *o += s;
        }
    }
    out
}

// -------------------------------------------------------------------------------------------------

/// Output normalization factor: `255 / sum` of all audio output operator amplitudes and all
/// audible additive partials, or 1 when disabled or when there's nothing to normalize.
pub fn output_adjust(bank: &OperatorBank, enabled: bool) -> f32 {
    if !enabled {
        return 1.0;
    }
    let operators = bank
        .algorithm
        .audio_outputs()
        .iter()
        .map(|op| bank.operators[*op].amplitude as u32)
        .sum::<u32>();
    let additive = bank
        .additive
        .iter()
        .filter(|a| !a.muted)
        .map(|a| a.amplitude as u32)
        .sum::<u32>();
    let sum = operators + additive;
    if sum == 0 {
        1.0
    } else {
        LEVEL_MAX / sum as f32
    }
}

/// Render the wavetable of the given algorithm and envelope phase.
pub fn evaluate_algorithm(
    id: AlgorithmId,
    bank: &OperatorBank,
    phase: EnvelopePhase,
    adjust_level: bool,
    sampled: &SampledWaves,
) -> Wavetable {
    let graph = OperatorGraph {
        bank,
        sampled,
        phase,
        adjust: output_adjust(bank, adjust_level),
        outputs: id.audio_outputs(),
    };

    let mut wave = match id {
        AlgorithmId::Chain2 => graph.modulated(1, &graph.head(0)),
        AlgorithmId::Mix2 => mix(&[&graph.head(0), &graph.plain(1)]),
        AlgorithmId::Mix4 => mix(&[
            &graph.head(0),
            &graph.plain(1),
            &graph.head(2),
            &graph.plain(3),
        ]),
        AlgorithmId::MixedChain => {
            let input = mix(&[&graph.head(0), &graph.modulated(2, &graph.head(1))]);
            graph.modulated(3, &input)
        }
        AlgorithmId::Chain4 => {
            let input = graph.modulated(2, &graph.modulated(1, &graph.head(0)));
            graph.modulated(3, &input)
        }
        AlgorithmId::TwoChains => mix(&[
            &graph.modulated(1, &graph.head(0)),
            &graph.modulated(3, &graph.head(2)),
        ]),
        AlgorithmId::MixChain3 => mix(&[
            &graph.head(0),
            &graph.modulated(3, &graph.modulated(2, &graph.head(1))),
        ]),
        AlgorithmId::MixChainMix => mix(&[
            &graph.head(0),
            &graph.modulated(2, &graph.head(1)),
            &graph.head(3),
        ]),
        AlgorithmId::SplitMix => {
            let modulator = graph.head(0);
            mix(&[
                &graph.modulated(1, &modulator),
                &graph.modulated(2, &modulator),
                &graph.head(3),
            ])
        }
        AlgorithmId::SplitChain => {
            let modulator = graph.head(0);
            mix(&[
                &graph.modulated(2, &graph.modulated(1, &modulator)),
                &graph.modulated(3, &modulator),
            ])
        }
        AlgorithmId::Split3 => {
            let modulator = graph.head(0);
            mix(&[
                &graph.modulated(1, &modulator),
                &graph.modulated(2, &modulator),
                &graph.modulated(3, &modulator),
            ])
        }
    };

    // additive partials share the envelope of every second operator
    for (index, partial) in bank.additive.iter().enumerate() {
        if !partial.is_audible() {
            continue;
        }
        let envelope = &bank.operators[index / 2 % OPERATOR_COUNT].envelope;
        let amplitude = audio_level(partial.amplitude, graph.adjust) * envelope.additive(phase);
        let sine = evaluate_waveform(
            WaveKind::Sine,
            &WaveformParams::new(amplitude, partial.ratio()),
            sampled,
        );
        for (w, s) in wave.iter_mut().zip(sine) {
            *w += s;
        }
    }

    Wavetable::from_samples(&wave)
}

/// Render the wavetable of an algorithm, given by its raw patch index. Unknown algorithms
/// render a plain full scale sine.
pub fn evaluate_algorithm_index(
    index: usize,
    bank: &OperatorBank,
    phase: EnvelopePhase,
    adjust_level: bool,
    sampled: &SampledWaves,
) -> Wavetable {
    match AlgorithmId::from_index(index) {
        Some(id) => evaluate_algorithm(id, bank, phase, adjust_level, sampled),
        None => {
            log::warn!("Unknown algorithm {index}, falling back to a sine wave");
            Wavetable::sine()
        }
    }
}

// -------------------------------------------------------------------------------------------------

/// The wavetables of all envelope phases of a sound.
#[derive(Debug, Clone, Default)]
pub struct WavetableSet {
    tables: [Wavetable; ENVELOPE_PHASE_COUNT],
}

impl WavetableSet {
    /// Render the wavetables of all phases.
    pub fn generate(bank: &OperatorBank, adjust_level: bool, sampled: &SampledWaves) -> Self {
        let tables = std::array::from_fn(|index| {
            let phase = EnvelopePhase::from_index(index).unwrap_or_default();
            evaluate_algorithm(bank.algorithm, bank, phase, adjust_level, sampled)
        });
        Self { tables }
    }

    /// The wavetable for the given phase.
    #[inline(always)]
    pub fn get(&self, phase: EnvelopePhase) -> &Wavetable {
        &self.tables[phase.index()]
    }
}

// -------------------------------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::waveform::WAVETABLE_SIZE;

    #[test]
    fn algorithm_ids() {
        assert_eq!(AlgorithmId::iter().count(), 11);
        assert_eq!(AlgorithmId::from_index(3), Some(AlgorithmId::MixedChain));
        assert_eq!(AlgorithmId::Split3.to_string(), "10:<1>*(2+3+4)");
        assert_eq!(AlgorithmId::Mix2.audio_outputs(), &[0, 1]);
    }

    #[test]
    fn all_algorithms_and_phases_stay_in_range() {
        let mut bank = OperatorBank::default();
        bank.additive[0].amplitude = 200;
        bank.additive[5].amplitude = 80;
        bank.operators[1].wave = WaveKind::Square;
        bank.operators[3].feedback = 90;
        let sampled = SampledWaves::new();
        for id in AlgorithmId::iter() {
            bank.algorithm = id;
            for adjust in [true, false] {
                for phase in EnvelopePhase::iter() {
                    let table = evaluate_algorithm(id, &bank, phase, adjust, &sampled);
                    assert_eq!(table.samples().len(), WAVETABLE_SIZE);
                    assert!(table.samples().iter().all(|s| (-32000..=32000).contains(s)));
                }
            }
        }
    }

    #[test]
    fn unknown_algorithm_falls_back_to_sine() {
        let bank = OperatorBank::default();
        let table = evaluate_algorithm_index(
            11,
            &bank,
            EnvelopePhase::AttackStart,
            true,
            &SampledWaves::new(),
        );
        assert_eq!(table, Wavetable::sine());
    }

    #[test]
    fn chain_is_deterministic() {
        // op 0: sine ratio 2 amp 10 feedback 1, op 1: sine ratio 1 amp 255
        let bank = OperatorBank::default();
        let sampled = SampledWaves::new();
        let a = evaluate_algorithm(
            AlgorithmId::Chain2,
            &bank,
            EnvelopePhase::AttackStart,
            true,
            &sampled,
        );
        let b = evaluate_algorithm(
            AlgorithmId::Chain2,
            &bank,
            EnvelopePhase::AttackStart,
            true,
            &sampled,
        );
        assert_eq!(a, b);
        assert!(a.peak() > 30000);
    }

    #[test]
    fn mixed_operators_count_for_normalization() {
        let mut bank = OperatorBank::default();
        bank.algorithm = AlgorithmId::Mix2;
        bank.operators[0].amplitude = 5;
        bank.operators[1].amplitude = 50;
        assert!((output_adjust(&bank, true) - 255.0 / 55.0).abs() < 1e-4);
    }

    #[test]
    fn output_normalization() {
        let mut bank = OperatorBank::default();
        bank.algorithm = AlgorithmId::Chain2;
        bank.operators[0].amplitude = 0;
        bank.operators[1].amplitude = 50;
        let sampled = SampledWaves::new();
        assert!((output_adjust(&bank, true) - 5.1).abs() < 1e-4);
        assert_eq!(output_adjust(&bank, false), 1.0);

        let plain = evaluate_algorithm(
            bank.algorithm,
            &bank,
            EnvelopePhase::AttackStart,
            false,
            &sampled,
        );
        let adjusted = evaluate_algorithm(
            bank.algorithm,
            &bank,
            EnvelopePhase::AttackStart,
            true,
            &sampled,
        );
        let ratio = adjusted.peak() as f32 / plain.peak() as f32;
        assert!((ratio - 5.1).abs() < 0.01, "ratio {ratio}");

        // muted partials don't count
        bank.additive[2].amplitude = 100;
        bank.additive[2].muted = true;
        assert!((output_adjust(&bank, true) - 5.1).abs() < 1e-4);
        bank.additive[2].muted = false;
        assert!((output_adjust(&bank, true) - 1.7).abs() < 1e-4);
    }

    #[test]
    fn phases_follow_operator_envelopes() {
        let mut bank = OperatorBank::default();
        bank.algorithm = AlgorithmId::Mix2;
        bank.operators[0].amplitude = 0;
        bank.operators[1].envelope.sustain_additive = 0.5;
        let sampled = SampledWaves::new();
        let set = WavetableSet::generate(&bank, true, &sampled);
        let attack = set.get(EnvelopePhase::AttackStart).peak();
        let sustain = set.get(EnvelopePhase::Sustain).peak();
        assert_eq!(attack, 32000);
        assert!((sustain - 16000).abs() <= 1);
    }
}
