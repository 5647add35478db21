use crate::{
    graph::{Graph, NodeId, NodeOutput, Source},
    param::{AudioParam, ParamRange},
    sig::{Buf, SigCtx, SigT, SigVar},
};
use itertools::izip;
use serde::{Deserialize, Serialize};
use std::f32::consts::PI;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Waveform {
    #[default]
    Sine,
    Triangle,
    Saw,
    Square,
}

impl Waveform {
    fn sample(self, state_01: f32) -> f32 {
        match self {
            Self::Sine => (state_01 * PI * 2.0).sin(),
            Self::Triangle => (((state_01 * 2.0) - 1.0).abs() * 2.0) - 1.0,
            Self::Saw => (state_01 * 2.0) - 1.0,
            Self::Square => {
                if state_01 < 0.5 {
                    -1.0
                } else {
                    1.0
                }
            }
        }
    }
}

/// Frequency after applying a detune expressed in cents.
pub fn detuned_freq_hz(freq_hz: f32, detune_cents: f32) -> f32 {
    freq_hz * 2_f32.powf(detune_cents / 1200.0)
}

struct OscillatorSig {
    waveform: SigVar<Waveform>,
    freq_hz: AudioParam,
    detune_cents: AudioParam,
    state_01: f32,
    buf: Vec<f32>,
}

impl SigT for OscillatorSig {
    type Item = f32;

    fn sample(&mut self, ctx: &SigCtx) -> impl Buf<Self::Item> {
        let waveform = self.waveform.get();
        let freq_hz = self.freq_hz.sample(ctx);
        let detune_cents = self.detune_cents.sample(ctx);
        self.buf.clear();
        for (freq_hz, detune_cents) in izip! {
            freq_hz.iter(),
            detune_cents.iter(),
        } {
            self.buf.push(waveform.sample(self.state_01));
            let state_delta = detuned_freq_hz(freq_hz, detune_cents) / ctx.sample_rate_hz;
            self.state_01 = (self.state_01 + state_delta).rem_euclid(1.0);
        }
        &self.buf
    }
}

/// A periodic tone generator. The effective frequency is `frequency * 2^(detune / 1200)`, with
/// both parameters sampled per audio sample so that either can be driven by another node.
pub struct Oscillator {
    waveform: SigVar<Waveform>,
    frequency: AudioParam,
    detune: AudioParam,
    output: NodeOutput,
}

impl Oscillator {
    pub const DEFAULT_FREQ_HZ: f32 = 440.0;

    pub(crate) fn new(graph: &Graph) -> Self {
        let id = graph.allocate_node_id();
        let waveform = SigVar::new(Waveform::default());
        let frequency = AudioParam::new(
            graph,
            id,
            "frequency",
            Self::DEFAULT_FREQ_HZ,
            ParamRange::UNBOUNDED,
        );
        let detune = AudioParam::new(graph, id, "detune", 0.0, ParamRange::UNBOUNDED);
        let output = NodeOutput::new(
            id,
            OscillatorSig {
                waveform: waveform.clone(),
                freq_hz: frequency.clone(),
                detune_cents: detune.clone(),
                state_01: 0.0,
                buf: Vec::new(),
            },
        );
        Self {
            waveform,
            frequency,
            detune,
            output,
        }
    }

    pub fn id(&self) -> NodeId {
        self.output.id()
    }

    pub fn frequency(&self) -> &AudioParam {
        &self.frequency
    }

    /// Offset from `frequency` in cents.
    pub fn detune(&self) -> &AudioParam {
        &self.detune
    }

    pub fn waveform(&self) -> Waveform {
        self.waveform.get()
    }

    pub fn set_waveform(&self, waveform: Waveform) {
        self.waveform.set(waveform);
    }
}

impl Source for Oscillator {
    fn output(&self) -> &NodeOutput {
        &self.output
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn an_octave_is_1200_cents() {
        assert!((detuned_freq_hz(440.0, 1200.0) - 880.0).abs() < 1e-3);
        assert!((detuned_freq_hz(440.0, -1200.0) - 220.0).abs() < 1e-3);
        assert_eq!(detuned_freq_hz(440.0, 0.0), 440.0);
    }

    #[test]
    fn waveforms_are_bounded() {
        for waveform in [
            Waveform::Sine,
            Waveform::Triangle,
            Waveform::Saw,
            Waveform::Square,
        ] {
            for i in 0..100 {
                let x = waveform.sample(i as f32 / 100.0);
                assert!((-1.0..=1.0).contains(&x), "{:?} {}", waveform, x);
            }
        }
    }
}
