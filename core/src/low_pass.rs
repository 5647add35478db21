use crate::{
    graph::{Graph, Input, NodeId, NodeOutput, Source},
    param::{AudioParam, ParamRange},
    sig::{Buf, SigCtx, SigT, read_lock, write_lock},
};
use itertools::izip;
use std::{
    f64::consts::PI,
    sync::{Arc, RwLock},
};

// Keeps tan() away from its pole at half the sample rate.
const MAX_CUTOFF_SAMPLE_RATE_RATIO: f64 = 0.49;

/// Topology-preserving one pole low pass. A step input produces a monotonic ramp with no
/// overshoot, which is what makes it usable for smoothing control signals.
#[derive(Default)]
struct OnePole {
    z1: f64,
    out: f64,
}

impl OnePole {
    fn tick(&mut self, sample: f64, alpha: f64) -> f64 {
        let vn = (sample - self.z1) * alpha;
        let out = vn + self.z1;
        self.z1 = vn + out;
        self.out = out;
        out
    }

    /// Move to the steady state for a constant input of `value`.
    fn reset(&mut self, value: f64) {
        self.z1 = value;
        self.out = value;
    }
}

fn alpha(cutoff_hz: f32, sample_rate_hz: f32) -> f64 {
    let ratio = (cutoff_hz.max(0.0) as f64 / sample_rate_hz as f64)
        .min(MAX_CUTOFF_SAMPLE_RATE_RATIO);
    let g = (PI * ratio).tan();
    g / (1.0 + g)
}

struct LowPassSig {
    input: Input,
    cutoff_hz: AudioParam,
    state: Arc<RwLock<OnePole>>,
    buf: Vec<f32>,
}

impl SigT for LowPassSig {
    type Item = f32;

    fn sample(&mut self, ctx: &SigCtx) -> impl Buf<Self::Item> {
        self.buf.resize(ctx.num_samples, 0.0);
        let input = self.input.sample(ctx);
        let cutoff_hz = self.cutoff_hz.sample(ctx);
        let mut state = write_lock(&self.state);
        for (out, sample, cutoff_hz) in izip! {
            self.buf.iter_mut(),
            input.iter(),
            cutoff_hz.iter(),
        } {
            let alpha = alpha(cutoff_hz, ctx.sample_rate_hz);
            *out = state.tick(sample as f64, alpha) as f32;
        }
        &self.buf
    }
}

/// A single pole low pass filter. It has no resonance so its response is flat in the pass band
/// and it never peaks.
pub struct LowPass {
    input: Input,
    cutoff_hz: AudioParam,
    state: Arc<RwLock<OnePole>>,
    output: NodeOutput,
}

impl LowPass {
    pub const DEFAULT_CUTOFF_HZ: f32 = 350.0;

    pub(crate) fn new(graph: &Graph) -> Self {
        let id = graph.allocate_node_id();
        let input = Input::new(graph, id, "input");
        let cutoff_hz = AudioParam::new(
            graph,
            id,
            "cutoff_hz",
            Self::DEFAULT_CUTOFF_HZ,
            ParamRange::NON_NEGATIVE,
        );
        let state = Arc::new(RwLock::new(OnePole::default()));
        let output = NodeOutput::new(
            id,
            LowPassSig {
                input: input.clone(),
                cutoff_hz: cutoff_hz.clone(),
                state: Arc::clone(&state),
                buf: Vec::new(),
            },
        );
        Self {
            input,
            cutoff_hz,
            state,
            output,
        }
    }

    pub fn id(&self) -> NodeId {
        self.output.id()
    }

    pub fn input(&self) -> &Input {
        &self.input
    }

    pub fn cutoff_hz(&self) -> &AudioParam {
        &self.cutoff_hz
    }

    /// The most recent output of the filter.
    pub fn current_output(&self) -> f32 {
        read_lock(&self.state).out as f32
    }

    /// Jump straight to `value` as if the filter had settled there, skipping the ramp. Applies
    /// from the next sample the filter computes.
    pub fn reset(&self, value: f32) {
        write_lock(&self.state).reset(value as f64);
    }
}

impl Source for LowPass {
    fn output(&self) -> &NodeOutput {
        &self.output
    }
}

#[cfg(test)]
mod test {
    use super::*;

    const SAMPLE_RATE_HZ: f32 = 48_000.0;

    #[test]
    fn step_response_is_monotonic_without_overshoot() {
        let mut filter = OnePole::default();
        let alpha = alpha(20.0, SAMPLE_RATE_HZ);
        let mut prev = 0.0;
        for _ in 0..SAMPLE_RATE_HZ as usize {
            let out = filter.tick(1.0, alpha);
            assert!(out >= prev - 1e-12);
            assert!(out <= 1.0 + 1e-9);
            prev = out;
        }
        assert!((prev - 1.0).abs() < 1e-6);
    }

    #[test]
    fn reset_skips_the_ramp() {
        let mut filter = OnePole::default();
        let alpha = alpha(20.0, SAMPLE_RATE_HZ);
        for _ in 0..100 {
            filter.tick(1.0, alpha);
        }
        filter.reset(0.0);
        assert_eq!(filter.out, 0.0);
        assert_eq!(filter.tick(0.0, alpha), 0.0);
    }

    #[test]
    fn cutoff_above_nyquist_is_stable() {
        let mut filter = OnePole::default();
        let alpha = alpha(1_000_000.0, SAMPLE_RATE_HZ);
        for _ in 0..1000 {
            let out = filter.tick(1.0, alpha);
            assert!(out.is_finite());
        }
    }
}
