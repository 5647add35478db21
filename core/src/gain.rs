use crate::{
    graph::{Graph, Input, NodeId, NodeOutput, Source},
    param::{AudioParam, ParamRange},
    sig::{Buf, SigCtx, SigT},
};

struct GainSig {
    input: Input,
    gain: AudioParam,
    buf: Vec<f32>,
}

impl SigT for GainSig {
    type Item = f32;

    fn sample(&mut self, ctx: &SigCtx) -> impl Buf<Self::Item> {
        self.input.sample(ctx).clone_to_vec(&mut self.buf);
        for (out, gain) in self.buf.iter_mut().zip(self.gain.sample(ctx).iter()) {
            *out *= gain;
        }
        &self.buf
    }
}

/// Multiplies its input by the `gain` parameter.
pub struct Gain {
    input: Input,
    gain: AudioParam,
    output: NodeOutput,
}

impl Gain {
    pub(crate) fn new(graph: &Graph) -> Self {
        let id = graph.allocate_node_id();
        let input = Input::new(graph, id, "input");
        let gain = AudioParam::new(graph, id, "gain", 1.0, ParamRange::NON_NEGATIVE);
        let output = NodeOutput::new(
            id,
            GainSig {
                input: input.clone(),
                gain: gain.clone(),
                buf: Vec::new(),
            },
        );
        Self {
            input,
            gain,
            output,
        }
    }

    pub fn id(&self) -> NodeId {
        self.output.id()
    }

    pub fn input(&self) -> &Input {
        &self.input
    }

    pub fn gain(&self) -> &AudioParam {
        &self.gain
    }
}

impl Source for Gain {
    fn output(&self) -> &NodeOutput {
        &self.output
    }
}
