use crate::{
    graph::{Graph, NodeId, NodeOutput, Source},
    param::{AudioParam, ParamRange},
    sig::{Buf, SigCtx, SigT},
};

struct ConstantSourceSig {
    offset: AudioParam,
}

impl SigT for ConstantSourceSig {
    type Item = f32;

    fn sample(&mut self, ctx: &SigCtx) -> impl Buf<Self::Item> {
        self.offset.sample(ctx)
    }
}

/// Emits its `offset` parameter as a signal. Starts emitting as soon as it is created.
pub struct ConstantSource {
    offset: AudioParam,
    output: NodeOutput,
}

impl ConstantSource {
    pub(crate) fn new(graph: &Graph) -> Self {
        let id = graph.allocate_node_id();
        let offset = AudioParam::new(graph, id, "offset", 1.0, ParamRange::UNBOUNDED);
        let output = NodeOutput::new(
            id,
            ConstantSourceSig {
                offset: offset.clone(),
            },
        );
        Self { offset, output }
    }

    pub fn id(&self) -> NodeId {
        self.output.id()
    }

    pub fn offset(&self) -> &AudioParam {
        &self.offset
    }
}

impl Source for ConstantSource {
    fn output(&self) -> &NodeOutput {
        &self.output
    }
}
