use crate::{
    error::EngineError,
    graph::{Graph, Input, NodeId, NodeOutput, Sink},
    sig::{Buf, SigCtx, SigT, SigVar},
};

/// The values a parameter will accept. Anything outside is clamped when the parameter is sampled,
/// after connected signals have been added to the intrinsic value.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ParamRange {
    pub min: f32,
    pub max: f32,
}

impl ParamRange {
    pub const UNBOUNDED: Self = Self {
        min: f32::MIN,
        max: f32::MAX,
    };

    pub const NON_NEGATIVE: Self = Self {
        min: 0.0,
        max: f32::MAX,
    };

    pub fn clamp(&self, value: f32) -> f32 {
        value.clamp(self.min, self.max)
    }
}

/// A control input of a node. Its effective value is the intrinsic value (`set_value`) plus the sum
/// of every signal connected to it, clamped to its range.
#[derive(Clone)]
pub struct AudioParam {
    name: &'static str,
    range: ParamRange,
    value: SigVar<f32>,
    inputs: Input,
    graph: Graph,
    buf: Vec<f32>,
}

impl AudioParam {
    pub(crate) fn new(
        graph: &Graph,
        owner: NodeId,
        name: &'static str,
        default_value: f32,
        range: ParamRange,
    ) -> Self {
        Self {
            name,
            range,
            value: SigVar::new(default_value),
            inputs: Input::new(graph, owner, name),
            graph: graph.clone(),
            buf: Vec::new(),
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn range(&self) -> ParamRange {
        self.range
    }

    /// Assign the intrinsic value. Takes effect from the next rendered block.
    pub fn set_value(&self, value: f32) {
        self.value.set(value);
    }

    /// The intrinsic value, ignoring connected signals.
    pub fn value(&self) -> f32 {
        self.value.get()
    }

    pub fn num_connections(&self) -> usize {
        self.inputs.num_sources()
    }
}

impl Sink for AudioParam {
    fn accept(&self, source: &NodeOutput) -> Result<(), EngineError> {
        if !self.graph.capabilities().param_connection {
            return Err(EngineError::ParamConnectionUnsupported { param: self.name });
        }
        self.inputs.attach(source)
    }
}

impl SigT for AudioParam {
    type Item = f32;

    fn sample(&mut self, ctx: &SigCtx) -> impl Buf<Self::Item> {
        let value = self.value.get();
        self.buf.clear();
        self.buf.resize(ctx.num_samples, value);
        self.inputs.mix_into(ctx, &mut self.buf);
        for x in self.buf.iter_mut() {
            *x = self.range.clamp(*x);
        }
        &self.buf
    }
}
