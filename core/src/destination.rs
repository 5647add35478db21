use crate::{
    error::EngineError,
    graph::{Graph, Input, NodeId, NodeOutput, Sink},
};

/// The final sink of a context. Everything connected here is summed and handed to the audio
/// device.
#[derive(Clone)]
pub struct Destination {
    input: Input,
}

impl Destination {
    pub(crate) fn new(graph: &Graph) -> Self {
        Self {
            input: Input::new(graph, NodeId::DESTINATION, "destination"),
        }
    }

    pub fn id(&self) -> NodeId {
        NodeId::DESTINATION
    }

    pub fn num_sources(&self) -> usize {
        self.input.num_sources()
    }

    pub(crate) fn input(&self) -> &Input {
        &self.input
    }
}

impl Sink for Destination {
    fn accept(&self, source: &NodeOutput) -> Result<(), EngineError> {
        self.input.accept(source)
    }
}
