use crate::{
    graph::{Graph, NodeId, NodeOutput, Source},
    sig::{Buf, SigCtx, SigT, read_lock, write_lock},
};
use std::sync::{
    Arc, RwLock,
    atomic::{AtomicBool, Ordering},
};

/// A mono buffer of samples. Writes are visible to any `BufferSource` playing the buffer from its
/// next block.
#[derive(Clone)]
pub struct AudioBuffer {
    data: Arc<RwLock<Vec<f32>>>,
}

impl AudioBuffer {
    pub(crate) fn new(len: usize) -> Self {
        Self {
            data: Arc::new(RwLock::new(vec![0.0; len])),
        }
    }

    pub fn len(&self) -> usize {
        read_lock(&self.data).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns 0 for indices past the end of the buffer.
    pub fn get(&self, index: usize) -> f32 {
        read_lock(&self.data).get(index).copied().unwrap_or(0.0)
    }

    /// Writes past the end of the buffer are ignored.
    pub fn set(&self, index: usize, value: f32) {
        if let Some(sample) = write_lock(&self.data).get_mut(index) {
            *sample = value;
        }
    }
}

struct BufferSourceSig {
    buffer: AudioBuffer,
    looping: Arc<AtomicBool>,
    position: usize,
    buf: Vec<f32>,
}

impl SigT for BufferSourceSig {
    type Item = f32;

    fn sample(&mut self, ctx: &SigCtx) -> impl Buf<Self::Item> {
        let data = read_lock(&self.buffer.data);
        let looping = self.looping.load(Ordering::Relaxed);
        self.buf.clear();
        for _ in 0..ctx.num_samples {
            if looping && !data.is_empty() {
                self.position %= data.len();
            }
            self.buf.push(data.get(self.position).copied().unwrap_or(0.0));
            self.position = self.position.saturating_add(1);
        }
        &self.buf
    }
}

/// Plays an `AudioBuffer`, optionally looping over the whole buffer.
pub struct BufferSource {
    looping: Arc<AtomicBool>,
    output: NodeOutput,
}

impl BufferSource {
    pub(crate) fn new(graph: &Graph, buffer: &AudioBuffer) -> Self {
        let id = graph.allocate_node_id();
        let looping = Arc::new(AtomicBool::new(false));
        let output = NodeOutput::new(
            id,
            BufferSourceSig {
                buffer: buffer.clone(),
                looping: Arc::clone(&looping),
                position: 0,
                buf: Vec::new(),
            },
        );
        Self {
            looping,
            output,
        }
    }

    pub fn id(&self) -> NodeId {
        self.output.id()
    }

    pub fn set_loop(&self, looping: bool) {
        self.looping.store(looping, Ordering::Relaxed);
    }
}

impl Source for BufferSource {
    fn output(&self) -> &NodeOutput {
        &self.output
    }
}
