use crate::{
    capabilities::Capabilities,
    error::EngineError,
    sig::{Buf, Sig, SigBoxed, SigCtx, SigShared, SigT, read_lock, sig_boxed, sig_shared, write_lock},
};
use std::sync::{
    Arc, RwLock,
    atomic::{AtomicU64, Ordering},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(u64);

impl NodeId {
    pub const DESTINATION: Self = Self(0);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Edge {
    from: NodeId,
    to: NodeId,
    port: &'static str,
}

struct GraphShared {
    sample_rate_hz: f32,
    capabilities: Capabilities,
    next_node_index: AtomicU64,
    next_batch_index: AtomicU64,
    edges: RwLock<Vec<Edge>>,
}

/// Topology bookkeeping shared by every handle created from one `AudioContext`. The signals
/// themselves are owned by the nodes; this only records which node feeds which so that cycles can
/// be rejected before they reach the audio thread.
#[derive(Clone)]
pub(crate) struct Graph(Arc<GraphShared>);

impl Graph {
    pub(crate) fn new(sample_rate_hz: f32, capabilities: Capabilities) -> Self {
        Self(Arc::new(GraphShared {
            sample_rate_hz,
            capabilities,
            next_node_index: AtomicU64::new(1),
            next_batch_index: AtomicU64::new(0),
            edges: RwLock::new(Vec::new()),
        }))
    }

    pub(crate) fn sample_rate_hz(&self) -> f32 {
        self.0.sample_rate_hz
    }

    pub(crate) fn capabilities(&self) -> Capabilities {
        self.0.capabilities
    }

    pub(crate) fn allocate_node_id(&self) -> NodeId {
        NodeId(self.0.next_node_index.fetch_add(1, Ordering::Relaxed))
    }

    /// Number of nodes created so far, not counting the destination.
    pub(crate) fn node_count(&self) -> usize {
        (self.0.next_node_index.load(Ordering::Relaxed) - 1) as usize
    }

    pub(crate) fn next_batch_index(&self) -> u64 {
        self.0.next_batch_index.fetch_add(1, Ordering::Relaxed)
    }

    fn reaches(edges: &[Edge], start: NodeId, target: NodeId) -> bool {
        let mut stack = vec![start];
        let mut visited = Vec::new();
        while let Some(node) = stack.pop() {
            if node == target {
                return true;
            }
            if visited.contains(&node) {
                continue;
            }
            visited.push(node);
            stack.extend(edges.iter().filter(|e| e.from == node).map(|e| e.to));
        }
        false
    }

    /// Records an edge. Returns `Ok(false)` if the same edge already exists.
    pub(crate) fn add_edge(
        &self,
        from: NodeId,
        to: NodeId,
        port: &'static str,
    ) -> Result<bool, EngineError> {
        let mut edges = write_lock(&self.0.edges);
        let edge = Edge { from, to, port };
        if edges.contains(&edge) {
            return Ok(false);
        }
        if Self::reaches(&edges, to, from) {
            return Err(EngineError::Cycle { from, to });
        }
        log::debug!("connect {:?} -> {:?}.{}", from, to, port);
        edges.push(edge);
        Ok(true)
    }
}

/// The output of a node. Cloning is shallow: all clones observe the same per-block computation.
#[derive(Clone)]
pub struct NodeOutput {
    id: NodeId,
    sig: Sig<SigShared<SigBoxed<f32>>>,
}

impl NodeOutput {
    pub(crate) fn new<S>(id: NodeId, sig: S) -> Self
    where
        S: SigT<Item = f32> + Send + Sync + 'static,
    {
        Self {
            id,
            sig: sig_shared(sig_boxed(sig).0),
        }
    }

    pub fn id(&self) -> NodeId {
        self.id
    }
}

impl SigT for NodeOutput {
    type Item = f32;

    fn sample(&mut self, ctx: &SigCtx) -> impl Buf<Self::Item> {
        self.sig.sample(ctx)
    }
}

/// Anything a node output can be connected to: a node's audio input or one of its parameters.
pub trait Sink {
    fn accept(&self, source: &NodeOutput) -> Result<(), EngineError>;
}

impl<K: Sink + ?Sized> Sink for &K {
    fn accept(&self, source: &NodeOutput) -> Result<(), EngineError> {
        (**self).accept(source)
    }
}

pub trait Source {
    fn output(&self) -> &NodeOutput;

    /// Connect this node's output to `sink`. Connecting the same pair twice has no effect.
    fn connect<K: Sink + ?Sized>(&self, sink: &K) -> Result<(), EngineError> {
        sink.accept(self.output())
    }
}

/// A summing input. All connected sources are added together sample by sample.
#[derive(Clone)]
pub struct Input {
    owner: NodeId,
    port: &'static str,
    graph: Graph,
    sources: Arc<RwLock<Vec<NodeOutput>>>,
    buf: Vec<f32>,
}

impl Input {
    pub(crate) fn new(graph: &Graph, owner: NodeId, port: &'static str) -> Self {
        Self {
            owner,
            port,
            graph: graph.clone(),
            sources: Arc::new(RwLock::new(Vec::new())),
            buf: Vec::new(),
        }
    }

    pub fn num_sources(&self) -> usize {
        read_lock(&self.sources).len()
    }

    pub(crate) fn attach(&self, source: &NodeOutput) -> Result<(), EngineError> {
        if self.graph.add_edge(source.id(), self.owner, self.port)? {
            write_lock(&self.sources).push(source.clone());
        }
        Ok(())
    }

    /// Adds the sum of all connected sources into `out`.
    pub(crate) fn mix_into(&self, ctx: &SigCtx, out: &mut [f32]) {
        let mut sources = write_lock(&self.sources);
        for source in sources.iter_mut() {
            for (dst, x) in out.iter_mut().zip(source.sample(ctx).iter()) {
                *dst += x;
            }
        }
    }
}

impl Sink for Input {
    fn accept(&self, source: &NodeOutput) -> Result<(), EngineError> {
        self.attach(source)
    }
}

impl SigT for Input {
    type Item = f32;

    fn sample(&mut self, ctx: &SigCtx) -> impl Buf<Self::Item> {
        let mut buf = std::mem::take(&mut self.buf);
        buf.clear();
        buf.resize(ctx.num_samples, 0.0);
        self.mix_into(ctx, &mut buf);
        self.buf = buf;
        &self.buf
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn edges_are_idempotent() {
        let graph = Graph::new(48_000.0, Capabilities::MODERN);
        let a = graph.allocate_node_id();
        let b = graph.allocate_node_id();
        assert_eq!(graph.add_edge(a, b, "input"), Ok(true));
        assert_eq!(graph.add_edge(a, b, "input"), Ok(false));
        assert_eq!(graph.add_edge(a, b, "gain"), Ok(true));
    }

    #[test]
    fn cycles_are_rejected() {
        let graph = Graph::new(48_000.0, Capabilities::MODERN);
        let a = graph.allocate_node_id();
        let b = graph.allocate_node_id();
        let c = graph.allocate_node_id();
        graph.add_edge(a, b, "input").unwrap();
        graph.add_edge(b, c, "input").unwrap();
        assert_eq!(
            graph.add_edge(c, a, "gain"),
            Err(EngineError::Cycle { from: c, to: a })
        );
        assert_eq!(
            graph.add_edge(a, a, "gain"),
            Err(EngineError::Cycle { from: a, to: a })
        );
    }

    #[test]
    fn node_count_excludes_destination() {
        let graph = Graph::new(48_000.0, Capabilities::MODERN);
        assert_eq!(graph.node_count(), 0);
        graph.allocate_node_id();
        assert_eq!(graph.node_count(), 1);
    }
}
