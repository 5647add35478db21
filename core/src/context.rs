use crate::{
    buffer_source::{AudioBuffer, BufferSource},
    capabilities::Capabilities,
    constant_source::ConstantSource,
    destination::Destination,
    error::EngineError,
    gain::Gain,
    graph::{Graph, Input, NodeOutput, Source},
    low_pass::LowPass,
    oscillator::Oscillator,
    sig::{Buf, SigCtx, SigT, read_lock, write_lock},
};
use std::sync::{Arc, RwLock};

/// Handle to one audio engine instance. Cloning is shallow. Every node is created through a
/// context and can only be connected to nodes of the same context.
#[derive(Clone)]
pub struct AudioContext {
    graph: Graph,
    destination: Destination,
    nodes: Arc<RwLock<Vec<NodeOutput>>>,
}

impl AudioContext {
    pub fn new(sample_rate_hz: f32, capabilities: Capabilities) -> Self {
        log::info!(
            "creating audio context at {} Hz with {:?}",
            sample_rate_hz,
            capabilities
        );
        let graph = Graph::new(sample_rate_hz, capabilities);
        let destination = Destination::new(&graph);
        Self {
            graph,
            destination,
            nodes: Arc::new(RwLock::new(Vec::new())),
        }
    }

    pub fn capabilities(&self) -> Capabilities {
        self.graph.capabilities()
    }

    pub fn sample_rate_hz(&self) -> f32 {
        self.graph.sample_rate_hz()
    }

    pub fn destination(&self) -> &Destination {
        &self.destination
    }

    /// Number of nodes created through this context, not counting the destination.
    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    fn require(&self, present: bool, primitive: &'static str) -> Result<(), EngineError> {
        if present {
            Ok(())
        } else {
            Err(EngineError::Unsupported { primitive })
        }
    }

    fn register<N: Source>(&self, node: N) -> N {
        write_lock(&self.nodes).push(node.output().clone());
        node
    }

    pub fn create_constant_source(&self) -> Result<ConstantSource, EngineError> {
        self.require(self.capabilities().constant_source, "constant source")?;
        Ok(self.register(ConstantSource::new(&self.graph)))
    }

    pub fn create_buffer(&self, len: usize) -> Result<AudioBuffer, EngineError> {
        self.require(self.capabilities().buffer_source, "audio buffer")?;
        Ok(AudioBuffer::new(len))
    }

    pub fn create_buffer_source(&self, buffer: &AudioBuffer) -> Result<BufferSource, EngineError> {
        self.require(self.capabilities().buffer_source, "buffer source")?;
        Ok(self.register(BufferSource::new(&self.graph, buffer)))
    }

    pub fn create_low_pass(&self) -> Result<LowPass, EngineError> {
        self.require(self.capabilities().filter, "low pass filter")?;
        Ok(self.register(LowPass::new(&self.graph)))
    }

    pub fn create_oscillator(&self) -> Result<Oscillator, EngineError> {
        self.require(self.capabilities().tone, "oscillator")?;
        Ok(self.register(Oscillator::new(&self.graph)))
    }

    pub fn create_gain(&self) -> Result<Gain, EngineError> {
        self.require(self.capabilities().tone, "gain")?;
        Ok(self.register(Gain::new(&self.graph)))
    }

    /// A renderer that can be moved to the audio thread. Any number of renderers may exist but
    /// each rendered block advances the whole graph, so normally there is one.
    pub fn renderer(&self) -> Renderer {
        Renderer {
            graph: self.graph.clone(),
            output: self.destination.input().clone(),
            nodes: Arc::clone(&self.nodes),
            buf: Vec::new(),
        }
    }

    /// Render the next block offline.
    pub fn render_block(&self, num_samples: usize) -> Vec<f32> {
        let mut out = Vec::new();
        self.renderer().render_into(num_samples, &mut out);
        out
    }
}

/// Pulls blocks of samples out of the destination of a context.
pub struct Renderer {
    graph: Graph,
    output: Input,
    nodes: Arc<RwLock<Vec<NodeOutput>>>,
    buf: Vec<NodeOutput>,
}

impl Renderer {
    pub fn sample_rate_hz(&self) -> f32 {
        self.graph.sample_rate_hz()
    }

    /// Clears `out` and fills it with the next `num_samples` samples.
    pub fn render_into(&mut self, num_samples: usize, out: &mut Vec<f32>) {
        let ctx = SigCtx {
            sample_rate_hz: self.graph.sample_rate_hz(),
            batch_index: self.graph.next_batch_index(),
            num_samples,
        };
        {
            // Nodes are only ever appended.
            let nodes = read_lock(&self.nodes);
            if nodes.len() > self.buf.len() {
                self.buf.extend(nodes[self.buf.len()..].iter().cloned());
            }
        }
        // Advance nodes that nothing audible depends on so that their state keeps moving.
        // Outputs are cached per block so nothing is computed twice.
        for node in self.buf.iter_mut() {
            let _ = node.sample(&ctx);
        }
        self.output.sample(&ctx).clone_to_vec(out);
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::graph::Sink;

    const SAMPLE_RATE_HZ: f32 = 48_000.0;

    #[test]
    fn missing_primitives_are_reported() {
        let ctx = AudioContext::new(SAMPLE_RATE_HZ, Capabilities::NONE);
        assert!(matches!(
            ctx.create_constant_source(),
            Err(EngineError::Unsupported { .. })
        ));
        assert!(matches!(
            ctx.create_buffer(1),
            Err(EngineError::Unsupported { .. })
        ));
        assert!(matches!(
            ctx.create_oscillator(),
            Err(EngineError::Unsupported { .. })
        ));
        assert_eq!(ctx.node_count(), 0);
    }

    #[test]
    fn constant_source_reaches_destination() {
        let ctx = AudioContext::new(SAMPLE_RATE_HZ, Capabilities::MODERN);
        let source = ctx.create_constant_source().unwrap();
        source.offset().set_value(0.25);
        source.connect(ctx.destination()).unwrap();
        assert_eq!(ctx.render_block(4), vec![0.25; 4]);
    }

    #[test]
    fn repeated_connections_are_idempotent() {
        let ctx = AudioContext::new(SAMPLE_RATE_HZ, Capabilities::MODERN);
        let source = ctx.create_constant_source().unwrap();
        source.connect(ctx.destination()).unwrap();
        source.connect(ctx.destination()).unwrap();
        assert_eq!(ctx.destination().num_sources(), 1);
        assert_eq!(ctx.render_block(2), vec![1.0; 2]);
    }

    #[test]
    fn param_value_is_intrinsic_plus_connections() {
        let ctx = AudioContext::new(SAMPLE_RATE_HZ, Capabilities::MODERN);
        let a = ctx.create_constant_source().unwrap();
        let b = ctx.create_constant_source().unwrap();
        a.offset().set_value(2.0);
        b.offset().set_value(0.5);
        a.connect(b.offset()).unwrap();
        b.connect(ctx.destination()).unwrap();
        assert_eq!(ctx.render_block(3), vec![2.5; 3]);
    }

    #[test]
    fn gain_clamps_at_zero() {
        let ctx = AudioContext::new(SAMPLE_RATE_HZ, Capabilities::MODERN);
        let source = ctx.create_constant_source().unwrap();
        let gain = ctx.create_gain().unwrap();
        let control = ctx.create_constant_source().unwrap();
        control.offset().set_value(-3.0);
        gain.gain().set_value(0.0);
        source.connect(gain.input()).unwrap();
        control.connect(gain.gain()).unwrap();
        gain.connect(ctx.destination()).unwrap();
        assert_eq!(ctx.render_block(2), vec![0.0; 2]);
    }

    #[test]
    fn cycles_through_params_are_rejected() {
        let ctx = AudioContext::new(SAMPLE_RATE_HZ, Capabilities::MODERN);
        let filter = ctx.create_low_pass().unwrap();
        let gain = ctx.create_gain().unwrap();
        filter.connect(gain.input()).unwrap();
        assert!(matches!(
            gain.connect(filter.cutoff_hz()),
            Err(EngineError::Cycle { .. })
        ));
        assert_eq!(filter.cutoff_hz().num_connections(), 0);
    }

    #[test]
    fn direct_only_engines_refuse_param_connections() {
        let ctx = AudioContext::new(SAMPLE_RATE_HZ, Capabilities::DIRECT_ONLY);
        let source = ctx.create_constant_source().unwrap();
        let gain = ctx.create_gain().unwrap();
        assert_eq!(
            gain.gain().accept(source.output()),
            Err(EngineError::ParamConnectionUnsupported { param: "gain" })
        );
        source.connect(gain.input()).unwrap();
    }

    #[test]
    fn looping_buffer_repeats() {
        let ctx = AudioContext::new(SAMPLE_RATE_HZ, Capabilities::LEGACY);
        assert!(ctx.create_constant_source().is_err());
        let buffer = ctx.create_buffer(2).unwrap();
        buffer.set(0, 1.0);
        buffer.set(1, 2.0);
        let source = ctx.create_buffer_source(&buffer).unwrap();
        source.set_loop(true);
        source.connect(ctx.destination()).unwrap();
        assert_eq!(ctx.render_block(5), vec![1.0, 2.0, 1.0, 2.0, 1.0]);
        buffer.set(1, 3.0);
        assert_eq!(ctx.render_block(3), vec![3.0, 1.0, 3.0]);
    }

    #[test]
    fn buffer_without_loop_plays_once() {
        let ctx = AudioContext::new(SAMPLE_RATE_HZ, Capabilities::LEGACY);
        let buffer = ctx.create_buffer(2).unwrap();
        buffer.set(0, 1.0);
        buffer.set(1, 2.0);
        let source = ctx.create_buffer_source(&buffer).unwrap();
        source.connect(ctx.destination()).unwrap();
        assert_eq!(ctx.render_block(4), vec![1.0, 2.0, 0.0, 0.0]);
    }

    #[test]
    fn unconnected_nodes_still_advance() {
        let ctx = AudioContext::new(SAMPLE_RATE_HZ, Capabilities::MODERN);
        let source = ctx.create_constant_source().unwrap();
        let filter = ctx.create_low_pass().unwrap();
        source.connect(filter.input()).unwrap();
        ctx.render_block(SAMPLE_RATE_HZ as usize);
        assert!((filter.current_output() - 1.0).abs() < 1e-3);
        assert_eq!(ctx.render_block(1), vec![0.0]);
    }

    #[test]
    fn oscillator_detune_shifts_pitch() {
        let ctx = AudioContext::new(SAMPLE_RATE_HZ, Capabilities::MODERN);
        let osc = ctx.create_oscillator().unwrap();
        osc.set_waveform(crate::Waveform::Saw);
        osc.frequency().set_value(SAMPLE_RATE_HZ / 4.0);
        osc.detune().set_value(1200.0);
        osc.connect(ctx.destination()).unwrap();
        // An octave up from a quarter of the sample rate is the nyquist frequency.
        let out = ctx.render_block(4);
        for (x, expected) in out.iter().zip([-1.0, 0.0, -1.0, 0.0]) {
            assert!((x - expected).abs() < 1e-4, "{:?}", out);
        }
    }
}
