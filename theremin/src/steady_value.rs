use theremin_core::{
    AudioBuffer, AudioContext, BufferSource, ConstantSource, EngineError, NodeOutput, Source,
};

/// A single control value held as a signal in the audio graph, readable and writable from the
/// control thread. The realisation is picked once from the engine's capabilities.
pub enum SteadyValue {
    /// A constant source node whose offset is the value.
    Modern { source: ConstantSource },
    /// A one sample buffer looped forever. Used on engines without constant sources.
    Legacy {
        buffer: AudioBuffer,
        source: BufferSource,
    },
}

impl SteadyValue {
    pub fn new(ctx: &AudioContext) -> Result<Self, EngineError> {
        let capabilities = ctx.capabilities();
        let steady_value = if capabilities.constant_source {
            let source = ctx.create_constant_source()?;
            Self::Modern { source }
        } else if capabilities.buffer_source {
            let buffer = ctx.create_buffer(1)?;
            let source = ctx.create_buffer_source(&buffer)?;
            source.set_loop(true);
            Self::Legacy { buffer, source }
        } else {
            return Err(EngineError::Unsupported {
                primitive: "constant source or buffer source",
            });
        };
        steady_value.set(0.0);
        Ok(steady_value)
    }

    pub fn is_legacy(&self) -> bool {
        matches!(self, Self::Legacy { .. })
    }

    /// Takes effect from the next block the engine renders.
    pub fn set(&self, value: f32) {
        match self {
            Self::Modern { source } => source.offset().set_value(value),
            Self::Legacy { buffer, .. } => buffer.set(0, value),
        }
    }

    pub fn get(&self) -> f32 {
        match self {
            Self::Modern { source } => source.offset().value(),
            Self::Legacy { buffer, .. } => buffer.get(0),
        }
    }
}

impl Source for SteadyValue {
    fn output(&self) -> &NodeOutput {
        match self {
            Self::Modern { source } => source.output(),
            Self::Legacy { source, .. } => source.output(),
        }
    }
}
