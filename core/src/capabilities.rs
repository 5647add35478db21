/// The primitives a host audio engine offers. A context's capabilities are fixed when it is created
/// and components check them once, at construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Capabilities {
    /// A native node producing a constant, writable signal.
    pub constant_source: bool,
    /// Sample buffers and a looping buffer player. Older engines emulate a constant signal with
    /// these.
    pub buffer_source: bool,
    /// Whether a node output may be connected to another node's parameter. Engines without this
    /// only allow parameters to be assigned directly.
    pub param_connection: bool,
    /// Oscillator and gain nodes.
    pub tone: bool,
    /// Low pass filter nodes.
    pub filter: bool,
}

impl Capabilities {
    pub const MODERN: Self = Self {
        constant_source: true,
        buffer_source: true,
        param_connection: true,
        tone: true,
        filter: true,
    };

    pub const LEGACY: Self = Self {
        constant_source: false,
        ..Self::MODERN
    };

    pub const DIRECT_ONLY: Self = Self {
        param_connection: false,
        ..Self::MODERN
    };

    pub const NONE: Self = Self {
        constant_source: false,
        buffer_source: false,
        param_connection: false,
        tone: false,
        filter: false,
    };

    /// Whether a held control value can be synthesized at all on this engine.
    pub fn has_steady_value(&self) -> bool {
        self.constant_source || self.buffer_source
    }
}

impl Default for Capabilities {
    fn default() -> Self {
        Self::MODERN
    }
}
