mod sig;
pub use sig::{
    Buf, ConstBuf, Sig, SigBoxed, SigCtx, SigSampleIntoBufT, SigShared, SigT,
    SigVar, sig_boxed, sig_shared, sig_var,
};
mod error;
pub use error::EngineError;
mod capabilities;
pub use capabilities::Capabilities;
mod graph;
pub use graph::{Input, NodeId, NodeOutput, Sink, Source};
mod param;
pub use param::{AudioParam, ParamRange};
mod constant_source;
pub use constant_source::ConstantSource;
mod buffer_source;
pub use buffer_source::{AudioBuffer, BufferSource};
mod low_pass;
pub use low_pass::LowPass;
mod oscillator;
pub use oscillator::{Oscillator, Waveform, detuned_freq_hz};
mod gain;
pub use gain::Gain;
mod destination;
pub use destination::Destination;
mod context;
pub use context::{AudioContext, Renderer};
