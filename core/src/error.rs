use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum EngineError {
    #[error("the audio engine has no {primitive} primitive")]
    Unsupported { primitive: &'static str },
    #[error("the audio engine cannot route a signal into a parameter ({param})")]
    ParamConnectionUnsupported { param: &'static str },
    #[error("connecting {from:?} to {to:?} would create a cycle")]
    Cycle { from: crate::NodeId, to: crate::NodeId },
    #[error("time constant must be positive and finite (got {0})")]
    InvalidTimeConstant(f32),
}
