pub mod app;
pub mod config;
pub mod fallback;
pub mod instrument;
pub mod mapping;
pub mod range;
pub mod smoothed_parameter;
pub mod steady_value;

pub use app::{AppState, ThereminApp};
pub use config::{Config, LevelDirection};
pub use fallback::{CompatibilityFallback, DirectVoice};
pub use instrument::{
    Instrument, InstrumentConfig, Performance, SmoothedVoice, StandardInstrument, Voice,
};
pub use mapping::GesturePosition;
pub use range::{NoteRange, RangeError};
pub use smoothed_parameter::SmoothedParameter;
pub use steady_value::SteadyValue;
pub use theremin_core::{AudioContext, Capabilities, EngineError, Waveform};
