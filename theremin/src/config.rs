use crate::{
    instrument::{DEFAULT_LEVEL_TIME_CONSTANT_S, DEFAULT_PITCH_TIME_CONSTANT_S, InstrumentConfig},
    range::{NoteRange, RangeError},
};
use serde::{Deserialize, Serialize};
use theremin_core::Waveform;

/// Which edge of the surface is silent.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LevelDirection {
    /// Silent at the top edge (y = 0), loudest at the bottom.
    #[default]
    TopToBottom,
    /// Silent at the bottom edge (y = 1), loudest at the top.
    BottomToTop,
}

impl LevelDirection {
    pub fn level_y(self, y: f32) -> f32 {
        match self {
            Self::TopToBottom => y,
            Self::BottomToTop => 1.0 - y,
        }
    }
}

/// Startup settings. Any field missing from a config file takes its default.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub low: i32,
    pub high: i32,
    pub pitch_time_constant_s: f32,
    pub level_time_constant_s: f32,
    pub waveform: Waveform,
    pub level_direction: LevelDirection,
}

impl Default for Config {
    fn default() -> Self {
        let range = NoteRange::default();
        Self {
            low: range.low(),
            high: range.high(),
            pitch_time_constant_s: DEFAULT_PITCH_TIME_CONSTANT_S,
            level_time_constant_s: DEFAULT_LEVEL_TIME_CONSTANT_S,
            waveform: Waveform::default(),
            level_direction: LevelDirection::default(),
        }
    }
}

impl Config {
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    pub fn range(&self) -> Result<NoteRange, RangeError> {
        NoteRange::new(self.low, self.high)
    }

    pub fn instrument_config(&self) -> InstrumentConfig {
        InstrumentConfig {
            pitch_time_constant_s: self.pitch_time_constant_s,
            level_time_constant_s: self.level_time_constant_s,
            waveform: self.waveform,
        }
    }
}
