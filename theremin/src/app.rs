use crate::{
    config::{Config, LevelDirection},
    instrument::{Instrument, InstrumentConfig},
    range::{NoteRange, RangeError},
};
use std::mem;
use theremin_core::{AudioContext, EngineError};

/// The instrument is built on the first start so that no audio graph exists before the user asks
/// for sound.
pub enum AppState {
    Uninitialized,
    Idle(Instrument),
    Active(Instrument),
}

impl AppState {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Uninitialized => "uninitialized",
            Self::Idle(_) => "idle",
            Self::Active(_) => "active",
        }
    }

    fn instrument_mut(&mut self) -> Option<&mut Instrument> {
        match self {
            Self::Uninitialized => None,
            Self::Idle(instrument) | Self::Active(instrument) => Some(instrument),
        }
    }
}

pub struct ThereminApp {
    ctx: AudioContext,
    instrument_config: InstrumentConfig,
    level_direction: LevelDirection,
    range: NoteRange,
    state: AppState,
}

impl ThereminApp {
    pub fn new(ctx: AudioContext, config: &Config) -> Result<Self, RangeError> {
        Ok(Self {
            ctx,
            instrument_config: config.instrument_config(),
            level_direction: config.level_direction,
            range: config.range()?,
            state: AppState::Uninitialized,
        })
    }

    pub fn state_name(&self) -> &'static str {
        self.state.name()
    }

    pub fn instrument(&self) -> Option<&Instrument> {
        match &self.state {
            AppState::Uninitialized => None,
            AppState::Idle(instrument) | AppState::Active(instrument) => Some(instrument),
        }
    }

    pub fn range(&self) -> NoteRange {
        self.range
    }

    pub fn is_running(&self) -> bool {
        matches!(self.state, AppState::Active(_))
    }

    /// Start or stop sounding. The first call builds the instrument.
    pub fn set_running(&mut self, running: bool) -> Result<(), EngineError> {
        let mut instrument = match mem::replace(&mut self.state, AppState::Uninitialized) {
            AppState::Uninitialized => {
                Instrument::new(&self.ctx, self.range, &self.instrument_config)?
            }
            AppState::Idle(instrument) | AppState::Active(instrument) => instrument,
        };
        self.state = if running {
            instrument.unmute();
            AppState::Active(instrument)
        } else {
            instrument.mute();
            AppState::Idle(instrument)
        };
        log::debug!("theremin {}", self.state.name());
        Ok(())
    }

    /// Pointer position in surface coordinates with y = 0 at the top edge.
    pub fn set_gesture(&mut self, x: f32, y: f32) {
        let level_y = self.level_direction.level_y(y);
        if let Some(instrument) = self.state.instrument_mut() {
            instrument.set_gesture(x, level_y);
        }
    }

    pub fn set_range(&mut self, range: NoteRange) {
        self.range = range;
        if let Some(instrument) = self.state.instrument_mut() {
            instrument.set_range(range);
        }
    }

    /// Moves the low end of the range, keeping it within the range bar limits. Returns the range
    /// actually applied.
    pub fn set_range_low(&mut self, note: i32) -> NoteRange {
        let range = self.range.with_low(note);
        self.set_range(range);
        range
    }

    /// Moves the high end of the range, keeping it within the range bar limits. Returns the range
    /// actually applied.
    pub fn set_range_high(&mut self, note: i32) -> NoteRange {
        let range = self.range.with_high(note);
        self.set_range(range);
        range
    }
}
