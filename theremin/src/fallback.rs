use crate::{
    instrument::{InstrumentConfig, Performance, Voice},
    range::NoteRange,
};
use theremin_core::{AudioContext, EngineError, Gain, Oscillator, Source};

/// Oscillator and gain whose parameters are assigned directly. For engines that cannot route a
/// signal into a parameter. Changes are applied at the next block with no smoothing, so fast
/// gestures may click.
pub struct DirectVoice {
    oscillator: Oscillator,
    gain: Gain,
}

impl DirectVoice {
    pub fn new(ctx: &AudioContext, config: &InstrumentConfig) -> Result<Self, EngineError> {
        let oscillator = ctx.create_oscillator()?;
        oscillator.set_waveform(config.waveform);
        let gain = ctx.create_gain()?;
        gain.gain().set_value(0.0);
        oscillator.connect(gain.input())?;
        gain.connect(ctx.destination())?;
        Ok(Self { oscillator, gain })
    }

    pub fn oscillator(&self) -> &Oscillator {
        &self.oscillator
    }

    pub fn gain(&self) -> &Gain {
        &self.gain
    }
}

impl Voice for DirectVoice {
    fn set_base_freq_hz(&self, freq_hz: f32) {
        self.oscillator.frequency().set_value(freq_hz);
    }

    fn set_detune_cents(&self, detune_cents: f32) {
        self.oscillator.detune().set_value(detune_cents);
    }

    fn set_level(&self, gain: f32) {
        self.gain.gain().set_value(gain);
    }

    fn silence(&self) {
        self.gain.gain().set_value(0.0);
    }
}

pub type CompatibilityFallback = Performance<DirectVoice>;

impl CompatibilityFallback {
    pub fn build(
        ctx: &AudioContext,
        range: NoteRange,
        config: &InstrumentConfig,
    ) -> Result<Self, EngineError> {
        Ok(Performance::new(DirectVoice::new(ctx, config)?, range))
    }
}
