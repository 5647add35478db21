use crate::{
    fallback::CompatibilityFallback,
    mapping::{self, GesturePosition},
    range::NoteRange,
    smoothed_parameter::{self, SmoothedParameter},
};
use serde::{Deserialize, Serialize};
use theremin_core::{AudioContext, EngineError, Gain, Oscillator, Source, Waveform};

pub const DEFAULT_PITCH_TIME_CONSTANT_S: f32 = 0.05;
pub const DEFAULT_LEVEL_TIME_CONSTANT_S: f32 = 0.02;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct InstrumentConfig {
    pub pitch_time_constant_s: f32,
    pub level_time_constant_s: f32,
    pub waveform: Waveform,
}

impl InstrumentConfig {
    pub fn validate(&self) -> Result<(), EngineError> {
        smoothed_parameter::check_time_constant(self.pitch_time_constant_s)?;
        smoothed_parameter::check_time_constant(self.level_time_constant_s)
    }
}

impl Default for InstrumentConfig {
    fn default() -> Self {
        Self {
            pitch_time_constant_s: DEFAULT_PITCH_TIME_CONSTANT_S,
            level_time_constant_s: DEFAULT_LEVEL_TIME_CONSTANT_S,
            waveform: Waveform::default(),
        }
    }
}

/// The sound-producing half of an instrument. Implementations decide how control values reach
/// the graph.
pub trait Voice {
    /// Frequency of the low note. Applied without smoothing.
    fn set_base_freq_hz(&self, freq_hz: f32);

    fn set_detune_cents(&self, detune_cents: f32);

    fn set_level(&self, gain: f32);

    /// Drop the level to zero with no ramp.
    fn silence(&self);
}

/// Tracks the range, the gesture and the mute flag, and turns them into voice settings.
pub struct Performance<V: Voice> {
    voice: V,
    range: NoteRange,
    gesture: GesturePosition,
    muted: bool,
}

impl<V: Voice> Performance<V> {
    /// Starts muted.
    pub(crate) fn new(voice: V, range: NoteRange) -> Self {
        let performance = Self {
            voice,
            range,
            gesture: GesturePosition::default(),
            muted: true,
        };
        performance
            .voice
            .set_base_freq_hz(mapping::frequency_of(range.low()));
        performance.apply_x();
        performance.voice.silence();
        performance
    }

    fn apply_x(&self) {
        self.voice
            .set_detune_cents(mapping::detune_cents(self.gesture.x, self.range));
    }

    fn apply_y(&self) {
        self.voice.set_level(mapping::gain_of(self.gesture.y));
    }

    pub fn voice(&self) -> &V {
        &self.voice
    }

    pub fn range(&self) -> NoteRange {
        self.range
    }

    pub fn gesture(&self) -> GesturePosition {
        self.gesture
    }

    pub fn is_muted(&self) -> bool {
        self.muted
    }

    /// Ignored while muted.
    pub fn set_gesture(&mut self, x: f32, y: f32) {
        if self.muted {
            return;
        }
        self.gesture = GesturePosition { x, y };
        self.apply_x();
        self.apply_y();
    }

    /// Ignored while muted.
    pub fn set_x(&mut self, x: f32) {
        if self.muted {
            return;
        }
        self.gesture.x = x;
        self.apply_x();
    }

    /// Ignored while muted.
    pub fn set_y(&mut self, y: f32) {
        if self.muted {
            return;
        }
        self.gesture.y = y;
        self.apply_y();
    }

    /// The base frequency jumps to the new low note and the current horizontal position is
    /// re-evaluated against the new width, so the pointer keeps its place on the surface.
    pub fn set_range(&mut self, range: NoteRange) {
        log::debug!("range {}..{}", range.low(), range.high());
        self.range = range;
        self.voice
            .set_base_freq_hz(mapping::frequency_of(range.low()));
        self.apply_x();
    }

    pub fn mute(&mut self) {
        self.muted = true;
        self.gesture.y = 0.0;
        self.voice.silence();
    }

    /// Sound resumes with the next gesture.
    pub fn unmute(&mut self) {
        self.muted = false;
    }
}

/// Oscillator and gain driven through smoothed control values.
pub struct SmoothedVoice {
    oscillator: Oscillator,
    gain: Gain,
    pitch: SmoothedParameter,
    level: SmoothedParameter,
}

impl SmoothedVoice {
    pub fn new(ctx: &AudioContext, config: &InstrumentConfig) -> Result<Self, EngineError> {
        let oscillator = ctx.create_oscillator()?;
        oscillator.set_waveform(config.waveform);
        let gain = ctx.create_gain()?;
        gain.gain().set_value(0.0);
        let pitch = SmoothedParameter::new(ctx, config.pitch_time_constant_s)?;
        pitch.connect(oscillator.detune())?;
        let level = SmoothedParameter::new(ctx, config.level_time_constant_s)?;
        level.connect(gain.gain())?;
        oscillator.connect(gain.input())?;
        gain.connect(ctx.destination())?;
        Ok(Self {
            oscillator,
            gain,
            pitch,
            level,
        })
    }

    pub fn oscillator(&self) -> &Oscillator {
        &self.oscillator
    }

    pub fn gain(&self) -> &Gain {
        &self.gain
    }

    pub fn pitch(&self) -> &SmoothedParameter {
        &self.pitch
    }

    pub fn level(&self) -> &SmoothedParameter {
        &self.level
    }
}

impl Voice for SmoothedVoice {
    fn set_base_freq_hz(&self, freq_hz: f32) {
        self.oscillator.frequency().set_value(freq_hz);
    }

    fn set_detune_cents(&self, detune_cents: f32) {
        self.pitch.set(detune_cents);
    }

    fn set_level(&self, gain: f32) {
        self.level.set(gain);
    }

    fn silence(&self) {
        self.level.reset(0.0);
    }
}

pub type StandardInstrument = Performance<SmoothedVoice>;

impl StandardInstrument {
    pub fn build(
        ctx: &AudioContext,
        range: NoteRange,
        config: &InstrumentConfig,
    ) -> Result<Self, EngineError> {
        config.validate()?;
        Ok(Performance::new(SmoothedVoice::new(ctx, config)?, range))
    }
}

/// A theremin voice plus its controls. The variant is chosen once from the engine's
/// capabilities.
pub enum Instrument {
    Standard(StandardInstrument),
    Fallback(CompatibilityFallback),
}

macro_rules! dispatch {
    ($self:expr, $i:ident => $body:expr) => {
        match $self {
            Instrument::Standard($i) => $body,
            Instrument::Fallback($i) => $body,
        }
    };
}

impl Instrument {
    pub fn new(
        ctx: &AudioContext,
        range: NoteRange,
        config: &InstrumentConfig,
    ) -> Result<Self, EngineError> {
        config.validate()?;
        let capabilities = ctx.capabilities();
        if !capabilities.tone {
            return Err(EngineError::Unsupported {
                primitive: "oscillator",
            });
        }
        if capabilities.param_connection && capabilities.has_steady_value() && capabilities.filter
        {
            log::info!("building smoothed instrument");
            Ok(Self::Standard(StandardInstrument::build(ctx, range, config)?))
        } else {
            log::info!("engine cannot drive params with signals; building direct instrument");
            Ok(Self::Fallback(CompatibilityFallback::build(
                ctx, range, config,
            )?))
        }
    }

    pub fn is_fallback(&self) -> bool {
        matches!(self, Self::Fallback(_))
    }

    pub fn range(&self) -> NoteRange {
        dispatch!(self, i => i.range())
    }

    pub fn gesture(&self) -> GesturePosition {
        dispatch!(self, i => i.gesture())
    }

    pub fn is_muted(&self) -> bool {
        dispatch!(self, i => i.is_muted())
    }

    pub fn set_gesture(&mut self, x: f32, y: f32) {
        dispatch!(self, i => i.set_gesture(x, y))
    }

    pub fn set_x(&mut self, x: f32) {
        dispatch!(self, i => i.set_x(x))
    }

    pub fn set_y(&mut self, y: f32) {
        dispatch!(self, i => i.set_y(y))
    }

    pub fn set_range(&mut self, range: NoteRange) {
        dispatch!(self, i => i.set_range(range))
    }

    pub fn mute(&mut self) {
        dispatch!(self, i => i.mute())
    }

    pub fn unmute(&mut self) {
        dispatch!(self, i => i.unmute())
    }

    /// The oscillator of either variant.
    pub fn oscillator(&self) -> &Oscillator {
        match self {
            Self::Standard(i) => i.voice().oscillator(),
            Self::Fallback(i) => i.voice().oscillator(),
        }
    }

    pub fn gain(&self) -> &Gain {
        match self {
            Self::Standard(i) => i.voice().gain(),
            Self::Fallback(i) => i.voice().gain(),
        }
    }
}

impl From<StandardInstrument> for Instrument {
    fn from(instrument: StandardInstrument) -> Self {
        Self::Standard(instrument)
    }
}

impl From<CompatibilityFallback> for Instrument {
    fn from(instrument: CompatibilityFallback) -> Self {
        Self::Fallback(instrument)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use theremin_core::Capabilities;

    const SAMPLE_RATE_HZ: f32 = 48_000.0;

    fn standard(range: NoteRange) -> (AudioContext, StandardInstrument) {
        let ctx = AudioContext::new(SAMPLE_RATE_HZ, Capabilities::MODERN);
        let instrument =
            StandardInstrument::build(&ctx, range, &InstrumentConfig::default()).unwrap();
        (ctx, instrument)
    }

    fn seconds(s: f32) -> usize {
        (SAMPLE_RATE_HZ * s) as usize
    }

    #[test]
    fn variant_follows_capabilities() {
        let range = NoteRange::default();
        let config = InstrumentConfig::default();
        let ctx = AudioContext::new(SAMPLE_RATE_HZ, Capabilities::MODERN);
        assert!(!Instrument::new(&ctx, range, &config).unwrap().is_fallback());
        let ctx = AudioContext::new(SAMPLE_RATE_HZ, Capabilities::LEGACY);
        assert!(!Instrument::new(&ctx, range, &config).unwrap().is_fallback());
        let ctx = AudioContext::new(SAMPLE_RATE_HZ, Capabilities::DIRECT_ONLY);
        assert!(Instrument::new(&ctx, range, &config).unwrap().is_fallback());
        let ctx = AudioContext::new(SAMPLE_RATE_HZ, Capabilities::NONE);
        assert!(matches!(
            Instrument::new(&ctx, range, &config),
            Err(EngineError::Unsupported { .. })
        ));
    }

    #[test]
    fn invalid_time_constants_add_no_nodes() {
        let range = NoteRange::default();
        for capabilities in [Capabilities::MODERN, Capabilities::DIRECT_ONLY] {
            let ctx = AudioContext::new(SAMPLE_RATE_HZ, capabilities);
            for config in [
                InstrumentConfig {
                    level_time_constant_s: 0.0,
                    ..InstrumentConfig::default()
                },
                InstrumentConfig {
                    pitch_time_constant_s: f32::NAN,
                    ..InstrumentConfig::default()
                },
            ] {
                assert!(matches!(
                    Instrument::new(&ctx, range, &config),
                    Err(EngineError::InvalidTimeConstant(_))
                ));
            }
            assert_eq!(ctx.node_count(), 0);
        }
    }

    #[test]
    fn waveform_comes_from_config() {
        let ctx = AudioContext::new(SAMPLE_RATE_HZ, Capabilities::MODERN);
        let config = InstrumentConfig {
            waveform: Waveform::Saw,
            ..InstrumentConfig::default()
        };
        let instrument = Instrument::new(&ctx, NoteRange::default(), &config).unwrap();
        assert_eq!(instrument.oscillator().waveform(), Waveform::Saw);
    }

    #[test]
    fn starts_muted_and_silent() {
        let (ctx, mut instrument) = standard(NoteRange::default());
        assert!(instrument.is_muted());
        instrument.set_gesture(0.5, 1.0);
        assert_eq!(instrument.gesture(), GesturePosition::default());
        assert!(ctx.render_block(seconds(0.1)).iter().all(|&x| x == 0.0));
    }

    #[test]
    fn base_frequency_is_the_low_note() {
        let (_ctx, instrument) = standard(NoteRange::new(57, 69).unwrap());
        assert_eq!(
            instrument.voice().oscillator().frequency().value(),
            mapping::frequency_of(57)
        );
    }

    #[test]
    fn gesture_drives_pitch_and_level() {
        let (ctx, mut instrument) = standard(NoteRange::new(60, 84).unwrap());
        instrument.unmute();
        instrument.set_gesture(0.0, 0.0);
        ctx.render_block(seconds(0.1));
        assert_eq!(instrument.voice().pitch().output(), 0.0);
        assert_eq!(instrument.voice().level().output(), 0.0);
        instrument.set_gesture(1.0, 1.0);
        assert_eq!(instrument.voice().pitch().get(), 2400.0);
        assert_eq!(instrument.voice().level().get(), 1.0);
        ctx.render_block(seconds(0.01));
        let pitch = instrument.voice().pitch().output();
        let level = instrument.voice().level().output();
        assert!(pitch > 0.0 && pitch < 2400.0, "{}", pitch);
        assert!(level > 0.0 && level < 1.0, "{}", level);
        ctx.render_block(seconds(0.5));
        assert!((instrument.voice().pitch().output() - 2400.0).abs() < 1.0);
        assert!((instrument.voice().level().output() - 1.0).abs() < 1e-3);
        assert!(ctx.render_block(seconds(0.01)).iter().any(|&x| x != 0.0));
    }

    #[test]
    fn repeated_gestures_are_idempotent() {
        let (ctx, mut instrument) = standard(NoteRange::default());
        instrument.unmute();
        instrument.set_gesture(0.3, 0.6);
        ctx.render_block(seconds(0.05));
        let pitch = instrument.voice().pitch().get();
        let level = instrument.voice().level().get();
        instrument.set_gesture(0.3, 0.6);
        assert_eq!(instrument.voice().pitch().get(), pitch);
        assert_eq!(instrument.voice().level().get(), level);
        assert_eq!(instrument.gesture(), GesturePosition::new(0.3, 0.6));
    }

    #[test]
    fn mute_is_immediate() {
        let (ctx, mut instrument) = standard(NoteRange::default());
        instrument.unmute();
        instrument.set_gesture(0.5, 1.0);
        ctx.render_block(seconds(0.2));
        assert!(instrument.voice().level().output() > 0.99);
        instrument.mute();
        assert!(instrument.is_muted());
        assert_eq!(instrument.gesture().y, 0.0);
        assert_eq!(instrument.voice().level().output(), 0.0);
        assert_eq!(ctx.render_block(1), vec![0.0]);
        assert_eq!(instrument.voice().level().output(), 0.0);
    }

    #[test]
    fn unmute_waits_for_the_next_gesture() {
        let (ctx, mut instrument) = standard(NoteRange::default());
        instrument.unmute();
        instrument.set_gesture(0.5, 1.0);
        instrument.mute();
        instrument.unmute();
        assert!(!instrument.is_muted());
        ctx.render_block(seconds(0.1));
        assert_eq!(instrument.voice().level().output(), 0.0);
        instrument.set_y(0.5);
        assert_eq!(instrument.voice().level().get(), 0.25);
    }

    #[test]
    fn range_change_keeps_the_pointer_in_place() {
        let (_ctx, mut instrument) = standard(NoteRange::new(60, 72).unwrap());
        instrument.unmute();
        instrument.set_gesture(0.5, 0.5);
        assert_eq!(instrument.voice().pitch().get(), 600.0);
        instrument.set_range(NoteRange::new(48, 60).unwrap());
        assert_eq!(instrument.voice().pitch().get(), 600.0);
        assert_eq!(
            instrument.voice().oscillator().frequency().value(),
            mapping::frequency_of(48)
        );
        instrument.set_range(NoteRange::new(48, 72).unwrap());
        assert_eq!(instrument.voice().pitch().get(), 1200.0);
        assert_eq!(instrument.gesture(), GesturePosition::new(0.5, 0.5));
    }

    #[test]
    fn single_axis_updates() {
        let (_ctx, mut instrument) = standard(NoteRange::new(60, 72).unwrap());
        instrument.unmute();
        instrument.set_gesture(0.25, 0.5);
        instrument.set_x(1.0);
        assert_eq!(instrument.voice().pitch().get(), 1200.0);
        assert_eq!(instrument.voice().level().get(), 0.25);
        instrument.set_y(1.0);
        assert_eq!(instrument.voice().pitch().get(), 1200.0);
        assert_eq!(instrument.voice().level().get(), 1.0);
    }

    #[test]
    fn unclamped_coordinates_pass_through() {
        let (_ctx, mut instrument) = standard(NoteRange::new(60, 72).unwrap());
        instrument.unmute();
        instrument.set_gesture(1.5, -0.5);
        assert_eq!(instrument.voice().pitch().get(), 1800.0);
        assert_eq!(instrument.voice().level().get(), 0.25);
    }

    #[test]
    fn legacy_engines_build_the_smoothed_instrument() {
        let ctx = AudioContext::new(SAMPLE_RATE_HZ, Capabilities::LEGACY);
        let mut instrument =
            Instrument::new(&ctx, NoteRange::default(), &InstrumentConfig::default()).unwrap();
        instrument.unmute();
        instrument.set_gesture(0.5, 1.0);
        ctx.render_block(seconds(0.2));
        assert!(ctx.render_block(seconds(0.01)).iter().any(|&x| x != 0.0));
        instrument.mute();
        assert_eq!(ctx.render_block(4), vec![0.0; 4]);
    }
}
