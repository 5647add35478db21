use crate::steady_value::SteadyValue;
use theremin_core::{AudioContext, EngineError, LowPass, NodeOutput, Source};

/// A steady value passed through a low pass filter so that step changes in the commanded value
/// reach the graph as smooth ramps.
pub struct SmoothedParameter {
    value: SteadyValue,
    filter: LowPass,
}

/// Time constants must be positive and finite.
pub fn check_time_constant(time_constant_s: f32) -> Result<(), EngineError> {
    if time_constant_s > 0.0 && time_constant_s.is_finite() {
        Ok(())
    } else {
        Err(EngineError::InvalidTimeConstant(time_constant_s))
    }
}

impl SmoothedParameter {
    pub fn new(ctx: &AudioContext, time_constant_s: f32) -> Result<Self, EngineError> {
        check_time_constant(time_constant_s)?;
        let value = SteadyValue::new(ctx)?;
        let filter = ctx.create_low_pass()?;
        filter.cutoff_hz().set_value(1.0 / time_constant_s);
        value.connect(filter.input())?;
        log::debug!(
            "smoothed parameter with time constant {}s ({})",
            time_constant_s,
            if value.is_legacy() { "legacy" } else { "modern" },
        );
        Ok(Self { value, filter })
    }

    /// The output moves towards `value` from the next rendered block.
    pub fn set(&self, value: f32) {
        self.value.set(value);
    }

    /// The commanded value, which the output may still be approaching.
    pub fn get(&self) -> f32 {
        self.value.get()
    }

    /// Jump the output to `value` without a ramp.
    pub fn reset(&self, value: f32) {
        self.value.set(value);
        self.filter.reset(value);
    }

    /// The filtered value most recently rendered by the engine.
    pub fn output(&self) -> f32 {
        self.filter.current_output()
    }
}

impl Source for SmoothedParameter {
    fn output(&self) -> &NodeOutput {
        self.filter.output()
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use theremin_core::Capabilities;

    const SAMPLE_RATE_HZ: f32 = 48_000.0;

    fn settle(capabilities: Capabilities, time_constant_s: f32) -> Vec<f32> {
        let ctx = AudioContext::new(SAMPLE_RATE_HZ, capabilities);
        let param = SmoothedParameter::new(&ctx, time_constant_s).unwrap();
        param.connect(ctx.destination()).unwrap();
        assert_eq!(ctx.render_block(16), vec![0.0; 16]);
        param.set(1.0);
        ctx.render_block((SAMPLE_RATE_HZ * time_constant_s * 3.0) as usize)
    }

    #[test]
    fn rejects_bad_time_constants() {
        let ctx = AudioContext::new(SAMPLE_RATE_HZ, Capabilities::MODERN);
        for time_constant_s in [0.0, -1.0, f32::NAN, f32::INFINITY] {
            assert!(matches!(
                SmoothedParameter::new(&ctx, time_constant_s),
                Err(EngineError::InvalidTimeConstant(_))
            ));
        }
    }

    #[test]
    fn step_settles_within_three_time_constants() {
        let time_constant_s = 0.05;
        let out = settle(Capabilities::MODERN, time_constant_s);
        let first_time_constant = (SAMPLE_RATE_HZ * time_constant_s) as usize;
        for pair in out[..first_time_constant].windows(2) {
            assert!(pair[1] > pair[0], "{:?}", pair);
        }
        for pair in out.windows(2) {
            assert!(pair[1] >= pair[0], "{:?}", pair);
        }
        let last = out[out.len() - 1];
        assert!((last - 1.0).abs() < 0.05, "{}", last);
        assert!(last <= 1.0 + 1e-6, "{}", last);
    }

    #[test]
    fn get_returns_the_commanded_value() {
        let ctx = AudioContext::new(SAMPLE_RATE_HZ, Capabilities::MODERN);
        let param = SmoothedParameter::new(&ctx, 0.02).unwrap();
        param.set(0.5);
        assert_eq!(param.get(), 0.5);
        ctx.render_block(1);
        assert!(param.output() < 0.5);
    }

    #[test]
    fn reset_skips_the_ramp() {
        let ctx = AudioContext::new(SAMPLE_RATE_HZ, Capabilities::MODERN);
        let param = SmoothedParameter::new(&ctx, 0.02).unwrap();
        param.connect(ctx.destination()).unwrap();
        param.set(1.0);
        ctx.render_block(4800);
        assert!(param.output() > 0.9);
        param.reset(0.0);
        assert_eq!(param.output(), 0.0);
        assert_eq!(ctx.render_block(8), vec![0.0; 8]);
    }

    #[test]
    fn legacy_engines_smooth_identically() {
        assert_eq!(
            settle(Capabilities::MODERN, 0.02),
            settle(Capabilities::LEGACY, 0.02)
        );
    }
}
