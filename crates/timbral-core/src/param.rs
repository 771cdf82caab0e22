//! Per-sample parameter ramps for zipper-free control changes.
//!
//! Continuous per-note controls (pressure, timbre, pitch) and global values
//! (filter cutoff) arrive as stepwise changes from the control side. Feeding
//! those steps straight into the audio path produces audible "zipper noise",
//! so every such value goes through a [`ParameterRamp`].
//!
//! ## Curves
//!
//! - [`RampCurve::Exponential`]: one-pole approach with a time constant. Natural
//!   decay, retargets without a corner.
//! - [`RampCurve::Linear`]: constant rate, reaches the target in exactly the
//!   configured time.
//!
//! Neither curve overshoots the target, and retargeting mid-ramp always
//! continues from the current value.
//!
//! ## Usage
//!
//! ```rust
//! use timbral_core::{ParameterRamp, RampCurve};
//!
//! let mut pressure = ParameterRamp::with_config(0.0, RampCurve::Exponential, 48000.0, 0.1);
//! pressure.set_target_value(1.0);
//!
//! // In the audio loop, one value per sample
//! for _ in 0..480 {
//!     let p = pressure.next_value();
//!     assert!(p <= 1.0);
//! }
//! ```

use libm::{expf, powf, roundf};

/// Relative distance below which an exponential ramp snaps onto its target.
const SETTLE_EPSILON: f32 = 1e-5;

/// Shape of the approach from the current value to the target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RampCurve {
    /// One-pole approach: ~63% of the distance per time constant.
    #[default]
    Exponential,
    /// Constant increment, arrives after exactly one time constant.
    Linear,
}

impl RampCurve {
    /// Every curve.
    pub const ALL: [RampCurve; 2] = [RampCurve::Exponential, RampCurve::Linear];

    /// Lowercase name.
    pub const fn name(self) -> &'static str {
        match self {
            RampCurve::Exponential => "exponential",
            RampCurve::Linear => "linear",
        }
    }
}

/// A scalar that moves toward a target value over time.
///
/// A ramp with a zero time constant (the state after [`new`](Self::new)) is
/// instant: [`next_value`](Self::next_value) returns the target.
#[derive(Debug, Clone)]
pub struct ParameterRamp {
    current: f32,
    target: f32,
    curve: RampCurve,
    sample_rate: f32,
    time_constant_s: f32,
    /// Exponential coefficient (0 = frozen, 1 = instant)
    coeff: f32,
    /// Linear increment per sample
    increment: f32,
    /// Linear samples left before the target is reached
    samples_remaining: u32,
}

impl ParameterRamp {
    /// Create an instant (unsmoothed) exponential ramp at `initial`.
    ///
    /// Call [`reset`](Self::reset) to bind a sample rate and time constant.
    pub fn new(initial: f32) -> Self {
        Self {
            current: initial,
            target: initial,
            curve: RampCurve::Exponential,
            sample_rate: 48000.0,
            time_constant_s: 0.0,
            coeff: 1.0,
            increment: 0.0,
            samples_remaining: 0,
        }
    }

    /// Create a fully configured ramp.
    ///
    /// # Arguments
    /// * `initial` - Starting value (current and target)
    /// * `curve` - Approach shape
    /// * `sample_rate` - Sample rate in Hz
    /// * `time_constant_s` - Time constant (exponential) or ramp time (linear) in seconds
    pub fn with_config(
        initial: f32,
        curve: RampCurve,
        sample_rate: f32,
        time_constant_s: f32,
    ) -> Self {
        let mut ramp = Self::new(initial);
        ramp.curve = curve;
        ramp.reset(sample_rate, time_constant_s);
        ramp
    }

    /// Rebind sample rate and time constant, and snap the current value to the target.
    ///
    /// Used at prepare time and whenever the sample rate changes.
    pub fn reset(&mut self, sample_rate: f32, time_constant_s: f32) {
        self.sample_rate = sample_rate;
        self.time_constant_s = time_constant_s;
        self.recalculate_coeff();
        self.snap_to_target();
    }

    /// Set the value the ramp moves toward.
    ///
    /// The ramp continues from its current value, so calling this mid-ramp
    /// never produces a jump. Repeating the current target is a no-op, so a
    /// linear ramp keeps its rate when a block-rate caller re-sends it.
    #[inline]
    pub fn set_target_value(&mut self, target: f32) {
        if target == self.target {
            return;
        }
        self.target = target;
        if self.curve == RampCurve::Linear {
            let samples = roundf(self.time_constant_s * self.sample_rate);
            if samples < 1.0 {
                self.snap_to_target();
            } else {
                let samples = samples as u32;
                self.increment = (target - self.current) / samples as f32;
                self.samples_remaining = samples;
            }
        }
    }

    /// Jump both current and target to `value` (no ramp).
    #[inline]
    pub fn set_current_and_target(&mut self, value: f32) {
        self.target = value;
        self.snap_to_target();
    }

    /// Advance one sample and return the new value.
    #[inline]
    pub fn next_value(&mut self) -> f32 {
        let before = self.target - self.current;
        if before == 0.0 {
            return self.current;
        }
        match self.curve {
            RampCurve::Exponential => {
                let next = self.current + self.coeff * before;
                let remaining = self.target - next;
                // A step below f32 resolution would stall short of the target.
                if next == self.current
                    || remaining.abs() <= SETTLE_EPSILON * self.target.abs().max(1.0)
                {
                    self.current = self.target;
                } else {
                    self.current = next;
                }
            }
            RampCurve::Linear => {
                if self.samples_remaining <= 1 {
                    self.snap_to_target();
                    return self.current;
                }
                self.current += self.increment;
                self.samples_remaining -= 1;
            }
        }
        // Accumulated rounding must never carry the value past the target.
        if (self.target - self.current) * before < 0.0 {
            self.snap_to_target();
        }
        self.current
    }

    /// Advance `n` samples at once, for consumers that read once per block.
    pub fn skip(&mut self, n: usize) -> f32 {
        if n == 0 || self.current == self.target {
            return self.current;
        }
        match self.curve {
            RampCurve::Exponential => {
                let decay = powf(1.0 - self.coeff, n as f32);
                self.current = self.target + (self.current - self.target) * decay;
                let remaining = self.target - self.current;
                if remaining.abs() <= SETTLE_EPSILON * self.target.abs().max(1.0) {
                    self.current = self.target;
                }
            }
            RampCurve::Linear => {
                if n as u64 >= u64::from(self.samples_remaining) {
                    self.snap_to_target();
                } else {
                    self.current += self.increment * n as f32;
                    self.samples_remaining -= n as u32;
                }
            }
        }
        self.current
    }

    /// Current value without advancing.
    #[inline]
    pub fn current_value(&self) -> f32 {
        self.current
    }

    /// Value the ramp is moving toward.
    #[inline]
    pub fn target_value(&self) -> f32 {
        self.target
    }

    /// True while the current value has not yet reached the target.
    #[inline]
    pub fn is_smoothing(&self) -> bool {
        self.current != self.target
    }

    /// Approach curve.
    pub fn curve(&self) -> RampCurve {
        self.curve
    }

    /// Configured time constant in seconds.
    pub fn time_constant(&self) -> f32 {
        self.time_constant_s
    }

    fn snap_to_target(&mut self) {
        self.current = self.target;
        self.increment = 0.0;
        self.samples_remaining = 0;
    }

    /// `coeff = 1 - exp(-1 / (tau * sample_rate))`; instant when either is non-positive.
    fn recalculate_coeff(&mut self) {
        let samples = self.time_constant_s * self.sample_rate;
        self.coeff = if samples > 0.0 {
            1.0 - expf(-1.0 / samples)
        } else {
            1.0
        };
    }
}

impl Default for ParameterRamp {
    fn default() -> Self {
        Self::new(0.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ramp_instant_without_time_constant() {
        let mut ramp = ParameterRamp::new(1.0);
        ramp.set_target_value(0.5);
        assert_eq!(ramp.next_value(), 0.5, "unconfigured ramp should be instant");
        assert!(!ramp.is_smoothing());
    }

    #[test]
    fn exponential_ramp_converges() {
        let mut ramp = ParameterRamp::with_config(0.0, RampCurve::Exponential, 48000.0, 0.01);
        ramp.set_target_value(1.0);
        for _ in 0..(48000 * 50 / 1000) {
            ramp.next_value();
        }
        assert!(
            (ramp.current_value() - 1.0).abs() < 0.01,
            "Should converge to target, got {}",
            ramp.current_value()
        );
    }

    #[test]
    fn exponential_ramp_one_time_constant() {
        let mut ramp = ParameterRamp::with_config(0.0, RampCurve::Exponential, 48000.0, 0.01);
        ramp.set_target_value(1.0);
        for _ in 0..480 {
            ramp.next_value();
        }
        let expected = 1.0 - expf(-1.0);
        assert!(
            (ramp.current_value() - expected).abs() < 0.01,
            "After one time constant, expected ~{expected}, got {}",
            ramp.current_value()
        );
    }

    #[test]
    fn exponential_ramp_settles_exactly() {
        let mut ramp = ParameterRamp::with_config(220.0, RampCurve::Exponential, 48000.0, 0.1);
        ramp.set_target_value(440.0);
        for _ in 0..48000 * 5 {
            ramp.next_value();
        }
        assert_eq!(ramp.current_value(), 440.0);
        assert!(!ramp.is_smoothing());
    }

    #[test]
    fn linear_ramp_exact_time() {
        let mut ramp = ParameterRamp::with_config(0.0, RampCurve::Linear, 48000.0, 0.01);
        ramp.set_target_value(1.0);
        for _ in 0..479 {
            ramp.next_value();
        }
        assert!(ramp.is_smoothing(), "should still be moving one sample early");
        assert_eq!(ramp.next_value(), 1.0, "should land on the target");
    }

    #[test]
    fn linear_ramp_constant_rate() {
        let mut ramp = ParameterRamp::with_config(0.0, RampCurve::Linear, 48000.0, 0.01);
        ramp.set_target_value(1.0);
        for _ in 0..240 {
            ramp.next_value();
        }
        assert!(
            (ramp.current_value() - 0.5).abs() < 0.01,
            "Should be halfway, got {}",
            ramp.current_value()
        );
    }

    #[test]
    fn retarget_mid_ramp_is_continuous() {
        for curve in [RampCurve::Exponential, RampCurve::Linear] {
            let mut ramp = ParameterRamp::with_config(0.0, curve, 48000.0, 0.01);
            ramp.set_target_value(1.0);
            for _ in 0..100 {
                ramp.next_value();
            }
            let before = ramp.current_value();
            ramp.set_target_value(-1.0);
            let after = ramp.next_value();
            assert!(
                (after - before).abs() < 0.01,
                "{curve:?}: retarget jumped from {before} to {after}"
            );
            assert!(after < before, "{curve:?}: should head toward the new target");
        }
    }

    #[test]
    fn linear_ramp_ignores_repeated_target() {
        let mut ramp = ParameterRamp::with_config(8000.0, RampCurve::Linear, 48000.0, 0.1);
        ramp.set_target_value(100.0);
        // A block-rate caller re-sends the same target every 512 samples.
        for _ in 0..10 {
            ramp.set_target_value(100.0);
            ramp.skip(512);
        }
        assert_eq!(ramp.current_value(), 100.0, "should land after 4800 samples");
        assert!(!ramp.is_smoothing());
    }

    #[test]
    fn reset_snaps_to_target() {
        let mut ramp = ParameterRamp::with_config(0.0, RampCurve::Exponential, 48000.0, 0.1);
        ramp.set_target_value(0.8);
        ramp.next_value();
        ramp.reset(96000.0, 0.1);
        assert_eq!(ramp.current_value(), 0.8);
        assert!(!ramp.is_smoothing());
    }

    #[test]
    fn skip_matches_per_sample_advance() {
        for curve in [RampCurve::Exponential, RampCurve::Linear] {
            let mut stepped = ParameterRamp::with_config(100.0, curve, 48000.0, 0.05);
            let mut skipped = stepped.clone();
            stepped.set_target_value(1000.0);
            skipped.set_target_value(1000.0);
            for _ in 0..512 {
                stepped.next_value();
            }
            skipped.skip(512);
            assert!(
                (stepped.current_value() - skipped.current_value()).abs() < 0.5,
                "{curve:?}: stepped {} vs skipped {}",
                stepped.current_value(),
                skipped.current_value()
            );
        }
    }

    #[test]
    fn skip_past_linear_end_lands_on_target() {
        let mut ramp = ParameterRamp::with_config(0.0, RampCurve::Linear, 48000.0, 0.01);
        ramp.set_target_value(2.0);
        assert_eq!(ramp.skip(10_000), 2.0);
    }
}
