//! Linear rescaling of raw axis values into engineering units
//!
//! Two pure functions do all the numeric work of the crate:
//!
//! - [`rescale_linear`] maps `[raw_min, raw_max]` affinely onto `[out_min, out_max]`
//! - [`rescale_with_deadband`] first removes a dead zone around zero, then rescales
//!   the remaining usable range so the extremes still reach `out_min` / `out_max`
//!
//! Neither function clamps. A raw value outside the configured range extrapolates
//! linearly, so callers that need clamping must validate their input first.

use serde::{Deserialize, Serialize};

/// Maps `raw` affinely from `[raw_min, raw_max]` onto `[out_min, out_max]`.
///
/// When `raw_max == raw_min` the range is empty and the division by zero yields a
/// non-finite result (`NaN` for `raw == raw_min`, `±Inf` otherwise). Use
/// [`ScalingConstants::validate`] to reject such ranges up front.
pub fn rescale_linear(raw: f64, raw_min: f64, raw_max: f64, out_min: f64, out_max: f64) -> f64 {
    // Scale to [0, 1] first, then stretch onto the output range
    let unit = (raw - raw_min) / (raw_max - raw_min);
    unit * (out_max - out_min) + out_min
}

/// Deadband-compensated rescaling.
///
/// Values with `|raw| <= deadband` are treated as exactly zero. Values outside the
/// band are shifted toward zero by the deadband width and rescaled against the
/// shrunk input range `[raw_min + deadband, raw_max - deadband]`. All inputs inside
/// the band therefore produce the same output, and the raw extremes still map onto
/// `out_min` and `out_max`.
pub fn rescale_with_deadband(
    raw: i32,
    raw_min: i32,
    raw_max: i32,
    deadband: i32,
    out_min: f64,
    out_max: f64,
) -> f64 {
    let raw = i64::from(raw);
    let deadband = i64::from(deadband);

    // |raw| <= deadband, both edges included, is no input
    let effective = if raw > deadband {
        raw - deadband
    } else if raw < -deadband {
        raw + deadband
    } else {
        0
    };

    let shrunk_min = i64::from(raw_min) + deadband;
    let shrunk_max = i64::from(raw_max) - deadband;

    rescale_linear(
        effective as f64,
        shrunk_min as f64,
        shrunk_max as f64,
        out_min,
        out_max,
    )
}

/// Errors for scaling constants that cannot produce a meaningful mapping
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ScalingError {
    #[error("empty raw range: raw_min {raw_min} must be below raw_max {raw_max}")]
    EmptyRange { raw_min: i32, raw_max: i32 },

    #[error("deadband must not be negative, got {0}")]
    NegativeDeadband(i32),

    #[error("deadband {deadband} leaves no usable range inside [{raw_min}, {raw_max}]")]
    DeadbandTooWide {
        raw_min: i32,
        raw_max: i32,
        deadband: i32,
    },

    #[error("empty output range: out_min and out_max are both {0}")]
    EmptyOutput(f64),
}

/// One set of scaling constants for a class of analog inputs (joysticks or triggers)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScalingConstants {
    pub raw_min: i32,
    pub raw_max: i32,
    pub raw_deadband: i32,
    pub out_min: f64,
    pub out_max: f64,
}

impl ScalingConstants {
    pub const fn new(raw_min: i32, raw_max: i32, raw_deadband: i32, out_min: f64, out_max: f64) -> Self {
        Self {
            raw_min,
            raw_max,
            raw_deadband,
            out_min,
            out_max,
        }
    }

    /// Scales one raw reading with deadband compensation
    #[inline]
    pub fn scale(&self, raw: i32) -> f64 {
        rescale_with_deadband(
            raw,
            self.raw_min,
            self.raw_max,
            self.raw_deadband,
            self.out_min,
            self.out_max,
        )
    }

    /// Output produced by every raw value inside the deadband
    pub fn rest_value(&self) -> f64 {
        self.scale(0)
    }

    /// Rejects constants whose shrunk raw range is empty or whose output range is a point
    pub fn validate(&self) -> Result<(), ScalingError> {
        if self.raw_min >= self.raw_max {
            return Err(ScalingError::EmptyRange {
                raw_min: self.raw_min,
                raw_max: self.raw_max,
            });
        }
        if self.raw_deadband < 0 {
            return Err(ScalingError::NegativeDeadband(self.raw_deadband));
        }
        let usable = i64::from(self.raw_max) - i64::from(self.raw_min) - 2 * i64::from(self.raw_deadband);
        if usable <= 0 {
            return Err(ScalingError::DeadbandTooWide {
                raw_min: self.raw_min,
                raw_max: self.raw_max,
                deadband: self.raw_deadband,
            });
        }
        if self.out_min == self.out_max {
            return Err(ScalingError::EmptyOutput(self.out_min));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f64 = 1e-9;

    const JOYSTICK: ScalingConstants = ScalingConstants::new(-32768, 32767, 1000, -100.0, 100.0);

    #[test]
    fn linear_hits_range_ends() {
        for &(lo, hi) in &[(-32768.0, 32767.0), (0.0, 255.0), (-1.0, 1.0), (10.0, 20.0)] {
            assert!((rescale_linear(lo, lo, hi, -100.0, 100.0) + 100.0).abs() < EPS);
            assert!((rescale_linear(hi, lo, hi, -100.0, 100.0) - 100.0).abs() < EPS);
            assert!((rescale_linear(lo, lo, hi, 0.0, 1.0)).abs() < EPS);
            assert!((rescale_linear(hi, lo, hi, 0.0, 1.0) - 1.0).abs() < EPS);
        }
    }

    #[test]
    fn linear_extrapolates_outside_range() {
        // 0..10 -> 0..100, raw 15 lands beyond out_max instead of being clamped
        assert!((rescale_linear(15.0, 0.0, 10.0, 0.0, 100.0) - 150.0).abs() < EPS);
        assert!((rescale_linear(-5.0, 0.0, 10.0, 0.0, 100.0) + 50.0).abs() < EPS);
    }

    #[test]
    fn linear_with_empty_range_is_not_finite() {
        assert!(rescale_linear(5.0, 5.0, 5.0, 0.0, 1.0).is_nan());
        assert!(rescale_linear(6.0, 5.0, 5.0, 0.0, 1.0).is_infinite());
    }

    #[test]
    fn deadband_output_is_constant_inside_band() {
        let rest = JOYSTICK.scale(0);
        for raw in [-999, -500, -1, 0, 1, 500, 999] {
            assert!((JOYSTICK.scale(raw) - rest).abs() < EPS, "raw {raw}");
        }
        // at exactly +/- deadband the shifted value is zero too
        assert!((JOYSTICK.scale(1000) - rest).abs() < EPS);
        assert!((JOYSTICK.scale(-1000) - rest).abs() < EPS);
    }

    #[test]
    fn deadband_edges_do_not_jump() {
        let rest = JOYSTICK.scale(0);
        let edges: Vec<f64> = (-1002..=-998)
            .chain(998..=1002)
            .map(|raw| JOYSTICK.scale(raw))
            .collect();
        for pair in edges.windows(2) {
            assert!(pair[1] >= pair[0], "{} < {}", pair[1], pair[0]);
        }
        assert_eq!(JOYSTICK.scale(-1000), rest);
        assert_eq!(JOYSTICK.scale(1000), rest);
        // one step outside the band moves by one raw unit, not by the band width
        assert!((JOYSTICK.scale(-1001) - rest).abs() < 0.01);
        assert!((JOYSTICK.scale(1001) - rest).abs() < 0.01);
    }

    #[test]
    fn deadband_extremes_reach_output_range() {
        assert!((JOYSTICK.scale(-32768) + 100.0).abs() < EPS);
        assert!((JOYSTICK.scale(32767) - 100.0).abs() < EPS);
    }

    #[test]
    fn deadband_is_monotonic_outside_band() {
        let mut previous = JOYSTICK.scale(-32768);
        for raw in (-32767..=-1001).step_by(97).chain([-1001, -1000]) {
            let value = JOYSTICK.scale(raw);
            assert!(value > previous, "raw {raw}: {value} <= {previous}");
            previous = value;
        }
        let mut previous = JOYSTICK.scale(1001);
        for raw in (1002..=32767).step_by(101) {
            let value = JOYSTICK.scale(raw);
            assert!(value > previous, "raw {raw}: {value} <= {previous}");
            previous = value;
        }
    }

    #[test]
    fn xbox_joystick_known_values() {
        // (23185 - 1000 + 31768) / 63535 * 200 - 100
        let expected = (22185.0 + 31768.0) / 63535.0 * 200.0 - 100.0;
        assert!((JOYSTICK.scale(23185) - expected).abs() < EPS);
        assert!((JOYSTICK.scale(23185) - 69.837).abs() < 1e-3);

        // asymmetric i16 range: rest value sits slightly above zero
        assert!((JOYSTICK.scale(500) - 100.0 / 63535.0).abs() < EPS);
        assert!(JOYSTICK.scale(500) != 0.0);
    }

    #[test]
    fn zero_deadband_is_plain_linear() {
        let trigger = ScalingConstants::new(0, 255, 0, 0.0, 100.0);
        for raw in [0, 1, 64, 128, 254, 255] {
            let linear = rescale_linear(raw as f64, 0.0, 255.0, 0.0, 100.0);
            assert!((trigger.scale(raw) - linear).abs() < EPS);
        }
    }

    #[test]
    fn extreme_inputs_do_not_overflow() {
        let wide = ScalingConstants::new(i32::MIN, i32::MAX, 10, -1.0, 1.0);
        assert!((wide.scale(i32::MIN) + 1.0).abs() < 1e-6);
        assert!((wide.scale(i32::MAX) - 1.0).abs() < 1e-6);
    }

    #[test]
    fn validate_rejects_degenerate_constants() {
        assert!(JOYSTICK.validate().is_ok());
        assert_eq!(
            ScalingConstants::new(5, 5, 0, 0.0, 1.0).validate(),
            Err(ScalingError::EmptyRange { raw_min: 5, raw_max: 5 })
        );
        assert_eq!(
            ScalingConstants::new(0, 255, -1, 0.0, 1.0).validate(),
            Err(ScalingError::NegativeDeadband(-1))
        );
        assert!(matches!(
            ScalingConstants::new(-10, 10, 10, 0.0, 1.0).validate(),
            Err(ScalingError::DeadbandTooWide { .. })
        ));
        assert_eq!(
            ScalingConstants::new(0, 255, 0, 3.0, 3.0).validate(),
            Err(ScalingError::EmptyOutput(3.0))
        );
    }
}
