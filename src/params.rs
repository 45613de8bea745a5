//! Filter parameters
//!
//! Every numeric parameter is clamped into its valid range when assigned;
//! out-of-range values are never rejected.

use crate::radius::RadiusParams;

macro_rules! clamped {
    ($(#[$doc:meta])* $field:ident, $setter:ident, $min:expr, $max:expr) => {
        $(#[$doc])*
        pub fn $field(&self) -> f64 {
            self.$field
        }

        /// Assign, clamping into the valid range.
        pub fn $setter(&mut self, value: f64) {
            self.$field = clamp_param(value, $min, $max);
        }
    };
}

/// NaN falls back to the lower bound.
fn clamp_param(value: f64, min: f64, max: f64) -> f64 {
    if value.is_nan() {
        min
    } else {
        value.clamp(min, max)
    }
}

/// Parameters for the adaptive radial follow filter
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FilterParams {
    outer_radius: f64,
    inner_radius: f64,
    smoothing_coefficient: f64,
    soft_knee_scale: f64,
    smoothing_leak_coefficient: f64,
    velocity_divisor: f64,
    minimum_radius_multiplier: f64,
    radial_mult_power: f64,
    minimum_smoothing_divisor: f64,
    raw_accel_threshold: f64,
    accel_mult_power: f64,
    raw_velocity_threshold: f64,
    spin_confidence: f64,
    index_factor_multiple: f64,
    reset_timeout_ms: f64,
    /// Multiply the knee scale by `6 * velocity / velocity_divisor * accel_multiplier + 1`
    pub velocity_scales_knee: bool,
    /// Enables the spin detector, index-factor override and raw velocity radius override
    pub advanced: bool,
    /// Enables the grounded anchor
    pub grounded: bool,
}

impl FilterParams {
    clamped!(
        /// Maximum lag of the cursor behind the raw position [mm]
        outer_radius, set_outer_radius, 0.0, 1_000_000.0
    );
    clamped!(
        /// Deadzone radius [mm]
        inner_radius, set_inner_radius, 0.0, 1_000_000.0
    );
    clamped!(
        /// How slowly the cursor descends from the outer to the inner radius
        smoothing_coefficient, set_smoothing_coefficient, 0.0001, 1.0
    );
    clamped!(
        /// Softness of the transition at the outer radius
        soft_knee_scale, set_soft_knee_scale, 0.0, 100.0
    );
    clamped!(
        /// Share of smoothing that continues past the outer radius
        smoothing_leak_coefficient, set_smoothing_leak_coefficient, 0.0, 1.0
    );
    clamped!(
        /// Velocity [mm/ms] at which the radius reaches its configured size
        velocity_divisor, set_velocity_divisor, 0.01, 1_000_000.0
    );
    clamped!(
        /// Floor of the radial factor
        minimum_radius_multiplier, set_minimum_radius_multiplier, 0.0, 1.0
    );
    clamped!(
        /// Exponent of the velocity to radius response
        radial_mult_power, set_radial_mult_power, 1.0, 1_000_000.0
    );
    clamped!(
        /// Divisor applied to the smoothing coefficient at low velocity
        minimum_smoothing_divisor, set_minimum_smoothing_divisor, 2.0, 1_000_000.0
    );
    clamped!(
        /// Normalised deceleration below which the cursor blends toward the raw report
        raw_accel_threshold, set_raw_accel_threshold, -1_000_000.0, 0.0
    );
    clamped!(
        /// Exponent applied to the accel multiplier when scaling the radius
        accel_mult_power, set_accel_mult_power, 1.0, 1_000_000.0
    );
    clamped!(
        /// Velocity [mm/ms] above which two consecutive reports max out the radius
        raw_velocity_threshold, set_raw_velocity_threshold, 0.01, 1_000_000.0
    );
    clamped!(
        /// Scales the raw velocity threshold inside the spin detector
        spin_confidence, set_spin_confidence, 0.01, 1_000_000.0
    );
    clamped!(
        /// Index factor jump, in preceding mean velocities, where the index override starts
        index_factor_multiple, set_index_factor_multiple, 1.0, 1_000_000.0
    );
    clamped!(
        /// Gap between samples that counts as a redetection [ms]
        reset_timeout_ms, set_reset_timeout_ms, 1.0, 1_000_000.0
    );

    /// Radius shape derived from the current parameters.
    pub fn radius(&self) -> RadiusParams {
        RadiusParams {
            outer_radius: self.outer_radius,
            inner_radius: self.inner_radius,
            velocity_divisor: self.velocity_divisor,
            radial_power: self.radial_mult_power,
            min_radius_multiplier: self.minimum_radius_multiplier,
            accel_power: self.accel_mult_power,
        }
    }

    /// Builder-style helper for tests and hosts configuring in code.
    pub fn with(mut self, f: impl FnOnce(&mut Self)) -> Self {
        f(&mut self);
        self
    }
}

impl Default for FilterParams {
    fn default() -> Self {
        Self {
            outer_radius: 10.0,
            inner_radius: 10.0,
            smoothing_coefficient: 1.0,
            soft_knee_scale: 1.0,
            smoothing_leak_coefficient: 0.0,
            velocity_divisor: 5.0,
            minimum_radius_multiplier: 0.0,
            radial_mult_power: 9.0,
            minimum_smoothing_divisor: 10.0,
            raw_accel_threshold: -0.15,
            accel_mult_power: 7.0,
            raw_velocity_threshold: 5.0,
            spin_confidence: 1.5,
            index_factor_multiple: 2.0,
            reset_timeout_ms: 50.0,
            velocity_scales_knee: false,
            advanced: false,
            grounded: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_within_ranges() {
        let params = FilterParams::default();
        let mut clamped = params;
        clamped.set_outer_radius(params.outer_radius());
        clamped.set_smoothing_coefficient(params.smoothing_coefficient());
        clamped.set_minimum_smoothing_divisor(params.minimum_smoothing_divisor());
        clamped.set_raw_accel_threshold(params.raw_accel_threshold());
        assert_eq!(params, clamped);
    }

    #[test]
    fn test_setters_clamp_silently() {
        let mut params = FilterParams::default();
        params.set_outer_radius(-3.0);
        params.set_smoothing_coefficient(5.0);
        params.set_raw_accel_threshold(2.0);
        params.set_minimum_smoothing_divisor(0.0);
        params.set_velocity_divisor(f64::NAN);
        assert_eq!(params.outer_radius(), 0.0);
        assert_eq!(params.smoothing_coefficient(), 1.0);
        assert_eq!(params.raw_accel_threshold(), 0.0);
        assert_eq!(params.minimum_smoothing_divisor(), 2.0);
        assert_eq!(params.velocity_divisor(), 0.01);
    }

    #[test]
    fn test_radius_view_tracks_params() {
        let params = FilterParams::default().with(|p| {
            p.set_inner_radius(2.0);
            p.set_radial_mult_power(3.0);
        });
        let radius = params.radius();
        assert_eq!(radius.inner_radius, 2.0);
        assert_eq!(radius.radial_power, 3.0);
        assert_eq!(radius.accel_power, 7.0);
    }
}
