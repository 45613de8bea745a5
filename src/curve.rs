//! Soft-knee limiter curve and easing ramps
//!
//! The knee maps an unbounded deviation onto a one-sided soft limiter:
//! large negative inputs pass through unchanged, large positive inputs
//! saturate at zero. The inverse and derivative of the middle piece are
//! used by [`KneeCurve`] to place the curve so that the follow-delta is
//! continuous and has a continuous slope at the inner radius.

/// Knee scale below which the soft knee degenerates to a hard clamp.
pub const HARD_KNEE_SCALE: f64 = 0.0001;

/// Unit soft knee: `x` below -3, `ln(tanh(e^x))` in between, 0 from 3 upward.
pub fn knee(x: f64) -> f64 {
    if x < -3.0 {
        x
    } else if x < 3.0 {
        x.exp().tanh().ln()
    } else {
        0.0
    }
}

/// Soft knee with scale `k`. `k == 0` is the hard clamp `min(x, 0)`.
pub fn knee_scaled(x: f64, k: f64) -> f64 {
    if k <= 0.0 {
        return x.min(0.0);
    }
    k * knee(x / k)
}

/// Inverse of the middle piece of [`knee_scaled`].
pub fn knee_inverse(y: f64, k: f64) -> f64 {
    k * (y / k).exp().atanh().ln()
}

/// Derivative of the middle piece of [`knee_scaled`].
pub fn knee_derivative(x: f64, k: f64) -> f64 {
    let e = (x / k).exp();
    let tanh = e.tanh();
    (e - e * tanh * tanh) / tanh
}

/// Cubic Hermite ramp from 0 at `start` to 1 at `end`.
///
/// `start > end` gives a falling ramp.
pub fn smoothstep(x: f64, start: f64, end: f64) -> f64 {
    let t = ((x - start) / (end - start)).clamp(0.0, 1.0);
    t * t * (3.0 - 2.0 * t)
}

/// Quintic ramp from 0 at `start` to 1 at `end`.
pub fn smootherstep(x: f64, start: f64, end: f64) -> f64 {
    let t = ((x - start) / (end - start)).clamp(0.0, 1.0);
    t * t * t * (t * (6.0 * t - 15.0) + 10.0)
}

/// Linear blend from `a` to `b`; `t` is clamped to `[0, 1]`.
pub fn lerp(a: f64, b: f64, t: f64) -> f64 {
    a + (b - a) * t.clamp(0.0, 1.0)
}

/// Knee curve shifted to pass through zero with the slope compensation
/// needed at the deadzone boundary.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct KneeCurve {
    /// Effective knee scale
    pub scale: f64,
    /// Input offset such that `shifted(0) == 0`
    pub offset: f64,
    /// Slope of the knee at `offset`
    pub scale_comp: f64,
}

impl KneeCurve {
    /// Build the curve for an effective knee scale.
    pub fn new(scale: f64) -> Self {
        if scale > HARD_KNEE_SCALE {
            let offset = knee_inverse(-1.0, scale);
            let scale_comp = knee_derivative(offset, scale);
            if offset.is_finite() && scale_comp.is_finite() && scale_comp > 0.0 {
                return Self {
                    scale,
                    offset,
                    scale_comp,
                };
            }
        }
        Self {
            scale: 0.0,
            offset: -1.0,
            scale_comp: 1.0,
        }
    }

    /// Knee lifted to an asymptote of 1: `scale * knee(x / scale) + 1`.
    pub fn lifted(&self, x: f64) -> f64 {
        if self.scale > HARD_KNEE_SCALE {
            self.scale * knee(x / self.scale) + 1.0
        } else if x > 0.0 {
            1.0
        } else {
            1.0 + x
        }
    }

    /// Lifted knee evaluated at `u + offset`, mixed with a linear leak.
    ///
    /// Zero at `u == 0` with slope `scale_comp` there, bounded by 1 when
    /// `leak == 0`.
    pub fn leaked(&self, u: f64, leak: f64) -> f64 {
        let leaked = if leak > 0.0 {
            u * leak * self.scale_comp
        } else {
            0.0
        };
        self.lifted(u + self.offset) * (1.0 - leak) + leaked
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_knee_continuity_at_piece_boundaries() {
        for &k in &[0.2, 1.0, 3.5, 50.0] {
            let lo = -3.0 * k;
            let hi = 3.0 * k;
            let gap_lo = (knee_scaled(lo - 1e-9, k) - knee_scaled(lo + 1e-9, k)).abs();
            let gap_hi = (knee_scaled(hi - 1e-9, k) - knee_scaled(hi + 1e-9, k)).abs();
            assert!(gap_lo < 1e-3 * k, "gap at -3k = {gap_lo} for k = {k}");
            assert!(gap_hi < 1e-12 * k.max(1.0), "gap at 3k = {gap_hi} for k = {k}");
        }
    }

    #[test]
    fn test_knee_is_identity_far_below_and_zero_far_above() {
        assert_eq!(knee_scaled(-10.0, 1.0), -10.0);
        assert_eq!(knee_scaled(10.0, 1.0), 0.0);
        assert!(knee_scaled(0.0, 1.0) < 0.0);
    }

    #[test]
    fn test_knee_zero_scale_is_hard_clamp() {
        assert_eq!(knee_scaled(-2.0, 0.0), -2.0);
        assert_eq!(knee_scaled(2.0, 0.0), 0.0);
    }

    #[test]
    fn test_inverse_round_trips_middle_piece() {
        let k = 1.3;
        for &x in &[-2.5, -1.0, 0.0, 1.0, 2.0] {
            let y = knee_scaled(x * k, k);
            let back = knee_inverse(y, k);
            assert!((back - x * k).abs() < 1e-6, "x = {x}, back = {back}");
        }
    }

    #[test]
    fn test_derivative_matches_finite_difference() {
        let k = 0.8;
        let h = 1e-6;
        for &x in &[-2.0, -0.5, 0.3, 1.5] {
            let numeric = (knee_scaled(x + h, k) - knee_scaled(x - h, k)) / (2.0 * h);
            assert!((numeric - knee_derivative(x, k)).abs() < 1e-5);
        }
    }

    #[test]
    fn test_knee_curve_passes_through_origin() {
        for &k in &[0.0, 0.05, 1.0, 10.0, 100.0] {
            let curve = KneeCurve::new(k);
            assert!(curve.leaked(0.0, 0.0).abs() < 1e-9, "k = {k}");
            assert!(curve.leaked(0.0, 0.3).abs() < 1e-9, "k = {k}");
        }
    }

    #[test]
    fn test_knee_curve_slope_at_origin_is_scale_comp() {
        let curve = KneeCurve::new(1.0);
        let h = 1e-6;
        let slope = (curve.leaked(h, 0.0) - curve.leaked(-h, 0.0)) / (2.0 * h);
        assert!((slope - curve.scale_comp).abs() < 1e-5);
    }

    #[test]
    fn test_knee_curve_bounded_without_leak() {
        let curve = KneeCurve::new(2.0);
        for i in 0..200 {
            let u = i as f64 * 0.25;
            let v = curve.leaked(u, 0.0);
            assert!((0.0..=1.0 + 1e-12).contains(&v), "u = {u}, v = {v}");
        }
    }

    #[test]
    fn test_smoothstep_endpoints_and_clamping() {
        assert_eq!(smoothstep(-1.0, 0.0, 1.0), 0.0);
        assert_eq!(smoothstep(0.5, 0.0, 1.0), 0.5);
        assert_eq!(smoothstep(2.0, 0.0, 1.0), 1.0);
        assert_eq!(smoothstep(0.0, 5.0, 0.0), 1.0);
        assert_eq!(smootherstep(0.5, 0.0, 1.0), 0.5);
        assert_eq!(smootherstep(7.0, 0.0, 1.0), 1.0);
    }

    #[test]
    fn test_lerp_clamps_factor() {
        assert_eq!(lerp(1.0, 3.0, 0.5), 2.0);
        assert_eq!(lerp(1.0, 3.0, 4.0), 3.0);
        assert_eq!(lerp(1.0, 3.0, -1.0), 1.0);
    }
}
