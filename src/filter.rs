//! Adaptive radial follow filter
//!
//! Tracks a cursor that lags the raw pen position by at most the outer
//! radius, does not move while the raw position stays inside the inner
//! radius, and adapts both radii to the current velocity.

use nalgebra::Vector2;
use tracing::{debug, trace};

use crate::anchor::{AnchorOutcome, GroundedAnchor};
use crate::curve::{smoothstep, KneeCurve};
use crate::kinematics::{KinematicState, ReportInterval};
use crate::params::FilterParams;
use crate::radius::{EffectiveRadii, RADIUS_EPSILON};
use crate::spin::{index_blend, snap_blend, SpinWindow};

/// One raw report from the digitizer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sample {
    /// Raw position [mm]
    pub position: Vector2<f64>,
    /// Raw pressure, passed through untouched
    pub pressure: u32,
    /// Time since the previous sample [ms]
    pub delta_ms: f64,
}

impl Sample {
    pub fn new(position: Vector2<f64>, pressure: u32, delta_ms: f64) -> Self {
        Self {
            position,
            pressure,
            delta_ms,
        }
    }
}

/// Why the cursor was snapped to the raw position.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResetReason {
    FirstSample,
    NonFinite,
    Timeout,
}

/// Per-tick values, kept for inspection after each call.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct FilterDiagnostics {
    pub velocity: f64,
    pub acceleration: f64,
    pub accel_multiplier: f64,
    pub index_factor: f64,
    pub inner_radius: f64,
    pub outer_radius: f64,
    /// Smoothing coefficient after the low-velocity divisor
    pub smoothing: f64,
    /// Knee scale after the optional velocity scaling
    pub knee_scale: f64,
    /// Distance moved by the radial curve, before overrides
    pub follow_delta: f64,
    pub snap_blend: f64,
    pub index_blend: f64,
    pub spin: bool,
    pub anchor: AnchorOutcome,
    pub reset: Option<ResetReason>,
}

/// Distance the cursor moves toward a target `distance` away.
///
/// Zero inside the inner radius; beyond it the cursor keeps at most
/// `radii.span()` of extra lag, shaped by the knee curve.
pub fn follow_delta(
    distance: f64,
    radii: &EffectiveRadii,
    curve: &KneeCurve,
    smoothing: f64,
    leak: f64,
) -> f64 {
    if distance.is_nan() || distance <= radii.inner {
        return 0.0;
    }
    let excess = distance - radii.inner;
    let span = radii.span();
    let kept = if span > f64::EPSILON {
        let u = excess / span * smoothing / curve.scale_comp;
        span * curve.leaked(u, leak)
    } else {
        0.0
    };
    excess - kept
}

/// Motion the radius and knee see on this tick. Spin and open-motion
/// overrides replace it with a still one; the kinematic history is kept.
#[derive(Debug, Clone, Copy)]
struct Motion {
    velocity: f64,
    accel_multiplier: f64,
}

impl Motion {
    fn still() -> Self {
        Self {
            velocity: 0.0,
            accel_multiplier: 1.0,
        }
    }
}

/// Adaptive radial follow filter for one pointer stream
#[derive(Debug, Clone)]
pub struct RadialFollowFilter {
    /// Filter parameters
    params: FilterParams,
    /// Emitted position; `None` until the first sample
    cursor: Option<Vector2<f64>>,
    /// Averaged report interval
    interval: ReportInterval,
    /// Raw stream derivatives
    kinematics: KinematicState,
    /// Deadzone centre pin during saturated strokes
    anchor: GroundedAnchor,
    /// Spin detector and snap cooldown
    spin: SpinWindow,
    /// Values from the last call
    diagnostics: FilterDiagnostics,
}

impl RadialFollowFilter {
    /// Create a new filter
    pub fn new(params: FilterParams) -> Self {
        Self {
            params,
            cursor: None,
            interval: ReportInterval::new(),
            kinematics: KinematicState::at_rest(Vector2::zeros()),
            anchor: GroundedAnchor::new(),
            spin: SpinWindow::new(),
            diagnostics: FilterDiagnostics::default(),
        }
    }

    pub fn params(&self) -> &FilterParams {
        &self.params
    }

    /// Parameters may be changed between samples; the state is kept.
    pub fn params_mut(&mut self) -> &mut FilterParams {
        &mut self.params
    }

    /// Last emitted position
    pub fn cursor(&self) -> Option<Vector2<f64>> {
        self.cursor
    }

    pub fn kinematics(&self) -> &KinematicState {
        &self.kinematics
    }

    pub fn anchor(&self) -> &GroundedAnchor {
        &self.anchor
    }

    /// Values computed by the last call to [`filter`](Self::filter)
    pub fn diagnostics(&self) -> &FilterDiagnostics {
        &self.diagnostics
    }

    /// Forget the stream; the next sample is passed through.
    pub fn reset(&mut self) {
        self.cursor = None;
        self.interval = ReportInterval::new();
        self.kinematics = KinematicState::at_rest(Vector2::zeros());
        self.anchor = GroundedAnchor::new();
        self.spin = SpinWindow::new();
    }

    /// Filter one sample
    ///
    /// # Arguments
    /// * `sample` - Raw position [mm], pressure and time since the previous sample
    ///
    /// # Returns
    /// The filtered cursor position, always finite for finite input
    pub fn filter(&mut self, sample: Sample) -> Vector2<f64> {
        let target = sample.position;

        if !is_finite(&target) {
            debug!("non-finite raw position ignored");
            return self.cursor.unwrap_or_else(Vector2::zeros);
        }

        let Some(previous) = self.cursor else {
            return self.restart(target, ResetReason::FirstSample);
        };

        let v_div = self.params.velocity_divisor();
        let radius = self.params.radius();
        let reach = radius.outer_radius.max(radius.inner_radius + RADIUS_EPSILON);

        self.interval.update(sample.delta_ms);
        self.kinematics.update(target, self.interval.average_ms(), v_div);
        let kin = self.kinematics;

        let mut diag = FilterDiagnostics {
            velocity: kin.velocity,
            acceleration: kin.acceleration,
            accel_multiplier: kin.accel_multiplier,
            index_factor: kin.index_factor,
            ..FilterDiagnostics::default()
        };

        let mut motion = Motion {
            velocity: kin.velocity,
            accel_multiplier: kin.accel_multiplier,
        };
        let mut force_full = false;

        if self.params.advanced {
            self.spin.tick();
            let rvt = self.params.raw_velocity_threshold();
            if self.spin.detect(&kin.last_velocities, rvt, self.params.spin_confidence()) {
                debug!(velocity = kin.velocity, "spin detected, velocity zeroed");
                motion = Motion::still();
                diag.spin = true;
                self.anchor.invalidate();
            } else {
                force_full = kin.last_velocities[0] > rvt && kin.last_velocities[1] > rvt;
            }
        }

        if self.params.grounded && !diag.spin {
            let measured = radius.effective(kin.velocity, kin.accel_multiplier, force_full);
            diag.anchor = self.anchor.update(
                measured.saturated(),
                kin.accel_multiplier,
                target,
                reach,
            );
            if diag.anchor == AnchorOutcome::OpenMotion {
                motion = Motion::still();
                force_full = false;
            }
        }

        let radii = radius.effective(motion.velocity, motion.accel_multiplier, force_full);

        let knee_scale = if self.params.velocity_scales_knee {
            let gain = 6.0 * (motion.velocity / v_div) * motion.accel_multiplier;
            self.params.soft_knee_scale() * (gain + 1.0)
        } else {
            self.params.soft_knee_scale()
        };
        let curve = KneeCurve::new(knee_scale);

        let unsmooth = 1.0
            + smoothstep(motion.velocity * motion.accel_multiplier, v_div, 0.0)
                * (self.params.minimum_smoothing_divisor() - 1.0);
        let smoothing = self.params.smoothing_coefficient() / unsmooth;

        let offset = target - previous;
        let distance = offset.norm();
        let delta = follow_delta(
            distance,
            &radii,
            &curve,
            smoothing,
            self.params.smoothing_leak_coefficient(),
        );

        let mut cursor = if distance > 0.0 {
            previous + offset * (delta / distance)
        } else {
            previous
        };

        if diag.anchor == AnchorOutcome::Captured {
            self.anchor.capture(cursor);
        }

        diag.snap_blend = snap_blend(kin.acceleration, v_div, self.params.raw_accel_threshold());
        if self.params.advanced {
            diag.index_blend = index_blend(
                kin.index_jump(),
                kin.mean_previous_velocity(),
                v_div,
                self.params.index_factor_multiple(),
            );
        }
        let blend = diag.snap_blend.max(diag.index_blend);
        if blend > 0.0 {
            cursor = blend_toward(cursor, target, blend);
            self.spin.record_snap();
            self.anchor.invalidate();
        }

        diag.inner_radius = radii.inner;
        diag.outer_radius = radii.outer;
        diag.smoothing = smoothing;
        diag.knee_scale = curve.scale;
        diag.follow_delta = delta;

        trace!(
            velocity = diag.velocity,
            acceleration = diag.acceleration,
            accel_multiplier = diag.accel_multiplier,
            inner_radius = diag.inner_radius,
            outer_radius = diag.outer_radius,
            smoothing = diag.smoothing,
            knee_scale = diag.knee_scale,
            blend,
            "radial follow tick"
        );
        self.diagnostics = diag;

        if !is_finite(&cursor) {
            return self.restart(target, ResetReason::NonFinite);
        }
        if sample.delta_ms.is_nan() || sample.delta_ms > self.params.reset_timeout_ms() {
            return self.restart(target, ResetReason::Timeout);
        }

        self.cursor = Some(cursor);
        cursor
    }

    /// Snap the cursor to `target` and drop the lag state.
    fn restart(&mut self, target: Vector2<f64>, reason: ResetReason) -> Vector2<f64> {
        debug!(?reason, x = target.x, y = target.y, "cursor reset to raw position");
        self.kinematics.reset(target);
        self.anchor.invalidate();
        self.cursor = Some(target);
        if reason == ResetReason::FirstSample {
            self.diagnostics = FilterDiagnostics::default();
        }
        self.diagnostics.reset = Some(reason);
        target
    }
}

impl Default for RadialFollowFilter {
    fn default() -> Self {
        Self::new(FilterParams::default())
    }
}

fn is_finite(v: &Vector2<f64>) -> bool {
    v.x.is_finite() && v.y.is_finite()
}

fn blend_toward(from: Vector2<f64>, to: Vector2<f64>, t: f64) -> Vector2<f64> {
    if t >= 1.0 {
        return to;
    }
    from + (to - from) * t.max(0.0)
}
