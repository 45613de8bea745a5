//! Spin and snap heuristics
//!
//! A snap is a deliberate stop or reversal that should reach the output
//! unsmoothed; the cursor is blended toward the raw report. A spin is a
//! sustained run of very high raw velocity that the radius model would
//! otherwise read as a fast stroke; the tick's velocity is zeroed instead.

use crate::curve::smootherstep;
use crate::kinematics::FixedWindow;

/// Velocity history length examined by the spin detector.
pub const SPIN_WINDOW: usize = 10;
/// Windowed score above which the stream counts as spinning.
pub const SPIN_SCORE_THRESHOLD: f64 = 8.0;
/// Exponent applied to each normalised velocity in the spin score.
pub const SPIN_EXPONENT: i32 = 5;
/// Ticks after a snap during which spin detection is suppressed.
pub const SNAP_COOLDOWN_TICKS: u32 = 30;

/// Deceleration normalisation: `acceleration / (6 / velocity_divisor)`.
fn accel_scale(velocity_divisor: f64) -> f64 {
    6.0 / velocity_divisor
}

/// Blend toward the raw report on sharp deceleration.
///
/// Zero above `threshold`, rising to 1 one normalisation unit below it.
pub fn snap_blend(acceleration: f64, velocity_divisor: f64, threshold: f64) -> f64 {
    let scale = accel_scale(velocity_divisor);
    let normalized = acceleration / scale;
    if normalized < threshold {
        smootherstep(normalized, threshold, threshold - 1.0 / scale)
    } else {
        0.0
    }
}

/// Width of the index override ramp, as a multiple of its start.
pub const INDEX_RAMP_WIDTH: f64 = 1.5;

/// Blend toward the raw report when the index factor jumps beyond
/// `multiple` times the velocity of the preceding ticks.
///
/// A straight reversal at constant speed jumps by four times the speed.
pub fn index_blend(
    index_jump: f64,
    previous_velocity: f64,
    velocity_divisor: f64,
    multiple: f64,
) -> f64 {
    if previous_velocity < velocity_divisor / 50.0 {
        return 0.0;
    }
    smootherstep(
        index_jump / previous_velocity,
        multiple,
        INDEX_RAMP_WIDTH * multiple,
    )
}

/// Rolling spin detector with snap cooldown.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpinWindow {
    ticks_since_snap: u32,
}

impl SpinWindow {
    pub fn new() -> Self {
        Self {
            ticks_since_snap: SNAP_COOLDOWN_TICKS,
        }
    }

    pub fn ticks_since_snap(&self) -> u32 {
        self.ticks_since_snap
    }

    pub fn record_snap(&mut self) {
        self.ticks_since_snap = 0;
    }

    /// Advance the cooldown by one tick.
    pub fn tick(&mut self) {
        self.ticks_since_snap = self.ticks_since_snap.saturating_add(1);
    }

    /// Windowed score: each velocity contributes `(v / limit)^5`, capped at 1.
    pub fn score(velocities: &FixedWindow<f64, SPIN_WINDOW>, limit: f64) -> f64 {
        velocities
            .iter()
            .map(|v| (v / limit).powi(SPIN_EXPONENT).clamp(0.0, 1.0))
            .filter(|s| s.is_finite())
            .sum()
    }

    /// Spinning: score above threshold and no snap within the cooldown.
    pub fn detect(
        &self,
        velocities: &FixedWindow<f64, SPIN_WINDOW>,
        raw_velocity_threshold: f64,
        confidence: f64,
    ) -> bool {
        self.ticks_since_snap >= SNAP_COOLDOWN_TICKS
            && Self::score(velocities, raw_velocity_threshold * confidence) > SPIN_SCORE_THRESHOLD
    }
}

impl Default for SpinWindow {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn window(values: &[f64]) -> FixedWindow<f64, SPIN_WINDOW> {
        let mut w = FixedWindow::filled(0.0);
        for &v in values {
            w.push(v);
        }
        w
    }

    #[test]
    fn test_snap_blend_zero_above_threshold() {
        assert_eq!(snap_blend(0.0, 5.0, -0.15), 0.0);
        assert_eq!(snap_blend(-0.1, 5.0, -0.15), 0.0);
    }

    #[test]
    fn test_snap_blend_full_on_hard_stop() {
        // normalised: -2 * 5 / 6 = -1.67, full blend below -0.15 - 0.83
        assert_eq!(snap_blend(-2.0, 5.0, -0.15), 1.0);
    }

    #[test]
    fn test_snap_blend_partial_inside_ramp() {
        let blend = snap_blend(-0.6, 5.0, -0.15);
        assert!(blend > 0.0 && blend < 1.0, "blend = {blend}");
    }

    #[test]
    fn test_index_blend_ignores_slow_motion() {
        assert_eq!(index_blend(10.0, 0.01, 5.0, 2.0), 0.0);
    }

    #[test]
    fn test_index_blend_on_reversal() {
        // Right-angle turn: jump of sqrt(8) times the speed.
        let turn = index_blend(8f64.sqrt(), 1.0, 5.0, 2.0);
        assert!(turn > 0.0 && turn < 1.0, "blend = {turn}");
        assert_eq!(index_blend(4.0, 1.0, 5.0, 2.0), 1.0);
        assert_eq!(index_blend(2.0, 1.0, 5.0, 2.0), 0.0);
    }

    #[test]
    fn test_spin_needs_sustained_velocity() {
        let spin = SpinWindow::new();
        assert!(spin.detect(&window(&[20.0; 10]), 5.0, 1.5));
        assert!(!spin.detect(&window(&[20.0; 8]), 5.0, 1.5));
        assert!(!spin.detect(&window(&[1.0; 10]), 5.0, 1.5));
    }

    #[test]
    fn test_snap_suppresses_spin_for_cooldown() {
        let mut spin = SpinWindow::new();
        let fast = window(&[20.0; 10]);
        spin.record_snap();
        for _ in 0..SNAP_COOLDOWN_TICKS - 1 {
            spin.tick();
            assert!(!spin.detect(&fast, 5.0, 1.5));
        }
        spin.tick();
        assert!(spin.detect(&fast, 5.0, 1.5));
    }
}
