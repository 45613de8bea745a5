//! Grounded anchor
//!
//! While the velocity keeps the radius saturated, the deadzone centre is
//! pinned to where the cursor lands on the first saturated tick. Once the
//! raw position has left that point by more than the outer radius, the
//! motion is treated as open travel and the deadzone collapses.

use nalgebra::Vector2;
use tracing::debug;

/// Accel multiplier at or above which a tick counts as an acceleration peak.
pub const ACCEL_PEAK_MULTIPLIER: f64 = 1.5;

/// Result of one anchor update.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AnchorOutcome {
    /// Not saturated, no anchor held
    #[default]
    Idle,
    /// First saturated tick; the moved cursor becomes the anchor
    Captured,
    /// Anchor held, raw position still within reach
    Holding,
    /// Raw position left the anchor: collapse the deadzone
    OpenMotion,
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct GroundedAnchor {
    anchor_point: Option<Vector2<f64>>,
    saturated_run_length: u32,
    since_last_accel_peak: u32,
}

impl GroundedAnchor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn anchor_point(&self) -> Option<Vector2<f64>> {
        self.anchor_point
    }

    pub fn saturated_run_length(&self) -> u32 {
        self.saturated_run_length
    }

    pub fn since_last_accel_peak(&self) -> u32 {
        self.since_last_accel_peak
    }

    /// Advance one tick.
    ///
    /// `reach` is the configured outer radius. On `Captured` the caller
    /// records the moved cursor with [`capture`](Self::capture).
    pub fn update(
        &mut self,
        saturated: bool,
        accel_multiplier: f64,
        target: Vector2<f64>,
        reach: f64,
    ) -> AnchorOutcome {
        if accel_multiplier >= ACCEL_PEAK_MULTIPLIER {
            self.since_last_accel_peak = 0;
        } else {
            self.since_last_accel_peak = self.since_last_accel_peak.saturating_add(1);
        }

        if !saturated {
            self.anchor_point = None;
            self.saturated_run_length = 0;
            return AnchorOutcome::Idle;
        }

        self.saturated_run_length = self.saturated_run_length.saturating_add(1);

        let Some(anchor) = self.anchor_point else {
            return AnchorOutcome::Captured;
        };

        // The tick of an acceleration peak is the stroke opening up the
        // radius on purpose; only later ticks may collapse it.
        if (target - anchor).norm() > reach && self.since_last_accel_peak > 0 {
            AnchorOutcome::OpenMotion
        } else {
            AnchorOutcome::Holding
        }
    }

    /// Pin the anchor to `point`.
    pub fn capture(&mut self, point: Vector2<f64>) {
        debug!(x = point.x, y = point.y, "grounded anchor captured");
        self.anchor_point = Some(point);
    }

    /// Drop the anchor so the next saturated tick captures a fresh one.
    pub fn invalidate(&mut self) {
        if self.anchor_point.take().is_some() {
            debug!(run = self.saturated_run_length, "grounded anchor invalidated");
        }
        self.saturated_run_length = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn capture_at(anchor: &mut GroundedAnchor, p: Vector2<f64>) {
        assert_eq!(anchor.update(true, 1.0, p, 10.0), AnchorOutcome::Captured);
        anchor.capture(p);
    }

    #[test]
    fn test_anchor_captured_on_first_saturated_tick_only() {
        let mut anchor = GroundedAnchor::new();
        let first = Vector2::new(1.0, 1.0);
        capture_at(&mut anchor, first);
        let outcome = anchor.update(true, 1.0, Vector2::new(3.0, 1.0), 10.0);
        assert_eq!(outcome, AnchorOutcome::Holding);
        assert_eq!(anchor.anchor_point(), Some(first));
        assert_eq!(anchor.saturated_run_length(), 2);
    }

    #[test]
    fn test_uncaptured_anchor_is_requested_again() {
        let mut anchor = GroundedAnchor::new();
        let p = Vector2::new(2.0, 0.0);
        assert_eq!(anchor.update(true, 1.0, p, 10.0), AnchorOutcome::Captured);
        assert_eq!(anchor.update(true, 1.0, p, 10.0), AnchorOutcome::Captured);
        assert_eq!(anchor.anchor_point(), None);
    }

    #[test]
    fn test_anchor_resets_when_unsaturated() {
        let mut anchor = GroundedAnchor::new();
        capture_at(&mut anchor, Vector2::zeros());
        let outcome = anchor.update(false, 1.0, Vector2::zeros(), 10.0);
        assert_eq!(outcome, AnchorOutcome::Idle);
        assert_eq!(anchor.anchor_point(), None);
        assert_eq!(anchor.saturated_run_length(), 0);
    }

    #[test]
    fn test_leaving_reach_is_open_motion() {
        let mut anchor = GroundedAnchor::new();
        capture_at(&mut anchor, Vector2::zeros());
        let outcome = anchor.update(true, 1.0, Vector2::new(12.0, 0.0), 10.0);
        assert_eq!(outcome, AnchorOutcome::OpenMotion);
    }

    #[test]
    fn test_accel_peak_tick_does_not_collapse() {
        let mut anchor = GroundedAnchor::new();
        capture_at(&mut anchor, Vector2::zeros());
        let outcome = anchor.update(true, 1.9, Vector2::new(12.0, 0.0), 10.0);
        assert_eq!(outcome, AnchorOutcome::Holding);
        assert_eq!(anchor.since_last_accel_peak(), 0);
    }

    #[test]
    fn test_invalidate_recaptures() {
        let mut anchor = GroundedAnchor::new();
        capture_at(&mut anchor, Vector2::zeros());
        anchor.invalidate();
        let p = Vector2::new(4.0, 4.0);
        capture_at(&mut anchor, p);
        assert_eq!(anchor.anchor_point(), Some(p));
    }
}
