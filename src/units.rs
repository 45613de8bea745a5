//! Device-unit adapter
//!
//! Digitizers report integer-ish coordinates in their own resolution. The
//! filter works in millimetres, so reports are scaled by
//! `physical size / max raw coordinate` on the way in and back on the way out.

use std::time::Instant;

use nalgebra::Vector2;

use crate::filter::{RadialFollowFilter, Sample};
use crate::params::FilterParams;

/// Physical digitizer description.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DigitizerSpec {
    pub width_mm: f64,
    pub height_mm: f64,
    pub max_x: f64,
    pub max_y: f64,
}

impl DigitizerSpec {
    /// Millimetres per device unit on each axis. Degenerate axes map 1:1.
    pub fn mm_scale(&self) -> Vector2<f64> {
        let axis = |size: f64, max: f64| {
            let scale = size / max;
            if scale.is_finite() && scale > 0.0 {
                scale
            } else {
                1.0
            }
        };
        Vector2::new(axis(self.width_mm, self.max_x), axis(self.height_mm, self.max_y))
    }
}

/// A tablet report in device units.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TabletReport {
    pub position: Vector2<f64>,
    pub pressure: u32,
}

/// Milliseconds between successive restarts of a monotonic clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct DeltaStopwatch {
    last: Option<Instant>,
}

impl DeltaStopwatch {
    pub fn new() -> Self {
        Self::default()
    }

    /// Time since the previous restart [ms]; infinite on the first call.
    pub fn restart(&mut self) -> f64 {
        let now = Instant::now();
        let elapsed = match self.last {
            Some(last) => now.duration_since(last).as_secs_f64() * 1000.0,
            None => f64::INFINITY,
        };
        self.last = Some(now);
        elapsed
    }
}

/// Radial follow filter operating on device-unit reports.
#[derive(Debug, Clone)]
pub struct TabletSpaceFilter {
    core: RadialFollowFilter,
    mm_scale: Vector2<f64>,
    stopwatch: DeltaStopwatch,
}

impl TabletSpaceFilter {
    pub fn new(params: FilterParams, digitizer: DigitizerSpec) -> Self {
        Self {
            core: RadialFollowFilter::new(params),
            mm_scale: digitizer.mm_scale(),
            stopwatch: DeltaStopwatch::new(),
        }
    }

    pub fn core(&self) -> &RadialFollowFilter {
        &self.core
    }

    pub fn core_mut(&mut self) -> &mut RadialFollowFilter {
        &mut self.core
    }

    /// Filter a report timed by the wall clock.
    pub fn consume(&mut self, report: TabletReport) -> TabletReport {
        let delta_ms = self.stopwatch.restart();
        self.consume_with_delta(report, delta_ms)
    }

    /// Filter a report with an explicit time since the previous one.
    pub fn consume_with_delta(&mut self, report: TabletReport, delta_ms: f64) -> TabletReport {
        let position_mm = report.position.component_mul(&self.mm_scale);
        let filtered = self
            .core
            .filter(Sample::new(position_mm, report.pressure, delta_ms));
        TabletReport {
            position: filtered.component_div(&self.mm_scale),
            pressure: report.pressure,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ctl480() -> DigitizerSpec {
        DigitizerSpec {
            width_mm: 152.0,
            height_mm: 95.0,
            max_x: 15200.0,
            max_y: 9500.0,
        }
    }

    #[test]
    fn test_mm_scale() {
        let scale = ctl480().mm_scale();
        assert!((scale.x - 0.01).abs() < 1e-15);
        assert!((scale.y - 0.01).abs() < 1e-15);
    }

    #[test]
    fn test_degenerate_digitizer_maps_one_to_one() {
        let spec = DigitizerSpec {
            width_mm: 0.0,
            height_mm: 95.0,
            max_x: 0.0,
            max_y: 9500.0,
        };
        assert_eq!(spec.mm_scale().x, 1.0);
    }

    #[test]
    fn test_first_report_passes_through_with_pressure() {
        let mut filter = TabletSpaceFilter::new(FilterParams::default(), ctl480());
        let report = TabletReport {
            position: Vector2::new(7600.0, 4750.0),
            pressure: 812,
        };
        let out = filter.consume(report);
        assert!((out.position - report.position).norm() < 1e-9);
        assert_eq!(out.pressure, 812);
    }

    #[test]
    fn test_stopwatch_first_restart_is_infinite() {
        let mut stopwatch = DeltaStopwatch::new();
        assert!(stopwatch.restart().is_infinite());
        assert!(stopwatch.restart() >= 0.0);
    }
}
