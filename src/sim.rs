//! Simulation harness for the radial follow filter
//!
//! Generates a synthetic pen stroke with digitizer jitter and runs the
//! filter over it, recording raw and filtered errors against the true pen
//! position.

use std::path::Path;

use nalgebra::Vector2;
use rand::SeedableRng;
use rand_distr::{Distribution, Normal};
use serde::{Deserialize, Serialize};

use crate::error::FilterError;
use crate::filter::{RadialFollowFilter, Sample};
use crate::params::FilterParams;

/// True pen motion
#[derive(Debug, Clone)]
pub struct StrokeState {
    pub position: Vector2<f64>,
    pub velocity: Vector2<f64>,
}

impl StrokeState {
    pub fn new(position: Vector2<f64>, velocity: Vector2<f64>) -> Self {
        Self { position, velocity }
    }
}

/// Simulation configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    /// Report interval [ms]
    pub dt_ms: f64,
    pub steps: usize,
    /// Stroke speed along x [mm/ms]
    pub speed: f64,
    /// Digitizer jitter standard deviation [mm]
    pub sigma_jitter: f64,
    /// Step at which the pen stops dead
    pub stop_step: Option<usize>,
    /// Step whose report arrives after a stall
    pub stall_step: Option<usize>,
    /// Length of the stall [ms]
    pub stall_ms: f64,
    pub seed: u64,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            dt_ms: 1.0,
            steps: 1000,
            speed: 0.5,
            sigma_jitter: 0.02,
            stop_step: Some(600),
            stall_step: None,
            stall_ms: 80.0,
            seed: 42,
        }
    }
}

impl SimConfig {
    pub fn validate(&self) -> Result<(), FilterError> {
        if !(self.dt_ms.is_finite() && self.dt_ms > 0.0) {
            return Err(FilterError::InvalidConfig("dt_ms must be finite and > 0".to_string()));
        }
        if self.steps == 0 {
            return Err(FilterError::InvalidConfig("steps must be greater than zero".to_string()));
        }
        if !(self.speed.is_finite() && self.speed >= 0.0) {
            return Err(FilterError::InvalidConfig("speed must be finite and >= 0".to_string()));
        }
        if !(self.sigma_jitter.is_finite() && self.sigma_jitter >= 0.0) {
            return Err(FilterError::InvalidConfig(
                "sigma_jitter must be finite and >= 0".to_string(),
            ));
        }
        if !(self.stall_ms.is_finite() && self.stall_ms > 0.0) {
            return Err(FilterError::InvalidConfig("stall_ms must be finite and > 0".to_string()));
        }
        Ok(())
    }
}

/// Simulation results for one report
#[derive(Debug, Clone, Serialize)]
pub struct SimStep {
    pub t_ms: f64,
    pub truth_x: f64,
    pub truth_y: f64,
    pub raw_x: f64,
    pub raw_y: f64,
    pub cursor_x: f64,
    pub cursor_y: f64,
    /// Distance from cursor to raw report
    pub lag: f64,
    pub err_raw: f64,
    pub err_filtered: f64,
    pub outer_radius: f64,
    pub snap_blend: f64,
}

/// Aggregate metrics over one run
#[derive(Debug, Clone, Serialize)]
pub struct SimSummary {
    pub steps: usize,
    pub rms_err_raw: f64,
    pub rms_err_filtered: f64,
    pub peak_lag: f64,
    pub settle_ticks: Option<usize>,
}

/// Run the stroke simulation
pub fn run_simulation(
    config: &SimConfig,
    params: FilterParams,
) -> Result<Vec<SimStep>, FilterError> {
    config.validate()?;

    let mut rng = rand::rngs::StdRng::seed_from_u64(config.seed);
    let jitter = Normal::new(0.0, config.sigma_jitter)
        .map_err(|e| FilterError::InvalidConfig(format!("jitter distribution: {e}")))?;

    let mut stroke = StrokeState::new(Vector2::zeros(), Vector2::new(config.speed, 0.0));
    let mut filter = RadialFollowFilter::new(params);
    let mut results = Vec::with_capacity(config.steps);
    let mut t_ms = 0.0;

    for step in 0..config.steps {
        let delta_ms = if step == 0 {
            f64::INFINITY
        } else if config.stall_step == Some(step) {
            config.stall_ms
        } else {
            config.dt_ms
        };
        if step > 0 {
            t_ms += delta_ms;
        }

        if config.stop_step == Some(step) {
            stroke.velocity = Vector2::zeros();
        }
        if step > 0 {
            stroke.position += stroke.velocity * delta_ms;
        }

        let raw = stroke.position + Vector2::new(jitter.sample(&mut rng), jitter.sample(&mut rng));
        let cursor = filter.filter(Sample::new(raw, 0, delta_ms));
        let diag = filter.diagnostics();

        results.push(SimStep {
            t_ms,
            truth_x: stroke.position.x,
            truth_y: stroke.position.y,
            raw_x: raw.x,
            raw_y: raw.y,
            cursor_x: cursor.x,
            cursor_y: cursor.y,
            lag: (cursor - raw).norm(),
            err_raw: (raw - stroke.position).norm(),
            err_filtered: (cursor - stroke.position).norm(),
            outer_radius: diag.outer_radius,
            snap_blend: diag.snap_blend,
        });
    }

    Ok(results)
}

/// Calculate RMS error
pub fn rms_error(errors: &[f64]) -> f64 {
    if errors.is_empty() {
        return 0.0;
    }
    let sum_sq: f64 = errors.iter().map(|&e| e * e).sum();
    (sum_sq / errors.len() as f64).sqrt()
}

/// Largest cursor-to-raw distance over the run
pub fn peak_lag(results: &[SimStep]) -> f64 {
    results.iter().map(|s| s.lag).fold(0.0f64, f64::max)
}

/// Steps after `from` until the filtered error first drops below `threshold`
pub fn settle_ticks(results: &[SimStep], from: usize, threshold: f64) -> Option<usize> {
    results
        .get(from..)?
        .iter()
        .position(|step| step.err_filtered < threshold)
}

/// Summarise a run; settling is measured from the stop step when there is one.
pub fn summarize(config: &SimConfig, results: &[SimStep], settle_threshold: f64) -> SimSummary {
    let raw: Vec<f64> = results.iter().map(|s| s.err_raw).collect();
    let filtered: Vec<f64> = results.iter().map(|s| s.err_filtered).collect();
    SimSummary {
        steps: results.len(),
        rms_err_raw: rms_error(&raw),
        rms_err_filtered: rms_error(&filtered),
        peak_lag: peak_lag(results),
        settle_ticks: config
            .stop_step
            .and_then(|stop| settle_ticks(results, stop, settle_threshold)),
    }
}

/// Write per-step results as CSV
pub fn write_csv(path: &Path, results: &[SimStep]) -> Result<(), FilterError> {
    let mut wtr = csv::Writer::from_path(path)?;
    for step in results {
        wtr.serialize(step)?;
    }
    wtr.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_simulation_runs() {
        let config = SimConfig {
            steps: 100,
            stop_step: Some(50),
            ..Default::default()
        };
        let results = run_simulation(&config, FilterParams::default()).unwrap();
        assert_eq!(results.len(), 100);
        assert!(results.iter().all(|s| s.cursor_x.is_finite() && s.cursor_y.is_finite()));
    }

    #[test]
    fn test_simulation_is_deterministic() {
        let config = SimConfig {
            steps: 50,
            ..Default::default()
        };
        let a = run_simulation(&config, FilterParams::default()).unwrap();
        let b = run_simulation(&config, FilterParams::default()).unwrap();
        let xs = |r: &[SimStep]| r.iter().map(|s| s.cursor_x).collect::<Vec<_>>();
        assert_eq!(xs(&a), xs(&b));
    }

    #[test]
    fn test_invalid_config_rejected() {
        let config = SimConfig {
            dt_ms: 0.0,
            ..Default::default()
        };
        assert!(matches!(
            run_simulation(&config, FilterParams::default()),
            Err(FilterError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_stall_resets_cursor_to_raw() {
        let config = SimConfig {
            steps: 40,
            stop_step: None,
            stall_step: Some(30),
            ..Default::default()
        };
        let results = run_simulation(&config, FilterParams::default()).unwrap();
        let stalled = &results[30];
        assert_eq!(stalled.lag, 0.0);
    }

    #[test]
    fn test_rms_error() {
        let errors = vec![0.1, 0.2, 0.3];
        let rms = rms_error(&errors);
        let expected = ((0.01_f64 + 0.04 + 0.09) / 3.0).sqrt();
        assert!((rms - expected).abs() < 1e-10);
    }

    #[test]
    fn test_write_csv() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sim.csv");
        let config = SimConfig {
            steps: 5,
            ..Default::default()
        };
        let results = run_simulation(&config, FilterParams::default()).unwrap();
        write_csv(&path, &results).unwrap();
        let text = std::fs::read_to_string(&path).unwrap();
        assert!(text.starts_with("t_ms,truth_x"));
        assert_eq!(text.lines().count(), 6);
    }
}
