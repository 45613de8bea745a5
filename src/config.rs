use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::FilterError;
use crate::params::FilterParams;

/// On-disk filter settings. Missing keys take the filter defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FilterConfig {
    pub outer_radius: f64,
    pub inner_radius: f64,
    pub smoothing_coefficient: f64,
    pub soft_knee_scale: f64,
    pub smoothing_leak_coefficient: f64,
    pub velocity_divisor: f64,
    pub minimum_radius_multiplier: f64,
    pub radial_mult_power: f64,
    pub minimum_smoothing_divisor: f64,
    pub velocity_scales_knee: bool,
    pub raw_accel_threshold: f64,
    pub accel_mult_power: f64,
    pub advanced: bool,
    pub raw_velocity_threshold: f64,
    pub spin_confidence: f64,
    pub index_factor_multiple: f64,
    pub grounded: bool,
    pub reset_timeout_ms: f64,
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self::from(&FilterParams::default())
    }
}

impl From<&FilterParams> for FilterConfig {
    fn from(p: &FilterParams) -> Self {
        Self {
            outer_radius: p.outer_radius(),
            inner_radius: p.inner_radius(),
            smoothing_coefficient: p.smoothing_coefficient(),
            soft_knee_scale: p.soft_knee_scale(),
            smoothing_leak_coefficient: p.smoothing_leak_coefficient(),
            velocity_divisor: p.velocity_divisor(),
            minimum_radius_multiplier: p.minimum_radius_multiplier(),
            radial_mult_power: p.radial_mult_power(),
            minimum_smoothing_divisor: p.minimum_smoothing_divisor(),
            velocity_scales_knee: p.velocity_scales_knee,
            raw_accel_threshold: p.raw_accel_threshold(),
            accel_mult_power: p.accel_mult_power(),
            advanced: p.advanced,
            raw_velocity_threshold: p.raw_velocity_threshold(),
            spin_confidence: p.spin_confidence(),
            index_factor_multiple: p.index_factor_multiple(),
            grounded: p.grounded,
            reset_timeout_ms: p.reset_timeout_ms(),
        }
    }
}

impl FilterConfig {
    /// Clamp every value into range. Adjusted values are logged, not rejected.
    pub fn to_params(&self) -> FilterParams {
        let mut p = FilterParams::default();

        let mut assign = |name: &str,
                          value: f64,
                          set: fn(&mut FilterParams, f64),
                          get: fn(&FilterParams) -> f64| {
            set(&mut p, value);
            let applied = get(&p);
            if applied != value {
                warn!(
                    parameter = name,
                    requested = value,
                    applied,
                    "parameter clamped into range"
                );
            }
        };

        assign(
            "outer_radius",
            self.outer_radius,
            FilterParams::set_outer_radius,
            FilterParams::outer_radius,
        );
        assign(
            "inner_radius",
            self.inner_radius,
            FilterParams::set_inner_radius,
            FilterParams::inner_radius,
        );
        assign(
            "smoothing_coefficient",
            self.smoothing_coefficient,
            FilterParams::set_smoothing_coefficient,
            FilterParams::smoothing_coefficient,
        );
        assign(
            "soft_knee_scale",
            self.soft_knee_scale,
            FilterParams::set_soft_knee_scale,
            FilterParams::soft_knee_scale,
        );
        assign(
            "smoothing_leak_coefficient",
            self.smoothing_leak_coefficient,
            FilterParams::set_smoothing_leak_coefficient,
            FilterParams::smoothing_leak_coefficient,
        );
        assign(
            "velocity_divisor",
            self.velocity_divisor,
            FilterParams::set_velocity_divisor,
            FilterParams::velocity_divisor,
        );
        assign(
            "minimum_radius_multiplier",
            self.minimum_radius_multiplier,
            FilterParams::set_minimum_radius_multiplier,
            FilterParams::minimum_radius_multiplier,
        );
        assign(
            "radial_mult_power",
            self.radial_mult_power,
            FilterParams::set_radial_mult_power,
            FilterParams::radial_mult_power,
        );
        assign(
            "minimum_smoothing_divisor",
            self.minimum_smoothing_divisor,
            FilterParams::set_minimum_smoothing_divisor,
            FilterParams::minimum_smoothing_divisor,
        );
        assign(
            "raw_accel_threshold",
            self.raw_accel_threshold,
            FilterParams::set_raw_accel_threshold,
            FilterParams::raw_accel_threshold,
        );
        assign(
            "accel_mult_power",
            self.accel_mult_power,
            FilterParams::set_accel_mult_power,
            FilterParams::accel_mult_power,
        );
        assign(
            "raw_velocity_threshold",
            self.raw_velocity_threshold,
            FilterParams::set_raw_velocity_threshold,
            FilterParams::raw_velocity_threshold,
        );
        assign(
            "spin_confidence",
            self.spin_confidence,
            FilterParams::set_spin_confidence,
            FilterParams::spin_confidence,
        );
        assign(
            "index_factor_multiple",
            self.index_factor_multiple,
            FilterParams::set_index_factor_multiple,
            FilterParams::index_factor_multiple,
        );
        assign(
            "reset_timeout_ms",
            self.reset_timeout_ms,
            FilterParams::set_reset_timeout_ms,
            FilterParams::reset_timeout_ms,
        );

        p.velocity_scales_knee = self.velocity_scales_knee;
        p.advanced = self.advanced;
        p.grounded = self.grounded;
        p
    }
}

/// Load settings from a `.toml` or `.json` file.
pub fn load_config(path: &Path) -> Result<FilterConfig, FilterError> {
    let raw = fs::read_to_string(path)?;
    match path.extension().and_then(|ext| ext.to_str()) {
        Some("toml") => Ok(toml::from_str(&raw)?),
        Some("json") => Ok(serde_json::from_str(&raw)?),
        other => Err(FilterError::UnsupportedFormat(
            other.unwrap_or("<none>").to_string(),
        )),
    }
}
