//! Radial Follow - adaptive radial deadzone filtering for pen input
//!
//! Turns a noisy, high-rate stream of digitizer positions into a cursor
//! that ignores small involuntary jitter inside a deadzone, lags fast
//! strokes by at most an outer radius, and passes deliberate stops
//! straight through. The deadzone radii scale with velocity and with
//! whether the pen is speeding up or slowing down.

pub mod anchor;
pub mod config;
pub mod curve;
pub mod error;
pub mod filter;
pub mod kinematics;
pub mod params;
pub mod radius;
pub mod sim;
pub mod spin;
pub mod units;

// Re-export main types
pub use config::{load_config, FilterConfig};
pub use error::FilterError;
pub use filter::{FilterDiagnostics, RadialFollowFilter, ResetReason, Sample};
pub use params::FilterParams;
pub use units::{DigitizerSpec, TabletReport, TabletSpaceFilter};
