//! Sudden-Stop Example
//!
//! Runs a fast stroke that stops dead and compares raw and filtered error

use radial_follow::sim::{peak_lag, rms_error, run_simulation, settle_ticks, SimConfig};
use radial_follow::FilterParams;

fn main() -> Result<(), radial_follow::FilterError> {
    println!("Running radial follow sudden-stop simulation...\n");

    let config = SimConfig {
        dt_ms: 1.0,
        steps: 400,
        speed: 1.5,
        sigma_jitter: 0.03,
        stop_step: Some(200),
        stall_step: None,
        stall_ms: 80.0,
        seed: 7,
    };

    let params = FilterParams::default().with(|p| {
        p.set_velocity_divisor(1.0);
        p.set_inner_radius(2.0);
        p.set_outer_radius(4.0);
        p.set_minimum_radius_multiplier(0.05);
    });

    println!("Configuration:");
    println!("  Report interval: {} ms", config.dt_ms);
    println!("  Stroke speed: {} mm/ms", config.speed);
    println!("  Jitter sigma: {} mm", config.sigma_jitter);
    println!("  Stop at step: {:?}", config.stop_step);
    println!();

    let results = run_simulation(&config, params)?;

    let stop = config.stop_step.unwrap_or(0);
    let (moving, resting) = results.split_at(stop);

    let err_raw = |steps: &[radial_follow::sim::SimStep]| {
        rms_error(&steps.iter().map(|s| s.err_raw).collect::<Vec<_>>())
    };
    let err_filtered = |steps: &[radial_follow::sim::SimStep]| {
        rms_error(&steps.iter().map(|s| s.err_filtered).collect::<Vec<_>>())
    };

    println!("METRICS SUMMARY");
    println!("===============");
    println!("\nWhile moving:");
    println!("  Raw RMS error:      {:.6}", err_raw(moving));
    println!("  Filtered RMS error: {:.6}", err_filtered(moving));
    println!("  Peak lag:           {:.6}", peak_lag(moving));
    println!("\nAt rest:");
    println!("  Raw RMS error:      {:.6}", err_raw(resting));
    println!("  Filtered RMS error: {:.6}", err_filtered(resting));
    println!(
        "\nSettle ticks after stop (threshold 0.1 mm): {:?}",
        settle_ticks(&results, stop, 0.1)
    );
    println!("Snap blend on stop: {:.3}", results[stop].snap_blend);

    Ok(())
}
