use anyhow::{Context, Result};
use clap::Parser;
use std::fs;
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::EnvFilter;

use radial_follow::config::{load_config, FilterConfig};
use radial_follow::sim::{run_simulation, summarize, write_csv, SimConfig};

#[derive(Debug, Parser)]
#[command(name = "radial_follow_sim")]
#[command(about = "Run the adaptive radial follow filter over a synthetic pen stroke")]
struct Cli {
    /// Filter settings (.toml or .json); defaults when omitted
    #[arg(long)]
    config: Option<PathBuf>,

    #[arg(long, default_value = "output-radial-follow")]
    outdir: PathBuf,

    #[arg(long)]
    seed: Option<u64>,

    #[arg(long)]
    steps: Option<usize>,

    /// Stroke speed [mm/ms]
    #[arg(long)]
    speed: Option<f64>,

    /// Jitter standard deviation [mm]
    #[arg(long)]
    jitter: Option<f64>,

    /// Step at which the pen stops; negative disables the stop
    #[arg(long, allow_negative_numbers = true)]
    stop_step: Option<i64>,

    /// Filtered error [mm] that counts as settled after the stop
    #[arg(long, default_value_t = 0.05)]
    settle_threshold: f64,
}

fn main() -> Result<()> {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    let cli = Cli::parse();

    let filter_config = match &cli.config {
        Some(path) => load_config(path)
            .with_context(|| format!("failed to load filter config: {}", path.display()))?,
        None => FilterConfig::default(),
    };
    let params = filter_config.to_params();

    let mut sim = SimConfig::default();
    if let Some(seed) = cli.seed {
        sim.seed = seed;
    }
    if let Some(steps) = cli.steps {
        sim.steps = steps;
    }
    if let Some(speed) = cli.speed {
        sim.speed = speed;
    }
    if let Some(jitter) = cli.jitter {
        sim.sigma_jitter = jitter;
    }
    if let Some(stop) = cli.stop_step {
        sim.stop_step = usize::try_from(stop).ok();
    }

    info!(
        steps = sim.steps,
        speed = sim.speed,
        seed = sim.seed,
        "running stroke simulation"
    );
    let results = run_simulation(&sim, params).context("simulation failed")?;
    let summary = summarize(&sim, &results, cli.settle_threshold);

    fs::create_dir_all(&cli.outdir).with_context(|| {
        format!(
            "failed to create output directory: {}",
            cli.outdir.display()
        )
    })?;
    let csv_path = cli.outdir.join("stroke.csv");
    write_csv(&csv_path, &results)
        .with_context(|| format!("failed to write {}", csv_path.display()))?;

    let summary_path = cli.outdir.join("summary.json");
    fs::write(&summary_path, serde_json::to_string_pretty(&summary)?)
        .with_context(|| format!("failed to write {}", summary_path.display()))?;

    println!("RMS error raw:      {:.6} mm", summary.rms_err_raw);
    println!("RMS error filtered: {:.6} mm", summary.rms_err_filtered);
    println!("Peak lag:           {:.6} mm", summary.peak_lag);
    match summary.settle_ticks {
        Some(ticks) => println!("Settled after stop: {ticks} reports"),
        None => println!("Settled after stop: n/a"),
    }
    println!("Output directory: {}", cli.outdir.display());
    Ok(())
}
