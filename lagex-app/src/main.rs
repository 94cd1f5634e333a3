mod app;
mod sim;

use std::path::PathBuf;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use app::{App, AppOptions};

/// Runs a simulated delayed-pose targeting session.
#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
    /// Directory for trace files and session results
    #[arg(long, default_value = "traces")]
    trace_dir: PathBuf,

    /// Seed for trial placement
    #[arg(long)]
    seed: Option<u64>,

    /// Pace frames at the tracking rate instead of running flat out
    #[arg(long)]
    realtime: bool,

    /// Warm-up trials before the measured sweep
    #[arg(long, default_value_t = 3)]
    training: usize,

    /// Tracking frame rate in Hz
    #[arg(long, default_value_t = 90.0)]
    fps: f64,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(true)
        .init();

    let args = Args::parse();
    anyhow::ensure!(args.fps > 0.0, "frame rate must be positive");

    let app = App::new(AppOptions {
        results_path: args.trace_dir.join("session_results.json"),
        trace_dir: args.trace_dir,
        seed: args.seed,
        realtime: args.realtime,
        training_trials: args.training,
        frame_rate: args.fps,
        max_seconds: 1800.0,
    })?;
    let results = app.run()?;

    println!("\nSession completed: {} measured trials.", results.len());
    for r in &results {
        println!(
            "  trial {:>2} @ {:>3} ms: {:.3} s",
            r.trial_index, r.latency_ms, r.movement_time
        );
    }

    Ok(())
}
