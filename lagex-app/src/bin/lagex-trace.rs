//! Prints a summary of recorded trace files.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use lagex_core::format_vec3;
use lagex_experiment::TraceRecord;

#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
    /// Trace files written by a session
    #[arg(required = true)]
    files: Vec<PathBuf>,
}

fn main() -> Result<()> {
    let args = Args::parse();

    for path in &args.files {
        let record = TraceRecord::read(path)
            .with_context(|| format!("cannot read trace {}", path.display()))?;
        let h = &record.header;
        println!("{}", path.display());
        println!(
            "  Experiment #{} with latency of {} ms",
            h.trial_index, h.latency_ms
        );
        println!(
            "  Source {} diameter {:.4}, Target {} diameter {:.4}",
            format_vec3(h.source),
            h.source_size,
            format_vec3(h.target),
            h.target_size
        );
        println!(
            "  {} samples, duration {:.4} s, path length {:.4}",
            record.samples.len(),
            record.duration(),
            record.path_length()
        );
        let direct = h.source.distance(h.target);
        if direct > 0.0 {
            println!("  path / direct distance: {:.3}", record.path_length() / direct);
        }
    }

    Ok(())
}
