use anyhow::Context;
use clap::Parser;
use perf_monitor::{logging, Config, Sampler};
use std::thread;
use std::time::Duration;

/// Samples this process for a while and prints the usage report.
#[derive(Parser, Debug)]
#[command(version, about)]
struct Cli {
    /// Seconds to keep the sampler armed.
    #[arg(short, long, default_value_t = 3)]
    duration: u64,
    /// Seconds between samples. Defaults to the loaded config.
    #[arg(short, long)]
    interval: Option<u64>,
    /// Print the snapshot as JSON instead of the three-line report.
    #[arg(long)]
    json: bool,
}

fn main() -> anyhow::Result<()> {
    logging::init();
    let cli = Cli::parse();

    let mut config = Config::load();
    if let Some(secs) = cli.interval {
        config.poll_interval_secs = secs;
    }

    let mut sampler = Sampler::new(&config);
    sampler.start().context("failed to start sampler")?;
    thread::sleep(Duration::from_secs(cli.duration));
    let snapshot = sampler.stop().context("sampler was not running")?;

    if cli.json {
        println!("{}", serde_json::to_string_pretty(&snapshot)?);
    } else {
        println!("{snapshot}");
    }
    Ok(())
}
