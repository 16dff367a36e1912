//! Runs a dinner for a fixed time and prints who ate how much.

use std::{sync::Arc, time::Duration};

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{info, warn};
use tracing_subscriber::{fmt::time::uptime, EnvFilter};

use philosophers::dining::{Dinner, Pace, SeatingPlan, Table};

#[derive(Parser)]
#[command(name = "philosophers")]
#[command(version)]
#[command(about = "Dining philosophers over software-only Peterson locks")]
struct Cli {
    /// Number of philosophers (and forks)
    #[arg(short = 'n', long, env = "DINING_PHILOSOPHERS", default_value = "5")]
    philosophers: usize,

    /// Seconds to run before raising the stop signal
    #[arg(short, long, default_value = "60")]
    duration: u64,

    /// Nominal thinking time in milliseconds
    #[arg(long, default_value = "300")]
    think_ms: u64,

    /// Eating time in milliseconds
    #[arg(long, default_value = "300")]
    eat_ms: u64,

    /// Random spread applied to every sleep, in [0, 1)
    #[arg(long, default_value = "0.0", value_parser = parse_jitter)]
    jitter: f64,

    /// Seat that picks up its right fork first
    #[arg(long, default_value = "0")]
    reversed: usize,

    /// Seconds to wait for philosophers to finish after the stop signal
    #[arg(long, default_value = "10")]
    join_timeout: u64,

    /// Log every phase change
    #[arg(short, long)]
    verbose: bool,
}

fn parse_jitter(s: &str) -> Result<f64, String> {
    let jitter: f64 = s.parse().map_err(|e| format!("{e}"))?;
    if (0.0..1.0).contains(&jitter) {
        Ok(jitter)
    } else {
        Err(format!("jitter must be in [0, 1), got {s}"))
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_timer(uptime())
        .with_thread_names(true)
        .init();

    let plan = SeatingPlan::with_reversed(cli.philosophers, &[cli.reversed])
        .context("invalid seating")?;
    let table = Table::new(plan).context("laying the table")?;
    let pace = Pace::new(
        Duration::from_millis(cli.think_ms),
        Duration::from_millis(cli.eat_ms),
    )
    .with_jitter(cli.jitter);

    let dinner = Dinner::start(table, Arc::new(pace))?;
    let signal = dinner.stop_signal().clone();
    ctrlc::set_handler(move || {
        signal.raise();
    })
    .context("installing the Ctrl-C handler")?;

    if dinner.run_for(Duration::from_secs(cli.duration)) {
        info!(meals = ?dinner.meals(), "time is up, waiting for philosophers to finish eating");
    } else {
        warn!(meals = ?dinner.meals(), "interrupted, waiting for philosophers to finish eating");
    }
    let report = dinner.finish(Duration::from_secs(cli.join_timeout))?;

    println!("\n=== Dinner Complete ===");
    print!("{report}");
    println!(
        "\nNo deadlock. Every philosopher ate at least {} times.",
        report.min()
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use crate::parse_jitter;

    #[test]
    fn jitter_must_be_a_fraction() {
        assert_eq!(parse_jitter("0"), Ok(0.0));
        assert_eq!(parse_jitter("0.25"), Ok(0.25));
        assert!(parse_jitter("1").is_err());
        assert!(parse_jitter("-0.1").is_err());
        assert!(parse_jitter("NaN").is_err());
        assert!(parse_jitter("inf").is_err());
        assert!(parse_jitter("lots").is_err());
    }
}
