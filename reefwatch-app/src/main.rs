use anyhow::Result;
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use reefwatch_schemas::parameters::Parameter;
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod config;
mod plotting;
mod report;

/// Water chemistry analytics for saltwater aquariums.
#[derive(Debug, Parser)]
#[command(name = "reefwatch", version, about)]
struct Cli {
    /// Directory holding `tanks/`, `salt_mixes/` and `tests/`.
    #[arg(long, global = true, default_value = "./data")]
    data: PathBuf,

    /// Evaluate as if today were this date (YYYY-MM-DD).
    #[arg(long, global = true)]
    as_of: Option<NaiveDate>,

    /// Print results as JSON instead of a report.
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Statistics, trends, predictions and alerts for a tank.
    Analyze {
        #[arg(long)]
        tank: String,
        /// Show a single parameter in detail.
        #[arg(long)]
        parameter: Option<Parameter>,
        /// Number of recent tests used for trend fitting.
        #[arg(long, default_value_t = reefwatch_core::analytics::DEFAULT_TREND_PERIODS)]
        periods: usize,
    },
    /// Overall 0-100 tank health score.
    Health {
        #[arg(long)]
        tank: String,
    },
    /// Predict the effect of a partial water change.
    WaterChange {
        #[arg(long)]
        tank: String,
        /// Percentage of the tank volume to replace.
        #[arg(long)]
        percent: f64,
        /// Salt mix to use instead of the tank's preferred one.
        #[arg(long)]
        salt_mix: Option<String>,
    },
    /// Maintenance tasks with their intervals and due dates.
    Schedule {
        #[arg(long)]
        tank: String,
    },
    /// Render parameter history charts as PNG files.
    Plot {
        #[arg(long)]
        tank: String,
        /// Output directory; defaults to `<data>/charts/<tank>`.
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// Record a new water test, e.g. `--set ph=8.2 --set nitrate=5`.
    LogTest {
        #[arg(long)]
        tank: String,
        /// Test date; defaults to today.
        #[arg(long)]
        date: Option<NaiveDate>,
        #[arg(long = "set", value_name = "PARAM=VALUE", value_parser = parse_reading)]
        readings: Vec<(Parameter, f64)>,
        #[arg(long)]
        notes: Option<String>,
    },
}

fn parse_reading(raw: &str) -> Result<(Parameter, f64), String> {
    let (name, value) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected PARAM=VALUE, got '{}'", raw))?;
    let parameter: Parameter = name.parse()?;
    let value: f64 = value
        .trim()
        .parse()
        .map_err(|_| format!("'{}' is not a number", value))?;
    if !value.is_finite() || value < 0.0 {
        return Err(format!("{} must be a non-negative number", parameter.label()));
    }
    Ok((parameter, value))
}

fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    let today = cli.as_of.unwrap_or_else(|| chrono::Local::now().date_naive());
    let kb = config::KnowledgeBase::load(&cli.data)?;
    let output = report::Output { json: cli.json };

    match cli.command {
        Command::Analyze { tank, parameter, periods } => {
            report::run_analyze(&kb, &tank, parameter, periods, today, output)
        }
        Command::Health { tank } => report::run_health(&kb, &tank, today, output),
        Command::WaterChange { tank, percent, salt_mix } => {
            report::run_water_change(&kb, &tank, percent, salt_mix.as_deref(), output)
        }
        Command::Schedule { tank } => report::run_schedule(&kb, &tank, today, output),
        Command::Plot { tank, out } => {
            let out = out.unwrap_or_else(|| cli.data.join("charts").join(&tank));
            report::run_plot(&kb, &tank, &out)
        }
        Command::LogTest { tank, date, readings, notes } => {
            report::run_log_test(&kb, &tank, date.unwrap_or(today), &readings, notes)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn readings_parse_from_key_value_pairs() {
        assert_eq!(parse_reading("nitrate=12.5"), Ok((Parameter::Nitrate, 12.5)));
        assert_eq!(parse_reading("pH= 8.1"), Ok((Parameter::Ph, 8.1)));
        assert!(parse_reading("nitrate").is_err());
        assert!(parse_reading("nitrate=lots").is_err());
        assert!(parse_reading("nitrate=-1").is_err());
        assert!(parse_reading("sulfur=1").is_err());
    }

    #[test]
    fn cli_accepts_global_options_after_the_subcommand() {
        let cli = Cli::try_parse_from([
            "reefwatch", "water-change", "--tank", "TANK-01", "--percent", "15", "--as-of", "2024-03-01",
        ])
        .unwrap();
        assert_eq!(cli.as_of, NaiveDate::from_ymd_opt(2024, 3, 1));
        assert!(matches!(cli.command, Command::WaterChange { percent, .. } if percent == 15.0));
    }
}
