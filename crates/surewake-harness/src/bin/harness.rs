//! CLI entrypoint for the surewake scenario harness.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};

use surewake_harness::{all_scenarios, HarnessError, HarnessReport};

/// Scenario tooling for surewake.
#[derive(Debug, Parser)]
#[command(name = "surewake-harness")]
#[command(about = "Scenario harness for the surewake condition variable")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// List available scenarios.
    List,
    /// Run scenarios and report outcomes.
    Run {
        /// Only run scenarios whose name contains this substring.
        #[arg(long)]
        filter: Option<String>,
        /// Print the report as JSON instead of a table.
        #[arg(long)]
        json: bool,
        /// Also write a markdown report to this path.
        #[arg(long)]
        report: Option<PathBuf>,
        /// Optional fixed timestamp string for deterministic report output.
        #[arg(long)]
        timestamp: Option<String>,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    match cli.command {
        Command::List => {
            for scenario in all_scenarios() {
                println!("{:<28} {}", scenario.name, scenario.summary);
            }
            ExitCode::SUCCESS
        }
        Command::Run {
            filter,
            json,
            report,
            timestamp,
        } => match run(filter.as_deref(), json, report.as_deref(), timestamp) {
            Ok(all_passed) => {
                if all_passed {
                    ExitCode::SUCCESS
                } else {
                    ExitCode::FAILURE
                }
            }
            Err(err) => {
                eprintln!("harness error: {err}");
                ExitCode::FAILURE
            }
        },
    }
}

fn run(
    filter: Option<&str>,
    json: bool,
    report_path: Option<&std::path::Path>,
    timestamp: Option<String>,
) -> Result<bool, HarnessError> {
    let outcomes: Vec<_> = all_scenarios()
        .iter()
        .filter(|s| filter.is_none_or(|f| s.name.contains(f)))
        .map(|s| s.execute())
        .collect();
    let report = HarnessReport::from_outcomes(outcomes, timestamp);

    if json {
        println!("{}", report.to_json()?);
    } else {
        for outcome in &report.outcomes {
            let status = if outcome.passed { "PASS" } else { "FAIL" };
            match &outcome.detail {
                Some(detail) => println!("{status}  {:<28} {detail}", outcome.name),
                None => println!("{status}  {:<28}", outcome.name),
            }
        }
        println!(
            "{} total, {} passed, {} failed",
            report.total, report.passed, report.failed
        );
    }
    if let Some(path) = report_path {
        report.write_markdown(path)?;
    }
    Ok(report.all_passed())
}
