#![forbid(unsafe_code)]
//! `tracelab` — run simulator scenarios and grade their traces.
//!
//! Progress goes to stdout; per-scenario results and checker diagnostics go
//! to stderr, keeping machine-readable output (`--json`) clean. A completed
//! run exits 0 regardless of scores; scores are informational.

mod harness;

use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use harness::HarnessError;
use std::path::PathBuf;
use tracelab_conformance::run::evaluate_trace;
use tracelab_conformance::scenario::{suite_by_name, Scenario, ScenarioKind, SUITE_NAMES};
use tracelab_conformance::ScenarioReport;
use tracelab_core::RunnerConfig;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "tracelab", version, about = "Trace-driven protocol conformance grader")]
struct Cli {
    /// Path to a TOML runner configuration; defaults to environment-derived
    /// settings.
    #[arg(long)]
    config: Option<PathBuf>,
    /// Simulator executable, overriding configuration.
    #[arg(long)]
    simulator: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Launch the simulator for each scenario and grade the captured trace.
    Run {
        /// Suite to run (or "all").
        #[arg(long, default_value = "all")]
        suite: String,
        /// Print a JSON summary to stdout at the end.
        #[arg(long)]
        json: bool,
    },
    /// Grade a previously captured trace file without launching anything.
    Replay {
        /// Trace file with the simulator's line-oriented output.
        #[arg(long)]
        trace: PathBuf,
        /// Suite whose scenarios the trace is graded against.
        #[arg(long)]
        suite: String,
        /// Restrict to one scenario of the suite.
        #[arg(long)]
        scenario: Option<String>,
        /// Print a JSON summary to stdout at the end.
        #[arg(long)]
        json: bool,
    },
}

fn selected_suites(which: &str) -> anyhow::Result<Vec<&'static str>> {
    if which == "all" {
        return Ok(SUITE_NAMES.to_vec());
    }
    match SUITE_NAMES.iter().find(|name| **name == which) {
        Some(name) => Ok(vec![*name]),
        None => bail!("unknown suite {which:?}; available: {}", SUITE_NAMES.join(", ")),
    }
}

fn emit_report(report: &ScenarioReport) {
    for note in &report.diagnostics {
        eprintln!("{note}");
    }
    eprintln!("  Result: {}", report.summary());
}

fn json_summary(reports: &[ScenarioReport], interrupted: bool) -> serde_json::Value {
    serde_json::json!({
        "interrupted": interrupted,
        "scenarios": reports
            .iter()
            .map(|r| {
                serde_json::json!({
                    "name": r.name,
                    "success": r.success,
                    "evaluated": r.evaluated,
                    "diagnostics": r.diagnostics,
                })
            })
            .collect::<Vec<_>>(),
    })
}

/// Report for a scenario whose process never produced a gradable trace.
fn process_failure_report(scenario: &Scenario, why: String) -> ScenarioReport {
    let evaluated = match &scenario.kind {
        // The single aggregate check is counted and failed.
        ScenarioKind::Aggregate(_) => 1,
        // Conformance scenarios report through the diagnostic channel.
        ScenarioKind::Rounds(_) => 0,
    };
    ScenarioReport {
        name: scenario.name.clone(),
        success: 0,
        evaluated,
        diagnostics: vec![why],
    }
}

async fn run_scenario(
    cfg: &RunnerConfig,
    scenario: &Scenario,
) -> Result<ScenarioReport, HarnessError> {
    match harness::capture_output(&scenario.command).await {
        Ok(capture) => {
            let mut report = evaluate_trace(scenario, &capture.output, &cfg.downloads_dir);
            if !capture.status.success() {
                report
                    .diagnostics
                    .push(format!("simulator exited abnormally: {}", capture.status));
            }
            Ok(report)
        }
        Err(HarnessError::Interrupted) => Err(HarnessError::Interrupted),
        Err(err) => {
            tracing::warn!(scenario = %scenario.name, %err, "simulator did not run");
            Ok(process_failure_report(scenario, err.to_string()))
        }
    }
}

async fn run_suites(cfg: &RunnerConfig, which: &str, json: bool) -> anyhow::Result<()> {
    let mut reports = Vec::new();
    let mut interrupted = false;

    'suites: for suite in selected_suites(which)? {
        let scenarios =
            suite_by_name(cfg, suite).with_context(|| format!("suite {suite} not found"))?;
        for scenario in scenarios {
            println!("Running {}...", scenario.name);
            match run_scenario(cfg, &scenario).await {
                Ok(report) => {
                    emit_report(&report);
                    reports.push(report);
                }
                // Only the interrupt escapes run_scenario as control flow.
                Err(_) => {
                    eprintln!("Interrupted");
                    interrupted = true;
                    break 'suites;
                }
            }
        }
    }

    if json {
        println!("{}", serde_json::to_string_pretty(&json_summary(&reports, interrupted))?);
    }
    Ok(())
}

fn replay(
    cfg: &RunnerConfig,
    trace: &PathBuf,
    suite: &str,
    only: Option<&str>,
    json: bool,
) -> anyhow::Result<()> {
    let text = std::fs::read_to_string(trace)
        .with_context(|| format!("reading trace {}", trace.display()))?;
    let Some(scenarios) = suite_by_name(cfg, suite) else {
        bail!("unknown suite {suite:?}; available: {}", SUITE_NAMES.join(", "));
    };

    let mut reports = Vec::new();
    for scenario in scenarios {
        if only.is_some_and(|name| name != scenario.name) {
            continue;
        }
        println!("Replaying {}...", scenario.name);
        let report = evaluate_trace(&scenario, &text, &cfg.downloads_dir);
        emit_report(&report);
        reports.push(report);
    }
    if reports.is_empty() {
        bail!("no scenario matched {:?} in suite {suite}", only.unwrap_or("<any>"));
    }

    if json {
        println!("{}", serde_json::to_string_pretty(&json_summary(&reports, false))?);
    }
    Ok(())
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let mut cfg = match &cli.config {
        Some(path) => RunnerConfig::load_from_file(path)
            .with_context(|| format!("loading {}", path.display()))?,
        None => RunnerConfig::from_env()?,
    };
    if let Some(simulator) = cli.simulator {
        cfg.simulator = simulator;
    }
    tracing::debug!(?cfg, "runner configuration");

    match &cli.command {
        Commands::Run { suite, json } => run_suites(&cfg, suite, *json).await,
        Commands::Replay { trace, suite, scenario, json } => {
            replay(&cfg, trace, suite, scenario.as_deref(), *json)
        }
    }
}
