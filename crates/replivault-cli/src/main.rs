//! Replivault - backup coordination scenario driver

use anyhow::Context;
use clap::Parser;
use replivault_cli::{run_scenario, RunnerOptions, Scenario};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser, Debug)]
#[command(name = "replivault")]
#[command(about = "Play a backup coordination scenario against an in-memory ledger")]
#[command(version)]
struct Args {
    /// Path to the scenario JSON file
    scenario: PathBuf,

    /// Block height of the first step
    #[arg(long, default_value = "1", env = "REPLIVAULT_START_BLOCK")]
    start_block: u64,

    /// Height increment between consecutive steps
    #[arg(long, default_value = "1", env = "REPLIVAULT_BLOCK_STEP")]
    block_step: u64,

    /// Print the final ledger state as JSON
    #[arg(long)]
    dump: bool,

    /// Enable debug logging
    #[arg(short, long, env = "REPLIVAULT_DEBUG")]
    debug: bool,
}

fn main() -> anyhow::Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    let args = Args::parse();

    // Setup logging
    let log_level = if args.debug { "debug" } else { "info" };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| format!("replivault={log_level},replivault_core={log_level}").into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let raw = std::fs::read_to_string(&args.scenario)
        .with_context(|| format!("reading scenario {}", args.scenario.display()))?;
    let scenario: Scenario = serde_json::from_str(&raw)
        .with_context(|| format!("parsing scenario {}", args.scenario.display()))?;

    tracing::info!(
        steps = scenario.steps.len(),
        owner = %scenario.owner,
        "running scenario"
    );

    let options = RunnerOptions {
        start_block: args.start_block,
        block_step: args.block_step,
    };
    let report = run_scenario(&scenario, &options);

    if args.dump {
        println!("{}", serde_json::to_string_pretty(&report.snapshot)?);
    }

    tracing::info!(passed = report.passed, failed = report.failed, "scenario finished");
    if !report.success() {
        anyhow::bail!("{} of {} steps did not match expectations", report.failed, report.passed + report.failed);
    }
    Ok(())
}
