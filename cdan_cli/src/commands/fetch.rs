//! The `fetch` subcommand: acquire the report for every target in order.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use cdan_lib::{load_targets, Acquirer, FetchConfig, Progress, StaticRenderer};
use clap::Args;

/// Arguments for the `fetch` subcommand.
#[derive(Args)]
pub struct FetchArgs {
    /// JSON list of {"Id", "StateName"} records
    #[arg(long, default_value = "state-list.json")]
    pub targets: PathBuf,

    /// Directory the workbooks are written to
    #[arg(long)]
    pub out_dir: Option<PathBuf>,

    /// TOML file overriding endpoints, report parameters and timings
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Service base URL (overrides config and CDAN_BASE_URL)
    #[arg(long)]
    pub base_url: Option<String>,

    /// Delay between targets in milliseconds
    #[arg(long)]
    pub delay_ms: Option<u64>,
}

/// Loads configuration and targets, then fetches every target.
///
/// Config and target errors abort before any request is made. Per-target
/// failures are reported as they happen; the command fails at the end if
/// any target did not produce a file.
pub async fn run(args: &FetchArgs) -> Result<()> {
    let mut config = FetchConfig::load(args.config.as_deref())?;
    if let Some(ref base_url) = args.base_url {
        config.endpoints = config.endpoints.with_base_url(base_url);
        config.validate()?;
    }
    if let Some(ref dir) = args.out_dir {
        config.out_dir = dir.clone();
    }
    if let Some(ms) = args.delay_ms {
        config.pacing = Duration::from_millis(ms);
    }

    let targets = load_targets(&args.targets)
        .with_context(|| format!("loading targets from {}", args.targets.display()))?;
    eprintln!(
        "Fetching {} targets into {}",
        targets.len(),
        config.out_dir.display()
    );

    let renderer = StaticRenderer::new().with_poll_interval(config.poll_interval);
    let mut acquirer = Acquirer::from_config(config, renderer)?;
    let report = acquirer
        .run(&targets, |event| match event {
            Progress::Started { target, .. } => {
                eprintln!("Processing {} - {}", target.id, target.name);
            }
            Progress::Finished(outcome) => match &outcome.result {
                Ok(path) => eprintln!("Saved {}", path.display()),
                Err(err) => eprintln!(
                    "Failed {}: {} ({})",
                    outcome.target.name,
                    err,
                    err.kind()
                ),
            },
        })
        .await;

    eprintln!(
        "Run complete: {} succeeded, {} failed",
        report.succeeded(),
        report.failed()
    );
    if !report.all_succeeded() {
        bail!("{} of {} targets failed", report.failed(), report.outcomes.len());
    }
    Ok(())
}
