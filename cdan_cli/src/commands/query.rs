//! The `query` subcommand: show the rendered job query for a target.

use std::path::PathBuf;

use anyhow::Result;
use cdan_lib::{FetchConfig, Query};
use clap::Args;

/// Arguments for the `query` subcommand.
#[derive(Args)]
pub struct QueryArgs {
    /// Target identifier (e.g. 06)
    pub id: String,

    /// TOML file overriding report parameters
    #[arg(long)]
    pub config: Option<PathBuf>,
}

pub fn run(args: &QueryArgs) -> Result<()> {
    let config = FetchConfig::load(args.config.as_deref())?;
    let query = config.report.for_state(&args.id);
    println!("{}", query.to_query_string());
    Ok(())
}
