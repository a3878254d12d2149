mod commands;

use anyhow::Result;
use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "cdan-fetch")]
#[command(about = "Fetch per-state FIRST crash report workbooks from CDAN")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch the report for every configured target
    Fetch(commands::fetch::FetchArgs),
    /// Print the job query for one target without contacting the service
    Query(commands::query::QueryArgs),
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("cdan_api=info,cdan_lib=info")),
        )
        .with_target(false)
        .init();

    let cli = Cli::parse();

    match &cli.command {
        Commands::Fetch(args) => commands::fetch::run(args).await?,
        Commands::Query(args) => commands::query::run(args)?,
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn fetch_defaults_to_state_list() {
        let cli = Cli::try_parse_from(["cdan-fetch", "fetch"]).unwrap();
        match cli.command {
            Commands::Fetch(args) => {
                assert_eq!(args.targets, std::path::PathBuf::from("state-list.json"));
                assert!(args.out_dir.is_none());
                assert!(args.delay_ms.is_none());
            }
            _ => panic!("expected fetch"),
        }
    }

    #[test]
    fn query_takes_target_id() {
        let cli = Cli::try_parse_from(["cdan-fetch", "query", "06"]).unwrap();
        assert!(matches!(cli.command, Commands::Query(ref args) if args.id == "06"));
    }
}
