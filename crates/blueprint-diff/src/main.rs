mod cli;
mod commands;
mod config;
mod diff;
mod document;
mod error;
mod report;
mod run;
mod session;
mod store;

use std::path::PathBuf;

use clap::Parser;
use config::{CliOverrides, ResolvedRunConfig};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("blueprint_diff=info")),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let cli = cli::Cli::parse();

    match cli.command {
        cli::Command::Init { force } => {
            commands::init(force)?;
        }
        cli::Command::Compare {
            before,
            after,
            tier,
            out,
            open,
            compare,
        } => {
            let overrides = CliOverrides { tier, out, compare };
            let config = ResolvedRunConfig::new(overrides)?;
            let code = commands::compare(config, &before, &after, open).await?;
            std::process::exit(code);
        }
        cli::Command::Review { dir, open } => {
            let dir = match dir {
                Some(dir) => dir,
                None => config::load()?
                    .output
                    .dir
                    .unwrap_or_else(|| PathBuf::from(config::DEFAULT_OUTPUT_DIR)),
            };
            commands::review(&dir, open)?;
        }
    }

    Ok(())
}
