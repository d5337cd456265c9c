use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::config::{CompareConfig, Tier};

#[derive(Parser)]
#[command(
    name = "blueprint-diff",
    about = "Compare drawing set revisions page by page"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Create .blueprint-diff/config.toml with default settings
    Init {
        /// Overwrite existing config and gitignore
        #[arg(long, short = 'f')]
        force: bool,
    },

    /// Rasterize both revisions, diff every shared page, publish the results
    /// (exit 0 = no differences, 1 = differences, 2 = aborted)
    Compare {
        /// Earlier revision: a PDF, a directory of page images, or a glob
        before: PathBuf,
        /// Later revision: a PDF, a directory of page images, or a glob
        after: PathBuf,
        /// Plan tier deciding the page limit (overrides config)
        #[arg(long, value_enum)]
        tier: Option<Tier>,
        /// Output directory for the published run (overrides config)
        #[arg(long, short = 'o')]
        out: Option<PathBuf>,
        /// Open the report in the default browser
        #[arg(long)]
        open: bool,
        #[command(flatten)]
        compare: CompareConfig,
    },

    /// Regenerate the HTML report of a published run
    Review {
        /// Run directory (defaults to the configured output directory)
        #[arg(long, short = 'd')]
        dir: Option<PathBuf>,
        /// Open the report in the default browser
        #[arg(long)]
        open: bool,
    },
}
