use std::path::PathBuf;

use anyhow::{Context, Result, anyhow};
use clap::ValueEnum;

use super::compare::CompareConfig;
use super::plan::Tier;
use super::{Config, DEFAULT_OUTPUT_DIR, DEFAULT_SCALE, load, validate_scale};
use crate::diff::AlignmentOffset;

/// Values extracted from the CLI that participate in the merge.
#[derive(Default)]
pub struct CliOverrides {
    pub tier: Option<Tier>,
    pub out: Option<PathBuf>,
    pub compare: CompareConfig,
}

/// Values read from `BLUEPRINT_DIFF_*` environment variables.
#[derive(Default)]
pub struct EnvOverrides {
    pub scale: Option<f64>,
    pub tier: Option<Tier>,
}

impl EnvOverrides {
    pub fn from_env() -> Result<Self> {
        let scale = std::env::var("BLUEPRINT_DIFF_SCALE")
            .ok()
            .map(|v| v.parse::<f64>())
            .transpose()
            .context("BLUEPRINT_DIFF_SCALE must be a valid float")?;
        let tier = std::env::var("BLUEPRINT_DIFF_TIER")
            .ok()
            .map(|v| Tier::from_str(&v, true))
            .transpose()
            .map_err(|e| anyhow!("BLUEPRINT_DIFF_TIER: {e}"))?;
        Ok(Self { scale, tier })
    }
}

/// Fully resolved config after CLI > env > file > defaults merge.
#[derive(Debug)]
pub struct ResolvedRunConfig {
    pub scale: f64,
    pub offset: AlignmentOffset,
    pub tier: Tier,
    /// `None` means unbounded.
    pub page_ceiling: Option<u32>,
    pub output_dir: PathBuf,
}

impl ResolvedRunConfig {
    pub fn new(cli: CliOverrides) -> Result<Self> {
        let file_config = load()?;
        let env = EnvOverrides::from_env()?;
        Self::resolve(file_config, env, cli)
    }

    pub fn resolve(file: Config, env: EnvOverrides, cli: CliOverrides) -> Result<Self> {
        // Env sits between the file and the CLI; only scale has an env knob
        // on the compare side.
        let mut compare = file.compare;
        if env.scale.is_some() {
            compare.scale = env.scale;
        }
        compare.merge(&cli.compare);

        let scale = compare.scale.unwrap_or(DEFAULT_SCALE);
        validate_scale(scale).map_err(|e| anyhow!("{e}"))?;

        let offset = AlignmentOffset::new(compare.dx.unwrap_or(0), compare.dy.unwrap_or(0));

        let tier = cli.tier.or(env.tier).unwrap_or(file.plan.tier);

        let output_dir = cli
            .out
            .or(file.output.dir)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_OUTPUT_DIR));

        Ok(Self {
            scale,
            offset,
            tier,
            page_ceiling: tier.page_ceiling(),
            output_dir,
        })
    }
}
