pub mod compare;
pub mod plan;
pub mod resolve;
pub mod template;

use std::path::{Path, PathBuf};

use anyhow::{Context, Result, anyhow};
use serde::{Deserialize, Serialize};

pub use self::compare::CompareConfig;
pub use self::plan::{PlanConfig, Tier};
pub use self::resolve::{CliOverrides, ResolvedRunConfig};
pub use self::template::{config_file_exists, write_gitignore, write_template};

pub(crate) const CONFIG_DIR: &str = ".blueprint-diff";
const CONFIG_FILE: &str = "config.toml";

/// Where published runs go unless `[output] dir` or `--out` says otherwise.
pub const DEFAULT_OUTPUT_DIR: &str = ".blueprint-diff/latest";

pub const DEFAULT_SCALE: f64 = 1.5;

/// Conventional bound for the alignment offset on either axis.
pub const MAX_OFFSET: i32 = 30;

pub fn validate_scale(v: f64) -> Result<f64, String> {
    if !v.is_finite() || v <= 0.0 {
        return Err(format!("scale must be a positive number, got {v}"));
    }
    Ok(v)
}

pub fn validate_offset(v: i32) -> Result<i32, String> {
    if !(-MAX_OFFSET..=MAX_OFFSET).contains(&v) {
        return Err(format!(
            "offset must be between -{MAX_OFFSET} and {MAX_OFFSET}, got {v}"
        ));
    }
    Ok(v)
}

pub(crate) fn parse_scale(s: &str) -> Result<f64, String> {
    let v: f64 = s.parse().map_err(|e| format!("{e}"))?;
    validate_scale(v)
}

pub(crate) fn parse_offset(s: &str) -> Result<i32, String> {
    let v: i32 = s.parse().map_err(|e| format!("{e}"))?;
    validate_offset(v)
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OutputConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dir: Option<PathBuf>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub compare: CompareConfig,
    #[serde(default)]
    pub plan: PlanConfig,
    #[serde(default)]
    pub output: OutputConfig,
}

impl Config {
    /// Validate semantic constraints that serde cannot express.
    fn validate(&self) -> Result<()> {
        if let Some(scale) = self.compare.scale {
            validate_scale(scale).map_err(|e| anyhow!("compare.{e}"))?;
        }
        for (axis, value) in [("dx", self.compare.dx), ("dy", self.compare.dy)] {
            if let Some(v) = value {
                validate_offset(v).map_err(|e| anyhow!("compare.{axis}: {e}"))?;
            }
        }
        Ok(())
    }
}

pub fn config_path() -> PathBuf {
    Path::new(CONFIG_DIR).join(CONFIG_FILE)
}

/// Load the project config. A missing file yields the defaults.
pub fn load() -> Result<Config> {
    load_from(&config_path())
}

pub fn load_from(path: &Path) -> Result<Config> {
    if !path.exists() {
        return Ok(Config::default());
    }
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let config: Config =
        toml::from_str(&content).with_context(|| format!("Failed to parse {}", path.display()))?;
    config
        .validate()
        .with_context(|| format!("Invalid {}", path.display()))?;
    Ok(config)
}
