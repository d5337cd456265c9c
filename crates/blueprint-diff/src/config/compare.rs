use serde::{Deserialize, Serialize};

use super::{parse_offset, parse_scale};

/// Rasterization and alignment settings for a comparison run.
///
/// Fields are `Option`: `None` means "use the lower layer or default".
/// Serves both TOML deserialization (`[compare]`) and CLI argument parsing.
#[derive(Clone, Debug, Default, clap::Args, Serialize, Deserialize)]
pub struct CompareConfig {
    /// Resolution multiplier applied to every page
    #[arg(long, value_parser = parse_scale)]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scale: Option<f64>,

    /// Horizontal shift of the after document, in pixels (-30..=30)
    #[arg(long, allow_negative_numbers = true, value_parser = parse_offset)]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dx: Option<i32>,

    /// Vertical shift of the after document, in pixels (-30..=30)
    #[arg(long, allow_negative_numbers = true, value_parser = parse_offset)]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dy: Option<i32>,
}

impl CompareConfig {
    /// Overlay non-None fields from `other` onto self.
    pub fn merge(&mut self, other: &CompareConfig) {
        if other.scale.is_some() {
            self.scale = other.scale;
        }
        if other.dx.is_some() {
            self.dx = other.dx;
        }
        if other.dy.is_some() {
            self.dy = other.dy;
        }
    }
}
