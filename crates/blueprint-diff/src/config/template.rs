use std::path::Path;

use anyhow::{Context, Result};

use super::{CONFIG_DIR, CONFIG_FILE};

/// Hand-crafted config template with commented-out keys, so users see every
/// knob and its default without uncommenting section headers.
const CONFIG_TEMPLATE: &str = r#"# ─────────────────────────────────────────────────────────
# Rasterization and alignment (all fields optional)
# ─────────────────────────────────────────────────────────
[compare]
# scale = 1.5                       # resolution multiplier (> 0)
# dx = 0                            # shift of the "after" set, pixels (-30..30)
# dy = 0

# ─────────────────────────────────────────────────────────
# Plan
# ─────────────────────────────────────────────────────────
[plan]
# tier = "free"                     # "free" (first 10 pages) | "unlimited"

# ─────────────────────────────────────────────────────────
# Output
# ─────────────────────────────────────────────────────────
[output]
# dir = ".blueprint-diff/latest"    # page PNGs, summary.json, report.html
"#;

pub fn config_file_exists() -> bool {
    Path::new(CONFIG_DIR).join(CONFIG_FILE).exists()
}

pub fn write_gitignore(force: bool) -> Result<()> {
    let path = Path::new(CONFIG_DIR).join(".gitignore");
    if !force && path.exists() {
        return Ok(());
    }
    std::fs::write(&path, "latest/\n.latest.*\n")
        .with_context(|| format!("Failed to write {}", path.display()))?;
    Ok(())
}

pub fn write_template() -> Result<()> {
    let dir = Path::new(CONFIG_DIR);
    std::fs::create_dir_all(dir).with_context(|| format!("Failed to create {CONFIG_DIR}"))?;
    let path = dir.join(CONFIG_FILE);
    std::fs::write(&path, CONFIG_TEMPLATE)
        .with_context(|| format!("Failed to write {}", path.display()))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{Config, Tier};

    #[test]
    fn template_parses_to_defaults() {
        let config: Config = toml::from_str(CONFIG_TEMPLATE).unwrap();
        assert!(config.compare.scale.is_none());
        assert!(config.compare.dx.is_none());
        assert_eq!(config.plan.tier, Tier::Free);
        assert!(config.output.dir.is_none());
    }
}
