use anyhow::{Result, bail};

use crate::config;

/// `blueprint-diff init`: create .blueprint-diff/config.toml.
pub fn init(force: bool) -> Result<()> {
    if !force && config::config_file_exists() {
        bail!(".blueprint-diff/config.toml already exists (use --force to overwrite)");
    }

    config::write_template()?;
    config::write_gitignore(force)?;

    let verb = if force { "Regenerated" } else { "Created" };
    println!("{verb} .blueprint-diff/config.toml");
    println!("  plan.tier = free (first {} pages)", config::plan::FREE_PAGE_CEILING);
    Ok(())
}
