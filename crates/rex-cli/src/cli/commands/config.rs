//! `rex config` – show where the config lives and what it says.

use anyhow::{Context, Result};
use rex_core::config;
use std::fs;

pub fn run_config() -> Result<()> {
    // Creates the default file on first use.
    config::load_or_init()?;
    let path = config::config_path()?;
    let contents = fs::read_to_string(&path)
        .with_context(|| format!("reading config {}", path.display()))?;
    println!("# {}", path.display());
    print!("{}", contents);
    Ok(())
}
