use std::path::Path;

use super::load_config;

/// Print the effective configuration.
pub fn run(path: Option<&Path>) -> anyhow::Result<()> {
    let config = load_config(path)?;
    print!("{}", config.to_toml()?);
    Ok(())
}
