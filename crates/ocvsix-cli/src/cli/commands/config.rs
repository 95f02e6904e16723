//! `ocvsix config` – print the config file location.

use anyhow::Result;
use ocvsix_core::config;

pub fn run_config() -> Result<()> {
    let path = config::config_path()?;
    println!("{}", path.display());
    Ok(())
}
