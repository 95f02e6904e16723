//! `ocvsix resolve <item>` – print the package URL.

use anyhow::{Context, Result};
use ocvsix_core::config::OcvsixConfig;

use super::build_downloader;
use crate::cli::item::parse_item;

pub async fn run_resolve(cfg: &OcvsixConfig, item: &str) -> Result<()> {
    let id = parse_item(item)?;
    // Nothing is saved; the directory is never touched.
    let downloader = build_downloader(cfg, std::path::Path::new("."));
    let url = downloader
        .resolve(&id)
        .await
        .with_context(|| format!("could not resolve {}", id))?;
    println!("{url}");
    Ok(())
}
