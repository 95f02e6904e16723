//! `ocvsix download <item>` – resolve, fetch, and save a package.

use anyhow::{Context, Result};
use ocvsix_core::config::OcvsixConfig;
use std::path::Path;

use super::build_downloader;
use crate::cli::item::parse_item;

pub async fn run_download(cfg: &OcvsixConfig, item: &str, dir: &Path) -> Result<()> {
    let id = parse_item(item)?;
    let downloader = build_downloader(cfg, dir);
    let path = downloader
        .download(&id)
        .await
        .with_context(|| format!("download of {} failed", id))?;
    println!("Saved {}", path.display());
    Ok(())
}
