//! CLI command handlers, one per file.

mod completions;
mod config;
mod download;
mod page;
mod resolve;

pub use completions::run_completions;
pub use config::run_config;
pub use download::run_download;
pub use page::run_page;
pub use resolve::run_resolve;

use ocvsix_core::config::OcvsixConfig;
use ocvsix_core::http::{CurlClient, SharedClient};
use ocvsix_core::pipeline::Downloader;
use ocvsix_core::retriever::{DiskSaver, FileSaver};
use std::path::Path;
use std::sync::Arc;

/// Downloader wired from config: curl transport, catalog endpoint, disk saver in `dir`.
pub(crate) fn build_downloader(cfg: &OcvsixConfig, dir: &Path) -> Downloader {
    let client: SharedClient = CurlClient::shared(cfg.http_or_default());
    let saver: Arc<dyn FileSaver> = Arc::new(DiskSaver::new(dir));
    Downloader::new(client, cfg.endpoint.clone(), saver)
}
