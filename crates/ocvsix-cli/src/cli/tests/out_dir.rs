//! Output directory precedence: --out-dir, then config download_dir, then cwd.

use crate::cli::resolve_out_dir;
use ocvsix_core::config::OcvsixConfig;
use ocvsix_core::retriever::{DiskSaver, FileSaver};
use tempfile::tempdir;

#[test]
fn out_dir_flag_wins_over_config() {
    let flag = tempdir().unwrap();
    let configured = tempdir().unwrap();
    let cfg = OcvsixConfig {
        download_dir: Some(configured.path().to_path_buf()),
        ..OcvsixConfig::default()
    };
    let dir = resolve_out_dir(Some(flag.path().to_path_buf()), &cfg).unwrap();
    assert_eq!(dir, flag.path());
}

#[test]
fn config_download_dir_is_used_without_flag() {
    let configured = tempdir().unwrap();
    let cfg = OcvsixConfig {
        download_dir: Some(configured.path().join("vsix")),
        ..OcvsixConfig::default()
    };
    let dir = resolve_out_dir(None, &cfg).unwrap();
    assert_eq!(dir, configured.path().join("vsix"));

    // The saver creates the configured directory on first save.
    let saved = DiskSaver::new(dir.clone()).save("acme.tool.vsix", b"PK").unwrap();
    assert_eq!(saved, configured.path().join("vsix").join("acme.tool.vsix"));
}

#[test]
fn current_dir_is_the_fallback() {
    let dir = resolve_out_dir(None, &OcvsixConfig::default()).unwrap();
    assert_eq!(dir, std::env::current_dir().unwrap());
}
