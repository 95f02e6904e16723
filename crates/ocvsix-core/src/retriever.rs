//! File retrieval and save.
//!
//! The body is buffered whole, then written to a temp file in the destination
//! directory and atomically renamed to the caller's name. The temp file is
//! removed on every failure path (it is a `NamedTempFile` until persisted).

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::error::{Error, Result};
use crate::http::{run_blocking, SharedClient};

const TEMP_PREFIX: &str = ".ocvsix-";
const TEMP_SUFFIX: &str = ".part";

/// Persists downloaded bytes under a caller-chosen name.
pub trait FileSaver: Send + Sync {
    /// Saves `bytes` as `file_name` and returns where it ended up.
    fn save(&self, file_name: &str, bytes: &[u8]) -> Result<PathBuf>;
}

/// Saves into a directory on the local filesystem, overwriting existing files.
#[derive(Debug, Clone)]
pub struct DiskSaver {
    dir: PathBuf,
}

impl DiskSaver {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

impl FileSaver for DiskSaver {
    fn save(&self, file_name: &str, bytes: &[u8]) -> Result<PathBuf> {
        validate_file_name(file_name)?;
        fs::create_dir_all(&self.dir)?;
        let final_path = self.dir.join(file_name);

        let mut tmp = tempfile::Builder::new()
            .prefix(TEMP_PREFIX)
            .suffix(TEMP_SUFFIX)
            .tempfile_in(&self.dir)?;
        tmp.write_all(bytes)?;
        tmp.as_file().sync_all()?;
        tmp.persist(&final_path).map_err(|e| Error::Io(e.error))?;

        tracing::info!(path = %final_path.display(), bytes = bytes.len(), "saved package");
        Ok(final_path)
    }
}

/// Rejects names that would escape the destination directory or are not a single component.
pub fn validate_file_name(name: &str) -> Result<()> {
    let bad = name.is_empty()
        || name == "."
        || name == ".."
        || name.contains('/')
        || name.contains('\\')
        || name.contains('\0');
    if bad {
        return Err(Error::InvalidFileName(name.to_string()));
    }
    Ok(())
}

/// GETs `url` and returns the full body. Non-2xx is `Error::Http` naming the URL.
pub async fn fetch_bytes(client: &SharedClient, url: &str) -> Result<Vec<u8>> {
    let client = Arc::clone(client);
    let url = url.to_string();
    run_blocking(move || fetch_bytes_blocking(client.as_ref(), &url)).await
}

pub fn fetch_bytes_blocking(client: &dyn crate::http::HttpClient, url: &str) -> Result<Vec<u8>> {
    let response = client.get(url)?;
    if !response.is_success() {
        return Err(Error::Http {
            url: url.to_string(),
            status: response.status,
        });
    }
    tracing::debug!(url, bytes = response.body.len(), "fetched file");
    Ok(response.body)
}

/// Fetches `url` and saves it as exactly `file_name`, whatever the server calls it.
pub async fn request_and_save(
    client: &SharedClient,
    saver: &Arc<dyn FileSaver>,
    url: &str,
    file_name: &str,
) -> Result<PathBuf> {
    validate_file_name(file_name)?;
    let bytes = fetch_bytes(client, url).await?;
    let saver = Arc::clone(saver);
    let file_name = file_name.to_string();
    run_blocking(move || saver.save(&file_name, &bytes)).await
}
