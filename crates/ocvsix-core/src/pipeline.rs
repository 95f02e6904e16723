//! Resolve → fetch → save, strictly in sequence. Any failure short-circuits.

use std::path::PathBuf;
use std::sync::Arc;

use crate::error::Result;
use crate::http::SharedClient;
use crate::identifier::PackageIdentifier;
use crate::marketplace::MarketplaceResolver;
use crate::retriever::{request_and_save, FileSaver};

#[derive(Clone)]
pub struct Downloader {
    client: SharedClient,
    resolver: MarketplaceResolver,
    saver: Arc<dyn FileSaver>,
}

impl std::fmt::Debug for Downloader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Downloader")
            .field("resolver", &self.resolver)
            .finish_non_exhaustive()
    }
}

impl Downloader {
    pub fn new(client: SharedClient, endpoint: impl Into<String>, saver: Arc<dyn FileSaver>) -> Self {
        let resolver = MarketplaceResolver::new(Arc::clone(&client), endpoint);
        Self {
            client,
            resolver,
            saver,
        }
    }

    pub fn resolver(&self) -> &MarketplaceResolver {
        &self.resolver
    }

    /// Download URL of the package, without fetching it.
    pub async fn resolve(&self, id: &PackageIdentifier) -> Result<String> {
        self.resolver.resolve(id).await
    }

    /// Resolves, fetches, and saves the package as `<publisher>.<name>.vsix`.
    pub async fn download(&self, id: &PackageIdentifier) -> Result<PathBuf> {
        let url = self.resolver.resolve(id).await?;
        let file_name = id.file_name();
        tracing::debug!(package = %id, file = %file_name, "downloading package");
        request_and_save(&self.client, &self.saver, &url, &file_name).await
    }
}
