//! Marketplace resolver: one catalog query, then the package-binary asset URL.

mod model;

pub use model::{
    CatalogEntry, CatalogQuery, CatalogQueryResult, Criterion, DownloadAsset, EntryVersion,
    Publisher, QueryFilter, QueryResult,
};

use crate::error::{Error, Result};
use crate::http::{run_blocking, SharedClient};
use crate::identifier::PackageIdentifier;

/// Public catalog query endpoint.
pub const MARKETPLACE_API_URL: &str =
    "https://marketplace.visualstudio.com/_apis/public/gallery/extensionquery";

/// Asset type of the installable package in a version's file list.
pub const VSIX_ASSET_TYPE: &str = "Microsoft.VisualStudio.Services.VSIXPackage";

/// Accept header pinning the preview API version.
pub const API_ACCEPT: &str = "application/json;api-version=3.0-preview.1";

pub const FILTER_TYPE_EXTENSION_NAME: u32 = 7;

pub const QUERY_FLAGS: u32 = 914;

/// Headers sent with every catalog query.
pub const API_HEADERS: [(&str, &str); 2] = [
    ("Accept", API_ACCEPT),
    ("Content-Type", "application/json"),
];

#[derive(Clone)]
pub struct MarketplaceResolver {
    client: SharedClient,
    endpoint: String,
}

impl std::fmt::Debug for MarketplaceResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MarketplaceResolver")
            .field("endpoint", &self.endpoint)
            .finish()
    }
}

impl MarketplaceResolver {
    pub fn new(client: SharedClient, endpoint: impl Into<String>) -> Self {
        Self {
            client,
            endpoint: endpoint.into(),
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Returns the direct download URL of the package's current version.
    pub async fn resolve(&self, id: &PackageIdentifier) -> Result<String> {
        let this = self.clone();
        let id = id.clone();
        run_blocking(move || this.resolve_blocking(&id)).await
    }

    /// Blocking variant of `resolve`.
    pub fn resolve_blocking(&self, id: &PackageIdentifier) -> Result<String> {
        let body = serde_json::to_vec(&CatalogQuery::for_package(id))?;
        tracing::debug!(package = %id, endpoint = %self.endpoint, "querying catalog");

        let response = self.client.post_json(&self.endpoint, &API_HEADERS, &body)?;
        if !response.is_success() {
            return Err(Error::Http {
                url: self.endpoint.clone(),
                status: response.status,
            });
        }

        let parsed: CatalogQueryResult = serde_json::from_slice(&response.body)?;
        let url = extract_download_url(&parsed, id)?;
        tracing::debug!(package = %id, url = %url, "resolved package url");
        Ok(url)
    }
}

/// Picks the package-binary asset (with a non-empty source) of the first entry's first version.
pub fn extract_download_url(result: &CatalogQueryResult, id: &PackageIdentifier) -> Result<String> {
    let entry = result
        .first_entry()
        .ok_or_else(|| Error::NotFound(format!("Extension not found: \"{}\"", id)))?;

    let version = entry
        .versions
        .first()
        .ok_or_else(|| Error::NotFound(format!("No versions found for \"{}\".", id)))?;

    version
        .files
        .iter()
        .find(|f| f.asset_type == VSIX_ASSET_TYPE && !f.source.is_empty())
        .map(|f| f.source.clone())
        .ok_or_else(|| Error::AssetMissing(format!("VSIX file not found for \"{}\".", id)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::{HttpClient, HttpResponse};
    use serde_json::json;
    use std::sync::{Arc, Mutex};

    /// Replays one canned response and records what was sent.
    struct CannedClient {
        status: u32,
        body: String,
        sent: Mutex<Vec<(String, Vec<(String, String)>, Vec<u8>)>>,
    }

    impl CannedClient {
        fn new(status: u32, body: serde_json::Value) -> Arc<Self> {
            Arc::new(Self {
                status,
                body: body.to_string(),
                sent: Mutex::new(Vec::new()),
            })
        }
    }

    impl HttpClient for CannedClient {
        fn post_json(&self, url: &str, headers: &[(&str, &str)], body: &[u8]) -> Result<HttpResponse> {
            let headers = headers
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect();
            self.sent
                .lock()
                .unwrap()
                .push((url.to_string(), headers, body.to_vec()));
            Ok(HttpResponse {
                status: self.status,
                body: self.body.clone().into_bytes(),
            })
        }

        fn get(&self, _url: &str) -> Result<HttpResponse> {
            unreachable!("resolver never issues GET")
        }
    }

    fn catalog(files: serde_json::Value) -> serde_json::Value {
        json!({
            "results": [{
                "extensions": [{
                    "extensionName": "tool",
                    "publisher": { "publisherName": "acme" },
                    "versions": [{ "version": "1.0.0", "files": files }]
                }]
            }]
        })
    }

    fn id() -> PackageIdentifier {
        PackageIdentifier::parse("acme.tool").unwrap()
    }

    #[test]
    fn resolves_binary_asset_source() {
        let client = CannedClient::new(
            200,
            catalog(json!([
                { "assetType": "Microsoft.VisualStudio.Services.Icons.Default", "source": "https://cdn/icon.png" },
                { "assetType": VSIX_ASSET_TYPE, "source": "https://cdn/x.vsix" }
            ])),
        );
        let resolver = MarketplaceResolver::new(client.clone(), "https://example.com/q");
        assert_eq!(resolver.resolve_blocking(&id()).unwrap(), "https://cdn/x.vsix");

        let sent = client.sent.lock().unwrap();
        assert_eq!(sent.len(), 1);
        let (url, headers, body) = &sent[0];
        assert_eq!(url, "https://example.com/q");
        assert!(headers.contains(&("Accept".into(), API_ACCEPT.into())));
        assert!(headers.contains(&("Content-Type".into(), "application/json".into())));
        let body: serde_json::Value = serde_json::from_slice(body).unwrap();
        assert_eq!(body["filters"][0]["criteria"][0]["value"], "acme.tool");
        assert_eq!(body["flags"], 914);
    }

    #[test]
    fn zero_entries_is_not_found() {
        for body in [json!({ "results": [] }), json!({ "results": [{ "extensions": [] }] })] {
            let resolver = MarketplaceResolver::new(CannedClient::new(200, body), "u");
            let err = resolver.resolve_blocking(&id()).unwrap_err();
            assert!(matches!(err, Error::NotFound(_)), "got {err:?}");
            assert_eq!(err.to_string(), "Extension not found: \"acme.tool\"");
        }
    }

    #[test]
    fn zero_versions_is_not_found() {
        let body = json!({
            "results": [{ "extensions": [{ "extensionName": "tool", "versions": [] }] }]
        });
        let resolver = MarketplaceResolver::new(CannedClient::new(200, body), "u");
        let err = resolver.resolve_blocking(&id()).unwrap_err();
        assert!(matches!(err, Error::NotFound(_)));
        assert_eq!(err.to_string(), "No versions found for \"acme.tool\".");
    }

    #[test]
    fn missing_binary_asset() {
        let body = catalog(json!([
            { "assetType": "Microsoft.VisualStudio.Services.Content.Details", "source": "https://cdn/readme.md" }
        ]));
        let resolver = MarketplaceResolver::new(CannedClient::new(200, body), "u");
        let err = resolver.resolve_blocking(&id()).unwrap_err();
        assert!(matches!(err, Error::AssetMissing(_)));
        assert_eq!(err.to_string(), "VSIX file not found for \"acme.tool\".");
    }

    #[test]
    fn unrelated_file_without_source_is_skipped() {
        let body = catalog(json!([
            { "assetType": "Microsoft.VisualStudio.Services.Content.License" },
            { "assetType": VSIX_ASSET_TYPE, "source": "https://cdn/x.vsix" }
        ]));
        let resolver = MarketplaceResolver::new(CannedClient::new(200, body), "u");
        assert_eq!(resolver.resolve_blocking(&id()).unwrap(), "https://cdn/x.vsix");
    }

    #[test]
    fn binary_asset_without_source_is_missing() {
        let body = catalog(json!([{ "assetType": VSIX_ASSET_TYPE }]));
        let resolver = MarketplaceResolver::new(CannedClient::new(200, body), "u");
        let err = resolver.resolve_blocking(&id()).unwrap_err();
        assert!(matches!(err, Error::AssetMissing(_)), "got {err:?}");
    }

    #[test]
    fn non_success_status_is_http_error() {
        let resolver = MarketplaceResolver::new(CannedClient::new(503, json!({})), "https://q");
        let err = resolver.resolve_blocking(&id()).unwrap_err();
        assert_eq!(err.status(), Some(503));
    }

    #[test]
    fn malformed_body_is_json_error() {
        let client = Arc::new(CannedClient {
            status: 200,
            body: "<html>".to_string(),
            sent: Mutex::new(Vec::new()),
        });
        let resolver = MarketplaceResolver::new(client, "u");
        assert!(matches!(
            resolver.resolve_blocking(&id()).unwrap_err(),
            Error::Json(_)
        ));
    }

    #[tokio::test]
    async fn async_resolve_uses_blocking_pool() {
        let client = CannedClient::new(
            200,
            catalog(json!([{ "assetType": VSIX_ASSET_TYPE, "source": "https://cdn/x.vsix" }])),
        );
        let resolver = MarketplaceResolver::new(client, "u");
        assert_eq!(resolver.resolve(&id()).await.unwrap(), "https://cdn/x.vsix");
    }
}
