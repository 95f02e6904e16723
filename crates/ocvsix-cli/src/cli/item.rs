//! Command-line package reference: a page URL or a bare identifier.

use anyhow::{Context, Result};
use ocvsix_core::identifier::PackageIdentifier;
use url::Url;

/// Accepts `https://.../items?itemName=pub.name` or `pub.name`.
pub fn parse_item(item: &str) -> Result<PackageIdentifier> {
    let item = item.trim();
    if let Ok(url) = Url::parse(item) {
        if matches!(url.scheme(), "http" | "https") {
            return PackageIdentifier::from_page_url(&url)
                .with_context(|| format!("no package identifier in {}", url));
        }
    }
    PackageIdentifier::parse(item).with_context(|| format!("invalid package identifier {:?}", item))
}
