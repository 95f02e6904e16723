//! Catalog query request and response shapes.

use serde::{Deserialize, Serialize};

use super::{FILTER_TYPE_EXTENSION_NAME, QUERY_FLAGS, VSIX_ASSET_TYPE};
use crate::identifier::PackageIdentifier;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Criterion {
    pub filter_type: u32,
    pub value: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryFilter {
    pub criteria: Vec<Criterion>,
    pub page_number: u32,
    pub page_size: u32,
    pub sort_by: u32,
    pub sort_order: u32,
}

/// Body of the catalog query: one page of one result, filtered by full name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogQuery {
    pub filters: Vec<QueryFilter>,
    pub asset_types: Vec<String>,
    pub flags: u32,
}

impl CatalogQuery {
    pub fn for_package(id: &PackageIdentifier) -> Self {
        Self {
            filters: vec![QueryFilter {
                criteria: vec![Criterion {
                    filter_type: FILTER_TYPE_EXTENSION_NAME,
                    value: id.to_string(),
                }],
                page_number: 1,
                page_size: 1,
                sort_by: 0,
                sort_order: 0,
            }],
            asset_types: vec![VSIX_ASSET_TYPE.to_string()],
            flags: QUERY_FLAGS,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogQueryResult {
    #[serde(default)]
    pub results: Vec<QueryResult>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryResult {
    #[serde(default)]
    pub extensions: Vec<CatalogEntry>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Publisher {
    #[serde(default)]
    pub publisher_name: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogEntry {
    #[serde(default)]
    pub extension_name: String,
    #[serde(default)]
    pub publisher: Publisher,
    #[serde(default)]
    pub versions: Vec<EntryVersion>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EntryVersion {
    #[serde(default)]
    pub version: String,
    #[serde(default)]
    pub files: Vec<DownloadAsset>,
}

/// One file of a version. Entries missing either field are kept but never selected.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DownloadAsset {
    #[serde(default)]
    pub asset_type: String,
    #[serde(default)]
    pub source: String,
}

impl CatalogQueryResult {
    /// First entry of the first result, as returned by the server.
    pub fn first_entry(&self) -> Option<&CatalogEntry> {
        self.results.first()?.extensions.first()
    }
}
