//! Package identity: the `publisher.name` token from the page address.

use std::fmt;
use std::str::FromStr;

use url::Url;

use crate::error::{Error, Result};

/// Query parameter carrying the identifier on package detail pages.
pub const ITEM_NAME_PARAM: &str = "itemName";

/// Extension of the saved package file.
pub const PACKAGE_EXTENSION: &str = "vsix";

const SEPARATOR: char = '.';

/// `{ publisher, name }`, both non-empty.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PackageIdentifier {
    publisher: String,
    name: String,
}

impl PackageIdentifier {
    pub fn new(publisher: impl Into<String>, name: impl Into<String>) -> Result<Self> {
        let publisher = publisher.into();
        let name = name.into();
        if publisher.is_empty() || name.is_empty() {
            return Err(malformed());
        }
        Ok(Self { publisher, name })
    }

    /// Splits `token` on the first `.`: `"pub.ext.sub"` → publisher `pub`, name `ext.sub`.
    pub fn parse(token: &str) -> Result<Self> {
        if token.is_empty() {
            return Err(missing());
        }
        let (publisher, name) = token.split_once(SEPARATOR).ok_or_else(malformed)?;
        Self::new(publisher, name)
    }

    /// Reads the `itemName` query parameter of a package detail page address.
    pub fn from_page_url(url: &Url) -> Result<Self> {
        let item = item_name(url).ok_or_else(missing)?;
        Self::parse(&item)
    }

    pub fn publisher(&self) -> &str {
        &self.publisher
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// `"<publisher>.<name>.vsix"`, independent of anything the server reports.
    pub fn file_name(&self) -> String {
        format!("{}.{}", self, PACKAGE_EXTENSION)
    }
}

impl fmt::Display for PackageIdentifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}{}", self.publisher, SEPARATOR, self.name)
    }
}

impl FromStr for PackageIdentifier {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

fn item_name(url: &Url) -> Option<String> {
    url.query_pairs()
        .find(|(k, _)| k == ITEM_NAME_PARAM)
        .map(|(_, v)| v.into_owned())
        .filter(|v| !v.is_empty())
}

/// True if the address carries a non-empty `itemName` parameter.
pub fn is_extension_detail_page(url: &Url) -> bool {
    item_name(url).is_some()
}

fn missing() -> Error {
    Error::NotFound("Extension ID not found in the URL.".to_string())
}

fn malformed() -> Error {
    Error::NotFound("Unable to parse publisher or extension name from the URL.".to_string())
}
