//! The host page: its address and its live document.

use url::Url;

use crate::dom::Document;
use crate::error::{Error, Result};
use crate::identifier::{self, PackageIdentifier};

#[derive(Debug, Clone)]
pub struct Page {
    location: Url,
    document: Document,
}

impl Page {
    pub fn new(location: Url, document: Document) -> Self {
        Self { location, document }
    }

    /// Empty document at `location`.
    pub fn parse(location: &str) -> Result<Self> {
        let url = Url::parse(location)
            .map_err(|e| Error::NotFound(format!("invalid page address {location:?}: {e}")))?;
        Ok(Self::new(url, Document::new()))
    }

    pub fn location(&self) -> &Url {
        &self.location
    }

    pub fn document(&self) -> &Document {
        &self.document
    }

    pub fn package_identifier(&self) -> Result<PackageIdentifier> {
        PackageIdentifier::from_page_url(&self.location)
    }

    pub fn is_extension_detail_page(&self) -> bool {
        identifier::is_extension_detail_page(&self.location)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn page_reads_identifier_from_location() {
        let page = Page::parse("https://marketplace.visualstudio.com/items?itemName=acme.tool").unwrap();
        assert!(page.is_extension_detail_page());
        assert_eq!(page.package_identifier().unwrap().file_name(), "acme.tool.vsix");
    }

    #[test]
    fn invalid_address_is_rejected() {
        assert!(Page::parse("not a url").is_err());
    }
}
