//! Resource location resolution
//!
//! This module handles resolution of resource locations (URLs, file paths,
//! in-memory strings) for loading WSDL and XSD documents, including
//! resolution of relative `schemaLocation` references against a base.

use crate::error::{Error, Result};
use std::path::PathBuf;
use url::Url;

/// Resource location - can be a URL, file path, or string identifier
#[derive(Debug, Clone)]
pub enum Location {
    /// File system path
    Path(PathBuf),
    /// URL (http, https, ftp, etc.)
    Url(Url),
    /// String identifier (for in-memory resources)
    String(String),
}

impl Location {
    /// Create a location from a string (auto-detect type)
    pub fn from_str(s: &str) -> Result<Self> {
        // Try to parse as URL first
        if let Ok(url) = Url::parse(s) {
            if url.scheme() != "file" {
                return Ok(Location::Url(url));
            }
        }

        // Try as file path
        let path = PathBuf::from(s);
        if path.exists() || s.starts_with('/') || s.starts_with('.') {
            return Ok(Location::Path(path));
        }

        // Otherwise treat as string identifier
        Ok(Location::String(s.to_string()))
    }

    /// Resolve a relative reference against this location
    ///
    /// Used for `schemaLocation` attributes: relative to the referencing
    /// document's directory for paths, joined per RFC 3986 for URLs. An
    /// in-memory location has no base, so the reference resolves on its own.
    pub fn join(&self, reference: &str) -> Result<Location> {
        // Absolute references ignore the base entirely
        if let Ok(url) = Url::parse(reference) {
            if url.scheme() != "file" {
                return Ok(Location::Url(url));
            }
        }

        match self {
            Location::Path(path) => {
                let base = path.parent().unwrap_or_else(|| std::path::Path::new("."));
                Ok(Location::Path(base.join(reference)))
            }
            Location::Url(url) => {
                let joined = url.join(reference).map_err(Error::Url)?;
                Ok(Location::Url(joined))
            }
            Location::String(_) => Location::from_str(reference),
        }
    }

    /// Get the location as a string
    pub fn as_str(&self) -> String {
        match self {
            Location::Path(p) => p.to_string_lossy().to_string(),
            Location::Url(u) => u.to_string(),
            Location::String(s) => s.clone(),
        }
    }

    /// Check if this is a remote location (URL)
    pub fn is_remote(&self) -> bool {
        matches!(self, Location::Url(_))
    }

    /// Check if this is a local file
    pub fn is_file(&self) -> bool {
        matches!(self, Location::Path(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_location_from_url() {
        let loc = Location::from_str("http://example.com/service.wsdl").unwrap();
        assert!(matches!(loc, Location::Url(_)));
        assert!(loc.is_remote());
    }

    #[test]
    fn test_location_from_path() {
        let loc = Location::from_str("/tmp/service.wsdl").unwrap();
        assert!(matches!(loc, Location::Path(_)));
        assert!(loc.is_file());
    }

    #[test]
    fn test_location_as_str() {
        let loc = Location::String("test".to_string());
        assert_eq!(loc.as_str(), "test");
    }

    #[test]
    fn test_join_relative_path() {
        let base = Location::Path(PathBuf::from("/srv/wsdl/service.wsdl"));
        let joined = base.join("types.xsd").unwrap();
        assert_eq!(joined.as_str(), "/srv/wsdl/types.xsd");
    }

    #[test]
    fn test_join_relative_url() {
        let base = Location::from_str("http://example.com/wsdl/service.wsdl").unwrap();
        let joined = base.join("types.xsd").unwrap();
        assert_eq!(joined.as_str(), "http://example.com/wsdl/types.xsd");
    }

    #[test]
    fn test_join_absolute_reference() {
        let base = Location::Path(PathBuf::from("/srv/wsdl/service.wsdl"));
        let joined = base.join("http://example.com/types.xsd").unwrap();
        assert!(joined.is_remote());
    }
}
