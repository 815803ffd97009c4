//! Limits and constraints for document processing
//!
//! This module defines limits to prevent resource exhaustion when parsing
//! schema documents and reading SOAP responses (e.g., XML bombs, oversized
//! bodies from misbehaving services).

use crate::error::{Error, Result};

/// Global limits configuration
#[derive(Debug, Clone)]
pub struct Limits {
    /// Maximum XML element nesting depth
    pub max_element_depth: usize,

    /// Maximum schema/WSDL document size in bytes
    pub max_document_size: usize,

    /// Maximum HTTP response body size in bytes
    pub max_response_size: usize,
}

impl Default for Limits {
    fn default() -> Self {
        Self {
            max_element_depth: 1000,
            max_document_size: 100 * 1024 * 1024, // 100 MB
            max_response_size: 100 * 1024 * 1024, // 100 MB
        }
    }
}

impl Limits {
    /// Create a new Limits with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Create strict limits (more restrictive)
    pub fn strict() -> Self {
        Self {
            max_element_depth: 100,
            max_document_size: 10 * 1024 * 1024, // 10 MB
            max_response_size: 10 * 1024 * 1024, // 10 MB
        }
    }

    /// Create permissive limits (less restrictive, use with caution)
    pub fn permissive() -> Self {
        Self {
            max_element_depth: 10000,
            max_document_size: 1024 * 1024 * 1024, // 1 GB
            max_response_size: 1024 * 1024 * 1024, // 1 GB
        }
    }

    /// Check if element nesting depth is within limits
    pub fn check_element_depth(&self, depth: usize) -> Result<()> {
        if depth > self.max_element_depth {
            Err(Error::LimitExceeded(format!(
                "element depth {} exceeds maximum {}",
                depth, self.max_element_depth
            )))
        } else {
            Ok(())
        }
    }

    /// Check if document size is within limits
    pub fn check_document_size(&self, size: usize) -> Result<()> {
        if size > self.max_document_size {
            Err(Error::LimitExceeded(format!(
                "document size {} bytes exceeds maximum {} bytes",
                size, self.max_document_size
            )))
        } else {
            Ok(())
        }
    }

    /// Check if a response body size is within limits
    pub fn check_response_size(&self, size: usize) -> Result<()> {
        if size > self.max_response_size {
            Err(Error::LimitExceeded(format!(
                "response size {} bytes exceeds maximum {} bytes",
                size, self.max_response_size
            )))
        } else {
            Ok(())
        }
    }

}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_limits() {
        let limits = Limits::default();
        assert_eq!(limits.max_element_depth, 1000);
        assert!(limits.check_element_depth(500).is_ok());
        assert!(limits.check_element_depth(1500).is_err());
    }

    #[test]
    fn test_strict_limits() {
        let limits = Limits::strict();
        assert!(limits.max_element_depth < Limits::default().max_element_depth);
        assert!(limits.check_element_depth(150).is_err());
    }

    #[test]
    fn test_permissive_limits() {
        let limits = Limits::permissive();
        assert!(limits.max_element_depth > Limits::default().max_element_depth);
        assert!(limits.check_element_depth(5000).is_ok());
    }

    #[test]
    fn test_check_document_size() {
        let limits = Limits::default();
        assert!(limits.check_document_size(1024).is_ok());
        assert!(limits.check_document_size(200 * 1024 * 1024).is_err());
    }

    #[test]
    fn test_check_response_size() {
        let limits = Limits::strict();
        assert!(limits.check_response_size(1024).is_ok());
        assert!(limits.check_response_size(11 * 1024 * 1024).is_err());
    }
}
