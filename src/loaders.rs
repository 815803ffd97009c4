//! Resource loading utilities
//!
//! This module handles loading of WSDL and XSD documents from files,
//! remote URLs, and in-memory strings.

use crate::error::{Error, Result};
use crate::limits::Limits;
use crate::locations::Location;
use std::fs;
use tracing::debug;

/// Resource loader for service descriptions and schemas
#[derive(Debug)]
pub struct Loader {
    /// Resource limits
    limits: Limits,
    /// Whether to allow remote resources
    allow_remote: bool,
}

impl Loader {
    /// Create a new loader with default settings
    pub fn new() -> Self {
        Self {
            limits: Limits::default(),
            allow_remote: true,
        }
    }

    /// Set the limits
    pub fn with_limits(mut self, limits: Limits) -> Self {
        self.limits = limits;
        self
    }

    /// Set whether to allow remote resources
    pub fn with_allow_remote(mut self, allow: bool) -> Self {
        self.allow_remote = allow;
        self
    }

    /// Get the configured limits
    pub fn limits(&self) -> &Limits {
        &self.limits
    }

    /// Load a resource as a string
    pub fn load(&self, location: &Location) -> Result<String> {
        match location {
            Location::Path(path) => {
                let content = fs::read_to_string(path).map_err(|e| {
                    Error::Resource(format!("Failed to read file '{}': {}", path.display(), e))
                })?;

                self.limits.check_document_size(content.len())?;

                Ok(content)
            }
            Location::Url(url) => {
                if !self.allow_remote {
                    return Err(Error::Resource(
                        "Remote resources are not allowed".to_string(),
                    ));
                }

                debug!(url = %url, "fetching remote document");

                let mut response = ureq::get(url.as_str()).call().map_err(|e| {
                    Error::Resource(format!("Failed to fetch '{}': {}", url, e))
                })?;

                let content = response
                    .body_mut()
                    .with_config()
                    .limit(self.limits.max_document_size as u64)
                    .read_to_string()
                    .map_err(|e| {
                        Error::Resource(format!("Failed to read body of '{}': {}", url, e))
                    })?;

                Ok(content)
            }
            Location::String(s) => {
                self.limits.check_document_size(s.len())?;
                Ok(s.clone())
            }
        }
    }
}

impl Default for Loader {
    fn default() -> Self {
        Self::new()
    }
}
