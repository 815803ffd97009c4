//! Error types for soapbind
//!
//! This module defines all error types used throughout the library,
//! from schema mapping failures to per-call transport anomalies.

use std::fmt;
use thiserror::Error;

/// Result type alias using soapbind Error
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for soapbind operations
#[derive(Error, Debug)]
pub enum Error {
    /// Schema references a primitive or construct the mapping cannot represent.
    /// Reported at mapping-build time, never at call time.
    #[error("unsupported schema type: {0}")]
    UnsupportedSchemaType(String),

    /// A data shape the marshaler cannot encode (e.g. array-of-array).
    /// Reported at marshal time for the offending value.
    #[error("unsupported shape: {0}")]
    UnsupportedShape(String),

    /// Text content could not be coerced to a field's primitive type
    #[error("malformed field: {0}")]
    MalformedField(#[from] MalformedField),

    /// A well-formed SOAP fault returned by the remote service
    #[error("SOAP fault: {0}")]
    Fault(#[from] Fault),

    /// Transport-level failure (connect, send, read)
    #[error("transport error: {0}")]
    Transport(String),

    /// A response that is neither a decodable result nor a parseable fault
    #[error("unexpected response (HTTP {status}): {detail}")]
    UnexpectedResponse {
        /// HTTP status code of the response
        status: u16,
        /// What made the response unusable
        detail: String,
    },

    /// Value error (text not coercible to a primitive)
    #[error("value error: {0}")]
    Value(String),

    /// WSDL/XSD parsing error
    #[error("parse error: {0}")]
    Parse(#[from] ParseError),

    /// Resource loading error
    #[error("resource error: {0}")]
    Resource(String),

    /// Namespace error
    #[error("namespace error: {0}")]
    Namespace(String),

    /// Name error (invalid XML name)
    #[error("name error: {0}")]
    Name(String),

    /// Limit exceeded error
    #[error("limit exceeded: {0}")]
    LimitExceeded(String),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// XML parsing error
    #[error("XML error: {0}")]
    Xml(String),

    /// URL parsing error
    #[error("URL error: {0}")]
    Url(#[from] url::ParseError),

    /// Generic error
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Check whether this error is a remote SOAP fault
    pub fn is_fault(&self) -> bool {
        matches!(self, Error::Fault(_))
    }
}

/// Unmarshal coercion error with field identity and the offending text
#[derive(Debug, Clone)]
pub struct MalformedField {
    /// Name of the type being decoded
    pub type_name: String,
    /// Field identifier within the type
    pub field: String,
    /// Raw text content that failed to coerce
    pub text: String,
    /// Underlying coercion failure
    pub reason: Option<String>,
}

impl MalformedField {
    /// Create a new malformed-field error
    pub fn new(
        type_name: impl Into<String>,
        field: impl Into<String>,
        text: impl Into<String>,
    ) -> Self {
        Self {
            type_name: type_name.into(),
            field: field.into(),
            text: text.into(),
            reason: None,
        }
    }

    /// Set the underlying reason
    pub fn with_reason(mut self, reason: impl Into<String>) -> Self {
        self.reason = Some(reason.into());
        self
    }
}

impl fmt::Display for MalformedField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "field '{}.{}' cannot be decoded from '{}'",
            self.type_name, self.field, self.text
        )?;

        if let Some(ref reason) = self.reason {
            write!(f, ": {}", reason)?;
        }

        Ok(())
    }
}

impl std::error::Error for MalformedField {}

/// SOAP fault payload extracted from a response body
///
/// A fault is an expected outcome of a call, not a crash: the remote
/// service answered, and the answer is an error report.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fault {
    /// Human-readable message from the faultstring child
    pub fault_string: String,
    /// Fault code, when the response carried one
    pub fault_code: Option<String>,
    /// Detail payload, when the response carried one
    pub detail: Option<String>,
}

impl Fault {
    /// Create a fault from its faultstring message
    pub fn new(fault_string: impl Into<String>) -> Self {
        Self {
            fault_string: fault_string.into(),
            fault_code: None,
            detail: None,
        }
    }

    /// Set the fault code
    pub fn with_code(mut self, code: impl Into<String>) -> Self {
        self.fault_code = Some(code.into());
        self
    }

    /// Set the detail payload
    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }
}

impl fmt::Display for Fault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.fault_string)?;

        if let Some(ref code) = self.fault_code {
            write!(f, " (code: {})", code)?;
        }

        Ok(())
    }
}

impl std::error::Error for Fault {}

/// WSDL/XSD parsing error
#[derive(Debug, Clone)]
pub struct ParseError {
    /// Error message
    pub message: String,
    /// Location in the source document
    pub location: Option<String>,
    /// Document source that caused the error
    pub source: Option<String>,
}

impl ParseError {
    /// Create a new parse error
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            location: None,
            source: None,
        }
    }

    /// Set the location
    pub fn with_location(mut self, location: impl Into<String>) -> Self {
        self.location = Some(location.into());
        self
    }

    /// Set the source
    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)?;

        if let Some(ref loc) = self.location {
            write!(f, "\n\nLocation: {}", loc)?;
        }

        if let Some(ref src) = self.source {
            write!(f, "\n\nSource:\n{}", src)?;
        }

        Ok(())
    }
}

impl std::error::Error for ParseError {}
