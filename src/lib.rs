//! # soapbind
//!
//! A typed SOAP client engine: parse a WSDL service description, derive
//! a canonical type mapping for its complex types, and invoke remote
//! operations by marshaling typed values into SOAP 1.1 envelopes and
//! unmarshaling the responses back.
//!
//! ## Features
//!
//! - WSDL 1.1 parsing with embedded or supplemental XSD schemas
//! - Deterministic schema-to-type mapping, including synthesized names
//!   for anonymous nested types
//! - Envelope marshaling/unmarshaling driven by one shared field table,
//!   with SOAP fault detection
//! - Blocking HTTP invocation with a request hook chain
//! - Process-wide mapping cache shared across concurrent invocations
//!
//! ## Example
//!
//! ```rust,ignore
//! use soapbind::{wsdl, SoapClient};
//!
//! let service = wsdl::from_file("tempconvert.wsdl")?;
//! let client = SoapClient::new(service);
//!
//! let request = client
//!     .request("FahrenheitToCelsius")?
//!     .with_field("Fahrenheit", "100");
//! let response = client.invoke("FahrenheitToCelsius", request)?;
//! println!("{}", response.to_json());
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

// Foundation
pub mod error;
pub mod limits;

// XML plumbing
pub mod documents;
pub mod names;
pub mod namespaces;

// Resource loading
pub mod loaders;
pub mod locations;

// Schema model and WSDL parsing
pub mod schema;
pub mod wsdl;

// Type mapping and runtime values
pub mod catalog;
pub mod coercion;
pub mod mapping;
pub mod values;

// Envelope codec and invocation
pub mod client;
pub mod soap;

// Re-exports for convenience
pub use client::{ClientConfig, RequestHook, SoapClient, SoapRequest};
pub use error::{Error, Fault, MalformedField, Result};
pub use mapping::TypeTable;
pub use schema::WsdlService;
pub use soap::DecodeMode;
pub use values::{TypedValue, Value};

/// Version of the soapbind library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// XSD namespace
pub const XSD_NAMESPACE: &str = "http://www.w3.org/2001/XMLSchema";

/// SOAP 1.1 envelope namespace
pub const SOAP_ENVELOPE_NAMESPACE: &str = "http://schemas.xmlsoap.org/soap/envelope/";

/// WSDL 1.1 namespace
pub const WSDL_NAMESPACE: &str = "http://schemas.xmlsoap.org/wsdl/";

/// WSDL SOAP binding namespace
pub const WSDL_SOAP_NAMESPACE: &str = "http://schemas.xmlsoap.org/wsdl/soap/";
