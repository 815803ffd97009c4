//! SOAP envelope codec
//!
//! This module turns typed values into SOAP 1.1 envelopes and back,
//! driven entirely by the field descriptors of a [`TypeTable`]: both
//! directions walk the same canonical field lists, so whatever the
//! mapping decides about order, arrays and nesting holds identically
//! for encoding and decoding.
//!
//! - [`marshal`] builds the request envelope for a typed value
//! - [`unmarshal`] populates a typed value from a response body, with
//!   fault detection taking precedence over result decoding
//! - [`find_fault`] extracts a SOAP fault from a body subtree
//!
//! [`TypeTable`]: crate::mapping::TypeTable

mod decode;
mod encode;
mod fault;

pub use decode::{unmarshal, unmarshal_fields, DecodeMode, Decoded};
pub use encode::marshal;
pub use fault::find_fault;

/// Prefix used for the SOAP envelope namespace on the wire
pub const ENVELOPE_PREFIX: &str = "S";

/// Prefix used for the service's target namespace on the wire
pub const TNS_PREFIX: &str = "tns";
