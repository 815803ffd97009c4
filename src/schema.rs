//! Schema model for parsed service descriptions
//!
//! This module defines the read-only model produced by WSDL/XSD parsing and
//! consumed by the type mapping engine: the service with its operations and
//! endpoint, complex type definitions with ordered element sequences, and
//! occurrence bounds. Nothing here mutates after parsing completes.

use crate::error::{ParseError, Result};
use crate::namespaces::QName;
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

/// Occurrence bounds for an element declaration (minOccurs, maxOccurs)
/// None for max means unbounded
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Occurs {
    /// Minimum number of occurrences (default 1)
    pub min: u32,
    /// Maximum number of occurrences (None = unbounded, default 1)
    pub max: Option<u32>,
}

impl Occurs {
    /// Create new occurrence bounds
    pub fn new(min: u32, max: Option<u32>) -> Self {
        Self { min, max }
    }

    /// Default occurrence (1, 1)
    pub fn once() -> Self {
        Self { min: 1, max: Some(1) }
    }

    /// Optional occurrence (0, 1)
    pub fn optional() -> Self {
        Self { min: 0, max: Some(1) }
    }

    /// Zero or more (0, unbounded)
    pub fn zero_or_more() -> Self {
        Self { min: 0, max: None }
    }

    /// One or more (1, unbounded)
    pub fn one_or_more() -> Self {
        Self { min: 1, max: None }
    }

    /// Check if this declaration can be absent (minOccurs == 0)
    pub fn is_emptiable(&self) -> bool {
        self.min == 0
    }

    /// Check if this declaration has maxOccurs == 1
    pub fn is_single(&self) -> bool {
        self.max == Some(1)
    }

    /// Check if this declaration admits repetition (maxOccurs > 1 or unbounded)
    ///
    /// Repetition is what makes a mapped field an array.
    pub fn is_multiple(&self) -> bool {
        match self.max {
            Some(max) => max > 1,
            None => true,
        }
    }
}

impl Default for Occurs {
    fn default() -> Self {
        Self::once()
    }
}

/// Parse minOccurs/maxOccurs from XML attribute values
pub fn parse_occurs(min_occurs: Option<&str>, max_occurs: Option<&str>) -> Result<Occurs> {
    let mut occurs = Occurs::once();

    // Parse minOccurs
    if let Some(min_str) = min_occurs {
        match min_str.parse::<u32>() {
            Ok(min) => occurs.min = min,
            Err(_) => {
                return Err(ParseError::new(
                    "minOccurs value is not a valid non-negative integer",
                )
                .into())
            }
        }
    }

    // Parse maxOccurs
    if let Some(max_str) = max_occurs {
        if max_str == "unbounded" {
            occurs.max = None;
        } else {
            match max_str.parse::<u32>() {
                Ok(max) => {
                    if occurs.min > max {
                        return Err(ParseError::new(
                            "maxOccurs must be 'unbounded' or greater than minOccurs",
                        )
                        .into());
                    }
                    occurs.max = Some(max);
                }
                Err(_) => {
                    return Err(ParseError::new(
                        "maxOccurs value must be a non-negative integer or 'unbounded'",
                    )
                    .into())
                }
            }
        }
    } else {
        // Default maxOccurs is 1, but must be >= minOccurs
        if occurs.min > 1 {
            return Err(ParseError::new(
                "minOccurs must be lesser or equal than maxOccurs",
            )
            .into());
        }
    }

    Ok(occurs)
}

/// One element declaration inside a complex type's sequence
#[derive(Debug, Clone)]
pub struct XsdElementDecl {
    /// Element name (also the wire tag name)
    pub name: String,
    /// Resolved type reference (primitive or named complex type)
    pub type_ref: Option<QName>,
    /// Inline anonymous complex type, when declared in place
    pub inline: Option<XsdComplexType>,
    /// Occurrence bounds
    pub occurs: Occurs,
}

impl XsdElementDecl {
    /// Create a declaration referencing a type by QName
    pub fn referencing(name: impl Into<String>, type_ref: QName, occurs: Occurs) -> Self {
        Self {
            name: name.into(),
            type_ref: Some(type_ref),
            inline: None,
            occurs,
        }
    }

    /// Create a declaration with an inline anonymous complex type
    pub fn with_inline(name: impl Into<String>, inline: XsdComplexType, occurs: Occurs) -> Self {
        Self {
            name: name.into(),
            type_ref: None,
            inline: Some(inline),
            occurs,
        }
    }
}

/// A complex type definition: an ordered sequence of element declarations
///
/// The sequence order is semantically significant; it fixes both mapped
/// field order and the order elements appear in a SOAP body.
#[derive(Debug, Clone)]
pub struct XsdComplexType {
    /// Type name; None for anonymous inline types
    pub name: Option<String>,
    /// Ordered element sequence
    pub sequence: Vec<XsdElementDecl>,
}

impl XsdComplexType {
    /// Create a named complex type
    pub fn named(name: impl Into<String>, sequence: Vec<XsdElementDecl>) -> Self {
        Self {
            name: Some(name.into()),
            sequence,
        }
    }

    /// Create an anonymous complex type
    pub fn anonymous(sequence: Vec<XsdElementDecl>) -> Self {
        Self {
            name: None,
            sequence,
        }
    }
}

/// A top-level element declaration from an embedded schema
///
/// Operation request/response wrappers are declared this way in
/// document/literal WSDLs: either with an inline complex type, or
/// referencing a named one.
#[derive(Debug, Clone)]
pub struct XsdTopLevelElement {
    /// Element name
    pub name: String,
    /// Resolved type reference, when declared with type="..."
    pub type_ref: Option<QName>,
    /// Inline complex type, when declared in place
    pub inline: Option<XsdComplexType>,
}

/// One service operation
#[derive(Debug, Clone)]
pub struct WsdlOperation {
    /// Operation name
    pub name: String,
    /// Local name of the request wrapper element
    pub input_element: String,
    /// Local name of the response wrapper element (None for one-way)
    pub output_element: Option<String>,
    /// SOAPAction from the binding, when declared
    pub soap_action: Option<String>,
}

/// A parsed service description
///
/// Built once per WSDL (plus any supplemental schemas) and immutable
/// thereafter; safe to share across concurrent invocations.
#[derive(Debug, Clone, Default)]
pub struct WsdlService {
    /// Service name
    pub name: String,
    /// Target namespace of the definitions
    pub target_namespace: String,
    /// Endpoint address from soap:address, when present
    pub endpoint: Option<String>,
    /// Operations in declaration order
    pub operations: Vec<WsdlOperation>,
    /// Top-level element declarations from embedded schemas
    pub elements: Vec<XsdTopLevelElement>,
    /// Named complex type definitions from embedded schemas
    pub types: Vec<XsdComplexType>,
    /// Parse errors collected while building the model
    pub errors: Vec<ParseError>,
}

impl WsdlService {
    /// Identity key for process-wide caches: namespace plus service name
    /// plus a fingerprint of the declared type set
    ///
    /// The fingerprint covers element and type names (and each type's
    /// field names), so a service extended with supplemental schemas is
    /// keyed apart from its unextended form.
    pub fn identity(&self) -> String {
        let mut hasher = DefaultHasher::new();
        for element in &self.elements {
            element.name.hash(&mut hasher);
        }
        for complex in &self.types {
            complex.name.hash(&mut hasher);
            for decl in &complex.sequence {
                decl.name.hash(&mut hasher);
            }
        }
        format!(
            "{}#{}@{:016x}",
            self.target_namespace,
            self.name,
            hasher.finish()
        )
    }

    /// Look up an operation by name
    pub fn operation(&self, name: &str) -> Option<&WsdlOperation> {
        self.operations.iter().find(|op| op.name == name)
    }

    /// Look up a named complex type
    pub fn find_type(&self, name: &str) -> Option<&XsdComplexType> {
        self.types
            .iter()
            .find(|t| t.name.as_deref() == Some(name))
    }

    /// Look up a top-level element declaration
    pub fn find_element(&self, name: &str) -> Option<&XsdTopLevelElement> {
        self.elements.iter().find(|e| e.name == name)
    }

    /// Number of operations
    pub fn operation_count(&self) -> usize {
        self.operations.len()
    }

    /// Record a parse error
    pub fn parse_error(&mut self, error: ParseError) {
        self.errors.push(error);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_occurs_presets() {
        assert_eq!(Occurs::once(), Occurs::new(1, Some(1)));
        assert_eq!(Occurs::optional(), Occurs::new(0, Some(1)));
        assert_eq!(Occurs::zero_or_more(), Occurs::new(0, None));
        assert_eq!(Occurs::one_or_more(), Occurs::new(1, None));
    }

    #[test]
    fn test_occurs_predicates() {
        assert!(Occurs::optional().is_emptiable());
        assert!(Occurs::optional().is_single());
        assert!(!Occurs::optional().is_multiple());

        assert!(Occurs::zero_or_more().is_multiple());
        assert!(Occurs::new(0, Some(5)).is_multiple());
        assert!(!Occurs::once().is_multiple());
    }

    #[test]
    fn test_parse_occurs_default() {
        let occurs = parse_occurs(None, None).unwrap();
        assert_eq!(occurs, Occurs::once());
    }

    #[test]
    fn test_parse_occurs_values() {
        let occurs = parse_occurs(Some("0"), Some("5")).unwrap();
        assert_eq!(occurs, Occurs::new(0, Some(5)));

        let occurs = parse_occurs(Some("1"), Some("unbounded")).unwrap();
        assert_eq!(occurs, Occurs::new(1, None));
    }

    #[test]
    fn test_parse_occurs_errors() {
        // Invalid minOccurs
        assert!(parse_occurs(Some("abc"), None).is_err());

        // Invalid maxOccurs
        assert!(parse_occurs(None, Some("abc")).is_err());

        // minOccurs > maxOccurs
        assert!(parse_occurs(Some("5"), Some("3")).is_err());

        // minOccurs > default maxOccurs (1)
        assert!(parse_occurs(Some("5"), None).is_err());
    }

    #[test]
    fn test_service_lookups() {
        let mut service = WsdlService {
            name: "TempConvert".to_string(),
            target_namespace: "https://www.w3schools.com/xml/".to_string(),
            ..Default::default()
        };
        service.operations.push(WsdlOperation {
            name: "FahrenheitToCelsius".to_string(),
            input_element: "FahrenheitToCelsius".to_string(),
            output_element: Some("FahrenheitToCelsiusResponse".to_string()),
            soap_action: None,
        });
        service.types.push(XsdComplexType::named(
            "Temp",
            vec![XsdElementDecl::referencing(
                "Fahrenheit",
                QName::namespaced(crate::XSD_NAMESPACE, "string"),
                Occurs::once(),
            )],
        ));

        assert!(service.operation("FahrenheitToCelsius").is_some());
        assert!(service.operation("Missing").is_none());
        assert!(service.find_type("Temp").is_some());
        assert!(service
            .identity()
            .starts_with("https://www.w3schools.com/xml/#TempConvert"));
    }

    #[test]
    fn test_identity_changes_with_type_set() {
        let mut service = WsdlService {
            name: "Svc".to_string(),
            target_namespace: "urn:svc".to_string(),
            ..Default::default()
        };
        let bare = service.identity();
        assert_eq!(service.clone().identity(), bare);

        service.types.push(XsdComplexType::named(
            "Extra",
            vec![XsdElementDecl::referencing(
                "Count",
                QName::namespaced(crate::XSD_NAMESPACE, "int"),
                Occurs::once(),
            )],
        ));
        assert_ne!(service.identity(), bare);
    }
}
