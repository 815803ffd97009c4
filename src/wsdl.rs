//! WSDL/XSD parsing
//!
//! This module decodes a WSDL 1.1 document (with embedded `xs:schema`
//! blocks) into the read-only [`WsdlService`] model the type mapping
//! engine consumes. Supplemental XSD documents can extend an already
//! parsed service with additional elements and types.
//!
//! Recoverable problems (an unsupported content model, a message that
//! resolves to nothing) are collected as [`ParseError`]s on the service
//! rather than aborting the whole parse; the mapping stage then prunes
//! whatever depends on the skipped construct.

use crate::documents::{Document, Element};
use crate::error::{Error, ParseError, Result};
use crate::limits::Limits;
use crate::loaders::Loader;
use crate::locations::Location;
use crate::schema::{
    parse_occurs, WsdlOperation, WsdlService, XsdComplexType, XsdElementDecl, XsdTopLevelElement,
};
use std::collections::HashMap;
use tracing::{debug, warn};

/// Parse a WSDL document from a string
pub fn parse(xml: &str) -> Result<WsdlService> {
    parse_with_limits(xml, &Limits::default())
}

/// Parse a WSDL document from a string under explicit limits
pub fn parse_with_limits(xml: &str, limits: &Limits) -> Result<WsdlService> {
    let doc = Document::parse_with_limits(xml.as_bytes(), limits)?;
    let root = doc
        .root()
        .ok_or_else(|| Error::Parse(ParseError::new("document has no root element")))?;

    if !root.qname.matches(crate::WSDL_NAMESPACE, "definitions") {
        return Err(Error::Parse(
            ParseError::new("root element is not wsdl:definitions")
                .with_location(root.qname.to_string()),
        ));
    }

    let mut service = WsdlService {
        name: root.get_attribute("name").unwrap_or("").to_string(),
        target_namespace: root
            .get_attribute("targetNamespace")
            .unwrap_or("")
            .to_string(),
        ..Default::default()
    };

    for types in root.find_children("types") {
        for schema in &types.children {
            if schema.qname.matches(crate::XSD_NAMESPACE, "schema") {
                walk_schema(&mut service, schema);
            }
        }
    }

    let messages = collect_messages(&mut service, root);
    collect_operations(&mut service, root, &messages);
    apply_bindings(&mut service, root);
    collect_service(&mut service, root);

    debug!(
        service = %service.name,
        operations = service.operations.len(),
        elements = service.elements.len(),
        types = service.types.len(),
        "parsed WSDL definitions"
    );

    Ok(service)
}

/// Parse a WSDL document from a file path
pub fn from_file(path: impl AsRef<std::path::Path>) -> Result<WsdlService> {
    let location = Location::Path(path.as_ref().to_path_buf());
    from_location(&location, &Loader::new())
}

/// Parse a WSDL document from a resolved location
pub fn from_location(location: &Location, loader: &Loader) -> Result<WsdlService> {
    let content = loader.load(location)?;
    parse_with_limits(&content, loader.limits())
}

/// Extend a parsed service with a supplemental XSD document
///
/// Top-level elements and complex types of the schema are appended to
/// the service's type set, as if they had been embedded in the WSDL.
pub fn add_schema(service: &mut WsdlService, xml: &str) -> Result<()> {
    add_schema_with_limits(service, xml, &Limits::default())
}

/// Extend a parsed service with a supplemental XSD document under limits
pub fn add_schema_with_limits(
    service: &mut WsdlService,
    xml: &str,
    limits: &Limits,
) -> Result<()> {
    let doc = Document::parse_with_limits(xml.as_bytes(), limits)?;
    let root = doc
        .root()
        .ok_or_else(|| Error::Parse(ParseError::new("document has no root element")))?;

    if !root.qname.matches(crate::XSD_NAMESPACE, "schema") {
        return Err(Error::Parse(
            ParseError::new("root element is not xs:schema")
                .with_location(root.qname.to_string()),
        ));
    }

    walk_schema(service, root);
    Ok(())
}

/// Walk one `xs:schema` block, collecting top-level elements and named
/// complex types
fn walk_schema(service: &mut WsdlService, schema: &Element) {
    for child in &schema.children {
        if child.qname.namespace.as_deref() != Some(crate::XSD_NAMESPACE) {
            continue;
        }
        match child.local_name() {
            "element" => match parse_top_level_element(child) {
                Ok(element) => service.elements.push(element),
                Err(e) => {
                    warn!(error = %e, "skipping top-level element");
                    service.parse_error(e);
                }
            },
            "complexType" => {
                let Some(name) = child.get_attribute("name") else {
                    service.parse_error(ParseError::new(
                        "top-level complexType without a name",
                    ));
                    continue;
                };
                match parse_complex(child) {
                    Ok(mut complex) => {
                        complex.name = Some(name.to_string());
                        service.types.push(complex);
                    }
                    Err(e) => {
                        warn!(type_name = name, error = %e, "skipping complex type");
                        service.parse_error(e.with_location(name));
                    }
                }
            }
            // annotation, import, simpleType and friends carry nothing
            // the mapping can use
            other => debug!(construct = other, "ignoring schema construct"),
        }
    }
}

/// Parse a top-level `xs:element` declaration
fn parse_top_level_element(element: &Element) -> std::result::Result<XsdTopLevelElement, ParseError> {
    let name = element
        .get_attribute("name")
        .ok_or_else(|| ParseError::new("element declaration without a name"))?
        .to_string();

    if let Some(type_attr) = element.get_attribute("type") {
        let type_ref = element
            .namespaces
            .resolve(type_attr)
            .map_err(|e| ParseError::new(e.to_string()).with_location(&name))?;
        return Ok(XsdTopLevelElement {
            name,
            type_ref: Some(type_ref),
            inline: None,
        });
    }

    if let Some(inline) = find_xsd_child(element, "complexType") {
        let complex = parse_complex(inline).map_err(|e| e.with_location(&name))?;
        return Ok(XsdTopLevelElement {
            name,
            type_ref: None,
            inline: Some(complex),
        });
    }

    Err(ParseError::new("element declares neither a type nor an inline complexType")
        .with_location(name))
}

/// Parse a complex type definition into its ordered element sequence
///
/// Only `xs:sequence` content is representable; `choice`, `all` and
/// attribute-bearing models are outside this client's scope.
fn parse_complex(complex: &Element) -> std::result::Result<XsdComplexType, ParseError> {
    for child in &complex.children {
        if child.qname.namespace.as_deref() != Some(crate::XSD_NAMESPACE) {
            continue;
        }
        match child.local_name() {
            "sequence" => {
                let mut sequence = Vec::with_capacity(child.children.len());
                for decl in &child.children {
                    if decl.qname.matches(crate::XSD_NAMESPACE, "element") {
                        sequence.push(parse_element_decl(decl)?);
                    }
                }
                return Ok(XsdComplexType::anonymous(sequence));
            }
            "annotation" => continue,
            other => {
                return Err(ParseError::new(format!(
                    "unsupported content model '{}'",
                    other
                )))
            }
        }
    }
    // Empty complexType: a valid, fieldless wrapper
    Ok(XsdComplexType::anonymous(Vec::new()))
}

/// Parse one element declaration inside a sequence
fn parse_element_decl(decl: &Element) -> std::result::Result<XsdElementDecl, ParseError> {
    let name = decl
        .get_attribute("name")
        .ok_or_else(|| ParseError::new("sequence element without a name"))?
        .to_string();

    let occurs = parse_occurs(
        decl.get_attribute("minOccurs"),
        decl.get_attribute("maxOccurs"),
    )
    .map_err(|e| ParseError::new(e.to_string()).with_location(&name))?;

    if let Some(type_attr) = decl.get_attribute("type") {
        let type_ref = decl
            .namespaces
            .resolve(type_attr)
            .map_err(|e| ParseError::new(e.to_string()).with_location(&name))?;
        return Ok(XsdElementDecl::referencing(name, type_ref, occurs));
    }

    if let Some(inline) = find_xsd_child(decl, "complexType") {
        let complex = parse_complex(inline).map_err(|e| e.with_location(&name))?;
        return Ok(XsdElementDecl::with_inline(name, complex, occurs));
    }

    Err(ParseError::new("element declares neither a type nor an inline complexType")
        .with_location(name))
}

/// Collect `wsdl:message` definitions into a name -> element local name map
fn collect_messages(service: &mut WsdlService, root: &Element) -> HashMap<String, String> {
    let mut messages = HashMap::new();
    for message in root.find_children("message") {
        let Some(name) = message.get_attribute("name") else {
            service.parse_error(ParseError::new("message without a name"));
            continue;
        };
        let Some(part) = message.find_child("part") else {
            continue;
        };
        let Some(element_attr) = part.get_attribute("element") else {
            service.parse_error(
                ParseError::new("message part without an element reference").with_location(name),
            );
            continue;
        };
        let (_, local) = crate::names::split_qname(element_attr);
        messages.insert(name.to_string(), local.to_string());
    }
    messages
}

/// Collect operations from the port types, resolving message references
/// to wrapper element names
fn collect_operations(
    service: &mut WsdlService,
    root: &Element,
    messages: &HashMap<String, String>,
) {
    let resolve = |message_attr: &str| -> Option<String> {
        let (_, local) = crate::names::split_qname(message_attr);
        messages.get(local).cloned()
    };

    for port_type in root.find_children("portType") {
        for operation in port_type.find_children("operation") {
            let Some(name) = operation.get_attribute("name") else {
                service.parse_error(ParseError::new("operation without a name"));
                continue;
            };

            let input_element = operation
                .find_child("input")
                .and_then(|input| input.get_attribute("message"))
                .and_then(|m| resolve(m))
                // Document/literal wrappers conventionally share the
                // operation name
                .unwrap_or_else(|| name.to_string());

            let output_element = operation
                .find_child("output")
                .map(|output| {
                    output
                        .get_attribute("message")
                        .and_then(|m| resolve(m))
                        .unwrap_or_else(|| format!("{}Response", name))
                });

            service.operations.push(WsdlOperation {
                name: name.to_string(),
                input_element,
                output_element,
                soap_action: None,
            });
        }
    }
}

/// Copy soapAction declarations from the bindings onto the operations
fn apply_bindings(service: &mut WsdlService, root: &Element) {
    for binding in root.find_children("binding") {
        for operation in binding.find_children("operation") {
            let Some(name) = operation.get_attribute("name") else {
                continue;
            };
            let action = operation.children.iter().find_map(|child| {
                if child.qname.matches(crate::WSDL_SOAP_NAMESPACE, "operation") {
                    child.get_attribute("soapAction")
                } else {
                    None
                }
            });
            if let Some(action) = action {
                if let Some(op) = service.operations.iter_mut().find(|op| op.name == name) {
                    op.soap_action = Some(action.to_string());
                }
            }
        }
    }
}

/// Take the service name and endpoint address from the `wsdl:service`
/// section; the first port carrying a soap:address wins
fn collect_service(service: &mut WsdlService, root: &Element) {
    for service_el in root.find_children("service") {
        if let Some(name) = service_el.get_attribute("name") {
            service.name = name.to_string();
        }
        for port in service_el.find_children("port") {
            let address = port.children.iter().find_map(|child| {
                if child.qname.matches(crate::WSDL_SOAP_NAMESPACE, "address") {
                    child.get_attribute("location")
                } else {
                    None
                }
            });
            if let Some(location) = address {
                if service.endpoint.is_none() {
                    service.endpoint = Some(location.to_string());
                }
            }
        }
    }
}

/// First child in the XSD namespace with the given local name
fn find_xsd_child<'a>(element: &'a Element, local_name: &str) -> Option<&'a Element> {
    element
        .children
        .iter()
        .find(|child| child.qname.matches(crate::XSD_NAMESPACE, local_name))
}
