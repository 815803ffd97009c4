//! Envelope unmarshaling
//!
//! Populates a [`TypedValue`] from a received SOAP body, walking the
//! same canonical field lists the marshaler emits from. Fault detection
//! short-circuits everything else; a missing element for a non-array
//! field yields the field's declared default (minOccurs="0" leniency);
//! text that cannot be coerced is a [`MalformedField`].

use super::fault::find_fault;
use crate::documents::Element;
use crate::error::{Error, MalformedField, Result};
use crate::mapping::{FieldKind, MappedType, Primitive, TypeTable};
use crate::values::{TypedValue, Value};

/// Policy for coercion failures during decoding
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DecodeMode {
    /// Fail on the first malformed field
    #[default]
    Strict,
    /// Substitute the field's default and accumulate the errors on the
    /// decode result
    Lax,
}

/// A decoded value together with the malformed fields tolerated in
/// [`DecodeMode::Lax`]
///
/// In strict mode `errors` is always empty; a malformed field would
/// have failed the decode instead.
#[derive(Debug, Clone)]
pub struct Decoded {
    /// The populated value
    pub value: TypedValue,
    /// Malformed fields substituted with defaults (lax mode only)
    pub errors: Vec<MalformedField>,
}

impl Decoded {
    /// Whether every field decoded cleanly
    pub fn is_clean(&self) -> bool {
        self.errors.is_empty()
    }
}

/// Decode a SOAP body into a typed value
///
/// `body` is the `Body` element (or the whole envelope). A fault in the
/// body is returned as [`Error::Fault`] before any result decoding is
/// attempted. Otherwise the wrapper element named `element_name` is
/// located and its children are decoded against the element's mapped
/// type; a missing wrapper decodes to a fully-defaulted instance.
pub fn unmarshal(
    body: &Element,
    element_name: &str,
    table: &TypeTable,
    mode: DecodeMode,
) -> Result<Decoded> {
    if let Some(fault) = find_fault(body) {
        return Err(fault.into());
    }

    let mapped = table.wrapper_type(element_name)?;

    let wrapper = if body.local_name() == element_name {
        Some(body)
    } else {
        body.find_child(element_name)
            .or_else(|| body.find_descendant_named(element_name))
    };

    match wrapper {
        Some(element) => {
            let mut errors = Vec::new();
            let value = decode_complex(element, mapped, table, mode, &mut errors)?;
            Ok(Decoded { value, errors })
        }
        None => Ok(Decoded {
            value: table.default_instance(&mapped.name)?,
            errors: Vec::new(),
        }),
    }
}

/// Decode the fields of `element` against a mapped type
///
/// Skips the fault check and wrapper search of [`unmarshal`]; useful
/// when the caller already holds the element a type's fields live in.
pub fn unmarshal_fields(
    element: &Element,
    mapped: &MappedType,
    table: &TypeTable,
    mode: DecodeMode,
) -> Result<Decoded> {
    let mut errors = Vec::new();
    let value = decode_complex(element, mapped, table, mode, &mut errors)?;
    Ok(Decoded { value, errors })
}

/// Decode one complex value, scoped to `element`'s immediate children
///
/// Scoping is what keeps same-named tags at different nesting levels
/// from colliding: each recursion only sees its own subtree.
fn decode_complex(
    element: &Element,
    mapped: &MappedType,
    table: &TypeTable,
    mode: DecodeMode,
    errors: &mut Vec<MalformedField>,
) -> Result<TypedValue> {
    let mut value = TypedValue::new(&mapped.name);

    for field in &mapped.fields {
        let decoded = match &field.kind {
            FieldKind::Primitive(primitive) => {
                match element.find_child(&field.wire_name) {
                    Some(child) => decode_primitive(
                        primitive,
                        child.text_content(),
                        mapped,
                        &field.ident,
                        mode,
                        errors,
                    )?,
                    // minOccurs="0" leniency: absent scalar means default
                    None => primitive.default_value(),
                }
            }
            FieldKind::Complex(target) => {
                let nested = table.require(target)?;
                match element.find_child(&field.wire_name) {
                    Some(child) => {
                        Value::Complex(decode_complex(child, nested, table, mode, errors)?)
                    }
                    None => Value::Complex(table.default_instance(target)?),
                }
            }
            FieldKind::ArrayOfPrimitive(primitive) => {
                let mut items = Vec::new();
                for child in element.find_children(&field.wire_name) {
                    items.push(decode_primitive(
                        primitive,
                        child.text_content(),
                        mapped,
                        &field.ident,
                        mode,
                        errors,
                    )?);
                }
                Value::Array(items)
            }
            FieldKind::ArrayOfComplex(target) => {
                let nested = table.require(target)?;
                let mut items = Vec::new();
                for child in element.find_children(&field.wire_name) {
                    items.push(Value::Complex(decode_complex(
                        child, nested, table, mode, errors,
                    )?));
                }
                Value::Array(items)
            }
        };
        value.set(field.ident.clone(), decoded);
    }

    Ok(value)
}

/// Coerce one text node, applying the configured malformed-field policy
fn decode_primitive(
    primitive: &Primitive,
    text: &str,
    mapped: &MappedType,
    ident: &str,
    mode: DecodeMode,
    errors: &mut Vec<MalformedField>,
) -> Result<Value> {
    match primitive.parse(text) {
        Ok(value) => Ok(value),
        Err(e) => {
            let malformed =
                MalformedField::new(&mapped.name, ident, text).with_reason(e.to_string());
            match mode {
                DecodeMode::Strict => Err(Error::MalformedField(malformed)),
                DecodeMode::Lax => {
                    errors.push(malformed);
                    Ok(primitive.default_value())
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::documents::Document;
    use crate::namespaces::QName;
    use crate::schema::{Occurs, WsdlService, XsdComplexType, XsdElementDecl};

    fn xsd(local: &str) -> QName {
        QName::namespaced(crate::XSD_NAMESPACE, local)
    }

    fn body_of(xml: &str) -> Element {
        Document::from_string(xml).unwrap().root().unwrap().clone()
    }

    fn table_with(types: Vec<XsdComplexType>) -> TypeTable {
        TypeTable::build(&WsdlService {
            target_namespace: "urn:x".to_string(),
            types,
            ..Default::default()
        })
    }

    const BODY_NS: &str = r#"<S:Body xmlns:S="http://schemas.xmlsoap.org/soap/envelope/">"#;

    #[test]
    fn test_unmarshal_simple_result() {
        let table = table_with(vec![XsdComplexType::named(
            "TempResponse",
            vec![XsdElementDecl::referencing(
                "Celsius",
                xsd("string"),
                Occurs::once(),
            )],
        )]);
        let body = body_of(&format!(
            "{}<TempResponse><Celsius>37.8</Celsius></TempResponse></S:Body>",
            BODY_NS
        ));

        let decoded = unmarshal(&body, "TempResponse", &table, DecodeMode::Strict).unwrap();
        assert!(decoded.is_clean());
        assert_eq!(
            decoded.value.get("Celsius"),
            Some(&Value::String("37.8".to_string()))
        );
    }

    #[test]
    fn test_fault_precedence_over_result() {
        let table = table_with(vec![XsdComplexType::named(
            "TempResponse",
            vec![XsdElementDecl::referencing(
                "Celsius",
                xsd("string"),
                Occurs::once(),
            )],
        )]);
        // Both a fault and a result-shaped sibling: the fault wins
        let body = body_of(&format!(
            concat!(
                "{}<S:Fault><faultstring>bad input</faultstring></S:Fault>",
                "<TempResponse><Celsius>37.8</Celsius></TempResponse></S:Body>"
            ),
            BODY_NS
        ));

        let err = unmarshal(&body, "TempResponse", &table, DecodeMode::Strict).unwrap_err();
        match err {
            Error::Fault(fault) => assert_eq!(fault.fault_string, "bad input"),
            other => panic!("expected a fault, got {:?}", other),
        }
    }

    #[test]
    fn test_scenario_b_fault_message() {
        let table = table_with(vec![]);
        let body = body_of(&format!(
            "{}<S:Fault><faultstring>bad input</faultstring></S:Fault></S:Body>",
            BODY_NS
        ));

        let err = unmarshal(&body, "Anything", &table, DecodeMode::Strict).unwrap_err();
        match err {
            Error::Fault(fault) => assert_eq!(fault.fault_string, "bad input"),
            other => panic!("expected a fault, got {:?}", other),
        }
    }

    #[test]
    fn test_scenario_c_array_in_document_order() {
        let table = table_with(vec![XsdComplexType::named(
            "ItemsResponse",
            vec![XsdElementDecl::referencing(
                "Item",
                xsd("string"),
                Occurs::zero_or_more(),
            )],
        )]);
        let body = body_of(&format!(
            concat!(
                "{}<ItemsResponse>",
                "<Item>a</Item><Item>b</Item><Item>c</Item>",
                "</ItemsResponse></S:Body>"
            ),
            BODY_NS
        ));

        let decoded = unmarshal(&body, "ItemsResponse", &table, DecodeMode::Strict).unwrap();
        assert_eq!(
            decoded.value.get("Item"),
            Some(&Value::Array(vec![
                Value::from("a"),
                Value::from("b"),
                Value::from("c")
            ]))
        );
    }

    #[test]
    fn test_missing_field_defaults() {
        let table = table_with(vec![XsdComplexType::named(
            "Partial",
            vec![
                XsdElementDecl::referencing("Name", xsd("string"), Occurs::once()),
                XsdElementDecl::referencing("Count", xsd("int"), Occurs::optional()),
            ],
        )]);
        let body = body_of(&format!(
            "{}<Partial><Name>only</Name></Partial></S:Body>",
            BODY_NS
        ));

        let decoded = unmarshal(&body, "Partial", &table, DecodeMode::Strict).unwrap();
        assert_eq!(decoded.value.get("Count"), Some(&Value::Int(0)));
    }

    #[test]
    fn test_missing_wrapper_defaults_whole_value() {
        let table = table_with(vec![XsdComplexType::named(
            "Empty",
            vec![XsdElementDecl::referencing(
                "Name",
                xsd("string"),
                Occurs::once(),
            )],
        )]);
        let body =
            body_of(r#"<S:Body xmlns:S="http://schemas.xmlsoap.org/soap/envelope/"/>"#);

        let decoded = unmarshal(&body, "Empty", &table, DecodeMode::Strict).unwrap();
        assert_eq!(
            decoded.value.get("Name"),
            Some(&Value::String(String::new()))
        );
    }

    #[test]
    fn test_nested_scoping_same_tag_names() {
        let table = table_with(vec![
            XsdComplexType::named(
                "Inner",
                vec![XsdElementDecl::referencing(
                    "Name",
                    xsd("string"),
                    Occurs::once(),
                )],
            ),
            XsdComplexType::named(
                "Outer",
                vec![
                    XsdElementDecl::referencing("Name", xsd("string"), Occurs::once()),
                    XsdElementDecl::referencing("Child", QName::local("Inner"), Occurs::once()),
                ],
            ),
        ]);
        let body = body_of(&format!(
            concat!(
                "{}<Outer><Name>outer</Name>",
                "<Child><Name>inner</Name></Child>",
                "</Outer></S:Body>"
            ),
            BODY_NS
        ));

        let decoded = unmarshal(&body, "Outer", &table, DecodeMode::Strict).unwrap();
        assert_eq!(
            decoded.value.get("Name"),
            Some(&Value::String("outer".to_string()))
        );
        let child = decoded.value.get("Child").and_then(Value::as_complex).unwrap();
        assert_eq!(child.get("Name"), Some(&Value::String("inner".to_string())));
    }

    #[test]
    fn test_strict_mode_fails_on_malformed_field() {
        let table = table_with(vec![XsdComplexType::named(
            "Numeric",
            vec![XsdElementDecl::referencing(
                "Count",
                xsd("int"),
                Occurs::once(),
            )],
        )]);
        let body = body_of(&format!(
            "{}<Numeric><Count>seven</Count></Numeric></S:Body>",
            BODY_NS
        ));

        let err = unmarshal(&body, "Numeric", &table, DecodeMode::Strict).unwrap_err();
        match err {
            Error::MalformedField(mf) => {
                assert_eq!(mf.field, "Count");
                assert_eq!(mf.text, "seven");
            }
            other => panic!("expected MalformedField, got {:?}", other),
        }
    }

    #[test]
    fn test_lax_mode_defaults_and_accumulates() {
        let table = table_with(vec![XsdComplexType::named(
            "Numeric",
            vec![
                XsdElementDecl::referencing("Count", xsd("int"), Occurs::once()),
                XsdElementDecl::referencing("Name", xsd("string"), Occurs::once()),
            ],
        )]);
        let body = body_of(&format!(
            "{}<Numeric><Count>seven</Count><Name>ok</Name></Numeric></S:Body>",
            BODY_NS
        ));

        let decoded = unmarshal(&body, "Numeric", &table, DecodeMode::Lax).unwrap();
        assert_eq!(decoded.errors.len(), 1);
        assert_eq!(decoded.errors[0].field, "Count");
        assert_eq!(decoded.value.get("Count"), Some(&Value::Int(0)));
        assert_eq!(decoded.value.get("Name"), Some(&Value::String("ok".to_string())));
    }

    #[test]
    fn test_qualified_response_fields_match_by_local_name() {
        let table = table_with(vec![XsdComplexType::named(
            "TempResponse",
            vec![XsdElementDecl::referencing(
                "Celsius",
                xsd("string"),
                Occurs::once(),
            )],
        )]);
        let body = body_of(concat!(
            r#"<S:Body xmlns:S="http://schemas.xmlsoap.org/soap/envelope/" xmlns:ns="urn:x">"#,
            "<ns:TempResponse><ns:Celsius>37.8</ns:Celsius></ns:TempResponse></S:Body>",
        ));

        let decoded = unmarshal(&body, "TempResponse", &table, DecodeMode::Strict).unwrap();
        assert_eq!(
            decoded.value.get("Celsius"),
            Some(&Value::String("37.8".to_string()))
        );
    }
}
