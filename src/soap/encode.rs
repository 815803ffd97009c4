//! Envelope marshaling
//!
//! Serializes a [`TypedValue`] into a SOAP envelope, depth-first in the
//! type table's canonical field order. Pure: no I/O, no shared state.

use super::{ENVELOPE_PREFIX, TNS_PREFIX};
use crate::documents::{Document, Element};
use crate::error::{Error, Result};
use crate::mapping::{FieldDescriptor, FieldKind, MappedType, Primitive, TypeTable};
use crate::namespaces::QName;
use crate::values::{TypedValue, Value};

/// Build the SOAP envelope for one request
///
/// The operation element becomes the body's only child, qualified by
/// the target namespace; its children are the value's fields in
/// canonical order. Fields absent from the value are emitted with their
/// declared defaults, so serialization is total for any value of a
/// mapped type. Array-of-array shapes fail with
/// [`UnsupportedShape`](Error::UnsupportedShape).
pub fn marshal(
    value: &TypedValue,
    operation_element: &str,
    target_namespace: &str,
    table: &TypeTable,
) -> Result<Document> {
    let mapped = table.wrapper_type(operation_element)?;

    let mut operation = Element::new(QName::namespaced(target_namespace, operation_element))
        .with_prefix(TNS_PREFIX);
    append_fields(&mut operation, value, mapped, table, target_namespace)?;

    let mut body = Element::new(QName::namespaced(crate::SOAP_ENVELOPE_NAMESPACE, "Body"))
        .with_prefix(ENVELOPE_PREFIX);
    body.add_child(operation);

    let header = Element::new(QName::namespaced(crate::SOAP_ENVELOPE_NAMESPACE, "Header"))
        .with_prefix(ENVELOPE_PREFIX);

    let mut envelope = Element::new(QName::namespaced(crate::SOAP_ENVELOPE_NAMESPACE, "Envelope"))
        .with_prefix(ENVELOPE_PREFIX)
        .with_declared_namespace(Some(ENVELOPE_PREFIX), crate::SOAP_ENVELOPE_NAMESPACE)
        .with_declared_namespace(Some(TNS_PREFIX), target_namespace);
    envelope.add_child(header);
    envelope.add_child(body);

    Ok(Document::with_root(envelope))
}

/// Append one element per field of `mapped`, in canonical order
fn append_fields(
    parent: &mut Element,
    value: &TypedValue,
    mapped: &MappedType,
    table: &TypeTable,
    target_namespace: &str,
) -> Result<()> {
    for field in &mapped.fields {
        append_field(parent, field, value.get(&field.ident), mapped, table, target_namespace)?;
    }
    Ok(())
}

fn append_field(
    parent: &mut Element,
    field: &FieldDescriptor,
    value: Option<&Value>,
    mapped: &MappedType,
    table: &TypeTable,
    target_namespace: &str,
) -> Result<()> {
    match &field.kind {
        FieldKind::Primitive(primitive) => {
            let element = match value {
                Some(v) => primitive_element(field, primitive, v, target_namespace)?,
                None => {
                    primitive_element(field, primitive, &primitive.default_value(), target_namespace)?
                }
            };
            parent.add_child(element);
        }
        FieldKind::Complex(target) => {
            let nested = table.require(target)?;
            let mut element = field_element(field, target_namespace);
            match value {
                Some(Value::Complex(inner)) => {
                    append_fields(&mut element, inner, nested, table, target_namespace)?
                }
                Some(other) => {
                    return Err(Error::Value(format!(
                        "field '{}.{}' expects a {} instance, got {}",
                        mapped.name,
                        field.ident,
                        target,
                        other.kind_name()
                    )))
                }
                None => {
                    let defaulted = table.default_instance(target)?;
                    append_fields(&mut element, &defaulted, nested, table, target_namespace)?;
                }
            }
            parent.add_child(element);
        }
        FieldKind::ArrayOfPrimitive(primitive) => {
            for item in array_items(field, value, mapped)? {
                if item.is_array() {
                    return Err(nested_array(mapped, field));
                }
                parent.add_child(primitive_element(field, primitive, item, target_namespace)?);
            }
        }
        FieldKind::ArrayOfComplex(target) => {
            let nested = table.require(target)?;
            for item in array_items(field, value, mapped)? {
                let mut element = field_element(field, target_namespace);
                match item {
                    Value::Complex(inner) => {
                        append_fields(&mut element, inner, nested, table, target_namespace)?
                    }
                    Value::Array(_) => return Err(nested_array(mapped, field)),
                    other => {
                        return Err(Error::Value(format!(
                            "field '{}.{}' expects {} instances, got {}",
                            mapped.name,
                            field.ident,
                            target,
                            other.kind_name()
                        )))
                    }
                }
                parent.add_child(element);
            }
        }
    }
    Ok(())
}

/// The items of an array field; an absent field is an empty array
fn array_items<'a>(
    field: &FieldDescriptor,
    value: Option<&'a Value>,
    mapped: &MappedType,
) -> Result<&'a [Value]> {
    match value {
        None => Ok(&[]),
        Some(Value::Array(items)) => Ok(items),
        Some(other) => Err(Error::Value(format!(
            "field '{}.{}' expects an array, got {}",
            mapped.name,
            field.ident,
            other.kind_name()
        ))),
    }
}

fn primitive_element(
    field: &FieldDescriptor,
    primitive: &Primitive,
    value: &Value,
    target_namespace: &str,
) -> Result<Element> {
    let text = primitive.render(value)?;
    let mut element = field_element(field, target_namespace);
    if !text.is_empty() {
        element.set_text(text);
    }
    Ok(element)
}

/// Element for a field's wire tag, namespace-qualified only when the
/// field declares a prefix
fn field_element(field: &FieldDescriptor, target_namespace: &str) -> Element {
    match &field.prefix {
        Some(prefix) => Element::new(QName::namespaced(target_namespace, &field.wire_name))
            .with_prefix(prefix.clone()),
        None => Element::new(QName::local(&field.wire_name)),
    }
}

fn nested_array(mapped: &MappedType, field: &FieldDescriptor) -> Error {
    Error::UnsupportedShape(format!(
        "array of arrays in field '{}.{}'",
        mapped.name, field.ident
    ))
}
