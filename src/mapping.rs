//! Type mapping engine
//!
//! This module derives, for every complex type a service declares, a
//! canonical ordered field list: a reserved-word-safe identifier, the
//! wire tag name, an optional namespace prefix, and a resolved kind.
//! The [`TypeTable`] built here is the single source of truth consumed
//! identically by the envelope encoder and decoder.
//!
//! Building a table is a pure function of the schema model: it never
//! mutates the model, and building twice from the same service yields
//! identical output, including the synthesized names of anonymous types.

use crate::coercion;
use crate::error::{Error, Result};
use crate::names::safe_ident;
use crate::schema::{WsdlService, XsdComplexType, XsdElementDecl};
use crate::values::{TypedValue, Value};
use indexmap::IndexMap;
use serde_json::json;

/// Wire prefix assigned to fields of types derived from top-level
/// schema elements
pub const TNS_PREFIX: &str = "tns";

/// Primitive XSD kinds the mapping can represent
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Primitive {
    /// xs:string
    String,
    /// xs:boolean
    Boolean,
    /// xs:int (32-bit range)
    Int,
    /// xs:long
    Long,
    /// xs:float
    Float,
    /// xs:double
    Double,
    /// xs:dateTime
    DateTime,
    /// xs:base64Binary
    Base64Binary,
}

impl Primitive {
    /// Resolve an XSD built-in local name to a primitive kind
    ///
    /// Unknown names return None; the table build reports them as
    /// unsupported rather than coercing silently.
    pub fn from_xsd_name(local_name: &str) -> Option<Self> {
        match local_name {
            "string" => Some(Primitive::String),
            "boolean" => Some(Primitive::Boolean),
            "int" => Some(Primitive::Int),
            "long" => Some(Primitive::Long),
            "float" => Some(Primitive::Float),
            "double" => Some(Primitive::Double),
            "dateTime" => Some(Primitive::DateTime),
            "base64Binary" => Some(Primitive::Base64Binary),
            _ => None,
        }
    }

    /// The XSD local name of this kind
    pub fn xsd_name(&self) -> &'static str {
        match self {
            Primitive::String => "string",
            Primitive::Boolean => "boolean",
            Primitive::Int => "int",
            Primitive::Long => "long",
            Primitive::Float => "float",
            Primitive::Double => "double",
            Primitive::DateTime => "dateTime",
            Primitive::Base64Binary => "base64Binary",
        }
    }

    /// Default value for a field of this kind
    pub fn default_value(&self) -> Value {
        match self {
            Primitive::String => Value::String(String::new()),
            Primitive::Boolean => Value::Bool(false),
            Primitive::Int | Primitive::Long => Value::Int(0),
            Primitive::Float | Primitive::Double => Value::Float(0.0),
            Primitive::DateTime => Value::DateTime(coercion::epoch_datetime()),
            Primitive::Base64Binary => Value::Bytes(Vec::new()),
        }
    }

    /// Render a value of this kind as wire text
    ///
    /// The encoder and decoder both go through [`Primitive`], so a
    /// rendered value always parses back to itself.
    pub fn render(&self, value: &Value) -> Result<String> {
        match (self, value) {
            (Primitive::String, Value::String(s)) => Ok(s.clone()),
            (Primitive::Boolean, Value::Bool(b)) => Ok(coercion::render_boolean(*b).to_string()),
            (Primitive::Int, Value::Int(i)) | (Primitive::Long, Value::Int(i)) => {
                Ok(coercion::render_int(*i))
            }
            (Primitive::Float, Value::Float(f)) | (Primitive::Double, Value::Float(f)) => {
                Ok(coercion::render_float(*f))
            }
            (Primitive::DateTime, Value::DateTime(dt)) => Ok(coercion::render_datetime(dt)),
            (Primitive::Base64Binary, Value::Bytes(b)) => Ok(coercion::render_base64(b)),
            _ => Err(Error::Value(format!(
                "expected a {} value, got {}",
                self.xsd_name(),
                value.kind_name()
            ))),
        }
    }

    /// Parse wire text into a value of this kind
    ///
    /// Strings are taken verbatim, whitespace included. For the other
    /// kinds, text with no non-whitespace content decodes to the kind's
    /// default, matching the treatment of an absent element; non-empty
    /// unparseable text is an error.
    pub fn parse(&self, text: &str) -> Result<Value> {
        match self {
            Primitive::String => Ok(Value::String(text.to_string())),
            _ if text.trim().is_empty() => Ok(self.default_value()),
            Primitive::Boolean => Ok(Value::Bool(coercion::parse_boolean(text))),
            Primitive::Int => Ok(Value::Int(coercion::parse_int(text)?)),
            Primitive::Long => Ok(Value::Int(coercion::parse_long(text)?)),
            Primitive::Float | Primitive::Double => Ok(Value::Float(coercion::parse_float(text)?)),
            Primitive::DateTime => Ok(Value::DateTime(coercion::parse_datetime(text)?)),
            Primitive::Base64Binary => Ok(Value::Bytes(coercion::parse_base64(text)?)),
        }
    }
}

impl std::fmt::Display for Primitive {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.xsd_name())
    }
}

/// Resolved kind of a mapped field
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldKind {
    /// A primitive scalar
    Primitive(Primitive),
    /// A reference to another mapped complex type
    Complex(String),
    /// Repeated primitive scalars
    ArrayOfPrimitive(Primitive),
    /// Repeated instances of another mapped complex type
    ArrayOfComplex(String),
}

impl FieldKind {
    /// Whether this kind admits repetition
    pub fn is_array(&self) -> bool {
        matches!(
            self,
            FieldKind::ArrayOfPrimitive(_) | FieldKind::ArrayOfComplex(_)
        )
    }

    /// The referenced complex type name, for complex and array-of-complex
    pub fn complex_target(&self) -> Option<&str> {
        match self {
            FieldKind::Complex(name) | FieldKind::ArrayOfComplex(name) => Some(name),
            _ => None,
        }
    }

    /// Wrap a scalar kind into its array counterpart
    fn into_array(self) -> Self {
        match self {
            FieldKind::Primitive(p) => FieldKind::ArrayOfPrimitive(p),
            FieldKind::Complex(name) => FieldKind::ArrayOfComplex(name),
            other => other,
        }
    }

    /// Human-readable label for inspection output
    pub fn label(&self) -> String {
        match self {
            FieldKind::Primitive(p) => p.xsd_name().to_string(),
            FieldKind::Complex(name) => name.clone(),
            FieldKind::ArrayOfPrimitive(p) => format!("{}[]", p.xsd_name()),
            FieldKind::ArrayOfComplex(name) => format!("{}[]", name),
        }
    }
}

/// One field of a mapped complex type
///
/// The identifier is what callers address the field by on a
/// [`TypedValue`]; the wire name is the tag emitted and matched on the
/// wire. They differ only when the schema name collides with a reserved
/// identifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldDescriptor {
    /// Reserved-word-safe field identifier
    pub ident: String,
    /// Wire tag name (always the original schema name)
    pub wire_name: String,
    /// Namespace prefix to qualify the tag with, when the field's type
    /// derives from a top-level element
    pub prefix: Option<String>,
    /// Resolved kind
    pub kind: FieldKind,
}

impl FieldDescriptor {
    /// JSON rendering for inspection output
    pub fn to_json(&self) -> serde_json::Value {
        json!({
            "field": self.ident,
            "wire": self.wire_name,
            "prefix": self.prefix,
            "type": self.kind.label(),
        })
    }
}

/// A mapped complex type: name plus canonical ordered field list
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MappedType {
    /// Type name; synthesized as `<enclosing>_<field>` for anonymous
    /// inline types
    pub name: String,
    /// Fields in canonical (schema sequence) order
    pub fields: Vec<FieldDescriptor>,
}

impl MappedType {
    /// Look up a field by identifier
    pub fn field(&self, ident: &str) -> Option<&FieldDescriptor> {
        self.fields.iter().find(|f| f.ident == ident)
    }

    /// Look up a field by wire tag name
    pub fn field_by_wire_name(&self, wire_name: &str) -> Option<&FieldDescriptor> {
        self.fields.iter().find(|f| f.wire_name == wire_name)
    }

    /// JSON rendering for inspection output
    pub fn to_json(&self) -> serde_json::Value {
        json!({
            "name": self.name,
            "fields": self.fields.iter().map(FieldDescriptor::to_json).collect::<Vec<_>>(),
        })
    }
}

/// The derived mapping for one service
///
/// Immutable once built; safe to share across concurrent invocations.
/// Types whose mapping failed are absent from the table, and the reason
/// is retrievable per type name from [`errors`](TypeTable::errors).
#[derive(Debug, Clone, Default)]
pub struct TypeTable {
    /// Mapped types keyed by name, in derivation order
    types: IndexMap<String, MappedType>,
    /// Operation wrapper element name -> mapped type name
    wrappers: IndexMap<String, String>,
    /// Failed type name -> reason
    errors: IndexMap<String, String>,
}

impl TypeTable {
    /// Derive the type table for a parsed service
    ///
    /// Named complex types are mapped first, then types derived from
    /// top-level elements, each in declaration order; inline anonymous
    /// types are mapped before the type that encloses them. A type
    /// that fails to map is recorded in `errors` and removed together
    /// with every type transitively depending on it; unrelated types
    /// are unaffected.
    pub fn build(service: &WsdlService) -> Self {
        let mut table = TypeTable::default();

        for complex in &service.types {
            let Some(name) = complex.name.clone() else {
                continue;
            };
            table.map_complex(&name, complex, None);
        }

        for element in &service.elements {
            if let Some(inline) = &element.inline {
                table.map_complex(&element.name, inline, Some(TNS_PREFIX));
                table
                    .wrappers
                    .insert(element.name.clone(), element.name.clone());
            } else if let Some(type_ref) = &element.type_ref {
                // Element declared with type="tns:..." wraps an already
                // mapped named type
                table
                    .wrappers
                    .insert(element.name.clone(), type_ref.local_name.clone());
            }
        }

        table.prune();
        table
    }

    /// Map one complex type, recursing into inline anonymous types first
    ///
    /// Returns the name the type was registered under.
    fn map_complex(
        &mut self,
        name: &str,
        complex: &XsdComplexType,
        prefix: Option<&str>,
    ) -> String {
        let name = self.unique_name(name);
        let mut fields = Vec::with_capacity(complex.sequence.len());
        let mut failure: Option<String> = None;

        for decl in &complex.sequence {
            match self.map_field(&name, decl, prefix) {
                Ok(field) => fields.push(field),
                Err(e) => {
                    failure = Some(e.to_string());
                    break;
                }
            }
        }

        match failure {
            Some(reason) => {
                self.errors.insert(name.clone(), reason);
            }
            None => {
                self.types.insert(name.clone(), MappedType { name: name.clone(), fields });
            }
        }
        name
    }

    /// Map one element declaration to a field descriptor
    fn map_field(
        &mut self,
        enclosing: &str,
        decl: &XsdElementDecl,
        prefix: Option<&str>,
    ) -> Result<FieldDescriptor> {
        let kind = if let Some(inline) = &decl.inline {
            let synthesized = format!("{}_{}", enclosing, decl.name);
            let registered = self.map_complex(&synthesized, inline, prefix);
            if self.errors.contains_key(&registered) {
                return Err(Error::UnsupportedSchemaType(format!(
                    "anonymous type of element '{}' in '{}' failed to map",
                    decl.name, enclosing
                )));
            }
            FieldKind::Complex(registered)
        } else if let Some(type_ref) = &decl.type_ref {
            if type_ref.namespace.as_deref() == Some(crate::XSD_NAMESPACE) {
                match Primitive::from_xsd_name(&type_ref.local_name) {
                    Some(primitive) => FieldKind::Primitive(primitive),
                    None => {
                        return Err(Error::UnsupportedSchemaType(format!(
                            "xs:{} (element '{}' in '{}')",
                            type_ref.local_name, decl.name, enclosing
                        )))
                    }
                }
            } else {
                FieldKind::Complex(type_ref.local_name.clone())
            }
        } else {
            return Err(Error::UnsupportedSchemaType(format!(
                "element '{}' in '{}' declares no type",
                decl.name, enclosing
            )));
        };

        let kind = if decl.occurs.is_multiple() {
            kind.into_array()
        } else {
            kind
        };

        Ok(FieldDescriptor {
            ident: safe_ident(&decl.name),
            wire_name: decl.name.clone(),
            prefix: prefix.map(|p| p.to_string()),
            kind,
        })
    }

    /// Pick a free name for a type, disambiguating synthesized names
    /// that happen to collide with declared ones
    fn unique_name(&self, name: &str) -> String {
        if !self.types.contains_key(name) && !self.errors.contains_key(name) {
            return name.to_string();
        }
        let mut candidate = format!("{}_", name);
        while self.types.contains_key(&candidate) || self.errors.contains_key(&candidate) {
            candidate.push('_');
        }
        candidate
    }

    /// Remove unusable types until a fixpoint is reached
    ///
    /// A type is unusable when a field references a type that failed or
    /// is absent, or when its non-array complex references form a cycle
    /// (a defaulted instance of such a type could never be finite).
    fn prune(&mut self) {
        loop {
            let mut changed = self.prune_missing_references();
            changed |= self.prune_cycles();
            if !changed {
                break;
            }
        }
    }

    fn prune_missing_references(&mut self) -> bool {
        let mut changed = false;
        loop {
            let mut doomed: Option<(String, String)> = None;
            for (name, mapped) in &self.types {
                for field in &mapped.fields {
                    if let Some(target) = field.kind.complex_target() {
                        if !self.types.contains_key(target) {
                            doomed = Some((
                                name.clone(),
                                format!(
                                    "field '{}' references unavailable type '{}'",
                                    field.ident, target
                                ),
                            ));
                            break;
                        }
                    }
                }
                if doomed.is_some() {
                    break;
                }
            }

            match doomed {
                Some((name, reason)) => {
                    self.types.shift_remove(&name);
                    self.errors.insert(name, reason);
                    changed = true;
                }
                None => return changed,
            }
        }
    }

    fn prune_cycles(&mut self) -> bool {
        // Depth-first walk over non-array complex edges only; an array
        // field defaults to an empty sequence and cannot recurse.
        #[derive(Clone, Copy, PartialEq)]
        enum Mark {
            InProgress,
            Done,
        }

        fn visit(
            name: &str,
            types: &IndexMap<String, MappedType>,
            marks: &mut IndexMap<String, Mark>,
            cyclic: &mut Vec<String>,
        ) {
            match marks.get(name) {
                Some(Mark::Done) => return,
                Some(Mark::InProgress) => {
                    cyclic.push(name.to_string());
                    return;
                }
                None => {}
            }
            marks.insert(name.to_string(), Mark::InProgress);
            if let Some(mapped) = types.get(name) {
                for field in &mapped.fields {
                    if let FieldKind::Complex(target) = &field.kind {
                        visit(target, types, marks, cyclic);
                    }
                }
            }
            marks.insert(name.to_string(), Mark::Done);
        }

        let mut marks = IndexMap::new();
        let mut cyclic = Vec::new();
        for name in self.types.keys() {
            visit(name, &self.types, &mut marks, &mut cyclic);
        }

        let mut changed = false;
        for name in cyclic {
            if self.types.shift_remove(&name).is_some() {
                self.errors.insert(
                    name,
                    "recursive reference through a non-array field".to_string(),
                );
                changed = true;
            }
        }
        changed
    }

    /// Look up a mapped type by name
    pub fn get(&self, name: &str) -> Option<&MappedType> {
        self.types.get(name)
    }

    /// Look up a mapped type by name, or fail
    pub fn require(&self, name: &str) -> Result<&MappedType> {
        self.types.get(name).ok_or_else(|| {
            let reason = match self.errors.get(name) {
                Some(reason) => format!("type '{}' failed to map: {}", name, reason),
                None => format!("type '{}' is not mapped", name),
            };
            Error::UnsupportedSchemaType(reason)
        })
    }

    /// Resolve an operation wrapper element name to its mapped type
    pub fn wrapper_type(&self, element_name: &str) -> Result<&MappedType> {
        match self.wrappers.get(element_name) {
            Some(type_name) => self.require(type_name),
            None => self.require(element_name),
        }
    }

    /// Create a fully-defaulted instance of a mapped type
    ///
    /// Every field is present: primitives get their default, arrays are
    /// empty, nested complex fields hold recursively-defaulted
    /// instances. Serialization of the result is always total.
    pub fn default_instance(&self, name: &str) -> Result<TypedValue> {
        let mapped = self.require(name)?;
        let mut instance = TypedValue::new(&mapped.name);
        for field in &mapped.fields {
            let value = match &field.kind {
                FieldKind::Primitive(p) => p.default_value(),
                FieldKind::Complex(target) => Value::Complex(self.default_instance(target)?),
                FieldKind::ArrayOfPrimitive(_) | FieldKind::ArrayOfComplex(_) => {
                    Value::Array(Vec::new())
                }
            };
            instance.set(field.ident.clone(), value);
        }
        Ok(instance)
    }

    /// Iterate over mapped types in derivation order
    pub fn iter(&self) -> impl Iterator<Item = (&String, &MappedType)> {
        self.types.iter()
    }

    /// Failed type names with the reason each failed
    pub fn errors(&self) -> &IndexMap<String, String> {
        &self.errors
    }

    /// Number of successfully mapped types
    pub fn len(&self) -> usize {
        self.types.len()
    }

    /// Whether no types were mapped
    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }

    /// Total field count across all mapped types
    pub fn field_count(&self) -> usize {
        self.types.values().map(|t| t.fields.len()).sum()
    }

    /// JSON rendering for inspection output
    pub fn to_json(&self) -> serde_json::Value {
        json!({
            "types": self.types.values().map(MappedType::to_json).collect::<Vec<_>>(),
            "errors": self.errors,
        })
    }
}
