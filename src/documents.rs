//! XML document handling
//!
//! This module provides the namespace-aware element tree used for SOAP
//! envelopes and WSDL/XSD documents. Prefixes are resolved to namespace
//! URIs at parse time by inheriting declarations down the element stack,
//! and trees can be serialized back to XML text.

use crate::error::{Error, Result};
use crate::limits::Limits;
use crate::namespaces::{NamespaceContext, QName};
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::{Reader, Writer};
use std::collections::HashMap;
use std::io;

/// XML Element in the document tree
#[derive(Debug, Clone)]
pub struct Element {
    /// Element qualified name (namespace resolved)
    pub qname: QName,
    /// Prefix as written in the source, or to use when writing
    pub prefix: Option<String>,
    /// Element attributes
    pub attributes: HashMap<QName, String>,
    /// Text content (if any)
    pub text: Option<String>,
    /// Child elements
    pub children: Vec<Element>,
    /// Full in-scope namespace context for this element
    pub namespaces: NamespaceContext,
    /// Namespace declarations made on this element itself
    /// (prefix, URI); a None prefix is the default namespace
    pub declared_namespaces: Vec<(Option<String>, String)>,
}

impl Element {
    /// Create a new element
    pub fn new(qname: QName) -> Self {
        Self {
            qname,
            prefix: None,
            attributes: HashMap::new(),
            text: None,
            children: Vec::new(),
            namespaces: NamespaceContext::new(),
            declared_namespaces: Vec::new(),
        }
    }

    /// Set the writing prefix
    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = Some(prefix.into());
        self
    }

    /// Set text content
    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }

    /// Declare a namespace on this element (None = default namespace)
    pub fn with_declared_namespace(
        mut self,
        prefix: Option<&str>,
        namespace: impl Into<String>,
    ) -> Self {
        let namespace = namespace.into();
        match prefix {
            Some(p) => self.namespaces.add_prefix(p, namespace.clone()),
            None => self.namespaces.set_default_namespace(namespace.clone()),
        }
        self.declared_namespaces
            .push((prefix.map(|p| p.to_string()), namespace));
        self
    }

    /// Get the local name of the element
    pub fn local_name(&self) -> &str {
        &self.qname.local_name
    }

    /// Get the namespace of the element
    pub fn namespace(&self) -> Option<&str> {
        self.qname.namespace.as_deref()
    }

    /// Tag name as written on the wire
    pub fn tag_name(&self) -> String {
        match &self.prefix {
            Some(prefix) => format!("{}:{}", prefix, self.qname.local_name),
            None => self.qname.local_name.clone(),
        }
    }

    /// Get an attribute value by local name
    pub fn get_attribute(&self, name: &str) -> Option<&str> {
        for (qname, value) in &self.attributes {
            if qname.local_name == name {
                return Some(value);
            }
        }
        None
    }

    /// Get an attribute value by qualified name
    pub fn get_attribute_qname(&self, qname: &QName) -> Option<&str> {
        self.attributes.get(qname).map(|s| s.as_str())
    }

    /// Add a child element
    pub fn add_child(&mut self, child: Element) {
        self.children.push(child);
    }

    /// Set text content
    pub fn set_text(&mut self, text: String) {
        self.text = Some(text);
    }

    /// Text content, or an empty string when absent
    pub fn text_content(&self) -> &str {
        self.text.as_deref().unwrap_or("")
    }

    /// Find the first immediate child with the given local name
    pub fn find_child(&self, local_name: &str) -> Option<&Element> {
        self.children.iter().find(|e| e.local_name() == local_name)
    }

    /// Find immediate children by local name
    pub fn find_children(&self, local_name: &str) -> Vec<&Element> {
        self.children
            .iter()
            .filter(|e| e.local_name() == local_name)
            .collect()
    }

    /// Find the first strict descendant matching namespace and local name
    pub fn find_descendant(&self, namespace: &str, local_name: &str) -> Option<&Element> {
        for child in &self.children {
            if child.qname.matches(namespace, local_name) {
                return Some(child);
            }
            if let Some(found) = child.find_descendant(namespace, local_name) {
                return Some(found);
            }
        }
        None
    }

    /// Find the first strict descendant with the given local name,
    /// regardless of namespace
    pub fn find_descendant_named(&self, local_name: &str) -> Option<&Element> {
        for child in &self.children {
            if child.local_name() == local_name {
                return Some(child);
            }
            if let Some(found) = child.find_descendant_named(local_name) {
                return Some(found);
            }
        }
        None
    }
}

/// XML Document representation
#[derive(Debug)]
pub struct Document {
    /// Root element of the document
    pub root: Option<Element>,
}

impl Document {
    /// Create a new empty document
    pub fn new() -> Self {
        Self { root: None }
    }

    /// Create a document around a built root element
    pub fn with_root(root: Element) -> Self {
        Self { root: Some(root) }
    }

    /// Parse an XML document from a string
    pub fn from_string(xml: &str) -> Result<Self> {
        Self::parse(xml.as_bytes())
    }

    /// Parse an XML document from bytes with default limits
    pub fn parse(xml: &[u8]) -> Result<Self> {
        Self::parse_with_limits(xml, &Limits::default())
    }

    /// Parse an XML document from bytes
    pub fn parse_with_limits(xml: &[u8], limits: &Limits) -> Result<Self> {
        limits.check_document_size(xml.len())?;

        let mut reader = Reader::from_reader(xml);

        let mut doc = Document::new();
        let mut element_stack: Vec<Element> = Vec::new();
        let mut buf = Vec::new();

        loop {
            match reader.read_event_into(&mut buf) {
                Ok(Event::Start(e)) => {
                    limits.check_element_depth(element_stack.len() + 1)?;
                    let parent_ctx = element_stack.last().map(|el| &el.namespaces);
                    let element = Self::parse_element(&e, parent_ctx)?;
                    element_stack.push(element);
                }
                Ok(Event::End(_)) => {
                    if let Some(mut current) = element_stack.pop() {
                        // Whitespace between child elements is formatting,
                        // not content; leaf text is kept verbatim
                        if !current.children.is_empty()
                            && current.text.as_deref().is_some_and(|t| t.trim().is_empty())
                        {
                            current.text = None;
                        }
                        if let Some(parent) = element_stack.last_mut() {
                            parent.add_child(current);
                        } else {
                            // This is the root element
                            doc.root = Some(current);
                        }
                    }
                }
                Ok(Event::Empty(e)) => {
                    let parent_ctx = element_stack.last().map(|el| &el.namespaces);
                    let element = Self::parse_element(&e, parent_ctx)?;
                    if let Some(parent) = element_stack.last_mut() {
                        parent.add_child(element);
                    } else {
                        // Empty root element
                        doc.root = Some(element);
                    }
                }
                Ok(Event::Text(e)) => {
                    if let Some(current) = element_stack.last_mut() {
                        let text = e
                            .unescape()
                            .map_err(|e| Error::Xml(format!("Failed to unescape text: {}", e)))?;
                        match &mut current.text {
                            Some(existing) => existing.push_str(&text),
                            None => current.text = Some(text.to_string()),
                        }
                    }
                }
                Ok(Event::Eof) => break,
                Err(e) => {
                    return Err(Error::Xml(format!(
                        "Error parsing XML at position {}: {}",
                        reader.buffer_position(),
                        e
                    )))
                }
                _ => {} // Ignore other events (comments, processing instructions, etc.)
            }
            buf.clear();
        }

        Ok(doc)
    }

    /// Parse element from BytesStart event, resolving its namespace from
    /// the inherited context plus its own xmlns declarations
    fn parse_element(start: &BytesStart, parent_ctx: Option<&NamespaceContext>) -> Result<Element> {
        let name_bytes = start.name();
        let name = std::str::from_utf8(name_bytes.as_ref())
            .map_err(|e| Error::Xml(format!("Invalid element name: {}", e)))?
            .to_string();

        let (prefix, local) = match name.split_once(':') {
            Some((prefix, local)) => (Some(prefix.to_string()), local.to_string()),
            None => (None, name.clone()),
        };

        let mut namespaces = match parent_ctx {
            Some(ctx) => ctx.child_scope(),
            None => NamespaceContext::new(),
        };
        let mut declared_namespaces = Vec::new();
        let mut raw_attributes: Vec<(String, String)> = Vec::new();

        // First pass collects xmlns declarations so they apply to the
        // element's own name and attributes
        for attr_result in start.attributes() {
            let attr = attr_result
                .map_err(|e| Error::Xml(format!("Failed to parse attribute: {}", e)))?;

            let attr_name = std::str::from_utf8(attr.key.as_ref())
                .map_err(|e| Error::Xml(format!("Invalid attribute name: {}", e)))?
                .to_string();

            let attr_value = attr
                .unescape_value()
                .map_err(|e| Error::Xml(format!("Failed to unescape attribute value: {}", e)))?
                .to_string();

            if attr_name == "xmlns" {
                namespaces.set_default_namespace(&attr_value);
                declared_namespaces.push((None, attr_value));
            } else if let Some(decl_prefix) = attr_name.strip_prefix("xmlns:") {
                namespaces.add_prefix(decl_prefix, &attr_value);
                declared_namespaces.push((Some(decl_prefix.to_string()), attr_value));
            } else {
                raw_attributes.push((attr_name, attr_value));
            }
        }

        let namespace = match &prefix {
            Some(p) => Some(
                namespaces
                    .get_namespace(p)
                    .ok_or_else(|| Error::Namespace(format!("Unknown prefix: {}", p)))?
                    .to_string(),
            ),
            None => namespaces.get_default_namespace().map(|s| s.to_string()),
        };

        let mut element = Element::new(QName::new(namespace, local));
        element.prefix = prefix;
        element.namespaces = namespaces;
        element.declared_namespaces = declared_namespaces;

        for (attr_name, attr_value) in raw_attributes {
            // Unprefixed attributes carry no namespace
            let attr_qname = if let Some((attr_prefix, attr_local)) = attr_name.split_once(':') {
                let ns = element
                    .namespaces
                    .get_namespace(attr_prefix)
                    .ok_or_else(|| Error::Namespace(format!("Unknown prefix: {}", attr_prefix)))?;
                QName::namespaced(ns, attr_local)
            } else {
                QName::local(attr_name)
            };
            element.attributes.insert(attr_qname, attr_value);
        }

        Ok(element)
    }

    /// Get the root element
    pub fn root(&self) -> Option<&Element> {
        self.root.as_ref()
    }

    /// Get the root element mutably
    pub fn root_mut(&mut self) -> Option<&mut Element> {
        self.root.as_mut()
    }

    /// Serialize the document to XML text with an XML declaration
    pub fn to_xml_string(&self) -> Result<String> {
        self.write_string(false)
    }

    /// Serialize the document to indented XML text
    pub fn to_xml_string_pretty(&self) -> Result<String> {
        self.write_string(true)
    }

    fn write_string(&self, pretty: bool) -> Result<String> {
        let mut buf: Vec<u8> = Vec::new();

        if pretty {
            let mut writer = Writer::new_with_indent(&mut buf, b' ', 2);
            Self::write_declaration(&mut writer)?;
            if let Some(root) = &self.root {
                write_element(&mut writer, root)?;
            }
        } else {
            let mut writer = Writer::new(&mut buf);
            Self::write_declaration(&mut writer)?;
            if let Some(root) = &self.root {
                write_element(&mut writer, root)?;
            }
        }

        String::from_utf8(buf).map_err(|e| Error::Xml(format!("Invalid UTF-8 in output: {}", e)))
    }

    fn write_declaration<W: io::Write>(writer: &mut Writer<W>) -> Result<()> {
        writer
            .write_event(Event::Decl(BytesDecl::new("1.0", Some("utf-8"), None)))
            .map_err(|e| Error::Xml(format!("Failed to write XML declaration: {}", e)))
    }
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

/// Write one element and its subtree as events
fn write_element<W: io::Write>(writer: &mut Writer<W>, element: &Element) -> Result<()> {
    let tag = element.tag_name();
    let mut start = BytesStart::new(tag.as_str());

    for (prefix, uri) in &element.declared_namespaces {
        match prefix {
            Some(p) => start.push_attribute((format!("xmlns:{}", p).as_str(), uri.as_str())),
            None => start.push_attribute(("xmlns", uri.as_str())),
        }
    }

    for (qname, value) in &element.attributes {
        let prefix = qname
            .namespace
            .as_deref()
            .and_then(|ns| element.namespaces.prefix_for(ns));
        match prefix {
            Some(p) => start.push_attribute((
                format!("{}:{}", p, qname.local_name).as_str(),
                value.as_str(),
            )),
            None => start.push_attribute((qname.local_name.as_str(), value.as_str())),
        }
    }

    if element.text.is_none() && element.children.is_empty() {
        return writer
            .write_event(Event::Empty(start))
            .map_err(|e| Error::Xml(format!("Failed to write element: {}", e)));
    }

    writer
        .write_event(Event::Start(start))
        .map_err(|e| Error::Xml(format!("Failed to write element: {}", e)))?;

    if let Some(text) = &element.text {
        writer
            .write_event(Event::Text(BytesText::new(text)))
            .map_err(|e| Error::Xml(format!("Failed to write text: {}", e)))?;
    }

    for child in &element.children {
        write_element(writer, child)?;
    }

    writer
        .write_event(Event::End(BytesEnd::new(tag.as_str())))
        .map_err(|e| Error::Xml(format!("Failed to write element end: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_document_creation() {
        let doc = Document::new();
        assert!(doc.root.is_none());
    }

    #[test]
    fn test_parse_simple_xml() {
        let xml = r#"<root><child>text</child></root>"#;
        let doc = Document::from_string(xml).unwrap();

        assert!(doc.root.is_some());
        let root = doc.root.unwrap();
        assert_eq!(root.local_name(), "root");
        assert_eq!(root.children.len(), 1);
        assert_eq!(root.children[0].local_name(), "child");
        assert_eq!(root.children[0].text.as_deref(), Some("text"));
    }

    #[test]
    fn test_parse_with_attributes() {
        let xml = r#"<root attr1="value1" attr2="value2"><child/></root>"#;
        let doc = Document::from_string(xml).unwrap();

        let root = doc.root.unwrap();
        assert_eq!(root.get_attribute("attr1"), Some("value1"));
        assert_eq!(root.get_attribute("attr2"), Some("value2"));
    }

    #[test]
    fn test_parse_resolves_namespaces() {
        let xml = r#"<S:Envelope xmlns:S="http://schemas.xmlsoap.org/soap/envelope/"><S:Body/></S:Envelope>"#;
        let doc = Document::from_string(xml).unwrap();

        let root = doc.root.unwrap();
        assert_eq!(root.local_name(), "Envelope");
        assert_eq!(
            root.namespace(),
            Some("http://schemas.xmlsoap.org/soap/envelope/")
        );
        assert_eq!(root.prefix.as_deref(), Some("S"));

        // The prefix declared on the root resolves on children too
        let body = &root.children[0];
        assert!(body
            .qname
            .matches("http://schemas.xmlsoap.org/soap/envelope/", "Body"));
    }

    #[test]
    fn test_parse_default_namespace_inherited() {
        let xml = r#"<root xmlns="http://example.com"><child/></root>"#;
        let doc = Document::from_string(xml).unwrap();

        let root = doc.root.unwrap();
        assert_eq!(root.namespace(), Some("http://example.com"));
        assert_eq!(root.children[0].namespace(), Some("http://example.com"));
    }

    #[test]
    fn test_parse_unknown_prefix_fails() {
        let xml = r#"<missing:root/>"#;
        assert!(Document::from_string(xml).is_err());
    }

    #[test]
    fn test_find_children() {
        let xml = r#"<root><child1/><child2/><child1/></root>"#;
        let doc = Document::from_string(xml).unwrap();

        let root = doc.root.unwrap();
        let children = root.find_children("child1");
        assert_eq!(children.len(), 2);
        assert!(root.find_child("child2").is_some());
        assert!(root.find_child("child3").is_none());
    }

    #[test]
    fn test_find_descendant() {
        let xml = concat!(
            r#"<S:Envelope xmlns:S="http://schemas.xmlsoap.org/soap/envelope/">"#,
            r#"<S:Body><S:Fault><faultstring>bad</faultstring></S:Fault></S:Body>"#,
            r#"</S:Envelope>"#
        );
        let doc = Document::from_string(xml).unwrap();
        let root = doc.root.unwrap();

        let fault = root
            .find_descendant("http://schemas.xmlsoap.org/soap/envelope/", "Fault")
            .unwrap();
        assert_eq!(fault.local_name(), "Fault");
        assert_eq!(
            fault.find_descendant_named("faultstring").unwrap().text_content(),
            "bad"
        );
    }

    #[test]
    fn test_write_simple_tree() {
        let mut root = Element::new(QName::local("root"));
        let child = Element::new(QName::local("child")).with_text("hello");
        root.add_child(child);

        let xml = Document::with_root(root).to_xml_string().unwrap();
        assert!(xml.starts_with(r#"<?xml version="1.0" encoding="utf-8"?>"#));
        assert!(xml.contains("<root><child>hello</child></root>"));
    }

    #[test]
    fn test_write_prefix_and_namespace_declarations() {
        let root = Element::new(QName::namespaced("urn:ns", "Envelope"))
            .with_prefix("S")
            .with_declared_namespace(Some("S"), "urn:ns");

        let xml = Document::with_root(root).to_xml_string().unwrap();
        assert!(xml.contains(r#"<S:Envelope xmlns:S="urn:ns"/>"#));
    }

    #[test]
    fn test_write_escapes_text() {
        let root = Element::new(QName::local("root")).with_text("a < b & c");
        let xml = Document::with_root(root).to_xml_string().unwrap();
        assert!(xml.contains("a &lt; b &amp; c"));
    }

    #[test]
    fn test_write_parse_round_trip() {
        let mut root = Element::new(QName::local("outer"));
        root.add_child(Element::new(QName::local("a")).with_text("1"));
        root.add_child(Element::new(QName::local("a")).with_text("2"));
        root.add_child(Element::new(QName::local("b")));

        let xml = Document::with_root(root).to_xml_string().unwrap();
        let parsed = Document::from_string(&xml).unwrap();
        let parsed_root = parsed.root.unwrap();

        assert_eq!(parsed_root.local_name(), "outer");
        assert_eq!(parsed_root.find_children("a").len(), 2);
        assert_eq!(parsed_root.find_children("a")[1].text_content(), "2");
        assert!(parsed_root.find_child("b").unwrap().text.is_none());
    }

    #[test]
    fn test_leaf_whitespace_text_preserved() {
        let xml = "<root><pad>  spaced  </pad><blank> </blank></root>";
        let doc = Document::from_string(xml).unwrap();

        let root = doc.root.unwrap();
        assert_eq!(root.find_child("pad").unwrap().text_content(), "  spaced  ");
        assert_eq!(root.find_child("blank").unwrap().text_content(), " ");
        // Whitespace between children is formatting, not text content
        assert!(root.text.is_none());
    }

    #[test]
    fn test_indented_markup_has_no_text_on_branches() {
        let xml = "<root>\n  <child>value</child>\n</root>";
        let doc = Document::from_string(xml).unwrap();

        let root = doc.root.unwrap();
        assert!(root.text.is_none());
        assert_eq!(root.find_child("child").unwrap().text_content(), "value");
    }

    #[test]
    fn test_write_preserves_attribute_prefix() {
        let xml = r#"<root xmlns:x="urn:x" x:id="7" plain="8"/>"#;
        let doc = Document::from_string(xml).unwrap();
        let out = doc.to_xml_string().unwrap();

        assert!(out.contains(r#"x:id="7""#));
        assert!(out.contains(r#"plain="8""#));
    }

    #[test]
    fn test_depth_limit() {
        let mut xml = String::new();
        for _ in 0..200 {
            xml.push_str("<a>");
        }
        for _ in 0..200 {
            xml.push_str("</a>");
        }

        let result = Document::parse_with_limits(xml.as_bytes(), &Limits::strict());
        assert!(result.is_err());
    }
}
