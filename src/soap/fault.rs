//! SOAP fault extraction
//!
//! A fault is detected by searching the body subtree for a `Fault`
//! element in the SOAP envelope namespace and taking its `faultstring`
//! descendant's text. Detection always precedes result decoding.

use crate::documents::Element;
use crate::error::Fault;

/// Extract a SOAP fault from a body subtree, if one is present
///
/// `body` may be the `Body` element itself or the whole envelope; the
/// first envelope-namespace `Fault` descendant wins. A `Fault` element
/// without a `faultstring` child still counts as a fault, with an
/// empty message.
pub fn find_fault(body: &Element) -> Option<Fault> {
    let fault_el = if body.qname.matches(crate::SOAP_ENVELOPE_NAMESPACE, "Fault") {
        body
    } else {
        body.find_descendant(crate::SOAP_ENVELOPE_NAMESPACE, "Fault")?
    };

    let fault_string = fault_el
        .find_descendant_named("faultstring")
        .map(|el| el.text_content().to_string())
        .unwrap_or_default();

    let mut fault = Fault::new(fault_string);
    if let Some(code) = fault_el.find_descendant_named("faultcode") {
        fault = fault.with_code(code.text_content());
    }
    if let Some(detail) = fault_el.find_descendant_named("detail") {
        let text = detail.text_content();
        if !text.is_empty() {
            fault = fault.with_detail(text);
        }
    }
    Some(fault)
}
