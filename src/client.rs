//! Service invoker
//!
//! One [`invoke`](SoapClient::invoke) is one synchronous request/response
//! cycle: marshal the typed request, POST it as `text/xml`, detect a
//! fault or decode the typed result. The client holds no per-call state,
//! so a shared client can serve concurrent invocations.
//!
//! Transport-level failures surface as [`Error::Transport`]; responses
//! that are neither a decodable result nor a parseable fault surface as
//! [`Error::UnexpectedResponse`]. Nothing is retried.

use crate::catalog;
use crate::documents::Document;
use crate::error::{Error, Result};
use crate::limits::Limits;
use crate::mapping::TypeTable;
use crate::schema::{WsdlOperation, WsdlService};
use crate::soap::{self, DecodeMode};
use crate::values::TypedValue;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};
use url::Url;

/// Client configuration
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Endpoint override; the service's soap:address is used when unset
    pub endpoint: Option<String>,
    /// Global timeout for one request/response cycle
    pub timeout: Duration,
    /// Limits applied to the response body and its XML tree
    pub limits: Limits,
    /// Malformed-field policy for response decoding
    pub decode_mode: DecodeMode,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            endpoint: None,
            timeout: Duration::from_secs(30),
            limits: Limits::default(),
            decode_mode: DecodeMode::Strict,
        }
    }
}

impl ClientConfig {
    /// Override the endpoint address
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = Some(endpoint.into());
        self
    }

    /// Set the request timeout
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set the response limits
    pub fn with_limits(mut self, limits: Limits) -> Self {
        self.limits = limits;
        self
    }

    /// Set the malformed-field policy
    pub fn with_decode_mode(mut self, mode: DecodeMode) -> Self {
        self.decode_mode = mode;
        self
    }
}

/// An outgoing request as seen by the hook chain
#[derive(Debug, Clone)]
pub struct SoapRequest {
    /// Resolved endpoint URL
    pub url: String,
    /// Headers in send order; later duplicates win
    pub headers: Vec<(String, String)>,
    /// Serialized envelope
    pub body: String,
}

impl SoapRequest {
    /// Append or replace a header
    pub fn set_header(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        if let Some(existing) = self
            .headers
            .iter_mut()
            .find(|(n, _)| n.eq_ignore_ascii_case(&name))
        {
            existing.1 = value.into();
        } else {
            self.headers.push((name, value.into()));
        }
    }
}

/// A hook observing or modifying each outgoing request
///
/// Hooks run in registration order, after the client has set its own
/// headers; typical uses are auth headers and request logging.
pub trait RequestHook: Send + Sync {
    /// Called with the fully built request before it is sent
    fn before_send(&self, request: &mut SoapRequest);
}

impl<F> RequestHook for F
where
    F: Fn(&mut SoapRequest) + Send + Sync,
{
    fn before_send(&self, request: &mut SoapRequest) {
        self(request)
    }
}

/// A typed client for one parsed service
pub struct SoapClient {
    service: WsdlService,
    table: Arc<TypeTable>,
    config: ClientConfig,
    hooks: Vec<Box<dyn RequestHook>>,
    agent: ureq::Agent,
}

impl SoapClient {
    /// Create a client with default configuration
    pub fn new(service: WsdlService) -> Self {
        Self::with_config(service, ClientConfig::default())
    }

    /// Create a client with explicit configuration
    pub fn with_config(service: WsdlService, config: ClientConfig) -> Self {
        let table = catalog::global().get_or_build(&service);

        // 4xx/5xx must not become transport errors: a SOAP fault on
        // HTTP 500 still carries a body we have to read
        let agent_config = ureq::Agent::config_builder()
            .http_status_as_error(false)
            .timeout_global(Some(config.timeout))
            .build();

        Self {
            service,
            table,
            config,
            hooks: Vec::new(),
            agent: agent_config.into(),
        }
    }

    /// Register a request hook; hooks run in registration order
    pub fn add_hook(&mut self, hook: impl RequestHook + 'static) {
        self.hooks.push(Box::new(hook));
    }

    /// The parsed service this client talks to
    pub fn service(&self) -> &WsdlService {
        &self.service
    }

    /// The derived type mapping
    pub fn mapping(&self) -> &TypeTable {
        &self.table
    }

    /// A fully-defaulted request value for an operation
    pub fn request(&self, operation: &str) -> Result<TypedValue> {
        let op = self.operation(operation)?;
        let mapped = self.table.wrapper_type(&op.input_element)?;
        self.table.default_instance(&mapped.name)
    }

    /// The envelope an invocation of `operation` would send
    pub fn build_envelope(&self, operation: &str, request: &TypedValue) -> Result<Document> {
        let op = self.operation(operation)?;
        soap::marshal(
            request,
            &op.input_element,
            &self.service.target_namespace,
            &self.table,
        )
    }

    /// Invoke an operation: marshal, POST, detect fault or decode result
    ///
    /// A one-way operation (no output message) returns an empty value
    /// on any 2xx status. In lax decode mode, tolerated malformed fields
    /// are logged and the defaulted value is returned.
    pub fn invoke(&self, operation: &str, request: TypedValue) -> Result<TypedValue> {
        let op = self.operation(operation)?.clone();

        let envelope = soap::marshal(
            &request,
            &op.input_element,
            &self.service.target_namespace,
            &self.table,
        )?;
        let body = envelope.to_xml_string()?;

        let mut soap_request = SoapRequest {
            url: self.endpoint()?,
            headers: vec![(
                "Content-Type".to_string(),
                r#"text/xml; charset="utf-8""#.to_string(),
            )],
            body,
        };
        if let Some(action) = &op.soap_action {
            soap_request.set_header("SOAPAction", format!("\"{}\"", action));
        }
        for hook in &self.hooks {
            hook.before_send(&mut soap_request);
        }

        debug!(
            operation = %op.name,
            url = %soap_request.url,
            bytes = soap_request.body.len(),
            "sending SOAP request"
        );

        let (status, raw) = self.send(&soap_request)?;
        self.config.limits.check_response_size(raw.len())?;

        self.decode_response(&op, status, &raw)
    }

    fn send(&self, request: &SoapRequest) -> Result<(u16, String)> {
        let mut builder = self.agent.post(&request.url);
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }

        let mut response = builder
            .send(request.body.as_str())
            .map_err(|e| Error::Transport(e.to_string()))?;

        let status = response.status().as_u16();
        let raw = response
            .body_mut()
            .with_config()
            .limit(self.config.limits.max_response_size as u64)
            .read_to_string()
            .map_err(|e| Error::Transport(format!("failed to read response body: {}", e)))?;

        Ok((status, raw))
    }

    fn decode_response(
        &self,
        op: &WsdlOperation,
        status: u16,
        raw: &str,
    ) -> Result<TypedValue> {
        let success = (200..300).contains(&status);

        let doc = match Document::parse_with_limits(raw.as_bytes(), &self.config.limits) {
            Ok(doc) => doc,
            Err(e) => {
                return Err(Error::UnexpectedResponse {
                    status,
                    detail: format!("response body is not XML: {}", e),
                })
            }
        };
        let root = doc.root().ok_or(Error::UnexpectedResponse {
            status,
            detail: "response body is empty".to_string(),
        })?;

        let body = if root.qname.matches(crate::SOAP_ENVELOPE_NAMESPACE, "Body") {
            root
        } else {
            root.find_descendant(crate::SOAP_ENVELOPE_NAMESPACE, "Body")
                .ok_or(Error::UnexpectedResponse {
                    status,
                    detail: "response has no SOAP Body".to_string(),
                })?
        };

        // Fault precedence: a parseable fault wins over both the status
        // code and any result-shaped sibling
        if let Some(fault) = soap::find_fault(body) {
            return Err(fault.into());
        }
        if !success {
            return Err(Error::UnexpectedResponse {
                status,
                detail: "non-success status without a SOAP fault".to_string(),
            });
        }

        let Some(output_element) = &op.output_element else {
            return Ok(TypedValue::new(format!("{}Response", op.name)));
        };

        let decoded = soap::unmarshal(body, output_element, &self.table, self.config.decode_mode)?;
        for malformed in &decoded.errors {
            warn!(field = %malformed.field, text = %malformed.text, "tolerated malformed field");
        }
        Ok(decoded.value)
    }

    fn operation(&self, name: &str) -> Result<&WsdlOperation> {
        self.service.operation(name).ok_or_else(|| {
            Error::Other(format!(
                "service '{}' has no operation '{}'",
                self.service.name, name
            ))
        })
    }

    fn endpoint(&self) -> Result<String> {
        let address = self
            .config
            .endpoint
            .as_deref()
            .or(self.service.endpoint.as_deref())
            .ok_or_else(|| {
                Error::Other(format!(
                    "service '{}' declares no endpoint address",
                    self.service.name
                ))
            })?;
        let url = Url::parse(address)?;
        Ok(url.to_string())
    }
}
