//! Request fingerprints.
//!
//! A fingerprint is the set of observable attributes of one inbound request
//! to the honeypot endpoint. Every field except the source address defaults
//! to the empty string so that rule predicates stay total.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Observable attributes of one honeypot request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestFingerprint {
    /// Textual IPv4 or IPv6 source address. Always present.
    pub source_address: String,

    /// Raw User-Agent header, empty when the client sent none.
    #[serde(default)]
    pub user_agent: String,

    /// HTTP method (GET, POST, CONNECT, ...)
    #[serde(default)]
    pub http_method: String,

    /// Raw request body text
    #[serde(default)]
    pub body: String,

    /// Raw query parameters text
    #[serde(default)]
    pub query_string: String,
}

impl RequestFingerprint {
    /// Create a fingerprint for the given source address with all other
    /// fields empty.
    pub fn new(source_address: impl Into<String>) -> Self {
        Self {
            source_address: source_address.into(),
            user_agent: String::new(),
            http_method: String::new(),
            body: String::new(),
            query_string: String::new(),
        }
    }

    /// Set the User-Agent.
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    /// Set the HTTP method.
    pub fn with_method(mut self, method: impl Into<String>) -> Self {
        self.http_method = method.into();
        self
    }

    /// Set the request body.
    pub fn with_body(mut self, body: impl Into<String>) -> Self {
        self.body = body.into();
        self
    }

    /// Set the query string.
    pub fn with_query_string(mut self, query_string: impl Into<String>) -> Self {
        self.query_string = query_string.into();
        self
    }

    /// Extract a fingerprint from a honeypot gateway event.
    pub fn from_event(event: &HoneypotEvent) -> Self {
        Self {
            source_address: event.request_context.identity.source_ip.clone(),
            user_agent: event.header("User-Agent").unwrap_or_default(),
            http_method: event.http_method.clone(),
            body: stringify(event.body.as_ref()),
            query_string: stringify(event.query_string_parameters.as_ref()),
        }
    }
}

/// The gateway event shape delivered to the honeypot endpoint. Only the
/// fields the classifier consumes are modeled; everything else in the event
/// is ignored on deserialization.
#[derive(Debug, Clone, Deserialize)]
pub struct HoneypotEvent {
    #[serde(default, rename = "httpMethod")]
    pub http_method: String,

    /// Raw body; a JSON string when present, anything else is stringified.
    #[serde(default)]
    pub body: Option<Value>,

    /// Query parameters; usually a JSON object, stringified verbatim.
    #[serde(default, rename = "queryStringParameters")]
    pub query_string_parameters: Option<Value>,

    #[serde(default)]
    pub headers: HashMap<String, String>,

    #[serde(rename = "requestContext")]
    pub request_context: RequestContext,
}

impl HoneypotEvent {
    /// Case-insensitive header lookup.
    fn header(&self, name: &str) -> Option<String> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.clone())
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct RequestContext {
    pub identity: RequestIdentity,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RequestIdentity {
    #[serde(rename = "sourceIp")]
    pub source_ip: String,
}

/// Total string rendering of an optional JSON fragment: strings pass
/// through unquoted, absent and null become empty, any other value keeps
/// its JSON text (a `{}` parameter map stays inspectable by the content
/// rules).
fn stringify(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
    }
}
