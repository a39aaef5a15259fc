use crate::swagger::CastValue;
use http::Method;
use serde_json::Value;
use std::collections::HashMap;
use tracing::debug;

/// Request container a parameter is read from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Scope {
    Query,
    Header,
    Path,
}

impl Scope {
    /// Map an OpenAPI `in` value to a scope. Anything else has no scope.
    pub fn from_location(location: &str) -> Option<Self> {
        match location {
            "query" => Some(Scope::Query),
            "header" => Some(Scope::Header),
            "path" => Some(Scope::Path),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Scope::Query => "query",
            Scope::Header => "header",
            Scope::Path => "path",
        }
    }
}

/// Per-request scratch written by the parameter caster.
///
/// One map per scope, created the first time a parameter of that scope is
/// examined.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SwaggerParams {
    scopes: HashMap<Scope, HashMap<String, CastValue>>,
}

impl SwaggerParams {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn scope(&self, scope: Scope) -> Option<&HashMap<String, CastValue>> {
        self.scopes.get(&scope)
    }

    pub fn scope_mut(&mut self, scope: Scope) -> &mut HashMap<String, CastValue> {
        self.scopes.entry(scope).or_default()
    }

    pub fn get(&self, scope: Scope, name: &str) -> Option<&CastValue> {
        self.scopes.get(&scope).and_then(|m| m.get(name))
    }

    pub fn query(&self) -> Option<&HashMap<String, CastValue>> {
        self.scope(Scope::Query)
    }

    pub fn header(&self) -> Option<&HashMap<String, CastValue>> {
        self.scope(Scope::Header)
    }

    pub fn path(&self) -> Option<&HashMap<String, CastValue>> {
        self.scope(Scope::Path)
    }
}

/// Inbound request as seen by handlers.
#[derive(Debug, Clone, PartialEq)]
pub struct Request {
    /// HTTP method (GET, POST, etc.)
    pub method: Method,
    /// Request path without the query string
    pub path: String,
    /// Decoded query string parameters
    pub query: HashMap<String, String>,
    /// Headers (lowercase names)
    pub headers: HashMap<String, String>,
    /// Path parameters captured by the matched layer
    pub params: HashMap<String, String>,
    /// Scratch written by the Swagger wrapper
    pub swagger: Option<SwaggerParams>,
}

impl Request {
    /// Build a request from a method and a request target (`/path?query`).
    pub fn new(method: Method, target: &str) -> Self {
        let path = target.split('?').next().unwrap_or("/").to_string();
        let query = parse_query_params(target);
        debug!(
            method = %method,
            path = %path,
            param_count = query.len(),
            "Request built"
        );
        Self {
            method,
            path,
            query,
            headers: HashMap::new(),
            params: HashMap::new(),
            swagger: None,
        }
    }

    pub fn get(target: &str) -> Self {
        Self::new(Method::GET, target)
    }

    pub fn with_header(mut self, name: &str, value: impl Into<String>) -> Self {
        self.headers.insert(name.to_ascii_lowercase(), value.into());
        self
    }

    /// Header lookup, case-insensitive per RFC 7230.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .get(&name.to_ascii_lowercase())
            .map(String::as_str)
    }

    /// Raw value of `name` in `scope`.
    pub fn raw_param(&self, scope: Scope, name: &str) -> Option<&str> {
        match scope {
            Scope::Query => self.query.get(name).map(String::as_str),
            Scope::Header => self.header(name),
            Scope::Path => self.params.get(name).map(String::as_str),
        }
    }

    /// The Swagger scratch, created if absent.
    pub fn swagger_mut(&mut self) -> &mut SwaggerParams {
        self.swagger.get_or_insert_with(SwaggerParams::new)
    }
}

/// Parse query string parameters from a request target.
///
/// Everything after the first `?` is form-url-decoded. Repeated names keep
/// the last value.
pub fn parse_query_params(target: &str) -> HashMap<String, String> {
    match target.split_once('?') {
        Some((_, query_str)) => url::form_urlencoded::parse(query_str.as_bytes())
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect(),
        None => HashMap::new(),
    }
}

/// Outbound response a handler fills in.
#[derive(Debug, Clone, PartialEq)]
pub struct Response {
    status: u16,
    headers: HashMap<String, String>,
    body: Option<Value>,
    sent: bool,
}

impl Default for Response {
    fn default() -> Self {
        Self {
            status: 200,
            headers: HashMap::new(),
            body: None,
            sent: false,
        }
    }
}

impl Response {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn status(&mut self, status: u16) -> &mut Self {
        self.status = status;
        self
    }

    pub fn set_header(&mut self, name: &str, value: impl Into<String>) -> &mut Self {
        self.headers.insert(name.to_ascii_lowercase(), value.into());
        self
    }

    /// Send `body` as JSON and mark the response as answered.
    pub fn json(&mut self, body: Value) {
        self.set_header("content-type", "application/json");
        self.body = Some(body);
        self.sent = true;
    }

    /// Send a plain-text body and mark the response as answered.
    pub fn send_text(&mut self, text: &str) {
        self.set_header("content-type", "text/plain; charset=utf-8");
        self.body = Some(Value::String(text.to_string()));
        self.sent = true;
    }

    pub fn status_code(&self) -> u16 {
        self.status
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .get(&name.to_ascii_lowercase())
            .map(String::as_str)
    }

    pub fn body(&self) -> Option<&Value> {
        self.body.as_ref()
    }

    pub fn is_sent(&self) -> bool {
        self.sent
    }
}
