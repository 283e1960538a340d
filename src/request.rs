//! Framework-agnostic view of an inbound HTTP request.

use std::collections::HashMap;
use std::fmt;

use serde_json::Value;
use url::form_urlencoded;
use uuid::Uuid;

/// HTTP method for a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HttpMethod {
    /// HTTP GET method
    Get,
    /// HTTP POST method
    Post,
    /// HTTP PUT method
    Put,
    /// HTTP DELETE method
    Delete,
    /// HTTP PATCH method
    Patch,
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HttpMethod::Get => write!(f, "GET"),
            HttpMethod::Post => write!(f, "POST"),
            HttpMethod::Put => write!(f, "PUT"),
            HttpMethod::Delete => write!(f, "DELETE"),
            HttpMethod::Patch => write!(f, "PATCH"),
        }
    }
}

const CONTENT_TYPE: &str = "content-type";
const JSON_CONTENT_TYPE: &str = "application/json";
const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded";

/// An inbound request as seen by the guard chain.
///
/// Owned, simple data so that any server can build one from its native
/// request type. Header names are case-insensitive. Route values are filled
/// in by the router once a pattern matches.
///
/// # Examples
///
/// ```
/// use guard_chain::Request;
/// use serde_json::json;
///
/// let request = Request::get("/10/?page=2")
///     .header("Rights", "admin")
///     .json_body(&json!({ "some_checkbox_info": true }));
///
/// assert_eq!(request.path(), "/10/");
/// assert_eq!(request.query().get("page").map(String::as_str), Some("2"));
/// assert_eq!(request.header_value("rights"), Some("admin"));
/// ```
#[derive(Debug, Clone)]
pub struct Request {
    request_id: String,
    method: HttpMethod,
    path: String,
    query: HashMap<String, String>,
    headers: HashMap<String, String>,
    body: Vec<u8>,
    remote_addr: Option<String>,
    route_values: HashMap<String, String>,
}

impl Request {
    /// Creates a request for `target`, a path with an optional `?query` suffix.
    ///
    /// A fresh request id is generated.
    pub fn new(method: HttpMethod, target: &str) -> Self {
        let (path, query) = match target.split_once('?') {
            Some((path, raw_query)) => (
                path.to_string(),
                form_urlencoded::parse(raw_query.as_bytes())
                    .into_owned()
                    .collect(),
            ),
            None => (target.to_string(), HashMap::new()),
        };

        Self {
            request_id: Uuid::new_v4().to_string(),
            method,
            path,
            query,
            headers: HashMap::new(),
            body: Vec::new(),
            remote_addr: None,
            route_values: HashMap::new(),
        }
    }

    /// Shorthand for a GET request.
    pub fn get(target: &str) -> Self {
        Self::new(HttpMethod::Get, target)
    }

    /// Shorthand for a POST request.
    pub fn post(target: &str) -> Self {
        Self::new(HttpMethod::Post, target)
    }

    /// Replaces the generated request id.
    pub fn with_request_id(mut self, request_id: impl Into<String>) -> Self {
        self.request_id = request_id.into();
        self
    }

    /// Sets a header, replacing any previous value under the same name.
    pub fn header(mut self, name: impl AsRef<str>, value: impl Into<String>) -> Self {
        self.headers
            .insert(name.as_ref().to_ascii_lowercase(), value.into());
        self
    }

    /// Adds a query parameter.
    pub fn query_param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.insert(key.into(), value.into());
        self
    }

    /// Sets a raw body without touching the content type.
    pub fn body(mut self, body: impl Into<Vec<u8>>) -> Self {
        self.body = body.into();
        self
    }

    /// Sets a JSON body and its content type.
    pub fn json_body(self, value: &Value) -> Self {
        self.header(CONTENT_TYPE, JSON_CONTENT_TYPE)
            .body(value.to_string())
    }

    /// Sets a form-encoded body and its content type.
    pub fn form_body<'p>(self, pairs: impl IntoIterator<Item = (&'p str, &'p str)>) -> Self {
        let encoded = form_urlencoded::Serializer::new(String::new())
            .extend_pairs(pairs)
            .finish();
        self.header(CONTENT_TYPE, FORM_CONTENT_TYPE).body(encoded)
    }

    /// Sets the address of the directly connected peer.
    pub fn remote_addr(mut self, addr: impl Into<String>) -> Self {
        self.remote_addr = Some(addr.into());
        self
    }

    /// Adds a route value, normally done by the router.
    pub fn route_value(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.route_values.insert(name.into(), value.into());
        self
    }

    pub(crate) fn set_route_values(&mut self, route_values: HashMap<String, String>) {
        self.route_values = route_values;
    }

    /// Request id used to correlate log events.
    pub fn request_id(&self) -> &str {
        &self.request_id
    }

    /// Request method.
    pub fn method(&self) -> HttpMethod {
        self.method
    }

    /// Path without the query string.
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Query parameters.
    pub fn query(&self) -> &HashMap<String, String> {
        &self.query
    }

    /// All headers, keyed by lowercase name.
    pub fn headers(&self) -> &HashMap<String, String> {
        &self.headers
    }

    /// Looks up a header, ignoring case.
    pub fn header_value(&self, name: &str) -> Option<&str> {
        self.headers
            .get(&name.to_ascii_lowercase())
            .map(String::as_str)
    }

    /// Raw body bytes.
    pub fn body_bytes(&self) -> &[u8] {
        &self.body
    }

    /// Returns `true` if the content type names the given media type.
    pub fn has_content_type(&self, media_type: &str) -> bool {
        self.header_value(CONTENT_TYPE)
            .and_then(|value| value.split(';').next())
            .is_some_and(|value| value.trim().eq_ignore_ascii_case(media_type))
    }

    /// Returns `true` if the body is declared as a form.
    pub fn is_form(&self) -> bool {
        self.has_content_type(FORM_CONTENT_TYPE)
    }

    /// Address of the directly connected peer, if known.
    pub fn peer_addr(&self) -> Option<&str> {
        self.remote_addr.as_deref()
    }

    /// Route values extracted by the router.
    pub fn route_values(&self) -> &HashMap<String, String> {
        &self.route_values
    }

    /// Derives the client address.
    ///
    /// The last entry of the `forwarded_for_header` chain wins when the header
    /// is present and non-empty; otherwise the direct peer address is used.
    pub fn client_address(&self, forwarded_for_header: &str) -> Option<String> {
        self.header_value(forwarded_for_header)
            .and_then(|chain| chain.rsplit(',').next())
            .map(str::trim)
            .filter(|ip| !ip.is_empty())
            .map(str::to_string)
            .or_else(|| self.remote_addr.clone())
    }
}
