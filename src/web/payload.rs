//! Raw payload assembly for schema validation.

use serde_json::{Map, Value};
use url::form_urlencoded;

use crate::config::HeaderConfig;
use crate::request::Request;

/// Overlay key holding the request headers.
pub const HEADERS_FIELD: &str = "headers";
/// Overlay key holding the client address.
pub const IP_FIELD: &str = "ip";
/// Overlay key holding the route values.
pub const ROUTE_VALUES_FIELD: &str = "route_values";

/// Builds the key/value payload a schema guard validates.
///
/// Exactly one source supplies the user fields, first match wins:
///
/// 1. a JSON body decoding to a non-empty object,
/// 2. a form-encoded body with at least one field,
/// 3. the query string, if non-empty.
///
/// Sources are never merged. A body that fails to parse is skipped rather
/// than reported. The overlay fields `headers`, `ip` and `route_values` are
/// then written on top, replacing user fields of the same name.
///
/// # Examples
///
/// ```
/// use guard_chain::{HeaderConfig, Request};
/// use guard_chain::web::extract_raw_payload;
/// use serde_json::json;
///
/// let request = Request::get("/5/?page=2")
///     .json_body(&json!({ "name": "loft" }))
///     .route_value("id", "5");
///
/// let payload = extract_raw_payload(&request, &HeaderConfig::default());
/// assert_eq!(payload["name"], "loft");
/// assert!(payload.get("page").is_none());
/// assert_eq!(payload["route_values"]["id"], "5");
/// ```
pub fn extract_raw_payload(request: &Request, headers: &HeaderConfig) -> Map<String, Value> {
    let mut payload = json_fields(request)
        .or_else(|| form_fields(request))
        .or_else(|| query_fields(request))
        .unwrap_or_default();

    payload.insert(HEADERS_FIELD.to_string(), string_object(request.headers()));
    payload.insert(
        IP_FIELD.to_string(),
        request
            .client_address(&headers.forwarded_for_header)
            .map_or(Value::Null, Value::String),
    );
    payload.insert(
        ROUTE_VALUES_FIELD.to_string(),
        string_object(request.route_values()),
    );

    payload
}

fn json_fields(request: &Request) -> Option<Map<String, Value>> {
    let body = request.body_bytes();
    if body.is_empty() {
        return None;
    }
    match serde_json::from_slice::<Value>(body) {
        Ok(Value::Object(fields)) if !fields.is_empty() => Some(fields),
        _ => None,
    }
}

fn form_fields(request: &Request) -> Option<Map<String, Value>> {
    if !request.is_form() {
        return None;
    }
    let fields: Map<String, Value> = form_urlencoded::parse(request.body_bytes())
        .into_owned()
        .map(|(key, value)| (key, Value::String(value)))
        .collect();
    (!fields.is_empty()).then_some(fields)
}

fn query_fields(request: &Request) -> Option<Map<String, Value>> {
    let query = request.query();
    (!query.is_empty()).then(|| string_object_map(query))
}

fn string_object(values: &std::collections::HashMap<String, String>) -> Value {
    Value::Object(string_object_map(values))
}

fn string_object_map(values: &std::collections::HashMap<String, String>) -> Map<String, Value> {
    values
        .iter()
        .map(|(key, value)| (key.clone(), Value::String(value.clone())))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn payload(request: &Request) -> Map<String, Value> {
        extract_raw_payload(request, &HeaderConfig::default())
    }

    #[test]
    fn json_wins_over_form_and_query() {
        let request = Request::post("/?source=query")
            .json_body(&json!({ "source": "json" }));
        assert_eq!(payload(&request)["source"], "json");
    }

    #[test]
    fn form_used_when_no_json() {
        let request = Request::post("/?source=query").form_body([("source", "form")]);
        assert_eq!(payload(&request)["source"], "form");
    }

    #[test]
    fn query_used_when_body_empty() {
        let request = Request::get("/?source=query");
        assert_eq!(payload(&request)["source"], "query");
    }

    #[test]
    fn sources_are_never_merged() {
        let request = Request::post("/?only_in_query=1").json_body(&json!({ "only_in_json": 1 }));
        let fields = payload(&request);
        assert!(fields.contains_key("only_in_json"));
        assert!(!fields.contains_key("only_in_query"));
    }

    #[test]
    fn malformed_json_falls_through() {
        let request = Request::post("/?source=query")
            .header("Content-Type", "application/json")
            .body("{not json");
        assert_eq!(payload(&request)["source"], "query");
    }

    #[test]
    fn empty_or_non_object_json_falls_through() {
        let request = Request::post("/?source=query").json_body(&json!({}));
        assert_eq!(payload(&request)["source"], "query");

        let request = Request::post("/?source=query").json_body(&json!([1, 2]));
        assert_eq!(payload(&request)["source"], "query");
    }

    #[test]
    fn form_body_requires_form_content_type() {
        let request = Request::post("/?source=query").body("source=form");
        assert_eq!(payload(&request)["source"], "query");
    }

    #[test]
    fn overlays_are_always_present() {
        let fields = payload(&Request::get("/"));
        assert_eq!(fields[HEADERS_FIELD], json!({}));
        assert_eq!(fields[IP_FIELD], Value::Null);
        assert_eq!(fields[ROUTE_VALUES_FIELD], json!({}));
        assert_eq!(fields.len(), 3);
    }

    #[test]
    fn overlays_replace_user_fields() {
        let request = Request::post("/")
            .json_body(&json!({ "ip": "spoofed", "keep": true }))
            .header("X-Forwarded-For", "203.0.113.5");
        let fields = payload(&request);
        assert_eq!(fields[IP_FIELD], "203.0.113.5");
        assert_eq!(fields["keep"], true);
        assert_eq!(fields[HEADERS_FIELD]["x-forwarded-for"], "203.0.113.5");
    }
}
