//! Structured responses: `{ "success": bool, ...fields }` plus a status code.

use serde_json::{Map, Value};

/// Status code and JSON body produced by a guard or handler.
#[derive(Debug, Clone, PartialEq)]
pub struct Response {
    status: u16,
    body: Value,
}

impl Response {
    /// Creates a response from raw parts.
    pub fn new(status: u16, body: Value) -> Self {
        Self { status, body }
    }

    /// Overrides the status code.
    pub fn with_status(mut self, status: u16) -> Self {
        self.status = status;
        self
    }

    /// Status code.
    pub fn status(&self) -> u16 {
        self.status
    }

    /// JSON body.
    pub fn body(&self) -> &Value {
        &self.body
    }

    /// Consumes the response and returns the body.
    pub fn into_body(self) -> Value {
        self.body
    }

    /// Value of the body's `success` flag; `false` when absent.
    pub fn is_success(&self) -> bool {
        self.body
            .get("success")
            .and_then(Value::as_bool)
            .unwrap_or(false)
    }
}

fn with_success_flag(fields: Value, success: bool) -> Value {
    let mut body = match fields {
        Value::Object(map) => map,
        Value::Null => Map::new(),
        other => {
            let mut map = Map::new();
            map.insert("data".to_string(), other);
            map
        }
    };
    body.insert("success".to_string(), Value::Bool(success));
    Value::Object(body)
}

/// A 200 response with `success: true` merged into `fields`.
///
/// Object fields are merged at the top level; any other value is nested under
/// `data`. The flag always overrides a caller-supplied `success` field.
///
/// # Examples
///
/// ```
/// use guard_chain::success_response;
/// use serde_json::json;
///
/// let response = success_response(json!({ "home_id": 10 }));
/// assert_eq!(response.status(), 200);
/// assert_eq!(response.body(), &json!({ "home_id": 10, "success": true }));
/// ```
pub fn success_response(fields: Value) -> Response {
    Response::new(200, with_success_flag(fields, true))
}

/// A 400 response with `success: false` merged into `fields`.
pub fn failure_response(fields: Value) -> Response {
    Response::new(400, with_success_flag(fields, false))
}

/// A generic 500 response that reveals nothing about the cause.
pub fn server_error() -> Response {
    Response::new(500, with_success_flag(Value::Null, false))
}

/// A generic 404 response.
pub fn not_found() -> Response {
    Response::new(404, with_success_flag(Value::Null, false))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn failure_flag_overrides_caller_field() {
        let response = failure_response(json!({ "success": true, "reason": "nope" }));
        assert_eq!(response.status(), 400);
        assert!(!response.is_success());
        assert_eq!(response.body()["reason"], "nope");
    }

    #[test]
    fn scalar_fields_are_nested_under_data() {
        let response = success_response(json!(5));
        assert_eq!(response.body(), &json!({ "data": 5, "success": true }));
    }

    #[test]
    fn generic_errors_carry_no_detail() {
        assert_eq!(server_error().status(), 500);
        assert_eq!(server_error().body(), &json!({ "success": false }));
        assert_eq!(not_found().status(), 404);
    }

    #[test]
    fn with_status_keeps_body() {
        let response = success_response(json!({})).with_status(201);
        assert_eq!(response.status(), 201);
        assert!(response.is_success());
    }
}
