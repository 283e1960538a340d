use std::marker::PhantomData;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::config::HeaderConfig;
use crate::error::{Error, Violation, ViolationKind};
use crate::logging::RequestLog;
use crate::registry::ServiceRegistry;
use crate::request::Request;
use crate::response::Response;
use crate::session::{InjectionSession, Injections};
use crate::validated::Validated;
use crate::web::extract_raw_payload;

use super::{Guard, Next};

/// Validates the request payload against a typed schema `T`.
///
/// The payload is assembled by [`extract_raw_payload`] and decoded into `T`
/// with `serde`. Fields `T` does not declare are ignored. On success a
/// [`Validated<T>`] is registered for the rest of the chain; on failure the
/// client gets a generic 400 with no schema detail.
///
/// # Examples
///
/// ```
/// use guard_chain::{Request, SchemaGuard};
/// use serde::Deserialize;
/// use serde_json::json;
///
/// #[derive(Debug, Deserialize)]
/// struct HomeForm {
///     some_checkbox_info: bool,
/// }
///
/// let guard = SchemaGuard::<HomeForm>::new();
///
/// let ok = Request::get("/").json_body(&json!({ "some_checkbox_info": false }));
/// assert!(!guard.validate(&ok).unwrap().get().some_checkbox_info);
///
/// let bad = Request::get("/").json_body(&json!({ "some_checkbox_info": "yes" }));
/// assert!(guard.validate(&bad).is_err());
/// ```
pub struct SchemaGuard<T> {
    headers: HeaderConfig,
    _schema: PhantomData<fn() -> T>,
}

impl<T> SchemaGuard<T>
where
    T: DeserializeOwned + Send + Sync + 'static,
{
    /// Guard for schema `T` using default header names.
    pub fn new() -> Self {
        Self::with_config(HeaderConfig::default())
    }

    /// Guard for schema `T` using the configured header names.
    pub fn with_config(headers: HeaderConfig) -> Self {
        Self {
            headers,
            _schema: PhantomData,
        }
    }

    /// Assembles and validates the payload of `request`.
    ///
    /// # Errors
    ///
    /// Returns a [`ViolationKind::InvalidPayload`] violation if the payload
    /// does not decode into `T`.
    pub fn validate(&self, request: &Request) -> Result<Validated<T>, Violation> {
        let payload = extract_raw_payload(request, &self.headers);
        serde_json::from_value::<T>(Value::Object(payload))
            .map(Validated::new_unchecked)
            .map_err(|err| Violation::new(ViolationKind::InvalidPayload, err.to_string()))
    }
}

impl<T> Default for SchemaGuard<T>
where
    T: DeserializeOwned + Send + Sync + 'static,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<T> std::fmt::Debug for SchemaGuard<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SchemaGuard")
            .field("schema", &std::any::type_name::<T>())
            .finish()
    }
}

#[async_trait]
impl<T> Guard for SchemaGuard<T>
where
    T: DeserializeOwned + Send + Sync + 'static,
{
    fn name(&self) -> &'static str {
        "schema"
    }

    async fn handle(
        &self,
        request: &Request,
        scope: &mut ServiceRegistry,
        next: Next<'_>,
    ) -> Result<Response, Error> {
        let log = RequestLog::new(request.request_id(), self.name());

        let data = match self.validate(request) {
            Ok(data) => data,
            Err(violation) => {
                // Detail stays in the log, never in the response.
                log.info(format_args!("rejected payload: {}", violation.message));
                return Ok(violation.into_response());
            }
        };

        let mut session = InjectionSession::open(scope, Injections::new().typed(data));
        let response = next.run(request, session.scope_mut()).await;
        session.release();
        response
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use serde_json::json;

    #[derive(Debug, Deserialize, PartialEq)]
    struct HomeForm {
        some_checkbox_info: bool,
    }

    #[derive(Debug, Deserialize)]
    struct SearchForm {
        q: String,
        ip: Option<String>,
        route_values: std::collections::HashMap<String, String>,
    }

    #[test]
    fn accepts_false_as_valid_boolean() {
        let guard = SchemaGuard::<HomeForm>::new();
        let request = Request::get("/").json_body(&json!({ "some_checkbox_info": false }));

        let data = guard.validate(&request).unwrap();
        assert_eq!(data.into_inner(), HomeForm { some_checkbox_info: false });
    }

    #[test]
    fn ignores_unknown_fields() {
        let guard = SchemaGuard::<HomeForm>::new();
        let request = Request::get("/").json_body(&json!({
            "some_checkbox_info": true,
            "extra": [1, 2, 3]
        }));
        assert!(guard.validate(&request).is_ok());
    }

    #[test]
    fn missing_field_is_invalid_payload() {
        let guard = SchemaGuard::<HomeForm>::new();
        let violation = guard.validate(&Request::get("/")).unwrap_err();
        assert_eq!(violation.kind, ViolationKind::InvalidPayload);
    }

    #[test]
    fn query_strings_are_not_coerced_to_booleans() {
        let guard = SchemaGuard::<HomeForm>::new();
        let request = Request::get("/?some_checkbox_info=true");
        assert!(guard.validate(&request).is_err());
    }

    #[test]
    fn schema_can_read_overlay_fields() {
        let guard = SchemaGuard::<SearchForm>::new();
        let request = Request::get("/search/?q=loft")
            .remote_addr("192.0.2.1")
            .route_value("section", "homes");

        let data = guard.validate(&request).unwrap().into_inner();
        assert_eq!(data.q, "loft");
        assert_eq!(data.ip.as_deref(), Some("192.0.2.1"));
        assert_eq!(data.route_values["section"], "homes");
    }
}
