use serde_json::json;
use thiserror::Error as ThisError;

use crate::response::{failure_response, Response};
use crate::rights::RightsLevel;

/// Fatal errors raised while running a guard chain.
///
/// Anything that reaches the caller as an `Error` is either a programming
/// error (a handler declared an input nothing can provide) or an operational
/// failure (the enrichment lookup failed). Recoverable denials are reported
/// as [`Violation`]s and turned into responses by the guard that raised them.
#[derive(Debug, ThisError)]
pub enum Error {
    /// A handler parameter could not be bound
    #[error("parameter resolution failed: {0}")]
    Resolve(#[from] ResolveError),
    /// The service registry was queried for a missing or mistyped entry
    #[error("registry error: {0}")]
    Registry(#[from] RegistryError),
    /// The enrichment lookup failed
    #[error("enrichment lookup failed: {0}")]
    Lookup(#[from] LookupError),
    /// A terminal handler reported a failure of its own
    #[error("handler failed: {0}")]
    Handler(String),
}

impl Error {
    /// Creates a handler error from any message.
    pub fn handler(message: impl Into<String>) -> Self {
        Error::Handler(message.into())
    }
}

/// Failure to bind a declared handler parameter.
#[derive(Debug, Clone, PartialEq, Eq, ThisError)]
pub enum ResolveError {
    /// Neither a path value nor a registered value matches the parameter
    #[error("no value available for parameter '{param}'")]
    UnresolvedParameter {
        /// Declared parameter name
        param: String,
    },
    /// A path value exists but does not convert to the declared type
    #[error("path value '{value}' for parameter '{param}' is not a valid {expected}")]
    TypeMismatch {
        /// Declared parameter name
        param: String,
        /// Declared parameter type
        expected: &'static str,
        /// Raw path value
        value: String,
    },
    /// A handler asked for an argument it never declared
    #[error("argument '{name}' was not declared by the handler")]
    MissingArgument {
        /// Requested argument name
        name: String,
    },
    /// A handler asked for a declared argument under the wrong type
    #[error("argument '{name}' is not a {expected}")]
    ArgumentType {
        /// Requested argument name
        name: String,
        /// Requested type
        expected: &'static str,
    },
}

/// Failure to read from the service registry.
#[derive(Debug, Clone, PartialEq, Eq, ThisError)]
pub enum RegistryError {
    /// No entry is registered under the key
    #[error("no entry registered for {key}")]
    NotFound {
        /// Display form of the key
        key: String,
    },
    /// An entry exists but holds a different type
    #[error("entry {key} is not a {expected}")]
    TypeMismatch {
        /// Display form of the key
        key: String,
        /// Requested type
        expected: &'static str,
    },
}

/// Failure of the external address-to-location lookup.
#[derive(Debug, ThisError)]
pub enum LookupError {
    /// Neither a forwarded-for chain nor a remote address was present
    #[error("request carries no client address")]
    MissingClientAddress,
    /// Transport or status failure talking to the lookup service
    #[error("lookup request failed: {0}")]
    Http(#[from] reqwest::Error),
    /// The service answered with an error record
    #[error("lookup rejected: {reason}")]
    Rejected {
        /// Reason reported by the service
        reason: String,
    },
    /// The service answered with a record that does not decode
    #[error("lookup returned an invalid record: {0}")]
    InvalidRecord(#[from] serde_json::Error),
}

/// A recoverable, user-visible guard denial.
#[derive(Debug, Clone, PartialEq, Eq, ThisError)]
#[error("{kind}: {message}")]
pub struct Violation {
    /// The kind of violation that occurred
    pub kind: ViolationKind,
    /// Human-readable message explaining the violation
    pub message: String,
}

impl Violation {
    /// Creates a new violation.
    pub fn new(kind: ViolationKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    /// Converts the violation into the failure response a client sees.
    ///
    /// Rights denials report the caller's level and the required minimum.
    /// Payload denials are generic; schema details never leak.
    pub fn into_response(self) -> Response {
        match self.kind {
            ViolationKind::InsufficientRights { actual, required } => failure_response(json!({
                "your_rights": actual.as_str(),
                "rights_required": required.as_str(),
            })),
            ViolationKind::InvalidPayload => failure_response(json!({})),
        }
    }
}

/// The kind of guard denial.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ThisError)]
pub enum ViolationKind {
    /// The caller's rights are below the guard's minimum
    #[error("insufficient rights ({actual} < {required})")]
    InsufficientRights {
        /// Level presented by the caller
        actual: RightsLevel,
        /// Minimum level configured on the guard
        required: RightsLevel,
    },
    /// The merged payload failed schema validation
    #[error("invalid payload")]
    InvalidPayload,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rights_violation_reports_both_levels() {
        let violation = Violation::new(
            ViolationKind::InsufficientRights {
                actual: RightsLevel::Default,
                required: RightsLevel::Admin,
            },
            "admin required",
        );

        let response = violation.into_response();
        assert_eq!(response.status(), 400);
        assert_eq!(response.body()["success"], false);
        assert_eq!(response.body()["your_rights"], "default");
        assert_eq!(response.body()["rights_required"], "admin");
    }

    #[test]
    fn payload_violation_is_generic() {
        let response = Violation::new(ViolationKind::InvalidPayload, "missing field").into_response();

        assert_eq!(response.status(), 400);
        assert_eq!(response.body(), &json!({ "success": false }));
    }

    #[test]
    fn resolve_error_converts_into_error() {
        let err: Error = ResolveError::UnresolvedParameter {
            param: "home_id".to_string(),
        }
        .into();

        assert!(matches!(err, Error::Resolve(_)));
        assert!(err.to_string().contains("home_id"));
    }
}
