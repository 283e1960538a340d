use async_trait::async_trait;

use crate::config::HeaderConfig;
use crate::error::{Error, Violation, ViolationKind};
use crate::logging::RequestLog;
use crate::registry::ServiceRegistry;
use crate::request::Request;
use crate::response::Response;
use crate::rights::RightsLevel;
use crate::session::{InjectionSession, Injections};

use super::{Guard, Next};

/// Rejects callers whose rights token ranks below a minimum level.
///
/// The token is read from a single header (`Rights` by default). A missing,
/// unknown or malformed token counts as the lowest level. On success the
/// caller's [`RightsLevel`] is registered for the rest of the chain.
///
/// # Examples
///
/// ```
/// use guard_chain::{AuthorizationGuard, Request, RightsLevel};
///
/// let guard = AuthorizationGuard::new(RightsLevel::Admin);
///
/// let admin = Request::get("/").header("Rights", "admin");
/// assert_eq!(guard.check(&admin), Ok(RightsLevel::Admin));
///
/// let anonymous = Request::get("/");
/// assert!(guard.check(&anonymous).is_err());
/// ```
#[derive(Debug, Clone)]
pub struct AuthorizationGuard {
    minimum: RightsLevel,
    rights_header: String,
}

impl AuthorizationGuard {
    /// Guard requiring at least `minimum`, reading the default header.
    pub fn new(minimum: RightsLevel) -> Self {
        Self::with_config(minimum, &HeaderConfig::default())
    }

    /// Guard requiring at least `minimum`, reading the configured header.
    pub fn with_config(minimum: RightsLevel, headers: &HeaderConfig) -> Self {
        Self {
            minimum,
            rights_header: headers.rights_header.clone(),
        }
    }

    /// Configured minimum level.
    pub fn minimum(&self) -> RightsLevel {
        self.minimum
    }

    /// Level presented by the caller.
    pub fn presented_rights(&self, request: &Request) -> RightsLevel {
        RightsLevel::from_token(request.header_value(&self.rights_header))
    }

    /// Decides whether `request` may proceed.
    ///
    /// # Errors
    ///
    /// Returns a [`ViolationKind::InsufficientRights`] violation when the
    /// caller ranks below the minimum.
    pub fn check(&self, request: &Request) -> Result<RightsLevel, Violation> {
        let actual = self.presented_rights(request);
        if actual.satisfies(self.minimum) {
            Ok(actual)
        } else {
            Err(Violation::new(
                ViolationKind::InsufficientRights {
                    actual,
                    required: self.minimum,
                },
                format!("'{}' rights required", self.minimum),
            ))
        }
    }
}

#[async_trait]
impl Guard for AuthorizationGuard {
    fn name(&self) -> &'static str {
        "authorization"
    }

    async fn handle(
        &self,
        request: &Request,
        scope: &mut ServiceRegistry,
        next: Next<'_>,
    ) -> Result<Response, Error> {
        let log = RequestLog::new(request.request_id(), self.name());

        if request.header_value(&self.rights_header).is_none() {
            log.debug(format_args!(
                "no '{}' header, assuming lowest rights",
                self.rights_header
            ));
        }

        let rights = match self.check(request) {
            Ok(rights) => rights,
            Err(violation) => {
                log.warn(format_args!("denied: {violation}"));
                return Ok(violation.into_response());
            }
        };

        let mut session = InjectionSession::open(scope, Injections::new().typed(rights));
        let response = next.run(request, session.scope_mut()).await;
        session.release();
        response
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn admin_passes_admin_guard() {
        let guard = AuthorizationGuard::new(RightsLevel::Admin);
        let request = Request::get("/").header("Rights", "admin");
        assert_eq!(guard.check(&request), Ok(RightsLevel::Admin));
    }

    #[test]
    fn default_fails_admin_guard_with_both_levels() {
        let guard = AuthorizationGuard::new(RightsLevel::Admin);
        let request = Request::get("/").header("Rights", "default");

        let violation = guard.check(&request).unwrap_err();
        assert_eq!(
            violation.kind,
            ViolationKind::InsufficientRights {
                actual: RightsLevel::Default,
                required: RightsLevel::Admin,
            }
        );
    }

    #[test]
    fn every_caller_passes_lowest_minimum() {
        let guard = AuthorizationGuard::new(RightsLevel::Default);
        assert!(guard.check(&Request::get("/")).is_ok());
        assert!(guard.check(&Request::get("/").header("Rights", "junk")).is_ok());
        assert!(guard.check(&Request::get("/").header("Rights", "admin")).is_ok());
    }

    #[test]
    fn configured_header_is_used() {
        let headers = HeaderConfig {
            rights_header: "X-Role".into(),
            ..HeaderConfig::default()
        };
        let guard = AuthorizationGuard::with_config(RightsLevel::Admin, &headers);

        assert!(guard.check(&Request::get("/").header("Rights", "admin")).is_err());
        assert!(guard.check(&Request::get("/").header("x-role", "admin")).is_ok());
    }
}
