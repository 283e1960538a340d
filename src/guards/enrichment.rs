use std::sync::Arc;

use async_trait::async_trait;

use crate::config::HeaderConfig;
use crate::error::{Error, LookupError};
use crate::logging::RequestLog;
use crate::lookup::LocationLookup;
use crate::registry::ServiceRegistry;
use crate::request::Request;
use crate::response::Response;
use crate::session::{InjectionSession, Injections};

use super::{Guard, Next};

/// Registers the caller's [`LocationInfo`](crate::LocationInfo).
///
/// The lookup key is the client address: the last forwarded-for entry if
/// present, else the peer address. A failed lookup fails the whole request
/// with [`Error::Lookup`]; there is no fallback.
pub struct EnrichmentGuard {
    lookup: Arc<dyn LocationLookup>,
    forwarded_for_header: String,
}

impl EnrichmentGuard {
    /// Guard using `lookup` and the default forwarded-for header.
    pub fn new(lookup: Arc<dyn LocationLookup>) -> Self {
        Self::with_config(lookup, &HeaderConfig::default())
    }

    /// Guard using `lookup` and the configured forwarded-for header.
    pub fn with_config(lookup: Arc<dyn LocationLookup>, headers: &HeaderConfig) -> Self {
        Self {
            lookup,
            forwarded_for_header: headers.forwarded_for_header.clone(),
        }
    }
}

impl std::fmt::Debug for EnrichmentGuard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EnrichmentGuard")
            .field("forwarded_for_header", &self.forwarded_for_header)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl Guard for EnrichmentGuard {
    fn name(&self) -> &'static str {
        "enrichment"
    }

    async fn handle(
        &self,
        request: &Request,
        scope: &mut ServiceRegistry,
        next: Next<'_>,
    ) -> Result<Response, Error> {
        let log = RequestLog::new(request.request_id(), self.name());

        let Some(ip) = request.client_address(&self.forwarded_for_header) else {
            log.error(format_args!("no client address to look up"));
            return Err(LookupError::MissingClientAddress.into());
        };

        let location = match self.lookup.locate(&ip).await {
            Ok(location) => location,
            Err(err) => {
                log.error(format_args!("lookup for {ip} failed: {err}"));
                return Err(err.into());
            }
        };

        let mut session = InjectionSession::open(scope, Injections::new().typed(location));
        let response = next.run(request, session.scope_mut()).await;
        session.release();
        response
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handler::{Endpoint, Handler};
    use crate::lookup::LocationInfo;
    use crate::resolver::{HandlerSignature, ResolvedArgs};
    use crate::response::success_response;
    use serde_json::json;

    struct StaticLookup;

    #[async_trait]
    impl LocationLookup for StaticLookup {
        async fn locate(&self, ip: &str) -> Result<LocationInfo, LookupError> {
            if ip == "0.0.0.0" {
                return Err(LookupError::Rejected {
                    reason: "Reserved IP Address".into(),
                });
            }
            Ok(LocationInfo {
                ip: Some(ip.to_string()),
                city: Some("Porto".into()),
                ..LocationInfo::default()
            })
        }
    }

    struct CityHandler;

    #[async_trait]
    impl Handler for CityHandler {
        fn signature(&self) -> HandlerSignature {
            HandlerSignature::new().injected::<LocationInfo>("location")
        }

        async fn call(&self, _request: &Request, args: &ResolvedArgs<'_>) -> Result<Response, Error> {
            let location = args.get::<LocationInfo>("location")?;
            Ok(success_response(json!({ "ip": location.ip, "city": location.city })))
        }
    }

    fn guards() -> Vec<Arc<dyn Guard>> {
        vec![Arc::new(EnrichmentGuard::new(Arc::new(StaticLookup)))]
    }

    #[tokio::test]
    async fn registers_location_for_forwarded_client() {
        let guards = guards();
        let endpoint = Endpoint::new(CityHandler);
        let mut scope = ServiceRegistry::new();
        let request = Request::get("/")
            .header("X-Forwarded-For", "10.1.1.1, 198.51.100.7")
            .remote_addr("127.0.0.1");

        let response = Next::new(&guards, &endpoint)
            .run(&request, &mut scope)
            .await
            .unwrap();

        assert_eq!(response.body()["ip"], "198.51.100.7");
        assert_eq!(response.body()["city"], "Porto");
        assert!(scope.is_empty());
    }

    #[tokio::test]
    async fn missing_address_is_a_lookup_error() {
        let guards = guards();
        let endpoint = Endpoint::new(CityHandler);
        let mut scope = ServiceRegistry::new();

        let err = Next::new(&guards, &endpoint)
            .run(&Request::get("/"), &mut scope)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Lookup(LookupError::MissingClientAddress)));
    }

    #[tokio::test]
    async fn lookup_failure_propagates() {
        let guards = guards();
        let endpoint = Endpoint::new(CityHandler);
        let mut scope = ServiceRegistry::new();
        let request = Request::get("/").remote_addr("0.0.0.0");

        let err = Next::new(&guards, &endpoint)
            .run(&request, &mut scope)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Lookup(LookupError::Rejected { .. })));
        assert!(scope.is_empty());
    }
}
