//! Guard pipelines: composition at registration, dispatch per request.

use std::fmt;
use std::sync::Arc;

use crate::error::Error;
use crate::guards::{Guard, Next};
use crate::handler::{Endpoint, Handler};
use crate::logging::RequestLog;
use crate::registry::ServiceRegistry;
use crate::request::Request;
use crate::resolver::HandlerSignature;
use crate::response::{server_error, Response};

/// Composes guards around a terminal handler.
///
/// Guards run in the order they were added: the first one added is the
/// outermost and sees the request first. The handler's signature is read
/// once, in [`handler`](PipelineBuilder::handler).
///
/// # Examples
///
/// ```
/// use guard_chain::{
///     success_response, AuthorizationGuard, Error, Handler, HandlerSignature, Pipeline,
///     Request, ResolvedArgs, Response, RightsLevel,
/// };
/// use serde_json::json;
///
/// struct Whoami;
///
/// #[async_trait::async_trait]
/// impl Handler for Whoami {
///     fn signature(&self) -> HandlerSignature {
///         HandlerSignature::new().injected::<RightsLevel>("rights")
///     }
///
///     async fn call(&self, _: &Request, args: &ResolvedArgs<'_>) -> Result<Response, Error> {
///         let rights = args.get::<RightsLevel>("rights")?;
///         Ok(success_response(json!({ "rights": rights.as_str() })))
///     }
/// }
///
/// let pipeline = Pipeline::builder()
///     .guard(AuthorizationGuard::new(RightsLevel::Default))
///     .handler(Whoami);
///
/// assert_eq!(pipeline.guard_names(), vec!["authorization"]);
/// ```
#[derive(Default)]
pub struct PipelineBuilder {
    guards: Vec<Arc<dyn Guard>>,
}

impl PipelineBuilder {
    /// Creates a builder with no guards.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a guard inside the ones already added.
    pub fn guard(self, guard: impl Guard + 'static) -> Self {
        self.guard_arc(Arc::new(guard))
    }

    /// Appends a shared guard.
    pub fn guard_arc(mut self, guard: Arc<dyn Guard>) -> Self {
        self.guards.push(guard);
        self
    }

    /// Terminates the chain with `handler`.
    pub fn handler(self, handler: impl Handler + 'static) -> Pipeline {
        Pipeline {
            guards: self.guards,
            endpoint: Endpoint::new(handler),
        }
    }

    /// Terminates the chain with a shared handler.
    pub fn handler_arc(self, handler: Arc<dyn Handler>) -> Pipeline {
        Pipeline {
            guards: self.guards,
            endpoint: Endpoint::from_arc(handler),
        }
    }
}

/// A composed guard chain ending in a handler.
///
/// A pipeline holds no per-request state and is shared freely across
/// concurrent requests. Each dispatch gets its own [`ServiceRegistry`].
pub struct Pipeline {
    guards: Vec<Arc<dyn Guard>>,
    endpoint: Endpoint,
}

impl Pipeline {
    /// Starts building a pipeline.
    pub fn builder() -> PipelineBuilder {
        PipelineBuilder::new()
    }

    /// Guard names, outermost first.
    pub fn guard_names(&self) -> Vec<&'static str> {
        self.guards.iter().map(|guard| guard.name()).collect()
    }

    /// Signature of the terminal handler.
    pub fn signature(&self) -> &HandlerSignature {
        self.endpoint.signature()
    }

    /// Runs the chain against a caller-provided registry.
    ///
    /// Values already in `scope` stay visible to the handler. Every guard
    /// session is released before this returns, so `scope` ends up as it
    /// started.
    ///
    /// # Errors
    ///
    /// Resolution failures, lookup failures and handler errors.
    pub async fn try_dispatch_in(
        &self,
        request: &Request,
        scope: &mut ServiceRegistry,
    ) -> Result<Response, Error> {
        Next::new(&self.guards, &self.endpoint)
            .run(request, scope)
            .await
    }

    /// Runs the chain with a fresh request-private registry.
    ///
    /// # Errors
    ///
    /// See [`try_dispatch_in`](Self::try_dispatch_in).
    pub async fn try_dispatch(&self, request: &Request) -> Result<Response, Error> {
        let log = RequestLog::new(request.request_id(), "pipeline");
        log.debug(format_args!(
            "dispatching {} {} through {:?}",
            request.method(),
            request.path(),
            self.guard_names()
        ));

        let mut scope = ServiceRegistry::new();
        let result = self.try_dispatch_in(request, &mut scope).await;

        if !scope.is_empty() {
            log.warn(format_args!("{} entries left in scope", scope.len()));
        }
        if let Ok(response) = &result {
            log.debug(format_args!("completed with status {}", response.status()));
        }
        result
    }

    /// Runs the chain, turning fatal errors into a generic 500.
    ///
    /// The error detail is logged, never sent to the client.
    pub async fn dispatch(&self, request: &Request) -> Response {
        match self.try_dispatch(request).await {
            Ok(response) => response,
            Err(err) => {
                RequestLog::new(request.request_id(), "pipeline")
                    .error(format_args!("request failed: {err}"));
                server_error()
            }
        }
    }
}

impl fmt::Debug for Pipeline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Pipeline")
            .field("guards", &self.guard_names())
            .field("endpoint", &self.endpoint)
            .finish()
    }
}
