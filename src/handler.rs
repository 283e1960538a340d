//! Terminal business handlers.

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;

use crate::error::Error;
use crate::registry::ServiceRegistry;
use crate::request::Request;
use crate::resolver::{resolve, HandlerSignature, ResolvedArgs};
use crate::response::Response;

/// The business handler at the end of a guard chain.
///
/// A handler states what it needs through [`signature`](Handler::signature)
/// and receives those inputs, already bound, in [`call`](Handler::call). It
/// never sees the registry or the guards that filled it.
#[async_trait]
pub trait Handler: Send + Sync {
    /// Declared inputs. Read once, when the handler is registered.
    fn signature(&self) -> HandlerSignature;

    /// Handles one request with its bound inputs.
    ///
    /// # Errors
    ///
    /// Any error is treated as a server failure by the pipeline.
    async fn call(&self, request: &Request, args: &ResolvedArgs<'_>) -> Result<Response, Error>;
}

/// A handler paired with its signature, captured at registration time.
#[derive(Clone)]
pub struct Endpoint {
    handler: Arc<dyn Handler>,
    signature: HandlerSignature,
}

impl Endpoint {
    /// Wraps `handler`, reading its signature once.
    pub fn new(handler: impl Handler + 'static) -> Self {
        Self::from_arc(Arc::new(handler))
    }

    /// Wraps a shared handler.
    pub fn from_arc(handler: Arc<dyn Handler>) -> Self {
        let signature = handler.signature();
        Self { handler, signature }
    }

    /// The captured signature.
    pub fn signature(&self) -> &HandlerSignature {
        &self.signature
    }

    /// Binds the handler's inputs against `scope` and the request's route
    /// values, then calls it.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Resolve`] if an input cannot be bound, or whatever
    /// the handler itself returns.
    pub async fn invoke(&self, request: &Request, scope: &ServiceRegistry) -> Result<Response, Error> {
        let args = resolve(&self.signature, request.route_values(), scope)?;
        self.handler.call(request, &args).await
    }
}

impl fmt::Debug for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Endpoint")
            .field("signature", &self.signature)
            .finish_non_exhaustive()
    }
}
