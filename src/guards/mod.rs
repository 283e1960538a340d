//! Guards: pipeline stages that either short-circuit a request or contribute
//! one value before delegating.
//!
//! # Contract
//!
//! A guard receives the request, the request's registry and a [`Next`]
//! handle to the rest of the chain. It then either:
//!
//! 1. returns a failure [`Response`] without calling `next` (the registry is
//!    left untouched), or
//! 2. opens an [`InjectionSession`](crate::InjectionSession) with the value it
//!    computed, runs `next` against the session's registry, and lets the
//!    session release before returning.
//!
//! Guards only turn the failures they own into responses. Everything else is
//! returned as an [`Error`] and handled by the pipeline.
//!
//! ```text
//! Request
//!   ↓
//! AuthorizationGuard ── denied ──→ 400 { your_rights, rights_required }
//!   ↓ session: RightsLevel
//! SchemaGuard ───────── invalid ─→ 400 { success: false }
//!   ↓ session: Validated<T>
//! EnrichmentGuard ───── lookup error → Error::Lookup
//!   ↓ session: LocationInfo
//! Endpoint (resolve + call)
//! ```

mod authorization;
mod enrichment;
mod schema;

use std::sync::Arc;

use async_trait::async_trait;

use crate::error::Error;
use crate::handler::Endpoint;
use crate::registry::ServiceRegistry;
use crate::request::Request;
use crate::response::Response;

pub use authorization::AuthorizationGuard;
pub use enrichment::EnrichmentGuard;
pub use schema::SchemaGuard;

/// A single pipeline stage.
#[async_trait]
pub trait Guard: Send + Sync {
    /// Short name used in logs.
    fn name(&self) -> &'static str;

    /// Runs this stage.
    ///
    /// # Errors
    ///
    /// Failures outside the guard's own concern, including those returned
    /// by `next`.
    async fn handle(
        &self,
        request: &Request,
        scope: &mut ServiceRegistry,
        next: Next<'_>,
    ) -> Result<Response, Error>;
}

/// The remainder of a guard chain.
#[derive(Clone, Copy)]
pub struct Next<'a> {
    guards: &'a [Arc<dyn Guard>],
    endpoint: &'a Endpoint,
}

impl<'a> Next<'a> {
    pub(crate) fn new(guards: &'a [Arc<dyn Guard>], endpoint: &'a Endpoint) -> Self {
        Self { guards, endpoint }
    }

    /// Number of guards still ahead of the endpoint.
    pub fn remaining(&self) -> usize {
        self.guards.len()
    }

    /// Runs the next guard, or the endpoint when no guards remain.
    ///
    /// # Errors
    ///
    /// Whatever the next stage returns.
    pub async fn run(self, request: &Request, scope: &mut ServiceRegistry) -> Result<Response, Error> {
        match self.guards.split_first() {
            Some((guard, rest)) => {
                let next = Next::new(rest, self.endpoint);
                guard.handle(request, scope, next).await
            }
            None => self.endpoint.invoke(request, scope).await,
        }
    }
}

impl std::fmt::Debug for Next<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Next")
            .field(
                "guards",
                &self.guards.iter().map(|g| g.name()).collect::<Vec<_>>(),
            )
            .field("endpoint", self.endpoint)
            .finish()
    }
}
