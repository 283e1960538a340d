//! Guard chains for HTTP handlers with scoped, typed dependency injection.
//!
//! Each guard performs one concern and contributes one typed value that the
//! terminal handler receives as an ordinary argument:
//! - **Authorization**: compares the caller's rights token with a minimum level
//! - **Schema**: decodes the request payload into a typed struct
//! - **Enrichment**: looks up the caller's location from their address
//!
//! Values travel through a request-private [`ServiceRegistry`]. A guard
//! registers its value with an [`InjectionSession`], which removes it again
//! (or restores whatever it shadowed) when the rest of the chain returns,
//! errors or unwinds.
//!
//! # Core Types
//!
//! - [`Pipeline`]: ordered guards around a [`Handler`], built once per route
//! - [`Guard`]: one pipeline stage; may short-circuit or delegate to [`Next`]
//! - [`HandlerSignature`]: the inputs a handler declares, by name and type
//! - [`ResolvedArgs`]: those inputs, bound from route values and the registry
//! - [`Validated<T>`]: payload that passed a [`SchemaGuard`]
//!
//! # Examples
//!
//! ```
//! use guard_chain::{
//!     success_response, AuthorizationGuard, Error, Handler, HandlerSignature, Pipeline,
//!     Request, ResolvedArgs, Response, RightsLevel,
//! };
//! use serde_json::json;
//!
//! struct ShowHome;
//!
//! #[async_trait::async_trait]
//! impl Handler for ShowHome {
//!     fn signature(&self) -> HandlerSignature {
//!         HandlerSignature::new()
//!             .path::<i64>("home_id")
//!             .injected::<RightsLevel>("rights")
//!     }
//!
//!     async fn call(&self, _: &Request, args: &ResolvedArgs<'_>) -> Result<Response, Error> {
//!         Ok(success_response(json!({
//!             "home_id": args.get::<i64>("home_id")?,
//!             "rights": args.get::<RightsLevel>("rights")?.as_str(),
//!         })))
//!     }
//! }
//!
//! let pipeline = Pipeline::builder()
//!     .guard(AuthorizationGuard::new(RightsLevel::Admin))
//!     .handler(ShowHome);
//!
//! let runtime = tokio::runtime::Builder::new_current_thread().build().unwrap();
//!
//! let admin = Request::get("/10/").header("Rights", "admin").route_value("home_id", "10");
//! let response = runtime.block_on(pipeline.dispatch(&admin));
//! assert_eq!(response.body(), &json!({ "success": true, "home_id": 10, "rights": "admin" }));
//!
//! let guest = Request::get("/10/").route_value("home_id", "10");
//! let response = runtime.block_on(pipeline.dispatch(&guest));
//! assert_eq!(response.status(), 400);
//! assert_eq!(response.body()["rights_required"], "admin");
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod config;
mod error;
pub mod guards;
mod handler;
mod logging;
mod lookup;
mod pipeline;
mod registry;
mod request;
mod resolver;
mod response;
mod rights;
mod session;
mod validated;
pub mod web;

pub use config::{HeaderConfig, LookupConfig, DEFAULT_USER_AGENT};
pub use error::{Error, LookupError, RegistryError, ResolveError, Violation, ViolationKind};
pub use guards::{AuthorizationGuard, EnrichmentGuard, Guard, Next, SchemaGuard};
pub use handler::{Endpoint, Handler};
pub use logging::RequestLog;
pub use lookup::{IpApiClient, LocationInfo, LocationLookup};
pub use pipeline::{Pipeline, PipelineBuilder};
pub use registry::{Entry, Key, ServiceRegistry};
pub use request::{HttpMethod, Request};
pub use resolver::{resolve, HandlerSignature, Param, ParamSource, ResolvedArgs};
pub use response::{failure_response, not_found, server_error, success_response, Response};
pub use rights::RightsLevel;
pub use session::{InjectionSession, Injections};
pub use validated::Validated;
