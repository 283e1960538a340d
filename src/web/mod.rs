//! Web framework integration surface.
//!
//! This module is the boundary between an HTTP server and the guard chain:
//! - Assembling the raw payload a schema guard validates
//! - Matching paths to routes and filling in route values
//!
//! It holds no server code. A host converts its native request into a
//! [`Request`](crate::Request), hands it to a [`Router`] or directly to a
//! [`Pipeline`](crate::Pipeline), and converts the returned
//! [`Response`](crate::Response) back.
//!
//! # Example Flow
//!
//! ```ignore
//! // In a framework-specific integration (e.g., axum, actix):
//! let request = Request::new(method, &uri)
//!     .header("Rights", rights)
//!     .remote_addr(peer.ip().to_string())
//!     .body(bytes);
//!
//! let response = router.handle(request).await;
//! (StatusCode::from_u16(response.status())?, Json(response.into_body()))
//! ```

mod payload;
mod router;

pub use payload::{extract_raw_payload, HEADERS_FIELD, IP_FIELD, ROUTE_VALUES_FIELD};
pub use router::{PathPattern, Router};
