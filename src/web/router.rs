//! Minimal method + path router in front of pipelines.

use std::collections::HashMap;

use crate::error::Error;
use crate::pipeline::Pipeline;
use crate::request::{HttpMethod, Request};
use crate::response::{not_found, Response};

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Literal(String),
    Param(String),
}

/// A path template such as `/{home_id}/`.
///
/// Segments wrapped in braces capture one non-empty path segment under that
/// name; captured values are percent-decoded. Everything else must match
/// literally against the raw path, trailing slash included.
///
/// # Examples
///
/// ```
/// use guard_chain::web::PathPattern;
///
/// let pattern = PathPattern::parse("/{home_id}/");
/// let values = pattern.matches("/10/").unwrap();
/// assert_eq!(values["home_id"], "10");
///
/// assert!(pattern.matches("/10").is_none());
/// assert!(pattern.matches("//").is_none());
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathPattern {
    raw: String,
    segments: Vec<Segment>,
}

impl PathPattern {
    /// Parses a template.
    pub fn parse(pattern: &str) -> Self {
        let segments = pattern
            .split('/')
            .map(|segment| {
                match segment
                    .strip_prefix('{')
                    .and_then(|rest| rest.strip_suffix('}'))
                {
                    Some(name) if !name.is_empty() => Segment::Param(name.to_string()),
                    _ => Segment::Literal(segment.to_string()),
                }
            })
            .collect();

        Self {
            raw: pattern.to_string(),
            segments,
        }
    }

    /// The template as written.
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// Names of the captured segments, in order.
    pub fn param_names(&self) -> impl Iterator<Item = &str> {
        self.segments.iter().filter_map(|segment| match segment {
            Segment::Param(name) => Some(name.as_str()),
            Segment::Literal(_) => None,
        })
    }

    /// Matches `path`, returning the captured route values.
    ///
    /// A captured segment that does not decode to UTF-8 fails the match.
    pub fn matches(&self, path: &str) -> Option<HashMap<String, String>> {
        let parts: Vec<&str> = path.split('/').collect();
        if parts.len() != self.segments.len() {
            return None;
        }

        let mut values = HashMap::new();
        for (segment, part) in self.segments.iter().zip(parts) {
            match segment {
                Segment::Literal(expected) if expected == part => {}
                Segment::Param(name) if !part.is_empty() => {
                    let decoded = urlencoding::decode(part).ok()?;
                    values.insert(name.clone(), decoded.into_owned());
                }
                _ => return None,
            }
        }
        Some(values)
    }
}

#[derive(Debug)]
struct Route {
    method: HttpMethod,
    pattern: PathPattern,
    pipeline: Pipeline,
}

/// Dispatches requests to the first route whose method and pattern match.
#[derive(Debug, Default)]
pub struct Router {
    routes: Vec<Route>,
}

impl Router {
    /// Creates an empty router.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `pipeline` for `method` requests matching `pattern`.
    pub fn route(mut self, method: HttpMethod, pattern: &str, pipeline: Pipeline) -> Self {
        tracing::debug!(%method, pattern, guards = ?pipeline.guard_names(), "route registered");
        self.routes.push(Route {
            method,
            pattern: PathPattern::parse(pattern),
            pipeline,
        });
        self
    }

    /// Number of registered routes.
    pub fn len(&self) -> usize {
        self.routes.len()
    }

    /// Returns `true` if no routes are registered.
    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }

    fn find(&self, request: &Request) -> Option<(&Route, HashMap<String, String>)> {
        self.routes
            .iter()
            .filter(|route| route.method == request.method())
            .find_map(|route| route.pattern.matches(request.path()).map(|values| (route, values)))
    }

    /// Routes and dispatches `request`; unmatched requests get a 404.
    ///
    /// Fatal pipeline errors become a generic 500, see [`Pipeline::dispatch`].
    pub async fn handle(&self, mut request: Request) -> Response {
        let Some((route, values)) = self.find(&request) else {
            tracing::debug!(request_id = request.request_id(), path = request.path(), "no route");
            return not_found();
        };
        request.set_route_values(values);
        route.pipeline.dispatch(&request).await
    }

    /// Like [`handle`](Self::handle) but surfaces fatal errors.
    ///
    /// # Errors
    ///
    /// See [`Pipeline::try_dispatch`].
    pub async fn try_handle(&self, mut request: Request) -> Result<Response, Error> {
        let Some((route, values)) = self.find(&request) else {
            return Ok(not_found());
        };
        request.set_route_values(values);
        route.pipeline.try_dispatch(&request).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn literal_segments_must_match() {
        let pattern = PathPattern::parse("/homes/{id}/rooms");
        assert!(pattern.matches("/homes/3/rooms").is_some());
        assert!(pattern.matches("/houses/3/rooms").is_none());
        assert!(pattern.matches("/homes/3/rooms/").is_none());
    }

    #[test]
    fn captures_multiple_params() {
        let pattern = PathPattern::parse("/{home}/{room}/");
        let values = pattern.matches("/a/b/").unwrap();
        assert_eq!(values["home"], "a");
        assert_eq!(values["room"], "b");
        assert_eq!(pattern.param_names().collect::<Vec<_>>(), vec!["home", "room"]);
    }

    #[test]
    fn captured_values_are_percent_decoded() {
        let pattern = PathPattern::parse("/{home}/");
        assert_eq!(pattern.matches("/caf%C3%A9/").unwrap()["home"], "café");
        assert_eq!(pattern.matches("/a+b%20c/").unwrap()["home"], "a+b c");
        assert!(pattern.matches("/%FF/").is_none());
    }

    #[test]
    fn empty_braces_are_literal() {
        let pattern = PathPattern::parse("/{}/");
        assert!(pattern.matches("/{}/").is_some());
        assert_eq!(pattern.param_names().count(), 0);
        assert_eq!(pattern.as_str(), "/{}/");
    }
}
