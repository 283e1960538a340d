//! Binding declared handler inputs to path values and registered values.
//!
//! A handler declares its inputs once, at route registration, as a
//! [`HandlerSignature`]. Per request, [`resolve`] walks that signature and
//! produces [`ResolvedArgs`], borrowing injected values straight out of the
//! request's registry.

use std::any::{type_name, Any, TypeId};
use std::collections::HashMap;
use std::str::FromStr;

use crate::error::ResolveError;
use crate::registry::{Key, ServiceRegistry};

type PathParser = fn(&str) -> Option<Box<dyn Any + Send + Sync>>;

fn parse_path_value<T>(raw: &str) -> Option<Box<dyn Any + Send + Sync>>
where
    T: FromStr + Any + Send + Sync,
{
    raw.parse::<T>()
        .ok()
        .map(|value| Box::new(value) as Box<dyn Any + Send + Sync>)
}

/// Where a declared parameter is expected to come from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamSource {
    /// A route value extracted by the router, converted to the declared type
    Path,
    /// A value registered by a guard, looked up by name then by type
    Registry,
}

/// One declared handler input.
#[derive(Debug, Clone)]
pub struct Param {
    name: &'static str,
    type_id: TypeId,
    type_name: &'static str,
    source: ParamSource,
    parse: Option<PathParser>,
}

impl Param {
    /// Declared name.
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Declared type name.
    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    /// Source hint.
    pub fn source(&self) -> ParamSource {
        self.source
    }
}

/// Ordered list of inputs a handler needs.
///
/// # Examples
///
/// ```
/// use guard_chain::{HandlerSignature, ParamSource, RightsLevel};
///
/// let signature = HandlerSignature::new()
///     .path::<u64>("home_id")
///     .injected::<RightsLevel>("rights");
///
/// assert_eq!(signature.len(), 2);
/// assert_eq!(signature.params()[0].source(), ParamSource::Path);
/// ```
#[derive(Debug, Clone, Default)]
pub struct HandlerSignature {
    params: Vec<Param>,
}

impl HandlerSignature {
    /// Creates an empty signature.
    pub fn new() -> Self {
        Self::default()
    }

    /// Declares an input bound from the route value called `name`.
    pub fn path<T>(mut self, name: &'static str) -> Self
    where
        T: FromStr + Any + Send + Sync,
    {
        self.params.push(Param {
            name,
            type_id: TypeId::of::<T>(),
            type_name: type_name::<T>(),
            source: ParamSource::Path,
            parse: Some(parse_path_value::<T>),
        });
        self
    }

    /// Declares an input bound from a registered value.
    pub fn injected<T>(mut self, name: &'static str) -> Self
    where
        T: Any + Send + Sync,
    {
        self.params.push(Param {
            name,
            type_id: TypeId::of::<T>(),
            type_name: type_name::<T>(),
            source: ParamSource::Registry,
            parse: None,
        });
        self
    }

    /// Declared inputs in order.
    pub fn params(&self) -> &[Param] {
        &self.params
    }

    /// Number of declared inputs.
    pub fn len(&self) -> usize {
        self.params.len()
    }

    /// Returns `true` if the handler takes no inputs.
    pub fn is_empty(&self) -> bool {
        self.params.is_empty()
    }
}

enum ArgValue<'a> {
    Owned(Box<dyn Any + Send + Sync>),
    Borrowed(&'a (dyn Any + Send + Sync)),
}

impl ArgValue<'_> {
    fn as_any(&self) -> &(dyn Any + Send + Sync) {
        match self {
            ArgValue::Owned(value) => value.as_ref(),
            ArgValue::Borrowed(value) => *value,
        }
    }
}

/// Concrete call arguments for one invocation, keyed by parameter name.
pub struct ResolvedArgs<'a> {
    values: Vec<(&'static str, ArgValue<'a>)>,
}

impl<'a> ResolvedArgs<'a> {
    /// Borrows the argument called `name` as `T`.
    ///
    /// # Errors
    ///
    /// Returns [`ResolveError::MissingArgument`] if the handler never declared
    /// `name`, or [`ResolveError::ArgumentType`] if it was declared with a
    /// different type.
    pub fn get<T: Any>(&self, name: &str) -> Result<&T, ResolveError> {
        let (_, value) = self
            .values
            .iter()
            .find(|(declared, _)| *declared == name)
            .ok_or_else(|| ResolveError::MissingArgument {
                name: name.to_string(),
            })?;

        value
            .as_any()
            .downcast_ref::<T>()
            .ok_or_else(|| ResolveError::ArgumentType {
                name: name.to_string(),
                expected: type_name::<T>(),
            })
    }

    /// Names of bound arguments, in declaration order.
    pub fn names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.values.iter().map(|(name, _)| *name)
    }

    /// Number of bound arguments.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Returns `true` if nothing was bound.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl std::fmt::Debug for ResolvedArgs<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list().entries(self.names()).finish()
    }
}

/// Binds every parameter of `signature`.
///
/// Each parameter is bound from the source it declared, never both. Path
/// parameters are read from `route_values` and parsed into the declared
/// type. Registry parameters are looked up by name first, then by type; a
/// named slot holding a different type is skipped. A registry parameter
/// whose name also appears in `route_values` still binds from the registry:
/// the route value is ignored for it.
///
/// # Errors
///
/// - [`ResolveError::TypeMismatch`] when a path value does not parse.
/// - [`ResolveError::UnresolvedParameter`] when no source provides a value.
///
/// Both indicate a wiring mistake between the route, its guards and its
/// handler rather than bad client input.
pub fn resolve<'a>(
    signature: &HandlerSignature,
    route_values: &HashMap<String, String>,
    scope: &'a ServiceRegistry,
) -> Result<ResolvedArgs<'a>, ResolveError> {
    let mut values = Vec::with_capacity(signature.len());

    for param in signature.params() {
        let value = match (param.source, param.parse) {
            (ParamSource::Path, Some(parse)) => {
                let raw = route_values.get(param.name).ok_or_else(|| {
                    ResolveError::UnresolvedParameter {
                        param: param.name.to_string(),
                    }
                })?;
                let parsed = parse(raw).ok_or_else(|| ResolveError::TypeMismatch {
                    param: param.name.to_string(),
                    expected: param.type_name,
                    value: raw.clone(),
                })?;
                ArgValue::Owned(parsed)
            }
            _ => ArgValue::Borrowed(lookup_registered(param, scope)?),
        };
        values.push((param.name, value));
    }

    Ok(ResolvedArgs { values })
}

fn lookup_registered<'a>(
    param: &Param,
    scope: &'a ServiceRegistry,
) -> Result<&'a (dyn Any + Send + Sync), ResolveError> {
    let by_name = Key::named(param.name);
    let by_type = Key::Type {
        id: param.type_id,
        name: param.type_name,
    };

    [by_name, by_type]
        .iter()
        .filter_map(|key| scope.entry(key))
        .find(|entry| entry.value_type_id() == param.type_id)
        .map(|entry| entry.as_any())
        .ok_or_else(|| ResolveError::UnresolvedParameter {
            param: param.name.to_string(),
        })
}
