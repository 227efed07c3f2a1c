//! Static schema configuration: one descriptor per remote operation.

use crate::mapper::DataSpec;
use crate::transport::{Method, RequestConfig};
use platter_normal::{ResultRef, Shape};
use serde_json::Value;
use std::collections::BTreeMap;
use std::rc::Rc;

/// Maps call arguments to a URL.
pub type UrlFn = Rc<dyn Fn(&[Value]) -> String>;
/// Projects call arguments to a result ref already cached by another
/// operation.
pub type SelectsFn = Rc<dyn Fn(&[Value]) -> Option<ResultRef>>;
/// Transforms the denormalized value before the selector returns it.
pub type ReturnsFn = Rc<dyn Fn(Value) -> Value>;
/// Rewrites the outgoing request configuration immediately before
/// dispatch (auth headers and the like).
pub type PreReqFn = Rc<dyn Fn(RequestConfig) -> RequestConfig>;

/// Where an operation's URL comes from.
#[derive(Clone)]
pub enum UrlSpec {
    Fixed(String),
    Computed(UrlFn),
}

impl UrlSpec {
    pub fn computed(url: impl Fn(&[Value]) -> String + 'static) -> Self {
        Self::Computed(Rc::new(url))
    }

    pub fn resolve(&self, args: &[Value]) -> String {
        match self {
            Self::Fixed(url) => url.clone(),
            Self::Computed(url) => url(args),
        }
    }
}

impl std::fmt::Debug for UrlSpec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Fixed(url) => f.debug_tuple("Fixed").field(url).finish(),
            Self::Computed(_) => f.write_str("Computed(..)"),
        }
    }
}

impl From<&str> for UrlSpec {
    fn from(url: &str) -> Self {
        Self::Fixed(url.to_string())
    }
}

impl From<String> for UrlSpec {
    fn from(url: String) -> Self {
        Self::Fixed(url)
    }
}

/// Immutable configuration for one remote operation.
#[derive(Clone)]
pub struct OperationDescriptor {
    pub url: UrlSpec,
    pub method: Method,
    pub data: DataSpec,
    pub headers: BTreeMap<String, String>,
    /// Response shape; falls back to the entity's shape, then `Unit`.
    pub shape: Option<Shape>,
    pub selects: Option<SelectsFn>,
    pub returns: Option<ReturnsFn>,
    pub pre_req: Option<PreReqFn>,
}

impl OperationDescriptor {
    /// Descriptor with the given URL, `GET`, no body, no headers.
    pub fn new(url: impl Into<UrlSpec>) -> Self {
        Self {
            url: url.into(),
            method: Method::default(),
            data: DataSpec::default(),
            headers: BTreeMap::new(),
            shape: None,
            selects: None,
            returns: None,
            pre_req: None,
        }
    }

    #[must_use]
    pub fn method(mut self, method: Method) -> Self {
        self.method = method;
        self
    }

    #[must_use]
    pub fn data(mut self, data: DataSpec) -> Self {
        self.data = data;
        self
    }

    #[must_use]
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    #[must_use]
    pub fn shape(mut self, shape: Shape) -> Self {
        self.shape = Some(shape);
        self
    }

    #[must_use]
    pub fn selects(mut self, selects: impl Fn(&[Value]) -> Option<ResultRef> + 'static) -> Self {
        self.selects = Some(Rc::new(selects));
        self
    }

    #[must_use]
    pub fn returns(mut self, returns: impl Fn(Value) -> Value + 'static) -> Self {
        self.returns = Some(Rc::new(returns));
        self
    }

    #[must_use]
    pub fn pre_req(mut self, pre_req: impl Fn(RequestConfig) -> RequestConfig + 'static) -> Self {
        self.pre_req = Some(Rc::new(pre_req));
        self
    }
}

/// All operations of one entity type, plus its default response shape.
#[derive(Clone, Default)]
pub struct EntityDescriptor {
    pub operations: BTreeMap<String, OperationDescriptor>,
    pub shape: Option<Shape>,
}

impl EntityDescriptor {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn shape(mut self, shape: Shape) -> Self {
        self.shape = Some(shape);
        self
    }

    #[must_use]
    pub fn operation(mut self, name: impl Into<String>, descriptor: OperationDescriptor) -> Self {
        self.operations.insert(name.into(), descriptor);
        self
    }
}

/// The full declarative schema: entity type → operations.
#[derive(Clone, Default)]
pub struct Schema {
    pub entities: BTreeMap<String, EntityDescriptor>,
}

impl Schema {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn entity(mut self, name: impl Into<String>, descriptor: EntityDescriptor) -> Self {
        self.entities.insert(name.into(), descriptor);
        self
    }
}
