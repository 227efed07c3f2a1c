//! The argument mapper: how a descriptor's `data` policy turns call
//! arguments into a request body.

use crate::error::EngineError;
use serde_json::Value;
use std::rc::Rc;

/// Computes a request body from the full argument list.
pub type DataFn = Rc<dyn Fn(&[Value]) -> Result<Value, EngineError>>;

/// How an operation derives its request body from call arguments.
///
/// The four policies are an exhaustive tagged variant; unsupported
/// descriptor kinds are unrepresentable by construction.
#[derive(Clone, Default)]
pub enum DataSpec {
    /// No request body.
    #[default]
    None,
    /// Use the call argument at this zero-based index.
    ByIndex(usize),
    /// The first call argument must be an object; extract this property.
    ByProperty(String),
    /// Invoke with the full argument list; the return value is the body.
    Computed(DataFn),
}

impl DataSpec {
    /// Resolve against a concrete argument list.
    ///
    /// Failures are `Argument` errors, raised before any store mutation
    /// or transport call. `Computed` propagates its own error as-is.
    pub fn resolve(&self, operation: &str, args: &[Value]) -> Result<Option<Value>, EngineError> {
        match self {
            Self::None => Ok(None),
            Self::Computed(compute) => compute(args).map(Some),
            Self::ByIndex(index) => args.get(*index).cloned().map(Some).ok_or_else(|| {
                EngineError::argument(format!(
                    "{operation}: data index {index} requires at least {} arguments",
                    index + 1
                ))
            }),
            Self::ByProperty(name) => {
                let first = args
                    .first()
                    .and_then(Value::as_object)
                    .ok_or_else(|| {
                        EngineError::argument(format!(
                            "{operation}: data property `{name}` requires an object as the first argument"
                        ))
                    })?;
                first.get(name).cloned().map(Some).ok_or_else(|| {
                    EngineError::argument(format!(
                        "{operation}: first argument is missing property `{name}`"
                    ))
                })
            }
        }
    }
}

impl std::fmt::Debug for DataSpec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::None => f.write_str("None"),
            Self::ByIndex(index) => f.debug_tuple("ByIndex").field(index).finish(),
            Self::ByProperty(name) => f.debug_tuple("ByProperty").field(name).finish(),
            Self::Computed(_) => f.write_str("Computed(..)"),
        }
    }
}
