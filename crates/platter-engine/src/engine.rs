//! The schema interpreter and the generated operation surface.
//!
//! `Platter::new` walks a declarative schema and builds one registered
//! operation per `(entity type, operation name)`. Each operation is
//! reachable three ways:
//! - `call`: issue the request, update the store, return the outcome;
//! - `select`: read the cached value, lazily scheduling a fetch on miss;
//! - `status` + predicates: observe the request lifecycle, never fetch.

use crate::descriptor::{PreReqFn, ReturnsFn, Schema, SelectsFn, UrlSpec};
use crate::error::EngineError;
use crate::mapper::DataSpec;
use crate::transport::{Method, RequestConfig, Transport, TransportRequest};
use convert_case::{Case, Casing};
use platter_normal::{ResultRef, Shape, denormalize, normalize};
use platter_store::{ArgSignature, Mutation, StatusRecord, StatusState, Store, StoreState};
use serde_json::Value;
use std::collections::BTreeMap;
use std::future::Future;
use std::pin::Pin;
use std::rc::Rc;

/// How a completed action resolved.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    /// The payload was normalized and cached; this ref points into the
    /// store.
    Stored(ResultRef),
    /// Non-object, non-array payload: caller-visible, never cached.
    Passthrough(Value),
}

/// A request already recorded as `Processing`; await it to completion.
///
/// Dropping an `InFlight` without awaiting leaves the `Processing`
/// status stale.
pub type InFlight = Pin<Box<dyn Future<Output = Result<Outcome, EngineError>>>>;

/// One fully wired operation in the registry.
struct Operation {
    key: String,
    url: UrlSpec,
    method: Method,
    data: DataSpec,
    headers: BTreeMap<String, String>,
    shape: Shape,
    selects: Option<SelectsFn>,
    returns: Option<ReturnsFn>,
    pre_req: Option<PreReqFn>,
}

struct Inner {
    store: Store,
    transport: Rc<dyn Transport>,
    operations: BTreeMap<String, Rc<Operation>>,
}

/// The engine: an owned registry of operations over one shared store and
/// one transport. Cheap to clone; clones share state.
#[derive(Clone)]
pub struct Platter {
    inner: Rc<Inner>,
}

/// `camelCase(entity) + PascalCase(operation)`.
fn operation_key(entity: &str, operation: &str) -> String {
    let mut key = entity.to_case(Case::Camel);
    key.push_str(&operation.to_case(Case::Pascal));
    key
}

impl Platter {
    /// Interpret a schema into a registry.
    ///
    /// Operation keys must be unique across the whole schema; a
    /// collision would silently alias a cache slot, so it is rejected
    /// here.
    pub fn new(schema: Schema, transport: Rc<dyn Transport>) -> Result<Self, EngineError> {
        let mut operations = BTreeMap::new();
        for (entity_name, entity) in schema.entities {
            for (operation_name, descriptor) in entity.operations {
                let key = operation_key(&entity_name, &operation_name);
                if operations.contains_key(&key) {
                    return Err(EngineError::configuration(format!(
                        "operation key collision: `{entity_name}/{operation_name}` maps to `{key}`"
                    )));
                }
                let shape = descriptor
                    .shape
                    .or_else(|| entity.shape.clone())
                    .unwrap_or(Shape::Unit);
                operations.insert(
                    key.clone(),
                    Rc::new(Operation {
                        key,
                        url: descriptor.url,
                        method: descriptor.method,
                        data: descriptor.data,
                        headers: descriptor.headers,
                        shape,
                        selects: descriptor.selects,
                        returns: descriptor.returns,
                        pre_req: descriptor.pre_req,
                    }),
                );
            }
        }
        Ok(Self {
            inner: Rc::new(Inner {
                store: Store::new(),
                transport,
                operations,
            }),
        })
    }

    /// The shared store behind every operation.
    pub fn store(&self) -> &Store {
        &self.inner.store
    }

    /// Owned copy of the current store state, for selector reads.
    pub fn snapshot(&self) -> StoreState {
        self.inner.store.snapshot()
    }

    /// Clear entities, results, and statuses.
    pub fn reset(&self) {
        self.inner.store.dispatch(Mutation::Clear);
    }

    /// Registered operation keys, in order.
    pub fn operation_keys(&self) -> impl Iterator<Item = &str> {
        self.inner.operations.keys().map(String::as_str)
    }

    fn operation(&self, key: &str) -> Result<&Rc<Operation>, EngineError> {
        self.inner
            .operations
            .get(key)
            .ok_or_else(|| EngineError::configuration(format!("unknown operation `{key}`")))
    }

    /// Invoke an operation directly.
    ///
    /// URL and body resolve synchronously; configuration and argument
    /// failures return here with zero store mutation and zero transport
    /// calls. On success the `Processing` status is already recorded and
    /// the returned future drives the transport round trip. Direct calls
    /// always issue a request; deduplication happens only at the
    /// selector boundary.
    pub fn call(&self, key: &str, args: Vec<Value>) -> Result<InFlight, EngineError> {
        let operation = Rc::clone(self.operation(key)?);
        let url = operation.url.resolve(&args);
        let data = operation.data.resolve(&operation.key, &args)?;
        let signature = ArgSignature::of(&args);

        // Recorded before the transport suspension point: any read
        // between here and completion observes Processing.
        self.inner.store.dispatch(Mutation::set_status(
            operation.key.clone(),
            signature.clone(),
            StatusState::Processing,
            None,
        ));

        let mut config = RequestConfig {
            headers: operation.headers.clone(),
        };
        if let Some(pre_req) = &operation.pre_req {
            config = pre_req(config);
        }
        let request = TransportRequest {
            method: operation.method,
            url,
            body: if operation.method.takes_body() {
                data
            } else {
                None
            },
            config,
        };

        let inner = Rc::clone(&self.inner);
        Ok(Box::pin(async move {
            complete(inner, operation, signature, request).await
        }))
    }

    /// Read the current value of an operation for these arguments.
    ///
    /// Never mutates the store synchronously. On a cache miss while the
    /// request is not in flight, a fetch is scheduled on a later turn of
    /// the task queue (the caller must be inside a `tokio::task::LocalSet`);
    /// its outcome and any error are discarded.
    pub fn select(
        &self,
        state: &StoreState,
        key: &str,
        args: &[Value],
    ) -> Result<Option<Value>, EngineError> {
        let operation = self.operation(key)?;
        let signature = ArgSignature::of(args);
        let cached = state.result(&operation.key, &signature);
        let in_flight =
            state.status_state(&operation.key, &signature) == Some(StatusState::Processing);

        if cached.is_none() && !in_flight {
            self.schedule_fetch(operation, args.to_vec(), signature.clone());
        }

        // Absent (or failed) results can still be served from entities
        // another operation already cached.
        let mut result = cached.cloned();
        if matches!(result, None | Some(ResultRef::Null)) {
            if let Some(selects) = &operation.selects {
                result = selects(args);
            }
        }
        let Some(result) = result else {
            return Ok(None);
        };

        let value = denormalize(&result, &operation.shape, &state.entities);
        Ok(match (value, &operation.returns) {
            (Some(value), Some(returns)) => Some(returns(value)),
            (value, _) => value,
        })
    }

    /// Status record for `(operation, arguments)`. Never fetches.
    pub fn status(
        &self,
        state: &StoreState,
        key: &str,
        args: &[Value],
    ) -> Result<Option<StatusRecord>, EngineError> {
        let operation = self.operation(key)?;
        Ok(state.status(&operation.key, &ArgSignature::of(args)).cloned())
    }

    pub fn is_processing(
        &self,
        state: &StoreState,
        key: &str,
        args: &[Value],
    ) -> Result<bool, EngineError> {
        self.status_is(state, key, args, StatusState::Processing)
    }

    pub fn is_success(
        &self,
        state: &StoreState,
        key: &str,
        args: &[Value],
    ) -> Result<bool, EngineError> {
        self.status_is(state, key, args, StatusState::Success)
    }

    pub fn is_error(
        &self,
        state: &StoreState,
        key: &str,
        args: &[Value],
    ) -> Result<bool, EngineError> {
        self.status_is(state, key, args, StatusState::Error)
    }

    fn status_is(
        &self,
        state: &StoreState,
        key: &str,
        args: &[Value],
        expected: StatusState,
    ) -> Result<bool, EngineError> {
        let operation = self.operation(key)?;
        Ok(state.status_state(&operation.key, &ArgSignature::of(args)) == Some(expected))
    }

    /// Defer a fetch to a later turn, then re-check live status before
    /// issuing it. The first deferred task records `Processing`
    /// synchronously, so a second task scheduled in the same turn
    /// usually sees it and backs off.
    fn schedule_fetch(&self, operation: &Rc<Operation>, args: Vec<Value>, signature: ArgSignature) {
        let inner = Rc::clone(&self.inner);
        let operation = Rc::clone(operation);
        tracing::debug!(
            operation = %operation.key,
            signature = %signature,
            "scheduling deferred fetch"
        );
        tokio::task::spawn_local(async move {
            let live = {
                let state = inner.store.read();
                state.status_state(&operation.key, &signature)
            };
            if live == Some(StatusState::Processing) {
                tracing::debug!(operation = %operation.key, "fetch already in flight, skipping");
                return;
            }
            let engine = Platter { inner };
            match engine.call(&operation.key, args) {
                // Selectors are silent: outcome and error both discarded.
                Ok(in_flight) => {
                    let _ = in_flight.await;
                }
                Err(err) => {
                    tracing::debug!(operation = %operation.key, error = %err, "deferred fetch not issued");
                }
            }
        });
    }
}

async fn complete(
    inner: Rc<Inner>,
    operation: Rc<Operation>,
    signature: ArgSignature,
    request: TransportRequest,
) -> Result<Outcome, EngineError> {
    tracing::debug!(
        operation = %operation.key,
        method = request.method.as_str(),
        url = %request.url,
        "issuing transport request"
    );
    match inner.transport.invoke(request).await {
        Ok(reply) => {
            if reply.data.is_object() || reply.data.is_array() {
                let normalized = normalize(&reply.data, &operation.shape)?;
                inner
                    .store
                    .dispatch(Mutation::add_entities(operation.key.clone(), normalized.entities));
                inner.store.dispatch(Mutation::add_result(
                    operation.key.clone(),
                    signature.clone(),
                    normalized.result.clone(),
                ));
                inner.store.dispatch(Mutation::set_status(
                    operation.key.clone(),
                    signature,
                    StatusState::Success,
                    None,
                ));
                Ok(Outcome::Stored(normalized.result))
            } else {
                // Cannot normalize a scalar body: pass it on, leaving
                // the Processing status stale and nothing cached.
                Ok(Outcome::Passthrough(reply.data))
            }
        }
        Err(err) => {
            tracing::warn!(operation = %operation.key, error = %err, "transport request failed");
            inner.store.dispatch(Mutation::add_result(
                operation.key.clone(),
                signature.clone(),
                ResultRef::Null,
            ));
            inner.store.dispatch(Mutation::set_status(
                operation.key.clone(),
                signature,
                StatusState::Error,
                Some(err.message.clone()),
            ));
            Err(EngineError::Transport(err))
        }
    }
}
