//! # platter-engine
//!
//! The generation engine: a declarative schema in, a registry of callable
//! operations and memoized read-accessors out, all backed by one
//! normalized reducer-driven store.
//!
//! This crate provides:
//! - `Schema` / `OperationDescriptor` (static per-operation configuration)
//! - `DataSpec` (argument → request-body mapping policies)
//! - `Transport` (the network boundary; no HTTP ships here)
//! - `Platter` (the interpreter: `call`, `select`, `status` per operation)
//!
//! ## Data flow
//!
//! ```text
//! Schema → Platter::new → registry of operations
//!     select (read)  ──miss──▶ deferred call (fetch)
//!     call (fetch)   ──done──▶ store mutations
//!     status (observe) — never fetches
//! ```
//!
//! Everything runs on one logical thread; deferred fetches need a
//! `tokio::task::LocalSet`.

pub mod descriptor;
pub mod engine;
pub mod error;
pub mod mapper;
pub mod transport;

pub use descriptor::{
    EntityDescriptor, OperationDescriptor, PreReqFn, ReturnsFn, Schema, SelectsFn, UrlFn, UrlSpec,
};
pub use engine::{InFlight, Outcome, Platter};
pub use error::EngineError;
pub use mapper::{DataFn, DataSpec};
pub use transport::{
    Method, RequestConfig, Transport, TransportError, TransportReply, TransportRequest,
};
