//! # platter-store
//!
//! The normalized store behind every generated action and selector.
//!
//! This crate provides:
//! - `StoreState` (entities, results, statuses — three independent maps)
//! - `Mutation` records and the pure `reduce` entry point
//! - `Store` (shared single-threaded handle: dispatch + read)
//! - `ArgSignature` (canonical cache key for an argument list)
//! - `StatusRecord` / `StatusState` (request lifecycle tracking)
//!
//! All state changes flow through `reduce`, which always runs
//! synchronously and to completion. The store is built for one logical
//! thread: no locks, interior mutability only.

pub mod mutation;
pub mod signature;
pub mod state;
pub mod status;
pub mod store;

pub use mutation::Mutation;
pub use signature::ArgSignature;
pub use state::{StoreState, reduce};
pub use status::{StatusRecord, StatusState};
pub use store::Store;
