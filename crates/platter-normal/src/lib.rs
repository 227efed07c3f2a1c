//! # platter-normal
//!
//! Shape descriptors and entity normalization for the platter cache.
//!
//! This crate provides:
//! - `Shape` / `EntityShape` (response shape descriptors)
//! - `EntityMap` (type → id → record) and field-level merge
//! - `normalize` / `denormalize` between nested payloads and entity refs
//!
//! It intentionally knows nothing about requests, statuses, or scheduling.
//! Those concerns live in `platter-store` and `platter-engine`.
//!
//! ## Data model
//!
//! ```text
//! nested payload (serde_json::Value)
//!     ↕  normalize / denormalize
//! EntityMap + ResultRef (flat records, refs in place of nesting)
//! ```

pub mod entity;
pub mod normalize;
pub mod shape;

pub use entity::{EntityId, EntityMap, merge_entities};
pub use normalize::{NormalizeError, Normalized, ResultRef, denormalize, normalize};
pub use shape::{EntityShape, Shape};
