//! Typed mutation records. The only way store state ever changes.

use crate::signature::ArgSignature;
use crate::status::StatusState;
use chrono::Utc;
use platter_normal::{EntityMap, ResultRef};

/// One store mutation, dispatched by a generated action (or by the owner,
/// for `Clear`).
///
/// `source` is the operation key the mutation originates from; it scopes
/// result and status writes to that operation's slots.
#[derive(Debug, Clone, PartialEq)]
pub enum Mutation {
    /// Reset entities, results, and statuses to empty.
    Clear,
    /// Field-level merge of freshly normalized entity records.
    AddEntities {
        source: String,
        entities: EntityMap,
    },
    /// Record an operation completion for one argument signature.
    AddResult {
        source: String,
        signature: ArgSignature,
        result: ResultRef,
    },
    /// Enter a lifecycle state for one argument signature.
    SetStatus {
        source: String,
        signature: ArgSignature,
        state: StatusState,
        updated_at: i64,
        error: Option<String>,
    },
}

impl Mutation {
    pub fn add_entities(source: impl Into<String>, entities: EntityMap) -> Self {
        Self::AddEntities {
            source: source.into(),
            entities,
        }
    }

    pub fn add_result(
        source: impl Into<String>,
        signature: ArgSignature,
        result: ResultRef,
    ) -> Self {
        Self::AddResult {
            source: source.into(),
            signature,
            result,
        }
    }

    /// Status write stamped with the current wall clock, so `reduce`
    /// itself never reads a clock.
    pub fn set_status(
        source: impl Into<String>,
        signature: ArgSignature,
        state: StatusState,
        error: Option<String>,
    ) -> Self {
        Self::SetStatus {
            source: source.into(),
            signature,
            state,
            updated_at: Utc::now().timestamp_millis(),
            error,
        }
    }
}
