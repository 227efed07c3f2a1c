//! Store state and the pure reducer over it.

use crate::mutation::Mutation;
use crate::signature::ArgSignature;
use crate::status::{StatusRecord, StatusState};
use platter_normal::{EntityMap, ResultRef, merge_entities};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// The three independent maps behind the cache: normalized entities,
/// per-signature results, and per-signature statuses.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StoreState {
    pub entities: EntityMap,
    pub results: BTreeMap<String, BTreeMap<ArgSignature, ResultRef>>,
    pub statuses: BTreeMap<String, BTreeMap<ArgSignature, StatusRecord>>,
}

impl StoreState {
    /// Result recorded for `(operation, signature)`, if any completion
    /// has been observed.
    pub fn result(&self, source: &str, signature: &ArgSignature) -> Option<&ResultRef> {
        self.results.get(source)?.get(signature)
    }

    /// Status record for `(operation, signature)`.
    pub fn status(&self, source: &str, signature: &ArgSignature) -> Option<&StatusRecord> {
        self.statuses.get(source)?.get(signature)
    }

    /// Lifecycle state for `(operation, signature)`.
    pub fn status_state(&self, source: &str, signature: &ArgSignature) -> Option<StatusState> {
        self.status(source, signature).map(|record| record.state)
    }
}

/// The single mutation entry point. Runs synchronously to completion;
/// two reductions never interleave at the field level.
pub fn reduce(state: &mut StoreState, mutation: Mutation) {
    match mutation {
        Mutation::Clear => {
            *state = StoreState::default();
        }
        Mutation::AddEntities { entities, .. } => {
            merge_entities(&mut state.entities, entities);
        }
        Mutation::AddResult {
            source,
            signature,
            result,
        } => {
            state
                .results
                .entry(source)
                .or_default()
                .insert(signature, result);
        }
        Mutation::SetStatus {
            source,
            signature,
            state: status,
            updated_at,
            error,
        } => {
            // Whole-record last-write-wins: exactly one status per key.
            state.statuses.entry(source).or_default().insert(
                signature,
                StatusRecord {
                    state: status,
                    updated_at,
                    error,
                },
            );
        }
    }
}
