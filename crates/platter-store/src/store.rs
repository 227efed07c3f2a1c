//! Shared store handle for one logical thread.

use crate::mutation::Mutation;
use crate::state::{StoreState, reduce};
use std::cell::{Ref, RefCell};

/// Owns the store state; created once and shared by reference across
/// every generated action and selector closure.
///
/// Single-writer discipline: `dispatch` applies the reducer synchronously
/// and to completion before returning. Readers either borrow (`read`) or
/// take an owned copy (`snapshot`). Holding a `read` borrow across a
/// suspension point would make a later `dispatch` panic; prefer
/// `snapshot` in async contexts.
#[derive(Debug, Default)]
pub struct Store {
    state: RefCell<StoreState>,
}

impl Store {
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply one mutation through the reducer. Synchronous.
    pub fn dispatch(&self, mutation: Mutation) {
        reduce(&mut self.state.borrow_mut(), mutation);
    }

    /// Borrow the current state.
    pub fn read(&self) -> Ref<'_, StoreState> {
        self.state.borrow()
    }

    /// Owned copy of the current state.
    pub fn snapshot(&self) -> StoreState {
        self.state.borrow().clone()
    }
}
