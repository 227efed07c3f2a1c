//! Request lifecycle records.

use serde::{Deserialize, Serialize};

/// Lifecycle state of one `(operation, signature)` request.
///
/// Transitions are `absent → Processing → (Success | Error)`; any new
/// invocation re-enters `Processing`, even after a terminal state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum StatusState {
    Processing,
    Success,
    Error,
}

/// The full status record: state, wall-clock of the last transition, and
/// the failure message for `Error`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusRecord {
    pub state: StatusState,
    /// Milliseconds since the Unix epoch.
    pub updated_at: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl StatusRecord {
    pub fn is_processing(&self) -> bool {
        self.state == StatusState::Processing
    }

    pub fn is_success(&self) -> bool {
        self.state == StatusState::Success
    }

    pub fn is_error(&self) -> bool {
        self.state == StatusState::Error
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn predicates_match_state() {
        let record = StatusRecord {
            state: StatusState::Error,
            updated_at: 0,
            error: Some("boom".to_string()),
        };
        assert!(record.is_error());
        assert!(!record.is_processing());
        assert!(!record.is_success());
    }

    #[test]
    fn serializes_with_screaming_state() {
        let record = StatusRecord {
            state: StatusState::Processing,
            updated_at: 12,
            error: None,
        };
        let value = serde_json::to_value(&record).unwrap();
        assert_eq!(value, serde_json::json!({"state": "PROCESSING", "updated_at": 12}));
    }
}
