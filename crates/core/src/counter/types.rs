//! Counter state and snapshot types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Persisted counter state.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CounterState {
    pub queued_count: u64,
    pub completed_count: u64,
}

/// Point-in-time view of the counter, handed to callers and subscribers.
///
/// Serializes with camelCase keys; this is the wire form pushed to clients.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CounterSnapshot {
    pub queued_count: u64,
    pub completed_count: u64,
    pub timestamp: DateTime<Utc>,
}

impl CounterSnapshot {
    /// Build a snapshot of `state` stamped with `timestamp`.
    pub fn of(state: &CounterState, timestamp: DateTime<Utc>) -> Self {
        Self {
            queued_count: state.queued_count,
            completed_count: state.completed_count,
            timestamp,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_state_defaults_to_zero() {
        let state = CounterState::default();
        assert_eq!(state.queued_count, 0);
        assert_eq!(state.completed_count, 0);
    }

    #[test]
    fn test_snapshot_wire_format() {
        let snapshot = CounterSnapshot::of(
            &CounterState {
                queued_count: 3,
                completed_count: 7,
            },
            Utc::now(),
        );

        let json = serde_json::to_string(&snapshot).unwrap();
        assert!(json.contains("\"queuedCount\":3"));
        assert!(json.contains("\"completedCount\":7"));
        assert!(json.contains("\"timestamp\""));
    }
}
