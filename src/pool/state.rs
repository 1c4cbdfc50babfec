//! Worker lifecycle state machine
//!
//! ```text
//!            Withdraw(shard)             Merge
//!   Running ─────────────────▶ Processing ─────▶ Merging
//!     ▲  │                        │                │
//!     │  │ Close                  │ Fail           │ Done
//!     │  ▼                        ▼                │
//!     │ Terminated             Running ◀───────────┘
//!     └────────────────────────────┘
//! ```
//!
//! A failed shard goes straight back to `Running`; only a successfully
//! counted shard passes through `Merging`. `Terminated` is final.

use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WorkerState {
    Running,
    Processing { shard: String },
    Merging { shard: String },
    Terminated,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WorkerTransition {
    Withdraw { shard: String },
    Merge,
    Fail,
    Done,
    Close,
}

#[derive(Debug, thiserror::Error)]
pub enum StateError {
    #[error("Invalid worker transition from {from} with {transition:?}")]
    InvalidTransition {
        from: WorkerState,
        transition: WorkerTransition,
    },
}

impl fmt::Display for WorkerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WorkerState::Running => f.write_str("Running"),
            WorkerState::Processing { shard } => write!(f, "Processing({shard})"),
            WorkerState::Merging { shard } => write!(f, "Merging({shard})"),
            WorkerState::Terminated => f.write_str("Terminated"),
        }
    }
}

/// Apply a transition, rejecting anything outside the diagram above.
pub fn apply_transition(
    state: WorkerState,
    transition: WorkerTransition,
) -> Result<WorkerState, StateError> {
    match (state, transition) {
        (WorkerState::Running, WorkerTransition::Withdraw { shard }) => {
            Ok(WorkerState::Processing { shard })
        }
        (WorkerState::Running, WorkerTransition::Close) => Ok(WorkerState::Terminated),
        (WorkerState::Processing { shard }, WorkerTransition::Merge) => {
            Ok(WorkerState::Merging { shard })
        }
        (WorkerState::Processing { .. }, WorkerTransition::Fail) => Ok(WorkerState::Running),
        (WorkerState::Merging { .. }, WorkerTransition::Done) => Ok(WorkerState::Running),
        (from, transition) => Err(StateError::InvalidTransition { from, transition }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn withdraw(name: &str) -> WorkerTransition {
        WorkerTransition::Withdraw {
            shard: name.to_string(),
        }
    }

    #[test]
    fn test_successful_cycle_returns_to_running() {
        let state = apply_transition(WorkerState::Running, withdraw("a")).unwrap();
        assert_eq!(
            state,
            WorkerState::Processing {
                shard: "a".to_string()
            }
        );
        let state = apply_transition(state, WorkerTransition::Merge).unwrap();
        assert_eq!(state.to_string(), "Merging(a)");
        let state = apply_transition(state, WorkerTransition::Done).unwrap();
        assert_eq!(state, WorkerState::Running);
    }

    #[test]
    fn test_failed_shard_skips_merging() {
        let state = apply_transition(WorkerState::Running, withdraw("bad")).unwrap();
        let state = apply_transition(state, WorkerTransition::Fail).unwrap();
        assert_eq!(state, WorkerState::Running);
    }

    #[test]
    fn test_close_terminates_only_from_running() {
        let state = apply_transition(WorkerState::Running, WorkerTransition::Close).unwrap();
        assert_eq!(state, WorkerState::Terminated);

        let processing = WorkerState::Processing {
            shard: "a".to_string(),
        };
        assert!(apply_transition(processing, WorkerTransition::Close).is_err());
    }

    #[test]
    fn test_terminated_is_final() {
        for transition in [
            withdraw("a"),
            WorkerTransition::Merge,
            WorkerTransition::Fail,
            WorkerTransition::Done,
            WorkerTransition::Close,
        ] {
            assert!(apply_transition(WorkerState::Terminated, transition).is_err());
        }
    }
}
