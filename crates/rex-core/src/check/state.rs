//! Check lifecycle: Pending → Fetching → Complete → ProbesSpawned.

use serde::Serialize;
use thiserror::Error;

/// Where a check is in its lifecycle. States only move forward.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CheckState {
    /// Created and possibly queued, request not yet handed to the fetcher.
    #[default]
    Pending,
    /// Request submitted; links may still be observed.
    Fetching,
    /// Response (or failure) fully available.
    Complete,
    /// Active probes have been planned and enqueued for this check.
    ProbesSpawned,
}

/// Rejected lifecycle transition (e.g. a second completion for the same check).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("invalid check transition {from:?} -> {to:?}")]
pub struct StateError {
    pub from: CheckState,
    pub to: CheckState,
}

impl CheckState {
    /// True once the response is complete, whether or not probes were spawned.
    pub fn is_done(self) -> bool {
        matches!(self, CheckState::Complete | CheckState::ProbesSpawned)
    }

    /// Returns the new state if `self -> to` is allowed.
    ///
    /// `Pending -> Complete` is allowed so a check can be failed before it was
    /// ever started (aborted run, request rejected by the fetcher).
    pub fn transition(self, to: CheckState) -> Result<CheckState, StateError> {
        use CheckState::*;
        match (self, to) {
            (Pending, Fetching)
            | (Pending, Complete)
            | (Fetching, Complete)
            | (Complete, ProbesSpawned) => Ok(to),
            _ => Err(StateError { from: self, to }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn forward_transitions_allowed() {
        let s = CheckState::Pending;
        let s = s.transition(CheckState::Fetching).unwrap();
        let s = s.transition(CheckState::Complete).unwrap();
        let s = s.transition(CheckState::ProbesSpawned).unwrap();
        assert_eq!(s, CheckState::ProbesSpawned);
        assert!(s.is_done());
    }

    #[test]
    fn second_completion_rejected() {
        let err = CheckState::Complete
            .transition(CheckState::Complete)
            .unwrap_err();
        assert_eq!(err.from, CheckState::Complete);
        assert!(CheckState::ProbesSpawned
            .transition(CheckState::Complete)
            .is_err());
    }

    #[test]
    fn probes_spawned_only_from_complete() {
        assert!(CheckState::Pending
            .transition(CheckState::ProbesSpawned)
            .is_err());
        assert!(CheckState::Fetching
            .transition(CheckState::ProbesSpawned)
            .is_err());
        assert!(CheckState::ProbesSpawned
            .transition(CheckState::ProbesSpawned)
            .is_err());
    }

    #[test]
    fn never_moves_backwards() {
        assert!(CheckState::Fetching.transition(CheckState::Pending).is_err());
        assert!(CheckState::Complete.transition(CheckState::Fetching).is_err());
        assert!(!CheckState::Fetching.is_done());
    }
}
