//! Load cycle state
//!
//! `Idle -> Loading -> {Rendered | Empty | Error}`; `Empty` and `Error`
//! go back to `Loading` on retry.

use serde::Serialize;
use std::fmt;

use crate::application::card_builder::ProductCard;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LoadState {
    Idle,
    Loading,
    Rendered,
    Empty,
    Error,
}

impl LoadState {
    pub fn can_retry(self) -> bool {
        matches!(self, Self::Empty | Self::Error)
    }
}

impl fmt::Display for LoadState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Idle => "idle",
            Self::Loading => "loading",
            Self::Rendered => "rendered",
            Self::Empty => "empty",
            Self::Error => "error",
        };
        f.write_str(name)
    }
}

/// Result of one load cycle as seen by its caller
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadOutcome {
    Rendered { generation: u64, cards: Vec<ProductCard> },
    Empty { generation: u64 },
    Failed { generation: u64, reason: String },
    /// A newer cycle started before this one finished; nothing was applied
    Superseded { generation: u64 },
}

impl LoadOutcome {
    pub fn generation(&self) -> u64 {
        match self {
            Self::Rendered { generation, .. }
            | Self::Empty { generation }
            | Self::Failed { generation, .. }
            | Self::Superseded { generation } => *generation,
        }
    }

    /// State this outcome moves the page into, if it was applied
    pub fn state(&self) -> Option<LoadState> {
        match self {
            Self::Rendered { .. } => Some(LoadState::Rendered),
            Self::Empty { .. } => Some(LoadState::Empty),
            Self::Failed { .. } => Some(LoadState::Error),
            Self::Superseded { .. } => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn retry_only_from_empty_or_error() {
        assert!(LoadState::Empty.can_retry());
        assert!(LoadState::Error.can_retry());
        assert!(!LoadState::Idle.can_retry());
        assert!(!LoadState::Loading.can_retry());
        assert!(!LoadState::Rendered.can_retry());
    }

    #[test]
    fn superseded_outcome_changes_nothing() {
        let outcome = LoadOutcome::Superseded { generation: 3 };
        assert_eq!(outcome.generation(), 3);
        assert_eq!(outcome.state(), None);
        assert_eq!(LoadOutcome::Empty { generation: 1 }.state(), Some(LoadState::Empty));
    }
}
