use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::state::IntegrityError;

/// What kind of registry or snapshot entry a lookup missed.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum LookupKind {
    Pile,
    Card,
    Tableau,
}

impl LookupKind {
    pub const fn as_str(&self) -> &'static str {
        match self {
            LookupKind::Pile => "pile",
            LookupKind::Card => "card",
            LookupKind::Tableau => "tableau",
        }
    }
}

impl std::fmt::Display for LookupKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Errors raised by the engine.
///
/// `is_valid` swallows all of these into `false`. `make` propagates them, and
/// `UnresolvedOutcome` is always treated as a broken invariant.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Error)]
#[serde(tag = "type")]
pub enum EngineError {
    #[error("{kind} {id} not found")]
    NotFound { kind: LookupKind, id: String },

    #[error("invalid operation: {reason}")]
    InvalidOperation { reason: String },

    #[error("rule `{rule}` failed: {reason}")]
    Rule { rule: String, reason: String },

    #[error("attack resolution not determined (code {code})")]
    UnresolvedOutcome { code: i8 },

    #[error("state integrity violated: {error}")]
    Integrity { error: IntegrityError },

    #[error("configuration error: {reason}")]
    Config { reason: String },
}

impl EngineError {
    pub fn pile_not_found(id: impl Into<String>) -> Self {
        EngineError::NotFound {
            kind: LookupKind::Pile,
            id: id.into(),
        }
    }

    pub fn card_not_found(id: impl Into<String>) -> Self {
        EngineError::NotFound {
            kind: LookupKind::Card,
            id: id.into(),
        }
    }

    pub fn invalid(reason: impl Into<String>) -> Self {
        EngineError::InvalidOperation {
            reason: reason.into(),
        }
    }
}

impl From<IntegrityError> for EngineError {
    fn from(error: IntegrityError) -> Self {
        EngineError::Integrity { error }
    }
}

impl From<serde_json::Error> for EngineError {
    fn from(error: serde_json::Error) -> Self {
        EngineError::Config {
            reason: error.to_string(),
        }
    }
}

pub type EngineResult<T> = Result<T, EngineError>;
