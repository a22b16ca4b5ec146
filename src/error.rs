//! Error types for the reconciliation engine.
//!
//! A reconcile pass itself never fails: malformed documents degrade to
//! "no derived writes this round". The errors below cover the surfaces around
//! the pass: shelter-scope edits, the persisted state store, and mission
//! catalogue loading. All of them are strongly typed using thiserror so hosts
//! can match on the exact condition (e.g. to show a toast).

use std::path::PathBuf;

use thiserror::Error;

use crate::shelter::Floor;

/// Failures when editing the shelter scope.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ScopeError {
    #[error("Floor {floor} is locked at shelter level {level}")]
    FloorLocked {
        floor: Floor,
        level: i64,
    },

    #[error("Room {room} is the shelter core and is always sheltered")]
    AnchorRoom {
        room: String,
    },

    #[error("Floor {floor} shelter scope is full ({capacity} rooms)")]
    CapacityExceeded {
        floor: Floor,
        capacity: usize,
    },

    #[error("Room number cannot be empty")]
    EmptyRoom,
}

/// Errors raised by a `StateStore` backend.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("State store backend error: {0}")]
    Backend(String),

    #[error("Invalid store path: '{0}'")]
    InvalidPath(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Errors loading or validating a mission catalogue.
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("Failed to read mission catalogue {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse mission catalogue: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Mission catalogue has no stages")]
    NoStages,

    #[error("Duplicate stage name: {name}")]
    DuplicateStage {
        name: String,
    },

    #[error("Stage '{stage}' declares goal '{goal}' twice")]
    DuplicateGoal {
        stage: String,
        goal: String,
    },

    #[error("Stage '{stage}' goal '{goal}' has negative target {target}")]
    NegativeTarget {
        stage: String,
        goal: String,
        target: f64,
    },

    #[error("Duplicate intel fragment id: {id}")]
    DuplicateIntel {
        id: String,
    },
}

/// Top-level error type for the crate.
#[derive(Debug, Error)]
pub enum ReconcileError {
    #[error("Shelter scope error: {0}")]
    Scope(#[from] ScopeError),

    #[error("State store error: {0}")]
    Store(#[from] StoreError),

    #[error("Mission catalogue error: {0}")]
    Catalog(#[from] CatalogError),
}

impl ReconcileError {
    /// Returns true if this is a shelter scope error.
    #[must_use]
    pub const fn is_scope(&self) -> bool {
        matches!(self, Self::Scope(_))
    }

    /// Returns true if this is a state store error.
    #[must_use]
    pub const fn is_store(&self) -> bool {
        matches!(self, Self::Store(_))
    }

    /// Returns true if this is a catalogue error.
    #[must_use]
    pub const fn is_catalog(&self) -> bool {
        matches!(self, Self::Catalog(_))
    }

    /// Returns true if the failure is a user-facing policy refusal
    /// (the host should surface it as a notification, not as a fault).
    #[must_use]
    pub const fn is_user_facing(&self) -> bool {
        matches!(self, Self::Scope(_))
    }
}

/// Result type alias for crate operations.
pub type ReconcileResult<T> = Result<T, ReconcileError>;
