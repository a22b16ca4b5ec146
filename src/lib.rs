//! # stat_reconcile - derived-state reconciliation for narrative world documents
//!
//! A narrative engine rewrites a shared world-state document every turn. This
//! crate diffs the previous and new snapshots and patches the new one in place
//! with values the narrative engine should not have to compute itself:
//!
//! - **Off-screen health**: characters away from the scene decay, or recover
//!   when sheltered, in whole intervals of elapsed world time
//! - **Derived labels**: health status and relationship stage follow their
//!   numeric scores
//! - **Mission progress**: intel fragments feed goals, complete goals advance
//!   the stage, completed stages grant rewards
//!
//! A value the narrative engine set in the same update is never overwritten,
//! malformed input degrades to "no derived writes", and running a pass twice
//! writes nothing the second time.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use stat_reconcile::{InMemoryStateStore, Reconciler};
//!
//! let store = Arc::new(InMemoryStateStore::new());
//! let engine = Reconciler::new(store);
//!
//! let report = engine.reconcile(&old_document, &mut new_document);
//! for write in &report.writes {
//!     println!("{}: {:?} -> {}", write.path, write.before, write.after);
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

// Document primitives
pub mod error;
pub mod schema;
pub mod time;
pub mod value;

// Rules
pub mod character;
pub mod health;
pub mod shelter;

// Passes
pub mod config;
pub mod document;
pub mod engine;
pub mod mission;
pub mod settlement;
pub mod storage;

pub use character::{detect_touched, Character, RelationStage, TouchedFields};
pub use config::{DebugFlags, ReconcileSettings};
pub use document::{classify, CharacterPath, DocumentParts, FieldWrite, PatchSet, WriteGroup};
pub use engine::{ReconcileReport, Reconciler, UpdateListener};
pub use error::{CatalogError, ReconcileError, ReconcileResult, ScopeError, StoreError};
pub use health::{settle_health, HealthCause, HealthDelta, HealthRules, HealthStatus};
pub use mission::{MissionCatalog, MissionOutcome, MissionReport, MissionState};
pub use settlement::{CharacterReport, OffstageOutcome};
pub use shelter::{is_sheltered, Floor, RoomOccupancy, ShelterScope, ToggleOutcome};
pub use storage::{InMemoryStateStore, StateStore};
pub use time::{elapsed_hours, WorldClock};
