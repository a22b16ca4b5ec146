//! Main-quest progression.
//!
//! Stages form a fixed, forward-only list described by a [`MissionCatalog`].
//! Each pass seeds intel fragments on first sight, mirrors completed intel
//! into the linked goal, recomputes goal completion, and advances the stage
//! once every goal is complete, granting the completed stage's rewards.

mod catalog;
mod settle;
mod state;

pub use catalog::{GoalDef, MissionCatalog, RewardGrant, StageDef, StageLookup, BUILTIN_MISSION_CATALOG};
pub use settle::{settle_mission, MissionOutcome, MissionReport};
pub use state::{Goal, IntelFragment, IntelStatus, MissionState};
