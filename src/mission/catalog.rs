//! Mission catalogue: the fixed, ordered stage list.
//!
//! The builtin catalogue is embedded at compile time. Hosts running a
//! different scenario can load their own from JSON; loaded catalogues are
//! validated before use.

use std::collections::HashSet;
use std::fs;
use std::path::Path;
use std::sync::{Arc, OnceLock};

use serde::{Deserialize, Serialize};

use crate::error::CatalogError;
use crate::mission::state::IntelFragment;

/// Embedded builtin catalogue.
pub const BUILTIN_MISSION_CATALOG: &str = include_str!("../data/mission_catalog.json");

/// One goal of a stage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GoalDef {
    /// Key of the goal in the `阶段目标` map.
    pub key: String,
    /// Text written to `描述`.
    pub description: String,
    /// Value written to `目标值`.
    pub target: f64,
}

/// A named reward granted when a stage completes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RewardGrant {
    /// Key under `庇护所.庇护所能力`.
    pub name: String,
    /// Text written to `desc`.
    pub desc: String,
}

/// One mission stage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StageDef {
    /// Stage name as written to `当前阶段`.
    pub name: String,
    /// Goals entered with the stage.
    #[serde(default)]
    pub goals: Vec<GoalDef>,
    /// Rewards granted when the stage completes.
    #[serde(default)]
    pub rewards: Vec<RewardGrant>,
}

/// The ordered stage list plus intel defaults.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MissionCatalog {
    /// Catalogue format version.
    pub version: u32,
    /// Goal whose current value mirrors the completed intel count.
    pub intel_goal: String,
    /// Grant the final stage's rewards once all its goals complete.
    pub grant_rewards_on_final_stage: bool,
    /// Fragments seeded into an empty `情报碎片` map.
    pub default_intel: Vec<IntelFragment>,
    /// Stages in progression order.
    pub stages: Vec<StageDef>,
}

/// A stage and its successor.
#[derive(Debug, Clone, Copy)]
pub struct StageLookup<'a> {
    /// The matched stage.
    pub current: &'a StageDef,
    /// The stage after it, `None` for the final stage.
    pub next: Option<&'a StageDef>,
}

impl MissionCatalog {
    /// The embedded catalogue, parsed once.
    pub fn builtin() -> Arc<Self> {
        static BUILTIN: OnceLock<Arc<MissionCatalog>> = OnceLock::new();
        BUILTIN
            .get_or_init(|| {
                Arc::new(
                    Self::from_json_str(BUILTIN_MISSION_CATALOG)
                        .expect("builtin mission catalogue should parse"),
                )
            })
            .clone()
    }

    /// Parses and validates a catalogue.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError` if the JSON is malformed or fails validation.
    pub fn from_json_str(json: &str) -> Result<Self, CatalogError> {
        let mut catalog: MissionCatalog = serde_json::from_str(json)?;
        catalog.validate()?;
        Ok(catalog)
    }

    /// Reads a catalogue from disk.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::Read` if the file cannot be read, otherwise as
    /// [`MissionCatalog::from_json_str`].
    pub fn from_file(path: &Path) -> Result<Self, CatalogError> {
        let contents = fs::read_to_string(path).map_err(|source| CatalogError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&contents)
    }

    /// Finds a stage by exact name.
    #[must_use]
    pub fn stage(&self, name: &str) -> Option<StageLookup<'_>> {
        let idx = self.stages.iter().position(|stage| stage.name == name)?;
        Some(StageLookup {
            current: &self.stages[idx],
            next: self.stages.get(idx + 1),
        })
    }

    /// The first stage.
    #[must_use]
    pub fn first_stage(&self) -> Option<&StageDef> {
        self.stages.first()
    }

    fn validate(&mut self) -> Result<(), CatalogError> {
        if self.stages.is_empty() {
            return Err(CatalogError::NoStages);
        }

        let mut stage_names = HashSet::new();
        for stage in &mut self.stages {
            stage.name = stage.name.trim().to_string();
            if !stage_names.insert(stage.name.clone()) {
                return Err(CatalogError::DuplicateStage {
                    name: stage.name.clone(),
                });
            }
            let mut goal_keys = HashSet::new();
            for goal in &stage.goals {
                if !goal_keys.insert(goal.key.as_str()) {
                    return Err(CatalogError::DuplicateGoal {
                        stage: stage.name.clone(),
                        goal: goal.key.clone(),
                    });
                }
                if !goal.target.is_finite() || goal.target < 0.0 {
                    return Err(CatalogError::NegativeTarget {
                        stage: stage.name.clone(),
                        goal: goal.key.clone(),
                        target: goal.target,
                    });
                }
            }
        }

        let mut intel_ids = HashSet::new();
        for fragment in &self.default_intel {
            if !intel_ids.insert(fragment.id.as_str()) {
                return Err(CatalogError::DuplicateIntel {
                    id: fragment.id.clone(),
                });
            }
        }
        Ok(())
    }
}
