//! Typed view of the `主线任务` sub-document.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::mission::catalog::StageDef;
use crate::schema::mission as field;
use crate::value::{as_text, number_or_zero, number_value};

/// Exploration state of an intel fragment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum IntelStatus {
    /// Not yet looked into.
    #[serde(rename = "未探索")]
    Unexplored,
    /// Looked into, not resolved.
    #[serde(rename = "已探索")]
    Explored,
    /// Resolved; counts toward the intel goal.
    #[serde(rename = "已完成")]
    Completed,
}

/// One intel fragment record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IntelFragment {
    /// Fragment id, also its key in `情报碎片`.
    #[serde(rename = "编号")]
    pub id: String,
    /// What the fragment is about.
    #[serde(rename = "描述")]
    pub description: String,
    /// Reward text.
    #[serde(rename = "价值")]
    pub value: String,
    /// Risk text.
    #[serde(rename = "风险")]
    pub risk: String,
    /// Exploration state.
    #[serde(rename = "状态")]
    pub status: IntelStatus,
}

impl IntelFragment {
    /// Reads only the status of a stored fragment; unknown statuses are `None`.
    #[must_use]
    pub fn status_of(value: &Value) -> Option<IntelStatus> {
        value
            .get("状态")
            .and_then(|status| serde_json::from_value(status.clone()).ok())
    }
}

/// One goal as found in the document.
#[derive(Debug, Clone, PartialEq)]
pub struct Goal {
    /// Map key, or the decimal index when goals are stored as an array.
    pub key: String,
    /// `描述` text.
    pub description: String,
    /// `当前值`, non-numeric reads as 0.
    pub current: f64,
    /// `目标值`, non-numeric reads as 0.
    pub target: f64,
}

impl Goal {
    fn from_value(key: String, raw: &Value) -> Self {
        Self {
            key,
            description: as_text(raw.get(field::GOAL_DESCRIPTION)),
            current: number_or_zero(raw.get(field::GOAL_CURRENT)),
            target: number_or_zero(raw.get(field::GOAL_TARGET)),
        }
    }

    /// A goal with a non-positive target is never complete.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.target > 0.0 && self.current >= self.target
    }
}

/// Mission progress read from a document.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MissionState {
    /// Current stage name; empty if missing.
    pub stage: String,
    /// Goals of the current stage, in document order.
    pub goals: Vec<Goal>,
    /// True if `情报碎片` is a non-empty object.
    pub has_intel: bool,
    /// Fragments whose status is `已完成`.
    pub completed_intel: usize,
}

impl MissionState {
    /// Reads the mission object. Malformed parts read as empty.
    #[must_use]
    pub fn from_value(mission: &Value) -> Self {
        let goals = match mission.get(field::GOALS) {
            Some(Value::Object(map)) => map
                .iter()
                .map(|(key, raw)| Goal::from_value(key.clone(), raw))
                .collect(),
            Some(Value::Array(items)) => items
                .iter()
                .enumerate()
                .map(|(idx, raw)| Goal::from_value(idx.to_string(), raw))
                .collect(),
            _ => Vec::new(),
        };

        let (has_intel, completed_intel) = match mission.get(field::INTEL) {
            Some(Value::Object(map)) if !map.is_empty() => {
                let completed = map
                    .values()
                    .filter(|fragment| IntelFragment::status_of(fragment) == Some(IntelStatus::Completed))
                    .count();
                (true, completed)
            }
            _ => (false, 0),
        };

        Self {
            stage: as_text(mission.get(field::STAGE)),
            goals,
            has_intel,
            completed_intel,
        }
    }

    /// Number of complete goals.
    #[must_use]
    pub fn completed_goals(&self) -> usize {
        self.goals.iter().filter(|goal| goal.is_complete()).count()
    }

    /// True if there is at least one goal and every goal is complete.
    #[must_use]
    pub fn all_complete(&self) -> bool {
        !self.goals.is_empty() && self.goals.iter().all(Goal::is_complete)
    }

    /// Completion map keyed by goal position.
    #[must_use]
    pub fn completion_map(&self) -> Value {
        let map: Map<String, Value> = self
            .goals
            .iter()
            .enumerate()
            .map(|(idx, goal)| (idx.to_string(), Value::Bool(goal.is_complete())))
            .collect();
        Value::Object(map)
    }
}

/// Goals record for a freshly entered stage, every current value at 0.
#[must_use]
pub fn stage_goals_value(stage: &StageDef) -> Value {
    let map: Map<String, Value> = stage
        .goals
        .iter()
        .map(|goal| {
            let mut record = Map::new();
            record.insert(field::GOAL_DESCRIPTION.to_string(), Value::String(goal.description.clone()));
            record.insert(field::GOAL_CURRENT.to_string(), Value::from(0));
            record.insert(field::GOAL_TARGET.to_string(), number_value(goal.target));
            (goal.key.clone(), Value::Object(record))
        })
        .collect();
    Value::Object(map)
}

/// All-false completion map for a freshly entered stage.
#[must_use]
pub fn fresh_completion_value(stage: &StageDef) -> Value {
    let map: Map<String, Value> = (0..stage.goals.len())
        .map(|idx| (idx.to_string(), Value::Bool(false)))
        .collect();
    Value::Object(map)
}

/// Intel record keyed by fragment id.
#[must_use]
pub fn intel_value(fragments: &[IntelFragment]) -> Value {
    let map: Map<String, Value> = fragments
        .iter()
        .filter_map(|fragment| Some((fragment.id.clone(), serde_json::to_value(fragment).ok()?)))
        .collect();
    Value::Object(map)
}
