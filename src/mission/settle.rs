//! Mission settlement: intel seeding, intel-goal sync, goal completion and
//! forward-only stage advancement.

use serde::Serialize;
use serde_json::{Map, Value};

use crate::document::{PatchSet, WriteGroup};
use crate::mission::catalog::{MissionCatalog, StageDef, StageLookup};
use crate::mission::state::{fresh_completion_value, intel_value, stage_goals_value, MissionState};
use crate::schema::{self, mission as field};
use crate::value::{as_text, get_in, number_or_zero, number_value, split_path};

/// What the stage step concluded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum MissionOutcome {
    /// No mission object in the document.
    Absent,
    /// Goals remain open (or there are none).
    InProgress {
        /// Current stage name.
        stage: String,
        /// Goals already complete.
        completed: usize,
        /// Goals in the stage.
        total: usize,
    },
    /// The narrative engine moved the stage itself this round.
    StageChangedByNarrative {
        /// Stage in the previous document.
        from: String,
        /// Stage in the new document.
        to: String,
    },
    /// The stage is not in the catalogue; nothing was written.
    UnknownStage {
        /// The unmatched name.
        stage: String,
    },
    /// Moved to the next stage.
    Advanced {
        /// Completed stage.
        from: String,
        /// Stage now in effect.
        to: String,
        /// Rewards newly granted.
        rewards: Vec<String>,
    },
    /// Every goal of the last stage is complete.
    FinalStageComplete {
        /// Final stage name.
        stage: String,
        /// Rewards newly granted, if the catalogue allows it.
        rewards: Vec<String>,
    },
}

/// Everything the mission pass did.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MissionReport {
    /// Result of the stage step.
    pub outcome: MissionOutcome,
    /// Default intel fragments were written.
    pub intel_seeded: bool,
    /// The intel-linked goal's current value was rewritten.
    pub intel_synced: bool,
}

impl MissionReport {
    const fn absent() -> Self {
        Self {
            outcome: MissionOutcome::Absent,
            intel_seeded: false,
            intel_synced: false,
        }
    }
}

fn mission_state(doc: &Value) -> Option<MissionState> {
    doc.get(schema::MISSION)
        .filter(|mission| mission.is_object())
        .map(MissionState::from_value)
}

/// Runs the mission pass on the new document.
pub fn settle_mission(
    catalog: &MissionCatalog,
    old_doc: &Value,
    new_doc: &mut Value,
    patches: &mut PatchSet,
) -> MissionReport {
    let Some(state) = mission_state(new_doc) else {
        return MissionReport::absent();
    };
    let lookup = catalog.stage(&state.stage);
    if lookup.is_none() && !state.stage.is_empty() {
        tracing::warn!(
            target: "stat_reconcile::mission",
            stage = %state.stage,
            "mission.stage.unknown"
        );
        return MissionReport {
            outcome: MissionOutcome::UnknownStage { stage: state.stage },
            intel_seeded: false,
            intel_synced: false,
        };
    }

    let intel_seeded = !state.has_intel
        && !catalog.default_intel.is_empty()
        && patches.write(
            new_doc,
            &[schema::MISSION, field::INTEL],
            intel_value(&catalog.default_intel),
            WriteGroup::Mission,
        );

    let intel_synced = sync_intel_goal(catalog, new_doc, patches);

    let Some(state) = mission_state(new_doc) else {
        return MissionReport::absent();
    };
    if !state.goals.is_empty() {
        patches.write(
            new_doc,
            &[schema::MISSION, field::COMPLETION],
            state.completion_map(),
            WriteGroup::Mission,
        );
    }

    let outcome = advance_stage(catalog, lookup, &state, old_doc, new_doc, patches);
    MissionReport {
        outcome,
        intel_seeded,
        intel_synced,
    }
}

#[allow(clippy::cast_precision_loss, clippy::float_cmp)]
fn sync_intel_goal(catalog: &MissionCatalog, new_doc: &mut Value, patches: &mut PatchSet) -> bool {
    if catalog.intel_goal.is_empty() {
        return false;
    }
    let Some(state) = mission_state(new_doc) else {
        return false;
    };
    if !state.has_intel {
        return false;
    }
    let goal_path = [schema::MISSION, field::GOALS, catalog.intel_goal.as_str()];
    let Some(goal) = get_in(new_doc, &goal_path).filter(|goal| goal.is_object()) else {
        return false;
    };

    let target = number_or_zero(goal.get(field::GOAL_TARGET)).max(0.0);
    let next = (state.completed_intel as f64).min(target);
    let current = number_or_zero(goal.get(field::GOAL_CURRENT));
    if current == next {
        return false;
    }
    patches.write(
        new_doc,
        &[schema::MISSION, field::GOALS, catalog.intel_goal.as_str(), field::GOAL_CURRENT],
        number_value(next),
        WriteGroup::Mission,
    )
}

fn advance_stage(
    catalog: &MissionCatalog,
    lookup: Option<StageLookup<'_>>,
    state: &MissionState,
    old_doc: &Value,
    new_doc: &mut Value,
    patches: &mut PatchSet,
) -> MissionOutcome {
    let in_progress = || MissionOutcome::InProgress {
        stage: state.stage.clone(),
        completed: state.completed_goals(),
        total: state.goals.len(),
    };

    let Some(lookup) = lookup else {
        return in_progress();
    };
    let old_stage = as_text(get_in(old_doc, &[schema::MISSION, field::STAGE]));
    if old_stage != state.stage {
        if patches.debug().mission_logic {
            tracing::info!(
                target: "stat_reconcile::mission",
                from = %old_stage,
                to = %state.stage,
                "mission.advance.skip_narrative"
            );
        }
        return MissionOutcome::StageChangedByNarrative {
            from: old_stage,
            to: state.stage.clone(),
        };
    }
    if !state.all_complete() {
        return in_progress();
    }

    let Some(next) = lookup.next else {
        tracing::info!(
            target: "stat_reconcile::mission",
            stage = %state.stage,
            "mission.final_stage.complete"
        );
        let rewards = if catalog.grant_rewards_on_final_stage {
            grant_rewards(lookup.current, new_doc, patches)
        } else {
            Vec::new()
        };
        return MissionOutcome::FinalStageComplete {
            stage: state.stage.clone(),
            rewards,
        };
    };

    tracing::info!(
        target: "stat_reconcile::mission",
        from = %state.stage,
        to = %next.name,
        "mission.stage.advanced"
    );
    patches.write(
        new_doc,
        &[schema::MISSION, field::STAGE],
        Value::String(next.name.clone()),
        WriteGroup::Mission,
    );
    patches.write(
        new_doc,
        &[schema::MISSION, field::GOALS],
        stage_goals_value(next),
        WriteGroup::Mission,
    );
    patches.write(
        new_doc,
        &[schema::MISSION, field::COMPLETION],
        fresh_completion_value(next),
        WriteGroup::Mission,
    );
    let rewards = grant_rewards(lookup.current, new_doc, patches);

    MissionOutcome::Advanced {
        from: state.stage.clone(),
        to: next.name.clone(),
        rewards,
    }
}

/// Grants each reward of `stage` that is not already present.
fn grant_rewards(stage: &StageDef, new_doc: &mut Value, patches: &mut PatchSet) -> Vec<String> {
    let mut granted = Vec::new();
    if stage.rewards.is_empty() {
        return granted;
    }
    let parents = split_path(field::REWARDS);
    for depth in 1..=parents.len() {
        let parent = &parents[..depth];
        if get_in(new_doc, parent).is_some_and(Value::is_array) {
            tracing::warn!(
                target: "stat_reconcile::mission",
                path = %parent.join("."),
                "mission.reward.parent_replaced"
            );
            patches.write(new_doc, parent, Value::Object(Map::new()), WriteGroup::Mission);
        }
    }

    for reward in &stage.rewards {
        let mut path = parents.clone();
        path.push(reward.name.as_str());
        if get_in(new_doc, &path).is_some_and(|existing| !existing.is_null()) {
            continue;
        }
        let mut grant = Map::new();
        grant.insert(field::REWARD_DESC.to_string(), Value::String(reward.desc.clone()));
        if !patches.write(new_doc, &path, Value::Object(grant), WriteGroup::Mission) {
            continue;
        }
        tracing::info!(
            target: "stat_reconcile::mission",
            reward = %reward.name,
            "mission.reward.granted"
        );
        granted.push(reward.name.clone());
    }
    granted
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DebugFlags;
    use serde_json::json;

    const STAGE_ONE: &str = "阶段一：秩序的萌芽";
    const STAGE_TWO: &str = "阶段二：塔内孤王";
    const FINAL: &str = "最终阶段：新世界的王";
    const INTEL_GOAL: &str = "完成一个公寓内部的情报碎片任务";

    fn stage_one_doc(done: [i64; 3]) -> Value {
        let intel_status = if done[2] > 0 { "已完成" } else { "未探索" };
        json!({
            "主线任务": {
                "当前阶段": STAGE_ONE,
                "阶段目标": {
                    "肃清20、19、21层的敌对幸存者": {"描述": "", "当前值": done[0], "目标值": 3},
                    "庇护至少3个核心女性角色或家庭": {"描述": "", "当前值": done[1], "目标值": 3},
                    INTEL_GOAL: {"描述": "", "当前值": done[2], "目标值": 1}
                },
                "情报碎片": {
                    "LOG-001": {"编号": "LOG-001", "状态": intel_status}
                }
            }
        })
    }

    fn settle(old: &Value, new: &mut Value) -> (MissionReport, PatchSet) {
        let catalog = MissionCatalog::builtin();
        let mut patches = PatchSet::new(DebugFlags::default());
        let report = settle_mission(&catalog, old, new, &mut patches);
        (report, patches)
    }

    #[test]
    fn test_absent_mission() {
        let mut new = json!({"主线任务": "none"});
        let (report, patches) = settle(&json!({}), &mut new);
        assert_eq!(report.outcome, MissionOutcome::Absent);
        assert!(patches.is_empty());
    }

    #[test]
    fn test_seeds_default_intel_once() {
        let old = json!({"主线任务": {"当前阶段": STAGE_ONE}});
        let mut new = old.clone();
        let (report, _) = settle(&old, &mut new);
        assert!(report.intel_seeded);
        let intel = new["主线任务"]["情报碎片"].as_object().unwrap();
        assert_eq!(intel.len(), 3);
        assert_eq!(intel["SIGNAL-003"]["状态"], json!("未探索"));

        let (again, patches) = settle(&new.clone(), &mut new);
        assert!(!again.intel_seeded);
        assert!(patches.is_empty());
    }

    #[test]
    fn test_intel_progress_is_capped_by_target() {
        let old = stage_one_doc([0, 0, 0]);
        let mut new = old.clone();
        new["主线任务"]["情报碎片"] = json!({
            "LOG-001": {"状态": "已完成"},
            "LOG-002": {"状态": "已完成"},
            "SIGNAL-003": {"状态": "未探索"}
        });
        let (report, _) = settle(&old, &mut new);

        assert!(report.intel_synced);
        assert_eq!(new["主线任务"]["阶段目标"][INTEL_GOAL]["当前值"], json!(1));
        assert_eq!(new["主线任务"]["目标完成状态"], json!({"0": false, "1": false, "2": true}));
        assert_eq!(
            report.outcome,
            MissionOutcome::InProgress {
                stage: STAGE_ONE.to_string(),
                completed: 1,
                total: 3,
            }
        );
    }

    #[test]
    fn test_advances_and_grants_rewards() {
        let old = stage_one_doc([3, 3, 1]);
        let mut new = old.clone();
        new["庇护所"] = json!({"庇护所能力": {"基础电力利用优化": {"desc": "已有"}}});
        let (report, _) = settle(&old, &mut new);

        assert_eq!(
            report.outcome,
            MissionOutcome::Advanced {
                from: STAGE_ONE.to_string(),
                to: STAGE_TWO.to_string(),
                rewards: vec!["非致命防御制造器".to_string()],
            }
        );
        let mission = &new["主线任务"];
        assert_eq!(mission["当前阶段"], json!(STAGE_TWO));
        assert_eq!(mission["目标完成状态"], json!({"0": false, "1": false, "2": false}));
        assert_eq!(mission["阶段目标"]["垂直统一（掌控1-21层）"]["当前值"], json!(0));
        assert_eq!(new["庇护所"]["庇护所能力"]["基础电力利用优化"]["desc"], json!("已有"));
        assert!(new["庇护所"]["庇护所能力"]["非致命防御制造器"]["desc"].is_string());
    }

    #[test]
    fn test_rewards_land_when_shelter_is_an_array() {
        let old = stage_one_doc([3, 3, 1]);
        let mut new = old.clone();
        new["庇护所"] = json!([]);
        let (report, patches) = settle(&old, &mut new);

        let MissionOutcome::Advanced { rewards, .. } = &report.outcome else {
            panic!("expected stage advance, got {:?}", report.outcome);
        };
        assert_eq!(rewards.len(), 2);
        for name in rewards {
            assert!(new["庇护所"]["庇护所能力"][name.as_str()]["desc"].is_string());
        }
        assert!(patches
            .writes()
            .iter()
            .any(|write| write.path == "庇护所" && write.before == Some(json!([]))));
    }

    #[test]
    fn test_rewards_land_when_ability_map_is_an_array() {
        let old = stage_one_doc([3, 3, 1]);
        let mut new = old.clone();
        new["庇护所"] = json!({"等级": 3, "庇护所能力": ["旧条目"]});
        let (report, _) = settle(&old, &mut new);

        assert!(matches!(&report.outcome, MissionOutcome::Advanced { rewards, .. } if rewards.len() == 2));
        assert_eq!(new["庇护所"]["等级"], json!(3));
        assert!(new["庇护所"]["庇护所能力"]["基础电力利用优化"]["desc"].is_string());
    }

    #[test]
    fn test_no_advance_when_stage_changed_by_narrative() {
        let old = json!({"主线任务": {"当前阶段": "序章"}});
        let mut new = stage_one_doc([3, 3, 1]);
        let (report, _) = settle(&old, &mut new);

        assert!(matches!(report.outcome, MissionOutcome::StageChangedByNarrative { .. }));
        assert_eq!(new["主线任务"]["当前阶段"], json!(STAGE_ONE));
    }

    #[test]
    fn test_unknown_stage_is_reported() {
        let old = json!({"主线任务": {"当前阶段": "番外", "阶段目标": {"g": {"当前值": 1, "目标值": 1}}}});
        let mut new = old.clone();
        let (report, patches) = settle(&old, &mut new);

        assert_eq!(
            report.outcome,
            MissionOutcome::UnknownStage {
                stage: "番外".to_string()
            }
        );
        assert_eq!(new, old);
        assert!(patches.is_empty());
    }

    #[test]
    fn test_final_stage_takes_no_action() {
        let old = json!({
            "主线任务": {
                "当前阶段": FINAL,
                "阶段目标": [{"当前值": 1, "目标值": 1}],
                "情报碎片": {"LOG-001": {"状态": "已完成"}}
            }
        });
        let mut new = old.clone();
        let (report, _) = settle(&old, &mut new);

        assert_eq!(
            report.outcome,
            MissionOutcome::FinalStageComplete {
                stage: FINAL.to_string(),
                rewards: Vec::new(),
            }
        );
        assert!(new.get("庇护所").is_none());
        assert_eq!(new["主线任务"]["当前阶段"], json!(FINAL));
    }

    #[test]
    fn test_zero_target_never_completes() {
        let old = json!({"主线任务": {"当前阶段": STAGE_ONE, "阶段目标": {"g": {"当前值": 9, "目标值": 0}}}});
        let mut new = old.clone();
        let (report, _) = settle(&old, &mut new);

        assert_eq!(new["主线任务"]["目标完成状态"], json!({"0": false}));
        assert!(matches!(report.outcome, MissionOutcome::InProgress { completed: 0, .. }));
    }
}
