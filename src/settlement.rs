//! Per-character settlement.
//!
//! Each character gets three independent steps, in order: off-screen health
//! settlement, the derived health-status label, and the derived relation
//! stage. Only the first depends on elapsed time; the two label steps run on
//! every pass and are no-ops once the document is consistent.

use serde::Serialize;
use serde_json::{json, Value};

use crate::character::{detect_touched, Character, TouchedFields};
use crate::document::{CharacterPath, PatchSet, WriteGroup};
use crate::health::{clamp_health, reason_text, settle_health, HealthCause, HealthRules};
use crate::schema::character as field;
use crate::shelter::{is_sheltered, RoomOccupancy, ShelterScope};
use crate::value::number_value;

/// Inputs shared by every character in a pass.
#[derive(Debug, Clone, Copy)]
pub struct SettlementContext<'a> {
    /// Hours since the previous document, `None` when unknown.
    pub elapsed_hours: Option<f64>,
    /// Room occupancy of the new document.
    pub rooms: &'a RoomOccupancy,
    /// Explicitly sheltered floor rooms.
    pub scope: &'a ShelterScope,
    /// Off-screen health rates.
    pub rules: &'a HealthRules,
}

/// What the off-screen health step did for one character.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum OffstageOutcome {
    /// In the current scene; nothing to settle.
    OnScreen,
    /// No record in the previous document.
    NewCharacter,
    /// The clock did not move forward, or could not be read.
    ElapsedUnknown,
    /// The narrative engine set health or its reason this round.
    TouchedByNarrative,
    /// Not enough time passed for a whole interval.
    NoChange {
        /// Shelter status used for the rules.
        sheltered: bool,
    },
    /// Health was rewritten.
    Applied {
        /// Shelter status used for the rules.
        sheltered: bool,
        /// Health before the pass.
        before: f64,
        /// Health written, clamped.
        after: f64,
        /// Actual change after clamping.
        delta: i64,
    },
}

/// Everything settled for one character.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CharacterReport {
    /// Record location, e.g. `临时NPC.老周`.
    pub path: String,
    /// Off-screen health step.
    pub offstage: OffstageOutcome,
    /// The health-status label was rewritten.
    pub status_written: bool,
    /// The relation label was rewritten.
    pub relation_written: bool,
}

/// Settles one character in place.
///
/// Returns `None` if the path no longer holds a character record.
pub fn settle_character(
    ctx: &SettlementContext<'_>,
    path: &CharacterPath,
    old_doc: &Value,
    new_doc: &mut Value,
    patches: &mut PatchSet,
) -> Option<CharacterReport> {
    let record = path.lookup(new_doc)?.clone();
    let character = Character::from_value(&record)?;
    let old = path.lookup(old_doc);
    let touched = detect_touched(old, &record);

    let offstage = settle_offstage(ctx, path, &character, old.is_some(), touched, new_doc, patches);

    // Labels follow the post-settlement health.
    let settled = path
        .lookup(new_doc)
        .and_then(Character::from_value)
        .unwrap_or(character);

    let status = settled.derived_status();
    let status_written = patches.write(
        new_doc,
        &path.field(field::HEALTH_STATUS),
        json!(status.label()),
        WriteGroup::Character,
    );

    let relation_written = match settled.derived_relation() {
        Some(stage) if !touched.relation => patches.write(
            new_doc,
            &path.field(field::RELATION),
            json!(stage.label()),
            WriteGroup::Character,
        ),
        _ => false,
    };

    Some(CharacterReport {
        path: path.to_string(),
        offstage,
        status_written,
        relation_written,
    })
}

#[allow(clippy::cast_possible_truncation, clippy::cast_precision_loss)]
fn settle_offstage(
    ctx: &SettlementContext<'_>,
    path: &CharacterPath,
    character: &Character,
    has_previous: bool,
    touched: TouchedFields,
    new_doc: &mut Value,
    patches: &mut PatchSet,
) -> OffstageOutcome {
    let verbose = patches.debug().offstage_health;

    if !character.is_off_screen() {
        return OffstageOutcome::OnScreen;
    }
    if !has_previous {
        return OffstageOutcome::NewCharacter;
    }
    let Some(hours) = ctx.elapsed_hours else {
        return OffstageOutcome::ElapsedUnknown;
    };
    if touched.health_authored() {
        if verbose {
            tracing::info!(
                target: "stat_reconcile::character",
                character = %path,
                health = touched.health,
                reason = touched.health_reason,
                "offstage.skip.touched"
            );
        }
        return OffstageOutcome::TouchedByNarrative;
    }

    let sheltered = is_sheltered(ctx.rooms, path.name(), ctx.scope);
    let computed = settle_health(hours, sheltered, ctx.rules);
    if computed.is_zero() {
        if verbose {
            tracing::info!(
                target: "stat_reconcile::character",
                character = %path,
                hours = hours,
                sheltered,
                "offstage.noop"
            );
        }
        return OffstageOutcome::NoChange { sheltered };
    }

    let before = character.health;
    let after = clamp_health(before + computed.delta as f64);
    let delta = (after - before).round() as i64;
    let cause = if delta == 0 { HealthCause::NoChange } else { computed.cause };
    let reason = reason_text(delta, cause);

    patches.write(new_doc, &path.field(field::HEALTH), number_value(after), WriteGroup::Character);
    patches.write(
        new_doc,
        &path.field(field::HEALTH_REASON),
        Value::String(reason.clone()),
        WriteGroup::Character,
    );
    tracing::info!(
        target: "stat_reconcile::character",
        character = %path,
        before,
        after,
        reason = %reason,
        "offstage.settled"
    );

    OffstageOutcome::Applied {
        sheltered,
        before,
        after,
        delta,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DebugFlags;
    use crate::shelter::Floor;

    fn room_doc() -> Value {
        json!({
            "核心区": {"主卧室使用者": ["林晚"]},
            "楼层房间": {
                "楼层19房间": {"1903": {"入住者": ["老周"]}},
                "楼层20房间": {"2004": {"入住者": ["阿梅"]}}
            }
        })
    }

    fn run(
        hours: Option<f64>,
        scope: &ShelterScope,
        old: &Value,
        new: &mut Value,
        name: &str,
    ) -> (CharacterReport, PatchSet) {
        let rooms = RoomOccupancy::from_value(&room_doc());
        let rules = HealthRules::default();
        let ctx = SettlementContext {
            elapsed_hours: hours,
            rooms: &rooms,
            scope,
            rules: &rules,
        };
        let mut patches = PatchSet::new(DebugFlags::all());
        let path = CharacterPath::Top(name.to_string());
        let report = settle_character(&ctx, &path, old, new, &mut patches).unwrap();
        (report, patches)
    }

    #[test]
    fn test_unsheltered_decay_is_clamped_to_actual() {
        let old = json!({"阿梅": {"健康": 10, "登场状态": "离场", "健康状况": "重病/濒死"}});
        let mut new = old.clone();
        let (report, _) = run(Some(24.0), &ShelterScope::new(), &old, &mut new, "阿梅");

        assert_eq!(
            report.offstage,
            OffstageOutcome::Applied {
                sheltered: false,
                before: 10.0,
                after: 0.0,
                delta: -10,
            }
        );
        assert_eq!(new["阿梅"]["健康"], json!(0));
        assert_eq!(new["阿梅"]["健康更新原因"], json!("-10, 离场未受庇护自然衰减"));
        assert_eq!(new["阿梅"]["健康状况"], json!("死亡"));
        assert!(report.status_written);
    }

    #[test]
    fn test_scope_room_recovers() {
        let mut scope = ShelterScope::new();
        scope.toggle_room(Floor::F19, "1903", 6).unwrap();
        let old = json!({"老周": {"健康": 50, "登场状态": "离场"}});
        let mut new = old.clone();
        let (report, _) = run(Some(25.0), &scope, &old, &mut new, "老周");

        assert!(matches!(report.offstage, OffstageOutcome::Applied { sheltered: true, delta: 2, .. }));
        assert_eq!(new["老周"]["健康"], json!(52));
        assert_eq!(new["老周"]["健康更新原因"], json!("+2, 离场受庇护休整"));
    }

    #[test]
    fn test_full_health_recovery_reports_no_change() {
        let old = json!({"林晚": {"健康": 100, "登场状态": "离场", "健康状况": "健康"}});
        let mut new = old.clone();
        let (report, patches) = run(Some(48.0), &ShelterScope::new(), &old, &mut new, "林晚");

        assert!(matches!(report.offstage, OffstageOutcome::Applied { delta: 0, .. }));
        assert_eq!(new["林晚"]["健康更新原因"], json!("0, 无变化"));
        assert_eq!(patches.len(), 1);
    }

    #[test]
    fn test_on_screen_still_gets_labels() {
        let old = json!({"林晚": {"健康": 55, "登场状态": "在场", "秩序刻印": 61, "关系": "交易"}});
        let mut new = old.clone();
        let (report, _) = run(Some(48.0), &ShelterScope::new(), &old, &mut new, "林晚");

        assert_eq!(report.offstage, OffstageOutcome::OnScreen);
        assert_eq!(new["林晚"]["健康"], json!(55));
        assert_eq!(new["林晚"]["健康状况"], json!("生病/受伤"));
        assert_eq!(new["林晚"]["关系"], json!("忠诚"));
        assert!(report.relation_written);
    }

    #[test]
    fn test_touched_relation_is_kept() {
        let old = json!({"林晚": {"健康": 90, "登场状态": "在场", "秩序刻印": 10, "关系": "拒绝"}});
        let mut new = json!({"林晚": {"健康": 90, "登场状态": "在场", "秩序刻印": 10, "关系": "忠诚"}});
        let (report, _) = run(None, &ShelterScope::new(), &old, &mut new, "林晚");

        assert!(!report.relation_written);
        assert_eq!(new["林晚"]["关系"], json!("忠诚"));
    }

    #[test]
    fn test_new_character_is_not_settled() {
        let old = json!({});
        let mut new = json!({"阿梅": {"健康": 70, "登场状态": "离场"}});
        let (report, _) = run(Some(24.0), &ShelterScope::new(), &old, &mut new, "阿梅");

        assert_eq!(report.offstage, OffstageOutcome::NewCharacter);
        assert_eq!(new["阿梅"]["健康"], json!(70));
        assert_eq!(new["阿梅"]["健康状况"], json!("亚健康"));
    }

    #[test]
    fn test_narrative_health_wins() {
        let old = json!({"阿梅": {"健康": 70, "登场状态": "离场"}});
        let mut new = json!({"阿梅": {"健康": 65, "登场状态": "离场"}});
        let (report, _) = run(Some(24.0), &ShelterScope::new(), &old, &mut new, "阿梅");

        assert_eq!(report.offstage, OffstageOutcome::TouchedByNarrative);
        assert_eq!(new["阿梅"]["健康"], json!(65));
    }

    #[test]
    fn test_unknown_elapsed_skips_settlement() {
        let old = json!({"阿梅": {"健康": 70, "登场状态": "离场", "健康状况": "亚健康"}});
        let mut new = old.clone();
        let (report, patches) = run(None, &ShelterScope::new(), &old, &mut new, "阿梅");

        assert_eq!(report.offstage, OffstageOutcome::ElapsedUnknown);
        assert!(patches.is_empty());
    }
}
