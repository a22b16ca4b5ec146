mod common;

use serde_json::json;
use stat_reconcile::{OffstageOutcome, WriteGroup};

use common::{character, document, engine};

const DAY_ONE: &str = "末日纪元，2184年3月1日";
const DAY_TWO: &str = "末日纪元，2184年3月2日";

#[test]
fn unsheltered_decay_is_clamped_and_labelled() {
    let (engine, _) = engine(json!({}));
    let old = document(DAY_ONE, "08:00", &[("阿梅", character(95, "离场"))]);
    let mut new = document(DAY_TWO, "08:00", &[("阿梅", character(95, "离场"))]);

    let report = engine.reconcile(&old, &mut new);

    assert_eq!(report.elapsed_hours, Some(24.0));
    assert_eq!(new["阿梅"]["健康"], json!(75));
    assert_eq!(new["阿梅"]["健康更新原因"], json!("-20, 离场未受庇护自然衰减"));
    assert_eq!(new["阿梅"]["健康状况"], json!("亚健康"));
    assert!(matches!(
        report.character("阿梅").unwrap().offstage,
        OffstageOutcome::Applied { sheltered: false, delta: -20, .. }
    ));
}

#[test]
fn decay_never_goes_below_zero() {
    let (engine, _) = engine(json!({"eden": {"rules": {"health": {"decayPer6h": 10, "decayMultiplier": 10}}}}));
    let old = document(DAY_ONE, "08:00", &[("阿梅", character(30, "离场"))]);
    let mut new = document(DAY_TWO, "08:00", &[("阿梅", character(30, "离场"))]);

    engine.reconcile(&old, &mut new);

    assert_eq!(new["阿梅"]["健康"], json!(0));
    assert_eq!(new["阿梅"]["健康更新原因"], json!("-30, 离场未受庇护自然衰减"));
    assert_eq!(new["阿梅"]["健康状况"], json!("死亡"));
}

#[test]
fn sheltered_recovery_counts_whole_intervals() {
    let (engine, _) = engine(json!({}));
    let old = document(DAY_ONE, "00:00", &[("林晚", character(50, "离场"))]);
    let mut new = document(DAY_ONE, "23:00", &[("林晚", character(50, "离场"))]);

    engine.reconcile(&old, &mut new);

    assert_eq!(new["林晚"]["健康"], json!(51));
    assert_eq!(new["林晚"]["健康更新原因"], json!("+1, 离场受庇护休整"));
}

#[test]
fn anchor_apartment_and_scope_rooms_are_sheltered() {
    let (engine, _) = engine(json!({"eden": {"shelter_scope": {"19": ["1903"]}}}));
    let records = [("苏晴", character(40, "离场")), ("老周", character(40, "离场")), ("无名", character(40, "离场"))];
    let old = document(DAY_ONE, "00:00", &records);
    let mut new = document(DAY_TWO, "00:00", &records);

    engine.reconcile(&old, &mut new);

    assert_eq!(new["苏晴"]["健康"], json!(42));
    assert_eq!(new["老周"]["健康"], json!(42));
    assert_eq!(new["无名"]["健康"], json!(20));
}

#[test]
fn narrative_health_is_never_overwritten() {
    let (engine, _) = engine(json!({}));
    let old = document(DAY_ONE, "08:00", &[("阿梅", character(95, "离场"))]);
    let mut edited = character(95, "离场");
    edited["健康更新原因"] = json!("被救援队治疗");
    let mut new = document(DAY_TWO, "20:00", &[("阿梅", edited)]);

    let report = engine.reconcile(&old, &mut new);

    assert_eq!(new["阿梅"]["健康"], json!(95));
    assert_eq!(new["阿梅"]["健康更新原因"], json!("被救援队治疗"));
    assert_eq!(report.character("阿梅").unwrap().offstage, OffstageOutcome::TouchedByNarrative);
}

#[test]
fn midnight_crossing_below_one_interval_changes_nothing() {
    let (engine, _) = engine(json!({}));
    let old = document("2184年3月1日", "23:50", &[("阿梅", character(95, "离场"))]);
    let mut new = document("2184年3月2日", "00:10", &[("阿梅", character(95, "离场"))]);

    let report = engine.reconcile(&old, &mut new);

    let hours = report.elapsed_hours.unwrap();
    assert!((hours - 1.0 / 3.0).abs() < 1e-9);
    assert!(matches!(
        report.character("阿梅").unwrap().offstage,
        OffstageOutcome::NoChange { sheltered: false }
    ));
    assert_eq!(new["阿梅"]["健康"], json!(95));
    assert!(report.is_noop());
}

#[test]
fn clock_running_backwards_skips_settlement() {
    let (engine, _) = engine(json!({}));
    let old = document(DAY_TWO, "08:00", &[("阿梅", character(95, "离场"))]);
    let mut new = document(DAY_ONE, "08:00", &[("阿梅", character(95, "离场"))]);

    let report = engine.reconcile(&old, &mut new);

    assert_eq!(report.elapsed_hours, None);
    assert_eq!(report.character("阿梅").unwrap().offstage, OffstageOutcome::ElapsedUnknown);
    assert_eq!(new["阿梅"]["健康"], json!(95));
}

#[test]
fn temporary_characters_are_settled_by_name() {
    let (engine, _) = engine(json!({}));
    let mut old = document(DAY_ONE, "08:00", &[]);
    old["临时NPC"] = json!({"小雨": character(60, "离场")});
    let mut new = document(DAY_TWO, "08:00", &[]);
    new["临时NPC"] = json!({"小雨": character(60, "离场")});

    let report = engine.reconcile(&old, &mut new);

    // 小雨 sleeps in the entrance guest room.
    assert_eq!(new["临时NPC"]["小雨"]["健康"], json!(62));
    assert!(report.character("临时NPC.小雨").is_some());
}

#[test]
fn relation_follows_imprint_unless_narrated() {
    let (engine, _) = engine(json!({}));
    let mut before = character(90, "在场");
    before["秩序刻印"] = json!(45);
    let old = document(DAY_ONE, "08:00", &[("林晚", before.clone()), ("苏晴", before.clone())]);

    let mut narrated = before.clone();
    narrated["关系"] = json!("交易");
    let mut new = document(DAY_ONE, "09:00", &[("林晚", before), ("苏晴", narrated)]);

    engine.reconcile(&old, &mut new);

    assert_eq!(new["林晚"]["关系"], json!("顺从"));
    assert_eq!(new["苏晴"]["关系"], json!("交易"));
}

#[test]
fn second_pass_is_a_noop() {
    let (engine, _) = engine(json!({"eden": {"rules": {"date_rollover": true}}}));
    let mut old = document(DAY_ONE, "23:30", &[("阿梅", character(95, "离场")), ("林晚", character(50, "离场"))]);
    old["主线任务"] = json!({
        "当前阶段": "阶段一：秩序的萌芽",
        "阶段目标": {
            "肃清20、19、21层的敌对幸存者": {"描述": "", "当前值": 3, "目标值": 3},
            "庇护至少3个核心女性角色或家庭": {"描述": "", "当前值": 3, "目标值": 3},
            "完成一个公寓内部的情报碎片任务": {"描述": "", "当前值": 0, "目标值": 1}
        },
        "情报碎片": {"LOG-001": {"编号": "LOG-001", "状态": "已完成"}}
    });
    let mut new = old.clone();
    new["世界"]["时间"] = json!("11:30");

    let first = engine.reconcile(&old, &mut new);
    assert!(!first.is_noop());
    assert_eq!(first.date_rolled_over.as_deref(), Some(DAY_TWO));
    assert!(first.writes_for(WriteGroup::Character).count() > 0);
    assert!(first.writes_for(WriteGroup::Mission).count() > 0);

    let settled = new.clone();
    let second = engine.reconcile(&old, &mut new);
    assert!(second.is_noop(), "unexpected writes: {:?}", second.writes);
    assert_eq!(new, settled);
}

#[test]
fn malformed_document_degrades_to_no_writes() {
    let (engine, _) = engine(json!({}));
    let old = json!({"世界": "坏掉的时钟", "房间": [1, 2], "主线任务": 7});
    let mut new = json!({"世界": {"日期": 3}, "房间": "?", "主线任务": null, "林晚": {"健康": "很多", "登场状态": 1}});

    let report = engine.reconcile(&old, &mut new);

    assert_eq!(report.elapsed_hours, None);
    // Non-numeric health reads as 0, so only the derived label is written.
    assert_eq!(report.writes.len(), 1);
    assert_eq!(new["林晚"]["健康状况"], json!("死亡"));
}
