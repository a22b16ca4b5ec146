use std::sync::Arc;
use std::time::Instant;

use criterion::{criterion_group, criterion_main, BatchSize, Criterion, Throughput};
use serde_json::{json, Value};

use stat_reconcile::{InMemoryStateStore, Reconciler};

const CHARACTERS: usize = 32;

fn make_engine() -> Reconciler {
    let store = InMemoryStateStore::from_value(json!({
        "eden": {"shelter_scope": {"20": ["2002", "2003"]}}
    }));
    Reconciler::new(Arc::new(store))
}

fn make_document(date: &str, time: &str) -> Value {
    let mut floor_20 = serde_json::Map::new();
    let mut doc = json!({
        "世界": {"日期": date, "时间": time, "末日天数": 1},
        "主线任务": {
            "当前阶段": "阶段一：秩序的萌芽",
            "阶段目标": {
                "肃清20、19、21层的敌对幸存者": {"描述": "", "当前值": 1, "目标值": 3},
                "庇护至少3个核心女性角色或家庭": {"描述": "", "当前值": 2, "目标值": 3},
                "完成一个公寓内部的情报碎片任务": {"描述": "", "当前值": 0, "目标值": 1}
            }
        }
    });

    // Every other character is off-screen; a third of those sit in scope rooms.
    for i in 0..CHARACTERS {
        let name = format!("角色{i:02}");
        let room = format!("20{:02}", i % 6 + 2);
        let entry = floor_20.entry(room).or_insert_with(|| json!({"入住者": []}));
        if let Some(residents) = entry["入住者"].as_array_mut() {
            residents.push(json!(name));
        }
        doc[&name] = json!({
            "健康": 40 + i,
            "健康状况": "健康",
            "健康更新原因": "",
            "登场状态": if i % 2 == 0 { "离场" } else { "在场" },
            "秩序刻印": i * 3,
            "关系": "拒绝"
        });
    }
    doc["房间"] = json!({"楼层房间": {"楼层20房间": floor_20}});
    doc
}

fn bench_full_pass(c: &mut Criterion) {
    let engine = make_engine();
    let old = make_document("末日纪元，2184年3月1日", "08:00");
    let new = make_document("末日纪元，2184年3月2日", "08:00");

    let mut group = c.benchmark_group("reconcile");
    group.throughput(Throughput::Elements(CHARACTERS as u64));

    group.bench_function("full_pass", |b| {
        b.iter_batched(
            || new.clone(),
            |mut doc| engine.reconcile(&old, &mut doc),
            BatchSize::SmallInput,
        );
    });

    group.finish();
}

fn bench_settled_pass(c: &mut Criterion) {
    c.bench_function("reconcile/settled_noop", |b| {
        b.iter_custom(|iters| {
            let engine = make_engine();
            let old = make_document("末日纪元，2184年3月1日", "08:00");
            let mut doc = make_document("末日纪元，2184年3月2日", "08:00");
            // Settle once so every following pass is a no-op.
            engine.reconcile(&old, &mut doc);

            let start = Instant::now();
            for _ in 0..iters {
                let report = engine.reconcile(&old, &mut doc);
                assert!(report.is_noop());
            }
            start.elapsed()
        });
    });
}

criterion_group!(reconcile, bench_full_pass, bench_settled_pass);
criterion_main!(reconcile);
