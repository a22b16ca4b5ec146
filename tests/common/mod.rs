#![allow(dead_code)]

use std::sync::Arc;

use serde_json::{json, Value};
use stat_reconcile::{InMemoryStateStore, Reconciler};

/// Installs a test subscriber once; `RUST_LOG` controls the filter.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

pub fn engine(store: Value) -> (Reconciler, Arc<InMemoryStateStore>) {
    init_tracing();
    let store = Arc::new(InMemoryStateStore::from_value(store));
    (Reconciler::new(store.clone()), store)
}

pub fn world(date: &str, time: &str) -> Value {
    json!({"日期": date, "时间": time, "末日天数": 1})
}

/// A small apartment: one character in the master bedroom, one in a floor-19
/// room, one in the anchor apartment, one nowhere.
pub fn rooms() -> Value {
    json!({
        "玄关": {"临时客房A入住者": [], "临时客房B入住者": ["小雨"]},
        "核心区": {"主卧室使用者": ["林晚"], "主浴室使用者": []},
        "楼层房间": {
            "楼层20房间": {"2001": {"入住者": ["苏晴"]}, "2002": {"入住者": []}},
            "楼层19房间": {"1903": {"入住者": ["老周"]}}
        }
    })
}

pub fn character(health: i64, presence: &str) -> Value {
    json!({
        "姓名": "",
        "健康": health,
        "健康状况": "健康",
        "健康更新原因": "",
        "登场状态": presence,
        "秩序刻印": 0,
        "关系": "拒绝"
    })
}

pub fn document(date: &str, time: &str, characters: &[(&str, Value)]) -> Value {
    let mut doc = json!({
        "世界": world(date, time),
        "房间": rooms(),
    });
    for (name, record) in characters {
        doc[*name] = record.clone();
    }
    doc
}
