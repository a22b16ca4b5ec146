//! Document vocabulary.
//!
//! The narrative engine authors the world-state document in its own language;
//! these are the well-known keys and labels the engine reads and writes.
//! Paths are dotted (`"主线任务.当前阶段"`) and resolved with [`crate::value`].

/// Top-level world clock object.
pub const WORLD: &str = "世界";
/// Date text inside the world clock, e.g. `"末日纪元，2184年3月1日"`.
pub const WORLD_DATE: &str = "日期";
/// Time text inside the world clock, e.g. `"深夜 - 23:50"`.
pub const WORLD_TIME: &str = "时间";
/// Day counter inside the world clock.
pub const WORLD_DAY_COUNT: &str = "末日天数";

/// Room occupancy map.
pub const ROOMS: &str = "房间";
/// Mission sub-document.
pub const MISSION: &str = "主线任务";
/// Shelter sub-document (rewards live underneath).
pub const SHELTER: &str = "庇护所";
/// Nested map of temporary characters.
pub const TEMP_CHARACTERS: &str = "临时NPC";

/// Top-level keys that never hold a character record.
pub const RESERVED_KEYS: &[&str] = &[WORLD, SHELTER, ROOMS, MISSION, "楼层其他住户", TEMP_CHARACTERS];

/// Character fields.
pub mod character {
    /// Display name.
    pub const NAME: &str = "姓名";
    /// Scene presence text.
    pub const PRESENCE: &str = "登场状态";
    /// Health score, 0 to 100.
    pub const HEALTH: &str = "健康";
    /// Derived health-status label.
    pub const HEALTH_STATUS: &str = "健康状况";
    /// Why health last changed.
    pub const HEALTH_REASON: &str = "健康更新原因";
    /// Derived relationship-stage label.
    pub const RELATION: &str = "关系";
    /// Narrative-only relationship leaning.
    pub const RELATION_TENDENCY: &str = "关系倾向";
    /// Order-imprint score, 0 to 100.
    pub const IMPRINT: &str = "秩序刻印";
    /// Why the imprint last changed.
    pub const IMPRINT_REASON: &str = "秩序刻印更新原因";

    /// Presence value meaning "not in the current scene".
    pub const OFF_SCREEN: &str = "离场";
}

/// Room occupancy paths, relative to [`super::ROOMS`].
pub mod rooms {
    /// Occupants of temporary guest room A.
    pub const ENTRANCE_A: &str = "玄关.临时客房A入住者";
    /// Occupants of temporary guest room B.
    pub const ENTRANCE_B: &str = "玄关.临时客房B入住者";
    /// Users of the master bedroom.
    pub const MASTER_BEDROOM: &str = "核心区.主卧室使用者";
    /// Users of the master bathroom.
    pub const MASTER_BATH: &str = "核心区.主浴室使用者";
    /// Numbered rooms on floor 20.
    pub const FLOOR_20: &str = "楼层房间.楼层20房间";
    /// Numbered rooms on floor 19.
    pub const FLOOR_19: &str = "楼层房间.楼层19房间";
    /// Resident list inside a numbered room.
    pub const RESIDENTS: &str = "入住者";

    /// The shelter's own apartment; always sheltered.
    pub const ANCHOR_ROOM: &str = "2001";
}

/// Mission fields, relative to [`super::MISSION`].
pub mod mission {
    /// Current stage name.
    pub const STAGE: &str = "当前阶段";
    /// Goals of the current stage.
    pub const GOALS: &str = "阶段目标";
    /// Per-goal completion flags.
    pub const COMPLETION: &str = "目标完成状态";
    /// Intel fragments by id.
    pub const INTEL: &str = "情报碎片";

    /// Goal description.
    pub const GOAL_DESCRIPTION: &str = "描述";
    /// Goal progress.
    pub const GOAL_CURRENT: &str = "当前值";
    /// Goal target.
    pub const GOAL_TARGET: &str = "目标值";

    /// Reward grants land under `庇护所.庇护所能力.<name>`.
    pub const REWARDS: &str = "庇护所.庇护所能力";
    /// Text field of a granted reward.
    pub const REWARD_DESC: &str = "desc";
}

/// Keys in the chat-scoped persisted store.
pub mod store {
    /// Floor to sheltered room list.
    pub const SHELTER_SCOPE: &str = "eden.shelter_scope";
    /// Health rate overrides.
    pub const HEALTH_RULES: &str = "eden.rules.health";
    /// Missed-midnight date patching toggle.
    pub const DATE_ROLLOVER: &str = "eden.rules.date_rollover";
    /// Prefix of the diagnostic logging flags.
    pub const DEBUG: &str = "eden.debug";
}

/// Returns true if a top-level key can never be a character entry.
#[must_use]
pub fn is_reserved_key(key: &str) -> bool {
    key.starts_with('_') || RESERVED_KEYS.contains(&key)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reserved_keys_include_structural_sections() {
        assert!(is_reserved_key(WORLD));
        assert!(is_reserved_key(MISSION));
        assert!(is_reserved_key(TEMP_CHARACTERS));
        assert!(is_reserved_key("_meta"));
        assert!(!is_reserved_key("林晚"));
    }
}
