//! Character records and the narrative touch detector.
//!
//! A character is any object carrying both `健康` and `登场状态`. The typed
//! [`Character`] view is built once per pass from the new document; the
//! [`TouchedFields`] diff against the previous document decides which derived
//! values the engine may still write.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::health::{clamp_health, HealthStatus};
use crate::schema::character as field;
use crate::value::{as_text, coerce_number, number_or_zero, same_value};

/// Upper bound of the order-imprint score.
pub const MAX_IMPRINT: f64 = 100.0;

/// Returns true if the value has the shape of a character record.
#[must_use]
pub fn is_character(value: &Value) -> bool {
    value
        .as_object()
        .is_some_and(|map| map.contains_key(field::HEALTH) && map.contains_key(field::PRESENCE))
}

/// Relationship stage derived from the order-imprint score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RelationStage {
    /// Imprint below 20.
    Reject,
    /// Imprint below 40.
    Transactional,
    /// Imprint below 60.
    Compliant,
    /// Imprint below 90.
    Loyal,
    /// Terminal stage.
    Absolute,
}

impl RelationStage {
    /// Classifies an imprint score, clamped to `[0, 100]` first.
    #[must_use]
    pub fn from_imprint(imprint: f64) -> Self {
        let v = if imprint.is_nan() { 0.0 } else { imprint.clamp(0.0, MAX_IMPRINT) };
        if v < 20.0 {
            Self::Reject
        } else if v < 40.0 {
            Self::Transactional
        } else if v < 60.0 {
            Self::Compliant
        } else if v < 90.0 {
            Self::Loyal
        } else {
            Self::Absolute
        }
    }

    /// Label written into the document.
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Reject => "拒绝",
            Self::Transactional => "交易",
            Self::Compliant => "顺从",
            Self::Loyal => "忠诚",
            Self::Absolute => "绝对服从",
        }
    }
}

impl fmt::Display for RelationStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Typed view of one character record.
#[derive(Debug, Clone, PartialEq)]
pub struct Character {
    /// Presence text; `离场` means off-screen.
    pub presence: String,
    /// Health, clamped; non-numeric reads as 0.
    pub health: f64,
    /// Stored health-status label (may be stale).
    pub health_status: Option<Value>,
    /// Stored relation label (may be stale).
    pub relation: Option<Value>,
    /// Order-imprint score, if numeric.
    pub imprint: Option<f64>,
}

impl Character {
    /// Builds the view from a record, or `None` if it is not a character.
    #[must_use]
    pub fn from_value(value: &Value) -> Option<Self> {
        if !is_character(value) {
            return None;
        }
        Some(Self {
            presence: as_text(value.get(field::PRESENCE)),
            health: clamp_health(number_or_zero(value.get(field::HEALTH))),
            health_status: value.get(field::HEALTH_STATUS).cloned(),
            relation: value.get(field::RELATION).cloned(),
            imprint: value.get(field::IMPRINT).and_then(coerce_number),
        })
    }

    /// True if the character is not part of the current scene.
    #[must_use]
    pub fn is_off_screen(&self) -> bool {
        self.presence == field::OFF_SCREEN
    }

    /// Health-status label implied by the current health.
    #[must_use]
    pub fn derived_status(&self) -> HealthStatus {
        HealthStatus::from_health(self.health)
    }

    /// Relation stage implied by the imprint, if it is numeric.
    #[must_use]
    pub fn derived_relation(&self) -> Option<RelationStage> {
        self.imprint.map(RelationStage::from_imprint)
    }
}

/// Which character fields the narrative engine changed this round.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TouchedFields {
    /// `健康` changed.
    pub health: bool,
    /// `健康更新原因` changed.
    pub health_reason: bool,
    /// `关系` changed.
    pub relation: bool,
    /// `关系倾向` changed.
    pub relation_tendency: bool,
    /// `秩序刻印` changed.
    pub imprint: bool,
    /// `秩序刻印更新原因` changed.
    pub imprint_reason: bool,
}

impl TouchedFields {
    /// True if the numeric health settlement must be skipped.
    #[must_use]
    pub const fn health_authored(&self) -> bool {
        self.health || self.health_reason
    }

    /// True if any field differs.
    #[must_use]
    pub const fn any(&self) -> bool {
        self.health
            || self.health_reason
            || self.relation
            || self.relation_tendency
            || self.imprint
            || self.imprint_reason
    }
}

/// Diffs two versions of a character record field by field.
///
/// A character with no previous record is never considered touched.
#[must_use]
pub fn detect_touched(old: Option<&Value>, new: &Value) -> TouchedFields {
    let Some(old) = old else {
        return TouchedFields::default();
    };
    let differs = |key: &str| !same_value(old.get(key), new.get(key));
    TouchedFields {
        health: differs(field::HEALTH),
        health_reason: differs(field::HEALTH_REASON),
        relation: differs(field::RELATION),
        relation_tendency: differs(field::RELATION_TENDENCY),
        imprint: differs(field::IMPRINT),
        imprint_reason: differs(field::IMPRINT_REASON),
    }
}
