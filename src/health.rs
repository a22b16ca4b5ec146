//! Health rules: rate configuration, off-screen deltas and status labels.
//!
//! Off-screen characters lose health on a 6-hour cadence when exposed and
//! regain it on a 12-hour cadence when sheltered. Only whole intervals count;
//! the scaled result is floored to an integer.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::value::coerce_number;

/// Hours per decay interval when unsheltered.
pub const DECAY_INTERVAL_HOURS: f64 = 6.0;

/// Hours per recovery interval when sheltered.
pub const RECOVER_INTERVAL_HOURS: f64 = 12.0;

/// Upper bound for every rate parameter.
pub const MAX_RATE: f64 = 10.0;

/// Health is kept within `[MIN_HEALTH, MAX_HEALTH]`.
pub const MIN_HEALTH: f64 = 0.0;
/// See [`MIN_HEALTH`].
pub const MAX_HEALTH: f64 = 100.0;

/// Clamps a health value to the valid range.
#[must_use]
pub fn clamp_health(value: f64) -> f64 {
    if value.is_nan() {
        return MIN_HEALTH;
    }
    value.clamp(MIN_HEALTH, MAX_HEALTH)
}

/// User-configured health rates.
///
/// Every field lies in `[0, 10]`; construction through [`HealthRules::new`] or
/// [`HealthRules::from_value`] enforces it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthRules {
    /// Health lost per 6-hour interval unsheltered.
    #[serde(rename = "decayPer6h")]
    pub decay_per_interval: f64,
    /// Health regained per 12-hour interval sheltered.
    #[serde(rename = "recoverPer12h")]
    pub recover_per_interval: f64,
    /// Multiplier applied to decay.
    pub decay_multiplier: f64,
    /// Multiplier applied to recovery.
    pub recover_multiplier: f64,
}

impl Default for HealthRules {
    fn default() -> Self {
        Self {
            decay_per_interval: 5.0,
            recover_per_interval: 1.0,
            decay_multiplier: 1.0,
            recover_multiplier: 1.0,
        }
    }
}

fn clamp_rate(value: f64) -> f64 {
    if value.is_nan() {
        return 0.0;
    }
    value.clamp(0.0, MAX_RATE)
}

impl HealthRules {
    /// Creates rules, clamping each parameter to `[0, 10]`.
    #[must_use]
    pub fn new(decay_per_interval: f64, recover_per_interval: f64, decay_multiplier: f64, recover_multiplier: f64) -> Self {
        Self {
            decay_per_interval,
            recover_per_interval,
            decay_multiplier,
            recover_multiplier,
        }
        .sanitized()
    }

    /// Returns a copy with every parameter clamped to `[0, 10]`.
    #[must_use]
    pub fn sanitized(self) -> Self {
        Self {
            decay_per_interval: clamp_rate(self.decay_per_interval),
            recover_per_interval: clamp_rate(self.recover_per_interval),
            decay_multiplier: clamp_rate(self.decay_multiplier),
            recover_multiplier: clamp_rate(self.recover_multiplier),
        }
    }

    /// Reads rules from a stored value.
    ///
    /// Missing or non-numeric fields fall back to the default rate; numeric
    /// fields (numbers or numeric strings) are clamped, so a stored `0` stays 0.
    #[must_use]
    pub fn from_value(raw: Option<&Value>) -> Self {
        let defaults = Self::default();
        let field = |key: &str, fallback: f64| {
            raw.and_then(|v| v.get(key))
                .and_then(coerce_number)
                .unwrap_or(fallback)
        };
        Self {
            decay_per_interval: field("decayPer6h", defaults.decay_per_interval),
            recover_per_interval: field("recoverPer12h", defaults.recover_per_interval),
            decay_multiplier: field("decayMultiplier", defaults.decay_multiplier),
            recover_multiplier: field("recoverMultiplier", defaults.recover_multiplier),
        }
        .sanitized()
    }
}

/// Why a health delta was (or was not) applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HealthCause {
    /// Nothing to apply.
    NoChange,
    /// Recovered while sheltered off-screen.
    ShelteredRecovery,
    /// Decayed while unsheltered off-screen.
    ExposedDecay,
}

impl HealthCause {
    /// Reason tag written into the document.
    #[must_use]
    pub const fn tag(&self) -> &'static str {
        match self {
            Self::NoChange => "无变化",
            Self::ShelteredRecovery => "离场受庇护休整",
            Self::ExposedDecay => "离场未受庇护自然衰减",
        }
    }
}

/// Formats the document reason text for a signed delta.
#[must_use]
pub fn reason_text(delta: i64, cause: HealthCause) -> String {
    if delta == 0 {
        return format!("0, {}", HealthCause::NoChange.tag());
    }
    if delta > 0 {
        format!("+{delta}, {}", cause.tag())
    } else {
        format!("{delta}, {}", cause.tag())
    }
}

/// Result of evaluating the off-screen health rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HealthDelta {
    /// Signed health change (not yet clamped against current health).
    pub delta: i64,
    /// Rule that produced the change.
    pub cause: HealthCause,
}

impl HealthDelta {
    /// The "nothing happened" result.
    pub const NONE: Self = Self {
        delta: 0,
        cause: HealthCause::NoChange,
    };

    /// Document reason text, e.g. `"-20, 离场未受庇护自然衰减"`.
    #[must_use]
    pub fn reason(&self) -> String {
        reason_text(self.delta, self.cause)
    }

    /// True when there is nothing to apply.
    #[must_use]
    pub const fn is_zero(&self) -> bool {
        self.delta == 0
    }
}

#[allow(clippy::cast_possible_truncation)]
fn scaled_intervals(hours: f64, interval: f64, rate: f64, multiplier: f64) -> i64 {
    let steps = (hours / interval).floor();
    (steps * rate * multiplier).floor() as i64
}

/// Evaluates the off-screen health rules.
///
/// Pure and deterministic. A non-positive or non-finite elapsed time, or a
/// computed delta of zero, yields [`HealthDelta::NONE`].
#[must_use]
pub fn settle_health(elapsed_hours: f64, sheltered: bool, rules: &HealthRules) -> HealthDelta {
    if !elapsed_hours.is_finite() || elapsed_hours <= 0.0 {
        return HealthDelta::NONE;
    }
    let rules = rules.sanitized();

    let (delta, cause) = if sheltered {
        let gained = scaled_intervals(
            elapsed_hours,
            RECOVER_INTERVAL_HOURS,
            rules.recover_per_interval,
            rules.recover_multiplier,
        );
        (gained, HealthCause::ShelteredRecovery)
    } else {
        let lost = scaled_intervals(
            elapsed_hours,
            DECAY_INTERVAL_HOURS,
            rules.decay_per_interval,
            rules.decay_multiplier,
        );
        (-lost, HealthCause::ExposedDecay)
    };

    if delta == 0 {
        return HealthDelta::NONE;
    }
    HealthDelta { delta, cause }
}

/// Derived health-status label, ordered from worst to best.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HealthStatus {
    /// Health at or below 0.
    Dead,
    /// Below 30.
    Critical,
    /// Below 60.
    Injured,
    /// Below 80.
    Unwell,
    /// 80 and above.
    Healthy,
}

impl HealthStatus {
    /// Classifies a health value (clamped first).
    #[must_use]
    pub fn from_health(health: f64) -> Self {
        let h = clamp_health(health);
        if h <= 0.0 {
            Self::Dead
        } else if h < 30.0 {
            Self::Critical
        } else if h < 60.0 {
            Self::Injured
        } else if h < 80.0 {
            Self::Unwell
        } else {
            Self::Healthy
        }
    }

    /// Label written into the document.
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Dead => "死亡",
            Self::Critical => "重病/濒死",
            Self::Injured => "生病/受伤",
            Self::Unwell => "亚健康",
            Self::Healthy => "健康",
        }
    }
}

impl fmt::Display for HealthStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}
