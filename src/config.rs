//! Per-pass settings.
//!
//! Settings live in the chat-scoped store and may change between any two
//! updates, so the engine reads them fresh at the start of every pass and
//! re-sanitizes them on the way in.

use crate::error::ReconcileResult;
use crate::health::HealthRules;
use crate::schema::store;
use crate::shelter::ShelterScope;
use crate::storage::StateStore;

/// Which write groups are logged at `info`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DebugFlags {
    /// Date rollover patches.
    pub date_logic: bool,
    /// Off-screen health and derived character labels.
    pub offstage_health: bool,
    /// Mission intel, goals, stages and rewards.
    pub mission_logic: bool,
}

impl DebugFlags {
    /// Every group enabled.
    #[must_use]
    pub const fn all() -> Self {
        Self {
            date_logic: true,
            offstage_health: true,
            mission_logic: true,
        }
    }

    /// Reads `eden.debug.*`.
    ///
    /// # Errors
    ///
    /// Propagates store failures.
    pub fn load(store: &dyn StateStore) -> ReconcileResult<Self> {
        let flag = |name: &str| store.flag(&format!("{}.{name}", store::DEBUG));
        Ok(Self {
            date_logic: flag("date_logic")?,
            offstage_health: flag("offstage_health")?,
            mission_logic: flag("mission_logic")?,
        })
    }
}

/// Everything a reconcile pass reads from outside the two documents.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReconcileSettings {
    /// Explicitly sheltered floor rooms.
    pub scope: ShelterScope,
    /// Off-screen health rates.
    pub health_rules: HealthRules,
    /// Patch the date when the clock wraps past midnight without one.
    /// Off unless the store enables it.
    pub date_rollover: bool,
    /// Diagnostic logging toggles.
    pub debug: DebugFlags,
}

impl ReconcileSettings {
    /// Reads all settings from the store.
    ///
    /// # Errors
    ///
    /// Propagates store failures; malformed stored values fall back to their
    /// defaults instead.
    pub fn load(store: &dyn StateStore) -> ReconcileResult<Self> {
        let rules = store.get(store::HEALTH_RULES)?;
        Ok(Self {
            scope: ShelterScope::load(store)?,
            health_rules: HealthRules::from_value(rules.as_ref()),
            date_rollover: store.flag(store::DATE_ROLLOVER)?,
            debug: DebugFlags::load(store)?,
        })
    }
}
