//! Reconciliation driver.
//!
//! One call per "document updated" notification. The pass is synchronous and
//! runs a fixed order: settings, optional date rollover, elapsed time,
//! classification, per-character settlement, mission settlement. It never
//! fails; anything it cannot read degrades to "no derived writes".

use std::sync::Arc;

use serde::Serialize;
use serde_json::Value;

use crate::config::ReconcileSettings;
use crate::document::{classify, FieldWrite, PatchSet, WriteGroup};
use crate::error::ReconcileResult;
use crate::mission::{settle_mission, MissionCatalog, MissionOutcome, MissionReport};
use crate::schema;
use crate::settlement::{settle_character, CharacterReport, SettlementContext};
use crate::storage::StateStore;
use crate::time::{elapsed_hours, missed_midnight, WorldClock};
use crate::value::{coerce_number, get_in, number_value};

/// Key of the world document inside the host's variable envelope.
pub const STAT_DATA: &str = "stat_data";

/// Result of one reconcile pass.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReconcileReport {
    /// Hours between the two clocks, `None` when unknown.
    pub elapsed_hours: Option<f64>,
    /// Patched date text, if the rollover fired.
    pub date_rolled_over: Option<String>,
    /// Per-character results, in settlement order.
    pub characters: Vec<CharacterReport>,
    /// Mission results.
    pub mission: MissionReport,
    /// Every write applied to the new document.
    pub writes: Vec<FieldWrite>,
}

impl ReconcileReport {
    fn empty() -> Self {
        Self {
            elapsed_hours: None,
            date_rolled_over: None,
            characters: Vec::new(),
            mission: MissionReport {
                outcome: MissionOutcome::Absent,
                intel_seeded: false,
                intel_synced: false,
            },
            writes: Vec::new(),
        }
    }

    /// True if the pass changed nothing.
    #[must_use]
    pub fn is_noop(&self) -> bool {
        self.writes.is_empty()
    }

    /// Writes issued by one settlement.
    pub fn writes_for(&self, group: WriteGroup) -> impl Iterator<Item = &FieldWrite> {
        self.writes.iter().filter(move |write| write.group == group)
    }

    /// The report of one character, by record path.
    #[must_use]
    pub fn character(&self, path: &str) -> Option<&CharacterReport> {
        self.characters.iter().find(|report| report.path == path)
    }
}

/// Receiver of the host's "variables updated" notification.
pub trait UpdateListener: Send + Sync {
    /// Called after the narrative engine rewrote the variables, with the
    /// previous snapshot for comparison. `new_variables` may be patched.
    fn on_update_ended(&self, new_variables: &mut Value, old_variables: &Value);
}

/// The derived-state reconciliation engine.
#[derive(Clone)]
pub struct Reconciler {
    store: Arc<dyn StateStore>,
    catalog: Arc<MissionCatalog>,
}

impl Reconciler {
    /// Creates an engine over a chat store, using the builtin mission catalogue.
    #[must_use]
    pub fn new(store: Arc<dyn StateStore>) -> Self {
        Self::with_catalog(store, MissionCatalog::builtin())
    }

    /// Creates an engine with an explicit mission catalogue.
    #[must_use]
    pub fn with_catalog(store: Arc<dyn StateStore>, catalog: Arc<MissionCatalog>) -> Self {
        Self { store, catalog }
    }

    /// Get a reference to the chat store.
    pub fn store(&self) -> &Arc<dyn StateStore> {
        &self.store
    }

    /// Get a reference to the mission catalogue.
    pub fn catalog(&self) -> &Arc<MissionCatalog> {
        &self.catalog
    }

    /// Reads the current settings from the chat store.
    ///
    /// # Errors
    ///
    /// Propagates store failures.
    pub fn settings(&self) -> ReconcileResult<ReconcileSettings> {
        ReconcileSettings::load(self.store.as_ref())
    }

    /// Reconciles `new` against `old` using freshly loaded settings.
    ///
    /// A store failure falls back to default settings for this pass.
    pub fn reconcile(&self, old: &Value, new: &mut Value) -> ReconcileReport {
        let settings = self.settings().unwrap_or_else(|err| {
            tracing::warn!(
                target: "stat_reconcile::engine",
                error = %err,
                "settings.load_failed"
            );
            ReconcileSettings::default()
        });
        self.reconcile_with(&settings, old, new)
    }

    /// Reconciles `new` against `old` with the given settings.
    pub fn reconcile_with(&self, settings: &ReconcileSettings, old: &Value, new: &mut Value) -> ReconcileReport {
        let mut patches = PatchSet::new(settings.debug);
        let old_clock = WorldClock::from_document(old);

        let date_rolled_over = if settings.date_rollover {
            roll_date_over(&old_clock, new, &mut patches)
        } else {
            None
        };

        let parts = classify(new);
        let elapsed = elapsed_hours(&old_clock, &parts.clock);
        match elapsed {
            Some(hours) if settings.debug.date_logic => {
                tracing::info!(target: "stat_reconcile::date", hours, "clock.elapsed");
            }
            None if old_clock.time != parts.clock.time => {
                tracing::debug!(
                    target: "stat_reconcile::date",
                    old = %old_clock,
                    new = %parts.clock,
                    "clock.elapsed_unknown"
                );
            }
            _ => {}
        }

        let ctx = SettlementContext {
            elapsed_hours: elapsed,
            rooms: &parts.rooms,
            scope: &settings.scope,
            rules: &settings.health_rules,
        };
        let characters = parts
            .characters
            .iter()
            .filter_map(|path| settle_character(&ctx, path, old, new, &mut patches))
            .collect();

        let mission = settle_mission(&self.catalog, old, new, &mut patches);

        ReconcileReport {
            elapsed_hours: elapsed,
            date_rolled_over,
            characters,
            mission,
            writes: patches.into_writes(),
        }
    }

    /// Reconciles the host's variable envelope (`{"stat_data": {...}}`).
    ///
    /// Nothing happens if the new envelope carries no world document.
    pub fn reconcile_variables(&self, old_variables: &Value, new_variables: &mut Value) -> ReconcileReport {
        let Some(new) = new_variables.get_mut(STAT_DATA).filter(|doc| doc.is_object()) else {
            return ReconcileReport::empty();
        };
        let empty = Value::Object(serde_json::Map::new());
        let old = old_variables.get(STAT_DATA).unwrap_or(&empty);
        self.reconcile(old, new)
    }
}

impl UpdateListener for Reconciler {
    fn on_update_ended(&self, new_variables: &mut Value, old_variables: &Value) {
        let report = self.reconcile_variables(old_variables, new_variables);
        tracing::debug!(
            target: "stat_reconcile::engine",
            writes = report.writes.len(),
            characters = report.characters.len(),
            "reconcile.completed"
        );
    }
}

/// Advances the date when the clock wrapped past midnight but the date text
/// did not move. Bumps a numeric day counter alongside.
fn roll_date_over(old_clock: &WorldClock, new: &mut Value, patches: &mut PatchSet) -> Option<String> {
    let new_clock = WorldClock::from_document(new);
    let Some(patched) = missed_midnight(old_clock, &new_clock) else {
        if patches.debug().date_logic && old_clock.time != new_clock.time {
            tracing::info!(
                target: "stat_reconcile::date",
                old = %old_clock,
                new = %new_clock,
                "date.rollover.not_needed"
            );
        }
        return None;
    };

    patches.write(
        new,
        &[schema::WORLD, schema::WORLD_DATE],
        Value::String(patched.clone()),
        WriteGroup::Date,
    );
    let day_path = [schema::WORLD, schema::WORLD_DAY_COUNT];
    if let Some(days) = get_in(new, &day_path).filter(|v| v.is_number()).and_then(coerce_number) {
        patches.write(new, &day_path, number_value(days + 1.0), WriteGroup::Date);
    }
    tracing::info!(
        target: "stat_reconcile::date",
        from = %new_clock.date,
        to = %patched,
        "date.rollover.patched"
    );
    Some(patched)
}
