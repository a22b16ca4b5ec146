//! Document ingestion and write recording.
//!
//! [`classify`] partitions a world-state document once per pass into the
//! parts the settlements care about. [`PatchSet`] is the single write path
//! into the new document: it skips writes that would not change anything,
//! records the ones that do, and logs them when the write group's debug flag
//! is on.

use std::fmt;

use serde::Serialize;
use serde_json::Value;

use crate::character::is_character;
use crate::config::DebugFlags;
use crate::schema;
use crate::shelter::RoomOccupancy;
use crate::time::WorldClock;
use crate::value::{get_in, same_value, set_in};

/// Where a character record lives.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum CharacterPath {
    /// Top-level key.
    Top(String),
    /// Entry under `临时NPC`.
    Temporary(String),
}

impl CharacterPath {
    /// Character name used for room lookups.
    #[must_use]
    pub fn name(&self) -> &str {
        match self {
            Self::Top(name) | Self::Temporary(name) => name,
        }
    }

    /// Path segments of the record itself.
    #[must_use]
    pub fn segments(&self) -> Vec<&str> {
        match self {
            Self::Top(name) => vec![name.as_str()],
            Self::Temporary(name) => vec![schema::TEMP_CHARACTERS, name.as_str()],
        }
    }

    /// Path segments of one field of the record.
    #[must_use]
    pub fn field<'a>(&'a self, key: &'a str) -> Vec<&'a str> {
        let mut segments = self.segments();
        segments.push(key);
        segments
    }

    /// Reads the record from a document.
    #[must_use]
    pub fn lookup<'a>(&self, doc: &'a Value) -> Option<&'a Value> {
        get_in(doc, &self.segments())
    }
}

impl fmt::Display for CharacterPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Top(name) => f.write_str(name),
            Self::Temporary(name) => write!(f, "{}.{name}", schema::TEMP_CHARACTERS),
        }
    }
}

/// A document partitioned into the parts a pass reads.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DocumentParts {
    /// World clock text.
    pub clock: WorldClock,
    /// Room occupancy.
    pub rooms: RoomOccupancy,
    /// Character records, top-level first, in document order.
    pub characters: Vec<CharacterPath>,
    /// True if a mission object is present.
    pub has_mission: bool,
}

/// Partitions a document. Malformed sections are treated as absent.
#[must_use]
pub fn classify(doc: &Value) -> DocumentParts {
    let mut characters = Vec::new();
    if let Value::Object(map) = doc {
        characters.extend(
            map.iter()
                .filter(|(key, value)| !schema::is_reserved_key(key) && is_character(value))
                .map(|(key, _)| CharacterPath::Top(key.clone())),
        );
        if let Some(Value::Object(temporary)) = map.get(schema::TEMP_CHARACTERS) {
            characters.extend(
                temporary
                    .iter()
                    .filter(|(name, value)| !name.is_empty() && is_character(value))
                    .map(|(name, _)| CharacterPath::Temporary(name.clone())),
            );
        }
    }

    DocumentParts {
        clock: WorldClock::from_document(doc),
        rooms: doc
            .get(schema::ROOMS)
            .map(RoomOccupancy::from_value)
            .unwrap_or_default(),
        characters,
        has_mission: doc.get(schema::MISSION).is_some_and(Value::is_object),
    }
}

/// Which settlement issued a write.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum WriteGroup {
    /// Date rollover.
    Date,
    /// Character health and labels.
    Character,
    /// Mission progress.
    Mission,
}

impl WriteGroup {
    const fn target(self) -> &'static str {
        match self {
            Self::Date => "date",
            Self::Character => "character",
            Self::Mission => "mission",
        }
    }

    const fn enabled(self, debug: DebugFlags) -> bool {
        match self {
            Self::Date => debug.date_logic,
            Self::Character => debug.offstage_health,
            Self::Mission => debug.mission_logic,
        }
    }
}

/// One applied write.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FieldWrite {
    /// Dotted path of the written field.
    pub path: String,
    /// Previous value, if any.
    pub before: Option<Value>,
    /// New value.
    pub after: Value,
    /// Settlement that wrote it.
    pub group: WriteGroup,
}

/// Records every write a pass applies to the new document.
#[derive(Debug, Clone, Default)]
pub struct PatchSet {
    debug: DebugFlags,
    writes: Vec<FieldWrite>,
}

impl PatchSet {
    /// Creates an empty patch set.
    #[must_use]
    pub fn new(debug: DebugFlags) -> Self {
        Self {
            debug,
            writes: Vec::new(),
        }
    }

    /// Writes `value` at `segments` unless it is already there.
    ///
    /// Returns true if the document changed. A write that cannot land (an
    /// array in the way) is logged and not recorded.
    pub fn write<S: AsRef<str>>(&mut self, doc: &mut Value, segments: &[S], value: Value, group: WriteGroup) -> bool {
        let before = get_in(doc, segments).cloned();
        if same_value(before.as_ref(), Some(&value)) {
            return false;
        }
        let path = segments.iter().map(AsRef::<str>::as_ref).collect::<Vec<_>>().join(".");
        if !set_in(doc, segments, value.clone()) {
            tracing::warn!(
                target: "stat_reconcile::write",
                group = group.target(),
                path = %path,
                "document.write.unreachable"
            );
            return false;
        }

        if group.enabled(self.debug) {
            let shown = before.as_ref().map_or_else(|| "<none>".to_string(), ToString::to_string);
            tracing::info!(
                target: "stat_reconcile::write",
                group = group.target(),
                path = %path,
                before = %shown,
                after = %value,
                "document.write"
            );
        }
        self.writes.push(FieldWrite {
            path,
            before,
            after: value,
            group,
        });
        true
    }

    /// Debug flags in effect.
    #[must_use]
    pub const fn debug(&self) -> DebugFlags {
        self.debug
    }

    /// Number of writes recorded so far.
    #[must_use]
    pub fn len(&self) -> usize {
        self.writes.len()
    }

    /// True if nothing was written.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.writes.is_empty()
    }

    /// Writes recorded so far.
    #[must_use]
    pub fn writes(&self) -> &[FieldWrite] {
        &self.writes
    }

    /// Consumes the set, returning the writes.
    #[must_use]
    pub fn into_writes(self) -> Vec<FieldWrite> {
        self.writes
    }
}
