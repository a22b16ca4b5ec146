//! Shelter scope and the shelter resolver.
//!
//! A character counts as sheltered when it occupies a temporary entry room,
//! a core room, the anchor apartment, or a numbered floor room the user has
//! explicitly added to the shelter scope. Each floor's scope is capped by the
//! shelter level.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{ReconcileResult, ScopeError};
use crate::schema::{self, rooms};
use crate::storage::StateStore;
use crate::value::get_path;

/// Hard cap on explicitly sheltered rooms per floor.
pub const MAX_ROOMS_PER_FLOOR: usize = 12;

/// A floor whose numbered rooms can be added to the shelter scope.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Floor {
    /// The shelter's own floor.
    #[serde(rename = "20")]
    F20,
    /// The floor below, unlocked later.
    #[serde(rename = "19")]
    F19,
}

impl Floor {
    /// All floors in search order.
    pub const ALL: [Self; 2] = [Self::F20, Self::F19];

    /// Floor identifier as used in the document and the store.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::F20 => "20",
            Self::F19 => "19",
        }
    }

    /// Parses a floor identifier.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim() {
            "20" => Some(Self::F20),
            "19" => Some(Self::F19),
            _ => None,
        }
    }

    /// Occupancy path of this floor's rooms, relative to the rooms map.
    #[must_use]
    pub const fn rooms_path(&self) -> &'static str {
        match self {
            Self::F20 => rooms::FLOOR_20,
            Self::F19 => rooms::FLOOR_19,
        }
    }

    /// Number of rooms that may be explicitly sheltered at a shelter level.
    #[must_use]
    pub fn capacity(&self, level: i64) -> usize {
        match self {
            Self::F20 => match level {
                i64::MIN..=2 => 0,
                3 => 3,
                4 => 6,
                _ => MAX_ROOMS_PER_FLOOR,
            },
            Self::F19 => {
                if level < 6 {
                    return 0;
                }
                let rooms = level.saturating_sub(5).saturating_mul(3);
                usize::try_from(rooms.clamp(0, 12)).unwrap_or(0)
            }
        }
    }

    /// True if the anchor apartment is on this floor and `room` is it.
    #[must_use]
    pub fn is_anchor(&self, room: &str) -> bool {
        *self == Self::F20 && room == rooms::ANCHOR_ROOM
    }
}

impl fmt::Display for Floor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Rooms explicitly granted shelter, per floor.
///
/// Always normalized: room ids are trimmed, non-empty, deduplicated and
/// sorted, and the anchor room never appears in the explicit list.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ShelterScope {
    floors: BTreeMap<String, BTreeSet<String>>,
}

/// What a successful toggle did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToggleOutcome {
    /// The room is now sheltered.
    Added,
    /// The room is no longer sheltered.
    Removed,
}

impl ShelterScope {
    /// Creates an empty scope.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a normalized scope from a stored value.
    ///
    /// Non-object input yields an empty scope; non-array floor entries and
    /// non-string rooms are dropped.
    #[must_use]
    pub fn from_value(raw: Option<&Value>) -> Self {
        let mut scope = Self::new();
        let Some(Value::Object(map)) = raw else {
            return scope;
        };
        for (floor, listed) in map {
            let Value::Array(listed) = listed else {
                continue;
            };
            let entry = scope.floors.entry(floor.clone()).or_default();
            for room in listed.iter().filter_map(Value::as_str) {
                let room = room.trim();
                if room.is_empty() || (floor == Floor::F20.as_str() && room == rooms::ANCHOR_ROOM) {
                    continue;
                }
                entry.insert(room.to_string());
            }
        }
        scope
    }

    /// Serializes the scope into its stored form.
    #[must_use]
    pub fn to_value(&self) -> Value {
        serde_json::to_value(self).unwrap_or(Value::Null)
    }

    /// Loads the scope from the chat store.
    pub fn load(store: &dyn StateStore) -> ReconcileResult<Self> {
        let raw = store.get(schema::store::SHELTER_SCOPE)?;
        Ok(Self::from_value(raw.as_ref()))
    }

    /// Persists the scope to the chat store.
    pub fn save(&self, store: &dyn StateStore) -> ReconcileResult<()> {
        store.set(schema::store::SHELTER_SCOPE, self.to_value())?;
        Ok(())
    }

    /// Explicitly sheltered rooms on a floor, sorted.
    pub fn rooms(&self, floor: Floor) -> impl Iterator<Item = &str> {
        self.floors
            .get(floor.as_str())
            .into_iter()
            .flat_map(|rooms| rooms.iter().map(String::as_str))
    }

    /// Number of explicitly sheltered rooms on a floor.
    #[must_use]
    pub fn room_count(&self, floor: Floor) -> usize {
        self.floors.get(floor.as_str()).map_or(0, BTreeSet::len)
    }

    /// True if `room` on `floor` is in the explicit list.
    #[must_use]
    pub fn contains(&self, floor: Floor, room: &str) -> bool {
        self.floors
            .get(floor.as_str())
            .is_some_and(|rooms| rooms.contains(room))
    }

    /// True if no floor has any explicit room.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.floors.values().all(BTreeSet::is_empty)
    }

    /// True if the floor can be edited at this shelter level.
    #[must_use]
    pub fn can_edit_floor(floor: Floor, level: i64) -> bool {
        floor.capacity(level) > 0
    }

    /// Adds or removes a room.
    ///
    /// # Errors
    ///
    /// - `FloorLocked` if the floor has no capacity at `level`
    /// - `AnchorRoom` when toggling the always-sheltered apartment
    /// - `CapacityExceeded` when adding to a full floor
    /// - `EmptyRoom` for a blank room id
    pub fn toggle_room(&mut self, floor: Floor, room: &str, level: i64) -> Result<ToggleOutcome, ScopeError> {
        let room = room.trim();
        if room.is_empty() {
            return Err(ScopeError::EmptyRoom);
        }
        let capacity = floor.capacity(level);
        if capacity == 0 {
            return Err(ScopeError::FloorLocked { floor, level });
        }
        if floor.is_anchor(room) {
            return Err(ScopeError::AnchorRoom {
                room: room.to_string(),
            });
        }

        let rooms = self.floors.entry(floor.as_str().to_string()).or_default();
        if rooms.remove(room) {
            return Ok(ToggleOutcome::Removed);
        }
        if rooms.len() >= capacity {
            return Err(ScopeError::CapacityExceeded { floor, capacity });
        }
        rooms.insert(room.to_string());
        Ok(ToggleOutcome::Added)
    }

    /// Removes every explicit room.
    pub fn clear(&mut self) {
        self.floors.clear();
    }

    /// Instruction the host sends to the narrative engine to announce the
    /// current scope. Empty when nothing is sheltered.
    #[must_use]
    pub fn instruction_text(&self) -> String {
        let parts: Vec<String> = Floor::ALL
            .iter()
            .filter(|floor| self.room_count(**floor) > 0)
            .map(|floor| {
                let rooms: Vec<&str> = self.rooms(*floor).collect();
                format!("楼层{floor}的{}房间", rooms.join("、"))
            })
            .collect();
        if parts.is_empty() {
            return String::new();
        }
        format!(
            "{{{{user}}}}指令伊甸将{}，设为其生存庇护范围，这些房间的通风系统、供暖系统将与伊甸同步：进入该房间的角色将不再因恶劣天气扣减健康值。",
            parts.join("、以及")
        )
    }
}

/// Temporary rooms next to the entrance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntranceRoom {
    /// Temporary guest room A.
    GuestA,
    /// Temporary guest room B.
    GuestB,
}

/// Rooms inside the shelter core.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CoreRoom {
    /// Master bedroom.
    MasterBedroom,
    /// Master bathroom.
    MasterBath,
}

/// Where a character was found.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RoomLocation {
    /// A temporary room next to the entrance.
    Entrance(EntranceRoom),
    /// A room in the shelter core.
    Core(CoreRoom),
    /// A numbered room on a floor.
    Floor {
        /// Floor of the room.
        floor: Floor,
        /// Room number.
        room: String,
    },
    /// Not listed in any room.
    Nowhere,
}

/// Typed view of the document's room occupancy map.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RoomOccupancy {
    entrance: Vec<(EntranceRoom, Vec<String>)>,
    core: Vec<(CoreRoom, Vec<String>)>,
    floors: Vec<(Floor, Vec<(String, Vec<String>)>)>,
}

fn names_at(rooms_doc: &Value, path: &str) -> Vec<String> {
    match get_path(rooms_doc, path) {
        Some(Value::Array(names)) => names
            .iter()
            .filter_map(Value::as_str)
            .map(str::to_string)
            .collect(),
        _ => Vec::new(),
    }
}

impl RoomOccupancy {
    /// Reads the rooms map (the value under `房间`). Malformed parts are
    /// treated as empty.
    #[must_use]
    pub fn from_value(rooms_doc: &Value) -> Self {
        let entrance = vec![
            (EntranceRoom::GuestA, names_at(rooms_doc, rooms::ENTRANCE_A)),
            (EntranceRoom::GuestB, names_at(rooms_doc, rooms::ENTRANCE_B)),
        ];
        let core = vec![
            (CoreRoom::MasterBedroom, names_at(rooms_doc, rooms::MASTER_BEDROOM)),
            (CoreRoom::MasterBath, names_at(rooms_doc, rooms::MASTER_BATH)),
        ];
        let floors: Vec<(Floor, Vec<(String, Vec<String>)>)> = Floor::ALL
            .iter()
            .map(|floor| {
                let numbered: Vec<(String, Vec<String>)> = match get_path(rooms_doc, floor.rooms_path()) {
                    Some(Value::Object(map)) => map
                        .iter()
                        .map(|(room, data)| {
                            let residents = data
                                .get(rooms::RESIDENTS)
                                .map(|v| names_at(v, ""))
                                .unwrap_or_default();
                            (room.clone(), residents)
                        })
                        .collect(),
                    _ => Vec::new(),
                };
                (*floor, numbered)
            })
            .collect();
        Self { entrance, core, floors }
    }

    /// Finds the first room `name` occupies, searching entrance rooms, core
    /// rooms, then each floor in order.
    #[must_use]
    pub fn locate(&self, name: &str) -> RoomLocation {
        if name.is_empty() {
            return RoomLocation::Nowhere;
        }
        let holds = |names: &Vec<String>| names.iter().any(|n| n == name);

        if let Some((room, _)) = self.entrance.iter().find(|(_, names)| holds(names)) {
            return RoomLocation::Entrance(*room);
        }
        if let Some((room, _)) = self.core.iter().find(|(_, names)| holds(names)) {
            return RoomLocation::Core(*room);
        }
        for (floor, numbered) in &self.floors {
            if let Some((room, _)) = numbered.iter().find(|(_, names)| holds(names)) {
                return RoomLocation::Floor {
                    floor: *floor,
                    room: room.clone(),
                };
            }
        }
        RoomLocation::Nowhere
    }
}

/// Returns true if the character currently occupies a sheltered location.
#[must_use]
pub fn is_sheltered(rooms: &RoomOccupancy, name: &str, scope: &ShelterScope) -> bool {
    match rooms.locate(name) {
        RoomLocation::Entrance(_) | RoomLocation::Core(_) => true,
        RoomLocation::Floor { floor, room } => floor.is_anchor(&room) || scope.contains(floor, &room),
        RoomLocation::Nowhere => false,
    }
}
