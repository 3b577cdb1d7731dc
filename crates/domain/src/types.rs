// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use crate::error::DomainError;
use crate::validation::validate_room_type;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// A room-size category such as `4-person` or `8-person`.
///
/// The set of categories is open-ended; any label passing
/// [`validate_room_type`] is accepted.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct RoomType(String);

impl RoomType {
    /// Creates a validated room type.
    ///
    /// Surrounding whitespace is trimmed before validation.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::InvalidRoomType` if the label is empty, too long,
    /// or contains characters other than ASCII letters, digits, `-` and `_`.
    pub fn new(value: &str) -> Result<Self, DomainError> {
        let trimmed: &str = value.trim();
        validate_room_type(trimmed)?;
        Ok(Self(trimmed.to_string()))
    }

    /// Returns the label.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl FromStr for RoomType {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl TryFrom<String> for RoomType {
    type Error = DomainError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(&value)
    }
}

impl From<RoomType> for String {
    fn from(value: RoomType) -> Self {
        value.0
    }
}

impl std::fmt::Display for RoomType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A registered student account.
///
/// Administrators share the table but never take part in draws or selection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Student {
    /// Database identifier.
    pub student_id: i64,
    /// Unique login handle.
    pub username: String,
    /// Display name.
    pub full_name: String,
    /// Administrators are excluded from lottery and bed selection.
    pub is_admin: bool,
}

/// A dormitory building.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Building {
    pub building_id: i64,
    pub name: String,
}

/// A room inside a building.
///
/// `current_occupancy` is derived: it always equals the number of occupied
/// beds in the room and is recomputed after every occupancy change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Room {
    /// Database identifier.
    pub room_id: i64,
    /// Owning building.
    pub building_id: i64,
    /// Human-facing number, unique within the building.
    pub room_number: String,
    /// Category the room belongs to.
    pub room_type: RoomType,
    /// Number of beds in the room.
    pub max_capacity: u32,
    /// Count of occupied beds.
    pub current_occupancy: u32,
    /// Unavailable rooms cannot be claimed.
    pub is_available: bool,
}

/// A single bed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bed {
    pub bed_id: i64,
    pub room_id: i64,
    /// 1-based position within the room.
    pub bed_number: u32,
    /// True iff exactly one live selection references this bed.
    pub is_occupied: bool,
}

/// A student's live claim on a bed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BedSelection {
    /// The canonical identifier assigned by the database.
    /// `None` indicates the selection has not been persisted yet.
    pub selection_id: Option<i64>,
    /// The holding student.
    pub student_id: i64,
    /// Room containing the bed.
    pub room_id: i64,
    /// The claimed bed.
    pub bed_id: i64,
    /// Confirmed selections are frozen for self-service.
    pub is_confirmed: bool,
    /// RFC 3339 timestamp of the claim. `None` until persisted.
    pub selected_at: Option<String>,
}

impl BedSelection {
    /// Creates an unpersisted, unconfirmed selection.
    #[must_use]
    pub const fn new(student_id: i64, room_id: i64, bed_id: i64) -> Self {
        Self {
            selection_id: None,
            student_id,
            room_id,
            bed_id,
            is_confirmed: false,
            selected_at: None,
        }
    }
}

/// Manual room-type assignment made by an administrator.
///
/// At most one exists per student; a new one replaces the old.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoomTypeAllocation {
    pub student_id: i64,
    pub room_type: RoomType,
    /// Administrator who made the assignment.
    pub assigned_by: i64,
    pub notes: Option<String>,
    pub assigned_at: String,
}

/// One bucket of a lottery composition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BucketSpec {
    /// Room type of every group in this bucket.
    pub room_type: RoomType,
    /// Number of groups of this type.
    pub group_count: u32,
    /// Students per group.
    pub group_size: u32,
}

/// Target room-type composition of a lottery event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Composition {
    /// Every participant receives one room type, split into groups of
    /// `group_size` with no upper bound on the number of groups.
    Uniform {
        room_type: RoomType,
        group_size: u32,
    },
    /// Ordered buckets filled one after another.
    Buckets { buckets: Vec<BucketSpec> },
}

impl Composition {
    /// Total number of seats, or `None` when the composition is unbounded.
    #[must_use]
    pub fn capacity(&self) -> Option<u64> {
        match self {
            Self::Uniform { .. } => None,
            Self::Buckets { buckets } => Some(
                buckets
                    .iter()
                    .map(|b| u64::from(b.group_count) * u64::from(b.group_size))
                    .sum(),
            ),
        }
    }
}

/// A lottery round.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LotteryEvent {
    pub event_id: i64,
    pub name: String,
    /// RFC 3339 timestamp.
    pub scheduled_at: String,
    pub composition: Composition,
    /// Once set, results are visible and immutable.
    pub is_published: bool,
}

/// One student's outcome in a lottery event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LotteryResult {
    pub event_id: i64,
    pub student_id: i64,
    /// 1-based position in the drawn permutation, unique within the event.
    pub draw_number: u32,
    /// Cohort identifier in the form `{room_type}-{bucket_index}`.
    pub group_label: String,
    /// Assigned room type. Results recorded without a type do not grant
    /// eligibility for bed selection.
    pub room_type: Option<RoomType>,
}
