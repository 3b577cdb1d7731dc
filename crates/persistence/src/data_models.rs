// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use dorm_lottery_audit::AuditEvent;
use dorm_lottery_domain::{Bed, Room, RoomType};
use serde::{Deserialize, Serialize};

/// Serializable representation of an Actor.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActorData {
    pub id: i64,
    pub role: String,
}

/// Serializable representation of an Action.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActionData {
    pub name: String,
    pub details: Option<String>,
}

/// Serializable representation of a `StateSnapshot`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StateSnapshotData {
    pub data: String,
}

/// An audit event as read back from storage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredAuditEvent {
    pub event_id: i64,
    pub event: AuditEvent,
    pub created_at: String,
}

/// A free bed together with the room that holds it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AvailableBed {
    pub room: Room,
    pub bed: Bed,
}

/// Requested changes to a room; `None` leaves a field as it is.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RoomChanges {
    pub room_type: Option<RoomType>,
    pub capacity: Option<u32>,
    pub is_available: Option<bool>,
}

/// A room whose occupancy counters disagree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoomDiscrepancy {
    pub room_id: i64,
    /// The stored `current_occupancy` column.
    pub stored_occupancy: i64,
    /// Beds in the room flagged occupied.
    pub occupied_beds: i64,
    /// Live selections referencing the room.
    pub live_selections: i64,
}

/// A bed whose occupancy flag disagrees with the selection ledger.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BedDiscrepancy {
    pub bed_id: i64,
    pub is_occupied: bool,
    pub live_selections: i64,
}

/// Result of a read-only consistency scan.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IntegrityReport {
    pub rooms_checked: usize,
    pub beds_checked: usize,
    pub room_discrepancies: Vec<RoomDiscrepancy>,
    pub bed_discrepancies: Vec<BedDiscrepancy>,
}

impl IntegrityReport {
    /// Returns true if no discrepancy was found.
    #[must_use]
    pub fn is_consistent(&self) -> bool {
        self.room_discrepancies.is_empty() && self.bed_discrepancies.is_empty()
    }
}
