// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Diesel row structs and their conversion into domain types.
//!
//! Integer flags are stored as 0/1 and counts as `INTEGER`; every
//! conversion back into the domain re-validates the stored value.

use diesel::prelude::*;
use dorm_lottery_audit::{Actor, ActorRole, HistoryAction, HistoryEntry, RecordedHistoryEntry};
use dorm_lottery_domain::{
    Bed, BedSelection, Building, Composition, LotteryEvent, LotteryResult, Room, RoomType,
    RoomTypeAllocation, Student,
};
use num_traits::ToPrimitive;

use crate::diesel_schema::{
    allocation_history, bed_selections, beds, buildings, lottery_events, lottery_results,
    room_type_allocations, rooms, students,
};
use crate::error::PersistenceError;

#[derive(Queryable, Selectable)]
#[diesel(table_name = students)]
pub struct StudentRow {
    pub student_id: i64,
    pub username: String,
    pub full_name: String,
    pub is_admin: i32,
}

impl From<StudentRow> for Student {
    fn from(row: StudentRow) -> Self {
        Self {
            student_id: row.student_id,
            username: row.username,
            full_name: row.full_name,
            is_admin: row.is_admin != 0,
        }
    }
}

#[derive(Queryable, Selectable)]
#[diesel(table_name = buildings)]
pub struct BuildingRow {
    pub building_id: i64,
    pub name: String,
}

impl From<BuildingRow> for Building {
    fn from(row: BuildingRow) -> Self {
        Self {
            building_id: row.building_id,
            name: row.name,
        }
    }
}

#[derive(Queryable, Selectable)]
#[diesel(table_name = rooms)]
pub struct RoomRow {
    pub room_id: i64,
    pub building_id: i64,
    pub room_number: String,
    pub room_type: String,
    pub max_capacity: i32,
    pub current_occupancy: i32,
    pub is_available: i32,
}

impl TryFrom<RoomRow> for Room {
    type Error = PersistenceError;

    fn try_from(row: RoomRow) -> Result<Self, Self::Error> {
        Ok(Self {
            room_id: row.room_id,
            building_id: row.building_id,
            room_number: row.room_number,
            room_type: RoomType::new(&row.room_type)?,
            max_capacity: to_count("rooms.max_capacity", row.max_capacity)?,
            current_occupancy: to_count("rooms.current_occupancy", row.current_occupancy)?,
            is_available: row.is_available != 0,
        })
    }
}

#[derive(Queryable, Selectable)]
#[diesel(table_name = beds)]
pub struct BedRow {
    pub bed_id: i64,
    pub room_id: i64,
    pub bed_number: i32,
    pub is_occupied: i32,
}

impl TryFrom<BedRow> for Bed {
    type Error = PersistenceError;

    fn try_from(row: BedRow) -> Result<Self, Self::Error> {
        Ok(Self {
            bed_id: row.bed_id,
            room_id: row.room_id,
            bed_number: to_count("beds.bed_number", row.bed_number)?,
            is_occupied: row.is_occupied != 0,
        })
    }
}

#[derive(Queryable, Selectable)]
#[diesel(table_name = bed_selections)]
pub struct SelectionRow {
    pub selection_id: i64,
    pub student_id: i64,
    pub room_id: i64,
    pub bed_id: i64,
    pub is_confirmed: i32,
    pub selected_at: String,
}

impl From<SelectionRow> for BedSelection {
    fn from(row: SelectionRow) -> Self {
        Self {
            selection_id: Some(row.selection_id),
            student_id: row.student_id,
            room_id: row.room_id,
            bed_id: row.bed_id,
            is_confirmed: row.is_confirmed != 0,
            selected_at: Some(row.selected_at),
        }
    }
}

#[derive(Queryable, Selectable)]
#[diesel(table_name = lottery_events)]
pub struct LotteryEventRow {
    pub event_id: i64,
    pub name: String,
    pub scheduled_at: String,
    pub composition_json: String,
    pub is_published: i32,
}

impl TryFrom<LotteryEventRow> for LotteryEvent {
    type Error = PersistenceError;

    fn try_from(row: LotteryEventRow) -> Result<Self, Self::Error> {
        let composition: Composition = serde_json::from_str(&row.composition_json)?;
        Ok(Self {
            event_id: row.event_id,
            name: row.name,
            scheduled_at: row.scheduled_at,
            composition,
            is_published: row.is_published != 0,
        })
    }
}

#[derive(Queryable, Selectable)]
#[diesel(table_name = lottery_results)]
pub struct LotteryResultRow {
    pub event_id: i64,
    pub student_id: i64,
    pub draw_number: i32,
    pub group_label: String,
    pub room_type: Option<String>,
}

impl TryFrom<LotteryResultRow> for LotteryResult {
    type Error = PersistenceError;

    fn try_from(row: LotteryResultRow) -> Result<Self, Self::Error> {
        Ok(Self {
            event_id: row.event_id,
            student_id: row.student_id,
            draw_number: to_count("lottery_results.draw_number", row.draw_number)?,
            group_label: row.group_label,
            room_type: row.room_type.as_deref().map(RoomType::new).transpose()?,
        })
    }
}

#[derive(Queryable, Selectable)]
#[diesel(table_name = room_type_allocations)]
pub struct RoomTypeAllocationRow {
    pub student_id: i64,
    pub room_type: String,
    pub assigned_by: i64,
    pub notes: Option<String>,
    pub assigned_at: String,
}

impl TryFrom<RoomTypeAllocationRow> for RoomTypeAllocation {
    type Error = PersistenceError;

    fn try_from(row: RoomTypeAllocationRow) -> Result<Self, Self::Error> {
        Ok(Self {
            student_id: row.student_id,
            room_type: RoomType::new(&row.room_type)?,
            assigned_by: row.assigned_by,
            notes: row.notes,
            assigned_at: row.assigned_at,
        })
    }
}

#[derive(Queryable, Selectable)]
#[diesel(table_name = allocation_history)]
pub struct HistoryRow {
    pub history_id: i64,
    pub student_id: i64,
    pub room_id: i64,
    pub bed_id: i64,
    pub action: String,
    pub actor_id: i64,
    pub actor_role: String,
    pub notes: Option<String>,
    pub recorded_at: String,
}

impl TryFrom<HistoryRow> for RecordedHistoryEntry {
    type Error = PersistenceError;

    fn try_from(row: HistoryRow) -> Result<Self, Self::Error> {
        let action: HistoryAction = row.action.parse()?;
        let role: ActorRole = row
            .actor_role
            .parse()
            .map_err(PersistenceError::InvalidStoredValue)?;
        Ok(Self {
            history_id: row.history_id,
            entry: HistoryEntry::new(
                row.student_id,
                row.room_id,
                row.bed_id,
                action,
                Actor::new(row.actor_id, role),
                row.notes,
            ),
            recorded_at: row.recorded_at,
        })
    }
}

/// Converts a stored non-negative integer column into a `u32`.
pub fn to_count(column: &str, value: i32) -> Result<u32, PersistenceError> {
    value
        .to_u32()
        .ok_or_else(|| PersistenceError::InvalidStoredValue(format!("{column} = {value}")))
}

/// Converts a domain count into the stored integer representation.
pub fn to_column(column: &str, value: u32) -> Result<i32, PersistenceError> {
    value
        .to_i32()
        .ok_or_else(|| PersistenceError::InvalidStoredValue(format!("{column} = {value}")))
}
