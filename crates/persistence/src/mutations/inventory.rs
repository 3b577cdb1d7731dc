// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Student registration and room inventory mutations.
//!
//! Deletes never cascade: a room that still carries allocation data and a
//! building that still owns rooms are rejected.

use diesel::SqliteConnection;
use diesel::prelude::*;
use dorm_lottery_domain::{Building, Room, RoomType, Student};
use tracing::{debug, info};

use crate::backend::sqlite::get_last_insert_rowid;
use crate::data_models::RoomChanges;
use crate::diesel_schema::{allocation_history, bed_selections, beds, buildings, rooms, students};
use crate::error::{PersistenceError, is_unique_violation};
use crate::mutations::audit::now_rfc3339;
use crate::queries::inventory::{get_building, get_room};
use crate::queries::rows::to_column;

/// Registers a student or administrator account.
///
/// # Errors
///
/// Returns `DuplicateUsername` if the username is taken.
pub fn create_student(
    conn: &mut SqliteConnection,
    username: &str,
    full_name: &str,
    is_admin: bool,
) -> Result<Student, PersistenceError> {
    diesel::insert_into(students::table)
        .values((
            students::username.eq(username),
            students::full_name.eq(full_name),
            students::is_admin.eq(i32::from(is_admin)),
            students::created_at.eq(now_rfc3339()?),
        ))
        .execute(conn)
        .map_err(|e| {
            if is_unique_violation(&e) {
                PersistenceError::DuplicateUsername(username.to_string())
            } else {
                PersistenceError::from(e)
            }
        })?;

    let student_id: i64 = get_last_insert_rowid(conn)?;
    info!(student_id, username, is_admin, "Registered account");

    Ok(Student {
        student_id,
        username: username.to_string(),
        full_name: full_name.to_string(),
        is_admin,
    })
}

/// Creates a building.
///
/// # Errors
///
/// Returns `DuplicateBuilding` if the name is taken.
pub fn create_building(
    conn: &mut SqliteConnection,
    name: &str,
) -> Result<Building, PersistenceError> {
    diesel::insert_into(buildings::table)
        .values(buildings::name.eq(name))
        .execute(conn)
        .map_err(|e| {
            if is_unique_violation(&e) {
                PersistenceError::DuplicateBuilding(name.to_string())
            } else {
                PersistenceError::from(e)
            }
        })?;

    let building_id: i64 = get_last_insert_rowid(conn)?;
    info!(building_id, name, "Created building");

    Ok(Building {
        building_id,
        name: name.to_string(),
    })
}

/// Creates a room together with beds numbered `1..=capacity`.
///
/// # Arguments
///
/// * `conn` - The database connection
/// * `building_id` - The owning building
/// * `room_number` - Number unique within the building
/// * `room_type` - The room's category
/// * `capacity` - Number of beds, already validated
///
/// # Errors
///
/// Returns `BuildingNotFound` if the building does not exist and
/// `DuplicateRoom` if the number is taken in this building.
pub fn create_room(
    conn: &mut SqliteConnection,
    building_id: i64,
    room_number: &str,
    room_type: &RoomType,
    capacity: u32,
) -> Result<Room, PersistenceError> {
    conn.transaction::<_, PersistenceError, _>(|conn| {
        get_building(conn, building_id)?;

        diesel::insert_into(rooms::table)
            .values((
                rooms::building_id.eq(building_id),
                rooms::room_number.eq(room_number),
                rooms::room_type.eq(room_type.as_str()),
                rooms::max_capacity.eq(to_column("rooms.max_capacity", capacity)?),
                rooms::current_occupancy.eq(0),
                rooms::is_available.eq(1),
            ))
            .execute(conn)
            .map_err(|e| {
                if is_unique_violation(&e) {
                    PersistenceError::DuplicateRoom {
                        building_id,
                        room_number: room_number.to_string(),
                    }
                } else {
                    PersistenceError::from(e)
                }
            })?;
        let room_id: i64 = get_last_insert_rowid(conn)?;

        let bed_rows: Vec<_> = (1..=capacity)
            .map(|number| {
                Ok((
                    beds::room_id.eq(room_id),
                    beds::bed_number.eq(to_column("beds.bed_number", number)?),
                    beds::is_occupied.eq(0),
                ))
            })
            .collect::<Result<_, PersistenceError>>()?;
        diesel::insert_into(beds::table)
            .values(&bed_rows)
            .execute(conn)?;

        info!(room_id, building_id, room_number, room_type = %room_type, capacity, "Created room");
        get_room(conn, room_id)
    })
}

/// Marks a room available or unavailable for selection.
///
/// Existing selections in the room are left alone.
///
/// # Errors
///
/// Returns `RoomNotFound` if the room does not exist.
pub fn set_room_availability(
    conn: &mut SqliteConnection,
    room_id: i64,
    is_available: bool,
) -> Result<Room, PersistenceError> {
    let updated: usize = diesel::update(rooms::table.filter(rooms::room_id.eq(room_id)))
        .set(rooms::is_available.eq(i32::from(is_available)))
        .execute(conn)?;
    if updated == 0 {
        return Err(PersistenceError::RoomNotFound(room_id));
    }

    debug!(room_id, is_available, "Updated room availability");
    get_room(conn, room_id)
}

/// Edits a room's type, capacity or availability in one transaction.
///
/// Growing a room adds beds after the highest bed number; shrinking
/// removes the highest-numbered beds, which must be free and have no
/// history. The room type can only change while no bed is held.
///
/// # Errors
///
/// Returns `RoomNotFound` if the room does not exist,
/// `CapacityBelowOccupancy` if the new capacity cannot seat the current
/// occupants, and `RoomInUse` if a held bed blocks a type change or a
/// removed bed is occupied or referenced by history.
pub fn update_room(
    conn: &mut SqliteConnection,
    room_id: i64,
    changes: &RoomChanges,
) -> Result<Room, PersistenceError> {
    conn.transaction::<_, PersistenceError, _>(|conn| {
        let room: Room = get_room(conn, room_id)?;

        if let Some(room_type) = changes.room_type.as_ref().filter(|t| **t != room.room_type) {
            let selections: i64 = bed_selections::table
                .filter(bed_selections::room_id.eq(room_id))
                .count()
                .get_result(conn)?;
            if selections > 0 {
                return Err(PersistenceError::RoomInUse(room_id));
            }
            diesel::update(rooms::table.filter(rooms::room_id.eq(room_id)))
                .set(rooms::room_type.eq(room_type.as_str()))
                .execute(conn)?;
        }

        if let Some(capacity) = changes.capacity.filter(|c| *c != room.max_capacity) {
            resize_beds(conn, &room, capacity)?;
        }

        if let Some(is_available) = changes.is_available {
            diesel::update(rooms::table.filter(rooms::room_id.eq(room_id)))
                .set(rooms::is_available.eq(i32::from(is_available)))
                .execute(conn)?;
        }

        info!(room_id, ?changes, "Updated room");
        get_room(conn, room_id)
    })
}

fn resize_beds(
    conn: &mut SqliteConnection,
    room: &Room,
    capacity: u32,
) -> Result<(), PersistenceError> {
    let room_id: i64 = room.room_id;
    let occupied: i64 = beds::table
        .filter(beds::room_id.eq(room_id))
        .filter(beds::is_occupied.eq(1))
        .count()
        .get_result(conn)?;
    if occupied > i64::from(capacity) {
        return Err(PersistenceError::CapacityBelowOccupancy {
            room_id,
            capacity,
            occupancy: occupied,
        });
    }

    let new_capacity: i32 = to_column("rooms.max_capacity", capacity)?;
    if capacity > room.max_capacity {
        let bed_rows: Vec<_> = (room.max_capacity + 1..=capacity)
            .map(|number| {
                Ok((
                    beds::room_id.eq(room_id),
                    beds::bed_number.eq(to_column("beds.bed_number", number)?),
                    beds::is_occupied.eq(0),
                ))
            })
            .collect::<Result<_, PersistenceError>>()?;
        diesel::insert_into(beds::table)
            .values(&bed_rows)
            .execute(conn)?;
    } else {
        let removed: Vec<(i64, i32)> = beds::table
            .filter(beds::room_id.eq(room_id))
            .filter(beds::bed_number.gt(new_capacity))
            .select((beds::bed_id, beds::is_occupied))
            .load(conn)?;
        let removed_ids: Vec<i64> = removed.iter().map(|(bed_id, _)| *bed_id).collect();
        let history_rows: i64 = allocation_history::table
            .filter(allocation_history::bed_id.eq_any(removed_ids.clone()))
            .count()
            .get_result(conn)?;
        if history_rows > 0 || removed.iter().any(|(_, occupied)| *occupied != 0) {
            return Err(PersistenceError::RoomInUse(room_id));
        }
        diesel::delete(beds::table.filter(beds::bed_id.eq_any(removed_ids))).execute(conn)?;
    }

    diesel::update(rooms::table.filter(rooms::room_id.eq(room_id)))
        .set(rooms::max_capacity.eq(new_capacity))
        .execute(conn)?;

    debug!(room_id, from = room.max_capacity, to = capacity, "Resized room");
    Ok(())
}

/// Deletes an unused room and its beds.
///
/// # Errors
///
/// Returns `RoomNotFound` if the room does not exist and `RoomInUse` if any
/// bed is occupied or any selection or history row references the room.
pub fn delete_room(conn: &mut SqliteConnection, room_id: i64) -> Result<(), PersistenceError> {
    conn.transaction::<_, PersistenceError, _>(|conn| {
        get_room(conn, room_id)?;

        let occupied_beds: i64 = beds::table
            .filter(beds::room_id.eq(room_id))
            .filter(beds::is_occupied.eq(1))
            .count()
            .get_result(conn)?;
        let selections: i64 = bed_selections::table
            .filter(bed_selections::room_id.eq(room_id))
            .count()
            .get_result(conn)?;
        let history_rows: i64 = allocation_history::table
            .filter(allocation_history::room_id.eq(room_id))
            .count()
            .get_result(conn)?;
        if occupied_beds + selections + history_rows > 0 {
            return Err(PersistenceError::RoomInUse(room_id));
        }

        diesel::delete(beds::table.filter(beds::room_id.eq(room_id))).execute(conn)?;
        diesel::delete(rooms::table.filter(rooms::room_id.eq(room_id))).execute(conn)?;

        info!(room_id, "Deleted room");
        Ok(())
    })
}

/// Deletes a building that owns no rooms.
///
/// # Errors
///
/// Returns `BuildingNotFound` if the building does not exist and
/// `BuildingNotEmpty` if it still owns rooms.
pub fn delete_building(
    conn: &mut SqliteConnection,
    building_id: i64,
) -> Result<(), PersistenceError> {
    conn.transaction::<_, PersistenceError, _>(|conn| {
        get_building(conn, building_id)?;

        let room_count: i64 = rooms::table
            .filter(rooms::building_id.eq(building_id))
            .count()
            .get_result(conn)?;
        if room_count > 0 {
            return Err(PersistenceError::BuildingNotEmpty(building_id));
        }

        diesel::delete(buildings::table.filter(buildings::building_id.eq(building_id)))
            .execute(conn)?;

        info!(building_id, "Deleted building");
        Ok(())
    })
}
