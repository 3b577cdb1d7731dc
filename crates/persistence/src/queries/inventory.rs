// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Student and bed inventory queries.

use diesel::SqliteConnection;
use diesel::prelude::*;
use dorm_lottery_domain::{Bed, Building, Room, RoomType, Student};
use tracing::debug;

use crate::data_models::AvailableBed;
use crate::diesel_schema::{beds, buildings, rooms, students};
use crate::error::PersistenceError;
use crate::queries::rows::{BedRow, BuildingRow, RoomRow, StudentRow};

/// Retrieves a student by ID.
///
/// # Errors
///
/// Returns an error if the database query fails.
/// Returns `Ok(None)` if the student is not found.
pub fn find_student(
    conn: &mut SqliteConnection,
    student_id: i64,
) -> Result<Option<Student>, PersistenceError> {
    let row: Option<StudentRow> = students::table
        .filter(students::student_id.eq(student_id))
        .select(StudentRow::as_select())
        .first(conn)
        .optional()
        .map_err(|e| PersistenceError::QueryFailed(format!("find_student: {e}")))?;

    Ok(row.map(Student::from))
}

/// Retrieves a student by username.
///
/// # Errors
///
/// Returns an error if the database query fails.
pub fn find_student_by_username(
    conn: &mut SqliteConnection,
    username: &str,
) -> Result<Option<Student>, PersistenceError> {
    let row: Option<StudentRow> = students::table
        .filter(students::username.eq(username))
        .select(StudentRow::as_select())
        .first(conn)
        .optional()
        .map_err(|e| PersistenceError::QueryFailed(format!("find_student_by_username: {e}")))?;

    Ok(row.map(Student::from))
}

/// Lists every registered account ordered by ID.
///
/// # Errors
///
/// Returns an error if the database query fails.
pub fn list_students(conn: &mut SqliteConnection) -> Result<Vec<Student>, PersistenceError> {
    let rows: Vec<StudentRow> = students::table
        .order(students::student_id.asc())
        .select(StudentRow::as_select())
        .load(conn)
        .map_err(|e| PersistenceError::QueryFailed(format!("list_students: {e}")))?;

    Ok(rows.into_iter().map(Student::from).collect())
}

/// Counts administrator accounts.
///
/// # Errors
///
/// Returns an error if the database query fails.
pub fn count_admins(conn: &mut SqliteConnection) -> Result<i64, PersistenceError> {
    students::table
        .filter(students::is_admin.eq(1))
        .count()
        .get_result(conn)
        .map_err(|e| PersistenceError::QueryFailed(format!("count_admins: {e}")))
}

/// Retrieves a building by ID.
///
/// # Errors
///
/// Returns `BuildingNotFound` if no building has this ID.
pub fn get_building(
    conn: &mut SqliteConnection,
    building_id: i64,
) -> Result<Building, PersistenceError> {
    let row: Option<BuildingRow> = buildings::table
        .filter(buildings::building_id.eq(building_id))
        .select(BuildingRow::as_select())
        .first(conn)
        .optional()
        .map_err(|e| PersistenceError::QueryFailed(format!("get_building: {e}")))?;

    row.map(Building::from)
        .ok_or(PersistenceError::BuildingNotFound(building_id))
}

/// Lists buildings ordered by name.
///
/// # Errors
///
/// Returns an error if the database query fails.
pub fn list_buildings(conn: &mut SqliteConnection) -> Result<Vec<Building>, PersistenceError> {
    let rows: Vec<BuildingRow> = buildings::table
        .order(buildings::name.asc())
        .select(BuildingRow::as_select())
        .load(conn)
        .map_err(|e| PersistenceError::QueryFailed(format!("list_buildings: {e}")))?;

    Ok(rows.into_iter().map(Building::from).collect())
}

/// Retrieves a room by ID.
///
/// # Errors
///
/// Returns `RoomNotFound` if no room has this ID, or an error if the stored
/// row is invalid.
pub fn get_room(conn: &mut SqliteConnection, room_id: i64) -> Result<Room, PersistenceError> {
    let row: Option<RoomRow> = rooms::table
        .filter(rooms::room_id.eq(room_id))
        .select(RoomRow::as_select())
        .first(conn)
        .optional()
        .map_err(|e| PersistenceError::QueryFailed(format!("get_room: {e}")))?;

    row.ok_or(PersistenceError::RoomNotFound(room_id))?
        .try_into()
}

/// Lists rooms, optionally restricted to one building.
///
/// # Errors
///
/// Returns an error if the database query fails or a row is invalid.
pub fn list_rooms(
    conn: &mut SqliteConnection,
    building_id: Option<i64>,
) -> Result<Vec<Room>, PersistenceError> {
    let mut query = rooms::table
        .order((rooms::building_id.asc(), rooms::room_number.asc()))
        .select(RoomRow::as_select())
        .into_boxed();
    if let Some(building_id) = building_id {
        query = query.filter(rooms::building_id.eq(building_id));
    }

    let rows: Vec<RoomRow> = query
        .load(conn)
        .map_err(|e| PersistenceError::QueryFailed(format!("list_rooms: {e}")))?;

    rows.into_iter().map(Room::try_from).collect()
}

/// Lists a room's beds ordered by bed number.
///
/// # Errors
///
/// Returns an error if the database query fails or a row is invalid.
pub fn list_beds(conn: &mut SqliteConnection, room_id: i64) -> Result<Vec<Bed>, PersistenceError> {
    let rows: Vec<BedRow> = beds::table
        .filter(beds::room_id.eq(room_id))
        .order(beds::bed_number.asc())
        .select(BedRow::as_select())
        .load(conn)
        .map_err(|e| PersistenceError::QueryFailed(format!("list_beds: {e}")))?;

    rows.into_iter().map(Bed::try_from).collect()
}

/// Retrieves a bed and the room that holds it.
///
/// # Errors
///
/// Returns an error if the database query fails or a row is invalid.
pub fn find_bed_with_room(
    conn: &mut SqliteConnection,
    bed_id: i64,
) -> Result<Option<(Bed, Room)>, PersistenceError> {
    let row: Option<(BedRow, RoomRow)> = beds::table
        .inner_join(rooms::table)
        .filter(beds::bed_id.eq(bed_id))
        .select((BedRow::as_select(), RoomRow::as_select()))
        .first(conn)
        .optional()
        .map_err(|e| PersistenceError::QueryFailed(format!("find_bed_with_room: {e}")))?;

    row.map(|(bed, room)| Ok((Bed::try_from(bed)?, Room::try_from(room)?)))
        .transpose()
}

/// Lists unoccupied beds in available rooms of the given type.
///
/// # Errors
///
/// Returns an error if the database query fails or a row is invalid.
pub fn list_free_beds(
    conn: &mut SqliteConnection,
    room_type: &RoomType,
) -> Result<Vec<AvailableBed>, PersistenceError> {
    debug!(room_type = %room_type, "Listing free beds");

    let rows: Vec<(BedRow, RoomRow)> = beds::table
        .inner_join(rooms::table)
        .filter(rooms::room_type.eq(room_type.as_str()))
        .filter(rooms::is_available.eq(1))
        .filter(beds::is_occupied.eq(0))
        .order((rooms::room_id.asc(), beds::bed_number.asc()))
        .select((BedRow::as_select(), RoomRow::as_select()))
        .load(conn)
        .map_err(|e| PersistenceError::QueryFailed(format!("list_free_beds: {e}")))?;

    rows.into_iter()
        .map(|(bed, room)| {
            Ok(AvailableBed {
                room: Room::try_from(room)?,
                bed: Bed::try_from(bed)?,
            })
        })
        .collect()
}
