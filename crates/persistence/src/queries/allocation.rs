// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Allocation ledger queries.
//!
//! These assemble the `AllocationState` and `BedTarget` values the
//! transition rules run against. Both are always read fresh from storage.

use diesel::SqliteConnection;
use diesel::prelude::*;
use dorm_lottery::{AllocationState, BedTarget, RoomTypeAssignment, RoomTypeSource};
use dorm_lottery_audit::RecordedHistoryEntry;
use dorm_lottery_domain::{BedSelection, LotteryResult, RoomTypeAllocation, Student};

use crate::diesel_schema::{
    allocation_history, bed_selections, lottery_events, lottery_results, room_type_allocations,
    students,
};
use crate::error::PersistenceError;
use crate::queries::inventory::{find_bed_with_room, find_student};
use crate::queries::lottery::list_published_results_for_student;
use crate::queries::rows::{HistoryRow, RoomTypeAllocationRow, SelectionRow, StudentRow};

/// Retrieves a student's manual room-type allocation.
///
/// # Errors
///
/// Returns an error if the database query fails or the row is invalid.
pub fn find_room_type_allocation(
    conn: &mut SqliteConnection,
    student_id: i64,
) -> Result<Option<RoomTypeAllocation>, PersistenceError> {
    let row: Option<RoomTypeAllocationRow> = room_type_allocations::table
        .filter(room_type_allocations::student_id.eq(student_id))
        .select(RoomTypeAllocationRow::as_select())
        .first(conn)
        .optional()
        .map_err(|e| PersistenceError::QueryFailed(format!("find_room_type_allocation: {e}")))?;

    row.map(RoomTypeAllocation::try_from).transpose()
}

/// Resolves the room type a student may select beds in.
///
/// A manual allocation wins over lottery results; otherwise the most
/// recently published result carrying a room type is used.
///
/// # Errors
///
/// Returns an error if the database query fails or a row is invalid.
pub fn find_effective_room_type(
    conn: &mut SqliteConnection,
    student_id: i64,
) -> Result<Option<RoomTypeAssignment>, PersistenceError> {
    if let Some(allocation) = find_room_type_allocation(conn, student_id)? {
        return Ok(Some(RoomTypeAssignment {
            room_type: allocation.room_type,
            source: RoomTypeSource::Manual,
        }));
    }

    let results: Vec<LotteryResult> = list_published_results_for_student(conn, student_id)?;
    Ok(results.into_iter().find_map(|result| {
        result.room_type.map(|room_type| RoomTypeAssignment {
            room_type,
            source: RoomTypeSource::Lottery {
                event_id: result.event_id,
            },
        })
    }))
}

/// Retrieves the student's live selection.
///
/// # Errors
///
/// Returns an error if the database query fails.
pub fn find_selection_for_student(
    conn: &mut SqliteConnection,
    student_id: i64,
) -> Result<Option<BedSelection>, PersistenceError> {
    let row: Option<SelectionRow> = bed_selections::table
        .filter(bed_selections::student_id.eq(student_id))
        .select(SelectionRow::as_select())
        .first(conn)
        .optional()
        .map_err(|e| PersistenceError::QueryFailed(format!("find_selection_for_student: {e}")))?;

    Ok(row.map(BedSelection::from))
}

/// Retrieves the live selection referencing a bed.
///
/// # Errors
///
/// Returns an error if the database query fails.
pub fn find_selection_for_bed(
    conn: &mut SqliteConnection,
    bed_id: i64,
) -> Result<Option<BedSelection>, PersistenceError> {
    let row: Option<SelectionRow> = bed_selections::table
        .filter(bed_selections::bed_id.eq(bed_id))
        .select(SelectionRow::as_select())
        .first(conn)
        .optional()
        .map_err(|e| PersistenceError::QueryFailed(format!("find_selection_for_bed: {e}")))?;

    Ok(row.map(BedSelection::from))
}

/// Loads everything the transition rules need about one student.
///
/// # Returns
///
/// `Ok(None)` if the student does not exist.
///
/// # Errors
///
/// Returns an error if the database query fails or a row is invalid.
pub fn load_allocation_state(
    conn: &mut SqliteConnection,
    student_id: i64,
) -> Result<Option<AllocationState>, PersistenceError> {
    let Some(student) = find_student(conn, student_id)? else {
        return Ok(None);
    };
    let assignment: Option<RoomTypeAssignment> = find_effective_room_type(conn, student_id)?;
    let selection: Option<BedSelection> = find_selection_for_student(conn, student_id)?;

    Ok(Some(AllocationState::new(student, assignment, selection)))
}

/// Loads a bed, its room and its current holder.
///
/// # Returns
///
/// `Ok(None)` if the bed does not exist.
///
/// # Errors
///
/// Returns an error if the database query fails or a row is invalid.
pub fn load_bed_target(
    conn: &mut SqliteConnection,
    bed_id: i64,
) -> Result<Option<BedTarget>, PersistenceError> {
    let Some((bed, room)) = find_bed_with_room(conn, bed_id)? else {
        return Ok(None);
    };
    let holder: Option<BedSelection> = find_selection_for_bed(conn, bed_id)?;

    Ok(Some(BedTarget { bed, room, holder }))
}

/// Lists a student's allocation history, oldest first.
///
/// # Errors
///
/// Returns an error if the database query fails or a row is invalid.
pub fn list_history_for_student(
    conn: &mut SqliteConnection,
    student_id: i64,
) -> Result<Vec<RecordedHistoryEntry>, PersistenceError> {
    let rows: Vec<HistoryRow> = allocation_history::table
        .filter(allocation_history::student_id.eq(student_id))
        .order(allocation_history::history_id.asc())
        .select(HistoryRow::as_select())
        .load(conn)
        .map_err(|e| PersistenceError::QueryFailed(format!("list_history_for_student: {e}")))?;

    rows.into_iter().map(RecordedHistoryEntry::try_from).collect()
}

/// Counts every allocation history row.
///
/// # Errors
///
/// Returns an error if the database query fails.
pub fn count_history(conn: &mut SqliteConnection) -> Result<i64, PersistenceError> {
    allocation_history::table
        .count()
        .get_result(conn)
        .map_err(|e| PersistenceError::QueryFailed(format!("count_history: {e}")))
}

/// Lists every live selection ordered by bed.
///
/// # Errors
///
/// Returns an error if the database query fails.
pub fn list_selections(conn: &mut SqliteConnection) -> Result<Vec<BedSelection>, PersistenceError> {
    let rows: Vec<SelectionRow> = bed_selections::table
        .order(bed_selections::bed_id.asc())
        .select(SelectionRow::as_select())
        .load(conn)
        .map_err(|e| PersistenceError::QueryFailed(format!("list_selections: {e}")))?;

    Ok(rows.into_iter().map(BedSelection::from).collect())
}

/// Lists non-administrator students without a live selection, by ID.
///
/// # Errors
///
/// Returns an error if the database query fails.
pub fn list_students_without_selection(
    conn: &mut SqliteConnection,
) -> Result<Vec<Student>, PersistenceError> {
    let selected = bed_selections::table.select(bed_selections::student_id);

    let rows: Vec<StudentRow> = students::table
        .filter(students::is_admin.eq(0))
        .filter(students::student_id.ne_all(selected))
        .order(students::student_id.asc())
        .select(StudentRow::as_select())
        .load(conn)
        .map_err(|e| {
            PersistenceError::QueryFailed(format!("list_students_without_selection: {e}"))
        })?;

    Ok(rows.into_iter().map(Student::from).collect())
}

/// Lists non-administrator students with no effective room type, by ID.
///
/// These have neither a manual allocation nor a published lottery result
/// carrying a room type.
///
/// # Errors
///
/// Returns an error if the database query fails.
pub fn list_students_without_room_type(
    conn: &mut SqliteConnection,
) -> Result<Vec<Student>, PersistenceError> {
    let manual = room_type_allocations::table.select(room_type_allocations::student_id);
    let drawn = lottery_results::table
        .inner_join(lottery_events::table)
        .filter(lottery_events::is_published.eq(1))
        .filter(lottery_results::room_type.is_not_null())
        .select(lottery_results::student_id);

    let rows: Vec<StudentRow> = students::table
        .filter(students::is_admin.eq(0))
        .filter(students::student_id.ne_all(manual))
        .filter(students::student_id.ne_all(drawn))
        .order(students::student_id.asc())
        .select(StudentRow::as_select())
        .load(conn)
        .map_err(|e| {
            PersistenceError::QueryFailed(format!("list_students_without_room_type: {e}"))
        })?;

    Ok(rows.into_iter().map(Student::from).collect())
}
