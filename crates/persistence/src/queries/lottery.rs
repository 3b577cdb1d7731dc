// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Lottery event and result queries.

use std::collections::HashMap;

use diesel::SqliteConnection;
use diesel::prelude::*;
use dorm_lottery_domain::{LotteryEvent, LotteryResult};

use crate::diesel_schema::{
    bed_selections, lottery_events, lottery_results, room_type_allocations, rooms, students,
};
use crate::error::PersistenceError;
use crate::queries::rows::{LotteryEventRow, LotteryResultRow};

/// Retrieves a lottery event by ID.
///
/// # Errors
///
/// Returns `EventNotFound` if no event has this ID.
pub fn get_lottery_event(
    conn: &mut SqliteConnection,
    event_id: i64,
) -> Result<LotteryEvent, PersistenceError> {
    let row: Option<LotteryEventRow> = lottery_events::table
        .filter(lottery_events::event_id.eq(event_id))
        .select(LotteryEventRow::as_select())
        .first(conn)
        .optional()
        .map_err(|e| PersistenceError::QueryFailed(format!("get_lottery_event: {e}")))?;

    row.ok_or(PersistenceError::EventNotFound(event_id))?
        .try_into()
}

/// Lists lottery events, newest first.
///
/// # Errors
///
/// Returns an error if the database query fails or a row is invalid.
pub fn list_lottery_events(
    conn: &mut SqliteConnection,
) -> Result<Vec<LotteryEvent>, PersistenceError> {
    let rows: Vec<LotteryEventRow> = lottery_events::table
        .order(lottery_events::event_id.desc())
        .select(LotteryEventRow::as_select())
        .load(conn)
        .map_err(|e| PersistenceError::QueryFailed(format!("list_lottery_events: {e}")))?;

    rows.into_iter().map(LotteryEvent::try_from).collect()
}

/// Lists the students a draw of this event would include.
///
/// These are the non-administrator students without a result for the
/// event, ordered by ID.
///
/// # Errors
///
/// Returns an error if the database query fails.
pub fn list_draw_candidates(
    conn: &mut SqliteConnection,
    event_id: i64,
) -> Result<Vec<i64>, PersistenceError> {
    let already_drawn = lottery_results::table
        .filter(lottery_results::event_id.eq(event_id))
        .select(lottery_results::student_id);

    students::table
        .filter(students::is_admin.eq(0))
        .filter(students::student_id.ne_all(already_drawn))
        .order(students::student_id.asc())
        .select(students::student_id)
        .load(conn)
        .map_err(|e| PersistenceError::QueryFailed(format!("list_draw_candidates: {e}")))
}

/// Counts the results recorded for an event.
///
/// # Errors
///
/// Returns an error if the database query fails.
pub fn count_lottery_results(
    conn: &mut SqliteConnection,
    event_id: i64,
) -> Result<i64, PersistenceError> {
    lottery_results::table
        .filter(lottery_results::event_id.eq(event_id))
        .count()
        .get_result(conn)
        .map_err(|e| PersistenceError::QueryFailed(format!("count_lottery_results: {e}")))
}

/// Lists the results of an event ordered by draw number.
///
/// # Errors
///
/// Returns an error if the database query fails or a row is invalid.
pub fn list_lottery_results(
    conn: &mut SqliteConnection,
    event_id: i64,
) -> Result<Vec<LotteryResult>, PersistenceError> {
    let rows: Vec<LotteryResultRow> = lottery_results::table
        .filter(lottery_results::event_id.eq(event_id))
        .order(lottery_results::draw_number.asc())
        .select(LotteryResultRow::as_select())
        .load(conn)
        .map_err(|e| PersistenceError::QueryFailed(format!("list_lottery_results: {e}")))?;

    rows.into_iter().map(LotteryResult::try_from).collect()
}

/// Retrieves one student's result in an event.
///
/// # Errors
///
/// Returns `ResultNotFound` if the student has no result in the event.
pub fn get_lottery_result(
    conn: &mut SqliteConnection,
    event_id: i64,
    student_id: i64,
) -> Result<LotteryResult, PersistenceError> {
    let row: Option<LotteryResultRow> = lottery_results::table
        .filter(lottery_results::event_id.eq(event_id))
        .filter(lottery_results::student_id.eq(student_id))
        .select(LotteryResultRow::as_select())
        .first(conn)
        .optional()
        .map_err(|e| PersistenceError::QueryFailed(format!("get_lottery_result: {e}")))?;

    row.ok_or(PersistenceError::ResultNotFound {
        event_id,
        student_id,
    })?
    .try_into()
}

/// Lists a student's results from published events, most recent first.
///
/// # Errors
///
/// Returns an error if the database query fails or a row is invalid.
pub fn list_published_results_for_student(
    conn: &mut SqliteConnection,
    student_id: i64,
) -> Result<Vec<LotteryResult>, PersistenceError> {
    let rows: Vec<LotteryResultRow> = lottery_results::table
        .inner_join(lottery_events::table)
        .filter(lottery_results::student_id.eq(student_id))
        .filter(lottery_events::is_published.eq(1))
        .order((
            lottery_events::published_at.desc(),
            lottery_events::event_id.desc(),
        ))
        .select(LotteryResultRow::as_select())
        .load(conn)
        .map_err(|e| {
            PersistenceError::QueryFailed(format!("list_published_results_for_student: {e}"))
        })?;

    rows.into_iter().map(LotteryResult::try_from).collect()
}

/// Finds a student whose held bed would stop matching their room type if
/// this event were published.
///
/// Students with a manual allocation are skipped, since the manual
/// allocation keeps deciding their room type.
///
/// # Returns
///
/// The first such `(student_id, bed_id)` by student ID, or `None`.
///
/// # Errors
///
/// Returns an error if the database query fails.
pub fn find_held_bed_type_conflict(
    conn: &mut SqliteConnection,
    event_id: i64,
) -> Result<Option<(i64, i64)>, PersistenceError> {
    let manual = room_type_allocations::table.select(room_type_allocations::student_id);
    let drawn: Vec<(i64, Option<String>)> = lottery_results::table
        .filter(lottery_results::event_id.eq(event_id))
        .filter(lottery_results::student_id.ne_all(manual))
        .order(lottery_results::student_id.asc())
        .select((lottery_results::student_id, lottery_results::room_type))
        .load(conn)
        .map_err(|e| PersistenceError::QueryFailed(format!("find_held_bed_type_conflict: {e}")))?;

    let held: HashMap<i64, (i64, String)> = bed_selections::table
        .inner_join(rooms::table)
        .select((
            bed_selections::student_id,
            bed_selections::bed_id,
            rooms::room_type,
        ))
        .load::<(i64, i64, String)>(conn)
        .map_err(|e| PersistenceError::QueryFailed(format!("find_held_bed_type_conflict: {e}")))?
        .into_iter()
        .map(|(student_id, bed_id, room_type)| (student_id, (bed_id, room_type)))
        .collect();

    Ok(drawn.into_iter().find_map(|(student_id, room_type)| {
        let drawn_type: String = room_type?;
        let (bed_id, held_type) = held.get(&student_id)?;
        (*held_type != drawn_type).then_some((student_id, *bed_id))
    }))
}
