// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Lottery event and result mutations.
//!
//! Every mutation re-reads the event inside its transaction, so the
//! published and drawn checks hold at commit time. Published events are
//! frozen: their results cannot be redrawn, reset or corrected.

use diesel::SqliteConnection;
use diesel::prelude::*;
use dorm_lottery_audit::AuditEvent;
use dorm_lottery_domain::{Composition, DrawAssignment, LotteryEvent, LotteryResult};
use tracing::info;

use crate::backend::sqlite::get_last_insert_rowid;
use crate::diesel_schema::{lottery_events, lottery_results};
use crate::error::{PersistenceError, is_unique_violation};
use crate::mutations::audit::{now_rfc3339, persist_audit_event};
use crate::queries::lottery::{
    count_lottery_results, find_held_bed_type_conflict, get_lottery_event, get_lottery_result,
};
use crate::queries::rows::to_column;

/// Result rows per INSERT; each row binds five variables and `SQLite`
/// caps the variables of one statement.
const DRAW_INSERT_CHUNK: usize = 1000;

/// Creates an unpublished lottery event.
///
/// # Arguments
///
/// * `conn` - The database connection
/// * `name` - Display name, already validated
/// * `scheduled_at` - RFC 3339 timestamp, already validated
/// * `composition` - Target room-type composition, already validated
/// * `created_by` - The administrator creating the event
/// * `audit_event` - The audit record for the creation
///
/// # Errors
///
/// Returns an error if serialization or the insert fails.
pub fn create_lottery_event(
    conn: &mut SqliteConnection,
    name: &str,
    scheduled_at: &str,
    composition: &Composition,
    created_by: i64,
    audit_event: &AuditEvent,
) -> Result<LotteryEvent, PersistenceError> {
    let composition_json: String = serde_json::to_string(composition)?;

    conn.transaction::<_, PersistenceError, _>(|conn| {
        diesel::insert_into(lottery_events::table)
            .values((
                lottery_events::name.eq(name),
                lottery_events::scheduled_at.eq(scheduled_at),
                lottery_events::composition_json.eq(&composition_json),
                lottery_events::is_published.eq(0),
                lottery_events::created_by.eq(created_by),
                lottery_events::created_at.eq(now_rfc3339()?),
            ))
            .execute(conn)?;
        let event_id: i64 = get_last_insert_rowid(conn)?;
        persist_audit_event(conn, audit_event)?;

        info!(event_id, name, "Created lottery event");
        get_lottery_event(conn, event_id)
    })
}

/// Stores the outcome of a draw, all rows or none.
///
/// The composition actually used is written back to the event so later
/// reads describe the draw that happened.
///
/// # Errors
///
/// Returns `EventNotFound`, `AlreadyPublished` or `AlreadyDrawn` if the
/// event cannot take a draw, or an error if any insert fails. Nothing is
/// written on error.
pub fn persist_draw(
    conn: &mut SqliteConnection,
    event_id: i64,
    composition: &Composition,
    assignments: &[DrawAssignment],
    audit_event: &AuditEvent,
) -> Result<(), PersistenceError> {
    let composition_json: String = serde_json::to_string(composition)?;

    conn.transaction::<_, PersistenceError, _>(|conn| {
        let event: LotteryEvent = get_lottery_event(conn, event_id)?;
        if event.is_published {
            return Err(PersistenceError::AlreadyPublished(event_id));
        }
        if count_lottery_results(conn, event_id)? > 0 {
            return Err(PersistenceError::AlreadyDrawn(event_id));
        }

        diesel::update(lottery_events::table.filter(lottery_events::event_id.eq(event_id)))
            .set(lottery_events::composition_json.eq(&composition_json))
            .execute(conn)?;

        let rows: Vec<_> = assignments
            .iter()
            .map(|assignment| {
                Ok((
                    lottery_results::event_id.eq(event_id),
                    lottery_results::student_id.eq(assignment.student_id),
                    lottery_results::draw_number.eq(to_column(
                        "lottery_results.draw_number",
                        assignment.draw_number,
                    )?),
                    lottery_results::group_label.eq(assignment.group_label.as_str()),
                    lottery_results::room_type.eq(Some(assignment.room_type.as_str())),
                ))
            })
            .collect::<Result<_, PersistenceError>>()?;
        for chunk in rows.chunks(DRAW_INSERT_CHUNK) {
            diesel::insert_into(lottery_results::table)
                .values(chunk)
                .execute(conn)?;
        }

        persist_audit_event(conn, audit_event)?;

        info!(event_id, drawn = assignments.len(), "Persisted lottery draw");
        Ok(())
    })
}

/// Publishes an event's results.
///
/// Publishing makes each result the student's effective room type unless
/// a manual allocation overrides it, so it is refused while any such
/// student holds a bed of another type.
///
/// # Errors
///
/// Returns `EventNotFound` if the event does not exist,
/// `AlreadyPublished` if it is already published, and
/// `HeldBedTypeConflict` if publishing would change the room type of a
/// student who holds a bed.
pub fn publish_lottery(
    conn: &mut SqliteConnection,
    event_id: i64,
    audit_event: &AuditEvent,
) -> Result<(), PersistenceError> {
    conn.transaction::<_, PersistenceError, _>(|conn| {
        let event: LotteryEvent = get_lottery_event(conn, event_id)?;
        if event.is_published {
            return Err(PersistenceError::AlreadyPublished(event_id));
        }
        if let Some((student_id, bed_id)) = find_held_bed_type_conflict(conn, event_id)? {
            return Err(PersistenceError::HeldBedTypeConflict {
                event_id,
                student_id,
                bed_id,
            });
        }

        diesel::update(lottery_events::table.filter(lottery_events::event_id.eq(event_id)))
            .set((
                lottery_events::is_published.eq(1),
                lottery_events::published_at.eq(Some(now_rfc3339()?)),
            ))
            .execute(conn)?;
        persist_audit_event(conn, audit_event)?;

        info!(event_id, "Published lottery event");
        Ok(())
    })
}

/// Deletes every result of an unpublished event.
///
/// # Returns
///
/// The number of deleted results.
///
/// # Errors
///
/// Returns `EventNotFound` if the event does not exist and
/// `AlreadyPublished` if it is published.
pub fn reset_lottery(
    conn: &mut SqliteConnection,
    event_id: i64,
    audit_event: &AuditEvent,
) -> Result<usize, PersistenceError> {
    conn.transaction::<_, PersistenceError, _>(|conn| {
        let event: LotteryEvent = get_lottery_event(conn, event_id)?;
        if event.is_published {
            return Err(PersistenceError::AlreadyPublished(event_id));
        }

        let deleted: usize =
            diesel::delete(lottery_results::table.filter(lottery_results::event_id.eq(event_id)))
                .execute(conn)?;
        persist_audit_event(conn, audit_event)?;

        info!(event_id, deleted, "Reset lottery event");
        Ok(deleted)
    })
}

/// Overwrites one result of an unpublished event.
///
/// # Arguments
///
/// * `conn` - The database connection
/// * `corrected` - The full corrected result; event and student identify the row
/// * `audit_event` - The audit record for the correction
///
/// # Errors
///
/// Returns `EventNotFound`, `AlreadyPublished`, `ResultNotFound`, or
/// `DuplicateDrawNumber` if another result already uses the draw number.
pub fn update_lottery_result(
    conn: &mut SqliteConnection,
    corrected: &LotteryResult,
    audit_event: &AuditEvent,
) -> Result<(), PersistenceError> {
    let event_id: i64 = corrected.event_id;
    let student_id: i64 = corrected.student_id;
    let draw_number: i32 = to_column("lottery_results.draw_number", corrected.draw_number)?;

    conn.transaction::<_, PersistenceError, _>(|conn| {
        let event: LotteryEvent = get_lottery_event(conn, event_id)?;
        if event.is_published {
            return Err(PersistenceError::AlreadyPublished(event_id));
        }
        get_lottery_result(conn, event_id, student_id)?;

        diesel::update(
            lottery_results::table
                .filter(lottery_results::event_id.eq(event_id))
                .filter(lottery_results::student_id.eq(student_id)),
        )
        .set((
            lottery_results::draw_number.eq(draw_number),
            lottery_results::group_label.eq(corrected.group_label.as_str()),
            lottery_results::room_type.eq(corrected.room_type.as_ref().map(|t| t.as_str())),
        ))
        .execute(conn)
        .map_err(|e| {
            if is_unique_violation(&e) {
                PersistenceError::DuplicateDrawNumber {
                    event_id,
                    draw_number: corrected.draw_number,
                }
            } else {
                PersistenceError::from(e)
            }
        })?;
        persist_audit_event(conn, audit_event)?;

        info!(event_id, student_id, "Corrected lottery result");
        Ok(())
    })
}

/// Deletes an unpublished event that has no results.
///
/// # Errors
///
/// Returns `EventNotFound` if the event does not exist, `AlreadyPublished`
/// if it is published and `EventHasResults` if it still has results.
pub fn delete_lottery_event(
    conn: &mut SqliteConnection,
    event_id: i64,
    audit_event: &AuditEvent,
) -> Result<(), PersistenceError> {
    conn.transaction::<_, PersistenceError, _>(|conn| {
        let event: LotteryEvent = get_lottery_event(conn, event_id)?;
        if event.is_published {
            return Err(PersistenceError::AlreadyPublished(event_id));
        }
        if count_lottery_results(conn, event_id)? > 0 {
            return Err(PersistenceError::EventHasResults(event_id));
        }

        diesel::delete(lottery_events::table.filter(lottery_events::event_id.eq(event_id)))
            .execute(conn)?;
        persist_audit_event(conn, audit_event)?;

        info!(event_id, "Deleted lottery event");
        Ok(())
    })
}
