// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Applies allocation transitions to storage.
//!
//! Every effect runs in one transaction together with its history row and
//! audit event. Updates are guarded by the state the transition was
//! computed from; an update that touches no row means storage changed
//! underneath the caller and aborts the transaction as an integrity
//! violation. Room occupancy is always recomputed from bed flags.

use diesel::SqliteConnection;
use diesel::prelude::*;
use dorm_lottery::{Effect, TransitionResult};
use dorm_lottery_audit::HistoryEntry;
use dorm_lottery_domain::{BedSelection, RoomType};
use tracing::{debug, info};

use crate::diesel_schema::{allocation_history, bed_selections, beds, room_type_allocations, rooms};
use crate::error::{PersistenceError, is_unique_violation};
use crate::mutations::audit::{now_rfc3339, persist_audit_event};
use crate::queries::allocation::find_selection_for_student;

/// Writes a transition's effect, history row and audit event atomically.
///
/// # Arguments
///
/// * `conn` - The database connection
/// * `result` - The transition computed against freshly loaded state
///
/// # Returns
///
/// The student's live selection after the write.
///
/// # Errors
///
/// Returns `IntegrityViolation` if stored state no longer matches the
/// state the transition was computed from, or an error if any statement
/// fails. Nothing is written on error.
pub fn persist_transition(
    conn: &mut SqliteConnection,
    result: &TransitionResult,
) -> Result<Option<BedSelection>, PersistenceError> {
    let student_id: i64 = result.new_state.student.student_id;
    if result.is_noop() {
        return Ok(result.new_state.selection.clone());
    }

    conn.transaction::<_, PersistenceError, _>(|conn| {
        let now: String = now_rfc3339()?;

        match &result.effect {
            Effect::None => {}
            Effect::Claim {
                replaced,
                selection,
            } => {
                if let Some(previous) = replaced {
                    delete_selection(conn, previous)?;
                    set_bed_occupied(conn, previous.bed_id, false)?;
                    recompute_room_occupancy(conn, previous.room_id)?;
                }
                set_bed_occupied(conn, selection.bed_id, true)?;
                insert_selection(conn, selection, &now)?;
                recompute_room_occupancy(conn, selection.room_id)?;
            }
            Effect::Release { released } => {
                delete_selection(conn, released)?;
                set_bed_occupied(conn, released.bed_id, false)?;
                recompute_room_occupancy(conn, released.room_id)?;
            }
            Effect::Move { from, to } => {
                set_bed_occupied(conn, from.bed_id, false)?;
                set_bed_occupied(conn, to.bed_id, true)?;
                move_selection(conn, from, to, &now)?;
                recompute_room_occupancy(conn, from.room_id)?;
                if to.room_id != from.room_id {
                    recompute_room_occupancy(conn, to.room_id)?;
                }
            }
            Effect::Confirm { selection } => confirm_selection(conn, selection, &now)?,
            Effect::SetRoomType {
                room_type,
                assigned_by,
                notes,
            } => upsert_room_type_allocation(
                conn,
                student_id,
                room_type,
                *assigned_by,
                notes.as_deref(),
                &now,
            )?,
            Effect::ClearRoomType => delete_room_type_allocation(conn, student_id)?,
        }

        if let Some(history) = &result.history {
            insert_history(conn, history, &now)?;
        }
        if let Some(audit_event) = &result.audit_event {
            persist_audit_event(conn, audit_event)?;
        }

        find_selection_for_student(conn, student_id)
    })
}

fn insert_selection(
    conn: &mut SqliteConnection,
    selection: &BedSelection,
    now: &str,
) -> Result<(), PersistenceError> {
    diesel::insert_into(bed_selections::table)
        .values((
            bed_selections::student_id.eq(selection.student_id),
            bed_selections::room_id.eq(selection.room_id),
            bed_selections::bed_id.eq(selection.bed_id),
            bed_selections::is_confirmed.eq(i32::from(selection.is_confirmed)),
            bed_selections::selected_at.eq(now),
        ))
        .execute(conn)
        .map_err(|e| {
            if is_unique_violation(&e) {
                PersistenceError::IntegrityViolation(format!(
                    "bed {} or student {} already has a live selection",
                    selection.bed_id, selection.student_id
                ))
            } else {
                PersistenceError::from(e)
            }
        })?;

    debug!(
        student_id = selection.student_id,
        bed_id = selection.bed_id,
        "Inserted bed selection"
    );
    Ok(())
}

fn delete_selection(
    conn: &mut SqliteConnection,
    selection: &BedSelection,
) -> Result<(), PersistenceError> {
    let deleted: usize = diesel::delete(
        bed_selections::table
            .filter(bed_selections::student_id.eq(selection.student_id))
            .filter(bed_selections::bed_id.eq(selection.bed_id)),
    )
    .execute(conn)?;
    expect_one_row(deleted, || {
        format!(
            "no live selection of bed {} by student {}",
            selection.bed_id, selection.student_id
        )
    })
}

fn move_selection(
    conn: &mut SqliteConnection,
    from: &BedSelection,
    to: &BedSelection,
    now: &str,
) -> Result<(), PersistenceError> {
    let updated: usize = diesel::update(
        bed_selections::table
            .filter(bed_selections::student_id.eq(from.student_id))
            .filter(bed_selections::bed_id.eq(from.bed_id)),
    )
    .set((
        bed_selections::room_id.eq(to.room_id),
        bed_selections::bed_id.eq(to.bed_id),
        bed_selections::selected_at.eq(now),
    ))
    .execute(conn)?;
    expect_one_row(updated, || {
        format!(
            "no live selection of bed {} by student {} to move",
            from.bed_id, from.student_id
        )
    })
}

fn confirm_selection(
    conn: &mut SqliteConnection,
    selection: &BedSelection,
    now: &str,
) -> Result<(), PersistenceError> {
    let updated: usize = diesel::update(
        bed_selections::table
            .filter(bed_selections::student_id.eq(selection.student_id))
            .filter(bed_selections::bed_id.eq(selection.bed_id))
            .filter(bed_selections::is_confirmed.eq(0)),
    )
    .set((
        bed_selections::is_confirmed.eq(1),
        bed_selections::confirmed_at.eq(Some(now)),
    ))
    .execute(conn)?;
    expect_one_row(updated, || {
        format!(
            "no unconfirmed selection of bed {} by student {}",
            selection.bed_id, selection.student_id
        )
    })
}

/// Flips a bed's occupancy flag, requiring the opposite value beforehand.
fn set_bed_occupied(
    conn: &mut SqliteConnection,
    bed_id: i64,
    occupied: bool,
) -> Result<(), PersistenceError> {
    let updated: usize = diesel::update(
        beds::table
            .filter(beds::bed_id.eq(bed_id))
            .filter(beds::is_occupied.eq(i32::from(!occupied))),
    )
    .set(beds::is_occupied.eq(i32::from(occupied)))
    .execute(conn)?;
    expect_one_row(updated, || {
        format!("bed {bed_id} was not in the expected occupancy state")
    })
}

/// Rewrites a room's occupancy as the count of its occupied beds.
fn recompute_room_occupancy(
    conn: &mut SqliteConnection,
    room_id: i64,
) -> Result<(), PersistenceError> {
    let occupied: i64 = beds::table
        .filter(beds::room_id.eq(room_id))
        .filter(beds::is_occupied.eq(1))
        .count()
        .get_result(conn)?;
    let occupied: i32 = i32::try_from(occupied).map_err(|_| {
        PersistenceError::IntegrityViolation(format!("room {room_id} occupancy out of range"))
    })?;

    diesel::update(rooms::table.filter(rooms::room_id.eq(room_id)))
        .set(rooms::current_occupancy.eq(occupied))
        .execute(conn)
        .map_err(|e| {
            PersistenceError::IntegrityViolation(format!(
                "room {room_id} occupancy {occupied} rejected: {e}"
            ))
        })?;

    debug!(room_id, occupied, "Recomputed room occupancy");
    Ok(())
}

fn upsert_room_type_allocation(
    conn: &mut SqliteConnection,
    student_id: i64,
    room_type: &RoomType,
    assigned_by: i64,
    notes: Option<&str>,
    now: &str,
) -> Result<(), PersistenceError> {
    diesel::insert_into(room_type_allocations::table)
        .values((
            room_type_allocations::student_id.eq(student_id),
            room_type_allocations::room_type.eq(room_type.as_str()),
            room_type_allocations::assigned_by.eq(assigned_by),
            room_type_allocations::notes.eq(notes),
            room_type_allocations::assigned_at.eq(now),
        ))
        .on_conflict(room_type_allocations::student_id)
        .do_update()
        .set((
            room_type_allocations::room_type.eq(room_type.as_str()),
            room_type_allocations::assigned_by.eq(assigned_by),
            room_type_allocations::notes.eq(notes),
            room_type_allocations::assigned_at.eq(now),
        ))
        .execute(conn)?;

    info!(student_id, room_type = %room_type, assigned_by, "Set room type allocation");
    Ok(())
}

/// Deletes a manual allocation; the student must not hold a bed.
fn delete_room_type_allocation(
    conn: &mut SqliteConnection,
    student_id: i64,
) -> Result<(), PersistenceError> {
    if find_selection_for_student(conn, student_id)?.is_some() {
        return Err(PersistenceError::IntegrityViolation(format!(
            "student {student_id} holds a bed while losing their room type"
        )));
    }
    let deleted: usize = diesel::delete(
        room_type_allocations::table.filter(room_type_allocations::student_id.eq(student_id)),
    )
    .execute(conn)?;
    expect_one_row(deleted, || {
        format!("no room type allocation for student {student_id}")
    })?;

    info!(student_id, "Removed room type allocation");
    Ok(())
}

fn insert_history(
    conn: &mut SqliteConnection,
    history: &HistoryEntry,
    now: &str,
) -> Result<(), PersistenceError> {
    diesel::insert_into(allocation_history::table)
        .values((
            allocation_history::student_id.eq(history.student_id),
            allocation_history::room_id.eq(history.room_id),
            allocation_history::bed_id.eq(history.bed_id),
            allocation_history::action.eq(history.action.as_str()),
            allocation_history::actor_id.eq(history.actor.id),
            allocation_history::actor_role.eq(history.actor.role.as_str()),
            allocation_history::notes.eq(history.notes.as_deref()),
            allocation_history::recorded_at.eq(now),
        ))
        .execute(conn)?;

    info!(
        student_id = history.student_id,
        bed_id = history.bed_id,
        action = history.action.as_str(),
        "Recorded allocation history"
    );
    Ok(())
}

fn expect_one_row(
    affected: usize,
    describe: impl FnOnce() -> String,
) -> Result<(), PersistenceError> {
    if affected == 1 {
        Ok(())
    } else {
        Err(PersistenceError::IntegrityViolation(describe()))
    }
}
