// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use crate::command::Command;
use crate::error::CoreError;
use crate::state::{
    AllocationState, BedTarget, Effect, RoomTypeAssignment, RoomTypeSource, TransitionResult,
};
use dorm_lottery_audit::{Action, Actor, AuditEvent, HistoryAction, HistoryEntry};
use dorm_lottery_domain::{AllocationStatus, Authority, BedSelection, DomainError, RoomType};

/// Applies a command to a student's allocation state.
///
/// Preconditions are checked in a fixed order and the first failure is
/// returned; a rejected command has no effect and produces no history.
///
/// For `ClaimBed` the order is:
/// 1. Student exists, is not an administrator, and is the actor (`Forbidden`)
/// 2. Student has an effective room type (`NotEligible`)
/// 3. Bed exists (`BedNotFound`)
/// 4. Room type matches (`TypeMismatch`)
/// 5. Room is available (`RoomUnavailable`)
/// 6. Bed is free (`Conflict`)
///
/// # Arguments
///
/// * `state` - The student's current allocation state, freshly loaded
/// * `target` - The bed the command moves into, if it names one
/// * `command` - The command to apply
/// * `actor` - The actor performing this action
///
/// # Returns
///
/// * `Ok(TransitionResult)` describing the new state, the storage effect,
///   the history row and, for administrator actions, the audit event
/// * `Err(CoreError)` if the command is rejected
///
/// # Errors
///
/// Returns an error if any precondition fails or stored state is
/// inconsistent.
#[allow(clippy::too_many_lines)]
pub fn apply(
    state: &AllocationState,
    target: Option<&BedTarget>,
    command: Command,
    actor: Actor,
) -> Result<TransitionResult, CoreError> {
    let student_id: i64 = state.student.student_id;

    match command {
        Command::ClaimBed { bed_id } => {
            authorize_self_service(state, &actor)?;
            let room_type: &RoomType = effective_room_type(state)?;
            let target: &BedTarget = check_target(student_id, room_type, target, bed_id)?;

            // Re-claiming the held bed succeeds without touching anything.
            if state.selection.as_ref().is_some_and(|s| s.bed_id == bed_id) {
                return Ok(TransitionResult::unchanged(state.clone()));
            }
            reject_confirmed(state)?;
            state
                .status()
                .validate_transition(AllocationStatus::BedSelected, Authority::SelfService)?;

            let selection: BedSelection =
                BedSelection::new(student_id, target.room.room_id, bed_id);
            let notes: Option<String> = state
                .selection
                .as_ref()
                .map(|previous| format!("replaced bed {}", previous.bed_id));
            let history: HistoryEntry = HistoryEntry::new(
                student_id,
                target.room.room_id,
                bed_id,
                HistoryAction::Assigned,
                actor,
                notes,
            );

            Ok(TransitionResult {
                new_state: with_selection(state, Some(selection.clone())),
                effect: Effect::Claim {
                    replaced: state.selection.clone(),
                    selection,
                },
                history: Some(history),
                audit_event: None,
            })
        }
        Command::ReleaseBed => {
            authorize_self_service(state, &actor)?;
            let current: &BedSelection = held_selection(state)?;
            reject_confirmed(state)?;
            state
                .status()
                .validate_transition(AllocationStatus::RoomTypeSet, Authority::SelfService)?;

            let history: HistoryEntry = HistoryEntry::new(
                student_id,
                current.room_id,
                current.bed_id,
                HistoryAction::Removed,
                actor,
                None,
            );

            Ok(TransitionResult {
                new_state: with_selection(state, None),
                effect: Effect::Release {
                    released: current.clone(),
                },
                history: Some(history),
                audit_event: None,
            })
        }
        Command::SwapBed { new_bed_id } => {
            authorize_self_service(state, &actor)?;
            let room_type: &RoomType = effective_room_type(state)?;
            let current: &BedSelection = held_selection(state)?;
            if current.bed_id == new_bed_id {
                return Err(CoreError::SameBed { bed_id: new_bed_id });
            }
            reject_confirmed(state)?;
            let target: &BedTarget = check_target(student_id, room_type, target, new_bed_id)?;
            state
                .status()
                .validate_transition(AllocationStatus::BedSelected, Authority::SelfService)?;

            let moved: BedSelection = moved_selection(current, target);
            let history: HistoryEntry = HistoryEntry::new(
                student_id,
                target.room.room_id,
                new_bed_id,
                HistoryAction::Modified,
                actor,
                Some(format!("swapped from bed {}", current.bed_id)),
            );

            Ok(TransitionResult {
                new_state: with_selection(state, Some(moved.clone())),
                effect: Effect::Move {
                    from: current.clone(),
                    to: moved,
                },
                history: Some(history),
                audit_event: None,
            })
        }
        Command::ConfirmSelection => {
            authorize_self_service(state, &actor)?;
            let current: &BedSelection = held_selection(state)?;
            if current.is_confirmed {
                return Err(CoreError::AlreadyConfirmed { student_id });
            }
            state
                .status()
                .validate_transition(AllocationStatus::Confirmed, Authority::SelfService)?;

            let mut confirmed: BedSelection = current.clone();
            confirmed.is_confirmed = true;
            let history: HistoryEntry = HistoryEntry::new(
                student_id,
                current.room_id,
                current.bed_id,
                HistoryAction::Modified,
                actor,
                Some(String::from("confirmed")),
            );

            Ok(TransitionResult {
                new_state: with_selection(state, Some(confirmed)),
                effect: Effect::Confirm {
                    selection: current.clone(),
                },
                history: Some(history),
                audit_event: None,
            })
        }
        Command::RevokeSelection { notes } => {
            require_admin(&actor, "RevokeSelection")?;
            let current: &BedSelection = held_selection(state)?;
            state
                .status()
                .validate_transition(AllocationStatus::RoomTypeSet, Authority::Admin)?;

            let new_state: AllocationState = with_selection(state, None);
            let notes: String = notes.unwrap_or_else(|| String::from("revoked by administrator"));
            let audit_event: AuditEvent = AuditEvent::new(
                actor.clone(),
                Action::new(
                    String::from("RevokeSelection"),
                    Some(format!(
                        "Revoked bed {} from student {student_id}: {notes}",
                        current.bed_id
                    )),
                ),
                state.to_snapshot(),
                new_state.to_snapshot(),
            );
            let history: HistoryEntry = HistoryEntry::new(
                student_id,
                current.room_id,
                current.bed_id,
                HistoryAction::Removed,
                actor,
                Some(notes),
            );

            Ok(TransitionResult {
                new_state,
                effect: Effect::Release {
                    released: current.clone(),
                },
                history: Some(history),
                audit_event: Some(audit_event),
            })
        }
        Command::ReassignBed { new_bed_id, notes } => {
            require_admin(&actor, "ReassignBed")?;
            let room_type: &RoomType = effective_room_type(state)?;
            let current: &BedSelection = held_selection(state)?;
            if current.bed_id == new_bed_id {
                return Err(CoreError::SameBed { bed_id: new_bed_id });
            }
            let target: &BedTarget = check_target(student_id, room_type, target, new_bed_id)?;
            let status: AllocationStatus = state.status();
            status.validate_transition(status, Authority::Admin)?;

            let moved: BedSelection = moved_selection(current, target);
            let new_state: AllocationState = with_selection(state, Some(moved.clone()));
            let notes: String =
                notes.unwrap_or_else(|| format!("reassigned from bed {}", current.bed_id));
            let audit_event: AuditEvent = AuditEvent::new(
                actor.clone(),
                Action::new(
                    String::from("ReassignBed"),
                    Some(format!(
                        "Moved student {student_id} from bed {} to bed {new_bed_id}: {notes}",
                        current.bed_id
                    )),
                ),
                state.to_snapshot(),
                new_state.to_snapshot(),
            );
            let history: HistoryEntry = HistoryEntry::new(
                student_id,
                target.room.room_id,
                new_bed_id,
                HistoryAction::Modified,
                actor,
                Some(notes),
            );

            Ok(TransitionResult {
                new_state,
                effect: Effect::Move {
                    from: current.clone(),
                    to: moved,
                },
                history: Some(history),
                audit_event: Some(audit_event),
            })
        }
        Command::AssignRoomType { room_type, notes } => {
            require_admin(&actor, "AssignRoomType")?;
            if state.student.is_admin {
                return Err(CoreError::NotEligibleTarget { student_id });
            }

            let status: AllocationStatus = state.status();
            if state.selection.is_some() {
                // A held bed pins the room type; only a same-type record is accepted.
                let unchanged: bool = state
                    .assignment
                    .as_ref()
                    .is_some_and(|a| a.room_type == room_type);
                if !unchanged {
                    return Err(CoreError::DomainViolation(
                        DomainError::InvalidStatusTransition {
                            from: status.as_str().to_string(),
                            to: AllocationStatus::RoomTypeSet.as_str().to_string(),
                            reason: String::from(
                                "release the held bed before changing the room type",
                            ),
                        },
                    ));
                }
            } else {
                status.validate_transition(AllocationStatus::RoomTypeSet, Authority::Admin)?;
            }

            let mut new_state: AllocationState = state.clone();
            new_state.assignment = Some(RoomTypeAssignment {
                room_type: room_type.clone(),
                source: RoomTypeSource::Manual,
            });
            let audit_event: AuditEvent = AuditEvent::new(
                actor.clone(),
                Action::new(
                    String::from("SetRoomTypeAllocation"),
                    Some(format!(
                        "Assigned room type '{room_type}' to student {student_id}"
                    )),
                ),
                state.to_snapshot(),
                new_state.to_snapshot(),
            );

            Ok(TransitionResult {
                new_state,
                effect: Effect::SetRoomType {
                    room_type,
                    assigned_by: actor.id,
                    notes,
                },
                history: None,
                audit_event: Some(audit_event),
            })
        }
        Command::RemoveRoomType { notes } => {
            require_admin(&actor, "RemoveRoomType")?;
            if state.student.is_admin {
                return Err(CoreError::NotEligibleTarget { student_id });
            }
            let removed: &RoomType = state
                .assignment
                .as_ref()
                .filter(|a| a.source == RoomTypeSource::Manual)
                .map(|a| &a.room_type)
                .ok_or(CoreError::NoRoomTypeAllocation { student_id })?;
            state
                .status()
                .validate_transition(AllocationStatus::Unassigned, Authority::Admin)?;

            // Any published lottery result takes over once storage is
            // reloaded; the snapshot records the manual allocation going away.
            let mut new_state: AllocationState = state.clone();
            new_state.assignment = None;
            let notes: String =
                notes.unwrap_or_else(|| String::from("removed by administrator"));
            let audit_event: AuditEvent = AuditEvent::new(
                actor,
                Action::new(
                    String::from("RemoveRoomTypeAllocation"),
                    Some(format!(
                        "Removed room type '{removed}' from student {student_id}: {notes}"
                    )),
                ),
                state.to_snapshot(),
                new_state.to_snapshot(),
            );

            Ok(TransitionResult {
                new_state,
                effect: Effect::ClearRoomType,
                history: None,
                audit_event: Some(audit_event),
            })
        }
    }
}

/// Self-service commands need a non-admin student acting on their own
/// allocation, or an administrator acting for them.
fn authorize_self_service(state: &AllocationState, actor: &Actor) -> Result<(), CoreError> {
    if state.student.is_admin {
        return Err(CoreError::Forbidden {
            reason: format!(
                "account {} is an administrator and cannot hold a bed",
                state.student.student_id
            ),
        });
    }
    if !actor.is_admin() && actor.id != state.student.student_id {
        return Err(CoreError::Forbidden {
            reason: format!(
                "student {} cannot act on the allocation of student {}",
                actor.id, state.student.student_id
            ),
        });
    }
    Ok(())
}

fn require_admin(actor: &Actor, action: &str) -> Result<(), CoreError> {
    if actor.is_admin() {
        Ok(())
    } else {
        Err(CoreError::Forbidden {
            reason: format!("{action} requires an administrator"),
        })
    }
}

fn effective_room_type(state: &AllocationState) -> Result<&RoomType, CoreError> {
    state
        .assignment
        .as_ref()
        .map(|a| &a.room_type)
        .ok_or(CoreError::NotEligible {
            student_id: state.student.student_id,
        })
}

fn held_selection(state: &AllocationState) -> Result<&BedSelection, CoreError> {
    state.selection.as_ref().ok_or(CoreError::NoSelection {
        student_id: state.student.student_id,
    })
}

fn reject_confirmed(state: &AllocationState) -> Result<(), CoreError> {
    if state.selection.as_ref().is_some_and(|s| s.is_confirmed) {
        return Err(CoreError::SelectionConfirmed {
            student_id: state.student.student_id,
        });
    }
    Ok(())
}

/// Checks bed existence, type, room availability and occupancy, in that order.
///
/// A bed held by `student_id` itself passes the occupancy check; callers
/// decide what re-targeting the held bed means.
fn check_target<'a>(
    student_id: i64,
    room_type: &RoomType,
    target: Option<&'a BedTarget>,
    bed_id: i64,
) -> Result<&'a BedTarget, CoreError> {
    let target: &BedTarget = target.ok_or(CoreError::BedNotFound { bed_id })?;
    if target.bed.bed_id != bed_id || target.bed.room_id != target.room.room_id {
        return Err(CoreError::IntegrityViolation(format!(
            "loaded bed {} in room {} does not match requested bed {bed_id}",
            target.bed.bed_id, target.room.room_id
        )));
    }

    if &target.room.room_type != room_type {
        return Err(CoreError::TypeMismatch {
            expected: room_type.clone(),
            actual: target.room.room_type.clone(),
        });
    }

    if !target.room.is_available {
        return Err(CoreError::RoomUnavailable {
            room_id: target.room.room_id,
        });
    }

    if target.bed.is_occupied != target.holder.is_some() {
        return Err(CoreError::IntegrityViolation(format!(
            "bed {bed_id} occupancy flag is {} but {} live selection references it",
            target.bed.is_occupied,
            if target.holder.is_some() { "a" } else { "no" }
        )));
    }

    match &target.holder {
        Some(holder) if holder.student_id != student_id => Err(CoreError::Conflict { bed_id }),
        _ => Ok(target),
    }
}

fn moved_selection(current: &BedSelection, target: &BedTarget) -> BedSelection {
    BedSelection {
        selection_id: current.selection_id,
        student_id: current.student_id,
        room_id: target.room.room_id,
        bed_id: target.bed.bed_id,
        is_confirmed: current.is_confirmed,
        selected_at: None,
    }
}

fn with_selection(state: &AllocationState, selection: Option<BedSelection>) -> AllocationState {
    AllocationState {
        student: state.student.clone(),
        assignment: state.assignment.clone(),
        selection,
    }
}
