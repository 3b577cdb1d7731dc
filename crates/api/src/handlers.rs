// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! API handler functions for administrative and read-only operations.
//!
//! Bed claims, releases and moves go through the
//! [`BedSelectionCoordinator`](crate::BedSelectionCoordinator); everything
//! else is a single call against exclusively borrowed persistence.

use rand::seq::SliceRandom;
use tracing::info;

use dorm_lottery::{AllocationState, BedTarget, Command, TransitionResult, apply};
use dorm_lottery_audit::{Action, Actor, AuditEvent, StateSnapshot};
use dorm_lottery_domain::{
    BedSelection, BucketCount, Composition, DomainError, DrawAssignment, LotteryEvent,
    LotteryResult, Room, RoomType, Student, assign_draw, bucket_counts, validate_capacity, validate_composition, validate_name,
    validate_room_number, validate_scheduled_at,
};
use dorm_lottery_persistence::{Persistence, RoomChanges};

use crate::auth::{AuthenticatedActor, Role};
use crate::error::{
    ApiError, translate_core_error, translate_domain_error, translate_persistence_error,
};
use crate::request_response::{
    AllocationHistoryResponse, AllocationStatusResponse, AuditEventInfo, BedInfo,
    BucketCountInfo, BuildingInfo, CorrectLotteryResultRequest, CreateBuildingRequest,
    CreateLotteryEventRequest, CreateRoomRequest, FreeBedInfo, HistoryEntryInfo,
    IntegrityReportResponse, ListAllocationsResponse, ListAuditEventsResponse,
    ListFreeBedsResponse, ListLotteryResultsResponse, LotteryEventInfo,
    LotteryEventUpdateResponse, LotteryResultInfo, RegisterStudentRequest, RoomDetailResponse,
    RoomInfo, RunLotteryDrawRequest, RunLotteryDrawResponse, SelectionInfo,
    SelectionLookupResponse, SetRoomAvailabilityRequest, SetRoomTypeAllocationRequest,
    StudentInfo, UpdateRoomRequest,
};

// ============================================================================
// Accounts
// ============================================================================

/// Creates the first administrator account.
///
/// Succeeds only while no administrator exists.
///
/// # Errors
///
/// Returns `DomainRuleViolation` if an administrator already exists, or
/// `InvalidInput` if the username or name is empty.
pub fn bootstrap_admin(
    persistence: &mut Persistence,
    request: &RegisterStudentRequest,
) -> Result<StudentInfo, ApiError> {
    let admins: i64 = persistence
        .count_admins()
        .map_err(translate_persistence_error)?;
    if admins > 0 {
        return Err(ApiError::DomainRuleViolation {
            rule: String::from("bootstrap_once"),
            message: String::from("An administrator already exists"),
        });
    }

    validate_name("username", &request.username).map_err(translate_domain_error)?;
    validate_name("full_name", &request.full_name).map_err(translate_domain_error)?;

    let admin: Student = persistence
        .create_student(request.username.trim(), request.full_name.trim(), true)
        .map_err(translate_persistence_error)?;
    info!(student_id = admin.student_id, "Bootstrapped first administrator");
    Ok(StudentInfo::from(admin))
}

/// Registers a student account.
///
/// # Errors
///
/// Returns `InvalidInput` for empty fields or `DomainRuleViolation` if the
/// username is taken.
pub fn register_student(
    persistence: &mut Persistence,
    request: &RegisterStudentRequest,
) -> Result<StudentInfo, ApiError> {
    validate_name("username", &request.username).map_err(translate_domain_error)?;
    validate_name("full_name", &request.full_name).map_err(translate_domain_error)?;

    let student: Student = persistence
        .create_student(request.username.trim(), request.full_name.trim(), false)
        .map_err(translate_persistence_error)?;
    Ok(StudentInfo::from(student))
}

/// Lists every account.
///
/// # Errors
///
/// Returns `Unauthorized` for non-administrators.
pub fn list_students(
    persistence: &mut Persistence,
    authenticated_actor: &AuthenticatedActor,
) -> Result<Vec<StudentInfo>, ApiError> {
    authenticated_actor.require_admin("list_students")?;
    Ok(persistence
        .list_students()
        .map_err(translate_persistence_error)?
        .into_iter()
        .map(StudentInfo::from)
        .collect())
}

/// Looks up an account by username.
///
/// # Errors
///
/// Returns `Unauthorized` for non-administrators or `NotFound` for an
/// unknown username.
pub fn find_student(
    persistence: &mut Persistence,
    username: &str,
    authenticated_actor: &AuthenticatedActor,
) -> Result<StudentInfo, ApiError> {
    authenticated_actor.require_admin("find_student")?;
    persistence
        .find_student_by_username(username.trim())
        .map_err(translate_persistence_error)?
        .map(StudentInfo::from)
        .ok_or_else(|| ApiError::NotFound {
            resource_type: String::from("Student"),
            message: format!("No account with username '{}'", username.trim()),
        })
}

// ============================================================================
// Inventory
// ============================================================================

/// Creates a building.
///
/// # Errors
///
/// Returns `Unauthorized`, `InvalidInput` for an empty name, or
/// `DomainRuleViolation` if the name is taken.
pub fn create_building(
    persistence: &mut Persistence,
    request: &CreateBuildingRequest,
    authenticated_actor: &AuthenticatedActor,
) -> Result<BuildingInfo, ApiError> {
    authenticated_actor.require_admin("create_building")?;
    validate_name("building name", &request.name).map_err(translate_domain_error)?;

    persistence
        .create_building(request.name.trim())
        .map(BuildingInfo::from)
        .map_err(translate_persistence_error)
}

/// Lists buildings.
///
/// # Errors
///
/// Returns an error if the query fails.
pub fn list_buildings(persistence: &mut Persistence) -> Result<Vec<BuildingInfo>, ApiError> {
    Ok(persistence
        .list_buildings()
        .map_err(translate_persistence_error)?
        .into_iter()
        .map(BuildingInfo::from)
        .collect())
}

/// Creates a room together with its beds.
///
/// # Errors
///
/// Returns `Unauthorized`, `InvalidInput` or `InvalidRoomType` for bad
/// input, `NotFound` for a missing building, or `DomainRuleViolation` if
/// the room number is taken in the building.
pub fn create_room(
    persistence: &mut Persistence,
    request: &CreateRoomRequest,
    authenticated_actor: &AuthenticatedActor,
) -> Result<RoomInfo, ApiError> {
    authenticated_actor.require_admin("create_room")?;
    let room_type: RoomType = RoomType::new(&request.room_type).map_err(translate_domain_error)?;
    validate_room_number(&request.room_number).map_err(translate_domain_error)?;
    validate_capacity(request.capacity).map_err(translate_domain_error)?;

    persistence
        .create_room(
            request.building_id,
            request.room_number.trim(),
            &room_type,
            request.capacity,
        )
        .map(RoomInfo::from)
        .map_err(translate_persistence_error)
}

/// Lists rooms, optionally for one building.
///
/// # Errors
///
/// Returns an error if the query fails.
pub fn list_rooms(
    persistence: &mut Persistence,
    building_id: Option<i64>,
) -> Result<Vec<RoomInfo>, ApiError> {
    Ok(persistence
        .list_rooms(building_id)
        .map_err(translate_persistence_error)?
        .into_iter()
        .map(RoomInfo::from)
        .collect())
}

/// Opens or closes a room for selection. Existing selections stay.
///
/// # Errors
///
/// Returns `Unauthorized` or `NotFound`.
pub fn set_room_availability(
    persistence: &mut Persistence,
    request: &SetRoomAvailabilityRequest,
    authenticated_actor: &AuthenticatedActor,
) -> Result<RoomInfo, ApiError> {
    authenticated_actor.require_admin("set_room_availability")?;
    persistence
        .set_room_availability(request.room_id, request.is_available)
        .map(RoomInfo::from)
        .map_err(translate_persistence_error)
}

/// Describes one room and its beds.
///
/// # Errors
///
/// Returns `NotFound` for an unknown room.
pub fn get_room(
    persistence: &mut Persistence,
    room_id: i64,
) -> Result<RoomDetailResponse, ApiError> {
    let room: Room = persistence
        .get_room(room_id)
        .map_err(translate_persistence_error)?;
    let beds: Vec<BedInfo> = persistence
        .list_beds(room_id)
        .map_err(translate_persistence_error)?
        .into_iter()
        .map(BedInfo::from)
        .collect();

    Ok(RoomDetailResponse {
        room: RoomInfo::from(room),
        beds,
    })
}

/// Edits a room's type, bed count or availability in one step.
///
/// Beds are added or removed from the end of the room. A room whose beds
/// are held cannot change type, and cannot shrink below its occupancy or
/// onto a bed that is held or appears in history.
///
/// # Errors
///
/// Returns `Unauthorized`, `InvalidInput`/`InvalidRoomType` for bad input,
/// `NotFound`, or `DomainRuleViolation` if the room's beds are in use.
pub fn update_room(
    persistence: &mut Persistence,
    request: &UpdateRoomRequest,
    authenticated_actor: &AuthenticatedActor,
) -> Result<RoomInfo, ApiError> {
    authenticated_actor.require_admin("update_room")?;
    let room_type: Option<RoomType> = request
        .room_type
        .as_deref()
        .map(RoomType::new)
        .transpose()
        .map_err(translate_domain_error)?;
    if let Some(capacity) = request.capacity {
        validate_capacity(capacity).map_err(translate_domain_error)?;
    }

    let changes: RoomChanges = RoomChanges {
        room_type,
        capacity: request.capacity,
        is_available: request.is_available,
    };
    persistence
        .update_room(request.room_id, &changes)
        .map(RoomInfo::from)
        .map_err(translate_persistence_error)
}

/// Deletes an unused room and its beds.
///
/// # Errors
///
/// Returns `Unauthorized`, `NotFound`, or `DomainRuleViolation` if the room
/// has occupied beds, selections or history.
pub fn delete_room(
    persistence: &mut Persistence,
    room_id: i64,
    authenticated_actor: &AuthenticatedActor,
) -> Result<(), ApiError> {
    authenticated_actor.require_admin("delete_room")?;
    persistence
        .delete_room(room_id)
        .map_err(translate_persistence_error)
}

/// Deletes a building that owns no rooms.
///
/// # Errors
///
/// Returns `Unauthorized`, `NotFound`, or `DomainRuleViolation` if rooms
/// remain.
pub fn delete_building(
    persistence: &mut Persistence,
    building_id: i64,
    authenticated_actor: &AuthenticatedActor,
) -> Result<(), ApiError> {
    authenticated_actor.require_admin("delete_building")?;
    persistence
        .delete_building(building_id)
        .map_err(translate_persistence_error)
}

/// Lists beds still free for a room type.
///
/// # Errors
///
/// Returns `InvalidRoomType` for a malformed label.
pub fn list_free_beds(
    persistence: &mut Persistence,
    room_type: &str,
) -> Result<ListFreeBedsResponse, ApiError> {
    let room_type: RoomType = RoomType::new(room_type).map_err(translate_domain_error)?;
    let beds: Vec<FreeBedInfo> = persistence
        .list_free_beds(&room_type)
        .map_err(translate_persistence_error)?
        .into_iter()
        .map(FreeBedInfo::from)
        .collect();

    Ok(ListFreeBedsResponse {
        room_type: room_type.to_string(),
        beds,
    })
}

// ============================================================================
// Lottery
// ============================================================================

/// Creates an unpublished lottery event.
///
/// # Errors
///
/// Returns `Unauthorized`, or `InvalidInput`/`InvalidRoomType` if the name,
/// time or composition is invalid.
pub fn create_lottery_event(
    persistence: &mut Persistence,
    request: &CreateLotteryEventRequest,
    authenticated_actor: &AuthenticatedActor,
) -> Result<LotteryEventInfo, ApiError> {
    authenticated_actor.require_admin("create_lottery_event")?;
    validate_name("event name", &request.name).map_err(translate_domain_error)?;
    validate_scheduled_at(&request.scheduled_at).map_err(translate_domain_error)?;
    let composition: Composition = request
        .composition
        .to_composition()
        .map_err(translate_domain_error)?;
    validate_composition(&composition).map_err(translate_domain_error)?;

    let actor: Actor = authenticated_actor.to_audit_actor();
    let audit_event: AuditEvent = AuditEvent::new(
        actor,
        Action::new(
            String::from("CreateLotteryEvent"),
            Some(format!(
                "name={}, scheduled_at={}",
                request.name.trim(),
                request.scheduled_at
            )),
        ),
        StateSnapshot::new(String::from("event=none")),
        StateSnapshot::new(format!("name={},published=false", request.name.trim())),
    );

    let event: LotteryEvent = persistence
        .create_lottery_event(
            request.name.trim(),
            &request.scheduled_at,
            &composition,
            authenticated_actor.student_id,
            &audit_event,
        )
        .map_err(translate_persistence_error)?;
    Ok(LotteryEventInfo::from(&event))
}

/// Lists lottery events, newest first.
///
/// # Errors
///
/// Returns an error if the query fails.
pub fn list_lottery_events(persistence: &mut Persistence) -> Result<Vec<LotteryEventInfo>, ApiError> {
    Ok(persistence
        .list_lottery_events()
        .map_err(translate_persistence_error)?
        .iter()
        .map(LotteryEventInfo::from)
        .collect())
}

/// Draws an event: shuffles every eligible student and partitions the
/// permutation into room-type groups.
///
/// Eligible students are non-administrators without a result in the event.
/// The permutation is re-randomized on every call. Results are written all
/// at once or not at all.
///
/// # Errors
///
/// Returns:
/// - `Unauthorized` for non-administrators
/// - `NotFound` if the event does not exist
/// - `AlreadyPublished` or `AlreadyDrawn` if the event cannot take a draw
/// - `NoParticipants` if nobody is eligible
/// - `CapacityExceeded` if the composition cannot seat everyone
pub fn run_lottery_draw(
    persistence: &mut Persistence,
    request: &RunLotteryDrawRequest,
    authenticated_actor: &AuthenticatedActor,
) -> Result<RunLotteryDrawResponse, ApiError> {
    authenticated_actor.require_admin("run_lottery_draw")?;
    let event_id: i64 = request.event_id;

    let composition: Option<Composition> = request
        .composition
        .as_ref()
        .map(|c| c.to_composition().map_err(translate_domain_error))
        .transpose()?;

    let event: LotteryEvent = persistence
        .get_lottery_event(event_id)
        .map_err(translate_persistence_error)?;
    if event.is_published {
        return Err(ApiError::AlreadyPublished { event_id });
    }
    let existing: usize = persistence
        .list_lottery_results(event_id)
        .map_err(translate_persistence_error)?
        .len();
    if existing > 0 {
        return Err(ApiError::AlreadyDrawn { event_id });
    }

    let composition: Composition = composition.unwrap_or(event.composition);
    let mut order: Vec<i64> = persistence
        .list_draw_candidates(event_id)
        .map_err(translate_persistence_error)?;
    order.shuffle(&mut rand::rng());

    let assignments: Vec<DrawAssignment> =
        assign_draw(&order, &composition).map_err(|e| match e {
            DomainError::NoParticipants => ApiError::NoParticipants { event_id },
            other => translate_domain_error(other),
        })?;
    let counts: Vec<BucketCount> = bucket_counts(&assignments);

    let actor: Actor = authenticated_actor.to_audit_actor();
    let audit_event: AuditEvent = AuditEvent::new(
        actor,
        Action::new(
            String::from("RunLotteryDraw"),
            Some(format!(
                "event_id={event_id}, participants={}, groups={}",
                assignments.len(),
                counts.len()
            )),
        ),
        StateSnapshot::new(format!("event={event_id},results=0")),
        StateSnapshot::new(format!("event={event_id},results={}", assignments.len())),
    );
    persistence
        .persist_draw(event_id, &composition, &assignments, &audit_event)
        .map_err(translate_persistence_error)?;

    info!(event_id, participants = assignments.len(), "Lottery draw completed");

    Ok(RunLotteryDrawResponse {
        event_id,
        results: assignments
            .into_iter()
            .map(|a| LotteryResultInfo {
                event_id,
                student_id: a.student_id,
                draw_number: a.draw_number,
                group_label: a.group_label,
                room_type: Some(a.room_type.to_string()),
            })
            .collect(),
        bucket_counts: counts.into_iter().map(BucketCountInfo::from).collect(),
    })
}

/// Publishes an event's results.
///
/// A drawn student without a manual allocation who already holds a bed
/// must be drawn into that bed's room type, or publishing is refused.
///
/// # Errors
///
/// Returns `Unauthorized`, `NotFound`, `AlreadyPublished`, or
/// `DomainRuleViolation` if publishing would change a bed holder's room
/// type.
pub fn publish_lottery(
    persistence: &mut Persistence,
    event_id: i64,
    authenticated_actor: &AuthenticatedActor,
) -> Result<LotteryEventUpdateResponse, ApiError> {
    authenticated_actor.require_admin("publish_lottery")?;
    let results: usize = persistence
        .list_lottery_results(event_id)
        .map_err(translate_persistence_error)?
        .len();

    let audit_event: AuditEvent = AuditEvent::new(
        authenticated_actor.to_audit_actor(),
        Action::new(
            String::from("PublishLottery"),
            Some(format!("event_id={event_id}, results={results}")),
        ),
        StateSnapshot::new(format!("event={event_id},published=false")),
        StateSnapshot::new(format!("event={event_id},published=true")),
    );
    persistence
        .publish_lottery(event_id, &audit_event)
        .map_err(translate_persistence_error)?;

    Ok(LotteryEventUpdateResponse {
        event_id,
        results_affected: results,
        message: format!("Published lottery event {event_id} with {results} results"),
    })
}

/// Deletes an unpublished event that has not been drawn.
///
/// Results are never removed as a side effect; reset the event first.
///
/// # Errors
///
/// Returns `Unauthorized`, `NotFound`, `AlreadyPublished`, or
/// `DomainRuleViolation` if the event has results.
pub fn delete_lottery_event(
    persistence: &mut Persistence,
    event_id: i64,
    authenticated_actor: &AuthenticatedActor,
) -> Result<LotteryEventUpdateResponse, ApiError> {
    authenticated_actor.require_admin("delete_lottery_event")?;
    let audit_event: AuditEvent = AuditEvent::new(
        authenticated_actor.to_audit_actor(),
        Action::new(
            String::from("DeleteLotteryEvent"),
            Some(format!("event_id={event_id}")),
        ),
        StateSnapshot::new(format!("event={event_id},published=false")),
        StateSnapshot::new(String::from("event=none")),
    );
    persistence
        .delete_lottery_event(event_id, &audit_event)
        .map_err(translate_persistence_error)?;

    Ok(LotteryEventUpdateResponse {
        event_id,
        results_affected: 0,
        message: format!("Deleted lottery event {event_id}"),
    })
}

/// Deletes every result of an unpublished event so it can be drawn again.
///
/// # Errors
///
/// Returns `Unauthorized`, `NotFound` or `AlreadyPublished`.
pub fn reset_lottery(
    persistence: &mut Persistence,
    event_id: i64,
    authenticated_actor: &AuthenticatedActor,
) -> Result<LotteryEventUpdateResponse, ApiError> {
    authenticated_actor.require_admin("reset_lottery")?;
    let results: usize = persistence
        .list_lottery_results(event_id)
        .map_err(translate_persistence_error)?
        .len();

    let audit_event: AuditEvent = AuditEvent::new(
        authenticated_actor.to_audit_actor(),
        Action::new(
            String::from("ResetLottery"),
            Some(format!("event_id={event_id}")),
        ),
        StateSnapshot::new(format!("event={event_id},results={results}")),
        StateSnapshot::new(format!("event={event_id},results=0")),
    );
    let deleted: usize = persistence
        .reset_lottery(event_id, &audit_event)
        .map_err(translate_persistence_error)?;

    Ok(LotteryEventUpdateResponse {
        event_id,
        results_affected: deleted,
        message: format!("Deleted {deleted} results of lottery event {event_id}"),
    })
}

/// Corrects one result of an unpublished event.
///
/// # Errors
///
/// Returns `Unauthorized`, `InvalidInput`/`InvalidRoomType` for bad values,
/// `NotFound`, `AlreadyPublished`, or `DomainRuleViolation` if the draw
/// number is taken.
pub fn correct_lottery_result(
    persistence: &mut Persistence,
    request: &CorrectLotteryResultRequest,
    authenticated_actor: &AuthenticatedActor,
) -> Result<LotteryResultInfo, ApiError> {
    authenticated_actor.require_admin("correct_lottery_result")?;
    if request.draw_number == Some(0) {
        return Err(translate_domain_error(DomainError::InvalidDrawNumber(0)));
    }
    let room_type: Option<RoomType> = request
        .room_type
        .as_deref()
        .map(RoomType::new)
        .transpose()
        .map_err(translate_domain_error)?;
    if let Some(label) = &request.group_label {
        validate_name("group_label", label).map_err(translate_domain_error)?;
    }

    let current: LotteryResult = persistence
        .get_lottery_result(request.event_id, request.student_id)
        .map_err(translate_persistence_error)?;
    let corrected: LotteryResult = LotteryResult {
        event_id: current.event_id,
        student_id: current.student_id,
        draw_number: request.draw_number.unwrap_or(current.draw_number),
        group_label: request
            .group_label
            .as_ref()
            .map_or_else(|| current.group_label.clone(), |l| l.trim().to_string()),
        room_type: room_type.or_else(|| current.room_type.clone()),
    };

    let audit_event: AuditEvent = AuditEvent::new(
        authenticated_actor.to_audit_actor(),
        Action::new(
            String::from("CorrectLotteryResult"),
            Some(format!(
                "event_id={}, student_id={}",
                request.event_id, request.student_id
            )),
        ),
        result_snapshot(&current),
        result_snapshot(&corrected),
    );
    persistence
        .update_lottery_result(&corrected, &audit_event)
        .map_err(translate_persistence_error)?;

    Ok(LotteryResultInfo::from(corrected))
}

fn result_snapshot(result: &LotteryResult) -> StateSnapshot {
    StateSnapshot::new(format!(
        "draw_number={},group={},room_type={}",
        result.draw_number,
        result.group_label,
        result.room_type.as_ref().map_or("none", RoomType::as_str)
    ))
}

/// Lists an event's results.
///
/// Administrators see every result. Students see only their own, and only
/// once the event is published.
///
/// # Errors
///
/// Returns `NotFound` if the event does not exist.
pub fn list_lottery_results(
    persistence: &mut Persistence,
    event_id: i64,
    authenticated_actor: &AuthenticatedActor,
) -> Result<ListLotteryResultsResponse, ApiError> {
    let event: LotteryEvent = persistence
        .get_lottery_event(event_id)
        .map_err(translate_persistence_error)?;
    let results: Vec<LotteryResult> = persistence
        .list_lottery_results(event_id)
        .map_err(translate_persistence_error)?;

    let visible: Vec<LotteryResultInfo> = match authenticated_actor.role {
        Role::Admin => results.into_iter().map(LotteryResultInfo::from).collect(),
        Role::Student if event.is_published => results
            .into_iter()
            .filter(|r| r.student_id == authenticated_actor.student_id)
            .map(LotteryResultInfo::from)
            .collect(),
        Role::Student => Vec::new(),
    };

    Ok(ListLotteryResultsResponse {
        event: LotteryEventInfo::from(&event),
        results: visible,
    })
}

// ============================================================================
// Allocation
// ============================================================================

/// Assigns a room type to a student outside the lottery, replacing any
/// previous manual assignment.
///
/// # Errors
///
/// Returns `Unauthorized`, `InvalidRoomType`, `NotFound` for an unknown
/// student, `NotEligibleTarget` for administrator accounts, or
/// `DomainRuleViolation` if the student holds a bed of another type.
pub fn set_room_type_allocation(
    persistence: &mut Persistence,
    request: &SetRoomTypeAllocationRequest,
    authenticated_actor: &AuthenticatedActor,
) -> Result<AllocationStatusResponse, ApiError> {
    authenticated_actor.require_admin("set_room_type_allocation")?;
    let room_type: RoomType = RoomType::new(&request.room_type).map_err(translate_domain_error)?;

    let state: AllocationState = load_existing_state(persistence, request.student_id)?;
    let command: Command = Command::AssignRoomType {
        room_type,
        notes: request.notes.clone(),
    };
    let result: TransitionResult = apply(
        &state,
        None::<&BedTarget>,
        command,
        authenticated_actor.to_audit_actor(),
    )
    .map_err(translate_core_error)?;
    persistence
        .persist_transition(&result)
        .map_err(translate_persistence_error)?;

    Ok(AllocationStatusResponse::from(result.new_state))
}

/// Removes a student's manual room type.
///
/// The student falls back to their latest published lottery result, if
/// any, and the returned status reflects that.
///
/// # Errors
///
/// Returns `Unauthorized`, `NotFound` for an unknown student or a student
/// without a manual allocation, `NotEligibleTarget` for administrator
/// accounts, or `DomainRuleViolation` if the student holds a bed.
pub fn remove_room_type_allocation(
    persistence: &mut Persistence,
    student_id: i64,
    notes: Option<String>,
    authenticated_actor: &AuthenticatedActor,
) -> Result<AllocationStatusResponse, ApiError> {
    authenticated_actor.require_admin("remove_room_type_allocation")?;
    let state: AllocationState = load_existing_state(persistence, student_id)?;
    let result: TransitionResult = apply(
        &state,
        None::<&BedTarget>,
        Command::RemoveRoomType { notes },
        authenticated_actor.to_audit_actor(),
    )
    .map_err(translate_core_error)?;
    persistence
        .persist_transition(&result)
        .map_err(translate_persistence_error)?;

    let reloaded: AllocationState = load_existing_state(persistence, student_id)?;
    Ok(AllocationStatusResponse::from(reloaded))
}

/// Lists every live bed selection, by bed.
///
/// # Errors
///
/// Returns `Unauthorized` for non-administrators.
pub fn list_allocations(
    persistence: &mut Persistence,
    authenticated_actor: &AuthenticatedActor,
) -> Result<ListAllocationsResponse, ApiError> {
    authenticated_actor.require_admin("list_allocations")?;
    let selections: Vec<SelectionInfo> = persistence
        .list_selections()
        .map_err(translate_persistence_error)?
        .into_iter()
        .map(SelectionInfo::from)
        .collect();
    Ok(ListAllocationsResponse { selections })
}

/// Lists students who hold no bed.
///
/// # Errors
///
/// Returns `Unauthorized` for non-administrators.
pub fn list_unallocated_students(
    persistence: &mut Persistence,
    authenticated_actor: &AuthenticatedActor,
) -> Result<Vec<StudentInfo>, ApiError> {
    authenticated_actor.require_admin("list_unallocated_students")?;
    Ok(persistence
        .list_students_without_selection()
        .map_err(translate_persistence_error)?
        .into_iter()
        .map(StudentInfo::from)
        .collect())
}

/// Lists students with neither a manual room type nor a published lottery
/// result.
///
/// # Errors
///
/// Returns `Unauthorized` for non-administrators.
pub fn list_room_type_unallocated_students(
    persistence: &mut Persistence,
    authenticated_actor: &AuthenticatedActor,
) -> Result<Vec<StudentInfo>, ApiError> {
    authenticated_actor.require_admin("list_room_type_unallocated_students")?;
    Ok(persistence
        .list_students_without_room_type()
        .map_err(translate_persistence_error)?
        .into_iter()
        .map(StudentInfo::from)
        .collect())
}

/// Reports a student's live selection.
///
/// # Errors
///
/// Returns `Unauthorized` if a student asks about someone else, or
/// `NotFound` for an unknown student.
pub fn get_selection(
    persistence: &mut Persistence,
    student_id: i64,
    authenticated_actor: &AuthenticatedActor,
) -> Result<SelectionLookupResponse, ApiError> {
    require_self_or_admin(authenticated_actor, student_id, "get_selection")?;
    persistence
        .get_student(student_id)
        .map_err(translate_persistence_error)?;
    let selection: Option<BedSelection> = persistence
        .current_selection(student_id)
        .map_err(translate_persistence_error)?;
    Ok(SelectionLookupResponse {
        student_id,
        selection: selection.map(SelectionInfo::from),
    })
}

/// Reports a student's current allocation status.
///
/// # Errors
///
/// Returns `Unauthorized` if a student asks about someone else, or
/// `NotFound` for an unknown student.
pub fn get_allocation_status(
    persistence: &mut Persistence,
    student_id: i64,
    authenticated_actor: &AuthenticatedActor,
) -> Result<AllocationStatusResponse, ApiError> {
    require_self_or_admin(authenticated_actor, student_id, "get_allocation_status")?;
    let state: AllocationState = load_existing_state(persistence, student_id)?;
    Ok(AllocationStatusResponse::from(state))
}

/// Lists a student's allocation history, oldest first.
///
/// # Errors
///
/// Returns `Unauthorized` if a student asks about someone else, or
/// `NotFound` for an unknown student.
pub fn get_allocation_history(
    persistence: &mut Persistence,
    student_id: i64,
    authenticated_actor: &AuthenticatedActor,
) -> Result<AllocationHistoryResponse, ApiError> {
    require_self_or_admin(authenticated_actor, student_id, "get_allocation_history")?;
    persistence
        .get_student(student_id)
        .map_err(translate_persistence_error)?;

    let entries: Vec<HistoryEntryInfo> = persistence
        .get_allocation_history(student_id)
        .map_err(translate_persistence_error)?
        .into_iter()
        .map(HistoryEntryInfo::from)
        .collect();
    Ok(AllocationHistoryResponse {
        student_id,
        entries,
    })
}

fn require_self_or_admin(
    authenticated_actor: &AuthenticatedActor,
    student_id: i64,
    action: &str,
) -> Result<(), ApiError> {
    if authenticated_actor.role == Role::Admin || authenticated_actor.student_id == student_id {
        Ok(())
    } else {
        Err(ApiError::Unauthorized {
            action: String::from(action),
            required_role: String::from("Admin"),
        })
    }
}

fn load_existing_state(
    persistence: &mut Persistence,
    student_id: i64,
) -> Result<AllocationState, ApiError> {
    persistence
        .load_allocation_state(student_id)
        .map_err(translate_persistence_error)?
        .ok_or_else(|| ApiError::NotFound {
            resource_type: String::from("Student"),
            message: format!("Student {student_id} does not exist"),
        })
}

// ============================================================================
// Audit and integrity
// ============================================================================

/// Scans occupancy counters against the selection ledger. Never repairs.
///
/// # Errors
///
/// Returns `Unauthorized` for non-administrators.
pub fn check_integrity(
    persistence: &mut Persistence,
    authenticated_actor: &AuthenticatedActor,
) -> Result<IntegrityReportResponse, ApiError> {
    authenticated_actor.require_admin("check_integrity")?;
    persistence
        .check_integrity()
        .map(IntegrityReportResponse::from)
        .map_err(translate_persistence_error)
}

/// Lists audit events, optionally for one action name.
///
/// # Errors
///
/// Returns `Unauthorized` for non-administrators.
pub fn list_audit_events(
    persistence: &mut Persistence,
    action_name: Option<&str>,
    authenticated_actor: &AuthenticatedActor,
) -> Result<ListAuditEventsResponse, ApiError> {
    authenticated_actor.require_admin("list_audit_events")?;
    let events: Vec<AuditEventInfo> = persistence
        .list_audit_events(action_name)
        .map_err(translate_persistence_error)?
        .into_iter()
        .map(AuditEventInfo::from)
        .collect();
    Ok(ListAuditEventsResponse { events })
}
