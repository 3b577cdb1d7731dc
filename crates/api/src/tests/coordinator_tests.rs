// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use dorm_lottery_persistence::Persistence;

use crate::{
    AllocationHistoryResponse, AllocationStatusResponse, ApiError, AuthenticatedActor,
    BedSelectionCoordinator, ListAllocationsResponse, LotteryEventInfo, RoomInfo,
    RunLotteryDrawRequest, SelectionLookupResponse, SelectionOutcome, SelectionResponse,
    SetRoomAvailabilityRequest, SetRoomTypeAllocationRequest, StudentInfo, check_integrity,
    create_lottery_event, get_allocation_history, get_allocation_status, get_selection,
    list_allocations, list_audit_events, list_free_beds, list_unallocated_students,
    publish_lottery, remove_room_type_allocation, run_lottery_draw, set_room_availability,
    set_room_type_allocation,
};

use super::helpers::{
    bed_ids, create_short_timeout_coordinator, create_test_admin, create_test_coordinator,
    create_test_room, create_test_student, draw_and_publish, event_request,
    setup_test_persistence, uniform,
};

struct Fixture {
    coordinator: BedSelectionCoordinator,
    admin: AuthenticatedActor,
    alice: AuthenticatedActor,
    bob: AuthenticatedActor,
    /// Beds of a two-bed "4" room.
    beds: Vec<i64>,
    /// Beds of a second two-bed "4" room.
    other_beds: Vec<i64>,
    /// A bed of a "2" room.
    wrong_type_bed: i64,
    room: RoomInfo,
}

fn fixture_with(build: fn(Persistence) -> BedSelectionCoordinator) -> Fixture {
    let mut persistence: Persistence = setup_test_persistence();
    let admin: AuthenticatedActor = create_test_admin(&mut persistence);
    let alice: AuthenticatedActor = create_test_student(&mut persistence, "alice");
    let bob: AuthenticatedActor = create_test_student(&mut persistence, "bob");
    draw_and_publish(&mut persistence, &admin, "4");
    let room: RoomInfo = create_test_room(&mut persistence, &admin, "4", 2);
    let other: RoomInfo = create_test_room(&mut persistence, &admin, "4", 2);
    let wrong: RoomInfo = create_test_room(&mut persistence, &admin, "2", 2);
    let beds: Vec<i64> = bed_ids(&mut persistence, room.room_id);
    let other_beds: Vec<i64> = bed_ids(&mut persistence, other.room_id);
    let wrong_type_bed: i64 = bed_ids(&mut persistence, wrong.room_id)[0];

    Fixture {
        coordinator: build(persistence),
        admin,
        alice,
        bob,
        beds,
        other_beds,
        wrong_type_bed,
        room,
    }
}

fn fixture() -> Fixture {
    fixture_with(create_test_coordinator)
}

fn with_persistence<T>(
    coordinator: &BedSelectionCoordinator,
    f: impl FnOnce(&mut Persistence) -> T,
) -> T {
    let shared: Arc<Mutex<Persistence>> = coordinator.persistence();
    let mut persistence: MutexGuard<'_, Persistence> = shared.lock().unwrap();
    f(&mut *persistence)
}

fn history_actions(f: &Fixture, student: &AuthenticatedActor) -> Vec<String> {
    let history: AllocationHistoryResponse = with_persistence(&f.coordinator, |p| {
        get_allocation_history(p, student.student_id, &f.admin).unwrap()
    });
    history.entries.into_iter().map(|e| e.action).collect()
}

#[test]
fn test_claim_free_bed() {
    let f: Fixture = fixture();

    let response: SelectionResponse = f
        .coordinator
        .claim_bed(&f.alice, f.alice.student_id, f.beds[0])
        .unwrap();

    assert_eq!(response.outcome, SelectionOutcome::Claimed);
    let selection = response.selection.unwrap();
    assert_eq!(selection.bed_id, f.beds[0]);
    assert_eq!(selection.room_id, f.room.room_id);
    assert!(!selection.is_confirmed);
    assert_eq!(history_actions(&f, &f.alice), vec!["assigned"]);
}

#[test]
fn test_claim_taken_bed_conflicts() {
    let f: Fixture = fixture();
    f.coordinator
        .claim_bed(&f.alice, f.alice.student_id, f.beds[0])
        .unwrap();

    let result = f.coordinator.claim_bed(&f.bob, f.bob.student_id, f.beds[0]);

    assert_eq!(result, Err(ApiError::Conflict { bed_id: f.beds[0] }));
    assert!(history_actions(&f, &f.bob).is_empty());
}

#[test]
fn test_reclaim_held_bed_is_unchanged() {
    let f: Fixture = fixture();
    f.coordinator
        .claim_bed(&f.alice, f.alice.student_id, f.beds[0])
        .unwrap();

    let response: SelectionResponse = f
        .coordinator
        .claim_bed(&f.alice, f.alice.student_id, f.beds[0])
        .unwrap();

    assert_eq!(response.outcome, SelectionOutcome::Unchanged);
    assert_eq!(history_actions(&f, &f.alice).len(), 1);
}

#[test]
fn test_claim_replaces_previous_bed() {
    let f: Fixture = fixture();
    f.coordinator
        .claim_bed(&f.alice, f.alice.student_id, f.beds[0])
        .unwrap();

    let response: SelectionResponse = f
        .coordinator
        .claim_bed(&f.alice, f.alice.student_id, f.other_beds[0])
        .unwrap();

    assert_eq!(response.outcome, SelectionOutcome::Replaced);
    let bob_claim: SelectionResponse = f
        .coordinator
        .claim_bed(&f.bob, f.bob.student_id, f.beds[0])
        .unwrap();
    assert_eq!(bob_claim.outcome, SelectionOutcome::Claimed);
}

#[test]
fn test_claim_precondition_errors() {
    let f: Fixture = fixture();

    assert!(matches!(
        f.coordinator
            .claim_bed(&f.admin, f.admin.student_id, f.beds[0]),
        Err(ApiError::Forbidden { .. })
    ));
    assert!(matches!(
        f.coordinator.claim_bed(&f.alice, f.bob.student_id, f.beds[0]),
        Err(ApiError::Forbidden { .. })
    ));
    assert!(matches!(
        f.coordinator.claim_bed(&f.alice, f.alice.student_id, 99_999),
        Err(ApiError::NotFound { .. })
    ));
    assert!(matches!(
        f.coordinator
            .claim_bed(&f.alice, f.alice.student_id, f.wrong_type_bed),
        Err(ApiError::TypeMismatch { .. })
    ));
}

#[test]
fn test_claim_without_room_type_is_not_eligible() {
    let mut persistence: Persistence = setup_test_persistence();
    let admin: AuthenticatedActor = create_test_admin(&mut persistence);
    let carol: AuthenticatedActor = create_test_student(&mut persistence, "carol");
    let room: RoomInfo = create_test_room(&mut persistence, &admin, "4", 2);
    let bed: i64 = bed_ids(&mut persistence, room.room_id)[0];
    let coordinator: BedSelectionCoordinator = create_test_coordinator(persistence);

    let result = coordinator.claim_bed(&carol, carol.student_id, bed);

    assert_eq!(
        result,
        Err(ApiError::NotEligible {
            student_id: carol.student_id
        })
    );
}

#[test]
fn test_claim_in_closed_room_is_unavailable() {
    let f: Fixture = fixture();
    with_persistence(&f.coordinator, |p| {
        set_room_availability(
            p,
            &SetRoomAvailabilityRequest {
                room_id: f.room.room_id,
                is_available: false,
            },
            &f.admin,
        )
        .unwrap()
    });

    let result = f
        .coordinator
        .claim_bed(&f.alice, f.alice.student_id, f.beds[0]);

    assert_eq!(
        result,
        Err(ApiError::RoomUnavailable {
            room_id: f.room.room_id
        })
    );
}

#[test]
fn test_release_frees_bed() {
    let f: Fixture = fixture();
    f.coordinator
        .claim_bed(&f.alice, f.alice.student_id, f.beds[0])
        .unwrap();

    let response: SelectionResponse = f
        .coordinator
        .release_bed(&f.alice, f.alice.student_id)
        .unwrap();

    assert_eq!(response.outcome, SelectionOutcome::Released);
    assert!(response.selection.is_none());
    let free = with_persistence(&f.coordinator, |p| list_free_beds(p, "4").unwrap());
    assert_eq!(free.beds.len(), 4);
    assert_eq!(history_actions(&f, &f.alice), vec!["assigned", "removed"]);
}

#[test]
fn test_release_without_selection_is_not_found() {
    let f: Fixture = fixture();

    let result = f.coordinator.release_bed(&f.alice, f.alice.student_id);

    assert!(matches!(result, Err(ApiError::NotFound { .. })));
}

#[test]
fn test_swap_moves_selection() {
    let f: Fixture = fixture();
    f.coordinator
        .claim_bed(&f.alice, f.alice.student_id, f.beds[0])
        .unwrap();

    let response: SelectionResponse = f
        .coordinator
        .swap_bed(&f.alice, f.alice.student_id, f.other_beds[1])
        .unwrap();

    assert_eq!(response.outcome, SelectionOutcome::Swapped);
    assert_eq!(response.selection.unwrap().bed_id, f.other_beds[1]);
    assert_eq!(history_actions(&f, &f.alice), vec!["assigned", "modified"]);
}

#[test]
fn test_swap_to_same_bed_is_noop_error() {
    let f: Fixture = fixture();
    f.coordinator
        .claim_bed(&f.alice, f.alice.student_id, f.beds[0])
        .unwrap();

    let result = f
        .coordinator
        .swap_bed(&f.alice, f.alice.student_id, f.beds[0]);

    assert!(matches!(result, Err(ApiError::NoOp { .. })));
}

#[test]
fn test_confirmed_selection_is_locked_for_student() {
    let f: Fixture = fixture();
    f.coordinator
        .claim_bed(&f.alice, f.alice.student_id, f.beds[0])
        .unwrap();

    let confirmed: SelectionResponse = f
        .coordinator
        .confirm_selection(&f.alice, f.alice.student_id)
        .unwrap();
    assert_eq!(confirmed.outcome, SelectionOutcome::Confirmed);
    assert!(confirmed.selection.unwrap().is_confirmed);

    assert_eq!(
        f.coordinator.confirm_selection(&f.alice, f.alice.student_id),
        Err(ApiError::AlreadyConfirmed {
            student_id: f.alice.student_id
        })
    );
    assert_eq!(
        f.coordinator.release_bed(&f.alice, f.alice.student_id),
        Err(ApiError::SelectionConfirmed {
            student_id: f.alice.student_id
        })
    );
    assert_eq!(
        f.coordinator
            .claim_bed(&f.alice, f.alice.student_id, f.beds[1]),
        Err(ApiError::SelectionConfirmed {
            student_id: f.alice.student_id
        })
    );
}

#[test]
fn test_admin_revoke_and_reassign() {
    let f: Fixture = fixture();
    f.coordinator
        .claim_bed(&f.alice, f.alice.student_id, f.beds[0])
        .unwrap();
    f.coordinator
        .confirm_selection(&f.alice, f.alice.student_id)
        .unwrap();

    assert!(matches!(
        f.coordinator
            .reassign_bed(&f.alice, f.alice.student_id, f.beds[1], None),
        Err(ApiError::Unauthorized { .. })
    ));

    let moved: SelectionResponse = f
        .coordinator
        .reassign_bed(
            &f.admin,
            f.alice.student_id,
            f.other_beds[0],
            Some(String::from("noise complaint")),
        )
        .unwrap();
    assert_eq!(moved.outcome, SelectionOutcome::Reassigned);
    let selection = moved.selection.unwrap();
    assert_eq!(selection.bed_id, f.other_beds[0]);
    assert!(selection.is_confirmed);

    let revoked: SelectionResponse = f
        .coordinator
        .revoke_selection(&f.admin, f.alice.student_id, None)
        .unwrap();
    assert_eq!(revoked.outcome, SelectionOutcome::Revoked);
    assert!(revoked.selection.is_none());

    let audit = with_persistence(&f.coordinator, |p| {
        list_audit_events(p, None, &f.admin).unwrap()
    });
    let names: Vec<&str> = audit.events.iter().map(|e| e.action.as_str()).collect();
    assert!(names.contains(&"ReassignBed"));
    assert!(names.contains(&"RevokeSelection"));
}

#[test]
fn test_room_type_change_blocked_while_bed_held() {
    let f: Fixture = fixture();
    f.coordinator
        .claim_bed(&f.alice, f.alice.student_id, f.beds[0])
        .unwrap();

    let result = with_persistence(&f.coordinator, |p| {
        set_room_type_allocation(
            p,
            &SetRoomTypeAllocationRequest {
                student_id: f.alice.student_id,
                room_type: String::from("2"),
                notes: None,
            },
            &f.admin,
        )
    });

    assert!(matches!(result, Err(ApiError::DomainRuleViolation { .. })));
}

#[test]
fn test_held_bed_lock_times_out_with_busy() {
    let f: Fixture = fixture_with(create_short_timeout_coordinator);
    let held = f
        .coordinator
        .locks
        .acquire(&[f.beds[0]], Duration::from_millis(10))
        .unwrap();

    let result = f
        .coordinator
        .claim_bed(&f.alice, f.alice.student_id, f.beds[0]);

    assert!(matches!(result, Err(ApiError::Busy { .. })));
    assert!(result.unwrap_err().is_retryable());
    drop(held);
    assert!(history_actions(&f, &f.alice).is_empty());
    assert!(
        f.coordinator
            .claim_bed(&f.alice, f.alice.student_id, f.beds[0])
            .is_ok()
    );
}

#[test]
fn test_sequential_operations_keep_integrity() {
    let f: Fixture = fixture();
    f.coordinator
        .claim_bed(&f.alice, f.alice.student_id, f.beds[0])
        .unwrap();
    f.coordinator
        .claim_bed(&f.bob, f.bob.student_id, f.beds[1])
        .unwrap();
    f.coordinator
        .swap_bed(&f.alice, f.alice.student_id, f.other_beds[0])
        .unwrap();
    f.coordinator.release_bed(&f.bob, f.bob.student_id).unwrap();

    let report = with_persistence(&f.coordinator, |p| check_integrity(p, &f.admin).unwrap());

    assert!(report.consistent);
    assert!(report.room_discrepancies.is_empty());
    assert!(report.bed_discrepancies.is_empty());
}

/// Creates and draws an event of one room type without publishing it.
fn draw_event(f: &Fixture, room_type: &str) -> LotteryEventInfo {
    with_persistence(&f.coordinator, |p| {
        let event: LotteryEventInfo = create_lottery_event(
            p,
            &event_request("Autumn draw", uniform(room_type, 4)),
            &f.admin,
        )
        .unwrap();
        run_lottery_draw(
            p,
            &RunLotteryDrawRequest {
                event_id: event.event_id,
                composition: None,
            },
            &f.admin,
        )
        .unwrap();
        event
    })
}

fn status_of(f: &Fixture, student: &AuthenticatedActor) -> AllocationStatusResponse {
    with_persistence(&f.coordinator, |p| {
        get_allocation_status(p, student.student_id, &f.admin).unwrap()
    })
}

#[test]
fn test_publish_refused_when_it_would_change_held_bed_type() {
    let f: Fixture = fixture();
    f.coordinator
        .claim_bed(&f.alice, f.alice.student_id, f.beds[0])
        .unwrap();
    let before: AllocationStatusResponse = status_of(&f, &f.alice);
    let event: LotteryEventInfo = draw_event(&f, "8");

    let result = with_persistence(&f.coordinator, |p| {
        publish_lottery(p, event.event_id, &f.admin)
    });

    assert!(matches!(
        result,
        Err(ApiError::DomainRuleViolation { ref rule, .. }) if rule == "held_bed_room_type"
    ));
    let after: AllocationStatusResponse = status_of(&f, &f.alice);
    assert_eq!(after, before);
    assert_eq!(after.room_type.as_deref(), Some("4"));
    let swapped: SelectionResponse = f
        .coordinator
        .swap_bed(&f.alice, f.alice.student_id, f.other_beds[0])
        .unwrap();
    assert_eq!(swapped.outcome, SelectionOutcome::Swapped);
}

#[test]
fn test_publish_allowed_when_bed_holder_has_manual_room_type() {
    let f: Fixture = fixture();
    f.coordinator
        .claim_bed(&f.alice, f.alice.student_id, f.beds[0])
        .unwrap();
    with_persistence(&f.coordinator, |p| {
        set_room_type_allocation(
            p,
            &SetRoomTypeAllocationRequest {
                student_id: f.alice.student_id,
                room_type: String::from("4"),
                notes: None,
            },
            &f.admin,
        )
        .unwrap();
    });
    let event: LotteryEventInfo = draw_event(&f, "8");

    with_persistence(&f.coordinator, |p| {
        publish_lottery(p, event.event_id, &f.admin).unwrap();
    });

    let alice: AllocationStatusResponse = status_of(&f, &f.alice);
    assert_eq!(alice.room_type.as_deref(), Some("4"));
    assert_eq!(alice.room_type_source.as_deref(), Some("manual"));
    let bob: AllocationStatusResponse = status_of(&f, &f.bob);
    assert_eq!(bob.room_type.as_deref(), Some("8"));
    assert_eq!(
        bob.room_type_source,
        Some(format!("lottery:{}", event.event_id))
    );
}

#[test]
fn test_remove_room_type_falls_back_to_lottery() {
    let f: Fixture = fixture();
    with_persistence(&f.coordinator, |p| {
        set_room_type_allocation(
            p,
            &SetRoomTypeAllocationRequest {
                student_id: f.alice.student_id,
                room_type: String::from("2"),
                notes: None,
            },
            &f.admin,
        )
        .unwrap();
    });

    let status: AllocationStatusResponse = with_persistence(&f.coordinator, |p| {
        remove_room_type_allocation(p, f.alice.student_id, Some(String::from("moved")), &f.admin)
            .unwrap()
    });

    assert_eq!(status.status, "room_type_set");
    assert_eq!(status.room_type.as_deref(), Some("4"));
    assert!(
        status
            .room_type_source
            .as_deref()
            .is_some_and(|s| s.starts_with("lottery:"))
    );
    let audit = with_persistence(&f.coordinator, |p| {
        list_audit_events(p, Some("RemoveRoomTypeAllocation"), &f.admin).unwrap()
    });
    assert_eq!(audit.events.len(), 1);

    let again = with_persistence(&f.coordinator, |p| {
        remove_room_type_allocation(p, f.alice.student_id, None, &f.admin)
    });
    assert!(matches!(again, Err(ApiError::NotFound { .. })));
}

#[test]
fn test_remove_room_type_blocked_while_bed_held() {
    let f: Fixture = fixture();
    with_persistence(&f.coordinator, |p| {
        set_room_type_allocation(
            p,
            &SetRoomTypeAllocationRequest {
                student_id: f.alice.student_id,
                room_type: String::from("4"),
                notes: None,
            },
            &f.admin,
        )
        .unwrap();
    });
    f.coordinator
        .claim_bed(&f.alice, f.alice.student_id, f.beds[0])
        .unwrap();

    let result = with_persistence(&f.coordinator, |p| {
        remove_room_type_allocation(p, f.alice.student_id, None, &f.admin)
    });

    assert!(matches!(result, Err(ApiError::DomainRuleViolation { .. })));
    assert_eq!(
        status_of(&f, &f.alice).room_type_source.as_deref(),
        Some("manual")
    );
}

#[test]
fn test_allocation_listings_follow_selections() {
    let f: Fixture = fixture();
    f.coordinator
        .claim_bed(&f.alice, f.alice.student_id, f.beds[1])
        .unwrap();

    let (allocations, unallocated): (ListAllocationsResponse, Vec<StudentInfo>) =
        with_persistence(&f.coordinator, |p| {
            (
                list_allocations(p, &f.admin).unwrap(),
                list_unallocated_students(p, &f.admin).unwrap(),
            )
        });

    assert_eq!(allocations.selections.len(), 1);
    assert_eq!(allocations.selections[0].student_id, f.alice.student_id);
    assert_eq!(allocations.selections[0].bed_id, f.beds[1]);
    let ids: Vec<i64> = unallocated.iter().map(|s| s.student_id).collect();
    assert_eq!(ids, vec![f.bob.student_id]);
}

#[test]
fn test_get_selection_for_self_and_admin_only() {
    let f: Fixture = fixture();
    f.coordinator
        .claim_bed(&f.alice, f.alice.student_id, f.beds[0])
        .unwrap();

    let own: SelectionLookupResponse = with_persistence(&f.coordinator, |p| {
        get_selection(p, f.alice.student_id, &f.alice).unwrap()
    });
    assert_eq!(own.selection.map(|s| s.bed_id), Some(f.beds[0]));

    let empty: SelectionLookupResponse = with_persistence(&f.coordinator, |p| {
        get_selection(p, f.bob.student_id, &f.admin).unwrap()
    });
    assert!(empty.selection.is_none());

    let other = with_persistence(&f.coordinator, |p| {
        get_selection(p, f.alice.student_id, &f.bob)
    });
    assert!(matches!(other, Err(ApiError::Unauthorized { .. })));
}
