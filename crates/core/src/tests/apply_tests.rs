// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use crate::tests::helpers::{
    OTHER_STUDENT_ID, STUDENT_ID, admin_actor, create_admin_student, create_test_student,
    eligible_state, free_target, held_target, holding_state, room_type, student_actor,
};
use crate::{AllocationState, BedTarget, Command, CoreError, Effect, TransitionResult, apply};
use dorm_lottery_audit::{Actor, ActorRole, HistoryAction, HistoryEntry};
use dorm_lottery_domain::{AllocationStatus, BedSelection};

#[test]
fn test_claim_free_bed_creates_selection() {
    let state: AllocationState = eligible_state();
    let target: BedTarget = free_target(2, 5, "4");

    let result: TransitionResult = apply(
        &state,
        Some(&target),
        Command::ClaimBed { bed_id: 5 },
        student_actor(),
    )
    .unwrap();

    assert_eq!(result.new_state.status(), AllocationStatus::BedSelected);
    let Effect::Claim {
        replaced,
        selection,
    } = result.effect
    else {
        panic!("expected a claim effect");
    };
    assert!(replaced.is_none());
    assert_eq!(selection.bed_id, 5);
    assert_eq!(selection.room_id, 2);
    assert!(!selection.is_confirmed);

    let history: HistoryEntry = result.history.unwrap();
    assert_eq!(history.action, HistoryAction::Assigned);
    assert_eq!(history.bed_id, 5);
    assert_eq!(history.notes, None);
    assert!(result.audit_event.is_none());
}

#[test]
fn test_claim_by_admin_account_is_forbidden() {
    let state: AllocationState = AllocationState::new(create_admin_student(), None, None);
    let target: BedTarget = free_target(2, 5, "4");

    let result: Result<TransitionResult, CoreError> = apply(
        &state,
        Some(&target),
        Command::ClaimBed { bed_id: 5 },
        admin_actor(),
    );

    assert!(matches!(result, Err(CoreError::Forbidden { .. })));
}

#[test]
fn test_claim_for_another_student_is_forbidden() {
    let state: AllocationState = eligible_state();
    let target: BedTarget = free_target(2, 5, "4");
    let intruder: Actor = Actor::new(OTHER_STUDENT_ID, ActorRole::Student);

    let result: Result<TransitionResult, CoreError> =
        apply(&state, Some(&target), Command::ClaimBed { bed_id: 5 }, intruder);

    assert!(matches!(result, Err(CoreError::Forbidden { .. })));
}

#[test]
fn test_claim_without_room_type_is_not_eligible_before_bed_lookup() {
    let state: AllocationState =
        AllocationState::new(create_test_student(STUDENT_ID), None, None);

    let result: Result<TransitionResult, CoreError> =
        apply(&state, None, Command::ClaimBed { bed_id: 5 }, student_actor());

    assert_eq!(
        result,
        Err(CoreError::NotEligible {
            student_id: STUDENT_ID
        })
    );
}

#[test]
fn test_claim_missing_bed_is_not_found() {
    let result: Result<TransitionResult, CoreError> = apply(
        &eligible_state(),
        None,
        Command::ClaimBed { bed_id: 99 },
        student_actor(),
    );

    assert_eq!(result, Err(CoreError::BedNotFound { bed_id: 99 }));
}

#[test]
fn test_type_mismatch_is_reported_before_unavailability() {
    let mut target: BedTarget = free_target(3, 7, "8");
    target.room.is_available = false;

    let result: Result<TransitionResult, CoreError> = apply(
        &eligible_state(),
        Some(&target),
        Command::ClaimBed { bed_id: 7 },
        student_actor(),
    );

    assert_eq!(
        result,
        Err(CoreError::TypeMismatch {
            expected: room_type("4"),
            actual: room_type("8"),
        })
    );
}

#[test]
fn test_unavailable_room_is_reported_before_conflict() {
    let mut target: BedTarget = held_target(2, 5, OTHER_STUDENT_ID);
    target.room.is_available = false;

    let result: Result<TransitionResult, CoreError> = apply(
        &eligible_state(),
        Some(&target),
        Command::ClaimBed { bed_id: 5 },
        student_actor(),
    );

    assert_eq!(result, Err(CoreError::RoomUnavailable { room_id: 2 }));
}

#[test]
fn test_claim_bed_held_by_other_student_conflicts() {
    let target: BedTarget = held_target(2, 5, OTHER_STUDENT_ID);

    let result: Result<TransitionResult, CoreError> = apply(
        &eligible_state(),
        Some(&target),
        Command::ClaimBed { bed_id: 5 },
        student_actor(),
    );

    assert_eq!(result, Err(CoreError::Conflict { bed_id: 5 }));
}

#[test]
fn test_reclaiming_held_bed_is_unchanged() {
    let state: AllocationState = holding_state(2, 5, false);
    let target: BedTarget = held_target(2, 5, STUDENT_ID);

    let result: TransitionResult = apply(
        &state,
        Some(&target),
        Command::ClaimBed { bed_id: 5 },
        student_actor(),
    )
    .unwrap();

    assert!(result.is_noop());
    assert!(result.history.is_none());
    assert_eq!(result.new_state, state);
}

#[test]
fn test_claim_while_holding_replaces_previous_bed() {
    let state: AllocationState = holding_state(2, 5, false);
    let target: BedTarget = free_target(2, 6, "4");

    let result: TransitionResult = apply(
        &state,
        Some(&target),
        Command::ClaimBed { bed_id: 6 },
        student_actor(),
    )
    .unwrap();

    let Effect::Claim {
        replaced,
        selection,
    } = result.effect
    else {
        panic!("expected a claim effect");
    };
    assert_eq!(replaced.map(|s| s.bed_id), Some(5));
    assert_eq!(selection.bed_id, 6);
    assert_eq!(
        result.history.unwrap().notes.as_deref(),
        Some("replaced bed 5")
    );
}

#[test]
fn test_claim_while_confirmed_is_rejected() {
    let state: AllocationState = holding_state(2, 5, true);
    let target: BedTarget = free_target(2, 6, "4");

    let result: Result<TransitionResult, CoreError> = apply(
        &state,
        Some(&target),
        Command::ClaimBed { bed_id: 6 },
        student_actor(),
    );

    assert_eq!(
        result,
        Err(CoreError::SelectionConfirmed {
            student_id: STUDENT_ID
        })
    );
}

#[test]
fn test_occupied_flag_without_holder_is_integrity_violation() {
    let mut target: BedTarget = free_target(2, 5, "4");
    target.bed.is_occupied = true;

    let result: Result<TransitionResult, CoreError> = apply(
        &eligible_state(),
        Some(&target),
        Command::ClaimBed { bed_id: 5 },
        student_actor(),
    );

    assert!(matches!(result, Err(CoreError::IntegrityViolation(_))));
}

#[test]
fn test_release_frees_bed() {
    let state: AllocationState = holding_state(2, 5, false);

    let result: TransitionResult =
        apply(&state, None, Command::ReleaseBed, student_actor()).unwrap();

    assert_eq!(result.new_state.status(), AllocationStatus::RoomTypeSet);
    assert!(matches!(
        result.effect,
        Effect::Release { ref released } if released.bed_id == 5
    ));
    let history: HistoryEntry = result.history.unwrap();
    assert_eq!(history.action, HistoryAction::Removed);
    assert_eq!(history.bed_id, 5);
}

#[test]
fn test_release_without_selection_fails() {
    let result: Result<TransitionResult, CoreError> =
        apply(&eligible_state(), None, Command::ReleaseBed, student_actor());

    assert_eq!(
        result,
        Err(CoreError::NoSelection {
            student_id: STUDENT_ID
        })
    );
}

#[test]
fn test_release_confirmed_selection_is_rejected() {
    let result: Result<TransitionResult, CoreError> = apply(
        &holding_state(2, 5, true),
        None,
        Command::ReleaseBed,
        student_actor(),
    );

    assert_eq!(
        result,
        Err(CoreError::SelectionConfirmed {
            student_id: STUDENT_ID
        })
    );
}

#[test]
fn test_swap_moves_selection_and_keeps_identity() {
    let state: AllocationState = holding_state(2, 5, false);
    let target: BedTarget = free_target(3, 9, "4");

    let result: TransitionResult = apply(
        &state,
        Some(&target),
        Command::SwapBed { new_bed_id: 9 },
        student_actor(),
    )
    .unwrap();

    let Effect::Move { from, to } = result.effect else {
        panic!("expected a move effect");
    };
    assert_eq!(from.bed_id, 5);
    assert_eq!(to.bed_id, 9);
    assert_eq!(to.room_id, 3);
    assert_eq!(to.selection_id, from.selection_id);

    let history: HistoryEntry = result.history.unwrap();
    assert_eq!(history.action, HistoryAction::Modified);
    assert_eq!(history.notes.as_deref(), Some("swapped from bed 5"));
}

#[test]
fn test_swap_to_same_bed_fails() {
    let state: AllocationState = holding_state(2, 5, false);
    let target: BedTarget = held_target(2, 5, STUDENT_ID);

    let result: Result<TransitionResult, CoreError> = apply(
        &state,
        Some(&target),
        Command::SwapBed { new_bed_id: 5 },
        student_actor(),
    );

    assert_eq!(result, Err(CoreError::SameBed { bed_id: 5 }));
}

#[test]
fn test_swap_without_selection_fails() {
    let target: BedTarget = free_target(3, 9, "4");

    let result: Result<TransitionResult, CoreError> = apply(
        &eligible_state(),
        Some(&target),
        Command::SwapBed { new_bed_id: 9 },
        student_actor(),
    );

    assert_eq!(
        result,
        Err(CoreError::NoSelection {
            student_id: STUDENT_ID
        })
    );
}

#[test]
fn test_swap_into_taken_bed_leaves_selection_alone() {
    let state: AllocationState = holding_state(2, 5, false);
    let target: BedTarget = held_target(2, 6, OTHER_STUDENT_ID);

    let result: Result<TransitionResult, CoreError> = apply(
        &state,
        Some(&target),
        Command::SwapBed { new_bed_id: 6 },
        student_actor(),
    );

    assert_eq!(result, Err(CoreError::Conflict { bed_id: 6 }));
}

#[test]
fn test_swap_confirmed_selection_is_rejected() {
    let target: BedTarget = free_target(3, 9, "4");

    let result: Result<TransitionResult, CoreError> = apply(
        &holding_state(2, 5, true),
        Some(&target),
        Command::SwapBed { new_bed_id: 9 },
        student_actor(),
    );

    assert_eq!(
        result,
        Err(CoreError::SelectionConfirmed {
            student_id: STUDENT_ID
        })
    );
}

#[test]
fn test_confirm_locks_selection() {
    let state: AllocationState = holding_state(2, 5, false);

    let result: TransitionResult =
        apply(&state, None, Command::ConfirmSelection, student_actor()).unwrap();

    assert_eq!(result.new_state.status(), AllocationStatus::Confirmed);
    assert!(matches!(result.effect, Effect::Confirm { .. }));
    assert_eq!(
        result.history.unwrap().notes.as_deref(),
        Some("confirmed")
    );
}

#[test]
fn test_confirm_twice_fails() {
    let result: Result<TransitionResult, CoreError> = apply(
        &holding_state(2, 5, true),
        None,
        Command::ConfirmSelection,
        student_actor(),
    );

    assert_eq!(
        result,
        Err(CoreError::AlreadyConfirmed {
            student_id: STUDENT_ID
        })
    );
}

#[test]
fn test_confirm_without_selection_fails() {
    let result: Result<TransitionResult, CoreError> = apply(
        &eligible_state(),
        None,
        Command::ConfirmSelection,
        student_actor(),
    );

    assert_eq!(
        result,
        Err(CoreError::NoSelection {
            student_id: STUDENT_ID
        })
    );
}

#[test]
fn test_snapshot_reflects_status_and_bed() {
    let state: AllocationState = holding_state(2, 5, false);
    let selection: &BedSelection = state.selection.as_ref().unwrap();
    assert_eq!(selection.bed_id, 5);

    assert_eq!(
        state.to_snapshot().data,
        "student=10,status=bed_selected,room_type=4,bed=5"
    );
}
