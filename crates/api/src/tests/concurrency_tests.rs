// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Many callers against one coordinator.

use std::collections::HashSet;
use std::sync::{Arc, Mutex, MutexGuard};
use std::thread;

use dorm_lottery_persistence::Persistence;

use crate::{
    ApiError, AuthenticatedActor, BedSelectionCoordinator, IntegrityReportResponse, RoomInfo,
    SelectionInfo, SelectionOutcome, SelectionResponse, check_integrity, get_allocation_history,
    list_allocations,
};

use super::helpers::{
    bed_ids, create_test_admin, create_test_coordinator, create_test_room, create_test_student,
    draw_and_publish, setup_test_persistence,
};

struct Fixture {
    coordinator: BedSelectionCoordinator,
    admin: AuthenticatedActor,
    students: Vec<AuthenticatedActor>,
    beds: Vec<i64>,
}

/// `student_count` students holding a published "4" assignment and `rooms`
/// two-bed "4" rooms.
fn fixture(student_count: usize, rooms: usize) -> Fixture {
    let mut persistence: Persistence = setup_test_persistence();
    let admin: AuthenticatedActor = create_test_admin(&mut persistence);
    let students: Vec<AuthenticatedActor> = (0..student_count)
        .map(|n| create_test_student(&mut persistence, &format!("student{n}")))
        .collect();
    draw_and_publish(&mut persistence, &admin, "4");
    let mut beds: Vec<i64> = Vec::new();
    for _ in 0..rooms {
        let room: RoomInfo = create_test_room(&mut persistence, &admin, "4", 2);
        beds.extend(bed_ids(&mut persistence, room.room_id));
    }

    Fixture {
        coordinator: create_test_coordinator(persistence),
        admin,
        students,
        beds,
    }
}

/// Live selections, total history entries across all students, and the
/// integrity report.
fn snapshot(f: &Fixture) -> (Vec<SelectionInfo>, i64, IntegrityReportResponse) {
    let shared: Arc<Mutex<Persistence>> = f.coordinator.persistence();
    let mut persistence: MutexGuard<'_, Persistence> = shared.lock().unwrap();
    let selections: Vec<SelectionInfo> = list_allocations(&mut persistence, &f.admin)
        .unwrap()
        .selections;
    let history: usize = f
        .students
        .iter()
        .map(|student| {
            get_allocation_history(&mut persistence, student.student_id, &f.admin)
                .unwrap()
                .entries
                .len()
        })
        .sum();
    let history: i64 = i64::try_from(history).unwrap();
    let report: IntegrityReportResponse = check_integrity(&mut persistence, &f.admin).unwrap();
    (selections, history, report)
}

#[test]
fn test_racing_claims_for_one_bed_have_one_winner() {
    let f: Fixture = fixture(8, 1);
    let contested: i64 = f.beds[0];

    let results: Vec<Result<SelectionResponse, ApiError>> = thread::scope(|s| {
        let handles: Vec<_> = f
            .students
            .iter()
            .map(|student| {
                let coordinator: &BedSelectionCoordinator = &f.coordinator;
                s.spawn(move || coordinator.claim_bed(student, student.student_id, contested))
            })
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });

    let winners: usize = results.iter().filter(|r| r.is_ok()).count();
    assert_eq!(winners, 1);
    assert!(
        results
            .iter()
            .filter_map(|r| r.as_ref().err())
            .all(|e| *e == ApiError::Conflict { bed_id: contested })
    );

    let (selections, history, report) = snapshot(&f);
    assert_eq!(selections.len(), 1);
    assert_eq!(history, 1);
    assert!(report.consistent);
}

#[test]
fn test_concurrent_claims_never_double_book() {
    let f: Fixture = fixture(12, 3);

    let successes: usize = thread::scope(|s| {
        let handles: Vec<_> = f
            .students
            .iter()
            .enumerate()
            .map(|(index, student)| {
                let coordinator: &BedSelectionCoordinator = &f.coordinator;
                let beds: &[i64] = &f.beds;
                s.spawn(move || {
                    let mut succeeded: usize = 0;
                    for round in 0..beds.len() {
                        let bed_id: i64 = beds[(index + round) % beds.len()];
                        if coordinator
                            .claim_bed(student, student.student_id, bed_id)
                            .is_ok_and(|r| r.outcome != SelectionOutcome::Unchanged)
                        {
                            succeeded += 1;
                        }
                    }
                    succeeded
                })
            })
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).sum()
    });

    let (selections, history, report) = snapshot(&f);
    let held: HashSet<i64> = selections.iter().map(|s| s.bed_id).collect();
    assert_eq!(held.len(), selections.len());
    assert!(selections.len() <= f.beds.len());
    assert_eq!(history, i64::try_from(successes).unwrap());
    assert!(report.consistent);
}

#[test]
fn test_opposite_swaps_do_not_deadlock() {
    let f: Fixture = fixture(2, 1);
    let alice: &AuthenticatedActor = &f.students[0];
    let bob: &AuthenticatedActor = &f.students[1];
    f.coordinator
        .claim_bed(alice, alice.student_id, f.beds[0])
        .unwrap();
    f.coordinator
        .claim_bed(bob, bob.student_id, f.beds[1])
        .unwrap();

    let (alice_result, bob_result) = thread::scope(|s| {
        let a = s.spawn(|| f.coordinator.swap_bed(alice, alice.student_id, f.beds[1]));
        let b = s.spawn(|| f.coordinator.swap_bed(bob, bob.student_id, f.beds[0]));
        (a.join().unwrap(), b.join().unwrap())
    });

    assert_eq!(alice_result, Err(ApiError::Conflict { bed_id: f.beds[1] }));
    assert_eq!(bob_result, Err(ApiError::Conflict { bed_id: f.beds[0] }));
    let (selections, history, report) = snapshot(&f);
    assert_eq!(selections.len(), 2);
    assert_eq!(history, 2);
    assert!(report.consistent);
}

#[test]
fn test_concurrent_swaps_into_one_free_bed() {
    let f: Fixture = fixture(2, 2);
    let alice: &AuthenticatedActor = &f.students[0];
    let bob: &AuthenticatedActor = &f.students[1];
    f.coordinator
        .claim_bed(alice, alice.student_id, f.beds[0])
        .unwrap();
    f.coordinator
        .claim_bed(bob, bob.student_id, f.beds[1])
        .unwrap();
    let target: i64 = f.beds[2];

    let results: Vec<Result<SelectionResponse, ApiError>> = thread::scope(|s| {
        let a = s.spawn(|| f.coordinator.swap_bed(alice, alice.student_id, target));
        let b = s.spawn(|| f.coordinator.swap_bed(bob, bob.student_id, target));
        vec![a.join().unwrap(), b.join().unwrap()]
    });

    assert_eq!(results.iter().filter(|r| r.is_ok()).count(), 1);
    let (selections, history, report) = snapshot(&f);
    assert_eq!(
        selections.iter().filter(|s| s.bed_id == target).count(),
        1
    );
    assert_eq!(history, 3);
    assert!(report.consistent);
}

#[test]
fn test_claim_and_release_interleave_consistently() {
    let f: Fixture = fixture(4, 1);

    thread::scope(|s| {
        for student in &f.students {
            let coordinator: &BedSelectionCoordinator = &f.coordinator;
            let beds: &[i64] = &f.beds;
            s.spawn(move || {
                for _ in 0..10 {
                    for bed_id in beds {
                        let _ = coordinator.claim_bed(student, student.student_id, *bed_id);
                        let _ = coordinator.release_bed(student, student.student_id);
                    }
                }
            });
        }
    });

    let (selections, _, report) = snapshot(&f);
    assert!(selections.is_empty());
    assert!(report.consistent);
}
