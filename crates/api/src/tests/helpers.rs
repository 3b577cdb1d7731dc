// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Test helper functions and fixtures.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use dorm_lottery_persistence::Persistence;

use crate::{
    AuthenticatedActor, BedSelectionCoordinator, BuildingInfo, CompositionRequest, CoordinatorConfig,
    CreateBuildingRequest, CreateLotteryEventRequest, CreateRoomRequest, LotteryEventInfo,
    RegisterStudentRequest, RoomInfo, RunLotteryDrawRequest, StudentInfo, bootstrap_admin, create_building,
    create_lottery_event, create_room, get_room, list_buildings, publish_lottery, register_student,
    resolve_actor, run_lottery_draw,
};

pub fn setup_test_persistence() -> Persistence {
    Persistence::new_in_memory().expect("Failed to create in-memory database")
}

pub fn registration(username: &str) -> RegisterStudentRequest {
    RegisterStudentRequest {
        username: String::from(username),
        full_name: format!("Student {username}"),
    }
}

/// Bootstraps the first administrator and resolves it to an actor.
pub fn create_test_admin(persistence: &mut Persistence) -> AuthenticatedActor {
    let admin: StudentInfo = bootstrap_admin(persistence, &registration("admin")).unwrap();
    resolve_actor(persistence, admin.student_id).unwrap()
}

pub fn create_test_student(persistence: &mut Persistence, username: &str) -> AuthenticatedActor {
    let student: StudentInfo = register_student(persistence, &registration(username)).unwrap();
    resolve_actor(persistence, student.student_id).unwrap()
}

pub fn uniform(room_type: &str, group_size: u32) -> CompositionRequest {
    CompositionRequest::Uniform {
        room_type: String::from(room_type),
        group_size,
    }
}

pub fn event_request(name: &str, composition: CompositionRequest) -> CreateLotteryEventRequest {
    CreateLotteryEventRequest {
        name: String::from(name),
        scheduled_at: String::from("2026-03-01T09:00:00Z"),
        composition,
    }
}

/// Creates an event of one room type, draws every eligible student into it
/// and publishes the results.
pub fn draw_and_publish(
    persistence: &mut Persistence,
    admin: &AuthenticatedActor,
    room_type: &str,
) -> LotteryEventInfo {
    let event: LotteryEventInfo = create_lottery_event(
        persistence,
        &event_request("Spring draw", uniform(room_type, 4)),
        admin,
    )
    .unwrap();
    run_lottery_draw(
        persistence,
        &RunLotteryDrawRequest {
            event_id: event.event_id,
            composition: None,
        },
        admin,
    )
    .unwrap();
    publish_lottery(persistence, event.event_id, admin).unwrap();
    event
}

/// Creates a room in a fresh building.
pub fn create_test_room(
    persistence: &mut Persistence,
    admin: &AuthenticatedActor,
    room_type: &str,
    capacity: u32,
) -> RoomInfo {
    let existing: usize = list_buildings(persistence).unwrap().len();
    let building: BuildingInfo = create_building(
        persistence,
        &CreateBuildingRequest {
            name: format!("Hall {}", existing + 1),
        },
        admin,
    )
    .unwrap();
    create_room(
        persistence,
        &CreateRoomRequest {
            building_id: building.building_id,
            room_number: String::from("101"),
            room_type: String::from(room_type),
            capacity,
        },
        admin,
    )
    .unwrap()
}

pub fn bed_ids(persistence: &mut Persistence, room_id: i64) -> Vec<i64> {
    get_room(persistence, room_id)
        .unwrap()
        .beds
        .into_iter()
        .map(|b| b.bed_id)
        .collect()
}

pub fn create_test_coordinator(persistence: Persistence) -> BedSelectionCoordinator {
    BedSelectionCoordinator::new(
        Arc::new(Mutex::new(persistence)),
        CoordinatorConfig::default(),
    )
}

pub fn create_short_timeout_coordinator(persistence: Persistence) -> BedSelectionCoordinator {
    BedSelectionCoordinator::new(
        Arc::new(Mutex::new(persistence)),
        CoordinatorConfig::with_lock_timeout(Duration::from_millis(50)),
    )
}
