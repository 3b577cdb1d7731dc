// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use crate::Persistence;
use dorm_lottery::{AllocationState, BedTarget, Command, CoreError, TransitionResult, apply};
use dorm_lottery_audit::{Action, Actor, ActorRole, AuditEvent, StateSnapshot};
use dorm_lottery_domain::{
    BedSelection, Composition, DrawAssignment, LotteryEvent, Room, RoomType, Student,
};

pub fn room_type(value: &str) -> RoomType {
    RoomType::new(value).unwrap()
}

pub fn create_test_persistence() -> Persistence {
    Persistence::new_in_memory().expect("Failed to create in-memory database")
}

pub fn create_admin(persistence: &mut Persistence) -> Student {
    persistence
        .create_student("admin", "Administrator", true)
        .unwrap()
}

pub fn create_student(persistence: &mut Persistence, username: &str) -> Student {
    persistence
        .create_student(username, &format!("Student {username}"), false)
        .unwrap()
}

pub fn admin_actor(admin: &Student) -> Actor {
    Actor::new(admin.student_id, ActorRole::Admin)
}

pub fn student_actor(student: &Student) -> Actor {
    Actor::new(student.student_id, ActorRole::Student)
}

pub fn create_test_audit_event(admin_id: i64, name: &str) -> AuditEvent {
    AuditEvent::new(
        Actor::new(admin_id, ActorRole::Admin),
        Action::new(String::from(name), None),
        StateSnapshot::new(String::from("before")),
        StateSnapshot::new(String::from("after")),
    )
}

pub fn uniform(value: &str, group_size: u32) -> Composition {
    Composition::Uniform {
        room_type: room_type(value),
        group_size,
    }
}

/// Creates a building with one room of the given type and capacity.
pub fn create_test_room(persistence: &mut Persistence, value: &str, capacity: u32) -> Room {
    let building_name: String = format!("Hall {value}-{capacity}");
    let building_id: i64 = match persistence
        .list_buildings()
        .unwrap()
        .into_iter()
        .find(|b| b.name == building_name)
    {
        Some(building) => building.building_id,
        None => persistence.create_building(&building_name).unwrap().building_id,
    };
    let room_count: usize = persistence.list_rooms(Some(building_id)).unwrap().len();
    persistence
        .create_room(
            building_id,
            &format!("{}", 101 + room_count),
            &room_type(value),
            capacity,
        )
        .unwrap()
}

pub fn create_test_event(persistence: &mut Persistence, admin_id: i64, value: &str) -> LotteryEvent {
    persistence
        .create_lottery_event(
            "Fall draw",
            "2026-03-01T09:00:00Z",
            &uniform(value, 2),
            admin_id,
            &create_test_audit_event(admin_id, "CreateLotteryEvent"),
        )
        .unwrap()
}

/// Draws and publishes an event assigning `value` to every listed student.
pub fn publish_room_type(
    persistence: &mut Persistence,
    admin_id: i64,
    student_ids: &[i64],
    value: &str,
) -> LotteryEvent {
    let event: LotteryEvent = create_test_event(persistence, admin_id, value);
    let assignments: Vec<DrawAssignment> = student_ids
        .iter()
        .enumerate()
        .map(|(index, student_id)| DrawAssignment {
            student_id: *student_id,
            draw_number: u32::try_from(index + 1).unwrap(),
            group_label: format!("{value}-0"),
            room_type: room_type(value),
        })
        .collect();
    persistence
        .persist_draw(
            event.event_id,
            &uniform(value, 2),
            &assignments,
            &create_test_audit_event(admin_id, "RunLotteryDraw"),
        )
        .unwrap();
    persistence
        .publish_lottery(
            event.event_id,
            &create_test_audit_event(admin_id, "PublishLottery"),
        )
        .unwrap();
    persistence.get_lottery_event(event.event_id).unwrap()
}

pub fn first_bed_id(persistence: &mut Persistence, room_id: i64, bed_number: u32) -> i64 {
    persistence
        .list_beds(room_id)
        .unwrap()
        .into_iter()
        .find(|b| b.bed_number == bed_number)
        .unwrap()
        .bed_id
}

/// Loads fresh state, applies a command and persists the transition.
pub fn run_command(
    persistence: &mut Persistence,
    student_id: i64,
    command: Command,
    actor: Actor,
) -> Result<Option<BedSelection>, CoreError> {
    let state: AllocationState = persistence
        .load_allocation_state(student_id)
        .unwrap()
        .unwrap();
    let target: Option<BedTarget> = command
        .target_bed()
        .and_then(|bed_id| persistence.load_bed_target(bed_id).unwrap());
    let result: TransitionResult = apply(&state, target.as_ref(), command, actor)?;
    Ok(persistence.persist_transition(&result).unwrap())
}
