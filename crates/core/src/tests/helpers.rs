// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use crate::{AllocationState, BedTarget, RoomTypeAssignment, RoomTypeSource};
use dorm_lottery_audit::{Actor, ActorRole};
use dorm_lottery_domain::{Bed, BedSelection, Room, RoomType, Student};

pub const STUDENT_ID: i64 = 10;
pub const OTHER_STUDENT_ID: i64 = 11;
pub const ADMIN_ID: i64 = 1;

pub fn room_type(value: &str) -> RoomType {
    RoomType::new(value).unwrap()
}

pub fn create_test_student(student_id: i64) -> Student {
    Student {
        student_id,
        username: format!("student{student_id}"),
        full_name: format!("Student {student_id}"),
        is_admin: false,
    }
}

pub fn create_admin_student() -> Student {
    Student {
        student_id: ADMIN_ID,
        username: String::from("admin"),
        full_name: String::from("Administrator"),
        is_admin: true,
    }
}

pub fn student_actor() -> Actor {
    Actor::new(STUDENT_ID, ActorRole::Student)
}

pub fn admin_actor() -> Actor {
    Actor::new(ADMIN_ID, ActorRole::Admin)
}

pub fn lottery_assignment(value: &str) -> RoomTypeAssignment {
    RoomTypeAssignment {
        room_type: room_type(value),
        source: RoomTypeSource::Lottery { event_id: 1 },
    }
}

/// A student with a published "4" room type and no bed.
pub fn eligible_state() -> AllocationState {
    AllocationState::new(
        create_test_student(STUDENT_ID),
        Some(lottery_assignment("4")),
        None,
    )
}

/// A student of type "4" holding `bed_id` in `room_id`.
pub fn holding_state(room_id: i64, bed_id: i64, confirmed: bool) -> AllocationState {
    let mut selection: BedSelection = BedSelection::new(STUDENT_ID, room_id, bed_id);
    selection.selection_id = Some(100);
    selection.is_confirmed = confirmed;
    AllocationState::new(
        create_test_student(STUDENT_ID),
        Some(lottery_assignment("4")),
        Some(selection),
    )
}

pub fn create_test_room(room_id: i64, value: &str) -> Room {
    Room {
        room_id,
        building_id: 1,
        room_number: format!("{room_id}01"),
        room_type: room_type(value),
        max_capacity: 4,
        current_occupancy: 0,
        is_available: true,
    }
}

/// A free bed in an available room of the given type.
pub fn free_target(room_id: i64, bed_id: i64, value: &str) -> BedTarget {
    BedTarget {
        bed: Bed {
            bed_id,
            room_id,
            bed_number: 1,
            is_occupied: false,
        },
        room: create_test_room(room_id, value),
        holder: None,
    }
}

/// A bed in a "4" room held by `holder_id`.
pub fn held_target(room_id: i64, bed_id: i64, holder_id: i64) -> BedTarget {
    let mut target: BedTarget = free_target(room_id, bed_id, "4");
    target.bed.is_occupied = true;
    target.room.current_occupancy = 1;
    target.holder = Some(BedSelection::new(holder_id, room_id, bed_id));
    target
}
