// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use crate::DomainError;

#[test]
fn test_domain_error_display() {
    let err: DomainError = DomainError::InvalidRoomType(String::from("test"));
    assert_eq!(format!("{err}"), "Invalid room type: test");

    let err: DomainError = DomainError::InvalidName(String::from("test"));
    assert_eq!(format!("{err}"), "Invalid name: test");

    let err: DomainError = DomainError::InvalidCapacity { capacity: 0 };
    assert_eq!(
        format!("{err}"),
        "Invalid room capacity: 0. Must be between 1 and 32"
    );

    let err: DomainError = DomainError::CapacityExceeded {
        capacity: 16,
        participants: 17,
    };
    assert_eq!(
        format!("{err}"),
        "Composition holds 16 students but 17 are eligible"
    );

    let err: DomainError = DomainError::NoParticipants;
    assert_eq!(format!("{err}"), "No eligible students to draw");

    let err: DomainError = DomainError::InvalidStatusTransition {
        from: String::from("confirmed"),
        to: String::from("room_type_set"),
        reason: String::from("test"),
    };
    assert_eq!(
        format!("{err}"),
        "Cannot transition from confirmed to room_type_set: test"
    );
}
