// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Error types for the API layer.

use dorm_lottery::{CoreError, LockError};
use dorm_lottery_domain::DomainError;
use dorm_lottery_persistence::PersistenceError;

/// API-level errors.
///
/// These are distinct from domain/core errors and represent the API contract.
/// Only `Busy` is retryable; every other variant is final for the request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApiError {
    /// The caller could not be identified.
    AuthenticationFailed {
        /// The reason authentication failed.
        reason: String,
    },
    /// Authorization failed - the actor does not have permission.
    Unauthorized {
        /// The action that was attempted.
        action: String,
        /// The role required for this action.
        required_role: String,
    },
    /// The account may not take part in this operation.
    Forbidden {
        /// Why the request was refused.
        reason: String,
    },
    /// The student has no published room type assignment.
    NotEligible {
        /// The student.
        student_id: i64,
    },
    /// The bed's room is of another type than the student's assignment.
    TypeMismatch {
        /// The student's room type.
        expected: String,
        /// The room's type.
        actual: String,
    },
    /// A requested resource was not found.
    NotFound {
        /// The type of resource that was not found.
        resource_type: String,
        /// A human-readable description of what was not found.
        message: String,
    },
    /// The room is marked unavailable.
    RoomUnavailable {
        /// The room.
        room_id: i64,
    },
    /// The bed is held by another student.
    Conflict {
        /// The contested bed.
        bed_id: i64,
    },
    /// A bed lock could not be acquired in time. Retry with backoff.
    Busy {
        /// What was contended.
        message: String,
    },
    /// The request would not change anything.
    NoOp {
        /// A human-readable description.
        message: String,
    },
    /// The selection is already confirmed.
    AlreadyConfirmed {
        /// The student.
        student_id: i64,
    },
    /// A confirmed selection can only be changed by an administrator.
    SelectionConfirmed {
        /// The student.
        student_id: i64,
    },
    /// The lottery event is already published.
    AlreadyPublished {
        /// The event.
        event_id: i64,
    },
    /// The lottery event already has results.
    AlreadyDrawn {
        /// The event.
        event_id: i64,
    },
    /// The composition cannot seat every eligible student.
    CapacityExceeded {
        /// Total seats.
        capacity: u64,
        /// Number of eligible students.
        participants: usize,
    },
    /// There is nobody left to draw.
    NoParticipants {
        /// The event.
        event_id: i64,
    },
    /// Administrator accounts cannot receive allocations.
    NotEligibleTarget {
        /// The administrator account.
        student_id: i64,
    },
    /// The room type label is malformed.
    InvalidRoomType {
        /// A human-readable description.
        message: String,
    },
    /// A domain rule was violated.
    DomainRuleViolation {
        /// The rule that was violated.
        rule: String,
        /// A human-readable description of the violation.
        message: String,
    },
    /// Invalid input was provided.
    InvalidInput {
        /// The field that was invalid.
        field: String,
        /// A human-readable description of the error.
        message: String,
    },
    /// An internal error occurred.
    Internal {
        /// A description of the internal error.
        message: String,
    },
}

impl ApiError {
    /// Whether the caller should retry the request after backing off.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(self, Self::Busy { .. })
    }
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::AuthenticationFailed { reason } => {
                write!(f, "Authentication failed: {reason}")
            }
            Self::Unauthorized {
                action,
                required_role,
            } => {
                write!(f, "Unauthorized: '{action}' requires {required_role} role")
            }
            Self::Forbidden { reason } => write!(f, "Forbidden: {reason}"),
            Self::NotEligible { student_id } => write!(
                f,
                "Student {student_id} has no published room type assignment"
            ),
            Self::TypeMismatch { expected, actual } => write!(
                f,
                "Room type mismatch: assigned '{expected}', bed is in a '{actual}' room"
            ),
            Self::NotFound {
                resource_type,
                message,
            } => {
                write!(f, "{resource_type} not found: {message}")
            }
            Self::RoomUnavailable { room_id } => write!(f, "Room {room_id} is not available"),
            Self::Conflict { bed_id } => write!(f, "Bed {bed_id} is already taken"),
            Self::Busy { message } => write!(f, "Busy, retry later: {message}"),
            Self::NoOp { message } => write!(f, "Nothing to do: {message}"),
            Self::AlreadyConfirmed { student_id } => {
                write!(f, "Selection of student {student_id} is already confirmed")
            }
            Self::SelectionConfirmed { student_id } => write!(
                f,
                "Selection of student {student_id} is confirmed; ask an administrator"
            ),
            Self::AlreadyPublished { event_id } => {
                write!(f, "Lottery event {event_id} is already published")
            }
            Self::AlreadyDrawn { event_id } => {
                write!(f, "Lottery event {event_id} already has results")
            }
            Self::CapacityExceeded {
                capacity,
                participants,
            } => write!(
                f,
                "Composition seats {capacity} students but {participants} are eligible"
            ),
            Self::NoParticipants { event_id } => {
                write!(f, "Lottery event {event_id} has no eligible students")
            }
            Self::NotEligibleTarget { student_id } => write!(
                f,
                "Account {student_id} is an administrator and cannot receive an allocation"
            ),
            Self::InvalidRoomType { message } => write!(f, "Invalid room type: {message}"),
            Self::DomainRuleViolation { rule, message } => {
                write!(f, "Domain rule violation ({rule}): {message}")
            }
            Self::InvalidInput { field, message } => {
                write!(f, "Invalid input for field '{field}': {message}")
            }
            Self::Internal { message } => {
                write!(f, "Internal error: {message}")
            }
        }
    }
}

impl std::error::Error for ApiError {}

impl From<LockError> for ApiError {
    fn from(err: LockError) -> Self {
        Self::Busy {
            message: err.to_string(),
        }
    }
}

/// Translates a domain error into an API error.
///
/// `CapacityExceeded` and `NoParticipants` are mapped by the draw handler,
/// which knows the event id; here they fall back to generic shapes.
#[must_use]
pub fn translate_domain_error(err: DomainError) -> ApiError {
    match err {
        DomainError::InvalidRoomType(message) => ApiError::InvalidRoomType { message },
        DomainError::InvalidName(message) => ApiError::InvalidInput {
            field: String::from("name"),
            message,
        },
        DomainError::InvalidRoomNumber(message) => ApiError::InvalidInput {
            field: String::from("room_number"),
            message,
        },
        err @ DomainError::InvalidCapacity { .. } => ApiError::InvalidInput {
            field: String::from("capacity"),
            message: err.to_string(),
        },
        DomainError::InvalidComposition(message) => ApiError::InvalidInput {
            field: String::from("composition"),
            message,
        },
        err @ DomainError::InvalidScheduledTime { .. } => ApiError::InvalidInput {
            field: String::from("scheduled_at"),
            message: err.to_string(),
        },
        err @ DomainError::InvalidDrawNumber(_) => ApiError::InvalidInput {
            field: String::from("draw_number"),
            message: err.to_string(),
        },
        DomainError::CapacityExceeded {
            capacity,
            participants,
        } => ApiError::CapacityExceeded {
            capacity,
            participants,
        },
        DomainError::NoParticipants => ApiError::DomainRuleViolation {
            rule: String::from("no_participants"),
            message: String::from("There are no eligible students to draw"),
        },
        err @ (DomainError::InvalidAllocationStatus(_) | DomainError::InvalidHistoryAction(_)) => {
            ApiError::Internal {
                message: err.to_string(),
            }
        }
        DomainError::InvalidStatusTransition { from, to, reason } => {
            ApiError::DomainRuleViolation {
                rule: String::from("allocation_status_transition"),
                message: format!("Cannot move from '{from}' to '{to}': {reason}"),
            }
        }
    }
}

/// Translates a core error into an API error.
///
/// This translation is explicit and ensures core errors are not leaked directly.
#[must_use]
pub fn translate_core_error(err: CoreError) -> ApiError {
    match err {
        CoreError::Forbidden { reason } => ApiError::Forbidden { reason },
        CoreError::NotEligible { student_id } => ApiError::NotEligible { student_id },
        CoreError::BedNotFound { bed_id } => ApiError::NotFound {
            resource_type: String::from("Bed"),
            message: format!("Bed {bed_id} does not exist"),
        },
        CoreError::TypeMismatch { expected, actual } => ApiError::TypeMismatch {
            expected: expected.to_string(),
            actual: actual.to_string(),
        },
        CoreError::RoomUnavailable { room_id } => ApiError::RoomUnavailable { room_id },
        CoreError::Conflict { bed_id } => ApiError::Conflict { bed_id },
        CoreError::NoSelection { student_id } => ApiError::NotFound {
            resource_type: String::from("Bed selection"),
            message: format!("Student {student_id} holds no bed"),
        },
        CoreError::SameBed { bed_id } => ApiError::NoOp {
            message: format!("Student already holds bed {bed_id}"),
        },
        CoreError::AlreadyConfirmed { student_id } => ApiError::AlreadyConfirmed { student_id },
        CoreError::SelectionConfirmed { student_id } => {
            ApiError::SelectionConfirmed { student_id }
        }
        CoreError::NotEligibleTarget { student_id } => ApiError::NotEligibleTarget { student_id },
        CoreError::NoRoomTypeAllocation { student_id } => ApiError::NotFound {
            resource_type: String::from("Room type allocation"),
            message: format!("Student {student_id} has no manual room type allocation"),
        },
        CoreError::IntegrityViolation(msg) => ApiError::Internal {
            message: format!("Integrity violation: {msg}"),
        },
        CoreError::DomainViolation(domain_err) => translate_domain_error(domain_err),
    }
}

/// Translates a persistence error into an API error.
///
/// Integrity violations and storage failures become `Internal`; the
/// transaction that raised them has already been rolled back.
#[must_use]
pub fn translate_persistence_error(err: PersistenceError) -> ApiError {
    match err {
        PersistenceError::StudentNotFound(id) => not_found("Student", format!("Student {id}")),
        PersistenceError::BuildingNotFound(id) => not_found("Building", format!("Building {id}")),
        PersistenceError::RoomNotFound(id) => not_found("Room", format!("Room {id}")),
        PersistenceError::EventNotFound(id) => {
            not_found("Lottery event", format!("Lottery event {id}"))
        }
        PersistenceError::ResultNotFound {
            event_id,
            student_id,
        } => not_found(
            "Lottery result",
            format!("Student {student_id} has no result in event {event_id}"),
        ),
        PersistenceError::AlreadyDrawn(event_id) => ApiError::AlreadyDrawn { event_id },
        PersistenceError::AlreadyPublished(event_id) => ApiError::AlreadyPublished { event_id },
        PersistenceError::DuplicateDrawNumber {
            event_id,
            draw_number,
        } => ApiError::DomainRuleViolation {
            rule: String::from("unique_draw_number"),
            message: format!("Draw number {draw_number} is already used in event {event_id}"),
        },
        PersistenceError::RoomInUse(room_id) => ApiError::DomainRuleViolation {
            rule: String::from("room_in_use"),
            message: format!("Room {room_id} still has occupied beds, selections or history"),
        },
        PersistenceError::BuildingNotEmpty(building_id) => ApiError::DomainRuleViolation {
            rule: String::from("building_not_empty"),
            message: format!("Building {building_id} still has rooms"),
        },
        PersistenceError::DuplicateRoom {
            building_id,
            room_number,
        } => ApiError::DomainRuleViolation {
            rule: String::from("unique_room_number"),
            message: format!("Room '{room_number}' already exists in building {building_id}"),
        },
        PersistenceError::DuplicateBuilding(name) => ApiError::DomainRuleViolation {
            rule: String::from("unique_building_name"),
            message: format!("Building '{name}' already exists"),
        },
        PersistenceError::DuplicateUsername(username) => ApiError::DomainRuleViolation {
            rule: String::from("unique_username"),
            message: format!("Username '{username}' is already registered"),
        },
        PersistenceError::HeldBedTypeConflict {
            event_id,
            student_id,
            bed_id,
        } => ApiError::DomainRuleViolation {
            rule: String::from("held_bed_room_type"),
            message: format!(
                "Publishing event {event_id} would change the room type of student {student_id} who holds bed {bed_id}"
            ),
        },
        PersistenceError::CapacityBelowOccupancy {
            room_id,
            capacity,
            occupancy,
        } => ApiError::DomainRuleViolation {
            rule: String::from("capacity_below_occupancy"),
            message: format!(
                "Room {room_id} has {occupancy} occupied beds, more than capacity {capacity}"
            ),
        },
        PersistenceError::EventHasResults(event_id) => ApiError::DomainRuleViolation {
            rule: String::from("event_has_results"),
            message: format!("Lottery event {event_id} has already been drawn"),
        },
        other => ApiError::Internal {
            message: other.to_string(),
        },
    }
}

fn not_found(resource_type: &str, subject: String) -> ApiError {
    ApiError::NotFound {
        resource_type: String::from(resource_type),
        message: format!("{subject} does not exist"),
    }
}
