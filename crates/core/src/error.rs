// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use dorm_lottery_domain::{DomainError, RoomType};

/// Errors that can occur during allocation transitions.
///
/// Every variant except `IntegrityViolation` is a business-rule rejection
/// raised before any mutation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CoreError {
    /// The actor may not perform this operation on this student.
    Forbidden {
        /// Why the actor was refused.
        reason: String,
    },
    /// The student has no published lottery result or manual allocation.
    NotEligible {
        /// The student.
        student_id: i64,
    },
    /// The target bed does not exist.
    BedNotFound {
        /// The requested bed.
        bed_id: i64,
    },
    /// The bed's room is of a different type than the student's assignment.
    TypeMismatch {
        /// The student's room type.
        expected: RoomType,
        /// The room's type.
        actual: RoomType,
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
    /// The student holds no bed.
    NoSelection {
        /// The student.
        student_id: i64,
    },
    /// The new bed is the bed already held.
    SameBed {
        /// The bed.
        bed_id: i64,
    },
    /// The selection is already confirmed.
    AlreadyConfirmed {
        /// The student.
        student_id: i64,
    },
    /// A confirmed selection cannot be changed through self-service.
    SelectionConfirmed {
        /// The student.
        student_id: i64,
    },
    /// Administrator accounts cannot receive allocations.
    NotEligibleTarget {
        /// The administrator account.
        student_id: i64,
    },
    /// The student has no manual room-type allocation to remove.
    NoRoomTypeAllocation {
        /// The student.
        student_id: i64,
    },
    /// Stored state contradicts itself.
    IntegrityViolation(String),
    /// A domain rule was violated.
    DomainViolation(DomainError),
}

impl std::fmt::Display for CoreError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Forbidden { reason } => write!(f, "Forbidden: {reason}"),
            Self::NotEligible { student_id } => write!(
                f,
                "Student {student_id} has no published room type assignment"
            ),
            Self::BedNotFound { bed_id } => write!(f, "Bed {bed_id} not found"),
            Self::TypeMismatch { expected, actual } => write!(
                f,
                "Room type mismatch: student is assigned '{expected}', bed is in a '{actual}' room"
            ),
            Self::RoomUnavailable { room_id } => write!(f, "Room {room_id} is not available"),
            Self::Conflict { bed_id } => write!(f, "Bed {bed_id} is already taken"),
            Self::NoSelection { student_id } => {
                write!(f, "Student {student_id} has no bed selection")
            }
            Self::SameBed { bed_id } => write!(f, "Student already holds bed {bed_id}"),
            Self::AlreadyConfirmed { student_id } => {
                write!(f, "Selection of student {student_id} is already confirmed")
            }
            Self::SelectionConfirmed { student_id } => write!(
                f,
                "Selection of student {student_id} is confirmed and can only be changed by an administrator"
            ),
            Self::NotEligibleTarget { student_id } => write!(
                f,
                "Account {student_id} is an administrator and cannot receive an allocation"
            ),
            Self::NoRoomTypeAllocation { student_id } => write!(
                f,
                "Student {student_id} has no manual room type allocation"
            ),
            Self::IntegrityViolation(msg) => write!(f, "Integrity violation: {msg}"),
            Self::DomainViolation(err) => write!(f, "Domain violation: {err}"),
        }
    }
}

impl std::error::Error for CoreError {}

impl From<DomainError> for CoreError {
    fn from(err: DomainError) -> Self {
        Self::DomainViolation(err)
    }
}
