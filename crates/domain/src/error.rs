// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

/// Errors that can occur during domain validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// Room type label is empty or malformed.
    InvalidRoomType(String),
    /// A display name (student, building, event) is empty or invalid.
    InvalidName(String),
    /// Room number is empty or invalid.
    InvalidRoomNumber(String),
    /// Room capacity is outside the supported range.
    InvalidCapacity {
        /// The rejected capacity.
        capacity: u32,
    },
    /// Lottery composition is malformed.
    InvalidComposition(String),
    /// Scheduled time could not be parsed as RFC 3339.
    InvalidScheduledTime {
        /// The rejected value.
        value: String,
        /// The parser error.
        error: String,
    },
    /// Draw numbers start at 1.
    InvalidDrawNumber(u32),
    /// The composition cannot hold every eligible student.
    CapacityExceeded {
        /// Total seats across all buckets.
        capacity: u64,
        /// Number of eligible students.
        participants: usize,
    },
    /// There is nobody to draw.
    NoParticipants,
    /// Allocation status label is unknown.
    InvalidAllocationStatus(String),
    /// History action label is unknown.
    InvalidHistoryAction(String),
    /// Allocation status transition is not permitted.
    InvalidStatusTransition {
        /// The current status.
        from: String,
        /// The requested status.
        to: String,
        /// Why the transition was rejected.
        reason: String,
    },
}

impl std::fmt::Display for DomainError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidRoomType(msg) => write!(f, "Invalid room type: {msg}"),
            Self::InvalidName(msg) => write!(f, "Invalid name: {msg}"),
            Self::InvalidRoomNumber(msg) => write!(f, "Invalid room number: {msg}"),
            Self::InvalidCapacity { capacity } => {
                write!(
                    f,
                    "Invalid room capacity: {capacity}. Must be between 1 and {}",
                    crate::validation::MAX_ROOM_CAPACITY
                )
            }
            Self::InvalidComposition(msg) => write!(f, "Invalid lottery composition: {msg}"),
            Self::InvalidScheduledTime { value, error } => {
                write!(f, "Failed to parse scheduled time '{value}': {error}")
            }
            Self::InvalidDrawNumber(number) => {
                write!(f, "Invalid draw number: {number}. Must be at least 1")
            }
            Self::CapacityExceeded {
                capacity,
                participants,
            } => {
                write!(
                    f,
                    "Composition holds {capacity} students but {participants} are eligible"
                )
            }
            Self::NoParticipants => write!(f, "No eligible students to draw"),
            Self::InvalidAllocationStatus(status) => {
                write!(f, "Invalid allocation status: {status}")
            }
            Self::InvalidHistoryAction(action) => write!(f, "Invalid history action: {action}"),
            Self::InvalidStatusTransition { from, to, reason } => {
                write!(f, "Cannot transition from {from} to {to}: {reason}")
            }
        }
    }
}

impl std::error::Error for DomainError {}
