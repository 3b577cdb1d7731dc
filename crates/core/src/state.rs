// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use dorm_lottery_audit::{AuditEvent, HistoryEntry, StateSnapshot};
use dorm_lottery_domain::{AllocationStatus, Bed, BedSelection, Room, RoomType, Student};

/// Where a student's effective room type came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoomTypeSource {
    /// An administrator's room-type allocation.
    Manual,
    /// A published lottery result.
    Lottery {
        /// The event that produced the result.
        event_id: i64,
    },
}

/// A student's effective room type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoomTypeAssignment {
    pub room_type: RoomType,
    pub source: RoomTypeSource,
}

/// Everything the transition rules need to know about one student.
///
/// The state is always loaded from storage immediately before a command is
/// applied; caller-supplied status is never trusted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AllocationState {
    /// The student the state belongs to.
    pub student: Student,
    /// Effective room type, if any.
    pub assignment: Option<RoomTypeAssignment>,
    /// Live bed selection, if any.
    pub selection: Option<BedSelection>,
}

impl AllocationState {
    /// Creates a new allocation state.
    ///
    /// # Arguments
    ///
    /// * `student` - The student
    /// * `assignment` - The effective room type
    /// * `selection` - The live bed selection
    #[must_use]
    pub const fn new(
        student: Student,
        assignment: Option<RoomTypeAssignment>,
        selection: Option<BedSelection>,
    ) -> Self {
        Self {
            student,
            assignment,
            selection,
        }
    }

    /// Derives the student's current allocation status.
    #[must_use]
    pub const fn status(&self) -> AllocationStatus {
        AllocationStatus::derive(self.assignment.is_some(), self.selection.as_ref())
    }

    /// Converts the state to a snapshot for audit purposes.
    #[must_use]
    pub fn to_snapshot(&self) -> StateSnapshot {
        let room_type: &str = self
            .assignment
            .as_ref()
            .map_or("none", |a| a.room_type.as_str());
        let bed: String = self
            .selection
            .as_ref()
            .map_or_else(|| String::from("none"), |s| s.bed_id.to_string());
        StateSnapshot::new(format!(
            "student={},status={},room_type={room_type},bed={bed}",
            self.student.student_id,
            self.status()
        ))
    }
}

/// The bed a command targets, together with its room and current holder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BedTarget {
    pub bed: Bed,
    pub room: Room,
    /// The live selection referencing the bed, if any.
    pub holder: Option<BedSelection>,
}

/// The storage change a transition requires.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    /// Nothing to write.
    None,
    /// Occupy a bed, first releasing the student's previous bed if any.
    Claim {
        /// Selection to release before the claim.
        replaced: Option<BedSelection>,
        /// The new selection.
        selection: BedSelection,
    },
    /// Free a bed and drop the selection.
    Release {
        /// The selection being removed.
        released: BedSelection,
    },
    /// Move a selection to another bed, freeing and occupying together.
    Move {
        /// The selection as it was.
        from: BedSelection,
        /// The selection as it will be.
        to: BedSelection,
    },
    /// Mark a selection confirmed.
    Confirm {
        /// The selection being confirmed.
        selection: BedSelection,
    },
    /// Upsert the student's manual room-type allocation.
    SetRoomType {
        room_type: RoomType,
        assigned_by: i64,
        notes: Option<String>,
    },
    /// Delete the student's manual room-type allocation.
    ClearRoomType,
}

/// The result of a successful state transition.
///
/// Transitions are atomic: they either succeed completely or fail without side effects.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransitionResult {
    /// The new state after the transition.
    pub new_state: AllocationState,
    /// What storage must change.
    pub effect: Effect,
    /// The allocation history row to append, if the transition touched a bed.
    pub history: Option<HistoryEntry>,
    /// The audit event for administrator actions.
    pub audit_event: Option<AuditEvent>,
}

impl TransitionResult {
    /// A successful transition that changes nothing.
    #[must_use]
    pub const fn unchanged(state: AllocationState) -> Self {
        Self {
            new_state: state,
            effect: Effect::None,
            history: None,
            audit_event: None,
        }
    }

    /// Returns true if applying this result writes nothing.
    #[must_use]
    pub const fn is_noop(&self) -> bool {
        matches!(self.effect, Effect::None)
    }
}
