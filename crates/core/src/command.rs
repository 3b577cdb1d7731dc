// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use dorm_lottery_domain::RoomType;

/// A command represents student or administrator intent as data only.
///
/// Commands are the only way to request allocation changes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Claim a bed, releasing any bed already held.
    ClaimBed {
        /// The bed to claim.
        bed_id: i64,
    },
    /// Give up the currently held bed.
    ReleaseBed,
    /// Move the held selection to another bed in one step.
    SwapBed {
        /// The bed to move to.
        new_bed_id: i64,
    },
    /// Lock in the held selection.
    ConfirmSelection,
    /// Administrator removal of a selection, confirmed or not.
    RevokeSelection {
        /// Reason recorded in history and audit.
        notes: Option<String>,
    },
    /// Administrator move of a selection to another bed.
    ReassignBed {
        /// The bed to move to.
        new_bed_id: i64,
        /// Reason recorded in history and audit.
        notes: Option<String>,
    },
    /// Administrator room-type allocation outside the lottery.
    AssignRoomType {
        /// The room type to assign.
        room_type: RoomType,
        /// Free-form notes stored with the allocation.
        notes: Option<String>,
    },
    /// Administrator removal of a manual room-type allocation.
    RemoveRoomType {
        /// Reason recorded in the audit event.
        notes: Option<String>,
    },
}

impl Command {
    /// Returns the command name used in logs and audit events.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::ClaimBed { .. } => "ClaimBed",
            Self::ReleaseBed => "ReleaseBed",
            Self::SwapBed { .. } => "SwapBed",
            Self::ConfirmSelection => "ConfirmSelection",
            Self::RevokeSelection { .. } => "RevokeSelection",
            Self::ReassignBed { .. } => "ReassignBed",
            Self::AssignRoomType { .. } => "AssignRoomType",
            Self::RemoveRoomType { .. } => "RemoveRoomType",
        }
    }

    /// The bed this command moves into, if any.
    #[must_use]
    pub const fn target_bed(&self) -> Option<i64> {
        match self {
            Self::ClaimBed { bed_id } => Some(*bed_id),
            Self::SwapBed { new_bed_id } | Self::ReassignBed { new_bed_id, .. } => {
                Some(*new_bed_id)
            }
            Self::ReleaseBed
            | Self::ConfirmSelection
            | Self::RevokeSelection { .. }
            | Self::AssignRoomType { .. }
            | Self::RemoveRoomType { .. } => None,
        }
    }
}
