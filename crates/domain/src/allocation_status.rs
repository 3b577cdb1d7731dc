// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Allocation status tracking and transition logic.
//!
//! A student's status is never stored; it is derived from the ledger
//! (room-type assignment and live bed selection) and every mutation is
//! checked against the derived value before it is applied.

use crate::error::DomainError;
use crate::types::BedSelection;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Lifecycle of a single student's allocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AllocationStatus {
    /// No room type yet
    Unassigned,
    /// Room type known, no bed held
    RoomTypeSet,
    /// A bed is held but may still change
    BedSelected,
    /// Bed locked in; only an administrator can undo it
    Confirmed,
}

/// Who is asking for a transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Authority {
    /// The student acting on their own allocation.
    SelfService,
    /// An administrator override.
    Admin,
}

impl AllocationStatus {
    /// Returns the string representation of the status.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Unassigned => "unassigned",
            Self::RoomTypeSet => "room_type_set",
            Self::BedSelected => "bed_selected",
            Self::Confirmed => "confirmed",
        }
    }

    /// Derives the status from the ledger.
    ///
    /// # Arguments
    ///
    /// * `has_room_type` - Whether the student has an effective room type
    /// * `selection` - The student's live selection, if any
    #[must_use]
    pub const fn derive(has_room_type: bool, selection: Option<&BedSelection>) -> Self {
        match selection {
            Some(selection) if selection.is_confirmed => Self::Confirmed,
            Some(_) => Self::BedSelected,
            None if has_room_type => Self::RoomTypeSet,
            None => Self::Unassigned,
        }
    }

    /// Returns true if self-service actions can no longer change this status.
    #[must_use]
    pub const fn is_terminal_for_self_service(&self) -> bool {
        matches!(self, Self::Confirmed)
    }

    /// Validates if a transition from this status to another is permitted.
    ///
    /// Legal transitions:
    /// - `Unassigned` → `RoomTypeSet` (admin: lottery or manual allocation)
    /// - `RoomTypeSet` → `RoomTypeSet` (admin: re-allocation)
    /// - `RoomTypeSet` → `Unassigned` (admin: allocation removed)
    /// - `RoomTypeSet` → `BedSelected` (claim)
    /// - `BedSelected` → `BedSelected` (claim-replace, swap, reassign)
    /// - `BedSelected` → `RoomTypeSet` (release, revoke)
    /// - `BedSelected` → `Confirmed` (confirm)
    /// - `Confirmed` → `Confirmed` (admin: reassign)
    /// - `Confirmed` → `RoomTypeSet` (admin: revoke)
    ///
    /// # Errors
    ///
    /// Returns `DomainError::InvalidStatusTransition` if the transition is not
    /// allowed for the given authority.
    pub fn validate_transition(
        &self,
        new_status: Self,
        authority: Authority,
    ) -> Result<(), DomainError> {
        if authority == Authority::SelfService && self.is_terminal_for_self_service() {
            return Err(DomainError::InvalidStatusTransition {
                from: self.as_str().to_string(),
                to: new_status.as_str().to_string(),
                reason: "a confirmed selection can only be changed by an administrator"
                    .to_string(),
            });
        }

        let valid: bool = match (self, new_status) {
            (Self::Unassigned | Self::RoomTypeSet, Self::RoomTypeSet)
            | (Self::RoomTypeSet, Self::Unassigned)
            | (Self::Confirmed, Self::RoomTypeSet | Self::Confirmed) => {
                authority == Authority::Admin
            }
            (Self::RoomTypeSet, Self::BedSelected)
            | (Self::BedSelected, Self::BedSelected | Self::RoomTypeSet | Self::Confirmed) => true,
            _ => false,
        };

        if valid {
            Ok(())
        } else {
            Err(DomainError::InvalidStatusTransition {
                from: self.as_str().to_string(),
                to: new_status.as_str().to_string(),
                reason: "transition not permitted by allocation lifecycle rules".to_string(),
            })
        }
    }
}

impl FromStr for AllocationStatus {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "unassigned" => Ok(Self::Unassigned),
            "room_type_set" => Ok(Self::RoomTypeSet),
            "bed_selected" => Ok(Self::BedSelected),
            "confirmed" => Ok(Self::Confirmed),
            _ => Err(DomainError::InvalidAllocationStatus(s.to_string())),
        }
    }
}

impl std::fmt::Display for AllocationStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
