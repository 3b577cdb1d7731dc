// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! The bed selection coordinator.
//!
//! Every operation follows the same sequence:
//!
//! 1. Peek at the student's stored state to learn which beds are involved
//!    (the held bed and the target bed, if any)
//! 2. Acquire the locks for those beds in ascending id order
//! 3. Reload the state under the locks; if the held bed changed since the
//!    peek, release and start over
//! 4. Apply the command and persist the transition in one transaction
//!
//! Locks are released when the guard drops, on every exit path. A lock
//! that cannot be acquired within the configured timeout fails the request
//! with `Busy` and changes nothing.

use std::sync::{Arc, Mutex, MutexGuard};

use dorm_lottery::{
    AllocationState, BedLockGuard, BedLockTable, BedTarget, Command, TransitionResult, apply,
};
use dorm_lottery_audit::Actor;
use dorm_lottery_domain::BedSelection;
use dorm_lottery_persistence::Persistence;
use tracing::{debug, info, warn};

use crate::auth::AuthenticatedActor;
use crate::config::CoordinatorConfig;
use crate::error::{ApiError, translate_core_error, translate_persistence_error};
use crate::request_response::{SelectionInfo, SelectionOutcome, SelectionResponse};

/// Serializes bed claims, releases and moves across concurrent callers.
pub struct BedSelectionCoordinator {
    persistence: Arc<Mutex<Persistence>>,
    pub(crate) locks: BedLockTable,
    config: CoordinatorConfig,
}

impl BedSelectionCoordinator {
    /// Creates a coordinator over shared persistence.
    #[must_use]
    pub fn new(persistence: Arc<Mutex<Persistence>>, config: CoordinatorConfig) -> Self {
        Self {
            persistence,
            locks: BedLockTable::new(),
            config,
        }
    }

    /// The shared persistence handle, for handlers that run outside the
    /// coordinator.
    #[must_use]
    pub fn persistence(&self) -> Arc<Mutex<Persistence>> {
        Arc::clone(&self.persistence)
    }

    /// The configuration in effect.
    #[must_use]
    pub const fn config(&self) -> &CoordinatorConfig {
        &self.config
    }

    /// Claims a bed for a student, releasing any unconfirmed bed they hold.
    ///
    /// Re-claiming the bed already held returns `Unchanged` and writes
    /// nothing.
    ///
    /// # Errors
    ///
    /// Returns `Forbidden`, `NotEligible`, `NotFound`, `TypeMismatch`,
    /// `RoomUnavailable` or `Conflict` (checked in that order),
    /// `SelectionConfirmed` if the held bed is confirmed, or `Busy`.
    pub fn claim_bed(
        &self,
        actor: &AuthenticatedActor,
        student_id: i64,
        bed_id: i64,
    ) -> Result<SelectionResponse, ApiError> {
        self.execute(actor, student_id, Command::ClaimBed { bed_id })
    }

    /// Releases the student's held bed.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the student holds no bed, `SelectionConfirmed`
    /// if the selection is confirmed, or `Busy`.
    pub fn release_bed(
        &self,
        actor: &AuthenticatedActor,
        student_id: i64,
    ) -> Result<SelectionResponse, ApiError> {
        self.execute(actor, student_id, Command::ReleaseBed)
    }

    /// Moves the student's selection to another bed in one step.
    ///
    /// # Errors
    ///
    /// Returns the `claim_bed` errors for the new bed, `NotFound` if no bed
    /// is held, or `NoOp` if the new bed is the held bed.
    pub fn swap_bed(
        &self,
        actor: &AuthenticatedActor,
        student_id: i64,
        new_bed_id: i64,
    ) -> Result<SelectionResponse, ApiError> {
        self.execute(actor, student_id, Command::SwapBed { new_bed_id })
    }

    /// Confirms the student's held bed.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if no bed is held or `AlreadyConfirmed`.
    pub fn confirm_selection(
        &self,
        actor: &AuthenticatedActor,
        student_id: i64,
    ) -> Result<SelectionResponse, ApiError> {
        self.execute(actor, student_id, Command::ConfirmSelection)
    }

    /// Administrator removal of a selection, confirmed or not.
    ///
    /// # Errors
    ///
    /// Returns `Unauthorized` for non-administrators or `NotFound` if no bed
    /// is held.
    pub fn revoke_selection(
        &self,
        actor: &AuthenticatedActor,
        student_id: i64,
        notes: Option<String>,
    ) -> Result<SelectionResponse, ApiError> {
        actor.require_admin("revoke_selection")?;
        self.execute(actor, student_id, Command::RevokeSelection { notes })
    }

    /// Administrator move of a selection to another free bed. The
    /// confirmed flag is kept.
    ///
    /// # Errors
    ///
    /// Returns `Unauthorized` for non-administrators, plus the bed checks
    /// of `claim_bed` for the new bed.
    pub fn reassign_bed(
        &self,
        actor: &AuthenticatedActor,
        student_id: i64,
        new_bed_id: i64,
        notes: Option<String>,
    ) -> Result<SelectionResponse, ApiError> {
        actor.require_admin("reassign_bed")?;
        self.execute(
            actor,
            student_id,
            Command::ReassignBed { new_bed_id, notes },
        )
    }

    fn execute(
        &self,
        authenticated_actor: &AuthenticatedActor,
        student_id: i64,
        command: Command,
    ) -> Result<SelectionResponse, ApiError> {
        let actor: Actor = authenticated_actor.to_audit_actor();
        let command_name: &'static str = command.name();

        for attempt in 1..=self.config.max_lock_attempts {
            let peeked: AllocationState = {
                let mut persistence: MutexGuard<'_, Persistence> = self.lock_persistence()?;
                load_state(&mut persistence, student_id)?
            };
            let bed_ids: Vec<i64> = involved_beds(&peeked, &command);

            let guard: BedLockGuard<'_> =
                self.locks
                    .acquire(&bed_ids, self.config.lock_timeout)
                    .map_err(|e| {
                        warn!(student_id, command = command_name, error = %e, "Bed lock timed out");
                        ApiError::from(e)
                    })?;

            let mut persistence: MutexGuard<'_, Persistence> = self.lock_persistence()?;
            let state: AllocationState = load_state(&mut persistence, student_id)?;
            let needed: Vec<i64> = involved_beds(&state, &command);
            if !needed.iter().all(|id| guard.bed_ids().contains(id)) {
                debug!(
                    student_id,
                    attempt,
                    command = command_name,
                    "Held bed changed before lock acquisition, retrying"
                );
                continue;
            }

            let target: Option<BedTarget> = match command.target_bed() {
                Some(bed_id) => persistence
                    .load_bed_target(bed_id)
                    .map_err(translate_persistence_error)?,
                None => None,
            };

            let result: TransitionResult =
                apply(&state, target.as_ref(), command.clone(), actor.clone()).map_err(|e| {
                    debug!(student_id, command = command_name, error = %e, "Command rejected");
                    translate_core_error(e)
                })?;
            let outcome: SelectionOutcome = outcome_of(command_name, &state, &result);
            let selection: Option<BedSelection> = persistence
                .persist_transition(&result)
                .map_err(translate_persistence_error)?;
            drop(persistence);
            drop(guard);

            info!(
                student_id,
                command = command_name,
                outcome = ?outcome,
                bed_id = selection.as_ref().map(|s| s.bed_id),
                "Bed selection operation completed"
            );
            return Ok(SelectionResponse {
                student_id,
                outcome,
                selection: selection.map(SelectionInfo::from),
            });
        }

        warn!(
            student_id,
            command = command_name,
            attempts = self.config.max_lock_attempts,
            "Held bed kept changing, giving up"
        );
        Err(ApiError::Busy {
            message: format!(
                "the allocation of student {student_id} kept changing during {command_name}"
            ),
        })
    }

    fn lock_persistence(&self) -> Result<MutexGuard<'_, Persistence>, ApiError> {
        self.persistence
            .lock()
            .map_err(|e| ApiError::Internal {
                message: format!("persistence lock poisoned: {e}"),
            })
    }
}

/// Loads fresh state; an unknown student is refused like an administrator.
fn load_state(
    persistence: &mut Persistence,
    student_id: i64,
) -> Result<AllocationState, ApiError> {
    persistence
        .load_allocation_state(student_id)
        .map_err(translate_persistence_error)?
        .ok_or_else(|| ApiError::Forbidden {
            reason: format!("student {student_id} does not exist"),
        })
}

/// The beds an operation must lock: the held bed and the target bed.
fn involved_beds(state: &AllocationState, command: &Command) -> Vec<i64> {
    let mut beds: Vec<i64> = state
        .selection
        .iter()
        .map(|s| s.bed_id)
        .chain(command.target_bed())
        .collect();
    beds.sort_unstable();
    beds.dedup();
    beds
}

fn outcome_of(
    command_name: &str,
    before: &AllocationState,
    result: &TransitionResult,
) -> SelectionOutcome {
    if result.is_noop() {
        return SelectionOutcome::Unchanged;
    }
    match command_name {
        "ClaimBed" if before.selection.is_some() => SelectionOutcome::Replaced,
        "ReleaseBed" => SelectionOutcome::Released,
        "SwapBed" => SelectionOutcome::Swapped,
        "ConfirmSelection" => SelectionOutcome::Confirmed,
        "RevokeSelection" => SelectionOutcome::Revoked,
        "ReassignBed" => SelectionOutcome::Reassigned,
        _ => SelectionOutcome::Claimed,
    }
}
