// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Process-local exclusive locks keyed by bed id.
//!
//! Every operation that reads or writes state tied to a bed holds that
//! bed's lock for its whole duration. Operations touching two beds
//! acquire both in ascending id order, which is the only deadlock
//! avoidance mechanism. Acquisition is bounded by a timeout and the
//! guard releases everything it holds on drop, on every exit path.

use std::collections::HashSet;
use std::sync::{Condvar, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};
use tracing::debug;

/// Errors raised while acquiring bed locks.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LockError {
    /// The lock was not released within the timeout.
    #[error("timed out after {waited_ms} ms waiting for the lock on bed {bed_id}")]
    Timeout {
        /// The contested bed.
        bed_id: i64,
        /// How long the caller waited in total.
        waited_ms: u128,
    },
}

/// A table of per-bed locks guarded by one coarse mutex.
#[derive(Debug, Default)]
pub struct BedLockTable {
    held: Mutex<HashSet<i64>>,
    released: Condvar,
}

/// Holds a set of bed locks until dropped.
#[derive(Debug)]
pub struct BedLockGuard<'a> {
    table: &'a BedLockTable,
    bed_ids: Vec<i64>,
}

impl BedLockGuard<'_> {
    /// The beds held by this guard, in acquisition order.
    #[must_use]
    pub fn bed_ids(&self) -> &[i64] {
        &self.bed_ids
    }
}

impl Drop for BedLockGuard<'_> {
    fn drop(&mut self) {
        self.table.release(&self.bed_ids);
    }
}

impl BedLockTable {
    /// Creates an empty lock table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Acquires the locks for every bed in `bed_ids`.
    ///
    /// Ids are deduplicated and taken in ascending order. If any lock cannot
    /// be taken before the deadline, the locks already taken are released
    /// before the error is returned.
    ///
    /// # Arguments
    ///
    /// * `bed_ids` - The beds to lock, in any order
    /// * `timeout` - Upper bound on the total time spent waiting
    ///
    /// # Errors
    ///
    /// Returns `LockError::Timeout` if a lock stays held past the deadline.
    pub fn acquire(
        &self,
        bed_ids: &[i64],
        timeout: Duration,
    ) -> Result<BedLockGuard<'_>, LockError> {
        let mut ordered: Vec<i64> = bed_ids.to_vec();
        ordered.sort_unstable();
        ordered.dedup();

        let started: Instant = Instant::now();
        let deadline: Option<Instant> = started.checked_add(timeout);
        let mut guard: BedLockGuard<'_> = BedLockGuard {
            table: self,
            bed_ids: Vec::with_capacity(ordered.len()),
        };

        for bed_id in ordered {
            if !self.acquire_one(bed_id, deadline) {
                debug!(bed_id, "Bed lock acquisition timed out");
                return Err(LockError::Timeout {
                    bed_id,
                    waited_ms: started.elapsed().as_millis(),
                });
            }
            guard.bed_ids.push(bed_id);
        }

        Ok(guard)
    }

    /// Returns true if some guard currently holds the bed.
    #[must_use]
    pub fn is_held(&self, bed_id: i64) -> bool {
        self.lock_held().contains(&bed_id)
    }

    fn acquire_one(&self, bed_id: i64, deadline: Option<Instant>) -> bool {
        let mut held: MutexGuard<'_, HashSet<i64>> = self.lock_held();
        while held.contains(&bed_id) {
            held = match deadline {
                Some(deadline) => {
                    let remaining: Duration = deadline.saturating_duration_since(Instant::now());
                    if remaining.is_zero() {
                        return false;
                    }
                    self.released
                        .wait_timeout(held, remaining)
                        .unwrap_or_else(PoisonError::into_inner)
                        .0
                }
                None => self
                    .released
                    .wait(held)
                    .unwrap_or_else(PoisonError::into_inner),
            };
        }
        held.insert(bed_id);
        true
    }

    fn release(&self, bed_ids: &[i64]) {
        if bed_ids.is_empty() {
            return;
        }
        let mut held: MutexGuard<'_, HashSet<i64>> = self.lock_held();
        for bed_id in bed_ids {
            held.remove(bed_id);
        }
        drop(held);
        self.released.notify_all();
    }

    // The set only ever holds plain ids, so a poisoned lock is still usable.
    fn lock_held(&self) -> MutexGuard<'_, HashSet<i64>> {
        self.held.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
