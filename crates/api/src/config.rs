// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use std::time::Duration;

/// Default upper bound on waiting for a bed lock.
pub const DEFAULT_LOCK_TIMEOUT: Duration = Duration::from_secs(5);

/// Default number of lock rounds before giving up with `Busy`.
pub const DEFAULT_MAX_LOCK_ATTEMPTS: u32 = 3;

/// Tuning for the bed selection coordinator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CoordinatorConfig {
    /// How long one acquisition may block before failing with `Busy`.
    pub lock_timeout: Duration,
    /// How many times the coordinator re-locks when the student's held bed
    /// changed between the unlocked peek and the locked reload.
    pub max_lock_attempts: u32,
}

impl CoordinatorConfig {
    /// Creates a configuration with the given lock timeout and default attempts.
    #[must_use]
    pub const fn with_lock_timeout(lock_timeout: Duration) -> Self {
        Self {
            lock_timeout,
            max_lock_attempts: DEFAULT_MAX_LOCK_ATTEMPTS,
        }
    }
}

impl Default for CoordinatorConfig {
    fn default() -> Self {
        Self {
            lock_timeout: DEFAULT_LOCK_TIMEOUT,
            max_lock_attempts: DEFAULT_MAX_LOCK_ATTEMPTS,
        }
    }
}
