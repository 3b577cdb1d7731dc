// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Caller identity and role checks.
//!
//! Credentials and sessions live outside this crate. Callers arrive with
//! an account id that has already been authenticated; this module resolves
//! it to a role and enforces which operations that role may perform.

use dorm_lottery_audit::{Actor, ActorRole};
use dorm_lottery_domain::Student;
use dorm_lottery_persistence::Persistence;

use crate::error::{ApiError, translate_persistence_error};

/// Actor roles for authorization.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    /// Administrators run lotteries, manage inventory and override
    /// allocations. They never hold beds themselves.
    Admin,
    /// Students manage their own bed selection.
    Student,
}

/// An authenticated account with an associated role.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthenticatedActor {
    /// The account's student table identifier.
    pub student_id: i64,
    /// The role derived from the account's admin flag.
    pub role: Role,
}

impl AuthenticatedActor {
    /// Creates a new authenticated actor.
    #[must_use]
    pub const fn new(student_id: i64, role: Role) -> Self {
        Self { student_id, role }
    }

    /// Converts this authenticated actor into an audit `Actor`.
    #[must_use]
    pub const fn to_audit_actor(&self) -> Actor {
        let role: ActorRole = match self.role {
            Role::Admin => ActorRole::Admin,
            Role::Student => ActorRole::Student,
        };
        Actor::new(self.student_id, role)
    }

    /// Fails with `Unauthorized` unless this actor is an administrator.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Unauthorized` naming `action` for student actors.
    pub fn require_admin(&self, action: &str) -> Result<(), ApiError> {
        match self.role {
            Role::Admin => Ok(()),
            Role::Student => Err(ApiError::Unauthorized {
                action: String::from(action),
                required_role: String::from("Admin"),
            }),
        }
    }
}

/// Resolves an authenticated account id to an actor.
///
/// # Errors
///
/// Returns `AuthenticationFailed` if the account does not exist.
pub fn resolve_actor(
    persistence: &mut Persistence,
    student_id: i64,
) -> Result<AuthenticatedActor, ApiError> {
    let student: Student = persistence
        .find_student(student_id)
        .map_err(translate_persistence_error)?
        .ok_or_else(|| ApiError::AuthenticationFailed {
            reason: format!("Unknown account {student_id}"),
        })?;

    let role: Role = if student.is_admin {
        Role::Admin
    } else {
        Role::Student
    };
    Ok(AuthenticatedActor::new(student.student_id, role))
}
