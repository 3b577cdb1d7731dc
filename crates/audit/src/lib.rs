// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

#![deny(
    clippy::pedantic,
    clippy::cargo,
    clippy::nursery,
    clippy::style,
    clippy::correctness,
    clippy::all
)]

use dorm_lottery_domain::DomainError;
use std::str::FromStr;

/// The kind of account behind an action.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActorRole {
    /// A student acting on their own allocation.
    Student,
    /// An administrator.
    Admin,
}

impl ActorRole {
    /// Returns the string representation used in storage.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Student => "student",
            Self::Admin => "admin",
        }
    }
}

impl FromStr for ActorRole {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "student" => Ok(Self::Student),
            "admin" => Ok(Self::Admin),
            _ => Err(format!("Unknown actor role: {s}")),
        }
    }
}

/// Represents the account performing an action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Actor {
    /// The student table identifier of the account.
    pub id: i64,
    /// Whether the account acted as a student or an administrator.
    pub role: ActorRole,
}

impl Actor {
    /// Creates a new Actor.
    ///
    /// # Arguments
    ///
    /// * `id` - The account identifier
    /// * `role` - The role the account acted in
    #[must_use]
    pub const fn new(id: i64, role: ActorRole) -> Self {
        Self { id, role }
    }

    /// Returns true if this actor is an administrator.
    #[must_use]
    pub const fn is_admin(&self) -> bool {
        matches!(self.role, ActorRole::Admin)
    }
}

/// Represents the specific action performed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Action {
    /// The name of the action (e.g., "`PublishLottery`", "`RevokeSelection`").
    pub name: String,
    /// Optional additional details about the action.
    pub details: Option<String>,
}

impl Action {
    /// Creates a new Action.
    ///
    /// # Arguments
    ///
    /// * `name` - The name of the action
    /// * `details` - Optional additional details
    #[must_use]
    pub const fn new(name: String, details: Option<String>) -> Self {
        Self { name, details }
    }
}

/// A compact textual snapshot of the state an action touched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StateSnapshot {
    pub data: String,
}

impl StateSnapshot {
    /// Creates a new `StateSnapshot`.
    #[must_use]
    pub const fn new(data: String) -> Self {
        Self { data }
    }
}

/// An immutable record of an administrative action.
///
/// Draws, publication, resets, result corrections, room-type allocations
/// and selection overrides each produce exactly one audit event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuditEvent {
    /// The actor who initiated this state change.
    pub actor: Actor,
    /// The action that was performed.
    pub action: Action,
    /// The state before the transition.
    pub before: StateSnapshot,
    /// The state after the transition.
    pub after: StateSnapshot,
}

impl AuditEvent {
    /// Creates a new `AuditEvent`.
    ///
    /// # Arguments
    ///
    /// * `actor` - The actor who initiated the change
    /// * `action` - The action that was performed
    /// * `before` - The state before the transition
    /// * `after` - The state after the transition
    #[must_use]
    pub const fn new(
        actor: Actor,
        action: Action,
        before: StateSnapshot,
        after: StateSnapshot,
    ) -> Self {
        Self {
            actor,
            action,
            before,
            after,
        }
    }
}

/// Tag of an allocation history row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HistoryAction {
    /// A bed was claimed.
    Assigned,
    /// A held selection changed (swap, reassignment, confirmation).
    Modified,
    /// A selection was released or revoked.
    Removed,
}

impl HistoryAction {
    /// Returns the string representation used in storage.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Assigned => "assigned",
            Self::Modified => "modified",
            Self::Removed => "removed",
        }
    }
}

impl FromStr for HistoryAction {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "assigned" => Ok(Self::Assigned),
            "modified" => Ok(Self::Modified),
            "removed" => Ok(Self::Removed),
            _ => Err(DomainError::InvalidHistoryAction(s.to_string())),
        }
    }
}

impl std::fmt::Display for HistoryAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One append-only allocation history row, before it is stored.
///
/// Every successful bed selection operation produces exactly one entry;
/// rejected operations produce none.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryEntry {
    /// The student whose allocation changed.
    pub student_id: i64,
    /// Room of the bed the entry refers to.
    pub room_id: i64,
    /// The bed the entry refers to (the new bed for moves).
    pub bed_id: i64,
    /// What happened.
    pub action: HistoryAction,
    /// Who did it.
    pub actor: Actor,
    /// Free-form notes.
    pub notes: Option<String>,
}

impl HistoryEntry {
    /// Creates a new `HistoryEntry`.
    #[must_use]
    pub const fn new(
        student_id: i64,
        room_id: i64,
        bed_id: i64,
        action: HistoryAction,
        actor: Actor,
        notes: Option<String>,
    ) -> Self {
        Self {
            student_id,
            room_id,
            bed_id,
            action,
            actor,
            notes,
        }
    }
}

/// A stored history row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedHistoryEntry {
    /// Database identifier, increasing with insertion order.
    pub history_id: i64,
    /// The entry as written.
    pub entry: HistoryEntry,
    /// RFC 3339 timestamp.
    pub recorded_at: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_actor_creation_requires_all_fields() {
        let actor: Actor = Actor::new(12, ActorRole::Student);

        assert_eq!(actor.id, 12);
        assert_eq!(actor.role, ActorRole::Student);
        assert!(!actor.is_admin());
        assert!(Actor::new(1, ActorRole::Admin).is_admin());
    }

    #[test]
    fn test_actor_role_round_trip() {
        assert_eq!("admin".parse::<ActorRole>(), Ok(ActorRole::Admin));
        assert_eq!("student".parse::<ActorRole>(), Ok(ActorRole::Student));
        assert!("operator".parse::<ActorRole>().is_err());
    }

    #[test]
    fn test_action_creation_with_details() {
        let action: Action = Action::new(
            String::from("PublishLottery"),
            Some(String::from("Published event 3")),
        );

        assert_eq!(action.name, "PublishLottery");
        assert_eq!(action.details, Some(String::from("Published event 3")));
    }

    #[test]
    fn test_audit_event_creation_requires_all_fields() {
        let actor: Actor = Actor::new(1, ActorRole::Admin);
        let action: Action = Action::new(String::from("ResetLottery"), None);
        let before: StateSnapshot = StateSnapshot::new(String::from("results=10"));
        let after: StateSnapshot = StateSnapshot::new(String::from("results=0"));

        let event: AuditEvent =
            AuditEvent::new(actor.clone(), action.clone(), before.clone(), after.clone());

        assert_eq!(event.actor, actor);
        assert_eq!(event.action, action);
        assert_eq!(event.before, before);
        assert_eq!(event.after, after);
    }

    #[test]
    fn test_history_action_tags() {
        assert_eq!(HistoryAction::Assigned.as_str(), "assigned");
        assert_eq!(HistoryAction::Modified.as_str(), "modified");
        assert_eq!(HistoryAction::Removed.as_str(), "removed");
        assert_eq!(
            "removed".parse::<HistoryAction>(),
            Ok(HistoryAction::Removed)
        );
        assert_eq!(
            "cancelled".parse::<HistoryAction>(),
            Err(DomainError::InvalidHistoryAction(String::from("cancelled")))
        );
    }

    #[test]
    fn test_history_entry_carries_actor() {
        let entry: HistoryEntry = HistoryEntry::new(
            5,
            2,
            9,
            HistoryAction::Assigned,
            Actor::new(5, ActorRole::Student),
            None,
        );

        assert_eq!(entry.student_id, 5);
        assert_eq!(entry.bed_id, 9);
        assert_eq!(entry.actor.role, ActorRole::Student);
    }
}
