// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Audit event queries.

use diesel::SqliteConnection;
use diesel::prelude::*;
use dorm_lottery_audit::{Action, Actor, ActorRole, AuditEvent, StateSnapshot};

use crate::data_models::{ActionData, ActorData, StateSnapshotData, StoredAuditEvent};
use crate::diesel_schema::audit_events;
use crate::error::PersistenceError;

#[derive(Queryable, Selectable)]
#[diesel(table_name = audit_events)]
struct AuditEventRow {
    event_id: i64,
    actor_json: String,
    action_json: String,
    before_snapshot_json: String,
    after_snapshot_json: String,
    created_at: String,
}

impl TryFrom<AuditEventRow> for StoredAuditEvent {
    type Error = PersistenceError;

    fn try_from(row: AuditEventRow) -> Result<Self, Self::Error> {
        let actor_data: ActorData = serde_json::from_str(&row.actor_json)?;
        let action_data: ActionData = serde_json::from_str(&row.action_json)?;
        let before_data: StateSnapshotData = serde_json::from_str(&row.before_snapshot_json)?;
        let after_data: StateSnapshotData = serde_json::from_str(&row.after_snapshot_json)?;

        let role: ActorRole = actor_data
            .role
            .parse()
            .map_err(PersistenceError::InvalidStoredValue)?;

        Ok(Self {
            event_id: row.event_id,
            event: AuditEvent::new(
                Actor::new(actor_data.id, role),
                Action::new(action_data.name, action_data.details),
                StateSnapshot::new(before_data.data),
                StateSnapshot::new(after_data.data),
            ),
            created_at: row.created_at,
        })
    }
}

/// Lists audit events in the order they were written.
///
/// # Arguments
///
/// * `conn` - The database connection
/// * `action_name` - Only return events with this action name, if given
///
/// # Errors
///
/// Returns an error if the database query fails or a payload cannot be
/// deserialized.
pub fn list_audit_events(
    conn: &mut SqliteConnection,
    action_name: Option<&str>,
) -> Result<Vec<StoredAuditEvent>, PersistenceError> {
    let rows: Vec<AuditEventRow> = audit_events::table
        .order(audit_events::event_id.asc())
        .select(AuditEventRow::as_select())
        .load(conn)
        .map_err(|e| PersistenceError::QueryFailed(format!("list_audit_events: {e}")))?;

    let events: Vec<StoredAuditEvent> = rows
        .into_iter()
        .map(StoredAuditEvent::try_from)
        .collect::<Result<_, _>>()?;

    Ok(match action_name {
        Some(name) => events
            .into_iter()
            .filter(|stored| stored.event.action.name == name)
            .collect(),
        None => events,
    })
}
