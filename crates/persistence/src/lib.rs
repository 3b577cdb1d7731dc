// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Persistence layer for the dormitory lottery and bed selection system.
//!
//! This crate stores students, room inventory, lottery events and results,
//! room-type allocations, live bed selections, the append-only allocation
//! history and the administrative audit ledger. It is built on Diesel with
//! the `SQLite` backend.
//!
//! ## Atomicity
//!
//! Every operation that writes more than one row runs inside a single
//! Diesel transaction. Draws are all-or-nothing, and a bed selection change
//! commits together with its occupancy recomputation, history row and audit
//! event, or not at all.
//!
//! ## Integrity
//!
//! - Foreign keys are enforced and never cascade
//! - `bed_selections` is unique on both student and bed
//! - `allocation_history` rejects updates and deletes via triggers
//! - `rooms.current_occupancy` is only ever written as a recomputed count
//!
//! ## Testing
//!
//! Tests run against fresh shared-cache in-memory databases created with
//! [`Persistence::new_in_memory`].

#![deny(
    clippy::pedantic,
    clippy::cargo,
    clippy::nursery,
    clippy::style,
    clippy::correctness,
    clippy::all,
    clippy::suspicious,
    clippy::complexity,
    clippy::perf,
    clippy::unwrap_used,
    clippy::expect_used
)]
#![allow(clippy::multiple_crate_versions)]

use diesel::SqliteConnection;
use dorm_lottery::{AllocationState, BedTarget, RoomTypeAssignment, TransitionResult};
use dorm_lottery_audit::{AuditEvent, RecordedHistoryEntry};
use dorm_lottery_domain::{
    Bed, BedSelection, Building, Composition, DrawAssignment, LotteryEvent, LotteryResult, Room,
    RoomType, RoomTypeAllocation, Student,
};
use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};

mod backend;
mod data_models;
mod diesel_schema;
mod error;
mod mutations;
mod queries;

#[cfg(test)]
mod tests;

pub use data_models::{
    AvailableBed, BedDiscrepancy, IntegrityReport, RoomChanges, RoomDiscrepancy, StoredAuditEvent,
};
pub use error::PersistenceError;

/// Atomic counter for generating unique in-memory database names.
///
/// Each call to `new_in_memory()` receives a unique sequential ID so tests
/// never share a database.
static DB_COUNTER: AtomicU64 = AtomicU64::new(0);

/// Persistence adapter over one `SQLite` connection.
///
/// The adapter is not shared between threads directly; callers that need
/// concurrent access wrap it in a mutex.
pub struct Persistence {
    pub(crate) conn: SqliteConnection,
}

impl Persistence {
    /// Creates a new persistence adapter with an in-memory `SQLite` database.
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be initialized.
    pub fn new_in_memory() -> Result<Self, PersistenceError> {
        let db_id: u64 = DB_COUNTER.fetch_add(1, Ordering::SeqCst);
        let shared_memory_url: String = format!("file:memdb_test_{db_id}?mode=memory&cache=shared");

        let mut conn: SqliteConnection = backend::sqlite::initialize_database(&shared_memory_url)?;
        backend::sqlite::verify_foreign_key_enforcement(&mut conn)?;

        Ok(Self { conn })
    }

    /// Creates a new persistence adapter with a file-based `SQLite` database.
    ///
    /// # Arguments
    ///
    /// * `path` - The path to the `SQLite` database file
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be opened or initialized.
    pub fn new_with_file<P: AsRef<Path>>(path: P) -> Result<Self, PersistenceError> {
        let path_str: &str = path.as_ref().to_str().ok_or_else(|| {
            PersistenceError::InitializationError("Invalid database path".to_string())
        })?;

        let mut conn: SqliteConnection = backend::sqlite::initialize_database(path_str)?;
        backend::sqlite::enable_wal_mode(&mut conn)?;
        backend::sqlite::verify_foreign_key_enforcement(&mut conn)?;

        Ok(Self { conn })
    }

    /// Verifies that foreign key enforcement is enabled on this connection.
    ///
    /// # Errors
    ///
    /// Returns an error if foreign key enforcement is not enabled.
    pub fn verify_foreign_key_enforcement(&mut self) -> Result<(), PersistenceError> {
        backend::sqlite::verify_foreign_key_enforcement(&mut self.conn)
    }

    // ========================================================================
    // Students
    // ========================================================================

    /// Registers a student or administrator account.
    ///
    /// # Errors
    ///
    /// Returns `DuplicateUsername` if the username is taken.
    pub fn create_student(
        &mut self,
        username: &str,
        full_name: &str,
        is_admin: bool,
    ) -> Result<Student, PersistenceError> {
        mutations::inventory::create_student(&mut self.conn, username, full_name, is_admin)
    }

    /// Retrieves a student by ID.
    ///
    /// # Errors
    ///
    /// Returns `StudentNotFound` if the student does not exist.
    pub fn get_student(&mut self, student_id: i64) -> Result<Student, PersistenceError> {
        queries::inventory::find_student(&mut self.conn, student_id)?
            .ok_or(PersistenceError::StudentNotFound(student_id))
    }

    /// Retrieves a student by ID, returning `None` if absent.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub fn find_student(&mut self, student_id: i64) -> Result<Option<Student>, PersistenceError> {
        queries::inventory::find_student(&mut self.conn, student_id)
    }

    /// Retrieves a student by username.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub fn find_student_by_username(
        &mut self,
        username: &str,
    ) -> Result<Option<Student>, PersistenceError> {
        queries::inventory::find_student_by_username(&mut self.conn, username)
    }

    /// Lists every account ordered by ID.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub fn list_students(&mut self) -> Result<Vec<Student>, PersistenceError> {
        queries::inventory::list_students(&mut self.conn)
    }

    /// Counts administrator accounts.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub fn count_admins(&mut self) -> Result<i64, PersistenceError> {
        queries::inventory::count_admins(&mut self.conn)
    }

    // ========================================================================
    // Inventory
    // ========================================================================

    /// Creates a building.
    ///
    /// # Errors
    ///
    /// Returns `DuplicateBuilding` if the name is taken.
    pub fn create_building(&mut self, name: &str) -> Result<Building, PersistenceError> {
        mutations::inventory::create_building(&mut self.conn, name)
    }

    /// Lists buildings ordered by name.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub fn list_buildings(&mut self) -> Result<Vec<Building>, PersistenceError> {
        queries::inventory::list_buildings(&mut self.conn)
    }

    /// Deletes a building that owns no rooms.
    ///
    /// # Errors
    ///
    /// Returns `BuildingNotFound` or `BuildingNotEmpty`.
    pub fn delete_building(&mut self, building_id: i64) -> Result<(), PersistenceError> {
        mutations::inventory::delete_building(&mut self.conn, building_id)
    }

    /// Creates a room with beds numbered `1..=capacity`.
    ///
    /// # Errors
    ///
    /// Returns `BuildingNotFound` or `DuplicateRoom`.
    pub fn create_room(
        &mut self,
        building_id: i64,
        room_number: &str,
        room_type: &RoomType,
        capacity: u32,
    ) -> Result<Room, PersistenceError> {
        mutations::inventory::create_room(
            &mut self.conn,
            building_id,
            room_number,
            room_type,
            capacity,
        )
    }

    /// Retrieves a room by ID.
    ///
    /// # Errors
    ///
    /// Returns `RoomNotFound` if the room does not exist.
    pub fn get_room(&mut self, room_id: i64) -> Result<Room, PersistenceError> {
        queries::inventory::get_room(&mut self.conn, room_id)
    }

    /// Lists rooms, optionally restricted to one building.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub fn list_rooms(&mut self, building_id: Option<i64>) -> Result<Vec<Room>, PersistenceError> {
        queries::inventory::list_rooms(&mut self.conn, building_id)
    }

    /// Lists a room's beds ordered by number.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub fn list_beds(&mut self, room_id: i64) -> Result<Vec<Bed>, PersistenceError> {
        queries::inventory::list_beds(&mut self.conn, room_id)
    }

    /// Marks a room available or unavailable.
    ///
    /// # Errors
    ///
    /// Returns `RoomNotFound` if the room does not exist.
    pub fn set_room_availability(
        &mut self,
        room_id: i64,
        is_available: bool,
    ) -> Result<Room, PersistenceError> {
        mutations::inventory::set_room_availability(&mut self.conn, room_id, is_available)
    }

    /// Edits a room's type, capacity or availability.
    ///
    /// # Errors
    ///
    /// Returns `RoomNotFound`, `CapacityBelowOccupancy` or `RoomInUse`.
    pub fn update_room(
        &mut self,
        room_id: i64,
        changes: &RoomChanges,
    ) -> Result<Room, PersistenceError> {
        mutations::inventory::update_room(&mut self.conn, room_id, changes)
    }

    /// Deletes an unused room and its beds.
    ///
    /// # Errors
    ///
    /// Returns `RoomNotFound` or `RoomInUse`.
    pub fn delete_room(&mut self, room_id: i64) -> Result<(), PersistenceError> {
        mutations::inventory::delete_room(&mut self.conn, room_id)
    }

    /// Lists unoccupied beds in available rooms of a type.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub fn list_free_beds(
        &mut self,
        room_type: &RoomType,
    ) -> Result<Vec<AvailableBed>, PersistenceError> {
        queries::inventory::list_free_beds(&mut self.conn, room_type)
    }

    // ========================================================================
    // Lottery
    // ========================================================================

    /// Creates an unpublished lottery event and its audit record.
    ///
    /// # Errors
    ///
    /// Returns an error if the insert fails.
    pub fn create_lottery_event(
        &mut self,
        name: &str,
        scheduled_at: &str,
        composition: &Composition,
        created_by: i64,
        audit_event: &AuditEvent,
    ) -> Result<LotteryEvent, PersistenceError> {
        mutations::lottery::create_lottery_event(
            &mut self.conn,
            name,
            scheduled_at,
            composition,
            created_by,
            audit_event,
        )
    }

    /// Retrieves a lottery event.
    ///
    /// # Errors
    ///
    /// Returns `EventNotFound` if the event does not exist.
    pub fn get_lottery_event(&mut self, event_id: i64) -> Result<LotteryEvent, PersistenceError> {
        queries::lottery::get_lottery_event(&mut self.conn, event_id)
    }

    /// Lists lottery events, newest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub fn list_lottery_events(&mut self) -> Result<Vec<LotteryEvent>, PersistenceError> {
        queries::lottery::list_lottery_events(&mut self.conn)
    }

    /// Lists non-administrator students without a result in the event.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub fn list_draw_candidates(&mut self, event_id: i64) -> Result<Vec<i64>, PersistenceError> {
        queries::lottery::list_draw_candidates(&mut self.conn, event_id)
    }

    /// Stores a draw atomically.
    ///
    /// # Errors
    ///
    /// Returns `EventNotFound`, `AlreadyPublished` or `AlreadyDrawn`.
    pub fn persist_draw(
        &mut self,
        event_id: i64,
        composition: &Composition,
        assignments: &[DrawAssignment],
        audit_event: &AuditEvent,
    ) -> Result<(), PersistenceError> {
        mutations::lottery::persist_draw(
            &mut self.conn,
            event_id,
            composition,
            assignments,
            audit_event,
        )
    }

    /// Publishes an event.
    ///
    /// # Errors
    ///
    /// Returns `EventNotFound`, `AlreadyPublished` or `HeldBedTypeConflict`.
    pub fn publish_lottery(
        &mut self,
        event_id: i64,
        audit_event: &AuditEvent,
    ) -> Result<(), PersistenceError> {
        mutations::lottery::publish_lottery(&mut self.conn, event_id, audit_event)
    }

    /// Deletes every result of an unpublished event.
    ///
    /// # Errors
    ///
    /// Returns `EventNotFound` or `AlreadyPublished`.
    pub fn reset_lottery(
        &mut self,
        event_id: i64,
        audit_event: &AuditEvent,
    ) -> Result<usize, PersistenceError> {
        mutations::lottery::reset_lottery(&mut self.conn, event_id, audit_event)
    }

    /// Deletes an unpublished event without results.
    ///
    /// # Errors
    ///
    /// Returns `EventNotFound`, `AlreadyPublished` or `EventHasResults`.
    pub fn delete_lottery_event(
        &mut self,
        event_id: i64,
        audit_event: &AuditEvent,
    ) -> Result<(), PersistenceError> {
        mutations::lottery::delete_lottery_event(&mut self.conn, event_id, audit_event)
    }

    /// Retrieves one student's result in an event.
    ///
    /// # Errors
    ///
    /// Returns `ResultNotFound` if there is none.
    pub fn get_lottery_result(
        &mut self,
        event_id: i64,
        student_id: i64,
    ) -> Result<LotteryResult, PersistenceError> {
        queries::lottery::get_lottery_result(&mut self.conn, event_id, student_id)
    }

    /// Overwrites one result of an unpublished event.
    ///
    /// # Errors
    ///
    /// Returns `EventNotFound`, `AlreadyPublished`, `ResultNotFound` or
    /// `DuplicateDrawNumber`.
    pub fn update_lottery_result(
        &mut self,
        corrected: &LotteryResult,
        audit_event: &AuditEvent,
    ) -> Result<(), PersistenceError> {
        mutations::lottery::update_lottery_result(&mut self.conn, corrected, audit_event)
    }

    /// Lists an event's results ordered by draw number.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub fn list_lottery_results(
        &mut self,
        event_id: i64,
    ) -> Result<Vec<LotteryResult>, PersistenceError> {
        queries::lottery::list_lottery_results(&mut self.conn, event_id)
    }

    // ========================================================================
    // Allocation ledger
    // ========================================================================

    /// Loads a student's allocation state, or `None` if the student is unknown.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub fn load_allocation_state(
        &mut self,
        student_id: i64,
    ) -> Result<Option<AllocationState>, PersistenceError> {
        queries::allocation::load_allocation_state(&mut self.conn, student_id)
    }

    /// Loads a bed with its room and holder, or `None` if the bed is unknown.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub fn load_bed_target(&mut self, bed_id: i64) -> Result<Option<BedTarget>, PersistenceError> {
        queries::allocation::load_bed_target(&mut self.conn, bed_id)
    }

    /// Resolves a student's effective room type.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub fn find_effective_room_type(
        &mut self,
        student_id: i64,
    ) -> Result<Option<RoomTypeAssignment>, PersistenceError> {
        queries::allocation::find_effective_room_type(&mut self.conn, student_id)
    }

    /// Retrieves a student's manual room-type allocation.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub fn find_room_type_allocation(
        &mut self,
        student_id: i64,
    ) -> Result<Option<RoomTypeAllocation>, PersistenceError> {
        queries::allocation::find_room_type_allocation(&mut self.conn, student_id)
    }

    /// Retrieves a student's live selection.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub fn current_selection(
        &mut self,
        student_id: i64,
    ) -> Result<Option<BedSelection>, PersistenceError> {
        queries::allocation::find_selection_for_student(&mut self.conn, student_id)
    }

    /// Lists every live selection ordered by bed.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub fn list_selections(&mut self) -> Result<Vec<BedSelection>, PersistenceError> {
        queries::allocation::list_selections(&mut self.conn)
    }

    /// Lists students who hold no bed.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub fn list_students_without_selection(&mut self) -> Result<Vec<Student>, PersistenceError> {
        queries::allocation::list_students_without_selection(&mut self.conn)
    }

    /// Lists students with no effective room type.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub fn list_students_without_room_type(&mut self) -> Result<Vec<Student>, PersistenceError> {
        queries::allocation::list_students_without_room_type(&mut self.conn)
    }

    /// Writes a transition atomically.
    ///
    /// # Returns
    ///
    /// The student's live selection after the write.
    ///
    /// # Errors
    ///
    /// Returns `IntegrityViolation` if storage no longer matches the state
    /// the transition was computed from.
    pub fn persist_transition(
        &mut self,
        result: &TransitionResult,
    ) -> Result<Option<BedSelection>, PersistenceError> {
        mutations::allocation::persist_transition(&mut self.conn, result)
    }

    /// Lists a student's allocation history, oldest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub fn get_allocation_history(
        &mut self,
        student_id: i64,
    ) -> Result<Vec<RecordedHistoryEntry>, PersistenceError> {
        queries::allocation::list_history_for_student(&mut self.conn, student_id)
    }

    /// Counts every allocation history row.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub fn count_allocation_history(&mut self) -> Result<i64, PersistenceError> {
        queries::allocation::count_history(&mut self.conn)
    }

    // ========================================================================
    // Audit and integrity
    // ========================================================================

    /// Lists audit events, optionally filtered by action name.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub fn list_audit_events(
        &mut self,
        action_name: Option<&str>,
    ) -> Result<Vec<StoredAuditEvent>, PersistenceError> {
        queries::audit::list_audit_events(&mut self.conn, action_name)
    }

    /// Scans occupancy counters for disagreement. Never writes.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub fn check_integrity(&mut self) -> Result<IntegrityReport, PersistenceError> {
        queries::integrity::check_integrity(&mut self.conn)
    }
}
