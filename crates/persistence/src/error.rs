// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

/// Errors that can occur during persistence operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PersistenceError {
    /// A database error occurred.
    DatabaseError(String),
    /// Database connection failed.
    DatabaseConnectionFailed(String),
    /// Database migration failed.
    MigrationFailed(String),
    /// Query execution failed.
    QueryFailed(String),
    /// Initialization error.
    InitializationError(String),
    /// Foreign key enforcement is not enabled.
    ForeignKeyEnforcementNotEnabled,
    /// The requested resource was not found.
    NotFound(String),
    /// The requested student was not found.
    StudentNotFound(i64),
    /// The requested building was not found.
    BuildingNotFound(i64),
    /// The requested room was not found.
    RoomNotFound(i64),
    /// The requested lottery event was not found.
    EventNotFound(i64),
    /// No lottery result exists for this student in this event.
    ResultNotFound { event_id: i64, student_id: i64 },
    /// The event already has results.
    AlreadyDrawn(i64),
    /// The event is published and its results are frozen.
    AlreadyPublished(i64),
    /// Another result in the event already uses this draw number.
    DuplicateDrawNumber { event_id: i64, draw_number: u32 },
    /// Publishing would change the room type of a student holding a bed.
    HeldBedTypeConflict {
        event_id: i64,
        student_id: i64,
        bed_id: i64,
    },
    /// The room still has live selections, occupied beds or history.
    RoomInUse(i64),
    /// The requested capacity is below the number of occupied beds.
    CapacityBelowOccupancy {
        room_id: i64,
        capacity: u32,
        occupancy: i64,
    },
    /// The event still has results; reset it first.
    EventHasResults(i64),
    /// The building still owns rooms.
    BuildingNotEmpty(i64),
    /// The building already has a room with this number.
    DuplicateRoom { building_id: i64, room_number: String },
    /// Another building already uses this name.
    DuplicateBuilding(String),
    /// The username is already registered.
    DuplicateUsername(String),
    /// Stored rows contradict each other.
    IntegrityViolation(String),
    /// Serialization/deserialization error.
    SerializationError(String),
    /// A stored column holds a value the domain rejects.
    InvalidStoredValue(String),
    /// A general error occurred.
    Other(String),
}

impl std::fmt::Display for PersistenceError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::DatabaseError(msg) => write!(f, "Database error: {msg}"),
            Self::DatabaseConnectionFailed(msg) => {
                write!(f, "Database connection failed: {msg}")
            }
            Self::MigrationFailed(msg) => write!(f, "Migration failed: {msg}"),
            Self::QueryFailed(msg) => write!(f, "Query failed: {msg}"),
            Self::InitializationError(msg) => write!(f, "Initialization error: {msg}"),
            Self::ForeignKeyEnforcementNotEnabled => {
                write!(f, "Foreign key enforcement is not enabled")
            }
            Self::NotFound(msg) => write!(f, "Not found: {msg}"),
            Self::StudentNotFound(id) => write!(f, "Student not found: {id}"),
            Self::BuildingNotFound(id) => write!(f, "Building not found: {id}"),
            Self::RoomNotFound(id) => write!(f, "Room not found: {id}"),
            Self::EventNotFound(id) => write!(f, "Lottery event not found: {id}"),
            Self::ResultNotFound {
                event_id,
                student_id,
            } => write!(
                f,
                "No lottery result for student {student_id} in event {event_id}"
            ),
            Self::AlreadyDrawn(id) => write!(f, "Lottery event {id} has already been drawn"),
            Self::AlreadyPublished(id) => {
                write!(f, "Lottery event {id} is already published")
            }
            Self::DuplicateDrawNumber {
                event_id,
                draw_number,
            } => write!(
                f,
                "Draw number {draw_number} is already used in lottery event {event_id}"
            ),
            Self::HeldBedTypeConflict {
                event_id,
                student_id,
                bed_id,
            } => write!(
                f,
                "Publishing lottery event {event_id} would change the room type of student {student_id}, who holds bed {bed_id}"
            ),
            Self::RoomInUse(id) => write!(
                f,
                "Room {id} cannot be deleted: it has occupied beds, selections or history"
            ),
            Self::CapacityBelowOccupancy {
                room_id,
                capacity,
                occupancy,
            } => write!(
                f,
                "Room {room_id} cannot shrink to {capacity} beds: {occupancy} are occupied"
            ),
            Self::EventHasResults(id) => write!(
                f,
                "Lottery event {id} cannot be deleted: it still has results"
            ),
            Self::BuildingNotEmpty(id) => {
                write!(f, "Building {id} cannot be deleted: it still has rooms")
            }
            Self::DuplicateRoom {
                building_id,
                room_number,
            } => write!(
                f,
                "Building {building_id} already has a room numbered '{room_number}'"
            ),
            Self::DuplicateBuilding(name) => write!(f, "Building '{name}' already exists"),
            Self::DuplicateUsername(name) => write!(f, "Username '{name}' is already taken"),
            Self::IntegrityViolation(msg) => write!(f, "Integrity violation: {msg}"),
            Self::SerializationError(msg) => write!(f, "Serialization error: {msg}"),
            Self::InvalidStoredValue(msg) => write!(f, "Invalid stored value: {msg}"),
            Self::Other(msg) => write!(f, "{msg}"),
        }
    }
}

impl std::error::Error for PersistenceError {}

impl From<diesel::result::Error> for PersistenceError {
    fn from(err: diesel::result::Error) -> Self {
        match err {
            diesel::result::Error::NotFound => Self::NotFound("Record not found".to_string()),
            _ => Self::DatabaseError(err.to_string()),
        }
    }
}

impl From<diesel::ConnectionError> for PersistenceError {
    fn from(err: diesel::ConnectionError) -> Self {
        Self::DatabaseConnectionFailed(err.to_string())
    }
}

impl From<serde_json::Error> for PersistenceError {
    fn from(err: serde_json::Error) -> Self {
        Self::SerializationError(err.to_string())
    }
}

impl From<dorm_lottery_domain::DomainError> for PersistenceError {
    fn from(err: dorm_lottery_domain::DomainError) -> Self {
        Self::InvalidStoredValue(err.to_string())
    }
}

/// Returns true if the error is a violated UNIQUE constraint.
pub(crate) const fn is_unique_violation(err: &diesel::result::Error) -> bool {
    matches!(
        err,
        diesel::result::Error::DatabaseError(
            diesel::result::DatabaseErrorKind::UniqueViolation,
            _
        )
    )
}
