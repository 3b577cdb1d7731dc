// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! API request and response data transfer objects.
//!
//! Requests carry raw caller input and are validated by the handlers.
//! Responses are serializable so outer layers can render them as JSON.

use dorm_lottery::{AllocationState, RoomTypeSource};
use dorm_lottery_audit::RecordedHistoryEntry;
use dorm_lottery_domain::{
    Bed, BedSelection, BucketCount, BucketSpec, Building, Composition, DomainError, LotteryEvent,
    LotteryResult, Room, RoomType, Student,
};
use dorm_lottery_persistence::{
    AvailableBed, BedDiscrepancy, IntegrityReport, RoomDiscrepancy, StoredAuditEvent,
};

// ============================================================================
// Students and inventory
// ============================================================================

/// API request to register an account.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegisterStudentRequest {
    /// Unique login handle.
    pub username: String,
    /// Display name.
    pub full_name: String,
}

/// A registered account.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct StudentInfo {
    pub student_id: i64,
    pub username: String,
    pub full_name: String,
    pub is_admin: bool,
}

impl From<Student> for StudentInfo {
    fn from(student: Student) -> Self {
        Self {
            student_id: student.student_id,
            username: student.username,
            full_name: student.full_name,
            is_admin: student.is_admin,
        }
    }
}

/// API request to create a building.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateBuildingRequest {
    /// Unique building name.
    pub name: String,
}

/// A building.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct BuildingInfo {
    pub building_id: i64,
    pub name: String,
}

impl From<Building> for BuildingInfo {
    fn from(building: Building) -> Self {
        Self {
            building_id: building.building_id,
            name: building.name,
        }
    }
}

/// API request to create a room and its beds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateRoomRequest {
    /// The owning building.
    pub building_id: i64,
    /// Room number, unique within the building.
    pub room_number: String,
    /// Room type label.
    pub room_type: String,
    /// Number of beds.
    pub capacity: u32,
}

/// API request to open or close a room for selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SetRoomAvailabilityRequest {
    pub room_id: i64,
    pub is_available: bool,
}

/// API request to edit a room. Absent fields are left unchanged.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UpdateRoomRequest {
    pub room_id: i64,
    pub room_type: Option<String>,
    /// New bed count; beds are added or removed from the end.
    pub capacity: Option<u32>,
    pub is_available: Option<bool>,
}

/// A room with its occupancy.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct RoomInfo {
    pub room_id: i64,
    pub building_id: i64,
    pub room_number: String,
    pub room_type: String,
    pub max_capacity: u32,
    pub current_occupancy: u32,
    pub is_available: bool,
}

impl From<Room> for RoomInfo {
    fn from(room: Room) -> Self {
        Self {
            room_id: room.room_id,
            building_id: room.building_id,
            room_number: room.room_number,
            room_type: room.room_type.to_string(),
            max_capacity: room.max_capacity,
            current_occupancy: room.current_occupancy,
            is_available: room.is_available,
        }
    }
}

/// One bed of a room.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct BedInfo {
    pub bed_id: i64,
    pub bed_number: u32,
    pub is_occupied: bool,
}

impl From<Bed> for BedInfo {
    fn from(bed: Bed) -> Self {
        Self {
            bed_id: bed.bed_id,
            bed_number: bed.bed_number,
            is_occupied: bed.is_occupied,
        }
    }
}

/// API response describing one room and its beds.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct RoomDetailResponse {
    pub room: RoomInfo,
    pub beds: Vec<BedInfo>,
}

/// A bed free for selection.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct FreeBedInfo {
    pub bed_id: i64,
    pub bed_number: u32,
    pub room_id: i64,
    pub room_number: String,
    pub building_id: i64,
}

impl From<AvailableBed> for FreeBedInfo {
    fn from(available: AvailableBed) -> Self {
        Self {
            bed_id: available.bed.bed_id,
            bed_number: available.bed.bed_number,
            room_id: available.room.room_id,
            room_number: available.room.room_number,
            building_id: available.room.building_id,
        }
    }
}

/// API response listing free beds of one room type.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct ListFreeBedsResponse {
    pub room_type: String,
    pub beds: Vec<FreeBedInfo>,
}

// ============================================================================
// Lottery
// ============================================================================

/// One bucket of a requested composition.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct BucketRequest {
    pub room_type: String,
    pub group_count: u32,
    pub group_size: u32,
}

/// A requested lottery composition, as raw caller input.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CompositionRequest {
    /// One room type for everybody, in groups of `group_size`.
    Uniform { room_type: String, group_size: u32 },
    /// Ordered buckets.
    Buckets { buckets: Vec<BucketRequest> },
}

impl CompositionRequest {
    /// Parses the room type labels into a domain composition.
    ///
    /// Counts and sizes are checked separately by composition validation.
    ///
    /// # Errors
    ///
    /// Returns `InvalidRoomType` if any label is malformed.
    pub fn to_composition(&self) -> Result<Composition, DomainError> {
        match self {
            Self::Uniform {
                room_type,
                group_size,
            } => Ok(Composition::Uniform {
                room_type: RoomType::new(room_type)?,
                group_size: *group_size,
            }),
            Self::Buckets { buckets } => Ok(Composition::Buckets {
                buckets: buckets
                    .iter()
                    .map(|b| {
                        Ok(BucketSpec {
                            room_type: RoomType::new(&b.room_type)?,
                            group_count: b.group_count,
                            group_size: b.group_size,
                        })
                    })
                    .collect::<Result<Vec<BucketSpec>, DomainError>>()?,
            }),
        }
    }
}

impl From<&Composition> for CompositionRequest {
    fn from(composition: &Composition) -> Self {
        match composition {
            Composition::Uniform {
                room_type,
                group_size,
            } => Self::Uniform {
                room_type: room_type.to_string(),
                group_size: *group_size,
            },
            Composition::Buckets { buckets } => Self::Buckets {
                buckets: buckets
                    .iter()
                    .map(|b| BucketRequest {
                        room_type: b.room_type.to_string(),
                        group_count: b.group_count,
                        group_size: b.group_size,
                    })
                    .collect(),
            },
        }
    }
}

/// API request to create a lottery event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateLotteryEventRequest {
    pub name: String,
    /// RFC 3339 timestamp.
    pub scheduled_at: String,
    pub composition: CompositionRequest,
}

/// A lottery event.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct LotteryEventInfo {
    pub event_id: i64,
    pub name: String,
    pub scheduled_at: String,
    pub composition: CompositionRequest,
    pub is_published: bool,
}

impl From<&LotteryEvent> for LotteryEventInfo {
    fn from(event: &LotteryEvent) -> Self {
        Self {
            event_id: event.event_id,
            name: event.name.clone(),
            scheduled_at: event.scheduled_at.clone(),
            composition: CompositionRequest::from(&event.composition),
            is_published: event.is_published,
        }
    }
}

/// API request to draw an event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunLotteryDrawRequest {
    pub event_id: i64,
    /// Replaces the event's stored composition for this draw when present.
    pub composition: Option<CompositionRequest>,
}

/// One student's lottery outcome.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct LotteryResultInfo {
    pub event_id: i64,
    pub student_id: i64,
    pub draw_number: u32,
    pub group_label: String,
    pub room_type: Option<String>,
}

impl From<LotteryResult> for LotteryResultInfo {
    fn from(result: LotteryResult) -> Self {
        Self {
            event_id: result.event_id,
            student_id: result.student_id,
            draw_number: result.draw_number,
            group_label: result.group_label,
            room_type: result.room_type.map(|t| t.to_string()),
        }
    }
}

/// How many students a draw placed in one group.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct BucketCountInfo {
    pub group_label: String,
    pub room_type: String,
    pub assigned: u32,
}

impl From<BucketCount> for BucketCountInfo {
    fn from(count: BucketCount) -> Self {
        Self {
            group_label: count.group_label,
            room_type: count.room_type.to_string(),
            assigned: count.assigned,
        }
    }
}

/// API response for a completed draw.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct RunLotteryDrawResponse {
    pub event_id: i64,
    /// Results in draw order.
    pub results: Vec<LotteryResultInfo>,
    /// Group sizes in fill order.
    pub bucket_counts: Vec<BucketCountInfo>,
}

/// API response for publish and reset.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct LotteryEventUpdateResponse {
    pub event_id: i64,
    /// Results affected by the update.
    pub results_affected: usize,
    pub message: String,
}

/// API request to correct a single unpublished result.
///
/// Fields left `None` keep their current value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CorrectLotteryResultRequest {
    pub event_id: i64,
    pub student_id: i64,
    pub draw_number: Option<u32>,
    pub group_label: Option<String>,
    pub room_type: Option<String>,
}

/// API response listing an event's results.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct ListLotteryResultsResponse {
    pub event: LotteryEventInfo,
    pub results: Vec<LotteryResultInfo>,
}

// ============================================================================
// Allocation
// ============================================================================

/// API request to assign a room type outside the lottery.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SetRoomTypeAllocationRequest {
    pub student_id: i64,
    pub room_type: String,
    pub notes: Option<String>,
}

/// A live bed selection.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct SelectionInfo {
    pub selection_id: Option<i64>,
    pub student_id: i64,
    pub room_id: i64,
    pub bed_id: i64,
    pub is_confirmed: bool,
    pub selected_at: Option<String>,
}

impl From<BedSelection> for SelectionInfo {
    fn from(selection: BedSelection) -> Self {
        Self {
            selection_id: selection.selection_id,
            student_id: selection.student_id,
            room_id: selection.room_id,
            bed_id: selection.bed_id,
            is_confirmed: selection.is_confirmed,
            selected_at: selection.selected_at,
        }
    }
}

/// API response listing every live selection.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct ListAllocationsResponse {
    pub selections: Vec<SelectionInfo>,
}

/// API response with one student's live selection, if any.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct SelectionLookupResponse {
    pub student_id: i64,
    pub selection: Option<SelectionInfo>,
}

/// A student's allocation as seen by read models.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct AllocationStatusResponse {
    pub student_id: i64,
    /// One of `unassigned`, `room_type_set`, `bed_selected`, `confirmed`.
    pub status: String,
    pub room_type: Option<String>,
    /// `manual` or `lottery:{event_id}`.
    pub room_type_source: Option<String>,
    pub selection: Option<SelectionInfo>,
}

impl From<AllocationState> for AllocationStatusResponse {
    fn from(state: AllocationState) -> Self {
        let status: String = state.status().as_str().to_string();
        let (room_type, room_type_source): (Option<String>, Option<String>) =
            match state.assignment {
                Some(assignment) => {
                    let source: String = match assignment.source {
                        RoomTypeSource::Manual => String::from("manual"),
                        RoomTypeSource::Lottery { event_id } => format!("lottery:{event_id}"),
                    };
                    (Some(assignment.room_type.to_string()), Some(source))
                }
                None => (None, None),
            };
        Self {
            student_id: state.student.student_id,
            status,
            room_type,
            room_type_source,
            selection: state.selection.map(SelectionInfo::from),
        }
    }
}

/// What a coordinator operation did.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SelectionOutcome {
    /// A free bed was claimed with no previous selection.
    Claimed,
    /// A free bed was claimed and the previous selection released.
    Replaced,
    /// The requested bed was already held; nothing changed.
    Unchanged,
    /// The selection was released.
    Released,
    /// The selection moved to another bed.
    Swapped,
    /// The selection was confirmed.
    Confirmed,
    /// An administrator removed the selection.
    Revoked,
    /// An administrator moved the selection.
    Reassigned,
}

/// API response for every coordinator operation.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct SelectionResponse {
    pub student_id: i64,
    pub outcome: SelectionOutcome,
    /// The selection after the operation, if any.
    pub selection: Option<SelectionInfo>,
}

/// One stored allocation history row.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct HistoryEntryInfo {
    pub history_id: i64,
    pub room_id: i64,
    pub bed_id: i64,
    pub action: String,
    pub actor_id: i64,
    pub actor_role: String,
    pub notes: Option<String>,
    pub recorded_at: String,
}

impl From<RecordedHistoryEntry> for HistoryEntryInfo {
    fn from(recorded: RecordedHistoryEntry) -> Self {
        Self {
            history_id: recorded.history_id,
            room_id: recorded.entry.room_id,
            bed_id: recorded.entry.bed_id,
            action: recorded.entry.action.as_str().to_string(),
            actor_id: recorded.entry.actor.id,
            actor_role: recorded.entry.actor.role.as_str().to_string(),
            notes: recorded.entry.notes,
            recorded_at: recorded.recorded_at,
        }
    }
}

/// API response with a student's allocation history, oldest first.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct AllocationHistoryResponse {
    pub student_id: i64,
    pub entries: Vec<HistoryEntryInfo>,
}

// ============================================================================
// Audit and integrity
// ============================================================================

/// One administrative audit record.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct AuditEventInfo {
    pub event_id: i64,
    pub actor_id: i64,
    pub actor_role: String,
    pub action: String,
    pub details: Option<String>,
    pub before: String,
    pub after: String,
    pub created_at: String,
}

impl From<StoredAuditEvent> for AuditEventInfo {
    fn from(stored: StoredAuditEvent) -> Self {
        Self {
            event_id: stored.event_id,
            actor_id: stored.event.actor.id,
            actor_role: stored.event.actor.role.as_str().to_string(),
            action: stored.event.action.name,
            details: stored.event.action.details,
            before: stored.event.before.data,
            after: stored.event.after.data,
            created_at: stored.created_at,
        }
    }
}

/// API response listing audit events.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct ListAuditEventsResponse {
    pub events: Vec<AuditEventInfo>,
}

/// A room whose counters disagree.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct RoomDiscrepancyInfo {
    pub room_id: i64,
    pub stored_occupancy: i64,
    pub occupied_beds: i64,
    pub live_selections: i64,
}

impl From<RoomDiscrepancy> for RoomDiscrepancyInfo {
    fn from(d: RoomDiscrepancy) -> Self {
        Self {
            room_id: d.room_id,
            stored_occupancy: d.stored_occupancy,
            occupied_beds: d.occupied_beds,
            live_selections: d.live_selections,
        }
    }
}

/// A bed whose flag disagrees with the selection ledger.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct BedDiscrepancyInfo {
    pub bed_id: i64,
    pub is_occupied: bool,
    pub live_selections: i64,
}

impl From<BedDiscrepancy> for BedDiscrepancyInfo {
    fn from(d: BedDiscrepancy) -> Self {
        Self {
            bed_id: d.bed_id,
            is_occupied: d.is_occupied,
            live_selections: d.live_selections,
        }
    }
}

/// API response of the integrity check.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct IntegrityReportResponse {
    pub consistent: bool,
    pub rooms_checked: usize,
    pub beds_checked: usize,
    pub room_discrepancies: Vec<RoomDiscrepancyInfo>,
    pub bed_discrepancies: Vec<BedDiscrepancyInfo>,
}

impl From<IntegrityReport> for IntegrityReportResponse {
    fn from(report: IntegrityReport) -> Self {
        Self {
            consistent: report.is_consistent(),
            rooms_checked: report.rooms_checked,
            beds_checked: report.beds_checked,
            room_discrepancies: report
                .room_discrepancies
                .into_iter()
                .map(RoomDiscrepancyInfo::from)
                .collect(),
            bed_discrepancies: report
                .bed_discrepancies
                .into_iter()
                .map(BedDiscrepancyInfo::from)
                .collect(),
        }
    }
}
