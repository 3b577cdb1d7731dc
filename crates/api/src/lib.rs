// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! API boundary for the dorm lottery system.
//!
//! Callers resolve an account id to an [`AuthenticatedActor`], then call
//! either a handler (lottery, inventory, reads) with exclusively borrowed
//! persistence, or the [`BedSelectionCoordinator`] for anything that
//! touches a bed. Every failure surfaces as an [`ApiError`].

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

mod auth;
mod config;
mod coordinator;
mod error;
mod handlers;
mod request_response;

#[cfg(test)]
mod tests;

pub use auth::{AuthenticatedActor, Role, resolve_actor};
pub use config::{CoordinatorConfig, DEFAULT_LOCK_TIMEOUT, DEFAULT_MAX_LOCK_ATTEMPTS};
pub use coordinator::BedSelectionCoordinator;
pub use error::{
    ApiError, translate_core_error, translate_domain_error, translate_persistence_error,
};
pub use handlers::{
    bootstrap_admin, check_integrity, correct_lottery_result, create_building,
    create_lottery_event, create_room, delete_building, delete_lottery_event, delete_room,
    find_student, get_allocation_history, get_allocation_status, get_room, get_selection,
    list_allocations, list_audit_events, list_buildings, list_free_beds, list_lottery_events,
    list_lottery_results, list_room_type_unallocated_students, list_rooms, list_students,
    list_unallocated_students, publish_lottery, register_student, remove_room_type_allocation,
    reset_lottery, run_lottery_draw, set_room_availability, set_room_type_allocation,
    update_room,
};
pub use request_response::{
    AllocationHistoryResponse, AllocationStatusResponse, AuditEventInfo, BedDiscrepancyInfo,
    BedInfo, BucketCountInfo, BucketRequest, BuildingInfo, CompositionRequest,
    CorrectLotteryResultRequest, CreateBuildingRequest, CreateLotteryEventRequest,
    CreateRoomRequest, FreeBedInfo, HistoryEntryInfo, IntegrityReportResponse,
    ListAllocationsResponse, ListAuditEventsResponse, ListFreeBedsResponse,
    ListLotteryResultsResponse, LotteryEventInfo, LotteryEventUpdateResponse, LotteryResultInfo,
    RegisterStudentRequest, RoomDetailResponse, RoomDiscrepancyInfo, RoomInfo,
    RunLotteryDrawRequest, RunLotteryDrawResponse, SelectionInfo, SelectionLookupResponse,
    SelectionOutcome, SelectionResponse, SetRoomAvailabilityRequest,
    SetRoomTypeAllocationRequest, StudentInfo, UpdateRoomRequest,
};
