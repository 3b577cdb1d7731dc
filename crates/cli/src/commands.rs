// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Subcommands and their dispatch onto the API layer.

use std::sync::{Arc, Mutex, MutexGuard};

use clap::{Args, Subcommand};
use serde::Serialize;
use serde_json::Value;
use tracing::info;

use dorm_lottery_api::{
    ApiError, AuthenticatedActor, BedSelectionCoordinator, BucketRequest, CompositionRequest,
    CorrectLotteryResultRequest, CreateBuildingRequest, CreateLotteryEventRequest,
    CreateRoomRequest, RegisterStudentRequest, RunLotteryDrawRequest, SetRoomAvailabilityRequest,
    SetRoomTypeAllocationRequest, UpdateRoomRequest, bootstrap_admin, check_integrity,
    correct_lottery_result, create_building, create_lottery_event, create_room,
    delete_building, delete_lottery_event, delete_room, find_student, get_allocation_history,
    get_allocation_status, get_room, get_selection, list_allocations, list_audit_events,
    list_buildings, list_free_beds, list_lottery_events, list_lottery_results,
    list_room_type_unallocated_students, list_rooms, list_students, list_unallocated_students,
    publish_lottery, register_student, remove_room_type_allocation, reset_lottery,
    resolve_actor, run_lottery_draw, set_room_availability, set_room_type_allocation,
    update_room,
};
use dorm_lottery_persistence::Persistence;

use crate::error::CliError;

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Create the first administrator account
    BootstrapAdmin { username: String, full_name: String },
    /// Register a student account
    RegisterStudent { username: String, full_name: String },
    /// List every account
    ListStudents,
    /// Look up an account by username
    FindStudent { username: String },

    /// Create a building
    CreateBuilding { name: String },
    /// List buildings
    ListBuildings,
    /// Delete a building that has no rooms
    DeleteBuilding { building_id: i64 },
    /// Create a room and its beds
    CreateRoom {
        building_id: i64,
        room_number: String,
        room_type: String,
        capacity: u32,
    },
    /// List rooms
    ListRooms {
        #[arg(long)]
        building_id: Option<i64>,
    },
    /// Open or close a room for selection
    SetRoomAvailability {
        room_id: i64,
        #[arg(long, action = clap::ArgAction::Set)]
        available: bool,
    },
    /// Change a room's type, bed count or availability
    UpdateRoom {
        room_id: i64,
        #[arg(long)]
        room_type: Option<String>,
        #[arg(long)]
        capacity: Option<u32>,
        #[arg(long)]
        available: Option<bool>,
    },
    /// Show a room and its beds
    ShowRoom { room_id: i64 },
    /// Delete an unused room
    DeleteRoom { room_id: i64 },
    /// List beds still free for a room type
    FreeBeds { room_type: String },

    /// Create a lottery event
    CreateEvent {
        name: String,
        /// RFC 3339 timestamp, e.g. 2026-03-01T09:00:00Z
        scheduled_at: String,
        #[command(flatten)]
        composition: CompositionArgs,
    },
    /// List lottery events
    ListEvents,
    /// Draw an event, optionally overriding its composition
    Draw {
        event_id: i64,
        #[command(flatten)]
        composition: CompositionArgs,
    },
    /// Publish an event's results
    Publish { event_id: i64 },
    /// Delete an unpublished event's results
    Reset { event_id: i64 },
    /// Delete an unpublished event that has no results
    DeleteEvent { event_id: i64 },
    /// Correct one result of an unpublished event
    CorrectResult {
        event_id: i64,
        student_id: i64,
        #[arg(long)]
        draw_number: Option<u32>,
        #[arg(long)]
        group_label: Option<String>,
        #[arg(long)]
        room_type: Option<String>,
    },
    /// Show an event and the results visible to the caller
    Results { event_id: i64 },

    /// Assign a room type outside the lottery
    SetRoomType {
        student_id: i64,
        room_type: String,
        #[arg(long)]
        notes: Option<String>,
    },
    /// Remove a manual room type assignment
    RemoveRoomType {
        student_id: i64,
        #[arg(long)]
        notes: Option<String>,
    },
    /// Claim a free bed
    Claim {
        bed_id: i64,
        /// Act on behalf of this student (administrators only)
        #[arg(long)]
        student: Option<i64>,
    },
    /// Release the held bed
    Release {
        #[arg(long)]
        student: Option<i64>,
    },
    /// Move the held bed to another free bed
    Swap {
        bed_id: i64,
        #[arg(long)]
        student: Option<i64>,
    },
    /// Confirm the held bed
    Confirm {
        #[arg(long)]
        student: Option<i64>,
    },
    /// Remove a student's selection (administrators only)
    Revoke {
        student_id: i64,
        #[arg(long)]
        notes: Option<String>,
    },
    /// Move a student's selection to another bed (administrators only)
    Reassign {
        student_id: i64,
        bed_id: i64,
        #[arg(long)]
        notes: Option<String>,
    },
    /// Show a student's allocation
    Status { student_id: Option<i64> },
    /// Show a student's held bed
    Selection { student_id: Option<i64> },
    /// List every held bed
    Allocations,
    /// List students who hold no bed
    Unallocated,
    /// List students without a room type
    RoomTypeUnallocated,
    /// Show a student's allocation history
    History { student_id: Option<i64> },
    /// List audit events
    Audit {
        #[arg(long)]
        action: Option<String>,
    },
    /// Compare occupancy counters with the selection ledger
    Integrity,
}

/// Composition flags shared by `create-event` and `draw`.
#[derive(Args, Debug, Clone, Default)]
pub struct CompositionArgs {
    /// Room type for a uniform composition
    #[arg(long, requires = "group_size", conflicts_with = "bucket")]
    pub room_type: Option<String>,
    /// Group size for a uniform composition
    #[arg(long)]
    pub group_size: Option<u32>,
    /// Ordered bucket as TYPE:GROUPS:SIZE; repeat for more buckets
    #[arg(long, value_parser = parse_bucket)]
    pub bucket: Vec<BucketRequest>,
}

impl CompositionArgs {
    /// The requested composition, or `None` if no flag was given.
    #[must_use]
    pub fn to_request(&self) -> Option<CompositionRequest> {
        match (&self.room_type, self.group_size) {
            (Some(room_type), Some(group_size)) => Some(CompositionRequest::Uniform {
                room_type: room_type.clone(),
                group_size,
            }),
            _ if !self.bucket.is_empty() => Some(CompositionRequest::Buckets {
                buckets: self.bucket.clone(),
            }),
            _ => None,
        }
    }
}

/// Parses `TYPE:GROUPS:SIZE`.
///
/// # Errors
///
/// Returns a message if the value does not have three parts or a count is
/// not a number.
pub fn parse_bucket(value: &str) -> Result<BucketRequest, String> {
    let parts: Vec<&str> = value.split(':').collect();
    let [room_type, group_count, group_size] = parts.as_slice() else {
        return Err(format!("expected TYPE:GROUPS:SIZE, got '{value}'"));
    };
    let group_count: u32 = group_count
        .parse()
        .map_err(|e| format!("invalid group count '{group_count}': {e}"))?;
    let group_size: u32 = group_size
        .parse()
        .map_err(|e| format!("invalid group size '{group_size}': {e}"))?;

    Ok(BucketRequest {
        room_type: (*room_type).to_string(),
        group_count,
        group_size,
    })
}

/// Runs one command and returns its JSON output.
///
/// # Arguments
///
/// * `coordinator` - The coordinator owning the shared persistence
/// * `actor_id` - The calling account, required by everything except
///   account creation
/// * `command` - The command to run
///
/// # Errors
///
/// Returns a `CliError` carrying the exit code for the failure.
#[allow(clippy::too_many_lines)]
pub fn execute(
    coordinator: &BedSelectionCoordinator,
    actor_id: Option<i64>,
    command: Commands,
) -> Result<Value, CliError> {
    match command {
        Commands::BootstrapAdmin {
            username,
            full_name,
        } => {
            let request: RegisterStudentRequest = RegisterStudentRequest {
                username,
                full_name,
            };
            return to_json(&with_persistence(coordinator, |p| {
                bootstrap_admin(p, &request)
            })?);
        }
        Commands::RegisterStudent {
            username,
            full_name,
        } => {
            let request: RegisterStudentRequest = RegisterStudentRequest {
                username,
                full_name,
            };
            return to_json(&with_persistence(coordinator, |p| {
                register_student(p, &request)
            })?);
        }
        _ => {}
    }

    let actor_id: i64 =
        actor_id.ok_or_else(|| CliError::usage("this command requires --as <account id>"))?;
    let actor: AuthenticatedActor =
        with_persistence(coordinator, |p| resolve_actor(p, actor_id))?;
    info!(actor_id, role = ?actor.role, "Resolved caller");

    match command {
        Commands::BootstrapAdmin { .. } | Commands::RegisterStudent { .. } => {
            Err(CliError::usage("account creation does not take --as"))
        }
        Commands::ListStudents => to_json(&with_persistence(coordinator, |p| {
            list_students(p, &actor)
        })?),
        Commands::FindStudent { username } => to_json(&with_persistence(coordinator, |p| {
            find_student(p, &username, &actor)
        })?),

        Commands::CreateBuilding { name } => {
            let request: CreateBuildingRequest = CreateBuildingRequest { name };
            to_json(&with_persistence(coordinator, |p| {
                create_building(p, &request, &actor)
            })?)
        }
        Commands::ListBuildings => to_json(&with_persistence(coordinator, list_buildings)?),
        Commands::DeleteBuilding { building_id } => {
            with_persistence(coordinator, |p| delete_building(p, building_id, &actor))?;
            Ok(serde_json::json!({ "deleted_building_id": building_id }))
        }
        Commands::CreateRoom {
            building_id,
            room_number,
            room_type,
            capacity,
        } => {
            let request: CreateRoomRequest = CreateRoomRequest {
                building_id,
                room_number,
                room_type,
                capacity,
            };
            to_json(&with_persistence(coordinator, |p| {
                create_room(p, &request, &actor)
            })?)
        }
        Commands::ListRooms { building_id } => to_json(&with_persistence(coordinator, |p| {
            list_rooms(p, building_id)
        })?),
        Commands::SetRoomAvailability { room_id, available } => {
            let request: SetRoomAvailabilityRequest = SetRoomAvailabilityRequest {
                room_id,
                is_available: available,
            };
            to_json(&with_persistence(coordinator, |p| {
                set_room_availability(p, &request, &actor)
            })?)
        }
        Commands::UpdateRoom {
            room_id,
            room_type,
            capacity,
            available,
        } => {
            let request: UpdateRoomRequest = UpdateRoomRequest {
                room_id,
                room_type,
                capacity,
                is_available: available,
            };
            to_json(&with_persistence(coordinator, |p| {
                update_room(p, &request, &actor)
            })?)
        }
        Commands::ShowRoom { room_id } => {
            to_json(&with_persistence(coordinator, |p| get_room(p, room_id))?)
        }
        Commands::DeleteRoom { room_id } => {
            with_persistence(coordinator, |p| delete_room(p, room_id, &actor))?;
            Ok(serde_json::json!({ "deleted_room_id": room_id }))
        }
        Commands::FreeBeds { room_type } => to_json(&with_persistence(coordinator, |p| {
            list_free_beds(p, &room_type)
        })?),

        Commands::CreateEvent {
            name,
            scheduled_at,
            composition,
        } => {
            let composition: CompositionRequest = composition.to_request().ok_or_else(|| {
                CliError::usage("give --room-type and --group-size, or at least one --bucket")
            })?;
            let request: CreateLotteryEventRequest = CreateLotteryEventRequest {
                name,
                scheduled_at,
                composition,
            };
            to_json(&with_persistence(coordinator, |p| {
                create_lottery_event(p, &request, &actor)
            })?)
        }
        Commands::ListEvents => to_json(&with_persistence(coordinator, list_lottery_events)?),
        Commands::Draw {
            event_id,
            composition,
        } => {
            let request: RunLotteryDrawRequest = RunLotteryDrawRequest {
                event_id,
                composition: composition.to_request(),
            };
            to_json(&with_persistence(coordinator, |p| {
                run_lottery_draw(p, &request, &actor)
            })?)
        }
        Commands::Publish { event_id } => to_json(&with_persistence(coordinator, |p| {
            publish_lottery(p, event_id, &actor)
        })?),
        Commands::Reset { event_id } => to_json(&with_persistence(coordinator, |p| {
            reset_lottery(p, event_id, &actor)
        })?),
        Commands::DeleteEvent { event_id } => to_json(&with_persistence(coordinator, |p| {
            delete_lottery_event(p, event_id, &actor)
        })?),
        Commands::CorrectResult {
            event_id,
            student_id,
            draw_number,
            group_label,
            room_type,
        } => {
            let request: CorrectLotteryResultRequest = CorrectLotteryResultRequest {
                event_id,
                student_id,
                draw_number,
                group_label,
                room_type,
            };
            to_json(&with_persistence(coordinator, |p| {
                correct_lottery_result(p, &request, &actor)
            })?)
        }
        Commands::Results { event_id } => to_json(&with_persistence(coordinator, |p| {
            list_lottery_results(p, event_id, &actor)
        })?),

        Commands::SetRoomType {
            student_id,
            room_type,
            notes,
        } => {
            let request: SetRoomTypeAllocationRequest = SetRoomTypeAllocationRequest {
                student_id,
                room_type,
                notes,
            };
            to_json(&with_persistence(coordinator, |p| {
                set_room_type_allocation(p, &request, &actor)
            })?)
        }
        Commands::RemoveRoomType { student_id, notes } => {
            to_json(&with_persistence(coordinator, |p| {
                remove_room_type_allocation(p, student_id, notes, &actor)
            })?)
        }
        Commands::Claim { bed_id, student } => to_json(&coordinator.claim_bed(
            &actor,
            student.unwrap_or(actor.student_id),
            bed_id,
        )?),
        Commands::Release { student } => {
            to_json(&coordinator.release_bed(&actor, student.unwrap_or(actor.student_id))?)
        }
        Commands::Swap { bed_id, student } => to_json(&coordinator.swap_bed(
            &actor,
            student.unwrap_or(actor.student_id),
            bed_id,
        )?),
        Commands::Confirm { student } => to_json(
            &coordinator.confirm_selection(&actor, student.unwrap_or(actor.student_id))?,
        ),
        Commands::Revoke { student_id, notes } => {
            to_json(&coordinator.revoke_selection(&actor, student_id, notes)?)
        }
        Commands::Reassign {
            student_id,
            bed_id,
            notes,
        } => to_json(&coordinator.reassign_bed(&actor, student_id, bed_id, notes)?),
        Commands::Status { student_id } => to_json(&with_persistence(coordinator, |p| {
            get_allocation_status(p, student_id.unwrap_or(actor.student_id), &actor)
        })?),
        Commands::Selection { student_id } => to_json(&with_persistence(coordinator, |p| {
            get_selection(p, student_id.unwrap_or(actor.student_id), &actor)
        })?),
        Commands::Allocations => to_json(&with_persistence(coordinator, |p| {
            list_allocations(p, &actor)
        })?),
        Commands::Unallocated => to_json(&with_persistence(coordinator, |p| {
            list_unallocated_students(p, &actor)
        })?),
        Commands::RoomTypeUnallocated => to_json(&with_persistence(coordinator, |p| {
            list_room_type_unallocated_students(p, &actor)
        })?),
        Commands::History { student_id } => to_json(&with_persistence(coordinator, |p| {
            get_allocation_history(p, student_id.unwrap_or(actor.student_id), &actor)
        })?),
        Commands::Audit { action } => to_json(&with_persistence(coordinator, |p| {
            list_audit_events(p, action.as_deref(), &actor)
        })?),
        Commands::Integrity => to_json(&with_persistence(coordinator, |p| {
            check_integrity(p, &actor)
        })?),
    }
}

/// Runs a handler under the persistence mutex. The guard is released
/// before returning, so coordinator calls never wait on it.
fn with_persistence<T>(
    coordinator: &BedSelectionCoordinator,
    handler: impl FnOnce(&mut Persistence) -> Result<T, ApiError>,
) -> Result<T, CliError> {
    let shared: Arc<Mutex<Persistence>> = coordinator.persistence();
    let mut persistence: MutexGuard<'_, Persistence> =
        shared.lock().map_err(|e| ApiError::Internal {
            message: format!("persistence lock poisoned: {e}"),
        })?;
    Ok(handler(&mut *persistence)?)
}

fn to_json<T: Serialize>(value: &T) -> Result<Value, CliError> {
    Ok(serde_json::to_value(value)?)
}
