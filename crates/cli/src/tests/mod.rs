// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

#![allow(clippy::expect_used, clippy::unwrap_used)]

use std::sync::{Arc, Mutex};

use clap::Parser;
use dorm_lottery_api::{ApiError, BedSelectionCoordinator, CoordinatorConfig};
use dorm_lottery_persistence::Persistence;
use serde_json::Value;

use crate::Args;
use crate::commands::{Commands, execute, parse_bucket};
use crate::error::{CliError, exit};

fn create_test_coordinator() -> BedSelectionCoordinator {
    let persistence: Persistence =
        Persistence::new_in_memory().expect("Failed to create in-memory database");
    BedSelectionCoordinator::new(
        Arc::new(Mutex::new(persistence)),
        CoordinatorConfig::default(),
    )
}

/// Parses a command line and runs it against `coordinator`.
fn run_line(coordinator: &BedSelectionCoordinator, line: &[&str]) -> Result<Value, CliError> {
    let mut argv: Vec<&str> = vec!["dorm-lottery"];
    argv.extend_from_slice(line);
    let args: Args = Args::try_parse_from(argv).unwrap();
    execute(coordinator, args.actor, args.command)
}

fn id_of(value: &Value, field: &str) -> String {
    value[field].as_i64().unwrap().to_string()
}

#[test]
fn test_parse_bucket() {
    let bucket = parse_bucket("4:2:4").unwrap();
    assert_eq!(bucket.room_type, "4");
    assert_eq!(bucket.group_count, 2);
    assert_eq!(bucket.group_size, 4);

    assert!(parse_bucket("4:2").is_err());
    assert!(parse_bucket("4:x:4").is_err());
}

#[test]
fn test_global_flags_parse_after_subcommand() {
    let args: Args = Args::try_parse_from([
        "dorm-lottery",
        "claim",
        "7",
        "--as",
        "3",
        "--lock-timeout-ms",
        "250",
    ])
    .unwrap();

    assert_eq!(args.actor, Some(3));
    assert_eq!(args.lock_timeout_ms, 250);
    assert!(matches!(
        args.command,
        Commands::Claim {
            bed_id: 7,
            student: None
        }
    ));
}

#[test]
fn test_uniform_and_bucket_flags_conflict() {
    let result = Args::try_parse_from([
        "dorm-lottery",
        "create-event",
        "Spring",
        "2026-03-01T09:00:00Z",
        "--room-type",
        "4",
        "--group-size",
        "4",
        "--bucket",
        "2:1:2",
    ]);

    assert!(result.is_err());
}

#[test]
fn test_missing_actor_is_usage_error() {
    let coordinator: BedSelectionCoordinator = create_test_coordinator();

    let err: CliError = run_line(&coordinator, &["list-buildings"]).unwrap_err();

    assert_eq!(err.exit_code, exit::USAGE);
}

#[test]
fn test_full_selection_flow() {
    let coordinator: BedSelectionCoordinator = create_test_coordinator();
    let admin: String = id_of(
        &run_line(&coordinator, &["bootstrap-admin", "admin", "Admin"]).unwrap(),
        "student_id",
    );
    let alice: String = id_of(
        &run_line(&coordinator, &["register-student", "alice", "Alice"]).unwrap(),
        "student_id",
    );

    let building: String = id_of(
        &run_line(&coordinator, &["create-building", "North", "--as", &admin]).unwrap(),
        "building_id",
    );
    run_line(
        &coordinator,
        &["create-room", &building, "101", "4", "2", "--as", &admin],
    )
    .unwrap();
    let event: String = id_of(
        &run_line(
            &coordinator,
            &[
                "create-event",
                "Spring",
                "2026-03-01T09:00:00Z",
                "--room-type",
                "4",
                "--group-size",
                "4",
                "--as",
                &admin,
            ],
        )
        .unwrap(),
        "event_id",
    );
    run_line(&coordinator, &["draw", &event, "--as", &admin]).unwrap();
    run_line(&coordinator, &["publish", &event, "--as", &admin]).unwrap();

    let free: Value = run_line(&coordinator, &["free-beds", "4", "--as", &alice]).unwrap();
    let bed: String = id_of(&free["beds"][0], "bed_id");
    let claimed: Value = run_line(&coordinator, &["claim", &bed, "--as", &alice]).unwrap();
    assert_eq!(claimed["outcome"], "claimed");

    let confirmed: Value = run_line(&coordinator, &["confirm", "--as", &alice]).unwrap();
    assert_eq!(confirmed["selection"]["is_confirmed"], true);

    let status: Value = run_line(&coordinator, &["status", "--as", &alice]).unwrap();
    assert_eq!(status["status"], "confirmed");

    let report: Value = run_line(&coordinator, &["integrity", "--as", &admin]).unwrap();
    assert_eq!(report["consistent"], true);
}

#[test]
fn test_api_errors_map_to_exit_codes() {
    let busy: CliError = CliError::from(ApiError::Busy {
        message: String::from("bed 1"),
    });
    assert_eq!(busy.exit_code, exit::BUSY);
    assert!(busy.retryable);

    let conflict: CliError = CliError::from(ApiError::Conflict { bed_id: 1 });
    assert_eq!(conflict.exit_code, exit::REJECTED);
    assert!(!conflict.retryable);

    let denied: CliError = CliError::from(ApiError::Unauthorized {
        action: String::from("publish_lottery"),
        required_role: String::from("Admin"),
    });
    assert_eq!(denied.exit_code, exit::DENIED);
}

#[test]
fn test_update_room_flags_parse() {
    let args: Args = Args::try_parse_from([
        "dorm-lottery",
        "update-room",
        "5",
        "--capacity",
        "3",
        "--available",
        "false",
    ])
    .unwrap();

    assert!(matches!(
        args.command,
        Commands::UpdateRoom {
            room_id: 5,
            room_type: None,
            capacity: Some(3),
            available: Some(false),
        }
    ));
}

#[test]
fn test_admin_reporting_flow() {
    let coordinator: BedSelectionCoordinator = create_test_coordinator();
    let admin: String = id_of(
        &run_line(&coordinator, &["bootstrap-admin", "admin", "Admin"]).unwrap(),
        "student_id",
    );
    let alice: String = id_of(
        &run_line(&coordinator, &["register-student", "alice", "Alice"]).unwrap(),
        "student_id",
    );
    let bob: String = id_of(
        &run_line(&coordinator, &["register-student", "bob", "Bob"]).unwrap(),
        "student_id",
    );
    let found: Value = run_line(&coordinator, &["find-student", "bob", "--as", &admin]).unwrap();
    assert_eq!(id_of(&found, "student_id"), bob);

    let building: String = id_of(
        &run_line(&coordinator, &["create-building", "North", "--as", &admin]).unwrap(),
        "building_id",
    );
    let room: String = id_of(
        &run_line(
            &coordinator,
            &["create-room", &building, "101", "2", "1", "--as", &admin],
        )
        .unwrap(),
        "room_id",
    );
    let resized: Value = run_line(
        &coordinator,
        &["update-room", &room, "--capacity", "2", "--as", &admin],
    )
    .unwrap();
    assert_eq!(resized["max_capacity"], 2);

    let unassigned: Value =
        run_line(&coordinator, &["room-type-unallocated", "--as", &admin]).unwrap();
    assert_eq!(unassigned.as_array().map(Vec::len), Some(2));

    run_line(
        &coordinator,
        &["set-room-type", &alice, "2", "--as", &admin],
    )
    .unwrap();
    let detail: Value = run_line(&coordinator, &["show-room", &room, "--as", &alice]).unwrap();
    let bed: String = id_of(&detail["beds"][1], "bed_id");
    run_line(&coordinator, &["claim", &bed, "--as", &alice]).unwrap();

    let selection: Value = run_line(&coordinator, &["selection", "--as", &alice]).unwrap();
    assert_eq!(id_of(&selection["selection"], "bed_id"), bed);
    let allocations: Value = run_line(&coordinator, &["allocations", "--as", &admin]).unwrap();
    assert_eq!(allocations["selections"].as_array().map(Vec::len), Some(1));
    let unallocated: Value = run_line(&coordinator, &["unallocated", "--as", &admin]).unwrap();
    assert_eq!(id_of(&unallocated[0], "student_id"), bob);

    let blocked: CliError = run_line(
        &coordinator,
        &["remove-room-type", &alice, "--as", &admin],
    )
    .unwrap_err();
    assert_eq!(blocked.exit_code, exit::REJECTED);
    run_line(&coordinator, &["release", "--as", &alice]).unwrap();
    let removed: Value = run_line(
        &coordinator,
        &["remove-room-type", &alice, "--as", &admin],
    )
    .unwrap();
    assert_eq!(removed["status"], "unassigned");

    let event: String = id_of(
        &run_line(
            &coordinator,
            &[
                "create-event",
                "Spare",
                "2026-03-01T09:00:00Z",
                "--room-type",
                "2",
                "--group-size",
                "2",
                "--as",
                &admin,
            ],
        )
        .unwrap(),
        "event_id",
    );
    run_line(&coordinator, &["delete-event", &event, "--as", &admin]).unwrap();
    let events: Value = run_line(&coordinator, &["list-events", "--as", &admin]).unwrap();
    assert_eq!(events.as_array().map(Vec::len), Some(0));
}
