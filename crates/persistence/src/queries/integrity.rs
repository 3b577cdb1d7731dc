// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Read-only consistency scan of occupancy counters.
//!
//! The scan never writes. A discrepancy means a bug elsewhere and is
//! reported, not repaired.

use std::collections::HashMap;

use diesel::SqliteConnection;
use diesel::prelude::*;
use tracing::warn;

use crate::data_models::{BedDiscrepancy, IntegrityReport, RoomDiscrepancy};
use crate::diesel_schema::{bed_selections, beds, rooms};
use crate::error::PersistenceError;

/// Compares stored occupancy, bed flags and live selections.
///
/// # Errors
///
/// Returns an error if the database query fails.
pub fn check_integrity(conn: &mut SqliteConnection) -> Result<IntegrityReport, PersistenceError> {
    let room_rows: Vec<(i64, i32)> = rooms::table
        .order(rooms::room_id.asc())
        .select((rooms::room_id, rooms::current_occupancy))
        .load(conn)
        .map_err(|e| PersistenceError::QueryFailed(format!("check_integrity: {e}")))?;
    let bed_rows: Vec<(i64, i64, i32)> = beds::table
        .order(beds::bed_id.asc())
        .select((beds::bed_id, beds::room_id, beds::is_occupied))
        .load(conn)
        .map_err(|e| PersistenceError::QueryFailed(format!("check_integrity: {e}")))?;
    let selection_rows: Vec<(i64, i64)> = bed_selections::table
        .select((bed_selections::room_id, bed_selections::bed_id))
        .load(conn)
        .map_err(|e| PersistenceError::QueryFailed(format!("check_integrity: {e}")))?;

    let mut selections_per_room: HashMap<i64, i64> = HashMap::new();
    let mut selections_per_bed: HashMap<i64, i64> = HashMap::new();
    for (room_id, bed_id) in &selection_rows {
        *selections_per_room.entry(*room_id).or_default() += 1;
        *selections_per_bed.entry(*bed_id).or_default() += 1;
    }

    let mut occupied_per_room: HashMap<i64, i64> = HashMap::new();
    let mut bed_discrepancies: Vec<BedDiscrepancy> = Vec::new();
    for (bed_id, room_id, is_occupied) in &bed_rows {
        let occupied: bool = *is_occupied != 0;
        if occupied {
            *occupied_per_room.entry(*room_id).or_default() += 1;
        }
        let live_selections: i64 = selections_per_bed.get(bed_id).copied().unwrap_or(0);
        if live_selections != i64::from(occupied) {
            bed_discrepancies.push(BedDiscrepancy {
                bed_id: *bed_id,
                is_occupied: occupied,
                live_selections,
            });
        }
    }

    let room_discrepancies: Vec<RoomDiscrepancy> = room_rows
        .iter()
        .filter_map(|(room_id, stored)| {
            let discrepancy: RoomDiscrepancy = RoomDiscrepancy {
                room_id: *room_id,
                stored_occupancy: i64::from(*stored),
                occupied_beds: occupied_per_room.get(room_id).copied().unwrap_or(0),
                live_selections: selections_per_room.get(room_id).copied().unwrap_or(0),
            };
            let consistent: bool = discrepancy.stored_occupancy == discrepancy.occupied_beds
                && discrepancy.occupied_beds == discrepancy.live_selections;
            (!consistent).then_some(discrepancy)
        })
        .collect();

    let report: IntegrityReport = IntegrityReport {
        rooms_checked: room_rows.len(),
        beds_checked: bed_rows.len(),
        room_discrepancies,
        bed_discrepancies,
    };
    if !report.is_consistent() {
        warn!(
            rooms = report.room_discrepancies.len(),
            beds = report.bed_discrepancies.len(),
            "Integrity check found occupancy discrepancies"
        );
    }
    Ok(report)
}
