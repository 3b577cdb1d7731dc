// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Read-only queries for the persistence layer.
//!
//! ## Module Organization
//!
//! - `inventory`: Students, buildings, rooms and beds
//! - `lottery`: Lottery events and results
//! - `allocation`: Room-type resolution, selections and history
//! - `audit`: Audit event queries
//! - `integrity`: Occupancy consistency scan
//! - `rows`: Diesel row structs shared with `mutations`

pub mod allocation;
pub mod audit;
pub mod integrity;
pub mod inventory;
pub mod lottery;
pub mod rows;
