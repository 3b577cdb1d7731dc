// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! State-changing operations for the persistence layer.
//!
//! ## Module Organization
//!
//! - `audit`: Audit event persistence and timestamps
//! - `inventory`: Students, buildings, rooms and beds
//! - `lottery`: Lottery events, draws, publication and corrections
//! - `allocation`: Transition effects on selections, occupancy and history

pub mod allocation;
pub mod audit;
pub mod inventory;
pub mod lottery;
