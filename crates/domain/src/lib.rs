// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

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

mod allocation_status;
mod error;
mod lottery;
mod types;
mod validation;

#[cfg(test)]
mod tests;

pub use allocation_status::{AllocationStatus, Authority};
pub use error::DomainError;
pub use lottery::{BucketCount, DrawAssignment, assign_draw, bucket_counts, group_label};
pub use types::{
    Bed, BedSelection, BucketSpec, Building, Composition, LotteryEvent, LotteryResult, Room,
    RoomType, RoomTypeAllocation, Student,
};
pub use validation::{
    MAX_ROOM_CAPACITY, MAX_ROOM_TYPE_LEN, validate_capacity, validate_composition, validate_name,
    validate_room_number, validate_room_type, validate_scheduled_at,
};
