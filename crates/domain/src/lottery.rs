// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Lottery draw partitioning.
//!
//! The engine is split in two. The caller produces a uniformly random
//! permutation of the eligible student ids; this module walks that
//! permutation and deals students into room-type groups. Keeping the
//! random step outside makes the partitioning fully deterministic and
//! testable.
//!
//! ## Fill Order
//!
//! Buckets are filled in the order given by the composition. Within a
//! bucket, group 1 is filled to `group_size` before group 2 receives
//! anyone. A student's group label is `{room_type}-{group_index}` with the
//! index counted from 1 per room type.
//!
//! ## Invariants
//!
//! - Draw numbers are exactly `1..=N` for `N` participants
//! - The draw is all-or-nothing: if the composition cannot hold every
//!   participant, nobody is assigned

use crate::error::DomainError;
use crate::types::{Composition, RoomType};
use crate::validation::validate_composition;

/// A single student's placement produced by a draw.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DrawAssignment {
    /// The student's canonical ID.
    pub student_id: i64,
    /// 1-based position in the permutation.
    pub draw_number: u32,
    /// Cohort label, `{room_type}-{group_index}`.
    pub group_label: String,
    /// Room type of the cohort.
    pub room_type: RoomType,
}

/// How many students landed in one group.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BucketCount {
    pub group_label: String,
    pub room_type: RoomType,
    pub assigned: u32,
}

/// Formats a group label.
#[must_use]
pub fn group_label(room_type: &RoomType, group_index: u32) -> String {
    format!("{room_type}-{group_index}")
}

/// Partitions a permutation of students into room-type groups.
///
/// # Arguments
///
/// * `order` - Student ids in drawn order (position 0 receives draw number 1)
/// * `composition` - The target composition
///
/// # Returns
///
/// One `DrawAssignment` per student, in draw order.
///
/// # Errors
///
/// Returns an error if:
/// - `order` is empty (`NoParticipants`)
/// - The composition is malformed (`InvalidComposition`)
/// - The buckets hold fewer seats than there are students (`CapacityExceeded`)
pub fn assign_draw(
    order: &[i64],
    composition: &Composition,
) -> Result<Vec<DrawAssignment>, DomainError> {
    validate_composition(composition)?;

    if order.is_empty() {
        return Err(DomainError::NoParticipants);
    }

    let participants: usize = order.len();
    if let Some(capacity) = composition.capacity() {
        let needed: u64 = u64::try_from(participants).unwrap_or(u64::MAX);
        if needed > capacity {
            return Err(DomainError::CapacityExceeded {
                capacity,
                participants,
            });
        }
    }

    let slots: Box<dyn Iterator<Item = (&RoomType, u32)> + '_> = match composition {
        Composition::Uniform {
            room_type,
            group_size,
        } => {
            let size: u32 = *group_size;
            Box::new((0_u32..).map(move |seat| (room_type, seat / size + 1)))
        }
        Composition::Buckets { buckets } => Box::new(buckets.iter().flat_map(|bucket| {
            (1..=bucket.group_count).flat_map(move |group_index| {
                (0..bucket.group_size).map(move |_| (&bucket.room_type, group_index))
            })
        })),
    };

    let mut assignments: Vec<DrawAssignment> = Vec::with_capacity(participants);
    for ((student_id, (room_type, group_index)), draw_number) in
        order.iter().zip(slots).zip(1_u32..)
    {
        assignments.push(DrawAssignment {
            student_id: *student_id,
            draw_number,
            group_label: group_label(room_type, group_index),
            room_type: room_type.clone(),
        });
    }

    // The zip stops early only if a counter ran out.
    if assignments.len() != participants {
        return Err(DomainError::CapacityExceeded {
            capacity: u64::try_from(assignments.len()).unwrap_or(u64::MAX),
            participants,
        });
    }

    Ok(assignments)
}

/// Counts students per group, in first-seen order.
#[must_use]
pub fn bucket_counts(assignments: &[DrawAssignment]) -> Vec<BucketCount> {
    let mut counts: Vec<BucketCount> = Vec::new();
    for assignment in assignments {
        match counts
            .iter_mut()
            .find(|c| c.group_label == assignment.group_label)
        {
            Some(count) => count.assigned += 1,
            None => counts.push(BucketCount {
                group_label: assignment.group_label.clone(),
                room_type: assignment.room_type.clone(),
                assigned: 1,
            }),
        }
    }
    counts
}
