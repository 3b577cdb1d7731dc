// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use crate::error::DomainError;
use crate::types::{Composition, RoomType};
use std::collections::HashSet;
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;

/// Longest accepted room type label.
pub const MAX_ROOM_TYPE_LEN: usize = 16;

/// Largest room the inventory accepts.
pub const MAX_ROOM_CAPACITY: u32 = 32;

/// Validates a room type label.
///
/// # Arguments
///
/// * `value` - The candidate label, already trimmed
///
/// # Errors
///
/// Returns an error if:
/// - The label is empty
/// - The label is longer than [`MAX_ROOM_TYPE_LEN`] characters
/// - The label contains anything other than ASCII alphanumerics, `-` or `_`
pub fn validate_room_type(value: &str) -> Result<(), DomainError> {
    if value.is_empty() {
        return Err(DomainError::InvalidRoomType(String::from(
            "Room type cannot be empty",
        )));
    }

    if value.chars().count() > MAX_ROOM_TYPE_LEN {
        return Err(DomainError::InvalidRoomType(format!(
            "Room type '{value}' is longer than {MAX_ROOM_TYPE_LEN} characters"
        )));
    }

    if !value
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
    {
        return Err(DomainError::InvalidRoomType(format!(
            "Room type '{value}' may only contain letters, digits, '-' and '_'"
        )));
    }

    Ok(())
}

/// Validates a non-empty display name.
///
/// # Errors
///
/// Returns `DomainError::InvalidName` if the trimmed value is empty.
pub fn validate_name(field: &str, value: &str) -> Result<(), DomainError> {
    if value.trim().is_empty() {
        return Err(DomainError::InvalidName(format!("{field} cannot be empty")));
    }
    Ok(())
}

/// Validates a room number.
///
/// # Errors
///
/// Returns `DomainError::InvalidRoomNumber` if the trimmed value is empty.
pub fn validate_room_number(value: &str) -> Result<(), DomainError> {
    if value.trim().is_empty() {
        return Err(DomainError::InvalidRoomNumber(String::from(
            "Room number cannot be empty",
        )));
    }
    Ok(())
}

/// Validates a room capacity.
///
/// # Errors
///
/// Returns `DomainError::InvalidCapacity` unless `1 <= capacity <= MAX_ROOM_CAPACITY`.
pub const fn validate_capacity(capacity: u32) -> Result<(), DomainError> {
    if capacity == 0 || capacity > MAX_ROOM_CAPACITY {
        return Err(DomainError::InvalidCapacity { capacity });
    }
    Ok(())
}

/// Validates that a scheduled time is an RFC 3339 timestamp.
///
/// # Errors
///
/// Returns `DomainError::InvalidScheduledTime` if parsing fails.
pub fn validate_scheduled_at(value: &str) -> Result<OffsetDateTime, DomainError> {
    OffsetDateTime::parse(value, &Rfc3339).map_err(|e| DomainError::InvalidScheduledTime {
        value: value.to_string(),
        error: e.to_string(),
    })
}

/// Validates a lottery composition.
///
/// # Arguments
///
/// * `composition` - The composition to check
///
/// # Returns
///
/// * `Ok(())` if the composition is usable for a draw
/// * `Err(DomainError::InvalidComposition)` otherwise
///
/// # Errors
///
/// Returns an error if:
/// - A group size is zero
/// - A bucket list is empty
/// - A bucket has zero groups
/// - The same room type appears in two buckets
pub fn validate_composition(composition: &Composition) -> Result<(), DomainError> {
    match composition {
        Composition::Uniform { group_size, .. } => {
            if *group_size == 0 {
                return Err(DomainError::InvalidComposition(String::from(
                    "Group size must be greater than 0",
                )));
            }
        }
        Composition::Buckets { buckets } => {
            if buckets.is_empty() {
                return Err(DomainError::InvalidComposition(String::from(
                    "At least one bucket is required",
                )));
            }

            let mut seen: HashSet<&RoomType> = HashSet::new();
            for bucket in buckets {
                if bucket.group_count == 0 || bucket.group_size == 0 {
                    return Err(DomainError::InvalidComposition(format!(
                        "Bucket '{}' needs a positive group count and group size",
                        bucket.room_type
                    )));
                }
                if !seen.insert(&bucket.room_type) {
                    return Err(DomainError::InvalidComposition(format!(
                        "Room type '{}' appears in more than one bucket",
                        bucket.room_type
                    )));
                }
            }
        }
    }
    Ok(())
}
