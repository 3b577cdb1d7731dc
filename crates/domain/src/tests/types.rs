// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use crate::{BedSelection, BucketSpec, Composition, DomainError, RoomType};

#[test]
fn test_room_type_creation() {
    let room_type: RoomType = RoomType::new("4-person").unwrap();
    assert_eq!(room_type.as_str(), "4-person");
    assert_eq!(room_type.to_string(), "4-person");
}

#[test]
fn test_room_type_is_trimmed() {
    let room_type: RoomType = RoomType::new("  8-person ").unwrap();
    assert_eq!(room_type.as_str(), "8-person");
}

#[test]
fn test_room_type_rejects_empty() {
    let result: Result<RoomType, DomainError> = RoomType::new("   ");
    assert!(matches!(result, Err(DomainError::InvalidRoomType(_))));
}

#[test]
fn test_room_type_parses_from_str() {
    let room_type: RoomType = "suite_2".parse().unwrap();
    assert_eq!(room_type, RoomType::new("suite_2").unwrap());
}

#[test]
fn test_room_type_deserialization_validates() {
    let ok: RoomType = serde_json::from_str("\"4-person\"").unwrap();
    assert_eq!(ok.as_str(), "4-person");

    let bad: Result<RoomType, serde_json::Error> = serde_json::from_str("\"four person\"");
    assert!(bad.is_err());
}

#[test]
fn test_new_bed_selection_is_unconfirmed_and_unpersisted() {
    let selection: BedSelection = BedSelection::new(7, 3, 12);
    assert_eq!(selection.selection_id, None);
    assert_eq!(selection.student_id, 7);
    assert_eq!(selection.room_id, 3);
    assert_eq!(selection.bed_id, 12);
    assert!(!selection.is_confirmed);
    assert_eq!(selection.selected_at, None);
}

#[test]
fn test_uniform_composition_is_unbounded() {
    let composition: Composition = Composition::Uniform {
        room_type: RoomType::new("4-person").unwrap(),
        group_size: 4,
    };
    assert_eq!(composition.capacity(), None);
}

#[test]
fn test_bucket_composition_capacity() {
    let composition: Composition = Composition::Buckets {
        buckets: vec![
            BucketSpec {
                room_type: RoomType::new("4").unwrap(),
                group_count: 2,
                group_size: 4,
            },
            BucketSpec {
                room_type: RoomType::new("8").unwrap(),
                group_count: 1,
                group_size: 8,
            },
        ],
    };
    assert_eq!(composition.capacity(), Some(16));
}

#[test]
fn test_composition_json_shape() {
    let composition: Composition = Composition::Uniform {
        room_type: RoomType::new("4-person").unwrap(),
        group_size: 4,
    };
    let json: String = serde_json::to_string(&composition).unwrap();
    assert_eq!(
        json,
        r#"{"kind":"uniform","room_type":"4-person","group_size":4}"#
    );
}
