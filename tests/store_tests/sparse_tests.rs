//! Tests for SparseStore
//!
//! These tests verify:
//! - Round-trip of sequential writes under different geometries
//! - EOF and leaf-boundary clamping
//! - Trim and geometry reset
//! - Reads over never-materialized slots
//! - Memory limit handling

use std::sync::Arc;

use parking_lot::RwLock;
use scullkv::store::{Segment, SparseStore};
use scullkv::{Geometry, ScullError};

// =============================================================================
// Helper Functions
// =============================================================================

fn store(quantum: usize, qset: usize) -> SparseStore {
    SparseStore::with_geometry(Geometry::new(quantum, qset).unwrap())
}

fn pattern(len: usize) -> Vec<u8> {
    (0..len).map(|i| (i % 251) as u8).collect()
}

/// Write all of `data` starting at `pos`, looping over short writes
fn write_all(store: &mut SparseStore, mut pos: u64, data: &[u8]) -> u64 {
    let mut done = 0;
    while done < data.len() {
        let written = store.write(&mut pos, &data[done..]).unwrap();
        assert!(written > 0);
        done += written;
    }
    pos
}

/// Read from `pos` until `count` bytes or a zero-length transfer
fn read_all(store: &SparseStore, mut pos: u64, count: usize) -> Vec<u8> {
    let mut out = Vec::new();
    while out.len() < count {
        let chunk = store.read(&mut pos, count - out.len()).unwrap();
        if chunk.is_empty() {
            break;
        }
        out.extend_from_slice(&chunk);
    }
    out
}

// =============================================================================
// Round-trip Tests
// =============================================================================

#[test]
fn test_round_trip_unit_geometry() {
    let mut s = store(1, 1);
    let data = pattern(300);

    let end = write_all(&mut s, 0, &data);
    assert_eq!(end, 300);
    assert_eq!(s.size(), 300);

    // One segment per byte
    assert_eq!(s.stats().segments, 300);
    assert_eq!(read_all(&s, 0, 300), data);
}

#[test]
fn test_round_trip_default_geometry() {
    let mut s = SparseStore::with_geometry(Geometry::default());
    let data = pattern(10_000);

    write_all(&mut s, 0, &data);
    assert_eq!(s.size(), 10_000);

    let stats = s.stats();
    assert_eq!(stats.segments, 1);
    assert_eq!(stats.leaves, 3);

    assert_eq!(read_all(&s, 0, 10_000), data);
}

#[test]
fn test_round_trip_across_segments() {
    let mut s = store(4, 3);
    let data = pattern(100);

    write_all(&mut s, 0, &data);
    assert_eq!(s.stats().segments, 9); // ceil(100 / 12)

    assert_eq!(read_all(&s, 0, 100), data);
    assert_eq!(read_all(&s, 37, 20), data[37..57].to_vec());
}

#[test]
fn test_overwrite_keeps_size() {
    let mut s = store(8, 2);
    write_all(&mut s, 0, b"hello world");
    write_all(&mut s, 6, b"WORLD");

    assert_eq!(s.size(), 11);
    assert_eq!(read_all(&s, 0, 11), b"hello WORLD".to_vec());
}

// =============================================================================
// Clamping Tests
// =============================================================================

#[test]
fn test_read_at_eof_is_empty() {
    let mut s = store(8, 2);
    write_all(&mut s, 0, b"0123456789");

    let mut pos = 10;
    assert!(s.read(&mut pos, 5).unwrap().is_empty());
    assert_eq!(pos, 10);

    let mut pos = 1000;
    assert!(s.read(&mut pos, 5).unwrap().is_empty());
}

#[test]
fn test_read_clamped_to_size() {
    let mut s = store(8, 2);
    write_all(&mut s, 0, b"0123456789");

    let mut pos = 9;
    let chunk = s.read(&mut pos, 5).unwrap();
    assert_eq!(&chunk[..], b"9");
    assert_eq!(pos, 10);
}

#[test]
fn test_write_clamped_to_leaf_boundary() {
    let mut s = store(8, 4);
    let data = pattern(20);

    let mut pos = 0;
    assert_eq!(s.write(&mut pos, &data).unwrap(), 8);
    assert_eq!(pos, 8);
    assert_eq!(s.size(), 8);

    let mut pos = 5;
    assert_eq!(s.write(&mut pos, &data).unwrap(), 3);
    assert_eq!(pos, 8);
}

#[test]
fn test_read_clamped_to_leaf_boundary() {
    let mut s = store(8, 4);
    let data = pattern(20);
    write_all(&mut s, 0, &data);

    let mut pos = 3;
    let chunk = s.read(&mut pos, 20).unwrap();
    assert_eq!(&chunk[..], &data[3..8]);
    assert_eq!(pos, 8);

    let chunk = s.read(&mut pos, 20).unwrap();
    assert_eq!(&chunk[..], &data[8..16]);
    assert_eq!(pos, 16);
}

#[test]
fn test_looping_completes_transfer() {
    let mut s = store(3, 2);
    let data = pattern(50);

    let mut pos = 0;
    let mut calls = 0;
    while (pos as usize) < data.len() {
        let start = pos as usize;
        s.write(&mut pos, &data[start..]).unwrap();
        calls += 1;
    }
    assert_eq!(calls, 17); // ceil(50 / 3)
    assert_eq!(read_all(&s, 0, 50), data);
}

// =============================================================================
// Trim Tests
// =============================================================================

#[test]
fn test_trim_discards_content() {
    let mut s = store(4, 2);
    write_all(&mut s, 0, &pattern(40));

    s.trim();

    let mut pos = 0;
    assert!(s.read(&mut pos, 1).unwrap().is_empty());
    assert_eq!(s.size(), 0);
    assert!(s.is_empty());
    assert_eq!(s.stats().segments, 0);
}

#[test]
fn test_trim_empty_store_is_noop() {
    let mut s = store(4, 2);
    s.trim();
    s.trim();
    assert_eq!(s.size(), 0);
    assert_eq!(s.geometry(), Geometry::new(4, 2).unwrap());
}

#[test]
fn test_trim_restores_current_defaults() {
    let defaults = Arc::new(RwLock::new(Geometry::new(4, 2).unwrap()));
    let mut s = SparseStore::new(Arc::clone(&defaults), None);

    s.set_geometry(Geometry::new(16, 16).unwrap()).unwrap();
    write_all(&mut s, 0, &pattern(64));
    assert_eq!(s.stats().segments, 1);

    *defaults.write() = Geometry::new(2, 2).unwrap();
    s.trim();
    assert_eq!(s.geometry(), Geometry::new(2, 2).unwrap());

    // Behaves like a fresh store under the new defaults
    let mut pos = 0;
    assert_eq!(s.write(&mut pos, b"abc").unwrap(), 2);
    assert_eq!(s.stats().segments, 1);
}

#[test]
fn test_geometry_locked_while_non_empty() {
    let mut s = store(4, 2);
    write_all(&mut s, 0, b"data");

    let result = s.set_geometry(Geometry::new(8, 8).unwrap());
    assert!(matches!(result, Err(ScullError::GeometryLocked)));
    assert_eq!(s.geometry(), Geometry::new(4, 2).unwrap());

    s.trim();
    s.set_geometry(Geometry::new(8, 8).unwrap()).unwrap();
    assert_eq!(s.geometry().item_size(), 64);
}

// =============================================================================
// Sparse Hole Tests
// =============================================================================

#[test]
fn test_write_past_end_leaves_unreadable_hole() {
    let mut s = store(4, 2);

    // Item 1, slot 0: segment 0 is created but never given slots
    let mut pos = 8;
    s.write(&mut pos, b"xy").unwrap();
    assert_eq!(s.size(), 10);

    let mut pos = 0;
    assert!(s.read(&mut pos, 4).unwrap().is_empty());
    assert_eq!(pos, 0);

    let mut pos = 8;
    assert_eq!(&s.read(&mut pos, 4).unwrap()[..], b"xy");
}

#[test]
fn test_hole_in_materialized_segment() {
    let mut s = store(4, 2);

    // Slot 1 exists, slot 0 does not
    let mut pos = 4;
    s.write(&mut pos, b"abcd").unwrap();

    let mut pos = 0;
    assert!(s.read(&mut pos, 4).unwrap().is_empty());
    assert_eq!(s.stats().leaves, 1);
}

#[test]
fn test_sequential_writes_leave_no_holes() {
    let mut s = store(2, 2);
    let data = pattern(33);
    write_all(&mut s, 0, &data);

    for start in 0..33u64 {
        let mut pos = start;
        assert!(!s.read(&mut pos, 1).unwrap().is_empty(), "hole at {}", start);
    }
}

#[test]
fn test_zero_length_write_extends_size() {
    let mut s = store(4, 2);

    let mut pos = 6;
    assert_eq!(s.write(&mut pos, b"").unwrap(), 0);
    assert_eq!(pos, 6);
    assert_eq!(s.size(), 6);

    // The addressed slot was materialized, earlier ones were not
    assert_eq!(s.stats().leaves, 1);
    let mut pos = 0;
    assert!(s.read(&mut pos, 4).unwrap().is_empty());
    let mut pos = 4;
    assert_eq!(s.read(&mut pos, 4).unwrap().len(), 2);
}

// =============================================================================
// Memory Limit Tests
// =============================================================================

#[test]
fn test_memory_limit_reports_out_of_memory() {
    let g = Geometry::new(4, 2).unwrap();
    let first_write = Segment::NODE_COST + Segment::slots_cost(g) + 4;
    let defaults = Arc::new(RwLock::new(g));
    let mut s = SparseStore::new(defaults, Some(first_write + Segment::NODE_COST));

    let mut pos = 0;
    s.write(&mut pos, b"abcd").unwrap();

    // Needs segments 1..=3 but only one more fits
    let mut pos = 24;
    let result = s.write(&mut pos, b"zz");
    assert!(matches!(
        result,
        Err(ScullError::OutOfMemory { what: "segment" })
    ));
    assert_eq!(pos, 24);

    assert_eq!(s.size(), 4);
    assert_eq!(s.stats().segments, 1);
    assert_eq!(read_all(&s, 0, 4), b"abcd".to_vec());
}

#[test]
fn test_segments_kept_when_leaf_allocation_fails() {
    let g = Geometry::new(4, 2).unwrap();
    let first_write = Segment::NODE_COST + Segment::slots_cost(g) + 4;
    let mut s = SparseStore::new(
        Arc::new(RwLock::new(g)),
        Some(first_write + 3 * Segment::NODE_COST),
    );

    let mut pos = 0;
    s.write(&mut pos, b"abcd").unwrap();

    // Segments 1..=3 fit, the slot array of segment 3 does not
    let mut pos = 24;
    let result = s.write(&mut pos, b"zz");
    assert!(matches!(
        result,
        Err(ScullError::OutOfMemory { what: "slot array" })
    ));
    assert_eq!(s.size(), 4);
    assert_eq!(s.stats().segments, 4);
    assert_eq!(s.stats().leaves, 1);
}

#[test]
fn test_far_offset_write_fails_cleanly() {
    // No memory limit: the chain reservation itself must fail
    let mut s = store(1, 1);

    let mut pos = u64::MAX - 1;
    let result = s.write(&mut pos, b"x");
    assert!(matches!(
        result,
        Err(ScullError::OutOfMemory { what: "segment" }) | Err(ScullError::OffsetOverflow(_))
    ));
    assert_eq!(pos, u64::MAX - 1);
    assert_eq!(s.size(), 0);
    assert!(s.is_empty());

    // The store is still usable
    let mut pos = 0;
    assert_eq!(s.write(&mut pos, b"y").unwrap(), 1);
    assert_eq!(read_all(&s, 0, 1), b"y".to_vec());
}

#[test]
fn test_memory_limit_freed_by_trim() {
    let g = Geometry::new(4, 2).unwrap();
    let one_leaf = Segment::NODE_COST + Segment::slots_cost(g) + 4;
    let mut s = SparseStore::new(Arc::new(RwLock::new(g)), Some(one_leaf));

    let mut pos = 0;
    s.write(&mut pos, b"abcd").unwrap();
    assert!(s.write(&mut pos, b"efgh").is_err());

    s.trim();
    let mut pos = 4;
    s.write(&mut pos, b"efgh").unwrap();
    assert_eq!(s.stats().allocated_bytes, one_leaf);
}
