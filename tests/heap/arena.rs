//! Integration tests for Arena
//!
//! Tests allocation, release, reuse and exhaustion.

use proptest::prelude::*;
use sinter_foundation::{ErrorKind, Fault};
use sinter_heap::{Arena, Handle};

#[test]
fn uninitialised_arena_refuses_everything() {
    let mut arena = Arena::new();
    assert!(!arena.is_initialised());
    let err = arena.allocate(8).unwrap_err();
    assert_eq!(err.fault(), Fault::UninitialisedHeap);
}

#[test]
fn handles_are_never_zero() {
    let mut arena = Arena::with_capacity(256);
    for _ in 0..8 {
        assert_ne!(arena.allocate(8).unwrap().offset(), 0);
    }
}

#[test]
fn regions_start_zeroed() {
    let mut arena = Arena::with_capacity(256);
    let a = arena.allocate(16).unwrap();
    arena.bytes_mut(a).unwrap().fill(0xAA);
    arena.release(a).unwrap();
    let b = arena.allocate(16).unwrap();
    assert!(arena.bytes(b).unwrap().iter().all(|&byte| byte == 0));
}

#[test]
fn released_space_is_reused() {
    let mut arena = Arena::with_capacity(64);
    let first = arena.allocate(48).unwrap();
    assert!(arena.allocate(48).is_err());
    arena.release(first).unwrap();
    assert!(arena.allocate(48).is_ok());
}

#[test]
fn double_release_is_rejected() {
    let mut arena = Arena::with_capacity(64);
    let handle = arena.allocate(8).unwrap();
    arena.release(handle).unwrap();
    let err = arena.release(handle).unwrap_err();
    assert!(matches!(err.kind, ErrorKind::InvalidRelease(_)));
    assert!(arena.release(Handle::from_raw(0)).is_err());
}

#[test]
fn exhaustion_is_out_of_memory() {
    let mut arena = Arena::with_capacity(32);
    let err = arena.allocate(1024).unwrap_err();
    assert_eq!(err.fault(), Fault::OutOfMemory);
}

#[test]
fn reinit_discards_handles() {
    let mut arena = Arena::with_capacity(64);
    let handle = arena.allocate(8).unwrap();
    arena.init(128);
    assert!(!arena.is_live(handle));
    assert_eq!(arena.used(), 0);
    assert_eq!(arena.capacity(), 128);
}

proptest! {
    #[test]
    fn releasing_everything_restores_capacity(sizes in prop::collection::vec(1_u32..200, 1..40)) {
        let mut arena = Arena::with_capacity(1 << 16);
        let before = arena.available();
        let mut handles = Vec::new();
        for size in sizes {
            handles.push(arena.allocate(size).unwrap());
        }
        // Release in an interleaved order to exercise coalescing.
        let (evens, odds): (Vec<_>, Vec<_>) =
            handles.into_iter().enumerate().partition(|(i, _)| i % 2 == 0);
        for (_, handle) in evens.into_iter().chain(odds) {
            arena.release(handle).unwrap();
        }
        prop_assert_eq!(arena.used(), 0);
        prop_assert_eq!(arena.available(), before);
    }
}
