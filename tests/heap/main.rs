//! Integration tests for Layer 1: Heap
//!
//! Tests for the arena allocator and the object model built on it.

mod arena;
mod lists;
mod objects;
