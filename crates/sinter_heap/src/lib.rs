//! Arena allocation and the heap object model for Sinter.
//!
//! This crate provides:
//! - [`Arena`] - A fixed-capacity byte arena with bump and free-list allocation
//! - [`HeapObject`] - Pairs, arrays, strings, closures, environments and thunks
//! - [`Heap`] - Slot storage for objects, charged against the arena, with
//!   identity and structural equality, list algorithms and printing

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod arena;
mod display;
pub mod heap;
mod list;
pub mod object;

pub use arena::{Arena, Handle};
pub use heap::Heap;
pub use object::{HeapObject, Thunk};
