//! Sinter - Embeddable SVML bytecode interpreter
//!
//! This crate re-exports all layers of the Sinter system for convenient access.
//! For detailed documentation, see the individual layer crates.
//!
//! # Architecture
//!
//! ```text
//! Layer 3: sinter_runtime    - Host interface, CLI runner
//! Layer 2: sinter_vm         - Program loader, assembler, interpreter, primitives
//! Layer 1: sinter_heap       - Arena allocator, heap objects
//! Layer 0: sinter_foundation - Core types (Value, Type, Error, Fault)
//! ```

pub use sinter_foundation as foundation;
pub use sinter_heap as heap;
pub use sinter_runtime as runtime;
pub use sinter_vm as vm;
