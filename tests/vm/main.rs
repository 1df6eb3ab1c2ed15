//! Integration tests for Layer 2: VM
//!
//! Tests for image loading, the interpreter and the primitive library,
//! driven through assembled programs.

mod lists;
mod loader;
mod streams;
mod support;
