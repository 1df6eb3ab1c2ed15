//! Core types for the Sinter virtual machine.
//!
//! This crate provides:
//! - [`Value`] - The tagged value shared by immediates and heap references
//! - [`HeapId`] - Opaque handles to heap objects
//! - [`Type`] - Runtime type descriptors used in diagnostics
//! - [`Error`] - Rich error types with context, and the [`Fault`] codes
//!   reported across the host boundary

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod error;
pub mod types;
pub mod value;

pub use error::{Error, ErrorContext, ErrorKind, ExecutionLimit, Fault, Result};
pub use types::{Arity, Type};
pub use value::{HeapId, Value, format_number};
