//! SVML bytecode interpreter for Sinter.
//!
//! This crate provides:
//! - [`Program`] - Loading and validating SVML images
//! - [`Opcode`] - The instruction set, with its binary encoding
//! - [`Assembler`] - Building images in memory
//! - [`Vm`] - The interpreter and its primitive library
//! - [`OutputSink`] - Where `display` and diagnostics go

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod assembler;
pub mod config;
pub mod opcode;
pub mod output;
pub mod program;
mod vm;

pub use assembler::{Assembler, Code, FunctionId, Label, StringId};
pub use config::VmConfig;
pub use opcode::Opcode;
pub use output::{BufferSink, OutputSink, StdSink};
pub use program::{FunctionHeader, Program};
pub use vm::{
    CancelHandle, InternalFn, PRIMITIVE_COUNT, Vm, primitive_arity, primitive_id, primitive_name,
};
