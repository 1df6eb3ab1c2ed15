//! Host interface and command-line runner for Sinter.
//!
//! This crate provides:
//! - [`Host`] - Arena management and program execution for embedders
//! - [`RunOutcome`] - The terminal status of a run
//! - The `sinter` binary, which runs an SVML image from a file

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

mod host;
mod outcome;

pub use host::{DEFAULT_HEAP_SIZE, Host, HostConfig};
pub use outcome::{ResultValue, RunOutcome};
pub use sinter_vm::{BufferSink, CancelHandle, OutputSink, StdSink, VmConfig};
