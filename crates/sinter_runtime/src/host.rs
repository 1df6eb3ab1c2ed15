//! The embedder-facing entry points.
//!
//! A [`Host`] owns one arena. The embedder carves regions out of it with
//! [`Host::allocate`], copies a bytecode image into one and hands its
//! location to [`Host::run`]. Every object a run creates is released when
//! the run ends; regions the embedder allocated stay until released.

use std::rc::Rc;

use sinter_foundation::{Error, Result};
use sinter_heap::{Handle, Heap};
use sinter_vm::{CancelHandle, InternalFn, OutputSink, Program, Vm, VmConfig};

use crate::outcome::{ResultValue, RunOutcome};

/// Default arena size in bytes.
pub const DEFAULT_HEAP_SIZE: u32 = 1 << 20;

/// Configuration for a [`Host`].
#[derive(Debug, Clone)]
pub struct HostConfig {
    /// Arena size for the initial [`Host::init_heap`]. Zero leaves the
    /// heap uninitialised.
    pub heap_size: u32,
    /// Interpreter bounds.
    pub vm: VmConfig,
}

impl Default for HostConfig {
    fn default() -> Self {
        Self {
            heap_size: DEFAULT_HEAP_SIZE,
            vm: VmConfig::default(),
        }
    }
}

impl HostConfig {
    /// Creates the default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder method to set the arena size.
    #[must_use]
    pub fn with_heap_size(mut self, bytes: u32) -> Self {
        self.heap_size = bytes;
        self
    }

    /// Builder method to set the interpreter configuration.
    #[must_use]
    pub fn with_vm(mut self, vm: VmConfig) -> Self {
        self.vm = vm;
        self
    }
}

/// An arena and the interpreter that runs programs stored in it.
pub struct Host {
    vm: Vm,
}

impl Host {
    /// Creates a host writing to the process's standard streams.
    #[must_use]
    pub fn new(config: HostConfig) -> Self {
        let mut heap = Heap::new();
        if config.heap_size > 0 {
            heap.init(config.heap_size);
        }
        Self {
            vm: Vm::new(heap, config.vm),
        }
    }

    /// Builder method to redirect program output.
    #[must_use]
    pub fn with_output(mut self, output: impl OutputSink + 'static) -> Self {
        self.vm.set_output(output);
        self
    }

    /// Borrows the interpreter.
    #[must_use]
    pub fn vm(&self) -> &Vm {
        &self.vm
    }

    /// Mutably borrows the interpreter.
    pub fn vm_mut(&mut self) -> &mut Vm {
        &mut self.vm
    }

    /// Registers an internal function callable with `call.v`.
    pub fn register_internal(&mut self, function: InternalFn) -> Result<u8> {
        self.vm.register_internal(function)
    }

    /// Returns a handle that cancels the current or next run.
    #[must_use]
    pub fn cancel_handle(&self) -> CancelHandle {
        self.vm.cancel_handle()
    }

    // =========================================================================
    // Arena
    // =========================================================================

    /// (Re)initialises the arena with `size` bytes.
    ///
    /// Every handle obtained before this call becomes invalid.
    pub fn init_heap(&mut self, size: u32) {
        tracing::debug!(size, "init_heap");
        self.vm.heap_mut().init(size);
    }

    /// Allocates a zeroed region, returning its handle or 0 when the arena
    /// is exhausted or uninitialised.
    pub fn allocate(&mut self, size: u32) -> u32 {
        match self.try_allocate(size) {
            Ok(handle) => handle.offset(),
            Err(err) => {
                tracing::debug!(size, %err, "allocation failed");
                0
            }
        }
    }

    /// Allocates a zeroed region.
    pub fn try_allocate(&mut self, size: u32) -> Result<Handle> {
        self.vm.heap_mut().arena_mut().allocate(size)
    }

    /// Returns a region to the arena.
    pub fn release(&mut self, handle: u32) -> Result<()> {
        tracing::debug!(handle, "release");
        self.vm
            .heap_mut()
            .arena_mut()
            .release(Handle::from_raw(handle))
    }

    /// Borrows a region.
    pub fn region(&self, handle: u32) -> Result<&[u8]> {
        self.vm.heap().arena().bytes(Handle::from_raw(handle))
    }

    /// Mutably borrows a region.
    pub fn region_mut(&mut self, handle: u32) -> Result<&mut [u8]> {
        self.vm
            .heap_mut()
            .arena_mut()
            .bytes_mut(Handle::from_raw(handle))
    }

    /// Copies `bytes` to the start of a region.
    pub fn write(&mut self, handle: u32, bytes: &[u8]) -> Result<()> {
        let region = self.region_mut(handle)?;
        let capacity = region.len();
        region
            .get_mut(..bytes.len())
            .ok_or_else(|| {
                Error::internal(format!(
                    "{} bytes do not fit in a region of {capacity}",
                    bytes.len()
                ))
            })?
            .copy_from_slice(bytes);
        Ok(())
    }

    /// Allocates a region holding `image` and returns its handle.
    pub fn load(&mut self, image: &[u8]) -> Result<u32> {
        let length = u32::try_from(image.len())
            .map_err(|_| Error::invalid_program("image larger than the address space"))?;
        let handle = self.try_allocate(length)?.offset();
        self.write(handle, image)?;
        Ok(handle)
    }

    // =========================================================================
    // Running
    // =========================================================================

    /// Runs the image stored in the first `length` bytes of region
    /// `handle`.
    ///
    /// Always returns a terminal status. On an error halt one diagnostic
    /// has been written to the error sink.
    pub fn run(&mut self, handle: u32, length: u32) -> RunOutcome {
        let span = tracing::debug_span!("host_run", handle, length);
        let _guard = span.enter();

        let program = match self.program_at(handle, length) {
            Ok(program) => program,
            Err(err) => {
                tracing::warn!(%err, "rejected program");
                self.report(&err);
                return RunOutcome::faulted(&err);
            }
        };

        let result = self.vm.run(Rc::new(program));
        let outcome = match result.and_then(|value| ResultValue::from_value(self.vm.heap(), value))
        {
            Ok(value) => RunOutcome::halted(value),
            Err(err) => RunOutcome::faulted(&err),
        };

        if let Err(err) = self.vm.heap_mut().clear() {
            tracing::warn!(%err, "releasing run objects failed");
            return RunOutcome::faulted(&err);
        }
        tracing::debug!(fault = %outcome.fault, "host run finished");
        outcome
    }

    /// Loads `image` into a fresh region, runs it and releases the region.
    #[allow(clippy::cast_possible_truncation)]
    pub fn run_image(&mut self, image: &[u8]) -> RunOutcome {
        let handle = match self.load(image) {
            Ok(handle) => handle,
            Err(err) => {
                self.report(&err);
                return RunOutcome::faulted(&err);
            }
        };
        let length = image.len() as u32;
        let outcome = self.run(handle, length);
        if let Err(err) = self.release(handle) {
            tracing::warn!(handle, %err, "could not release program region");
        }
        outcome
    }

    fn report(&mut self, err: &Error) {
        let line = format!("{err} (fault {})\n", err.fault().code());
        self.vm.output().stderr(&line);
    }

    fn program_at(&self, handle: u32, length: u32) -> Result<Program> {
        let region = self.region(handle)?;
        let image = region.get(..length as usize).ok_or_else(|| {
            Error::invalid_program(format!(
                "image of {length} bytes overruns its region of {}",
                region.len()
            ))
        })?;
        Program::parse(image)
    }
}

impl Default for Host {
    fn default() -> Self {
        Self::new(HostConfig::default())
    }
}

impl std::fmt::Debug for Host {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Host")
            .field("heap_objects", &self.vm.heap().len())
            .field("arena_used", &self.vm.heap().arena().used())
            .finish_non_exhaustive()
    }
}
