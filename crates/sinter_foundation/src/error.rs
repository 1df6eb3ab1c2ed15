//! Error types for the Sinter VM.
//!
//! Uses `thiserror` for ergonomic error definition with rich context.
//! Every [`ErrorKind`] also maps onto a numeric [`Fault`] so that embedders
//! speaking integer status codes can report the outcome of a run.

use std::fmt;

use thiserror::Error;

use crate::types::Type;

/// Result alias used throughout the VM.
pub type Result<T> = std::result::Result<T, Error>;

/// The main error type for VM operations.
#[derive(Debug, Error)]
#[error("{kind}")]
pub struct Error {
    /// The kind of error that occurred.
    pub kind: ErrorKind,
    /// Optional context about where the error occurred.
    pub context: Option<ErrorContext>,
}

impl Error {
    /// Creates a new error with the given kind.
    #[must_use]
    pub fn new(kind: ErrorKind) -> Self {
        Self {
            kind,
            context: None,
        }
    }

    /// Adds context to this error.
    #[must_use]
    pub fn with_context(mut self, context: ErrorContext) -> Self {
        self.context = Some(context);
        self
    }

    /// Returns the fault code for this error.
    #[must_use]
    pub fn fault(&self) -> Fault {
        self.kind.fault()
    }

    /// Creates an allocation failure error.
    #[must_use]
    pub fn allocation_failure(requested: usize, available: usize) -> Self {
        Self::new(ErrorKind::AllocationFailure {
            requested,
            available,
        })
    }

    /// Creates a type mismatch error.
    #[must_use]
    pub fn type_mismatch(expected: Type, actual: Type) -> Self {
        Self::new(ErrorKind::TypeMismatch { expected, actual })
    }

    /// Creates an arity mismatch error.
    #[must_use]
    pub fn arity_mismatch(expected: impl Into<String>, actual: usize) -> Self {
        Self::new(ErrorKind::ArityMismatch {
            expected: expected.into(),
            actual,
        })
    }

    /// Creates an unbound reference error.
    #[must_use]
    pub fn unbound_reference(name: impl Into<String>) -> Self {
        Self::new(ErrorKind::UnboundReference(name.into()))
    }

    /// Creates an invalid program error.
    #[must_use]
    pub fn invalid_program(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::InvalidProgram(message.into()))
    }

    /// Creates an execution limit error.
    #[must_use]
    pub fn limit_exceeded(limit: ExecutionLimit) -> Self {
        Self::new(ErrorKind::LimitExceeded(limit))
    }

    /// Creates an internal error.
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Internal(message.into()))
    }
}

/// Categorized error kinds for pattern matching.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ErrorKind {
    /// The arena has no room for the requested allocation.
    #[error("out of memory: requested {requested} bytes, {available} available")]
    AllocationFailure {
        /// Bytes requested.
        requested: usize,
        /// Bytes remaining in the arena.
        available: usize,
    },

    /// A value had the wrong runtime type.
    #[error("type error: expected {expected}, got {actual}")]
    TypeMismatch {
        /// The expected type.
        expected: Type,
        /// The actual type encountered.
        actual: Type,
    },

    /// A primitive, internal function or callee could not be resolved.
    #[error("unbound reference: {0}")]
    UnboundReference(String),

    /// Call-frame or operand-stack depth exceeded its bound.
    #[error("stack overflow: depth limit {limit} exceeded")]
    StackOverflow {
        /// The configured bound.
        limit: usize,
    },

    /// An instruction needed more operands than the stack held.
    #[error("stack underflow")]
    StackUnderflow,

    /// Wrong number of arguments to a function.
    #[error("incorrect function arity: expected {expected}, got {actual}")]
    ArityMismatch {
        /// Description of expected arity.
        expected: String,
        /// Actual number of arguments.
        actual: usize,
    },

    /// Index out of bounds.
    #[error("index out of bounds: {index} (length {length})")]
    IndexOutOfBounds {
        /// The index that was accessed.
        index: usize,
        /// The actual length of the collection.
        length: usize,
    },

    /// The bytecode image is malformed.
    #[error("invalid program: {0}")]
    InvalidProgram(String),

    /// A handle that is not live was passed to `release`.
    #[error("invalid release of handle {0}")]
    InvalidRelease(u32),

    /// An arena operation ran before `init_heap`.
    #[error("heap not initialised")]
    UninitialisedHeap,

    /// The program called `error`.
    #[error("{0}")]
    ProgramError(String),

    /// A primitive needs a host facility this runtime does not provide.
    #[error("unsupported primitive: {0}")]
    Unsupported(String),

    /// An execution limit (kill switch) was hit.
    #[error("limit exceeded: {0}")]
    LimitExceeded(ExecutionLimit),

    /// Internal error (should not happen).
    #[error("internal error: {0}")]
    Internal(String),
}

impl ErrorKind {
    /// Returns the fault code reported across the host boundary.
    #[must_use]
    pub const fn fault(&self) -> Fault {
        match self {
            Self::AllocationFailure { .. } => Fault::OutOfMemory,
            Self::TypeMismatch { .. } | Self::Unsupported(_) => Fault::TypeError,
            Self::UnboundReference(_) => Fault::UnboundReference,
            Self::StackOverflow { .. } => Fault::StackOverflow,
            Self::StackUnderflow => Fault::StackUnderflow,
            Self::ArityMismatch { .. } => Fault::IncorrectArity,
            Self::IndexOutOfBounds { .. } => Fault::InvalidLoad,
            Self::InvalidProgram(_) => Fault::InvalidProgram,
            Self::InvalidRelease(_) | Self::Internal(_) => Fault::InternalError,
            Self::UninitialisedHeap => Fault::UninitialisedHeap,
            Self::ProgramError(_) => Fault::ProgramError,
            Self::LimitExceeded(_) => Fault::ExecutionLimit,
        }
    }
}

/// Execution limits (kill switches) that can be exceeded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecutionLimit {
    /// The instruction budget ran out.
    Steps {
        /// The configured budget.
        limit: u64,
    },
    /// The embedder cancelled the run.
    Cancelled,
    /// Structural equality performed too many pairwise comparisons.
    EqualityComparisons {
        /// The configured bound.
        limit: usize,
    },
}

impl fmt::Display for ExecutionLimit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Steps { limit } => write!(f, "step budget ({limit}) exhausted"),
            Self::Cancelled => write!(f, "execution cancelled"),
            Self::EqualityComparisons { limit } => {
                write!(f, "structural equality exceeded {limit} comparisons")
            }
        }
    }
}

/// Numeric status of a finished run. `None` is a normal halt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Fault {
    /// Normal halt.
    None = 0,
    /// The arena was exhausted.
    OutOfMemory = 1,
    /// A value had the wrong type.
    TypeError = 2,
    /// Reserved: numeric division never faults.
    DivideByZero = 3,
    /// Frame or operand stack bound exceeded.
    StackOverflow = 4,
    /// Operand stack underflow.
    StackUnderflow = 5,
    /// Read of an uninitialised slot.
    UninitialisedLoad = 6,
    /// Out-of-range element access.
    InvalidLoad = 7,
    /// Malformed bytecode.
    InvalidProgram = 8,
    /// Internal error.
    InternalError = 9,
    /// Wrong argument count.
    IncorrectArity = 10,
    /// The program called `error`.
    ProgramError = 11,
    /// The heap was never initialised.
    UninitialisedHeap = 12,
    /// Step budget or cancellation.
    ExecutionLimit = 13,
    /// Unresolvable callee.
    UnboundReference = 14,
}

impl Fault {
    /// Returns the numeric code.
    #[must_use]
    pub const fn code(self) -> u8 {
        self as u8
    }

    /// Returns a short human-readable name.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::None => "no fault",
            Self::OutOfMemory => "out of memory",
            Self::TypeError => "type error",
            Self::DivideByZero => "divide by zero",
            Self::StackOverflow => "stack overflow",
            Self::StackUnderflow => "stack underflow",
            Self::UninitialisedLoad => "uninitialised load",
            Self::InvalidLoad => "invalid load",
            Self::InvalidProgram => "invalid program",
            Self::InternalError => "internal error",
            Self::IncorrectArity => "incorrect function arity",
            Self::ProgramError => "program called error()",
            Self::UninitialisedHeap => "uninitialised heap",
            Self::ExecutionLimit => "execution limit",
            Self::UnboundReference => "unbound reference",
        }
    }
}

impl fmt::Display for Fault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Context about where an error occurred.
#[derive(Debug, Clone, Default)]
pub struct ErrorContext {
    /// Address of the faulting instruction.
    pub pc: Option<usize>,
    /// Address of the executing function's header.
    pub function: Option<usize>,
    /// Return addresses of the active call frames, innermost first.
    pub stack: Vec<usize>,
}

impl ErrorContext {
    /// Creates a new empty context.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the faulting instruction address.
    #[must_use]
    pub fn with_pc(mut self, pc: usize) -> Self {
        self.pc = Some(pc);
        self
    }

    /// Sets the executing function.
    #[must_use]
    pub fn with_function(mut self, address: usize) -> Self {
        self.function = Some(address);
        self
    }

    /// Adds a stack frame.
    #[must_use]
    pub fn with_frame(mut self, return_address: usize) -> Self {
        self.stack.push(return_address);
        self
    }
}

impl fmt::Display for ErrorContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(pc) = self.pc {
            write!(f, "at pc 0x{pc:x}")?;
            if let Some(function) = self.function {
                write!(f, " in function 0x{function:x}")?;
            }
        }
        for frame in &self.stack {
            write!(f, "\n  called from 0x{frame:x}")?;
        }
        Ok(())
    }
}
