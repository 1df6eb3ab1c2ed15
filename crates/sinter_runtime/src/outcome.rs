//! What a run hands back to the embedder.

use std::fmt;

use sinter_foundation::{Error, Fault, Result, Value, format_number};
use sinter_heap::{Heap, HeapObject};

/// A program's result, detached from the heap it was computed on.
///
/// Objects are released when a run ends, so arrays are carried as their
/// rendering.
#[derive(Debug, Clone, PartialEq)]
pub enum ResultValue {
    /// `undefined`
    Undefined,
    /// `null`
    Null,
    /// A boolean.
    Boolean(bool),
    /// A number.
    Number(f64),
    /// A string.
    String(String),
    /// A pair or array, rendered the way `display` prints it.
    Array(String),
    /// Any callable value.
    Function,
}

impl ResultValue {
    /// Converts a value produced by a run while its heap is still live.
    pub fn from_value(heap: &Heap, value: Value) -> Result<Self> {
        Ok(match value {
            Value::Undefined => Self::Undefined,
            Value::Null => Self::Null,
            Value::Boolean(b) => Self::Boolean(b),
            Value::Number(n) => Self::Number(n),
            Value::Reference(id) => match heap.get(id)? {
                HeapObject::String(text) => Self::String(text.to_string()),
                HeapObject::Pair(_) | HeapObject::Array(_) => Self::Array(heap.render(value)?),
                HeapObject::Closure { .. }
                | HeapObject::Primitive(_)
                | HeapObject::Internal(_)
                | HeapObject::Thunk(_) => Self::Function,
                HeapObject::Environment { .. } => {
                    return Err(Error::internal("a run returned an environment"));
                }
            },
        })
    }
}

impl fmt::Display for ResultValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Undefined => f.write_str("undefined"),
            Self::Null => f.write_str("null"),
            Self::Boolean(b) => write!(f, "{b}"),
            Self::Number(n) => f.write_str(&format_number(*n)),
            Self::String(text) | Self::Array(text) => f.write_str(text),
            Self::Function => f.write_str("<function>"),
        }
    }
}

/// Terminal status of a run.
#[derive(Debug, Clone, PartialEq)]
pub struct RunOutcome {
    /// The entry function's result; `None` after an error halt.
    pub value: Option<ResultValue>,
    /// [`Fault::None`] for a normal halt.
    pub fault: Fault,
}

impl RunOutcome {
    /// A normal halt.
    #[must_use]
    pub const fn halted(value: ResultValue) -> Self {
        Self {
            value: Some(value),
            fault: Fault::None,
        }
    }

    /// An error halt.
    #[must_use]
    pub fn faulted(error: &Error) -> Self {
        Self {
            value: None,
            fault: error.fault(),
        }
    }

    /// Returns true for a normal halt.
    #[must_use]
    pub fn is_ok(&self) -> bool {
        self.fault == Fault::None
    }
}
