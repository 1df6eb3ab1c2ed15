//! Heap object variants.

#![allow(clippy::cast_possible_truncation)]

use sinter_foundation::{HeapId, Type, Value};

/// Bytes charged for every object header.
const HEADER_BYTES: u32 = 8;
/// Bytes charged per stored value.
const VALUE_BYTES: u32 = 8;

/// A heap-allocated object.
#[derive(Debug, Clone, PartialEq)]
pub enum HeapObject {
    /// A cons cell: `[car, cdr]`.
    Pair([Value; 2]),
    /// A mutable sequence of values.
    Array(Vec<Value>),
    /// Immutable text.
    String(Box<str>),
    /// A bytecode function together with the environment it closes over.
    Closure {
        /// Address of the function header in the program image.
        function: u32,
        /// Captured environment.
        env: HeapId,
    },
    /// A variable frame.
    Environment {
        /// Enclosing frame, `None` at the top level.
        parent: Option<HeapId>,
        /// Variable slots.
        slots: Vec<Value>,
    },
    /// A primitive function, by index into the primitive table.
    Primitive(u8),
    /// An embedder-registered internal function, by index.
    Internal(u8),
    /// A native stream tail.
    Thunk(Thunk),
}

/// State captured by a native stream tail.
///
/// Forcing a thunk is a pure function of this state: it builds a fresh pair
/// (or returns `null`) every time and never updates the thunk itself.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Thunk {
    /// Walks the remainder of a materialised list.
    ListTail {
        /// The rest of the list.
        rest: Value,
    },
    /// Indices `next..count` mapped through `f`.
    BuildStream {
        /// Element function.
        f: Value,
        /// Next index to produce.
        next: f64,
        /// Stream length.
        count: f64,
    },
    /// `next, next + 1, ...` without end.
    IntegersFrom {
        /// Next value to produce.
        next: f64,
    },
    /// `next..=end` in steps of one.
    EnumRange {
        /// Next value to produce.
        next: f64,
        /// Last value produced.
        end: f64,
    },
    /// The rest of a stream followed by another stream.
    Append {
        /// Tail function of the first stream.
        rest: Value,
        /// The second stream, untouched until `rest` runs out.
        other: Value,
    },
    /// The rest of a stream mapped through `f`.
    Map {
        /// Mapping function.
        f: Value,
        /// Tail function of the source stream.
        upstream: Value,
    },
    /// The rest of a stream filtered by `pred`.
    Filter {
        /// Predicate.
        pred: Value,
        /// Tail function of the source stream.
        upstream: Value,
    },
}

impl HeapObject {
    /// Returns the runtime type of the object.
    #[must_use]
    pub const fn type_of(&self) -> Type {
        match self {
            Self::Pair(_) => Type::Pair,
            Self::Array(_) => Type::Array,
            Self::String(_) => Type::String,
            Self::Closure { .. } | Self::Primitive(_) | Self::Internal(_) | Self::Thunk(_) => {
                Type::Function
            }
            Self::Environment { .. } => Type::Environment,
        }
    }

    /// Returns true for values that `call` accepts.
    #[must_use]
    pub const fn is_callable(&self) -> bool {
        matches!(self.type_of(), Type::Function)
    }

    /// Returns the elements of pairs and arrays.
    #[must_use]
    pub fn elements(&self) -> Option<&[Value]> {
        match self {
            Self::Pair(cell) => Some(cell),
            Self::Array(items) => Some(items),
            _ => None,
        }
    }

    /// Bytes this object is charged against the arena.
    #[must_use]
    pub fn footprint(&self) -> u32 {
        let payload = match self {
            Self::Pair(_) => 2 * VALUE_BYTES,
            Self::Array(items) => items.len() as u32 * VALUE_BYTES,
            Self::String(text) => text.len() as u32 + 1,
            Self::Closure { .. } => VALUE_BYTES,
            Self::Environment { slots, .. } => (slots.len() as u32 + 1) * VALUE_BYTES,
            Self::Primitive(_) | Self::Internal(_) => 0,
            Self::Thunk(_) => 3 * VALUE_BYTES,
        };
        HEADER_BYTES + payload
    }
}
