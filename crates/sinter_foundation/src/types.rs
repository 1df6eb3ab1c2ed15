//! Runtime type descriptors.

use std::fmt;

/// Runtime type of a value, or the shape a primitive expected.
///
/// The first group names concrete runtime types; the second group only
/// appears as the `expected` side of a type mismatch.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub enum Type {
    /// IEEE-754 double.
    Number,
    /// Boolean.
    Boolean,
    /// The empty list.
    Null,
    /// The absence of a value.
    Undefined,
    /// Immutable text.
    String,
    /// Two-slot cons cell.
    Pair,
    /// Mutable ordered sequence.
    Array,
    /// Any callable: closures, primitives, internal functions and thunks.
    Function,
    /// Variable frame.
    Environment,

    /// Null or a pair whose tail is a list.
    List,
    /// Null or a pair whose tail is callable.
    Stream,
    /// A number with no fractional part.
    Integer,
    /// Any value.
    Any,
}

impl Type {
    /// Returns the lowercase name used in diagnostics.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Number => "number",
            Self::Boolean => "boolean",
            Self::Null => "null",
            Self::Undefined => "undefined",
            Self::String => "string",
            Self::Pair => "pair",
            Self::Array => "array",
            Self::Function => "function",
            Self::Environment => "environment",
            Self::List => "list",
            Self::Stream => "stream",
            Self::Integer => "integer",
            Self::Any => "any",
        }
    }
}

impl fmt::Debug for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// Number of arguments a function accepts.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Arity {
    /// Exactly N arguments.
    Exact(usize),
    /// Between min and max arguments (inclusive).
    Range(usize, usize),
    /// At least N arguments, then any number more.
    Variadic(usize),
}

impl Arity {
    /// Checks whether `count` arguments satisfy this arity.
    #[must_use]
    pub const fn accepts(self, count: usize) -> bool {
        match self {
            Self::Exact(n) => count == n,
            Self::Range(min, max) => count >= min && count <= max,
            Self::Variadic(min) => count >= min,
        }
    }
}

impl fmt::Display for Arity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Exact(n) => write!(f, "{n}"),
            Self::Range(min, max) => write!(f, "{min} to {max}"),
            Self::Variadic(min) => write!(f, "at least {min}"),
        }
    }
}
