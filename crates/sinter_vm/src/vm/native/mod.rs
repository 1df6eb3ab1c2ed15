//! Primitive function implementations for the VM.
//!
//! This module contains all 92 primitives organized by category:
//! - `list`: Pair and list functions
//! - `stream`: Lazy streams and thunk forcing
//! - `predicates`: Type predicates and structural equality
//! - `math`: The `math_*` library
//! - `io`: Printing, errors and host facilities
//!
//! Primitives are addressed by their index in [`PRIMITIVES`], which is
//! fixed by the bytecode format.

#[allow(clippy::unnecessary_wraps)]
mod io;
#[allow(clippy::unnecessary_wraps)]
mod list;
#[allow(clippy::unnecessary_wraps)]
mod math;
#[allow(clippy::unnecessary_wraps)]
mod predicates;
#[allow(clippy::unnecessary_wraps)]
mod stream;

#[allow(clippy::wildcard_imports)]
use io::*;
#[allow(clippy::wildcard_imports)]
use list::*;
#[allow(clippy::wildcard_imports)]
use math::*;
#[allow(clippy::wildcard_imports)]
use predicates::*;
#[allow(clippy::wildcard_imports)]
use stream::*;

pub(crate) use stream::force;

use sinter_foundation::{Arity, Result, Type, Value};

use super::Vm;

/// Signature shared by every primitive.
pub(crate) type NativeFn = fn(&mut Vm, &[Value]) -> Result<Value>;

/// A primitive's name, arity and implementation.
pub(crate) struct PrimitiveDef {
    pub(crate) name: &'static str,
    pub(crate) arity: Arity,
    pub(crate) func: NativeFn,
}

const fn def(name: &'static str, arity: Arity, func: NativeFn) -> PrimitiveDef {
    PrimitiveDef { name, arity, func }
}

/// Number of primitives.
pub const PRIMITIVE_COUNT: usize = 92;

const ONE: Arity = Arity::Exact(1);
const TWO: Arity = Arity::Exact(2);

static PRIMITIVES: [PrimitiveDef; PRIMITIVE_COUNT] = [
    def("accumulate", Arity::Exact(3), native_accumulate),
    def("append", TWO, native_append),
    def("array_length", ONE, native_array_length),
    def("build_list", TWO, native_build_list),
    def("build_stream", TWO, native_build_stream),
    def("display", Arity::Range(1, 2), native_display),
    def("draw_data", Arity::Variadic(0), native_draw_data),
    def("enum_list", TWO, native_enum_list),
    def("enum_stream", TWO, native_enum_stream),
    def("equal", TWO, native_equal),
    def("error", Arity::Range(1, 2), native_error),
    def("eval_stream", TWO, native_eval_stream),
    def("filter", TWO, native_filter),
    def("for_each", TWO, native_for_each),
    def("head", ONE, native_head),
    def("integers_from", ONE, native_integers_from),
    def("is_array", ONE, native_is_array),
    def("is_boolean", ONE, native_is_boolean),
    def("is_function", ONE, native_is_function),
    def("is_list", ONE, native_is_list),
    def("is_null", ONE, native_is_null),
    def("is_number", ONE, native_is_number),
    def("is_pair", ONE, native_is_pair),
    def("is_stream", ONE, native_is_stream),
    def("is_string", ONE, native_is_string),
    def("is_undefined", ONE, native_is_undefined),
    def("length", ONE, native_length),
    def("list", Arity::Variadic(0), native_list),
    def("list_ref", TWO, native_list_ref),
    def("list_to_stream", ONE, native_list_to_stream),
    def("list_to_string", ONE, native_list_to_string),
    def("map", TWO, native_map),
    def("math_abs", ONE, native_math_abs),
    def("math_acos", ONE, native_math_acos),
    def("math_acosh", ONE, native_math_acosh),
    def("math_asin", ONE, native_math_asin),
    def("math_asinh", ONE, native_math_asinh),
    def("math_atan", ONE, native_math_atan),
    def("math_atan2", TWO, native_math_atan2),
    def("math_atanh", ONE, native_math_atanh),
    def("math_cbrt", ONE, native_math_cbrt),
    def("math_ceil", ONE, native_math_ceil),
    def("math_clz32", ONE, native_math_clz32),
    def("math_cos", ONE, native_math_cos),
    def("math_cosh", ONE, native_math_cosh),
    def("math_exp", ONE, native_math_exp),
    def("math_expm1", ONE, native_math_expm1),
    def("math_floor", ONE, native_math_floor),
    def("math_fround", ONE, native_math_fround),
    def("math_hypot", Arity::Variadic(0), native_math_hypot),
    def("math_imul", TWO, native_math_imul),
    def("math_log", ONE, native_math_log),
    def("math_log1p", ONE, native_math_log1p),
    def("math_log2", ONE, native_math_log2),
    def("math_log10", ONE, native_math_log10),
    def("math_max", Arity::Variadic(0), native_math_max),
    def("math_min", Arity::Variadic(0), native_math_min),
    def("math_pow", TWO, native_math_pow),
    def("math_random", Arity::Exact(0), native_math_random),
    def("math_round", ONE, native_math_round),
    def("math_sign", ONE, native_math_sign),
    def("math_sin", ONE, native_math_sin),
    def("math_sinh", ONE, native_math_sinh),
    def("math_sqrt", ONE, native_math_sqrt),
    def("math_tan", ONE, native_math_tan),
    def("math_tanh", ONE, native_math_tanh),
    def("math_trunc", ONE, native_math_trunc),
    def("member", TWO, native_member),
    def("pair", TWO, native_pair),
    def("parse_int", TWO, native_parse_int),
    def("remove", TWO, native_remove),
    def("remove_all", TWO, native_remove_all),
    def("reverse", ONE, native_reverse),
    def("runtime", Arity::Exact(0), native_runtime),
    def("set_head", TWO, native_set_head),
    def("set_tail", TWO, native_set_tail),
    def("stream", Arity::Variadic(0), native_stream),
    def("stream_append", TWO, native_stream_append),
    def("stream_filter", TWO, native_stream_filter),
    def("stream_for_each", TWO, native_stream_for_each),
    def("stream_length", ONE, native_stream_length),
    def("stream_map", TWO, native_stream_map),
    def("stream_member", TWO, native_stream_member),
    def("stream_ref", TWO, native_stream_ref),
    def("stream_remove", TWO, native_stream_remove),
    def("stream_remove_all", TWO, native_stream_remove_all),
    def("stream_reverse", ONE, native_stream_reverse),
    def("stream_tail", ONE, native_stream_tail),
    def("stream_to_list", ONE, native_stream_to_list),
    def("tail", ONE, native_tail),
    def("stringify", ONE, native_stringify),
    def("prompt", Arity::Variadic(0), native_prompt),
];

/// Looks up a primitive by id.
pub(crate) fn primitive(id: u8) -> Option<&'static PrimitiveDef> {
    PRIMITIVES.get(usize::from(id))
}

/// Returns the id of the primitive called `name`.
#[must_use]
#[allow(clippy::cast_possible_truncation)]
pub fn primitive_id(name: &str) -> Option<u8> {
    PRIMITIVES
        .iter()
        .position(|def| def.name == name)
        .map(|index| index as u8)
}

/// Returns the name of primitive `id`.
#[must_use]
pub fn primitive_name(id: u8) -> Option<&'static str> {
    primitive(id).map(|def| def.name)
}

/// Returns the arity of primitive `id`.
#[must_use]
pub fn primitive_arity(id: u8) -> Option<Arity> {
    primitive(id).map(|def| def.arity)
}

// =============================================================================
// Argument helpers
// =============================================================================

/// Reads a non-negative integer count. Negative counts read as zero.
#[allow(clippy::cast_possible_truncation)]
#[allow(clippy::cast_sign_loss)]
pub(crate) fn count_arg(vm: &Vm, v: Value) -> Result<usize> {
    let n = vm.number(v)?;
    if n.fract() != 0.0 || n.is_nan() {
        return Err(vm.heap.mismatch(Type::Integer, v));
    }
    Ok(if n <= 0.0 { 0 } else { n as usize })
}

/// Calls a predicate and insists on a boolean answer.
pub(crate) fn test(vm: &mut Vm, pred: Value, v: Value) -> Result<bool> {
    let answer = vm.call_value(pred, &[v])?;
    vm.boolean(answer)
}
