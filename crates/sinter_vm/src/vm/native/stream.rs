//! Lazy streams.
//!
//! A stream is `null` or a pair whose tail is a nullary function returning
//! the rest of the stream. Native streams use [`Thunk`] objects for their
//! tails; user closures are accepted anywhere a tail is expected. Thunks
//! are not memoised, so forcing the same tail twice does the work twice.

#![allow(clippy::cast_precision_loss)]

use sinter_foundation::{Result, Type, Value};
use sinter_heap::{HeapObject, Thunk};

use super::list::ListBuilder;
use super::{count_arg, test};
use crate::vm::Vm;

// =============================================================================
// Building blocks
// =============================================================================

/// Allocates a stream pair whose tail is `thunk`.
fn stream_pair(vm: &mut Vm, head: Value, thunk: Thunk) -> Result<Value> {
    let tail = vm.heap.alloc(HeapObject::Thunk(thunk))?;
    vm.heap.cons(head, Value::Reference(tail))
}

/// Splits a non-empty stream into its head and tail function.
fn stream_parts(vm: &Vm, s: Value) -> Result<(Value, Value)> {
    vm.heap
        .pair_parts(s)?
        .ok_or_else(|| vm.heap.mismatch(Type::Stream, s))
}

/// Forces the tail of a non-empty stream.
fn force_tail(vm: &mut Vm, s: Value) -> Result<Value> {
    let (_, tail) = stream_parts(vm, s)?;
    vm.call_value(tail, &[])
}

/// Forces a whole stream into a vector. Diverges on infinite streams until
/// a step or heap limit stops it.
fn materialise(vm: &mut Vm, mut s: Value) -> Result<Vec<Value>> {
    let mut items = Vec::new();
    while !s.is_null() {
        vm.charge_step()?;
        let (head, tail) = stream_parts(vm, s)?;
        items.push(head);
        s = vm.call_value(tail, &[])?;
    }
    Ok(items)
}

fn list_stream(vm: &mut Vm, xs: Value) -> Result<Value> {
    if xs.is_null() {
        return Ok(Value::Null);
    }
    let (head, rest) = vm
        .heap
        .pair_parts(xs)?
        .ok_or_else(|| vm.heap.mismatch(Type::List, xs))?;
    stream_pair(vm, head, Thunk::ListTail { rest })
}

fn build_from(vm: &mut Vm, f: Value, next: f64, count: f64) -> Result<Value> {
    if next >= count {
        return Ok(Value::Null);
    }
    let head = vm.call_value(f, &[Value::Number(next)])?;
    stream_pair(
        vm,
        head,
        Thunk::BuildStream {
            f,
            next: next + 1.0,
            count,
        },
    )
}

fn enum_from(vm: &mut Vm, next: f64, end: f64) -> Result<Value> {
    if next > end {
        return Ok(Value::Null);
    }
    stream_pair(
        vm,
        Value::Number(next),
        Thunk::EnumRange {
            next: next + 1.0,
            end,
        },
    )
}

fn append_streams(vm: &mut Vm, a: Value, b: Value) -> Result<Value> {
    if a.is_null() {
        return Ok(b);
    }
    let (head, rest) = stream_parts(vm, a)?;
    stream_pair(vm, head, Thunk::Append { rest, other: b })
}

fn map_stream(vm: &mut Vm, f: Value, s: Value) -> Result<Value> {
    if s.is_null() {
        return Ok(Value::Null);
    }
    let (head, upstream) = stream_parts(vm, s)?;
    let mapped = vm.call_value(f, &[head])?;
    stream_pair(vm, mapped, Thunk::Map { f, upstream })
}

/// Forces `s` until an element satisfies `pred`.
fn filter_stream(vm: &mut Vm, pred: Value, mut s: Value) -> Result<Value> {
    while !s.is_null() {
        vm.charge_step()?;
        let (head, upstream) = stream_parts(vm, s)?;
        if test(vm, pred, head)? {
            return stream_pair(vm, head, Thunk::Filter { pred, upstream });
        }
        s = vm.call_value(upstream, &[])?;
    }
    Ok(Value::Null)
}

/// Produces the stream a native tail stands for.
pub(crate) fn force(vm: &mut Vm, thunk: Thunk) -> Result<Value> {
    match thunk {
        Thunk::ListTail { rest } => list_stream(vm, rest),
        Thunk::BuildStream { f, next, count } => build_from(vm, f, next, count),
        Thunk::IntegersFrom { next } => stream_pair(
            vm,
            Value::Number(next),
            Thunk::IntegersFrom { next: next + 1.0 },
        ),
        Thunk::EnumRange { next, end } => enum_from(vm, next, end),
        Thunk::Append { rest, other } => {
            let a = vm.call_value(rest, &[])?;
            append_streams(vm, a, other)
        }
        Thunk::Map { f, upstream } => {
            let s = vm.call_value(upstream, &[])?;
            map_stream(vm, f, s)
        }
        Thunk::Filter { pred, upstream } => {
            let s = vm.call_value(upstream, &[])?;
            filter_stream(vm, pred, s)
        }
    }
}

// =============================================================================
// Construction
// =============================================================================

/// Stream: stream(...)
pub(crate) fn native_stream(vm: &mut Vm, args: &[Value]) -> Result<Value> {
    let xs = vm.heap.list(args)?;
    list_stream(vm, xs)
}

/// Stream: list_to_stream
pub(crate) fn native_list_to_stream(vm: &mut Vm, args: &[Value]) -> Result<Value> {
    let xs = args[0];
    if !vm.heap.is_list(xs)? {
        return Err(vm.heap.mismatch(Type::List, xs));
    }
    list_stream(vm, xs)
}

/// Stream: build_stream(n, f) - f(0), ..., f(n - 1), each computed when
/// its pair is forced
pub(crate) fn native_build_stream(vm: &mut Vm, args: &[Value]) -> Result<Value> {
    let count = count_arg(vm, args[0])?;
    build_from(vm, args[1], 0.0, count as f64)
}

/// Stream: integers_from(n) - infinite
pub(crate) fn native_integers_from(vm: &mut Vm, args: &[Value]) -> Result<Value> {
    let n = vm.number(args[0])?;
    stream_pair(vm, Value::Number(n), Thunk::IntegersFrom { next: n + 1.0 })
}

/// Stream: enum_stream(start, end)
pub(crate) fn native_enum_stream(vm: &mut Vm, args: &[Value]) -> Result<Value> {
    let start = vm.number(args[0])?;
    let end = vm.number(args[1])?;
    enum_from(vm, start, end)
}

/// Stream: stream_append(a, b) - b is not touched until a runs out
pub(crate) fn native_stream_append(vm: &mut Vm, args: &[Value]) -> Result<Value> {
    append_streams(vm, args[0], args[1])
}

/// Stream: stream_map(f, s)
pub(crate) fn native_stream_map(vm: &mut Vm, args: &[Value]) -> Result<Value> {
    map_stream(vm, args[0], args[1])
}

/// Stream: stream_filter(pred, s)
pub(crate) fn native_stream_filter(vm: &mut Vm, args: &[Value]) -> Result<Value> {
    filter_stream(vm, args[0], args[1])
}

// =============================================================================
// Traversal
// =============================================================================

/// Stream: stream_tail - forces the tail
pub(crate) fn native_stream_tail(vm: &mut Vm, args: &[Value]) -> Result<Value> {
    force_tail(vm, args[0])
}

/// Stream: stream_ref(s, n)
pub(crate) fn native_stream_ref(vm: &mut Vm, args: &[Value]) -> Result<Value> {
    let n = count_arg(vm, args[1])?;
    let mut s = args[0];
    for _ in 0..n {
        vm.charge_step()?;
        s = force_tail(vm, s)?;
    }
    let (head, _) = stream_parts(vm, s)?;
    Ok(head)
}

/// Stream: eval_stream(s, n) - list of the first n elements
///
/// Forces exactly n - 1 tails.
pub(crate) fn native_eval_stream(vm: &mut Vm, args: &[Value]) -> Result<Value> {
    let n = count_arg(vm, args[1])?;
    let mut s = args[0];
    let mut out = ListBuilder::new();
    for i in 0..n {
        vm.charge_step()?;
        let (head, tail) = stream_parts(vm, s)?;
        out.push(&mut vm.heap, head)?;
        if i + 1 < n {
            s = vm.call_value(tail, &[])?;
        }
    }
    Ok(out.finish())
}

/// Stream: stream_length
pub(crate) fn native_stream_length(vm: &mut Vm, args: &[Value]) -> Result<Value> {
    let mut s = args[0];
    let mut length = 0_usize;
    while !s.is_null() {
        vm.charge_step()?;
        s = force_tail(vm, s)?;
        length += 1;
    }
    Ok(Value::Number(length as f64))
}

/// Stream: stream_to_list
pub(crate) fn native_stream_to_list(vm: &mut Vm, args: &[Value]) -> Result<Value> {
    let items = materialise(vm, args[0])?;
    vm.heap.list(&items)
}

/// Stream: stream_for_each(f, s) - returns true
pub(crate) fn native_stream_for_each(vm: &mut Vm, args: &[Value]) -> Result<Value> {
    let f = args[0];
    let mut s = args[1];
    while !s.is_null() {
        vm.charge_step()?;
        let (head, tail) = stream_parts(vm, s)?;
        vm.call_value(f, &[head])?;
        s = vm.call_value(tail, &[])?;
    }
    Ok(Value::Boolean(true))
}

/// Stream: stream_member(v, s) - the suffix whose head equals v, or null
pub(crate) fn native_stream_member(vm: &mut Vm, args: &[Value]) -> Result<Value> {
    let v = args[0];
    let mut s = args[1];
    let limit = vm.config.equality_limit;
    while !s.is_null() {
        vm.charge_step()?;
        let (head, tail) = stream_parts(vm, s)?;
        if vm.heap.equal(v, head, limit)? {
            return Ok(s);
        }
        s = vm.call_value(tail, &[])?;
    }
    Ok(Value::Null)
}

// =============================================================================
// Rebuilding
// =============================================================================

/// Index of the first element structurally equal to `v`.
fn position_equal(vm: &Vm, v: Value, items: &[Value]) -> Result<Option<usize>> {
    let limit = vm.config.equality_limit;
    for (index, &item) in items.iter().enumerate() {
        if vm.heap.equal(v, item, limit)? {
            return Ok(Some(index));
        }
    }
    Ok(None)
}

/// Stream: stream_remove(v, s) - drops the first element equal to v
pub(crate) fn native_stream_remove(vm: &mut Vm, args: &[Value]) -> Result<Value> {
    let v = args[0];
    let mut items = materialise(vm, args[1])?;
    if let Some(index) = position_equal(vm, v, &items)? {
        items.remove(index);
    }
    let xs = vm.heap.list(&items)?;
    list_stream(vm, xs)
}

/// Stream: stream_remove_all(v, s) - drops every element equal to v
pub(crate) fn native_stream_remove_all(vm: &mut Vm, args: &[Value]) -> Result<Value> {
    let v = args[0];
    let limit = vm.config.equality_limit;
    let mut kept = Vec::new();
    for item in materialise(vm, args[1])? {
        if !vm.heap.equal(v, item, limit)? {
            kept.push(item);
        }
    }
    let xs = vm.heap.list(&kept)?;
    list_stream(vm, xs)
}

/// Stream: stream_reverse
pub(crate) fn native_stream_reverse(vm: &mut Vm, args: &[Value]) -> Result<Value> {
    let mut items = materialise(vm, args[0])?;
    items.reverse();
    let xs = vm.heap.list(&items)?;
    list_stream(vm, xs)
}
