//! Pair and list primitives.

#![allow(clippy::cast_precision_loss)]

use sinter_foundation::{Result, Type, Value};
use sinter_heap::Heap;

use super::{count_arg, test};
use crate::vm::Vm;

/// Builds a list front to back without collecting the elements first.
pub(crate) struct ListBuilder {
    head: Value,
    last: Value,
}

impl ListBuilder {
    pub(crate) const fn new() -> Self {
        Self {
            head: Value::Null,
            last: Value::Null,
        }
    }

    pub(crate) fn push(&mut self, heap: &mut Heap, item: Value) -> Result<()> {
        let cell = heap.cons(item, Value::Null)?;
        if self.last.is_null() {
            self.head = cell;
        } else {
            heap.set_cdr(self.last, cell)?;
        }
        self.last = cell;
        Ok(())
    }

    pub(crate) const fn finish(self) -> Value {
        self.head
    }
}

// =============================================================================
// Pairs
// =============================================================================

/// List: pair
pub(crate) fn native_pair(vm: &mut Vm, args: &[Value]) -> Result<Value> {
    vm.heap.cons(args[0], args[1])
}

/// List: head
pub(crate) fn native_head(vm: &mut Vm, args: &[Value]) -> Result<Value> {
    vm.heap.car(args[0])
}

/// List: tail - the raw tail, which for a stream is its unforced thunk
pub(crate) fn native_tail(vm: &mut Vm, args: &[Value]) -> Result<Value> {
    vm.heap.cdr(args[0])
}

/// List: set_head
pub(crate) fn native_set_head(vm: &mut Vm, args: &[Value]) -> Result<Value> {
    vm.heap.set_car(args[0], args[1])?;
    Ok(Value::Undefined)
}

/// List: set_tail
pub(crate) fn native_set_tail(vm: &mut Vm, args: &[Value]) -> Result<Value> {
    vm.heap.set_cdr(args[0], args[1])?;
    Ok(Value::Undefined)
}

/// Array: array_length
pub(crate) fn native_array_length(vm: &mut Vm, args: &[Value]) -> Result<Value> {
    match vm.heap.elements(args[0])? {
        Some(items) => Ok(Value::Number(items.len() as f64)),
        None => Err(vm.heap.mismatch(Type::Array, args[0])),
    }
}

// =============================================================================
// Construction
// =============================================================================

/// List: list
pub(crate) fn native_list(vm: &mut Vm, args: &[Value]) -> Result<Value> {
    vm.heap.list(args)
}

/// List: build_list(n, f) - the list f(0), ..., f(n - 1)
pub(crate) fn native_build_list(vm: &mut Vm, args: &[Value]) -> Result<Value> {
    let n = count_arg(vm, args[0])?;
    let f = args[1];
    let mut out = ListBuilder::new();
    for i in 0..n {
        vm.charge_step()?;
        let item = vm.call_value(f, &[Value::Number(i as f64)])?;
        out.push(&mut vm.heap, item)?;
    }
    Ok(out.finish())
}

/// List: enum_list(start, end) - start, start + 1, ... up to end inclusive
pub(crate) fn native_enum_list(vm: &mut Vm, args: &[Value]) -> Result<Value> {
    let mut next = vm.number(args[0])?;
    let end = vm.number(args[1])?;
    let mut out = ListBuilder::new();
    while next <= end {
        vm.charge_step()?;
        out.push(&mut vm.heap, Value::Number(next))?;
        next += 1.0;
    }
    Ok(out.finish())
}

/// List: append - copies xs and shares ys
pub(crate) fn native_append(vm: &mut Vm, args: &[Value]) -> Result<Value> {
    vm.heap.append(args[0], args[1])
}

/// List: reverse
pub(crate) fn native_reverse(vm: &mut Vm, args: &[Value]) -> Result<Value> {
    vm.heap.reverse(args[0])
}

// =============================================================================
// Queries
// =============================================================================

/// List: length
pub(crate) fn native_length(vm: &mut Vm, args: &[Value]) -> Result<Value> {
    Ok(Value::Number(vm.heap.length(args[0])? as f64))
}

/// List: list_ref(xs, n)
pub(crate) fn native_list_ref(vm: &mut Vm, args: &[Value]) -> Result<Value> {
    let n = count_arg(vm, args[1])?;
    let mut xs = args[0];
    for _ in 0..n {
        vm.charge_step()?;
        xs = vm.heap.cdr(xs)?;
    }
    vm.heap.car(xs)
}

/// List: member(v, xs) - suffix starting at the first element equal to v
pub(crate) fn native_member(vm: &mut Vm, args: &[Value]) -> Result<Value> {
    vm.heap.member(args[0], args[1], vm.config.equality_limit)
}

/// List: remove(v, xs) - drops the first element equal to v
pub(crate) fn native_remove(vm: &mut Vm, args: &[Value]) -> Result<Value> {
    let limit = vm.config.equality_limit;
    vm.heap.remove(args[0], args[1], limit)
}

/// List: remove_all(v, xs) - drops every element equal to v
pub(crate) fn native_remove_all(vm: &mut Vm, args: &[Value]) -> Result<Value> {
    let limit = vm.config.equality_limit;
    vm.heap.remove_all(args[0], args[1], limit)
}

// =============================================================================
// Higher-order
// =============================================================================

/// List: map(f, xs)
pub(crate) fn native_map(vm: &mut Vm, args: &[Value]) -> Result<Value> {
    let f = args[0];
    let items = vm.heap.list_to_vec(args[1])?;
    let mut out = ListBuilder::new();
    for item in items {
        vm.charge_step()?;
        let mapped = vm.call_value(f, &[item])?;
        out.push(&mut vm.heap, mapped)?;
    }
    Ok(out.finish())
}

/// List: filter(pred, xs)
pub(crate) fn native_filter(vm: &mut Vm, args: &[Value]) -> Result<Value> {
    let pred = args[0];
    let items = vm.heap.list_to_vec(args[1])?;
    let mut out = ListBuilder::new();
    for item in items {
        vm.charge_step()?;
        if test(vm, pred, item)? {
            out.push(&mut vm.heap, item)?;
        }
    }
    Ok(out.finish())
}

/// List: for_each(f, xs) - returns true
pub(crate) fn native_for_each(vm: &mut Vm, args: &[Value]) -> Result<Value> {
    let f = args[0];
    for item in vm.heap.list_to_vec(args[1])? {
        vm.charge_step()?;
        vm.call_value(f, &[item])?;
    }
    Ok(Value::Boolean(true))
}

/// List: accumulate(f, initial, xs) - right fold
pub(crate) fn native_accumulate(vm: &mut Vm, args: &[Value]) -> Result<Value> {
    let f = args[0];
    let mut acc = args[1];
    for item in vm.heap.list_to_vec(args[2])?.into_iter().rev() {
        vm.charge_step()?;
        acc = vm.call_value(f, &[item, acc])?;
    }
    Ok(acc)
}
