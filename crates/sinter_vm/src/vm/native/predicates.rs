//! Type predicates and structural equality.

use sinter_foundation::{Result, Value};
use sinter_heap::HeapObject;

use crate::vm::Vm;

/// Pred: is_array - arrays, including pairs
pub(crate) fn native_is_array(vm: &mut Vm, args: &[Value]) -> Result<Value> {
    let array = matches!(
        vm.heap.object(args[0])?,
        Some(HeapObject::Array(_) | HeapObject::Pair(_))
    );
    Ok(Value::Boolean(array))
}

/// Pred: is_boolean
pub(crate) fn native_is_boolean(_vm: &mut Vm, args: &[Value]) -> Result<Value> {
    Ok(Value::Boolean(args[0].is_boolean()))
}

/// Pred: is_function - closures and every kind of native function
pub(crate) fn native_is_function(vm: &mut Vm, args: &[Value]) -> Result<Value> {
    Ok(Value::Boolean(vm.heap.is_callable(args[0])?))
}

/// Pred: is_list - finite and null-terminated
pub(crate) fn native_is_list(vm: &mut Vm, args: &[Value]) -> Result<Value> {
    Ok(Value::Boolean(vm.heap.is_list(args[0])?))
}

/// Pred: is_null
pub(crate) fn native_is_null(_vm: &mut Vm, args: &[Value]) -> Result<Value> {
    Ok(Value::Boolean(args[0].is_null()))
}

/// Pred: is_number
pub(crate) fn native_is_number(_vm: &mut Vm, args: &[Value]) -> Result<Value> {
    Ok(Value::Boolean(args[0].is_number()))
}

/// Pred: is_pair
pub(crate) fn native_is_pair(vm: &mut Vm, args: &[Value]) -> Result<Value> {
    Ok(Value::Boolean(vm.heap.is_pair(args[0])?))
}

/// Pred: is_stream - `null`, or a pair whose tail is callable
///
/// Only the first pair is inspected; forcing the tail could diverge.
pub(crate) fn native_is_stream(vm: &mut Vm, args: &[Value]) -> Result<Value> {
    let v = args[0];
    if v.is_null() {
        return Ok(Value::Boolean(true));
    }
    let stream = match vm.heap.pair_parts(v)? {
        Some((_, tail)) => vm.heap.is_callable(tail)?,
        None => false,
    };
    Ok(Value::Boolean(stream))
}

/// Pred: is_string
pub(crate) fn native_is_string(vm: &mut Vm, args: &[Value]) -> Result<Value> {
    Ok(Value::Boolean(vm.heap.as_str(args[0])?.is_some()))
}

/// Pred: is_undefined
pub(crate) fn native_is_undefined(_vm: &mut Vm, args: &[Value]) -> Result<Value> {
    Ok(Value::Boolean(args[0].is_undefined()))
}

/// Pred: equal - structural equality
pub(crate) fn native_equal(vm: &mut Vm, args: &[Value]) -> Result<Value> {
    let limit = vm.config.equality_limit;
    Ok(Value::Boolean(vm.heap.equal(args[0], args[1], limit)?))
}
