//! Integration tests for heap objects
//!
//! Tests allocation accounting, equality and rendering.

use sinter_foundation::{ExecutionLimit, ErrorKind, Fault, Type, Value};
use sinter_heap::{Heap, HeapObject};

// =============================================================================
// Accounting
// =============================================================================

#[test]
fn objects_are_charged_to_the_arena() {
    let mut heap = Heap::with_capacity(1024);
    let before = heap.arena().used();
    heap.cons(Value::Null, Value::Null).unwrap();
    assert!(heap.arena().used() > before);
    heap.clear().unwrap();
    assert_eq!(heap.arena().used(), before);
    assert!(heap.is_empty());
}

#[test]
fn clear_keeps_embedder_regions() {
    let mut heap = Heap::with_capacity(1024);
    let region = heap.arena_mut().allocate(32).unwrap();
    heap.string("transient").unwrap();
    heap.clear().unwrap();
    assert!(heap.arena().is_live(region));
}

#[test]
fn heap_exhaustion_is_out_of_memory() {
    let mut heap = Heap::with_capacity(128);
    let err = (0..64)
        .map(|_| heap.cons(Value::Null, Value::Null))
        .find_map(Result::err)
        .unwrap();
    assert_eq!(err.fault(), Fault::OutOfMemory);
}

#[test]
fn uninitialised_heap_reports_it() {
    let mut heap = Heap::new();
    let err = heap.string("x").unwrap_err();
    assert_eq!(err.fault(), Fault::UninitialisedHeap);
}

// =============================================================================
// Arrays
// =============================================================================

#[test]
fn arrays_grow_by_one_at_the_end() {
    let mut heap = Heap::with_capacity(1024);
    let xs = heap.array(vec![]).unwrap();
    heap.set_element(xs, 0, Value::Number(1.0)).unwrap();
    heap.set_element(xs, 1, Value::Number(2.0)).unwrap();
    assert_eq!(heap.render(xs).unwrap(), "[1, 2]");
    let err = heap.set_element(xs, 5, Value::Null).unwrap_err();
    assert!(matches!(
        err.kind,
        ErrorKind::IndexOutOfBounds { index: 5, length: 2 }
    ));
    assert_eq!(heap.element(xs, 1).unwrap(), Value::Number(2.0));
}

#[test]
fn element_of_non_array_is_a_type_error() {
    let mut heap = Heap::with_capacity(1024);
    let s = heap.string("abc").unwrap();
    let err = heap.element(s, 0).unwrap_err();
    assert_eq!(err.fault(), Fault::TypeError);
}

// =============================================================================
// Equality
// =============================================================================

#[test]
fn strict_equality_is_identity_except_for_strings() {
    let mut heap = Heap::with_capacity(1024);
    let a = heap.string("same").unwrap();
    let b = heap.string("same").unwrap();
    assert!(heap.strict_equal(a, b).unwrap());
    let p = heap.list(&[Value::Number(1.0)]).unwrap();
    let q = heap.list(&[Value::Number(1.0)]).unwrap();
    assert!(!heap.strict_equal(p, q).unwrap());
    assert!(heap.strict_equal(p, p).unwrap());
}

#[test]
fn structural_equality() {
    let mut heap = Heap::with_capacity(4096);
    let p = heap.list(&[Value::Number(1.0), Value::Number(f64::NAN)]).unwrap();
    let q = heap.list(&[Value::Number(1.0), Value::Number(f64::NAN)]).unwrap();
    assert!(heap.equal(p, q, 1000).unwrap());
    let r = heap.list(&[Value::Number(1.0), Value::Number(2.0)]).unwrap();
    assert!(!heap.equal(p, r, 1000).unwrap());
    assert!(!heap.equal(Value::Null, Value::Undefined, 1000).unwrap());
}

#[test]
fn equality_of_cycles_terminates() {
    let mut heap = Heap::with_capacity(4096);
    let a = heap.cons(Value::Number(1.0), Value::Null).unwrap();
    heap.set_cdr(a, a).unwrap();
    assert!(heap.equal(a, a, 100).unwrap());

    let b = heap.cons(Value::Number(1.0), Value::Null).unwrap();
    heap.set_cdr(b, b).unwrap();
    assert!(heap.equal(a, b, 100).unwrap());

    let c = heap.cons(Value::Number(2.0), Value::Null).unwrap();
    heap.set_cdr(c, c).unwrap();
    assert!(!heap.equal(a, c, 100).unwrap());

    // Cycles of different period still agree element for element.
    let d1 = heap.cons(Value::Number(1.0), Value::Null).unwrap();
    let d2 = heap.cons(Value::Number(1.0), d1).unwrap();
    heap.set_cdr(d1, d2).unwrap();
    assert!(heap.equal(a, d1, 100).unwrap());
}

#[test]
fn equality_respects_comparison_limit() {
    let mut heap = Heap::with_capacity(4096);
    let items: Vec<Value> = (0..10).map(|n| Value::Number(f64::from(n))).collect();
    let p = heap.list(&items).unwrap();
    let q = heap.list(&items).unwrap();
    assert!(heap.equal(p, q, 1000).unwrap());
    let err = heap.equal(p, q, 5).unwrap_err();
    assert!(matches!(
        err.kind,
        ErrorKind::LimitExceeded(ExecutionLimit::EqualityComparisons { limit: 5 })
    ));
}

// =============================================================================
// Rendering
// =============================================================================

#[test]
fn rendering_marks_cycles() {
    let mut heap = Heap::with_capacity(4096);
    let xs = heap.array(vec![Value::Number(1.0)]).unwrap();
    heap.set_element(xs, 1, xs).unwrap();
    assert_eq!(heap.render(xs).unwrap(), "[1, ...<circular>]");
}

#[test]
fn rendering_atoms_and_functions() {
    let mut heap = Heap::with_capacity(4096);
    let f = heap.alloc(HeapObject::Primitive(0)).unwrap();
    assert_eq!(heap.render(Value::Reference(f)).unwrap(), "<function>");
    assert_eq!(heap.type_of(Value::Reference(f)).unwrap(), Type::Function);
    let s = heap.string("plain").unwrap();
    assert_eq!(heap.render(s).unwrap(), "plain");
    assert_eq!(heap.render(Value::Boolean(false)).unwrap(), "false");
    assert_eq!(heap.render(Value::Number(0.5)).unwrap(), "0.5");
}
