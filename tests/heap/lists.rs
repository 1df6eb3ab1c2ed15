//! Integration tests for list algorithms
//!
//! Tests construction, sharing, membership and removal over pairs.

use sinter_foundation::{ErrorKind, Value};
use sinter_heap::Heap;

const LIMIT: usize = 1 << 16;

fn heap() -> Heap {
    Heap::with_capacity(1 << 16)
}

fn numbers(heap: &mut Heap, ns: &[f64]) -> Value {
    let items: Vec<Value> = ns.iter().copied().map(Value::Number).collect();
    heap.list(&items).unwrap()
}

fn to_numbers(heap: &Heap, xs: Value) -> Vec<f64> {
    heap.list_to_vec(xs)
        .unwrap()
        .into_iter()
        .map(|v| v.as_number().unwrap())
        .collect()
}

#[test]
fn list_renders_as_nested_pairs() {
    let mut heap = heap();
    let xs = numbers(&mut heap, &[1.0, 2.0, 3.0]);
    assert_eq!(heap.render(xs).unwrap(), "[1, [2, [3, null]]]");
    assert_eq!(heap.length(xs).unwrap(), 3);
}

#[test]
fn append_shares_the_second_list() {
    let mut heap = heap();
    let xs = numbers(&mut heap, &[1.0, 2.0]);
    let ys = numbers(&mut heap, &[3.0]);
    let joined = heap.append(xs, ys).unwrap();
    assert_eq!(to_numbers(&heap, joined), vec![1.0, 2.0, 3.0]);
    let tail = heap.cdr(heap.cdr(joined).unwrap()).unwrap();
    assert!(heap.strict_equal(tail, ys).unwrap());
    assert!(!heap.strict_equal(joined, xs).unwrap());
    let same = heap.append(Value::Null, ys).unwrap();
    assert!(heap.strict_equal(same, ys).unwrap());
}

#[test]
fn reverse_copies() {
    let mut heap = heap();
    let xs = numbers(&mut heap, &[1.0, 2.0, 3.0]);
    let rev = heap.reverse(xs).unwrap();
    assert_eq!(to_numbers(&heap, rev), vec![3.0, 2.0, 1.0]);
    assert_eq!(to_numbers(&heap, xs), vec![1.0, 2.0, 3.0]);
}

#[test]
fn member_returns_the_matching_suffix() {
    let mut heap = heap();
    let xs = numbers(&mut heap, &[1.0, 2.0, 3.0]);
    let found = heap.member(Value::Number(2.0), xs, LIMIT).unwrap();
    assert_eq!(to_numbers(&heap, found), vec![2.0, 3.0]);
    assert!(heap.member(Value::Number(9.0), xs, LIMIT).unwrap().is_null());
}

#[test]
fn remove_takes_only_the_first_match() {
    let mut heap = heap();
    let xs = numbers(&mut heap, &[1.0, 2.0, 1.0, 2.0]);
    let removed = heap.remove(Value::Number(2.0), xs, LIMIT).unwrap();
    assert_eq!(to_numbers(&heap, removed), vec![1.0, 1.0, 2.0]);
    let untouched = heap.remove(Value::Number(7.0), xs, LIMIT).unwrap();
    assert!(heap.strict_equal(untouched, xs).unwrap());
}

#[test]
fn remove_all_filters_structurally() {
    let mut heap = heap();
    let xs = numbers(&mut heap, &[1.0, 2.0, 1.0, 2.0, 2.0, 4.0, 2.0, 5.0]);
    let kept = heap.remove_all(Value::Number(2.0), xs, LIMIT).unwrap();
    assert_eq!(to_numbers(&heap, kept), vec![1.0, 1.0, 4.0, 5.0]);

    let inner = numbers(&mut heap, &[1.0]);
    let probe = numbers(&mut heap, &[1.0]);
    let nested = heap.list(&[inner, Value::Number(3.0)]).unwrap();
    let kept = heap.remove_all(probe, nested, LIMIT).unwrap();
    assert_eq!(to_numbers(&heap, kept), vec![3.0]);
}

#[test]
fn improper_lists_are_type_errors() {
    let mut heap = heap();
    let dotted = heap.cons(Value::Number(1.0), Value::Number(2.0)).unwrap();
    assert!(!heap.is_list(dotted).unwrap());
    let err = heap.length(dotted).unwrap_err();
    assert!(matches!(err.kind, ErrorKind::TypeMismatch { .. }));
}

#[test]
fn cyclic_spines_are_not_lists() {
    let mut heap = heap();
    let xs = numbers(&mut heap, &[1.0, 2.0]);
    let last = heap.cdr(xs).unwrap();
    heap.set_cdr(last, xs).unwrap();
    assert!(!heap.is_list(xs).unwrap());
    assert!(heap.length(xs).is_err());
}

#[test]
fn two_element_arrays_act_as_pairs() {
    let mut heap = heap();
    let tail = heap.array(vec![Value::Number(2.0), Value::Null]).unwrap();
    let xs = heap.array(vec![Value::Number(1.0), tail]).unwrap();
    assert!(heap.is_list(xs).unwrap());
    assert_eq!(to_numbers(&heap, xs), vec![1.0, 2.0]);
}
