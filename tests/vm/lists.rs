//! Integration tests for the list primitives
//!
//! Each program mirrors a small source program and checks what it displays.

use sinter_vm::{Assembler, Code, FunctionHeader};

use crate::support::{eval, prim, push_list, run_with, vm};

#[test]
fn equal_compares_structure() {
    let result = eval(|_, code| {
        push_list(code, &[1.0, 2.0]);
        push_list(code, &[1.0, 2.0]);
        code.call_primitive(prim("equal"), 2).ret();
    });
    assert_eq!(result, "true");

    let result = eval(|asm, code| {
        let one = asm.string("1");
        code.number(1.0)
            .string(one)
            .call_primitive(prim("equal"), 2)
            .ret();
    });
    assert_eq!(result, "false");
}

#[test]
fn append_builds_one_list() {
    let result = eval(|_, code| {
        push_list(code, &[1.0, 2.0]);
        push_list(code, &[3.0, 4.0]);
        code.call_primitive(prim("append"), 2).ret();
    });
    assert_eq!(result, "[1, [2, [3, [4, null]]]]");
}

#[test]
fn remove_all_drops_every_match() {
    let result = eval(|_, code| {
        code.number(2.0);
        push_list(code, &[1.0, 2.0, 1.0, 2.0, 2.0, 4.0, 2.0, 5.0]);
        code.call_primitive(prim("remove_all"), 2).ret();
    });
    assert_eq!(result, "[1, [1, [4, [5, null]]]]");
}

#[test]
fn remove_and_member() {
    let result = eval(|_, code| {
        code.number(2.0);
        push_list(code, &[1.0, 2.0, 3.0, 2.0]);
        code.call_primitive(prim("remove"), 2).ret();
    });
    assert_eq!(result, "[1, [3, [2, null]]]");

    let result = eval(|_, code| {
        code.number(3.0);
        push_list(code, &[1.0, 2.0, 3.0, 4.0]);
        code.call_primitive(prim("member"), 2).ret();
    });
    assert_eq!(result, "[3, [4, null]]");
}

#[test]
fn enum_list_and_reverse() {
    let result = eval(|_, code| {
        code.number(1.0)
            .number(4.0)
            .call_primitive(prim("enum_list"), 2)
            .call_primitive(prim("reverse"), 1)
            .ret();
    });
    assert_eq!(result, "[4, [3, [2, [1, null]]]]");
}

#[test]
fn filter_with_a_closure() {
    let (mut vm, _) = vm();
    let mut asm = Assembler::new();
    // x => x % 2 === 0
    let mut even = Code::new();
    even.load_local(0).number(2.0).modulo().number(0.0).eq().ret();
    let even = asm.function(FunctionHeader::new(2, 1, 1), even);
    let result = run_with(&mut vm, asm, |_, code| {
        code.closure(even);
        push_list(code, &[1.0, 2.0, 3.0, 4.0]);
        code.call_primitive(prim("filter"), 2).ret();
    })
    .unwrap();
    assert_eq!(vm.heap().render(result).unwrap(), "[2, [4, null]]");
}

#[test]
fn build_list_calls_with_indices() {
    let (mut vm, _) = vm();
    let mut asm = Assembler::new();
    let mut square = Code::new();
    square.load_local(0).load_local(0).mul().ret();
    let square = asm.function(FunctionHeader::new(2, 1, 1), square);
    let result = run_with(&mut vm, asm, |_, code| {
        code.number(4.0)
            .closure(square)
            .call_primitive(prim("build_list"), 2)
            .ret();
    })
    .unwrap();
    assert_eq!(vm.heap().render(result).unwrap(), "[0, [1, [4, [9, null]]]]");
}

#[test]
fn list_to_string_renders() {
    let result = eval(|_, code| {
        push_list(code, &[1.5, 2.0]);
        code.call_primitive(prim("list_to_string"), 1).ret();
    });
    assert_eq!(result, "[1.5, [2, null]]");
}

#[test]
fn head_of_null_is_a_type_error() {
    let (mut vm, sink) = vm();
    let err = run_with(&mut vm, Assembler::new(), |_, code| {
        code.null().call_primitive(prim("head"), 1).ret();
    })
    .unwrap_err();
    assert_eq!(err.fault().code(), 2);
    assert!(sink.stderr_text().contains("pair"));
}
