//! Integration tests for the stream primitives
//!
//! Streams are pairs whose tail is a nullary function. Programs may build
//! them by hand from two-element arrays, which the library accepts too.

use sinter_vm::{Assembler, Code, FunctionHeader, FunctionId};

use crate::support::{eval, prim, push_list, run_with, vm};

/// `x => x * x`
fn square(asm: &mut Assembler) -> FunctionId {
    let mut code = Code::new();
    code.load_local(0).load_local(0).mul().ret();
    asm.function(FunctionHeader::new(2, 1, 1), code)
}

/// `x => x % 2 === 0`
fn even(asm: &mut Assembler) -> FunctionId {
    let mut code = Code::new();
    code.load_local(0).number(2.0).modulo().number(0.0).eq().ret();
    asm.function(FunctionHeader::new(2, 1, 1), code)
}

#[test]
fn build_stream_is_lazy_in_its_function() {
    let result = eval(|asm, code| {
        let square = square(asm);
        code.number(4.0)
            .closure(square)
            .call_primitive(prim("build_stream"), 2)
            .call_primitive(prim("stream_to_list"), 1)
            .ret();
    });
    assert_eq!(result, "[0, [1, [4, [9, null]]]]");
}

#[test]
fn list_to_stream_round_trips() {
    let result = eval(|_, code| {
        push_list(code, &[1.0, 2.0, 3.0]);
        code.call_primitive(prim("list_to_stream"), 1)
            .call_primitive(prim("stream_to_list"), 1)
            .ret();
    });
    assert_eq!(result, "[1, [2, [3, null]]]");
}

#[test]
fn stream_append_and_length() {
    let result = eval(|_, code| {
        code.number(1.0).number(2.0).call_primitive(prim("stream"), 2);
        code.number(3.0).call_primitive(prim("stream"), 1);
        code.call_primitive(prim("stream_append"), 2)
            .call_primitive(prim("stream_length"), 1)
            .ret();
    });
    assert_eq!(result, "3");
}

#[test]
fn stream_filter_over_an_infinite_stream() {
    let result = eval(|asm, code| {
        let even = even(asm);
        code.closure(even)
            .number(1.0)
            .call_primitive(prim("integers_from"), 1)
            .call_primitive(prim("stream_filter"), 2)
            .number(2.0)
            .call_primitive(prim("stream_ref"), 2)
            .ret();
    });
    assert_eq!(result, "6");
}

#[test]
fn stream_map_then_eval_stream() {
    let result = eval(|asm, code| {
        let square = square(asm);
        code.closure(square)
            .number(1.0)
            .call_primitive(prim("integers_from"), 1)
            .call_primitive(prim("stream_map"), 2)
            .number(3.0)
            .call_primitive(prim("eval_stream"), 2)
            .ret();
    });
    assert_eq!(result, "[1, [4, [9, null]]]");
}

#[test]
fn stream_map_and_filter_of_null_are_null() {
    let result = eval(|_, code| {
        code.null()
            .null()
            .call_primitive(prim("stream_map"), 2)
            .ret();
    });
    assert_eq!(result, "null");
}

#[test]
fn stream_member_returns_the_suffix() {
    let result = eval(|_, code| {
        code.number(3.0);
        code.number(1.0)
            .number(2.0)
            .number(3.0)
            .number(4.0)
            .call_primitive(prim("stream"), 4);
        code.call_primitive(prim("stream_member"), 2)
            .call_primitive(prim("stream_to_list"), 1)
            .ret();
    });
    assert_eq!(result, "[3, [4, null]]");
}

#[test]
fn stream_remove_variants() {
    let build = |primitive: &'static str| {
        move |_: &mut Assembler, code: &mut Code| {
            code.number(2.0);
            push_list(code, &[1.0, 2.0, 3.0, 2.0]);
            code.call_primitive(prim("list_to_stream"), 1)
                .call_primitive(prim(primitive), 2)
                .call_primitive(prim("stream_to_list"), 1)
                .ret();
        }
    };
    assert_eq!(eval(build("stream_remove")), "[1, [3, [2, null]]]");
    assert_eq!(eval(build("stream_remove_all")), "[1, [3, null]]");
}

#[test]
fn stream_reverse() {
    let result = eval(|_, code| {
        code.number(1.0)
            .number(2.0)
            .number(3.0)
            .call_primitive(prim("stream"), 3)
            .call_primitive(prim("stream_reverse"), 1)
            .call_primitive(prim("stream_to_list"), 1)
            .ret();
    });
    assert_eq!(result, "[3, [2, [1, null]]]");
}

#[test]
fn hand_built_array_streams_are_accepted() {
    let (mut vm, _) = vm();
    let mut asm = Assembler::new();
    // () => null
    let mut end = Code::new();
    end.null().ret();
    let end = asm.function(FunctionHeader::new(1, 0, 0), end);
    // () => [2, () => null]
    let mut second = Code::new();
    second.new_array().store_local(0);
    second.load_local(0).number(0.0).number(2.0).store_array();
    second.load_local(0).number(1.0).closure(end).store_array();
    second.load_local(0).ret();
    let second = asm.function(FunctionHeader::new(4, 1, 0), second);

    let result = run_with(&mut vm, asm, |_, code| {
        code.new_array().store_local(0);
        code.load_local(0).number(0.0).number(1.0).store_array();
        code.load_local(0).number(1.0).closure(second).store_array();
        code.load_local(0)
            .call_primitive(prim("stream_to_list"), 1)
            .ret();
    })
    .unwrap();
    assert_eq!(vm.heap().render(result).unwrap(), "[1, [2, null]]");
}

#[test]
fn is_stream_checks_the_tail() {
    let result = eval(|_, code| {
        code.number(1.0)
            .call_primitive(prim("integers_from"), 1)
            .call_primitive(prim("is_stream"), 1)
            .ret();
    });
    assert_eq!(result, "true");
    let result = eval(|_, code| {
        push_list(code, &[1.0, 2.0]);
        code.call_primitive(prim("is_stream"), 1).ret();
    });
    assert_eq!(result, "false");
}

#[test]
fn stream_for_each_displays_every_element() {
    let (mut vm, sink) = vm();
    let result = run_with(&mut vm, Assembler::new(), |_, code| {
        code.primitive(prim("display"))
            .number(1.0)
            .number(3.0)
            .call_primitive(prim("enum_stream"), 2)
            .call_primitive(prim("stream_for_each"), 2)
            .ret();
    })
    .unwrap();
    assert_eq!(vm.heap().render(result).unwrap(), "true");
    assert_eq!(sink.take_stdout(), "1\n2\n3\n");
}
