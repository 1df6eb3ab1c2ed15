//! Shared helpers for assembling and running test programs.

use std::rc::Rc;

use sinter_foundation::{Result, Value};
use sinter_heap::Heap;
use sinter_vm::{Assembler, BufferSink, Code, FunctionHeader, Program, Vm, VmConfig, primitive_id};

pub fn vm() -> (Vm, BufferSink) {
    let sink = BufferSink::new();
    let vm = Vm::new(Heap::with_capacity(1 << 20), VmConfig::default()).with_output(sink.clone());
    (vm, sink)
}

pub fn prim(name: &str) -> u8 {
    primitive_id(name).unwrap_or_else(|| panic!("no primitive named {name}"))
}

/// Assembles `main` as the entry function and runs it.
pub fn run_with(
    vm: &mut Vm,
    mut asm: Assembler,
    build: impl FnOnce(&mut Assembler, &mut Code),
) -> Result<Value> {
    let mut code = Code::new();
    build(&mut asm, &mut code);
    let main = asm.function(FunctionHeader::new(16, 4, 0), code);
    let image = asm.finish(main)?;
    vm.run(Rc::new(Program::parse(&image)?))
}

/// Runs a program and renders its result.
pub fn eval(build: impl FnOnce(&mut Assembler, &mut Code)) -> String {
    let (mut vm, _) = vm();
    let result = run_with(&mut vm, Assembler::new(), build).unwrap();
    vm.heap().render(result).unwrap()
}

/// Pushes `list(ns...)`.
pub fn push_list(code: &mut Code, ns: &[f64]) {
    for n in ns {
        code.number(*n);
    }
    code.call_primitive(prim("list"), u8::try_from(ns.len()).unwrap());
}
