//! Integration tests for Host
//!
//! Tests complete runs from image bytes to [`RunOutcome`].

use std::thread;

use sinter_foundation::{Fault, Value};
use sinter_runtime::{BufferSink, Host, HostConfig, ResultValue, RunOutcome, VmConfig};
use sinter_vm::{Assembler, Code, FunctionHeader, Vm, primitive_id};

fn prim(name: &str) -> u8 {
    primitive_id(name).unwrap_or_else(|| panic!("no primitive named {name}"))
}

fn host(config: HostConfig) -> (Host, BufferSink) {
    let sink = BufferSink::new();
    (Host::new(config).with_output(sink.clone()), sink)
}

fn image(build: impl FnOnce(&mut Assembler, &mut Code)) -> Vec<u8> {
    let mut asm = Assembler::new();
    let mut code = Code::new();
    build(&mut asm, &mut code);
    let main = asm.function(FunctionHeader::new(8, 2, 0), code);
    asm.finish(main).unwrap()
}

/// An image that loops forever.
fn spin() -> Vec<u8> {
    image(|_, code| {
        let top = code.label();
        code.bind(top).branch(top);
    })
}

// =============================================================================
// Normal Halts
// =============================================================================

#[test]
fn result_values_survive_the_run() {
    let (mut host, _) = host(HostConfig::default());
    let outcome = host.run_image(&image(|asm, code| {
        let s = asm.string("done");
        code.string(s).ret();
    }));
    assert_eq!(outcome, RunOutcome::halted(ResultValue::String("done".into())));

    let outcome = host.run_image(&image(|_, code| {
        code.number(6.0).number(7.0).mul().ret();
    }));
    assert_eq!(outcome.value, Some(ResultValue::Number(42.0)));
    assert_eq!(outcome.fault.code(), 0);
}

#[test]
fn display_goes_to_the_output_sink() {
    let (mut host, sink) = host(HostConfig::default());
    let outcome = host.run_image(&image(|asm, code| {
        let label = asm.string("answer:");
        code.number(42.0)
            .string(label)
            .call_primitive(prim("display"), 2)
            .pop()
            .undefined()
            .ret();
    }));
    assert!(outcome.is_ok());
    assert_eq!(outcome.value, Some(ResultValue::Undefined));
    assert_eq!(sink.take_stdout(), "answer: 42\n");
    assert_eq!(sink.take_stderr(), "");
}

#[test]
fn consecutive_runs_reuse_the_arena() {
    let (mut host, _) = host(HostConfig::new().with_heap_size(4096));
    let bytes = image(|_, code| {
        code.number(1.0)
            .number(40.0)
            .call_primitive(prim("enum_list"), 2)
            .call_primitive(prim("length"), 1)
            .ret();
    });
    for _ in 0..20 {
        assert_eq!(
            host.run_image(&bytes).value,
            Some(ResultValue::Number(40.0))
        );
    }
    assert_eq!(host.vm().heap().arena().used(), 0);
}

// =============================================================================
// Error Halts
// =============================================================================

#[test]
fn program_error_halts_with_its_message() {
    let (mut host, sink) = host(HostConfig::default());
    let outcome = host.run_image(&image(|asm, code| {
        let message = asm.string("bad input");
        code.string(message)
            .call_primitive(prim("error"), 1)
            .ret();
    }));
    assert_eq!(outcome.fault, Fault::ProgramError);
    assert!(outcome.value.is_none());
    assert!(sink.take_stderr().starts_with("bad input"));
}

#[test]
fn step_limit_stops_a_spinning_program() {
    let config = HostConfig::new().with_vm(VmConfig::new().with_step_limit(10_000));
    let (mut host, _) = host(config);
    assert_eq!(host.run_image(&spin()).fault, Fault::ExecutionLimit);
}

#[test]
fn cancellation_from_another_thread() {
    let (mut host, _) = host(HostConfig::default());
    let cancel = host.cancel_handle();
    thread::spawn(move || cancel.cancel()).join().unwrap();
    assert_eq!(host.run_image(&spin()).fault, Fault::ExecutionLimit);

    // The flag is consumed by the run it stopped.
    let outcome = host.run_image(&image(|_, code| {
        code.boolean(true).ret();
    }));
    assert_eq!(outcome.value, Some(ResultValue::Boolean(true)));
}

#[test]
fn arity_errors_are_reported() {
    let (mut host, sink) = host(HostConfig::default());
    let outcome = host.run_image(&image(|_, code| {
        code.call_primitive(prim("pair"), 0).ret();
    }));
    assert_eq!(outcome.fault, Fault::IncorrectArity);
    assert!(sink.take_stderr().starts_with("incorrect function arity"));
}

#[test]
fn oversized_images_do_not_fit() {
    let (mut host, _) = host(HostConfig::new().with_heap_size(64));
    let bytes = image(|_, code| {
        for _ in 0..32 {
            code.number(1.5);
        }
        code.ret();
    });
    assert_eq!(host.run_image(&bytes).fault, Fault::OutOfMemory);
}

// =============================================================================
// Regions
// =============================================================================

#[test]
fn embedder_regions_are_independent_of_runs() {
    let (mut host, _) = host(HostConfig::default());
    let scratch = host.allocate(16);
    host.write(scratch, b"keep").unwrap();
    let bytes = image(|_, code| {
        code.number(1.0)
            .call_primitive(prim("list"), 1)
            .ret();
    });
    let program = host.load(&bytes).unwrap();
    let length = u32::try_from(bytes.len()).unwrap();
    assert!(host.run(program, length).is_ok());
    assert!(host.run(program, length).is_ok());
    assert_eq!(&host.region(scratch).unwrap()[..4], b"keep");
    host.release(program).unwrap();
    host.release(scratch).unwrap();
    assert_eq!(host.vm().heap().arena().used(), 0);
}

#[test]
fn reinitialising_invalidates_regions() {
    let (mut host, _) = host(HostConfig::default());
    let handle = host.allocate(32);
    host.init_heap(2048);
    assert!(host.region(handle).is_err());
    assert!(host.release(handle).is_err());
}

#[test]
fn writes_past_a_region_fail() {
    let (mut host, _) = host(HostConfig::default());
    let handle = host.allocate(8);
    assert!(host.write(handle, &[0; 9]).is_err());
}

// =============================================================================
// Internal Functions
// =============================================================================

fn sum_args(_vm: &mut Vm, args: &[Value]) -> sinter_foundation::Result<Value> {
    Ok(Value::Number(args.iter().filter_map(Value::as_number).sum()))
}

#[test]
fn internal_functions_receive_arguments() {
    let (mut host, _) = host(HostConfig::default());
    let first = host.register_internal(sum_args).unwrap();
    assert_eq!(first, 0);
    let outcome = host.run_image(&image(|_, code| {
        code.number(1.0)
            .number(2.0)
            .number(3.0)
            .call_internal(first, 3)
            .ret();
    }));
    assert_eq!(outcome.value, Some(ResultValue::Number(6.0)));
}

#[test]
fn unregistered_internals_are_unbound() {
    let (mut host, _) = host(HostConfig::default());
    let outcome = host.run_image(&image(|_, code| {
        code.call_internal(3, 0).ret();
    }));
    assert_eq!(outcome.fault, Fault::UnboundReference);
}
