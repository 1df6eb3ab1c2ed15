//! Integration tests for image loading
//!
//! Tests header validation, the constant pool and malformed code.

use std::rc::Rc;

use sinter_foundation::{ErrorKind, Fault};
use sinter_vm::program::{HEADER_LEN, MAGIC};
use sinter_vm::{Assembler, Code, FunctionHeader, Program};

use crate::support::vm;

fn minimal() -> Vec<u8> {
    let mut asm = Assembler::new();
    let mut code = Code::new();
    code.undefined().ret();
    let main = asm.function(FunctionHeader::new(1, 0, 0), code);
    asm.finish(main).unwrap()
}

/// Header with `entry` and no constants, followed by one function whose
/// body is `code`.
fn handmade(code: &[u8]) -> Vec<u8> {
    let mut image = Vec::new();
    image.extend(MAGIC.to_le_bytes());
    image.extend(0_u16.to_le_bytes());
    image.extend(0_u16.to_le_bytes());
    image.extend(u32::try_from(HEADER_LEN).unwrap().to_le_bytes());
    image.extend(0_u32.to_le_bytes());
    image.extend(FunctionHeader::new(4, 0, 0).to_bytes());
    image.extend(code);
    image
}

fn assert_invalid(bytes: &[u8]) {
    let err = Program::parse(bytes).unwrap_err();
    assert!(
        matches!(err.kind, ErrorKind::InvalidProgram(_)),
        "unexpected {err}"
    );
    assert_eq!(err.fault(), Fault::InvalidProgram);
}

#[test]
fn assembled_images_load() {
    let program = Program::parse(&minimal()).unwrap();
    assert_eq!(program.version(), (0, 0));
    assert_eq!(program.entry() as usize, HEADER_LEN);
}

#[test]
fn short_and_foreign_images_are_rejected() {
    assert_invalid(&[]);
    assert_invalid(&minimal()[..HEADER_LEN - 1]);
    let mut image = minimal();
    image[0] ^= 0xFF;
    assert_invalid(&image);
}

#[test]
fn entry_must_name_a_function() {
    let mut image = minimal();
    image[8..12].copy_from_slice(&4096_u32.to_le_bytes());
    assert_invalid(&image);
    image[8..12].copy_from_slice(&2_u32.to_le_bytes());
    assert_invalid(&image);
}

#[test]
fn string_constants_are_addressable() {
    let mut asm = Assembler::new();
    let greeting = asm.string("héllo");
    let mut code = Code::new();
    code.string(greeting).ret();
    let main = asm.function(FunctionHeader::new(1, 0, 0), code);
    let program = Program::parse(&asm.finish(main).unwrap()).unwrap();
    assert_eq!(program.string_constant(HEADER_LEN as u32).unwrap(), "héllo");
    assert!(program.string_constant(0).is_err());
}

#[test]
fn constant_pool_is_validated() {
    let mut asm = Assembler::new();
    asm.string("abc");
    let mut code = Code::new();
    code.undefined().ret();
    let main = asm.function(FunctionHeader::new(1, 0, 0), code);
    let image = asm.finish(main).unwrap();

    // Constant header: type at 16, length at 18, data at 22.
    let mut no_nul = image.clone();
    no_nul[HEADER_LEN + 6 + 3] = b'!';
    assert_invalid(&no_nul);

    let mut overrun = image.clone();
    overrun[HEADER_LEN + 2..HEADER_LEN + 6].copy_from_slice(&u32::MAX.to_le_bytes());
    assert_invalid(&overrun);

    let mut unknown = image;
    unknown[HEADER_LEN..HEADER_LEN + 2].copy_from_slice(&9_u16.to_le_bytes());
    assert_invalid(&unknown);
}

#[test]
fn bad_code_faults_at_run_time() {
    let (mut vm, sink) = vm();
    let program = Program::parse(&handmade(&[0xFF])).unwrap();
    let err = vm.run(Rc::new(program)).unwrap_err();
    assert_eq!(err.fault(), Fault::InvalidProgram);
    assert!(sink.stderr_text().contains("invalid program"));
}

#[test]
fn running_off_the_end_faults() {
    let (mut vm, _) = vm();
    let program = Program::parse(&handmade(&[])).unwrap();
    let err = vm.run(Rc::new(program)).unwrap_err();
    assert_eq!(err.fault(), Fault::InvalidProgram);
}
