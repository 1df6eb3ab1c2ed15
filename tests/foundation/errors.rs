//! Integration tests for Error types
//!
//! Tests error construction, display, context and the fault mapping.

use sinter_foundation::{Error, ErrorContext, ErrorKind, ExecutionLimit, Fault, Type};

// =============================================================================
// Error Construction
// =============================================================================

#[test]
fn error_type_mismatch() {
    let err = Error::type_mismatch(Type::Pair, Type::Number);
    assert!(matches!(err.kind, ErrorKind::TypeMismatch { .. }));
    let msg = format!("{err}");
    assert!(msg.contains("pair"));
    assert!(msg.contains("number"));
}

#[test]
fn error_arity_mismatch() {
    let err = Error::arity_mismatch("2", 3);
    assert!(matches!(err.kind, ErrorKind::ArityMismatch { .. }));
    assert!(format!("{err}").contains('3'));
}

#[test]
fn error_unbound_reference() {
    let err = Error::unbound_reference("internal function 7");
    assert!(format!("{err}").contains("internal function 7"));
    assert_eq!(err.fault(), Fault::UnboundReference);
}

#[test]
fn error_allocation_failure() {
    let err = Error::allocation_failure(64, 8);
    let msg = format!("{err}");
    assert!(msg.contains("64"));
    assert!(msg.contains('8'));
    assert_eq!(err.fault(), Fault::OutOfMemory);
}

#[test]
fn error_limits() {
    let err = Error::limit_exceeded(ExecutionLimit::Steps { limit: 100 });
    assert!(format!("{err}").contains("100"));
    assert_eq!(err.fault(), Fault::ExecutionLimit);
}

// =============================================================================
// Context
// =============================================================================

#[test]
fn context_is_separate_from_message() {
    let context = ErrorContext::new()
        .with_pc(0x20)
        .with_function(0x10)
        .with_frame(0x44);
    let err = Error::internal("boom").with_context(context);
    assert_eq!(err.to_string(), "internal error: boom");
    let located = err.context.map(|c| c.to_string()).unwrap_or_default();
    assert_eq!(located, "at pc 0x20 in function 0x10\n  called from 0x44");
}

// =============================================================================
// Fault Codes
// =============================================================================

#[test]
fn fault_codes_cover_the_host_table() {
    let table = [
        (Fault::None, 0),
        (Fault::OutOfMemory, 1),
        (Fault::TypeError, 2),
        (Fault::DivideByZero, 3),
        (Fault::StackOverflow, 4),
        (Fault::StackUnderflow, 5),
        (Fault::UninitialisedLoad, 6),
        (Fault::InvalidLoad, 7),
        (Fault::InvalidProgram, 8),
        (Fault::InternalError, 9),
        (Fault::IncorrectArity, 10),
        (Fault::ProgramError, 11),
        (Fault::UninitialisedHeap, 12),
    ];
    for (fault, code) in table {
        assert_eq!(fault.code(), code, "{fault}");
    }
}

#[test]
fn kinds_map_onto_faults() {
    let cases = [
        (ErrorKind::StackUnderflow, Fault::StackUnderflow),
        (ErrorKind::StackOverflow { limit: 4 }, Fault::StackOverflow),
        (
            ErrorKind::IndexOutOfBounds {
                index: 3,
                length: 2,
            },
            Fault::InvalidLoad,
        ),
        (ErrorKind::InvalidProgram("bad".into()), Fault::InvalidProgram),
        (ErrorKind::InvalidRelease(8), Fault::InternalError),
        (ErrorKind::UninitialisedHeap, Fault::UninitialisedHeap),
        (ErrorKind::Unsupported("prompt".into()), Fault::TypeError),
        (ErrorKind::ProgramError("x".into()), Fault::ProgramError),
    ];
    for (kind, fault) in cases {
        assert_eq!(kind.fault(), fault, "{kind}");
    }
}

#[test]
fn fault_names_are_readable() {
    assert_eq!(Fault::IncorrectArity.to_string(), "incorrect function arity");
    assert_eq!(Fault::None.to_string(), "no fault");
}
