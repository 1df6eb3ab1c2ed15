//! Integration tests for Value
//!
//! Tests immediates, identity and number formatting.

use proptest::prelude::*;
use sinter_foundation::{HeapId, Type, Value, format_number};

// =============================================================================
// Immediates
// =============================================================================

#[test]
fn immediate_types() {
    assert_eq!(Value::Number(1.0).immediate_type(), Some(Type::Number));
    assert_eq!(Value::Boolean(true).immediate_type(), Some(Type::Boolean));
    assert_eq!(Value::Null.immediate_type(), Some(Type::Null));
    assert_eq!(Value::Undefined.immediate_type(), Some(Type::Undefined));
    assert_eq!(Value::Reference(HeapId::new(0)).immediate_type(), None);
}

#[test]
fn conversions() {
    assert_eq!(Value::from(3), Value::Number(3.0));
    assert_eq!(Value::from(false), Value::Boolean(false));
    assert_eq!(
        Value::from(HeapId::new(9)).as_reference(),
        Some(HeapId::new(9))
    );
}

#[test]
fn identity_follows_ieee() {
    assert!(Value::Number(0.0).identical(&Value::Number(-0.0)));
    assert!(!Value::Number(f64::NAN).identical(&Value::Number(f64::NAN)));
    assert!(!Value::Null.identical(&Value::Undefined));
    assert!(Value::Reference(HeapId::new(2)).identical(&Value::Reference(HeapId::new(2))));
}

#[test]
fn immediates_display() {
    assert_eq!(Value::Null.to_string(), "null");
    assert_eq!(Value::Undefined.to_string(), "undefined");
    assert_eq!(Value::Boolean(true).to_string(), "true");
    assert_eq!(Value::Number(-2.5).to_string(), "-2.5");
}

// =============================================================================
// Number Formatting
// =============================================================================

#[test]
fn numbers_print_like_javascript() {
    assert_eq!(format_number(42.0), "42");
    assert_eq!(format_number(-0.0), "0");
    assert_eq!(format_number(0.1), "0.1");
    assert_eq!(format_number(f64::NAN), "NaN");
    assert_eq!(format_number(f64::NEG_INFINITY), "-Infinity");
    assert_eq!(format_number(1e21), "1e+21");
    assert_eq!(format_number(1.5e-7), "1.5e-7");
}

proptest! {
    #[test]
    fn integers_print_without_fraction(n in -1_000_000_i32..1_000_000) {
        prop_assert_eq!(format_number(f64::from(n)), n.to_string());
    }

    #[test]
    fn finite_numbers_round_trip(n in -1e15_f64..1e15) {
        let printed = format_number(n);
        prop_assert_eq!(printed.parse::<f64>().ok(), Some(n));
    }
}
