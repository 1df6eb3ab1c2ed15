//! The `math_*` library.
//!
//! Everything operates on IEEE-754 doubles with JavaScript's edge-case
//! behaviour: `NaN` propagates, signed zeros are preserved and the 32-bit
//! integer operations wrap modulo 2^32.

#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_sign_loss)]
#![allow(clippy::cast_possible_wrap)]

use sinter_foundation::{Result, Value};

use crate::vm::Vm;

fn unary(vm: &Vm, args: &[Value], op: fn(f64) -> f64) -> Result<Value> {
    Ok(Value::Number(op(vm.number(args[0])?)))
}

fn numbers(vm: &Vm, args: &[Value]) -> Result<Vec<f64>> {
    args.iter().map(|v| vm.number(*v)).collect()
}

/// `ToUint32`: the value modulo 2^32, with non-finite values mapping to 0.
fn to_uint32(n: f64) -> u32 {
    if !n.is_finite() {
        return 0;
    }
    n.trunc().rem_euclid(4_294_967_296.0) as u32
}

/// `ToInt32`: `ToUint32` reinterpreted as two's complement.
fn to_int32(n: f64) -> i32 {
    to_uint32(n) as i32
}

// =============================================================================
// Rounding and sign
// =============================================================================

/// Math: abs
pub(crate) fn native_math_abs(vm: &mut Vm, args: &[Value]) -> Result<Value> {
    unary(vm, args, f64::abs)
}

/// Math: ceil
pub(crate) fn native_math_ceil(vm: &mut Vm, args: &[Value]) -> Result<Value> {
    unary(vm, args, f64::ceil)
}

/// Math: floor
pub(crate) fn native_math_floor(vm: &mut Vm, args: &[Value]) -> Result<Value> {
    unary(vm, args, f64::floor)
}

/// Math: round - halves round away from zero
pub(crate) fn native_math_round(vm: &mut Vm, args: &[Value]) -> Result<Value> {
    unary(vm, args, f64::round)
}

/// Math: trunc
pub(crate) fn native_math_trunc(vm: &mut Vm, args: &[Value]) -> Result<Value> {
    unary(vm, args, f64::trunc)
}

/// Math: fround - nearest single-precision value
pub(crate) fn native_math_fround(vm: &mut Vm, args: &[Value]) -> Result<Value> {
    unary(vm, args, |n| f64::from(n as f32))
}

/// Math: sign - keeps signed zeros and `NaN`
pub(crate) fn native_math_sign(vm: &mut Vm, args: &[Value]) -> Result<Value> {
    unary(vm, args, |n| {
        if n > 0.0 {
            1.0
        } else if n < 0.0 {
            -1.0
        } else {
            n
        }
    })
}

// =============================================================================
// Powers and logarithms
// =============================================================================

/// Math: cbrt
pub(crate) fn native_math_cbrt(vm: &mut Vm, args: &[Value]) -> Result<Value> {
    unary(vm, args, f64::cbrt)
}

/// Math: exp
pub(crate) fn native_math_exp(vm: &mut Vm, args: &[Value]) -> Result<Value> {
    unary(vm, args, f64::exp)
}

/// Math: expm1
pub(crate) fn native_math_expm1(vm: &mut Vm, args: &[Value]) -> Result<Value> {
    unary(vm, args, f64::exp_m1)
}

/// Math: log
pub(crate) fn native_math_log(vm: &mut Vm, args: &[Value]) -> Result<Value> {
    unary(vm, args, f64::ln)
}

/// Math: log1p
pub(crate) fn native_math_log1p(vm: &mut Vm, args: &[Value]) -> Result<Value> {
    unary(vm, args, f64::ln_1p)
}

/// Math: log2
pub(crate) fn native_math_log2(vm: &mut Vm, args: &[Value]) -> Result<Value> {
    unary(vm, args, f64::log2)
}

/// Math: log10
pub(crate) fn native_math_log10(vm: &mut Vm, args: &[Value]) -> Result<Value> {
    unary(vm, args, f64::log10)
}

/// Math: sqrt
pub(crate) fn native_math_sqrt(vm: &mut Vm, args: &[Value]) -> Result<Value> {
    unary(vm, args, f64::sqrt)
}

/// Math: pow
pub(crate) fn native_math_pow(vm: &mut Vm, args: &[Value]) -> Result<Value> {
    let base = vm.number(args[0])?;
    let exponent = vm.number(args[1])?;
    Ok(Value::Number(pow(base, exponent)))
}

/// `Math.pow`, which differs from C `pow` only where the base is ±1 and
/// the exponent is not finite.
fn pow(base: f64, exponent: f64) -> f64 {
    if exponent.is_nan() || (base.abs() == 1.0 && exponent.is_infinite()) {
        return f64::NAN;
    }
    base.powf(exponent)
}

// =============================================================================
// Trigonometry
// =============================================================================

/// Math: sin
pub(crate) fn native_math_sin(vm: &mut Vm, args: &[Value]) -> Result<Value> {
    unary(vm, args, f64::sin)
}

/// Math: cos
pub(crate) fn native_math_cos(vm: &mut Vm, args: &[Value]) -> Result<Value> {
    unary(vm, args, f64::cos)
}

/// Math: tan
pub(crate) fn native_math_tan(vm: &mut Vm, args: &[Value]) -> Result<Value> {
    unary(vm, args, f64::tan)
}

/// Math: asin
pub(crate) fn native_math_asin(vm: &mut Vm, args: &[Value]) -> Result<Value> {
    unary(vm, args, f64::asin)
}

/// Math: acos
pub(crate) fn native_math_acos(vm: &mut Vm, args: &[Value]) -> Result<Value> {
    unary(vm, args, f64::acos)
}

/// Math: atan
pub(crate) fn native_math_atan(vm: &mut Vm, args: &[Value]) -> Result<Value> {
    unary(vm, args, f64::atan)
}

/// Math: atan2(y, x)
pub(crate) fn native_math_atan2(vm: &mut Vm, args: &[Value]) -> Result<Value> {
    let y = vm.number(args[0])?;
    let x = vm.number(args[1])?;
    Ok(Value::Number(y.atan2(x)))
}

/// Math: sinh
pub(crate) fn native_math_sinh(vm: &mut Vm, args: &[Value]) -> Result<Value> {
    unary(vm, args, f64::sinh)
}

/// Math: cosh
pub(crate) fn native_math_cosh(vm: &mut Vm, args: &[Value]) -> Result<Value> {
    unary(vm, args, f64::cosh)
}

/// Math: tanh
pub(crate) fn native_math_tanh(vm: &mut Vm, args: &[Value]) -> Result<Value> {
    unary(vm, args, f64::tanh)
}

/// Math: asinh
pub(crate) fn native_math_asinh(vm: &mut Vm, args: &[Value]) -> Result<Value> {
    unary(vm, args, f64::asinh)
}

/// Math: acosh
pub(crate) fn native_math_acosh(vm: &mut Vm, args: &[Value]) -> Result<Value> {
    unary(vm, args, f64::acosh)
}

/// Math: atanh
pub(crate) fn native_math_atanh(vm: &mut Vm, args: &[Value]) -> Result<Value> {
    unary(vm, args, f64::atanh)
}

// =============================================================================
// Variadic
// =============================================================================

/// Math: hypot - 0 with no arguments; an infinite argument wins over `NaN`
pub(crate) fn native_math_hypot(vm: &mut Vm, args: &[Value]) -> Result<Value> {
    Ok(Value::Number(hypot(&numbers(vm, args)?)))
}

fn hypot(ns: &[f64]) -> f64 {
    if ns.iter().any(|n| n.is_infinite()) {
        return f64::INFINITY;
    }
    if ns.iter().any(|n| n.is_nan()) {
        return f64::NAN;
    }
    let scale = ns.iter().fold(0.0_f64, |max, n| max.max(n.abs()));
    if scale == 0.0 {
        return 0.0;
    }
    // Kahan summation of the scaled squares.
    let mut sum = 0.0;
    let mut compensation = 0.0;
    for n in ns {
        let scaled = n / scale;
        let term = scaled * scaled - compensation;
        let next = sum + term;
        compensation = (next - sum) - term;
        sum = next;
    }
    sum.sqrt() * scale
}

/// Math: max - `-Infinity` with no arguments
pub(crate) fn native_math_max(vm: &mut Vm, args: &[Value]) -> Result<Value> {
    Ok(Value::Number(extremum(&numbers(vm, args)?, f64::NEG_INFINITY, |a, b| {
        a > b || (a == 0.0 && b == 0.0 && b.is_sign_negative())
    })))
}

/// Math: min - `Infinity` with no arguments
pub(crate) fn native_math_min(vm: &mut Vm, args: &[Value]) -> Result<Value> {
    Ok(Value::Number(extremum(&numbers(vm, args)?, f64::INFINITY, |a, b| {
        a < b || (a == 0.0 && b == 0.0 && a.is_sign_negative())
    })))
}

/// Picks the element for which `better(candidate, best)` keeps holding.
/// Any `NaN` makes the result `NaN`.
fn extremum(ns: &[f64], empty: f64, better: fn(f64, f64) -> bool) -> f64 {
    let mut best = empty;
    for &n in ns {
        if n.is_nan() {
            return f64::NAN;
        }
        if better(n, best) {
            best = n;
        }
    }
    best
}

// =============================================================================
// 32-bit integer operations
// =============================================================================

/// Math: clz32
pub(crate) fn native_math_clz32(vm: &mut Vm, args: &[Value]) -> Result<Value> {
    unary(vm, args, |n| f64::from(to_uint32(n).leading_zeros()))
}

/// Math: imul - 32-bit multiplication with wrap-around
pub(crate) fn native_math_imul(vm: &mut Vm, args: &[Value]) -> Result<Value> {
    let a = to_int32(vm.number(args[0])?);
    let b = to_int32(vm.number(args[1])?);
    Ok(Value::Number(f64::from(a.wrapping_mul(b))))
}

/// Math: random - uniform in `[0, 1)`
pub(crate) fn native_math_random(vm: &mut Vm, _args: &[Value]) -> Result<Value> {
    Ok(Value::Number(vm.random()))
}
