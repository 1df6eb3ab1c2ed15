//! Printing, errors and host facilities.

use sinter_foundation::{Error, ErrorKind, Result, Type, Value};

use crate::vm::Vm;

/// Renders `v`, preceded by `prefix` and a space when one is given.
fn render_with_prefix(vm: &Vm, args: &[Value]) -> Result<String> {
    let mut text = String::new();
    if let Some(prefix) = args.get(1) {
        text.push_str(&vm.heap.render(*prefix)?);
        text.push(' ');
    }
    text.push_str(&vm.heap.render(args[0])?);
    Ok(text)
}

/// IO: display(v[, prefix]) - prints a line and returns v
pub(crate) fn native_display(vm: &mut Vm, args: &[Value]) -> Result<Value> {
    let mut line = render_with_prefix(vm, args)?;
    line.push('\n');
    vm.output.stdout(&line);
    Ok(args[0])
}

/// IO: error(v[, prefix]) - halts the program
pub(crate) fn native_error(vm: &mut Vm, args: &[Value]) -> Result<Value> {
    let message = render_with_prefix(vm, args)?;
    Err(Error::new(ErrorKind::ProgramError(message)))
}

/// IO: stringify
pub(crate) fn native_stringify(vm: &mut Vm, args: &[Value]) -> Result<Value> {
    let text = vm.heap.render(args[0])?;
    vm.heap.string(text)
}

/// IO: list_to_string
pub(crate) fn native_list_to_string(vm: &mut Vm, args: &[Value]) -> Result<Value> {
    let text = vm.heap.render(args[0])?;
    vm.heap.string(text)
}

/// IO: runtime - milliseconds since the run started
pub(crate) fn native_runtime(vm: &mut Vm, _args: &[Value]) -> Result<Value> {
    Ok(Value::Number(vm.elapsed_ms()))
}

/// IO: parse_int(s, radix)
pub(crate) fn native_parse_int(vm: &mut Vm, args: &[Value]) -> Result<Value> {
    let text = vm
        .heap
        .as_str(args[0])?
        .ok_or_else(|| vm.heap.mismatch(Type::String, args[0]))?;
    let radix = vm.number(args[1])?;
    Ok(Value::Number(parse_int(text, radix)))
}

/// Parses the longest prefix of `text` that is an integer in `radix`.
/// Returns `NaN` when there is no such prefix or the radix is not an
/// integer in `2..=36`.
#[allow(clippy::cast_possible_truncation)]
#[allow(clippy::cast_sign_loss)]
fn parse_int(text: &str, radix: f64) -> f64 {
    if radix.fract() != 0.0 || !(2.0..=36.0).contains(&radix) {
        return f64::NAN;
    }
    let radix = radix as u32;

    let mut rest = text.trim();
    let mut sign = 1.0;
    if let Some(stripped) = rest.strip_prefix('-') {
        sign = -1.0;
        rest = stripped;
    } else if let Some(stripped) = rest.strip_prefix('+') {
        rest = stripped;
    }
    if radix == 16 {
        rest = rest
            .strip_prefix("0x")
            .or_else(|| rest.strip_prefix("0X"))
            .unwrap_or(rest);
    }

    let mut value = 0.0_f64;
    let mut digits = 0;
    for c in rest.chars() {
        let Some(digit) = c.to_digit(radix) else {
            break;
        };
        value = value * f64::from(radix) + f64::from(digit);
        digits += 1;
    }
    if digits == 0 {
        return f64::NAN;
    }
    sign * value
}

/// IO: draw_data - no drawing surface exists
pub(crate) fn native_draw_data(_vm: &mut Vm, _args: &[Value]) -> Result<Value> {
    Err(Error::new(ErrorKind::Unsupported("draw_data".to_string())))
}

/// IO: prompt - no input source exists
pub(crate) fn native_prompt(_vm: &mut Vm, _args: &[Value]) -> Result<Value> {
    Err(Error::new(ErrorKind::Unsupported("prompt".to_string())))
}
