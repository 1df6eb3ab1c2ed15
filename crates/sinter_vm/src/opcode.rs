//! The SVML instruction set.
//!
//! Instructions are one opcode byte followed by little-endian operands.
//! Several opcodes come in typed flavours (`.g`, `.f`, `.b`) that the
//! compiler picks as hints; they decode to the same [`Opcode`] and execute
//! identically. Encoding always emits the generic flavour.

#![allow(clippy::doc_markdown)]

use sinter_foundation::{Error, Result};

/// Raw opcode bytes.
#[allow(missing_docs)]
pub mod byte {
    pub const NOP: u8 = 0x00;
    pub const LDC_I: u8 = 0x01;
    pub const LGC_I: u8 = 0x02;
    pub const LDC_F32: u8 = 0x03;
    pub const LGC_F32: u8 = 0x04;
    pub const LDC_F64: u8 = 0x05;
    pub const LGC_F64: u8 = 0x06;
    pub const LDC_B_0: u8 = 0x07;
    pub const LDC_B_1: u8 = 0x08;
    pub const LGC_B_0: u8 = 0x09;
    pub const LGC_B_1: u8 = 0x0A;
    pub const LGC_U: u8 = 0x0B;
    pub const LGC_N: u8 = 0x0C;
    pub const LGC_S: u8 = 0x0D;
    pub const POP_G: u8 = 0x0E;
    pub const POP_B: u8 = 0x0F;
    pub const POP_F: u8 = 0x10;
    pub const ADD_G: u8 = 0x11;
    pub const ADD_F: u8 = 0x12;
    pub const SUB_G: u8 = 0x13;
    pub const SUB_F: u8 = 0x14;
    pub const MUL_G: u8 = 0x15;
    pub const MUL_F: u8 = 0x16;
    pub const DIV_G: u8 = 0x17;
    pub const DIV_F: u8 = 0x18;
    pub const MOD_G: u8 = 0x19;
    pub const MOD_F: u8 = 0x1A;
    pub const NOT_G: u8 = 0x1B;
    pub const NOT_B: u8 = 0x1C;
    pub const LT_G: u8 = 0x1D;
    pub const LT_F: u8 = 0x1E;
    pub const GT_G: u8 = 0x1F;
    pub const GT_F: u8 = 0x20;
    pub const LE_G: u8 = 0x21;
    pub const LE_F: u8 = 0x22;
    pub const GE_G: u8 = 0x23;
    pub const GE_F: u8 = 0x24;
    pub const EQ_G: u8 = 0x25;
    pub const EQ_F: u8 = 0x26;
    pub const EQ_B: u8 = 0x27;
    pub const NEW_C: u8 = 0x28;
    pub const NEW_A: u8 = 0x29;
    pub const LDL_G: u8 = 0x2A;
    pub const LDL_F: u8 = 0x2B;
    pub const LDL_B: u8 = 0x2C;
    pub const STL_G: u8 = 0x2D;
    pub const STL_B: u8 = 0x2E;
    pub const STL_F: u8 = 0x2F;
    pub const LDP_G: u8 = 0x30;
    pub const LDP_F: u8 = 0x31;
    pub const LDP_B: u8 = 0x32;
    pub const STP_G: u8 = 0x33;
    pub const STP_B: u8 = 0x34;
    pub const STP_F: u8 = 0x35;
    pub const LDA_G: u8 = 0x36;
    pub const LDA_B: u8 = 0x37;
    pub const LDA_F: u8 = 0x38;
    pub const STA_G: u8 = 0x39;
    pub const STA_B: u8 = 0x3A;
    pub const STA_F: u8 = 0x3B;
    pub const BR_T: u8 = 0x3C;
    pub const BR_F: u8 = 0x3D;
    pub const BR: u8 = 0x3E;
    pub const JMP: u8 = 0x3F;
    pub const CALL: u8 = 0x40;
    pub const CALL_T: u8 = 0x41;
    pub const CALL_P: u8 = 0x42;
    pub const CALL_T_P: u8 = 0x43;
    pub const CALL_V: u8 = 0x44;
    pub const CALL_T_V: u8 = 0x45;
    pub const RET_G: u8 = 0x46;
    pub const RET_F: u8 = 0x47;
    pub const RET_B: u8 = 0x48;
    pub const RET_U: u8 = 0x49;
    pub const RET_N: u8 = 0x4A;
    pub const DUP: u8 = 0x4B;
    pub const NEWENV: u8 = 0x4C;
    pub const POPENV: u8 = 0x4D;
    pub const NEW_C_P: u8 = 0x4E;
    pub const NEW_C_V: u8 = 0x4F;
    pub const NEG_G: u8 = 0x50;
    pub const NEG_F: u8 = 0x51;
    pub const NEQ_G: u8 = 0x52;
    pub const NEQ_F: u8 = 0x53;
    pub const NEQ_B: u8 = 0x54;
}

/// A decoded instruction.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Opcode {
    // === Stack Operations ===
    /// No operation.
    Nop,
    /// Push a number (`ldc.i`, `ldc.f32`, `ldc.f64` and their `lgc` forms).
    Number(f64),
    /// Push a boolean.
    Boolean(bool),
    /// Push `undefined`.
    Undefined,
    /// Push `null`.
    Null,
    /// Push a new string built from the constant at this address.
    String(u32),
    /// Pop and discard the top of stack.
    Pop,
    /// Duplicate the top of stack.
    Dup,

    // === Arithmetic ===
    /// Add: `[a, b] -> [a + b]`; concatenates two strings.
    Add,
    /// Subtract: `[a, b] -> [a - b]`
    Sub,
    /// Multiply: `[a, b] -> [a * b]`
    Mul,
    /// Divide: `[a, b] -> [a / b]`
    Div,
    /// Remainder: `[a, b] -> [a % b]`
    Mod,
    /// Negate: `[a] -> [-a]`
    Neg,

    // === Comparison ===
    /// Boolean negation: `[a] -> [!a]`
    Not,
    /// Less than: `[a, b] -> [a < b]`
    Lt,
    /// Greater than: `[a, b] -> [a > b]`
    Gt,
    /// Less than or equal: `[a, b] -> [a <= b]`
    Le,
    /// Greater than or equal: `[a, b] -> [a >= b]`
    Ge,
    /// Identity equality: `[a, b] -> [a === b]`
    Eq,
    /// Identity inequality: `[a, b] -> [a !== b]`
    Neq,

    // === Objects ===
    /// Push a closure over the current environment for the function at this address.
    NewClosure(u32),
    /// Push a new empty array.
    NewArray,
    /// `[array, index] -> [array[index]]`
    LoadArray,
    /// `[array, index, value] -> []`, storing `array[index] = value`.
    StoreArray,
    /// Push a primitive function value.
    NewPrimitive(u8),
    /// Push an internal function value.
    NewInternal(u8),

    // === Environments ===
    /// Push slot `index` of the current environment.
    LoadLocal(u8),
    /// Pop into slot `index` of the current environment.
    StoreLocal(u8),
    /// Push slot `index` of the environment `depth` levels up.
    LoadParent {
        /// Slot index.
        index: u8,
        /// Number of parents to walk.
        depth: u8,
    },
    /// Pop into slot `index` of the environment `depth` levels up.
    StoreParent {
        /// Slot index.
        index: u8,
        /// Number of parents to walk.
        depth: u8,
    },
    /// Enter a child environment with `size` slots.
    NewEnv(u8),
    /// Return to the parent environment.
    PopEnv,

    // === Control Flow ===
    /// Pop a boolean and branch if it equals `when`. The offset is relative
    /// to the end of the instruction.
    BranchIf {
        /// Branch on true or on false.
        when: bool,
        /// Relative offset.
        offset: i32,
    },
    /// Unconditional relative branch.
    Branch(i32),
    /// Absolute jump.
    Jump(u32),

    // === Functions ===
    /// Call the value beneath `argc` arguments.
    Call {
        /// Argument count.
        argc: u8,
        /// Replace the caller's frame.
        tail: bool,
    },
    /// Call primitive `id`.
    CallPrimitive {
        /// Primitive id.
        id: u8,
        /// Argument count.
        argc: u8,
        /// Replace the caller's frame.
        tail: bool,
    },
    /// Call internal function `id`.
    CallInternal {
        /// Internal function id.
        id: u8,
        /// Argument count.
        argc: u8,
        /// Replace the caller's frame.
        tail: bool,
    },
    /// Return the top of stack.
    Return,
    /// Return `undefined`.
    ReturnUndefined,
    /// Return `null`.
    ReturnNull,
}

impl Opcode {
    /// Decodes the instruction at `at`, returning it and its encoded length.
    pub fn decode(code: &[u8], at: usize) -> Result<(Self, usize)> {
        let op = *code
            .get(at)
            .ok_or_else(|| Error::invalid_program(format!("pc 0x{at:x} is outside the image")))?;
        let reader = Operands { code, at: at + 1 };

        let (opcode, operand_len) = match op {
            byte::NOP => (Self::Nop, 0),
            byte::LDC_I | byte::LGC_I => (Self::Number(f64::from(reader.i32(0)?)), 4),
            byte::LDC_F32 | byte::LGC_F32 => (Self::Number(f64::from(reader.f32(0)?)), 4),
            byte::LDC_F64 | byte::LGC_F64 => (Self::Number(reader.f64(0)?), 8),
            byte::LDC_B_0 | byte::LGC_B_0 => (Self::Boolean(false), 0),
            byte::LDC_B_1 | byte::LGC_B_1 => (Self::Boolean(true), 0),
            byte::LGC_U => (Self::Undefined, 0),
            byte::LGC_N => (Self::Null, 0),
            byte::LGC_S => (Self::String(reader.u32(0)?), 4),
            byte::POP_G | byte::POP_B | byte::POP_F => (Self::Pop, 0),
            byte::ADD_G | byte::ADD_F => (Self::Add, 0),
            byte::SUB_G | byte::SUB_F => (Self::Sub, 0),
            byte::MUL_G | byte::MUL_F => (Self::Mul, 0),
            byte::DIV_G | byte::DIV_F => (Self::Div, 0),
            byte::MOD_G | byte::MOD_F => (Self::Mod, 0),
            byte::NOT_G | byte::NOT_B => (Self::Not, 0),
            byte::LT_G | byte::LT_F => (Self::Lt, 0),
            byte::GT_G | byte::GT_F => (Self::Gt, 0),
            byte::LE_G | byte::LE_F => (Self::Le, 0),
            byte::GE_G | byte::GE_F => (Self::Ge, 0),
            byte::EQ_G | byte::EQ_F | byte::EQ_B => (Self::Eq, 0),
            byte::NEQ_G | byte::NEQ_F | byte::NEQ_B => (Self::Neq, 0),
            byte::NEW_C => (Self::NewClosure(reader.u32(0)?), 4),
            byte::NEW_A => (Self::NewArray, 0),
            byte::LDL_G | byte::LDL_F | byte::LDL_B => (Self::LoadLocal(reader.u8(0)?), 1),
            byte::STL_G | byte::STL_F | byte::STL_B => (Self::StoreLocal(reader.u8(0)?), 1),
            byte::LDP_G | byte::LDP_F | byte::LDP_B => (
                Self::LoadParent {
                    index: reader.u8(0)?,
                    depth: reader.u8(1)?,
                },
                2,
            ),
            byte::STP_G | byte::STP_F | byte::STP_B => (
                Self::StoreParent {
                    index: reader.u8(0)?,
                    depth: reader.u8(1)?,
                },
                2,
            ),
            byte::LDA_G | byte::LDA_F | byte::LDA_B => (Self::LoadArray, 0),
            byte::STA_G | byte::STA_F | byte::STA_B => (Self::StoreArray, 0),
            byte::BR_T | byte::BR_F => (
                Self::BranchIf {
                    when: op == byte::BR_T,
                    offset: reader.i32(0)?,
                },
                4,
            ),
            byte::BR => (Self::Branch(reader.i32(0)?), 4),
            byte::JMP => (Self::Jump(reader.u32(0)?), 4),
            byte::CALL | byte::CALL_T => (
                Self::Call {
                    argc: reader.u8(0)?,
                    tail: op == byte::CALL_T,
                },
                1,
            ),
            byte::CALL_P | byte::CALL_T_P => (
                Self::CallPrimitive {
                    id: reader.u8(0)?,
                    argc: reader.u8(1)?,
                    tail: op == byte::CALL_T_P,
                },
                2,
            ),
            byte::CALL_V | byte::CALL_T_V => (
                Self::CallInternal {
                    id: reader.u8(0)?,
                    argc: reader.u8(1)?,
                    tail: op == byte::CALL_T_V,
                },
                2,
            ),
            byte::RET_G | byte::RET_F | byte::RET_B => (Self::Return, 0),
            byte::RET_U => (Self::ReturnUndefined, 0),
            byte::RET_N => (Self::ReturnNull, 0),
            byte::DUP => (Self::Dup, 0),
            byte::NEWENV => (Self::NewEnv(reader.u8(0)?), 1),
            byte::POPENV => (Self::PopEnv, 0),
            byte::NEW_C_P => (Self::NewPrimitive(reader.u8(0)?), 1),
            byte::NEW_C_V => (Self::NewInternal(reader.u8(0)?), 1),
            byte::NEG_G | byte::NEG_F => (Self::Neg, 0),
            other => {
                return Err(Error::invalid_program(format!(
                    "invalid instruction 0x{other:02x} at 0x{at:x}"
                )));
            }
        };
        Ok((opcode, 1 + operand_len))
    }

    /// Appends the encoding of this instruction.
    ///
    /// Numbers use the narrowest form that represents them exactly.
    pub fn encode(&self, out: &mut Vec<u8>) {
        match *self {
            Self::Nop => out.push(byte::NOP),
            Self::Number(n) => encode_number(n, out),
            Self::Boolean(false) => out.push(byte::LDC_B_0),
            Self::Boolean(true) => out.push(byte::LDC_B_1),
            Self::Undefined => out.push(byte::LGC_U),
            Self::Null => out.push(byte::LGC_N),
            Self::String(address) => with_u32(out, byte::LGC_S, address),
            Self::Pop => out.push(byte::POP_G),
            Self::Dup => out.push(byte::DUP),
            Self::Add => out.push(byte::ADD_G),
            Self::Sub => out.push(byte::SUB_G),
            Self::Mul => out.push(byte::MUL_G),
            Self::Div => out.push(byte::DIV_G),
            Self::Mod => out.push(byte::MOD_G),
            Self::Neg => out.push(byte::NEG_G),
            Self::Not => out.push(byte::NOT_G),
            Self::Lt => out.push(byte::LT_G),
            Self::Gt => out.push(byte::GT_G),
            Self::Le => out.push(byte::LE_G),
            Self::Ge => out.push(byte::GE_G),
            Self::Eq => out.push(byte::EQ_G),
            Self::Neq => out.push(byte::NEQ_G),
            Self::NewClosure(address) => with_u32(out, byte::NEW_C, address),
            Self::NewArray => out.push(byte::NEW_A),
            Self::LoadArray => out.push(byte::LDA_G),
            Self::StoreArray => out.push(byte::STA_G),
            Self::NewPrimitive(id) => out.extend([byte::NEW_C_P, id]),
            Self::NewInternal(id) => out.extend([byte::NEW_C_V, id]),
            Self::LoadLocal(index) => out.extend([byte::LDL_G, index]),
            Self::StoreLocal(index) => out.extend([byte::STL_G, index]),
            Self::LoadParent { index, depth } => out.extend([byte::LDP_G, index, depth]),
            Self::StoreParent { index, depth } => out.extend([byte::STP_G, index, depth]),
            Self::NewEnv(size) => out.extend([byte::NEWENV, size]),
            Self::PopEnv => out.push(byte::POPENV),
            Self::BranchIf { when, offset } => {
                out.push(if when { byte::BR_T } else { byte::BR_F });
                out.extend(offset.to_le_bytes());
            }
            Self::Branch(offset) => {
                out.push(byte::BR);
                out.extend(offset.to_le_bytes());
            }
            Self::Jump(address) => with_u32(out, byte::JMP, address),
            Self::Call { argc, tail } => {
                out.extend([if tail { byte::CALL_T } else { byte::CALL }, argc]);
            }
            Self::CallPrimitive { id, argc, tail } => {
                out.extend([if tail { byte::CALL_T_P } else { byte::CALL_P }, id, argc]);
            }
            Self::CallInternal { id, argc, tail } => {
                out.extend([if tail { byte::CALL_T_V } else { byte::CALL_V }, id, argc]);
            }
            Self::Return => out.push(byte::RET_G),
            Self::ReturnUndefined => out.push(byte::RET_U),
            Self::ReturnNull => out.push(byte::RET_N),
        }
    }

    /// Returns the encoded length of this instruction.
    #[must_use]
    pub fn encoded_len(&self) -> usize {
        let mut buf = Vec::with_capacity(9);
        self.encode(&mut buf);
        buf.len()
    }
}

#[allow(clippy::cast_possible_truncation)]
fn encode_number(n: f64, out: &mut Vec<u8>) {
    let as_int = n as i32;
    if f64::from(as_int) == n && !(n == 0.0 && n.is_sign_negative()) {
        out.push(byte::LDC_I);
        out.extend(as_int.to_le_bytes());
    } else if f64::from(n as f32).to_bits() == n.to_bits() {
        out.push(byte::LDC_F32);
        out.extend((n as f32).to_le_bytes());
    } else {
        out.push(byte::LDC_F64);
        out.extend(n.to_le_bytes());
    }
}

fn with_u32(out: &mut Vec<u8>, op: u8, operand: u32) {
    out.push(op);
    out.extend(operand.to_le_bytes());
}

/// Little-endian operand reader positioned after an opcode byte.
struct Operands<'a> {
    code: &'a [u8],
    at: usize,
}

impl Operands<'_> {
    fn bytes<const N: usize>(&self, offset: usize) -> Result<[u8; N]> {
        let start = self.at + offset;
        self.code
            .get(start..start + N)
            .and_then(|slice| slice.try_into().ok())
            .ok_or_else(|| {
                Error::invalid_program(format!("truncated operand at 0x{start:x}"))
            })
    }

    fn u8(&self, offset: usize) -> Result<u8> {
        Ok(self.bytes::<1>(offset)?[0])
    }

    fn u32(&self, offset: usize) -> Result<u32> {
        self.bytes(offset).map(u32::from_le_bytes)
    }

    fn i32(&self, offset: usize) -> Result<i32> {
        self.bytes(offset).map(i32::from_le_bytes)
    }

    fn f32(&self, offset: usize) -> Result<f32> {
        self.bytes(offset).map(f32::from_le_bytes)
    }

    fn f64(&self, offset: usize) -> Result<f64> {
        self.bytes(offset).map(f64::from_le_bytes)
    }
}
