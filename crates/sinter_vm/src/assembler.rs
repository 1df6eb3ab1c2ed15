//! Building SVML images in memory.
//!
//! The assembler lays out the constant pool and functions, and resolves
//! labels and closure targets once every function is known:
//!
//! ```
//! use sinter_vm::{Assembler, Code, FunctionHeader, primitive_id};
//!
//! let mut asm = Assembler::new();
//! let hello = asm.string("hello");
//! let display = primitive_id("display").unwrap();
//!
//! let mut code = Code::new();
//! code.string(hello).call_primitive(display, 1).ret();
//! let main = asm.function(FunctionHeader::new(1, 0, 0), code);
//!
//! let image = asm.finish(main).unwrap();
//! assert!(sinter_vm::Program::parse(&image).is_ok());
//! ```

#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_possible_wrap)]
#![allow(clippy::return_self_not_must_use)]

use sinter_foundation::{Error, Result};

use crate::opcode::Opcode;
use crate::program::{
    CONSTANT_HEADER_LEN, FUNCTION_HEADER_LEN, FunctionHeader, HEADER_LEN, MAGIC, STRING_CONSTANT,
    VERSION,
};

/// A string constant, by address.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StringId(u32);

impl StringId {
    /// The constant's address in the image.
    #[must_use]
    pub const fn address(self) -> u32 {
        self.0
    }
}

/// A function declared with an [`Assembler`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FunctionId(usize);

/// A jump target inside one [`Code`] block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Label(usize);

#[derive(Debug, Clone, Copy)]
enum Item {
    Op(Opcode),
    Branch { when: Option<bool>, target: Label },
    Jump(Label),
    Closure(FunctionId),
}

impl Item {
    fn len(&self) -> usize {
        match self {
            Self::Op(op) => op.encoded_len(),
            Self::Branch { .. } | Self::Jump(_) | Self::Closure(_) => 5,
        }
    }
}

/// The instructions of one function.
#[derive(Debug, Clone, Default)]
pub struct Code {
    items: Vec<Item>,
    labels: Vec<Option<usize>>,
}

impl Code {
    /// Creates an empty block.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a raw instruction.
    pub fn op(&mut self, op: Opcode) -> &mut Self {
        self.items.push(Item::Op(op));
        self
    }

    /// Creates an unbound label.
    pub fn label(&mut self) -> Label {
        self.labels.push(None);
        Label(self.labels.len() - 1)
    }

    /// Binds `label` to the next instruction.
    pub fn bind(&mut self, label: Label) -> &mut Self {
        if let Some(slot) = self.labels.get_mut(label.0) {
            *slot = Some(self.items.len());
        }
        self
    }

    // =========================================================================
    // Constants
    // =========================================================================

    /// `ldc`: push a number.
    pub fn number(&mut self, n: f64) -> &mut Self {
        self.op(Opcode::Number(n))
    }

    /// Push a boolean.
    pub fn boolean(&mut self, b: bool) -> &mut Self {
        self.op(Opcode::Boolean(b))
    }

    /// `lgc.n`
    pub fn null(&mut self) -> &mut Self {
        self.op(Opcode::Null)
    }

    /// `lgc.u`
    pub fn undefined(&mut self) -> &mut Self {
        self.op(Opcode::Undefined)
    }

    /// `lgc.s`
    pub fn string(&mut self, id: StringId) -> &mut Self {
        self.op(Opcode::String(id.0))
    }

    // =========================================================================
    // Stack and arithmetic
    // =========================================================================

    /// `pop`
    pub fn pop(&mut self) -> &mut Self {
        self.op(Opcode::Pop)
    }

    /// `dup`
    pub fn dup(&mut self) -> &mut Self {
        self.op(Opcode::Dup)
    }

    /// `add`
    pub fn add(&mut self) -> &mut Self {
        self.op(Opcode::Add)
    }

    /// `sub`
    pub fn sub(&mut self) -> &mut Self {
        self.op(Opcode::Sub)
    }

    /// `mul`
    pub fn mul(&mut self) -> &mut Self {
        self.op(Opcode::Mul)
    }

    /// `div`
    pub fn div(&mut self) -> &mut Self {
        self.op(Opcode::Div)
    }

    /// `mod`
    pub fn modulo(&mut self) -> &mut Self {
        self.op(Opcode::Mod)
    }

    /// `neg`
    pub fn neg(&mut self) -> &mut Self {
        self.op(Opcode::Neg)
    }

    /// `not`
    pub fn not(&mut self) -> &mut Self {
        self.op(Opcode::Not)
    }

    /// `lt`
    pub fn lt(&mut self) -> &mut Self {
        self.op(Opcode::Lt)
    }

    /// `gt`
    pub fn gt(&mut self) -> &mut Self {
        self.op(Opcode::Gt)
    }

    /// `le`
    pub fn le(&mut self) -> &mut Self {
        self.op(Opcode::Le)
    }

    /// `ge`
    pub fn ge(&mut self) -> &mut Self {
        self.op(Opcode::Ge)
    }

    /// `eq`
    pub fn eq(&mut self) -> &mut Self {
        self.op(Opcode::Eq)
    }

    /// `neq`
    pub fn neq(&mut self) -> &mut Self {
        self.op(Opcode::Neq)
    }

    // =========================================================================
    // Objects and environments
    // =========================================================================

    /// `new.c`: closure over the current environment.
    pub fn closure(&mut self, function: FunctionId) -> &mut Self {
        self.items.push(Item::Closure(function));
        self
    }

    /// `new.a`
    pub fn new_array(&mut self) -> &mut Self {
        self.op(Opcode::NewArray)
    }

    /// `lda`
    pub fn load_array(&mut self) -> &mut Self {
        self.op(Opcode::LoadArray)
    }

    /// `sta`
    pub fn store_array(&mut self) -> &mut Self {
        self.op(Opcode::StoreArray)
    }

    /// `new.c.p`
    pub fn primitive(&mut self, id: u8) -> &mut Self {
        self.op(Opcode::NewPrimitive(id))
    }

    /// `new.c.v`
    pub fn internal(&mut self, id: u8) -> &mut Self {
        self.op(Opcode::NewInternal(id))
    }

    /// `ldl`
    pub fn load_local(&mut self, index: u8) -> &mut Self {
        self.op(Opcode::LoadLocal(index))
    }

    /// `stl`
    pub fn store_local(&mut self, index: u8) -> &mut Self {
        self.op(Opcode::StoreLocal(index))
    }

    /// `ldp`
    pub fn load_parent(&mut self, index: u8, depth: u8) -> &mut Self {
        self.op(Opcode::LoadParent { index, depth })
    }

    /// `stp`
    pub fn store_parent(&mut self, index: u8, depth: u8) -> &mut Self {
        self.op(Opcode::StoreParent { index, depth })
    }

    /// `newenv`
    pub fn new_env(&mut self, size: u8) -> &mut Self {
        self.op(Opcode::NewEnv(size))
    }

    /// `popenv`
    pub fn pop_env(&mut self) -> &mut Self {
        self.op(Opcode::PopEnv)
    }

    // =========================================================================
    // Control flow
    // =========================================================================

    /// `br` to `target`.
    pub fn branch(&mut self, target: Label) -> &mut Self {
        self.items.push(Item::Branch { when: None, target });
        self
    }

    /// `br.t` to `target`.
    pub fn branch_if_true(&mut self, target: Label) -> &mut Self {
        self.items.push(Item::Branch {
            when: Some(true),
            target,
        });
        self
    }

    /// `br.f` to `target`.
    pub fn branch_if_false(&mut self, target: Label) -> &mut Self {
        self.items.push(Item::Branch {
            when: Some(false),
            target,
        });
        self
    }

    /// `jmp` to `target`.
    pub fn jump(&mut self, target: Label) -> &mut Self {
        self.items.push(Item::Jump(target));
        self
    }

    /// `call`
    pub fn call(&mut self, argc: u8) -> &mut Self {
        self.op(Opcode::Call { argc, tail: false })
    }

    /// `call.t`
    pub fn tail_call(&mut self, argc: u8) -> &mut Self {
        self.op(Opcode::Call { argc, tail: true })
    }

    /// `call.p`
    pub fn call_primitive(&mut self, id: u8, argc: u8) -> &mut Self {
        self.op(Opcode::CallPrimitive {
            id,
            argc,
            tail: false,
        })
    }

    /// `call.t.p`
    pub fn tail_call_primitive(&mut self, id: u8, argc: u8) -> &mut Self {
        self.op(Opcode::CallPrimitive {
            id,
            argc,
            tail: true,
        })
    }

    /// `call.v`
    pub fn call_internal(&mut self, id: u8, argc: u8) -> &mut Self {
        self.op(Opcode::CallInternal {
            id,
            argc,
            tail: false,
        })
    }

    /// `call.t.v`
    pub fn tail_call_internal(&mut self, id: u8, argc: u8) -> &mut Self {
        self.op(Opcode::CallInternal {
            id,
            argc,
            tail: true,
        })
    }

    /// `ret`
    pub fn ret(&mut self) -> &mut Self {
        self.op(Opcode::Return)
    }

    /// `ret.u`
    pub fn ret_undefined(&mut self) -> &mut Self {
        self.op(Opcode::ReturnUndefined)
    }

    /// `ret.n`
    pub fn ret_null(&mut self) -> &mut Self {
        self.op(Opcode::ReturnNull)
    }

    fn offsets(&self) -> Vec<usize> {
        let mut offsets = Vec::with_capacity(self.items.len() + 1);
        let mut at = 0;
        offsets.push(at);
        for item in &self.items {
            at += item.len();
            offsets.push(at);
        }
        offsets
    }
}

/// Builds an SVML image.
#[derive(Debug, Default)]
pub struct Assembler {
    constants: Vec<u8>,
    constant_count: u32,
    functions: Vec<Option<(FunctionHeader, Code)>>,
}

impl Assembler {
    /// Creates an empty assembler.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a string constant.
    pub fn string(&mut self, text: &str) -> StringId {
        let address = (HEADER_LEN + self.constants.len()) as u32;
        let length = text.len() as u32 + 1;
        self.constants.extend(STRING_CONSTANT.to_le_bytes());
        self.constants.extend(length.to_le_bytes());
        self.constants.extend(text.as_bytes());
        self.constants.push(0);
        self.constant_count += 1;
        debug_assert_eq!(
            self.constants.len() + HEADER_LEN,
            address as usize + CONSTANT_HEADER_LEN + length as usize
        );
        StringId(address)
    }

    /// Reserves a function so that code can refer to it before it is defined.
    pub fn declare_function(&mut self) -> FunctionId {
        self.functions.push(None);
        FunctionId(self.functions.len() - 1)
    }

    /// Supplies the body of a declared function.
    pub fn define(&mut self, id: FunctionId, header: FunctionHeader, code: Code) -> Result<()> {
        match self.functions.get_mut(id.0) {
            Some(slot @ None) => {
                *slot = Some((header, code));
                Ok(())
            }
            Some(Some(_)) => Err(Error::invalid_program(format!(
                "function {} defined twice",
                id.0
            ))),
            None => Err(Error::invalid_program(format!(
                "function {} was never declared",
                id.0
            ))),
        }
    }

    /// Declares and defines a function in one step.
    pub fn function(&mut self, header: FunctionHeader, code: Code) -> FunctionId {
        self.functions.push(Some((header, code)));
        FunctionId(self.functions.len() - 1)
    }

    /// Lays out the image with `entry` as the entry function.
    pub fn finish(self, entry: FunctionId) -> Result<Vec<u8>> {
        let mut bodies = Vec::with_capacity(self.functions.len());
        for (index, function) in self.functions.iter().enumerate() {
            let (header, code) = function.as_ref().ok_or_else(|| {
                Error::invalid_program(format!("function {index} declared but never defined"))
            })?;
            bodies.push((*header, code, code.offsets()));
        }

        let mut addresses = Vec::with_capacity(bodies.len());
        let mut at = HEADER_LEN + self.constants.len();
        for (_, _, offsets) in &bodies {
            addresses.push(at as u32);
            at += FUNCTION_HEADER_LEN + offsets.last().copied().unwrap_or(0);
        }
        let entry_address = *addresses.get(entry.0).ok_or_else(|| {
            Error::invalid_program(format!("entry function {} does not exist", entry.0))
        })?;

        let mut image = Vec::with_capacity(at);
        image.extend(MAGIC.to_le_bytes());
        image.extend(VERSION.0.to_le_bytes());
        image.extend(VERSION.1.to_le_bytes());
        image.extend(entry_address.to_le_bytes());
        image.extend(self.constant_count.to_le_bytes());
        image.extend(&self.constants);

        for ((header, code, offsets), base) in bodies.iter().zip(&addresses) {
            image.extend(header.to_bytes());
            let code_start = *base as usize + FUNCTION_HEADER_LEN;
            let target = |label: Label| -> Result<usize> {
                code.labels
                    .get(label.0)
                    .copied()
                    .flatten()
                    .map(|index| offsets[index])
                    .ok_or_else(|| Error::invalid_program(format!("label {} is unbound", label.0)))
            };

            for (index, item) in code.items.iter().enumerate() {
                let op = match *item {
                    Item::Op(op) => op,
                    Item::Branch { when, target: label } => {
                        let offset = target(label)? as i32 - offsets[index + 1] as i32;
                        match when {
                            Some(when) => Opcode::BranchIf { when, offset },
                            None => Opcode::Branch(offset),
                        }
                    }
                    Item::Jump(label) => Opcode::Jump((code_start + target(label)?) as u32),
                    Item::Closure(function) => {
                        let address = addresses.get(function.0).ok_or_else(|| {
                            Error::invalid_program(format!(
                                "closure over unknown function {}",
                                function.0
                            ))
                        })?;
                        Opcode::NewClosure(*address)
                    }
                };
                op.encode(&mut image);
            }
        }
        Ok(image)
    }
}
