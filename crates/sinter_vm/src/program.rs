//! Loading SVML images.
//!
//! An image is a 16-byte header, a constant pool and a sequence of
//! functions. Everything is addressed by byte offset into the image.

#![allow(clippy::cast_possible_truncation)]

use std::collections::HashMap;

use sinter_foundation::{Error, Result};

use crate::opcode::Opcode;

/// Magic number at the start of every image.
pub const MAGIC: u32 = 0x5005_ACAD;
/// Size of the image header in bytes.
pub const HEADER_LEN: usize = 16;
/// Size of a function header in bytes.
pub const FUNCTION_HEADER_LEN: usize = 4;
/// Size of a constant header (type and length) in bytes.
pub const CONSTANT_HEADER_LEN: usize = 6;
/// Constant type tag for strings.
pub const STRING_CONSTANT: u16 = 1;

/// Image format version written by the assembler.
pub const VERSION: (u16, u16) = (0, 0);

/// The fixed header preceding each function's code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FunctionHeader {
    /// Operand stack entries the compiler expects the function to use.
    pub stack_size: u8,
    /// Slots in the function's environment.
    pub env_size: u8,
    /// Number of parameters.
    pub num_args: u8,
}

impl FunctionHeader {
    /// Creates a function header.
    #[must_use]
    pub const fn new(stack_size: u8, env_size: u8, num_args: u8) -> Self {
        Self {
            stack_size,
            env_size,
            num_args,
        }
    }

    /// Encodes the header including its padding byte.
    #[must_use]
    pub const fn to_bytes(self) -> [u8; FUNCTION_HEADER_LEN] {
        [self.stack_size, self.env_size, self.num_args, 0]
    }
}

/// A validated SVML image.
#[derive(Debug, Clone)]
pub struct Program {
    image: Vec<u8>,
    version: (u16, u16),
    entry: u32,
    strings: HashMap<u32, Box<str>>,
}

impl Program {
    /// Parses and validates an image.
    pub fn parse(bytes: &[u8]) -> Result<Self> {
        if bytes.len() < HEADER_LEN {
            return Err(Error::invalid_program(format!(
                "image of {} bytes is shorter than its header",
                bytes.len()
            )));
        }
        let magic = read_u32(bytes, 0)?;
        if magic != MAGIC {
            return Err(Error::invalid_program(format!(
                "bad magic 0x{magic:08x}"
            )));
        }
        let version = (read_u16(bytes, 4)?, read_u16(bytes, 6)?);
        let entry = read_u32(bytes, 8)?;
        let constant_count = read_u32(bytes, 12)?;

        let mut strings = HashMap::new();
        let mut at = HEADER_LEN;
        for _ in 0..constant_count {
            let address = at as u32;
            let kind = read_u16(bytes, at)?;
            let length = read_u32(bytes, at + 2)? as usize;
            let start = at + CONSTANT_HEADER_LEN;
            let data = bytes.get(start..start + length).ok_or_else(|| {
                Error::invalid_program(format!("constant at 0x{address:x} overruns the image"))
            })?;
            if kind != STRING_CONSTANT {
                return Err(Error::invalid_program(format!(
                    "unknown constant type {kind} at 0x{address:x}"
                )));
            }
            let text = match data.split_last() {
                Some((0, text)) => text,
                _ => {
                    return Err(Error::invalid_program(format!(
                        "string constant at 0x{address:x} is not NUL-terminated"
                    )));
                }
            };
            let text = std::str::from_utf8(text).map_err(|_| {
                Error::invalid_program(format!("string constant at 0x{address:x} is not UTF-8"))
            })?;
            strings.insert(address, Box::from(text));
            at = start + length;
        }

        let program = Self {
            image: bytes.to_vec(),
            version,
            entry,
            strings,
        };
        program.function(entry)?;
        tracing::debug!(
            size = bytes.len(),
            entry,
            constants = constant_count,
            "loaded program"
        );
        Ok(program)
    }

    /// The raw image.
    #[must_use]
    pub fn image(&self) -> &[u8] {
        &self.image
    }

    /// Image format version as `(major, minor)`.
    #[must_use]
    pub const fn version(&self) -> (u16, u16) {
        self.version
    }

    /// Address of the entry function.
    #[must_use]
    pub const fn entry(&self) -> u32 {
        self.entry
    }

    /// Reads the header of the function at `address`.
    pub fn function(&self, address: u32) -> Result<FunctionHeader> {
        let at = address as usize;
        match self.image.get(at..at + FUNCTION_HEADER_LEN) {
            Some([stack_size, env_size, num_args, _]) if at >= HEADER_LEN => Ok(FunctionHeader {
                stack_size: *stack_size,
                env_size: *env_size,
                num_args: *num_args,
            }),
            _ => Err(Error::invalid_program(format!(
                "no function at 0x{address:x}"
            ))),
        }
    }

    /// Returns the text of the string constant at `address`.
    pub fn string_constant(&self, address: u32) -> Result<&str> {
        self.strings.get(&address).map(AsRef::as_ref).ok_or_else(|| {
            Error::invalid_program(format!("no string constant at 0x{address:x}"))
        })
    }

    /// Decodes the instruction at `pc`.
    pub fn decode(&self, pc: usize) -> Result<(Opcode, usize)> {
        Opcode::decode(&self.image, pc)
    }
}

fn read_u16(bytes: &[u8], at: usize) -> Result<u16> {
    bytes
        .get(at..at + 2)
        .and_then(|b| b.try_into().ok())
        .map(u16::from_le_bytes)
        .ok_or_else(|| Error::invalid_program(format!("truncated image at 0x{at:x}")))
}

fn read_u32(bytes: &[u8], at: usize) -> Result<u32> {
    bytes
        .get(at..at + 4)
        .and_then(|b| b.try_into().ok())
        .map(u32::from_le_bytes)
        .ok_or_else(|| Error::invalid_program(format!("truncated image at 0x{at:x}")))
}
