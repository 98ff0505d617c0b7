//! Decoder for the raw instruction bytes of a `Code` attribute.
//!
//! Decoding is eager and strictly sequential: a cursor walks the code array
//! once and records one [`Instruction`] per logical instruction, including the
//! alignment padding of `tableswitch`/`lookupswitch` and the prefix byte of
//! `wide` in the instruction's encoded size. The resulting vector can be
//! iterated any number of times for later statistics passes.

use std::fmt;

/// Instruction decoding failure at a specific code offset.
#[derive(Debug)]
pub(crate) enum BytecodeError {
    UnknownOpcode { opcode: u8, offset: usize },
    TruncatedOperand { opcode: u8, offset: usize },
    InconsistentSwitch { opcode: u8, offset: usize, entries: i64 },
}

impl fmt::Display for BytecodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BytecodeError::UnknownOpcode { opcode, offset } => {
                write!(f, "unknown opcode 0x{opcode:02x} at offset {offset}")
            }
            BytecodeError::TruncatedOperand { opcode, offset } => {
                write!(
                    f,
                    "truncated operand for opcode 0x{opcode:02x} at offset {offset}"
                )
            }
            BytecodeError::InconsistentSwitch {
                opcode,
                offset,
                entries,
            } => {
                write!(
                    f,
                    "switch opcode 0x{opcode:02x} at offset {offset} declares {entries} entries past the end of code"
                )
            }
        }
    }
}

impl std::error::Error for BytecodeError {}

/// One decoded instruction.
///
/// For a `wide`-prefixed instruction, `opcode` is the widened inner opcode
/// and `size` covers the prefix byte as well; the pair still counts as a
/// single instruction.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Instruction {
    pub(crate) offset: u32,
    pub(crate) opcode: u8,
    pub(crate) operands: Operands,
    pub(crate) size: u32,
}

/// Opcode-specific operand payload.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Operands {
    None,
    /// `bipush`/`sipush` immediate, sign-extended.
    Immediate(i32),
    /// Constant pool index of the `ldc` family.
    Constant(u16),
    /// Local variable index; widened to 16 bits under the `wide` prefix.
    Local(u16),
    Iinc {
        index: u16,
        delta: i16,
    },
    /// Relative jump offset, sign-extended (4 bytes for `goto_w`/`jsr_w`).
    Branch(i32),
    FieldRef(u16),
    MethodRef(u16),
    InterfaceMethodRef {
        index: u16,
        count: u8,
    },
    DynamicCallSite(u16),
    TypeRef(u16),
    /// Primitive array type code of `newarray`.
    ArrayType(u8),
    MultiArray {
        index: u16,
        dimensions: u8,
    },
    TableSwitch {
        default: i32,
        low: i32,
        high: i32,
        offsets: Vec<i32>,
    },
    LookupSwitch {
        default: i32,
        pairs: Vec<(i32, i32)>,
    },
}

/// Decodes a full code array into its ordered instruction sequence.
pub(crate) fn decode(code: &[u8]) -> Result<Vec<Instruction>, BytecodeError> {
    let mut cursor = Cursor::new(code);
    let mut instructions = Vec::new();

    while cursor.remaining() > 0 {
        let start = cursor.pos();
        let opcode = cursor.read_u1().map_err(|_| BytecodeError::TruncatedOperand {
            opcode: 0,
            offset: start,
        })?;
        let truncated = |_: CursorEof| BytecodeError::TruncatedOperand {
            opcode,
            offset: start,
        };

        let (opcode, operands) = match opcode {
            0x00..=0x0F => (opcode, Operands::None),
            0x10 => (opcode, Operands::Immediate(cursor.read_i1().map_err(truncated)? as i32)),
            0x11 => (opcode, Operands::Immediate(cursor.read_i2().map_err(truncated)? as i32)),
            0x12 => (opcode, Operands::Constant(cursor.read_u1().map_err(truncated)? as u16)),
            0x13 | 0x14 => (opcode, Operands::Constant(cursor.read_u2().map_err(truncated)?)),
            0x15..=0x19 => (opcode, Operands::Local(cursor.read_u1().map_err(truncated)? as u16)),
            0x1A..=0x35 => (opcode, Operands::None),
            0x36..=0x3A => (opcode, Operands::Local(cursor.read_u1().map_err(truncated)? as u16)),
            0x3B..=0x83 => (opcode, Operands::None),
            0x84 => {
                let index = cursor.read_u1().map_err(truncated)? as u16;
                let delta = cursor.read_i1().map_err(truncated)? as i16;
                (opcode, Operands::Iinc { index, delta })
            }
            0x85..=0x98 => (opcode, Operands::None),
            0x99..=0xA8 => (opcode, Operands::Branch(cursor.read_i2().map_err(truncated)? as i32)),
            0xA9 => (opcode, Operands::Local(cursor.read_u1().map_err(truncated)? as u16)),
            0xAA => (opcode, read_table_switch(&mut cursor, start)?),
            0xAB => (opcode, read_lookup_switch(&mut cursor, start)?),
            0xAC..=0xB1 => (opcode, Operands::None),
            0xB2..=0xB5 => (opcode, Operands::FieldRef(cursor.read_u2().map_err(truncated)?)),
            0xB6..=0xB8 => (opcode, Operands::MethodRef(cursor.read_u2().map_err(truncated)?)),
            0xB9 => {
                let index = cursor.read_u2().map_err(truncated)?;
                let count = cursor.read_u1().map_err(truncated)?;
                let _zero = cursor.read_u1().map_err(truncated)?;
                (opcode, Operands::InterfaceMethodRef { index, count })
            }
            0xBA => {
                let index = cursor.read_u2().map_err(truncated)?;
                let _zero = cursor.read_u2().map_err(truncated)?;
                (opcode, Operands::DynamicCallSite(index))
            }
            0xBB => (opcode, Operands::TypeRef(cursor.read_u2().map_err(truncated)?)),
            0xBC => (opcode, Operands::ArrayType(cursor.read_u1().map_err(truncated)?)),
            0xBD => (opcode, Operands::TypeRef(cursor.read_u2().map_err(truncated)?)),
            0xBE | 0xBF => (opcode, Operands::None),
            0xC0 | 0xC1 => (opcode, Operands::TypeRef(cursor.read_u2().map_err(truncated)?)),
            0xC2 | 0xC3 => (opcode, Operands::None),
            0xC4 => read_wide(&mut cursor)?,
            0xC5 => {
                let index = cursor.read_u2().map_err(truncated)?;
                let dimensions = cursor.read_u1().map_err(truncated)?;
                (opcode, Operands::MultiArray { index, dimensions })
            }
            0xC6 | 0xC7 => (opcode, Operands::Branch(cursor.read_i2().map_err(truncated)? as i32)),
            0xC8 | 0xC9 => (opcode, Operands::Branch(cursor.read_i4().map_err(truncated)?)),
            // Reserved opcodes encode no operands.
            0xCA | 0xFE | 0xFF => (opcode, Operands::None),
            _ => {
                return Err(BytecodeError::UnknownOpcode {
                    opcode,
                    offset: start,
                });
            }
        };

        instructions.push(Instruction {
            offset: start as u32,
            opcode,
            operands,
            size: (cursor.pos() - start) as u32,
        });
    }

    Ok(instructions)
}

fn read_table_switch(cursor: &mut Cursor<'_>, start: usize) -> Result<Operands, BytecodeError> {
    let truncated = |_: CursorEof| BytecodeError::TruncatedOperand {
        opcode: 0xAA,
        offset: start,
    };
    cursor.align4(start).map_err(truncated)?;
    let default = cursor.read_i4().map_err(truncated)?;
    let low = cursor.read_i4().map_err(truncated)?;
    let high = cursor.read_i4().map_err(truncated)?;
    let entries = i64::from(high) - i64::from(low) + 1;
    if entries < 0 || entries * 4 > cursor.remaining() as i64 {
        return Err(BytecodeError::InconsistentSwitch {
            opcode: 0xAA,
            offset: start,
            entries,
        });
    }
    let mut offsets = Vec::with_capacity(entries as usize);
    for _ in 0..entries {
        offsets.push(cursor.read_i4().map_err(truncated)?);
    }
    Ok(Operands::TableSwitch {
        default,
        low,
        high,
        offsets,
    })
}

fn read_lookup_switch(cursor: &mut Cursor<'_>, start: usize) -> Result<Operands, BytecodeError> {
    let truncated = |_: CursorEof| BytecodeError::TruncatedOperand {
        opcode: 0xAB,
        offset: start,
    };
    cursor.align4(start).map_err(truncated)?;
    let default = cursor.read_i4().map_err(truncated)?;
    let npairs = i64::from(cursor.read_i4().map_err(truncated)?);
    if npairs < 0 || npairs * 8 > cursor.remaining() as i64 {
        return Err(BytecodeError::InconsistentSwitch {
            opcode: 0xAB,
            offset: start,
            entries: npairs,
        });
    }
    let mut pairs = Vec::with_capacity(npairs as usize);
    for _ in 0..npairs {
        let key = cursor.read_i4().map_err(truncated)?;
        let target = cursor.read_i4().map_err(truncated)?;
        pairs.push((key, target));
    }
    Ok(Operands::LookupSwitch { default, pairs })
}

/// Reads the instruction behind a `wide` prefix as one logical instruction.
fn read_wide(cursor: &mut Cursor<'_>) -> Result<(u8, Operands), BytecodeError> {
    let inner_offset = cursor.pos();
    let opcode = cursor.read_u1().map_err(|_| BytecodeError::TruncatedOperand {
        opcode: 0xC4,
        offset: inner_offset.saturating_sub(1),
    })?;
    let truncated = |_: CursorEof| BytecodeError::TruncatedOperand {
        opcode,
        offset: inner_offset,
    };
    match opcode {
        0x15..=0x19 | 0x36..=0x3A | 0xA9 => {
            Ok((opcode, Operands::Local(cursor.read_u2().map_err(truncated)?)))
        }
        0x84 => {
            let index = cursor.read_u2().map_err(truncated)?;
            let delta = cursor.read_i2().map_err(truncated)?;
            Ok((opcode, Operands::Iinc { index, delta }))
        }
        _ => Err(BytecodeError::UnknownOpcode {
            opcode,
            offset: inner_offset,
        }),
    }
}

/// Signals a read past the end of the code array; mapped to a
/// [`BytecodeError`] with opcode context at the call site.
struct CursorEof;

struct Cursor<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> Cursor<'a> {
    fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    fn remaining(&self) -> usize {
        self.data.len().saturating_sub(self.pos)
    }

    fn pos(&self) -> usize {
        self.pos
    }

    /// Skips 0-3 padding bytes so the next read starts on a 4-byte boundary
    /// relative to the start of the code array.
    fn align4(&mut self, opcode_offset: usize) -> Result<(), CursorEof> {
        let padding = (4 - ((opcode_offset + 1) % 4)) % 4;
        for _ in 0..padding {
            self.read_u1()?;
        }
        Ok(())
    }

    fn read_u1(&mut self) -> Result<u8, CursorEof> {
        if self.pos >= self.data.len() {
            return Err(CursorEof);
        }
        let value = self.data[self.pos];
        self.pos += 1;
        Ok(value)
    }

    fn read_i1(&mut self) -> Result<i8, CursorEof> {
        Ok(self.read_u1()? as i8)
    }

    fn read_u2(&mut self) -> Result<u16, CursorEof> {
        let high = self.read_u1()?;
        let low = self.read_u1()?;
        Ok(u16::from_be_bytes([high, low]))
    }

    fn read_i2(&mut self) -> Result<i16, CursorEof> {
        Ok(self.read_u2()? as i16)
    }

    fn read_i4(&mut self) -> Result<i32, CursorEof> {
        if self.remaining() < 4 {
            return Err(CursorEof);
        }
        let bytes = [
            self.data[self.pos],
            self.data[self.pos + 1],
            self.data[self.pos + 2],
            self.data[self.pos + 3],
        ];
        self.pos += 4;
        Ok(i32::from_be_bytes(bytes))
    }
}
