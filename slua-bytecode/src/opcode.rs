//! One byte per opcode, operands follow little-endian.
//!
//! Stack effects, top of stack on the right:
//! * `SET_GLOBAL`, `SET_LOCAL`, `SET_UPVALUE`: `[value] -> []`
//! * `GET_FIELD`: `[table] -> [value]`, `SET_FIELD`: `[table value] -> []`
//! * `GET_INDEX`: `[table key] -> [value]`, `SET_INDEX`: `[table key value] -> []`
//! * `APPEND`, `INIT_FIELD`: `[table value] -> [table]`, `INIT_INDEX`: `[table key value] -> [table]`
//! * `CALL n`: `[callee arg1..argn] -> [result]`
//! * `INVOKE n name`: `[receiver arg1..argn] -> [result]`
//! * `RETURN n` returns the top `n` values.
//! * `JUMP_IF_FALSE` leaves the condition on the stack. Jump offsets are
//!   relative to the byte following the operand.

use serde::{Deserialize, Serialize};

pub const CONSTANT     : u8 = 0;
pub const TRUE         : u8 = 1;
pub const FALSE        : u8 = 2;
pub const NIL          : u8 = 3;

pub const NEGATE       : u8 = 4;
pub const ADD          : u8 = 5;
pub const SUBTRACT     : u8 = 6;
pub const MULTIPLY     : u8 = 7;
pub const DIVIDE       : u8 = 8;
pub const MODULO       : u8 = 9;
pub const POWER        : u8 = 10;
pub const CONCAT       : u8 = 11;

pub const NOT          : u8 = 12;
pub const LENGTH       : u8 = 13;
pub const EQUAL        : u8 = 14;
pub const GREATER      : u8 = 15;
pub const LESS         : u8 = 16;

pub const POP          : u8 = 17;
pub const RETURN       : u8 = 18;

pub const GET_GLOBAL   : u8 = 19;
pub const SET_GLOBAL   : u8 = 20;
pub const GET_LOCAL    : u8 = 21;
pub const SET_LOCAL    : u8 = 22;
pub const GET_UPVALUE  : u8 = 23;
pub const SET_UPVALUE  : u8 = 24;

pub const GET_FIELD    : u8 = 25;
pub const SET_FIELD    : u8 = 26;
pub const GET_INDEX    : u8 = 27;
pub const SET_INDEX    : u8 = 28;
pub const NEW_TABLE    : u8 = 29;
pub const APPEND       : u8 = 30;
pub const INIT_FIELD   : u8 = 31;
pub const INIT_INDEX   : u8 = 32;

pub const JUMP         : u8 = 33;
pub const JUMP_IF_FALSE: u8 = 34;
pub const CALL         : u8 = 35;
pub const INVOKE       : u8 = 36;
pub const CLOSURE      : u8 = 37;
pub const CLOSE_UPVALUE: u8 = 38;

#[derive(Debug, PartialEq, Copy, Clone, Serialize, Deserialize)]
pub enum Opcode {
    Constant(u32),
    True,
    False,
    Nil,

    Negate,
    Add,
    Subtract,
    Multiply,
    Divide,
    Modulo,
    Power,
    Concat,

    Not,
    Length,
    Equal,
    Greater,
    Less,

    Pop,
    Return(u8),

    GetGlobal(u32),
    SetGlobal(u32),
    GetLocal(u32),
    SetLocal(u32),
    GetUpvalue(u32),
    SetUpvalue(u32),

    GetField(u32),
    SetField(u32),
    GetIndex,
    SetIndex,
    NewTable,
    Append,
    InitField(u32),
    InitIndex,

    Jump(i16),
    JumpIfFalse(i16),
    Call(u8),
    Invoke(u8, u32),
    Closure(u32),
    CloseUpvalue,
}

#[derive(Debug, PartialEq, Copy, Clone)]
pub enum InstructionError {
    UnknownOpcode(u8),
    Truncated,
}

impl Opcode {
    /// Encoded size in bytes, opcode included.
    pub fn encoded_len(&self) -> usize {
        match self {
            Opcode::Constant(_)
            | Opcode::GetGlobal(_)
            | Opcode::SetGlobal(_)
            | Opcode::GetLocal(_)
            | Opcode::SetLocal(_)
            | Opcode::GetUpvalue(_)
            | Opcode::SetUpvalue(_)
            | Opcode::GetField(_)
            | Opcode::SetField(_)
            | Opcode::InitField(_)
            | Opcode::Closure(_) => 5,
            Opcode::Jump(_) | Opcode::JumpIfFalse(_) => 3,
            Opcode::Return(_) | Opcode::Call(_) => 2,
            Opcode::Invoke(_, _) => 6,
            _ => 1,
        }
    }

    /// Absolute target of a jump at `offset`.
    pub fn jump_target(&self, offset: usize) -> Option<isize> {
        match self {
            Opcode::Jump(relative) | Opcode::JumpIfFalse(relative) => {
                Some(offset as isize + 3 + *relative as isize)
            }
            _ => None,
        }
    }
}

fn read_u32(code: &[u8], at: usize) -> Result<u32, InstructionError> {
    let bytes = code.get(at..at + 4).ok_or(InstructionError::Truncated)?;
    Ok(u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
}

fn read_i16(code: &[u8], at: usize) -> Result<i16, InstructionError> {
    let bytes = code.get(at..at + 2).ok_or(InstructionError::Truncated)?;
    Ok(i16::from_le_bytes([bytes[0], bytes[1]]))
}

fn read_u8(code: &[u8], at: usize) -> Result<u8, InstructionError> {
    code.get(at).copied().ok_or(InstructionError::Truncated)
}

/// Decodes the instruction starting at `offset`.
pub fn decode_instruction(code: &[u8], offset: usize) -> Result<Opcode, InstructionError> {
    let operand = offset + 1;
    let opcode = match read_u8(code, offset)? {
        CONSTANT => Opcode::Constant(read_u32(code, operand)?),
        TRUE => Opcode::True,
        FALSE => Opcode::False,
        NIL => Opcode::Nil,
        NEGATE => Opcode::Negate,
        ADD => Opcode::Add,
        SUBTRACT => Opcode::Subtract,
        MULTIPLY => Opcode::Multiply,
        DIVIDE => Opcode::Divide,
        MODULO => Opcode::Modulo,
        POWER => Opcode::Power,
        CONCAT => Opcode::Concat,
        NOT => Opcode::Not,
        LENGTH => Opcode::Length,
        EQUAL => Opcode::Equal,
        GREATER => Opcode::Greater,
        LESS => Opcode::Less,
        POP => Opcode::Pop,
        RETURN => Opcode::Return(read_u8(code, operand)?),
        GET_GLOBAL => Opcode::GetGlobal(read_u32(code, operand)?),
        SET_GLOBAL => Opcode::SetGlobal(read_u32(code, operand)?),
        GET_LOCAL => Opcode::GetLocal(read_u32(code, operand)?),
        SET_LOCAL => Opcode::SetLocal(read_u32(code, operand)?),
        GET_UPVALUE => Opcode::GetUpvalue(read_u32(code, operand)?),
        SET_UPVALUE => Opcode::SetUpvalue(read_u32(code, operand)?),
        GET_FIELD => Opcode::GetField(read_u32(code, operand)?),
        SET_FIELD => Opcode::SetField(read_u32(code, operand)?),
        GET_INDEX => Opcode::GetIndex,
        SET_INDEX => Opcode::SetIndex,
        NEW_TABLE => Opcode::NewTable,
        APPEND => Opcode::Append,
        INIT_FIELD => Opcode::InitField(read_u32(code, operand)?),
        INIT_INDEX => Opcode::InitIndex,
        JUMP => Opcode::Jump(read_i16(code, operand)?),
        JUMP_IF_FALSE => Opcode::JumpIfFalse(read_i16(code, operand)?),
        CALL => Opcode::Call(read_u8(code, operand)?),
        INVOKE => Opcode::Invoke(read_u8(code, operand)?, read_u32(code, operand + 1)?),
        CLOSURE => Opcode::Closure(read_u32(code, operand)?),
        CLOSE_UPVALUE => Opcode::CloseUpvalue,
        unknown => return Err(InstructionError::UnknownOpcode(unknown)),
    };
    Ok(opcode)
}

/// Walks a chunk yielding `(offset, Opcode)` pairs. Stops at the first
/// byte that does not decode.
pub struct OpcodeIterator<'a> {
    code: &'a [u8],
    offset: usize,
}

impl<'a> OpcodeIterator<'a> {
    pub fn new(code: &'a [u8]) -> OpcodeIterator<'a> {
        OpcodeIterator { code, offset: 0 }
    }
}

impl<'a> Iterator for OpcodeIterator<'a> {
    type Item = (usize, Opcode);

    fn next(&mut self) -> Option<Self::Item> {
        if self.offset >= self.code.len() {
            return None;
        }
        match decode_instruction(self.code, self.offset) {
            Ok(opcode) => {
                let offset = self.offset;
                self.offset += opcode.encoded_len();
                Some((offset, opcode))
            }
            Err(_) => {
                self.offset = self.code.len();
                None
            }
        }
    }
}
