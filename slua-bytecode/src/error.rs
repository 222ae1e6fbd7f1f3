use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq, Clone)]
pub enum DecodeError {
    #[error("Unexpected end of bytecode")]
    UnexpectedEnd,
    #[error("Unsupported bytecode version {0}")]
    UnsupportedVersion(u8),
    #[error("Unknown flags {0:#04x}")]
    UnknownFlags(u8),
    #[error("Invalid constant tag {0}")]
    InvalidConstantTag(u8),
    #[error("Invalid upvalue kind {0}")]
    InvalidUpvalueKind(u8),
    #[error("String is not valid UTF-8")]
    InvalidUtf8,
    #[error("Unknown opcode {opcode} in chunk {chunk} at {offset:04X}")]
    UnknownOpcode { chunk: usize, offset: usize, opcode: u8 },
    #[error("Truncated instruction in chunk {chunk} at {offset:04X}")]
    TruncatedInstruction { chunk: usize, offset: usize },
    #[error("{kind} index {index} out of range in chunk {chunk} at {offset:04X}")]
    IndexOutOfRange { chunk: usize, offset: usize, kind: &'static str, index: usize },
    #[error("Jump out of range in chunk {chunk} at {offset:04X}")]
    JumpOutOfRange { chunk: usize, offset: usize },
    #[error("Prototype {prototype} refers to missing chunk {chunk}")]
    MissingChunk { prototype: usize, chunk: usize },
    #[error("{0} trailing bytes")]
    TrailingBytes(usize),
}
