use crate::bytecode::*;
use crate::error::DecodeError;
use crate::opcode::{decode_instruction, InstructionError, Opcode};

pub const VERSION: u8 = 1;

const FLAG_LINE_INFO: u8 = 0b01;
const FLAG_LOCAL_NAMES: u8 = 0b10;

const TAG_NUMBER: u8 = 0;
const TAG_STRING: u8 = 1;

const UPVALUE_LOCAL: u8 = 0;
const UPVALUE_UPVALUE: u8 = 1;

struct Writer {
    bytes: Vec<u8>,
}

impl Writer {
    fn u8(&mut self, value: u8) {
        self.bytes.push(value);
    }

    fn u32(&mut self, value: u32) {
        self.bytes.extend_from_slice(&value.to_le_bytes());
    }

    fn len(&mut self, value: usize) {
        self.u32(value as u32);
    }

    fn string(&mut self, value: &str) {
        self.len(value.len());
        self.bytes.extend_from_slice(value.as_bytes());
    }
}

struct Reader<'a> {
    bytes: &'a [u8],
    position: usize,
}

impl<'a> Reader<'a> {
    fn take(&mut self, count: usize) -> Result<&'a [u8], DecodeError> {
        let end = self.position.checked_add(count).ok_or(DecodeError::UnexpectedEnd)?;
        let slice = self.bytes.get(self.position..end).ok_or(DecodeError::UnexpectedEnd)?;
        self.position = end;
        Ok(slice)
    }

    fn u8(&mut self) -> Result<u8, DecodeError> {
        Ok(self.take(1)?[0])
    }

    fn u32(&mut self) -> Result<u32, DecodeError> {
        let bytes = self.take(4)?;
        Ok(u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
    }

    fn f64(&mut self) -> Result<f64, DecodeError> {
        let mut bytes = [0u8; 8];
        bytes.copy_from_slice(self.take(8)?);
        Ok(f64::from_le_bytes(bytes))
    }

    fn len(&mut self) -> Result<usize, DecodeError> {
        Ok(self.u32()? as usize)
    }

    fn string(&mut self) -> Result<String, DecodeError> {
        let len = self.len()?;
        let bytes = self.take(len)?;
        String::from_utf8(bytes.to_vec()).map_err(|_| DecodeError::InvalidUtf8)
    }

    fn remaining(&self) -> usize {
        self.bytes.len() - self.position
    }

    // Every table entry takes at least one byte, so a count beyond what is
    // left cannot be valid and must not drive an allocation.
    fn count(&mut self) -> Result<usize, DecodeError> {
        let count = self.len()?;
        if count > self.remaining() {
            return Err(DecodeError::UnexpectedEnd);
        }
        Ok(count)
    }
}

impl Module {
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut w = Writer { bytes: Vec::new() };
        let mut flags = 0;
        if self.has_line_info() {
            flags |= FLAG_LINE_INFO;
        }
        if self.has_local_names() {
            flags |= FLAG_LOCAL_NAMES;
        }

        w.u8(VERSION);
        w.u8(flags);

        w.len(self.constants().len());
        for constant in self.constants() {
            match constant {
                Constant::Number(value) => {
                    w.u8(TAG_NUMBER);
                    w.bytes.extend_from_slice(&value.to_le_bytes());
                }
                Constant::String(value) => {
                    w.u8(TAG_STRING);
                    w.string(value);
                }
            }
        }

        w.len(self.identifiers().len());
        for identifier in self.identifiers() {
            w.string(identifier);
        }

        w.len(self.prototypes().len());
        for prototype in self.prototypes() {
            w.string(&prototype.name);
            w.len(prototype.chunk_index);
            w.u8(prototype.arity);
            w.len(prototype.upvalues.len());
            for upvalue in &prototype.upvalues {
                match upvalue {
                    Upvalue::Local(slot) => {
                        w.u8(UPVALUE_LOCAL);
                        w.len(*slot);
                    }
                    Upvalue::Upvalue(index) => {
                        w.u8(UPVALUE_UPVALUE);
                        w.len(*index);
                    }
                }
            }
        }

        w.len(self.chunks().len());
        for chunk in self.chunks() {
            w.len(chunk.as_slice().len());
            w.bytes.extend_from_slice(chunk.as_slice());
            if flags & FLAG_LINE_INFO != 0 {
                w.len(chunk.lines().len());
                for (offset, line) in chunk.lines() {
                    w.u32(*offset);
                    w.u32(*line);
                }
            }
            if flags & FLAG_LOCAL_NAMES != 0 {
                w.len(chunk.locals().len());
                for local in chunk.locals() {
                    w.string(&local.name);
                    w.u32(local.slot);
                    w.u32(local.start);
                    w.u32(local.end);
                }
            }
        }

        w.bytes
    }

    /// Decodes and validates a module produced by `to_bytes`.
    pub fn from_bytes(bytes: &[u8]) -> Result<Module, DecodeError> {
        let mut r = Reader { bytes, position: 0 };

        let version = r.u8()?;
        if version != VERSION {
            return Err(DecodeError::UnsupportedVersion(version));
        }
        let flags = r.u8()?;
        if flags & !(FLAG_LINE_INFO | FLAG_LOCAL_NAMES) != 0 {
            return Err(DecodeError::UnknownFlags(flags));
        }

        let mut constants = Vec::new();
        for _ in 0..r.count()? {
            let constant = match r.u8()? {
                TAG_NUMBER => Constant::Number(r.f64()?),
                TAG_STRING => Constant::String(r.string()?),
                tag => return Err(DecodeError::InvalidConstantTag(tag)),
            };
            constants.push(constant);
        }

        let mut identifiers = Vec::new();
        for _ in 0..r.count()? {
            identifiers.push(r.string()?);
        }

        let mut prototypes = Vec::new();
        for _ in 0..r.count()? {
            let name = r.string()?;
            let chunk_index = r.len()?;
            let arity = r.u8()?;
            let mut upvalues = Vec::new();
            for _ in 0..r.count()? {
                let upvalue = match r.u8()? {
                    UPVALUE_LOCAL => Upvalue::Local(r.len()?),
                    UPVALUE_UPVALUE => Upvalue::Upvalue(r.len()?),
                    kind => return Err(DecodeError::InvalidUpvalueKind(kind)),
                };
                upvalues.push(upvalue);
            }
            prototypes.push(Prototype { name, chunk_index, arity, upvalues });
        }

        let mut chunks = Vec::new();
        for _ in 0..r.count()? {
            let len = r.len()?;
            let instructions = r.take(len)?.to_vec();
            let mut lines = Vec::new();
            if flags & FLAG_LINE_INFO != 0 {
                for _ in 0..r.count()? {
                    lines.push((r.u32()?, r.u32()?));
                }
            }
            let mut locals = Vec::new();
            if flags & FLAG_LOCAL_NAMES != 0 {
                for _ in 0..r.count()? {
                    let name = r.string()?;
                    locals.push(LocalName { name, slot: r.u32()?, start: r.u32()?, end: r.u32()? });
                }
            }
            chunks.push(Chunk::from_parts(instructions, lines, locals));
        }

        if r.remaining() != 0 {
            return Err(DecodeError::TrailingBytes(r.remaining()));
        }

        let mut module = Module::from_parts(chunks, prototypes, constants, identifiers);
        module.set_debug_info(flags & FLAG_LINE_INFO != 0, flags & FLAG_LOCAL_NAMES != 0);
        validate(&module)?;
        Ok(module)
    }
}

fn validate(module: &Module) -> Result<(), DecodeError> {
    for (index, prototype) in module.prototypes().iter().enumerate() {
        if prototype.chunk_index >= module.chunks().len() {
            return Err(DecodeError::MissingChunk { prototype: index, chunk: prototype.chunk_index });
        }
    }

    for (chunk_index, chunk) in module.chunks().iter().enumerate() {
        let code = chunk.as_slice();
        let mut offset = 0;
        while offset < code.len() {
            let opcode = decode_instruction(code, offset).map_err(|e| match e {
                InstructionError::UnknownOpcode(opcode) => DecodeError::UnknownOpcode { chunk: chunk_index, offset, opcode },
                InstructionError::Truncated => DecodeError::TruncatedInstruction { chunk: chunk_index, offset },
            })?;

            let reference = match opcode {
                Opcode::Constant(index) => Some(("Constant", index, module.constants().len())),
                Opcode::GetGlobal(index)
                | Opcode::SetGlobal(index)
                | Opcode::GetField(index)
                | Opcode::SetField(index)
                | Opcode::InitField(index)
                | Opcode::Invoke(_, index) => Some(("Identifier", index, module.identifiers().len())),
                Opcode::Closure(index) => Some(("Prototype", index, module.prototypes().len())),
                _ => None,
            };
            if let Some((kind, index, len)) = reference {
                if index as usize >= len {
                    return Err(DecodeError::IndexOutOfRange { chunk: chunk_index, offset, kind, index: index as usize });
                }
            }

            if let Some(target) = opcode.jump_target(offset) {
                if target < 0 || target as usize > code.len() {
                    return Err(DecodeError::JumpOutOfRange { chunk: chunk_index, offset });
                }
            }

            offset += opcode.encoded_len();
        }
    }

    Ok(())
}
