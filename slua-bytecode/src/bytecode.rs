use std::collections::HashMap;

use serde::{Deserialize, Serialize};

pub type InstructionIndex = usize;
pub type ConstantIndex = usize;
pub type StackIndex = usize;
pub type ChunkIndex = usize;
pub type UpvalueIndex = usize;
pub type PrototypeIndex = usize;
pub type IdentifierIndex = usize;

#[derive(Debug, PartialEq, Eq, Clone, Serialize, Deserialize)]
pub enum Upvalue {
    Local(StackIndex),
    Upvalue(UpvalueIndex),
}

/// A function as the compiler sees it: its code and what it captures.
#[derive(Debug, PartialEq, Eq, Clone, Serialize, Deserialize)]
pub struct Prototype {
    pub name: String,
    pub chunk_index: ChunkIndex,
    pub arity: u8,
    pub upvalues: Vec<Upvalue>,
}

#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
pub enum Constant {
    Number(f64),
    String(String),
}

impl From<f64> for Constant {
    fn from(item: f64) -> Self {
        Constant::Number(item)
    }
}

impl From<&str> for Constant {
    fn from(item: &str) -> Self {
        Constant::String(String::from(item))
    }
}

// Numbers are keyed by bit pattern so that -0.0 and NaN get their own entry.
#[derive(Debug, PartialEq, Eq, Hash, Clone)]
enum ConstantKey {
    Number(u64),
    String(String),
}

impl From<&Constant> for ConstantKey {
    fn from(constant: &Constant) -> Self {
        match constant {
            Constant::Number(n) => ConstantKey::Number(n.to_bits()),
            Constant::String(s) => ConstantKey::String(s.clone()),
        }
    }
}

/// Debug name of a stack slot, live over `start..end` of the chunk.
#[derive(Debug, PartialEq, Eq, Clone, Serialize, Deserialize)]
pub struct LocalName {
    pub name: String,
    pub slot: u32,
    pub start: u32,
    pub end: u32,
}

#[derive(Debug, PartialEq, Clone, Default, Serialize, Deserialize)]
pub struct Chunk {
    instructions: Vec<u8>,
    lines: Vec<(u32, u32)>,
    locals: Vec<LocalName>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Module {
    chunks: Vec<Chunk>,
    prototypes: Vec<Prototype>,
    constants: Vec<Constant>,
    identifiers: Vec<String>,
    line_info: bool,
    local_names: bool,
    // Lookup tables for deduplication, rebuilt on first use after decoding.
    #[serde(skip)]
    constant_index: HashMap<ConstantKey, ConstantIndex>,
    #[serde(skip)]
    identifier_index: HashMap<String, IdentifierIndex>,
}

impl PartialEq for Module {
    fn eq(&self, other: &Self) -> bool {
        self.chunks == other.chunks
            && self.prototypes == other.prototypes
            && self.constants == other.constants
            && self.identifiers == other.identifiers
            && self.line_info == other.line_info
            && self.local_names == other.local_names
    }
}

impl Module {
    pub fn new() -> Module {
        Module::default()
    }

    #[inline]
    pub fn chunk(&self, index: ChunkIndex) -> &Chunk {
        &self.chunks[index]
    }

    pub fn chunk_mut(&mut self, index: ChunkIndex) -> &mut Chunk {
        &mut self.chunks[index]
    }

    pub fn add_chunk(&mut self) -> ChunkIndex {
        self.chunks.push(Chunk::new());
        self.chunks.len() - 1
    }

    pub(crate) fn from_parts(
        chunks: Vec<Chunk>,
        prototypes: Vec<Prototype>,
        constants: Vec<Constant>,
        identifiers: Vec<String>,
    ) -> Module {
        Module {
            chunks,
            prototypes,
            constants,
            identifiers,
            line_info: false,
            local_names: false,
            constant_index: HashMap::new(),
            identifier_index: HashMap::new(),
        }
    }

    pub fn add_prototype(&mut self, prototype: Prototype) -> PrototypeIndex {
        self.prototypes.push(prototype);
        self.prototypes.len() - 1
    }

    pub fn add_identifier(&mut self, identifier: &str) -> IdentifierIndex {
        if self.identifier_index.is_empty() {
            for (i, name) in self.identifiers.iter().enumerate() {
                self.identifier_index.entry(name.clone()).or_insert(i);
            }
        }
        if let Some(&index) = self.identifier_index.get(identifier) {
            return index;
        }
        self.identifiers.push(identifier.to_string());
        let index = self.identifiers.len() - 1;
        self.identifier_index.insert(identifier.to_string(), index);
        index
    }

    pub fn add_constant(&mut self, constant: Constant) -> ConstantIndex {
        if self.constant_index.is_empty() {
            for (i, constant) in self.constants.iter().enumerate() {
                self.constant_index.entry(ConstantKey::from(constant)).or_insert(i);
            }
        }
        let key = ConstantKey::from(&constant);
        if let Some(&index) = self.constant_index.get(&key) {
            return index;
        }
        self.constants.push(constant);
        let index = self.constants.len() - 1;
        self.constant_index.insert(key, index);
        index
    }

    pub fn set_debug_info(&mut self, line_info: bool, local_names: bool) {
        self.line_info = line_info;
        self.local_names = local_names;
    }

    pub fn has_line_info(&self) -> bool {
        self.line_info
    }

    pub fn has_local_names(&self) -> bool {
        self.local_names
    }

    pub fn chunks(&self) -> &[Chunk] {
        &self.chunks
    }

    pub fn prototypes(&self) -> &[Prototype] {
        &self.prototypes
    }

    pub fn constants(&self) -> &[Constant] {
        &self.constants
    }

    pub fn identifiers(&self) -> &[String] {
        &self.identifiers
    }

    #[inline]
    pub fn constant(&self, index: ConstantIndex) -> &Constant {
        &self.constants[index]
    }

    #[inline]
    pub fn prototype(&self, index: PrototypeIndex) -> &Prototype {
        &self.prototypes[index]
    }

    #[inline]
    pub fn identifier(&self, index: IdentifierIndex) -> &str {
        &self.identifiers[index]
    }
}

impl Chunk {
    pub fn new() -> Chunk {
        Chunk::default()
    }

    pub(crate) fn from_parts(instructions: Vec<u8>, lines: Vec<(u32, u32)>, locals: Vec<LocalName>) -> Chunk {
        Chunk { instructions, lines, locals }
    }

    pub fn add_u8(&mut self, value: u8) -> InstructionIndex {
        self.instructions.push(value);
        self.instructions.len() - 1
    }

    pub fn add_u32(&mut self, value: u32) -> InstructionIndex {
        self.instructions.extend_from_slice(&value.to_le_bytes());
        self.instructions.len() - 4
    }

    pub fn add_i16(&mut self, value: i16) -> InstructionIndex {
        self.instructions.extend_from_slice(&value.to_le_bytes());
        self.instructions.len() - 2
    }

    pub fn set_i16(&mut self, index: InstructionIndex, value: i16) {
        self.instructions[index..index + 2].copy_from_slice(&value.to_le_bytes());
    }

    pub fn instruction_index(&self) -> InstructionIndex {
        self.instructions.len()
    }

    /// Points the jump operand at `index` to the next instruction.
    /// Returns false when the distance does not fit in an `i16`.
    pub fn patch_instruction(&mut self, index: InstructionIndex) -> bool {
        let current = self.instruction_index();
        self.patch_instruction_to(index, current)
    }

    pub fn patch_instruction_to(&mut self, index: InstructionIndex, to: InstructionIndex) -> bool {
        let offset = (to as isize) - (index as isize) - 2;
        match i16::try_from(offset) {
            Ok(offset) => {
                self.set_i16(index, offset);
                true
            }
            Err(_) => false,
        }
    }

    /// Records that code emitted from here on belongs to `line`.
    pub fn mark_line(&mut self, line: u32) {
        let offset = self.instructions.len() as u32;
        match self.lines.last_mut() {
            Some((_, last)) if *last == line => {}
            Some((last_offset, last)) if *last_offset == offset => *last = line,
            _ => self.lines.push((offset, line)),
        }
    }

    /// Source line of the instruction at `offset`, if line info was kept.
    pub fn line_at(&self, offset: usize) -> Option<u32> {
        self.lines
            .iter()
            .take_while(|(start, _)| *start as usize <= offset)
            .last()
            .map(|(_, line)| *line)
    }

    pub fn add_local_name(&mut self, name: &str, slot: usize) -> usize {
        let start = self.instructions.len() as u32;
        self.locals.push(LocalName {
            name: name.to_string(),
            slot: slot as u32,
            start,
            end: start,
        });
        self.locals.len() - 1
    }

    pub fn end_local_name(&mut self, index: usize) {
        let end = self.instructions.len() as u32;
        if let Some(local) = self.locals.get_mut(index) {
            local.end = end;
        }
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.instructions
    }

    pub fn lines(&self) -> &[(u32, u32)] {
        &self.lines
    }

    pub fn locals(&self) -> &[LocalName] {
        &self.locals
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn constants_are_deduplicated() {
        let mut module = Module::new();
        assert_eq!(module.add_constant(1.0.into()), 0);
        assert_eq!(module.add_constant("a".into()), 1);
        assert_eq!(module.add_constant(1.0.into()), 0);
        assert_eq!(module.add_constant("a".into()), 1);
        assert_eq!(module.add_constant((-0.0).into()), 2);
        assert_eq!(module.constants().len(), 3);

        assert_eq!(module.add_identifier("x"), 0);
        assert_eq!(module.add_identifier("y"), 1);
        assert_eq!(module.add_identifier("x"), 0);
    }

    #[test]
    fn deduplication_scales() {
        let mut module = Module::new();
        for round in 0..2 {
            for i in 0..20_000 {
                assert_eq!(module.add_constant((i as f64).into()), i);
                assert_eq!(module.add_identifier(&format!("g{}", i)), i, "round {}", round);
            }
        }
        assert_eq!(module.constants().len(), 20_000);
        assert_eq!(module.identifiers().len(), 20_000);
        assert_eq!(module.add_constant(f64::NAN.into()), 20_000);
        assert_eq!(module.add_constant(f64::NAN.into()), 20_000);
    }

    #[test]
    fn decoded_modules_keep_deduplicating() {
        let mut module = Module::new();
        module.add_constant("a".into());
        module.add_identifier("x");
        let mut decoded = Module::from_bytes(&module.to_bytes()).unwrap();
        assert_eq!(decoded, module);

        assert_eq!(decoded.add_constant("a".into()), 0);
        assert_eq!(decoded.add_identifier("x"), 0);
        assert_eq!(decoded.add_identifier("y"), 1);
        assert_eq!(decoded.constants().len(), 1);
    }

    #[test]
    fn patch_jumps() {
        let mut chunk = Chunk::new();
        chunk.add_u8(crate::opcode::JUMP);
        let operand = chunk.add_i16(0);
        chunk.add_u8(crate::opcode::POP);
        assert!(chunk.patch_instruction(operand));
        assert_eq!(chunk.as_slice(), &[crate::opcode::JUMP, 1, 0, crate::opcode::POP]);

        assert!(chunk.patch_instruction_to(operand, 0));
        assert_eq!(&chunk.as_slice()[1..3], &(-3i16).to_le_bytes());

        assert!(!chunk.patch_instruction_to(operand, 40_000));
    }

    #[test]
    fn line_table() {
        let mut chunk = Chunk::new();
        chunk.mark_line(1);
        chunk.add_u8(crate::opcode::NIL);
        chunk.mark_line(1);
        chunk.add_u8(crate::opcode::POP);
        chunk.mark_line(3);
        chunk.mark_line(4);
        chunk.add_u8(crate::opcode::NIL);
        assert_eq!(chunk.lines(), &[(0, 1), (2, 4)]);
        assert_eq!(chunk.line_at(1), Some(1));
        assert_eq!(chunk.line_at(2), Some(4));
        assert_eq!(Chunk::new().line_at(0), None);
    }
}
