use slua_bytecode::opcode;
use slua_bytecode::*;
use slua_syntax::position::{LineOffsets, Span};

use super::locals::*;
use super::CompilerError;
use crate::error::SemanticError;
use crate::options::CompileOptions;

pub const MAX_UPVALUES: usize = 200;

struct LoopContext {
    scope_depth: usize,
    breaks: Vec<InstructionIndex>,
}

struct CompilerContext {
    chunk_index: ChunkIndex,
    locals: Locals,
    upvalues: Vec<Upvalue>,
    loops: Vec<LoopContext>,
}

impl CompilerContext {
    fn new(chunk_index: ChunkIndex) -> CompilerContext {
        let mut locals = Locals::new();
        locals.insert("", None);
        CompilerContext {
            chunk_index,
            locals,
            upvalues: vec![],
            loops: vec![],
        }
    }

    fn add_upvalue(&mut self, upvalue: Upvalue) -> Option<UpvalueIndex> {
        if let Some(index) = self.upvalues.iter().position(|u| *u == upvalue) {
            return Some(index);
        }
        if self.upvalues.len() >= MAX_UPVALUES {
            return None;
        }
        self.upvalues.push(upvalue);
        Some(self.upvalues.len() - 1)
    }

    fn resolve_local(&self, name: &str) -> Option<StackIndex> {
        self.locals.get(name).map(|local| local.slot())
    }
}

// Names that cannot be written in source.
fn is_hidden(name: &str) -> bool {
    name.is_empty() || name.starts_with('(')
}

pub struct Compiler<'a> {
    module: Module,
    current: CompilerContext,
    enclosing: Vec<CompilerContext>,
    offsets: &'a LineOffsets,
    options: CompileOptions,
}

impl<'a> Compiler<'a> {
    pub fn new(offsets: &'a LineOffsets, options: CompileOptions) -> Compiler<'a> {
        let mut module = Module::new();
        module.set_debug_info(options.line_info(), options.local_names());
        let main = module.add_chunk();
        Compiler {
            module,
            current: CompilerContext::new(main),
            enclosing: vec![],
            offsets,
            options,
        }
    }

    pub fn into_module(mut self) -> Module {
        self.finish_local_names();
        self.module
    }

    pub fn options(&self) -> &CompileOptions {
        &self.options
    }

    fn current_chunk_mut(&mut self) -> &mut Chunk {
        self.module.chunk_mut(self.current.chunk_index)
    }

    fn current_chunk(&self) -> &Chunk {
        self.module.chunk(self.current.chunk_index)
    }

    // Closes the debug ranges of every local still in scope.
    fn finish_local_names(&mut self) {
        let indices: Vec<usize> = self.current.locals.iter().filter_map(Local::debug_index).collect();
        for index in indices {
            self.current_chunk_mut().end_local_name(index);
        }
    }

    fn begin_context(&mut self) {
        let chunk = self.module.add_chunk();
        let enclosing = std::mem::replace(&mut self.current, CompilerContext::new(chunk));
        self.enclosing.push(enclosing);
    }

    fn end_context(&mut self) -> Result<(ChunkIndex, Vec<Upvalue>), CompilerError> {
        self.finish_local_names();
        let enclosing = self
            .enclosing
            .pop()
            .ok_or(CompilerError::Internal("no enclosing function"))?;
        let context = std::mem::replace(&mut self.current, enclosing);
        Ok((context.chunk_index, context.upvalues))
    }

    /// Compiles a nested function into its own chunk.
    pub fn with_context<F>(&mut self, f: F) -> Result<(ChunkIndex, Vec<Upvalue>), CompilerError>
    where
        F: FnOnce(&mut Self) -> Result<(), CompilerError>,
    {
        self.begin_context();
        let result = f(self);
        let ctx_result = self.end_context();
        result?;
        ctx_result
    }

    pub fn begin_scope(&mut self) {
        self.current.locals.begin_scope();
    }

    pub fn end_scope(&mut self) {
        let locals = self.current.locals.end_scope();
        for local in locals.iter().rev() {
            if local.captured() {
                self.add_u8(opcode::CLOSE_UPVALUE);
            } else {
                self.add_u8(opcode::POP);
            }
        }
        self.end_local_names(&locals);
    }

    /// Forgets the innermost scope without emitting code for it; the caller
    /// has already emitted the pops on every path.
    pub fn drop_scope(&mut self) {
        let locals = self.current.locals.end_scope();
        self.end_local_names(&locals);
    }

    fn end_local_names(&mut self, locals: &[Local]) {
        for local in locals {
            if let Some(index) = local.debug_index() {
                self.current_chunk_mut().end_local_name(index);
            }
        }
    }

    pub fn with_scope<F>(&mut self, f: F) -> Result<(), CompilerError>
    where
        F: FnOnce(&mut Self) -> Result<(), CompilerError>,
    {
        self.begin_scope();
        let result = f(self);
        self.end_scope();
        result
    }

    pub fn scope_depth(&self) -> usize {
        self.current.locals.scope_depth()
    }

    /// Emits pops for every local deeper than `depth` but keeps them
    /// declared.
    pub fn discard_locals(&mut self, depth: usize) {
        let ops: Vec<u8> = self
            .current
            .locals
            .above(depth)
            .map(|local| if local.captured() { opcode::CLOSE_UPVALUE } else { opcode::POP })
            .collect();
        for op in ops {
            self.add_u8(op);
        }
    }

    pub fn declare_local(&mut self, name: &str, span: Span) -> Result<StackIndex, CompilerError> {
        if self.current.locals.is_full() {
            return Err(CompilerError::semantic(SemanticError::TooManyLocals(MAX_LOCALS), span));
        }
        let slot = self.current.locals.len();
        let debug_index = if self.options.local_names() && !is_hidden(name) {
            Some(self.current_chunk_mut().add_local_name(name, slot))
        } else {
            None
        };
        Ok(self.current.locals.insert(name, debug_index))
    }

    pub fn resolve_local(&self, name: &str) -> Option<StackIndex> {
        self.current.resolve_local(name)
    }

    pub fn resolve_upvalue(&mut self, name: &str, span: Span) -> Result<Option<UpvalueIndex>, CompilerError> {
        let depth = self.enclosing.len();
        for i in (0..depth).rev() {
            if let Some(local) = self.enclosing[i].resolve_local(name) {
                self.enclosing[i].locals.mark_captured(local);
                let full = || CompilerError::semantic(SemanticError::TooManyUpvalues(MAX_UPVALUES), span);
                let mut upvalue = Upvalue::Local(local);
                for j in (i + 1)..depth {
                    let index = self.enclosing[j].add_upvalue(upvalue).ok_or_else(full)?;
                    upvalue = Upvalue::Upvalue(index);
                }
                let index = self.current.add_upvalue(upvalue).ok_or_else(full)?;
                return Ok(Some(index));
            }
        }

        Ok(None)
    }

    pub fn begin_loop(&mut self) {
        let scope_depth = self.scope_depth();
        self.current.loops.push(LoopContext { scope_depth, breaks: vec![] });
    }

    /// Points every `break` of the innermost loop at the current position.
    pub fn end_loop(&mut self, span: Span) -> Result<(), CompilerError> {
        let context = self
            .current
            .loops
            .pop()
            .ok_or(CompilerError::Internal("no loop to end"))?;
        for index in context.breaks {
            self.patch_jump(index, span)?;
        }
        Ok(())
    }

    pub fn emit_break(&mut self, span: Span) -> Result<(), CompilerError> {
        let depth = match self.current.loops.last() {
            Some(context) => context.scope_depth,
            None => return Err(CompilerError::semantic(SemanticError::BreakOutsideLoop, span)),
        };
        self.discard_locals(depth);
        let jump = self.emit_jump(opcode::JUMP);
        if let Some(context) = self.current.loops.last_mut() {
            context.breaks.push(jump);
        }
        Ok(())
    }

    pub fn add_u8(&mut self, value: u8) -> InstructionIndex {
        self.current_chunk_mut().add_u8(value)
    }

    pub fn add_u32(&mut self, value: u32) -> InstructionIndex {
        self.current_chunk_mut().add_u32(value)
    }

    pub fn emit_jump(&mut self, op: u8) -> InstructionIndex {
        self.add_u8(op);
        self.current_chunk_mut().add_i16(0)
    }

    pub fn patch_jump(&mut self, index: InstructionIndex, span: Span) -> Result<(), CompilerError> {
        if self.current_chunk_mut().patch_instruction(index) {
            Ok(())
        } else {
            Err(CompilerError::semantic(SemanticError::ControlFlowTooComplex, span))
        }
    }

    pub fn emit_loop(&mut self, loop_start: InstructionIndex, span: Span) -> Result<(), CompilerError> {
        let jump = self.emit_jump(opcode::JUMP);
        if self.current_chunk_mut().patch_instruction_to(jump, loop_start) {
            Ok(())
        } else {
            Err(CompilerError::semantic(SemanticError::ControlFlowTooComplex, span))
        }
    }

    pub fn instruction_index(&self) -> InstructionIndex {
        self.current_chunk().instruction_index()
    }

    pub fn add_identifier(&mut self, identifier: &str) -> u32 {
        self.module.add_identifier(identifier) as u32
    }

    pub fn add_constant<C: Into<Constant>>(&mut self, constant: C) -> u32 {
        self.module.add_constant(constant.into()) as u32
    }

    pub fn add_prototype(&mut self, prototype: Prototype) -> u32 {
        self.module.add_prototype(prototype) as u32
    }

    /// Attributes code emitted from here on to the line `span` starts on.
    pub fn set_line(&mut self, span: Span) {
        if self.options.line_info() {
            let line = self.offsets.line(span.start);
            self.current_chunk_mut().mark_line(line);
        }
    }

    pub fn set_line_at_end(&mut self, span: Span) {
        if self.options.line_info() {
            let line = self.offsets.line(span.end);
            self.current_chunk_mut().mark_line(line);
        }
    }
}
