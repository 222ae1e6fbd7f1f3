mod compiler;
mod expressions;
mod fold;
mod locals;
mod statements;


use slua_bytecode::{opcode, Module};
use slua_syntax::ast::Ast;
use slua_syntax::position::{LineOffsets, Span, WithSpan};

use crate::error::SemanticError;
use crate::options::CompileOptions;
use compiler::Compiler;
use statements::compile_ast;

#[derive(Debug)]
pub enum CompilerError {
    Semantic(WithSpan<SemanticError>),
    Internal(&'static str),
}

impl CompilerError {
    pub fn semantic(error: SemanticError, span: Span) -> CompilerError {
        CompilerError::Semantic(WithSpan::new(error, span))
    }
}

pub fn compile(ast: &Ast, offsets: &LineOffsets, options: CompileOptions) -> Result<Module, CompilerError> {
    let mut compiler = Compiler::new(offsets, options);

    compile_ast(&mut compiler, ast)?;
    if let Some(last) = ast.last() {
        compiler.set_line_at_end(last.span);
    }
    compiler.add_u8(opcode::RETURN);
    compiler.add_u8(0);

    Ok(compiler.into_module())
}
