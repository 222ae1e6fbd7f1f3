use slua_bytecode::opcode;
use slua_bytecode::Prototype;
use slua_syntax::ast::*;
use slua_syntax::position::{Span, WithSpan};

use super::compiler::Compiler;
use super::fold::{fold, Literal};
use super::statements::compile_ast;
use super::CompilerError;
use crate::error::SemanticError;

pub const MAX_ARGUMENTS: usize = 255;
pub const MAX_PARAMETERS: usize = 255;

pub fn compile_expr(compiler: &mut Compiler, expr: &WithSpan<Expr>) -> Result<(), CompilerError> {
    if compiler.options().folds_constants() {
        if let Some(literal) = fold(&expr.value) {
            compile_literal(compiler, literal);
            return Ok(());
        }
    }

    match &expr.value {
        Expr::Nil => compile_literal(compiler, Literal::Nil),
        Expr::Boolean(b) => compile_literal(compiler, Literal::Boolean(*b)),
        Expr::Number(n) => compile_literal(compiler, Literal::Number(*n)),
        Expr::String(s) => compile_literal(compiler, Literal::String(s)),
        Expr::Variable(identifier) => return compile_variable(compiler, identifier),
        Expr::Function(body) => return compile_function(compiler, body, expr.span),
        Expr::Table(fields) => return compile_table(compiler, fields),
        Expr::Grouping(inner) => return compile_expr(compiler, inner),
        Expr::Unary(operator, right) => return compile_unary(compiler, operator, right),
        Expr::Binary(left, operator, right) => return compile_binary(compiler, operator, left, right),
        Expr::Logical(left, operator, right) => return compile_logical(compiler, operator, left, right, expr.span),
        Expr::Get(object, name) => return compile_get(compiler, object, name),
        Expr::Index(object, key) => return compile_index(compiler, object, key),
        Expr::Call(callee, args) => return compile_call(compiler, callee, args, expr.span),
        Expr::Invoke(receiver, name, args) => return compile_invoke(compiler, receiver, name, args, expr.span),
    }
    Ok(())
}

fn compile_literal(compiler: &mut Compiler, literal: Literal) {
    match literal {
        Literal::Nil => {
            compiler.add_u8(opcode::NIL);
        }
        Literal::Boolean(true) => {
            compiler.add_u8(opcode::TRUE);
        }
        Literal::Boolean(false) => {
            compiler.add_u8(opcode::FALSE);
        }
        Literal::Number(n) => {
            let constant = compiler.add_constant(n);
            compiler.add_u8(opcode::CONSTANT);
            compiler.add_u32(constant);
        }
        Literal::String(s) => {
            let constant = compiler.add_constant(s);
            compiler.add_u8(opcode::CONSTANT);
            compiler.add_u32(constant);
        }
    }
}

pub fn compile_variable(compiler: &mut Compiler, identifier: &WithSpan<Identifier>) -> Result<(), CompilerError> {
    if let Some(local) = compiler.resolve_local(&identifier.value) {
        compiler.add_u8(opcode::GET_LOCAL);
        compiler.add_u32(local as u32);
    } else if let Some(upvalue) = compiler.resolve_upvalue(&identifier.value, identifier.span)? {
        compiler.add_u8(opcode::GET_UPVALUE);
        compiler.add_u32(upvalue as u32);
    } else {
        let constant = compiler.add_identifier(&identifier.value);
        compiler.add_u8(opcode::GET_GLOBAL);
        compiler.add_u32(constant);
    }
    Ok(())
}

/// Pops the top of the stack into the variable.
pub fn compile_variable_store(compiler: &mut Compiler, identifier: &WithSpan<Identifier>) -> Result<(), CompilerError> {
    if let Some(local) = compiler.resolve_local(&identifier.value) {
        compiler.add_u8(opcode::SET_LOCAL);
        compiler.add_u32(local as u32);
    } else if let Some(upvalue) = compiler.resolve_upvalue(&identifier.value, identifier.span)? {
        compiler.add_u8(opcode::SET_UPVALUE);
        compiler.add_u32(upvalue as u32);
    } else {
        let constant = compiler.add_identifier(&identifier.value);
        compiler.add_u8(opcode::SET_GLOBAL);
        compiler.add_u32(constant);
    }
    Ok(())
}

/// Compiles `body` into its own chunk and emits the `CLOSURE` that
/// instantiates it.
pub fn compile_function(compiler: &mut Compiler, body: &FunctionBody, span: Span) -> Result<(), CompilerError> {
    if let Some(extra) = body.params.get(MAX_PARAMETERS) {
        return Err(CompilerError::semantic(SemanticError::TooManyParameters(MAX_PARAMETERS), extra.span));
    }

    let (chunk_index, upvalues) = compiler.with_context(|compiler| {
        compiler.set_line(span);
        compiler.begin_scope();
        for param in &body.params {
            compiler.declare_local(&param.value, param.span)?;
        }

        compile_ast(compiler, &body.body)?;

        compiler.set_line_at_end(span);
        compiler.add_u8(opcode::RETURN);
        compiler.add_u8(0);
        Ok(())
    })?;

    let name = if compiler.options().line_info() {
        body.name.clone().unwrap_or_default()
    } else {
        String::new()
    };

    let prototype = compiler.add_prototype(Prototype {
        name,
        chunk_index,
        arity: body.params.len() as u8,
        upvalues,
    });
    compiler.add_u8(opcode::CLOSURE);
    compiler.add_u32(prototype);
    Ok(())
}

fn compile_table(compiler: &mut Compiler, fields: &[TableField]) -> Result<(), CompilerError> {
    compiler.add_u8(opcode::NEW_TABLE);
    for field in fields {
        match field {
            TableField::Positional(value) => {
                compile_expr(compiler, value)?;
                compiler.add_u8(opcode::APPEND);
            }
            TableField::Named(name, value) => {
                compile_expr(compiler, value)?;
                let constant = compiler.add_identifier(&name.value);
                compiler.add_u8(opcode::INIT_FIELD);
                compiler.add_u32(constant);
            }
            TableField::Indexed(key, value) => {
                compile_expr(compiler, key)?;
                compile_expr(compiler, value)?;
                compiler.add_u8(opcode::INIT_INDEX);
            }
        }
    }
    Ok(())
}

fn compile_unary(
    compiler: &mut Compiler,
    operator: &WithSpan<UnaryOperator>,
    right: &WithSpan<Expr>,
) -> Result<(), CompilerError> {
    compile_expr(compiler, right)?;
    match operator.value {
        UnaryOperator::Minus => compiler.add_u8(opcode::NEGATE),
        UnaryOperator::Not => compiler.add_u8(opcode::NOT),
        UnaryOperator::Length => compiler.add_u8(opcode::LENGTH),
    };
    Ok(())
}

fn compile_binary(
    compiler: &mut Compiler,
    operator: &WithSpan<BinaryOperator>,
    left: &WithSpan<Expr>,
    right: &WithSpan<Expr>,
) -> Result<(), CompilerError> {
    compile_expr(compiler, left)?;
    compile_expr(compiler, right)?;
    match operator.value {
        BinaryOperator::Plus => compiler.add_u8(opcode::ADD),
        BinaryOperator::Minus => compiler.add_u8(opcode::SUBTRACT),
        BinaryOperator::Star => compiler.add_u8(opcode::MULTIPLY),
        BinaryOperator::Slash => compiler.add_u8(opcode::DIVIDE),
        BinaryOperator::Percent => compiler.add_u8(opcode::MODULO),
        BinaryOperator::Caret => compiler.add_u8(opcode::POWER),
        BinaryOperator::DotDot => compiler.add_u8(opcode::CONCAT),
        BinaryOperator::EqualEqual => compiler.add_u8(opcode::EQUAL),
        BinaryOperator::TildeEqual => {
            compiler.add_u8(opcode::EQUAL);
            compiler.add_u8(opcode::NOT)
        }
        BinaryOperator::Less => compiler.add_u8(opcode::LESS),
        BinaryOperator::LessEqual => {
            compiler.add_u8(opcode::GREATER);
            compiler.add_u8(opcode::NOT)
        }
        BinaryOperator::Greater => compiler.add_u8(opcode::GREATER),
        BinaryOperator::GreaterEqual => {
            compiler.add_u8(opcode::LESS);
            compiler.add_u8(opcode::NOT)
        }
    };
    Ok(())
}

fn compile_logical(
    compiler: &mut Compiler,
    operator: &WithSpan<LogicalOperator>,
    left: &WithSpan<Expr>,
    right: &WithSpan<Expr>,
    span: Span,
) -> Result<(), CompilerError> {
    match operator.value {
        LogicalOperator::And => compile_logical_and(compiler, left, right, span),
        LogicalOperator::Or => compile_logical_or(compiler, left, right, span),
    }
}

fn compile_logical_or(
    compiler: &mut Compiler,
    left: &WithSpan<Expr>,
    right: &WithSpan<Expr>,
    span: Span,
) -> Result<(), CompilerError> {
    compile_expr(compiler, left)?;
    let else_jump = compiler.emit_jump(opcode::JUMP_IF_FALSE);
    let end_jump = compiler.emit_jump(opcode::JUMP);
    compiler.patch_jump(else_jump, span)?;
    compiler.add_u8(opcode::POP);
    compile_expr(compiler, right)?;
    compiler.patch_jump(end_jump, span)
}

fn compile_logical_and(
    compiler: &mut Compiler,
    left: &WithSpan<Expr>,
    right: &WithSpan<Expr>,
    span: Span,
) -> Result<(), CompilerError> {
    compile_expr(compiler, left)?;
    let end_jump = compiler.emit_jump(opcode::JUMP_IF_FALSE);
    compiler.add_u8(opcode::POP);
    compile_expr(compiler, right)?;
    compiler.patch_jump(end_jump, span)
}

fn compile_get(compiler: &mut Compiler, object: &WithSpan<Expr>, name: &WithSpan<Identifier>) -> Result<(), CompilerError> {
    compile_expr(compiler, object)?;
    let constant = compiler.add_identifier(&name.value);
    compiler.add_u8(opcode::GET_FIELD);
    compiler.add_u32(constant);
    Ok(())
}

fn compile_index(compiler: &mut Compiler, object: &WithSpan<Expr>, key: &WithSpan<Expr>) -> Result<(), CompilerError> {
    compile_expr(compiler, object)?;
    compile_expr(compiler, key)?;
    compiler.add_u8(opcode::GET_INDEX);
    Ok(())
}

fn compile_arguments(compiler: &mut Compiler, args: &[WithSpan<Expr>]) -> Result<u8, CompilerError> {
    if let Some(extra) = args.get(MAX_ARGUMENTS) {
        return Err(CompilerError::semantic(SemanticError::TooManyArguments(MAX_ARGUMENTS), extra.span));
    }
    for arg in args {
        compile_expr(compiler, arg)?;
    }
    Ok(args.len() as u8)
}

fn compile_call(
    compiler: &mut Compiler,
    callee: &WithSpan<Expr>,
    args: &[WithSpan<Expr>],
    span: Span,
) -> Result<(), CompilerError> {
    compile_expr(compiler, callee)?;
    let count = compile_arguments(compiler, args)?;
    compiler.set_line(span);
    compiler.add_u8(opcode::CALL);
    compiler.add_u8(count);
    Ok(())
}

fn compile_invoke(
    compiler: &mut Compiler,
    receiver: &WithSpan<Expr>,
    name: &WithSpan<Identifier>,
    args: &[WithSpan<Expr>],
    span: Span,
) -> Result<(), CompilerError> {
    compile_expr(compiler, receiver)?;
    let count = compile_arguments(compiler, args)?;
    let constant = compiler.add_identifier(&name.value);
    compiler.set_line(span);
    compiler.add_u8(opcode::INVOKE);
    compiler.add_u8(count);
    compiler.add_u32(constant);
    Ok(())
}
