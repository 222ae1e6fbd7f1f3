use slua_bytecode::opcode;
use slua_syntax::ast::*;
use slua_syntax::position::{Span, WithSpan};

use super::compiler::Compiler;
use super::expressions::{compile_expr, compile_function, compile_variable_store};
use super::CompilerError;
use crate::error::SemanticError;

pub const MAX_RETURN_VALUES: usize = 255;

pub fn compile_ast(compiler: &mut Compiler, ast: &Ast) -> Result<(), CompilerError> {
    for stmt in ast {
        compile_stmt(compiler, stmt)?;
    }
    Ok(())
}

fn compile_stmt(compiler: &mut Compiler, stmt: &WithSpan<Stmt>) -> Result<(), CompilerError> {
    compiler.set_line(stmt.span);
    match &stmt.value {
        Stmt::Expression(expr) => compile_expression_statement(compiler, expr),
        Stmt::Local(names, values) => compile_local(compiler, names, values),
        Stmt::LocalFunction(name, body) => compile_local_function(compiler, name, body, stmt.span),
        Stmt::Assign(targets, values) => compile_assign(compiler, targets, values),
        Stmt::If(branches, else_block) => compile_if(compiler, branches, else_block.as_ref(), stmt.span),
        Stmt::While(condition, body) => compile_while(compiler, condition, body, stmt.span),
        Stmt::Repeat(body, condition) => compile_repeat(compiler, body, condition, stmt.span),
        Stmt::Do(body) => compile_block(compiler, body),
        Stmt::Break => compiler.emit_break(stmt.span),
        Stmt::Return(values) => compile_return(compiler, values, stmt.span),
    }
}

fn compile_block(compiler: &mut Compiler, block: &Block) -> Result<(), CompilerError> {
    compiler.with_scope(|compiler| compile_ast(compiler, block))
}

fn compile_expression_statement(compiler: &mut Compiler, expr: &WithSpan<Expr>) -> Result<(), CompilerError> {
    compile_expr(compiler, expr)?;
    compiler.add_u8(opcode::POP);
    Ok(())
}

/// Leaves exactly `count` values on the stack: extra values are evaluated
/// and dropped, missing ones are nil.
fn compile_adjusted(compiler: &mut Compiler, values: &[WithSpan<Expr>], count: usize) -> Result<(), CompilerError> {
    for (index, value) in values.iter().enumerate() {
        compile_expr(compiler, value)?;
        if index >= count {
            compiler.add_u8(opcode::POP);
        }
    }
    for _ in values.len()..count {
        compiler.add_u8(opcode::NIL);
    }
    Ok(())
}

fn compile_local(
    compiler: &mut Compiler,
    names: &[WithSpan<Identifier>],
    values: &[WithSpan<Expr>],
) -> Result<(), CompilerError> {
    compile_adjusted(compiler, values, names.len())?;
    // Declared only now so the values still see any shadowed outer names.
    for name in names {
        compiler.declare_local(&name.value, name.span)?;
    }
    Ok(())
}

fn compile_local_function(
    compiler: &mut Compiler,
    name: &WithSpan<Identifier>,
    body: &FunctionBody,
    span: Span,
) -> Result<(), CompilerError> {
    compiler.declare_local(&name.value, name.span)?;
    compile_function(compiler, body, span)
}

fn compile_assign(
    compiler: &mut Compiler,
    targets: &[WithSpan<Expr>],
    values: &[WithSpan<Expr>],
) -> Result<(), CompilerError> {
    if let ([target], [value]) = (targets, values) {
        return compile_single_assign(compiler, target, value);
    }

    // Every value lands in a hidden temporary before any target is touched.
    compiler.with_scope(|compiler| {
        compile_adjusted(compiler, values, targets.len())?;
        let mut temporaries = Vec::with_capacity(targets.len());
        for target in targets {
            temporaries.push(compiler.declare_local("(assign)", target.span)?);
        }

        for (target, temporary) in targets.iter().zip(temporaries) {
            compile_store(compiler, target, |compiler| {
                compiler.add_u8(opcode::GET_LOCAL);
                compiler.add_u32(temporary as u32);
                Ok(())
            })?;
        }
        Ok(())
    })
}

fn compile_single_assign(
    compiler: &mut Compiler,
    target: &WithSpan<Expr>,
    value: &WithSpan<Expr>,
) -> Result<(), CompilerError> {
    compile_store(compiler, target, |compiler| compile_expr(compiler, value))
}

/// Stores the value produced by `value` into `target`. Table and key are
/// evaluated before the value.
fn compile_store<F>(compiler: &mut Compiler, target: &WithSpan<Expr>, value: F) -> Result<(), CompilerError>
where
    F: FnOnce(&mut Compiler) -> Result<(), CompilerError>,
{
    match &target.value {
        Expr::Variable(identifier) => {
            value(compiler)?;
            compile_variable_store(compiler, identifier)
        }
        Expr::Get(object, name) => {
            compile_expr(compiler, object)?;
            value(compiler)?;
            let constant = compiler.add_identifier(&name.value);
            compiler.add_u8(opcode::SET_FIELD);
            compiler.add_u32(constant);
            Ok(())
        }
        Expr::Index(object, key) => {
            compile_expr(compiler, object)?;
            compile_expr(compiler, key)?;
            value(compiler)?;
            compiler.add_u8(opcode::SET_INDEX);
            Ok(())
        }
        _ => Err(CompilerError::Internal("assignment to a non-assignable expression")),
    }
}

fn compile_if(
    compiler: &mut Compiler,
    branches: &[(WithSpan<Expr>, Block)],
    else_block: Option<&Block>,
    span: Span,
) -> Result<(), CompilerError> {
    let mut end_jumps = Vec::new();

    for (condition, block) in branches {
        compiler.set_line(condition.span);
        compile_expr(compiler, condition)?;
        let next = compiler.emit_jump(opcode::JUMP_IF_FALSE);
        compiler.add_u8(opcode::POP);
        compile_block(compiler, block)?;
        end_jumps.push(compiler.emit_jump(opcode::JUMP));
        compiler.patch_jump(next, span)?;
        compiler.add_u8(opcode::POP);
    }

    if let Some(block) = else_block {
        compile_block(compiler, block)?;
    }

    for jump in end_jumps {
        compiler.patch_jump(jump, span)?;
    }
    Ok(())
}

fn compile_while(
    compiler: &mut Compiler,
    condition: &WithSpan<Expr>,
    body: &Block,
    span: Span,
) -> Result<(), CompilerError> {
    let loop_start = compiler.instruction_index();
    compile_expr(compiler, condition)?;
    let exit = compiler.emit_jump(opcode::JUMP_IF_FALSE);
    compiler.add_u8(opcode::POP);

    compiler.begin_loop();
    compile_block(compiler, body)?;
    compiler.emit_loop(loop_start, span)?;

    compiler.patch_jump(exit, span)?;
    compiler.add_u8(opcode::POP);
    compiler.end_loop(span)
}

// The condition can see the body's locals, so the scope stays open until
// both exits have popped them.
fn compile_repeat(
    compiler: &mut Compiler,
    body: &Block,
    condition: &WithSpan<Expr>,
    span: Span,
) -> Result<(), CompilerError> {
    let loop_start = compiler.instruction_index();
    let outer_depth = compiler.scope_depth();

    compiler.begin_loop();
    compiler.begin_scope();
    let result = compile_repeat_body(compiler, body, condition, loop_start, outer_depth, span);
    compiler.drop_scope();
    result?;
    compiler.end_loop(span)
}

fn compile_repeat_body(
    compiler: &mut Compiler,
    body: &Block,
    condition: &WithSpan<Expr>,
    loop_start: usize,
    outer_depth: usize,
    span: Span,
) -> Result<(), CompilerError> {
    compile_ast(compiler, body)?;
    compiler.set_line(condition.span);
    compile_expr(compiler, condition)?;
    let again = compiler.emit_jump(opcode::JUMP_IF_FALSE);

    compiler.add_u8(opcode::POP);
    compiler.discard_locals(outer_depth);
    let exit = compiler.emit_jump(opcode::JUMP);

    compiler.patch_jump(again, span)?;
    compiler.add_u8(opcode::POP);
    compiler.discard_locals(outer_depth);
    compiler.emit_loop(loop_start, span)?;

    compiler.patch_jump(exit, span)
}

fn compile_return(compiler: &mut Compiler, values: &[WithSpan<Expr>], span: Span) -> Result<(), CompilerError> {
    if let Some(extra) = values.get(MAX_RETURN_VALUES) {
        return Err(CompilerError::semantic(
            SemanticError::TooManyReturnValues(MAX_RETURN_VALUES),
            extra.span,
        ));
    }
    for value in values {
        compile_expr(compiler, value)?;
    }
    compiler.set_line(span);
    compiler.add_u8(opcode::RETURN);
    compiler.add_u8(values.len() as u8);
    Ok(())
}
