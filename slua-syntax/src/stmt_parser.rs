use super::ast::*;
use super::token::*;
use crate::expr_parser::{parse_expr_list, parse_function_body, parse_suffixed};
use crate::parser::{expect_identifier, Parser};
use crate::position::{Span, WithSpan};

fn is_block_end(kind: TokenKind) -> bool {
    matches!(
        kind,
        TokenKind::Eof | TokenKind::End | TokenKind::Else | TokenKind::ElseIf | TokenKind::Until
    )
}

fn is_statement_start(kind: TokenKind) -> bool {
    matches!(
        kind,
        TokenKind::Local
            | TokenKind::Function
            | TokenKind::If
            | TokenKind::While
            | TokenKind::Repeat
            | TokenKind::For
            | TokenKind::Do
            | TokenKind::Return
            | TokenKind::Break
    )
}

// Skip ahead to a point where parsing can resume after a failed statement.
fn synchronize(it: &mut Parser, statement_start: usize) {
    if it.cursor() == statement_start && !it.is_eof() {
        it.advance();
    }

    loop {
        let kind = it.peek();
        if is_block_end(kind) || is_statement_start(kind) {
            return;
        }
        if kind == TokenKind::Identifier && starts_line(it) {
            return;
        }
        it.advance();
        if kind == TokenKind::Semicolon {
            return;
        }
    }
}

// A name at the start of a line most likely begins the next statement.
fn starts_line(it: &mut Parser) -> bool {
    let span = it.peek_token().span;
    it.line(span) > it.line(it.previous_span())
}

fn parse_expr(it: &mut Parser) -> Result<WithSpan<Expr>, ()> {
    super::expr_parser::parse(it)
}

fn finish(it: &mut Parser, stmt: Stmt, start: Span) -> WithSpan<Stmt> {
    WithSpan::new(stmt, Span::union_span(start, it.previous_span()))
}

/// Parses statements up to the next block terminator. Failed statements are
/// recorded as diagnostics and skipped.
pub fn parse_block(it: &mut Parser) -> Block {
    if it.descend().is_err() {
        return Vec::new();
    }
    let statements = parse_statements(it);
    it.ascend(1);
    statements
}

fn parse_statements(it: &mut Parser) -> Block {
    let mut statements = Vec::new();
    loop {
        let kind = it.peek();
        if is_block_end(kind) {
            break;
        }
        if kind == TokenKind::Semicolon {
            it.advance();
            continue;
        }

        let start = it.cursor();
        let is_return = kind == TokenKind::Return;
        match parse_statement(it) {
            Ok(stmt) => statements.push(stmt),
            Err(()) => {
                synchronize(it, start);
                continue;
            }
        }

        // Nothing may follow a return in the same block
        if is_return {
            break;
        }
    }
    statements
}

fn parse_statement(it: &mut Parser) -> Result<WithSpan<Stmt>, ()> {
    match it.peek() {
        TokenKind::Local => parse_local(it),
        TokenKind::Function => parse_function_statement(it),
        TokenKind::If => parse_if_statement(it),
        TokenKind::While => parse_while_statement(it),
        TokenKind::Repeat => parse_repeat_statement(it),
        TokenKind::For => parse_for_statement(it),
        TokenKind::Do => parse_do_statement(it),
        TokenKind::Return => parse_return_statement(it),
        TokenKind::Break => {
            let token = it.advance();
            Ok(WithSpan::new(Stmt::Break, token.span))
        }
        _ => parse_expr_statement(it),
    }
}

fn parse_local(it: &mut Parser) -> Result<WithSpan<Stmt>, ()> {
    let keyword = it.expect(TokenKind::Local)?;

    if it.check(TokenKind::Function) {
        let function = it.advance();
        let name = expect_identifier(it)?;
        let body = parse_function_body(it, function.span, Some(name.value.clone()), false)?;
        return Ok(finish(it, Stmt::LocalFunction(name, Box::new(body)), keyword.span));
    }

    let mut names = vec![expect_identifier(it)?];
    while it.optionally(TokenKind::Comma) {
        names.push(expect_identifier(it)?);
    }

    let values = if it.optionally(TokenKind::Equal) {
        parse_expr_list(it)?
    } else {
        Vec::new()
    };

    Ok(finish(it, Stmt::Local(names, values), keyword.span))
}

// function a.b.c:m(...) end is sugar for a.b.c.m = function(self, ...) end
fn parse_function_statement(it: &mut Parser) -> Result<WithSpan<Stmt>, ()> {
    let keyword = it.expect(TokenKind::Function)?;

    let name = expect_identifier(it)?;
    let mut path = name.value.clone();
    let mut target = WithSpan::new(Expr::Variable(name.clone()), name.span);
    let mut with_self = false;

    loop {
        let separator = match it.peek() {
            TokenKind::Dot => ".",
            TokenKind::Colon => ":",
            _ => break,
        };
        it.advance();
        let field = expect_identifier(it)?;
        path.push_str(separator);
        path.push_str(&field.value);
        let span = Span::union(&target, &field);
        target = WithSpan::new(Expr::Get(Box::new(target), field), span);

        if separator == ":" {
            with_self = true;
            break;
        }
    }

    let body = parse_function_body(it, keyword.span, Some(path), with_self)?;
    let function_span = Span::union_span(keyword.span, it.previous_span());
    let function = WithSpan::new(Expr::Function(Box::new(body)), function_span);

    Ok(finish(it, Stmt::Assign(vec![target], vec![function]), keyword.span))
}

fn parse_if_statement(it: &mut Parser) -> Result<WithSpan<Stmt>, ()> {
    let keyword = it.expect(TokenKind::If)?;
    let mut branches = Vec::new();

    let condition = parse_expr(it)?;
    it.expect(TokenKind::Then)?;
    branches.push((condition, parse_block(it)));

    while it.optionally(TokenKind::ElseIf) {
        let condition = parse_expr(it)?;
        it.expect(TokenKind::Then)?;
        branches.push((condition, parse_block(it)));
    }

    let else_block = if it.optionally(TokenKind::Else) {
        Some(parse_block(it))
    } else {
        None
    };

    it.expect_match(TokenKind::End, TokenKind::If, keyword.span)?;

    Ok(finish(it, Stmt::If(branches, else_block), keyword.span))
}

fn parse_while_statement(it: &mut Parser) -> Result<WithSpan<Stmt>, ()> {
    let keyword = it.expect(TokenKind::While)?;
    let condition = parse_expr(it)?;
    it.expect(TokenKind::Do)?;
    let body = parse_block(it);
    it.expect_match(TokenKind::End, TokenKind::While, keyword.span)?;
    Ok(finish(it, Stmt::While(Box::new(condition), body), keyword.span))
}

fn parse_repeat_statement(it: &mut Parser) -> Result<WithSpan<Stmt>, ()> {
    let keyword = it.expect(TokenKind::Repeat)?;
    let body = parse_block(it);
    it.expect_match(TokenKind::Until, TokenKind::Repeat, keyword.span)?;
    let condition = parse_expr(it)?;
    Ok(finish(it, Stmt::Repeat(body, Box::new(condition)), keyword.span))
}

fn parse_do_statement(it: &mut Parser) -> Result<WithSpan<Stmt>, ()> {
    let keyword = it.expect(TokenKind::Do)?;
    let body = parse_block(it);
    it.expect_match(TokenKind::End, TokenKind::Do, keyword.span)?;
    Ok(finish(it, Stmt::Do(body), keyword.span))
}

pub const FOR_LIMIT: &str = "(for limit)";
pub const FOR_STEP: &str = "(for step)";
pub const FOR_INDEX: &str = "(for index)";

// for i = a, b, c do body end
// becomes
// do
//   local (for index), (for limit), (for step) = a, b, c
//   while (step > 0 and index <= limit) or (step <= 0 and index >= limit) do
//     do local i = (for index); body end
//     (for index) = (for index) + step
//   end
// end
// so each iteration gets its own `i` and the body cannot move the loop.
fn parse_for_statement(it: &mut Parser) -> Result<WithSpan<Stmt>, ()> {
    let keyword = it.expect(TokenKind::For)?;
    let variable = expect_identifier(it)?;
    it.expect(TokenKind::Equal)?;
    let start = parse_expr(it)?;
    it.expect(TokenKind::Comma)?;
    let limit = parse_expr(it)?;
    let step = if it.optionally(TokenKind::Comma) {
        parse_expr(it)?
    } else {
        WithSpan::new(Expr::Number(1.0), limit.span)
    };
    let do_token = it.expect(TokenKind::Do)?;
    let body = parse_block(it);
    it.expect_match(TokenKind::End, TokenKind::For, keyword.span)?;

    let span = Span::union_span(keyword.span, it.previous_span());
    let header = do_token.span;
    let name = |value: &str| WithSpan::new(value.to_string(), variable.span);
    let var = |value: &str| WithSpan::new(Expr::Variable(name(value)), variable.span);
    let number = |value: f64| WithSpan::new(Expr::Number(value), header);
    let binary = |left: WithSpan<Expr>, operator: BinaryOperator, right: WithSpan<Expr>| {
        WithSpan::new(
            Expr::Binary(Box::new(left), WithSpan::new(operator, header), Box::new(right)),
            header,
        )
    };
    let logical = |left: WithSpan<Expr>, operator: LogicalOperator, right: WithSpan<Expr>| {
        WithSpan::new(
            Expr::Logical(Box::new(left), WithSpan::new(operator, header), Box::new(right)),
            header,
        )
    };

    let declare = WithSpan::new(
        Stmt::Local(
            vec![name(FOR_INDEX), name(FOR_LIMIT), name(FOR_STEP)],
            vec![start, limit, step],
        ),
        keyword.span,
    );

    let ascending = logical(
        binary(var(FOR_STEP), BinaryOperator::Greater, number(0.0)),
        LogicalOperator::And,
        binary(var(FOR_INDEX), BinaryOperator::LessEqual, var(FOR_LIMIT)),
    );
    let descending = logical(
        binary(var(FOR_STEP), BinaryOperator::LessEqual, number(0.0)),
        LogicalOperator::And,
        binary(var(FOR_INDEX), BinaryOperator::GreaterEqual, var(FOR_LIMIT)),
    );
    let condition = logical(ascending, LogicalOperator::Or, descending);

    let increment = WithSpan::new(
        Stmt::Assign(
            vec![var(FOR_INDEX)],
            vec![binary(var(FOR_INDEX), BinaryOperator::Plus, var(FOR_STEP))],
        ),
        header,
    );
    let body_span = Span::union_span(header, it.previous_span());
    let mut iteration = vec![WithSpan::new(
        Stmt::Local(vec![name(&variable.value)], vec![var(FOR_INDEX)]),
        variable.span,
    )];
    iteration.extend(body);
    let looped = WithSpan::new(
        Stmt::While(
            Box::new(condition),
            vec![WithSpan::new(Stmt::Do(iteration), body_span), increment],
        ),
        span,
    );

    Ok(WithSpan::new(Stmt::Do(vec![declare, looped]), span))
}

fn parse_return_statement(it: &mut Parser) -> Result<WithSpan<Stmt>, ()> {
    let keyword = it.expect(TokenKind::Return)?;
    let kind = it.peek();
    let values = if is_block_end(kind) || kind == TokenKind::Semicolon {
        Vec::new()
    } else {
        parse_expr_list(it)?
    };
    it.optionally(TokenKind::Semicolon);
    Ok(finish(it, Stmt::Return(values), keyword.span))
}

fn parse_expr_statement(it: &mut Parser) -> Result<WithSpan<Stmt>, ()> {
    let expr = parse_suffixed(it)?;

    if it.check(TokenKind::Equal) || it.check(TokenKind::Comma) {
        let mut targets = vec![expr];
        while it.optionally(TokenKind::Comma) {
            targets.push(parse_suffixed(it)?);
        }
        if let Some(target) = targets.iter().find(|target| !target.value.is_assignable()) {
            it.error("Assigned expression must be a variable or a field", target.span);
            return Err(());
        }
        it.expect(TokenKind::Equal)?;
        let values = parse_expr_list(it)?;
        let start = targets[0].span;
        return Ok(finish(it, Stmt::Assign(targets, values), start));
    }

    if expr.value.is_call() {
        let span = expr.span;
        return Ok(WithSpan::new(Stmt::Expression(Box::new(expr)), span));
    }

    it.error("Incomplete statement: expected assignment or a function call", expr.span);
    Err(())
}

/// Parses a whole chunk. Stray block terminators at the top level are
/// reported and skipped so later statements still get checked.
pub fn parse(it: &mut Parser) -> Block {
    let mut statements = parse_block(it);
    while !it.is_eof() {
        let start = it.cursor();
        let token = it.peek_token();
        it.error(format!("Expected <eof> got {}", token.value), token.span);
        synchronize(it, start);
        statements.extend(parse_block(it));
    }
    statements
}
