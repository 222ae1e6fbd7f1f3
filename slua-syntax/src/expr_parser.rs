use super::ast::*;
use super::token::*;
use crate::parser::{expect_identifier, Parser};
use crate::position::{Span, WithSpan};

#[derive(PartialEq, PartialOrd, Copy, Clone, Debug)]
enum Precedence {
    None,
    Or,
    And,
    Comparison, // == ~= < <= > >=
    Concat,     // .. (right associative)
    Term,       // + -
    Factor,     // * / %
    Unary,      // not # -
    Power,      // ^ (right associative)
}

impl From<TokenKind> for Precedence {
    fn from(token: TokenKind) -> Precedence {
        match token {
            TokenKind::Or => Precedence::Or,
            TokenKind::And => Precedence::And,
            TokenKind::EqualEqual
            | TokenKind::TildeEqual
            | TokenKind::Less
            | TokenKind::LessEqual
            | TokenKind::Greater
            | TokenKind::GreaterEqual => Precedence::Comparison,
            TokenKind::DotDot => Precedence::Concat,
            TokenKind::Plus | TokenKind::Minus => Precedence::Term,
            TokenKind::Star | TokenKind::Slash | TokenKind::Percent => Precedence::Factor,
            TokenKind::Caret => Precedence::Power,
            _ => Precedence::None,
        }
    }
}

impl Precedence {
    // Precedence the right operand is parsed with
    fn right_operand(self) -> Precedence {
        match self {
            Precedence::Concat => Precedence::Comparison,
            Precedence::Power => Precedence::Unary,
            other => other,
        }
    }
}

fn parse_expr(it: &mut Parser, precedence: Precedence) -> Result<WithSpan<Expr>, ()> {
    it.nested(|it| {
        let expr = parse_prefix(it)?;
        parse_infixes(it, precedence, expr)
    })
}

// Every operator nests the tree one level deeper on the left.
fn parse_infixes(it: &mut Parser, precedence: Precedence, mut expr: WithSpan<Expr>) -> Result<WithSpan<Expr>, ()> {
    let mut levels = 0;
    let result = loop {
        let next_precedence = Precedence::from(it.peek());
        if precedence >= next_precedence {
            break Ok(expr);
        }
        if it.descend().is_err() {
            break Err(());
        }
        levels += 1;
        expr = match parse_infix(it, expr) {
            Ok(expr) => expr,
            Err(()) => break Err(()),
        };
    };
    it.ascend(levels);
    result
}

fn parse_infix(it: &mut Parser, left: WithSpan<Expr>) -> Result<WithSpan<Expr>, ()> {
    match it.peek() {
        TokenKind::Or | TokenKind::And => parse_logical(it, left),
        _ => parse_binary(it, left),
    }
}

fn parse_prefix(it: &mut Parser) -> Result<WithSpan<Expr>, ()> {
    match it.peek() {
        TokenKind::Number
        | TokenKind::Nil
        | TokenKind::True
        | TokenKind::False
        | TokenKind::String => parse_primary(it),
        TokenKind::Identifier | TokenKind::LeftParen => parse_suffixed(it),
        TokenKind::Not | TokenKind::Minus | TokenKind::Hash => parse_unary(it),
        TokenKind::Function => parse_function(it),
        TokenKind::LeftBrace => parse_table(it),
        _ => {
            let token = it.peek_token();
            it.error(format!("Expected expression got {}", token.value), token.span);
            Err(())
        }
    }
}

/// A name or parenthesized expression followed by any number of field
/// accesses, index operations and calls.
pub fn parse_suffixed(it: &mut Parser) -> Result<WithSpan<Expr>, ()> {
    it.nested(|it| {
        let expr = match it.peek() {
            TokenKind::LeftParen => parse_grouping(it)?,
            _ => {
                let name = expect_identifier(it)?;
                let span = name.span;
                WithSpan::new(Expr::Variable(name), span)
            }
        };
        parse_suffixes(it, expr)
    })
}

fn parse_suffixes(it: &mut Parser, mut expr: WithSpan<Expr>) -> Result<WithSpan<Expr>, ()> {
    let mut levels = 0;
    let result = loop {
        let parse_suffix: fn(&mut Parser, WithSpan<Expr>) -> Result<WithSpan<Expr>, ()> = match it.peek() {
            TokenKind::Dot => parse_get,
            TokenKind::LeftBracket => parse_index,
            TokenKind::Colon => parse_invoke,
            TokenKind::LeftParen | TokenKind::String | TokenKind::LeftBrace => parse_call,
            _ => break Ok(expr),
        };
        if it.descend().is_err() {
            break Err(());
        }
        levels += 1;
        expr = match parse_suffix(it, expr) {
            Ok(expr) => expr,
            Err(()) => break Err(()),
        };
    };
    it.ascend(levels);
    result
}

fn parse_get(it: &mut Parser, left: WithSpan<Expr>) -> Result<WithSpan<Expr>, ()> {
    it.expect(TokenKind::Dot)?;
    let name = expect_identifier(it)?;
    let span = Span::union(&left, &name);
    Ok(WithSpan::new(Expr::Get(Box::new(left), name), span))
}

fn parse_index(it: &mut Parser, left: WithSpan<Expr>) -> Result<WithSpan<Expr>, ()> {
    let open = it.expect(TokenKind::LeftBracket)?;
    let index = parse_expr(it, Precedence::None)?;
    let close = it.expect_match(TokenKind::RightBracket, TokenKind::LeftBracket, open.span)?;
    let span = Span::union(&left, close);
    Ok(WithSpan::new(Expr::Index(Box::new(left), Box::new(index)), span))
}

fn parse_invoke(it: &mut Parser, left: WithSpan<Expr>) -> Result<WithSpan<Expr>, ()> {
    it.expect(TokenKind::Colon)?;
    let name = expect_identifier(it)?;
    let (args, end) = parse_arguments(it)?;
    let span = Span::union_span(left.span, end);
    Ok(WithSpan::new(Expr::Invoke(Box::new(left), name, args), span))
}

fn parse_call(it: &mut Parser, left: WithSpan<Expr>) -> Result<WithSpan<Expr>, ()> {
    let (args, end) = parse_arguments(it)?;
    let span = Span::union_span(left.span, end);
    Ok(WithSpan::new(Expr::Call(Box::new(left), args), span))
}

// Returns the arguments and the span of the last token belonging to them.
fn parse_arguments(it: &mut Parser) -> Result<(Vec<WithSpan<Expr>>, Span), ()> {
    match it.peek() {
        TokenKind::String => {
            let arg = parse_primary(it)?;
            let span = arg.span;
            Ok((vec![arg], span))
        }
        TokenKind::LeftBrace => {
            let arg = parse_table(it)?;
            let span = arg.span;
            Ok((vec![arg], span))
        }
        _ => {
            let open = it.expect(TokenKind::LeftParen)?;
            let args = if it.check(TokenKind::RightParen) {
                Vec::new()
            } else {
                parse_expr_list(it)?
            };
            let close = it.expect_match(TokenKind::RightParen, TokenKind::LeftParen, open.span)?;
            Ok((args, close.span))
        }
    }
}

pub fn parse_expr_list(it: &mut Parser) -> Result<Vec<WithSpan<Expr>>, ()> {
    let mut exprs = vec![parse_expr(it, Precedence::None)?];
    while it.optionally(TokenKind::Comma) {
        exprs.push(parse_expr(it, Precedence::None)?);
    }
    Ok(exprs)
}

fn parse_grouping(it: &mut Parser) -> Result<WithSpan<Expr>, ()> {
    let left_paren = it.expect(TokenKind::LeftParen)?;
    let expr = parse_expr(it, Precedence::None)?;
    let right_paren = it.expect_match(TokenKind::RightParen, TokenKind::LeftParen, left_paren.span)?;

    let span = Span::union(left_paren, right_paren);
    Ok(WithSpan::new(Expr::Grouping(Box::new(expr)), span))
}

fn parse_function(it: &mut Parser) -> Result<WithSpan<Expr>, ()> {
    let keyword = it.expect(TokenKind::Function)?;
    let body = parse_function_body(it, keyword.span, None, false)?;
    let span = Span::union_span(keyword.span, it.previous_span());
    Ok(WithSpan::new(Expr::Function(Box::new(body)), span))
}

/// Parses `(params) block end`; `keyword` is the span of the `function`
/// keyword that opened it.
pub fn parse_function_body(it: &mut Parser, keyword: Span, name: Option<Identifier>, with_self: bool) -> Result<FunctionBody, ()> {
    let open = it.expect(TokenKind::LeftParen)?;
    let mut params = Vec::new();
    if with_self {
        params.push(WithSpan::new("self".to_string(), open.span));
    }
    if !it.check(TokenKind::RightParen) {
        params.push(expect_identifier(it)?);
        while it.optionally(TokenKind::Comma) {
            params.push(expect_identifier(it)?);
        }
    }
    it.expect_match(TokenKind::RightParen, TokenKind::LeftParen, open.span)?;

    let body = crate::stmt_parser::parse_block(it);
    it.expect_match(TokenKind::End, TokenKind::Function, keyword)?;

    Ok(FunctionBody { name, params, body })
}

fn parse_table(it: &mut Parser) -> Result<WithSpan<Expr>, ()> {
    let open = it.expect(TokenKind::LeftBrace)?;
    let mut fields = Vec::new();

    while !it.check(TokenKind::RightBrace) {
        fields.push(parse_table_field(it)?);
        if !it.optionally(TokenKind::Comma) && !it.optionally(TokenKind::Semicolon) {
            break;
        }
    }

    let close = it.expect_match(TokenKind::RightBrace, TokenKind::LeftBrace, open.span)?;
    let span = Span::union(open, close);
    Ok(WithSpan::new(Expr::Table(fields), span))
}

fn parse_table_field(it: &mut Parser) -> Result<TableField, ()> {
    match it.peek() {
        TokenKind::LeftBracket => {
            let open = it.advance();
            let key = parse_expr(it, Precedence::None)?;
            it.expect_match(TokenKind::RightBracket, TokenKind::LeftBracket, open.span)?;
            it.expect(TokenKind::Equal)?;
            let value = parse_expr(it, Precedence::None)?;
            Ok(TableField::Indexed(key, value))
        }
        TokenKind::Identifier => {
            let expr = parse_expr(it, Precedence::None)?;
            match expr.value {
                Expr::Variable(name) if it.check(TokenKind::Equal) => {
                    it.advance();
                    let value = parse_expr(it, Precedence::None)?;
                    Ok(TableField::Named(name, value))
                }
                value => Ok(TableField::Positional(WithSpan::new(value, expr.span))),
            }
        }
        _ => Ok(TableField::Positional(parse_expr(it, Precedence::None)?)),
    }
}

fn parse_logical(it: &mut Parser, left: WithSpan<Expr>) -> Result<WithSpan<Expr>, ()> {
    let precedence = Precedence::from(it.peek());
    let operator = parse_logical_op(it)?;
    let right = parse_expr(it, precedence)?;
    let span = Span::union(&left, &right);
    Ok(WithSpan::new(Expr::Logical(Box::new(left), operator, Box::new(right)), span))
}

fn parse_binary(it: &mut Parser, left: WithSpan<Expr>) -> Result<WithSpan<Expr>, ()> {
    let precedence = Precedence::from(it.peek());
    let operator = parse_binary_op(it)?;
    let right = parse_expr(it, precedence.right_operand())?;
    let span = Span::union(&left, &right);
    Ok(WithSpan::new(Expr::Binary(Box::new(left), operator, Box::new(right)), span))
}

fn parse_unary(it: &mut Parser) -> Result<WithSpan<Expr>, ()> {
    it.nested(|it| {
        let operator = parse_unary_op(it)?;
        let right = parse_expr(it, Precedence::Unary)?;
        let span = Span::union(&operator, &right);
        Ok(WithSpan::new(Expr::Unary(operator, Box::new(right)), span))
    })
}

fn parse_logical_op(it: &mut Parser) -> Result<WithSpan<LogicalOperator>, ()> {
    let tc = it.advance();
    let operator = match &tc.value {
        Token::And => LogicalOperator::And,
        Token::Or => LogicalOperator::Or,
        _ => {
            it.error(format!("Expected logical operator got {}", tc.value), tc.span);
            return Err(());
        }
    };

    Ok(WithSpan::new(operator, tc.span))
}

fn parse_unary_op(it: &mut Parser) -> Result<WithSpan<UnaryOperator>, ()> {
    let tc = it.advance();
    match &tc.value {
        Token::Not => Ok(WithSpan::new(UnaryOperator::Not, tc.span)),
        Token::Minus => Ok(WithSpan::new(UnaryOperator::Minus, tc.span)),
        Token::Hash => Ok(WithSpan::new(UnaryOperator::Length, tc.span)),
        _ => {
            it.error(format!("Expected unary operator got {}", tc.value), tc.span);
            Err(())
        }
    }
}

fn parse_binary_op(it: &mut Parser) -> Result<WithSpan<BinaryOperator>, ()> {
    let tc = it.advance();
    let operator = match &tc.value {
        Token::Plus => BinaryOperator::Plus,
        Token::Minus => BinaryOperator::Minus,
        Token::Star => BinaryOperator::Star,
        Token::Slash => BinaryOperator::Slash,
        Token::Percent => BinaryOperator::Percent,
        Token::Caret => BinaryOperator::Caret,
        Token::DotDot => BinaryOperator::DotDot,
        Token::EqualEqual => BinaryOperator::EqualEqual,
        Token::TildeEqual => BinaryOperator::TildeEqual,
        Token::Less => BinaryOperator::Less,
        Token::LessEqual => BinaryOperator::LessEqual,
        Token::Greater => BinaryOperator::Greater,
        Token::GreaterEqual => BinaryOperator::GreaterEqual,
        _ => {
            it.error(format!("Expected binary operator got {}", tc.value), tc.span);
            return Err(());
        }
    };

    Ok(WithSpan::new(operator, tc.span))
}

fn parse_primary(it: &mut Parser) -> Result<WithSpan<Expr>, ()> {
    let tc = it.advance();
    match &tc.value {
        Token::Nil => Ok(WithSpan::new(Expr::Nil, tc.span)),
        Token::Number(n) => Ok(WithSpan::new(Expr::Number(*n), tc.span)),
        Token::True => Ok(WithSpan::new(Expr::Boolean(true), tc.span)),
        Token::False => Ok(WithSpan::new(Expr::Boolean(false), tc.span)),
        Token::String(s) => Ok(WithSpan::new(Expr::String(s.clone()), tc.span)),
        _ => {
            it.error(format!("Expected expression got {}", tc.value), tc.span);
            Err(())
        }
    }
}

pub fn parse(it: &mut Parser) -> Result<WithSpan<Expr>, ()> {
    parse_expr(it, Precedence::None)
}

#[cfg(test)]
mod tests {
    use crate::position::{Diagnostic, LineOffsets};

    use super::*;
    fn parse_str(data: &str) -> Result<WithSpan<Expr>, Vec<Diagnostic>> {
        use super::super::tokenizer::*;

        let tokens = tokenize_with_context(data);
        let offsets = LineOffsets::new(data);
        let mut parser = crate::parser::Parser::new(&tokens, &offsets);
        match parse(&mut parser) {
            Ok(e) if parser.diagnostics().is_empty() => Ok(e),
            _ => Err(parser.diagnostics().to_vec()),
        }
    }

    fn assert_errs(data: &str, errs: &[&str]) {
        let x = parse_str(data);
        assert!(x.is_err());
        let diagnostics = x.unwrap_err();
        for diag in diagnostics {
            assert!(errs.contains(&diag.message.as_str()), "{}", diag.message);
        }
    }

    mod make {
        use super::*;
        use std::ops::Range;

        /// Make WithSpan
        pub fn ws<T>(value: T, range: Range<u32>) -> WithSpan<T> {
            unsafe { WithSpan::new_unchecked(value, range.start, range.end) }
        }

        /// Make Expr::Number
        pub fn n(value: f64) -> Expr {
            Expr::Number(value)
        }

        /// Make WithSpan<Expr::Number>
        pub fn wsn(value: f64, range: Range<u32>) -> WithSpan<Expr> {
            ws(n(value), range)
        }

        /// Make Expr::Variable
        pub fn v(value: &str, range: Range<u32>) -> Expr {
            Expr::Variable(ws(value.to_owned(), range))
        }

        /// Make WithSpan<Expr::Variable>
        pub fn wsv(value: &str, range: Range<u32>) -> WithSpan<Expr> {
            ws(v(value, range.clone()), range)
        }

        /// Make Expr::Unary
        pub fn uo(operator: UnaryOperator, operator_range: Range<u32>, expr: Expr, expr_range: Range<u32>) -> Expr {
            Expr::Unary(ws(operator, operator_range), Box::new(ws(expr, expr_range)))
        }

        /// Make WithSpan<Expr::Binary>
        pub fn wsbo(left: WithSpan<Expr>, op: WithSpan<BinaryOperator>, right: WithSpan<Expr>) -> WithSpan<Expr> {
            let span = Span::union(&left, &right);
            WithSpan::new(Expr::Binary(Box::new(left), op, Box::new(right)), span)
        }

        /// Make WithSpan<Expr::Logical>
        pub fn wslo(left: WithSpan<Expr>, op: WithSpan<LogicalOperator>, right: WithSpan<Expr>) -> WithSpan<Expr> {
            let span = Span::union(&left, &right);
            WithSpan::new(Expr::Logical(Box::new(left), op, Box::new(right)), span)
        }

        /// WithSpan<Identifier>
        pub fn wsi(value: &str, range: Range<u32>) -> WithSpan<Identifier> {
            ws(value.into(), range)
        }

        pub fn wscall(left: WithSpan<Expr>, args: Vec<WithSpan<Expr>>, range: Range<u32>) -> WithSpan<Expr> {
            ws(Expr::Call(Box::new(left), args), range)
        }

        pub fn wsget(left: WithSpan<Expr>, right: WithSpan<Identifier>) -> WithSpan<Expr> {
            let span = Span::union(&left, &right);
            WithSpan::new(Expr::Get(Box::new(left), right), span)
        }
    }

    mod help {
        use super::*;
        use std::ops::Range;

        pub fn assert(expr: &str, expected: WithSpan<Expr>) {
            assert_eq!(parse_str(expr), Ok(expected));
        }

        pub fn assert2(expr: &str, expected: Expr, range: Range<u32>) {
            use super::make::ws;
            assert_eq!(parse_str(expr), Ok(ws(expected, range)));
        }

        pub fn simple_binary(op: BinaryOperator, op_len: u32) -> Expr {
            use super::make::*;

            let left = ws(n(1.0), 0..1);
            let op = ws(op, 1..1 + op_len);
            let right = ws(n(2.0), 1 + op_len..2 + op_len);

            Expr::Binary(Box::new(left), op, Box::new(right))
        }
    }

    #[test]
    fn test_primary() {
        use help::assert;
        use make::*;
        assert("nil", ws(Expr::Nil, 0..3));
        assert("1.0", ws(n(1.0), 0..3));
        assert("1", ws(n(1.0), 0..1));
        assert("true", ws(Expr::Boolean(true), 0..4));
        assert("false", ws(Expr::Boolean(false), 0..5));
        assert("\"iets\"", ws(Expr::String("iets".into()), 0..6));
        assert("iets", wsv("iets", 0..4));
    }

    #[test]
    fn test_unary() {
        use help::assert2;
        use make::*;
        assert2("-nil", uo(UnaryOperator::Minus, 0..1, Expr::Nil, 1..4), 0..4);
        assert2("#nil", uo(UnaryOperator::Length, 0..1, Expr::Nil, 1..4), 0..4);
        assert2("not nil", uo(UnaryOperator::Not, 0..3, Expr::Nil, 4..7), 0..7);
    }

    #[test]
    fn test_binary() {
        use help::{assert2, simple_binary};
        assert2("1+2", simple_binary(BinaryOperator::Plus, 1), 0..3);
        assert2("1-2", simple_binary(BinaryOperator::Minus, 1), 0..3);
        assert2("1>2", simple_binary(BinaryOperator::Greater, 1), 0..3);
        assert2("1<2", simple_binary(BinaryOperator::Less, 1), 0..3);
        assert2("1*2", simple_binary(BinaryOperator::Star, 1), 0..3);
        assert2("1/2", simple_binary(BinaryOperator::Slash, 1), 0..3);
        assert2("1%2", simple_binary(BinaryOperator::Percent, 1), 0..3);
        assert2("1^2", simple_binary(BinaryOperator::Caret, 1), 0..3);

        assert2("1~=2", simple_binary(BinaryOperator::TildeEqual, 2), 0..4);
        assert2("1==2", simple_binary(BinaryOperator::EqualEqual, 2), 0..4);
        assert2("1>=2", simple_binary(BinaryOperator::GreaterEqual, 2), 0..4);
        assert2("1<=2", simple_binary(BinaryOperator::LessEqual, 2), 0..4);
        assert2("1..2", simple_binary(BinaryOperator::DotDot, 2), 0..4);
    }

    #[test]
    fn test_binary_precedence() {
        use help::assert;
        use make::*;

        let expr = wsbo(
            wsbo(wsn(1., 0..1), ws(BinaryOperator::Star, 1..2), wsn(2., 2..3)),
            ws(BinaryOperator::Plus, 3..4),
            wsbo(wsn(3., 4..5), ws(BinaryOperator::Star, 5..6), wsn(4., 6..7)),
        );
        assert("1*2+3*4", expr);

        // Unary minus binds looser than power
        let expr = ws(
            uo(UnaryOperator::Minus, 0..1, Expr::Binary(
                Box::new(wsn(2., 1..2)),
                ws(BinaryOperator::Caret, 2..3),
                Box::new(wsn(3., 3..4)),
            ), 1..4),
            0..4,
        );
        assert("-2^3", expr);
    }

    #[test]
    fn test_right_associative() {
        use help::assert;
        use make::*;

        let expr = wsbo(
            wsv("a", 0..1),
            ws(BinaryOperator::DotDot, 1..3),
            wsbo(wsv("b", 3..4), ws(BinaryOperator::DotDot, 4..6), wsv("c", 6..7)),
        );
        assert("a..b..c", expr);

        let expr = wsbo(
            wsn(2., 0..1),
            ws(BinaryOperator::Caret, 1..2),
            wsbo(wsn(3., 2..3), ws(BinaryOperator::Caret, 3..4), wsn(2., 4..5)),
        );
        assert("2^3^2", expr);

        // Left associative for the rest
        let expr = wsbo(
            wsbo(wsn(1., 0..1), ws(BinaryOperator::Minus, 1..2), wsn(2., 2..3)),
            ws(BinaryOperator::Minus, 3..4),
            wsn(3., 4..5),
        );
        assert("1-2-3", expr);
    }

    #[test]
    fn test_errors() {
        use help::{assert2, simple_binary};

        // Trailing tokens are left for the statement parser
        assert2("1+2 3", simple_binary(BinaryOperator::Plus, 1), 0..3);

        assert_errs("1+", &["Expected expression got <eof>"]);
        assert_errs("(1", &["Expected ')' (to close '(' at line 1) got <eof>"]);
        assert_errs("(1}", &["Expected ')' (to close '(' at line 1) got '}'"]);
        assert_errs("a(3,)", &["Expected expression got ')'"]);
        assert_errs("a.+", &["Expected identifier got '+'"]);
        assert_errs("1 + $", &["Unexpected character '$'", "Expected expression got <eof>"]);
    }

    #[test]
    fn test_recursion_depth() {
        let limit = &["Exceeded allowed recursion depth; simplify your expression to make the code compile"];

        let nested = format!("{}1{}", "(".repeat(100), ")".repeat(100));
        assert!(parse_str(&nested).is_ok());
        let chained = format!("a{}", " + a".repeat(5000));
        assert!(parse_str(&chained).is_err());

        assert_errs(&format!("{}1{}", "(".repeat(5000), ")".repeat(5000)), limit);
        assert_errs(&chained, limit);
        assert_errs(&format!("a{}", ".b".repeat(5000)), limit);
        assert_errs(&format!("a{}", "()".repeat(5000)), limit);
        assert_errs(&format!("{}a", "not ".repeat(5000)), limit);
        assert_errs(&format!("{}1{}", "{".repeat(5000), "}".repeat(5000)), limit);

        let errors = parse_str(&chained).unwrap_err();
        assert_eq!(errors.len(), 1);
    }

    #[test]
    fn test_logical() {
        use help::assert;
        use make::*;

        let expr = wslo(
            ws(Expr::Boolean(true), 0..4),
            ws(LogicalOperator::Or, 5..7),
            ws(Expr::Boolean(false), 8..13),
        );
        assert("true or false", expr);

        let left = wslo(wsn(1., 0..1), ws(LogicalOperator::And, 2..5), wsn(2., 6..7));
        let right = wslo(wsn(3., 11..12), ws(LogicalOperator::And, 13..16), wsn(4., 17..18));
        let expr = wslo(left, ws(LogicalOperator::Or, 8..10), right);
        assert("1 and 2 or 3 and 4", expr);
    }

    #[test]
    fn test_call() {
        use help::assert;
        use make::*;

        assert("a()", wscall(wsv("a", 0..1), vec![], 0..3));
        assert("a(3)", wscall(wsv("a", 0..1), vec![wsn(3., 2..3)], 0..4));
        assert("a(3,4)", wscall(wsv("a", 0..1), vec![wsn(3., 2..3), wsn(4., 4..5)], 0..6));
        assert("a\"s\"", wscall(wsv("a", 0..1), vec![ws(Expr::String("s".into()), 1..4)], 0..4));
        assert("a{}", wscall(wsv("a", 0..1), vec![ws(Expr::Table(vec![]), 1..3)], 0..3));

        let expr = ws(Expr::Unary(ws(UnaryOperator::Minus, 0..1), Box::new(wscall(wsv("a", 1..2), vec![], 1..4))), 0..4);
        assert("-a()", expr);

        let expr = wsbo(
            wscall(wsv("a", 0..1), vec![], 0..3),
            ws(BinaryOperator::Plus, 3..4),
            wscall(wsv("b", 4..5), vec![], 4..7),
        );
        assert("a()+b()", expr);
    }

    #[test]
    fn test_get_index_invoke() {
        use help::assert;
        use make::*;

        let expr = wsget(wsget(wsv("a", 0..1), wsi("b", 2..3)), wsi("c", 4..5));
        assert("a.b.c", expr);

        let expr = ws(Expr::Index(Box::new(wsv("t", 0..1)), Box::new(wsn(1., 2..3))), 0..4);
        assert("t[1]", expr);

        let expr = ws(Expr::Invoke(Box::new(wsv("o", 0..1)), wsi("m", 2..3), vec![wsn(1., 4..5)]), 0..6);
        assert("o:m(1)", expr);
    }

    #[test]
    fn test_table() {
        use help::assert;
        use make::*;

        let expr = ws(
            Expr::Table(vec![
                TableField::Positional(wsn(1., 1..2)),
                TableField::Named(wsi("x", 4..5), wsn(2., 6..7)),
                TableField::Indexed(ws(Expr::String("k".into()), 10..13), wsn(3., 15..16)),
                TableField::Positional(wsv("y", 18..19)),
            ]),
            0..21,
        );
        assert("{1, x=2, [\"k\"]=3; y,}", expr);
    }

    #[test]
    fn test_function_literal() {
        use help::assert;
        use make::*;

        let expr = ws(
            Expr::Function(Box::new(FunctionBody {
                name: None,
                params: vec![wsi("a", 9..10), wsi("b", 12..13)],
                body: vec![],
            })),
            0..18,
        );
        assert("function(a, b) end", expr);
    }
}
