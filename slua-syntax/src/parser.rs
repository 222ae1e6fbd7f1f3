use crate::position::{Diagnostic, LineOffsets, Span, WithSpan};
use crate::token::{Token, TokenKind};

/// Deepest nesting of expressions, suffixes and blocks the parser accepts.
pub const MAX_RECURSION_DEPTH: usize = 500;

const RECURSION_DEPTH_EXCEEDED: &str =
    "Exceeded allowed recursion depth; simplify your expression to make the code compile";

/// Cursor over the token stream that collects diagnostics instead of
/// bailing out on the first one.
pub struct Parser<'a> {
    tokens: &'a [WithSpan<Token>],
    cursor: usize,
    previous: Span,
    offsets: &'a LineOffsets,
    diagnostics: Vec<Diagnostic>,
    depth: usize,
    // Set once the depth limit is hit; everything after it is skipped.
    exhausted: bool,
}

impl<'a> Parser<'a> {
    /// `tokens` must end with `Token::Eof`.
    pub fn new(tokens: &'a [WithSpan<Token>], offsets: &'a LineOffsets) -> Self {
        Parser {
            tokens,
            cursor: 0,
            previous: Span::empty(),
            offsets,
            diagnostics: Vec::new(),
            depth: 0,
            exhausted: false,
        }
    }

    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn previous_span(&self) -> Span {
        self.previous
    }

    pub fn line(&self, span: Span) -> u32 {
        self.offsets.line(span.start)
    }

    // Lexical errors are reported the moment the parser reaches them.
    fn skip_errors(&mut self) {
        while let Some(token) = self.tokens.get(self.cursor) {
            match &token.value {
                Token::Error(error) => {
                    self.error(error.to_string(), token.span);
                    self.cursor += 1;
                }
                _ => break,
            }
        }
    }

    pub fn is_eof(&mut self) -> bool {
        self.check(TokenKind::Eof)
    }

    pub fn peek_token(&mut self) -> &'a WithSpan<Token> {
        self.skip_errors();
        let tokens = self.tokens;
        match tokens.get(self.cursor) {
            Some(token) => token,
            None => &tokens[tokens.len() - 1],
        }
    }

    pub fn peek(&mut self) -> TokenKind {
        self.peek_token().into()
    }

    pub fn check(&mut self, match_token: TokenKind) -> bool {
        self.peek() == match_token
    }

    pub fn advance(&mut self) -> &'a WithSpan<Token> {
        let token = self.peek_token();
        if token.value != Token::Eof {
            self.cursor += 1;
        }
        self.previous = token.span;
        token
    }

    pub fn error<S: Into<String>>(&mut self, message: S, span: Span) {
        if self.exhausted {
            return;
        }
        self.diagnostics.push(Diagnostic {
            span,
            message: message.into(),
        });
    }

    pub fn expect(&mut self, expected: TokenKind) -> Result<&'a WithSpan<Token>, ()> {
        let token = self.peek_token();
        if TokenKind::from(token) == expected {
            Ok(self.advance())
        } else {
            self.error(format!("Expected {} got {}", expected, token.value), token.span);
            Err(())
        }
    }

    /// Like `expect`, but names the construct being closed.
    pub fn expect_match(&mut self, expected: TokenKind, opener: TokenKind, opener_span: Span) -> Result<&'a WithSpan<Token>, ()> {
        let token = self.peek_token();
        if TokenKind::from(token) == expected {
            Ok(self.advance())
        } else {
            let line = self.line(opener_span);
            self.error(
                format!("Expected {} (to close {} at line {}) got {}", expected, opener, line, token.value),
                token.span,
            );
            Err(())
        }
    }

    /// Enters one more level of nesting. Past `MAX_RECURSION_DEPTH` this
    /// reports a single diagnostic, skips to the end of input and fails.
    pub fn descend(&mut self) -> Result<(), ()> {
        if self.depth >= MAX_RECURSION_DEPTH {
            let span = self.peek_token().span;
            self.error(RECURSION_DEPTH_EXCEEDED, span);
            self.exhausted = true;
            self.cursor = self.tokens.len().saturating_sub(1);
            return Err(());
        }
        self.depth += 1;
        Ok(())
    }

    pub fn ascend(&mut self, levels: usize) {
        self.depth -= levels;
    }

    /// Runs `f` one level deeper.
    pub fn nested<T, F>(&mut self, f: F) -> Result<T, ()>
    where
        F: FnOnce(&mut Self) -> Result<T, ()>,
    {
        self.descend()?;
        let result = f(self);
        self.ascend(1);
        result
    }

    pub fn optionally(&mut self, expected: TokenKind) -> bool {
        if self.check(expected) {
            self.advance();
            true
        } else {
            false
        }
    }
}

pub fn expect_identifier(it: &mut Parser) -> Result<WithSpan<String>, ()> {
    let token = it.peek_token();
    match &token.value {
        Token::Identifier(name) => {
            it.advance();
            Ok(WithSpan::new(name.clone(), token.span))
        }
        other => {
            it.error(format!("Expected identifier got {}", other), token.span);
            Err(())
        }
    }
}
