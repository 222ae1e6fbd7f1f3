use super::token::{LexError, Token};
use crate::position::*;
use std::iter::Peekable;
use std::str::Chars;

struct Scanner<'a> {
    current_position: BytePos,
    it: Peekable<Chars<'a>>,
}

impl<'a> Scanner<'a> {
    fn new(buf: &str) -> Scanner {
        Scanner {
            current_position: BytePos::default(),
            it: buf.chars().peekable(),
        }
    }

    fn next(&mut self) -> Option<char> {
        let next = self.it.next();
        if let Some(c) = next {
            self.current_position = self.current_position.shift(c);
        }
        next
    }

    fn peek(&mut self) -> Option<&char> {
        self.it.peek()
    }

    // The character after the peeked one
    fn peek_next(&self) -> Option<char> {
        let mut it = self.it.clone();
        it.next();
        it.next()
    }

    // Consume next char if it matches
    fn consume_if<F>(&mut self, x: F) -> bool
    where
        F: Fn(char) -> bool,
    {
        match self.peek() {
            Some(&ch) if x(ch) => {
                self.next();
                true
            }
            _ => false,
        }
    }

    // Consume next char if the next one after matches (so .3 eats . if 3 is numeric, for example)
    fn consume_if_next<F>(&mut self, x: F) -> bool
    where
        F: Fn(char) -> bool,
    {
        match self.peek_next() {
            Some(ch) if x(ch) => {
                self.next();
                true
            }
            _ => false,
        }
    }

    fn consume_while<F>(&mut self, x: F) -> Vec<char>
    where
        F: Fn(char) -> bool,
    {
        let mut chars: Vec<char> = Vec::new();
        while let Some(&ch) = self.peek() {
            if x(ch) {
                self.next();
                chars.push(ch);
            } else {
                break;
            }
        }
        chars
    }
}

fn is_identifier_char(ch: char) -> bool {
    ch.is_ascii_alphanumeric() || ch == '_'
}

struct Lexer<'a> {
    it: Scanner<'a>,
}

impl<'a> Lexer<'a> {
    fn new(buf: &str) -> Lexer {
        Lexer {
            it: Scanner::new(buf),
        }
    }

    fn match_token(&mut self, ch: char) -> Option<Token> {
        match ch {
            '=' => Some(self.either('=', Token::EqualEqual, Token::Equal)),
            '<' => Some(self.either('=', Token::LessEqual, Token::Less)),
            '>' => Some(self.either('=', Token::GreaterEqual, Token::Greater)),
            '~' => {
                if self.it.consume_if(|ch| ch == '=') {
                    Some(Token::TildeEqual)
                } else {
                    Some(Token::Error(LexError::InvalidCharacter('~')))
                }
            }
            ' ' | '\n' | '\t' | '\r' => None,
            '-' => {
                if self.it.consume_if(|ch| ch == '-') {
                    self.comment()
                } else {
                    Some(Token::Minus)
                }
            }
            '"' | '\'' => Some(self.string(ch)),
            '.' => {
                if self.it.consume_if(|ch| ch == '.') {
                    Some(Token::DotDot)
                } else if matches!(self.it.peek(), Some(c) if c.is_ascii_digit()) {
                    Some(self.number(ch))
                } else {
                    Some(Token::Dot)
                }
            }
            x if x.is_ascii_digit() => Some(self.number(x)),
            x if x.is_ascii_alphabetic() || x == '_' => Some(self.identifier(x)),
            '(' => Some(Token::LeftParen),
            ')' => Some(Token::RightParen),
            '{' => Some(Token::LeftBrace),
            '}' => Some(Token::RightBrace),
            '[' => Some(Token::LeftBracket),
            ']' => Some(Token::RightBracket),
            ',' => Some(Token::Comma),
            ':' => Some(Token::Colon),
            ';' => Some(Token::Semicolon),
            '+' => Some(Token::Plus),
            '*' => Some(Token::Star),
            '/' => Some(Token::Slash),
            '%' => Some(Token::Percent),
            '^' => Some(Token::Caret),
            '#' => Some(Token::Hash),
            c => Some(Token::Error(LexError::InvalidCharacter(c))),
        }
    }

    fn either(&mut self, to_match: char, matched: Token, unmatched: Token) -> Token {
        if self.it.consume_if(|ch| ch == to_match) {
            matched
        } else {
            unmatched
        }
    }

    // Called after `--`
    fn comment(&mut self) -> Option<Token> {
        if self.it.peek() == Some(&'[') && self.it.peek_next() == Some('[') {
            self.it.next();
            self.it.next();
            loop {
                match self.it.next() {
                    None => return Some(Token::Error(LexError::UnterminatedComment)),
                    Some(']') if self.it.consume_if(|ch| ch == ']') => return None,
                    Some(_) => (),
                }
            }
        }

        self.it.consume_while(|ch| ch != '\n');
        None
    }

    fn string(&mut self, quote: char) -> Token {
        let mut string = String::new();
        let mut error = None;
        loop {
            let ch = match self.it.peek() {
                None | Some('\n') => return Token::Error(LexError::UnterminatedString),
                Some(&ch) => ch,
            };
            self.it.next();

            if ch == quote {
                break;
            }

            if ch != '\\' {
                string.push(ch);
                continue;
            }

            match self.it.next() {
                None => return Token::Error(LexError::UnterminatedString),
                Some('n') => string.push('\n'),
                Some('t') => string.push('\t'),
                Some('r') => string.push('\r'),
                Some('a') => string.push('\u{07}'),
                Some('b') => string.push('\u{08}'),
                Some('f') => string.push('\u{0C}'),
                Some('v') => string.push('\u{0B}'),
                Some('0') => string.push('\0'),
                Some('\n') => string.push('\n'),
                Some(c @ ('\\' | '"' | '\'')) => string.push(c),
                Some(c) => {
                    // Keep scanning so the rest of the string doesn't turn into tokens
                    if error.is_none() {
                        error = Some(LexError::InvalidEscape(c));
                    }
                }
            }
        }

        match error {
            Some(error) => Token::Error(error),
            None => Token::String(string),
        }
    }

    fn keyword(identifier: &str) -> Option<Token> {
        let token = match identifier {
            "and" => Token::And,
            "break" => Token::Break,
            "do" => Token::Do,
            "else" => Token::Else,
            "elseif" => Token::ElseIf,
            "end" => Token::End,
            "false" => Token::False,
            "for" => Token::For,
            "function" => Token::Function,
            "if" => Token::If,
            "local" => Token::Local,
            "nil" => Token::Nil,
            "not" => Token::Not,
            "or" => Token::Or,
            "repeat" => Token::Repeat,
            "return" => Token::Return,
            "then" => Token::Then,
            "true" => Token::True,
            "until" => Token::Until,
            "while" => Token::While,
            _ => return None,
        };
        Some(token)
    }

    fn identifier(&mut self, x: char) -> Token {
        let mut identifier = String::new();
        identifier.push(x);
        identifier.extend(self.it.consume_while(is_identifier_char));
        match Self::keyword(&identifier) {
            None => Token::Identifier(identifier),
            Some(token) => token,
        }
    }

    fn number(&mut self, x: char) -> Token {
        let mut number = String::new();
        number.push(x);

        if x == '0' && self.it.consume_if(|ch| ch == 'x' || ch == 'X') {
            let digits: String = self.it.consume_while(|ch| ch.is_ascii_hexdigit()).into_iter().collect();
            let trailing: String = self.it.consume_while(is_identifier_char).into_iter().collect();
            return match u64::from_str_radix(&digits, 16) {
                Ok(value) if trailing.is_empty() => Token::Number(value as f64),
                _ => Token::Error(LexError::MalformedNumber(format!("0x{}{}", digits, trailing))),
            };
        }

        number.extend(self.it.consume_while(|ch| ch.is_ascii_digit()));
        if x != '.' && self.it.peek() == Some(&'.') && self.it.consume_if_next(|ch| ch.is_ascii_digit()) {
            number.push('.');
        }
        number.extend(self.it.consume_while(|ch| ch.is_ascii_digit()));

        if matches!(self.it.peek(), Some('e' | 'E')) {
            let signed = matches!(self.it.peek_next(), Some('+' | '-'));
            let mut lookahead = self.it.it.clone();
            lookahead.next();
            if signed {
                lookahead.next();
            }
            if matches!(lookahead.next(), Some(c) if c.is_ascii_digit()) {
                number.extend(self.it.next());
                if signed {
                    number.extend(self.it.next());
                }
                number.extend(self.it.consume_while(|ch| ch.is_ascii_digit()));
            }
        }

        let malformed = match self.it.peek() {
            Some(&ch) if is_identifier_char(ch) => true,
            Some('.') => matches!(self.it.peek_next(), Some(c) if c.is_ascii_digit()),
            _ => false,
        };
        if malformed {
            number.extend(self.it.consume_while(|ch| is_identifier_char(ch) || ch == '.'));
            return Token::Error(LexError::MalformedNumber(number));
        }

        match number.parse::<f64>() {
            Ok(value) => Token::Number(value),
            Err(_) => Token::Error(LexError::MalformedNumber(number)),
        }
    }

    fn tokenize_with_context(&mut self) -> Vec<WithSpan<Token>> {
        let mut tokens: Vec<WithSpan<Token>> = Vec::new();
        loop {
            let initial_position = self.it.current_position;
            let ch = match self.it.next() {
                None => break,
                Some(c) => c,
            };
            if let Some(token) = self.match_token(ch) {
                tokens.push(WithSpan::new(token, Span { start: initial_position, end: self.it.current_position }));
            }
        }
        let end = self.it.current_position;
        tokens.push(WithSpan::new(Token::Eof, Span { start: end, end }));
        tokens
    }
}

pub fn tokenize_with_context(buf: &str) -> Vec<WithSpan<Token>> {
    let mut t = Lexer::new(buf);
    t.tokenize_with_context()
}
