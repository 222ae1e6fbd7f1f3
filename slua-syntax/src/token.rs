use std::fmt::Display;

#[derive(PartialEq, Debug, Clone)]
pub enum LexError {
    UnterminatedString,
    UnterminatedComment,
    InvalidEscape(char),
    MalformedNumber(String),
    InvalidCharacter(char),
}

impl Display for LexError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LexError::UnterminatedString => write!(f, "Unterminated string"),
            LexError::UnterminatedComment => write!(f, "Unterminated comment"),
            LexError::InvalidEscape(c) => write!(f, "Invalid escape sequence '\\{}'", c),
            LexError::MalformedNumber(text) => write!(f, "Malformed number '{}'", text),
            LexError::InvalidCharacter(c) => write!(f, "Unexpected character '{}'", c),
        }
    }
}

#[derive(PartialEq, Debug, Clone)]
pub enum Token {
    // Single-character tokens.
    LeftParen,
    RightParen,
    LeftBrace,
    RightBrace,
    LeftBracket,
    RightBracket,
    Comma,
    Dot,
    Colon,
    Semicolon,
    Minus,
    Plus,
    Slash,
    Star,
    Percent,
    Caret,
    Hash,

    // One or two character tokens.
    DotDot,
    Equal,
    EqualEqual,
    TildeEqual,
    Greater,
    GreaterEqual,
    Less,
    LessEqual,

    // Literals.
    Identifier(String),
    String(String),
    Number(f64),

    // Keywords.
    And,
    Break,
    Do,
    Else,
    ElseIf,
    End,
    False,
    For,
    Function,
    If,
    Local,
    Nil,
    Not,
    Or,
    Repeat,
    Return,
    Then,
    True,
    Until,
    While,

    // Other.
    Eof,
    Error(LexError),
}

#[derive(Copy, Clone, Debug, PartialEq)]
pub enum TokenKind {
    // Single-character tokens.
    LeftParen,
    RightParen,
    LeftBrace,
    RightBrace,
    LeftBracket,
    RightBracket,
    Comma,
    Dot,
    Colon,
    Semicolon,
    Minus,
    Plus,
    Slash,
    Star,
    Percent,
    Caret,
    Hash,

    // One or two character tokens.
    DotDot,
    Equal,
    EqualEqual,
    TildeEqual,
    Greater,
    GreaterEqual,
    Less,
    LessEqual,

    // Literals.
    Identifier,
    String,
    Number,

    // Keywords.
    And,
    Break,
    Do,
    Else,
    ElseIf,
    End,
    False,
    For,
    Function,
    If,
    Local,
    Nil,
    Not,
    Or,
    Repeat,
    Return,
    Then,
    True,
    Until,
    While,

    // Other.
    Eof,
    Error,
}

impl Display for Token {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Token::Identifier(name) => write!(f, "'{}'", name),
            token => write!(f, "{}", TokenKind::from(token)),
        }
    }
}

impl From<&crate::position::WithSpan<Token>> for TokenKind {
    fn from(token_with_span: &crate::position::WithSpan<Token>) -> Self {
        TokenKind::from(&token_with_span.value)
    }
}

impl From<&Token> for TokenKind {
    fn from(token: &Token) -> Self {
        match token {
            Token::LeftParen => TokenKind::LeftParen,
            Token::RightParen => TokenKind::RightParen,
            Token::LeftBrace => TokenKind::LeftBrace,
            Token::RightBrace => TokenKind::RightBrace,
            Token::LeftBracket => TokenKind::LeftBracket,
            Token::RightBracket => TokenKind::RightBracket,
            Token::Comma => TokenKind::Comma,
            Token::Dot => TokenKind::Dot,
            Token::Colon => TokenKind::Colon,
            Token::Semicolon => TokenKind::Semicolon,
            Token::Minus => TokenKind::Minus,
            Token::Plus => TokenKind::Plus,
            Token::Slash => TokenKind::Slash,
            Token::Star => TokenKind::Star,
            Token::Percent => TokenKind::Percent,
            Token::Caret => TokenKind::Caret,
            Token::Hash => TokenKind::Hash,
            Token::DotDot => TokenKind::DotDot,
            Token::Equal => TokenKind::Equal,
            Token::EqualEqual => TokenKind::EqualEqual,
            Token::TildeEqual => TokenKind::TildeEqual,
            Token::Greater => TokenKind::Greater,
            Token::GreaterEqual => TokenKind::GreaterEqual,
            Token::Less => TokenKind::Less,
            Token::LessEqual => TokenKind::LessEqual,
            Token::Identifier(_) => TokenKind::Identifier,
            Token::String(_) => TokenKind::String,
            Token::Number(_) => TokenKind::Number,
            Token::And => TokenKind::And,
            Token::Break => TokenKind::Break,
            Token::Do => TokenKind::Do,
            Token::Else => TokenKind::Else,
            Token::ElseIf => TokenKind::ElseIf,
            Token::End => TokenKind::End,
            Token::False => TokenKind::False,
            Token::For => TokenKind::For,
            Token::Function => TokenKind::Function,
            Token::If => TokenKind::If,
            Token::Local => TokenKind::Local,
            Token::Nil => TokenKind::Nil,
            Token::Not => TokenKind::Not,
            Token::Or => TokenKind::Or,
            Token::Repeat => TokenKind::Repeat,
            Token::Return => TokenKind::Return,
            Token::Then => TokenKind::Then,
            Token::True => TokenKind::True,
            Token::Until => TokenKind::Until,
            Token::While => TokenKind::While,
            Token::Eof => TokenKind::Eof,
            Token::Error(_) => TokenKind::Error,
        }
    }
}

impl Display for TokenKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", match self {
            TokenKind::LeftParen => "'('",
            TokenKind::RightParen => "')'",
            TokenKind::LeftBrace => "'{'",
            TokenKind::RightBrace => "'}'",
            TokenKind::LeftBracket => "'['",
            TokenKind::RightBracket => "']'",
            TokenKind::Comma => "','",
            TokenKind::Dot => "'.'",
            TokenKind::Colon => "':'",
            TokenKind::Semicolon => "';'",
            TokenKind::Minus => "'-'",
            TokenKind::Plus => "'+'",
            TokenKind::Slash => "'/'",
            TokenKind::Star => "'*'",
            TokenKind::Percent => "'%'",
            TokenKind::Caret => "'^'",
            TokenKind::Hash => "'#'",
            TokenKind::DotDot => "'..'",
            TokenKind::Equal => "'='",
            TokenKind::EqualEqual => "'=='",
            TokenKind::TildeEqual => "'~='",
            TokenKind::Greater => "'>'",
            TokenKind::GreaterEqual => "'>='",
            TokenKind::Less => "'<'",
            TokenKind::LessEqual => "'<='",
            TokenKind::Identifier => "identifier",
            TokenKind::String => "string",
            TokenKind::Number => "number",
            TokenKind::And => "'and'",
            TokenKind::Break => "'break'",
            TokenKind::Do => "'do'",
            TokenKind::Else => "'else'",
            TokenKind::ElseIf => "'elseif'",
            TokenKind::End => "'end'",
            TokenKind::False => "'false'",
            TokenKind::For => "'for'",
            TokenKind::Function => "'function'",
            TokenKind::If => "'if'",
            TokenKind::Local => "'local'",
            TokenKind::Nil => "'nil'",
            TokenKind::Not => "'not'",
            TokenKind::Or => "'or'",
            TokenKind::Repeat => "'repeat'",
            TokenKind::Return => "'return'",
            TokenKind::Then => "'then'",
            TokenKind::True => "'true'",
            TokenKind::Until => "'until'",
            TokenKind::While => "'while'",
            TokenKind::Eof => "<eof>",
            TokenKind::Error => "<error>",
        })
    }
}
