use crate::position::WithSpan;

pub type Identifier = String;

#[derive(Debug, PartialEq, Copy, Clone)]
pub enum UnaryOperator {
    Minus,
    Not,
    Length,
}

#[derive(Debug, PartialEq, Copy, Clone)]
pub enum BinaryOperator {
    Plus,
    Minus,
    Star,
    Slash,
    Percent,
    Caret,
    DotDot,
    EqualEqual,
    TildeEqual,
    Less,
    LessEqual,
    Greater,
    GreaterEqual,
}

#[derive(Debug, PartialEq, Copy, Clone)]
pub enum LogicalOperator {
    And,
    Or,
}

#[derive(Debug, PartialEq, Clone)]
pub struct FunctionBody {
    pub name: Option<Identifier>,
    pub params: Vec<WithSpan<Identifier>>,
    pub body: Block,
}

#[derive(Debug, PartialEq, Clone)]
pub enum TableField {
    Positional(WithSpan<Expr>),
    Named(WithSpan<Identifier>, WithSpan<Expr>),
    Indexed(WithSpan<Expr>, WithSpan<Expr>),
}

#[derive(Debug, PartialEq, Clone)]
pub enum Expr {
    Nil,
    Boolean(bool),
    Number(f64),
    String(String),
    Variable(WithSpan<Identifier>),
    Function(Box<FunctionBody>),
    Table(Vec<TableField>),
    Grouping(Box<WithSpan<Expr>>),
    Unary(WithSpan<UnaryOperator>, Box<WithSpan<Expr>>),
    Binary(Box<WithSpan<Expr>>, WithSpan<BinaryOperator>, Box<WithSpan<Expr>>),
    Logical(Box<WithSpan<Expr>>, WithSpan<LogicalOperator>, Box<WithSpan<Expr>>),
    Get(Box<WithSpan<Expr>>, WithSpan<Identifier>),
    Index(Box<WithSpan<Expr>>, Box<WithSpan<Expr>>),
    Call(Box<WithSpan<Expr>>, Vec<WithSpan<Expr>>),
    Invoke(Box<WithSpan<Expr>>, WithSpan<Identifier>, Vec<WithSpan<Expr>>),
}

impl Expr {
    pub fn is_call(&self) -> bool {
        matches!(self, Expr::Call(..) | Expr::Invoke(..))
    }

    pub fn is_assignable(&self) -> bool {
        matches!(self, Expr::Variable(_) | Expr::Get(..) | Expr::Index(..))
    }
}

#[derive(Debug, PartialEq, Clone)]
pub enum Stmt {
    Expression(Box<WithSpan<Expr>>),
    Local(Vec<WithSpan<Identifier>>, Vec<WithSpan<Expr>>),
    LocalFunction(WithSpan<Identifier>, Box<FunctionBody>),
    Assign(Vec<WithSpan<Expr>>, Vec<WithSpan<Expr>>),
    If(Vec<(WithSpan<Expr>, Block)>, Option<Block>),
    While(Box<WithSpan<Expr>>, Block),
    Repeat(Block, Box<WithSpan<Expr>>),
    Do(Block),
    Break,
    Return(Vec<WithSpan<Expr>>),
}

pub type Block = Vec<WithSpan<Stmt>>;

pub type Ast = Block;
