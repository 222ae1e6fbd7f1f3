use thiserror::Error;

/// A diagnostic pinned to a 1-based line and column.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{line}:{column}: {message}")]
pub struct LocatedError {
    pub line: u32,
    pub column: u32,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    #[error("{} parse error(s)", .0.len())]
    Parse(Vec<LocatedError>),
    #[error("{0}")]
    Compile(LocatedError),
    #[error("internal compiler error: {0}")]
    Internal(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SemanticError {
    #[error("'break' outside of a loop")]
    BreakOutsideLoop,
    #[error("Out of local registers: exceeded limit {0}")]
    TooManyLocals(usize),
    #[error("Out of upvalue registers: exceeded limit {0}")]
    TooManyUpvalues(usize),
    #[error("Function call has too many arguments: exceeded limit {0}")]
    TooManyArguments(usize),
    #[error("Return statement has too many values: exceeded limit {0}")]
    TooManyReturnValues(usize),
    #[error("Function has too many parameters: exceeded limit {0}")]
    TooManyParameters(usize),
    #[error("Control flow too complex")]
    ControlFlowTooComplex,
}
