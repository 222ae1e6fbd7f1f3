pub mod ast;
pub mod position;

mod expr_parser;
mod parser;
mod stmt_parser;
mod token;
mod tokenizer;

use ast::Ast;
use position::{Diagnostic, LineOffsets};

pub use parser::MAX_RECURSION_DEPTH;
pub use stmt_parser::{FOR_INDEX, FOR_LIMIT, FOR_STEP};

/// Parses a whole chunk. Diagnostics are returned in source order.
pub fn parse(code: &str) -> Result<Ast, Vec<Diagnostic>> {
    use stmt_parser::parse;
    use tokenizer::tokenize_with_context;
    let tokens = tokenize_with_context(code);
    let offsets = LineOffsets::new(code);
    let mut parser = crate::parser::Parser::new(&tokens, &offsets);
    let ast = parse(&mut parser);
    if parser.diagnostics().is_empty() {
        Ok(ast)
    } else {
        Err(parser.diagnostics().to_vec())
    }
}
