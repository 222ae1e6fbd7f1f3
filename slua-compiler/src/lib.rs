mod compiler;
mod error;
mod options;

use log::trace;
use slua_bytecode::Module;
use slua_syntax::position::{BytePos, LineOffsets};

pub use error::{Error, LocatedError};
pub use options::CompileOptions;

use compiler::CompilerError;

fn locate(offsets: &LineOffsets, pos: BytePos, message: String) -> LocatedError {
    let (line, column) = offsets.location(pos);
    LocatedError { line, column, message }
}

/// Runs the whole pipeline on `code`.
pub fn compile(code: &str, options: &CompileOptions) -> Result<Module, Error> {
    let options = options.clamped();
    let offsets = LineOffsets::new(code);

    trace!("parsing {} bytes", code.len());
    let ast = slua_syntax::parse(code).map_err(|diagnostics| {
        Error::Parse(
            diagnostics
                .into_iter()
                .map(|d| locate(&offsets, d.span.start, d.message))
                .collect(),
        )
    })?;

    trace!("compiling {} top-level statements", ast.len());
    let module = compiler::compile(&ast, &offsets, options).map_err(|e| match e {
        CompilerError::Semantic(error) => Error::Compile(locate(&offsets, error.span.start, error.value.to_string())),
        CompilerError::Internal(message) => Error::Internal(message.to_string()),
    })?;

    trace!("emitted {} chunks", module.chunks().len());
    Ok(module)
}

/// Like `compile`, for source that has not been checked to be UTF-8.
pub fn compile_bytes(source: &[u8], options: &CompileOptions) -> Result<Module, Error> {
    match std::str::from_utf8(source) {
        Ok(code) => compile(code, options),
        Err(e) => {
            let valid = &source[..e.valid_up_to()];
            let line = valid.iter().filter(|&&b| b == b'\n').count() as u32 + 1;
            let line_start = valid.iter().rposition(|&b| b == b'\n').map_or(0, |i| i + 1);
            let column = (valid.len() - line_start) as u32 + 1;
            Err(Error::Parse(vec![LocatedError {
                line,
                column,
                message: "Invalid UTF-8 sequence".to_string(),
            }]))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse_errors(code: &str) -> Vec<(u32, String)> {
        match compile(code, &CompileOptions::default()) {
            Err(Error::Parse(errors)) => errors.into_iter().map(|e| (e.line, e.message)).collect(),
            other => panic!("expected parse errors, got {:?}", other),
        }
    }

    #[test]
    fn parse_errors_are_located() {
        assert_eq!(
            parse_errors("llSay(0"),
            vec![(1, "Expected ')' (to close '(' at line 1) got <eof>".to_string())]
        );
        assert_eq!(
            parse_errors("local a = 1\nlocal = 2\nx = = 3\n"),
            vec![
                (2, "Expected identifier got '='".to_string()),
                (3, "Expected expression got '='".to_string()),
            ]
        );
    }

    #[test]
    fn compile_errors_are_located() {
        let error = compile("local x = 1\n\nbreak", &CompileOptions::default()).unwrap_err();
        assert_eq!(
            error,
            Error::Compile(LocatedError { line: 3, column: 1, message: "'break' outside of a loop".to_string() })
        );
        assert_eq!(error.to_string(), "3:1: 'break' outside of a loop");
    }

    #[test]
    fn invalid_utf8_is_a_parse_error() {
        let error = compile_bytes(b"llSay(0, \"ok\")\nllSay(0, \"\xff\")", &CompileOptions::default()).unwrap_err();
        assert_eq!(
            error,
            Error::Parse(vec![LocatedError { line: 2, column: 11, message: "Invalid UTF-8 sequence".to_string() }])
        );
        assert!(compile_bytes(b"llSay(0, \"hi\")", &CompileOptions::default()).is_ok());
    }

    #[test]
    fn empty_source_compiles() {
        let module = compile("", &CompileOptions::default()).unwrap();
        assert_eq!(module.chunks().len(), 1);
        assert_eq!(module.chunk(0).as_slice(), &[slua_bytecode::opcode::RETURN, 0]);
    }
}
