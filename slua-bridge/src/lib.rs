mod buffer;
mod ffi;
mod format;
mod outcome;

use std::cell::Cell;
use std::panic::{self, UnwindSafe};
use std::sync::Once;

use log::{debug, trace, warn};
use slua_compiler::Error;

pub use buffer::{Allocator, CompiledBuffer};
pub use ffi::{slua_compile, slua_compile_with_options, slua_free};
pub use format::{format_compile_error, format_parse_errors, UNKNOWN_COMPILATION_ERROR};
pub use outcome::Outcome;
pub use slua_compiler::{CompileOptions, LocatedError};

thread_local! {
    static COMPILING: Cell<bool> = Cell::new(false);
}

static QUIET_PANICS: Once = Once::new();

/// Compiles `source` into serialized bytecode or a diagnostic. Never panics.
///
/// The first call chains a process-wide panic hook: a panic raised while
/// compiling on the calling thread is logged at `warn` instead of being
/// printed to stderr, and every other panic goes to the previous hook.
pub fn compile(source: &[u8], options: &CompileOptions) -> Outcome {
    debug!("compiling {} bytes of source", source.len());
    let outcome = guarded(|| {
        let module = slua_compiler::compile_bytes(source, options)?;
        trace!("serializing {} chunks", module.chunks().len());
        Ok(module.to_bytes())
    });
    debug!("compilation finished with {}", outcome.kind());
    outcome
}

fn guarded<F>(pipeline: F) -> Outcome
where
    F: FnOnce() -> Result<Vec<u8>, Error> + UnwindSafe,
{
    install_quiet_hook();
    let outer = COMPILING.with(|compiling| compiling.replace(true));
    let result = panic::catch_unwind(pipeline);
    COMPILING.with(|compiling| compiling.set(outer));

    match result {
        Ok(Ok(bytecode)) => Outcome::Success(bytecode),
        Ok(Err(Error::Parse(errors))) => Outcome::ParseFailure(errors),
        Ok(Err(Error::Compile(error))) => Outcome::CompileFailure(error),
        Ok(Err(Error::Internal(message))) => {
            warn!("internal compiler error: {}", message);
            Outcome::InternalFailure
        }
        Err(_) => Outcome::InternalFailure,
    }
}

fn install_quiet_hook() {
    QUIET_PANICS.call_once(|| {
        let previous = panic::take_hook();
        panic::set_hook(Box::new(move |info| {
            if COMPILING.try_with(Cell::get).unwrap_or(false) {
                warn!("compiler panicked: {}", info);
            } else {
                previous(info);
            }
        }));
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use slua_bytecode::Module;

    fn compile_default(source: &str) -> Outcome {
        compile(source.as_bytes(), &CompileOptions::default())
    }

    #[test]
    fn success() {
        match compile_default("llSay(0, \"hi\")") {
            Outcome::Success(bytecode) => {
                let module = Module::from_bytes(&bytecode).unwrap();
                assert_eq!(module.identifiers(), &["llSay".to_string()]);
            }
            other => panic!("expected bytecode, got {:?}", other),
        }
        assert!(!compile_default("").is_error());
    }

    #[test]
    fn parse_failure() {
        let outcome = compile_default("local a = 1\nlocal = 2\nx = = 3\n");
        assert_eq!(
            outcome,
            Outcome::ParseFailure(vec![
                LocatedError { line: 2, column: 7, message: "Expected identifier got '='".to_string() },
                LocatedError { line: 3, column: 5, message: "Expected expression got '='".to_string() },
            ])
        );
        assert_eq!(
            outcome.into_payload(),
            b": Parse Errors:\nLine 2: Expected identifier got '='\nLine 3: Expected expression got '='".to_vec()
        );
    }

    #[test]
    fn compile_failure() {
        let outcome = compile_default("x = 1\nwhile x do\n  local y = 2\nend\nbreak");
        assert_eq!(outcome.into_payload(), b":5: 'break' outside of a loop".to_vec());
    }

    #[test]
    fn invalid_utf8() {
        let outcome = compile(b"x = \"\xc3\x28\"", &CompileOptions::default());
        assert_eq!(outcome.into_payload(), b": Parse Errors:\nLine 1: Invalid UTF-8 sequence".to_vec());
    }

    #[test]
    fn internal_failures() {
        assert_eq!(guarded(|| panic!("boom")), Outcome::InternalFailure);
        assert_eq!(guarded(|| Err(Error::Internal("lost".to_string()))), Outcome::InternalFailure);
        assert_eq!(guarded(|| Ok(vec![1])), Outcome::Success(vec![1]));
    }

    #[test]
    fn panics_are_silenced_only_while_compiling() {
        let seen = guarded(|| Ok(vec![COMPILING.with(Cell::get) as u8]));
        assert_eq!(seen, Outcome::Success(vec![1]));
        assert!(!COMPILING.with(Cell::get));

        assert_eq!(guarded(|| panic!("boom")), Outcome::InternalFailure);
        assert!(!COMPILING.with(Cell::get));

        // Nested calls restore the outer state
        let nested = guarded(|| {
            let inner = guarded(|| Ok(vec![]));
            assert_eq!(inner, Outcome::Success(vec![]));
            Ok(vec![COMPILING.with(Cell::get) as u8])
        });
        assert_eq!(nested, Outcome::Success(vec![1]));
    }
}
