use std::fmt::Write;

use slua_compiler::LocatedError;

/// Text handed back for any failure that is not the script author's fault.
pub const UNKNOWN_COMPILATION_ERROR: &str = "Unknown compilation error";

const PARSE_ERRORS_HEADER: &str = ": Parse Errors:";

/// One `Line N: message` entry per error, in the order they were reported.
pub fn format_parse_errors(errors: &[LocatedError]) -> String {
    let mut text = String::from(PARSE_ERRORS_HEADER);
    for error in errors {
        // Writing to a String cannot fail
        let _ = write!(text, "\nLine {}: {}", error.line, error.message);
    }
    text
}

pub fn format_compile_error(error: &LocatedError) -> String {
    format!(":{}: {}", error.line, error.message)
}
