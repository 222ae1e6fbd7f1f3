use slua_compiler::LocatedError;

use crate::format::{format_compile_error, format_parse_errors, UNKNOWN_COMPILATION_ERROR};

/// The result of one bridge call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// Serialized bytecode.
    Success(Vec<u8>),
    ParseFailure(Vec<LocatedError>),
    CompileFailure(LocatedError),
    /// A bug in the pipeline rather than in the script.
    InternalFailure,
}

impl Outcome {
    pub fn is_error(&self) -> bool {
        !matches!(self, Outcome::Success(_))
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Outcome::Success(_) => "success",
            Outcome::ParseFailure(_) => "parse failure",
            Outcome::CompileFailure(_) => "compile failure",
            Outcome::InternalFailure => "internal failure",
        }
    }

    /// The bytes handed to the caller: bytecode on success, diagnostic text
    /// otherwise.
    pub fn into_payload(self) -> Vec<u8> {
        match self {
            Outcome::Success(bytecode) => bytecode,
            Outcome::ParseFailure(errors) => format_parse_errors(&errors).into_bytes(),
            Outcome::CompileFailure(error) => format_compile_error(&error).into_bytes(),
            Outcome::InternalFailure => UNKNOWN_COMPILATION_ERROR.as_bytes().to_vec(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_success_is_not_an_error() {
        assert!(!Outcome::Success(vec![1, 2, 3]).is_error());
        assert!(Outcome::ParseFailure(vec![]).is_error());
        assert!(Outcome::InternalFailure.is_error());

        let error = LocatedError { line: 2, column: 5, message: "Control flow too complex".to_string() };
        assert!(Outcome::CompileFailure(error).is_error());
    }

    #[test]
    fn payloads() {
        assert_eq!(Outcome::Success(vec![7, 8]).into_payload(), vec![7, 8]);
        assert_eq!(Outcome::InternalFailure.into_payload(), b"Unknown compilation error".to_vec());

        let error = LocatedError { line: 2, column: 5, message: "Control flow too complex".to_string() };
        assert_eq!(Outcome::CompileFailure(error.clone()).into_payload(), b":2: Control flow too complex".to_vec());
        assert_eq!(
            Outcome::ParseFailure(vec![error]).into_payload(),
            b": Parse Errors:\nLine 2: Control flow too complex".to_vec()
        );
    }
}
