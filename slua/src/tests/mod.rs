use std::path::Path;

use regex::Regex;
use slua_bytecode::Module;
use slua_compiler::CompileOptions;

use crate::{parse_config, CliError};

fn parse_expects(source: &str, regex: Regex, field: usize) -> Vec<String> {
    let mut results = vec![];
    for line in source.lines() {
        let caps = regex.captures(line);
        if let Some(caps) = caps {
            results.push(caps[field].to_owned());
        }
    }

    results
}

#[derive(PartialEq, Debug)]
enum TestResult {
    Ok(Module),
    Error(Vec<String>),
}

fn execute(source: &str) -> TestResult {
    let outcome = slua_bridge::compile(source.as_bytes(), &CompileOptions::default());
    let is_error = outcome.is_error();
    let payload = outcome.into_payload();
    if is_error {
        let text = String::from_utf8(payload).unwrap();
        TestResult::Error(text.lines().map(|l| l.to_owned()).collect())
    } else {
        TestResult::Ok(Module::from_bytes(&payload).unwrap())
    }
}

fn harness(source: &str) {
    let expects = parse_expects(source, Regex::new(r"-- expect: ?(.*)").unwrap(), 1);
    let globals = parse_expects(source, Regex::new(r"-- expect global: (\w+)").unwrap(), 1);

    match execute(source) {
        TestResult::Ok(module) => {
            assert!(expects.is_empty(), "expected {:?}, compiled fine", expects);
            for global in globals {
                assert!(module.identifiers().contains(&global), "missing global {}", global);
            }
        }
        TestResult::Error(lines) => assert_eq!(expects, lines),
    }

    // Same input, same bytes.
    assert_eq!(execute(source), execute(source));
}

#[test]
fn config_files() {
    let path = Path::new("slua.toml");
    let options = parse_config("optimization_level = 0\ndebug_level = 2\n", path).unwrap();
    assert_eq!(options, CompileOptions { optimization_level: 0, debug_level: 2 });

    let options = parse_config("debug_level = 0\n", path).unwrap();
    assert_eq!(options, CompileOptions { optimization_level: 1, debug_level: 0 });

    assert_eq!(parse_config("", path).unwrap(), CompileOptions::default());
    assert!(matches!(parse_config("debug_level = \"high\"", path), Err(CliError::Config { .. })));
}

mod success {
    use super::harness;

    #[test]
    fn empty() {
        harness(include_str!("success/empty.slua"));
    }

    #[test]
    fn hello() {
        harness(include_str!("success/hello.slua"));
    }

    #[test]
    fn events() {
        harness(include_str!("success/events.slua"));
    }

    #[test]
    fn closures() {
        harness(include_str!("success/closures.slua"));
    }
}

mod parse {
    use super::harness;

    #[test]
    fn several_errors() {
        harness(include_str!("parse/several_errors.slua"));
    }

    #[test]
    fn unclosed_call() {
        harness(include_str!("parse/unclosed_call.slua"));
    }

    #[test]
    fn unexpected_character() {
        harness(include_str!("parse/unexpected_character.slua"));
    }

    #[test]
    fn assign_to_call() {
        harness(include_str!("parse/assign_to_call.slua"));
    }
}

mod compile {
    use super::harness;

    #[test]
    fn break_outside_loop() {
        harness(include_str!("compile/break_outside_loop.slua"));
    }

    #[test]
    fn break_in_nested_function() {
        harness(include_str!("compile/break_in_nested_function.slua"));
    }
}
