mod error;

#[cfg(test)]
mod tests;

use std::error::Error as _;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::Parser;
use log::{debug, info};
use slua_bytecode::{disassemble_module, Module};
use slua_compiler::CompileOptions;

use error::CliError;

#[derive(Parser, Debug)]
#[command(name = "slua")]
#[command(about = "SLua to bytecode compiler", long_about = None)]
struct Args {
    /// Log more (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(clap::Subcommand, Debug)]
enum Command {
    /// Compile a script to a bytecode file
    Compile {
        /// Script to compile
        #[arg(value_name = "FILE")]
        file: PathBuf,
        /// Output file (defaults to the script name with a .sluac extension)
        #[arg(short, long, value_name = "OUT")]
        output: Option<PathBuf>,
        #[command(flatten)]
        levels: Levels,
    },

    /// Compile a script and print the result
    Dump {
        /// Script to compile
        #[arg(value_name = "FILE")]
        file: PathBuf,
        /// Print the module as JSON instead of a disassembly
        #[arg(long)]
        json: bool,
        #[command(flatten)]
        levels: Levels,
    },
}

#[derive(clap::Args, Debug)]
struct Levels {
    /// Optimization level (0-2)
    #[arg(short = 'O', long = "optimize", value_name = "LEVEL")]
    optimization_level: Option<u8>,
    /// Debug information level (0-2)
    #[arg(short = 'g', long = "debug", value_name = "LEVEL")]
    debug_level: Option<u8>,
    /// TOML file with compile options
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,
}

impl Levels {
    fn options(&self) -> Result<CompileOptions, CliError> {
        let mut options = match &self.config {
            Some(path) => parse_config(&read_text(path)?, path)?,
            None => CompileOptions::default(),
        };
        if let Some(level) = self.optimization_level {
            options.optimization_level = level;
        }
        if let Some(level) = self.debug_level {
            options.debug_level = level;
        }
        Ok(options.clamped())
    }
}

fn parse_config(text: &str, path: &Path) -> Result<CompileOptions, CliError> {
    toml::from_str(text).map_err(|source| CliError::Config { path: path.to_path_buf(), source })
}

fn read_text(path: &Path) -> Result<String, CliError> {
    fs::read_to_string(path).map_err(|source| CliError::Read { path: path.to_path_buf(), source })
}

fn read_bytes(path: &Path) -> Result<Vec<u8>, CliError> {
    fs::read(path).map_err(|source| CliError::Read { path: path.to_path_buf(), source })
}

/// Runs the bridge on `file`. Diagnostics go to stderr as-is.
fn compile_file(file: &Path, options: &CompileOptions) -> Result<Option<Vec<u8>>, CliError> {
    let source = read_bytes(file)?;
    let outcome = slua_bridge::compile(&source, options);
    let is_error = outcome.is_error();
    let payload = outcome.into_payload();
    if is_error {
        eprintln!("{}{}", file.display(), String::from_utf8_lossy(&payload));
        return Ok(None);
    }
    Ok(Some(payload))
}

fn compile(file: &Path, output: Option<PathBuf>, options: &CompileOptions) -> Result<ExitCode, CliError> {
    let bytecode = match compile_file(file, options)? {
        Some(bytecode) => bytecode,
        None => return Ok(ExitCode::FAILURE),
    };
    let output = output.unwrap_or_else(|| file.with_extension("sluac"));
    fs::write(&output, &bytecode).map_err(|source| CliError::Write { path: output.clone(), source })?;
    info!("wrote {} bytes to {}", bytecode.len(), output.display());
    Ok(ExitCode::SUCCESS)
}

fn dump(file: &Path, json: bool, options: &CompileOptions) -> Result<ExitCode, CliError> {
    let bytecode = match compile_file(file, options)? {
        Some(bytecode) => bytecode,
        None => return Ok(ExitCode::FAILURE),
    };
    let module = Module::from_bytes(&bytecode)?;
    if json {
        println!("{}", serde_json::to_string_pretty(&module)?);
    } else {
        print!("{}", disassemble_module(&module));
    }
    Ok(ExitCode::SUCCESS)
}

fn run(args: Args) -> Result<ExitCode, CliError> {
    match args.command {
        Command::Compile { file, output, levels } => {
            let options = levels.options()?;
            debug!("compiling {} with {:?}", file.display(), options);
            compile(&file, output, &options)
        }
        Command::Dump { file, json, levels } => {
            let options = levels.options()?;
            debug!("dumping {} with {:?}", file.display(), options);
            dump(&file, json, &options)
        }
    }
}

fn main() -> ExitCode {
    let args = Args::parse();

    let level = match args.verbose {
        0 => "warn",
        1 => "debug",
        _ => "trace",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();

    match run(args) {
        Ok(code) => code,
        Err(err) => {
            eprintln!("error: {}", err);
            let mut source = err.source();
            while let Some(cause) = source {
                eprintln!("  caused by: {}", cause);
                source = cause.source();
            }
            ExitCode::FAILURE
        }
    }
}
