use std::path::PathBuf;

use slua_bytecode::DecodeError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CliError {
    #[error("Failed to read {path}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to write {path}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid configuration in {path}")]
    Config {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("Compiler produced unreadable bytecode")]
    Decode(#[from] DecodeError),

    #[error("Failed to encode the module as JSON")]
    Json(#[from] serde_json::Error),
}
