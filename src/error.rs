use std::path::PathBuf;
use thiserror::Error;

use crate::directive::NestingError;

#[derive(Error, Debug)]
pub enum NdiffError {
    #[error("Cannot read '{path}': {source}")]
    FileRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Cannot read stdin: {source}")]
    StdinRead {
        #[source]
        source: std::io::Error,
    },

    #[error("'{path}' is not valid UTF-8")]
    NotUtf8 { path: PathBuf },

    #[error("'{path}' looks like a binary file")]
    BinaryFile { path: PathBuf },

    #[error("Cannot write output to '{path}': {source}")]
    FileWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Cannot parse config at '{path}': {source}")]
    ConfigParse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("Invalid config: {0}")]
    ConfigInvalid(String),

    #[error("{0}")]
    InvalidArgs(String),

    #[error("malformed preprocessor nesting: {0}")]
    Nesting(#[from] NestingError),
}

pub type Result<T> = std::result::Result<T, NdiffError>;

/// Exit codes for ndiff.
/// 0 = success
/// 1 = I/O error, including binary-file rejection
/// 2 = input-range or config error
/// 3 = malformed-preprocessor-nesting validation error
pub mod exit_code {
    #[allow(dead_code)]
    pub const SUCCESS: i32 = 0;
    pub const IO_ERROR: i32 = 1;
    pub const INPUT_OR_CONFIG_ERROR: i32 = 2;
    pub const NESTING_ERROR: i32 = 3;
}

pub fn exit_code(err: &NdiffError) -> i32 {
    match err {
        NdiffError::FileRead { .. }
        | NdiffError::StdinRead { .. }
        | NdiffError::NotUtf8 { .. }
        | NdiffError::BinaryFile { .. }
        | NdiffError::FileWrite { .. } => exit_code::IO_ERROR,
        NdiffError::ConfigParse { .. } | NdiffError::ConfigInvalid(_) | NdiffError::InvalidArgs(_) => {
            exit_code::INPUT_OR_CONFIG_ERROR
        }
        NdiffError::Nesting(_) => exit_code::NESTING_ERROR,
    }
}
