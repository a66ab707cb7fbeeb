//! Error types for configuration, themes and I/O around the terminal core.
//!
//! The terminal core itself never fails: malformed input is absorbed.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("Failed to parse {path}: {source}")]
    ConfigParse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("Failed to serialize config: {0}")]
    ConfigSerialize(#[from] toml::ser::Error),

    #[error("Unknown theme: {0}")]
    UnknownTheme(String),

    #[error("Invalid color {0:?}, expected #RRGGBB")]
    InvalidColor(String),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
}
