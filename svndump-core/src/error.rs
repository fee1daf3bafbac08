//! Error kinds shared by the reader, writer, transform pipeline and merge engine.

use std::path::PathBuf;

pub type Result<T> = std::result::Result<T, Error>;

/// Everything that can go wrong while reading, writing or transforming a dump stream.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("{path}:{line}: bad dump format: {detail}")]
    BadFormat {
        path: PathBuf,
        line: u64,
        detail: String,
    },

    #[error("{path}:{line}: truncated dump stream: {detail}")]
    Truncated {
        path: PathBuf,
        line: u64,
        detail: String,
    },

    #[error("invalid state: {0}")]
    InvalidState(String),

    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("integrity failure for '{path}': declared md5 {declared} but computed {computed}")]
    IntegrityFailure {
        path: String,
        declared: String,
        computed: String,
    },

    #[error("no mapping for source revision {source_rev} in input {input}")]
    MissingMapping { input: usize, source_rev: u64 },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
