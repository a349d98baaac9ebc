//! mask fasta sequences using bed intervals
//! Alejandro Gonzales-Irribarren, 2025
//!
//! Error types shared by the BED reader, the interval index and the
//! masking engine. Every variant is fatal for the run.

use std::path::PathBuf;

use thiserror::Error;

/// Result type alias for famask operations
pub type Result<T> = std::result::Result<T, FaMaskError>;

/// Error types that can occur while masking a FASTA file
#[derive(Debug, Error)]
pub enum FaMaskError {
    /// Invalid combination of command-line arguments
    #[error("invalid arguments: {0}")]
    UsageError(String),

    /// Required input path does not exist
    #[error("file {} does not exist", .path.display())]
    FileNotFound { path: PathBuf },

    /// Required input path exists but cannot be opened
    #[error("unable to open file {}: {source}", .path.display())]
    FileOpen {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Input that does not follow the BED/FASTA layout
    #[error("malformed input in {} at line {line}: {msg}", .path.display())]
    MalformedInput {
        path: PathBuf,
        line: usize,
        msg: String,
    },

    /// Interval with `start >= stop`
    #[error("invalid interval {name}:{start}-{stop}{}", context(.line))]
    InvalidInterval {
        name: String,
        start: u32,
        stop: u32,
        line: Option<usize>,
    },

    /// I/O error while reading or writing a stream
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

fn context(line: &Option<usize>) -> String {
    match line {
        Some(line) => format!(" at line {line} (start must be smaller than stop)"),
        None => " (start must be smaller than stop)".to_string(),
    }
}
