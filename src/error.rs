//! # Centralized Error Handling
//!
//! Unified error types for the entire crate using `thiserror`.
//!
//! Everything in the fatal taxonomy (I/O, malformed input, alignment
//! invariant violations, gap-structure inconsistency, column drift) is a
//! variant here and propagates to `main` via the crate-wide [`Result`]
//! alias. The only recoverable condition, an incoming alignment skipped
//! because the open-haplotype set is already at capacity, is logged by the
//! enumerator and never surfaces as an error.

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for msa2vcf operations
#[derive(Error, Debug)]
pub enum MsaVcfError {
    /// I/O errors (file missing, permission denied, read/write failures)
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Malformed input line (wrong field count, non-numeric positions)
    #[error("Parse error at line {line}: {message}")]
    Parse { line: usize, message: String },

    /// A loaded alignment violates a structural invariant
    #[error("Invalid alignment {name}: {message}")]
    InvalidAlignment { name: String, message: String },

    /// Two alignments disagree on the number of MSA insertion columns
    /// following a reference position
    #[error(
        "Gap structure mismatch at position {pos} (alignment {name}): have existing value {existing}, want to set {wanted}"
    )]
    GapStructure {
        pos: usize,
        name: String,
        existing: usize,
        wanted: usize,
    },

    /// A non-gap alignment column does not match the reference sequence
    #[error("Reference mismatch at position {pos} (alignment {name}): reference has {expected:?}, alignment has {found:?}")]
    ReferenceMismatch {
        pos: usize,
        name: String,
        expected: char,
        found: char,
    },

    /// Open haplotypes stopped being column-synchronous with the MSA
    #[error("Haplotype column drift at position {pos}: {message}")]
    ColumnDrift { pos: usize, message: String },

    /// Internal algorithm invariant failed
    #[error("Algorithm error: {message}")]
    Algorithm { message: String },

    /// Configuration errors (invalid CLI arguments)
    #[error("Configuration error: {message}")]
    Config { message: String },

    /// File not found errors
    #[error("File not found: {path}")]
    FileNotFound { path: PathBuf },
}

/// Type alias for Results using MsaVcfError
pub type Result<T> = std::result::Result<T, MsaVcfError>;

impl MsaVcfError {
    /// Create a parse error with a line number
    pub fn parse(line: usize, message: impl Into<String>) -> Self {
        Self::Parse {
            line,
            message: message.into(),
        }
    }

    /// Create an invalid-alignment error
    pub fn invalid_alignment(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidAlignment {
            name: name.into(),
            message: message.into(),
        }
    }

    /// Create a column-drift error
    pub fn column_drift(pos: usize, message: impl Into<String>) -> Self {
        Self::ColumnDrift {
            pos,
            message: message.into(),
        }
    }

    /// Create an algorithm error
    pub fn algorithm(message: impl Into<String>) -> Self {
        Self::Algorithm {
            message: message.into(),
        }
    }

    /// Create a configuration error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }
}
