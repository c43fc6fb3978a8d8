//! Error types for the Jack compiler.
//!
//! Mirrors the shallow taxonomy of spec §7: lexical, syntax, and semantic
//! errors are all fatal and carry a source position where one is known.

use std::fmt;
use std::path::PathBuf;

/// A 1-indexed line/column pair identifying where an error occurred.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Position {
    pub line: usize,
    pub column: usize,
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "line {}, column {}", self.line, self.column)
    }
}

/// Error type for Jack compilation.
///
/// All variants are fatal: the compiler aborts on the first one raised
/// (spec §7 non-goal: error recovery).
#[derive(Debug)]
pub enum JackError {
    /// Malformed token stream: unterminated string/comment, bad integer literal.
    Lexical { message: String, at: Position },
    /// Token does not match the expected production.
    Syntax { message: String, at: Position },
    /// Reference to an identifier absent from both symbol tables.
    Semantic(String),
    /// Failure to open or write a stream.
    Io(std::io::Error),
}

impl fmt::Display for JackError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            JackError::Lexical { message, at } => write!(f, "lexical error at {at}: {message}"),
            JackError::Syntax { message, at } => write!(f, "syntax error at {at}: {message}"),
            JackError::Semantic(s) => write!(f, "semantic error: {s}"),
            JackError::Io(e) => write!(f, "I/O error: {e}"),
        }
    }
}

impl std::error::Error for JackError {}

impl From<std::io::Error> for JackError {
    fn from(e: std::io::Error) -> Self {
        JackError::Io(e)
    }
}

/// Wraps an I/O error with the path that caused it, for a clearer message.
pub fn io_error(path: &std::path::Path, e: std::io::Error) -> JackError {
    JackError::Io(std::io::Error::new(
        e.kind(),
        format!("{}: {}", PathBuf::from(path).display(), e),
    ))
}

pub type Result<T> = std::result::Result<T, JackError>;
