//! Error types for the VM-to-Hack translator.
//!
//! Mirrors the shallow taxonomy of spec §7; as in `jackc`, every variant is
//! fatal and aborts translation.

use std::fmt;
use std::path::PathBuf;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Position {
    pub line: usize,
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "line {}", self.line)
    }
}

#[derive(Debug)]
pub enum VmError {
    /// A line does not match any known VM command shape.
    Syntax { message: String, at: Position },
    /// A segment or command name is not part of the VM language surface.
    Semantic(String),
    /// Failure to open or write a stream.
    Io(std::io::Error),
}

impl fmt::Display for VmError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VmError::Syntax { message, at } => write!(f, "syntax error at {at}: {message}"),
            VmError::Semantic(s) => write!(f, "semantic error: {s}"),
            VmError::Io(e) => write!(f, "I/O error: {e}"),
        }
    }
}

impl std::error::Error for VmError {}

impl From<std::io::Error> for VmError {
    fn from(e: std::io::Error) -> Self {
        VmError::Io(e)
    }
}

pub fn io_error(path: &std::path::Path, e: std::io::Error) -> VmError {
    VmError::Io(std::io::Error::new(
        e.kind(),
        format!("{}: {}", PathBuf::from(path).display(), e),
    ))
}

pub type Result<T> = std::result::Result<T, VmError>;
