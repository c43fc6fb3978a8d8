//! VM instruction emitter (spec §4.3).
//!
//! A pure formatter: each method writes exactly one line of VM text to the
//! underlying stream, normalizing symbol-table kinds to VM segment names.

use std::io::{self, Write};

use crate::symbol_table::SymbolKind;

/// Normalizes a symbol-table kind to its VM segment name.
pub fn segment_for_kind(kind: SymbolKind) -> &'static str {
    match kind {
        SymbolKind::Static => "static",
        SymbolKind::Field => "this",
        SymbolKind::Arg => "argument",
        SymbolKind::Var => "local",
    }
}

pub struct VmWriter<W: Write> {
    out: W,
}

impl<W: Write> VmWriter<W> {
    pub fn new(out: W) -> Self {
        VmWriter { out }
    }

    pub fn write_push(&mut self, segment: &str, index: u16) -> io::Result<()> {
        writeln!(self.out, "push {segment} {index}")
    }

    pub fn write_pop(&mut self, segment: &str, index: u16) -> io::Result<()> {
        writeln!(self.out, "pop {segment} {index}")
    }

    pub fn write_arithmetic(&mut self, command: &str) -> io::Result<()> {
        writeln!(self.out, "{command}")
    }

    pub fn write_label(&mut self, label: &str) -> io::Result<()> {
        writeln!(self.out, "label {label}")
    }

    pub fn write_goto(&mut self, label: &str) -> io::Result<()> {
        writeln!(self.out, "goto {label}")
    }

    pub fn write_if(&mut self, label: &str) -> io::Result<()> {
        writeln!(self.out, "if-goto {label}")
    }

    pub fn write_call(&mut self, name: &str, n_args: u16) -> io::Result<()> {
        writeln!(self.out, "call {name} {n_args}")
    }

    pub fn write_function(&mut self, name: &str, n_locals: u16) -> io::Result<()> {
        writeln!(self.out, "function {name} {n_locals}")
    }

    pub fn write_return(&mut self) -> io::Result<()> {
        writeln!(self.out, "return")
    }

    /// Consumes the writer, returning the underlying stream.
    pub fn into_inner(self) -> W {
        self.out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn segments_normalize_from_symbol_kinds() {
        assert_eq!(segment_for_kind(SymbolKind::Static), "static");
        assert_eq!(segment_for_kind(SymbolKind::Field), "this");
        assert_eq!(segment_for_kind(SymbolKind::Arg), "argument");
        assert_eq!(segment_for_kind(SymbolKind::Var), "local");
    }

    #[test]
    fn emits_one_line_per_call() {
        let mut buf = Vec::new();
        {
            let mut w = VmWriter::new(&mut buf);
            w.write_push("constant", 7).unwrap();
            w.write_call("Math.multiply", 2).unwrap();
            w.write_return().unwrap();
        }
        let text = String::from_utf8(buf).unwrap();
        assert_eq!(text, "push constant 7\ncall Math.multiply 2\nreturn\n");
    }
}
