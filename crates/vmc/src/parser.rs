//! VM command parser (spec §4.5).
//!
//! A lazy, single-lookahead stream over whole VM lines, mirroring the
//! shape of `jackc`'s tokenizer: `advance()` must be called once before
//! `current()` is inspected, and `has_more()` reports whether the last
//! `advance()` produced a command.

use crate::error::{Position, Result, VmError};

const ARITHMETIC_OPS: &[&str] = &["add", "sub", "neg", "eq", "gt", "lt", "and", "or", "not"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VmCommandType {
    Arithmetic,
    Push,
    Pop,
    Label,
    Goto,
    If,
    Function,
    Call,
    Return,
}

/// One parsed VM line: `(command-type, arg1, arg2)`, per spec §4.5. For
/// `Arithmetic`, `arg1` holds the operator itself; `arg2` defaults to 0
/// where the source line omits it.
#[derive(Debug, Clone)]
pub struct VmCommand {
    pub kind: VmCommandType,
    pub arg1: String,
    pub arg2: u16,
    pub at: Position,
}

pub struct VmParser {
    lines: Vec<(usize, String)>,
    pos: usize,
    current: Option<VmCommand>,
}

impl VmParser {
    /// Strips `//` comments and blank lines up front; `advance()` still
    /// walks one raw line at a time so line numbers stay accurate.
    pub fn new(source: &str) -> Self {
        let lines = source
            .lines()
            .enumerate()
            .map(|(i, line)| (i + 1, line.to_string()))
            .collect();
        VmParser {
            lines,
            pos: 0,
            current: None,
        }
    }

    pub fn has_more(&self) -> bool {
        self.current.is_some()
    }

    pub fn current(&self) -> &VmCommand {
        self.current
            .as_ref()
            .expect("current() called before advance() or after end of input")
    }

    /// Consumes lines until a non-empty command is parsed, or the stream
    /// is exhausted.
    pub fn advance(&mut self) -> Result<()> {
        loop {
            if self.pos >= self.lines.len() {
                self.current = None;
                return Ok(());
            }
            let (line_no, raw) = &self.lines[self.pos];
            let line_no = *line_no;
            self.pos += 1;

            let stripped = strip_comment(raw).trim();
            if stripped.is_empty() {
                continue;
            }

            self.current = Some(parse_command(stripped, line_no)?);
            return Ok(());
        }
    }
}

fn strip_comment(line: &str) -> &str {
    match line.find("//") {
        Some(idx) => &line[..idx],
        None => line,
    }
}

fn parse_command(line: &str, line_no: usize) -> Result<VmCommand> {
    let at = Position { line: line_no };
    let mut parts = line.split_whitespace();
    let head = parts.next().expect("non-empty line has a first token");

    if ARITHMETIC_OPS.contains(&head) {
        return Ok(VmCommand {
            kind: VmCommandType::Arithmetic,
            arg1: head.to_string(),
            arg2: 0,
            at,
        });
    }

    let kind = match head {
        "push" => VmCommandType::Push,
        "pop" => VmCommandType::Pop,
        "label" => VmCommandType::Label,
        "goto" => VmCommandType::Goto,
        "if-goto" => VmCommandType::If,
        "function" => VmCommandType::Function,
        "call" => VmCommandType::Call,
        "return" => VmCommandType::Return,
        other => {
            return Err(VmError::Syntax {
                message: format!("unrecognized command '{other}'"),
                at,
            })
        }
    };

    let arg1 = parts.next().unwrap_or_default().to_string();
    let arg2 = match parts.next() {
        Some(text) => text.parse().map_err(|_| VmError::Syntax {
            message: format!("expected integer argument, found '{text}'"),
            at,
        })?,
        None => 0,
    };

    Ok(VmCommand {
        kind,
        arg1,
        arg2,
        at,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn commands(source: &str) -> Vec<VmCommand> {
        let mut p = VmParser::new(source);
        let mut out = Vec::new();
        p.advance().unwrap();
        while p.has_more() {
            out.push(p.current().clone());
            p.advance().unwrap();
        }
        out
    }

    #[test]
    fn strips_comments_and_blank_lines() {
        let cmds = commands("// header\n\npush constant 7 // seven\nadd\n");
        assert_eq!(cmds.len(), 2);
        assert_eq!(cmds[0].kind, VmCommandType::Push);
        assert_eq!(cmds[0].arg1, "constant");
        assert_eq!(cmds[0].arg2, 7);
        assert_eq!(cmds[1].kind, VmCommandType::Arithmetic);
        assert_eq!(cmds[1].arg1, "add");
    }

    #[test]
    fn arithmetic_arg1_is_the_operator() {
        let cmds = commands("eq");
        assert_eq!(cmds[0].arg1, "eq");
        assert_eq!(cmds[0].arg2, 0);
    }

    #[test]
    fn function_and_call_parse_two_args() {
        let cmds = commands("function Foo.bar 2\ncall Foo.bar 3");
        assert_eq!(cmds[0].arg1, "Foo.bar");
        assert_eq!(cmds[0].arg2, 2);
        assert_eq!(cmds[1].arg1, "Foo.bar");
        assert_eq!(cmds[1].arg2, 3);
    }

    #[test]
    fn unrecognized_command_is_syntax_error() {
        let mut p = VmParser::new("frobnicate");
        assert!(p.advance().is_err());
    }
}
