//! VM-to-Hack code generation (spec §4.6).
//!
//! Owns the output stream, the current file stem (for `static` labels), a
//! monotonic comparison-label counter, and a monotonic return-label
//! counter. The bootstrap preamble is written on construction, grounded
//! in `CodeWriter.__init__`'s hand-written sentinel initialization.

use std::io::Write;

use crate::error::{Result, VmError};

pub struct CodeWriter<W: Write> {
    out: W,
    file_stem: String,
    label_count: u32,
    return_label_index: u32,
}

impl<W: Write> CodeWriter<W> {
    /// Writes the bootstrap preamble (`SP=256`, pointer sentinels, `call
    /// Sys.init 0`) before returning the writer.
    pub fn new(out: W) -> Result<Self> {
        let mut writer = CodeWriter {
            out,
            file_stem: String::new(),
            label_count: 0,
            return_label_index: 0,
        };
        writer.write_bootstrap()?;
        Ok(writer)
    }

    /// Updates the file stem used for `static` symbol naming. Called once
    /// per input file by the driver.
    pub fn set_file_name(&mut self, stem: &str) {
        self.file_stem = stem.to_string();
    }

    /// Consumes the writer, returning the underlying stream.
    pub fn into_inner(self) -> W {
        self.out
    }

    fn emit(&mut self, instruction: &str) -> Result<()> {
        writeln!(self.out, "\t{instruction}")?;
        Ok(())
    }

    fn emit_label_def(&mut self, label: &str) -> Result<()> {
        writeln!(self.out, "({label})")?;
        Ok(())
    }

    fn push_d(&mut self) -> Result<()> {
        self.emit("@SP")?;
        self.emit("A=M")?;
        self.emit("M=D")?;
        self.emit("@SP")?;
        self.emit("M=M+1")
    }

    fn write_bootstrap(&mut self) -> Result<()> {
        self.emit("@256")?;
        self.emit("D=A")?;
        self.emit("@SP")?;
        self.emit("M=D")?;

        for (offset, register) in [(1, "LCL"), (2, "ARG"), (3, "THIS"), (4, "THAT")] {
            self.emit(&format!("@{offset}"))?;
            self.emit("D=A")?;
            self.emit("D=-D")?;
            self.emit(&format!("@{register}"))?;
            self.emit("M=D")?;
        }

        self.write_call("Sys.init", 0)
    }

    pub fn write_arithmetic(&mut self, command: &str) -> Result<()> {
        // common prefix: pop one operand into D
        self.emit("@SP")?;
        self.emit("M=M-1")?;
        self.emit("@SP")?;
        self.emit("A=M")?;
        self.emit("D=M")?;

        match command {
            "add" => {
                self.emit("@SP")?;
                self.emit("M=M-1")?;
                self.emit("@SP")?;
                self.emit("A=M")?;
                self.emit("D=D+M")?;
            }
            "sub" => {
                self.emit("D=-D")?;
                self.emit("@SP")?;
                self.emit("M=M-1")?;
                self.emit("@SP")?;
                self.emit("A=M")?;
                self.emit("D=D+M")?;
            }
            "neg" => self.emit("D=-D")?,
            "and" => {
                self.emit("@SP")?;
                self.emit("M=M-1")?;
                self.emit("@SP")?;
                self.emit("A=M")?;
                self.emit("D=D&M")?;
            }
            "or" => {
                self.emit("@SP")?;
                self.emit("M=M-1")?;
                self.emit("@SP")?;
                self.emit("A=M")?;
                self.emit("D=D|M")?;
            }
            "not" => self.emit("D=!D")?,
            "eq" => self.write_comparison("JEQ")?,
            "gt" => self.write_comparison("JLT")?,
            "lt" => self.write_comparison("JGT")?,
            other => {
                return Err(VmError::Semantic(format!(
                    "unrecognized arithmetic command '{other}'"
                )))
            }
        }

        self.emit("M=D")?;
        self.emit("@SP")?;
        self.emit("M=M+1")?;

        if matches!(command, "eq" | "gt" | "lt") {
            self.label_count += 1;
        }
        Ok(())
    }

    /// Shared shape for `eq`/`gt`/`lt`: subtracts the second operand from
    /// the first, then branches on `jump_if_true` to decide between the
    /// two fresh `CHECK<n>TRUE`/`CHECK<n>FALSE` labels.
    fn write_comparison(&mut self, jump_if_true: &str) -> Result<()> {
        let n = self.label_count;
        let true_label = format!("CHECK{n}TRUE");
        let false_label = format!("CHECK{n}FALSE");

        self.emit("@SP")?;
        self.emit("M=M-1")?;
        self.emit("@SP")?;
        self.emit("A=M")?;
        self.emit("D=D-M")?;

        self.emit(&format!("@{true_label}"))?;
        self.emit(&format!("D;{jump_if_true}"))?;
        self.emit("D=0")?;
        self.emit(&format!("@{false_label}"))?;
        self.emit("0;JMP")?;
        self.emit_label_def(&true_label)?;
        self.emit("D=-1")?;
        self.emit_label_def(&false_label)?;

        self.emit("@SP")?;
        self.emit("A=M")
    }

    fn based_address(&mut self, base: &str, index: u16) -> Result<()> {
        self.emit(&format!("@{index}"))?;
        self.emit("D=A")?;
        self.emit(&format!("@{base}"))?;
        self.emit("A=D+M")
    }

    fn this_that(index: u16) -> &'static str {
        if index == 0 {
            "THIS"
        } else {
            "THAT"
        }
    }

    pub fn write_push(&mut self, segment: &str, index: u16) -> Result<()> {
        match segment {
            "constant" => {
                self.emit(&format!("@{index}"))?;
                self.emit("D=A")?;
            }
            "local" => {
                self.based_address("LCL", index)?;
                self.emit("D=M")?;
            }
            "argument" => {
                self.based_address("ARG", index)?;
                self.emit("D=M")?;
            }
            "this" => {
                self.based_address("THIS", index)?;
                self.emit("D=M")?;
            }
            "that" => {
                self.based_address("THAT", index)?;
                self.emit("D=M")?;
            }
            "temp" => {
                self.emit(&format!("@{}", index + 5))?;
                self.emit("D=M")?;
            }
            "pointer" => {
                self.emit(&format!("@{}", Self::this_that(index)))?;
                self.emit("D=M")?;
            }
            "static" => {
                self.emit(&format!("@{}.{}", self.file_stem, index))?;
                self.emit("D=M")?;
            }
            other => {
                return Err(VmError::Semantic(format!("unknown segment '{other}'")))
            }
        }
        self.push_d()
    }

    pub fn write_pop(&mut self, segment: &str, index: u16) -> Result<()> {
        match segment {
            "local" => self.write_pop_based("LCL", index),
            "argument" => self.write_pop_based("ARG", index),
            "this" => self.write_pop_based("THIS", index),
            "that" => self.write_pop_based("THAT", index),
            "temp" => {
                self.emit("@SP")?;
                self.emit("M=M-1")?;
                self.emit("A=M")?;
                self.emit("D=M")?;
                self.emit(&format!("@{}", index + 5))?;
                self.emit("M=D")
            }
            "pointer" => {
                self.emit("@SP")?;
                self.emit("M=M-1")?;
                self.emit("A=M")?;
                self.emit("D=M")?;
                self.emit(&format!("@{}", Self::this_that(index)))?;
                self.emit("M=D")
            }
            "static" => {
                self.emit("@SP")?;
                self.emit("M=M-1")?;
                self.emit("A=M")?;
                self.emit("D=M")?;
                self.emit(&format!("@{}.{}", self.file_stem, index))?;
                self.emit("M=D")
            }
            other => Err(VmError::Semantic(format!(
                "segment '{other}' is not a valid pop target"
            ))),
        }
    }

    /// `local`/`argument`/`this`/`that` pop: stashes the target address in
    /// the base register itself, pops into it, then restores the base.
    fn write_pop_based(&mut self, base: &str, index: u16) -> Result<()> {
        self.emit(&format!("@{index}"))?;
        self.emit("D=A")?;
        self.emit(&format!("@{base}"))?;
        self.emit("M=D+M")?;

        self.emit("@SP")?;
        self.emit("M=M-1")?;
        self.emit("A=M")?;
        self.emit("D=M")?;
        self.emit(&format!("@{base}"))?;
        self.emit("A=M")?;
        self.emit("M=D")?;

        self.emit(&format!("@{index}"))?;
        self.emit("D=A")?;
        self.emit(&format!("@{base}"))?;
        self.emit("M=M-D")
    }

    pub fn write_label(&mut self, label: &str) -> Result<()> {
        self.emit_label_def(label)
    }

    pub fn write_goto(&mut self, label: &str) -> Result<()> {
        self.emit(&format!("@{label}"))?;
        self.emit("0;JMP")
    }

    pub fn write_if(&mut self, label: &str) -> Result<()> {
        self.emit("@SP")?;
        self.emit("M=M-1")?;
        self.emit("@SP")?;
        self.emit("A=M")?;
        self.emit("D=M")?;
        self.emit(&format!("@{label}"))?;
        self.emit("D;JNE")
    }

    pub fn write_function(&mut self, name: &str, n_locals: u16) -> Result<()> {
        self.emit_label_def(name)?;
        for _ in 0..n_locals {
            self.emit("@SP")?;
            self.emit("A=M")?;
            self.emit("M=0")?;
            self.emit("@SP")?;
            self.emit("M=M+1")?;
        }
        Ok(())
    }

    fn push_register(&mut self, register: &str) -> Result<()> {
        self.emit(&format!("@{register}"))?;
        self.emit("D=M")?;
        self.push_d()
    }

    pub fn write_call(&mut self, name: &str, n_args: u16) -> Result<()> {
        let return_label = format!("{name}$ret.{}", self.return_label_index);
        self.return_label_index += 1;

        self.emit(&format!("@{return_label}"))?;
        self.emit("D=A")?;
        self.push_d()?;

        self.push_register("LCL")?;
        self.push_register("ARG")?;
        self.push_register("THIS")?;
        self.push_register("THAT")?;

        self.emit("@SP")?;
        self.emit("D=M")?;
        self.emit("@5")?;
        self.emit("D=D-A")?;
        self.emit(&format!("@{n_args}"))?;
        self.emit("D=D-A")?;
        self.emit("@ARG")?;
        self.emit("M=D")?;

        self.emit("@SP")?;
        self.emit("D=M")?;
        self.emit("@LCL")?;
        self.emit("M=D")?;

        self.emit(&format!("@{name}"))?;
        self.emit("0;JMP")?;

        self.emit_label_def(&return_label)
    }

    pub fn write_return(&mut self) -> Result<()> {
        // frame (R13) = LCL
        self.emit("@LCL")?;
        self.emit("D=M")?;
        self.emit("@R13")?;
        self.emit("M=D")?;

        // retAddr (R14) = *(frame-5), read before frame is overwritten
        self.emit("@R13")?;
        self.emit("D=M")?;
        self.emit("@5")?;
        self.emit("D=D-A")?;
        self.emit("A=D")?;
        self.emit("D=M")?;
        self.emit("@R14")?;
        self.emit("M=D")?;

        // *ARG = pop()
        self.emit("@SP")?;
        self.emit("M=M-1")?;
        self.emit("A=M")?;
        self.emit("D=M")?;
        self.emit("@ARG")?;
        self.emit("A=M")?;
        self.emit("M=D")?;

        // SP = ARG + 1
        self.emit("@ARG")?;
        self.emit("D=M+1")?;
        self.emit("@SP")?;
        self.emit("M=D")?;

        for (offset, register) in [(1, "THAT"), (2, "THIS"), (3, "ARG"), (4, "LCL")] {
            self.emit("@R13")?;
            if offset == 1 {
                self.emit("D=M-1")?;
            } else {
                self.emit("D=M")?;
                self.emit(&format!("@{offset}"))?;
                self.emit("D=D-A")?;
            }
            self.emit("A=D")?;
            self.emit("D=M")?;
            self.emit(&format!("@{register}"))?;
            self.emit("M=D")?;
        }

        self.emit("@R14")?;
        self.emit("A=M")?;
        self.emit("0;JMP")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn output(f: impl FnOnce(&mut CodeWriter<Vec<u8>>) -> Result<()>) -> String {
        let mut w = CodeWriter::new(Vec::new()).unwrap();
        f(&mut w).unwrap();
        String::from_utf8(w.into_inner()).unwrap()
    }

    #[test]
    fn bootstrap_initializes_sp_and_pointer_sentinels() {
        let asm = output(|_| Ok(()));
        assert!(asm.starts_with("\t@256\n\tD=A\n\t@SP\n\tM=D\n"));
        assert!(asm.contains("\t@1\n\tD=A\n\tD=-D\n\t@LCL\n\tM=D\n"));
        assert!(asm.contains("\t@4\n\tD=A\n\tD=-D\n\t@THAT\n\tM=D\n"));
        assert!(asm.contains("Sys.init$ret.0"));
    }

    #[test]
    fn push_constant_emits_immediate_load() {
        let asm = output(|w| w.write_push("constant", 17));
        assert!(asm.contains("\t@17\n\tD=A\n\t@SP\n\tA=M\n\tM=D\n\t@SP\n\tM=M+1\n"));
    }

    #[test]
    fn static_segment_is_qualified_by_file_stem() {
        let asm = output(|w| {
            w.set_file_name("Foo");
            w.write_pop("static", 3)
        });
        assert!(asm.contains("@Foo.3"));
    }

    #[test]
    fn pointer_segment_maps_zero_and_one_to_this_and_that() {
        let asm = output(|w| {
            w.write_push("pointer", 0)?;
            w.write_push("pointer", 1)
        });
        assert!(asm.contains("@THIS"));
        assert!(asm.contains("@THAT"));
    }

    #[test]
    fn comparison_labels_are_monotonic_and_unique() {
        let asm = output(|w| {
            w.write_arithmetic("eq")?;
            w.write_arithmetic("eq")?;
            w.write_arithmetic("eq")
        });
        assert!(asm.contains("CHECK0TRUE"));
        assert!(asm.contains("CHECK1TRUE"));
        assert!(asm.contains("CHECK2TRUE"));
        assert!(!asm.contains("CHECK3TRUE"));
    }

    #[test]
    fn call_pushes_five_frame_words_before_jumping() {
        let asm = output(|w| w.write_call("Foo.bar", 2));
        let bootstrap_end = asm.find("(Sys.init$ret.0)\n").unwrap() + "(Sys.init$ret.0)\n".len();
        let jump_pos = asm.find("@Foo.bar\n\t0;JMP").unwrap();
        let pushes_before = asm[bootstrap_end..jump_pos].matches("M=M+1").count();
        assert_eq!(pushes_before, 5);
    }

    #[test]
    fn function_prologue_pushes_n_zeros() {
        let asm = output(|w| w.write_function("Foo.bar", 3));
        assert_eq!(asm.matches("M=0").count(), 3);
        assert!(asm.starts_with("(Foo.bar)\n"));
    }
}
