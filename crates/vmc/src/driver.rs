//! Translator driver (spec §4.7 / §5).
//!
//! Fans a [`VmParser`] per input `.vm` file through a single
//! [`CodeWriter`], announcing file boundaries via `set_file_name` so
//! `static` labels stay isolated per source file.

use std::io::Write;

use crate::code_writer::CodeWriter;
use crate::error::{Result, VmError};
use crate::parser::{VmCommandType, VmParser};

/// Translates one named VM source (its file stem and text) through
/// `writer`, in order.
pub fn translate_unit<W: Write>(
    writer: &mut CodeWriter<W>,
    file_stem: &str,
    source: &str,
) -> Result<()> {
    writer.set_file_name(file_stem);

    let mut parser = VmParser::new(source);
    parser.advance()?;

    while parser.has_more() {
        let command = parser.current().clone();
        match command.kind {
            VmCommandType::Arithmetic => writer.write_arithmetic(&command.arg1)?,
            VmCommandType::Push => writer.write_push(&command.arg1, command.arg2)?,
            VmCommandType::Pop => writer.write_pop(&command.arg1, command.arg2)?,
            VmCommandType::Label => writer.write_label(&command.arg1)?,
            VmCommandType::Goto => writer.write_goto(&command.arg1)?,
            VmCommandType::If => writer.write_if(&command.arg1)?,
            VmCommandType::Function => writer.write_function(&command.arg1, command.arg2)?,
            VmCommandType::Call => writer.write_call(&command.arg1, command.arg2)?,
            VmCommandType::Return => writer.write_return()?,
        }
        parser.advance()?;
    }

    Ok(())
}

/// Translates a sequence of named VM units into a single Hack assembly
/// stream, writing the bootstrap preamble first.
pub fn translate_units<W: Write>(out: W, units: &[(String, String)]) -> Result<W> {
    if units.is_empty() {
        return Err(VmError::Semantic("no .vm input provided".to_string()));
    }

    let mut writer = CodeWriter::new(out)?;
    for (file_stem, source) in units {
        translate_unit(&mut writer, file_stem, source)?;
    }
    Ok(writer.into_inner())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bootstrap_is_emitted_even_with_empty_units() {
        let out = translate_units(Vec::new(), &[("Foo".to_string(), String::new())]).unwrap();
        let asm = String::from_utf8(out).unwrap();
        assert!(asm.starts_with("\t@256\n"));
        assert!(asm.contains("call Sys.init") == false); // no comments emitted, only assembly
    }

    #[test]
    fn static_labels_are_isolated_per_file() {
        let units = vec![
            ("Foo".to_string(), "push constant 1\npop static 0\n".to_string()),
            ("Bar".to_string(), "push constant 2\npop static 0\n".to_string()),
        ];
        let out = translate_units(Vec::new(), &units).unwrap();
        let asm = String::from_utf8(out).unwrap();
        assert!(asm.contains("@Foo.0"));
        assert!(asm.contains("@Bar.0"));
    }

    #[test]
    fn empty_unit_list_is_rejected() {
        assert!(translate_units(Vec::new(), &[]).is_err());
    }
}
