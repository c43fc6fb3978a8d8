//! VM-to-Hack-assembly translator: Stage B of the toolchain (spec §§1-6).
//!
//! The public surface is [`translate_path`], which accepts either a
//! single `.vm` file or a directory of `.vm` files and produces one
//! `.asm` file named after the input target (spec §6).

pub mod code_writer;
pub mod driver;
pub mod error;
pub mod parser;

use std::fs;
use std::path::{Path, PathBuf};

pub use error::{io_error, Result, VmError};

const VM_EXTENSION: &str = "vm";

/// Translates `path` (a single `.vm` file, or a directory scanned
/// non-recursively for `.vm` files) into one `.asm` file alongside the
/// input, and returns the path written.
pub fn translate_path(path: &Path) -> Result<PathBuf> {
    let (out_path, units) = if path.is_dir() {
        let mut inputs: Vec<PathBuf> = fs::read_dir(path)
            .map_err(|e| io_error(path, e))?
            .filter_map(|entry| entry.ok())
            .map(|entry| entry.path())
            .filter(|p| p.extension().is_some_and(|ext| ext == VM_EXTENSION))
            .collect();
        inputs.sort();

        if inputs.is_empty() {
            return Err(VmError::Io(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!("no .vm files found in {}", path.display()),
            )));
        }

        let dir_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "out".to_string());
        let out_path = path
            .parent()
            .unwrap_or(Path::new("."))
            .join(format!("{dir_name}.asm"));

        let mut units = Vec::with_capacity(inputs.len());
        for input in &inputs {
            let stem = file_stem(input);
            let source = fs::read_to_string(input).map_err(|e| io_error(input, e))?;
            units.push((stem, source));
        }
        (out_path, units)
    } else {
        let stem = file_stem(path);
        let source = fs::read_to_string(path).map_err(|e| io_error(path, e))?;
        let out_path = path.with_extension("asm");
        (out_path, vec![(stem, source)])
    };

    let asm = driver::translate_units(Vec::new(), &units)?;
    fs::write(&out_path, asm).map_err(|e| io_error(&out_path, e))?;
    Ok(out_path)
}

fn file_stem(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default()
}
