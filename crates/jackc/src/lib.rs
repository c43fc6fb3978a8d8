//! Jack compiler: translates Jack (`.jack`) source into VM (`.vm`) code
//! (spec §§1-6).
//!
//! The public surface is [`compile_path`], which accepts either a single
//! `.jack` file or a directory containing one or more `.jack` files (spec
//! §6: directories are scanned non-recursively, one output `.vm` file per
//! input class).

pub mod engine;
pub mod error;
pub mod symbol_table;
pub mod token;
pub mod vm_writer;

use std::fs::{self, File};
use std::io::BufWriter;
use std::path::{Path, PathBuf};

use engine::CompilationEngine;
pub use error::{io_error, JackError, Position, Result};
use token::Tokenizer;

const JACK_EXTENSION: &str = "jack";

/// Compiles a single `.jack` file into a sibling `.vm` file holding the
/// same base name.
pub fn compile_class_file(path: &Path) -> Result<PathBuf> {
    let source = fs::read_to_string(path).map_err(|e| io_error(path, e))?;
    let out_path = path.with_extension("vm");
    let out_file = File::create(&out_path).map_err(|e| io_error(&out_path, e))?;

    let tokenizer = Tokenizer::new(&source);
    let engine = CompilationEngine::new(tokenizer, BufWriter::new(out_file));
    engine.compile()?;

    Ok(out_path)
}

/// Compiles `path`: a single `.jack` file, or a directory scanned
/// non-recursively for `.jack` files. Each input class produces one
/// sibling `.vm` file. Returns the paths written, in directory order.
pub fn compile_path(path: &Path) -> Result<Vec<PathBuf>> {
    if path.is_dir() {
        let mut inputs: Vec<PathBuf> = fs::read_dir(path)
            .map_err(|e| io_error(path, e))?
            .filter_map(|entry| entry.ok())
            .map(|entry| entry.path())
            .filter(|p| p.extension().is_some_and(|ext| ext == JACK_EXTENSION))
            .collect();
        inputs.sort();

        if inputs.is_empty() {
            return Err(JackError::Io(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!("no .jack files found in {}", path.display()),
            )));
        }

        inputs.iter().map(|p| compile_class_file(p)).collect()
    } else {
        Ok(vec![compile_class_file(path)?])
    }
}
