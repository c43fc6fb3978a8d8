//! jackc CLI
//!
//! Command-line interface for compiling Jack source to VM code.

use clap::{CommandFactory, Parser as ClapParser, Subcommand};
use clap_complete::{generate, Shell};
use std::io;
use std::path::PathBuf;
use std::process;

#[derive(ClapParser)]
#[command(name = "jackc")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Jack compiler - compile .jack source to VM code", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compile a .jack file, or every .jack file in a directory
    Compile {
        /// Input .jack file or directory of .jack files
        input: PathBuf,
    },

    /// Generate shell completion scripts
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

fn main() {
    let cli = Cli::parse();

    match cli.command {
        Commands::Compile { input } => run_compile(&input),
        Commands::Completions { shell } => run_completions(shell),
    }
}

fn run_completions(shell: Shell) {
    let mut cmd = Cli::command();
    generate(shell, &mut cmd, "jackc", &mut io::stdout());
}

fn run_compile(input: &PathBuf) {
    match jackc::compile_path(input) {
        Ok(outputs) => {
            for path in outputs {
                println!("Compiled -> {}", path.display());
            }
        }
        Err(e) => {
            eprintln!("Error: {e}");
            process::exit(1);
        }
    }
}
