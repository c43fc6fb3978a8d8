//! vmc CLI
//!
//! Command-line interface for translating VM code to Hack assembly.

use clap::{CommandFactory, Parser as ClapParser, Subcommand};
use clap_complete::{generate, Shell};
use std::io;
use std::path::PathBuf;
use std::process;

#[derive(ClapParser)]
#[command(name = "vmc")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "VM translator - translate .vm code to Hack assembly", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Translate a .vm file, or every .vm file in a directory, to one .asm file
    Translate {
        /// Input .vm file or directory of .vm files
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
        Commands::Translate { input } => run_translate(&input),
        Commands::Completions { shell } => run_completions(shell),
    }
}

fn run_completions(shell: Shell) {
    let mut cmd = Cli::command();
    generate(shell, &mut cmd, "vmc", &mut io::stdout());
}

fn run_translate(input: &PathBuf) {
    match vmc::translate_path(input) {
        Ok(path) => println!("Translated -> {}", path.display()),
        Err(e) => {
            eprintln!("Error: {e}");
            process::exit(1);
        }
    }
}
