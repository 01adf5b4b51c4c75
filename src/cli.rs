//! Command-line surface (spec §6): one positional input path, `-o/--output`,
//! `-O/--optimization`, `--dump-ast`. Mirrors the teacher's
//! `#[derive(Parser)]` `src/cli.rs`, minus the teacher's subcommands — this
//! compiler is a single fixed pipeline, not a multi-mode tool.

use crate::compilation_pipeline::{self, CompilationPipeline, CompilationResult};
use crate::compiler::{CompileOptions, Compiler};
use crate::exit;
use boxc_ir::AstPrinter;
use clap::Parser as ClapParser;
use colored::Colorize;
use std::fs;
use std::path::PathBuf;

#[derive(ClapParser)]
#[command(
    name = "boxc",
    version,
    about = "The BoxLang4 compiler",
    long_about = "BoxLang4 compiles Box source files into textual assembly for the \
target virtual machine's registers and stack-based instruction set."
)]
pub struct Cli {
    /// Path to the .box source file to compile
    pub filepath: PathBuf,

    /// Path to the output assembly file
    #[arg(short = 'o', long = "output", default_value = "a.out")]
    pub output: PathBuf,

    /// Optimization level (0, 1, 2 or 3)
    #[arg(
        short = 'O',
        long = "optimization",
        default_value_t = 0,
        value_parser = clap::value_parser!(u8).range(0..=3)
    )]
    pub optimization: u8,

    /// Print the Abstract Syntax Tree and exit
    #[arg(long = "dump-ast")]
    pub dump_ast: bool,
}

/// Runs the compiler end to end for the parsed arguments. Never returns:
/// every path ends in `std::process::exit` (spec §6's two exit codes).
pub fn run(cli: Cli) -> ! {
    let source = match fs::read_to_string(&cli.filepath) {
        Ok(source) => source,
        Err(_) => exit::with_code(
            exit::Code::Failure,
            &format!("fatal error: file '{}' not found", cli.filepath.display()),
        ),
    };

    let file_name = cli.filepath.display().to_string();

    if cli.dump_ast {
        run_dump_ast(&source, file_name);
    }

    let compiler = Compiler::new();
    let options = CompileOptions {
        optimization_level: cli.optimization,
        lib_root: "lib".to_string(),
    };

    match compiler.compile_source(&source, &file_name, options) {
        CompilationResult::Success { assembly } => match fs::write(&cli.output, assembly) {
            Ok(()) => {
                println!(
                    "{} Output written to '{}'.",
                    "Compilation successful.".green(),
                    cli.output.display()
                );
                std::process::exit(exit::Code::Success as i32);
            }
            Err(_) => exit::with_code(
                exit::Code::Failure,
                &format!(
                    "fatal error: could not write to output file '{}'",
                    cli.output.display()
                ),
            ),
        },
        CompilationResult::Failed => {
            exit::with_code(exit::Code::Failure, "\nCompilation failed.")
        }
        CompilationResult::Fatal(err) => {
            exit::with_code(exit::Code::Failure, &format!("fatal error: {err}"))
        }
    }
}

/// `--dump-ast`: parse only (no semantic analysis, optimization, or code
/// generation) and print the raw parse tree, matching the original tool's
/// behavior of exiting right after a successful parse.
fn run_dump_ast(source: &str, file_name: String) -> ! {
    let pipeline = CompilationPipeline::new(file_name);
    match compilation_pipeline::parse_only(pipeline, source) {
        Some(program) => {
            AstPrinter::new().print(&program);
            std::process::exit(exit::Code::Success as i32);
        }
        None => exit::with_code(exit::Code::Failure, "\nParsing failed."),
    }
}
