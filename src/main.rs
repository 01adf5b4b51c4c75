//! BoxLang4 compiler entry point: parses CLI arguments and runs the
//! `Preprocessor -> Lexer -> Parser -> SemanticAnalyzer -> (Optimizer) ->
//! CodeGenerator` pipeline (spec §2).

mod cli;
mod compilation_pipeline;
mod compiler;
mod exit;

use clap::Parser;

fn main() {
    let cli = cli::Cli::parse();
    cli::run(cli);
}
