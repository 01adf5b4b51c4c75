//! High-level compiler facade (teacher's `src/compiler.rs`): wraps pipeline
//! construction and execution behind one call so the CLI doesn't need to
//! know the stage order.

use crate::compilation_pipeline::{self, CompilationPipeline, CompilationResult};

/// Configuration a single compilation run needs beyond the source text
/// itself.
pub struct CompileOptions {
    /// `-O/--optimization`, spec §6: one of 0, 1, 2, 3.
    pub optimization_level: u8,
    /// Root directory `$include <path>` (angle-bracket form) resolves
    /// against (spec §4.2).
    pub lib_root: String,
}

impl Default for CompileOptions {
    fn default() -> Self {
        CompileOptions {
            optimization_level: 0,
            lib_root: "lib".to_string(),
        }
    }
}

pub struct Compiler;

impl Compiler {
    pub fn new() -> Self {
        Compiler
    }

    /// Runs the full pipeline (preprocess through code generation) over
    /// `source`, attributing diagnostics to `file_name`.
    pub fn compile_source(
        &self,
        source: &str,
        file_name: &str,
        options: CompileOptions,
    ) -> CompilationResult {
        let pipeline =
            CompilationPipeline::new(file_name.to_string()).with_lib_root(options.lib_root);
        compilation_pipeline::execute(pipeline, source, options.optimization_level)
    }
}

impl Default for Compiler {
    fn default() -> Self {
        Compiler::new()
    }
}
