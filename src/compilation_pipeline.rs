//! Composable, fail-fast compilation pipeline (SPEC_FULL.md "Ambient
//! stack": the teacher's `CompilationPipeline`/`PipelineStage` combinator
//! from `src/compilation_pipeline.rs`, generalized from its three stages to
//! BoxLang4's six: Preprocessor, Lexer, Parser, SemanticAnalyzer,
//! (Optimizer), CodeGenerator). Every stage short-circuits the moment the
//! shared `ErrorReporter` has recorded an error (spec §5: "A stage that
//! detects any prior error must not proceed").

use boxc_error::{ErrorReporter, FatalError};
use boxc_frontend::{analyze, parse, tokenize, Preprocessor};
use boxc_ir::ast::Program;
use boxc_ir::Token;
use boxc_optimizer::optimize;

/// Carries the one piece of state every stage needs: the diagnostic sink.
/// Everything else is produced and consumed stage-to-stage as plain data,
/// per spec §9's "no module-level singletons".
pub struct CompilationPipeline {
    reporter: ErrorReporter,
    file_name: String,
    lib_root: String,
}

impl CompilationPipeline {
    pub fn new(file_name: impl Into<String>) -> Self {
        CompilationPipeline {
            reporter: ErrorReporter::new(),
            file_name: file_name.into(),
            lib_root: "lib".to_string(),
        }
    }

    pub fn with_lib_root(mut self, lib_root: impl Into<String>) -> Self {
        self.lib_root = lib_root.into();
        self
    }

    /// Stage 1: directive expansion (spec §4.2). Registers the top-level
    /// file's lines with the reporter so later diagnostics against it can
    /// render source context.
    pub fn preprocess(mut self, source: &str) -> PipelineStage<String> {
        let lines: Vec<String> = source.lines().map(str::to_string).collect();
        self.reporter.load_source_file(self.file_name.clone(), lines);

        let text = Preprocessor::new(&mut self.reporter)
            .with_lib_root(self.lib_root.clone())
            .process(source, &self.file_name);

        if self.reporter.had_error() {
            PipelineStage::Failed { pipeline: self }
        } else {
            PipelineStage::Success {
                pipeline: self,
                data: text,
            }
        }
    }

    /// Stage 2: tokenization (spec §4.3).
    pub fn tokenize(mut self, text: &str) -> PipelineStage<Vec<Token>> {
        let tokens = tokenize(text, &self.file_name, &mut self.reporter);
        if self.reporter.had_error() {
            PipelineStage::Failed { pipeline: self }
        } else {
            PipelineStage::Success {
                pipeline: self,
                data: tokens,
            }
        }
    }

    /// Stage 3: recursive-descent parse (spec §4.4). The parser aborts at
    /// its first diagnostic, so a `None` root and `had_error()` always
    /// agree here.
    pub fn parse(mut self, tokens: Vec<Token>) -> PipelineStage<Program> {
        match parse(&tokens, &mut self.reporter) {
            Some(program) if !self.reporter.had_error() => PipelineStage::Success {
                pipeline: self,
                data: program,
            },
            _ => PipelineStage::Failed { pipeline: self },
        }
    }

    /// Stage 4: scope/type checking, decorating every expression's
    /// `var_type` in place (spec §4.5).
    pub fn analyze(mut self, mut program: Program) -> PipelineStage<Program> {
        if analyze(&mut program, &mut self.reporter) {
            PipelineStage::Success {
                pipeline: self,
                data: program,
            }
        } else {
            PipelineStage::Failed { pipeline: self }
        }
    }

    /// Stages 5 and 6: the optional AST optimizer followed by code
    /// generation. Neither can report through the `ErrorReporter` — a
    /// failure here is the fatal, non-diagnostic exception class of
    /// spec §7, so this returns `Result` rather than another
    /// `PipelineStage`, matching `boxc_error::FatalError`'s contract.
    pub fn optimize_and_generate(
        self,
        mut program: Program,
        optimization_level: u8,
    ) -> Result<String, FatalError> {
        optimize(&mut program, optimization_level)?;
        boxc_backend::generate(&program)
    }
}

/// A stage in the pipeline: either it produced data for the next stage, or
/// the shared reporter already holds a diagnostic and the whole
/// compilation must stop (spec §5's ordering guarantee).
pub enum PipelineStage<T> {
    Success {
        pipeline: CompilationPipeline,
        data: T,
    },
    Failed {
        pipeline: CompilationPipeline,
    },
}

impl<T> PipelineStage<T> {
    /// Chains to the next stage only on success, propagating a failure
    /// without invoking `f`.
    pub fn and_then<U>(
        self,
        f: impl FnOnce(CompilationPipeline, T) -> PipelineStage<U>,
    ) -> PipelineStage<U> {
        match self {
            PipelineStage::Success { pipeline, data } => f(pipeline, data),
            PipelineStage::Failed { pipeline } => PipelineStage::Failed { pipeline },
        }
    }
}

/// The final outcome of a full compilation run.
pub enum CompilationResult {
    /// Final assembly text, ready to be written to the output path.
    Success { assembly: String },
    /// A stage recorded at least one diagnostic; it has already been
    /// rendered to stderr by the `ErrorReporter` as it was reported.
    Failed,
    /// An internal code-generator/optimizer bug (spec §7): not a
    /// diagnostic, reported as a plain fatal message instead.
    Fatal(FatalError),
}

/// Runs every stage of the pipeline up to and including code generation,
/// short-circuiting on the first diagnostic.
pub fn execute(
    pipeline: CompilationPipeline,
    source: &str,
    optimization_level: u8,
) -> CompilationResult {
    let staged = pipeline
        .preprocess(source)
        .and_then(|pipeline, text| pipeline.tokenize(&text))
        .and_then(|pipeline, tokens| pipeline.parse(tokens))
        .and_then(|pipeline, program| pipeline.analyze(program));

    match staged {
        PipelineStage::Success { pipeline, data } => {
            match pipeline.optimize_and_generate(data, optimization_level) {
                Ok(assembly) => CompilationResult::Success { assembly },
                Err(fatal) => CompilationResult::Fatal(fatal),
            }
        }
        PipelineStage::Failed { .. } => CompilationResult::Failed,
    }
}

/// Runs only the preprocess/lex/parse stages, for `--dump-ast` (spec §6):
/// the original tool prints the parse tree and exits before semantic
/// analysis ever runs.
pub fn parse_only(pipeline: CompilationPipeline, source: &str) -> Option<Program> {
    match pipeline
        .preprocess(source)
        .and_then(|pipeline, text| pipeline.tokenize(&text))
        .and_then(|pipeline, tokens| pipeline.parse(tokens))
    {
        PipelineStage::Success { data, .. } => Some(data),
        PipelineStage::Failed { .. } => None,
    }
}
