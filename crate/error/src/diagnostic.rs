use boxc_derive::NamedEnum;

/// The closed taxonomy of diagnostic kinds (spec §7). Internal code
/// generator bugs are not part of this taxonomy — they surface as a fatal
/// `BackendError` instead (spec §7: "Internal bugs in the code generator
/// surface as fatal exceptions with a plain message").
#[derive(Debug, Clone, Copy, PartialEq, Eq, NamedEnum)]
pub enum DiagnosticKind {
    #[name = "LexerError"]
    LexerError,
    #[name = "SyntaxError"]
    SyntaxError,
    #[name = "PreprocessorError"]
    PreprocessorError,
    #[name = "SemanticError"]
    SemanticError,
}

/// A single user-visible diagnostic record (spec §4.1, §9 GLOSSARY).
#[derive(Debug, Clone)]
pub struct Diagnostic {
    pub kind: DiagnosticKind,
    pub message: String,
    pub file: String,
    pub line: usize,
    pub column: usize,
    pub suggestion: Option<String>,
}

impl Diagnostic {
    pub fn new(
        kind: DiagnosticKind,
        message: impl Into<String>,
        file: impl Into<String>,
        line: usize,
        column: usize,
    ) -> Self {
        Diagnostic {
            kind,
            message: message.into(),
            file: file.into(),
            line,
            column,
            suggestion: None,
        }
    }

    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestion = Some(suggestion.into());
        self
    }

    /// Whether this diagnostic carries a known source position; diagnostics
    /// against unknown locations omit the source-line context block.
    pub fn has_known_location(&self) -> bool {
        !self.file.is_empty() && self.line > 0
    }
}
