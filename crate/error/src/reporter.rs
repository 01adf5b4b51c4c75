use crate::diagnostic::{Diagnostic, DiagnosticKind};
use colored::Colorize;
use std::collections::HashMap;

/// Process-wide diagnostic sink, threaded explicitly through the pipeline
/// (spec §9: "no module-level singletons"). Every stage reports through the
/// same instance so `had_error()` reflects the whole compilation so far.
#[derive(Debug, Default)]
pub struct ErrorReporter {
    sources: HashMap<String, Vec<String>>,
    diagnostics: Vec<Diagnostic>,
    had_error: bool,
}

impl ErrorReporter {
    pub fn new() -> Self {
        ErrorReporter::default()
    }

    /// Registers a source file's lines so later diagnostics against it can
    /// render the offending line (spec §4.1).
    pub fn load_source_file(&mut self, name: impl Into<String>, lines: Vec<String>) {
        self.sources.insert(name.into(), lines);
    }

    /// Records and immediately renders a diagnostic to stderr.
    pub fn report(
        &mut self,
        file: impl Into<String>,
        line: usize,
        column: usize,
        message: impl Into<String>,
        kind: DiagnosticKind,
        suggestion: Option<String>,
    ) {
        let mut diagnostic = Diagnostic::new(kind, message, file, line, column);
        if let Some(suggestion) = suggestion {
            diagnostic = diagnostic.with_suggestion(suggestion);
        }
        self.render(&diagnostic);
        self.had_error = true;
        self.diagnostics.push(diagnostic);
    }

    fn render(&self, diagnostic: &Diagnostic) {
        eprintln!(
            "{}[{}]: {}",
            "error".red().bold(),
            diagnostic.kind.name(),
            diagnostic.message
        );
        eprintln!(
            "  {} {}:{}:{}",
            "-->".blue().bold(),
            diagnostic.file,
            diagnostic.line,
            diagnostic.column
        );
        if diagnostic.has_known_location() {
            if let Some(source_line) = self
                .sources
                .get(&diagnostic.file)
                .and_then(|lines| lines.get(diagnostic.line - 1))
            {
                let source_line = source_line.trim_end();
                let gutter = diagnostic.line.to_string();
                let gutter_blank = " ".repeat(gutter.len());
                eprintln!("{gutter} | {source_line}");
                let caret_pad = " ".repeat(diagnostic.column);
                eprintln!("{gutter_blank} |{caret_pad}{}", "^".red().bold());
            }
        }
        if let Some(suggestion) = &diagnostic.suggestion {
            eprintln!("  {} {suggestion}", "= help:".green().bold());
        }
    }

    pub fn had_error(&self) -> bool {
        self.had_error
    }

    pub fn clear(&mut self) {
        self.had_error = false;
        self.diagnostics.clear();
    }

    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }
}
