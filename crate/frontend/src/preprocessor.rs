//! Directive-driven text preprocessor: expands `$include`, resolves
//! `$ifdef`/`$ifndef`/`$else`/`$endif` conditional compilation, and records
//! `$define`d names (spec §4.2). Runs before the lexer sees a single byte.

use boxc_error::{DiagnosticKind, ErrorReporter};
use std::collections::HashSet;
use std::fs;
use std::path::Path;

/// Library include root for `$include <path>` (Open Question 6: a
/// configurable field rather than a hardcoded prefix).
pub struct Preprocessor<'a> {
    reporter: &'a mut ErrorReporter,
    defines: HashSet<String>,
    skip_stack: Vec<bool>,
    out: String,
    lib_root: String,
}

impl<'a> Preprocessor<'a> {
    pub fn new(reporter: &'a mut ErrorReporter) -> Self {
        Preprocessor {
            reporter,
            defines: HashSet::new(),
            skip_stack: vec![false],
            out: String::new(),
            lib_root: "lib".to_string(),
        }
    }

    pub fn with_lib_root(mut self, lib_root: impl Into<String>) -> Self {
        self.lib_root = lib_root.into();
        self
    }

    fn skipping(&self) -> bool {
        *self.skip_stack.last().expect("skip stack is never empty")
    }

    /// Processes `source`'s lines under `filename`, recursively expanding
    /// any `$include`s, and returns the concatenated, directive-free text.
    pub fn process(&mut self, source: &str, filename: &str) -> String {
        self.out.clear();
        self.process_lines(source, filename);
        std::mem::take(&mut self.out)
    }

    fn process_lines(&mut self, source: &str, filename: &str) {
        if !self.skipping() {
            self.out.push_str(&format!("$file \"{filename}\"\n"));
        }

        for (index, line) in source.lines().enumerate() {
            let line_number = index + 1;
            let trimmed = line.trim();

            if let Some(directive) = trimmed.strip_prefix('$') {
                if let Some(name) = directive.strip_prefix("ifndef ") {
                    let name = name.trim();
                    let push = self.skipping() || self.defines.contains(name);
                    self.skip_stack.push(push);
                    continue;
                }
                if let Some(name) = directive.strip_prefix("ifdef ") {
                    let name = name.trim();
                    let push = self.skipping() || !self.defines.contains(name);
                    self.skip_stack.push(push);
                    continue;
                }
                if directive.starts_with("else") {
                    let enclosing_skips = self.skip_stack.len() > 1
                        && self.skip_stack[self.skip_stack.len() - 2];
                    if !enclosing_skips {
                        if let Some(top) = self.skip_stack.last_mut() {
                            *top = !*top;
                        }
                    }
                    continue;
                }
                if directive.starts_with("endif") {
                    if self.skip_stack.len() > 1 {
                        self.skip_stack.pop();
                    }
                    continue;
                }
            }

            if self.skipping() {
                continue;
            }

            if let Some(directive) = trimmed.strip_prefix('$') {
                if let Some(rest) = directive.strip_prefix("include") {
                    self.process_include(rest, line, line_number, filename);
                    continue;
                }
                if let Some(rest) = directive.strip_prefix("define") {
                    self.process_define(rest);
                    continue;
                }
            }

            self.out.push_str(line);
            self.out.push('\n');
        }
    }

    fn process_define(&mut self, rest: &str) {
        let mut parts = rest.trim().splitn(2, ' ');
        let Some(name) = parts.next().filter(|n| !n.is_empty()) else {
            return;
        };
        self.defines.insert(name.to_string());
        let _ = parts.next().unwrap_or("1");
    }

    fn process_include(&mut self, directive: &str, raw_line: &str, line_number: usize, filename: &str) {
        let column = raw_line.find(directive).unwrap_or(0) + 1;

        let (path, resolved, column_offset) = if let (Some(start), Some(end)) =
            (directive.find('<'), directive.find('>'))
        {
            let inner = &directive[start + 1..end];
            (
                inner.to_string(),
                format!("{}/{inner}", self.lib_root),
                start + 1,
            )
        } else if let (Some(start), Some(end)) = (directive.find('"'), directive.rfind('"')) {
            if end <= start {
                self.reporter.report(
                    filename,
                    line_number,
                    column,
                    "invalid include directive",
                    DiagnosticKind::PreprocessorError,
                    Some("Usage: $include <path> or $include \"path\"".to_string()),
                );
                return;
            }
            let inner = &directive[start + 1..end];
            let resolved = match Path::new(filename).parent() {
                Some(parent) if !parent.as_os_str().is_empty() => {
                    parent.join(inner).to_string_lossy().into_owned()
                }
                _ => inner.to_string(),
            };
            (inner.to_string(), resolved, start + 1)
        } else {
            self.reporter.report(
                filename,
                line_number,
                column,
                "invalid include directive",
                DiagnosticKind::PreprocessorError,
                Some("Usage: $include <path> or $include \"path\"".to_string()),
            );
            return;
        };

        if path.is_empty() {
            self.reporter.report(
                filename,
                line_number,
                column + column_offset,
                "invalid include directive",
                DiagnosticKind::PreprocessorError,
                Some("Usage: $include <path> or $include \"path\"".to_string()),
            );
            return;
        }

        match fs::read_to_string(Path::new(&resolved)) {
            Ok(included) => {
                let lines: Vec<String> = included.lines().map(str::to_string).collect();
                self.reporter.load_source_file(resolved.clone(), lines);
                self.process_lines(&included, &resolved);
                if !self.skipping() {
                    self.out.push_str(&format!("$file \"{filename}\"\n"));
                }
            }
            Err(_) => {
                self.reporter.report(
                    filename,
                    line_number,
                    column + column_offset,
                    format!("file '{resolved}' not found"),
                    DiagnosticKind::PreprocessorError,
                    Some("Check if the file exists and the path is correct.".to_string()),
                );
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(source: &str) -> (String, bool) {
        let mut reporter = ErrorReporter::new();
        let mut pre = Preprocessor::new(&mut reporter);
        let out = pre.process(source, "main.box");
        (out, reporter.had_error())
    }

    #[test]
    fn ifdef_skips_when_undefined() {
        let (out, had_error) = run("$ifdef FOO\nbox a[];\n$endif\n");
        assert!(!had_error);
        assert!(!out.contains("box a"));
    }

    #[test]
    fn define_then_ifdef_keeps_body() {
        let (out, _) = run("$define FOO\n$ifdef FOO\nbox a[];\n$endif\n");
        assert!(out.contains("box a"));
    }

    #[test]
    fn nested_skip_is_sticky() {
        let (out, _) = run("$ifdef MISSING\n$ifndef ALSO_MISSING\nbox a[];\n$endif\n$endif\n");
        assert!(!out.contains("box a"));
    }

    #[test]
    fn else_toggles_skip() {
        let (out, _) = run("$ifdef MISSING\nbox a[];\n$else\nbox b[];\n$endif\n");
        assert!(!out.contains("box a"));
        assert!(out.contains("box b"));
    }

    #[test]
    fn missing_include_reports_preprocessor_error() {
        let (_, had_error) = run("$include \"does/not/exist.box\"\n");
        assert!(had_error);
    }

    #[test]
    fn mutual_include_guard_terminates_without_recursing_forever() {
        let dir = tempfile::tempdir().unwrap();
        let a_path = dir.path().join("a.box");
        let b_path = dir.path().join("b.box");
        std::fs::write(
            &a_path,
            "$ifndef A_H\n$define A_H\nbox a_fn[] -> void ( ret; )\n$include \"b.box\"\n$endif\n",
        )
        .unwrap();
        std::fs::write(
            &b_path,
            "$ifndef B_H\n$define B_H\nbox b_fn[] -> void ( ret; )\n$include \"a.box\"\n$endif\n",
        )
        .unwrap();

        let mut reporter = ErrorReporter::new();
        let mut pre = Preprocessor::new(&mut reporter);
        let out = pre.process(
            &std::fs::read_to_string(&a_path).unwrap(),
            a_path.to_str().unwrap(),
        );

        assert!(!reporter.had_error());
        assert_eq!(out.matches("box a_fn").count(), 1);
        assert_eq!(out.matches("box b_fn").count(), 1);
    }
}
