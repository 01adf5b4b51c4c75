use std::rc::Rc;

/// A position in some source file, after preprocessor expansion. `file`
/// tracks the originating file so diagnostics survive `$include` expansion
/// (spec §3, §4.2).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SourceLocation {
    pub file: Rc<str>,
    pub line: usize,
    pub column: usize,
}

impl SourceLocation {
    pub fn new(file: Rc<str>, line: usize, column: usize) -> Self {
        SourceLocation { file, line, column }
    }

    /// A location with no known origin, used for synthesized nodes that
    /// cannot fail (e.g. optimizer-folded constants); diagnostics against
    /// these omit the source-line context block per spec §4.1.
    pub fn unknown() -> Self {
        SourceLocation {
            file: Rc::from(""),
            line: 0,
            column: 0,
        }
    }
}

impl Default for SourceLocation {
    fn default() -> Self {
        SourceLocation::unknown()
    }
}
