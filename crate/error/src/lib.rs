//! Diagnostics for the BoxLang4 compiler pipeline: the shared `ErrorReporter`
//! sink every stage records against, and the small typed-exception class for
//! code-generator internal bugs.

pub mod diagnostic;
pub mod fatal_error;
pub mod reporter;

pub use diagnostic::{Diagnostic, DiagnosticKind};
pub use fatal_error::FatalError;
pub use reporter::ErrorReporter;
