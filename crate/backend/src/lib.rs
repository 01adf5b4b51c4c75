//! Textual assembly code generation (spec §4.7). Consumes a decorated
//! `Program` — semantically analyzed and optionally optimized — and
//! produces the final listing for the target VM's assembler.

pub mod codegen;
pub mod frame;
pub mod registers;

pub use codegen::generate;
