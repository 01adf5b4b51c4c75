use thiserror::Error;

/// Internal failures from the optimizer or code generator. These are not
/// diagnostics: spec §7 has code-generator bugs "surface as fatal
/// exceptions with a plain message (no diagnostic rendering) and exit code
/// 1" — the CLI prints `Display` to stderr and exits, it does not go
/// through `ErrorReporter`. The optimizer's constant-folding division by
/// zero (spec §4.6) is a hard error of the same shape.
#[derive(Debug, Error)]
pub enum FatalError {
    /// An inline-asm `(name)` placeholder did not resolve to a local or
    /// parameter in the current function (spec §9 REDESIGN FLAG).
    #[error("unknown variable in inline asm")]
    UnknownVariableInAsm,

    /// The register pool used for inline-asm materialization ran out of
    /// free registers.
    #[error("no free register available for inline asm")]
    RegisterPoolExhausted,

    /// Division by a literal zero encountered while constant-folding.
    #[error("division by zero in constant expression")]
    ConstantDivisionByZero,

    /// `&` applied to an operand that isn't a plain variable access; the
    /// semantic analyzer only checks the result type, not addressability, so
    /// this is caught at code generation time instead.
    #[error("address-of operator requires a variable operand")]
    AddressOfRequiresVariable,
}
