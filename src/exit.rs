//! Process exit codes (spec §6: "Exit codes: 0 success; 1 any failure").
//! Kept as a small enum rather than bare integers so call sites read as
//! intent, mirroring the teacher's `src/exit.rs` sysexits table, but
//! trimmed to the two codes BoxLang4 actually defines.

/// Terminate the process with `code`, after printing `message` to stderr.
pub fn with_code(code: Code, message: &str) -> ! {
    eprintln!("{message}");
    std::process::exit(code as i32);
}

#[derive(Debug, Copy, Clone)]
pub enum Code {
    Success = 0,
    Failure = 1,
}
