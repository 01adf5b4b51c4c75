//! End-to-end CLI tests driving the `boxc` binary (spec §8 "Concrete
//! scenarios"), mirroring the teacher's `tests/cli/command/` layout.

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use tempfile::TempDir;

fn boxc() -> Command {
    Command::cargo_bin("boxc").unwrap()
}

#[test]
fn help_lists_usage() {
    boxc()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("Usage: boxc"));
}

#[test]
fn hello_world_compiles_successfully() {
    let dir = TempDir::new().unwrap();
    let input = dir.path().join("hello.box");
    let output = dir.path().join("hello.out");
    fs::write(&input, "box _start [] -> void ( num24 x : 1 + 2; )").unwrap();

    boxc()
        .arg(&input)
        .arg("-o")
        .arg(&output)
        .assert()
        .success()
        .stdout(predicate::str::contains("Compilation successful"));

    let assembly = fs::read_to_string(&output).unwrap();
    assert!(assembly.contains("func__start:"));
    assert!(assembly.contains("jmp func__start"));
    assert!(assembly.contains("sub %sp 3"));
}

#[test]
fn hello_world_folds_constants_at_o1() {
    let dir = TempDir::new().unwrap();
    let input = dir.path().join("hello.box");
    let output = dir.path().join("hello.out");
    fs::write(&input, "box _start [] -> void ( num24 x : 1 + 2; )").unwrap();

    boxc()
        .arg(&input)
        .arg("-o")
        .arg(&output)
        .arg("-O")
        .arg("1")
        .assert()
        .success();

    let assembly = fs::read_to_string(&output).unwrap();
    assert!(assembly.contains("psh 3"));
}

#[test]
fn default_output_path_is_a_dot_out() {
    let dir = TempDir::new().unwrap();
    let input = dir.path().join("hello.box");
    fs::write(&input, "box _start [] -> void ( ret; )").unwrap();

    boxc()
        .current_dir(&dir)
        .arg("hello.box")
        .assert()
        .success()
        .stdout(predicate::str::contains("'a.out'"));

    assert!(dir.path().join("a.out").exists());
}

#[test]
fn type_mismatch_is_a_semantic_error_and_writes_no_output() {
    let dir = TempDir::new().unwrap();
    let input = dir.path().join("bad.box");
    let output = dir.path().join("bad.out");
    fs::write(
        &input,
        "box _start [] -> void ( num24 a : 1; char c : a; )",
    )
    .unwrap();

    boxc()
        .arg(&input)
        .arg("-o")
        .arg(&output)
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains(
            "error[SemanticError]: Type mismatch: cannot assign 'num24' to 'char'.",
        ));

    assert!(!output.exists());
}

#[test]
fn undefined_function_call_is_reported() {
    let dir = TempDir::new().unwrap();
    let input = dir.path().join("bad.box");
    fs::write(&input, "box _start [] -> void ( open foo[]; )").unwrap();

    boxc()
        .arg(&input)
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains(
            "error[SemanticError]: Call to undeclared function 'foo'.",
        ));
}

#[test]
fn missing_input_file_is_a_fatal_error() {
    boxc()
        .arg("does-not-exist.box")
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("not found"));
}

#[test]
fn dump_ast_prints_tree_and_exits_before_codegen() {
    let dir = TempDir::new().unwrap();
    let input = dir.path().join("hello.box");
    fs::write(&input, "box _start [] -> void ( num24 x : 1 + 2; )").unwrap();

    boxc()
        .arg(&input)
        .arg("--dump-ast")
        .assert()
        .success()
        .stdout(predicate::str::contains("Program"))
        .stdout(predicate::str::contains("box _start"));
}

#[test]
fn syntax_error_aborts_at_first_unexpected_token() {
    let dir = TempDir::new().unwrap();
    let input = dir.path().join("bad.box");
    fs::write(&input, "box _start [] -> void ( num24 ; )").unwrap();

    boxc().arg(&input).assert().failure().code(1);
}
