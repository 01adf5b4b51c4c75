//! AST-level optimizer, levels 0-3 (spec §4.6). Runs after semantic
//! analysis and before code generation, rewriting the same decorated AST
//! in place; it never inserts or removes side-effecting calls.

pub mod fold;
pub mod propagate;

use boxc_error::FatalError;
use boxc_ir::ast::{Declaration, Program};

/// Rewrites `program` in place at the given optimization level. Level 0 is
/// the identity transform. Returns `Err` only for the one condition the
/// optimizer treats as a hard failure: constant-folding a division whose
/// divisor folds to the literal zero (spec §4.6).
pub fn optimize(program: &mut Program, level: u8) -> Result<(), FatalError> {
    if level == 0 {
        return Ok(());
    }

    for decl in &mut program.declarations {
        optimize_declaration(decl, level)?;
    }

    if level >= 3 {
        propagate::propagate_and_eliminate(program);
    }

    Ok(())
}

fn optimize_declaration(decl: &mut Declaration, level: u8) -> Result<(), FatalError> {
    match decl {
        Declaration::Function(f) => fold::fold_statements(&mut f.body, level),
        Declaration::Namespace(n) => {
            for f in &mut n.functions {
                fold::fold_statements(&mut f.body, level)?;
            }
            Ok(())
        }
        Declaration::Variable(v) => {
            if let Some(init) = &mut v.initializer {
                fold::fold_expression(init, level)?;
            }
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use boxc_error::ErrorReporter;
    use boxc_frontend::{analyze, parse, tokenize};

    fn optimized(source: &str, level: u8) -> Program {
        let mut reporter = ErrorReporter::new();
        let tokens = tokenize(source, "t.box", &mut reporter);
        let mut program = parse(&tokens, &mut reporter).expect("parse should succeed");
        assert!(analyze(&mut program, &mut reporter));
        optimize(&mut program, level).expect("optimization should succeed");
        program
    }

    #[test]
    fn level0_is_identity() {
        use boxc_ir::ast::{Declaration, Expression, Statement};
        let program = optimized("box main[] -> void (num24 x : 1 + 2; ret;)", 0);
        let Declaration::Function(f) = &program.declarations[0] else {
            panic!()
        };
        let Statement::VarDecl(v) = &f.body[0] else {
            panic!()
        };
        assert!(matches!(v.initializer, Some(Expression::Binary(_))));
    }

    #[test]
    fn level1_folds_constants() {
        use boxc_ir::ast::{Declaration, Expression, Statement};
        let program = optimized("box main[] -> void (num24 x : 1 + 2; ret;)", 1);
        let Declaration::Function(f) = &program.declarations[0] else {
            panic!()
        };
        let Statement::VarDecl(v) = &f.body[0] else {
            panic!()
        };
        let Some(Expression::IntegerLiteral(lit)) = &v.initializer else {
            panic!("expected folded literal")
        };
        assert_eq!(lit.value, 3);
    }

    #[test]
    fn division_by_zero_literal_is_a_hard_error() {
        let mut reporter = ErrorReporter::new();
        let tokens = tokenize("box main[] -> void (num24 x : 1 / 0; ret;)", "t.box", &mut reporter);
        let mut program = parse(&tokens, &mut reporter).expect("parse should succeed");
        assert!(analyze(&mut program, &mut reporter));
        assert!(optimize(&mut program, 1).is_err());
    }

    #[test]
    fn level2_simplifies_additive_identity() {
        use boxc_ir::ast::{Declaration, Expression, Statement};
        let program = optimized("box main[] -> void (num24 x : 1; num24 y : x + 0; ret;)", 2);
        let Declaration::Function(f) = &program.declarations[0] else {
            panic!()
        };
        let Statement::VarDecl(v) = &f.body[1] else {
            panic!()
        };
        assert!(matches!(v.initializer, Some(Expression::VariableAccess(_))));
    }

    #[test]
    fn level3_propagates_constant_into_its_use() {
        use boxc_ir::ast::{Declaration, Expression, Statement};
        let program = optimized(
            "box main[] -> void (num24 x : 5; num24 y : x + 1; ret;)",
            3,
        );
        let Declaration::Function(f) = &program.declarations[0] else {
            panic!()
        };
        let Statement::VarDecl(y) = &f.body[1] else {
            panic!("expected y's declaration")
        };
        let Some(Expression::Binary(sum)) = &y.initializer else {
            panic!("expected y's initializer to remain a binary expression")
        };
        assert!(matches!(*sum.left, Expression::IntegerLiteral(ref lit) if lit.value == 5));
    }

    #[test]
    fn level3_removes_never_used_declaration() {
        use boxc_ir::ast::Statement;
        let program = optimized("box main[] -> void (num24 z : 9; ret;)", 3);
        let boxc_ir::ast::Declaration::Function(f) = &program.declarations[0] else {
            panic!()
        };
        assert_eq!(f.body.len(), 1);
        assert!(matches!(f.body[0], Statement::Return(_)));
    }

    #[test]
    fn level3_does_not_propagate_a_mutated_variable() {
        use boxc_ir::ast::{Declaration, Expression, Statement};
        let program = optimized(
            "box main[] -> void (num24 x : 5; x : 6; num24 y : x; ret;)",
            3,
        );
        let Declaration::Function(f) = &program.declarations[0] else {
            panic!()
        };
        let Statement::VarDecl(y) = &f.body[2] else {
            panic!("expected y's declaration")
        };
        assert!(matches!(y.initializer, Some(Expression::VariableAccess(_))));
    }
}
