//! Level 1 (constant folding) and level 2 (algebraic simplification) passes
//! (spec §4.6). Both operate bottom-up over a single expression tree and
//! are applied together whenever `level >= 1`, since level 2 is additive
//! on top of level 1's folding.

use boxc_error::FatalError;
use boxc_ir::ast::{
    BinaryExpr, BinaryOperator, CaseNode, Expression, IfStmt, IntegerLiteralExpr, Statement,
    SwitchStmt, UnaryExpr, UnaryOperator, WhileStmt,
};

pub fn fold_statements(statements: &mut [Statement], level: u8) -> Result<(), FatalError> {
    for stmt in statements {
        fold_statement(stmt, level)?;
    }
    Ok(())
}

fn fold_statement(stmt: &mut Statement, level: u8) -> Result<(), FatalError> {
    match stmt {
        Statement::VarDecl(v) => {
            if let Some(init) = &mut v.initializer {
                fold_expression(init, level)?;
            }
            Ok(())
        }
        Statement::Assignment(a) => {
            fold_expression(&mut a.target, level)?;
            fold_expression(&mut a.value, level)
        }
        Statement::Call(c) => {
            for arg in &mut c.arguments {
                fold_expression(arg, level)?;
            }
            Ok(())
        }
        Statement::Asm(_) => Ok(()),
        Statement::Return(r) => match &mut r.value {
            Some(value) => fold_expression(value, level),
            None => Ok(()),
        },
        Statement::If(i) => fold_if(i, level),
        Statement::While(w) => fold_while(w, level),
        Statement::Switch(s) => fold_switch(s, level),
    }
}

fn fold_if(i: &mut IfStmt, level: u8) -> Result<(), FatalError> {
    fold_expression(&mut i.condition, level)?;
    fold_statements(&mut i.then_branch, level)?;
    if let Some(else_branch) = &mut i.else_branch {
        fold_statements(else_branch, level)?;
    }
    Ok(())
}

fn fold_while(w: &mut WhileStmt, level: u8) -> Result<(), FatalError> {
    fold_expression(&mut w.condition, level)?;
    fold_statements(&mut w.body, level)
}

fn fold_switch(s: &mut SwitchStmt, level: u8) -> Result<(), FatalError> {
    fold_expression(&mut s.expr, level)?;
    for case in &mut s.cases {
        fold_case(case, level)?;
    }
    if let Some(default_case) = &mut s.default_case {
        fold_statements(default_case, level)?;
    }
    Ok(())
}

fn fold_case(case: &mut CaseNode, level: u8) -> Result<(), FatalError> {
    fold_expression(&mut case.value, level)?;
    fold_statements(&mut case.body, level)
}

/// Folds `expr` in place, bottom-up. Literal-literal arithmetic is always
/// folded once `level >= 1`; `level >= 2` additionally simplifies the
/// algebraic identities of spec §4.6 when only one side is a literal.
pub fn fold_expression(expr: &mut Expression, level: u8) -> Result<(), FatalError> {
    match expr {
        Expression::Binary(b) => {
            fold_expression(&mut b.left, level)?;
            fold_expression(&mut b.right, level)?;
            if let Some(folded) = try_fold_binary(b, level)? {
                *expr = folded;
            }
            Ok(())
        }
        Expression::Unary(u) => {
            fold_expression(&mut u.operand, level)?;
            if let Some(folded) = try_fold_unary(u) {
                *expr = folded;
            }
            Ok(())
        }
        Expression::Cast(c) => fold_expression(&mut c.operand, level),
        Expression::Call(c) => {
            for arg in &mut c.arguments {
                fold_expression(arg, level)?;
            }
            Ok(())
        }
        Expression::IntegerLiteral(_)
        | Expression::CharacterLiteral(_)
        | Expression::StringLiteral(_)
        | Expression::VariableAccess(_) => Ok(()),
    }
}

fn as_integer_literal(expr: &Expression) -> Option<i64> {
    match expr {
        Expression::IntegerLiteral(lit) => Some(lit.value),
        _ => None,
    }
}

fn integer_literal(value: i64, template: &BinaryExpr) -> Expression {
    Expression::IntegerLiteral(IntegerLiteralExpr {
        value,
        var_type: template.var_type.clone(),
        location: template.location.clone(),
    })
}

fn try_fold_binary(b: &BinaryExpr, level: u8) -> Result<Option<Expression>, FatalError> {
    if level < 1 {
        return Ok(None);
    }

    if let (Some(left), Some(right)) = (as_integer_literal(&b.left), as_integer_literal(&b.right)) {
        let folded = match b.operator {
            BinaryOperator::Add => Some(left + right),
            BinaryOperator::Subtract => Some(left - right),
            BinaryOperator::Multiply => Some(left * right),
            BinaryOperator::Divide => {
                if right == 0 {
                    return Err(FatalError::ConstantDivisionByZero);
                }
                Some(left / right)
            }
            _ => None,
        };
        if let Some(value) = folded {
            return Ok(Some(integer_literal(value, b)));
        }
    }

    if level < 2 {
        return Ok(None);
    }

    let left_lit = as_integer_literal(&b.left);
    let right_lit = as_integer_literal(&b.right);
    let simplified = match (b.operator, left_lit, right_lit) {
        (BinaryOperator::Add, Some(0), _) => Some((*b.right).clone()),
        (BinaryOperator::Add, _, Some(0)) => Some((*b.left).clone()),
        (BinaryOperator::Subtract, _, Some(0)) => Some((*b.left).clone()),
        (BinaryOperator::Multiply, Some(1), _) => Some((*b.right).clone()),
        (BinaryOperator::Multiply, _, Some(1)) => Some((*b.left).clone()),
        (BinaryOperator::Multiply, Some(0), _) | (BinaryOperator::Multiply, _, Some(0)) => {
            Some(integer_literal(0, b))
        }
        (BinaryOperator::Divide, _, Some(1)) => Some((*b.left).clone()),
        _ => None,
    };
    Ok(simplified)
}

fn try_fold_unary(u: &UnaryExpr) -> Option<Expression> {
    let value = as_integer_literal(&u.operand)?;
    match u.operator {
        UnaryOperator::Minus => Some(Expression::IntegerLiteral(IntegerLiteralExpr {
            value: -value,
            var_type: u.var_type.clone(),
            location: u.location.clone(),
        })),
        UnaryOperator::Plus => Some((*u.operand).clone()),
        UnaryOperator::Deref | UnaryOperator::AddressOf => None,
    }
}
