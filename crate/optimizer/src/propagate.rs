//! Level 3: constant propagation and dead-variable elimination (spec
//! §4.6). Requires a usage-count pass over the whole program before either
//! rewrite runs, since a variable's eligibility for propagation depends on
//! it never being reassigned anywhere in the function, not just at the
//! point of use.

use boxc_ir::ast::{
    AssignmentStmt, CaseNode, Declaration, Expression, IfStmt, Program, Statement, SwitchStmt,
    VarDeclStmt, WhileStmt,
};
use std::collections::{HashMap, HashSet};

pub fn propagate_and_eliminate(program: &mut Program) {
    let usages = count_usages(program);
    let mutated = mutated_names(program);
    let constants = collect_propagatable_constants(program, &mutated);

    for decl in &mut program.declarations {
        substitute_declaration(decl, &constants);
    }
    for decl in &mut program.declarations {
        eliminate_declaration(decl, &usages);
    }
}

fn count_usages(program: &Program) -> HashMap<String, usize> {
    let mut counts = HashMap::new();
    for decl in &program.declarations {
        match decl {
            Declaration::Function(f) => count_statements(&f.body, &mut counts),
            Declaration::Namespace(n) => {
                for f in &n.functions {
                    count_statements(&f.body, &mut counts);
                }
            }
            Declaration::Variable(v) => {
                if let Some(init) = &v.initializer {
                    count_expression(init, &mut counts);
                }
            }
        }
    }
    counts
}

fn count_statements(statements: &[Statement], counts: &mut HashMap<String, usize>) {
    for stmt in statements {
        count_statement(stmt, counts);
    }
}

fn count_statement(stmt: &Statement, counts: &mut HashMap<String, usize>) {
    match stmt {
        Statement::VarDecl(v) => {
            if let Some(init) = &v.initializer {
                count_expression(init, counts);
            }
        }
        Statement::Assignment(a) => {
            count_expression(&a.target, counts);
            count_expression(&a.value, counts);
        }
        Statement::Call(c) => {
            for arg in &c.arguments {
                count_expression(arg, counts);
            }
        }
        Statement::Asm(_) => {}
        Statement::Return(r) => {
            if let Some(value) = &r.value {
                count_expression(value, counts);
            }
        }
        Statement::If(i) => {
            count_expression(&i.condition, counts);
            count_statements(&i.then_branch, counts);
            if let Some(else_branch) = &i.else_branch {
                count_statements(else_branch, counts);
            }
        }
        Statement::While(w) => {
            count_expression(&w.condition, counts);
            count_statements(&w.body, counts);
        }
        Statement::Switch(s) => {
            count_expression(&s.expr, counts);
            for case in &s.cases {
                count_expression(&case.value, counts);
                count_statements(&case.body, counts);
            }
            if let Some(default_case) = &s.default_case {
                count_statements(default_case, counts);
            }
        }
    }
}

fn count_expression(expr: &Expression, counts: &mut HashMap<String, usize>) {
    match expr {
        Expression::VariableAccess(v) => {
            *counts.entry(v.name.clone()).or_insert(0) += 1;
        }
        Expression::Binary(b) => {
            count_expression(&b.left, counts);
            count_expression(&b.right, counts);
        }
        Expression::Unary(u) => count_expression(&u.operand, counts),
        Expression::Cast(c) => count_expression(&c.operand, counts),
        Expression::Call(c) => {
            for arg in &c.arguments {
                count_expression(arg, counts);
            }
        }
        Expression::IntegerLiteral(_) | Expression::CharacterLiteral(_) | Expression::StringLiteral(_) => {}
    }
}

/// Names that appear as the target of an ordinary `name : value;`
/// assignment anywhere in the program; these can never be constant-
/// propagated even if they happen to be initialized from a literal.
fn mutated_names(program: &Program) -> HashSet<String> {
    let mut names = HashSet::new();
    for decl in &program.declarations {
        match decl {
            Declaration::Function(f) => collect_mutations(&f.body, &mut names),
            Declaration::Namespace(n) => {
                for f in &n.functions {
                    collect_mutations(&f.body, &mut names);
                }
            }
            Declaration::Variable(_) => {}
        }
    }
    names
}

fn collect_mutations(statements: &[Statement], names: &mut HashSet<String>) {
    for stmt in statements {
        match stmt {
            Statement::Assignment(AssignmentStmt { target, .. }) => {
                if let Expression::VariableAccess(v) = target {
                    names.insert(v.name.clone());
                }
            }
            Statement::If(IfStmt {
                then_branch,
                else_branch,
                ..
            }) => {
                collect_mutations(then_branch, names);
                if let Some(else_branch) = else_branch {
                    collect_mutations(else_branch, names);
                }
            }
            Statement::While(WhileStmt { body, .. }) => collect_mutations(body, names),
            Statement::Switch(SwitchStmt {
                cases,
                default_case,
                ..
            }) => {
                for case in cases {
                    collect_mutations(&case.body, names);
                }
                if let Some(default_case) = default_case {
                    collect_mutations(default_case, names);
                }
            }
            _ => {}
        }
    }
}

/// Variables whose declaration initializes them directly from an integer
/// or character literal, and which `mutated` shows are never reassigned.
fn collect_propagatable_constants(
    program: &Program,
    mutated: &HashSet<String>,
) -> HashMap<String, Expression> {
    let mut constants = HashMap::new();
    for decl in &program.declarations {
        match decl {
            Declaration::Function(f) => collect_constants_in(&f.body, mutated, &mut constants),
            Declaration::Namespace(n) => {
                for f in &n.functions {
                    collect_constants_in(&f.body, mutated, &mut constants);
                }
            }
            Declaration::Variable(v) => record_constant(v, mutated, &mut constants),
        }
    }
    constants
}

fn collect_constants_in(
    statements: &[Statement],
    mutated: &HashSet<String>,
    constants: &mut HashMap<String, Expression>,
) {
    for stmt in statements {
        match stmt {
            Statement::VarDecl(v) => record_constant(v, mutated, constants),
            Statement::If(i) => {
                collect_constants_in(&i.then_branch, mutated, constants);
                if let Some(else_branch) = &i.else_branch {
                    collect_constants_in(else_branch, mutated, constants);
                }
            }
            Statement::While(w) => collect_constants_in(&w.body, mutated, constants),
            Statement::Switch(s) => {
                for case in &s.cases {
                    collect_constants_in(&case.body, mutated, constants);
                }
                if let Some(default_case) = &s.default_case {
                    collect_constants_in(default_case, mutated, constants);
                }
            }
            _ => {}
        }
    }
}

fn record_constant(
    v: &VarDeclStmt,
    mutated: &HashSet<String>,
    constants: &mut HashMap<String, Expression>,
) {
    if mutated.contains(&v.name) {
        return;
    }
    match &v.initializer {
        Some(expr @ Expression::IntegerLiteral(_)) | Some(expr @ Expression::CharacterLiteral(_)) => {
            constants.insert(v.name.clone(), expr.clone());
        }
        _ => {}
    }
}

fn substitute_declaration(decl: &mut Declaration, constants: &HashMap<String, Expression>) {
    match decl {
        Declaration::Function(f) => substitute_statements(&mut f.body, constants),
        Declaration::Namespace(n) => {
            for f in &mut n.functions {
                substitute_statements(&mut f.body, constants);
            }
        }
        Declaration::Variable(v) => {
            if let Some(init) = &mut v.initializer {
                substitute_expression(init, constants);
            }
        }
    }
}

fn substitute_statements(statements: &mut [Statement], constants: &HashMap<String, Expression>) {
    for stmt in statements {
        substitute_statement(stmt, constants);
    }
}

fn substitute_statement(stmt: &mut Statement, constants: &HashMap<String, Expression>) {
    match stmt {
        Statement::VarDecl(v) => {
            if let Some(init) = &mut v.initializer {
                substitute_expression(init, constants);
            }
        }
        Statement::Assignment(a) => {
            substitute_expression(&mut a.value, constants);
        }
        Statement::Call(c) => {
            for arg in &mut c.arguments {
                substitute_expression(arg, constants);
            }
        }
        Statement::Asm(_) => {}
        Statement::Return(r) => {
            if let Some(value) = &mut r.value {
                substitute_expression(value, constants);
            }
        }
        Statement::If(i) => {
            substitute_expression(&mut i.condition, constants);
            substitute_statements(&mut i.then_branch, constants);
            if let Some(else_branch) = &mut i.else_branch {
                substitute_statements(else_branch, constants);
            }
        }
        Statement::While(w) => {
            substitute_expression(&mut w.condition, constants);
            substitute_statements(&mut w.body, constants);
        }
        Statement::Switch(s) => {
            substitute_expression(&mut s.expr, constants);
            for case in &mut s.cases {
                substitute_statements(&mut case.body, constants);
            }
            if let Some(default_case) = &mut s.default_case {
                substitute_statements(default_case, constants);
            }
        }
    }
}

fn substitute_expression(expr: &mut Expression, constants: &HashMap<String, Expression>) {
    if let Expression::VariableAccess(v) = expr {
        if let Some(literal) = constants.get(&v.name) {
            *expr = literal.clone();
            return;
        }
    }
    match expr {
        Expression::Binary(b) => {
            substitute_expression(&mut b.left, constants);
            substitute_expression(&mut b.right, constants);
        }
        Expression::Unary(u) => substitute_expression(&mut u.operand, constants),
        Expression::Cast(c) => substitute_expression(&mut c.operand, constants),
        Expression::Call(c) => {
            for arg in &mut c.arguments {
                substitute_expression(arg, constants);
            }
        }
        _ => {}
    }
}

fn eliminate_declaration(decl: &mut Declaration, usages: &HashMap<String, usize>) {
    match decl {
        Declaration::Function(f) => eliminate_statements(&mut f.body, usages),
        Declaration::Namespace(n) => {
            for f in &mut n.functions {
                eliminate_statements(&mut f.body, usages);
            }
        }
        Declaration::Variable(_) => {}
    }
}

fn eliminate_statements(statements: &mut Vec<Statement>, usages: &HashMap<String, usize>) {
    for stmt in statements.iter_mut() {
        eliminate_in_nested(stmt, usages);
    }
    statements.retain(|stmt| match stmt {
        Statement::VarDecl(v) => usages.get(&v.name).copied().unwrap_or(0) > 0,
        _ => true,
    });
}

fn eliminate_in_nested(stmt: &mut Statement, usages: &HashMap<String, usize>) {
    match stmt {
        Statement::If(i) => {
            eliminate_statements(&mut i.then_branch, usages);
            if let Some(else_branch) = &mut i.else_branch {
                eliminate_statements(else_branch, usages);
            }
        }
        Statement::While(w) => eliminate_statements(&mut w.body, usages),
        Statement::Switch(s) => {
            for case in &mut s.cases {
                eliminate_statements(&mut case.body, usages);
            }
            if let Some(default_case) = &mut s.default_case {
                eliminate_statements(default_case, usages);
            }
        }
        _ => {}
    }
}
