//! Stack-frame layout for a single function (spec §3 "Local-variable frame
//! model"). A pre-pass walks every `VarDeclStmt` reachable in the body —
//! including ones nested inside `if`/`while`/`switch` blocks — and assigns
//! each a negative offset from `%bp`; parameters get positive offsets
//! starting at `+6`, each 3 bytes wide regardless of their declared size.

use boxc_ir::ast::{CaseNode, FunctionDecl, IfStmt, Statement, SwitchStmt, WhileStmt};
use boxc_types::BoxType;
use std::collections::HashMap;

#[derive(Debug, Clone)]
pub struct Local {
    pub ty: BoxType,
    pub offset: i32,
}

/// Assigns frame offsets for one function: parameters first (positive,
/// argument-order), then every local declaration reachable from the body
/// (negative, declaration order).
pub fn collect_locals(function: &FunctionDecl) -> HashMap<String, Local> {
    let mut locals = HashMap::new();

    let mut arg_offset: i32 = 6;
    for param in &function.parameters {
        locals.insert(
            param.name.clone(),
            Local {
                ty: param.param_type.clone(),
                offset: arg_offset,
            },
        );
        arg_offset += 3;
    }

    let mut current_offset: i32 = 0;
    collect_statements(&function.body, &mut locals, &mut current_offset);
    locals
}

/// Total bytes of local storage a function's frame needs below `%bp`
/// (the prologue's `sub %sp N`).
pub fn frame_size(locals: &HashMap<String, Local>) -> i32 {
    locals
        .values()
        .filter(|local| local.offset < 0)
        .map(|local| -local.offset)
        .max()
        .unwrap_or(0)
}

fn collect_statements(
    statements: &[Statement],
    locals: &mut HashMap<String, Local>,
    current_offset: &mut i32,
) {
    for stmt in statements {
        collect_statement(stmt, locals, current_offset);
    }
}

fn collect_statement(
    stmt: &Statement,
    locals: &mut HashMap<String, Local>,
    current_offset: &mut i32,
) {
    match stmt {
        Statement::VarDecl(v) => {
            *current_offset += v.declared_type.size() as i32;
            locals.insert(
                v.name.clone(),
                Local {
                    ty: v.declared_type.clone(),
                    offset: -*current_offset,
                },
            );
        }
        Statement::If(IfStmt {
            then_branch,
            else_branch,
            ..
        }) => {
            collect_statements(then_branch, locals, current_offset);
            if let Some(else_branch) = else_branch {
                collect_statements(else_branch, locals, current_offset);
            }
        }
        Statement::While(WhileStmt { body, .. }) => {
            collect_statements(body, locals, current_offset);
        }
        Statement::Switch(SwitchStmt {
            cases,
            default_case,
            ..
        }) => {
            for CaseNode { body, .. } in cases {
                collect_statements(body, locals, current_offset);
            }
            if let Some(default_case) = default_case {
                collect_statements(default_case, locals, current_offset);
            }
        }
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use boxc_ir::ast::*;
    use boxc_ir::SourceLocation;

    fn var_decl(name: &str, ty: BoxType) -> Statement {
        Statement::VarDecl(VarDeclStmt {
            declared_type: ty,
            name: name.to_string(),
            initializer: None,
            location: SourceLocation::unknown(),
        })
    }

    #[test]
    fn locals_get_distinct_negative_offsets() {
        let function = FunctionDecl {
            name: "f".to_string(),
            parameters: vec![],
            return_type: BoxType::VOID,
            body: vec![
                var_decl("a", BoxType::CHAR),
                var_decl("b", BoxType::NUM24),
            ],
            location: SourceLocation::unknown(),
        };
        let locals = collect_locals(&function);
        assert_eq!(locals["a"].offset, -1);
        assert_eq!(locals["b"].offset, -4);
        assert_eq!(frame_size(&locals), 4);
    }

    #[test]
    fn parameters_start_at_positive_six() {
        let function = FunctionDecl {
            name: "f".to_string(),
            parameters: vec![
                Parameter {
                    name: "x".to_string(),
                    param_type: BoxType::NUM24,
                    location: SourceLocation::unknown(),
                },
                Parameter {
                    name: "y".to_string(),
                    param_type: BoxType::CHAR,
                    location: SourceLocation::unknown(),
                },
            ],
            return_type: BoxType::VOID,
            body: vec![],
            location: SourceLocation::unknown(),
        };
        let locals = collect_locals(&function);
        assert_eq!(locals["x"].offset, 6);
        assert_eq!(locals["y"].offset, 9);
    }

    #[test]
    fn nested_control_flow_locals_are_collected() {
        let function = FunctionDecl {
            name: "f".to_string(),
            parameters: vec![],
            return_type: BoxType::VOID,
            body: vec![Statement::If(IfStmt {
                condition: Expression::IntegerLiteral(IntegerLiteralExpr {
                    value: 1,
                    var_type: Some(BoxType::NUM24),
                    location: SourceLocation::unknown(),
                }),
                then_branch: vec![var_decl("inner", BoxType::NUM16)],
                else_branch: None,
                location: SourceLocation::unknown(),
            })],
            location: SourceLocation::unknown(),
        };
        let locals = collect_locals(&function);
        assert_eq!(locals["inner"].offset, -2);
    }
}
