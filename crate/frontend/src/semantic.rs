//! Single-pass semantic analysis: scope tracking, type checking, and
//! `var_type` decoration of every expression node (spec §4.5). The first
//! error aborts analysis and, through the pipeline's `had_error()` check,
//! the whole compilation.

use boxc_error::{DiagnosticKind, ErrorReporter};
use boxc_ir::ast::*;
use boxc_ir::SourceLocation;
use boxc_shared::{CompilationContext, FunctionSignature};
use boxc_types::BoxType;

/// Signals that analysis has already reported its one diagnostic and must
/// unwind to the top, mirroring the parser's abort-on-first-error policy.
struct Aborted;

pub fn analyze(program: &mut Program, reporter: &mut ErrorReporter) -> bool {
    let mut ctx = CompilationContext::new();
    let mut analyzer = SemanticAnalyzer {
        ctx: &mut ctx,
        reporter,
        current_return_type: None,
    };
    analyzer.run(program).is_ok()
}

struct SemanticAnalyzer<'a> {
    ctx: &'a mut CompilationContext,
    reporter: &'a mut ErrorReporter,
    current_return_type: Option<BoxType>,
}

impl<'a> SemanticAnalyzer<'a> {
    fn error<T>(&mut self, location: &SourceLocation, message: impl Into<String>) -> Result<T, Aborted> {
        self.reporter.report(
            location.file.to_string(),
            location.line,
            location.column,
            message,
            DiagnosticKind::SemanticError,
            None,
        );
        Err(Aborted)
    }

    fn run(&mut self, program: &mut Program) -> Result<(), Aborted> {
        self.ctx.push_scope();
        self.declare_top_level_functions(program)?;
        for decl in &mut program.declarations {
            self.analyze_declaration(decl)?;
        }
        self.ctx.pop_scope();
        Ok(())
    }

    /// Functions (including ones nested in namespaces) are declared before
    /// any body is analyzed, so forward calls and mutual recursion resolve.
    fn declare_top_level_functions(&mut self, program: &Program) -> Result<(), Aborted> {
        for decl in &program.declarations {
            match decl {
                Declaration::Function(f) => self.declare_function(f)?,
                Declaration::Namespace(n) => {
                    self.ctx.enter_namespace(n.name.clone());
                    for f in &n.functions {
                        self.declare_function(f)?;
                    }
                    self.ctx.exit_namespace();
                }
                Declaration::Variable(_) => {}
            }
        }
        Ok(())
    }

    fn declare_function(&mut self, f: &FunctionDecl) -> Result<(), Aborted> {
        if self.ctx.declared_in_current_scope(&f.name) {
            return self.error(&f.location, format!("function '{}' is already declared", f.name));
        }
        let signature = FunctionSignature {
            params: f.parameters.iter().map(|p| p.param_type.clone()).collect(),
            return_type: f.return_type.clone(),
        };
        self.ctx.declare_function(&f.name, signature);
        Ok(())
    }

    fn analyze_declaration(&mut self, decl: &mut Declaration) -> Result<(), Aborted> {
        match decl {
            Declaration::Function(f) => self.analyze_function(f),
            Declaration::Namespace(n) => self.analyze_namespace(n),
            Declaration::Variable(v) => self.analyze_var_decl(v),
        }
    }

    fn analyze_function(&mut self, f: &mut FunctionDecl) -> Result<(), Aborted> {
        self.ctx.push_scope();
        for param in &f.parameters {
            if param.param_type.is_void() {
                self.ctx.pop_scope();
                return self.error(&param.location, "'void' is not a valid parameter type");
            }
            self.ctx.declare_variable(param.name.clone(), param.param_type.clone());
        }
        let previous_return_type = self.current_return_type.replace(f.return_type.clone());
        let result = self.analyze_statements(&mut f.body);
        self.current_return_type = previous_return_type;
        self.ctx.pop_scope();
        result
    }

    fn analyze_namespace(&mut self, n: &mut NamespaceDecl) -> Result<(), Aborted> {
        self.ctx.enter_namespace(n.name.clone());
        for f in &mut n.functions {
            self.analyze_function(f)?;
        }
        self.ctx.exit_namespace();
        Ok(())
    }

    fn analyze_var_decl(&mut self, v: &mut VarDeclStmt) -> Result<(), Aborted> {
        if v.declared_type.is_void() {
            return self.error(&v.location, "'void' is not a valid variable type");
        }
        if self.ctx.declared_in_current_scope(&v.name) {
            return self.error(&v.location, format!("'{}' is already declared in this scope", v.name));
        }
        if let Some(init) = &mut v.initializer {
            let init_type = self.analyze_expression(init)?;
            self.check_assignable(&v.location, &v.declared_type, &init_type)?;
        }
        self.ctx.declare_variable(v.name.clone(), v.declared_type.clone());
        Ok(())
    }

    fn analyze_statements(&mut self, statements: &mut [Statement]) -> Result<(), Aborted> {
        for stmt in statements {
            self.analyze_statement(stmt)?;
        }
        Ok(())
    }

    fn analyze_statement(&mut self, stmt: &mut Statement) -> Result<(), Aborted> {
        match stmt {
            Statement::VarDecl(v) => self.analyze_var_decl(v),
            Statement::Assignment(a) => self.analyze_assignment(a),
            Statement::Call(c) => self.analyze_call(c).map(|_| ()),
            Statement::Asm(_) => Ok(()),
            Statement::Return(r) => self.analyze_return(r),
            Statement::If(i) => self.analyze_if(i),
            Statement::While(w) => self.analyze_while(w),
            Statement::Switch(s) => self.analyze_switch(s),
        }
    }

    fn analyze_assignment(&mut self, a: &mut AssignmentStmt) -> Result<(), Aborted> {
        let target_type = self.analyze_expression(&mut a.target)?;
        let value_type = self.analyze_expression(&mut a.value)?;
        self.check_assignable(&a.location, &target_type, &value_type)?;
        Ok(())
    }

    fn analyze_return(&mut self, r: &mut ReturnStmt) -> Result<(), Aborted> {
        let expected = self
            .current_return_type
            .clone()
            .expect("return statement analyzed outside a function");
        match (&mut r.value, expected.is_void()) {
            (None, true) => Ok(()),
            (None, false) => self.error(&r.location, "missing return value in non-void function"),
            (Some(_), true) => self.error(&r.location, "'void' function must not return a value"),
            (Some(value), false) => {
                let actual = self.analyze_expression(value)?;
                if actual != expected {
                    return self.error(
                        &r.location,
                        format!(
                            "return type mismatch: expected '{expected}' but found '{actual}'"
                        ),
                    );
                }
                Ok(())
            }
        }
    }

    fn analyze_if(&mut self, i: &mut IfStmt) -> Result<(), Aborted> {
        let cond_type = self.analyze_expression(&mut i.condition)?;
        self.check_condition(&i.location, &cond_type)?;
        self.ctx.push_scope();
        let result = self.analyze_statements(&mut i.then_branch);
        self.ctx.pop_scope();
        result?;
        if let Some(else_branch) = &mut i.else_branch {
            self.ctx.push_scope();
            let result = self.analyze_statements(else_branch);
            self.ctx.pop_scope();
            result?;
        }
        Ok(())
    }

    fn analyze_while(&mut self, w: &mut WhileStmt) -> Result<(), Aborted> {
        let cond_type = self.analyze_expression(&mut w.condition)?;
        self.check_condition(&w.location, &cond_type)?;
        self.ctx.push_scope();
        let result = self.analyze_statements(&mut w.body);
        self.ctx.pop_scope();
        result
    }

    fn analyze_switch(&mut self, s: &mut SwitchStmt) -> Result<(), Aborted> {
        let switch_type = self.analyze_expression(&mut s.expr)?;
        self.check_condition(&s.location, &switch_type)?;
        self.ctx.push_scope();
        let result = (|| {
            for case in &mut s.cases {
                let case_type = self.analyze_expression(&mut case.value)?;
                if case_type != switch_type {
                    return self.error(
                        case.value.location(),
                        format!(
                            "case value type '{case_type}' does not match switch expression type '{switch_type}'"
                        ),
                    );
                }
                self.analyze_statements(&mut case.body)?;
            }
            if let Some(default_case) = &mut s.default_case {
                self.analyze_statements(default_case)?;
            }
            Ok(())
        })();
        self.ctx.pop_scope();
        result
    }

    fn check_condition(&mut self, location: &SourceLocation, ty: &BoxType) -> Result<(), Aborted> {
        if !ty.is_numeric_or_char() {
            return self.error(
                location,
                format!("condition must be numeric or char, found '{ty}'"),
            );
        }
        Ok(())
    }

    /// Implements spec §3's assignment-compatibility rule: identical types,
    /// or `T* -> void*`. `void* -> T*` requires an explicit cast and is
    /// rejected here.
    fn check_assignable(
        &mut self,
        location: &SourceLocation,
        target: &BoxType,
        value: &BoxType,
    ) -> Result<(), Aborted> {
        if target == value {
            return Ok(());
        }
        if target.is_void_pointer() && value.is_pointer() {
            return Ok(());
        }
        self.error(
            location,
            format!("Type mismatch: cannot assign '{value}' to '{target}'."),
        )
    }

    fn analyze_expression(&mut self, expr: &mut Expression) -> Result<BoxType, Aborted> {
        let ty = match expr {
            Expression::IntegerLiteral(_) => BoxType::NUM24,
            Expression::CharacterLiteral(_) => BoxType::CHAR,
            Expression::StringLiteral(_) => BoxType::string(),
            Expression::VariableAccess(v) => self.analyze_variable_access(v)?,
            Expression::Binary(b) => self.analyze_binary(b)?,
            Expression::Unary(u) => self.analyze_unary(u)?,
            Expression::Cast(c) => self.analyze_cast(c)?,
            Expression::Call(c) => self.analyze_call(c)?,
        };
        expr.set_var_type(ty.clone());
        Ok(ty)
    }

    fn analyze_variable_access(&mut self, v: &VariableAccessExpr) -> Result<BoxType, Aborted> {
        match self.ctx.lookup_variable(&v.name) {
            Some(symbol) => match &symbol.kind {
                boxc_shared::SymbolKind::Variable { ty } => Ok(ty.clone()),
                boxc_shared::SymbolKind::Function(_) => {
                    self.error(&v.location, format!("'{}' is a function, not a variable", v.name))
                }
            },
            None => self.error(&v.location, format!("undefined variable '{}'", v.name)),
        }
    }

    fn analyze_call(&mut self, c: &mut CallExpr) -> Result<BoxType, Aborted> {
        let mut arg_types = Vec::with_capacity(c.arguments.len());
        for arg in &mut c.arguments {
            arg_types.push(self.analyze_expression(arg)?);
        }
        let signature = match self.ctx.lookup_function(c.namespace.as_deref(), &c.name) {
            Some(signature) => signature.clone(),
            None => {
                return self.error(
                    &c.location,
                    format!("Call to undeclared function '{}'.", c.name),
                );
            }
        };
        if signature.params.len() != arg_types.len() {
            return self.error(
                &c.location,
                format!(
                    "'{}' expects {} argument(s) but {} were given",
                    c.name,
                    signature.params.len(),
                    arg_types.len()
                ),
            );
        }
        for (index, (expected, actual)) in signature.params.iter().zip(arg_types.iter()).enumerate() {
            if expected != actual {
                return self.error(
                    &c.location,
                    format!(
                        "argument {} of '{}' expects '{expected}' but found '{actual}'",
                        index + 1,
                        c.name
                    ),
                );
            }
        }
        c.var_type = Some(signature.return_type.clone());
        Ok(signature.return_type)
    }

    fn analyze_unary(&mut self, u: &mut UnaryExpr) -> Result<BoxType, Aborted> {
        let operand_type = self.analyze_expression(&mut u.operand)?;
        match u.operator {
            UnaryOperator::Plus | UnaryOperator::Minus => Ok(operand_type),
            UnaryOperator::AddressOf => Ok(BoxType::pointer_to(operand_type)),
            UnaryOperator::Deref => {
                if operand_type.is_void_pointer() {
                    return self.error(&u.location, "cannot dereference 'void*'");
                }
                match operand_type.pointee() {
                    Some(pointee) => Ok(pointee.clone()),
                    None => self.error(
                        &u.location,
                        format!("cannot dereference non-pointer type '{operand_type}'"),
                    ),
                }
            }
        }
    }

    fn analyze_cast(&mut self, c: &mut CastExpr) -> Result<BoxType, Aborted> {
        self.analyze_expression(&mut c.operand)?;
        Ok(c.target_type.clone())
    }

    fn analyze_binary(&mut self, b: &mut BinaryExpr) -> Result<BoxType, Aborted> {
        let left = self.analyze_expression(&mut b.left)?;
        let right = self.analyze_expression(&mut b.right)?;

        if b.operator.yields_num24() {
            if left != right {
                return self.error(
                    &b.location,
                    format!("operands of '{}' must share a type, found '{left}' and '{right}'", b.operator),
                );
            }
            return Ok(BoxType::NUM24);
        }

        // Pointer arithmetic (spec §3): `ptr +/- int`, `int + ptr`, `ptr - ptr`.
        if matches!(b.operator, BinaryOperator::Add | BinaryOperator::Subtract) {
            if left.is_pointer() && !right.is_pointer() {
                return Ok(left);
            }
            if right.is_pointer() && !left.is_pointer() && b.operator == BinaryOperator::Add {
                return Ok(right);
            }
            if left.is_pointer() && right.is_pointer() {
                if b.operator == BinaryOperator::Subtract && left == right {
                    return Ok(BoxType::NUM24);
                }
                return self.error(
                    &b.location,
                    format!("cannot combine pointer types '{left}' and '{right}'"),
                );
            }
        }

        if left != right {
            return self.error(
                &b.location,
                format!("operands of '{}' must share a type, found '{left}' and '{right}'", b.operator),
            );
        }
        Ok(left)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexer::tokenize;
    use crate::parser::parse;

    fn analyze_source(source: &str) -> bool {
        let mut reporter = ErrorReporter::new();
        let tokens = tokenize(source, "t.box", &mut reporter);
        let mut program = parse(&tokens, &mut reporter).expect("parse should succeed");
        analyze(&mut program, &mut reporter)
    }

    #[test]
    fn well_typed_program_analyzes_cleanly() {
        assert!(analyze_source("box main[] -> num24 (num24 x : 1; ret x;)"));
    }

    #[test]
    fn void_variable_is_rejected() {
        assert!(!analyze_source("box main[] -> void (void x; ret;)"));
    }

    #[test]
    fn undefined_variable_is_rejected() {
        assert!(!analyze_source("box main[] -> void (num24 x : y; ret;)"));
    }

    #[test]
    fn redeclaration_in_same_scope_is_rejected() {
        assert!(!analyze_source(
            "box main[] -> void (num24 x : 1; num24 x : 2; ret;)"
        ));
    }

    #[test]
    fn shadowing_in_nested_scope_is_allowed() {
        assert!(analyze_source(
            "box main[] -> void (num24 x : 1; if (x) (num24 x : 2;) ret;)"
        ));
    }

    #[test]
    fn pointer_subtraction_yields_num24() {
        assert!(analyze_source(
            "box main[] -> void (num24* p; num24 n : p - p; ret;)"
        ));
    }

    #[test]
    fn pointer_to_void_pointer_assignment_is_allowed() {
        assert!(analyze_source(
            "box main[] -> void (num24 x : 1; void* p : &x; ret;)"
        ));
    }

    #[test]
    fn return_type_mismatch_is_rejected() {
        assert!(!analyze_source("box main[] -> num24 (ret;)"));
    }

    #[test]
    fn call_argument_count_mismatch_is_rejected() {
        assert!(!analyze_source(
            "box helper[num24 x] -> void (ret;) box main[] -> void (open helper[]; ret;)"
        ));
    }

    #[test]
    fn undefined_function_call_is_rejected() {
        assert!(!analyze_source("box main[] -> void (open missing[]; ret;)"));
    }
}
