//! Pretty-printer for `--dump-ast`. Plain pattern matching over the AST
//! enums, no trait dispatch (spec §9: visitor dispatch is reshaped into
//! pattern matching over an enumerated variant).

use crate::ast::{
    CaseNode, Declaration, Expression, FunctionDecl, NamespaceDecl, Program, Statement,
    VarDeclStmt,
};

pub struct AstPrinter {
    indent_level: usize,
}

impl Default for AstPrinter {
    fn default() -> Self {
        AstPrinter::new()
    }
}

impl AstPrinter {
    pub fn new() -> Self {
        AstPrinter { indent_level: 0 }
    }

    pub fn print(&mut self, program: &Program) {
        println!("Program");
        self.indent_level = 1;
        for decl in &program.declarations {
            self.print_declaration(decl);
        }
    }

    fn indent(&self) -> String {
        " ".repeat(self.indent_level * 2)
    }

    fn print_declaration(&mut self, decl: &Declaration) {
        match decl {
            Declaration::Function(f) => self.print_function(f),
            Declaration::Namespace(n) => self.print_namespace(n),
            Declaration::Variable(v) => self.print_var_decl(v),
        }
    }

    fn print_function(&mut self, f: &FunctionDecl) {
        println!(
            "{}box {} [{}] -> {}",
            self.indent(),
            f.name,
            f.parameters
                .iter()
                .map(|p| format!("{} {}", p.param_type, p.name))
                .collect::<Vec<_>>()
                .join(", "),
            f.return_type
        );
        self.indent_level += 1;
        for stmt in &f.body {
            self.print_statement(stmt);
        }
        self.indent_level -= 1;
    }

    fn print_namespace(&mut self, n: &NamespaceDecl) {
        println!("{}namespace {}", self.indent(), n.name);
        self.indent_level += 1;
        for f in &n.functions {
            self.print_function(f);
        }
        self.indent_level -= 1;
    }

    fn print_var_decl(&mut self, v: &VarDeclStmt) {
        match &v.initializer {
            Some(init) => println!(
                "{}{} {} : {}",
                self.indent(),
                v.declared_type,
                v.name,
                self.fmt_expr(init)
            ),
            None => println!("{}{} {}", self.indent(), v.declared_type, v.name),
        }
    }

    fn print_statement(&mut self, stmt: &Statement) {
        match stmt {
            Statement::VarDecl(v) => self.print_var_decl(v),
            Statement::Assignment(a) => println!(
                "{}{} : {}",
                self.indent(),
                self.fmt_expr(&a.target),
                self.fmt_expr(&a.value)
            ),
            Statement::Call(c) => println!("{}{};", self.indent(), self.fmt_call(c)),
            Statement::Asm(a) => println!("{}asm [{}]", self.indent(), a.code),
            Statement::Return(r) => match &r.value {
                Some(v) => println!("{}ret {};", self.indent(), self.fmt_expr(v)),
                None => println!("{}ret;", self.indent()),
            },
            Statement::If(i) => {
                println!("{}if ({})", self.indent(), self.fmt_expr(&i.condition));
                self.indent_level += 1;
                for s in &i.then_branch {
                    self.print_statement(s);
                }
                self.indent_level -= 1;
                if let Some(else_branch) = &i.else_branch {
                    println!("{}else", self.indent());
                    self.indent_level += 1;
                    for s in else_branch {
                        self.print_statement(s);
                    }
                    self.indent_level -= 1;
                }
            }
            Statement::While(w) => {
                println!("{}while ({})", self.indent(), self.fmt_expr(&w.condition));
                self.indent_level += 1;
                for s in &w.body {
                    self.print_statement(s);
                }
                self.indent_level -= 1;
            }
            Statement::Switch(sw) => {
                println!("{}switch ({})", self.indent(), self.fmt_expr(&sw.expr));
                self.indent_level += 1;
                for case in &sw.cases {
                    self.print_case(case);
                }
                if let Some(default_case) = &sw.default_case {
                    println!("{}default:", self.indent());
                    self.indent_level += 1;
                    for s in default_case {
                        self.print_statement(s);
                    }
                    self.indent_level -= 1;
                }
                self.indent_level -= 1;
            }
        }
    }

    fn print_case(&mut self, case: &CaseNode) {
        println!("{}case {}:", self.indent(), self.fmt_expr(&case.value));
        self.indent_level += 1;
        for s in &case.body {
            self.print_statement(s);
        }
        self.indent_level -= 1;
    }

    fn fmt_call(&self, call: &crate::ast::CallExpr) -> String {
        let prefix = match &call.namespace {
            Some(ns) => format!("{ns}::"),
            None => String::new(),
        };
        let args = call
            .arguments
            .iter()
            .map(|a| self.fmt_expr(a))
            .collect::<Vec<_>>()
            .join(", ");
        format!("open {prefix}{}[{args}]", call.name)
    }

    fn fmt_expr(&self, expr: &Expression) -> String {
        match expr {
            Expression::IntegerLiteral(e) => e.value.to_string(),
            Expression::CharacterLiteral(e) => format!("'{}'", e.value as char),
            Expression::StringLiteral(e) => format!("\"{}\"", e.value),
            Expression::VariableAccess(e) => e.name.clone(),
            Expression::Binary(e) => format!(
                "({} {} {})",
                self.fmt_expr(&e.left),
                e.operator,
                self.fmt_expr(&e.right)
            ),
            Expression::Unary(e) => format!("({}{})", e.operator, self.fmt_expr(&e.operand)),
            Expression::Cast(e) => format!("(({}) {})", e.target_type, self.fmt_expr(&e.operand)),
            Expression::Call(c) => self.fmt_call(c),
        }
    }
}
