//! Textual assembly emission for the target VM (spec §4.7). The generator
//! walks the decorated AST produced by the semantic analyzer (optionally
//! rewritten by the optimizer) and never infers a type itself — every
//! expression already carries `var_type`.

use crate::frame::{collect_locals, frame_size, Local};
use crate::registers::RegisterPool;
use boxc_error::FatalError;
use boxc_ir::ast::{
    AsmStmt, AssignmentStmt, BinaryExpr, BinaryOperator, CallExpr, Declaration, Expression,
    FunctionDecl, IfStmt, Program, ReturnStmt, Statement, SwitchStmt, UnaryExpr, UnaryOperator,
    VarDeclStmt, VariableAccessExpr, WhileStmt,
};
use boxc_types::BoxType;
use std::collections::HashMap;

/// Compiles a fully decorated program to a single textual assembly listing.
pub fn generate(program: &Program) -> Result<String, FatalError> {
    let mut generator = CodeGenerator::new();
    generator.run(program)?;
    Ok(generator.finish())
}

struct CodeGenerator {
    output: Vec<String>,
    data_section: Vec<String>,
    string_counter: u32,
    namespace_stack: Vec<String>,
    label_counter: u32,
    current_function: String,
    locals: HashMap<String, Local>,
    globals: HashMap<String, BoxType>,
    register_pool: RegisterPool,
}

impl CodeGenerator {
    fn new() -> Self {
        CodeGenerator {
            output: Vec::new(),
            data_section: Vec::new(),
            string_counter: 0,
            namespace_stack: Vec::new(),
            label_counter: 0,
            current_function: String::new(),
            locals: HashMap::new(),
            globals: HashMap::new(),
            register_pool: RegisterPool::new(),
        }
    }

    fn finish(mut self) -> String {
        let mut listing = Vec::new();
        listing.push("; BoxLang4 compiled output".to_string());
        listing.push("; target: boxvm".to_string());
        listing.push("jmp func__start".to_string());
        listing.append(&mut self.output);
        if !self.data_section.is_empty() {
            listing.push("; data section".to_string());
            listing.append(&mut self.data_section);
        }
        listing.join("\n") + "\n"
    }

    fn run(&mut self, program: &Program) -> Result<(), FatalError> {
        self.collect_globals(program);
        for decl in &program.declarations {
            self.generate_declaration(decl)?;
        }
        Ok(())
    }

    fn collect_globals(&mut self, program: &Program) {
        for decl in &program.declarations {
            if let Declaration::Variable(v) = decl {
                self.globals.insert(v.name.clone(), v.declared_type.clone());
                self.data_section.push(format!(
                    "__var_{}: reserve {} bytes",
                    v.name,
                    v.declared_type.size()
                ));
            }
        }
    }

    fn generate_declaration(&mut self, decl: &Declaration) -> Result<(), FatalError> {
        match decl {
            Declaration::Function(f) => self.generate_function(f),
            Declaration::Namespace(n) => {
                self.namespace_stack.push(n.name.clone());
                for f in &n.functions {
                    self.generate_function(f)?;
                }
                self.namespace_stack.pop();
                Ok(())
            }
            // Globals never run initializer code; handled in collect_globals.
            Declaration::Variable(_) => Ok(()),
        }
    }

    fn mangled_function_name(&self, name: &str) -> String {
        let mut parts = self.namespace_stack.clone();
        parts.push(name.to_string());
        format!("func_{}", parts.join("_"))
    }

    fn generate_function(&mut self, function: &FunctionDecl) -> Result<(), FatalError> {
        self.current_function = function.name.clone();
        self.label_counter = 0;
        self.locals = collect_locals(function);

        let mangled = self.mangled_function_name(&function.name);
        self.emit(&format!("{mangled}:"));
        self.emit("psh %bp");
        self.emit("mov %bp %sp");
        let size = frame_size(&self.locals);
        if size > 0 {
            self.emit(&format!("sub %sp {size}"));
        }

        self.generate_statements(&function.body)?;

        self.emit(".end:");
        self.emit("mov %sp %bp");
        self.emit("pop %bp");
        self.emit("ret");

        self.locals.clear();
        Ok(())
    }

    fn emit(&mut self, line: &str) {
        self.output.push(line.to_string());
    }

    fn new_label(&mut self, prefix: &str) -> String {
        self.label_counter += 1;
        format!(".L{prefix}{}", self.label_counter)
    }

    fn generate_statements(&mut self, statements: &[Statement]) -> Result<(), FatalError> {
        for stmt in statements {
            self.generate_statement(stmt)?;
        }
        Ok(())
    }

    fn generate_statement(&mut self, stmt: &Statement) -> Result<(), FatalError> {
        match stmt {
            Statement::VarDecl(v) => self.generate_var_decl(v),
            Statement::Assignment(a) => self.generate_assignment(a),
            Statement::Call(c) => self.generate_call_statement(c),
            Statement::Asm(a) => self.generate_asm(a),
            Statement::Return(r) => self.generate_return(r),
            Statement::If(i) => self.generate_if(i),
            Statement::While(w) => self.generate_while(w),
            Statement::Switch(s) => self.generate_switch(s),
        }
    }

    fn generate_var_decl(&mut self, v: &VarDeclStmt) -> Result<(), FatalError> {
        let Some(init) = &v.initializer else {
            return Ok(());
        };
        self.generate_expression(init)?;
        self.emit("pop %ac");
        let ty = self.emit_variable_address(&v.name)?;
        self.emit(&format!("{} %bs %ac", store_instr(&ty)));
        Ok(())
    }

    fn generate_assignment(&mut self, a: &AssignmentStmt) -> Result<(), FatalError> {
        match &a.target {
            Expression::Unary(UnaryExpr {
                operator: UnaryOperator::Deref,
                operand,
                var_type,
                ..
            }) => {
                self.generate_expression(operand)?;
                self.emit("pop %bs");
                self.generate_expression(&a.value)?;
                self.emit("pop %ac");
                let ty = var_type.clone().unwrap_or(BoxType::NUM24);
                self.emit(&format!("{} %bs %ac", store_instr(&ty)));
                Ok(())
            }
            Expression::VariableAccess(VariableAccessExpr { name, .. }) => {
                self.generate_expression(&a.value)?;
                self.emit("pop %ac");
                let ty = self.emit_variable_address(name)?;
                self.emit(&format!("{} %bs %ac", store_instr(&ty)));
                Ok(())
            }
            other => {
                let ty = other.var_type().cloned().unwrap_or(BoxType::NUM24);
                self.generate_expression(other)?;
                self.emit("pop %bs");
                self.generate_expression(&a.value)?;
                self.emit("pop %ac");
                self.emit(&format!("{} %bs %ac", store_instr(&ty)));
                Ok(())
            }
        }
    }

    fn generate_call_statement(&mut self, call: &CallExpr) -> Result<(), FatalError> {
        self.generate_call(call)?;
        if !call.var_type.as_ref().is_some_and(BoxType::is_void) {
            self.emit("add %sp 3");
        }
        Ok(())
    }

    fn generate_return(&mut self, r: &ReturnStmt) -> Result<(), FatalError> {
        if let Some(value) = &r.value {
            self.generate_expression(value)?;
            self.emit("pop %ac");
        }
        self.emit("jmp .end");
        Ok(())
    }

    fn generate_if(&mut self, i: &IfStmt) -> Result<(), FatalError> {
        self.generate_expression(&i.condition)?;
        self.emit("pop %ac");
        self.emit("cmp %ac 0");

        match &i.else_branch {
            None => {
                let end = self.new_label("end_if");
                self.emit(&format!("je {end}"));
                self.generate_statements(&i.then_branch)?;
                self.emit(&format!("{end}:"));
            }
            Some(else_branch) => {
                let else_label = self.new_label("else");
                let end = self.new_label("end_if");
                self.emit(&format!("je {else_label}"));
                self.generate_statements(&i.then_branch)?;
                self.emit(&format!("jmp {end}"));
                self.emit(&format!("{else_label}:"));
                self.generate_statements(else_branch)?;
                self.emit(&format!("{end}:"));
            }
        }
        Ok(())
    }

    fn generate_while(&mut self, w: &WhileStmt) -> Result<(), FatalError> {
        let start = self.new_label("while");
        let end = self.new_label("end_while");
        self.emit(&format!("{start}:"));
        self.generate_expression(&w.condition)?;
        self.emit("pop %ac");
        self.emit("cmp %ac 0");
        self.emit(&format!("je {end}"));
        self.generate_statements(&w.body)?;
        self.emit(&format!("jmp {start}"));
        self.emit(&format!("{end}:"));
        Ok(())
    }

    fn generate_switch(&mut self, s: &SwitchStmt) -> Result<(), FatalError> {
        self.generate_expression(&s.expr)?;

        let mut case_labels = Vec::with_capacity(s.cases.len());
        for _ in &s.cases {
            case_labels.push(self.new_label("case"));
        }
        let default_label = self.new_label("default");
        let end = self.new_label("end_switch");

        for (case, label) in s.cases.iter().zip(&case_labels) {
            self.emit("pop %ac");
            self.emit("psh %ac");
            self.emit("psh %ac");
            self.generate_expression(&case.value)?;
            self.emit("pop %bs");
            self.emit("pop %ac");
            self.emit("cmp %ac %bs");
            self.emit(&format!("je {label}"));
        }
        self.emit("add %sp 3");
        self.emit(&format!("jmp {default_label}"));

        for (case, label) in s.cases.iter().zip(&case_labels) {
            self.emit(&format!("{label}:"));
            self.emit("add %sp 3");
            self.generate_statements(&case.body)?;
            self.emit(&format!("jmp {end}"));
        }

        self.emit(&format!("{default_label}:"));
        if let Some(default_case) = &s.default_case {
            self.generate_statements(default_case)?;
        }
        self.emit(&format!("{end}:"));
        Ok(())
    }

    fn generate_asm(&mut self, stmt: &AsmStmt) -> Result<(), FatalError> {
        let code = stmt.code.trim();

        if let Some(name) = single_psh_placeholder(code) {
            return self.generate_expression(&Expression::VariableAccess(VariableAccessExpr {
                name,
                var_type: None,
                location: stmt.location.clone(),
            }));
        }

        let mut rewritten = String::with_capacity(code.len());
        let mut acquired = Vec::new();
        let mut cursor = 0;

        while let Some(rel_open) = code[cursor..].find('(') {
            let open = cursor + rel_open;
            let Some(rel_close) = code[open..].find(')') else {
                break;
            };
            let close = open + rel_close;
            rewritten.push_str(&code[cursor..open]);
            let name = code[open + 1..close].trim();
            let reg = self.materialize_into_register(name)?;
            acquired.push(reg);
            rewritten.push_str(reg);
            cursor = close + 1;
        }
        rewritten.push_str(&code[cursor..]);

        self.emit(&rewritten);
        for reg in acquired {
            self.register_pool.release(reg);
        }
        Ok(())
    }

    fn materialize_into_register(&mut self, name: &str) -> Result<&'static str, FatalError> {
        let reg = self.register_pool.acquire()?;
        let ty = self.emit_variable_address(name)?;
        self.emit(&format!("{} %bs {reg}", load_instr(&ty)));
        Ok(reg)
    }

    /// Emits code computing `name`'s address into `%bs`, returning its type.
    fn emit_variable_address(&mut self, name: &str) -> Result<BoxType, FatalError> {
        if let Some(local) = self.locals.get(name).cloned() {
            self.emit("mov %bs %bp");
            if local.offset >= 0 {
                self.emit(&format!("add %bs {}", local.offset));
            } else {
                self.emit(&format!("sub %bs {}", -local.offset));
            }
            Ok(local.ty)
        } else if let Some(ty) = self.globals.get(name).cloned() {
            self.emit(&format!("mov %bs __var_{name}"));
            Ok(ty)
        } else {
            Err(FatalError::UnknownVariableInAsm)
        }
    }

    fn generate_expression(&mut self, expr: &Expression) -> Result<(), FatalError> {
        match expr {
            Expression::IntegerLiteral(lit) => {
                let unsigned = lit.value & 0xFF_FFFF;
                self.emit(&format!("psh {unsigned}    ; {}", lit.value));
                Ok(())
            }
            Expression::CharacterLiteral(lit) => {
                self.emit(&format!("psh {}    ; '{}'", lit.value, lit.value as char));
                Ok(())
            }
            Expression::StringLiteral(lit) => {
                let label = format!("__str_{}", self.string_counter);
                self.string_counter += 1;
                self.data_section
                    .push(format!("{label}: bytes \"{}\" 0", lit.value));
                self.emit(&format!("psh {label}"));
                Ok(())
            }
            Expression::VariableAccess(v) => {
                let ty = self.emit_variable_address(&v.name)?;
                self.emit(&format!("{} %bs %ac", load_instr(&ty)));
                self.emit("psh %ac");
                Ok(())
            }
            Expression::Binary(b) => self.generate_binary(b),
            Expression::Unary(u) => self.generate_unary(u),
            Expression::Cast(c) => self.generate_expression(&c.operand),
            Expression::Call(c) => {
                self.generate_call(c)?;
                Ok(())
            }
        }
    }

    fn generate_unary(&mut self, u: &UnaryExpr) -> Result<(), FatalError> {
        match u.operator {
            UnaryOperator::Plus => self.generate_expression(&u.operand),
            UnaryOperator::Minus => {
                self.generate_expression(&u.operand)?;
                self.emit("pop %ac");
                self.emit("neg %ac");
                self.emit("psh %ac");
                Ok(())
            }
            UnaryOperator::Deref => {
                self.generate_expression(&u.operand)?;
                self.emit("pop %bs");
                let ty = u.var_type.clone().unwrap_or(BoxType::NUM24);
                self.emit(&format!("{} %bs %ac", load_instr(&ty)));
                self.emit("psh %ac");
                Ok(())
            }
            UnaryOperator::AddressOf => {
                let Expression::VariableAccess(v) = u.operand.as_ref() else {
                    return Err(FatalError::AddressOfRequiresVariable);
                };
                self.emit_variable_address(&v.name)?;
                self.emit("psh %bs");
                Ok(())
            }
        }
    }

    fn generate_call(&mut self, call: &CallExpr) -> Result<(), FatalError> {
        for arg in call.arguments.iter().rev() {
            self.generate_expression(arg)?;
        }

        let mut parts = call.namespace.clone().into_iter().collect::<Vec<_>>();
        parts.push(call.name.clone());
        let mangled = format!("func_{}", parts.join("_"));
        self.emit(&format!("cal {mangled}"));

        let argc = call.arguments.len();
        if argc > 0 {
            self.emit(&format!("add %sp {}", argc * 3));
        }

        if !call.var_type.as_ref().is_some_and(BoxType::is_void) {
            self.emit("psh %ac");
        }
        Ok(())
    }

    fn generate_binary(&mut self, b: &BinaryExpr) -> Result<(), FatalError> {
        match b.operator {
            BinaryOperator::And => return self.generate_short_circuit(b, true),
            BinaryOperator::Or => return self.generate_short_circuit(b, false),
            _ => {}
        }

        self.generate_expression(&b.left)?;
        self.generate_expression(&b.right)?;
        self.emit("pop %bs");
        self.emit("pop %ac");

        match b.operator {
            BinaryOperator::Add => {
                self.emit("add %ac %bs");
                self.emit("psh %ac");
            }
            BinaryOperator::Subtract => {
                self.emit("sub %ac %bs");
                self.emit("psh %ac");
            }
            BinaryOperator::Multiply => {
                self.emit("mul %ac %bs");
                self.emit("psh %ac");
            }
            BinaryOperator::Divide => {
                self.emit("div %ac %bs");
                self.emit("psh %ac");
            }
            BinaryOperator::BitOr => {
                self.emit("or %ac %bs");
                self.emit("psh %ac");
            }
            BinaryOperator::BitXor => {
                self.emit("xor %ac %bs");
                self.emit("psh %ac");
            }
            BinaryOperator::Equal => self.generate_simple_comparison("je"),
            BinaryOperator::NotEqual => self.generate_simple_comparison("jne"),
            BinaryOperator::LessThan => self.generate_simple_comparison("jl"),
            BinaryOperator::GreaterThan => self.generate_simple_comparison("jg"),
            BinaryOperator::LessThanOrEqual => self.generate_complex_comparison("jl"),
            BinaryOperator::GreaterThanOrEqual => self.generate_complex_comparison("jg"),
            BinaryOperator::And | BinaryOperator::Or => unreachable!("handled above"),
        }
        Ok(())
    }

    fn generate_simple_comparison(&mut self, jump: &str) {
        let truthy = self.new_label("cmp_true");
        let end = self.new_label("cmp_end");
        self.emit("cmp %ac %bs");
        self.emit(&format!("{jump} {truthy}"));
        self.emit("psh 0");
        self.emit(&format!("jmp {end}"));
        self.emit(&format!("{truthy}:"));
        self.emit("psh 1");
        self.emit(&format!("{end}:"));
    }

    /// `<=`/`>=`: re-emits `cmp %ac %bs` between the equal-check and the
    /// strict-check jump, trusting both registers stay intact in between.
    fn generate_complex_comparison(&mut self, strict_jump: &str) {
        let truthy = self.new_label("cmp_true");
        let end = self.new_label("cmp_end");
        self.emit("cmp %ac %bs");
        self.emit(&format!("{strict_jump} {truthy}"));
        self.emit("cmp %ac %bs");
        self.emit(&format!("je {truthy}"));
        self.emit("psh 0");
        self.emit(&format!("jmp {end}"));
        self.emit(&format!("{truthy}:"));
        self.emit("psh 1");
        self.emit(&format!("{end}:"));
    }

    fn generate_short_circuit(&mut self, b: &BinaryExpr, is_and: bool) -> Result<(), FatalError> {
        let short_circuit = self.new_label(if is_and { "and_false" } else { "or_true" });
        let end = self.new_label("logic_end");

        self.generate_expression(&b.left)?;
        self.emit("pop %ac");
        self.emit("cmp %ac 0");
        self.emit(&format!(
            "{} {short_circuit}",
            if is_and { "je" } else { "jne" }
        ));

        self.generate_expression(&b.right)?;
        self.emit("pop %ac");
        self.emit("cmp %ac 0");
        self.emit(&format!(
            "{} {short_circuit}",
            if is_and { "je" } else { "jne" }
        ));

        self.emit(&format!("psh {}", if is_and { 1 } else { 0 }));
        self.emit(&format!("jmp {end}"));
        self.emit(&format!("{short_circuit}:"));
        self.emit(&format!("psh {}", if is_and { 0 } else { 1 }));
        self.emit(&format!("{end}:"));
        Ok(())
    }
}

fn load_instr(ty: &BoxType) -> &'static str {
    match ty.size() {
        2 => "lw",
        3 => "lh",
        _ => "lb",
    }
}

fn store_instr(ty: &BoxType) -> &'static str {
    match ty.size() {
        2 => "sw",
        3 => "sh",
        _ => "sb",
    }
}

/// Recognizes an asm block whose entire body is `psh (name)`, the one case
/// spec §4.7 says falls back to an ordinary variable-access emission
/// instead of register materialization.
fn single_psh_placeholder(code: &str) -> Option<String> {
    let rest = code.strip_prefix("psh")?.trim_start();
    let inner = rest.strip_prefix('(')?;
    let name = inner.strip_suffix(')')?.trim();
    if name.is_empty() || !name.chars().all(|c| c.is_alphanumeric() || c == '_') {
        return None;
    }
    Some(name.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use boxc_error::ErrorReporter;
    use boxc_frontend::{analyze, parse, tokenize};
    use boxc_optimizer::optimize;

    fn compiled(source: &str, level: u8) -> String {
        let mut reporter = ErrorReporter::new();
        let tokens = tokenize(source, "t.box", &mut reporter);
        let mut program = parse(&tokens, &mut reporter).expect("parse should succeed");
        assert!(analyze(&mut program, &mut reporter));
        optimize(&mut program, level).expect("optimization should succeed");
        generate(&program).expect("codegen should succeed")
    }

    #[test]
    fn entry_point_and_prologue_shape() {
        let asm = compiled("box _start [] -> void ( num24 x : 1 + 2; )", 1);
        assert!(asm.contains("jmp func__start"));
        assert!(asm.contains("func__start:"));
        assert!(asm.contains("sub %sp 3"));
        assert!(asm.contains("psh 3    ; 3"));
        assert!(asm.contains("mov %sp %bp"));
        assert!(asm.contains("pop %bp"));
        assert!(asm.contains("ret"));
    }

    #[test]
    fn negative_literal_uses_24bit_twos_complement() {
        let asm = compiled("box _start [] -> void ( num24 x : 0 - 5; )", 1);
        assert!(asm.contains("psh 16777211    ; -5"));
    }

    #[test]
    fn global_variable_reserves_space_and_never_initializes() {
        let asm = compiled("num24 counter : 9; box _start [] -> void ( ret; )", 0);
        assert!(asm.contains("__var_counter: reserve 3 bytes"));
        assert!(!asm.contains("9"));
    }

    #[test]
    fn switch_emits_duplicate_discard_per_case() {
        let source = "box _start [] -> void ( \
            num24 x : 2; \
            switch (x) (case 1: ret; case 2: ret; default: ret;) \
        )";
        let asm = compiled(source, 0);
        let discard_count = asm.matches("add %sp 3").count();
        assert!(discard_count >= 2);
    }

    #[test]
    fn function_call_cleans_its_own_arguments() {
        let source = "\
            box add [num24 a, num24 b] -> num24 ( ret a + b; ) \
            box _start [] -> void ( num24 r : open add[1, 2]; )\
        ";
        let asm = compiled(source, 0);
        assert!(asm.contains("cal func_add"));
        assert!(asm.contains("add %sp 6"));
    }

    #[test]
    fn unknown_asm_placeholder_is_a_fatal_error() {
        let mut reporter = ErrorReporter::new();
        let source = "box _start [] -> void ( asm [psh (nope)]; )";
        let tokens = tokenize(source, "t.box", &mut reporter);
        let mut program = parse(&tokens, &mut reporter).expect("parse should succeed");
        assert!(analyze(&mut program, &mut reporter));
        let err = generate(&program);
        assert!(matches!(err, Err(FatalError::UnknownVariableInAsm)));
    }
}
