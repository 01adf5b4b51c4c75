use crate::symbol_table::{FunctionSignature, Symbol, SymbolKind};
use crate::SymbolTable;
use std::collections::HashMap;

/// Per-compilation state threaded explicitly through the semantic analyzer
/// and code generator (spec §9: "process-wide state ... should be passed
/// explicitly as arguments or encapsulated in a per-compilation context
/// object; no module-level singletons"). Owns the scope stack and the
/// namespace path the analyzer is currently walking through.
pub struct CompilationContext {
    symbol_table: SymbolTable,
    namespace_stack: Vec<String>,
    /// Functions declared inside a namespace, additionally indexed by their
    /// fully qualified `ns::name` so an explicit `open ns::name[...]` call
    /// resolves regardless of where it is written (spec §4.4: "`::` selects
    /// a namespace prefix").
    namespaced_functions: HashMap<String, FunctionSignature>,
}

impl Default for CompilationContext {
    fn default() -> Self {
        CompilationContext::new()
    }
}

impl CompilationContext {
    pub fn new() -> Self {
        CompilationContext {
            symbol_table: SymbolTable::new(),
            namespace_stack: Vec::new(),
            namespaced_functions: HashMap::new(),
        }
    }

    pub fn push_scope(&mut self) {
        self.symbol_table.push_scope();
    }

    pub fn pop_scope(&mut self) {
        self.symbol_table.pop_scope();
    }

    pub fn enter_namespace(&mut self, name: impl Into<String>) {
        self.namespace_stack.push(name.into());
    }

    pub fn exit_namespace(&mut self) {
        self.namespace_stack.pop();
    }

    pub fn current_namespace(&self) -> Option<&str> {
        self.namespace_stack.last().map(String::as_str)
    }

    pub fn declared_in_current_scope(&self, name: &str) -> bool {
        self.symbol_table.declared_in_current_scope(name)
    }

    pub fn declare_variable(&mut self, name: impl Into<String>, ty: boxc_types::BoxType) {
        self.symbol_table.define(name, SymbolKind::Variable { ty });
    }

    /// Declares a function in the current lexical scope. When the
    /// declaration is inside a namespace, it is additionally registered
    /// under its qualified `ns::name` for out-of-namespace lookups.
    pub fn declare_function(&mut self, name: &str, signature: FunctionSignature) {
        self.symbol_table
            .define(name, SymbolKind::Function(signature.clone()));
        if let Some(ns) = self.current_namespace() {
            self.namespaced_functions
                .insert(format!("{ns}::{name}"), signature);
        }
    }

    pub fn lookup_variable(&self, name: &str) -> Option<&Symbol> {
        self.symbol_table.lookup(name)
    }

    /// Resolves a function call, honoring an explicit namespace prefix if
    /// one was given; otherwise falls back to ordinary lexical lookup.
    pub fn lookup_function(
        &self,
        namespace: Option<&str>,
        name: &str,
    ) -> Option<&FunctionSignature> {
        if let Some(ns) = namespace {
            return self.namespaced_functions.get(&format!("{ns}::{name}"));
        }
        match self.symbol_table.lookup(name)?.kind {
            SymbolKind::Function(ref signature) => Some(signature),
            SymbolKind::Variable { .. } => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use boxc_types::BoxType;

    #[test]
    fn namespaced_function_resolves_from_outside_its_namespace() {
        let mut ctx = CompilationContext::new();
        ctx.enter_namespace("math");
        ctx.push_scope();
        ctx.declare_function(
            "square",
            FunctionSignature {
                params: vec![BoxType::NUM24],
                return_type: BoxType::NUM24,
            },
        );
        ctx.pop_scope();
        ctx.exit_namespace();

        assert!(ctx.lookup_function(Some("math"), "square").is_some());
        assert!(ctx.lookup_function(None, "square").is_none());
    }

    #[test]
    fn unqualified_top_level_function_resolves() {
        let mut ctx = CompilationContext::new();
        ctx.declare_function(
            "_start",
            FunctionSignature {
                params: vec![],
                return_type: BoxType::VOID,
            },
        );
        assert!(ctx.lookup_function(None, "_start").is_some());
    }
}
