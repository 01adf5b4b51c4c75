use boxc_types::BoxType;
use std::collections::HashMap;

/// A resolved signature for a declared function (spec §3: "Function
/// identifiers occupy the enclosing (namespace or program) scope").
#[derive(Debug, Clone)]
pub struct FunctionSignature {
    pub params: Vec<BoxType>,
    pub return_type: BoxType,
}

/// A symbol table entry, tagged by what kind of name it binds (spec §9:
/// "the symbol table's polymorphic entries ... should be a tagged variant
/// rather than an untyped map").
#[derive(Debug, Clone)]
pub enum SymbolKind {
    Variable { ty: BoxType },
    Function(FunctionSignature),
}

#[derive(Debug, Clone)]
pub struct Symbol {
    pub name: String,
    pub kind: SymbolKind,
}

/// One lexical scope: a flat name -> symbol mapping.
#[derive(Debug, Default)]
struct Scope {
    symbols: HashMap<String, Symbol>,
}

/// A stack of scopes implementing Box's shadowing rules: lookup walks from
/// the innermost scope outward; declaration only ever touches the
/// innermost scope (spec §3: "Shadowing across scopes is allowed;
/// redeclaration within the same scope is an error").
#[derive(Debug)]
pub struct SymbolTable {
    scopes: Vec<Scope>,
}

impl Default for SymbolTable {
    fn default() -> Self {
        SymbolTable::new()
    }
}

impl SymbolTable {
    /// A fresh table with a single (global) scope already pushed.
    pub fn new() -> Self {
        SymbolTable {
            scopes: vec![Scope::default()],
        }
    }

    pub fn push_scope(&mut self) {
        self.scopes.push(Scope::default());
    }

    pub fn pop_scope(&mut self) {
        self.scopes.pop();
        debug_assert!(!self.scopes.is_empty(), "popped the global scope");
    }

    /// `true` if `name` is already bound in the *current* (innermost)
    /// scope; does not consult enclosing scopes. Callers use this to
    /// detect redeclaration before calling `define`.
    pub fn declared_in_current_scope(&self, name: &str) -> bool {
        self.scopes
            .last()
            .expect("symbol table always has a scope")
            .symbols
            .contains_key(name)
    }

    pub fn define(&mut self, name: impl Into<String>, kind: SymbolKind) {
        let name = name.into();
        self.scopes
            .last_mut()
            .expect("symbol table always has a scope")
            .symbols
            .insert(name.clone(), Symbol { name, kind });
    }

    /// Resolves `name` against every enclosing scope, innermost first.
    pub fn lookup(&self, name: &str) -> Option<&Symbol> {
        self.scopes.iter().rev().find_map(|scope| scope.symbols.get(name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn var_ty(symbol: &Symbol) -> &BoxType {
        match &symbol.kind {
            SymbolKind::Variable { ty } => ty,
            SymbolKind::Function(_) => panic!("expected a variable symbol"),
        }
    }

    #[test]
    fn shadowing_across_scopes_is_allowed() {
        let mut table = SymbolTable::new();
        table.define("x", SymbolKind::Variable { ty: BoxType::NUM24 });
        table.push_scope();
        table.define("x", SymbolKind::Variable { ty: BoxType::CHAR });
        assert_eq!(var_ty(table.lookup("x").unwrap()), &BoxType::CHAR);
        table.pop_scope();
        assert_eq!(var_ty(table.lookup("x").unwrap()), &BoxType::NUM24);
    }

    #[test]
    fn redeclaration_in_same_scope_is_detected() {
        let mut table = SymbolTable::new();
        table.define("x", SymbolKind::Variable { ty: BoxType::NUM24 });
        assert!(table.declared_in_current_scope("x"));
    }

    #[test]
    fn lookup_misses_popped_scope() {
        let mut table = SymbolTable::new();
        table.push_scope();
        table.define("y", SymbolKind::Variable { ty: BoxType::NUM16 });
        table.pop_scope();
        assert!(table.lookup("y").is_none());
    }
}
