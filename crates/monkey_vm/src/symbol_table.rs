use std::collections::HashMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scope {
    Global,
    Local,
    Builtin,
    Free,
    Function,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Symbol {
    pub name: String,
    pub scope: Scope,
    pub index: usize,
}

/// Lexical scope chain used by the compiler to resolve identifiers to
/// `GetGlobal`/`GetLocal`/`GetBuiltin`/`GetFree` (spec.md §4.2).
///
/// `Free` symbols are never `Define`d directly — `Resolve` discovers them
/// by walking into an enclosing table and records each one in
/// `free_symbols` for the compiler to turn into an `OpGetLocal`/`OpGetFree`
/// pair in the *enclosing* scope plus a fresh `Free` symbol locally.
pub struct SymbolTable {
    pub outer: Option<Box<SymbolTable>>,
    store: HashMap<String, Symbol>,
    num_definitions: usize,
    pub free_symbols: Vec<Symbol>,
}

impl SymbolTable {
    pub fn new() -> Self {
        SymbolTable {
            outer: None,
            store: HashMap::new(),
            num_definitions: 0,
            free_symbols: Vec::new(),
        }
    }

    pub fn new_enclosed(outer: SymbolTable) -> Self {
        SymbolTable {
            outer: Some(Box::new(outer)),
            store: HashMap::new(),
            num_definitions: 0,
            free_symbols: Vec::new(),
        }
    }

    /// Drops one level of nesting, returning the enclosing table. Panics if
    /// called on the outermost table — a compiler bug, not user error.
    pub fn pop(self) -> SymbolTable {
        *self.outer.expect("pop() on outermost symbol table")
    }

    pub fn define(&mut self, name: &str) -> Symbol {
        let scope = if self.outer.is_none() { Scope::Global } else { Scope::Local };
        let symbol = Symbol { name: name.to_string(), scope, index: self.num_definitions };
        self.num_definitions += 1;
        self.store.insert(name.to_string(), symbol.clone());
        symbol
    }

    pub fn define_builtin(&mut self, index: usize, name: &str) -> Symbol {
        let symbol = Symbol { name: name.to_string(), scope: Scope::Builtin, index };
        self.store.insert(name.to_string(), symbol.clone());
        symbol
    }

    /// Defines `name` as a self-reference to the function literal currently
    /// being compiled. Shadowed by an ordinary `define` of the same name
    /// inside the function body (e.g. a parameter named the same as the fn).
    pub fn define_function_name(&mut self, name: &str) -> Symbol {
        let symbol = Symbol { name: name.to_string(), scope: Scope::Function, index: 0 };
        self.store.insert(name.to_string(), symbol.clone());
        symbol
    }

    fn define_free(&mut self, original: Symbol) -> Symbol {
        self.free_symbols.push(original.clone());
        let symbol = Symbol {
            name: original.name.clone(),
            scope: Scope::Free,
            index: self.free_symbols.len() - 1,
        };
        self.store.insert(original.name, symbol.clone());
        symbol
    }

    pub fn resolve(&mut self, name: &str) -> Option<Symbol> {
        if let Some(sym) = self.store.get(name) {
            return Some(sym.clone());
        }
        let outer = self.outer.as_mut()?;
        let sym = outer.resolve(name)?;
        match sym.scope {
            Scope::Global | Scope::Builtin => Some(sym),
            _ => Some(self.define_free(sym)),
        }
    }

    pub fn num_definitions(&self) -> usize {
        self.num_definitions
    }
}

impl Default for SymbolTable {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn define_resolve_global() {
        let mut t = SymbolTable::new();
        let a = t.define("a");
        assert_eq!(a, Symbol { name: "a".into(), scope: Scope::Global, index: 0 });
        assert_eq!(t.resolve("a"), Some(a));
    }

    #[test]
    fn resolve_nested_local() {
        let mut global = SymbolTable::new();
        global.define("a");
        let mut local = SymbolTable::new_enclosed(global);
        let b = local.define("b");
        assert_eq!(local.resolve("a").unwrap().scope, Scope::Global);
        assert_eq!(local.resolve("b"), Some(b));
    }

    #[test]
    fn resolve_free_variable_across_one_level() {
        let mut global = SymbolTable::new();
        global.define("a");
        let mut first_local = SymbolTable::new_enclosed(global);
        first_local.define("b");
        let mut second_local = SymbolTable::new_enclosed(first_local);
        second_local.define("c");

        let b = second_local.resolve("b").unwrap();
        assert_eq!(b.scope, Scope::Free);
        assert_eq!(b.index, 0);
        assert_eq!(second_local.free_symbols.len(), 1);
        assert_eq!(second_local.free_symbols[0].scope, Scope::Local);
    }

    #[test]
    fn resolve_builtin() {
        let mut t = SymbolTable::new();
        let len_sym = t.define_builtin(0, "len");
        assert_eq!(t.resolve("len"), Some(len_sym));
    }

    #[test]
    fn resolve_function_name_self_reference() {
        let mut t = SymbolTable::new();
        let f = t.define_function_name("countDown");
        assert_eq!(f.scope, Scope::Function);
        assert_eq!(t.resolve("countDown"), Some(f));
    }

    #[test]
    fn ordinary_define_shadows_function_name() {
        let mut t = SymbolTable::new();
        t.define_function_name("countDown");
        let local = t.define("countDown");
        assert_eq!(t.resolve("countDown"), Some(local));
    }
}
