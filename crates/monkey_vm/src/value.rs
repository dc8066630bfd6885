use std::fmt;
use std::rc::Rc;

use indexmap::IndexMap;

use crate::code::Instructions;

pub type RcArray = Rc<Vec<Value>>;
pub type RcHash = Rc<IndexMap<HashKey, HashPair>>;

/// A compiled function body: its own instruction buffer plus the two
/// counts the VM needs to set up a call frame. Closures wrap this with
/// their captured free variables (spec.md §3/§4.3).
#[derive(Debug, Clone, PartialEq)]
pub struct CompiledFunction {
    pub instructions: Rc<Instructions>,
    pub num_locals: usize,
    pub num_parameters: usize,
}

/// A `CompiledFunction` plus the values captured from enclosing scopes at
/// the point `OpClosure` is executed.
#[derive(Debug, Clone, PartialEq)]
pub struct Closure {
    pub func: Rc<CompiledFunction>,
    pub free: Vec<Value>,
}

pub type BuiltinFn = fn(&[Value]) -> Value;

#[derive(Clone)]
pub struct Builtin {
    pub name: &'static str,
    pub func: BuiltinFn,
}

impl fmt::Debug for Builtin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Builtin({})", self.name)
    }
}

impl PartialEq for Builtin {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
    }
}

/// A key usable in a Monkey hash literal — only the primitive, hashable
/// variants of `Value` qualify (spec.md §3's hash-key table).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum HashKey {
    Int(i64),
    Bool(bool),
    Str(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct HashPair {
    pub key: Value,
    pub value: Value,
}

/// Monkey's runtime value type.
#[derive(Debug, Clone)]
pub enum Value {
    Null,
    Bool(bool),
    Int64(i64),
    Str(Rc<String>),
    Array(RcArray),
    Hash(RcHash),
    CompiledFunction(Rc<CompiledFunction>),
    Closure(Rc<Closure>),
    Builtin(Builtin),
    /// Internal sentinel used by the VM's call machinery; never reaches a
    /// running program as a value a user expression can observe.
    ReturnValue(Box<Value>),
    Error(String),
}

impl Value {
    pub fn str(s: impl Into<String>) -> Self {
        Value::Str(Rc::new(s.into()))
    }

    pub fn array(items: Vec<Value>) -> Self {
        Value::Array(Rc::new(items))
    }

    pub fn hash(pairs: IndexMap<HashKey, HashPair>) -> Self {
        Value::Hash(Rc::new(pairs))
    }

    pub fn is_truthy(&self) -> bool {
        match self {
            Value::Null => false,
            Value::Bool(b) => *b,
            _ => true,
        }
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "NULL",
            Value::Bool(_) => "BOOLEAN",
            Value::Int64(_) => "INTEGER",
            Value::Str(_) => "STRING",
            Value::Array(_) => "ARRAY",
            Value::Hash(_) => "HASH",
            Value::CompiledFunction(_) => "COMPILED_FUNCTION_OBJ",
            Value::Closure(_) => "CLOSURE",
            Value::Builtin(_) => "BUILTIN",
            Value::ReturnValue(_) => "RETURN_VALUE",
            Value::Error(_) => "ERROR",
        }
    }

    /// Converts a primitive value into a `HashKey`, for `OpHash` and index
    /// expressions over hash literals. Non-hashable variants return `None`.
    pub fn hash_key(&self) -> Option<HashKey> {
        match self {
            Value::Int64(n) => Some(HashKey::Int(*n)),
            Value::Bool(b) => Some(HashKey::Bool(*b)),
            Value::Str(s) => Some(HashKey::Str(s.as_str().to_string())),
            _ => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "null"),
            Value::Bool(b) => write!(f, "{}", b),
            Value::Int64(n) => write!(f, "{}", n),
            Value::Str(s) => write!(f, "{}", s),
            Value::Array(items) => {
                let rendered: Vec<String> = items.iter().map(|v| v.to_string()).collect();
                write!(f, "[{}]", rendered.join(", "))
            }
            Value::Hash(pairs) => {
                let rendered: Vec<String> = pairs
                    .values()
                    .map(|p| format!("{}: {}", p.key, p.value))
                    .collect();
                write!(f, "{{{}}}", rendered.join(", "))
            }
            Value::CompiledFunction(_) => write!(f, "CompiledFunction[{:p}]", self),
            Value::Closure(c) => write!(f, "Closure[{:p}]", Rc::as_ptr(c)),
            Value::Builtin(b) => write!(f, "builtin function: {}", b.name),
            Value::ReturnValue(v) => write!(f, "{}", v),
            Value::Error(msg) => write!(f, "ERROR: {}", msg),
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Null, Value::Null) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Int64(a), Value::Int64(b)) => a == b,
            (Value::Str(a), Value::Str(b)) => a == b,
            (Value::Array(a), Value::Array(b)) => a == b,
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn truthiness() {
        assert!(!Value::Null.is_truthy());
        assert!(!Value::Bool(false).is_truthy());
        assert!(Value::Bool(true).is_truthy());
        assert!(Value::Int64(0).is_truthy());
    }

    #[test]
    fn hash_key_only_for_primitives() {
        assert_eq!(Value::Int64(5).hash_key(), Some(HashKey::Int(5)));
        assert_eq!(Value::str("ab").hash_key(), Some(HashKey::Str("ab".to_string())));
        assert_eq!(Value::array(vec![]).hash_key(), None);
    }

    #[test]
    fn display_array() {
        let v = Value::array(vec![Value::Int64(1), Value::Int64(2)]);
        assert_eq!(v.to_string(), "[1, 2]");
    }

    #[test]
    fn equality_is_structural_for_primitives() {
        assert_eq!(Value::Int64(5), Value::Int64(5));
        assert_ne!(Value::Int64(5), Value::Int64(6));
        assert_eq!(Value::str("a"), Value::str("a"));
    }
}
