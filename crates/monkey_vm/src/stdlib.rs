use crate::value::{Builtin, Value};

/// Fixed-order builtin table. Index here is the `GetBuiltin` operand, so
/// the order is load-bearing: changing it breaks any already-compiled
/// bytecode that references a builtin by index.
pub const BUILTINS: &[Builtin] = &[
    Builtin { name: "len", func: monkey_len },
    Builtin { name: "puts", func: monkey_puts },
    Builtin { name: "first", func: monkey_first },
    Builtin { name: "last", func: monkey_last },
    Builtin { name: "rest", func: monkey_rest },
    Builtin { name: "push", func: monkey_push },
];

pub fn lookup(name: &str) -> Option<usize> {
    BUILTINS.iter().position(|b| b.name == name)
}

/// Builtins never abort the VM — an argument-count or type violation
/// produces a first-class `Error` value the caller program can inspect,
/// per spec.md §4.4/§7.
fn monkey_len(args: &[Value]) -> Value {
    match args {
        [Value::Str(s)] => Value::Int64(s.len() as i64),
        [Value::Array(a)] => Value::Int64(a.len() as i64),
        [v] => Value::Error(format!("argument to `len` not supported, got {}", v.type_name())),
        _ => Value::Error(format!("wrong number of arguments. got={}, want=1", args.len())),
    }
}

fn monkey_puts(args: &[Value]) -> Value {
    for a in args {
        println!("{}", a);
    }
    Value::Null
}

fn monkey_first(args: &[Value]) -> Value {
    match args {
        [Value::Array(a)] => a.first().cloned().unwrap_or(Value::Null),
        [v] => Value::Error(format!("argument to `first` must be ARRAY, got {}", v.type_name())),
        _ => Value::Error(format!("wrong number of arguments. got={}, want=1", args.len())),
    }
}

fn monkey_last(args: &[Value]) -> Value {
    match args {
        [Value::Array(a)] => a.last().cloned().unwrap_or(Value::Null),
        [v] => Value::Error(format!("argument to `last` must be ARRAY, got {}", v.type_name())),
        _ => Value::Error(format!("wrong number of arguments. got={}, want=1", args.len())),
    }
}

fn monkey_rest(args: &[Value]) -> Value {
    match args {
        [Value::Array(a)] => {
            if a.is_empty() {
                Value::Null
            } else {
                Value::array(a[1..].to_vec())
            }
        }
        [v] => Value::Error(format!("argument to `rest` must be ARRAY, got {}", v.type_name())),
        _ => Value::Error(format!("wrong number of arguments. got={}, want=1", args.len())),
    }
}

fn monkey_push(args: &[Value]) -> Value {
    match args {
        [Value::Array(a), v] => {
            let mut items = a.as_ref().clone();
            items.push(v.clone());
            Value::array(items)
        }
        [v, _] => Value::Error(format!("argument to `push` must be ARRAY, got {}", v.type_name())),
        _ => Value::Error(format!("wrong number of arguments. got={}, want=2", args.len())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn len_of_string_and_array() {
        assert_eq!(monkey_len(&[Value::str("hello")]), Value::Int64(5));
        assert_eq!(
            monkey_len(&[Value::array(vec![Value::Int64(1), Value::Int64(2)])]),
            Value::Int64(2)
        );
    }

    #[test]
    fn len_of_string_is_byte_length_not_char_count() {
        // "café" is 4 chars but 5 bytes (é is a 2-byte UTF-8 sequence).
        assert_eq!(monkey_len(&[Value::str("café")]), Value::Int64(5));
    }

    #[test]
    fn len_rejects_wrong_type_as_error_value_not_abort() {
        assert!(matches!(monkey_len(&[Value::Int64(1)]), Value::Error(_)));
    }

    #[test]
    fn first_last_rest_on_array() {
        let arr = Value::array(vec![Value::Int64(1), Value::Int64(2), Value::Int64(3)]);
        assert_eq!(monkey_first(std::slice::from_ref(&arr)), Value::Int64(1));
        assert_eq!(monkey_last(std::slice::from_ref(&arr)), Value::Int64(3));
        assert_eq!(
            monkey_rest(std::slice::from_ref(&arr)),
            Value::array(vec![Value::Int64(2), Value::Int64(3)])
        );
    }

    #[test]
    fn rest_of_empty_array_is_null() {
        assert_eq!(monkey_rest(&[Value::array(vec![])]), Value::Null);
    }

    #[test]
    fn push_appends_without_mutating_original() {
        let arr = Value::array(vec![Value::Int64(1)]);
        let pushed = monkey_push(&[arr.clone(), Value::Int64(2)]);
        assert_eq!(pushed, Value::array(vec![Value::Int64(1), Value::Int64(2)]));
        assert_eq!(arr, Value::array(vec![Value::Int64(1)]));
    }

    #[test]
    fn lookup_returns_fixed_index() {
        assert_eq!(lookup("len"), Some(0));
        assert_eq!(lookup("push"), Some(5));
        assert_eq!(lookup("nope"), None);
    }
}
