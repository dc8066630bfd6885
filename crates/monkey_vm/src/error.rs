use std::fmt;

#[derive(Debug, Clone, PartialEq)]
pub enum VmError {
    // ── Compile-time ──────────────────────────────────────────────────────
    UndefinedVariable(String),
    UnknownOperator(String),
    CompileError(String),

    // ── Runtime ───────────────────────────────────────────────────────────
    TypeMismatch(String),
    UnknownOperatorRuntime(String),
    NotCallable(String),
    WrongArgCount { expected: usize, got: usize },
    IndexOperatorNotSupported(String),
    UnusableHashKey(String),
    StackOverflow,
    Generic(String),
}

impl fmt::Display for VmError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VmError::UndefinedVariable(n) => write!(f, "[CompileError] undefined variable {}", n),
            VmError::UnknownOperator(op) => write!(f, "[CompileError] unknown operator: {}", op),
            VmError::CompileError(m) => write!(f, "[CompileError] {}", m),
            VmError::TypeMismatch(m) => write!(f, "[RuntimeError] type mismatch: {}", m),
            VmError::UnknownOperatorRuntime(m) => write!(f, "[RuntimeError] unknown operator: {}", m),
            VmError::NotCallable(t) => write!(f, "[RuntimeError] calling non-function and non-built-in: {}", t),
            VmError::WrongArgCount { expected, got } => write!(
                f,
                "[RuntimeError] wrong number of arguments: want={}, got={}",
                expected, got
            ),
            VmError::IndexOperatorNotSupported(t) => {
                write!(f, "[RuntimeError] index operator not supported: {}", t)
            }
            VmError::UnusableHashKey(t) => write!(f, "[RuntimeError] unusable as hash key: {}", t),
            VmError::StackOverflow => write!(f, "[RuntimeError] stack overflow"),
            VmError::Generic(m) => write!(f, "[RuntimeError] {}", m),
        }
    }
}

impl std::error::Error for VmError {}

pub type VmResult<T = crate::value::Value> = Result<T, VmError>;
