pub mod code;
pub mod compiler;
pub mod error;
pub mod stdlib;
pub mod symbol_table;
pub mod value;
pub mod vm;

pub use compiler::{Bytecode, Compiler};
pub use error::{VmError, VmResult};
pub use value::Value;
pub use vm::Vm;

/// Compiles and runs Monkey source through the bytecode VM in one shot —
/// the entry point the `monkey` binary uses for script files.
pub fn run(source: &str) -> VmResult<Value> {
    let (program, lex_errors, parse_errors) = monkey_parser::parse(source);
    if let Some(e) = lex_errors.into_iter().next() {
        return Err(VmError::CompileError(e.to_string()));
    }
    if let Some(e) = parse_errors.into_iter().next() {
        return Err(VmError::CompileError(e.to_string()));
    }
    let bytecode = Compiler::compile(&program)?;
    let mut vm = Vm::new(bytecode);
    vm.run()?;
    Ok(vm.last_popped().clone())
}
