//! monkey_repl — line-oriented REPL for the Monkey bytecode engine.
//! Persists the symbol table, constant pool, and VM globals across lines,
//! so a `let` binding on one line is visible on the next.
//! Special commands: :quit / :q, :bytecode, :constants, :help

use std::io::{self, BufRead, Write};

use monkey_vm::code::disassemble;
use monkey_vm::compiler::{Bytecode, Compiler};
use monkey_vm::symbol_table::SymbolTable;
use monkey_vm::vm::{Vm, GLOBALS_SIZE};
use monkey_vm::Value;

const BANNER: &str = r#"
  __  __             _
 |  \/  | ___  _ __  | | _____ _   _
 | |\/| |/ _ \| '_ \ | |/ / _ \ | | |
 | |  | | (_) | | | ||   <  __/ |_| |
 |_|  |_|\___/|_| |_||_|\_\___|\__, |
                                |___/
"#;

fn main() {
    println!("{}", BANNER);
    println!("  Monkey bytecode REPL — type :help for commands\n");

    let mut symbol_table = SymbolTable::new();
    for (i, b) in monkey_vm::stdlib::BUILTINS.iter().enumerate() {
        symbol_table.define_builtin(i, b.name);
    }
    let mut constants: Vec<Value> = Vec::new();
    let mut globals: Vec<Value> = std::iter::repeat_with(|| Value::Null).take(GLOBALS_SIZE).collect();
    let mut last_bytecode: Option<Bytecode> = None;

    loop {
        print!(">>> ");
        io::stdout().flush().unwrap();

        let mut line = String::new();
        match io::stdin().lock().read_line(&mut line) {
            Ok(0) => {
                println!();
                break;
            }
            Err(e) => {
                eprintln!("Error: {}", e);
                break;
            }
            Ok(_) => {}
        }

        match line.trim() {
            ":quit" | ":q" => {
                println!("Goodbye!");
                break;
            }
            ":help" => {
                print_help();
                continue;
            }
            ":bytecode" => {
                match &last_bytecode {
                    Some(bc) => print!("{}", disassemble(&bc.instructions)),
                    None => println!("  (nothing compiled yet)"),
                }
                continue;
            }
            ":constants" => {
                match &last_bytecode {
                    Some(bc) => {
                        for (i, c) in bc.constants.iter().enumerate() {
                            println!("  [{}] {}", i, c);
                        }
                    }
                    None => println!("  (nothing compiled yet)"),
                }
                continue;
            }
            "" => continue,
            _ => {}
        }

        let (program, lex_errors, parse_errors) = monkey_parser::parse(&line);
        for e in &lex_errors {
            eprintln!("  [Lex] {}", e);
        }
        for e in &parse_errors {
            eprintln!("  [Parse] {}", e);
        }
        if !lex_errors.is_empty() || !parse_errors.is_empty() {
            continue;
        }

        let compiler = Compiler::new_with_state(symbol_table, std::mem::take(&mut constants));
        let (result, returned_table) = compiler.compile_repl_line(&program);
        symbol_table = returned_table;
        let bytecode = match result {
            Ok(bc) => bc,
            Err(e) => {
                eprintln!("  [Compile] {}", e);
                continue;
            }
        };
        constants = bytecode.constants.clone();

        let mut vm = Vm::new_with_globals(
            Bytecode { instructions: bytecode.instructions.clone(), constants: bytecode.constants.clone() },
            std::mem::take(&mut globals),
        );
        match vm.run() {
            Ok(()) => println!("{}", vm.last_popped()),
            Err(e) => eprintln!("  [Runtime] {}", e),
        }
        globals = vm.globals;
        last_bytecode = Some(bytecode);
    }
}

fn print_help() {
    println!("  Monkey REPL — commands:");
    println!("  :quit / :q     Exit the REPL");
    println!("  :bytecode      Disassemble the most recently compiled line");
    println!("  :constants     Dump the constant pool of the most recently compiled line");
    println!("  :help          Show this message");
    println!();
    println!("  Bindings made with `let` persist across lines.");
}
