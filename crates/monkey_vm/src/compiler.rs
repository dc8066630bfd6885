use std::rc::Rc;

use monkey_parser::{BlockStmt, Expr, ExprKind, InfixOp, PrefixOp, Program, Stmt, StmtKind};

use crate::code::{self, Instructions, Op};
use crate::error::{VmError, VmResult};
use crate::stdlib;
use crate::symbol_table::{Scope, SymbolTable};
use crate::value::{CompiledFunction, Value};

#[derive(Debug, Clone, Copy)]
struct EmittedInstruction {
    op: Op,
    position: usize,
}

#[derive(Default)]
struct CompilationScope {
    instructions: Instructions,
    last_instruction: Option<EmittedInstruction>,
    previous_instruction: Option<EmittedInstruction>,
}

pub struct Bytecode {
    pub instructions: Instructions,
    pub constants: Vec<Value>,
}

pub struct Compiler {
    constants: Vec<Value>,
    symbol_table: SymbolTable,
    scopes: Vec<CompilationScope>,
}

impl Compiler {
    pub fn new() -> Self {
        let mut symbol_table = SymbolTable::new();
        for (i, b) in stdlib::BUILTINS.iter().enumerate() {
            symbol_table.define_builtin(i, b.name);
        }
        Compiler {
            constants: Vec::new(),
            symbol_table,
            scopes: vec![CompilationScope::default()],
        }
    }

    pub fn compile(program: &Program) -> VmResult<Bytecode> {
        let mut c = Compiler::new();
        for stmt in &program.stmts {
            c.compile_statement(stmt)?;
        }
        Ok(Bytecode { instructions: c.current_instructions().clone(), constants: c.constants })
    }

    /// Resumes compilation with a `SymbolTable` and constant pool carried
    /// over from a previous invocation — the mechanism the REPL uses so
    /// that `let x = 5` on one line is visible, by name and by slot, to
    /// the line compiled after it.
    pub fn new_with_state(symbol_table: SymbolTable, constants: Vec<Value>) -> Self {
        Compiler { constants, symbol_table, scopes: vec![CompilationScope::default()] }
    }

    /// Compiles one REPL line against carried-over state, returning the
    /// bytecode for *just this line* and the symbol table to feed into the
    /// next call. The symbol table comes back even on a compile error, so
    /// one bad line doesn't lose previously established bindings.
    pub fn compile_repl_line(mut self, program: &Program) -> (VmResult<Bytecode>, SymbolTable) {
        for stmt in &program.stmts {
            if let Err(e) = self.compile_statement(stmt) {
                return (Err(e), self.symbol_table);
            }
        }
        let bytecode =
            Bytecode { instructions: self.current_instructions().clone(), constants: self.constants.clone() };
        (Ok(bytecode), self.symbol_table)
    }

    // ── Scope helpers ─────────────────────────────────────────────────────

    fn current_instructions(&self) -> &Instructions {
        &self.scopes.last().unwrap().instructions
    }

    fn enter_scope(&mut self) {
        self.scopes.push(CompilationScope::default());
        let outer = std::mem::replace(&mut self.symbol_table, SymbolTable::new());
        self.symbol_table = SymbolTable::new_enclosed(outer);
    }

    fn leave_scope(&mut self) -> Instructions {
        let scope = self.scopes.pop().expect("leave_scope with no scope");
        let outer = std::mem::replace(&mut self.symbol_table, SymbolTable::new());
        self.symbol_table = outer.pop();
        scope.instructions
    }

    // ── Emit ──────────────────────────────────────────────────────────────

    fn emit(&mut self, op: Op, operands: &[usize]) -> usize {
        let ins = code::make(op, operands);
        let pos = self.add_instruction(ins);
        self.set_last_instruction(op, pos);
        pos
    }

    fn add_instruction(&mut self, ins: Vec<u8>) -> usize {
        let scope = self.scopes.last_mut().unwrap();
        let pos = scope.instructions.len();
        scope.instructions.extend(ins);
        pos
    }

    fn set_last_instruction(&mut self, op: Op, position: usize) {
        let scope = self.scopes.last_mut().unwrap();
        scope.previous_instruction = scope.last_instruction.take();
        scope.last_instruction = Some(EmittedInstruction { op, position });
    }

    fn last_instruction_is(&self, op: Op) -> bool {
        match self.scopes.last().unwrap().last_instruction {
            Some(emitted) => emitted.op == op,
            None => false,
        }
    }

    fn remove_last_pop(&mut self) {
        let scope = self.scopes.last_mut().unwrap();
        let last = scope.last_instruction.expect("remove_last_pop with nothing emitted");
        scope.instructions.truncate(last.position);
        scope.last_instruction = scope.previous_instruction.take();
    }

    fn replace_instruction(&mut self, pos: usize, new_instruction: Vec<u8>) {
        let scope = self.scopes.last_mut().unwrap();
        scope.instructions[pos..pos + new_instruction.len()].copy_from_slice(&new_instruction);
    }

    fn change_operand(&mut self, op_pos: usize, operand: usize) {
        let op = Op::from_u8(self.current_instructions()[op_pos]).expect("bad opcode at patch site");
        let new_instruction = code::make(op, &[operand]);
        self.replace_instruction(op_pos, new_instruction);
    }

    fn replace_last_pop_with_return(&mut self) {
        let last_pos = self.scopes.last().unwrap().last_instruction.unwrap().position;
        let new_instruction = code::make(Op::ReturnValue, &[]);
        self.replace_instruction(last_pos, new_instruction);
        self.scopes.last_mut().unwrap().last_instruction =
            Some(EmittedInstruction { op: Op::ReturnValue, position: last_pos });
    }

    fn add_constant(&mut self, value: Value) -> usize {
        self.constants.push(value);
        self.constants.len() - 1
    }

    // ── Statements ────────────────────────────────────────────────────────

    fn compile_statement(&mut self, stmt: &Stmt) -> VmResult<()> {
        match &stmt.inner {
            StmtKind::Expr(e) => {
                self.compile_expr(e)?;
                self.emit(Op::Pop, &[]);
            }
            StmtKind::Let { name, value } => {
                // Define before compiling the RHS so `let f = fn() { f() }`
                // resolves `f` inside its own body.
                let symbol = self.symbol_table.define(name);
                self.compile_expr(value)?;
                match symbol.scope {
                    Scope::Global => {
                        self.emit(Op::SetGlobal, &[symbol.index]);
                    }
                    Scope::Local => {
                        self.emit(Op::SetLocal, &[symbol.index]);
                    }
                    _ => unreachable!("define() never produces Builtin/Free/Function scope"),
                }
            }
            StmtKind::Return(expr) => {
                match expr {
                    Some(e) => self.compile_expr(e)?,
                    None => {
                        self.emit(Op::Null, &[]);
                    }
                }
                self.emit(Op::ReturnValue, &[]);
            }
        }
        Ok(())
    }

    fn compile_block(&mut self, block: &BlockStmt) -> VmResult<()> {
        for stmt in &block.stmts {
            self.compile_statement(stmt)?;
        }
        Ok(())
    }

    // ── Expressions ───────────────────────────────────────────────────────

    fn compile_expr(&mut self, expr: &Expr) -> VmResult<()> {
        match &expr.inner {
            ExprKind::Int(n) => {
                let idx = self.add_constant(Value::Int64(*n));
                self.emit(Op::Constant, &[idx]);
            }
            ExprKind::Str(s) => {
                let idx = self.add_constant(Value::str(s.as_str()));
                self.emit(Op::Constant, &[idx]);
            }
            ExprKind::Bool(b) => {
                self.emit(if *b { Op::True } else { Op::False }, &[]);
            }
            ExprKind::Ident(name) => {
                let symbol = self
                    .symbol_table
                    .resolve(name)
                    .ok_or_else(|| VmError::UndefinedVariable(name.clone()))?;
                self.load_symbol(&symbol);
            }
            ExprKind::Prefix { op, right } => {
                self.compile_expr(right)?;
                match op {
                    PrefixOp::Not => {
                        self.emit(Op::Bang, &[]);
                    }
                    PrefixOp::Neg => {
                        self.emit(Op::Minus, &[]);
                    }
                }
            }
            ExprKind::Infix { op, left, right } => {
                self.compile_infix(*op, left, right)?;
            }
            ExprKind::If { condition, consequence, alternative } => {
                self.compile_if(condition, consequence, alternative.as_ref())?;
            }
            ExprKind::FunctionLiteral { name, params, body } => {
                self.compile_function_literal(name.as_deref(), params, body)?;
            }
            ExprKind::Call { callee, args } => {
                self.compile_expr(callee)?;
                for a in args {
                    self.compile_expr(a)?;
                }
                self.emit(Op::Call, &[args.len()]);
            }
            ExprKind::ArrayLiteral(items) => {
                for item in items {
                    self.compile_expr(item)?;
                }
                self.emit(Op::Array, &[items.len()]);
            }
            ExprKind::HashLiteral(pairs) => {
                let mut sorted = pairs.clone();
                sorted.sort_by_key(|(k, _)| format!("{:?}", k));
                for (k, v) in &sorted {
                    self.compile_expr(k)?;
                    self.compile_expr(v)?;
                }
                self.emit(Op::Hash, &[sorted.len() * 2]);
            }
            ExprKind::Index { left, index } => {
                self.compile_expr(left)?;
                self.compile_expr(index)?;
                self.emit(Op::Index, &[]);
            }
            ExprKind::Error => {
                return Err(VmError::CompileError("cannot compile error node".into()));
            }
        }
        Ok(())
    }

    fn compile_infix(&mut self, op: InfixOp, left: &Expr, right: &Expr) -> VmResult<()> {
        if op == InfixOp::Lt {
            self.compile_expr(right)?;
            self.compile_expr(left)?;
            self.emit(Op::GreaterThan, &[]);
            return Ok(());
        }
        self.compile_expr(left)?;
        self.compile_expr(right)?;
        let instr = match op {
            InfixOp::Add => Op::Add,
            InfixOp::Sub => Op::Sub,
            InfixOp::Mul => Op::Mul,
            InfixOp::Div => Op::Div,
            InfixOp::Eq => Op::Equal,
            InfixOp::NotEq => Op::NotEqual,
            InfixOp::Gt => Op::GreaterThan,
            InfixOp::Lt => unreachable!("handled above"),
        };
        self.emit(instr, &[]);
        Ok(())
    }

    fn compile_if(
        &mut self,
        condition: &Expr,
        consequence: &BlockStmt,
        alternative: Option<&BlockStmt>,
    ) -> VmResult<()> {
        self.compile_expr(condition)?;
        let jump_not_truthy_pos = self.emit(Op::JumpNotTruthy, &[9999]);

        self.compile_block(consequence)?;
        if self.last_instruction_is(Op::Pop) {
            self.remove_last_pop();
        }
        let jump_pos = self.emit(Op::Jump, &[9999]);

        let after_consequence = self.current_instructions().len();
        self.change_operand(jump_not_truthy_pos, after_consequence);

        match alternative {
            None => {
                self.emit(Op::Null, &[]);
            }
            Some(block) => {
                self.compile_block(block)?;
                if self.last_instruction_is(Op::Pop) {
                    self.remove_last_pop();
                }
            }
        }

        let after_alternative = self.current_instructions().len();
        self.change_operand(jump_pos, after_alternative);
        Ok(())
    }

    fn compile_function_literal(
        &mut self,
        name: Option<&str>,
        params: &[String],
        body: &BlockStmt,
    ) -> VmResult<()> {
        self.enter_scope();

        if let Some(n) = name {
            self.symbol_table.define_function_name(n);
        }
        for p in params {
            self.symbol_table.define(p);
        }

        self.compile_block(body)?;

        if self.last_instruction_is(Op::Pop) {
            self.replace_last_pop_with_return();
        }
        if !self.last_instruction_is(Op::ReturnValue) {
            self.emit(Op::Return, &[]);
        }

        let free_symbols = self.symbol_table.free_symbols.clone();
        let num_locals = self.symbol_table.num_definitions();
        let instructions = self.leave_scope();

        for sym in &free_symbols {
            self.load_symbol(sym);
        }

        let func = Value::CompiledFunction(Rc::new(CompiledFunction {
            instructions: Rc::new(instructions),
            num_locals,
            num_parameters: params.len(),
        }));
        let const_idx = self.add_constant(func);
        self.emit(Op::Closure, &[const_idx, free_symbols.len()]);
        Ok(())
    }

    fn load_symbol(&mut self, symbol: &crate::symbol_table::Symbol) {
        match symbol.scope {
            Scope::Global => {
                self.emit(Op::GetGlobal, &[symbol.index]);
            }
            Scope::Local => {
                self.emit(Op::GetLocal, &[symbol.index]);
            }
            Scope::Builtin => {
                self.emit(Op::GetBuiltin, &[symbol.index]);
            }
            Scope::Free => {
                self.emit(Op::GetFree, &[symbol.index]);
            }
            Scope::Function => {
                self.emit(Op::CurrentClosure, &[]);
            }
        }
    }
}

impl Default for Compiler {
    fn default() -> Self {
        Self::new()
    }
}
