use std::rc::Rc;

use indexmap::IndexMap;

use crate::code::{read_u16, read_u8, Op};
use crate::compiler::Bytecode;
use crate::error::{VmError, VmResult};
use crate::stdlib;
use crate::value::{Closure, CompiledFunction, HashPair, Value};

pub const STACK_SIZE: usize = 2048;
pub const GLOBALS_SIZE: usize = 65536;
pub const MAX_FRAMES: usize = 1024;

struct Frame {
    closure: Rc<Closure>,
    ip: usize,
    base_pointer: usize,
}

impl Frame {
    fn instructions(&self) -> &[u8] {
        &self.closure.func.instructions
    }
}

pub struct Vm {
    constants: Vec<Value>,
    stack: Vec<Value>,
    sp: usize,
    pub globals: Vec<Value>,
    frames: Vec<Frame>,
}

impl Vm {
    pub fn new(bytecode: Bytecode) -> Self {
        let mut globals = Vec::with_capacity(GLOBALS_SIZE);
        globals.resize(GLOBALS_SIZE, Value::Null);
        Vm::new_with_globals(bytecode, globals)
    }

    /// Constructs a VM that shares an existing globals vector — the
    /// mechanism the REPL uses to persist `let` bindings across lines.
    pub fn new_with_globals(bytecode: Bytecode, globals: Vec<Value>) -> Self {
        let main_fn = CompiledFunction {
            instructions: Rc::new(bytecode.instructions),
            num_locals: 0,
            num_parameters: 0,
        };
        let main_closure = Rc::new(Closure { func: Rc::new(main_fn), free: Vec::new() });
        let mut stack = Vec::with_capacity(STACK_SIZE);
        stack.resize(STACK_SIZE, Value::Null);
        Vm {
            constants: bytecode.constants,
            stack,
            sp: 0,
            globals,
            frames: vec![Frame { closure: main_closure, ip: 0, base_pointer: 0 }],
        }
    }

    pub fn last_popped(&self) -> &Value {
        &self.stack[self.sp]
    }

    fn current_frame(&mut self) -> &mut Frame {
        self.frames.last_mut().unwrap()
    }

    fn push_frame(&mut self, frame: Frame) -> VmResult<()> {
        if self.frames.len() >= MAX_FRAMES {
            return Err(VmError::StackOverflow);
        }
        self.frames.push(frame);
        Ok(())
    }

    fn pop_frame(&mut self) -> Frame {
        self.frames.pop().expect("pop_frame on empty frame stack")
    }

    fn push(&mut self, v: Value) -> VmResult<()> {
        if self.sp >= STACK_SIZE {
            return Err(VmError::StackOverflow);
        }
        self.stack[self.sp] = v;
        self.sp += 1;
        Ok(())
    }

    fn pop(&mut self) -> Value {
        let v = std::mem::replace(&mut self.stack[self.sp - 1], Value::Null);
        self.sp -= 1;
        v
    }

    pub fn run(&mut self) -> VmResult<()> {
        while self.current_frame_ip() < self.current_frame_instructions_len() {
            let ip = self.current_frame_ip();
            let ins_byte = self.frames.last().unwrap().instructions()[ip];
            let op = Op::from_u8(ins_byte)
                .ok_or_else(|| VmError::Generic(format!("bad opcode {}", ins_byte)))?;
            self.current_frame().ip += 1;

            match op {
                Op::Constant => {
                    let idx = self.read_u16_operand();
                    let v = self.constants[idx as usize].clone();
                    self.push(v)?;
                }
                Op::Add | Op::Sub | Op::Mul | Op::Div => self.exec_binary_op(op)?,
                Op::True => self.push(Value::Bool(true))?,
                Op::False => self.push(Value::Bool(false))?,
                Op::Null => self.push(Value::Null)?,
                Op::Pop => {
                    self.pop();
                }
                Op::Equal | Op::NotEqual | Op::GreaterThan => self.exec_comparison(op)?,
                Op::Bang => {
                    let v = self.pop();
                    self.push(Value::Bool(!v.is_truthy()))?;
                }
                Op::Minus => {
                    let v = self.pop();
                    match v {
                        Value::Int64(n) => self.push(Value::Int64(-n))?,
                        other => {
                            return Err(VmError::TypeMismatch(format!(
                                "unsupported type for negation: {}",
                                other.type_name()
                            )))
                        }
                    }
                }
                Op::JumpNotTruthy => {
                    let target = self.read_u16_operand() as usize;
                    let cond = self.pop();
                    if !cond.is_truthy() {
                        self.current_frame().ip = target;
                    }
                }
                Op::Jump => {
                    let target = self.read_u16_operand() as usize;
                    self.current_frame().ip = target;
                }
                Op::SetGlobal => {
                    let idx = self.read_u16_operand() as usize;
                    let v = self.pop();
                    self.globals[idx] = v;
                }
                Op::GetGlobal => {
                    let idx = self.read_u16_operand() as usize;
                    self.push(self.globals[idx].clone())?;
                }
                Op::SetLocal => {
                    let idx = self.read_u8_operand() as usize;
                    let base = self.frames.last().unwrap().base_pointer;
                    let v = self.pop();
                    self.stack[base + idx] = v;
                }
                Op::GetLocal => {
                    let idx = self.read_u8_operand() as usize;
                    let base = self.frames.last().unwrap().base_pointer;
                    self.push(self.stack[base + idx].clone())?;
                }
                Op::GetBuiltin => {
                    let idx = self.read_u8_operand() as usize;
                    let b = stdlib::BUILTINS[idx].clone();
                    self.push(Value::Builtin(b))?;
                }
                Op::Array => {
                    let count = self.read_u16_operand() as usize;
                    let start = self.sp - count;
                    let items = self.stack[start..self.sp].to_vec();
                    self.sp = start;
                    self.push(Value::array(items))?;
                }
                Op::Hash => {
                    let count = self.read_u16_operand() as usize;
                    let start = self.sp - count;
                    let mut pairs = IndexMap::new();
                    let mut i = start;
                    while i < self.sp {
                        let key = self.stack[i].clone();
                        let value = self.stack[i + 1].clone();
                        let hash_key = key
                            .hash_key()
                            .ok_or_else(|| VmError::UnusableHashKey(key.type_name().to_string()))?;
                        pairs.insert(hash_key, HashPair { key, value });
                        i += 2;
                    }
                    self.sp = start;
                    self.push(Value::hash(pairs))?;
                }
                Op::Index => {
                    let index = self.pop();
                    let left = self.pop();
                    self.exec_index(left, index)?;
                }
                Op::Call => {
                    let argc = self.read_u8_operand() as usize;
                    self.exec_call(argc)?;
                }
                Op::ReturnValue => {
                    let result = self.pop();
                    let frame = self.pop_frame();
                    self.sp = frame.base_pointer - 1;
                    self.push(result)?;
                }
                Op::Return => {
                    let frame = self.pop_frame();
                    self.sp = frame.base_pointer - 1;
                    self.push(Value::Null)?;
                }
                Op::Closure => {
                    let const_idx = self.read_u16_operand() as usize;
                    let num_free = self.read_u8_operand() as usize;
                    let func = match &self.constants[const_idx] {
                        Value::CompiledFunction(f) => Rc::clone(f),
                        other => {
                            return Err(VmError::Generic(format!(
                                "not a function: {}",
                                other.type_name()
                            )))
                        }
                    };
                    let start = self.sp - num_free;
                    let free = self.stack[start..self.sp].to_vec();
                    self.sp = start;
                    self.push(Value::Closure(Rc::new(Closure { func, free })))?;
                }
                Op::GetFree => {
                    let idx = self.read_u8_operand() as usize;
                    let v = self.frames.last().unwrap().closure.free[idx].clone();
                    self.push(v)?;
                }
                Op::CurrentClosure => {
                    let closure = Rc::clone(&self.frames.last().unwrap().closure);
                    self.push(Value::Closure(closure))?;
                }
            }
        }
        Ok(())
    }

    // ── Operand reading ───────────────────────────────────────────────────

    fn current_frame_ip(&self) -> usize {
        self.frames.last().unwrap().ip
    }

    fn current_frame_instructions_len(&self) -> usize {
        self.frames.last().unwrap().instructions().len()
    }

    fn read_u16_operand(&mut self) -> u16 {
        let frame = self.frames.last().unwrap();
        let v = read_u16(frame.instructions(), frame.ip);
        self.current_frame().ip += 2;
        v
    }

    fn read_u8_operand(&mut self) -> u8 {
        let frame = self.frames.last().unwrap();
        let v = read_u8(frame.instructions(), frame.ip);
        self.current_frame().ip += 1;
        v
    }

    // ── Arithmetic / comparison ───────────────────────────────────────────

    fn exec_binary_op(&mut self, op: Op) -> VmResult<()> {
        let right = self.pop();
        let left = self.pop();
        match (&left, &right) {
            (Value::Int64(a), Value::Int64(b)) => {
                let result = match op {
                    Op::Add => a + b,
                    Op::Sub => a - b,
                    Op::Mul => a * b,
                    Op::Div => a / b,
                    _ => unreachable!(),
                };
                self.push(Value::Int64(result))
            }
            (Value::Str(a), Value::Str(b)) if op == Op::Add => {
                self.push(Value::str(format!("{}{}", a, b)))
            }
            _ => Err(VmError::TypeMismatch(format!(
                "{} {:?} {}",
                left.type_name(),
                op,
                right.type_name()
            ))),
        }
    }

    fn exec_comparison(&mut self, op: Op) -> VmResult<()> {
        let right = self.pop();
        let left = self.pop();
        match (&left, &right) {
            (Value::Int64(a), Value::Int64(b)) => {
                let result = match op {
                    Op::Equal => a == b,
                    Op::NotEqual => a != b,
                    Op::GreaterThan => a > b,
                    _ => unreachable!(),
                };
                self.push(Value::Bool(result))
            }
            _ => match op {
                Op::Equal => self.push(Value::Bool(left == right)),
                Op::NotEqual => self.push(Value::Bool(left != right)),
                _ => Err(VmError::TypeMismatch(format!(
                    "{} {:?} {}",
                    left.type_name(),
                    op,
                    right.type_name()
                ))),
            },
        }
    }

    fn exec_index(&mut self, left: Value, index: Value) -> VmResult<()> {
        match (&left, &index) {
            (Value::Array(items), Value::Int64(i)) => {
                let v = if *i < 0 || *i as usize >= items.len() {
                    Value::Null
                } else {
                    items[*i as usize].clone()
                };
                self.push(v)
            }
            (Value::Hash(pairs), key) => {
                let hash_key = key
                    .hash_key()
                    .ok_or_else(|| VmError::UnusableHashKey(key.type_name().to_string()))?;
                let v = pairs.get(&hash_key).map(|p| p.value.clone()).unwrap_or(Value::Null);
                self.push(v)
            }
            _ => Err(VmError::IndexOperatorNotSupported(left.type_name().to_string())),
        }
    }

    // ── Calls ─────────────────────────────────────────────────────────────

    fn exec_call(&mut self, argc: usize) -> VmResult<()> {
        let callee = self.stack[self.sp - 1 - argc].clone();
        match callee {
            Value::Closure(closure) => self.call_closure(closure, argc),
            Value::Builtin(b) => self.call_builtin(b, argc),
            other => Err(VmError::NotCallable(other.type_name().to_string())),
        }
    }

    fn call_closure(&mut self, closure: Rc<Closure>, argc: usize) -> VmResult<()> {
        if argc != closure.func.num_parameters {
            return Err(VmError::WrongArgCount { expected: closure.func.num_parameters, got: argc });
        }
        let num_locals = closure.func.num_locals;
        let base_pointer = self.sp - argc;
        if base_pointer + num_locals > STACK_SIZE {
            return Err(VmError::StackOverflow);
        }
        self.push_frame(Frame { closure, ip: 0, base_pointer })?;
        self.sp = base_pointer + num_locals;
        Ok(())
    }

    fn call_builtin(&mut self, builtin: crate::value::Builtin, argc: usize) -> VmResult<()> {
        let args = self.stack[self.sp - argc..self.sp].to_vec();
        let result = (builtin.func)(&args);
        self.sp = self.sp - argc - 1;
        self.push(result)
    }
}
