use std::rc::Rc;

use reyna_bytecode::{Constant, FunctionProto, OpCode};
use reyna_gc::{GcRef, Heap};
use reyna_util::{Interner, Symbol};
use rustc_hash::FxHashMap;

use crate::error::{Result, VmError};
use crate::frame::CallFrame;
use crate::handler::ExceptionHandler;
use crate::host::{DefaultHost, Host};
use crate::object::{BoundMethodObj, ClassObj, ClosureObj, InstanceObj, NativeFn, Obj, UpvalueState};
use crate::value::Value;

/// Calls nested this deep almost certainly mean a runaway recursive
/// program rather than legitimate depth; the host is the only thing
/// meant to stop a runaway program (§5), but an unbounded Rust call stack
/// would abort the process with a segfault instead of a reported error.
const MAX_CALL_DEPTH: usize = 4096;

/// The stack-based interpreter (§4.5): a value stack, a frame stack, a
/// globals map, an open-upvalue list, an exception-handler stack, and the
/// GC heap. Owns none of the compiled program's lifetime beyond a single
/// `interpret` call - each run recompiles from source (§6 "Persisted
/// state: none").
pub struct Vm<'a> {
    stack: Vec<Value>,
    frames: Vec<CallFrame>,
    globals: FxHashMap<Symbol, Value>,
    open_upvalues: Vec<GcRef<Obj>>,
    handlers: Vec<ExceptionHandler>,
    heap: Heap<Obj>,
    interner: &'a mut Interner,
    host: Box<dyn Host>,
    init_sym: Symbol,
}

impl<'a> Vm<'a> {
    pub fn new(interner: &'a mut Interner) -> Self {
        Self::with_host(interner, Box::new(DefaultHost))
    }

    pub fn with_host(interner: &'a mut Interner, host: Box<dyn Host>) -> Self {
        let init_sym = interner.intern("init");
        Self {
            stack: Vec::with_capacity(256),
            frames: Vec::with_capacity(64),
            globals: FxHashMap::default(),
            open_upvalues: Vec::new(),
            handlers: Vec::new(),
            heap: Heap::new(reyna_gc::GcConfig::default()),
            interner,
            host,
            init_sym,
        }
    }

    /// Registers a native under `name`, resolved through the same interner
    /// the compiler used - `name` collides with a source identifier iff
    /// they intern to the same `Symbol`, which is exactly the condition
    /// under which a global lookup should find it (§6 "registration of
    /// native functions into the globals map").
    pub fn define_native(&mut self, name: &str, func: NativeFn) -> Result<()> {
        let sym = self.interner.intern(name);
        let r = self.heap.alloc(Obj::Native { name: sym, func })?;
        self.globals.insert(sym, Value::Obj(r));
        Ok(())
    }

    pub fn define_global(&mut self, name: &str, value: Value) {
        let sym = self.interner.intern(name);
        self.globals.insert(sym, value);
    }

    pub fn alloc_string(&mut self, s: String) -> Result<Value> {
        let r = self.heap.alloc(Obj::Str(s.into()))?;
        Ok(Value::Obj(r))
    }

    pub fn interner(&self) -> &Interner {
        &*self.interner
    }

    /// Lets natives (`input`) prompt through the same [`Host`] the VM's own
    /// I/O goes through, so tests can script answers via `CapturingHost`.
    pub fn read_line(&mut self, prompt: &str) -> std::io::Result<String> {
        self.host.read_line(prompt)
    }

    /// Runs `proto` as the top-level script (§3 "unused sentinel for the
    /// top-level script" - slot 0 holds the script's own closure).
    pub fn interpret(&mut self, proto: Rc<FunctionProto>) -> Result<()> {
        let closure_ref = self.heap.alloc(Obj::Closure(ClosureObj { proto, upvalues: Vec::new() }))?;
        self.stack.push(Value::Obj(closure_ref));
        self.frames.push(CallFrame { closure: closure_ref, ip: 0, base: 0 });
        tracing::trace!(depth = self.frames.len(), "entered frame");
        self.run()
    }

    fn run(&mut self) -> Result<()> {
        loop {
            if self.heap.should_collect() {
                self.collect_garbage();
            }

            let proto = self.current_proto();
            let byte = self.read_byte(&proto);
            let op = OpCode::try_from(byte).expect("compiler only ever emits valid opcodes");

            match op {
                OpCode::Constant => {
                    let k = self.read_byte(&proto);
                    let c = proto.chunk.constants[k as usize].clone();
                    let v = self.constant_to_value(c)?;
                    self.push(v);
                }
                OpCode::Nil => self.push(Value::Nil),
                OpCode::True => self.push(Value::Bool(true)),
                OpCode::False => self.push(Value::Bool(false)),
                OpCode::Pop => {
                    self.pop();
                }
                OpCode::GetLocal => {
                    let slot = self.read_byte(&proto) as usize;
                    let base = self.frames.last().expect("frame").base;
                    self.push(self.stack[base + slot]);
                }
                OpCode::SetLocal => {
                    let slot = self.read_byte(&proto) as usize;
                    let base = self.frames.last().expect("frame").base;
                    let v = self.peek(0);
                    self.stack[base + slot] = v;
                }
                OpCode::GetGlobal => {
                    let k = self.read_byte(&proto);
                    let name = self.symbol_from_constant(&proto, k);
                    match self.globals.get(&name) {
                        Some(v) => self.push(*v),
                        None => return Err(self.undefined_global(name)),
                    }
                }
                OpCode::DefineGlobal => {
                    let k = self.read_byte(&proto);
                    let name = self.symbol_from_constant(&proto, k);
                    let v = self.pop();
                    self.globals.insert(name, v);
                }
                OpCode::SetGlobal => {
                    let k = self.read_byte(&proto);
                    let name = self.symbol_from_constant(&proto, k);
                    if self.globals.contains_key(&name) {
                        self.globals.insert(name, self.peek(0));
                    } else {
                        // §9: an undefined SET_GLOBAL is a runtime error
                        // that terminates execution, not a print-and-continue.
                        return Err(self.undefined_global(name));
                    }
                }
                OpCode::Equal => {
                    let b = self.pop();
                    let a = self.pop();
                    self.push(Value::Bool(self.values_equal(a, b)));
                }
                OpCode::Greater => {
                    let b = self.pop();
                    let a = self.pop();
                    self.push(Value::Bool(self.compare(a, b)? == std::cmp::Ordering::Greater));
                }
                OpCode::Less => {
                    let b = self.pop();
                    let a = self.pop();
                    self.push(Value::Bool(self.compare(a, b)? == std::cmp::Ordering::Less));
                }
                OpCode::Add => {
                    let b = self.pop();
                    let a = self.pop();
                    let v = self.add_values(a, b)?;
                    self.push(v);
                }
                OpCode::Subtract => {
                    let b = self.pop();
                    let a = self.pop();
                    self.push(numeric_binop(a, b, |x, y| x - y, |x, y| x - y)?);
                }
                OpCode::Multiply => {
                    let b = self.pop();
                    let a = self.pop();
                    self.push(numeric_binop(a, b, |x, y| x * y, |x, y| x * y)?);
                }
                OpCode::Divide => {
                    let b = self.pop();
                    let a = self.pop();
                    let x = as_f64(a)?;
                    let y = as_f64(b)?;
                    self.push(Value::Float(x / y));
                }
                OpCode::Not => {
                    let v = self.pop();
                    self.push(Value::Bool(!v.is_truthy()));
                }
                OpCode::Negate => {
                    let v = self.pop();
                    self.push(match v {
                        Value::Int(n) => Value::Int(-n),
                        Value::Float(f) => Value::Float(-f),
                        _ => return Err(VmError::NotANumber),
                    });
                }
                OpCode::Print => {
                    let v = self.pop();
                    let s = self.stringify(v);
                    self.host.print(&s);
                }
                OpCode::Jump => {
                    let off = self.read_u16(&proto);
                    self.frames.last_mut().expect("frame").ip += off as usize;
                }
                OpCode::JumpIfFalse => {
                    let off = self.read_u16(&proto);
                    if !self.peek(0).is_truthy() {
                        self.frames.last_mut().expect("frame").ip += off as usize;
                    }
                }
                OpCode::Loop => {
                    let off = self.read_u16(&proto);
                    self.frames.last_mut().expect("frame").ip -= off as usize;
                }
                OpCode::Call => {
                    let argc = self.read_byte(&proto) as usize;
                    self.call_value(argc)?;
                }
                OpCode::Return => {
                    let result = self.pop();
                    let frame = self.frames.pop().expect("at least one frame");
                    tracing::trace!(depth = self.frames.len(), "left frame");
                    self.close_upvalues_from(frame.base);
                    if self.frames.is_empty() {
                        return Ok(());
                    }
                    self.stack.truncate(frame.base);
                    self.push(result);
                }
                OpCode::GetField => {
                    let k = self.read_byte(&proto);
                    let name = self.symbol_from_constant(&proto, k);
                    self.get_field(name)?;
                }
                OpCode::SetField => {
                    let k = self.read_byte(&proto);
                    let name = self.symbol_from_constant(&proto, k);
                    let val = self.pop();
                    let obj_v = self.pop();
                    let r = obj_v.as_obj().ok_or(VmError::NotAnInstance)?;
                    match self.heap.get_mut(r) {
                        Obj::Instance(inst) => {
                            inst.fields.insert(name, val);
                        }
                        _ => return Err(VmError::NotAnInstance),
                    }
                    self.push(val);
                }
                OpCode::Struct => {
                    let k = self.read_byte(&proto);
                    let name = self.symbol_from_constant(&proto, k);
                    let r = self.heap.alloc(Obj::StructDef { name })?;
                    self.push(Value::Obj(r));
                }
                OpCode::BuildArray => {
                    let n = self.read_byte(&proto) as usize;
                    let mut elements = Vec::with_capacity(n);
                    for _ in 0..n {
                        elements.push(self.pop());
                    }
                    elements.reverse();
                    let r = self.heap.alloc(Obj::Array(elements))?;
                    self.push(Value::Obj(r));
                }
                OpCode::GetIndex => {
                    let index_v = self.pop();
                    let arr_v = self.pop();
                    let idx = as_index(index_v)?;
                    let r = arr_v.as_obj().ok_or(VmError::NotAnArray)?;
                    match self.heap.get(r) {
                        Obj::Array(elements) => {
                            let v = index_get(elements, idx)?;
                            self.push(v);
                        }
                        _ => return Err(VmError::NotAnArray),
                    }
                }
                OpCode::SetIndex => {
                    let val = self.pop();
                    let index_v = self.pop();
                    let arr_v = self.pop();
                    let idx = as_index(index_v)?;
                    let r = arr_v.as_obj().ok_or(VmError::NotAnArray)?;
                    match self.heap.get_mut(r) {
                        Obj::Array(elements) => {
                            index_set(elements, idx, val)?;
                        }
                        _ => return Err(VmError::NotAnArray),
                    }
                    self.push(val);
                }
                OpCode::Closure => {
                    self.make_closure(&proto)?;
                }
                OpCode::GetUpvalue => {
                    let u = self.read_byte(&proto) as usize;
                    let v = self.read_upvalue(u);
                    self.push(v);
                }
                OpCode::SetUpvalue => {
                    let u = self.read_byte(&proto) as usize;
                    let v = self.peek(0);
                    self.write_upvalue(u, v);
                }
                OpCode::CloseUpvalue => {
                    let top = self.stack.len() - 1;
                    self.close_upvalues_from(top);
                    self.pop();
                }
                OpCode::Class => {
                    let k = self.read_byte(&proto);
                    let name = self.symbol_from_constant(&proto, k);
                    let r = self.heap.alloc(Obj::Class(ClassObj { name, methods: FxHashMap::default() }))?;
                    self.push(Value::Obj(r));
                }
                OpCode::Method => {
                    let k = self.read_byte(&proto);
                    let name = self.symbol_from_constant(&proto, k);
                    let method_v = self.peek(0);
                    let class_v = self.peek(1);
                    let method_ref = method_v.as_obj().expect("a method body compiles to a closure");
                    let class_ref = class_v.as_obj().expect("METHOD always follows a CLASS value");
                    match self.heap.get_mut(class_ref) {
                        Obj::Class(c) => {
                            c.methods.insert(name, method_ref);
                        }
                        _ => unreachable!("METHOD always follows a CLASS value"),
                    }
                }
                OpCode::Inherit => {
                    // §4.4: superclass is pushed before the subclass, so
                    // the subclass sits on top.
                    let subclass_v = self.peek(0);
                    let superclass_v = self.peek(1);
                    let super_ref = superclass_v.as_obj().filter(|r| matches!(self.heap.get(*r), Obj::Class(_)));
                    let Some(super_ref) = super_ref else {
                        return Err(VmError::SuperclassNotClass);
                    };
                    let sub_ref = subclass_v.as_obj().expect("a class declaration's subclass value");
                    let inherited = match self.heap.get(super_ref) {
                        Obj::Class(c) => c.methods.clone(),
                        _ => unreachable!(),
                    };
                    match self.heap.get_mut(sub_ref) {
                        Obj::Class(sub) => sub.methods.extend(inherited),
                        _ => unreachable!("a class declaration's subclass value"),
                    }
                }
                OpCode::GetSuper => {
                    let k = self.read_byte(&proto);
                    let name = self.symbol_from_constant(&proto, k);
                    let superclass_v = self.pop();
                    let receiver_v = self.pop();
                    let super_ref = superclass_v.as_obj().filter(|r| matches!(self.heap.get(*r), Obj::Class(_)));
                    let Some(super_ref) = super_ref else {
                        return Err(VmError::SuperclassNotClass);
                    };
                    let method = match self.heap.get(super_ref) {
                        Obj::Class(c) => c.methods.get(&name).copied(),
                        _ => unreachable!(),
                    };
                    match method {
                        Some(m) => {
                            let bound = self.heap.alloc(Obj::BoundMethod(BoundMethodObj { receiver: receiver_v, method: m }))?;
                            self.push(Value::Obj(bound));
                        }
                        None => return Err(VmError::UndefinedProperty(self.interner.resolve(name).to_string())),
                    }
                }
                OpCode::TryBegin => {
                    let off = self.read_u16(&proto);
                    let catch_ip = self.frames.last().expect("frame").ip + off as usize;
                    self.handlers.push(ExceptionHandler {
                        catch_ip,
                        stack_depth: self.stack.len(),
                        frame_depth: self.frames.len(),
                    });
                }
                OpCode::TryEnd => {
                    self.handlers.pop();
                }
                OpCode::Throw => {
                    let exception = self.pop();
                    match self.handlers.pop() {
                        None => return Err(VmError::UncaughtException(self.stringify(exception))),
                        Some(h) => {
                            self.frames.truncate(h.frame_depth);
                            self.stack.truncate(h.stack_depth);
                            self.push(exception);
                            self.frames.last_mut().expect("a handler's frame survives unwinding").ip = h.catch_ip;
                        }
                    }
                }
            }
        }
    }

    // -- dispatch helpers --------------------------------------------------

    fn current_proto(&self) -> Rc<FunctionProto> {
        let closure_ref = self.frames.last().expect("at least one frame").closure;
        match self.heap.get(closure_ref) {
            Obj::Closure(c) => c.proto.clone(),
            _ => unreachable!("a frame's receiver is always a closure"),
        }
    }

    fn read_byte(&mut self, proto: &FunctionProto) -> u8 {
        let frame = self.frames.last_mut().expect("frame");
        let b = proto.chunk.code[frame.ip];
        frame.ip += 1;
        b
    }

    fn read_u16(&mut self, proto: &FunctionProto) -> u16 {
        let hi = self.read_byte(proto) as u16;
        let lo = self.read_byte(proto) as u16;
        (hi << 8) | lo
    }

    fn symbol_from_constant(&self, proto: &FunctionProto, k: u8) -> Symbol {
        match &proto.chunk.constants[k as usize] {
            Constant::Str(s) => *s,
            other => unreachable!("identifier constant must be a Str, got {other:?}"),
        }
    }

    fn constant_to_value(&mut self, c: Constant) -> Result<Value> {
        match c {
            Constant::Int64(n) => Ok(Value::Int(n)),
            Constant::Float64(f) => Ok(Value::Float(f)),
            Constant::Str(sym) => {
                let s = self.interner.resolve(sym).to_string();
                self.alloc_string(s)
            }
            Constant::Function(_) => unreachable!("functions are only introduced via CLOSURE"),
        }
    }

    fn push(&mut self, v: Value) {
        self.stack.push(v);
    }

    fn pop(&mut self) -> Value {
        self.stack.pop().expect("stack balance invariant (§8)")
    }

    fn peek(&self, distance: usize) -> Value {
        self.stack[self.stack.len() - 1 - distance]
    }

    fn undefined_global(&self, name: Symbol) -> VmError {
        VmError::UndefinedGlobal(self.interner.resolve(name).to_string())
    }

    fn values_equal(&self, a: Value, b: Value) -> bool {
        match (a, b) {
            (Value::Nil, Value::Nil) => true,
            (Value::Nil, _) | (_, Value::Nil) => false,
            (Value::Bool(x), Value::Bool(y)) => x == y,
            (Value::Int(x), Value::Int(y)) => x == y,
            (Value::Float(x), Value::Float(y)) => x == y,
            (Value::Int(x), Value::Float(y)) | (Value::Float(y), Value::Int(x)) => x as f64 == y,
            (Value::Obj(x), Value::Obj(y)) => match (self.heap.get(x), self.heap.get(y)) {
                (Obj::Str(a), Obj::Str(b)) => a == b,
                _ => x == y,
            },
            _ => false,
        }
    }

    fn compare(&self, a: Value, b: Value) -> Result<std::cmp::Ordering> {
        match (a, b) {
            (Value::Obj(x), Value::Obj(y)) => match (self.heap.get(x), self.heap.get(y)) {
                (Obj::Str(a), Obj::Str(b)) => Ok(a.cmp(b)),
                _ => Err(VmError::NotANumber),
            },
            _ => {
                let x = as_f64(a)?;
                let y = as_f64(b)?;
                x.partial_cmp(&y).ok_or(VmError::NotANumber)
            }
        }
    }

    fn is_str(&self, v: Value) -> bool {
        matches!(v, Value::Obj(r) if matches!(self.heap.get(r), Obj::Str(_)))
    }

    /// `ADD` (§4.5): numeric addition, unless either operand is a string,
    /// in which case both are textually formatted and concatenated.
    fn add_values(&mut self, a: Value, b: Value) -> Result<Value> {
        if self.is_str(a) || self.is_str(b) {
            let s = format!("{}{}", self.stringify(a), self.stringify(b));
            return self.alloc_string(s);
        }
        numeric_binop(a, b, |x, y| x + y, |x, y| x + y)
    }

    pub fn stringify(&self, v: Value) -> String {
        match v {
            Value::Nil => "nil".to_string(),
            Value::Bool(b) => b.to_string(),
            Value::Int(n) => n.to_string(),
            Value::Float(f) => f.to_string(),
            Value::Obj(r) => match self.heap.get(r) {
                Obj::Str(s) => s.to_string(),
                Obj::StructDef { name } => format!("<struct {}>", self.interner.resolve(*name)),
                Obj::Instance(inst) => format!("<instance of {}>", self.type_name_of(inst.class)),
                Obj::Closure(c) => format!("<fn {}>", self.interner.resolve(c.proto.name)),
                Obj::Upvalue(_) => "<upvalue>".to_string(),
                Obj::Native { name, .. } => format!("<native fn {}>", self.interner.resolve(*name)),
                Obj::Class(c) => format!("<class {}>", self.interner.resolve(c.name)),
                Obj::BoundMethod(_) => "<bound method>".to_string(),
                Obj::Array(elements) => {
                    let parts: Vec<String> = elements.iter().map(|e| self.stringify(*e)).collect();
                    format!("[{}]", parts.join(", "))
                }
            },
        }
    }

    fn type_name_of(&self, class_ref: GcRef<Obj>) -> &str {
        match self.heap.get(class_ref) {
            Obj::Class(c) => self.interner.resolve(c.name),
            Obj::StructDef { name } => self.interner.resolve(*name),
            _ => "?",
        }
    }

    fn get_field(&mut self, name: Symbol) -> Result<()> {
        let obj_v = self.pop();
        let r = obj_v.as_obj().ok_or(VmError::NotAnInstance)?;
        let (field, class_ref) = match self.heap.get(r) {
            Obj::Instance(inst) => (inst.fields.get(&name).copied(), inst.class),
            _ => return Err(VmError::NotAnInstance),
        };
        if let Some(v) = field {
            self.push(v);
            return Ok(());
        }
        let method = match self.heap.get(class_ref) {
            Obj::Class(c) => c.methods.get(&name).copied(),
            _ => None,
        };
        match method {
            Some(m) => {
                let bound = self.heap.alloc(Obj::BoundMethod(BoundMethodObj { receiver: obj_v, method: m }))?;
                self.push(Value::Obj(bound));
                Ok(())
            }
            None => Err(VmError::UndefinedProperty(self.interner.resolve(name).to_string())),
        }
    }

    fn make_closure(&mut self, proto: &FunctionProto) -> Result<()> {
        let k = self.read_byte(proto);
        let constant = proto.chunk.constants[k as usize].clone();
        let inner = match constant {
            Constant::Function(p) => p,
            other => unreachable!("CLOSURE's operand must be a Function constant, got {other:?}"),
        };
        let count = inner.upvalues.len();
        let mut upvalues = Vec::with_capacity(count);
        for _ in 0..count {
            let is_local = self.read_byte(proto) != 0;
            let index = self.read_byte(proto) as usize;
            let up_ref = if is_local {
                let base = self.frames.last().expect("frame").base;
                self.capture_upvalue(base + index)?
            } else {
                let enclosing = self.frames.last().expect("frame").closure;
                match self.heap.get(enclosing) {
                    Obj::Closure(c) => c.upvalues[index],
                    _ => unreachable!(),
                }
            };
            upvalues.push(up_ref);
        }
        let r = self.heap.alloc(Obj::Closure(ClosureObj { proto: inner, upvalues }))?;
        self.push(Value::Obj(r));
        Ok(())
    }

    /// Reuses the existing open upvalue for `slot` if one exists, keeping
    /// the "at most one open upvalue per slot" invariant (§3); the open
    /// list stays sorted by slot so closing a scope is linear (§9).
    fn capture_upvalue(&mut self, slot: usize) -> Result<GcRef<Obj>> {
        for &r in &self.open_upvalues {
            if let Obj::Upvalue(UpvalueState::Open(s)) = self.heap.get(r) {
                if *s == slot {
                    return Ok(r);
                }
            }
        }
        let r = self.heap.alloc(Obj::Upvalue(UpvalueState::Open(slot)))?;
        let pos = self
            .open_upvalues
            .iter()
            .position(|&ur| matches!(self.heap.get(ur), Obj::Upvalue(UpvalueState::Open(s)) if *s > slot))
            .unwrap_or(self.open_upvalues.len());
        self.open_upvalues.insert(pos, r);
        Ok(r)
    }

    /// Closes every open upvalue at or above `boundary` by copying its
    /// current stack value into itself and dropping it from the open list
    /// (§4.5 `CLOSE_UPVALUE` / end-of-scope).
    fn close_upvalues_from(&mut self, boundary: usize) {
        let mut i = 0;
        while i < self.open_upvalues.len() {
            let r = self.open_upvalues[i];
            let slot = match self.heap.get(r) {
                Obj::Upvalue(UpvalueState::Open(s)) => Some(*s),
                _ => None,
            };
            match slot {
                Some(slot) if slot >= boundary => {
                    let val = self.stack[slot];
                    if let Obj::Upvalue(state) = self.heap.get_mut(r) {
                        *state = UpvalueState::Closed(val);
                    }
                    self.open_upvalues.remove(i);
                }
                _ => i += 1,
            }
        }
    }

    fn read_upvalue(&self, index: usize) -> Value {
        let closure_ref = self.frames.last().expect("frame").closure;
        let up_ref = match self.heap.get(closure_ref) {
            Obj::Closure(c) => c.upvalues[index],
            _ => unreachable!(),
        };
        match self.heap.get(up_ref) {
            Obj::Upvalue(UpvalueState::Open(slot)) => self.stack[*slot],
            Obj::Upvalue(UpvalueState::Closed(v)) => *v,
            _ => unreachable!(),
        }
    }

    fn write_upvalue(&mut self, index: usize, value: Value) {
        let closure_ref = self.frames.last().expect("frame").closure;
        let up_ref = match self.heap.get(closure_ref) {
            Obj::Closure(c) => c.upvalues[index],
            _ => unreachable!(),
        };
        if let Obj::Upvalue(state) = self.heap.get_mut(up_ref) {
            match *state {
                UpvalueState::Open(slot) => self.stack[slot] = value,
                UpvalueState::Closed(_) => *state = UpvalueState::Closed(value),
            }
        }
    }

    fn call_value(&mut self, argc: usize) -> Result<()> {
        let callee = self.peek(argc);
        let r = callee.as_obj().ok_or(VmError::NotCallable)?;

        enum Action {
            Closure(GcRef<Obj>),
            Bound { receiver: Value, method: GcRef<Obj> },
            Class(GcRef<Obj>),
            Struct(GcRef<Obj>),
            Native(NativeFn),
        }

        let action = match self.heap.get(r) {
            Obj::Closure(_) => Action::Closure(r),
            Obj::BoundMethod(bm) => Action::Bound { receiver: bm.receiver, method: bm.method },
            Obj::Class(_) => Action::Class(r),
            Obj::StructDef { .. } => Action::Struct(r),
            Obj::Native { func, .. } => Action::Native(*func),
            _ => return Err(VmError::NotCallable),
        };

        match action {
            Action::Closure(cref) => self.call_closure(cref, argc),
            Action::Bound { receiver, method } => {
                let base = self.stack.len() - argc - 1;
                self.stack[base] = receiver;
                self.call_closure(method, argc)
            }
            Action::Class(class_ref) => {
                let init = match self.heap.get(class_ref) {
                    Obj::Class(c) => c.methods.get(&self.init_sym).copied(),
                    _ => unreachable!(),
                };
                let inst_ref = self.heap.alloc(Obj::Instance(InstanceObj { class: class_ref, fields: FxHashMap::default() }))?;
                let base = self.stack.len() - argc - 1;
                match init {
                    Some(method_ref) => {
                        self.stack[base] = Value::Obj(inst_ref);
                        self.call_closure(method_ref, argc)
                    }
                    None => {
                        if argc != 0 {
                            return Err(VmError::ArityMismatch { expected: 0, got: argc });
                        }
                        self.stack[base] = Value::Obj(inst_ref);
                        Ok(())
                    }
                }
            }
            Action::Struct(struct_ref) => {
                if argc != 0 {
                    return Err(VmError::StructArity);
                }
                let inst_ref = self.heap.alloc(Obj::Instance(InstanceObj { class: struct_ref, fields: FxHashMap::default() }))?;
                let base = self.stack.len() - 1;
                self.stack[base] = Value::Obj(inst_ref);
                Ok(())
            }
            Action::Native(func) => {
                let base = self.stack.len() - argc - 1;
                let args: Vec<Value> = self.stack[base + 1..].to_vec();
                let result = func(self, &args)?;
                self.stack.truncate(base);
                self.push(result);
                Ok(())
            }
        }
    }

    fn call_closure(&mut self, closure_ref: GcRef<Obj>, argc: usize) -> Result<()> {
        let arity = match self.heap.get(closure_ref) {
            Obj::Closure(c) => c.proto.arity,
            _ => unreachable!("call_closure is only ever reached with an Obj::Closure"),
        };
        if argc != arity {
            return Err(VmError::ArityMismatch { expected: arity, got: argc });
        }
        if self.frames.len() >= MAX_CALL_DEPTH {
            return Err(VmError::StackOverflow(MAX_CALL_DEPTH));
        }
        let base = self.stack.len() - argc - 1;
        self.frames.push(CallFrame { closure: closure_ref, ip: 0, base });
        tracing::trace!(depth = self.frames.len(), "entered frame");
        Ok(())
    }

    /// Gathers §4.6's roots (every stack value, every global, every live
    /// frame's closure, every open upvalue) and runs one collection.
    fn collect_garbage(&mut self) {
        let mut roots = Vec::with_capacity(self.stack.len() + self.globals.len() + self.frames.len() + self.open_upvalues.len());
        roots.extend(self.stack.iter().filter_map(|v| v.as_obj()));
        roots.extend(self.globals.values().filter_map(|v| v.as_obj()));
        roots.extend(self.frames.iter().map(|f| f.closure));
        roots.extend(self.open_upvalues.iter().copied());
        self.heap.collect(roots);
    }
}

fn as_f64(v: Value) -> Result<f64> {
    match v {
        Value::Int(n) => Ok(n as f64),
        Value::Float(f) => Ok(f),
        _ => Err(VmError::NotANumber),
    }
}

fn as_index(v: Value) -> Result<i64> {
    match v {
        Value::Int(n) => Ok(n),
        Value::Float(f) => Ok(f as i64),
        _ => Err(VmError::IndexNotNumber),
    }
}

fn index_get(elements: &[Value], idx: i64) -> Result<Value> {
    if idx < 0 || idx as usize >= elements.len() {
        return Err(VmError::IndexOutOfBounds { index: idx, len: elements.len() });
    }
    Ok(elements[idx as usize])
}

fn index_set(elements: &mut [Value], idx: i64, value: Value) -> Result<()> {
    if idx < 0 || idx as usize >= elements.len() {
        return Err(VmError::IndexOutOfBounds { index: idx, len: elements.len() });
    }
    elements[idx as usize] = value;
    Ok(())
}

/// `ADD`/`SUBTRACT`/`MULTIPLY` widening (§4.3): `int op int` stays `int64`,
/// any `float64` operand widens the result to `float64`. `DIVIDE` does not
/// use this - it always widens (SPEC_FULL.md's resolution of §9's open
/// question).
fn numeric_binop(a: Value, b: Value, int_op: impl Fn(i64, i64) -> i64, float_op: impl Fn(f64, f64) -> f64) -> Result<Value> {
    match (a, b) {
        (Value::Int(x), Value::Int(y)) => Ok(Value::Int(int_op(x, y))),
        (Value::Int(x), Value::Float(y)) => Ok(Value::Float(float_op(x as f64, y))),
        (Value::Float(x), Value::Int(y)) => Ok(Value::Float(float_op(x, y as f64))),
        (Value::Float(x), Value::Float(y)) => Ok(Value::Float(float_op(x, y))),
        _ => Err(VmError::NotANumber),
    }
}
