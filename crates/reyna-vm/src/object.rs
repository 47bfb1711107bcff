use std::rc::Rc;

use reyna_bytecode::FunctionProto;
use reyna_gc::{GcRef, Heap, Trace};
use reyna_util::Symbol;
use rustc_hash::FxHashMap;

use crate::value::Value;
use crate::vm::Vm;

/// A native function pointer plus the name it was registered under (§9
/// "Native callouts"): no closure environment, so there is nothing for the
/// GC to trace. Natives receive the running VM (for heap allocation, e.g.
/// `str()` interning a fresh string) and the argument slice.
pub type NativeFn = fn(&mut Vm, &[Value]) -> crate::error::Result<Value>;

/// Either a stack index (*open*, the value still lives in an active
/// frame) or a copied value (*closed*, the defining scope has exited).
/// §9: "a tagged variant `Open(stack_slot) | Closed(value)`".
#[derive(Clone, Copy, Debug)]
pub enum UpvalueState {
    Open(usize),
    Closed(Value),
}

#[derive(Debug)]
pub struct ClosureObj {
    /// Shared, compile-time-immortal: every closure sharing a `FunctionProto`
    /// points at the same chunk, so there is no need to give protos their
    /// own GC-tracked heap slot (a deliberate simplification over giving
    /// `Function` its own `Obj` variant).
    pub proto: Rc<FunctionProto>,
    pub upvalues: Vec<GcRef<Obj>>,
}

#[derive(Debug)]
pub struct InstanceObj {
    /// The `StructDef` or `Class` this instance was built from.
    pub class: GcRef<Obj>,
    pub fields: FxHashMap<Symbol, Value>,
}

#[derive(Debug)]
pub struct ClassObj {
    pub name: Symbol,
    pub methods: FxHashMap<Symbol, GcRef<Obj>>,
}

#[derive(Debug)]
pub struct BoundMethodObj {
    pub receiver: Value,
    pub method: GcRef<Obj>,
}

/// The single heap-object type `reyna-vm`'s `Heap<Obj>` is instantiated
/// over (§3's "heap-object variants"). Keeping every kind behind one enum
/// means every out-edge a `Trace` impl walks is homogeneously `GcRef<Obj>`.
#[derive(Debug)]
pub enum Obj {
    Str(Rc<str>),
    StructDef { name: Symbol },
    Instance(InstanceObj),
    Closure(ClosureObj),
    Upvalue(UpvalueState),
    Native { name: Symbol, func: NativeFn },
    Class(ClassObj),
    BoundMethod(BoundMethodObj),
    Array(Vec<Value>),
}

impl Obj {
    pub fn type_name(&self) -> &'static str {
        match self {
            Obj::Str(_) => "string",
            Obj::StructDef { .. } => "struct",
            Obj::Instance(_) => "instance",
            Obj::Closure(_) => "function",
            Obj::Upvalue(_) => "upvalue",
            Obj::Native { .. } => "native fn",
            Obj::Class(_) => "class",
            Obj::BoundMethod(_) => "bound method",
            Obj::Array(_) => "array",
        }
    }
}

fn mark_value(heap: &Heap<Obj>, value: &Value) {
    if let Value::Obj(r) = value {
        heap.mark(*r);
    }
}

impl Trace for Obj {
    fn trace(&self, heap: &Heap<Self>) {
        match self {
            Obj::Str(_) | Obj::StructDef { .. } | Obj::Native { .. } => {}
            Obj::Instance(inst) => {
                heap.mark(inst.class);
                for v in inst.fields.values() {
                    mark_value(heap, v);
                }
            }
            Obj::Closure(c) => {
                for up in &c.upvalues {
                    heap.mark(*up);
                }
            }
            Obj::Upvalue(state) => {
                if let UpvalueState::Closed(v) = state {
                    mark_value(heap, v);
                }
            }
            Obj::Class(class) => {
                for m in class.methods.values() {
                    heap.mark(*m);
                }
            }
            Obj::BoundMethod(bm) => {
                mark_value(heap, &bm.receiver);
                heap.mark(bm.method);
            }
            Obj::Array(elements) => {
                for v in elements {
                    mark_value(heap, v);
                }
            }
        }
    }
}
