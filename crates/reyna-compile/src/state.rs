use reyna_bytecode::{Chunk, FunctionKind, UpvalueDesc};
use reyna_util::Symbol;

/// One declared name and the stack slot it occupies within the function
/// currently being compiled. `depth` is the lexical scope it was declared
/// in; `-1` during its own initializer (unused here since the parser
/// never lets a `let` reference itself, but kept for parity with the
/// classic algorithm this is grounded on).
#[derive(Clone, Copy, Debug)]
pub struct Local {
    pub name: Symbol,
    pub depth: i32,
    pub is_captured: bool,
}

/// Compiler-side bookkeeping for one function body being compiled. A
/// stack of these (in [`crate::Compiler`]) mirrors the nesting of
/// functions in source; resolving a name against an *enclosing* state is
/// how upvalue capture (§4.4, "Name resolution") works.
pub struct FunctionState {
    pub name: Symbol,
    pub kind: FunctionKind,
    pub arity: usize,
    pub chunk: Chunk,
    pub locals: Vec<Local>,
    pub upvalues: Vec<UpvalueDesc>,
    pub scope_depth: i32,
}

impl FunctionState {
    /// Slot 0 is always reserved for the receiver (§4.4): the closure
    /// itself for a plain function, `this` for a method/initializer.
    pub fn new(name: Symbol, kind: FunctionKind, arity: usize, receiver_name: Symbol) -> Self {
        Self {
            name,
            kind,
            arity,
            chunk: Chunk::new(),
            locals: vec![Local { name: receiver_name, depth: 0, is_captured: false }],
            upvalues: Vec::new(),
            scope_depth: 0,
        }
    }
}

/// Tracks whether the class currently being compiled has a superclass, so
/// `super.m` knows whether it's legal (§4.4).
pub struct ClassCompiler {
    pub has_superclass: bool,
}
