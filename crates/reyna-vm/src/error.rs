/// Runtime errors (§7 kind 4): arity mismatch, type mismatch in an
/// operator, undefined global, undefined field/method, out-of-bounds
/// index, uncaught user `throw`. The VM prints the error and terminates
/// with `RUNTIME_ERROR` - none of these are Reyna-language exceptions,
/// which propagate in-band through the handler stack instead (§9).
#[derive(Debug, thiserror::Error)]
pub enum VmError {
    #[error("undefined variable '{0}'")]
    UndefinedGlobal(String),

    #[error("expected {expected} arguments but got {got}")]
    ArityMismatch { expected: usize, got: usize },

    #[error("only instances have properties")]
    NotAnInstance,

    #[error("undefined property '{0}'")]
    UndefinedProperty(String),

    #[error("can only call functions, classes, or structs")]
    NotCallable,

    #[error("struct constructor expects 0 arguments")]
    StructArity,

    #[error("superclass must be a class")]
    SuperclassNotClass,

    #[error("'{0}' used outside a subclass method")]
    NoSuperclass(String),

    #[error("can only index arrays")]
    NotAnArray,

    #[error("array index must be a number")]
    IndexNotNumber,

    #[error("index {index} out of bounds for array of length {len}")]
    IndexOutOfBounds { index: i64, len: usize },

    #[error("operands must be numbers")]
    NotANumber,

    #[error("uncaught exception: {0}")]
    UncaughtException(String),

    #[error("heap allocation failed: {0}")]
    Heap(#[from] reyna_gc::GcError),

    #[error("--mode=jit selects a back end outside this implementation's scope")]
    UnsupportedMode,

    #[error("native function '{0}' is not registered")]
    NativeNotRegistered(String),

    #[error("call stack exceeded maximum depth of {0}")]
    StackOverflow(usize),
}

pub type Result<T> = std::result::Result<T, VmError>;
