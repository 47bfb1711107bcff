//! reyna-bytecode - the wire format between the compiler and the VM
//! (§4.4's "Bytecode format").
//!
//! A [`Chunk`] is a flat byte stream plus a constant pool and a parallel
//! line table. There is no intermediate tree form between the AST and
//! bytecode - `reyna-compile` walks the AST once, emitting instructions
//! directly and back-patching jump targets after the fact.

mod chunk;
mod disassemble;
mod opcode;
mod value;

pub use chunk::Chunk;
pub use disassemble::disassemble;
pub use opcode::{InvalidOpcode, OpCode};
pub use value::{Constant, FunctionKind, FunctionProto, UpvalueDesc};
