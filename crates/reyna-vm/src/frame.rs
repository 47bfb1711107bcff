use reyna_gc::GcRef;

use crate::object::Obj;

/// An activation record for one in-flight call (§GLOSSARY "Frame"): the
/// closure being executed, the instruction pointer into its chunk, and
/// the base index into the value stack (stack slot `base` holds the
/// receiver, §3).
#[derive(Debug)]
pub struct CallFrame {
    pub closure: GcRef<Obj>,
    pub ip: usize,
    pub base: usize,
}
