use reyna_bytecode::{OpCode, UpvalueDesc};
use reyna_util::Symbol;

use crate::Compiler;

impl<'a> Compiler<'a> {
    /// Searches the innermost function's locals from the end, matching
    /// §4.4 step 1's "innermost to outermost" within one function (later
    /// declarations shadow earlier ones).
    fn resolve_local(&self, state_idx: usize, name: Symbol) -> Option<u8> {
        self.states[state_idx].locals.iter().rposition(|l| l.name == name).map(|i| i as u8)
    }

    /// Climbs the chain of enclosing function states (§4.4 step 2): if
    /// `name` is a local in the immediately enclosing state, mark it
    /// captured and record a direct upvalue; otherwise recurse, which
    /// chains an indirect upvalue through every intervening state.
    fn resolve_upvalue(&mut self, state_idx: usize, name: Symbol) -> Option<u8> {
        if state_idx == 0 {
            return None;
        }
        let enclosing = state_idx - 1;
        if let Some(local) = self.resolve_local(enclosing, name) {
            self.states[enclosing].locals[local as usize].is_captured = true;
            return Some(self.add_upvalue(state_idx, UpvalueDesc { is_local: true, index: local }));
        }
        if let Some(upvalue) = self.resolve_upvalue(enclosing, name) {
            return Some(self.add_upvalue(state_idx, UpvalueDesc { is_local: false, index: upvalue }));
        }
        None
    }

    fn add_upvalue(&mut self, state_idx: usize, desc: UpvalueDesc) -> u8 {
        let upvalues = &mut self.states[state_idx].upvalues;
        if let Some(existing) = upvalues.iter().position(|u| *u == desc) {
            return existing as u8;
        }
        upvalues.push(desc);
        (upvalues.len() - 1) as u8
    }

    /// Emits the read side of name resolution: local, then upvalue, then
    /// global (§4.4 step 3).
    pub(crate) fn emit_get_name(&mut self, name: Symbol) {
        let current = self.states.len() - 1;
        if let Some(slot) = self.resolve_local(current, name) {
            self.emit_op(OpCode::GetLocal);
            self.emit_byte(slot);
        } else if let Some(up) = self.resolve_upvalue(current, name) {
            self.emit_op(OpCode::GetUpvalue);
            self.emit_byte(up);
        } else {
            let k = self.identifier_constant(name);
            self.emit_op(OpCode::GetGlobal);
            self.emit_byte(k);
        }
    }

    /// Emits the write side; the value to assign must already be on top
    /// of the stack (SET_LOCAL/SET_UPVALUE/SET_GLOBAL all leave it there,
    /// matching assignment-expression semantics).
    pub(crate) fn emit_set_name(&mut self, name: Symbol) {
        let current = self.states.len() - 1;
        if let Some(slot) = self.resolve_local(current, name) {
            self.emit_op(OpCode::SetLocal);
            self.emit_byte(slot);
        } else if let Some(up) = self.resolve_upvalue(current, name) {
            self.emit_op(OpCode::SetUpvalue);
            self.emit_byte(up);
        } else {
            let k = self.identifier_constant(name);
            self.emit_op(OpCode::SetGlobal);
            self.emit_byte(k);
        }
    }
}
