//! reyna-compile - lowers the checked AST straight into bytecode (§4.4).
//!
//! There is no intermediate IR: the compiler walks each declaration once,
//! emitting instructions into a [`Chunk`] and tracking only *local*
//! declarations (names, lexical depth, captured-by-closure flag) well
//! enough to assign stack slots. A stack of [`FunctionState`] values
//! mirrors the nesting of function declarations in source; resolving a
//! name against an enclosing state is how closures capture their
//! upvalues.

mod error;
mod expr;
mod import;
mod resolve;
mod state;
mod stmt;

use std::path::PathBuf;
use std::rc::Rc;

use reyna_bytecode::{Chunk, Constant, FunctionKind, FunctionProto, OpCode, UpvalueDesc};
use reyna_parse::Stmt;
use reyna_util::{Handler, Interner, Symbol};

pub use error::CompileError;

use state::{ClassCompiler, FunctionState, Local};

pub struct Compiler<'a> {
    states: Vec<FunctionState>,
    classes: Vec<ClassCompiler>,
    handler: &'a Handler,
    interner: &'a mut Interner,
    base_dir: PathBuf,
    visited_imports: std::collections::HashSet<String>,
    this_sym: Symbol,
    super_sym: Symbol,
}

/// Compiles a whole program as the implicit top-level "script" function
/// (arity 0, receiver slot holds the script's own closure). Returns
/// `None` if the handler already carries errors raised during compiling
/// itself (import I/O failures are reported through the handler too, so
/// callers only need to check [`Handler::has_errors`] afterward).
pub fn compile(
    program: &[Stmt],
    handler: &Handler,
    interner: &mut Interner,
    base_dir: PathBuf,
) -> Option<Rc<FunctionProto>> {
    let mut compiler = Compiler::new(handler, interner, base_dir);
    let proto = compiler.compile_script(program);
    if handler.has_errors() {
        None
    } else {
        let proto = Rc::new(proto);
        tracing::debug!(chunks = count_chunks(&proto), "compile emitted chunks");
        Some(proto)
    }
}

/// Counts `proto`'s own chunk plus every chunk nested under a
/// `Constant::Function` it carries, recursively, for the phase-transition
/// log line emitted once compilation succeeds.
fn count_chunks(proto: &FunctionProto) -> usize {
    1 + proto
        .chunk
        .constants
        .iter()
        .filter_map(|c| match c {
            Constant::Function(inner) => Some(count_chunks(inner)),
            _ => None,
        })
        .sum::<usize>()
}

impl<'a> Compiler<'a> {
    fn new(handler: &'a Handler, interner: &'a mut Interner, base_dir: PathBuf) -> Self {
        let this_sym = interner.intern("this");
        let super_sym = interner.intern("super");
        let script_name = interner.intern("<script>");
        Self {
            states: vec![FunctionState::new(script_name, FunctionKind::Function, 0, script_name)],
            classes: Vec::new(),
            handler,
            interner,
            base_dir,
            visited_imports: std::collections::HashSet::new(),
            this_sym,
            super_sym,
        }
    }

    fn compile_script(&mut self, program: &[Stmt]) -> FunctionProto {
        for stmt in program {
            self.compile_stmt(stmt);
        }
        self.finish_function()
    }

    fn state(&self) -> &FunctionState {
        self.states.last().expect("at least one function state")
    }

    fn state_mut(&mut self) -> &mut FunctionState {
        self.states.last_mut().expect("at least one function state")
    }

    fn chunk_mut(&mut self) -> &mut Chunk {
        &mut self.state_mut().chunk
    }

    fn emit_op(&mut self, op: OpCode) -> usize {
        self.chunk_mut().write_op(op, 0)
    }

    fn emit_byte(&mut self, byte: u8) -> usize {
        self.chunk_mut().write_byte(byte, 0)
    }

    fn emit_jump(&mut self, op: OpCode) -> usize {
        self.emit_op(op);
        self.chunk_mut().write_u16_placeholder(0)
    }

    fn patch_jump(&mut self, at: usize) {
        self.chunk_mut().patch_jump(at);
    }

    fn emit_loop(&mut self, loop_start: usize) {
        let start = self.chunk_mut().code.len();
        self.emit_op(OpCode::Loop);
        let distance = start + 3 - loop_start;
        self.chunk_mut().write_u16(distance as u16, 0);
    }

    fn identifier_constant(&mut self, name: Symbol) -> u8 {
        self.chunk_mut().add_constant(Constant::Str(name))
    }

    fn begin_scope(&mut self) {
        self.state_mut().scope_depth += 1;
    }

    /// Ends a scope whose locals sit directly under the result of a
    /// statement block (ordinary case: no value to preserve). Emits one
    /// `POP`/`CLOSE_UPVALUE` per local going out of scope (§7's "every
    /// block scope guarantees its locals are popped and any captured
    /// locals are closed").
    fn end_scope(&mut self) {
        self.state_mut().scope_depth -= 1;
        let depth = self.state().scope_depth;
        while let Some(local) = self.state().locals.last() {
            if local.depth <= depth {
                break;
            }
            if local.is_captured {
                self.emit_op(OpCode::CloseUpvalue);
            } else {
                self.emit_op(OpCode::Pop);
            }
            self.state_mut().locals.pop();
        }
    }

    /// Ends a scope whose locals sit *under* a single already-pushed
    /// result value (match arms and the match subject's own scope, §4.4
    /// "Match"). Relocates the result into the lowest local's slot, then
    /// discards the remaining cells - there's no `SWAP` opcode, so the
    /// result has to borrow a slot rather than be shuffled past them.
    fn end_scope_preserving_top(&mut self) {
        self.state_mut().scope_depth -= 1;
        let depth = self.state().scope_depth;
        let mut base_slot = None;
        let mut count = 0u8;
        while let Some(local) = self.state().locals.last() {
            if local.depth <= depth {
                break;
            }
            base_slot = Some(self.state().locals.len() - 1);
            count += 1;
            self.state_mut().locals.pop();
        }
        let Some(base_slot) = base_slot else { return };
        self.emit_op(OpCode::SetLocal);
        self.emit_byte(base_slot as u8);
        for _ in 0..count {
            self.emit_op(OpCode::Pop);
        }
    }

    fn declare_local(&mut self, name: Symbol) -> u8 {
        let depth = self.state().scope_depth;
        self.state_mut().locals.push(Local { name, depth, is_captured: false });
        (self.state().locals.len() - 1) as u8
    }

    /// Appends the implicit trailing return (§4.4): `GET_LOCAL 0; RETURN`
    /// for an initializer (so `new Foo()` yields the instance even if
    /// `init` never explicitly returns), `NIL; RETURN` otherwise.
    fn finish_function(&mut self) -> FunctionProto {
        if self.state().kind == FunctionKind::Initializer {
            self.emit_op(OpCode::GetLocal);
            self.emit_byte(0);
        } else {
            self.emit_op(OpCode::Nil);
        }
        self.emit_op(OpCode::Return);
        let state = self.states.pop().expect("a function state to finish");
        FunctionProto { name: state.name, arity: state.arity, upvalues: state.upvalues, chunk: state.chunk, kind: state.kind }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reyna_bytecode::disassemble;
    use reyna_lex::Lexer;
    use reyna_parse::Parser;

    fn compile_src(src: &str) -> (Rc<FunctionProto>, bool) {
        let handler = Handler::new();
        let mut interner = Interner::new();
        let tokens = Lexer::new(src, &handler, &mut interner).tokenize();
        let program = Parser::new(tokens, &handler, &interner).parse_program();
        let proto = compile(&program, &handler, &mut interner, PathBuf::from("."));
        (proto.expect("compiles cleanly"), handler.has_errors())
    }

    #[test]
    fn arithmetic_emits_expected_opcodes() {
        let (proto, errored) = compile_src("let x: int64 = 1 + 2;");
        assert!(!errored);
        let text = disassemble(&proto.chunk, "test");
        assert!(text.contains("Add"));
        assert!(text.contains("DefineGlobal"));
    }

    #[test]
    fn while_loop_emits_a_backward_loop_instruction() {
        let (proto, _) = compile_src("while (true) { print 1; }");
        let text = disassemble(&proto.chunk, "test");
        assert!(text.contains("Loop"));
        assert!(text.contains("JumpIfFalse"));
    }

    #[test]
    fn nested_closure_captures_an_upvalue() {
        let (proto, errored) = compile_src(
            "fn outer() { let x: int64 = 1; fn inner() -> int64 { return x; } return inner; } outer();",
        );
        assert!(!errored);
        let text = disassemble(&proto.chunk, "test");
        assert!(text.contains("Closure"));
    }

    #[test]
    fn match_expression_compiles_to_equality_chain() {
        let (proto, errored) = compile_src("let y: int64 = match 1 { 1 => 2, _ => 3 };");
        assert!(!errored);
        let text = disassemble(&proto.chunk, "test");
        assert!(text.contains("Equal"));
    }

    #[test]
    fn class_with_method_emits_method_and_closure() {
        let (proto, errored) = compile_src("class Foo { fn bar() { print 1; } }");
        assert!(!errored);
        let text = disassemble(&proto.chunk, "test");
        assert!(text.contains("Class"));
        assert!(text.contains("Method"));
    }
}
