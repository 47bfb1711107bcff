use reyna_bytecode::{Constant, FunctionKind, OpCode};
use reyna_parse::{ClassDecl, FunctionDecl, Stmt};
use reyna_util::Symbol;

use crate::state::{ClassCompiler, FunctionState};
use crate::Compiler;

impl<'a> Compiler<'a> {
    pub(crate) fn compile_stmt(&mut self, stmt: &Stmt) {
        match stmt {
            Stmt::Function(decl) => self.compile_function_decl(decl),
            Stmt::Struct(decl) => self.compile_struct_decl(decl.name),
            Stmt::Class(decl) => self.compile_class(decl),
            Stmt::Let { name, init, .. } => self.compile_let(*name, init.as_ref()),
            Stmt::Block(stmts) => {
                self.begin_scope();
                for s in stmts {
                    self.compile_stmt(s);
                }
                self.end_scope();
            }
            Stmt::If { cond, then_branch, else_branch } => self.compile_if(cond, then_branch, else_branch.as_deref()),
            Stmt::While { cond, body } => self.compile_while(cond, body),
            Stmt::Return(value) => self.compile_return(value.as_ref()),
            Stmt::Expr(expr) => {
                self.compile_expr(expr);
                self.emit_op(OpCode::Pop);
            }
            Stmt::Print(expr) => {
                self.compile_expr(expr);
                self.emit_op(OpCode::Print);
            }
            Stmt::Import { path, .. } => self.compile_import(path),
            Stmt::Try { body, catch_name, catch_body, finally_body } => {
                self.compile_try(body, *catch_name, catch_body, finally_body.as_deref())
            }
            Stmt::Throw(expr) => {
                self.compile_expr(expr);
                self.emit_op(OpCode::Throw);
            }
        }
    }

    fn compile_let(&mut self, name: Symbol, init: Option<&reyna_parse::Expr>) {
        match init {
            Some(expr) => self.compile_expr(expr),
            None => {
                self.emit_op(OpCode::Nil);
            }
        };
        if self.state().scope_depth == 0 {
            let k = self.identifier_constant(name);
            self.emit_op(OpCode::DefineGlobal);
            self.emit_byte(k);
        } else {
            self.declare_local(name);
        }
    }

    fn compile_if(&mut self, cond: &reyna_parse::Expr, then_branch: &[Stmt], else_branch: Option<&[Stmt]>) {
        self.compile_expr(cond);
        let then_jump = self.emit_jump(OpCode::JumpIfFalse);
        self.emit_op(OpCode::Pop);
        self.begin_scope();
        for s in then_branch {
            self.compile_stmt(s);
        }
        self.end_scope();
        let else_jump = self.emit_jump(OpCode::Jump);
        self.patch_jump(then_jump);
        self.emit_op(OpCode::Pop);
        if let Some(else_branch) = else_branch {
            self.begin_scope();
            for s in else_branch {
                self.compile_stmt(s);
            }
            self.end_scope();
        }
        self.patch_jump(else_jump);
    }

    fn compile_while(&mut self, cond: &reyna_parse::Expr, body: &[Stmt]) {
        let loop_start = self.chunk_mut().current_offset();
        self.compile_expr(cond);
        let exit_jump = self.emit_jump(OpCode::JumpIfFalse);
        self.emit_op(OpCode::Pop);
        self.begin_scope();
        for s in body {
            self.compile_stmt(s);
        }
        self.end_scope();
        self.emit_loop(loop_start);
        self.patch_jump(exit_jump);
        self.emit_op(OpCode::Pop);
    }

    fn compile_return(&mut self, value: Option<&reyna_parse::Expr>) {
        match value {
            Some(expr) if self.state().kind == FunctionKind::Initializer => {
                // an initializer always returns `this`, matching the
                // implicit-return convention (§4.4); an explicit `return
                // expr;` still evaluates `expr` for its side effects but
                // discards the value.
                self.compile_expr(expr);
                self.emit_op(OpCode::Pop);
                self.emit_op(OpCode::GetLocal);
                self.emit_byte(0);
            }
            Some(expr) => self.compile_expr(expr),
            None if self.state().kind == FunctionKind::Initializer => {
                self.emit_op(OpCode::GetLocal);
                self.emit_byte(0);
            }
            None => {
                self.emit_op(OpCode::Nil);
            }
        }
        self.emit_op(OpCode::Return);
    }

    /// `try`/`catch`/`finally` (§4.4): `finally` is emitted once, inline,
    /// after the catch block's straight-line path - if `catch` itself
    /// throws, the exception propagates to the next outer handler and
    /// `finally` never runs (the expanded spec's resolution for an
    /// ambiguity the base spec left open).
    fn compile_try(&mut self, body: &[Stmt], catch_name: Symbol, catch_body: &[Stmt], finally_body: Option<&[Stmt]>) {
        let catch_jump = self.emit_jump(OpCode::TryBegin);
        self.begin_scope();
        for s in body {
            self.compile_stmt(s);
        }
        self.end_scope();
        self.emit_op(OpCode::TryEnd);
        let end_jump = self.emit_jump(OpCode::Jump);

        self.patch_jump(catch_jump);
        self.begin_scope();
        self.declare_local(catch_name);
        for s in catch_body {
            self.compile_stmt(s);
        }
        self.end_scope();

        self.patch_jump(end_jump);
        if let Some(finally_body) = finally_body {
            self.begin_scope();
            for s in finally_body {
                self.compile_stmt(s);
            }
            self.end_scope();
        }
    }

    fn compile_function_decl(&mut self, decl: &FunctionDecl) {
        self.compile_function(decl, FunctionKind::Function, None);
        if self.state().scope_depth == 0 {
            let k = self.identifier_constant(decl.name);
            self.emit_op(OpCode::DefineGlobal);
            self.emit_byte(k);
        } else {
            self.declare_local(decl.name);
        }
    }

    /// Compiles a function body in a fresh [`FunctionState`], emitting
    /// `CLOSURE <k>` with its upvalue pairs into the *enclosing* chunk
    /// (§4.4 "Functions and closures").
    pub(crate) fn compile_function(&mut self, decl: &FunctionDecl, kind: FunctionKind, receiver_name: Option<Symbol>) {
        // Slot 0 only needs a real name when it's `this`; for an
        // ordinary function nothing ever looks it up by name, so a
        // placeholder that can't collide with a real identifier is fine.
        let receiver = receiver_name.unwrap_or(Symbol::DUMMY);
        self.states.push(FunctionState::new(decl.name, kind, decl.params.len(), receiver));
        self.begin_scope();
        for param in &decl.params {
            self.declare_local(param.name);
        }
        for s in &decl.body {
            self.compile_stmt(s);
        }
        let proto = self.finish_function();
        let upvalues = proto.upvalues.clone();
        let k = self.chunk_mut().add_constant(Constant::Function(std::rc::Rc::new(proto)));
        self.emit_op(OpCode::Closure);
        self.emit_byte(k);
        for up in upvalues {
            self.emit_byte(up.is_local as u8);
            self.emit_byte(up.index);
        }
    }

    fn compile_struct_decl(&mut self, name: Symbol) {
        let k = self.identifier_constant(name);
        self.emit_op(OpCode::Struct);
        self.emit_byte(k);
        if self.state().scope_depth == 0 {
            self.emit_op(OpCode::DefineGlobal);
            self.emit_byte(k);
        } else {
            self.declare_local(name);
        }
    }

    /// `class Foo < Bar { ... }` (§4.4 "Classes"): the class is always
    /// defined as a global, regardless of lexical nesting, then each
    /// method is compiled and attached via `METHOD`.
    fn compile_class(&mut self, decl: &ClassDecl) {
        let name_k = self.identifier_constant(decl.name);
        self.emit_op(OpCode::Class);
        self.emit_byte(name_k);
        self.emit_op(OpCode::DefineGlobal);
        self.emit_byte(name_k);

        let has_superclass = decl.superclass.is_some();
        if let Some(superclass) = decl.superclass {
            self.emit_get_name(superclass);
            self.begin_scope();
            let super_sym = self.super_sym;
            self.declare_local(super_sym);
            self.emit_get_name(decl.name);
            self.emit_op(OpCode::Inherit);
        }

        self.classes.push(ClassCompiler { has_superclass });
        for method in &decl.methods {
            let is_init = self.interner.resolve(method.name) == "init";
            let kind = if is_init { FunctionKind::Initializer } else { FunctionKind::Method };
            self.emit_get_name(decl.name);
            self.compile_function(method, kind, Some(self.this_sym));
            let method_k = self.identifier_constant(method.name);
            self.emit_op(OpCode::Method);
            self.emit_byte(method_k);
            self.emit_op(OpCode::Pop);
        }
        self.classes.pop();

        if has_superclass {
            self.end_scope();
        }
    }
}
