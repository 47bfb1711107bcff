use reyna_bytecode::{Constant, OpCode};
use reyna_parse::{BinOp, Expr, Literal, LogicalOp, MatchArm, Stmt, UnOp};

use crate::Compiler;

impl<'a> Compiler<'a> {
    /// Compiles an expression so it leaves exactly one value on the stack.
    pub(crate) fn compile_expr(&mut self, expr: &Expr) {
        match expr {
            Expr::Literal(lit) => self.compile_literal(lit),
            Expr::Variable(name) => self.emit_get_name(*name),
            Expr::This => {
                let this = self.this_sym;
                self.emit_get_name(this);
            }
            Expr::Binary { op, left, right } => {
                self.compile_expr(left);
                self.compile_expr(right);
                self.compile_binop(op);
            }
            Expr::Unary { op, operand } => {
                self.compile_expr(operand);
                match op {
                    UnOp::Not => self.emit_op(OpCode::Not),
                    UnOp::Neg => self.emit_op(OpCode::Negate),
                };
            }
            Expr::Logical { op, left, right } => self.compile_logical(op, left, right),
            Expr::Grouping(inner) => self.compile_expr(inner),
            Expr::Assign { target, value } => self.compile_assign(target, value),
            Expr::Call { callee, args } => self.compile_call(callee, args),
            Expr::Get { object, name } => {
                self.compile_expr(object);
                let k = self.identifier_constant(*name);
                self.emit_op(OpCode::GetField);
                self.emit_byte(k);
            }
            Expr::Set { object, name, value } => {
                self.compile_expr(object);
                self.compile_expr(value);
                let k = self.identifier_constant(*name);
                self.emit_op(OpCode::SetField);
                self.emit_byte(k);
            }
            Expr::SuperGet { method } => self.compile_super_get(*method),
            Expr::ArrayLiteral(elements) => {
                for e in elements {
                    self.compile_expr(e);
                }
                self.emit_op(OpCode::BuildArray);
                self.emit_byte(elements.len() as u8);
            }
            Expr::Index { object, index } => {
                self.compile_expr(object);
                self.compile_expr(index);
                self.emit_op(OpCode::GetIndex);
            }
            Expr::IndexSet { object, index, value } => {
                self.compile_expr(object);
                self.compile_expr(index);
                self.compile_expr(value);
                self.emit_op(OpCode::SetIndex);
            }
            Expr::Match { subject, arms } => self.compile_match(subject, arms),
            // `await` has no scheduler in this VM (§4.6 Non-goals); it
            // compiles straight through to its inner expression's value.
            Expr::Await(inner) => self.compile_expr(inner),
        }
    }

    fn compile_literal(&mut self, lit: &Literal) {
        match lit {
            Literal::Integer(n) => {
                let k = self.chunk_mut().add_constant(Constant::Int64(*n));
                self.emit_op(OpCode::Constant);
                self.emit_byte(k);
            }
            Literal::Float(n) => {
                let k = self.chunk_mut().add_constant(Constant::Float64(*n));
                self.emit_op(OpCode::Constant);
                self.emit_byte(k);
            }
            Literal::Str(sym) => {
                let k = self.chunk_mut().add_constant(Constant::Str(*sym));
                self.emit_op(OpCode::Constant);
                self.emit_byte(k);
            }
            Literal::Bool(true) => {
                self.emit_op(OpCode::True);
            }
            Literal::Bool(false) => {
                self.emit_op(OpCode::False);
            }
            Literal::Nil => {
                self.emit_op(OpCode::Nil);
            }
        };
    }

    fn compile_binop(&mut self, op: &BinOp) {
        let op = match op {
            BinOp::Add => OpCode::Add,
            BinOp::Sub => OpCode::Subtract,
            BinOp::Mul => OpCode::Multiply,
            BinOp::Div => OpCode::Divide,
            BinOp::Eq => OpCode::Equal,
            BinOp::NotEq => {
                self.emit_op(OpCode::Equal);
                self.emit_op(OpCode::Not);
                return;
            }
            BinOp::Less => OpCode::Less,
            BinOp::Greater => OpCode::Greater,
            BinOp::LessEq => {
                self.emit_op(OpCode::Greater);
                self.emit_op(OpCode::Not);
                return;
            }
            BinOp::GreaterEq => {
                self.emit_op(OpCode::Less);
                self.emit_op(OpCode::Not);
                return;
            }
        };
        self.emit_op(op);
    }

    /// Short-circuiting `and`/`or` (§4.2): `or` jumps past the right
    /// operand when the left is already truthy, `and` when it's falsy.
    fn compile_logical(&mut self, op: &LogicalOp, left: &Expr, right: &Expr) {
        self.compile_expr(left);
        match op {
            LogicalOp::And => {
                let short_circuit = self.emit_jump(OpCode::JumpIfFalse);
                self.emit_op(OpCode::Pop);
                self.compile_expr(right);
                self.patch_jump(short_circuit);
            }
            LogicalOp::Or => {
                let else_jump = self.emit_jump(OpCode::JumpIfFalse);
                let end_jump = self.emit_jump(OpCode::Jump);
                self.patch_jump(else_jump);
                self.emit_op(OpCode::Pop);
                self.compile_expr(right);
                self.patch_jump(end_jump);
            }
        }
    }

    fn compile_assign(&mut self, target: &Expr, value: &Expr) {
        match target {
            Expr::Variable(name) => {
                self.compile_expr(value);
                self.emit_set_name(*name);
            }
            _ => unreachable!("the parser only ever rewrites assignment targets to Variable/Get/Set/Index/IndexSet"),
        }
    }

    fn compile_call(&mut self, callee: &Expr, args: &[Expr]) {
        self.compile_expr(callee);
        for arg in args {
            self.compile_expr(arg);
        }
        self.emit_op(OpCode::Call);
        self.emit_byte(args.len() as u8);
    }

    /// `super.m`: push `this`, then the enclosing method's captured
    /// `super` upvalue, then `GET_SUPER <name>` (§4.4).
    fn compile_super_get(&mut self, method: reyna_util::Symbol) {
        if self.classes.last().map(|c| c.has_superclass) != Some(true) {
            self.handler.error("'super' used outside a subclass method", reyna_util::Span::DUMMY);
        }
        let this = self.this_sym;
        let superc = self.super_sym;
        self.emit_get_name(this);
        self.emit_get_name(superc);
        let k = self.identifier_constant(method);
        self.emit_op(OpCode::GetSuper);
        self.emit_byte(k);
    }

    /// Evaluates a statement list so it leaves exactly one value on the
    /// stack - used for match arm bodies (§4.4 "Match"), which may be a
    /// block or a bare expression. The trailing statement, if it's an
    /// expression statement, supplies the result; anything else (a bare
    /// block ending in e.g. a `let`) falls back to `nil`.
    pub(crate) fn compile_expr_block(&mut self, body: &[Stmt]) {
        self.begin_scope();
        match body.split_last() {
            None => self.emit_op(OpCode::Nil),
            Some((last, init)) => {
                for stmt in init {
                    self.compile_stmt(stmt);
                }
                match last {
                    Stmt::Expr(e) => self.compile_expr(e),
                    other => {
                        self.compile_stmt(other);
                        self.emit_op(OpCode::Nil);
                    }
                };
            }
        }
        self.end_scope_preserving_top();
    }

    /// Lowers `match` to a chain of equality tests against the subject,
    /// per §4.4: the subject expression is recompiled fresh for each arm
    /// rather than cached in a local, so a subject with a side effect
    /// (e.g. a call) runs it once per arm, not once overall. Each arm
    /// compares, optionally ANDs a guard, and leaves exactly one value
    /// on the stack for the whole expression.
    fn compile_match(&mut self, subject: &Expr, arms: &[MatchArm]) {
        let mut end_jumps = Vec::new();
        for arm in arms {
            self.compile_expr(subject);
            self.compile_expr(&arm.pattern);
            self.emit_op(OpCode::Equal);

            let fail_jump = self.emit_jump(OpCode::JumpIfFalse);
            self.emit_op(OpCode::Pop);

            if let Some(guard) = &arm.guard {
                self.compile_expr(guard);
                let guard_fail_jump = self.emit_jump(OpCode::JumpIfFalse);
                self.emit_op(OpCode::Pop);
                self.compile_expr_block(&arm.body);
                let end_jump = self.emit_jump(OpCode::Jump);
                end_jumps.push(end_jump);
                self.patch_jump(guard_fail_jump);
                self.emit_op(OpCode::Pop);
                self.patch_jump(fail_jump);
                self.emit_op(OpCode::Pop);
            } else {
                self.compile_expr_block(&arm.body);
                let end_jump = self.emit_jump(OpCode::Jump);
                end_jumps.push(end_jump);
                self.patch_jump(fail_jump);
                self.emit_op(OpCode::Pop);
            }
        }
        // No arm matched: the expression still has to leave a value.
        self.emit_op(OpCode::Nil);
        for j in end_jumps {
            self.patch_jump(j);
        }
    }
}
