//! reyna-check - single-pass type checker (§4.3).
//!
//! A lexical-scope walker over the AST: no rewriting, no separate HIR. It
//! carries a stack of name->type maps, a registry of function signatures,
//! a map of struct field types, and a set of class names, and walks each
//! top-level declaration once. Anything it can't pin down - an unknown
//! callee, a permissive class field access, a recovered error - collapses
//! to the top type `any`, which is compatible with everything so later
//! checks on the same flow don't cascade into noise.

mod scope;
mod types;

use rustc_hash::FxHashMap;

use reyna_parse::{BinOp, ClassDecl, Expr, FunctionDecl, Literal, LogicalOp, MatchArm, Stmt, StructDecl, TypeName, UnOp};
use reyna_util::{Handler, Interner, Span, Symbol};

pub use types::{FnSig, Type};

use scope::ScopeStack;

pub struct Checker<'a> {
    handler: &'a Handler,
    interner: &'a Interner,
    scopes: ScopeStack,
    functions: FxHashMap<Symbol, FnSig>,
    structs: FxHashMap<Symbol, FxHashMap<Symbol, Type>>,
    classes: FxHashMap<Symbol, Option<Symbol>>,
    /// The class name `this` resolves to, `None` outside any method.
    current_class: Option<Symbol>,
}

impl<'a> Checker<'a> {
    pub fn new(handler: &'a Handler, interner: &'a Interner) -> Self {
        Self {
            handler,
            interner,
            scopes: ScopeStack::new(),
            functions: FxHashMap::default(),
            structs: FxHashMap::default(),
            classes: FxHashMap::default(),
            current_class: None,
        }
    }

    /// Checks an entire program. Returns `true` iff no errors were
    /// reported; a failure aborts compilation (§4.3) - callers should
    /// check [`Handler::has_errors`] rather than trust this in isolation
    /// since diagnostics accumulate across the whole pass.
    pub fn check_program(&mut self, program: &[Stmt]) -> bool {
        self.register_top_level(program);
        for stmt in program {
            self.check_stmt(stmt);
        }
        !self.handler.has_errors()
    }

    fn to_type(&self, ty: &TypeName) -> Type {
        match ty {
            TypeName::Int64 => Type::Int64,
            TypeName::Float64 => Type::Float64,
            TypeName::Bool => Type::Bool,
            TypeName::String => Type::String,
            TypeName::Fn => Type::Fn,
            TypeName::Named(sym) => {
                if self.structs.contains_key(sym) {
                    Type::Struct(*sym)
                } else if self.classes.contains_key(sym) {
                    Type::Class(*sym)
                } else {
                    Type::Any
                }
            }
        }
    }

    /// A pre-pass registering every function signature, struct field map,
    /// and class name before any body is checked, so forward references
    /// and recursion resolve (§4.3).
    fn register_top_level(&mut self, program: &[Stmt]) {
        for stmt in program {
            match stmt {
                Stmt::Struct(StructDecl { name, fields }) => {
                    let field_map = fields.iter().map(|(n, t)| (*n, self.to_type(t))).collect();
                    self.structs.insert(*name, field_map);
                }
                Stmt::Class(ClassDecl { name, superclass, .. }) => {
                    self.classes.insert(*name, *superclass);
                }
                _ => {}
            }
        }
        for stmt in program {
            if let Stmt::Function(decl) = stmt {
                self.register_function(decl);
            }
        }
    }

    fn register_function(&mut self, decl: &FunctionDecl) {
        let params = decl.params.iter().map(|p| self.to_type(&p.ty)).collect();
        let return_ty = decl.return_ty.as_ref().map(|t| self.to_type(t)).unwrap_or(Type::Any);
        self.functions.insert(decl.name, FnSig { params, return_ty });
    }

    fn check_stmt(&mut self, stmt: &Stmt) {
        match stmt {
            Stmt::Function(decl) => self.check_function(decl, None),
            Stmt::Struct(_) => {}
            Stmt::Class(decl) => self.check_class(decl),
            Stmt::Let { name, ty, init } => self.check_let(*name, ty.as_ref(), init.as_ref()),
            Stmt::Block(stmts) => {
                self.scopes.push();
                for s in stmts {
                    self.check_stmt(s);
                }
                self.scopes.pop();
            }
            Stmt::If { cond, then_branch, else_branch } => {
                self.expect_bool(cond, "if condition");
                self.check_block(then_branch);
                if let Some(else_branch) = else_branch {
                    self.check_block(else_branch);
                }
            }
            Stmt::While { cond, body } => {
                self.expect_bool(cond, "while condition");
                self.check_block(body);
            }
            Stmt::Return(value) => {
                if let Some(value) = value {
                    self.check_expr(value);
                }
            }
            Stmt::Expr(expr) => {
                self.check_expr(expr);
            }
            Stmt::Print(expr) => {
                self.check_expr(expr);
            }
            Stmt::Import { .. } => {}
            Stmt::Try { body, catch_name, catch_body, finally_body } => {
                self.check_block(body);
                self.scopes.push();
                self.scopes.declare(*catch_name, Type::Any);
                for s in catch_body {
                    self.check_stmt(s);
                }
                self.scopes.pop();
                if let Some(finally_body) = finally_body {
                    self.check_block(finally_body);
                }
            }
            Stmt::Throw(expr) => {
                self.check_expr(expr);
            }
        }
    }

    fn check_block(&mut self, stmts: &[Stmt]) {
        self.scopes.push();
        for s in stmts {
            self.check_stmt(s);
        }
        self.scopes.pop();
    }

    fn check_let(&mut self, name: Symbol, ty: Option<&TypeName>, init: Option<&Expr>) {
        let init_ty = init.map(|e| self.check_expr(e));
        let declared = ty.map(|t| self.to_type(t));
        let final_ty = match (&declared, &init_ty) {
            (Some(declared), Some(actual)) => {
                if !actual.assignable_to(declared) {
                    self.error_name(name, format!("cannot assign {actual} to {declared}"));
                }
                declared.clone()
            }
            (Some(declared), None) => declared.clone(),
            (None, Some(actual)) => actual.clone(),
            (None, None) => Type::Any,
        };
        self.scopes.declare(name, final_ty);
    }

    /// `receiver` is the method's enclosing class, if any; it governs
    /// what `this` and bare `super.method` resolve to (§4.3), tracked on
    /// `current_class` rather than as a scope entry since `this` isn't a
    /// user-declared identifier.
    fn check_function(&mut self, decl: &FunctionDecl, receiver: Option<Symbol>) {
        self.scopes.push();
        for param in &decl.params {
            self.scopes.declare(param.name, self.to_type(&param.ty));
        }
        let prev = receiver.map(|class| self.current_class.replace(class));
        for stmt in &decl.body {
            self.check_stmt(stmt);
        }
        if receiver.is_some() {
            self.current_class = prev.flatten();
        }
        self.scopes.pop();
    }

    fn check_class(&mut self, decl: &ClassDecl) {
        for method in &decl.methods {
            self.check_function(method, Some(decl.name));
        }
    }

    fn expect_bool(&mut self, expr: &Expr, what: &str) {
        let ty = self.check_expr(expr);
        if ty != Type::Bool && ty != Type::Any {
            self.error_expr(expr, format!("{what} must be bool, got {ty}"));
        }
    }

    /// Infers and returns the static type of an expression, reporting any
    /// rule violation found along the way (§4.3).
    fn check_expr(&mut self, expr: &Expr) -> Type {
        match expr {
            Expr::Literal(lit) => self.check_literal(lit),
            Expr::Variable(name) => self.scopes.lookup(*name).cloned().unwrap_or(Type::Any),
            Expr::This => {
                if let Some(class) = self.current_class {
                    Type::Class(class)
                } else {
                    self.error_expr(expr, "'this' used outside a method");
                    Type::Any
                }
            }
            Expr::Binary { op, left, right } => self.check_binary(expr, op, left, right),
            Expr::Unary { op, operand } => self.check_unary(expr, op, operand),
            Expr::Logical { left, right, .. } => {
                self.check_expr(left);
                self.check_expr(right);
                Type::Bool
            }
            Expr::Grouping(inner) => self.check_expr(inner),
            Expr::Assign { target, value } => {
                let value_ty = self.check_expr(value);
                let target_ty = self.check_expr(target);
                if !value_ty.assignable_to(&target_ty) {
                    self.error_expr(expr, format!("cannot assign {value_ty} to {target_ty}"));
                }
                target_ty
            }
            Expr::Call { callee, args } => self.check_call(expr, callee, args),
            Expr::Get { object, name } => self.check_get(expr, object, *name),
            Expr::Set { object, name, value } => {
                let object_ty = self.check_get(expr, object, *name);
                let value_ty = self.check_expr(value);
                if !value_ty.assignable_to(&object_ty) {
                    self.error_expr(expr, format!("cannot assign {value_ty} to field of type {object_ty}"));
                }
                object_ty
            }
            Expr::SuperGet { .. } => {
                if self.current_class.is_none() {
                    self.error_expr(expr, "'super' used outside a method");
                }
                Type::Any
            }
            Expr::ArrayLiteral(elements) => {
                for e in elements {
                    self.check_expr(e);
                }
                Type::Any
            }
            Expr::Index { object, index } => {
                self.check_expr(object);
                self.check_expr(index);
                Type::Any
            }
            Expr::IndexSet { object, index, value } => {
                self.check_expr(object);
                self.check_expr(index);
                self.check_expr(value);
                Type::Any
            }
            Expr::Match { subject, arms } => {
                self.check_expr(subject);
                self.check_match_arms(arms);
                Type::Any
            }
            Expr::Await(inner) => self.check_expr(inner),
        }
    }

    fn check_match_arms(&mut self, arms: &[MatchArm]) {
        for arm in arms {
            self.check_expr(&arm.pattern);
            if let Some(guard) = &arm.guard {
                self.expect_bool(guard, "match guard");
            }
            self.check_block(&arm.body);
        }
    }

    fn check_literal(&self, lit: &Literal) -> Type {
        match lit {
            Literal::Integer(_) => Type::Int64,
            Literal::Float(_) => Type::Float64,
            Literal::Str(_) => Type::String,
            Literal::Bool(_) => Type::Bool,
            Literal::Nil => Type::Nil,
        }
    }

    fn check_binary(&mut self, expr: &Expr, op: &BinOp, left: &Expr, right: &Expr) -> Type {
        let lty = self.check_expr(left);
        let rty = self.check_expr(right);
        match op {
            BinOp::Add if lty == Type::String || rty == Type::String => Type::String,
            // DIVIDE is true division at runtime (§2 of the expanded
            // spec) and always produces float64, even for two int64s.
            BinOp::Div => {
                if !lty.is_numeric() || !rty.is_numeric() {
                    self.error_expr(expr, format!("arithmetic requires numeric operands, got {lty} and {rty}"));
                    return Type::Any;
                }
                Type::Float64
            }
            BinOp::Add | BinOp::Sub | BinOp::Mul => {
                if !lty.is_numeric() || !rty.is_numeric() {
                    self.error_expr(expr, format!("arithmetic requires numeric operands, got {lty} and {rty}"));
                    return Type::Any;
                }
                lty.numeric_join(&rty)
            }
            BinOp::Eq | BinOp::NotEq | BinOp::Less | BinOp::LessEq | BinOp::Greater | BinOp::GreaterEq => Type::Bool,
        }
    }

    fn check_unary(&mut self, expr: &Expr, op: &UnOp, operand: &Expr) -> Type {
        let ty = self.check_expr(operand);
        match op {
            UnOp::Not => {
                if ty != Type::Bool && ty != Type::Any {
                    self.error_expr(expr, format!("'!' requires bool, got {ty}"));
                }
                Type::Bool
            }
            UnOp::Neg => {
                if !ty.is_numeric() {
                    self.error_expr(expr, format!("unary '-' requires a numeric operand, got {ty}"));
                    return Type::Any;
                }
                ty
            }
        }
    }

    fn check_call(&mut self, expr: &Expr, callee: &Expr, args: &[Expr]) -> Type {
        let arg_types: Vec<Type> = args.iter().map(|a| self.check_expr(a)).collect();
        let name = match callee {
            Expr::Variable(name) => Some(*name),
            _ => {
                self.check_expr(callee);
                None
            }
        };
        let Some(name) = name else { return Type::Any };
        let Some(sig) = self.functions.get(&name).cloned() else {
            return Type::Any;
        };
        if sig.params.len() != arg_types.len() {
            self.error_expr(expr, format!("expected {} arguments, got {}", sig.params.len(), arg_types.len()));
            return sig.return_ty;
        }
        for (i, (actual, expected)) in arg_types.iter().zip(sig.params.iter()).enumerate() {
            if !actual.assignable_to(expected) {
                self.error_expr(expr, format!("argument {} expected {expected}, got {actual}", i + 1));
            }
        }
        sig.return_ty
    }

    /// Field access is strict on struct types (the field must exist and
    /// the access returns its declared type) and permissive on class
    /// types (always `any` - method dispatch is a runtime concern; see
    /// §4.3 and §4.5's `GET_FIELD` bound-method fallback).
    fn check_get(&mut self, expr: &Expr, object: &Expr, name: Symbol) -> Type {
        let object_ty = self.check_expr(object);
        match object_ty {
            Type::Struct(struct_name) => {
                let fields = self.structs.get(&struct_name);
                match fields.and_then(|f| f.get(&name)) {
                    Some(ty) => ty.clone(),
                    None => {
                        self.error_expr(expr, format!("no field '{}' on {struct_name}", self.interner.resolve(name)));
                        Type::Any
                    }
                }
            }
            Type::Class(_) | Type::Any => Type::Any,
            other => {
                self.error_expr(expr, format!("cannot access fields on {other}"));
                Type::Any
            }
        }
    }

    fn error_name(&self, _name: Symbol, message: impl Into<String>) {
        self.handler.error(message.into(), Span::DUMMY);
    }

    fn error_expr(&self, _expr: &Expr, message: impl Into<String>) {
        self.handler.error(message.into(), Span::DUMMY);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reyna_lex::Lexer;
    use reyna_parse::Parser;

    fn check(src: &str) -> bool {
        let handler = Handler::new();
        let mut interner = Interner::new();
        let tokens = Lexer::new(src, &handler, &mut interner).tokenize();
        let program = Parser::new(tokens, &handler, &interner).parse_program();
        let mut checker = Checker::new(&handler, &interner);
        checker.check_program(&program)
    }

    #[test]
    fn int_widens_to_float_on_let() {
        assert!(check("let x: float64 = 1;"));
    }

    #[test]
    fn mismatched_let_type_fails() {
        assert!(!check("let x: bool = 1;"));
    }

    #[test]
    fn string_concatenation_yields_string() {
        assert!(check(r#"let x: string = "a" + "b";"#));
    }

    #[test]
    fn if_condition_must_be_bool() {
        assert!(!check("if (1) { print 1; }"));
        assert!(check("if (true) { print 1; }"));
    }

    #[test]
    fn call_checks_argument_count() {
        assert!(!check("fn add(a: int64, b: int64) -> int64 { return a + b; } add(1);"));
        assert!(check("fn add(a: int64, b: int64) -> int64 { return a + b; } add(1, 2);"));
    }

    #[test]
    fn struct_field_access_is_checked() {
        assert!(check("struct Point { x: int64, y: int64 } let p: Point; p.x;"));
    }

    #[test]
    fn this_outside_method_is_an_error() {
        assert!(!check("this;"));
    }
}
