use reyna_util::Symbol;

/// A type annotation as written in source: `: T` on a `let`/parameter, or
/// `-> T` on a function. §4.3 collapses anything it can't make sense of to
/// `Any`, but the parser itself only ever produces the concrete variants
/// below - `Any` is purely a type-checker construct (see `reyna-check`).
#[derive(Clone, Debug, PartialEq)]
pub enum TypeName {
    Int64,
    Float64,
    Bool,
    String,
    /// A `fn` value of any arity (the language has no function-type
    /// signatures, only "this is a closure" - see seed scenario 2).
    Fn,
    /// A struct or class name.
    Named(Symbol),
}

#[derive(Clone, Debug, PartialEq)]
pub struct Param {
    pub name: Symbol,
    pub ty: TypeName,
}

#[derive(Clone, Debug, PartialEq)]
pub struct FunctionDecl {
    pub name: Symbol,
    pub params: Vec<Param>,
    pub return_ty: Option<TypeName>,
    pub body: Vec<Stmt>,
    pub is_async: bool,
}

#[derive(Clone, Debug, PartialEq)]
pub struct ClassDecl {
    pub name: Symbol,
    pub superclass: Option<Symbol>,
    pub methods: Vec<FunctionDecl>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct StructDecl {
    pub name: Symbol,
    pub fields: Vec<(Symbol, TypeName)>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct MatchArm {
    pub pattern: Expr,
    pub guard: Option<Expr>,
    /// A block arm desugars to `{ stmts...; last_expr }`; an expression
    /// arm is a single-element body.
    pub body: Vec<Stmt>,
}

#[derive(Clone, Debug, PartialEq)]
pub enum Stmt {
    Function(FunctionDecl),
    Struct(StructDecl),
    Class(ClassDecl),
    Let { name: Symbol, ty: Option<TypeName>, init: Option<Expr> },
    Block(Vec<Stmt>),
    If { cond: Expr, then_branch: Vec<Stmt>, else_branch: Option<Vec<Stmt>> },
    While { cond: Expr, body: Vec<Stmt> },
    Return(Option<Expr>),
    Expr(Expr),
    Print(Expr),
    Import { path: String, names: Option<Vec<Symbol>> },
    Try { body: Vec<Stmt>, catch_name: Symbol, catch_body: Vec<Stmt>, finally_body: Option<Vec<Stmt>> },
    Throw(Expr),
}

#[derive(Clone, Debug, PartialEq)]
pub enum BinOp {
    Add,
    Sub,
    Mul,
    Div,
    Eq,
    NotEq,
    Less,
    LessEq,
    Greater,
    GreaterEq,
}

#[derive(Clone, Debug, PartialEq)]
pub enum UnOp {
    Not,
    Neg,
}

#[derive(Clone, Debug, PartialEq)]
pub enum LogicalOp {
    And,
    Or,
}

#[derive(Clone, Debug, PartialEq)]
pub enum Literal {
    Integer(i64),
    Float(f64),
    Str(Symbol),
    Bool(bool),
    Nil,
}

#[derive(Clone, Debug, PartialEq)]
pub enum Expr {
    Literal(Literal),
    Variable(Symbol),
    This,
    Binary { op: BinOp, left: Box<Expr>, right: Box<Expr> },
    Unary { op: UnOp, operand: Box<Expr> },
    Logical { op: LogicalOp, left: Box<Expr>, right: Box<Expr> },
    Grouping(Box<Expr>),
    Assign { target: Box<Expr>, value: Box<Expr> },
    Call { callee: Box<Expr>, args: Vec<Expr> },
    Get { object: Box<Expr>, name: Symbol },
    Set { object: Box<Expr>, name: Symbol, value: Box<Expr> },
    SuperGet { method: Symbol },
    ArrayLiteral(Vec<Expr>),
    Index { object: Box<Expr>, index: Box<Expr> },
    IndexSet { object: Box<Expr>, index: Box<Expr>, value: Box<Expr> },
    Match { subject: Box<Expr>, arms: Vec<MatchArm> },
    Await(Box<Expr>),
}
