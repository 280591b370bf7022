// ABOUTME: Abstract syntax tree produced by the parser and consumed by the evaluator

use std::rc::Rc;

/// The target of an assignment: a bare name, or a (possibly multi-level)
/// subscript into an array.
#[derive(Debug, Clone, PartialEq)]
pub enum AssignTarget {
    Name(String),
    Subscript(String, Vec<Expr>),
}

#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    IntLit(i64),
    DoubleLit(f64),
    StrLit(String),
    BoolLit(bool),
    Var(String),
    Subscript(String, Vec<Expr>),
    BinOp(BinOp, Box<Expr>, Box<Expr>),
    RelOp(RelOp, Box<Expr>, Box<Expr>),
    And(Box<Expr>, Box<Expr>),
    Or(Box<Expr>, Box<Expr>),
    Xor(Box<Expr>, Box<Expr>),
    Not(Box<Expr>),
    Neg(Box<Expr>),
    Call(String, Vec<Expr>),
    ArrayInit(Box<Expr>, Option<Box<Expr>>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinOp {
    Add,
    Sub,
    Mul,
    Div,
    FloorDiv,
    Mod,
    BitAnd,
    BitOr,
    BitXor,
    Shl,
    Shr,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelOp {
    Gt,
    Lt,
    Ge,
    Le,
    Eq,
    Ne,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Stmt {
    Assign(AssignTarget, Expr),
    Compound(Box<Stmt>, Box<Stmt>),
    If(Expr, Box<Stmt>, Option<Box<Stmt>>),
    While(Expr, Box<Stmt>),
    For(
        Option<Box<Stmt>>,
        Option<Expr>,
        Option<Box<Stmt>>,
        Box<Stmt>,
    ),
    FuncDecl(String, Vec<String>, Rc<Stmt>),
    LambdaDecl(Vec<String>, Rc<Stmt>),
    Call(String, Vec<Expr>),
    Return(Expr),
    Expr(Expr),
}
