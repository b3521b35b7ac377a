//! The abstract syntax tree produced by the parser.
//!
//! The tree is an immutable value tree: the analyzer reads it and builds the
//! symbol table, the evaluator walks method bodies shared out of the symbol
//! table via `Rc`. Every node carries a [`Position`].

use std::rc::Rc;

use crate::{builtins::BuiltinMethod, diagnostics::Position};

/// A whole compilation unit, classes in source order.
#[derive(Debug, Clone, PartialEq)]
pub struct Program {
    pub classes: Vec<Class>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Class {
    pub name: Rc<str>,
    /// Declared parent. None means the class inherits from `Object`.
    pub inherits_from: Option<Rc<str>>,
    pub features: Vec<Feature>,
    pub position: Position,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Feature {
    Attribute(Attribute),
    Method(Method),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Attribute {
    pub name: Rc<str>,
    pub declared_type: Rc<str>,
    pub initializer: Option<ExprLoc>,
    /// Index among the attributes of the declaring class; slot layout and
    /// initialization order both follow it.
    pub source_order: u32,
    pub position: Position,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Method {
    pub name: Rc<str>,
    pub formals: Vec<Formal>,
    pub return_type: Rc<str>,
    pub body: ExprLoc,
    pub position: Position,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Formal {
    pub name: Rc<str>,
    pub declared_type: Rc<str>,
    pub position: Position,
}

/// An expression with its source location.
#[derive(Debug, Clone, PartialEq)]
pub struct ExprLoc {
    pub position: Position,
    pub expr: Expr,
}

impl ExprLoc {
    #[must_use]
    pub fn new(position: Position, expr: Expr) -> Self {
        Self { position, expr }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Lt,
    Le,
    Eq,
}

impl BinaryOp {
    /// The operator as written in source, for error messages.
    #[must_use]
    pub fn symbol(self) -> &'static str {
        match self {
            Self::Add => "+",
            Self::Sub => "-",
            Self::Mul => "*",
            Self::Div => "/",
            Self::Lt => "<",
            Self::Le => "<=",
            Self::Eq => "=",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    /// Integer negation, written `~`.
    Negate,
    /// Boolean complement, written `not`.
    Not,
}

impl UnaryOp {
    #[must_use]
    pub fn symbol(self) -> &'static str {
        match self {
            Self::Negate => "~",
            Self::Not => "not",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct LetBinding {
    pub id: Rc<str>,
    pub declared_type: Rc<str>,
    pub initializer: Option<ExprLoc>,
    pub position: Position,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CaseBranch {
    pub id: Rc<str>,
    pub declared_type: Rc<str>,
    pub body: ExprLoc,
    pub position: Position,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    /// `id <- value`
    Assign { id: Rc<str>, value: Box<ExprLoc> },
    /// `receiver.method(args)`, `receiver@Type.method(args)`, or the
    /// implicit-receiver form `method(args)` (receiver is `SelfRef`).
    Dispatch {
        receiver: Box<ExprLoc>,
        static_type: Option<Rc<str>>,
        method: Rc<str>,
        args: Vec<ExprLoc>,
    },
    If {
        pred: Box<ExprLoc>,
        then_branch: Box<ExprLoc>,
        else_branch: Box<ExprLoc>,
    },
    While { pred: Box<ExprLoc>, body: Box<ExprLoc> },
    /// `{ e1; e2; ... }`; non-empty by parser construction.
    Block { exprs: Vec<ExprLoc> },
    /// Bindings are non-empty by parser construction; each binding is
    /// visible to the bindings after it and to the body.
    Let {
        bindings: Vec<LetBinding>,
        body: Box<ExprLoc>,
    },
    /// Branches are non-empty by parser construction.
    Case {
        scrutinee: Box<ExprLoc>,
        branches: Vec<CaseBranch>,
    },
    New { type_name: Rc<str> },
    IsVoid { operand: Box<ExprLoc> },
    BinaryOp {
        op: BinaryOp,
        left: Box<ExprLoc>,
        right: Box<ExprLoc>,
    },
    UnaryOp { op: UnaryOp, operand: Box<ExprLoc> },
    IntLit(i64),
    StringLit(Rc<str>),
    BoolLit(bool),
    Identifier(Rc<str>),
    SelfRef,
    /// Placeholder for an absent attribute initializer.
    NoExpression,
    /// Synthesized body of a built-in method; never produced by the parser.
    Builtin(BuiltinMethod),
}
