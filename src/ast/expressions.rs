use crate::{lexer::tokens::TokenKind, Position};

use super::{ast::Expr, types::Type};

// Every expression carries `ty`, unresolved after parsing and filled in by
// the analyzer.

// LITERALS

#[derive(Debug, Clone, PartialEq)]
pub struct IntExpr {
    pub value: i32,
    pub position: Position,
    pub ty: Type,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FloatExpr {
    pub value: f64,
    pub position: Position,
    pub ty: Type,
}

#[derive(Debug, Clone, PartialEq)]
pub struct StringExpr {
    pub value: String,
    pub position: Position,
    pub ty: Type,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BoolExpr {
    pub value: bool,
    pub position: Position,
    pub ty: Type,
}

/// `[length]T` or `[length]@T`; `array_type` is the resulting array type.
#[derive(Debug, Clone, PartialEq)]
pub struct ArrayLiteralExpr {
    pub length: Option<Box<Expr>>,
    pub array_type: Type,
    pub position: Position,
    pub ty: Type,
}

// COMPLEX

#[derive(Debug, Clone, PartialEq)]
pub struct VariableExpr {
    pub identifier: String,
    pub position: Position,
    pub ty: Type,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CallExpr {
    pub identifier: String,
    pub arguments: Vec<Expr>,
    pub position: Position,
    pub ty: Type,
}

/// Infix operators, assignments and the `<-` push.
#[derive(Debug, Clone, PartialEq)]
pub struct BinaryExpr {
    pub operator: TokenKind,
    pub left: Box<Expr>,
    pub right: Box<Expr>,
    pub position: Position,
    pub ty: Type,
}

/// Prefix `*` and `&`, postfix `?` and `->`.
#[derive(Debug, Clone, PartialEq)]
pub struct UnaryExpr {
    pub operator: TokenKind,
    pub operand: Box<Expr>,
    pub position: Position,
    pub ty: Type,
}

/// `<Type>operand`
#[derive(Debug, Clone, PartialEq)]
pub struct CastExpr {
    pub target: Type,
    pub operand: Box<Expr>,
    pub position: Position,
    pub ty: Type,
}

#[derive(Debug, Clone, PartialEq)]
pub struct IndexExpr {
    pub target: Box<Expr>,
    pub index: Box<Expr>,
    pub position: Position,
    pub ty: Type,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MemberExpr {
    pub target: Box<Expr>,
    pub member: String,
    pub position: Position,
    pub ty: Type,
}
