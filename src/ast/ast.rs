use crate::{lexer::tokens::TokenKind, Position};

use super::{
    expressions::{
        ArrayLiteralExpr, BinaryExpr, BoolExpr, CallExpr, CastExpr, FloatExpr, IndexExpr,
        IntExpr, MemberExpr, StringExpr, UnaryExpr, VariableExpr,
    },
    statements::{
        BranchStmt, ExpressionStmt, ExternDeclStmt, FnDeclStmt, Item, LinkStmt, LoopStmt,
        ReturnStmt, Stmt, StructDeclStmt, Toplevel, VarDeclStmt,
    },
    types::Type,
};

/// Expression Types
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Int(IntExpr),
    Float(FloatExpr),
    String(StringExpr),
    Bool(BoolExpr),
    ArrayLiteral(ArrayLiteralExpr),
    Variable(VariableExpr),
    Call(CallExpr),
    Binary(BinaryExpr),
    Unary(UnaryExpr),
    Cast(CastExpr),
    Index(IndexExpr),
    Member(MemberExpr),
}

impl Expr {
    pub fn get_position(&self) -> &Position {
        match self {
            Expr::Int(node) => &node.position,
            Expr::Float(node) => &node.position,
            Expr::String(node) => &node.position,
            Expr::Bool(node) => &node.position,
            Expr::ArrayLiteral(node) => &node.position,
            Expr::Variable(node) => &node.position,
            Expr::Call(node) => &node.position,
            Expr::Binary(node) => &node.position,
            Expr::Unary(node) => &node.position,
            Expr::Cast(node) => &node.position,
            Expr::Index(node) => &node.position,
            Expr::Member(node) => &node.position,
        }
    }

    /// The type assigned during analysis, unresolved before it.
    pub fn get_type(&self) -> &Type {
        match self {
            Expr::Int(node) => &node.ty,
            Expr::Float(node) => &node.ty,
            Expr::String(node) => &node.ty,
            Expr::Bool(node) => &node.ty,
            Expr::ArrayLiteral(node) => &node.ty,
            Expr::Variable(node) => &node.ty,
            Expr::Call(node) => &node.ty,
            Expr::Binary(node) => &node.ty,
            Expr::Unary(node) => &node.ty,
            Expr::Cast(node) => &node.ty,
            Expr::Index(node) => &node.ty,
            Expr::Member(node) => &node.ty,
        }
    }

    pub fn set_type(&mut self, ty: Type) {
        match self {
            Expr::Int(node) => node.ty = ty,
            Expr::Float(node) => node.ty = ty,
            Expr::String(node) => node.ty = ty,
            Expr::Bool(node) => node.ty = ty,
            Expr::ArrayLiteral(node) => node.ty = ty,
            Expr::Variable(node) => node.ty = ty,
            Expr::Call(node) => node.ty = ty,
            Expr::Binary(node) => node.ty = ty,
            Expr::Unary(node) => node.ty = ty,
            Expr::Cast(node) => node.ty = ty,
            Expr::Index(node) => node.ty = ty,
            Expr::Member(node) => node.ty = ty,
        }
    }

    /// Precedence of the operator that introduced this node.
    ///
    /// Calls count as 0 so that calls, assignments, pushes and pops are the
    /// expressions allowed to stand alone as a statement.
    pub fn precedence(&self) -> Option<u8> {
        match self {
            Expr::Call(_) => Some(0),
            Expr::Binary(node) => node.operator.precedence(),
            Expr::Unary(node) => node.operator.precedence(),
            _ => None,
        }
    }

    /// Whether the expression names a storage location.
    pub fn is_lvalue(&self) -> bool {
        match self {
            Expr::Variable(_) | Expr::Index(_) | Expr::Member(_) => true,
            Expr::Unary(node) => node.operator == TokenKind::Star,
            _ => false,
        }
    }

    pub fn is_assignment(&self) -> bool {
        matches!(self, Expr::Binary(node) if node.operator.is_assignment())
    }

    pub fn int(value: i32, position: Position) -> Expr {
        Expr::Int(IntExpr {
            value,
            position,
            ty: Type::unresolved(),
        })
    }

    pub fn binary(operator: TokenKind, left: Expr, right: Expr, position: Position) -> Expr {
        Expr::Binary(BinaryExpr {
            operator,
            left: Box::new(left),
            right: Box::new(right),
            position,
            ty: Type::unresolved(),
        })
    }

    pub fn unary(operator: TokenKind, operand: Expr, position: Position) -> Expr {
        Expr::Unary(UnaryExpr {
            operator,
            operand: Box::new(operand),
            position,
            ty: Type::unresolved(),
        })
    }

    pub fn accept<V: Visitor>(&self, visitor: &mut V) -> V::Output {
        match self {
            Expr::Int(node) => visitor.visit_int(node),
            Expr::Float(node) => visitor.visit_float(node),
            Expr::String(node) => visitor.visit_string(node),
            Expr::Bool(node) => visitor.visit_bool(node),
            Expr::ArrayLiteral(node) => visitor.visit_array_literal(node),
            Expr::Variable(node) => visitor.visit_variable(node),
            Expr::Call(node) => visitor.visit_call(node),
            Expr::Binary(node) => visitor.visit_binary(node),
            Expr::Unary(node) => visitor.visit_unary(node),
            Expr::Cast(node) => visitor.visit_cast(node),
            Expr::Index(node) => visitor.visit_index(node),
            Expr::Member(node) => visitor.visit_member(node),
        }
    }

    pub fn accept_mut<V: VisitorMut>(&mut self, visitor: &mut V) -> V::Output {
        match self {
            Expr::Int(node) => visitor.visit_int(node),
            Expr::Float(node) => visitor.visit_float(node),
            Expr::String(node) => visitor.visit_string(node),
            Expr::Bool(node) => visitor.visit_bool(node),
            Expr::ArrayLiteral(node) => visitor.visit_array_literal(node),
            Expr::Variable(node) => visitor.visit_variable(node),
            Expr::Call(node) => visitor.visit_call(node),
            Expr::Binary(node) => visitor.visit_binary(node),
            Expr::Unary(node) => visitor.visit_unary(node),
            Expr::Cast(node) => visitor.visit_cast(node),
            Expr::Index(node) => visitor.visit_index(node),
            Expr::Member(node) => visitor.visit_member(node),
        }
    }
}

impl Stmt {
    pub fn accept<V: Visitor>(&self, visitor: &mut V) -> V::Output {
        match self {
            Stmt::VarDecl(node) => visitor.visit_var_decl(node),
            Stmt::Return(node) => visitor.visit_return(node),
            Stmt::Branch(node) => visitor.visit_branch(node),
            Stmt::Loop(node) => visitor.visit_loop(node),
            Stmt::Expression(node) => visitor.visit_expression_stmt(node),
        }
    }

    pub fn accept_mut<V: VisitorMut>(&mut self, visitor: &mut V) -> V::Output {
        match self {
            Stmt::VarDecl(node) => visitor.visit_var_decl(node),
            Stmt::Return(node) => visitor.visit_return(node),
            Stmt::Branch(node) => visitor.visit_branch(node),
            Stmt::Loop(node) => visitor.visit_loop(node),
            Stmt::Expression(node) => visitor.visit_expression_stmt(node),
        }
    }
}

impl Item {
    pub fn accept<V: Visitor>(&self, visitor: &mut V) -> V::Output {
        match self {
            Item::Link(node) => visitor.visit_link(node),
            Item::Struct(node) => visitor.visit_struct(node),
            Item::Function(node) => visitor.visit_function(node),
            Item::Extern(node) => visitor.visit_extern(node),
        }
    }

    pub fn accept_mut<V: VisitorMut>(&mut self, visitor: &mut V) -> V::Output {
        match self {
            Item::Link(node) => visitor.visit_link(node),
            Item::Struct(node) => visitor.visit_struct(node),
            Item::Function(node) => visitor.visit_function(node),
            Item::Extern(node) => visitor.visit_extern(node),
        }
    }
}

impl Toplevel {
    pub fn accept<V: Visitor>(&self, visitor: &mut V) -> V::Output {
        visitor.visit_toplevel(self)
    }

    pub fn accept_mut<V: VisitorMut>(&mut self, visitor: &mut V) -> V::Output {
        visitor.visit_toplevel(self)
    }
}

/// Read-only traversal, one method per node variant.
///
/// Implemented by the AST printer and the code generator.
pub trait Visitor: Sized {
    type Output;

    fn visit_toplevel(&mut self, node: &Toplevel) -> Self::Output;
    fn visit_link(&mut self, node: &LinkStmt) -> Self::Output;
    fn visit_struct(&mut self, node: &StructDeclStmt) -> Self::Output;
    fn visit_function(&mut self, node: &FnDeclStmt) -> Self::Output;
    fn visit_extern(&mut self, node: &ExternDeclStmt) -> Self::Output;

    fn visit_var_decl(&mut self, node: &VarDeclStmt) -> Self::Output;
    fn visit_return(&mut self, node: &ReturnStmt) -> Self::Output;
    fn visit_branch(&mut self, node: &BranchStmt) -> Self::Output;
    fn visit_loop(&mut self, node: &LoopStmt) -> Self::Output;
    fn visit_expression_stmt(&mut self, node: &ExpressionStmt) -> Self::Output {
        node.expression.accept(self)
    }

    fn visit_call(&mut self, node: &CallExpr) -> Self::Output;
    fn visit_binary(&mut self, node: &BinaryExpr) -> Self::Output;
    fn visit_unary(&mut self, node: &UnaryExpr) -> Self::Output;
    fn visit_cast(&mut self, node: &CastExpr) -> Self::Output;
    fn visit_array_literal(&mut self, node: &ArrayLiteralExpr) -> Self::Output;
    fn visit_index(&mut self, node: &IndexExpr) -> Self::Output;
    fn visit_member(&mut self, node: &MemberExpr) -> Self::Output;
    fn visit_variable(&mut self, node: &VariableExpr) -> Self::Output;
    fn visit_string(&mut self, node: &StringExpr) -> Self::Output;
    fn visit_int(&mut self, node: &IntExpr) -> Self::Output;
    fn visit_float(&mut self, node: &FloatExpr) -> Self::Output;
    fn visit_bool(&mut self, node: &BoolExpr) -> Self::Output;
}

/// In-place traversal for passes that annotate or rewrite the tree.
///
/// Implemented by the semantic analyzer.
pub trait VisitorMut: Sized {
    type Output;

    fn visit_toplevel(&mut self, node: &mut Toplevel) -> Self::Output;
    fn visit_link(&mut self, node: &mut LinkStmt) -> Self::Output;
    fn visit_struct(&mut self, node: &mut StructDeclStmt) -> Self::Output;
    fn visit_function(&mut self, node: &mut FnDeclStmt) -> Self::Output;
    fn visit_extern(&mut self, node: &mut ExternDeclStmt) -> Self::Output;

    fn visit_var_decl(&mut self, node: &mut VarDeclStmt) -> Self::Output;
    fn visit_return(&mut self, node: &mut ReturnStmt) -> Self::Output;
    fn visit_branch(&mut self, node: &mut BranchStmt) -> Self::Output;
    fn visit_loop(&mut self, node: &mut LoopStmt) -> Self::Output;
    fn visit_expression_stmt(&mut self, node: &mut ExpressionStmt) -> Self::Output {
        node.expression.accept_mut(self)
    }

    fn visit_call(&mut self, node: &mut CallExpr) -> Self::Output;
    fn visit_binary(&mut self, node: &mut BinaryExpr) -> Self::Output;
    fn visit_unary(&mut self, node: &mut UnaryExpr) -> Self::Output;
    fn visit_cast(&mut self, node: &mut CastExpr) -> Self::Output;
    fn visit_array_literal(&mut self, node: &mut ArrayLiteralExpr) -> Self::Output;
    fn visit_index(&mut self, node: &mut IndexExpr) -> Self::Output;
    fn visit_member(&mut self, node: &mut MemberExpr) -> Self::Output;
    fn visit_variable(&mut self, node: &mut VariableExpr) -> Self::Output;
    fn visit_string(&mut self, node: &mut StringExpr) -> Self::Output;
    fn visit_int(&mut self, node: &mut IntExpr) -> Self::Output;
    fn visit_float(&mut self, node: &mut FloatExpr) -> Self::Output;
    fn visit_bool(&mut self, node: &mut BoolExpr) -> Self::Output;
}
