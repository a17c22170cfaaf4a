use crate::Position;

use super::{ast::Expr, types::{FunctionSignature, Type}};

/// `Type name [= value]` or `var name = value`.
///
/// For `var` declarations `ty` stays unresolved until the analyzer infers it
/// from the initializer.
#[derive(Debug, Clone, PartialEq)]
pub struct VarDeclStmt {
    pub identifier: String,
    pub ty: Type,
    pub inferred: bool,
    pub value: Option<Expr>,
    pub position: Position,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ReturnStmt {
    pub value: Option<Expr>,
    pub position: Position,
}

/// `if cond { .. } [else ..]` or `if cond then stmt`.
///
/// An `else if` chain is stored as an else body holding a single branch.
#[derive(Debug, Clone, PartialEq)]
pub struct BranchStmt {
    pub condition: Expr,
    pub body: Vec<Stmt>,
    pub else_body: Option<Vec<Stmt>>,
    pub position: Position,
}

/// `while cond { .. }` or `for [prefix]; cond; [suffix] { .. }`.
#[derive(Debug, Clone, PartialEq)]
pub struct LoopStmt {
    pub prefix: Option<Box<Stmt>>,
    pub condition: Expr,
    pub suffix: Option<Expr>,
    pub body: Vec<Stmt>,
    pub position: Position,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ExpressionStmt {
    pub expression: Expr,
    pub position: Position,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Stmt {
    VarDecl(VarDeclStmt),
    Return(ReturnStmt),
    Branch(BranchStmt),
    Loop(LoopStmt),
    Expression(ExpressionStmt),
}

impl Stmt {
    pub fn get_position(&self) -> &Position {
        match self {
            Stmt::VarDecl(node) => &node.position,
            Stmt::Return(node) => &node.position,
            Stmt::Branch(node) => &node.position,
            Stmt::Loop(node) => &node.position,
            Stmt::Expression(node) => &node.position,
        }
    }
}

/// `link "library"`: a native library handed to the system linker.
#[derive(Debug, Clone, PartialEq)]
pub struct LinkStmt {
    pub library: String,
    pub position: Position,
}

#[derive(Debug, Clone, PartialEq)]
pub struct StructMemberDecl {
    pub name: String,
    pub ty: Type,
    pub position: Position,
}

#[derive(Debug, Clone, PartialEq)]
pub struct StructDeclStmt {
    pub name: String,
    pub members: Vec<StructMemberDecl>,
    pub volatile: bool,
    pub position: Position,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FnDeclStmt {
    pub signature: FunctionSignature,
    pub body: Vec<Stmt>,
    pub position: Position,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ExternDeclStmt {
    pub signature: FunctionSignature,
    pub position: Position,
}

/// Declarations that may only appear at module level.
#[derive(Debug, Clone, PartialEq)]
pub enum Item {
    Link(LinkStmt),
    Struct(StructDeclStmt),
    Function(FnDeclStmt),
    Extern(ExternDeclStmt),
}

impl Item {
    pub fn get_position(&self) -> &Position {
        match self {
            Item::Link(node) => &node.position,
            Item::Struct(node) => &node.position,
            Item::Function(node) => &node.position,
            Item::Extern(node) => &node.position,
        }
    }
}

/// Root node of one module.
///
/// `items` owns every declaration; the index lists point into it for direct
/// whole-program lookup. `analyzed` makes semantic analysis idempotent.
#[derive(Debug, Clone, PartialEq)]
pub struct Toplevel {
    pub module: String,
    pub items: Vec<Item>,
    pub functions: Vec<usize>,
    pub externs: Vec<usize>,
    pub structs: Vec<usize>,
    pub links: Vec<usize>,
    pub analyzed: bool,
}

impl Toplevel {
    pub fn new(module: &str) -> Self {
        Toplevel {
            module: module.to_string(),
            items: vec![],
            functions: vec![],
            externs: vec![],
            structs: vec![],
            links: vec![],
            analyzed: false,
        }
    }

    pub fn add_item(&mut self, item: Item) {
        let index = self.items.len();
        match &item {
            Item::Link(_) => self.links.push(index),
            Item::Struct(_) => self.structs.push(index),
            Item::Function(_) => self.functions.push(index),
            Item::Extern(_) => self.externs.push(index),
        }
        self.items.push(item);
    }

    /// Moves every declaration of an imported module into this one.
    pub fn splice(&mut self, other: Toplevel) {
        for item in other.items {
            self.add_item(item);
        }
    }

    pub fn functions(&self) -> impl Iterator<Item = &FnDeclStmt> {
        self.functions.iter().filter_map(|index| match &self.items[*index] {
            Item::Function(node) => Some(node),
            _ => None,
        })
    }

    pub fn externs(&self) -> impl Iterator<Item = &ExternDeclStmt> {
        self.externs.iter().filter_map(|index| match &self.items[*index] {
            Item::Extern(node) => Some(node),
            _ => None,
        })
    }

    pub fn structs(&self) -> impl Iterator<Item = &StructDeclStmt> {
        self.structs.iter().filter_map(|index| match &self.items[*index] {
            Item::Struct(node) => Some(node),
            _ => None,
        })
    }

    pub fn links(&self) -> impl Iterator<Item = &LinkStmt> {
        self.links.iter().filter_map(|index| match &self.items[*index] {
            Item::Link(node) => Some(node),
            _ => None,
        })
    }

    pub fn function(&self, name: &str) -> Option<&FnDeclStmt> {
        self.functions().find(|node| node.signature.name == name)
    }
}
