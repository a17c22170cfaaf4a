/// AST (Abstract Syntax Tree) module
/// Contains all definitions related to the AST structure
///
/// Submodules:
/// - ast: Expression sum type and the `Visitor` / `VisitorMut` traits
/// - expressions: Definitions for the expression node structs
/// - statements: Statement, declaration and toplevel nodes
/// - types: The recursive `Type` value and function signatures
/// - printer: Indented dump used by `--verbose-ast`
pub mod ast;
pub mod expressions;
pub mod printer;
pub mod statements;
pub mod types;
