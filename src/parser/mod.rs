//! Parser module for building an Abstract Syntax Tree (AST).
//!
//! This module contains the parser that transforms a stream of tokens
//! into a `Toplevel`. It is a recursive-descent parser; binary expressions
//! are resolved with a shunting-yard pass over operand and operator stacks.
//! It handles:
//!
//! - Module-level declarations (links, imports, structs, functions, externs)
//! - Statement parsing (declarations, control flow, expression statements)
//! - Expression parsing (unary, binary and assignment operators, accessors)
//! - Type parsing for type annotations
//! - Panic-mode error recovery
//!
//! Syntax errors never abort parsing. They are pushed onto the shared
//! `ErrorStack` and the parser resumes at the next statement.

pub mod expr;
pub mod parser;
pub mod stmt;
pub mod types;
