//! Semantic analysis.
//!
//! `SymTable` resolves names and types over a parsed `Toplevel`, reports
//! semantic errors and keeps the struct, function and local tables the code
//! generator queries afterwards.

pub mod symtable;

#[cfg(test)]
mod tests;
