//! LLVM IR generation, built with the `llvm` feature.
//!
//! The generator walks an analyzed `Toplevel` through the read-only
//! `Visitor` trait and asks the symbol table for struct layouts and
//! signatures. Arrays lower to a `{ T*, i32 length, i32 capacity }` struct;
//! realigned arrays to `{ i32 length, i32 capacity, F0*, F1*, ... }` with one
//! buffer per struct field in layout order.

pub mod compiler;
pub mod expr;
pub mod stmt;

#[cfg(test)]
mod tests;
