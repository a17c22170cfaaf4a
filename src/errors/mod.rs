//! Diagnostics for the front end.
//!
//! This module defines the error types shared by every phase:
//!
//! - Error structures carrying a source position
//! - Lexical, syntactic and semantic error variants
//! - The `ErrorStack` collector that each phase pushes into and the driver
//!   drains between phases

pub mod errors;

#[cfg(test)]
mod tests;
