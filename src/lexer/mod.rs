//! Lexical analysis.
//!
//! Converts source text into a stream of tokens for parsing. It handles:
//!
//! - Longest-match recognition of punctuation and operators
//! - Classification of alphanumeric runs into keywords, literals and identifiers
//! - Newline terminators, collapsed when consecutive
//! - Comments, string escapes and row/column tracking for diagnostics

pub mod lexer;
pub mod tokens;

#[cfg(test)]
mod tests;
