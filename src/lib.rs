#![allow(clippy::module_inception)]

use std::{fmt::Display, rc::Rc};

pub mod ast;
#[cfg(feature = "llvm")]
pub mod compiler;
pub mod config;
pub mod errors;
pub mod frontend;
pub mod lexer;
pub mod macros;
pub mod parser;
pub mod symtable;

extern crate regex;

/// A location inside a source file.
///
/// `index` is the byte offset of the first character, `row` and `col` are
/// one-based.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Position {
    pub index: u32,
    pub row: u32,
    pub col: u32,
    pub file: Rc<String>,
}

impl Position {
    pub fn new(index: u32, row: u32, col: u32, file: Rc<String>) -> Self {
        Position {
            index,
            row,
            col,
            file,
        }
    }

    pub fn null() -> Self {
        Position::new(0, 0, 0, Rc::new(String::from("<null>")))
    }
}

impl Display for Position {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}:{}", self.file, self.row, self.col)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Span {
    pub start: Position,
    pub end: Position,
}

impl Span {
    /// Byte length of the source text covered by this span.
    pub fn len(&self) -> usize {
        (self.end.index - self.start.index) as usize
    }

    pub fn is_empty(&self) -> bool {
        self.end.index == self.start.index
    }
}

#[cfg(test)]
mod tests {
    use std::rc::Rc;

    use super::{Position, Span};

    #[test]
    fn test_position_display() {
        let position = Position::new(14, 2, 5, Rc::new("main.gh".to_string()));
        assert_eq!(position.to_string(), "main.gh:2:5");
    }

    #[test]
    fn test_span_length() {
        let file = Rc::new("main.gh".to_string());
        let span = Span {
            start: Position::new(3, 1, 4, Rc::clone(&file)),
            end: Position::new(7, 1, 8, file),
        };

        assert_eq!(span.len(), 4);
        assert!(!span.is_empty());
    }
}
