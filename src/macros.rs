//! Utility macros for the front end.
//!
//! - `MK_TOKEN!` - Creates a Token instance
//! - `MK_POSITION!` - Creates a Position at the lexer's cursor

/// Creates a Token instance.
///
/// # Arguments
///
/// * `$kind` - The TokenKind
/// * `$value` - The token's string value
/// * `$start` - Position of the first character
/// * `$end` - Position one past the last character
///
/// # Example
///
/// ```ignore
/// let token = MK_TOKEN!(TokenKind::IntLiteral, "42".to_string(), start, end);
/// ```
#[macro_export]
macro_rules! MK_TOKEN {
    ($kind:expr, $value:expr, $start:expr, $end:expr) => {
        Token {
            kind: $kind,
            value: $value,
            span: Span {
                start: $start,
                end: $end,
            },
        }
    };
}

/// Creates a Position from the lexer's current byte offset, row and column.
///
/// # Example
///
/// ```ignore
/// let start = MK_POSITION!(lexer);
/// ```
#[macro_export]
macro_rules! MK_POSITION {
    ($lexer:expr) => {
        Position::new(
            $lexer.pos as u32,
            $lexer.row,
            $lexer.col,
            Rc::clone(&$lexer.file),
        )
    };
}
