//! Type annotations.
//!
//! - `Name`, `Name*`, `Name**`
//! - `[]T` arrays, `[]@T` realigned arrays, `[]*T` pointers to arrays

use crate::{ast::types::Type, lexer::tokens::TokenKind};

use super::parser::Parser;

/// Attempts to parse a type at the cursor.
///
/// This never records a diagnostic: when the tokens do not form a type the
/// cursor is restored and `None` is returned, which lets statement parsing
/// tell declarations apart from expressions.
pub fn parse_type(parser: &mut Parser) -> Option<Type> {
    let checkpoint = parser.checkpoint();

    if parser.get_if(TokenKind::OpenBracket).is_some() {
        if parser.get_if(TokenKind::CloseBracket).is_none() {
            parser.restore(checkpoint);
            return None;
        }

        let realigned = parser.get_if(TokenKind::At).is_some();
        let pointer_depth = parse_pointer_depth(parser);

        let Some(element) = parse_type(parser) else {
            parser.restore(checkpoint);
            return None;
        };

        let mut array = if realigned {
            Type::realigned_array(element)
        } else {
            Type::array(element)
        };
        array.pointer_depth = pointer_depth;
        return Some(array);
    }

    if let Some(identifier) = parser.get_if(TokenKind::Identifier) {
        let pointer_depth = parse_pointer_depth(parser);
        return Some(Type::pointer(&identifier.value, pointer_depth));
    }

    parser.restore(checkpoint);
    None
}

fn parse_pointer_depth(parser: &mut Parser) -> u32 {
    let mut depth = 0;
    while parser.get_if(TokenKind::Star).is_some() {
        depth += 1;
    }
    depth
}
