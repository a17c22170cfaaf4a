//! Unit tests for error handling.
//!
//! This module contains tests for error types and the error collector.

use crate::errors::errors::{Error, ErrorCategory, ErrorImpl, ErrorStack};
use crate::Position;
use std::rc::Rc;

fn position(row: u32, col: u32) -> Position {
    Position::new(0, row, col, Rc::new("test.gh".to_string()))
}

#[test]
fn test_error_creation() {
    let error = Error::new(
        ErrorImpl::UnrecognisedToken {
            token: "$".to_string(),
        },
        position(1, 1),
    );

    assert_eq!(error.get_error_name(), "UnrecognisedToken");
    assert_eq!(error.get_category(), ErrorCategory::Lexical);
}

#[test]
fn test_error_position() {
    let error = Error::new(
        ErrorImpl::UnexpectedToken {
            token: "}".to_string(),
        },
        position(4, 2),
    );

    assert_eq!(error.get_position().row, 4);
    assert_eq!(error.get_position().col, 2);
}

#[test]
fn test_unexpected_token_message() {
    let error = Error::new(
        ErrorImpl::UnexpectedToken {
            token: "}".to_string(),
        },
        position(1, 1),
    );

    assert_eq!(error.message(), "Unexpected token: '}'");
    assert_eq!(error.get_category(), ErrorCategory::Syntactic);
}

#[test]
fn test_type_mismatch_message() {
    let error = Error::new(
        ErrorImpl::TypeMismatch {
            operator: "+".to_string(),
            left: "int".to_string(),
            right: "float".to_string(),
        },
        position(1, 1),
    );

    assert_eq!(
        error.message(),
        "Type mismatch, cannot perform '+' with 'int' and a 'float'"
    );
    assert_eq!(error.get_category(), ErrorCategory::Semantic);
}

#[test]
fn test_signature_mismatch_message() {
    let error = Error::new(
        ErrorImpl::SignatureMismatch {
            call: "f(int, bool)".to_string(),
            signature: "f(int)".to_string(),
        },
        position(1, 1),
    );

    assert_eq!(
        error.message(),
        "Function call 'f(int, bool)' does not match function signature of 'f(int)'"
    );
}

#[test]
fn test_escape_message() {
    let error = Error::new(ErrorImpl::UnrecognisedEscape { escape: 'q' }, position(1, 1));
    assert_eq!(error.message(), "Unrecognized escape character '\\q'");
}

#[test]
fn test_error_display_format() {
    let error = Error::new(
        ErrorImpl::UndefinedVariable {
            variable: "x".to_string(),
        },
        position(3, 7),
    );

    assert_eq!(
        error.to_string(),
        "test.gh:3:7\nVariable 'x' used but never defined"
    );
}

#[test]
fn test_error_stack_keeps_push_order() {
    let mut stack = ErrorStack::new();
    assert!(stack.is_empty());

    stack.push(ErrorImpl::StrayExpression, position(1, 1));
    stack.push(ErrorImpl::VarWithoutInitializer, position(2, 1));

    assert_eq!(stack.len(), 2);
    assert_eq!(stack.errors()[0].get_error_name(), "StrayExpression");
    assert_eq!(stack.errors()[1].get_error_name(), "VarWithoutInitializer");
}

#[test]
fn test_error_stack_drain() {
    let mut stack = ErrorStack::new();
    stack.push(ErrorImpl::CannotDereference, position(1, 1));

    let drained = stack.drain();
    assert_eq!(drained.len(), 1);
    assert!(stack.is_empty());
}

#[test]
fn test_error_stack_unwind() {
    let mut stack = ErrorStack::new();
    stack.push(ErrorImpl::UnexpectedEndOfFile, position(9, 1));
    stack.push(ErrorImpl::IndexType, position(10, 4));

    let mut out = Vec::new();
    let written = stack.unwind(&mut out).unwrap();

    assert_eq!(written, 2);
    assert!(stack.is_empty());
    assert_eq!(
        String::from_utf8(out).unwrap(),
        "test.gh:9:1\nUnexpected end of file\ntest.gh:10:4\nIndexing a variable requires the index to be of type 'int'\n"
    );
}
