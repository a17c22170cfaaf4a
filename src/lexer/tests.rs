//! Unit tests for the lexer module.
//!
//! - Keywords and identifiers
//! - Numeric literals (integers and floats)
//! - String literals with escape sequences
//! - Longest-match operators and punctuation
//! - Terminators and comments
//! - Error cases

use crate::errors::errors::ErrorStack;

use super::{
    lexer::tokenize,
    tokens::{Token, TokenKind},
};

fn lex(source: &str) -> (Vec<Token>, ErrorStack) {
    let mut errors = ErrorStack::new();
    let tokens = tokenize(source.to_string(), Some("test.gh".to_string()), &mut errors);
    (tokens, errors)
}

fn kinds(source: &str) -> Vec<TokenKind> {
    lex(source).0.iter().map(|token| token.kind).collect()
}

#[test]
fn test_tokenize_keywords() {
    let source = "fn while for if then else true false null var struct extern return link import volatile";
    let (tokens, errors) = lex(source);

    assert!(errors.is_empty());
    assert_eq!(tokens[0].kind, TokenKind::Fn);
    assert_eq!(tokens[1].kind, TokenKind::While);
    assert_eq!(tokens[2].kind, TokenKind::For);
    assert_eq!(tokens[3].kind, TokenKind::If);
    assert_eq!(tokens[4].kind, TokenKind::Then);
    assert_eq!(tokens[5].kind, TokenKind::Else);
    assert_eq!(tokens[6].kind, TokenKind::True);
    assert_eq!(tokens[7].kind, TokenKind::False);
    assert_eq!(tokens[8].kind, TokenKind::Null);
    assert_eq!(tokens[9].kind, TokenKind::Var);
    assert_eq!(tokens[10].kind, TokenKind::Struct);
    assert_eq!(tokens[11].kind, TokenKind::Extern);
    assert_eq!(tokens[12].kind, TokenKind::Return);
    assert_eq!(tokens[13].kind, TokenKind::Link);
    assert_eq!(tokens[14].kind, TokenKind::Import);
    assert_eq!(tokens[15].kind, TokenKind::Volatile);
    assert_eq!(tokens[16].kind, TokenKind::EOF);
}

#[test]
fn test_tokenize_identifiers() {
    let (tokens, errors) = lex("foo bar_1 _hidden int iffy");

    assert!(errors.is_empty());
    for (token, value) in tokens.iter().zip(["foo", "bar_1", "_hidden", "int", "iffy"]) {
        assert_eq!(token.kind, TokenKind::Identifier);
        assert_eq!(token.value, value);
    }
    assert_eq!(tokens[5].kind, TokenKind::EOF);
}

#[test]
fn test_tokenize_numbers() {
    let (tokens, errors) = lex("42 3.14 0 100.5");

    assert!(errors.is_empty());
    assert_eq!(tokens[0].kind, TokenKind::IntLiteral);
    assert_eq!(tokens[0].value, "42");
    assert_eq!(tokens[1].kind, TokenKind::FloatLiteral);
    assert_eq!(tokens[1].value, "3.14");
    assert_eq!(tokens[2].kind, TokenKind::IntLiteral);
    assert_eq!(tokens[3].kind, TokenKind::FloatLiteral);
    assert_eq!(tokens[3].value, "100.5");
}

#[test]
fn test_member_access_is_not_a_float() {
    assert_eq!(
        kinds("p.x"),
        vec![
            TokenKind::Identifier,
            TokenKind::Member,
            TokenKind::Identifier,
            TokenKind::EOF
        ]
    );
}

#[test]
fn test_integer_out_of_range() {
    let (tokens, errors) = lex("99999999999");

    assert_eq!(errors.len(), 1);
    assert_eq!(errors.errors()[0].get_error_name(), "IntegerOutOfRange");
    assert_eq!(tokens.len(), 1);
}

#[test]
fn test_tokenize_string_escapes() {
    let (tokens, errors) = lex(r#""a\tb\n\"c\"""#);

    assert!(errors.is_empty());
    assert_eq!(tokens[0].kind, TokenKind::StringLiteral);
    assert_eq!(tokens[0].value, "a\tb\n\"c\"");
}

#[test]
fn test_unrecognised_escape_continues() {
    let (tokens, errors) = lex(r#""a\qb" x"#);

    assert_eq!(errors.len(), 1);
    assert_eq!(errors.errors()[0].get_error_name(), "UnrecognisedEscape");
    assert_eq!(errors.errors()[0].get_position().col, 3);
    assert_eq!(tokens[0].value, "ab");
    assert_eq!(tokens[1].kind, TokenKind::Identifier);
}

#[test]
fn test_unterminated_string() {
    let (tokens, errors) = lex("x = \"never closed");

    assert_eq!(errors.len(), 1);
    assert_eq!(errors.errors()[0].get_error_name(), "UnterminatedString");
    assert_eq!(errors.errors()[0].get_position().col, 5);
    assert_eq!(tokens.last().unwrap().kind, TokenKind::EOF);
}

#[test]
fn test_longest_match() {
    assert_eq!(
        kinds("<= < -> - <- ... . == = != +="),
        vec![
            TokenKind::LessEquals,
            TokenKind::Less,
            TokenKind::Pop,
            TokenKind::Dash,
            TokenKind::Push,
            TokenKind::Variadic,
            TokenKind::Member,
            TokenKind::Equals,
            TokenKind::Assignment,
            TokenKind::NotEquals,
            TokenKind::PlusEquals,
            TokenKind::EOF
        ]
    );
}

#[test]
fn test_adjacent_symbols() {
    assert_eq!(
        kinds("a<=b"),
        vec![
            TokenKind::Identifier,
            TokenKind::LessEquals,
            TokenKind::Identifier,
            TokenKind::EOF
        ]
    );
    assert_eq!(
        kinds("(*p)"),
        vec![
            TokenKind::OpenParen,
            TokenKind::Star,
            TokenKind::Identifier,
            TokenKind::CloseParen,
            TokenKind::EOF
        ]
    );
}

#[test]
fn test_punctuation() {
    assert_eq!(
        kinds("( ) { } [ ] , ; ~ @ ? ! & | ^ %"),
        vec![
            TokenKind::OpenParen,
            TokenKind::CloseParen,
            TokenKind::OpenCurly,
            TokenKind::CloseCurly,
            TokenKind::OpenBracket,
            TokenKind::CloseBracket,
            TokenKind::Comma,
            TokenKind::Semicolon,
            TokenKind::Tilde,
            TokenKind::At,
            TokenKind::Question,
            TokenKind::Not,
            TokenKind::Ampersand,
            TokenKind::Pipe,
            TokenKind::Caret,
            TokenKind::Percent,
            TokenKind::EOF
        ]
    );
}

#[test]
fn test_terminators_collapse() {
    assert_eq!(
        kinds("a\n\n\n   \nb"),
        vec![
            TokenKind::Identifier,
            TokenKind::Terminator,
            TokenKind::Identifier,
            TokenKind::EOF
        ]
    );
}

#[test]
fn test_comments_skipped() {
    let (tokens, errors) = lex("a // trailing comment\n// whole line\nb");

    assert!(errors.is_empty());
    assert_eq!(
        tokens.iter().map(|token| token.kind).collect::<Vec<_>>(),
        vec![
            TokenKind::Identifier,
            TokenKind::Terminator,
            TokenKind::Identifier,
            TokenKind::EOF
        ]
    );
    assert_eq!(tokens[2].span.start.row, 3);
}

#[test]
fn test_rows_and_columns() {
    let (tokens, _) = lex("fn main() {\n  int x = 1\n}");

    assert_eq!((tokens[0].span.start.row, tokens[0].span.start.col), (1, 1));
    assert_eq!((tokens[1].span.start.row, tokens[1].span.start.col), (1, 4));
    // `int` on the second line
    assert_eq!(tokens[6].value, "int");
    assert_eq!((tokens[6].span.start.row, tokens[6].span.start.col), (2, 3));
    assert_eq!(tokens[6].span.start.index, 14);
}

#[test]
fn test_unrecognised_token_continues() {
    let (tokens, errors) = lex("a $ b");

    assert_eq!(errors.len(), 1);
    assert_eq!(errors.errors()[0].get_error_name(), "UnrecognisedToken");
    assert_eq!(errors.errors()[0].get_position().col, 3);
    assert_eq!(
        tokens.iter().map(|token| token.kind).collect::<Vec<_>>(),
        vec![TokenKind::Identifier, TokenKind::Identifier, TokenKind::EOF]
    );
}

#[test]
fn test_malformed_word() {
    let (_, errors) = lex("12ab");

    assert_eq!(errors.len(), 1);
    assert_eq!(errors.errors()[0].message(), "Unrecognized token '12ab'");
}

#[test]
fn test_spans_reconstruct_source() {
    let source = "fn main() int {\n  // note\n  int* p = &x\n  return p[3].y + 1.5 <= 2\n}\n";
    let (tokens, errors) = lex(source);
    assert!(errors.is_empty());

    let rebuilt: String = tokens
        .iter()
        .filter(|token| !matches!(token.kind, TokenKind::Terminator | TokenKind::EOF))
        .map(|token| &source[token.span.start.index as usize..token.span.end.index as usize])
        .collect();

    let expected: String = source
        .lines()
        .map(|line| line.split("//").next().unwrap())
        .collect::<String>()
        .chars()
        .filter(|ch| !ch.is_whitespace())
        .collect();

    assert_eq!(rebuilt, expected);
}

#[test]
fn test_precedence_table() {
    assert_eq!(TokenKind::Star.precedence(), Some(3));
    assert_eq!(TokenKind::Slash.precedence(), Some(3));
    assert_eq!(TokenKind::Plus.precedence(), Some(2));
    assert_eq!(TokenKind::Dash.precedence(), Some(2));
    assert_eq!(TokenKind::Equals.precedence(), Some(1));
    assert_eq!(TokenKind::Assignment.precedence(), Some(0));
    assert_eq!(TokenKind::Push.precedence(), Some(0));
    assert_eq!(TokenKind::Identifier.precedence(), None);
    assert!(TokenKind::Push.is_binary_operator());
    assert!(!TokenKind::Assignment.is_binary_operator());
    // `~` is ranked but has no operator form yet
    assert_eq!(TokenKind::Tilde.precedence(), Some(0));
    assert!(!TokenKind::Tilde.is_binary_operator());
}

#[test]
fn test_spelling() {
    assert_eq!(TokenKind::LessEquals.spelling(), "<=");
    assert_eq!(TokenKind::Pop.spelling(), "->");
    assert_eq!(TokenKind::Volatile.spelling(), "volatile");
    assert_eq!(TokenKind::Variadic.to_string(), "...");
}
