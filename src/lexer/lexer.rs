use std::rc::Rc;

use lazy_static::lazy_static;
use regex::Regex;

use crate::{
    errors::errors::{ErrorImpl, ErrorStack},
    Position, Span, MK_POSITION, MK_TOKEN,
};

use super::tokens::{Token, TokenKind, RESERVED_LOOKUP, SYMBOL_SPELLINGS};

lazy_static! {
    static ref INT_REGEX: Regex = Regex::new("^[0-9]+$").unwrap();
    static ref FLOAT_REGEX: Regex = Regex::new("^[0-9]+\\.[0-9]+$").unwrap();
    static ref IDENTIFIER_REGEX: Regex = Regex::new("^[a-zA-Z_][a-zA-Z0-9_]*$").unwrap();
}

/// Scanner state: a byte cursor into the source plus one-based row and
/// column counters.
pub struct Lexer<'a> {
    tokens: Vec<Token>,
    source: String,
    pos: usize,
    row: u32,
    col: u32,
    file: Rc<String>,
    errors: &'a mut ErrorStack,
}

impl<'a> Lexer<'a> {
    pub fn new(source: String, file: Option<String>, errors: &'a mut ErrorStack) -> Lexer<'a> {
        let file_name = if let Some(file) = file {
            Rc::new(file)
        } else {
            Rc::new(String::from("shell"))
        };

        Lexer {
            pos: 0,
            row: 1,
            col: 1,
            tokens: vec![],
            source,
            file: file_name,
            errors,
        }
    }

    pub fn push(&mut self, token: Token) {
        self.tokens.push(token);
    }

    pub fn at(&self) -> Option<char> {
        self.source[self.pos..].chars().next()
    }

    pub fn peek(&self, n: usize) -> Option<char> {
        self.source[self.pos..].chars().nth(n)
    }

    /// Consumes one character, keeping row and column in step.
    pub fn advance(&mut self) -> Option<char> {
        let ch = self.at()?;
        self.pos += ch.len_utf8();
        if ch == '\n' {
            self.row += 1;
            self.col = 1;
        } else {
            self.col += 1;
        }

        Some(ch)
    }

    pub fn at_eof(&self) -> bool {
        self.pos >= self.source.len()
    }

    fn last_kind(&self) -> Option<TokenKind> {
        self.tokens.last().map(|token| token.kind)
    }
}

fn terminator_handler(lexer: &mut Lexer) {
    let start = MK_POSITION!(lexer);
    lexer.advance();

    if lexer.last_kind() == Some(TokenKind::Terminator) {
        return;
    }

    let end = MK_POSITION!(lexer);
    lexer.push(MK_TOKEN!(TokenKind::Terminator, String::from("\n"), start, end));
}

fn comment_handler(lexer: &mut Lexer) {
    while let Some(ch) = lexer.at() {
        if ch == '\n' {
            break;
        }
        lexer.advance();
    }
}

/// Scans a string literal and expands its escapes.
///
/// # Returns
///
/// `false` when the literal runs into the end of input.
fn string_handler(lexer: &mut Lexer) -> bool {
    let start = MK_POSITION!(lexer);
    lexer.advance();

    let mut result = String::new();

    loop {
        let escape_position = MK_POSITION!(lexer);
        match lexer.advance() {
            None => {
                lexer.errors.push(ErrorImpl::UnterminatedString, start);
                return false;
            }
            Some('"') => break,
            Some('\\') => match lexer.advance() {
                Some('n') => result.push('\n'),
                Some('t') => result.push('\t'),
                Some('"') => result.push('"'),
                Some('\\') => result.push('\\'),
                Some('0') => result.push('\0'),
                Some(other) => {
                    lexer
                        .errors
                        .push(ErrorImpl::UnrecognisedEscape { escape: other }, escape_position);
                }
                None => {
                    lexer.errors.push(ErrorImpl::UnterminatedString, start);
                    return false;
                }
            },
            Some(ch) => result.push(ch),
        }
    }

    let end = MK_POSITION!(lexer);
    lexer.push(MK_TOKEN!(TokenKind::StringLiteral, result, start, end));
    true
}

fn is_word_char(ch: char) -> bool {
    ch.is_ascii_alphanumeric() || ch == '_'
}

/// Scans an alphanumeric run and classifies it as keyword, integer, float or
/// identifier.
fn word_handler(lexer: &mut Lexer) {
    let start = MK_POSITION!(lexer);
    let start_pos = lexer.pos;

    while lexer.at().is_some_and(is_word_char) {
        lexer.advance();
    }

    // A digit run may continue with a fractional part
    let digits_only = lexer.source[start_pos..lexer.pos]
        .chars()
        .all(|ch| ch.is_ascii_digit());
    if digits_only
        && lexer.at() == Some('.')
        && lexer.peek(1).is_some_and(|ch| ch.is_ascii_digit())
    {
        lexer.advance();
        while lexer.at().is_some_and(is_word_char) {
            lexer.advance();
        }
    }

    let value = lexer.source[start_pos..lexer.pos].to_string();
    let end = MK_POSITION!(lexer);

    let kind = if let Some(kind) = RESERVED_LOOKUP.get(value.as_str()) {
        *kind
    } else if INT_REGEX.is_match(&value) {
        if value.parse::<i32>().is_err() {
            lexer
                .errors
                .push(ErrorImpl::IntegerOutOfRange { token: value }, start);
            return;
        }
        TokenKind::IntLiteral
    } else if FLOAT_REGEX.is_match(&value) {
        TokenKind::FloatLiteral
    } else if IDENTIFIER_REGEX.is_match(&value) {
        TokenKind::Identifier
    } else {
        lexer
            .errors
            .push(ErrorImpl::UnrecognisedToken { token: value }, start);
        return;
    };

    lexer.push(MK_TOKEN!(kind, value, start, end));
}

/// Matches the longest fixed spelling at the cursor.
///
/// Candidates are narrowed one character at a time; the last candidate whose
/// whole spelling was consumed wins.
fn symbol_handler(lexer: &mut Lexer) {
    let start = MK_POSITION!(lexer);

    let mut candidates: Vec<&(&str, TokenKind)> = SYMBOL_SPELLINGS.iter().collect();
    let mut longest: Option<(&str, TokenKind)> = None;
    let mut depth = 0;

    while let Some(ch) = lexer.peek(depth) {
        candidates.retain(|(spelling, _)| spelling.chars().nth(depth) == Some(ch));
        if candidates.is_empty() {
            break;
        }

        depth += 1;
        if let Some((spelling, kind)) = candidates
            .iter()
            .find(|(spelling, _)| spelling.chars().count() == depth)
        {
            longest = Some((*spelling, *kind));
        }
    }

    match longest {
        Some((spelling, kind)) => {
            for _ in spelling.chars() {
                lexer.advance();
            }
            let end = MK_POSITION!(lexer);
            lexer.push(MK_TOKEN!(kind, String::from(spelling), start, end));
        }
        None => {
            let token = lexer.advance().map(String::from).unwrap_or_default();
            lexer
                .errors
                .push(ErrorImpl::UnrecognisedToken { token }, start);
        }
    }
}

/// Converts source text into a token sequence terminated by an `EOF` token.
///
/// Lexical problems are pushed onto `errors` and scanning continues with the
/// next character, so a token sequence is always produced.
///
/// # Arguments
///
/// * `source` - The source text
/// * `file` - File name recorded in every position, `shell` when absent
/// * `errors` - Collector receiving lexical diagnostics
pub fn tokenize(source: String, file: Option<String>, errors: &mut ErrorStack) -> Vec<Token> {
    let mut lex = Lexer::new(source, file, errors);

    while let Some(ch) = lex.at() {
        match ch {
            '\n' => terminator_handler(&mut lex),
            ' ' | '\t' | '\r' => {
                lex.advance();
            }
            '/' if lex.peek(1) == Some('/') => comment_handler(&mut lex),
            '"' => {
                if !string_handler(&mut lex) {
                    break;
                }
            }
            ch if is_word_char(ch) => word_handler(&mut lex),
            _ => symbol_handler(&mut lex),
        }
    }

    let position = MK_POSITION!(lex);
    lex.push(MK_TOKEN!(
        TokenKind::EOF,
        String::from("EOF"),
        position.clone(),
        position
    ));
    lex.tokens
}
