use lazy_static::lazy_static;
use std::{collections::HashMap, fmt::Display};

use crate::Span;

lazy_static! {
    pub static ref RESERVED_LOOKUP: HashMap<&'static str, TokenKind> = {
        let mut map = HashMap::new();
        map.insert("fn", TokenKind::Fn);
        map.insert("while", TokenKind::While);
        map.insert("for", TokenKind::For);
        map.insert("if", TokenKind::If);
        map.insert("then", TokenKind::Then);
        map.insert("else", TokenKind::Else);
        map.insert("true", TokenKind::True);
        map.insert("false", TokenKind::False);
        map.insert("null", TokenKind::Null);
        map.insert("var", TokenKind::Var);
        map.insert("struct", TokenKind::Struct);
        map.insert("extern", TokenKind::Extern);
        map.insert("return", TokenKind::Return);
        map.insert("link", TokenKind::Link);
        map.insert("import", TokenKind::Import);
        map.insert("volatile", TokenKind::Volatile);
        map
    };
}

/// Fixed spellings of every punctuation and operator token.
///
/// The lexer narrows this list character by character and keeps the longest
/// spelling that still matches.
pub const SYMBOL_SPELLINGS: &[(&str, TokenKind)] = &[
    ("...", TokenKind::Variadic),
    (".", TokenKind::Member),
    (",", TokenKind::Comma),
    (";", TokenKind::Semicolon),
    ("~", TokenKind::Tilde),
    ("@", TokenKind::At),
    ("(", TokenKind::OpenParen),
    (")", TokenKind::CloseParen),
    ("{", TokenKind::OpenCurly),
    ("}", TokenKind::CloseCurly),
    ("[", TokenKind::OpenBracket),
    ("]", TokenKind::CloseBracket),
    ("+", TokenKind::Plus),
    ("-", TokenKind::Dash),
    ("*", TokenKind::Star),
    ("/", TokenKind::Slash),
    ("&", TokenKind::Ampersand),
    ("|", TokenKind::Pipe),
    ("^", TokenKind::Caret),
    ("%", TokenKind::Percent),
    ("<", TokenKind::Less),
    (">", TokenKind::Greater),
    ("=", TokenKind::Assignment),
    ("==", TokenKind::Equals),
    ("!=", TokenKind::NotEquals),
    ("+=", TokenKind::PlusEquals),
    ("-=", TokenKind::MinusEquals),
    ("*=", TokenKind::StarEquals),
    ("/=", TokenKind::SlashEquals),
    ("&=", TokenKind::AmpersandEquals),
    ("|=", TokenKind::PipeEquals),
    ("^=", TokenKind::CaretEquals),
    ("%=", TokenKind::PercentEquals),
    ("<=", TokenKind::LessEquals),
    (">=", TokenKind::GreaterEquals),
    ("!", TokenKind::Not),
    ("?", TokenKind::Question),
    ("<-", TokenKind::Push),
    ("->", TokenKind::Pop),
];

#[derive(Debug, PartialEq, Eq, Clone, Copy, Hash)]
pub enum TokenKind {
    EOF,
    StringLiteral,
    IntLiteral,
    FloatLiteral,
    Terminator,
    Identifier,

    Variadic, // ...
    Member,   // .
    Comma,
    Semicolon,
    Tilde,
    At,

    OpenParen,
    CloseParen,
    OpenCurly,
    CloseCurly,
    OpenBracket,
    CloseBracket,

    Plus,
    Dash,
    Star,
    Slash,
    Ampersand,
    Pipe,
    Caret,
    Percent,
    Less,
    Greater,

    Assignment, // =
    Equals,     // ==
    NotEquals,  // !=
    PlusEquals,
    MinusEquals,
    StarEquals,
    SlashEquals,
    AmpersandEquals,
    PipeEquals,
    CaretEquals,
    PercentEquals,
    LessEquals,
    GreaterEquals,

    Not,
    Question, // length of
    Push,     // <-
    Pop,      // ->

    // Reserved
    Fn,
    While,
    For,
    If,
    Then,
    Else,
    True,
    False,
    Null,
    Var,
    Struct,
    Extern,
    Return,
    Link,
    Import,
    Volatile,
}

impl TokenKind {
    /// Canonical source spelling, used to recognize fixed-text tokens and to
    /// render diagnostics.
    pub fn spelling(&self) -> &'static str {
        match self {
            TokenKind::EOF => "end of file",
            TokenKind::StringLiteral => "string literal",
            TokenKind::IntLiteral => "integer literal",
            TokenKind::FloatLiteral => "float literal",
            TokenKind::Terminator => "\\n",
            TokenKind::Identifier => "identifier",
            TokenKind::Fn => "fn",
            TokenKind::While => "while",
            TokenKind::For => "for",
            TokenKind::If => "if",
            TokenKind::Then => "then",
            TokenKind::Else => "else",
            TokenKind::True => "true",
            TokenKind::False => "false",
            TokenKind::Null => "null",
            TokenKind::Var => "var",
            TokenKind::Struct => "struct",
            TokenKind::Extern => "extern",
            TokenKind::Return => "return",
            TokenKind::Link => "link",
            TokenKind::Import => "import",
            TokenKind::Volatile => "volatile",
            symbol => SYMBOL_SPELLINGS
                .iter()
                .find(|(_, kind)| kind == symbol)
                .map(|(spelling, _)| *spelling)
                .unwrap_or("?"),
        }
    }

    /// Binding strength of binary and assignment operators.
    ///
    /// Kinds that never act as an infix operator have no precedence.
    pub fn precedence(&self) -> Option<u8> {
        match self {
            TokenKind::Star | TokenKind::Slash | TokenKind::Percent => Some(3),
            TokenKind::Plus | TokenKind::Dash => Some(2),
            TokenKind::Equals
            | TokenKind::NotEquals
            | TokenKind::Less
            | TokenKind::Greater
            | TokenKind::LessEquals
            | TokenKind::GreaterEquals => Some(1),
            TokenKind::Push | TokenKind::Pop | TokenKind::Tilde => Some(0),
            kind if kind.is_assignment() => Some(0),
            _ => None,
        }
    }

    pub fn is_assignment(&self) -> bool {
        matches!(
            self,
            TokenKind::Assignment
                | TokenKind::PlusEquals
                | TokenKind::MinusEquals
                | TokenKind::StarEquals
                | TokenKind::SlashEquals
                | TokenKind::AmpersandEquals
                | TokenKind::PipeEquals
                | TokenKind::CaretEquals
                | TokenKind::PercentEquals
        )
    }

    /// Operators that may appear between two operands in the precedence
    /// climbing pass.
    pub fn is_binary_operator(&self) -> bool {
        !self.is_assignment()
            && !matches!(self, TokenKind::Pop | TokenKind::Tilde)
            && self.precedence().is_some()
    }

    pub fn is_comparison(&self) -> bool {
        matches!(
            self,
            TokenKind::Equals
                | TokenKind::NotEquals
                | TokenKind::Less
                | TokenKind::Greater
                | TokenKind::LessEquals
                | TokenKind::GreaterEquals
        )
    }

    /// Arithmetic operator applied by a compound assignment, `+=` maps to `+`.
    pub fn compound_operator(&self) -> Option<TokenKind> {
        match self {
            TokenKind::PlusEquals => Some(TokenKind::Plus),
            TokenKind::MinusEquals => Some(TokenKind::Dash),
            TokenKind::StarEquals => Some(TokenKind::Star),
            TokenKind::SlashEquals => Some(TokenKind::Slash),
            TokenKind::AmpersandEquals => Some(TokenKind::Ampersand),
            TokenKind::PipeEquals => Some(TokenKind::Pipe),
            TokenKind::CaretEquals => Some(TokenKind::Caret),
            TokenKind::PercentEquals => Some(TokenKind::Percent),
            _ => None,
        }
    }

    pub fn is_terminator(&self) -> bool {
        matches!(self, TokenKind::Terminator | TokenKind::Semicolon)
    }
}

impl Display for TokenKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.spelling())
    }
}

#[derive(Debug, Clone)]
pub struct Token {
    pub kind: TokenKind,
    pub value: String,
    pub span: Span,
}

impl Display for Token {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Token {{\nkind: {:?},\nvalue: {}}}", self.kind, self.value)
    }
}

impl Token {
    fn is_one_of_many(&self, tokens: &[TokenKind]) -> bool {
        tokens.contains(&self.kind)
    }

    /// Text used when the token is quoted in a diagnostic.
    pub fn describe(&self) -> String {
        match self.kind {
            TokenKind::Terminator => String::from("\\n"),
            TokenKind::EOF => String::from("EOF"),
            _ => self.value.clone(),
        }
    }

    /// Renders the token for the `--verbose` token dump.
    pub fn debug(&self) -> String {
        if self.is_one_of_many(&[
            TokenKind::StringLiteral,
            TokenKind::Identifier,
            TokenKind::IntLiteral,
            TokenKind::FloatLiteral,
        ]) {
            format!(
                "{}:{} {:?} ({})",
                self.span.start.row, self.span.start.col, self.kind, self.value
            )
        } else {
            format!("{}:{} {:?}", self.span.start.row, self.span.start.col, self.kind)
        }
    }
}
