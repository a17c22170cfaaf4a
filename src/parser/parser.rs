//! Parser state and the module-level entry point.
//!
//! The parser is a recursive-descent parser over a borrowed token vector. Binary
//! expressions are resolved by a shunting-yard pass (see `expr.rs`). Syntax
//! errors are pushed onto the shared `ErrorStack`; the failing production then
//! discards tokens up to the next statement terminator and returns `None`, so
//! enclosing productions continue with the next sibling.

use std::rc::Rc;

use crate::{
    ast::statements::Toplevel,
    errors::errors::{ErrorImpl, ErrorStack},
    lexer::tokens::{Token, TokenKind},
    Position, Span,
};

use super::stmt::parse_item;

/// Resolves `import "name"` directives while a module is being parsed.
pub trait ImportHandler {
    /// Parses the named module and returns its declarations, or `None` when
    /// it cannot be loaded or was already spliced into this compilation.
    fn import(
        &mut self,
        module: &str,
        position: &Position,
        errors: &mut ErrorStack,
    ) -> Option<Toplevel>;
}

/// Import handler for sources parsed without a file system.
pub struct NoImports;

impl ImportHandler for NoImports {
    fn import(
        &mut self,
        module: &str,
        position: &Position,
        errors: &mut ErrorStack,
    ) -> Option<Toplevel> {
        errors.push(
            ErrorImpl::ModuleNotFound {
                module: module.to_string(),
            },
            position.clone(),
        );
        None
    }
}

/// The main parser structure that maintains parsing state.
pub struct Parser<'a> {
    /// The list of tokens to parse, always ending in `EOF`
    tokens: Vec<Token>,
    /// Current position in the token stream
    pos: usize,
    /// The name of the source file being parsed
    file: Rc<String>,
    /// Whether the expression parsed so far may still be assigned to
    pub may_parse_assign: bool,
    pub errors: &'a mut ErrorStack,
    pub imports: &'a mut dyn ImportHandler,
}

impl<'a> Parser<'a> {
    /// Creates a new Parser instance.
    ///
    /// # Arguments
    ///
    /// * `tokens` - Vector of tokens to parse
    /// * `file` - Reference-counted string containing the source file name
    /// * `imports` - Handler used for `import` directives
    /// * `errors` - Collector receiving syntax diagnostics
    pub fn new(
        mut tokens: Vec<Token>,
        file: Rc<String>,
        imports: &'a mut dyn ImportHandler,
        errors: &'a mut ErrorStack,
    ) -> Self {
        if tokens.last().map(|token| token.kind) != Some(TokenKind::EOF) {
            let end = tokens
                .last()
                .map(|token| token.span.end.clone())
                .unwrap_or_else(|| Position::new(0, 1, 1, Rc::clone(&file)));
            tokens.push(Token {
                kind: TokenKind::EOF,
                value: String::from("EOF"),
                span: Span {
                    start: end.clone(),
                    end,
                },
            });
        }

        Parser {
            tokens,
            pos: 0,
            file,
            may_parse_assign: true,
            errors,
            imports,
        }
    }

    /// Returns the current token without advancing.
    pub fn current_token(&self) -> &Token {
        &self.tokens[self.pos]
    }

    /// Returns the kind of the current token.
    pub fn current_token_kind(&self) -> TokenKind {
        self.tokens[self.pos].kind
    }

    /// Returns the kind of the token `n` places ahead, `EOF` past the end.
    pub fn peek_kind(&self, n: usize) -> TokenKind {
        self.tokens
            .get(self.pos + n)
            .map(|token| token.kind)
            .unwrap_or(TokenKind::EOF)
    }

    /// Advances to the next token and returns the previous token.
    ///
    /// The cursor never moves past `EOF`.
    pub fn advance(&mut self) -> Token {
        let token = self.tokens[self.pos].clone();
        if token.kind != TokenKind::EOF {
            self.pos += 1;
        }
        token
    }

    /// Consumes the current token if it has the given kind.
    pub fn get_if(&mut self, kind: TokenKind) -> Option<Token> {
        if self.current_token_kind() == kind {
            Some(self.advance())
        } else {
            None
        }
    }

    /// Expects a token of the specified kind.
    ///
    /// # Returns
    ///
    /// The token when it matches. Otherwise the error is recorded, the parser
    /// recovers and `None` is returned.
    pub fn expect(&mut self, expected_kind: TokenKind) -> Option<Token> {
        if self.current_token_kind() == expected_kind {
            Some(self.advance())
        } else {
            self.unexpected();
            None
        }
    }

    /// Records an unexpected token at the cursor and enters panic mode.
    pub fn unexpected(&mut self) {
        let token = self.current_token();
        let error = if token.kind == TokenKind::EOF {
            ErrorImpl::UnexpectedEndOfFile
        } else {
            ErrorImpl::UnexpectedToken {
                token: token.describe(),
            }
        };
        let position = token.span.start.clone();

        self.errors.push(error, position);
        self.recover();
    }

    /// Records `error` at `position` and enters panic mode.
    pub fn error(&mut self, error: ErrorImpl, position: Position) {
        self.errors.push(error, position);
        self.recover();
    }

    /// Discards tokens through the next run of statement terminators.
    ///
    /// Stops without consuming at a closing brace or the end of input so the
    /// enclosing block can close itself.
    pub fn recover(&mut self) {
        loop {
            match self.current_token_kind() {
                TokenKind::EOF | TokenKind::CloseCurly => return,
                kind if kind.is_terminator() => {
                    self.discard_terminators();
                    return;
                }
                _ => {
                    self.advance();
                }
            }
        }
    }

    /// Skips newlines and semicolons.
    pub fn discard_terminators(&mut self) {
        while self.current_token_kind().is_terminator() {
            self.advance();
        }
    }

    /// Checks if there are more tokens to parse.
    pub fn has_tokens(&self) -> bool {
        self.current_token_kind() != TokenKind::EOF
    }

    pub fn checkpoint(&self) -> usize {
        self.pos
    }

    pub fn restore(&mut self, checkpoint: usize) {
        self.pos = checkpoint;
    }

    /// Returns the source position of the current token.
    pub fn get_position(&self) -> Position {
        self.current_token().span.start.clone()
    }

    pub fn get_file(&self) -> Rc<String> {
        Rc::clone(&self.file)
    }
}

/// Parses a stream of tokens into a module.
///
/// Every syntax error is pushed onto `errors`; items that fail to parse are
/// skipped and parsing continues with the next one.
///
/// # Arguments
///
/// * `tokens` - Vector of tokens to parse
/// * `file` - Reference-counted string containing the source file name
/// * `imports` - Handler resolving `import` directives
/// * `errors` - Collector receiving syntax diagnostics
///
/// # Returns
///
/// The root node holding every successfully parsed declaration.
pub fn parse(
    tokens: Vec<Token>,
    file: Rc<String>,
    imports: &mut dyn ImportHandler,
    errors: &mut ErrorStack,
) -> Toplevel {
    let mut toplevel = Toplevel::new(&file);
    let mut parser = Parser::new(tokens, file, imports, errors);

    loop {
        parser.discard_terminators();
        if !parser.has_tokens() {
            break;
        }

        let start = parser.checkpoint();
        parse_item(&mut parser, &mut toplevel);

        // A stray `}` stops recovery without being consumed
        if parser.checkpoint() == start {
            parser.advance();
        }
    }

    toplevel
}
