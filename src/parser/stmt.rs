//! Module-level declarations and statements.

use crate::{
    ast::{
        statements::{
            BranchStmt, ExpressionStmt, ExternDeclStmt, FnDeclStmt, Item, LinkStmt, LoopStmt,
            ReturnStmt, Stmt, StructDeclStmt, StructMemberDecl, Toplevel, VarDeclStmt,
        },
        types::{FunctionSignature, Type},
    },
    errors::errors::ErrorImpl,
    lexer::tokens::TokenKind,
};

use super::{expr::parse_expr, parser::Parser, types::parse_type};

/// Parses one module-level declaration and adds it to `toplevel`.
///
/// Imports are resolved immediately and the imported declarations are spliced
/// in place of the directive.
pub fn parse_item(parser: &mut Parser, toplevel: &mut Toplevel) {
    match parser.current_token_kind() {
        TokenKind::Link => {
            if let Some(link) = parse_link(parser) {
                toplevel.add_item(Item::Link(link));
            }
        }
        TokenKind::Import => parse_import(parser, toplevel),
        TokenKind::Struct | TokenKind::Volatile => {
            if let Some(decl) = parse_struct_decl(parser) {
                toplevel.add_item(Item::Struct(decl));
            }
        }
        TokenKind::Fn => {
            if let Some(decl) = parse_fn_decl(parser) {
                toplevel.add_item(Item::Function(decl));
            }
        }
        TokenKind::Extern => {
            if let Some(decl) = parse_extern_decl(parser) {
                toplevel.add_item(Item::Extern(decl));
            }
        }
        _ => parser.unexpected(),
    }
}

fn parse_link(parser: &mut Parser) -> Option<LinkStmt> {
    let start = parser.advance();
    let library = parser.expect(TokenKind::StringLiteral)?;
    expect_statement_end(parser)?;

    Some(LinkStmt {
        library: library.value,
        position: start.span.start,
    })
}

fn parse_import(parser: &mut Parser, toplevel: &mut Toplevel) {
    parser.advance();
    let Some(module) = parser.expect(TokenKind::StringLiteral) else {
        return;
    };
    if expect_statement_end(parser).is_none() {
        return;
    }

    let position = module.span.start;
    if let Some(imported) = parser
        .imports
        .import(&module.value, &position, parser.errors)
    {
        toplevel.splice(imported);
    }
}

/// `[volatile] struct Name { Type member ... }`
fn parse_struct_decl(parser: &mut Parser) -> Option<StructDeclStmt> {
    let start = parser.get_position();
    let volatile = parser.get_if(TokenKind::Volatile).is_some();
    parser.expect(TokenKind::Struct)?;
    let name = parser.expect(TokenKind::Identifier)?;

    parser.discard_terminators();
    parser.expect(TokenKind::OpenCurly)?;

    let mut members = vec![];
    loop {
        while parser.current_token_kind().is_terminator()
            || parser.current_token_kind() == TokenKind::Comma
        {
            parser.advance();
        }

        if parser.get_if(TokenKind::CloseCurly).is_some() {
            break;
        }

        let position = parser.get_position();
        let Some(ty) = parse_type(parser) else {
            parser.unexpected();
            return None;
        };
        let member = parser.expect(TokenKind::Identifier)?;

        members.push(StructMemberDecl {
            name: member.value,
            ty,
            position,
        });
    }

    Some(StructDeclStmt {
        name: name.value,
        members,
        volatile,
        position: start,
    })
}

/// `fn name(Type p, ...) [Type] { body }`
fn parse_fn_decl(parser: &mut Parser) -> Option<FnDeclStmt> {
    let start = parser.advance();
    let name = parser.expect(TokenKind::Identifier)?;
    let mut signature = FunctionSignature::new(&name.value);

    parser.expect(TokenKind::OpenParen)?;
    if parser.get_if(TokenKind::CloseParen).is_none() {
        loop {
            let Some(ty) = parse_type(parser) else {
                parser.unexpected();
                return None;
            };
            let parameter = parser.expect(TokenKind::Identifier)?;

            signature.parameters.push(ty);
            signature.parameter_names.push(parameter.value);

            if parser.get_if(TokenKind::Comma).is_none() {
                parser.expect(TokenKind::CloseParen)?;
                break;
            }
        }
    }

    if parser.current_token_kind() != TokenKind::OpenCurly {
        let Some(return_type) = parse_type(parser) else {
            parser.unexpected();
            return None;
        };
        signature.return_type = return_type;
    }

    let body = parse_block(parser)?;

    Some(FnDeclStmt {
        signature,
        body,
        position: start.span.start,
    })
}

/// `extern fn name(Type [name], ..., ...) [Type]`
///
/// Parameter names are optional on externs; a `...` parameter marks the
/// function variadic and must come last.
fn parse_extern_decl(parser: &mut Parser) -> Option<ExternDeclStmt> {
    let start = parser.advance();
    parser.expect(TokenKind::Fn)?;
    let name = parser.expect(TokenKind::Identifier)?;
    let mut signature = FunctionSignature::new(&name.value);

    parser.expect(TokenKind::OpenParen)?;
    if parser.get_if(TokenKind::CloseParen).is_none() {
        loop {
            if let Some(variadic) = parser.get_if(TokenKind::Variadic) {
                signature.parameters.push(Type::variadic());
                signature.parameter_names.push(String::new());

                if parser.current_token_kind() == TokenKind::Comma {
                    parser.error(ErrorImpl::VariadicNotLast, variadic.span.start);
                    return None;
                }
                parser.expect(TokenKind::CloseParen)?;
                break;
            }

            let Some(ty) = parse_type(parser) else {
                parser.unexpected();
                return None;
            };
            let parameter = parser
                .get_if(TokenKind::Identifier)
                .map(|token| token.value)
                .unwrap_or_default();

            signature.parameters.push(ty);
            signature.parameter_names.push(parameter);

            if parser.get_if(TokenKind::Comma).is_none() {
                parser.expect(TokenKind::CloseParen)?;
                break;
            }
        }
    }

    if !parser.current_token_kind().is_terminator() && parser.has_tokens() {
        let Some(return_type) = parse_type(parser) else {
            parser.unexpected();
            return None;
        };
        signature.return_type = return_type;
    }

    expect_statement_end(parser)?;

    Some(ExternDeclStmt {
        signature,
        position: start.span.start,
    })
}

/// `{ stmt ... }`
///
/// Statements that fail to parse are dropped; the block keeps going with the
/// next one. Returns `None` only when the block itself is malformed.
pub fn parse_block(parser: &mut Parser) -> Option<Vec<Stmt>> {
    parser.expect(TokenKind::OpenCurly)?;

    let mut body = vec![];
    loop {
        parser.discard_terminators();

        match parser.current_token_kind() {
            TokenKind::CloseCurly => {
                parser.advance();
                return Some(body);
            }
            TokenKind::EOF => {
                parser.unexpected();
                return None;
            }
            _ => {}
        }

        let start = parser.checkpoint();
        match parse_stmt(parser) {
            Some(stmt) => body.push(stmt),
            None => {
                if parser.checkpoint() == start
                    && parser.current_token_kind() != TokenKind::CloseCurly
                {
                    parser.advance();
                }
            }
        }
    }
}

/// Parses a single statement inside a function body.
pub fn parse_stmt(parser: &mut Parser) -> Option<Stmt> {
    parser.may_parse_assign = true;

    match parser.current_token_kind() {
        TokenKind::Return => parse_return(parser),
        TokenKind::If => parse_branch(parser),
        TokenKind::While => parse_while(parser),
        TokenKind::For => parse_for(parser),
        _ => {
            let stmt = parse_simple_stmt(parser)?;
            expect_statement_end(parser)?;
            Some(stmt)
        }
    }
}

/// Declarations and expression statements, without their terminator.
fn parse_simple_stmt(parser: &mut Parser) -> Option<Stmt> {
    if parser.current_token_kind() == TokenKind::Var {
        return parse_var_decl(parser);
    }

    if let Some(decl) = try_parse_typed_decl(parser) {
        return decl;
    }

    parse_expression_stmt(parser)
}

/// `var name = value`
fn parse_var_decl(parser: &mut Parser) -> Option<Stmt> {
    let start = parser.advance();
    let identifier = parser.expect(TokenKind::Identifier)?;

    if parser.get_if(TokenKind::Assignment).is_none() {
        let position = parser.get_position();
        parser.error(ErrorImpl::VarWithoutInitializer, position);
        return None;
    }

    let value = parse_expr(parser)?;

    Some(Stmt::VarDecl(VarDeclStmt {
        identifier: identifier.value,
        ty: Type::unresolved(),
        inferred: true,
        value: Some(value),
        position: start.span.start,
    }))
}

/// `Type name [= value]`
///
/// Returns `None` without consuming anything when the cursor is not at a
/// declaration, and `Some(None)` when a declaration was recognised but is
/// malformed.
fn try_parse_typed_decl(parser: &mut Parser) -> Option<Option<Stmt>> {
    let checkpoint = parser.checkpoint();
    let position = parser.get_position();

    let Some(ty) = parse_type(parser) else {
        return None;
    };
    let Some(identifier) = parser.get_if(TokenKind::Identifier) else {
        parser.restore(checkpoint);
        return None;
    };

    let value = if parser.get_if(TokenKind::Assignment).is_some() {
        match parse_expr(parser) {
            Some(value) => Some(value),
            None => return Some(None),
        }
    } else {
        None
    };

    Some(Some(Stmt::VarDecl(VarDeclStmt {
        identifier: identifier.value,
        ty,
        inferred: false,
        value,
        position,
    })))
}

/// Calls, assignments, pushes and pops are the only expressions allowed to
/// stand alone.
fn parse_expression_stmt(parser: &mut Parser) -> Option<Stmt> {
    let expression = parse_expr(parser)?;
    let position = expression.get_position().clone();

    if expression.precedence() != Some(0) {
        parser.error(ErrorImpl::StrayExpression, position);
        return None;
    }

    Some(Stmt::Expression(ExpressionStmt {
        expression,
        position,
    }))
}

/// `return [value]`
fn parse_return(parser: &mut Parser) -> Option<Stmt> {
    let start = parser.advance();

    let value = match parser.current_token_kind() {
        kind if kind.is_terminator() => None,
        TokenKind::CloseCurly | TokenKind::EOF => None,
        _ => Some(parse_expr(parser)?),
    };
    expect_statement_end(parser)?;

    Some(Stmt::Return(ReturnStmt {
        value,
        position: start.span.start,
    }))
}

/// `if cond { .. } [else { .. } | else if ..]` or `if cond then stmt`
fn parse_branch(parser: &mut Parser) -> Option<Stmt> {
    let start = parser.advance();
    let condition = parse_expr(parser)?;

    if parser.get_if(TokenKind::Then).is_some() {
        let body = parse_stmt(parser)?;
        return Some(Stmt::Branch(BranchStmt {
            condition,
            body: vec![body],
            else_body: None,
            position: start.span.start,
        }));
    }

    let body = parse_block(parser)?;

    let checkpoint = parser.checkpoint();
    parser.discard_terminators();

    let else_body = if parser.get_if(TokenKind::Else).is_some() {
        if parser.current_token_kind() == TokenKind::If {
            Some(vec![parse_branch(parser)?])
        } else {
            Some(parse_block(parser)?)
        }
    } else {
        parser.restore(checkpoint);
        None
    };

    Some(Stmt::Branch(BranchStmt {
        condition,
        body,
        else_body,
        position: start.span.start,
    }))
}

/// `while cond { .. }`
fn parse_while(parser: &mut Parser) -> Option<Stmt> {
    let start = parser.advance();
    let condition = parse_expr(parser)?;
    let body = parse_block(parser)?;

    Some(Stmt::Loop(LoopStmt {
        prefix: None,
        condition,
        suffix: None,
        body,
        position: start.span.start,
    }))
}

/// `for [prefix]; cond; [suffix] { .. }`
fn parse_for(parser: &mut Parser) -> Option<Stmt> {
    let start = parser.advance();

    let prefix = if parser.current_token_kind() == TokenKind::Semicolon {
        None
    } else {
        Some(Box::new(parse_simple_stmt(parser)?))
    };
    parser.expect(TokenKind::Semicolon)?;

    parser.may_parse_assign = true;
    let condition = parse_expr(parser)?;
    parser.expect(TokenKind::Semicolon)?;

    let suffix = if parser.current_token_kind() == TokenKind::OpenCurly {
        None
    } else {
        parser.may_parse_assign = true;
        Some(parse_expr(parser)?)
    };

    let body = parse_block(parser)?;

    Some(Stmt::Loop(LoopStmt {
        prefix,
        condition,
        suffix,
        body,
        position: start.span.start,
    }))
}

/// A statement ends at a newline or `;`. A closing brace or the end of the
/// input also ends it but is left for the enclosing production.
fn expect_statement_end(parser: &mut Parser) -> Option<()> {
    match parser.current_token_kind() {
        kind if kind.is_terminator() => {
            parser.discard_terminators();
            Some(())
        }
        TokenKind::CloseCurly | TokenKind::EOF => Some(()),
        _ => {
            parser.unexpected();
            None
        }
    }
}
