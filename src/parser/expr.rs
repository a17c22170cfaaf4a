//! Expression parsing.
//!
//! Precedence, highest first:
//!
//! - primary: literals, calls, variables with `.member` / `[index]` chains,
//!   array literals `[len]T`, parenthesised expressions
//! - prefix unary: `*` dereference, `&` address-of, `<Type>` cast
//! - postfix unary: `->` pop, `?` length
//! - binary operators, resolved by a shunting-yard pass
//! - assignment, right associative and only on lvalues

use crate::{
    ast::{
        ast::Expr,
        expressions::{
            ArrayLiteralExpr, BoolExpr, CallExpr, CastExpr, FloatExpr, IndexExpr, MemberExpr,
            StringExpr, VariableExpr,
        },
        types::Type,
    },
    errors::errors::ErrorImpl,
    lexer::tokens::{Token, TokenKind},
};

use super::{parser::Parser, types::parse_type};

/// Parses a full expression including assignments.
pub fn parse_expr(parser: &mut Parser) -> Option<Expr> {
    let operand = parse_unary(parser)?;

    if parser.current_token_kind().is_assignment() {
        return parse_assignment(parser, operand);
    }

    if !parser.current_token_kind().is_binary_operator() {
        return Some(operand);
    }

    parser.may_parse_assign = false;
    let expr = parse_binary(parser, operand)?;

    if parser.current_token_kind().is_assignment() {
        let position = expr.get_position().clone();
        parser.error(ErrorImpl::InvalidAssignmentTarget, position);
        return None;
    }

    Some(expr)
}

fn parse_assignment(parser: &mut Parser, target: Expr) -> Option<Expr> {
    if !parser.may_parse_assign || !target.is_lvalue() {
        let position = target.get_position().clone();
        parser.error(ErrorImpl::InvalidAssignmentTarget, position);
        return None;
    }

    let operator = parser.advance();
    let value = parse_expr(parser)?;

    Some(Expr::binary(
        operator.kind,
        target,
        value,
        operator.span.start,
    ))
}

/// Shunting-yard over operands and operators.
///
/// An incoming operator first reduces every stacked operator with greater or
/// equal precedence, which makes all binary operators left associative.
fn parse_binary(parser: &mut Parser, first: Expr) -> Option<Expr> {
    let mut operands = vec![first];
    let mut operators: Vec<Token> = vec![];

    while parser.current_token_kind().is_binary_operator() {
        let operator = parser.advance();
        let precedence = operator.kind.precedence();

        while operators
            .last()
            .is_some_and(|top| precedence <= top.kind.precedence())
        {
            reduce(&mut operands, &mut operators);
        }
        operators.push(operator);

        let operand = parse_unary(parser)?;
        operands.push(operand);
    }

    while !operators.is_empty() {
        reduce(&mut operands, &mut operators);
    }

    operands.pop()
}

fn reduce(operands: &mut Vec<Expr>, operators: &mut Vec<Token>) {
    let (Some(operator), Some(right), Some(left)) =
        (operators.pop(), operands.pop(), operands.pop())
    else {
        return;
    };

    operands.push(Expr::binary(operator.kind, left, right, operator.span.start));
}

/// Prefix operators and casts, then a primary with its postfix operators.
pub fn parse_unary(parser: &mut Parser) -> Option<Expr> {
    match parser.current_token_kind() {
        TokenKind::Star | TokenKind::Ampersand => {
            let operator = parser.advance();
            if operator.kind == TokenKind::Ampersand {
                parser.may_parse_assign = false;
            }

            let operand = parse_unary(parser)?;
            Some(Expr::unary(operator.kind, operand, operator.span.start))
        }
        TokenKind::Less => parse_cast(parser),
        _ => {
            let primary = parse_primary(parser)?;
            Some(parse_postfix(parser, primary))
        }
    }
}

fn parse_cast(parser: &mut Parser) -> Option<Expr> {
    let start = parser.advance();

    let Some(target) = parse_type(parser) else {
        parser.unexpected();
        return None;
    };
    parser.expect(TokenKind::Greater)?;

    let operand = parse_unary(parser)?;
    parser.may_parse_assign = false;

    Some(Expr::Cast(CastExpr {
        target,
        operand: Box::new(operand),
        position: start.span.start,
        ty: Type::unresolved(),
    }))
}

fn parse_postfix(parser: &mut Parser, mut expr: Expr) -> Expr {
    while matches!(
        parser.current_token_kind(),
        TokenKind::Question | TokenKind::Pop
    ) {
        let operator = parser.advance();
        parser.may_parse_assign = false;
        expr = Expr::unary(operator.kind, expr, operator.span.start);
    }

    expr
}

fn parse_primary(parser: &mut Parser) -> Option<Expr> {
    let token = parser.current_token().clone();
    let position = token.span.start.clone();

    match token.kind {
        TokenKind::IntLiteral => {
            parser.advance();
            parser.may_parse_assign = false;
            match token.value.parse::<i32>() {
                Ok(value) => Some(Expr::int(value, position)),
                Err(_) => {
                    parser.error(ErrorImpl::IntegerOutOfRange { token: token.value }, position);
                    None
                }
            }
        }
        TokenKind::FloatLiteral => {
            parser.advance();
            parser.may_parse_assign = false;
            match token.value.parse::<f64>() {
                Ok(value) => Some(Expr::Float(FloatExpr {
                    value,
                    position,
                    ty: Type::unresolved(),
                })),
                Err(_) => {
                    parser.error(ErrorImpl::UnrecognisedToken { token: token.value }, position);
                    None
                }
            }
        }
        TokenKind::StringLiteral => {
            parser.advance();
            parser.may_parse_assign = false;
            Some(Expr::String(StringExpr {
                value: token.value,
                position,
                ty: Type::unresolved(),
            }))
        }
        TokenKind::True | TokenKind::False => {
            parser.advance();
            parser.may_parse_assign = false;
            Some(Expr::Bool(BoolExpr {
                value: token.kind == TokenKind::True,
                position,
                ty: Type::unresolved(),
            }))
        }
        TokenKind::OpenBracket => parse_array_literal(parser),
        TokenKind::OpenParen => {
            parser.advance();
            let expr = parse_expr(parser)?;
            parser.expect(TokenKind::CloseParen)?;
            parser.may_parse_assign = false;
            Some(expr)
        }
        TokenKind::Identifier if parser.peek_kind(1) == TokenKind::OpenParen => {
            parse_call(parser)
        }
        TokenKind::Identifier => {
            parser.advance();
            let variable = Expr::Variable(VariableExpr {
                identifier: token.value,
                position,
                ty: Type::unresolved(),
            });
            parse_accessors(parser, variable)
        }
        _ => {
            parser.unexpected();
            None
        }
    }
}

/// `name(arg, ...)`
fn parse_call(parser: &mut Parser) -> Option<Expr> {
    let identifier = parser.advance();
    parser.advance();

    let mut arguments = vec![];
    if parser.get_if(TokenKind::CloseParen).is_none() {
        loop {
            arguments.push(parse_expr(parser)?);

            if parser.get_if(TokenKind::Comma).is_some() {
                continue;
            }
            parser.expect(TokenKind::CloseParen)?;
            break;
        }
    }

    parser.may_parse_assign = false;

    Some(Expr::Call(CallExpr {
        identifier: identifier.value,
        arguments,
        position: identifier.span.start,
        ty: Type::unresolved(),
    }))
}

/// Chains of `.member` and `[index]` after a variable.
fn parse_accessors(parser: &mut Parser, mut expr: Expr) -> Option<Expr> {
    loop {
        match parser.current_token_kind() {
            TokenKind::Member => {
                let dot = parser.advance();
                let member = parser.expect(TokenKind::Identifier)?;
                expr = Expr::Member(MemberExpr {
                    target: Box::new(expr),
                    member: member.value,
                    position: dot.span.start,
                    ty: Type::unresolved(),
                });
            }
            TokenKind::OpenBracket => {
                let bracket = parser.advance();
                let may_parse_assign = parser.may_parse_assign;
                let index = parse_expr(parser)?;
                parser.expect(TokenKind::CloseBracket)?;
                parser.may_parse_assign = may_parse_assign;

                expr = Expr::Index(IndexExpr {
                    target: Box::new(expr),
                    index: Box::new(index),
                    position: bracket.span.start,
                    ty: Type::unresolved(),
                });
            }
            _ => return Some(expr),
        }
    }
}

/// `[length]T`, `[length]@T` or `[]T` for an empty array.
fn parse_array_literal(parser: &mut Parser) -> Option<Expr> {
    let start = parser.advance();

    let length = if parser.current_token_kind() == TokenKind::CloseBracket {
        None
    } else {
        Some(Box::new(parse_expr(parser)?))
    };
    parser.expect(TokenKind::CloseBracket)?;

    let realigned = parser.get_if(TokenKind::At).is_some();
    let Some(element) = parse_type(parser) else {
        parser.unexpected();
        return None;
    };

    parser.may_parse_assign = false;

    let array_type = if realigned {
        Type::realigned_array(element)
    } else {
        Type::array(element)
    };

    Some(Expr::ArrayLiteral(ArrayLiteralExpr {
        length,
        array_type,
        position: start.span.start,
        ty: Type::unresolved(),
    }))
}
