//! Expression parsing
//!
//! Precedence, lowest first: `<-`, `not`, `<= < =`, `+ -`, `* /`, `isvoid`,
//! `~`, `@`, `.`. `let`, `if`, `while`, `case`, blocks and `new` are
//! primaries; `let` and the prefix operators extend as far right as possible.

use crate::ast::*;
use crate::error::CoolResult;
use crate::lexer::Token;
use super::Parser;

/// Expression entry point
pub fn parse_expression(parser: &mut Parser) -> CoolResult<Expr> {
    parse_assignment(parser)
}

/// ID <- expr
pub fn parse_assignment(parser: &mut Parser) -> CoolResult<Expr> {
    if matches!(parser.current_token(), Some(Token::ObjectId(_)))
        && parser.peek_token(1) == Some(&Token::Assign)
    {
        let line = parser.current_line();
        let name = parser.consume_object_id("assignment target")?;
        parser.advance();
        let value = parse_assignment(parser)?;
        return Ok(parser.ids.expr(
            line,
            ExprKind::Assign {
                name,
                value: Box::new(value),
            },
        ));
    }

    parse_not(parser)
}

fn parse_not(parser: &mut Parser) -> CoolResult<Expr> {
    let line = parser.current_line();
    if parser.match_token(&Token::Not) {
        let operand = parse_not(parser)?;
        return Ok(parser.ids.expr(line, ExprKind::Not(Box::new(operand))));
    }
    parse_comparison(parser)
}

fn comparison_op(token: Option<&Token>) -> Option<Token> {
    match token {
        Some(t @ (Token::Lt | Token::Le | Token::Eq)) => Some(t.clone()),
        _ => None,
    }
}

fn parse_comparison(parser: &mut Parser) -> CoolResult<Expr> {
    let line = parser.current_line();
    let left = parse_additive(parser)?;

    let Some(op) = comparison_op(parser.current_token()) else {
        return Ok(left);
    };
    parser.advance();
    let right = parse_additive(parser)?;

    if comparison_op(parser.current_token()).is_some() {
        return Err(parser.error("comparison operators are non-associative"));
    }

    let (left, right) = (Box::new(left), Box::new(right));
    let kind = match op {
        Token::Lt => ExprKind::Compare {
            op: CompareOp::Lt,
            left,
            right,
        },
        Token::Le => ExprKind::Compare {
            op: CompareOp::Le,
            left,
            right,
        },
        _ => ExprKind::Eq { left, right },
    };
    Ok(parser.ids.expr(line, kind))
}

fn parse_additive(parser: &mut Parser) -> CoolResult<Expr> {
    let line = parser.current_line();
    let mut left = parse_multiplicative(parser)?;

    loop {
        let op = if parser.match_token(&Token::Plus) {
            ArithOp::Add
        } else if parser.match_token(&Token::Minus) {
            ArithOp::Sub
        } else {
            break;
        };
        let right = parse_multiplicative(parser)?;
        left = parser.ids.expr(
            line,
            ExprKind::Arith {
                op,
                left: Box::new(left),
                right: Box::new(right),
            },
        );
    }

    Ok(left)
}

fn parse_multiplicative(parser: &mut Parser) -> CoolResult<Expr> {
    let line = parser.current_line();
    let mut left = parse_isvoid(parser)?;

    loop {
        let op = if parser.match_token(&Token::Star) {
            ArithOp::Mul
        } else if parser.match_token(&Token::Slash) {
            ArithOp::Div
        } else {
            break;
        };
        let right = parse_isvoid(parser)?;
        left = parser.ids.expr(
            line,
            ExprKind::Arith {
                op,
                left: Box::new(left),
                right: Box::new(right),
            },
        );
    }

    Ok(left)
}

fn parse_isvoid(parser: &mut Parser) -> CoolResult<Expr> {
    let line = parser.current_line();
    if parser.match_token(&Token::IsVoid) {
        let operand = parse_isvoid(parser)?;
        return Ok(parser.ids.expr(line, ExprKind::IsVoid(Box::new(operand))));
    }
    parse_negation(parser)
}

fn parse_negation(parser: &mut Parser) -> CoolResult<Expr> {
    let line = parser.current_line();
    if parser.match_token(&Token::Tilde) {
        let operand = parse_negation(parser)?;
        return Ok(parser.ids.expr(line, ExprKind::Neg(Box::new(operand))));
    }
    parse_postfix(parser)
}

/// expr[@TYPE].ID(args), chained left to right
fn parse_postfix(parser: &mut Parser) -> CoolResult<Expr> {
    let line = parser.current_line();
    let mut expr = parse_primary(parser)?;

    loop {
        if parser.match_token(&Token::At) {
            let type_name = parser.consume_type_id("class name after '@'")?;
            parser.consume(&Token::Dot, "'.' after static dispatch type")?;
            let method = parser.consume_object_id("method name after '.'")?;
            let args = parse_arguments(parser)?;
            expr = parser.ids.expr(
                line,
                ExprKind::StaticDispatch {
                    receiver: Box::new(expr),
                    type_name,
                    method,
                    args,
                },
            );
        } else if parser.match_token(&Token::Dot) {
            let method = parser.consume_object_id("method name after '.'")?;
            let args = parse_arguments(parser)?;
            expr = parser.ids.expr(
                line,
                ExprKind::Dispatch {
                    receiver: Box::new(expr),
                    method,
                    args,
                },
            );
        } else {
            break;
        }
    }

    Ok(expr)
}

/// ( [expr [, expr]*] )
fn parse_arguments(parser: &mut Parser) -> CoolResult<Vec<Expr>> {
    parser.consume(&Token::LParen, "'(' before arguments")?;
    let mut args = Vec::new();

    if !parser.check(&Token::RParen) {
        loop {
            args.push(parse_expression(parser)?);
            if !parser.match_token(&Token::Comma) {
                break;
            }
        }
    }

    parser.consume(&Token::RParen, "')' after arguments")?;
    Ok(args)
}

fn parse_primary(parser: &mut Parser) -> CoolResult<Expr> {
    let line = parser.current_line();

    let Some(token) = parser.current_token().cloned() else {
        return Err(parser.error("expected expression"));
    };

    match token {
        Token::ObjectId(name) => {
            if parser.peek_token(1) == Some(&Token::Assign) {
                return parse_assignment(parser);
            }
            parser.advance();
            let name = parser.intern(&name);
            if parser.check(&Token::LParen) {
                // f(args) dispatches on self
                let self_sym = parser.intern("self");
                let receiver = parser.ids.expr(line, ExprKind::Object(self_sym));
                let args = parse_arguments(parser)?;
                return Ok(parser.ids.expr(
                    line,
                    ExprKind::Dispatch {
                        receiver: Box::new(receiver),
                        method: name,
                        args,
                    },
                ));
            }
            Ok(parser.ids.expr(line, ExprKind::Object(name)))
        }
        Token::IntLiteral(value) => {
            parser.advance();
            Ok(parser.ids.expr(line, ExprKind::IntConst(value)))
        }
        Token::StringLiteral(value) => {
            parser.advance();
            Ok(parser.ids.expr(line, ExprKind::StringConst(value)))
        }
        Token::True | Token::False => {
            parser.advance();
            Ok(parser.ids.expr(line, ExprKind::BoolConst(token == Token::True)))
        }
        Token::LParen => {
            parser.advance();
            let expr = parse_expression(parser)?;
            parser.consume(&Token::RParen, "')' after expression")?;
            Ok(expr)
        }
        Token::Not => parse_not(parser),
        Token::If => parse_if(parser),
        Token::While => parse_while(parser),
        Token::LBrace => parse_block(parser),
        Token::Let => parse_let(parser),
        Token::Case => parse_case(parser),
        Token::New => {
            parser.advance();
            let type_name = parser.consume_type_id("class name after 'new'")?;
            Ok(parser.ids.expr(line, ExprKind::New(type_name)))
        }
        _ => Err(parser.error("expected expression")),
    }
}

fn parse_if(parser: &mut Parser) -> CoolResult<Expr> {
    let line = parser.current_line();
    parser.consume(&Token::If, "'if'")?;
    let pred = parse_expression(parser)?;
    parser.consume(&Token::Then, "'then'")?;
    let then_branch = parse_expression(parser)?;
    parser.consume(&Token::Else, "'else'")?;
    let else_branch = parse_expression(parser)?;
    parser.consume(&Token::Fi, "'fi'")?;

    Ok(parser.ids.expr(
        line,
        ExprKind::Cond {
            pred: Box::new(pred),
            then_branch: Box::new(then_branch),
            else_branch: Box::new(else_branch),
        },
    ))
}

fn parse_while(parser: &mut Parser) -> CoolResult<Expr> {
    let line = parser.current_line();
    parser.consume(&Token::While, "'while'")?;
    let pred = parse_expression(parser)?;
    parser.consume(&Token::Loop, "'loop'")?;
    let body = parse_expression(parser)?;
    parser.consume(&Token::Pool, "'pool'")?;

    Ok(parser.ids.expr(
        line,
        ExprKind::Loop {
            pred: Box::new(pred),
            body: Box::new(body),
        },
    ))
}

/// { [expr ;]+ }
fn parse_block(parser: &mut Parser) -> CoolResult<Expr> {
    let line = parser.current_line();
    parser.consume(&Token::LBrace, "'{'")?;

    let mut body = Vec::new();
    loop {
        body.push(parse_expression(parser)?);
        parser.consume(&Token::Semicolon, "';' after block expression")?;
        if parser.match_token(&Token::RBrace) {
            break;
        }
    }

    Ok(parser.ids.expr(line, ExprKind::Block(body)))
}

/// let ID : TYPE [<- expr] [, ID : TYPE [<- expr]]* in expr
///
/// Several bindings become nested single-binding lets.
fn parse_let(parser: &mut Parser) -> CoolResult<Expr> {
    parser.consume(&Token::Let, "'let'")?;

    let mut bindings = Vec::new();
    loop {
        let binding_line = parser.current_line();
        let name = parser.consume_object_id("let variable name")?;
        parser.consume(&Token::Colon, "':' after let variable")?;
        let type_decl = parser.consume_type_id("let variable type")?;
        let init = if parser.match_token(&Token::Assign) {
            parse_expression(parser)?
        } else {
            parser.ids.no_expr(binding_line)
        };
        bindings.push((binding_line, name, type_decl, init));

        if !parser.match_token(&Token::Comma) {
            break;
        }
    }

    parser.consume(&Token::In, "'in' after let bindings")?;
    let mut body = parse_expression(parser)?;

    for (binding_line, name, type_decl, init) in bindings.into_iter().rev() {
        body = parser.ids.expr(
            binding_line,
            ExprKind::Let {
                name,
                type_decl,
                init: Box::new(init),
                body: Box::new(body),
            },
        );
    }

    Ok(body)
}

/// case expr of [ID : TYPE => expr ;]+ esac
fn parse_case(parser: &mut Parser) -> CoolResult<Expr> {
    let line = parser.current_line();
    parser.consume(&Token::Case, "'case'")?;
    let scrutinee = parse_expression(parser)?;
    parser.consume(&Token::Of, "'of'")?;

    let mut branches = Vec::new();
    loop {
        let branch_line = parser.current_line();
        let name = parser.consume_object_id("case branch variable")?;
        parser.consume(&Token::Colon, "':' after case branch variable")?;
        let type_decl = parser.consume_type_id("case branch type")?;
        parser.consume(&Token::DArrow, "'=>' in case branch")?;
        let body = parse_expression(parser)?;
        parser.consume(&Token::Semicolon, "';' after case branch")?;
        branches.push(CaseBranch {
            name,
            type_decl,
            body,
            line: branch_line,
        });

        if parser.match_token(&Token::Esac) {
            break;
        }
    }

    Ok(parser.ids.expr(
        line,
        ExprKind::Case {
            scrutinee: Box::new(scrutinee),
            branches,
        },
    ))
}
