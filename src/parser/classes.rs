//! Class and feature parsing

use crate::ast::*;
use crate::error::CoolResult;
use crate::lexer::Token;
use super::Parser;
use super::expressions::parse_expression;

/// class ::= class TYPE [inherits TYPE] { [feature ;]* }
pub fn parse_class(parser: &mut Parser) -> CoolResult<ClassDecl> {
    let line = parser.current_line();
    parser.consume(&Token::Class, "'class'")?;

    let name = parser.consume_type_id("class name")?;

    let parent = if parser.match_token(&Token::Inherits) {
        parser.consume_type_id("parent class name after 'inherits'")?
    } else {
        parser.intern("Object")
    };

    parser.consume(&Token::LBrace, "'{' after class header")?;

    let mut features = Vec::new();
    while !parser.check(&Token::RBrace) && !parser.is_at_end() {
        features.push(parse_feature(parser)?);
        parser.consume(&Token::Semicolon, "';' after feature")?;
    }

    parser.consume(&Token::RBrace, "'}' after class body")?;

    Ok(ClassDecl {
        name,
        parent,
        features,
        file: parser.file_sym,
        line,
    })
}

/// feature ::= ID ( [formal [, formal]*] ) : TYPE { expr }
///           | ID : TYPE [ <- expr ]
pub fn parse_feature(parser: &mut Parser) -> CoolResult<Feature> {
    let line = parser.current_line();
    let name = parser.consume_object_id("feature name")?;

    if parser.match_token(&Token::LParen) {
        let formals = parse_formals(parser)?;
        parser.consume(&Token::RParen, "')' after formal parameters")?;
        parser.consume(&Token::Colon, "':' before return type")?;
        let return_type = parser.consume_type_id("return type")?;
        parser.consume(&Token::LBrace, "'{' before method body")?;
        let body = parse_expression(parser)?;
        parser.consume(&Token::RBrace, "'}' after method body")?;

        return Ok(Feature::Method(MethodDecl {
            name,
            formals,
            return_type,
            body,
            line,
        }));
    }

    parser.consume(&Token::Colon, "':' or '(' after feature name")?;
    let type_decl = parser.consume_type_id("attribute type")?;
    let init = if parser.match_token(&Token::Assign) {
        parse_expression(parser)?
    } else {
        parser.ids.no_expr(line)
    };

    Ok(Feature::Attribute(AttrDecl {
        name,
        type_decl,
        init,
        line,
    }))
}

fn parse_formals(parser: &mut Parser) -> CoolResult<Vec<Formal>> {
    let mut formals = Vec::new();

    if !parser.check(&Token::RParen) {
        loop {
            let line = parser.current_line();
            let name = parser.consume_object_id("formal parameter name")?;
            parser.consume(&Token::Colon, "':' after formal parameter name")?;
            let type_decl = parser.consume_type_id("formal parameter type")?;
            formals.push(Formal {
                name,
                type_decl,
                line,
            });

            if !parser.match_token(&Token::Comma) {
                break;
            }
        }
    }

    Ok(formals)
}
