//! Recursive-descent parser turning the token stream into the program tree.
//!
//! Split into class-level and expression-level submodules; the `Parser`
//! value itself only owns the cursor and the token helpers.

mod classes;
mod expressions;

use std::path::Path;

use crate::ast::{ExprIdGen, Program};
use crate::error::{CoolError, CoolResult, parser_error};
use crate::intern::{Interner, Symbol};
use crate::lexer::{self, Token, TokenWithLocation};

pub struct Parser<'a> {
    pub tokens: Vec<TokenWithLocation>,
    pub pos: usize,
    file: &'a str,
    file_sym: Symbol,
    interner: &'a mut Interner,
    ids: &'a mut ExprIdGen,
}

impl<'a> Parser<'a> {
    pub fn new(
        file: &'a str,
        tokens: Vec<TokenWithLocation>,
        interner: &'a mut Interner,
        ids: &'a mut ExprIdGen,
    ) -> Self {
        let file_sym = interner.intern(file);
        Self {
            tokens,
            pos: 0,
            file,
            file_sym,
            interner,
            ids,
        }
    }

    /// program ::= [class ;]+
    pub fn parse(&mut self) -> CoolResult<Program> {
        let mut classes = Vec::new();

        while !self.is_at_end() {
            classes.push(classes::parse_class(self)?);
            self.consume(&Token::Semicolon, "';' after class definition")?;
        }

        if classes.is_empty() {
            return Err(self.error("expected at least one class definition"));
        }

        Ok(Program { classes })
    }

    fn is_at_end(&self) -> bool {
        self.pos >= self.tokens.len()
    }

    fn current_token(&self) -> Option<&Token> {
        self.tokens.get(self.pos).map(|t| &t.token)
    }

    fn peek_token(&self, offset: usize) -> Option<&Token> {
        self.tokens.get(self.pos + offset).map(|t| &t.token)
    }

    fn current_line(&self) -> usize {
        match self.tokens.get(self.pos).or_else(|| self.tokens.last()) {
            Some(t) => t.loc.line,
            None => 1,
        }
    }

    fn advance(&mut self) -> Option<&Token> {
        let token = self.tokens.get(self.pos).map(|t| &t.token);
        if token.is_some() {
            self.pos += 1;
        }
        token
    }

    fn check(&self, token: &Token) -> bool {
        self.current_token() == Some(token)
    }

    fn match_token(&mut self, token: &Token) -> bool {
        if self.check(token) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn consume(&mut self, token: &Token, expected: &str) -> CoolResult<()> {
        if self.match_token(token) {
            Ok(())
        } else {
            Err(self.error(&format!("expected {}", expected)))
        }
    }

    fn consume_type_id(&mut self, expected: &str) -> CoolResult<Symbol> {
        match self.current_token() {
            Some(Token::TypeId(name)) => {
                let name = name.clone();
                self.pos += 1;
                Ok(self.interner.intern(&name))
            }
            _ => Err(self.error(&format!("expected {}", expected))),
        }
    }

    fn consume_object_id(&mut self, expected: &str) -> CoolResult<Symbol> {
        match self.current_token() {
            Some(Token::ObjectId(name)) => {
                let name = name.clone();
                self.pos += 1;
                Ok(self.interner.intern(&name))
            }
            _ => Err(self.error(&format!("expected {}", expected))),
        }
    }

    fn intern(&mut self, s: &str) -> Symbol {
        self.interner.intern(s)
    }

    fn error(&self, message: &str) -> CoolError {
        let found = match self.current_token() {
            Some(token) => describe(token),
            None => "end of file".to_string(),
        };
        parser_error(
            self.file,
            self.current_line(),
            format!("{}, found {}", message, found),
        )
    }
}

fn describe(token: &Token) -> String {
    match token {
        Token::TypeId(name) => format!("type identifier '{}'", name),
        Token::ObjectId(name) => format!("identifier '{}'", name),
        Token::IntLiteral(value) => format!("integer {}", value),
        Token::StringLiteral(_) => "string constant".to_string(),
        other => format!("{:?}", other),
    }
}

/// Parses an already-lexed token stream for `file`.
pub fn parse(
    file: &str,
    tokens: Vec<TokenWithLocation>,
    interner: &mut Interner,
    ids: &mut ExprIdGen,
) -> CoolResult<Program> {
    let mut parser = Parser::new(file, tokens, interner, ids);
    parser.parse()
}

/// Lexes and parses one source text.
pub fn parse_source(
    file: &str,
    source: &str,
    interner: &mut Interner,
    ids: &mut ExprIdGen,
) -> CoolResult<Program> {
    let tokens = lexer::lex(file, source)?;
    parse(file, tokens, interner, ids)
}

/// Reads and parses every file into one program, in the order given.
pub fn parse_files<P: AsRef<Path>>(paths: &[P], interner: &mut Interner) -> CoolResult<Program> {
    let mut ids = ExprIdGen::new();
    let mut program = Program::default();

    for path in paths {
        let path = path.as_ref();
        let source = std::fs::read_to_string(path)
            .map_err(|e| CoolError::Io(format!("{}: {}", path.display(), e)))?;
        let file = path.to_string_lossy();
        tracing::debug!(file = %file, bytes = source.len(), "parsing source file");
        program.extend(parse_source(&file, &source, interner, &mut ids)?);
    }

    Ok(program)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{ExprKind, Feature};

    fn parse_ok(source: &str) -> (Program, Interner) {
        let mut interner = Interner::new();
        let mut ids = ExprIdGen::new();
        let program = parse_source("test.cl", source, &mut interner, &mut ids).unwrap();
        (program, interner)
    }

    fn parse_err(source: &str) -> String {
        let mut interner = Interner::new();
        let mut ids = ExprIdGen::new();
        match parse_source("test.cl", source, &mut interner, &mut ids) {
            Err(CoolError::Parser { message, .. }) => message,
            other => panic!("expected parse error, got {:?}", other),
        }
    }

    fn method_body<'p>(program: &'p Program, class: usize, feature: usize) -> &'p ExprKind {
        match &program.classes[class].features[feature] {
            Feature::Method(m) => &m.body.kind,
            Feature::Attribute(_) => panic!("expected a method"),
        }
    }

    #[test]
    fn class_defaults_to_object_parent() {
        let (program, interner) = parse_ok("class Main { main() : Int { 0 }; };");
        let class = &program.classes[0];
        assert_eq!(interner.resolve(class.name), "Main");
        assert_eq!(interner.resolve(class.parent), "Object");
        assert_eq!(interner.resolve(class.file), "test.cl");
    }

    #[test]
    fn attributes_and_formals() {
        let (program, interner) = parse_ok(
            "class A inherits IO {\n  x : Int <- 3;\n  y : String;\n  f(a : Int, b : Bool) : SELF_TYPE { self };\n};",
        );
        let class = &program.classes[0];
        assert_eq!(interner.resolve(class.parent), "IO");
        let attrs: Vec<_> = class.attributes().collect();
        assert_eq!(attrs.len(), 2);
        assert!(!attrs[0].init.is_no_expr());
        assert!(attrs[1].init.is_no_expr());
        assert_eq!(attrs[1].line, 3);
        let method = class.methods().next().unwrap();
        assert_eq!(method.formals.len(), 2);
        assert_eq!(interner.resolve(method.return_type), "SELF_TYPE");
    }

    #[test]
    fn arithmetic_precedence() {
        let (program, _) = parse_ok("class Main { main() : Int { 1 + 2 * 3 }; };");
        match method_body(&program, 0, 0) {
            ExprKind::Arith { op, right, .. } => {
                assert_eq!(*op, crate::ast::ArithOp::Add);
                assert!(matches!(right.kind, ExprKind::Arith { op: crate::ast::ArithOp::Mul, .. }));
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn let_with_several_bindings_nests() {
        let (program, _) = parse_ok("class Main { main() : Int { let a : Int <- 1, b : Int in a + b }; };");
        match method_body(&program, 0, 0) {
            ExprKind::Let { body, .. } => match &body.kind {
                ExprKind::Let { init, body, .. } => {
                    assert!(init.is_no_expr());
                    assert!(matches!(body.kind, ExprKind::Arith { .. }));
                }
                other => panic!("unexpected {:?}", other),
            },
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn implicit_self_dispatch_and_static_dispatch() {
        let (program, interner) = parse_ok("class Main { main() : Object { f(1)@IO.out_int(2).copy() }; };");
        match method_body(&program, 0, 0) {
            ExprKind::Dispatch { receiver, method, .. } => {
                assert_eq!(interner.resolve(*method), "copy");
                match &receiver.kind {
                    ExprKind::StaticDispatch { receiver, type_name, .. } => {
                        assert_eq!(interner.resolve(*type_name), "IO");
                        match &receiver.kind {
                            ExprKind::Dispatch { receiver, .. } => {
                                assert!(matches!(receiver.kind, ExprKind::Object(s) if interner.resolve(s) == "self"));
                            }
                            other => panic!("unexpected {:?}", other),
                        }
                    }
                    other => panic!("unexpected {:?}", other),
                }
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn case_and_loops() {
        let (program, _) = parse_ok(
            "class Main { main() : Object { case 1 of x : Int => while true loop x pool; y : Object => { y; }; esac }; };",
        );
        match method_body(&program, 0, 0) {
            ExprKind::Case { branches, .. } => assert_eq!(branches.len(), 2),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn comparison_is_non_associative() {
        assert!(parse_err("class Main { main() : Bool { 1 < 2 < 3 }; };").contains("non-associative"));
    }

    #[test]
    fn expression_ids_are_unique() {
        let (program, _) = parse_ok("class Main { main() : Int { { 1; 2; 3; } }; };");
        match method_body(&program, 0, 0) {
            ExprKind::Block(exprs) => {
                let mut ids: Vec<_> = exprs.iter().map(|e| e.id).collect();
                ids.dedup();
                assert_eq!(ids.len(), 3);
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn syntax_errors_report_found_token() {
        let message = parse_err("class main { };");
        assert!(message.contains("class name"), "{}", message);
        assert!(parse_err("").contains("at least one class"));
        assert!(parse_err("class Main { x : Int }").contains("';'"));
    }
}
