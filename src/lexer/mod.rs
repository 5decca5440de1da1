use logos::Logos;
use thiserror::Error;

use crate::error::{CoolResult, SourceLocation, lexer_error};

const MAX_STRING_LENGTH: usize = 1024;

#[derive(Error, Debug, Clone, PartialEq, Default)]
pub enum LexError {
    #[default]
    #[error("unexpected character")]
    UnexpectedCharacter,
    #[error("integer literal out of range")]
    IntegerOverflow,
    #[error("EOF in string constant")]
    UnterminatedString,
    #[error("unterminated string constant")]
    NewlineInString,
    #[error("string contains null character")]
    NullInString,
    #[error("string constant too long")]
    StringTooLong,
    #[error("EOF in comment")]
    UnterminatedComment,
}

#[derive(Logos, Debug, Clone, PartialEq)]
#[logos(error = LexError)]
#[logos(skip r"[ \t\n\f\r\x0B]+")]
#[logos(skip r"--[^\n]*")]
pub enum Token {
    // keywords are case-insensitive
    #[token("class", ignore(ascii_case))]
    Class,
    #[token("else", ignore(ascii_case))]
    Else,
    #[token("fi", ignore(ascii_case))]
    Fi,
    #[token("if", ignore(ascii_case))]
    If,
    #[token("in", ignore(ascii_case))]
    In,
    #[token("inherits", ignore(ascii_case))]
    Inherits,
    #[token("isvoid", ignore(ascii_case))]
    IsVoid,
    #[token("let", ignore(ascii_case))]
    Let,
    #[token("loop", ignore(ascii_case))]
    Loop,
    #[token("pool", ignore(ascii_case))]
    Pool,
    #[token("then", ignore(ascii_case))]
    Then,
    #[token("while", ignore(ascii_case))]
    While,
    #[token("case", ignore(ascii_case))]
    Case,
    #[token("esac", ignore(ascii_case))]
    Esac,
    #[token("new", ignore(ascii_case))]
    New,
    #[token("of", ignore(ascii_case))]
    Of,
    #[token("not", ignore(ascii_case))]
    Not,

    // the leading letter of a boolean constant must be lowercase
    #[regex("t[rR][uU][eE]")]
    True,
    #[regex("f[aA][lL][sS][eE]")]
    False,

    #[regex(r"[A-Z][A-Za-z0-9_]*", |lex| lex.slice().to_string())]
    TypeId(String),

    #[regex(r"[a-z][A-Za-z0-9_]*", |lex| lex.slice().to_string())]
    ObjectId(String),

    #[regex(r"[0-9]+", |lex| lex.slice().parse::<i64>().map_err(|_| LexError::IntegerOverflow))]
    IntLiteral(i64),

    #[token("\"", lex_string)]
    StringLiteral(String),

    #[token("<-")]
    Assign,
    #[token("=>")]
    DArrow,
    #[token("<=")]
    Le,
    #[token("<")]
    Lt,
    #[token("=")]
    Eq,
    #[token("+")]
    Plus,
    #[token("-")]
    Minus,
    #[token("*")]
    Star,
    #[token("/")]
    Slash,
    #[token("~")]
    Tilde,
    #[token("@")]
    At,
    #[token(".")]
    Dot,
    #[token(",")]
    Comma,
    #[token(":")]
    Colon,
    #[token(";")]
    Semicolon,
    #[token("(")]
    LParen,
    #[token(")")]
    RParen,
    #[token("{")]
    LBrace,
    #[token("}")]
    RBrace,

    // dropped by the tokenizer, like whitespace
    #[token("(*", skip_block_comment)]
    BlockComment,

    #[token("*)")]
    CommentClose,
}

/// Consumes a (possibly nested) block comment whose opening `(*` was just matched.
fn skip_block_comment(lex: &mut logos::Lexer<Token>) -> Result<(), LexError> {
    let rest = lex.remainder();
    let bytes = rest.as_bytes();
    let mut depth = 1usize;
    let mut i = 0;
    while i < bytes.len() {
        match (bytes[i], bytes.get(i + 1)) {
            (b'(', Some(b'*')) => {
                depth += 1;
                i += 2;
            }
            (b'*', Some(b')')) => {
                depth -= 1;
                i += 2;
                if depth == 0 {
                    lex.bump(i);
                    return Ok(());
                }
            }
            _ => i += 1,
        }
    }
    lex.bump(rest.len());
    Err(LexError::UnterminatedComment)
}

/// Scans a string constant whose opening quote was just matched, resolving escapes.
fn lex_string(lex: &mut logos::Lexer<Token>) -> Result<String, LexError> {
    let rest = lex.remainder();
    let mut value = String::new();
    let mut error = None;
    let mut chars = rest.char_indices();

    while let Some((i, c)) = chars.next() {
        match c {
            '"' => {
                lex.bump(i + 1);
                if let Some(err) = error {
                    return Err(err);
                }
                if value.chars().count() > MAX_STRING_LENGTH {
                    return Err(LexError::StringTooLong);
                }
                return Ok(value);
            }
            '\n' => {
                lex.bump(i);
                return Err(LexError::NewlineInString);
            }
            '\0' => {
                error.get_or_insert(LexError::NullInString);
            }
            '\\' => match chars.next() {
                Some((_, 'n')) => value.push('\n'),
                Some((_, 't')) => value.push('\t'),
                Some((_, 'b')) => value.push('\u{8}'),
                Some((_, 'f')) => value.push('\u{c}'),
                Some((_, '\0')) => {
                    error.get_or_insert(LexError::NullInString);
                }
                Some((_, other)) => value.push(other),
                None => break,
            },
            c => value.push(c),
        }
    }

    lex.bump(rest.len());
    Err(LexError::UnterminatedString)
}

#[derive(Debug, Clone)]
pub struct TokenWithLocation {
    pub token: Token,
    pub loc: SourceLocation,
}

/// Byte offsets at which each line starts.
struct LineIndex {
    starts: Vec<usize>,
}

impl LineIndex {
    fn new(source: &str) -> Self {
        let mut starts = vec![0];
        starts.extend(source.match_indices('\n').map(|(i, _)| i + 1));
        Self { starts }
    }

    fn line_of(&self, offset: usize) -> usize {
        self.starts.partition_point(|&start| start <= offset)
    }
}

pub struct Lexer<'a> {
    file: &'a str,
    source: &'a str,
    inner: logos::Lexer<'a, Token>,
    lines: LineIndex,
}

impl<'a> Lexer<'a> {
    pub fn new(file: &'a str, source: &'a str) -> Self {
        Self {
            file,
            source,
            inner: Token::lexer(source),
            lines: LineIndex::new(source),
        }
    }

    pub fn tokenize(&mut self) -> CoolResult<Vec<TokenWithLocation>> {
        let mut tokens = Vec::new();

        while let Some(token_result) = self.inner.next() {
            let span = self.inner.span();
            let loc = SourceLocation {
                line: self.lines.line_of(span.start),
            };
            match token_result {
                Ok(Token::BlockComment) => continue,
                Ok(Token::CommentClose) => {
                    return Err(lexer_error(self.file, loc.line, "unmatched *)"));
                }
                Ok(token) => tokens.push(TokenWithLocation { token, loc }),
                Err(LexError::UnexpectedCharacter) => {
                    let text = &self.source[span];
                    return Err(lexer_error(
                        self.file,
                        loc.line,
                        format!("unexpected character '{}'", text.escape_default()),
                    ));
                }
                Err(err) => return Err(lexer_error(self.file, loc.line, err.to_string())),
            }
        }

        Ok(tokens)
    }
}

pub fn lex(file: &str, source: &str) -> CoolResult<Vec<TokenWithLocation>> {
    Lexer::new(file, source).tokenize()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CoolError;

    fn tokens(source: &str) -> Vec<Token> {
        lex("test.cl", source)
            .unwrap()
            .into_iter()
            .map(|t| t.token)
            .collect()
    }

    fn lex_err(source: &str) -> String {
        match lex("test.cl", source) {
            Err(CoolError::Lexer { message, .. }) => message,
            other => panic!("expected lexer error, got {:?}", other),
        }
    }

    #[test]
    fn keywords_ignore_case() {
        assert_eq!(
            tokens("CLASS Inherits iSvOiD"),
            vec![Token::Class, Token::Inherits, Token::IsVoid]
        );
    }

    #[test]
    fn booleans_need_lowercase_first_letter() {
        assert_eq!(tokens("tRUE"), vec![Token::True]);
        assert_eq!(tokens("True"), vec![Token::TypeId("True".into())]);
    }

    #[test]
    fn identifiers_and_operators() {
        assert_eq!(
            tokens("x <- y <= 3 => SELF_TYPE"),
            vec![
                Token::ObjectId("x".into()),
                Token::Assign,
                Token::ObjectId("y".into()),
                Token::Le,
                Token::IntLiteral(3),
                Token::DArrow,
                Token::TypeId("SELF_TYPE".into()),
            ]
        );
    }

    #[test]
    fn nested_comments_and_line_numbers() {
        let toks = lex("test.cl", "(* a (* b *) c *)\n-- line\nclass").unwrap();
        assert_eq!(toks.len(), 1);
        assert_eq!(toks[0].token, Token::Class);
        assert_eq!(toks[0].loc.line, 3);
    }

    #[test]
    fn string_escapes() {
        assert_eq!(
            tokens(r#""a\tb\nc\qd""#),
            vec![Token::StringLiteral("a\tb\ncqd".into())]
        );
    }

    #[test]
    fn string_errors() {
        assert_eq!(lex_err("\"abc"), "EOF in string constant");
        assert_eq!(lex_err("\"ab\ncd\""), "unterminated string constant");
        let long = format!("\"{}\"", "a".repeat(MAX_STRING_LENGTH + 1));
        assert_eq!(lex_err(&long), "string constant too long");
    }

    #[test]
    fn comment_errors() {
        assert_eq!(lex_err("(* never closed"), "EOF in comment");
        assert_eq!(lex_err("x *)"), "unmatched *)");
        assert!(lex_err("x # y").contains("unexpected character"));
    }
}
