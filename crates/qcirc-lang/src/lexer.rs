//! Lexer for the Qcirc circuit language.

use logos::Logos;
use tracing::debug;

use crate::error::{LexError, LexErrorKind, LexResult};
use crate::span::{LineIndex, Span};

/// Tokens of the source language.
#[derive(Logos, Debug, Clone, PartialEq)]
#[logos(error = LexErrorKind)]
#[logos(skip r"[ \t\r\f]+")]
#[logos(skip r"#[^\n]*")]
pub enum Token {
    // Keywords
    #[token("qubit")]
    Qubit,

    #[token("bit")]
    Bit,

    #[token("var")]
    Var,

    #[token("const")]
    Const,

    #[token("def")]
    Def,

    #[token("gate")]
    Gate,

    #[token("class")]
    Class,

    #[token("for")]
    For,

    #[token("in")]
    In,

    #[token("if")]
    If,

    #[token("elif")]
    Elif,

    #[token("else")]
    Else,

    #[token("return")]
    Return,

    #[token("ctrl")]
    Ctrl,

    #[token("inv")]
    Inv,

    #[token("and")]
    And,

    #[token("or")]
    Or,

    #[token("not")]
    Not,

    #[token("true")]
    True,

    #[token("false")]
    False,

    // Literals
    #[regex(r"[0-9]+\.[0-9]+([eE][+-]?[0-9]+)?", parse_float)]
    #[regex(r"[0-9]+[eE][+-]?[0-9]+", parse_float)]
    FloatLiteral(f64),

    #[regex(r"[0-9]+", parse_int)]
    IntLiteral(i64),

    #[token("\"", lex_string)]
    StringLiteral(String),

    // Identifiers
    #[regex(r"[a-zA-Z_][a-zA-Z0-9_]*", |lex| lex.slice().to_string())]
    Identifier(String),

    // Operators and punctuation
    #[token("+")]
    Plus,

    #[token("-")]
    Minus,

    #[token("*")]
    Star,

    #[token("/")]
    Slash,

    #[token("//")]
    SlashSlash,

    #[token("%")]
    Percent,

    #[token("**")]
    Power,

    #[token("==")]
    EqEq,

    #[token("!=")]
    NotEq,

    #[token("<")]
    Lt,

    #[token("<=")]
    LtEq,

    #[token(">")]
    Gt,

    #[token(">=")]
    GtEq,

    #[token("=")]
    Eq,

    #[token("+=")]
    PlusEq,

    #[token("-=")]
    MinusEq,

    #[token("*=")]
    StarEq,

    #[token("/=")]
    SlashEq,

    #[token("->")]
    Arrow,

    #[token("†")]
    Dagger,

    #[token("(")]
    LParen,

    #[token(")")]
    RParen,

    #[token("[")]
    LBracket,

    #[token("]")]
    RBracket,

    #[token("{")]
    LBrace,

    #[token("}")]
    RBrace,

    #[token(";")]
    Semicolon,

    #[token(":")]
    Colon,

    #[token(",")]
    Comma,

    #[token(".")]
    Dot,

    #[token("\n")]
    Newline,

    /// End of input. Never produced by the scanner itself; [`tokenize`]
    /// appends exactly one.
    Eof,
}

fn parse_int(lex: &mut logos::Lexer<'_, Token>) -> Result<i64, LexErrorKind> {
    lex.slice()
        .parse()
        .map_err(|_| LexErrorKind::InvalidNumber)
}

fn parse_float(lex: &mut logos::Lexer<'_, Token>) -> Result<f64, LexErrorKind> {
    lex.slice()
        .parse()
        .map_err(|_| LexErrorKind::InvalidNumber)
}

/// Scan the body of a string literal after its opening quote.
fn lex_string(lex: &mut logos::Lexer<'_, Token>) -> Result<String, LexErrorKind> {
    let mut value = String::new();
    let mut chars = lex.remainder().char_indices();

    while let Some((i, c)) = chars.next() {
        match c {
            '"' => {
                lex.bump(i + 1);
                return Ok(value);
            }
            '\n' => {
                lex.bump(i);
                return Err(LexErrorKind::UnterminatedString);
            }
            '\\' => match chars.next() {
                Some((_, '"')) => value.push('"'),
                Some((_, '\\')) => value.push('\\'),
                Some((_, 'n')) => value.push('\n'),
                Some((_, 't')) => value.push('\t'),
                Some((j, '\n')) => {
                    lex.bump(j);
                    return Err(LexErrorKind::UnterminatedString);
                }
                Some((j, _)) => {
                    lex.bump(j);
                    return Err(LexErrorKind::InvalidEscape);
                }
                None => break,
            },
            c => value.push(c),
        }
    }

    lex.bump(lex.remainder().len());
    Err(LexErrorKind::UnterminatedString)
}

impl std::fmt::Display for Token {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Token::Qubit => write!(f, "qubit"),
            Token::Bit => write!(f, "bit"),
            Token::Var => write!(f, "var"),
            Token::Const => write!(f, "const"),
            Token::Def => write!(f, "def"),
            Token::Gate => write!(f, "gate"),
            Token::Class => write!(f, "class"),
            Token::For => write!(f, "for"),
            Token::In => write!(f, "in"),
            Token::If => write!(f, "if"),
            Token::Elif => write!(f, "elif"),
            Token::Else => write!(f, "else"),
            Token::Return => write!(f, "return"),
            Token::Ctrl => write!(f, "ctrl"),
            Token::Inv => write!(f, "inv"),
            Token::And => write!(f, "and"),
            Token::Or => write!(f, "or"),
            Token::Not => write!(f, "not"),
            Token::True => write!(f, "true"),
            Token::False => write!(f, "false"),
            Token::FloatLiteral(v) => write!(f, "{v}"),
            Token::IntLiteral(v) => write!(f, "{v}"),
            Token::StringLiteral(s) => write!(f, "{s:?}"),
            Token::Identifier(s) => write!(f, "{s}"),
            Token::Plus => write!(f, "+"),
            Token::Minus => write!(f, "-"),
            Token::Star => write!(f, "*"),
            Token::Slash => write!(f, "/"),
            Token::SlashSlash => write!(f, "//"),
            Token::Percent => write!(f, "%"),
            Token::Power => write!(f, "**"),
            Token::EqEq => write!(f, "=="),
            Token::NotEq => write!(f, "!="),
            Token::Lt => write!(f, "<"),
            Token::LtEq => write!(f, "<="),
            Token::Gt => write!(f, ">"),
            Token::GtEq => write!(f, ">="),
            Token::Eq => write!(f, "="),
            Token::PlusEq => write!(f, "+="),
            Token::MinusEq => write!(f, "-="),
            Token::StarEq => write!(f, "*="),
            Token::SlashEq => write!(f, "/="),
            Token::Arrow => write!(f, "->"),
            Token::Dagger => write!(f, "†"),
            Token::LParen => write!(f, "("),
            Token::RParen => write!(f, ")"),
            Token::LBracket => write!(f, "["),
            Token::RBracket => write!(f, "]"),
            Token::LBrace => write!(f, "{{"),
            Token::RBrace => write!(f, "}}"),
            Token::Semicolon => write!(f, ";"),
            Token::Colon => write!(f, ":"),
            Token::Comma => write!(f, ","),
            Token::Dot => write!(f, "."),
            Token::Newline => write!(f, "newline"),
            Token::Eof => write!(f, "end of input"),
        }
    }
}

/// A token with its source position.
#[derive(Debug, Clone, PartialEq)]
pub struct SpannedToken {
    pub token: Token,
    pub span: Span,
}

/// Tokenize a source string.
///
/// Comments are dropped, newlines nested inside `(...)` or `[...]` are
/// dropped, and the result always ends with a single [`Token::Eof`].
pub fn tokenize(source: &str) -> LexResult<Vec<SpannedToken>> {
    let index = LineIndex::new(source);
    let mut lexer = Token::lexer(source);
    let mut tokens = Vec::new();
    let mut depth = 0usize;

    while let Some(result) = lexer.next() {
        let range = lexer.span();
        let span = index.span(range.start);
        let token = match result {
            Ok(token) => token,
            Err(kind) => return Err(lex_error(kind, &source[range], span)),
        };

        match token {
            Token::LParen | Token::LBracket => depth += 1,
            Token::RParen | Token::RBracket => depth = depth.saturating_sub(1),
            Token::Newline if depth > 0 => continue,
            _ => {}
        }
        tokens.push(SpannedToken { token, span });
    }

    tokens.push(SpannedToken {
        token: Token::Eof,
        span: index.span(source.len()),
    });

    debug!(count = tokens.len(), "tokenized source");
    Ok(tokens)
}

fn lex_error(kind: LexErrorKind, slice: &str, span: Span) -> LexError {
    let message = match kind {
        LexErrorKind::UnexpectedCharacter => {
            let c = slice.chars().next().unwrap_or(' ');
            format!("Unexpected character {c:?}")
        }
        LexErrorKind::UnterminatedString => "Unterminated string literal".to_string(),
        LexErrorKind::InvalidEscape => "Invalid escape sequence in string literal".to_string(),
        LexErrorKind::InvalidNumber => format!("Invalid numeric literal '{slice}'"),
    };
    LexError {
        kind,
        message,
        span,
    }
}
