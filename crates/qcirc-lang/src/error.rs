//! Error types for lexing and parsing.

use thiserror::Error;

use crate::span::Span;

/// What went wrong while scanning a token.
///
/// This is also the error type of the generated lexer, so the default
/// variant is the one logos reports for input no rule matches.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LexErrorKind {
    /// No token rule matches the input.
    #[default]
    UnexpectedCharacter,
    /// A string literal reached the end of its line or the input.
    UnterminatedString,
    /// Unknown backslash escape inside a string literal.
    InvalidEscape,
    /// A numeric literal does not fit its type.
    InvalidNumber,
}

/// A lexical error with its location.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message} at {span}")]
pub struct LexError {
    /// Error category.
    pub kind: LexErrorKind,
    /// Human readable description.
    pub message: String,
    /// Where the offending input starts.
    pub span: Span,
}

/// Errors raised by the parser.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[non_exhaustive]
pub enum ParseError {
    /// A token that cannot appear here.
    #[error("Unexpected token at {span}: expected {expected}, found {found}")]
    UnexpectedToken {
        /// What the parser could have accepted.
        expected: String,
        /// The token actually found.
        found: String,
        /// Location of the found token.
        span: Span,
    },

    /// Input ended in the middle of a construct.
    #[error("Unexpected end of input at {span}: expected {expected}")]
    UnexpectedEof {
        /// What the parser could have accepted.
        expected: String,
        /// Location of the end marker.
        span: Span,
    },

    /// Well-formed tokens that do not build a valid construct.
    #[error("Invalid syntax at {span}: {message}")]
    InvalidSyntax {
        /// Description of the problem.
        message: String,
        /// Location of the construct.
        span: Span,
    },
}

impl ParseError {
    /// Location of the error.
    pub fn span(&self) -> Span {
        match self {
            ParseError::UnexpectedToken { span, .. }
            | ParseError::UnexpectedEof { span, .. }
            | ParseError::InvalidSyntax { span, .. } => *span,
        }
    }
}

/// Either stage of turning source text into a syntax tree.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SyntaxError {
    /// Tokenization failed.
    #[error(transparent)]
    Lex(#[from] LexError),
    /// Parsing failed.
    #[error(transparent)]
    Parse(#[from] ParseError),
}

/// Result type for lexing.
pub type LexResult<T> = Result<T, LexError>;

/// Result type for parsing.
pub type ParseResult<T> = Result<T, ParseError>;
