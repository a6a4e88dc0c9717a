use crate::lexer::TokenKind;
use itertools::Itertools;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LexError {
    #[error("invalid symbol {symbol:?} at position {position}")]
    InvalidSymbol { position: usize, symbol: String },
    #[error("unterminated string starting at position {position}")]
    UnterminatedString { position: usize },
    #[error("unterminated regex starting at position {position}")]
    UnterminatedRegex { position: usize },
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("expected {} at position {position}, found {found}", Expected(.expected))]
    UnexpectedToken {
        position: usize,
        expected: Vec<TokenKind>,
        found: TokenKind,
    },
    #[error("glob \"*\" at position {position} must be immediately adjacent to a tag")]
    MisplacedGlob { position: usize },
    #[error("invalid number {text:?} at position {position}")]
    InvalidNumber { position: usize, text: String },
    #[error("invalid regex {pattern:?} at position {position}: {message}")]
    InvalidRegex {
        position: usize,
        pattern: String,
        message: String,
    },
    #[error("expression nested deeper than {limit} levels at position {position}")]
    NestingTooDeep { position: usize, limit: usize },
}

/// The error returned by [`crate::compile()`] and [`crate::Compiler::compile()`].
///
/// The first problem found aborts the compilation; compiling the same expression again will
/// always fail the same way.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CompileError {
    #[error("failed to tokenize the expression: {0}")]
    Lex(#[from] LexError),
    #[error("failed to parse the expression: {0}")]
    Parse(#[from] ParseError),
    #[error("the expression can never match: {0}")]
    Contradiction(String),
    #[error("unsupported expression: {0}")]
    Unsupported(String),
}

struct Expected<'a>(&'a [TokenKind]);

impl std::fmt::Display for Expected<'_> {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.0 {
            [] => write!(formatter, "nothing"),
            [kind] => write!(formatter, "{kind}"),
            kinds => write!(formatter, "one of {}", kinds.iter().join(", ")),
        }
    }
}
