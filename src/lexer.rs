use crate::{ast::Comparison, error::LexError};
use logos::{Logos, SpannedIter};
use std::fmt::{Display, Formatter};

#[derive(Clone, Debug, Logos, PartialEq)]
#[logos(skip r"[ \t\n\r\f]+")]
enum Lexeme<'source> {
    #[token("(")]
    LeftParenthesis,
    #[token(")")]
    RightParenthesis,
    #[token("*")]
    Glob,
    #[token("+")]
    Plus,
    #[token("/")]
    Slash,
    #[token("-")]
    Minus,
    #[token("=")]
    Equal,
    #[token("<")]
    LessThan,
    #[token("<=")]
    LessThanEqual,
    #[token(">")]
    GreaterThan,
    #[token(">=")]
    GreaterThanEqual,
    #[regex(r"[a-zA-Z0-9_.]+", |lex| lex.slice())]
    Word(&'source str),
    #[regex(r#""(\\.|[^"\\])*""#, |lex| { let slice = lex.slice(); &slice[1..slice.len() - 1] })]
    Quoted(&'source str),
    #[regex(r#""(\\.|[^"\\])*"#)]
    UnterminatedQuote,
    #[regex(r"\{(\\.|[^}\\])*\}", |lex| { let slice = lex.slice(); &slice[1..slice.len() - 1] })]
    Pattern(&'source str),
    #[regex(r"\{(\\.|[^}\\])*")]
    UnterminatedPattern,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TokenKind {
    And,
    Or,
    Not,
    LeftParenthesis,
    RightParenthesis,
    Glob,
    Equal,
    LessThan,
    GreaterThan,
    LessThanEqual,
    GreaterThanEqual,
    Number,
    Literal,
    Regex,
    End,
}

impl TokenKind {
    /// The tag-count comparison a function keyword stands for.
    pub fn comparison(self) -> Option<Comparison> {
        match self {
            Self::Equal => Some(Comparison::Equal),
            Self::LessThan => Some(Comparison::LessThan),
            Self::GreaterThan => Some(Comparison::GreaterThan),
            Self::LessThanEqual => Some(Comparison::LessThanEqual),
            Self::GreaterThanEqual => Some(Comparison::GreaterThanEqual),
            _ => None,
        }
    }
}

impl Display for TokenKind {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::And => write!(formatter, "\"and\""),
            Self::Or => write!(formatter, "\"or\""),
            Self::Not => write!(formatter, "\"not\""),
            Self::LeftParenthesis => write!(formatter, "\"(\""),
            Self::RightParenthesis => write!(formatter, "\")\""),
            Self::Glob => write!(formatter, "\"*\""),
            Self::Equal => write!(formatter, "\"=\""),
            Self::LessThan => write!(formatter, "\"<\""),
            Self::GreaterThan => write!(formatter, "\">\""),
            Self::LessThanEqual => write!(formatter, "\"<=\""),
            Self::GreaterThanEqual => write!(formatter, "\">=\""),
            Self::Number => write!(formatter, "a number"),
            Self::Literal => write!(formatter, "a tag"),
            Self::Regex => write!(formatter, "a regex"),
            Self::End => write!(formatter, "end of input"),
        }
    }
}

/// A lexed token.
///
/// For literals, `text` holds the lowercased tag text (with quotes removed and escapes
/// decoded); for regexes, the pattern between the braces; otherwise the source text.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    pub text: String,
    pub position: usize,
}

impl Token {
    fn new(kind: TokenKind, text: impl Into<String>, position: usize) -> Self {
        Self {
            kind,
            text: text.into(),
            position,
        }
    }
}

pub struct Lexer<'input> {
    input: &'input str,
    token_stream: SpannedIter<'input, Lexeme<'input>>,
}

impl<'input> Lexer<'input> {
    pub fn new(input: &'input str) -> Self {
        Self {
            input,
            token_stream: Lexeme::lexer(input).spanned(),
        }
    }
}

impl Iterator for Lexer<'_> {
    type Item = Result<Token, LexError>;

    fn next(&mut self) -> Option<Self::Item> {
        self.token_stream.next().map(|(lexeme, span)| {
            let position = span.start;
            let source = self.input.get(span).unwrap_or_default();
            let token = match lexeme {
                Ok(Lexeme::LeftParenthesis) => {
                    Token::new(TokenKind::LeftParenthesis, source, position)
                }
                Ok(Lexeme::RightParenthesis) => {
                    Token::new(TokenKind::RightParenthesis, source, position)
                }
                Ok(Lexeme::Glob) => Token::new(TokenKind::Glob, source, position),
                Ok(Lexeme::Plus) => Token::new(TokenKind::And, source, position),
                Ok(Lexeme::Slash) => Token::new(TokenKind::Or, source, position),
                Ok(Lexeme::Minus) => Token::new(TokenKind::Not, source, position),
                Ok(Lexeme::Equal) => Token::new(TokenKind::Equal, source, position),
                Ok(Lexeme::LessThan) => Token::new(TokenKind::LessThan, source, position),
                Ok(Lexeme::LessThanEqual) => Token::new(TokenKind::LessThanEqual, source, position),
                Ok(Lexeme::GreaterThan) => Token::new(TokenKind::GreaterThan, source, position),
                Ok(Lexeme::GreaterThanEqual) => {
                    Token::new(TokenKind::GreaterThanEqual, source, position)
                }
                Ok(Lexeme::Word(word)) => {
                    let word = word.to_lowercase();
                    let kind = keyword(&word).unwrap_or_else(|| {
                        if word.bytes().all(|byte| byte.is_ascii_digit()) {
                            TokenKind::Number
                        } else {
                            TokenKind::Literal
                        }
                    });
                    Token::new(kind, word, position)
                }
                Ok(Lexeme::Quoted(text)) => {
                    Token::new(TokenKind::Literal, unescape(text).to_lowercase(), position)
                }
                Ok(Lexeme::Pattern(pattern)) => Token::new(TokenKind::Regex, pattern, position),
                Ok(Lexeme::UnterminatedQuote) => {
                    return Err(LexError::UnterminatedString { position })
                }
                Ok(Lexeme::UnterminatedPattern) => {
                    return Err(LexError::UnterminatedRegex { position })
                }
                Err(()) => {
                    return Err(LexError::InvalidSymbol {
                        position,
                        symbol: source.to_string(),
                    })
                }
            };
            Ok(token)
        })
    }
}

/// Split an expression into tokens, terminated by a [`TokenKind::End`] token.
pub fn tokenize(input: &str) -> Result<Vec<Token>, LexError> {
    let mut tokens = Lexer::new(input).collect::<Result<Vec<_>, _>>()?;
    tokens.push(Token::new(TokenKind::End, "", input.len()));
    log::trace!("tokenized {input:?} into {} tokens", tokens.len());
    Ok(tokens)
}

fn keyword(word: &str) -> Option<TokenKind> {
    let kind = match word {
        "and" => TokenKind::And,
        "or" => TokenKind::Or,
        "not" => TokenKind::Not,
        "eq" | "equal" | "equals" | "exact" | "exactly" => TokenKind::Equal,
        "lt" | "fewer" | "below" => TokenKind::LessThan,
        "gt" | "greater" | "above" => TokenKind::GreaterThan,
        "le" | "max" | "maximum" => TokenKind::LessThanEqual,
        "ge" | "min" | "minimum" => TokenKind::GreaterThanEqual,
        _ => return None,
    };
    Some(kind)
}

fn unescape(text: &str) -> String {
    let mut unescaped = String::with_capacity(text.len());
    let mut chars = text.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            unescaped.push(c);
            continue;
        }
        match chars.next() {
            Some('"') => unescaped.push('"'),
            Some('\\') => unescaped.push('\\'),
            Some('t') => unescaped.push('\t'),
            Some('n') => unescaped.push('\n'),
            Some('r') => unescaped.push('\r'),
            Some(other) => {
                unescaped.push('\\');
                unescaped.push(other);
            }
            None => unescaped.push('\\'),
        }
    }
    unescaped
}
