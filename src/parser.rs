use crate::{
    ast::{Comparison, Node, Operator},
    error::ParseError,
    lexer::{Token, TokenKind},
};

/// The default bound on both the nesting of parentheses/negations and the depth of the
/// resulting tree.
pub const DEFAULT_MAX_DEPTH: usize = 100;

const VALUE_START: &[TokenKind] = &[
    TokenKind::LeftParenthesis,
    TokenKind::Not,
    TokenKind::Equal,
    TokenKind::LessThan,
    TokenKind::GreaterThan,
    TokenKind::LessThanEqual,
    TokenKind::GreaterThanEqual,
    TokenKind::Glob,
    TokenKind::Regex,
    TokenKind::Number,
    TokenKind::Literal,
];

/// Parse a token stream with the default depth limit.
#[inline]
pub fn parse(tokens: &[Token]) -> Result<Node, ParseError> {
    Parser::new(tokens, DEFAULT_MAX_DEPTH).parse()
}

/// A recursive descent parser over the tokens of one expression.
///
/// Binary operators have no precedence: they are folded strictly from left to right, so
/// `a and b or c` is `(a and b) or c` while `a or b and c` is `(a or b) and c`.
pub struct Parser<'t> {
    tokens: &'t [Token],
    cursor: usize,
    nesting: usize,
    max_depth: usize,
    end: Token,
}

impl<'t> Parser<'t> {
    pub fn new(tokens: &'t [Token], max_depth: usize) -> Self {
        let position = tokens.last().map_or(0, |token| token.position);
        Self {
            tokens,
            cursor: 0,
            nesting: 0,
            max_depth,
            end: Token {
                kind: TokenKind::End,
                text: String::new(),
                position,
            },
        }
    }

    pub fn parse(mut self) -> Result<Node, ParseError> {
        let (node, _) = self.binary()?;
        self.expect(
            TokenKind::End,
            &[TokenKind::And, TokenKind::Or, TokenKind::Not, TokenKind::End],
        )?;
        log::debug!("parsed expression into {node}");
        Ok(node)
    }

    fn binary(&mut self) -> Result<(Node, usize), ParseError> {
        let (mut lhs, mut depth) = self.value()?;
        let mut chain = None;
        loop {
            let (operator, negate) = match self.peek().kind {
                TokenKind::And => (Operator::And, false),
                TokenKind::Or => (Operator::Or, false),
                // `a not b` is `a and not b`
                TokenKind::Not => (Operator::And, true),
                TokenKind::Glob => {
                    return Err(ParseError::MisplacedGlob {
                        position: self.peek().position,
                    })
                }
                _ => break,
            };
            let position = self.advance().position;
            let (rhs, rhs_depth) = self.value()?;
            let (rhs, rhs_depth) = if negate {
                (rhs.negated(), rhs_depth + 1)
            } else {
                (rhs, rhs_depth)
            };

            lhs = match lhs {
                Node::And(mut children)
                    if chain == Some(Operator::And) && operator == Operator::And =>
                {
                    children.push(rhs);
                    depth = depth.max(rhs_depth + 1);
                    Node::And(children)
                }
                Node::Or(mut children)
                    if chain == Some(Operator::Or) && operator == Operator::Or =>
                {
                    children.push(rhs);
                    depth = depth.max(rhs_depth + 1);
                    Node::Or(children)
                }
                lhs => {
                    depth = depth.max(rhs_depth) + 1;
                    operator.group(vec![lhs, rhs])
                }
            };
            chain = Some(operator);
            self.check_depth(depth, position)?;
        }
        Ok((lhs, depth))
    }

    fn value(&mut self) -> Result<(Node, usize), ParseError> {
        let token = self.peek();
        let (kind, position) = (token.kind, token.position);
        if let Some(comparison) = kind.comparison() {
            self.advance();
            return self.function(comparison);
        }
        match kind {
            TokenKind::LeftParenthesis => {
                self.advance();
                self.enter(position)?;
                let parsed = self.binary()?;
                self.expect(
                    TokenKind::RightParenthesis,
                    &[
                        TokenKind::And,
                        TokenKind::Or,
                        TokenKind::Not,
                        TokenKind::RightParenthesis,
                    ],
                )?;
                self.exit();
                Ok(parsed)
            }
            TokenKind::Not => {
                self.advance();
                self.enter(position)?;
                let (node, depth) = self.value()?;
                self.exit();
                self.check_depth(depth + 1, position)?;
                Ok((node.negated(), depth + 1))
            }
            TokenKind::Glob => self.leading_glob(),
            TokenKind::Regex => self.regex(),
            TokenKind::Literal | TokenKind::Number => {
                let text = self.tag();
                let position = self.peek().position;
                let node = if self.eat(TokenKind::Glob) {
                    if text.is_empty() {
                        return Err(ParseError::MisplacedGlob { position });
                    }
                    Node::Glob {
                        text,
                        leading_wildcard: false,
                        trailing_wildcard: true,
                    }
                } else {
                    Node::Tag(text)
                };
                Ok((node, 1))
            }
            _ => Err(self.unexpected(VALUE_START)),
        }
    }

    fn function(&mut self, comparison: Comparison) -> Result<(Node, usize), ParseError> {
        if self.peek().kind != TokenKind::Number {
            return Err(self.unexpected(&[TokenKind::Number]));
        }
        let Token { text, position, .. } = self.advance();
        let bound = text
            .parse::<u64>()
            .map_err(|_| ParseError::InvalidNumber { position, text })?;
        Ok((Node::range(comparison, bound), 1))
    }

    fn leading_glob(&mut self) -> Result<(Node, usize), ParseError> {
        let position = self.advance().position;
        if !matches!(self.peek().kind, TokenKind::Literal | TokenKind::Number) {
            return Err(ParseError::MisplacedGlob { position });
        }
        let text = self.tag();
        if text.is_empty() {
            return Err(ParseError::MisplacedGlob { position });
        }
        let trailing_wildcard = self.eat(TokenKind::Glob);
        Ok((
            Node::Glob {
                text,
                leading_wildcard: true,
                trailing_wildcard,
            },
            1,
        ))
    }

    fn regex(&mut self) -> Result<(Node, usize), ParseError> {
        let Token { text, position, .. } = self.advance();
        if let Err(error) = regex::Regex::new(&text) {
            return Err(ParseError::InvalidRegex {
                position,
                pattern: text,
                message: error.to_string(),
            });
        }
        Ok((Node::Regex(text), 1))
    }

    /// Adjacent literals form a single tag, joined by a space.
    fn tag(&mut self) -> String {
        let mut words = Vec::new();
        while matches!(self.peek().kind, TokenKind::Literal | TokenKind::Number) {
            words.push(self.advance().text);
        }
        words.join(" ")
    }

    #[inline]
    fn peek(&self) -> &Token {
        self.tokens.get(self.cursor).unwrap_or(&self.end)
    }

    fn advance(&mut self) -> Token {
        let token = self.peek().clone();
        if self.cursor < self.tokens.len() {
            self.cursor += 1;
        }
        token
    }

    fn eat(&mut self, kind: TokenKind) -> bool {
        if self.peek().kind == kind {
            self.advance();
            true
        } else {
            false
        }
    }

    fn expect(&mut self, kind: TokenKind, expected: &[TokenKind]) -> Result<(), ParseError> {
        if self.eat(kind) {
            Ok(())
        } else {
            Err(self.unexpected(expected))
        }
    }

    fn unexpected(&self, expected: &[TokenKind]) -> ParseError {
        let token = self.peek();
        ParseError::UnexpectedToken {
            position: token.position,
            expected: expected.to_vec(),
            found: token.kind,
        }
    }

    fn enter(&mut self, position: usize) -> Result<(), ParseError> {
        self.nesting += 1;
        self.check_depth(self.nesting, position)
    }

    fn exit(&mut self) {
        self.nesting = self.nesting.saturating_sub(1);
    }

    fn check_depth(&self, depth: usize, position: usize) -> Result<(), ParseError> {
        if depth > self.max_depth {
            Err(ParseError::NestingTooDeep {
                position,
                limit: self.max_depth,
            })
        } else {
            Ok(())
        }
    }
}
