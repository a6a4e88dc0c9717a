use crate::{
    emitter::{emit, Condition},
    error::CompileError,
    lexer::{tokenize, TokenKind},
    optimizer::normalize,
    parser::{Parser, DEFAULT_MAX_DEPTH},
};
use serde::Deserialize;

/// Options controlling the compilation of an expression.
///
/// The options can be read from any configuration format supported by `serde`; missing
/// fields take their default value.
///
/// ```rust
/// use tag_query::CompileOptions;
///
/// let options: CompileOptions = serde_json::from_str(r#"{"max_depth": 20}"#).unwrap();
/// assert_eq!(20, options.max_depth);
/// assert!(!options.allow_unconstrained);
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct CompileOptions {
    /// The maximum nesting of parentheses and negations, and the maximum depth of the parsed
    /// expression.
    pub max_depth: usize,
    /// Compile an expression that matches every document into the empty condition instead
    /// of failing with [`CompileError::Unsupported`].
    pub allow_unconstrained: bool,
}

impl Default for CompileOptions {
    fn default() -> Self {
        Self {
            max_depth: DEFAULT_MAX_DEPTH,
            allow_unconstrained: false,
        }
    }
}

/// Compiles tag query expressions into filter conditions.
///
/// A [`Compiler`] holds no state besides its options: it can be shared between threads and
/// reused for any number of expressions.
#[derive(Clone, Debug, Default)]
pub struct Compiler {
    options: CompileOptions,
}

impl Compiler {
    pub fn new(options: CompileOptions) -> Self {
        Self { options }
    }

    #[inline]
    pub fn options(&self) -> &CompileOptions {
        &self.options
    }

    /// Compile `expression` into a filter condition on the array field `field`.
    ///
    /// An empty expression compiles into [`Condition::Empty`].
    ///
    /// # Examples
    ///
    /// ```rust
    /// use tag_query::{CompileOptions, Compiler};
    ///
    /// let compiler = Compiler::new(CompileOptions::default());
    /// let condition = compiler.compile("sunset and not *beach*", "tags").unwrap();
    /// assert_eq!(
    ///     r#"{"$and":[{"tags":"sunset"},{"tags":{"$not":{"$regex":"beach"}}}]}"#,
    ///     condition.to_string()
    /// );
    /// ```
    ///
    /// Expressions that can never match are rejected:
    ///
    /// ```rust
    /// use tag_query::{CompileError, Compiler};
    ///
    /// let result = Compiler::default().compile("> 3 and < 2", "tags");
    /// assert!(matches!(result, Err(CompileError::Contradiction(_))));
    /// ```
    pub fn compile(&self, expression: &str, field: &str) -> Result<Condition, CompileError> {
        let tokens = tokenize(expression)?;
        if tokens.iter().all(|token| token.kind == TokenKind::End) {
            log::debug!("compiled an empty expression into the empty condition");
            return Ok(Condition::Empty);
        }
        let node = Parser::new(&tokens, self.options.max_depth).parse()?;
        let node = match normalize(node) {
            Ok(node) => node,
            Err(CompileError::Unsupported(reason)) if self.options.allow_unconstrained => {
                log::debug!("compiled an unconstrained expression: {reason}");
                return Ok(Condition::Empty);
            }
            Err(error) => return Err(error),
        };
        Ok(emit(&node, field))
    }
}

/// Compile `expression` into a filter condition on `field` with the default options.
///
/// See [`Compiler::compile()`].
#[inline]
pub fn compile(expression: &str, field: &str) -> Result<Condition, CompileError> {
    Compiler::default().compile(expression, field)
}
