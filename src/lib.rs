//! A compiler for a small boolean query language over tags, producing MongoDB-style filter
//! conditions for an array field of tags.
//!
//! # Examples
//!
//! Compiling an expression for the `tags` field:
//!
//! ```
//! use tag_query::compile;
//!
//! let condition = compile("landscape and (sunset or dawn) not minimum 10", "tags").unwrap();
//! assert_eq!(
//!     serde_json::json!({"$and": [
//!         {"tags": "landscape"},
//!         {"tags.9": {"$exists": false}},
//!         {"$or": [{"tags": "dawn"}, {"tags": "sunset"}]}
//!     ]}),
//!     serde_json::to_value(&condition).unwrap()
//! );
//! ```
//!
//! # Domain Specific Language (DSL)
//!
//! Keywords are case-insensitive and tags are lowercased. The following are supported:
//!
//! * Boolean operators: `and` (`+`), `or` (`/`) and `not` (`-`). Binary operators have no
//!   precedence and are applied from left to right, so `a and b or c` is `(a and b) or c`.
//!   `a not b` means `a and not b`; a leading `not` only applies to the operand following it;
//! * Tags: a word made of letters, digits, `_` and `.`, or a double-quoted string. Adjacent
//!   tags are joined with a single space, so `blue sky` is the tag `"blue sky"`;
//! * Globs: `*` before and/or after a tag, e.g. `sun*` or `*set*`;
//! * Regexes: a pattern between braces, e.g. `{^img_[0-9]+$}`. A closing brace inside the
//!   pattern must be escaped as `\}`;
//! * Tag counts: `exactly`/`eq`/`=`, `fewer`/`lt`/`<`, `greater`/`gt`/`>`, `max`/`le`/`<=`
//!   and `min`/`ge`/`>=`, followed by a number, e.g. `fewer 3`.
//!
//! As an example, the following would all be valid expressions:
//!
//! ```text
//! cat and not (dog or "guinea pig")
//! *night* + {^iso[0-9]+$} / exactly 2
//! portrait - blurry - min 20
//! ```
//!
//! # Optimizations
//!
//! Before emitting the condition, the expression is rewritten into a canonical form:
//!
//! * Negations are pushed down to the leaves by applying De Morgan's laws; negated tag counts
//!   are replaced by their complement;
//! * Nested groups of the same operator are flattened and their operands are sorted (simple
//!   operands first) and deduplicated;
//! * An `or` group containing an operand and its negation is removed from its enclosing `and`
//!   group while an `and` group containing both is rejected as a contradiction;
//! * The tag counts of a group are merged into the smallest set of equivalent constraints.
mod ast;
mod compiler;
mod emitter;
mod error;
mod lexer;
mod optimizer;
mod parser;
mod ranges;
#[cfg(test)]
mod test_utils;

pub use crate::{
    ast::{Comparison, Node, Range},
    compiler::{compile, CompileOptions, Compiler},
    emitter::{emit, Condition},
    error::{CompileError, LexError, ParseError},
    lexer::{tokenize, Lexer, Token, TokenKind},
    optimizer::normalize,
    parser::{parse, Parser, DEFAULT_MAX_DEPTH},
};
