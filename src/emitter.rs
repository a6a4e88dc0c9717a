use crate::ast::{Comparison, Node, Operator, Range};
use itertools::Itertools;
use serde::{ser::SerializeMap, Serialize, Serializer};
use std::fmt::{Display, Formatter};

/// A document-database filter condition over an array field of tags.
///
/// Serializes into the filter document understood by MongoDB-style databases, e.g.
/// `{"tags": "a"}`, `{"tags": {"$ne": "a"}}` or `{"$and": [...]}`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Condition {
    /// Matches every document: `{}`.
    Empty,
    Equals {
        field: String,
        value: String,
    },
    NotEquals {
        field: String,
        value: String,
    },
    Matches {
        field: String,
        pattern: String,
    },
    NotMatches {
        field: String,
        pattern: String,
    },
    Size {
        field: String,
        size: u64,
    },
    /// Whether the array has an element at `index`, i.e. more than `index` tags.
    Exists {
        field: String,
        index: u64,
        exists: bool,
    },
    And(Vec<Condition>),
    Or(Vec<Condition>),
}

impl Serialize for Condition {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match self {
            Self::Empty => serializer.serialize_map(Some(0))?.end(),
            Self::Equals { field, value } => entry(serializer, field, value),
            Self::NotEquals { field, value } => entry(serializer, field, &Entry("$ne", value)),
            Self::Matches { field, pattern } => {
                entry(serializer, field, &Entry("$regex", pattern))
            }
            Self::NotMatches { field, pattern } => entry(
                serializer,
                field,
                &Entry("$not", &Entry("$regex", pattern)),
            ),
            Self::Size { field, size } => entry(serializer, field, &Entry("$size", size)),
            Self::Exists {
                field,
                index,
                exists,
            } => entry(
                serializer,
                &format!("{field}.{index}"),
                &Entry("$exists", exists),
            ),
            Self::And(conditions) => entry(serializer, "$and", conditions),
            Self::Or(conditions) => entry(serializer, "$or", conditions),
        }
    }
}

/// A single-entry map.
struct Entry<'a, T: ?Sized>(&'static str, &'a T);

impl<T> Serialize for Entry<'_, T>
where
    T: Serialize + ?Sized,
{
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        entry(serializer, self.0, self.1)
    }
}

fn entry<S, T>(serializer: S, key: &str, value: &T) -> Result<S::Ok, S::Error>
where
    S: Serializer,
    T: Serialize + ?Sized,
{
    let mut map = serializer.serialize_map(Some(1))?;
    map.serialize_entry(key, value)?;
    map.end()
}

impl Display for Condition {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        let json = serde_json::to_string(self).map_err(|_| std::fmt::Error)?;
        formatter.write_str(&json)
    }
}

/// Turn a normalized expression into a filter condition on `field`.
///
/// The field name is used verbatim. Ranges are expected to be satisfiable and not
/// trivially true, which [`crate::normalize`] guarantees.
pub fn emit(node: &Node, field: &str) -> Condition {
    condition(node, field, false)
}

fn condition(node: &Node, field: &str, negate: bool) -> Condition {
    match node {
        Node::Tag(value) if negate => Condition::NotEquals {
            field: field.to_string(),
            value: value.clone(),
        },
        Node::Tag(value) => Condition::Equals {
            field: field.to_string(),
            value: value.clone(),
        },
        Node::Glob {
            text,
            leading_wildcard,
            trailing_wildcard,
        } => matches(
            field,
            glob_pattern(text, *leading_wildcard, *trailing_wildcard),
            negate,
        ),
        Node::Regex(pattern) => matches(field, pattern.clone(), negate),
        Node::Range(range) if negate => condition(&range.negate(), field, false),
        Node::Range(range) => range_condition(*range, field),
        Node::Not(child) => condition(child, field, !negate),
        Node::And(children) => group(Operator::And, children, field, negate),
        Node::Or(children) => group(Operator::Or, children, field, negate),
    }
}

fn matches(field: &str, pattern: String, negate: bool) -> Condition {
    let field = field.to_string();
    if negate {
        Condition::NotMatches { field, pattern }
    } else {
        Condition::Matches { field, pattern }
    }
}

fn glob_pattern(text: &str, leading_wildcard: bool, trailing_wildcard: bool) -> String {
    format!(
        "{}{}{}",
        if leading_wildcard { "" } else { "^" },
        regex::escape(text),
        if trailing_wildcard { "" } else { "$" }
    )
}

fn range_condition(range: Range, field: &str) -> Condition {
    let Range { comparison, bound } = range;
    let field = field.to_string();
    let (index, exists) = match comparison {
        Comparison::Equal => return Condition::Size { field, size: bound },
        Comparison::GreaterThanEqual => (bound.saturating_sub(1), true),
        Comparison::GreaterThan => (bound, true),
        Comparison::LessThan => (bound.saturating_sub(1), false),
        Comparison::LessThanEqual => (bound, false),
    };
    Condition::Exists {
        field,
        index,
        exists,
    }
}

// A negated group is emitted as its dual with every operand negated.
fn group(operator: Operator, children: &[Node], field: &str, negate: bool) -> Condition {
    let operator = if negate { operator.dual() } else { operator };
    let mut conditions = children
        .iter()
        .map(|child| condition(child, field, negate))
        .collect_vec();
    match (operator, conditions.len()) {
        (Operator::And, 0) => Condition::Empty,
        (_, 1) => conditions.remove(0),
        (Operator::And, _) => Condition::And(conditions),
        (Operator::Or, _) => Condition::Or(conditions),
    }
}
