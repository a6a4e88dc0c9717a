use crate::ranges::Interval;
use std::{
    cmp::Ordering,
    fmt::{Display, Formatter},
};

/// A node of a tag query.
///
/// The variant order matters: the derived ordering is used to sort the operands of a group
/// into a canonical order, which puts plain leaves before negations and negations before
/// sub-groups.
#[derive(PartialEq, Eq, PartialOrd, Ord, Clone, Debug)]
pub enum Node {
    Tag(String),
    Glob {
        text: String,
        leading_wildcard: bool,
        trailing_wildcard: bool,
    },
    Regex(String),
    Range(Range),
    Not(Box<Node>),
    And(Vec<Node>),
    Or(Vec<Node>),
}

#[derive(Clone, Copy, Debug, Hash, PartialEq, Eq, PartialOrd, Ord)]
pub enum Comparison {
    Equal,
    LessThan,
    GreaterThan,
    LessThanEqual,
    GreaterThanEqual,
}

/// A constraint on the number of tags.
#[derive(Clone, Copy, Debug, Hash, PartialEq, Eq)]
pub struct Range {
    pub comparison: Comparison,
    pub bound: u64,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Operator {
    And,
    Or,
}

impl Operator {
    #[inline]
    pub fn dual(self) -> Self {
        match self {
            Self::And => Self::Or,
            Self::Or => Self::And,
        }
    }

    #[inline]
    pub fn group(self, children: Vec<Node>) -> Node {
        match self {
            Self::And => Node::And(children),
            Self::Or => Node::Or(children),
        }
    }
}

impl Range {
    #[inline]
    pub const fn new(comparison: Comparison, bound: u64) -> Self {
        Self { comparison, bound }
    }

    /// The set of tag counts matched by this range, `None` when no count can match.
    #[inline]
    pub(crate) fn interval(&self) -> Option<Interval> {
        Interval::of(self)
    }

    /// The complement of this range, as a node.
    pub fn negate(self) -> Node {
        let Self { comparison, bound } = self;
        match comparison {
            Comparison::LessThan => Node::Range(Self::new(Comparison::GreaterThanEqual, bound)),
            Comparison::LessThanEqual => Node::Range(Self::new(Comparison::GreaterThan, bound)),
            Comparison::GreaterThan => Node::Range(Self::new(Comparison::LessThanEqual, bound)),
            Comparison::GreaterThanEqual => Node::Range(Self::new(Comparison::LessThan, bound)),
            Comparison::Equal if bound == 0 => {
                Node::Range(Self::new(Comparison::GreaterThan, bound))
            }
            Comparison::Equal => Node::Or(vec![
                Node::Range(Self::new(Comparison::LessThan, bound)),
                Node::Range(Self::new(Comparison::GreaterThan, bound)),
            ]),
        }
    }

    fn sort_key(&self) -> (u64, u64, Comparison, u64) {
        let (start, end) = self
            .interval()
            .map(|interval| (interval.start(), interval.end().unwrap_or(u64::MAX)))
            .unwrap_or((0, 0));
        (start, end, self.comparison, self.bound)
    }
}

// Ranges sort by the tag counts they cover so merged intervals come out in ascending order.
impl Ord for Range {
    fn cmp(&self, other: &Self) -> Ordering {
        self.sort_key().cmp(&other.sort_key())
    }
}

impl PartialOrd for Range {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Node {
    #[inline]
    pub fn tag(text: impl Into<String>) -> Self {
        Self::Tag(text.into())
    }

    #[inline]
    pub fn range(comparison: Comparison, bound: u64) -> Self {
        Self::Range(Range::new(comparison, bound))
    }

    #[inline]
    pub fn negated(self) -> Self {
        Self::Not(Box::new(self))
    }

    #[inline]
    pub fn is_leaf(&self) -> bool {
        matches!(
            self,
            Self::Tag(_) | Self::Glob { .. } | Self::Regex(_) | Self::Range(_)
        )
    }

    /// Rewrite the tree so that negations only apply to tag, glob and regex leaves.
    #[inline]
    pub fn push_negations(self) -> Self {
        self.negation_normal_form(false)
    }

    fn negation_normal_form(self, negate: bool) -> Self {
        match (self, negate) {
            (Self::And(children), true) => Self::Or(
                children
                    .into_iter()
                    .map(|child| child.negation_normal_form(true))
                    .collect(),
            ),
            (Self::Or(children), true) => Self::And(
                children
                    .into_iter()
                    .map(|child| child.negation_normal_form(true))
                    .collect(),
            ),
            (Self::Not(child), negate) => child.negation_normal_form(!negate),
            (Self::Range(range), true) => range.negate(),
            (Self::And(children), false) => Self::And(
                children
                    .into_iter()
                    .map(|child| child.negation_normal_form(false))
                    .collect(),
            ),
            (Self::Or(children), false) => Self::Or(
                children
                    .into_iter()
                    .map(|child| child.negation_normal_form(false))
                    .collect(),
            ),
            (leaf, true) => leaf.negated(),
            (leaf, false) => leaf,
        }
    }
}

impl Display for Comparison {
    fn fmt(&self, formatter: &mut Formatter) -> std::fmt::Result {
        match self {
            Self::Equal => write!(formatter, "="),
            Self::LessThan => write!(formatter, "<"),
            Self::GreaterThan => write!(formatter, ">"),
            Self::LessThanEqual => write!(formatter, "<="),
            Self::GreaterThanEqual => write!(formatter, ">="),
        }
    }
}

impl Display for Range {
    fn fmt(&self, formatter: &mut Formatter) -> std::fmt::Result {
        write!(formatter, "{} {}", self.comparison, self.bound)
    }
}

impl Display for Node {
    fn fmt(&self, formatter: &mut Formatter) -> std::fmt::Result {
        match self {
            Self::Tag(text) => write!(formatter, "{text:?}"),
            Self::Glob {
                text,
                leading_wildcard,
                trailing_wildcard,
            } => write!(
                formatter,
                "{}{text:?}{}",
                if *leading_wildcard { "*" } else { "" },
                if *trailing_wildcard { "*" } else { "" }
            ),
            Self::Regex(pattern) => write!(formatter, "{{{pattern}}}"),
            Self::Range(range) => write!(formatter, "{range}"),
            Self::Not(child) => write!(formatter, "not {child}"),
            Self::And(children) => write_group(formatter, "and", children),
            Self::Or(children) => write_group(formatter, "or", children),
        }
    }
}

fn write_group(formatter: &mut Formatter, operator: &str, children: &[Node]) -> std::fmt::Result {
    write!(formatter, "(")?;
    for (index, child) in children.iter().enumerate() {
        if index > 0 {
            write!(formatter, " {operator} ")?;
        }
        write!(formatter, "{child}")?;
    }
    write!(formatter, ")")
}
