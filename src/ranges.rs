//! Interval arithmetic over tag counts.
//!
//! Every [`Range`] leaf denotes a set of non-negative tag counts. Leaves sharing an `and` group
//! are intersected, leaves sharing an `or` group are united, and the result is turned back
//! into as few leaves as possible.

use crate::ast::{Comparison, Node, Range};
use itertools::Itertools;

/// A non-empty, inclusive interval of tag counts. An `end` of `None` means unbounded.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub struct Interval {
    start: u64,
    end: Option<u64>,
}

impl Interval {
    pub const EVERYTHING: Self = Self {
        start: 0,
        end: None,
    };

    pub fn new(start: u64, end: Option<u64>) -> Option<Self> {
        match end {
            Some(end) if end < start => None,
            _ => Some(Self { start, end }),
        }
    }

    pub fn of(range: &Range) -> Option<Self> {
        let bound = range.bound;
        match range.comparison {
            Comparison::Equal => Self::new(bound, Some(bound)),
            Comparison::LessThan => bound.checked_sub(1).and_then(|end| Self::new(0, Some(end))),
            Comparison::GreaterThan => {
                bound.checked_add(1).and_then(|start| Self::new(start, None))
            }
            Comparison::LessThanEqual => Self::new(0, Some(bound)),
            Comparison::GreaterThanEqual => Self::new(bound, None),
        }
    }

    #[inline]
    pub fn start(&self) -> u64 {
        self.start
    }

    #[inline]
    pub fn end(&self) -> Option<u64> {
        self.end
    }

    #[inline]
    pub fn is_everything(&self) -> bool {
        *self == Self::EVERYTHING
    }

    pub fn intersect(self, other: Self) -> Option<Self> {
        let end = match (self.end, other.end) {
            (Some(a), Some(b)) => Some(a.min(b)),
            (a, b) => a.or(b),
        };
        Self::new(self.start.max(other.start), end)
    }

    /// Join two intervals when they overlap or are adjacent.
    fn join(self, other: Self) -> Option<Self> {
        let (first, second) = if self <= other {
            (self, other)
        } else {
            (other, self)
        };
        let touches = first
            .end
            .map_or(true, |end| end.saturating_add(1) >= second.start);
        if !touches {
            return None;
        }
        let end = match (first.end, second.end) {
            (Some(a), Some(b)) => Some(a.max(b)),
            _ => None,
        };
        Some(Self {
            start: first.start,
            end,
        })
    }
}

/// The result of intersecting the range leaves of an `and` group.
#[derive(Debug, PartialEq, Eq)]
pub enum Merged {
    /// The group matches no tag count at all.
    Nothing,
    /// The group matches every tag count.
    Everything,
    /// The nodes replacing the range leaves of the group.
    Nodes(Vec<Node>),
}

/// Intersect the ranges of an `and` group.
pub fn intersect(ranges: &[Range]) -> Merged {
    let Some(interval) = conjunction(ranges) else {
        return Merged::Nothing;
    };
    if interval.is_everything() {
        return Merged::Everything;
    }
    if let Some(range) = reuse(ranges, interval) {
        return Merged::Nodes(vec![Node::Range(range)]);
    }
    let nodes = bounds(ranges, interval)
        .into_iter()
        .map(Node::Range)
        .collect_vec();
    Merged::Nodes(nodes)
}

/// Unite the terms of an `or` group, each term being the conjunction of its ranges.
///
/// Returns `None` when the terms cover every tag count. Terms matching no tag count are
/// ignored.
pub fn unite(terms: &[Vec<Range>]) -> Option<Vec<Node>> {
    let candidates = terms.iter().flatten().copied().sorted().collect_vec();
    let mut united: Vec<Interval> = Vec::new();
    for interval in terms.iter().filter_map(|term| conjunction(term)).sorted() {
        match united.last().and_then(|last| last.join(interval)) {
            Some(joined) => {
                let last = united.len() - 1;
                united[last] = joined;
            }
            None => united.push(interval),
        }
    }
    if united.iter().any(Interval::is_everything) {
        return None;
    }
    let nodes = united
        .into_iter()
        .map(|interval| match reuse(&candidates, interval) {
            Some(range) => Node::Range(range),
            None => {
                let mut parts = bounds(&candidates, interval);
                if parts.len() == 1 {
                    Node::Range(parts.remove(0))
                } else {
                    Node::And(parts.into_iter().sorted().map(Node::Range).collect())
                }
            }
        })
        .collect();
    Some(nodes)
}

/// The tag counts matched by every one of `ranges`, `None` when there are none.
fn conjunction(ranges: &[Range]) -> Option<Interval> {
    ranges
        .iter()
        .try_fold(Interval::EVERYTHING, |accumulator, range| {
            accumulator.intersect(range.interval()?)
        })
}

/// The first original range that covers exactly `interval`.
fn reuse(ranges: &[Range], interval: Interval) -> Option<Range> {
    ranges
        .iter()
        .find(|range| range.interval() == Some(interval))
        .copied()
}

/// The lower and upper bound ranges whose conjunction covers exactly `interval`.
fn bounds(ranges: &[Range], interval: Interval) -> Vec<Range> {
    if interval.end == Some(interval.start) {
        return vec![Range::new(Comparison::Equal, interval.start)];
    }
    let mut bounds = Vec::with_capacity(2);
    if interval.start > 0 {
        let lower = Interval {
            start: interval.start,
            end: None,
        };
        bounds.push(
            reuse(ranges, lower)
                .unwrap_or(Range::new(Comparison::GreaterThanEqual, interval.start)),
        );
    }
    if let Some(end) = interval.end {
        let upper = Interval {
            start: 0,
            end: Some(end),
        };
        bounds.push(reuse(ranges, upper).unwrap_or(Range::new(Comparison::LessThanEqual, end)));
    }
    bounds
}
