//! Rewrites a parsed expression into its canonical form.
//!
//! Negations are pushed down to the leaves, nested groups of the same operator are flattened,
//! operands are sorted and deduplicated, complementary operands are detected and the range
//! leaves of every group are merged into as few leaves as possible.

use crate::{
    ast::{Node, Range},
    error::CompileError,
    ranges::{self, Merged},
};
use itertools::{Either, Itertools};

enum Reduced {
    /// The expression matches every document.
    Tautology,
    Node(Node),
}

/// Normalize an expression.
///
/// Normalizing an already normalized expression returns it unchanged.
pub fn normalize(node: Node) -> Result<Node, CompileError> {
    match simplify(node.push_negations())? {
        Reduced::Node(node) => {
            log::debug!("normalized expression into {node}");
            Ok(node)
        }
        Reduced::Tautology => Err(CompileError::Unsupported(
            "the expression matches every document".to_string(),
        )),
    }
}

fn simplify(node: Node) -> Result<Reduced, CompileError> {
    match node {
        Node::Regex(pattern) => Ok(Reduced::Node(coerce_regex(pattern))),
        Node::Range(range) => simplify_range(range),
        Node::Not(child) => match simplify(*child)? {
            Reduced::Node(node) => Ok(Reduced::Node(node.negated())),
            Reduced::Tautology => Err(CompileError::Contradiction(
                "the negation of an expression matching every document".to_string(),
            )),
        },
        Node::And(children) => simplify_and(children),
        Node::Or(children) => simplify_or(children),
        leaf => Ok(Reduced::Node(leaf)),
    }
}

/// A regex matching exactly one literal string is the same as a tag equality.
fn coerce_regex(pattern: String) -> Node {
    match pattern
        .strip_prefix('^')
        .and_then(|pattern| pattern.strip_suffix('$'))
    {
        Some(literal) if !literal.is_empty() && regex::escape(literal) == literal => {
            Node::tag(literal)
        }
        _ => Node::Regex(pattern),
    }
}

fn simplify_range(range: Range) -> Result<Reduced, CompileError> {
    match range.interval() {
        None => Err(CompileError::Contradiction(format!(
            "no number of tags is {range}"
        ))),
        Some(interval) if interval.is_everything() => Ok(Reduced::Tautology),
        Some(_) => Ok(Reduced::Node(Node::Range(range))),
    }
}

fn simplify_and(children: Vec<Node>) -> Result<Reduced, CompileError> {
    let mut operands = Vec::with_capacity(children.len());
    for child in children {
        match simplify(child)? {
            Reduced::Tautology => log::debug!("dropping an always true operand of an and group"),
            Reduced::Node(Node::And(grandchildren)) => operands.extend(grandchildren),
            Reduced::Node(node) => operands.push(node),
        }
    }
    let operands = canonical(operands);
    if let Some(node) = find_complement(&operands) {
        return Err(CompileError::Contradiction(format!(
            "{node} is required together with its negation"
        )));
    }

    let (ranges, mut operands): (Vec<Range>, Vec<Node>) = split_ranges(operands);
    if !ranges.is_empty() {
        match ranges::intersect(&ranges) {
            Merged::Nothing => {
                return Err(CompileError::Contradiction(format!(
                    "no number of tags is {}",
                    ranges.iter().join(" and ")
                )))
            }
            Merged::Everything => {}
            Merged::Nodes(nodes) => operands.extend(nodes),
        }
    }
    let mut operands = canonical(operands);

    Ok(match operands.len() {
        0 => Reduced::Tautology,
        1 => Reduced::Node(operands.remove(0)),
        _ => Reduced::Node(Node::And(operands)),
    })
}

fn simplify_or(children: Vec<Node>) -> Result<Reduced, CompileError> {
    let mut operands = Vec::with_capacity(children.len());
    for child in children {
        match simplify(child)? {
            Reduced::Tautology => return Ok(Reduced::Tautology),
            Reduced::Node(Node::Or(grandchildren)) => operands.extend(grandchildren),
            Reduced::Node(node) => operands.push(node),
        }
    }
    let operands = canonical(operands);
    if let Some(node) = find_complement(&operands) {
        log::debug!("{node} appears together with its negation in an or group");
        return Ok(Reduced::Tautology);
    }

    let (terms, mut operands): (Vec<Vec<Range>>, Vec<Node>) = split_range_terms(operands);
    if !terms.is_empty() {
        match ranges::unite(&terms) {
            None => return Ok(Reduced::Tautology),
            Some(nodes) => operands.extend(nodes),
        }
    }
    let mut operands = canonical(operands);

    Ok(match operands.len() {
        0 => Reduced::Tautology,
        1 => Reduced::Node(operands.remove(0)),
        _ => Reduced::Node(Node::Or(operands)),
    })
}

#[inline]
fn canonical(operands: Vec<Node>) -> Vec<Node> {
    operands.into_iter().sorted().dedup().collect()
}

fn split_ranges(operands: Vec<Node>) -> (Vec<Range>, Vec<Node>) {
    operands.into_iter().partition_map(|node| match node {
        Node::Range(range) => Either::Left(range),
        node => Either::Right(node),
    })
}

/// Split off the operands of an `or` group that only constrain the number of tags: range
/// leaves and `and` groups made of range leaves.
fn split_range_terms(operands: Vec<Node>) -> (Vec<Vec<Range>>, Vec<Node>) {
    operands.into_iter().partition_map(|node| match node {
        Node::Range(range) => Either::Left(vec![range]),
        Node::And(children) if children.iter().all(|child| matches!(child, Node::Range(_))) => {
            Either::Left(
                children
                    .into_iter()
                    .filter_map(|child| match child {
                        Node::Range(range) => Some(range),
                        _ => None,
                    })
                    .collect(),
            )
        }
        node => Either::Right(node),
    })
}

/// The first operand whose negation is also fully present in the sorted `operands`.
fn find_complement(operands: &[Node]) -> Option<&Node> {
    operands.iter().find(|node| {
        complement(node).is_some_and(|terms| {
            terms
                .iter()
                .all(|term| operands.binary_search(term).is_ok())
        })
    })
}

/// The siblings that would contradict `node`.
///
/// For a leaf this is its negation. For a group of leaves this is the negation of each
/// operand, since the dual group of those negations is exactly the complement of the group.
fn complement(node: &Node) -> Option<Vec<Node>> {
    match node {
        Node::And(children) | Node::Or(children) => {
            children.iter().map(negated_leaf).collect::<Option<Vec<_>>>()
        }
        node => negated_leaf(node).map(|term| vec![term]),
    }
}

// Ranges are handled by interval merging.
fn negated_leaf(node: &Node) -> Option<Node> {
    match node {
        Node::Range(_) => None,
        Node::Not(child) if child.is_leaf() => Some((**child).clone()),
        node if node.is_leaf() => Some(node.clone().negated()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        parser::parse,
        test_utils::{
            ast::{and, glob, not, or, range, regex, tag},
            tokens::lex,
        },
    };
    use proptest::prelude::*;

    fn normalize_str(input: &str) -> Result<Node, CompileError> {
        normalize(parse(&lex(input)).unwrap())
    }

    fn is_contradiction(result: Result<Node, CompileError>) -> bool {
        matches!(result, Err(CompileError::Contradiction(_)))
    }

    fn is_unsupported(result: Result<Node, CompileError>) -> bool {
        matches!(result, Err(CompileError::Unsupported(_)))
    }

    #[test]
    fn can_flatten_nested_groups_of_the_same_operator() {
        assert_eq!(
            Ok(and!(tag!("a"), tag!("b"), tag!("c"))),
            normalize_str("a and (b and c)")
        );
        assert_eq!(
            Ok(or!(tag!("a"), tag!("b"), tag!("c"), tag!("d"))),
            normalize_str("(a or b) or (c or d)")
        );
    }

    #[test]
    fn can_flatten_groups_produced_by_negation() {
        assert_eq!(
            Ok(and!(tag!("a"), not!(tag!("b")), not!(tag!("c")))),
            normalize_str("a and not (b or c)")
        );
    }

    #[test]
    fn can_remove_duplicate_operands() {
        assert_eq!(Ok(tag!("a")), normalize_str("a and a"));
        assert_eq!(Ok(or!(tag!("a"), tag!("b"))), normalize_str("a or b or a"));
        assert_eq!(
            Ok(or!(tag!("c"), and!(tag!("a"), tag!("b")))),
            normalize_str("(a and b) or c or (b and a)")
        );
    }

    #[test]
    fn can_sort_operands_of_the_same_operator() {
        assert_eq!(normalize_str("a and b"), normalize_str("b and a"));
        assert_eq!(normalize_str("a or b or c"), normalize_str("c or a or b"));
    }

    #[test]
    fn keep_different_operators_apart() {
        assert_eq!(
            Ok(or!(tag!("c"), and!(tag!("a"), tag!("b")))),
            normalize_str("a and b or c")
        );
        assert_eq!(
            Ok(and!(tag!("c"), or!(tag!("a"), tag!("b")))),
            normalize_str("a or b and c")
        );
    }

    #[test]
    fn return_a_contradiction_on_an_operand_and_its_negation() {
        assert!(is_contradiction(normalize_str("a and not a")));
        assert!(is_contradiction(normalize_str("a and not a and b")));
        assert!(is_contradiction(normalize_str("*a* and not *a*")));
        assert!(is_contradiction(normalize_str("a and b and not (a and b)")));
        assert!(is_contradiction(normalize_str("(a or b) and not a and not b")));
    }

    #[test]
    fn return_a_contradiction_on_disjoint_ranges() {
        assert!(is_contradiction(normalize_str("> 3 and < 2")));
        assert!(is_contradiction(normalize_str("a and (= 2 and = 3)")));
        assert!(is_contradiction(normalize_str("< 0")));
        assert!(is_contradiction(normalize_str("a or fewer 0")));
    }

    #[test]
    fn can_absorb_an_always_true_or_group() {
        assert_eq!(Ok(not!(tag!("b"))), normalize_str("a or not a and not b"));
        assert_eq!(
            Ok(tag!("c")),
            normalize_str("c and (a or b or not (a or b))")
        );
        assert_eq!(Ok(tag!("a")), normalize_str("a and (> 4 or < 5)"));
        assert_eq!(Ok(tag!("a")), normalize_str("a and >= 0"));
    }

    #[test]
    fn return_unsupported_on_an_always_true_expression() {
        assert!(is_unsupported(normalize_str("a or not a")));
        assert!(is_unsupported(normalize_str(">= 0")));
        assert!(is_unsupported(normalize_str("b or >= 0")));
        assert!(is_unsupported(normalize_str("> 4 or < 5")));
    }

    #[test]
    fn can_merge_ranges_of_an_or_group() {
        assert_eq!(
            Ok(range!(GreaterThanEqual, 2)),
            normalize_str(">= 2 or >= 5")
        );
        assert_eq!(
            Ok(or!(tag!("a"), and!(range!(LessThanEqual, 3), range!(GreaterThanEqual, 2)))),
            normalize_str("a or = 2 or = 3")
        );
        assert_eq!(
            Ok(or!(range!(LessThan, 2), range!(GreaterThan, 3))),
            normalize_str("> 3 or < 2")
        );
    }

    #[test]
    fn can_merge_bounded_ranges_with_the_ranges_of_an_or_group() {
        assert!(is_unsupported(normalize_str("(= 2 or = 3) or < 2 or > 3")));
        assert!(is_unsupported(normalize_str("(> 1 and < 5) or <= 1 or >= 5")));
        assert_eq!(
            Ok(and!(range!(LessThanEqual, 4), range!(GreaterThanEqual, 2))),
            normalize_str("(= 2 or = 3) or = 4")
        );
        assert_eq!(
            normalize_str("= 2 or = 3 or = 4"),
            normalize_str("(= 2 or = 3) or = 4")
        );
        assert_eq!(
            Ok(range!(GreaterThan, 1)),
            normalize_str("(> 1 and < 4) or >= 3")
        );
        assert_eq!(
            Ok(or!(
                tag!("a"),
                and!(range!(LessThanEqual, 4), range!(GreaterThan, 1))
            )),
            normalize_str("a or (> 1 and < 4) or = 4")
        );
    }

    #[test]
    fn can_merge_ranges_of_an_and_group() {
        assert_eq!(Ok(range!(LessThan, 3)), normalize_str("< 3 and < 7"));
        assert_eq!(
            Ok(and!(range!(LessThan, 6), range!(GreaterThan, 2))),
            normalize_str("> 2 and < 6")
        );
        assert_eq!(Ok(range!(Equal, 3)), normalize_str("> 2 and < 4"));
        assert_eq!(
            Ok(and!(tag!("a"), range!(Equal, 3))),
            normalize_str("(a and > 2) and (max 3)")
        );
    }

    #[test]
    fn can_negate_ranges() {
        assert_eq!(
            Ok(or!(range!(LessThan, 3), range!(GreaterThan, 3))),
            normalize_str("not exactly 3")
        );
        assert_eq!(Ok(range!(GreaterThan, 0)), normalize_str("not = 0"));
        assert_eq!(Ok(range!(GreaterThanEqual, 2)), normalize_str("not < 2"));
    }

    #[test]
    fn can_coerce_an_anchored_literal_regex_into_a_tag() {
        assert_eq!(Ok(tag!("abc")), normalize_str("{^abc$}"));
        assert_eq!(Ok(not!(tag!("a b"))), normalize_str("not {^a b$}"));
        assert_eq!(Ok(regex!("^a.c$")), normalize_str("{^a.c$}"));
        assert_eq!(Ok(regex!("^$")), normalize_str("{^$}"));
        assert_eq!(Ok(regex!("abc")), normalize_str("{abc}"));
    }

    #[test]
    fn return_a_contradiction_on_a_coerced_regex_and_its_negated_tag() {
        assert!(is_contradiction(normalize_str("{^abc$} and not abc")));
    }

    #[test]
    fn leave_a_canonical_expression_as_is() {
        let expression = and!(
            tag!("a"),
            glob!("b", true, false),
            range!(GreaterThan, 1),
            not!(tag!("c")),
            or!(tag!("d"), tag!("e"))
        );

        assert_eq!(Ok(expression.clone()), normalize(expression));
    }

    fn range_leaf(bounds: std::ops::Range<u64>) -> impl Strategy<Value = Node> {
        (0usize..5, bounds).prop_map(|(comparison, bound)| {
            let comparison = [
                crate::ast::Comparison::Equal,
                crate::ast::Comparison::LessThan,
                crate::ast::Comparison::GreaterThan,
                crate::ast::Comparison::LessThanEqual,
                crate::ast::Comparison::GreaterThanEqual,
            ][comparison];
            Node::range(comparison, bound)
        })
    }

    fn leaf() -> impl Strategy<Value = Node> {
        prop_oneof![
            prop::sample::select(vec!["a", "b", "c"]).prop_map(Node::tag),
            prop::sample::select(vec!["^a$", "b+"]).prop_map(|pattern| regex!(pattern)),
            range_leaf(0..4),
        ]
    }

    fn expression() -> impl Strategy<Value = Node> {
        leaf().prop_recursive(4, 24, 4, |inner| {
            prop_oneof![
                inner.clone().prop_map(Node::negated),
                prop::collection::vec(inner.clone(), 2..4).prop_map(Node::And),
                prop::collection::vec(inner, 2..4).prop_map(Node::Or),
            ]
        })
    }

    proptest! {
        #[test]
        fn normalize_is_idempotent(expression in expression()) {
            if let Ok(once) = normalize(expression) {
                prop_assert_eq!(Ok(once.clone()), normalize(once));
            }
        }

        #[test]
        fn normalize_ignores_the_grouping_of_ranges_in_an_or_group(
            xs in prop::collection::vec(range_leaf(1..6), 1..4),
            ys in prop::collection::vec(range_leaf(1..6), 1..4),
        ) {
            let flat = Node::Or(xs.iter().chain(&ys).cloned().collect());
            let mut grouped = vec![Node::Or(xs)];
            grouped.extend(ys);
            prop_assert_eq!(normalize(flat), normalize(Node::Or(grouped)));
        }

        #[test]
        fn normalize_sorts_operands(expression in expression()) {
            if let Ok(Node::And(children) | Node::Or(children)) = normalize(expression) {
                prop_assert!(children.iter().tuple_windows().all(|(a, b)| a < b));
            }
        }
    }
}
