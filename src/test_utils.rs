pub mod ast {
    macro_rules! or {
        ($($child:expr),+ $(,)?) => {
            $crate::ast::Node::Or(vec![$($child),+])
        };
    }

    macro_rules! and {
        ($($child:expr),+ $(,)?) => {
            $crate::ast::Node::And(vec![$($child),+])
        };
    }

    macro_rules! not {
        ($value:expr) => {
            $crate::ast::Node::Not(Box::new($value))
        };
    }

    macro_rules! tag {
        ($text:expr) => {
            $crate::ast::Node::Tag(String::from($text))
        };
    }

    macro_rules! glob {
        ($text:expr, $leading:expr, $trailing:expr) => {
            $crate::ast::Node::Glob {
                text: String::from($text),
                leading_wildcard: $leading,
                trailing_wildcard: $trailing,
            }
        };
    }

    macro_rules! regex {
        ($pattern:expr) => {
            $crate::ast::Node::Regex(String::from($pattern))
        };
    }

    macro_rules! range {
        ($comparison:ident, $bound:expr) => {
            $crate::ast::Node::Range($crate::ast::Range::new(
                $crate::ast::Comparison::$comparison,
                $bound,
            ))
        };
    }

    pub(crate) use and;
    pub(crate) use glob;
    pub(crate) use not;
    pub(crate) use or;
    pub(crate) use range;
    pub(crate) use regex;
    pub(crate) use tag;
}

pub mod tokens {
    use crate::lexer::{tokenize, Token};

    pub fn lex(input: &str) -> Vec<Token> {
        tokenize(input).unwrap()
    }
}
