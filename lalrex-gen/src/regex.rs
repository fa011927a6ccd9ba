//! Terminal patterns: the [`Pattern`] tree and its textual syntax.
//!
//! Patterns are either assembled with the builder methods on [`Pattern`] or
//! parsed from text with [`Pattern::parse`]:
//!
//! | Syntax              | Meaning                                     |
//! |---------------------|---------------------------------------------|
//! | `abc`, `\+`, `\n`   | literal text                                |
//! | `.`                 | any character except line feed              |
//! | `[a-z]`, `[^\s]`    | character class (see [`CharSet::parse`])    |
//! | `\d \w \s \p{Lu}`   | shorthand classes and general categories    |
//! | `(p)`, `(?:p)`      | grouping                                    |
//! | `p|q`               | alternation                                 |
//! | `p* p+ p? p{n,m}`   | repetition                                  |
//! | `(?=p)`, `(?!p)`    | followed by / not followed by `p`           |
//!
//! [`CharSet::parse`]: crate::charset::CharSet::parse

mod ast;
mod parser;

pub use ast::{Pattern, Repeat};

use crate::error::PatternSyntaxError;

impl Pattern {
    pub fn parse(text: &str) -> Result<Pattern, PatternSyntaxError> {
        parser::parse_pattern(text)
    }
}

impl std::str::FromStr for Pattern {
    type Err = PatternSyntaxError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Pattern::parse(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::charset::CharSet;

    fn parse(text: &str) -> Pattern {
        Pattern::parse(text).unwrap()
    }

    #[test]
    fn literals_fold_into_text() {
        assert_eq!(parse("if"), Pattern::text("if"));
        assert_eq!(parse("a\\+b"), Pattern::text("a+b"));
    }

    #[test]
    fn postfix_binds_to_last_atom() {
        assert_eq!(
            parse("ab*"),
            Pattern::concat([Pattern::text("a"), Pattern::text("b").zero_or_more()])
        );
    }

    #[test]
    fn alternation_and_groups() {
        let p = parse("(?:0x)?[0-9a-f]+|\\d+");
        let Pattern::Alternate(branches) = p else {
            panic!("expected alternation");
        };
        assert_eq!(branches.len(), 2);
        assert!(matches!(&branches[1], Pattern::Repeat(_, Repeat::OneOrMore)));
    }

    #[test]
    fn lookaheads() {
        let p = parse("a(?!b)");
        assert_eq!(p, Pattern::text("a").not_followed_by(Pattern::text("b")));
        let p = parse("a(?=b)");
        assert_eq!(p, Pattern::text("a").followed_by(Pattern::text("b")));
    }

    #[test]
    fn counted_repetition_unrolls() {
        let a = || Pattern::text("a");
        assert_eq!(
            parse("a{2,3}"),
            Pattern::concat([a(), a(), a().optional()])
        );
        assert_eq!(parse("a{1,}"), Pattern::concat([a(), a().zero_or_more()]));
        assert_eq!(parse("x{"), Pattern::text("x{"));
    }

    #[test]
    fn classes_and_escapes() {
        assert_eq!(
            parse("[a-c]"),
            Pattern::Set(CharSet::from_range('a', 'c'))
        );
        assert!(matches!(parse("\\p{Lu}"), Pattern::Set(_)));
        assert_eq!(parse("\\u{1F600}"), Pattern::text("\u{1F600}"));
        assert_eq!(parse("\\uD83D\\uDE00"), Pattern::text("\u{1F600}"));
    }

    #[test]
    fn nullable() {
        assert!(parse("a*").is_nullable());
        assert!(parse("a|").is_nullable());
        assert!(!parse("a+").is_nullable());
        assert!(Pattern::empty().is_nullable());
    }

    #[test]
    fn syntax_errors() {
        for bad in ["(a", "a)", "*a", "[a", "a{3,1}", "(?<x)", "\\"] {
            let err = Pattern::parse(bad).unwrap_err();
            assert_eq!(err.pattern.as_str(), bad, "{bad}");
        }
    }
}
