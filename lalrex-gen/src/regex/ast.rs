use crate::charset::CharSet;
use smartstring::alias::String;

/// Repetition operators.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Repeat {
    /// `*`
    ZeroOrMore,
    /// `+`
    OneOrMore,
    /// `?`
    Optional,
}

/// A pattern tree describing the text of one terminal.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Pattern {
    /// Literal text, matched character by character.
    Text(String),
    /// One character out of a set.
    Set(CharSet),
    /// Operands in sequence. An empty concatenation matches the empty string.
    Concat(Vec<Pattern>),
    /// Any one of the operands.
    Alternate(Vec<Pattern>),
    Repeat(Box<Pattern>, Repeat),
    /// Zero-width assertion on what follows: `(?=p)` or, negated, `(?!p)`.
    Lookahead { pattern: Box<Pattern>, negated: bool },
}

impl Pattern {
    pub fn empty() -> Pattern {
        Pattern::Concat(Vec::new())
    }

    pub fn text(text: &str) -> Pattern {
        Pattern::Text(text.into())
    }

    pub fn set(set: CharSet) -> Pattern {
        Pattern::Set(set)
    }

    pub fn concat<I: IntoIterator<Item = Pattern>>(items: I) -> Pattern {
        let mut items: Vec<Pattern> = items.into_iter().collect();
        if items.len() == 1 {
            items.remove(0)
        } else {
            Pattern::Concat(items)
        }
    }

    pub fn alternate<I: IntoIterator<Item = Pattern>>(items: I) -> Pattern {
        let mut items: Vec<Pattern> = items.into_iter().collect();
        if items.len() == 1 {
            items.remove(0)
        } else {
            Pattern::Alternate(items)
        }
    }

    pub fn zero_or_more(self) -> Pattern {
        Pattern::Repeat(Box::new(self), Repeat::ZeroOrMore)
    }

    pub fn one_or_more(self) -> Pattern {
        Pattern::Repeat(Box::new(self), Repeat::OneOrMore)
    }

    pub fn optional(self) -> Pattern {
        Pattern::Repeat(Box::new(self), Repeat::Optional)
    }

    /// `self` only when followed by `next` (which is not consumed).
    pub fn followed_by(self, next: Pattern) -> Pattern {
        Pattern::concat([
            self,
            Pattern::Lookahead {
                pattern: Box::new(next),
                negated: false,
            },
        ])
    }

    /// `self` only when not followed by `next`.
    pub fn not_followed_by(self, next: Pattern) -> Pattern {
        Pattern::concat([
            self,
            Pattern::Lookahead {
                pattern: Box::new(next),
                negated: true,
            },
        ])
    }

    /// Whether the pattern can match without consuming input.
    pub fn is_nullable(&self) -> bool {
        match self {
            Pattern::Text(t) => t.is_empty(),
            Pattern::Set(_) => false,
            Pattern::Concat(items) => items.iter().all(Pattern::is_nullable),
            Pattern::Alternate(items) => items.iter().any(Pattern::is_nullable),
            Pattern::Repeat(inner, Repeat::OneOrMore) => inner.is_nullable(),
            Pattern::Repeat(_, _) => true,
            Pattern::Lookahead { .. } => true,
        }
    }
}

impl From<CharSet> for Pattern {
    fn from(set: CharSet) -> Self {
        Pattern::Set(set)
    }
}

impl From<&str> for Pattern {
    fn from(text: &str) -> Self {
        Pattern::text(text)
    }
}
