//! Recursive-descent parser for pattern text.
//!
//! ```text
//! alternate := concat ('|' concat)*
//! concat    := postfix*
//! postfix   := atom ('*' | '+' | '?' | '{' n [',' [m]] '}')*
//! atom      := char | escape | '.' | class | '(' ['?:' | '?=' | '?!'] alternate ')'
//! ```

use super::ast::Pattern;
use crate::charset::parse::{parse_class, parse_escape, Cursor, Escape};
use crate::charset::CharSet;
use crate::error::PatternSyntaxError;
use crate::unicode::RangeList;
use smartstring::alias::String;

/// Counted repetitions are unrolled, so keep them small.
const MAX_COUNT: u32 = 1000;

pub(crate) fn parse_pattern(text: &str) -> Result<Pattern, PatternSyntaxError> {
    let mut cur = Cursor::new(text);
    let pattern = parse_alternate(&mut cur)?;
    match cur.peek() {
        None => Ok(pattern),
        Some(')') => Err(cur.error("unbalanced ')'")),
        Some(c) => Err(cur.error(&format!("unexpected {c:?}"))),
    }
}

fn parse_alternate(cur: &mut Cursor<'_>) -> Result<Pattern, PatternSyntaxError> {
    let mut branches = vec![parse_concat(cur)?];
    while cur.eat('|') {
        branches.push(parse_concat(cur)?);
    }
    Ok(Pattern::alternate(branches))
}

fn parse_concat(cur: &mut Cursor<'_>) -> Result<Pattern, PatternSyntaxError> {
    let mut items: Vec<Pattern> = Vec::new();
    while let Some(c) = cur.peek() {
        if c == '|' || c == ')' {
            break;
        }
        let item = parse_postfix(cur)?;
        // Fold adjacent literals into one text node.
        if let (Pattern::Text(next), Some(Pattern::Text(prev))) = (&item, items.last_mut()) {
            prev.push_str(next);
            continue;
        }
        items.push(item);
    }
    Ok(Pattern::concat(items))
}

fn parse_postfix(cur: &mut Cursor<'_>) -> Result<Pattern, PatternSyntaxError> {
    let mut atom = parse_atom(cur)?;
    loop {
        atom = match cur.peek() {
            Some('*') => {
                cur.bump();
                atom.zero_or_more()
            }
            Some('+') => {
                cur.bump();
                atom.one_or_more()
            }
            Some('?') => {
                cur.bump();
                atom.optional()
            }
            Some('{') if cur.peek_at(1).is_some_and(|c| c.is_ascii_digit()) => {
                let (min, max) = parse_count(cur)?;
                unroll(atom, min, max)
            }
            _ => return Ok(atom),
        };
    }
}

fn parse_count(cur: &mut Cursor<'_>) -> Result<(u32, Option<u32>), PatternSyntaxError> {
    let start = cur.position();
    cur.expect('{')?;
    let min = parse_number(cur).ok_or_else(|| cur.error("repetition count is empty"))?;
    let max = if cur.eat(',') {
        parse_number(cur)
    } else {
        Some(min)
    };
    cur.expect('}')?;
    if max.is_some_and(|m| m < min) {
        return Err(cur.error_at(start, "repetition bounds out of order"));
    }
    if min.max(max.unwrap_or(0)) > MAX_COUNT {
        return Err(cur.error_at(start, "repetition count too large"));
    }
    Ok((min, max))
}

fn parse_number(cur: &mut Cursor<'_>) -> Option<u32> {
    let mut value: Option<u32> = None;
    while let Some(d) = cur.peek().and_then(|c| c.to_digit(10)) {
        cur.bump();
        value = Some(value.unwrap_or(0).saturating_mul(10).saturating_add(d));
    }
    value
}

fn unroll(atom: Pattern, min: u32, max: Option<u32>) -> Pattern {
    let mut items: Vec<Pattern> = (0..min).map(|_| atom.clone()).collect();
    match max {
        None => items.push(atom.zero_or_more()),
        Some(max) => {
            // a{2,4} == a a (a (a)?)?
            let mut tail: Option<Pattern> = None;
            for _ in min..max {
                let step = match tail.take() {
                    Some(t) => Pattern::concat([atom.clone(), t]),
                    None => atom.clone(),
                };
                tail = Some(step.optional());
            }
            items.extend(tail);
        }
    }
    Pattern::concat(items)
}

fn parse_atom(cur: &mut Cursor<'_>) -> Result<Pattern, PatternSyntaxError> {
    let Some(c) = cur.peek() else {
        return Err(cur.error("unexpected end of pattern"));
    };
    match c {
        '(' => parse_group(cur),
        '[' => Ok(Pattern::Set(parse_class(cur)?)),
        '.' => {
            cur.bump();
            Ok(Pattern::Set(CharSet::any().subtract(&CharSet::from_char('\n'))))
        }
        '*' | '+' | '?' => Err(cur.error("repetition operator has nothing to repeat")),
        '\\' => {
            cur.bump();
            Ok(match parse_escape(cur)? {
                Escape::Char(cp) => match char::from_u32(cp) {
                    Some(c) => literal(c),
                    // A lone surrogate; kept as a set that never matches.
                    None => Pattern::Set(CharSet::from_ranges(RangeList::single(cp))),
                },
                Escape::Set(set) => Pattern::Set(set),
            })
        }
        c => {
            cur.bump();
            Ok(literal(c))
        }
    }
}

fn literal(c: char) -> Pattern {
    let mut text = String::new();
    text.push(c);
    Pattern::Text(text)
}

fn parse_group(cur: &mut Cursor<'_>) -> Result<Pattern, PatternSyntaxError> {
    let open = cur.position();
    cur.expect('(')?;
    let lookahead = if cur.eat('?') {
        match cur.bump() {
            Some(':') => None,
            Some('=') => Some(false),
            Some('!') => Some(true),
            _ => return Err(cur.error_at(open, "unknown group kind")),
        }
    } else {
        None
    };
    let inner = parse_alternate(cur)?;
    if !cur.eat(')') {
        return Err(cur.error_at(open, "unbalanced '('"));
    }
    Ok(match lookahead {
        Some(negated) => Pattern::Lookahead {
            pattern: Box::new(inner),
            negated,
        },
        None => inner,
    })
}
