//! Parser for the character-set notation, shared with the pattern parser.

use super::CharSet;
use crate::error::PatternSyntaxError;
use crate::unicode::{Categories, Category, RangeList, LOW_SURROGATE_START, MAX_CODE_POINT};

/// Character cursor over pattern text that reports errors against the
/// whole pattern.
pub(crate) struct Cursor<'a> {
    text: &'a str,
    chars: Vec<char>,
    pos: usize,
}

impl<'a> Cursor<'a> {
    pub(crate) fn new(text: &'a str) -> Self {
        Self {
            text,
            chars: text.chars().collect(),
            pos: 0,
        }
    }

    #[inline]
    pub(crate) fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    #[inline]
    pub(crate) fn peek_at(&self, n: usize) -> Option<char> {
        self.chars.get(self.pos + n).copied()
    }

    pub(crate) fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += 1;
        Some(c)
    }

    pub(crate) fn eat(&mut self, c: char) -> bool {
        if self.peek() == Some(c) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    pub(crate) fn at_end(&self) -> bool {
        self.pos >= self.chars.len()
    }

    pub(crate) fn position(&self) -> usize {
        self.pos
    }

    pub(crate) fn error(&self, message: &str) -> PatternSyntaxError {
        self.error_at(self.pos, message)
    }

    pub(crate) fn error_at(&self, position: usize, message: &str) -> PatternSyntaxError {
        PatternSyntaxError {
            pattern: self.text.into(),
            position,
            message: message.into(),
        }
    }

    pub(crate) fn expect(&mut self, c: char) -> Result<(), PatternSyntaxError> {
        if self.eat(c) {
            Ok(())
        } else {
            Err(self.error(&format!("expected {c:?}")))
        }
    }
}

/// What an escape sequence stands for.
pub(crate) enum Escape {
    Char(u32),
    Set(CharSet),
}

pub(crate) fn parse_char_set(text: &str) -> Result<CharSet, PatternSyntaxError> {
    let mut cur = Cursor::new(text);
    let set = match cur.peek() {
        None => return Err(cur.error("empty character set")),
        Some('[') => parse_class(&mut cur)?,
        Some('\\') => {
            cur.bump();
            match parse_escape(&mut cur)? {
                Escape::Char(c) => CharSet::from_ranges(RangeList::single(c)),
                Escape::Set(s) => s,
            }
        }
        Some(c) => {
            cur.bump();
            CharSet::from_char(c)
        }
    };
    if !cur.at_end() {
        return Err(cur.error("unexpected trailing characters"));
    }
    Ok(set)
}

/// Parses `[...]` with the cursor on the opening bracket.
pub(crate) fn parse_class(cur: &mut Cursor<'_>) -> Result<CharSet, PatternSyntaxError> {
    let open = cur.position();
    cur.expect('[')?;
    let negated = cur.eat('^');
    let mut set = CharSet::new();
    let mut items = 0;
    let mut excluded = None;
    loop {
        match cur.peek() {
            None => return Err(cur.error_at(open, "unterminated character class")),
            Some(']') => {
                cur.bump();
                break;
            }
            Some('-') if cur.peek_at(1) == Some('[') => {
                cur.bump();
                excluded = Some(parse_class(cur)?);
                if !cur.eat(']') {
                    return Err(cur.error("class subtraction must be the last item"));
                }
                break;
            }
            Some(_) => {}
        }
        let start = cur.position();
        let item = match parse_class_atom(cur)? {
            Escape::Char(lo) if cur.peek() == Some('-') && !matches!(cur.peek_at(1), Some(']' | '[')) => {
                cur.bump();
                let hi = match parse_class_atom(cur)? {
                    Escape::Char(hi) => hi,
                    Escape::Set(_) => return Err(cur.error("class escape cannot end a range")),
                };
                if hi < lo {
                    return Err(cur.error_at(start, "range out of order"));
                }
                CharSet::from_ranges(RangeList::from_pairs(&[(lo, hi)]))
            }
            Escape::Char(c) => CharSet::from_ranges(RangeList::single(c)),
            Escape::Set(s) => s,
        };
        set = set.union(&item);
        items += 1;
    }
    if items == 0 {
        return Err(cur.error_at(open, "empty character class"));
    }
    if negated {
        set = set.negate();
    }
    Ok(match excluded {
        Some(e) => set.subtract(&e),
        None => set,
    })
}

fn parse_class_atom(cur: &mut Cursor<'_>) -> Result<Escape, PatternSyntaxError> {
    match cur.bump() {
        None => Err(cur.error("unterminated character class")),
        Some('\\') => parse_escape(cur),
        Some(c) => Ok(Escape::Char(c as u32)),
    }
}

/// Parses an escape sequence; the backslash has already been consumed.
pub(crate) fn parse_escape(cur: &mut Cursor<'_>) -> Result<Escape, PatternSyntaxError> {
    let start = cur.position().saturating_sub(1);
    let Some(c) = cur.bump() else {
        return Err(cur.error_at(start, "dangling backslash"));
    };
    let ch = |c: char| Ok(Escape::Char(c as u32));
    match c {
        'n' => ch('\n'),
        'r' => ch('\r'),
        't' => ch('\t'),
        'f' => ch('\x0C'),
        'v' => ch('\x0B'),
        'a' => ch('\x07'),
        'e' => ch('\x1B'),
        '0' => ch('\0'),
        'x' => Ok(Escape::Char(hex_digits(cur, 2, start)?)),
        'u' => parse_unicode_escape(cur, start),
        'd' | 'D' | 'w' | 'W' | 's' | 'S' => {
            let set = shorthand_class(c.to_ascii_lowercase());
            Ok(Escape::Set(if c.is_ascii_uppercase() { set.negate() } else { set }))
        }
        'p' | 'P' => {
            let name: String = if cur.eat('{') {
                let mut name = String::new();
                loop {
                    match cur.bump() {
                        Some('}') => break,
                        Some(n) => name.push(n),
                        None => return Err(cur.error_at(start, "unterminated category name")),
                    }
                }
                name
            } else {
                match cur.bump() {
                    Some(n) => n.to_string(),
                    None => return Err(cur.error_at(start, "missing category name")),
                }
            };
            let Some(cats) = Categories::parse(name.trim()) else {
                return Err(cur.error_at(start, &format!("unknown category {name:?}")));
            };
            let set = CharSet::from_categories(cats);
            Ok(Escape::Set(if c == 'P' { set.negate() } else { set }))
        }
        c if c.is_ascii_punctuation() || c == ' ' => ch(c),
        _ => Err(cur.error_at(start, &format!("unknown escape \\{c}"))),
    }
}

fn parse_unicode_escape(cur: &mut Cursor<'_>, start: usize) -> Result<Escape, PatternSyntaxError> {
    if cur.eat('{') {
        let mut value: u32 = 0;
        let mut digits = 0;
        while let Some(d) = cur.peek().and_then(|c| c.to_digit(16)) {
            cur.bump();
            value = value.saturating_mul(16).saturating_add(d);
            digits += 1;
        }
        cur.expect('}')?;
        if digits == 0 || value > MAX_CODE_POINT {
            return Err(cur.error_at(start, "invalid code point"));
        }
        return Ok(Escape::Char(value));
    }
    let value = hex_digits(cur, 4, start)?;
    // A high surrogate escape directly followed by a low one denotes the pair.
    if (0xD800..LOW_SURROGATE_START).contains(&value)
        && cur.peek() == Some('\\')
        && cur.peek_at(1) == Some('u')
    {
        let save = cur.position();
        cur.bump();
        cur.bump();
        if let Ok(low) = hex_digits(cur, 4, start) {
            if (LOW_SURROGATE_START..=0xDFFF).contains(&low) {
                let cp = 0x10000 + ((value - 0xD800) << 10) + (low - LOW_SURROGATE_START);
                return Ok(Escape::Char(cp));
            }
        }
        cur.pos = save;
    }
    Ok(Escape::Char(value))
}

fn hex_digits(cur: &mut Cursor<'_>, count: usize, start: usize) -> Result<u32, PatternSyntaxError> {
    let mut value = 0;
    for _ in 0..count {
        match cur.bump().and_then(|c| c.to_digit(16)) {
            Some(d) => value = value * 16 + d,
            None => return Err(cur.error_at(start, "invalid hexadecimal escape")),
        }
    }
    Ok(value)
}

/// `\d`, `\w` and `\s` (lower-case letter selects the class).
fn shorthand_class(c: char) -> CharSet {
    match c {
        'd' => CharSet::from_categories(Category::DecimalNumber.into()),
        'w' => CharSet::from_categories(
            [
                Category::UppercaseLetter,
                Category::LowercaseLetter,
                Category::TitlecaseLetter,
                Category::ModifierLetter,
                Category::OtherLetter,
                Category::NonspacingMark,
                Category::DecimalNumber,
                Category::ConnectorPunctuation,
            ]
            .into_iter()
            .collect(),
        ),
        _ => CharSet::from_ranges(RangeList::from_pairs(&[
            (0x09, 0x0D),
            (0x20, 0x20),
            (0x85, 0x85),
            (0xA0, 0xA0),
        ]))
        .union(&CharSet::from_categories(
            [
                Category::SpaceSeparator,
                Category::LineSeparator,
                Category::ParagraphSeparator,
            ]
            .into_iter()
            .collect(),
        )),
    }
}
