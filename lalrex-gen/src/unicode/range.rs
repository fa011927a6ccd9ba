//! Code point ranges and the set algebra over sorted, disjoint range lists.
//!
//! A [`RangeList`] is always kept in normal form: ranges are strictly
//! ascending, never overlap and never touch (adjacent ranges are merged).
//! Every operation returns a new list in normal form, so equality of two
//! lists is equality of the code point sets they denote.

use std::fmt;

/// The highest Unicode code point.
pub const MAX_CODE_POINT: u32 = 0x10FFFF;

/// First UTF-16 surrogate code unit (first high surrogate).
pub const SURROGATE_START: u32 = 0xD800;

/// First low surrogate code unit.
pub const LOW_SURROGATE_START: u32 = 0xDC00;

/// Last UTF-16 surrogate code unit (last low surrogate).
pub const SURROGATE_END: u32 = 0xDFFF;

/// First code point outside the Basic Multilingual Plane.
pub const SUPPLEMENTARY_START: u32 = 0x10000;

/// Highest code point that has a simple case mapping.
const CASED_LIMIT: u32 = 0x1E943;

/// An inclusive range of code points (or UTF-16 code units).
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct CodeRange {
    /// First code point in the range.
    pub start: u32,
    /// Last code point in the range (inclusive).
    pub end: u32,
}

impl CodeRange {
    /// Creates a new range; `start` must not exceed `end`.
    #[inline]
    pub const fn new(start: u32, end: u32) -> Self {
        debug_assert!(start <= end);
        Self { start, end }
    }

    /// A range holding a single code point.
    #[inline]
    pub const fn single(c: u32) -> Self {
        Self { start: c, end: c }
    }

    #[inline]
    pub fn contains(&self, c: u32) -> bool {
        self.start <= c && c <= self.end
    }

    /// Number of code points covered by this range.
    #[inline]
    pub fn count(&self) -> u32 {
        self.end - self.start + 1
    }
}

impl fmt::Display for CodeRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.start == self.end {
            write!(f, "U+{:04X}", self.start)
        } else {
            write!(f, "U+{:04X}-U+{:04X}", self.start, self.end)
        }
    }
}

/// A normalized list of code point ranges.
#[derive(Clone, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RangeList {
    ranges: Vec<CodeRange>,
}

impl RangeList {
    /// The empty set.
    pub const fn new() -> Self {
        Self { ranges: Vec::new() }
    }

    /// Every code point except the surrogate gap `U+D800..=U+DFFF`.
    ///
    /// This is the universe [`RangeList::negate`] complements against:
    /// code points above `U+FFFF` are reached through surrogate pairs, so
    /// the surrogate units themselves never denote characters.
    pub fn all() -> Self {
        Self {
            ranges: vec![
                CodeRange::new(0, SURROGATE_START - 1),
                CodeRange::new(SURROGATE_END + 1, MAX_CODE_POINT),
            ],
        }
    }

    /// The surrogate gap itself.
    pub fn surrogates() -> Self {
        Self {
            ranges: vec![CodeRange::new(SURROGATE_START, SURROGATE_END)],
        }
    }

    /// Builds a normalized list from arbitrary, possibly overlapping ranges.
    pub fn from_ranges<I: IntoIterator<Item = CodeRange>>(ranges: I) -> Self {
        let mut ranges: Vec<CodeRange> = ranges.into_iter().collect();
        ranges.sort_unstable();
        let mut out: Vec<CodeRange> = Vec::with_capacity(ranges.len());
        for r in ranges {
            match out.last_mut() {
                Some(last) if r.start <= last.end.saturating_add(1) => {
                    last.end = last.end.max(r.end);
                }
                _ => out.push(r),
            }
        }
        Self { ranges: out }
    }

    /// Convenience constructor from `(start, end)` pairs.
    pub fn from_pairs(pairs: &[(u32, u32)]) -> Self {
        Self::from_ranges(pairs.iter().map(|&(s, e)| CodeRange::new(s, e)))
    }

    pub fn single(c: u32) -> Self {
        Self {
            ranges: vec![CodeRange::single(c)],
        }
    }

    pub fn is_empty(&self) -> bool {
        self.ranges.is_empty()
    }

    pub fn ranges(&self) -> &[CodeRange] {
        &self.ranges
    }

    pub fn iter(&self) -> impl Iterator<Item = &CodeRange> {
        self.ranges.iter()
    }

    /// Returns `true` if `c` lies in one of the ranges.
    pub fn contains(&self, c: u32) -> bool {
        let idx = self.ranges.partition_point(|r| r.end < c);
        self.ranges.get(idx).is_some_and(|r| r.start <= c)
    }

    /// Total number of code points in the set.
    pub fn count(&self) -> u64 {
        self.ranges.iter().map(|r| u64::from(r.count())).sum()
    }

    pub fn union(&self, other: &RangeList) -> RangeList {
        Self::from_ranges(self.ranges.iter().chain(other.ranges.iter()).copied())
    }

    pub fn intersect(&self, other: &RangeList) -> RangeList {
        let (a, b) = (&self.ranges, &other.ranges);
        let (mut i, mut j) = (0, 0);
        let mut out = Vec::new();
        while i < a.len() && j < b.len() {
            let lo = a[i].start.max(b[j].start);
            let hi = a[i].end.min(b[j].end);
            if lo <= hi {
                out.push(CodeRange::new(lo, hi));
            }
            if a[i].end < b[j].end {
                i += 1;
            } else {
                j += 1;
            }
        }
        Self { ranges: out }
    }

    pub fn subtract(&self, other: &RangeList) -> RangeList {
        let b = &other.ranges;
        let mut out = Vec::new();
        let mut j = 0;
        for r in &self.ranges {
            while j < b.len() && b[j].end < r.start {
                j += 1;
            }
            let mut start = r.start;
            let mut alive = true;
            let mut k = j;
            while k < b.len() && b[k].start <= r.end {
                let o = b[k];
                if o.start > start {
                    out.push(CodeRange::new(start, o.start - 1));
                }
                if o.end >= r.end {
                    alive = false;
                    break;
                }
                start = start.max(o.end + 1);
                k += 1;
            }
            if alive {
                out.push(CodeRange::new(start, r.end));
            }
        }
        Self { ranges: out }
    }

    /// Complement relative to [`RangeList::all`].
    ///
    /// `x.negate().negate()` equals `x` minus the surrogate gap.
    pub fn negate(&self) -> RangeList {
        Self::all().subtract(self)
    }

    /// Restricts the set to `[start, end]`.
    pub fn clamp_to(&self, start: u32, end: u32) -> RangeList {
        self.intersect(&Self {
            ranges: vec![CodeRange::new(start, end)],
        })
    }

    /// Adds the simple upper- and lower-case counterparts of every member.
    pub fn to_any_case(&self) -> RangeList {
        let mut extra = Vec::new();
        for r in &self.ranges {
            if r.start > CASED_LIMIT {
                break;
            }
            for cp in r.start..=r.end.min(CASED_LIMIT) {
                let Some(c) = char::from_u32(cp) else {
                    continue;
                };
                for mapped in [single_char(c.to_lowercase()), single_char(c.to_uppercase())]
                    .into_iter()
                    .flatten()
                {
                    if mapped != c {
                        extra.push(CodeRange::single(mapped as u32));
                    }
                }
            }
        }
        if extra.is_empty() {
            return self.clone();
        }
        Self::from_ranges(self.ranges.iter().copied().chain(extra))
    }
}

fn single_char<I: Iterator<Item = char>>(mut it: I) -> Option<char> {
    match (it.next(), it.next()) {
        (Some(c), None) => Some(c),
        _ => None,
    }
}

impl FromIterator<CodeRange> for RangeList {
    fn from_iter<I: IntoIterator<Item = CodeRange>>(iter: I) -> Self {
        Self::from_ranges(iter)
    }
}

impl fmt::Display for RangeList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{")?;
        for (i, r) in self.ranges.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}", r)?;
        }
        write!(f, "}}")
    }
}
