//! Character sets: code point ranges plus general categories, minus an
//! optional nested exclusion.
//!
//! A [`CharSet`] denotes `(ranges ∪ categories) − excluded`, where the
//! excluded part is itself a `CharSet` and so can carry its own exclusion.
//! This is what class subtraction in the textual notation produces:
//!
//! ```text
//! [\p{L}-[\u{10000}-\u{10FFFF}]]     any letter except supplementary-plane letters
//! [a-z-[aeiou]]                      consonants
//! [^\s]                              anything but whitespace
//! ```
//!
//! The algebra is exact. Operations stay symbolic where a closed form exists
//! and fall back to explicit ranges (through the category range tables)
//! otherwise.

pub(crate) mod parse;

use crate::error::PatternSyntaxError;
use crate::unicode::{
    category_ranges, Categories, Category, CodeRange, RangeList, MAX_CODE_POINT,
    SUPPLEMENTARY_START,
};
use std::fmt;

#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct CharSet {
    ranges: RangeList,
    categories: Categories,
    excluded: Option<Box<CharSet>>,
}

impl CharSet {
    /// The empty set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Every character (the surrogate gap excluded).
    pub fn any() -> Self {
        Self::from_categories(Self::every_category())
    }

    pub fn from_char(c: char) -> Self {
        Self::from_ranges(RangeList::single(c as u32))
    }

    pub fn from_range(start: char, end: char) -> Self {
        Self::from_ranges(RangeList::from_pairs(&[(start as u32, end as u32)]))
    }

    pub fn from_ranges(ranges: RangeList) -> Self {
        Self {
            ranges,
            categories: Categories::EMPTY,
            excluded: None,
        }
    }

    pub fn from_categories(categories: Categories) -> Self {
        Self {
            ranges: RangeList::new(),
            categories,
            excluded: None,
        }
    }

    /// Parses the compact notation: a single character, an escape such as
    /// `\d` or `\p{Lu}`, or a bracketed class `[...]`.
    pub fn parse(text: &str) -> Result<CharSet, PatternSyntaxError> {
        parse::parse_char_set(text)
    }

    pub fn ranges(&self) -> &RangeList {
        &self.ranges
    }

    pub fn categories(&self) -> Categories {
        self.categories
    }

    pub fn excluded(&self) -> Option<&CharSet> {
        self.excluded.as_deref()
    }

    /// `true` when the set has no positive part (it may still carry an
    /// exclusion, which is then irrelevant).
    pub fn is_empty(&self) -> bool {
        self.ranges.is_empty() && self.categories.is_empty()
    }

    pub fn contains(&self, cp: u32) -> bool {
        (self.ranges.contains(cp) || self.categories.contains(Category::of(cp)))
            && !self.excluded.as_ref().is_some_and(|e| e.contains(cp))
    }

    pub fn contains_char(&self, c: char) -> bool {
        self.contains(c as u32)
    }

    pub fn union(&self, other: &CharSet) -> CharSet {
        match (&self.excluded, &other.excluded) {
            (None, None) => CharSet {
                ranges: self.ranges.union(&other.ranges),
                categories: self.categories.union(other.categories),
                excluded: None,
            },
            // (P − E) ∪ Q == (P ∪ Q) − (E − Q)
            (Some(e), None) => self.positive().union(other).minus(e.subtract(other)),
            (None, Some(f)) => other.positive().union(self).minus(f.subtract(self)),
            (Some(_), Some(_)) => CharSet::from_ranges(self.flatten().union(&other.flatten())),
        }
    }

    pub fn intersect(&self, other: &CharSet) -> CharSet {
        // (R1 ∪ C1) ∩ (R2 ∪ C2) == R1∩R2 ∪ R1∩C2 ∪ C1∩R2 ∪ C1∩C2
        let mut ranges = self.ranges.intersect(&other.ranges);
        if !other.categories.is_empty() {
            ranges = ranges.union(&self.ranges.intersect(&category_ranges(other.categories)));
        }
        if !self.categories.is_empty() {
            ranges = ranges.union(&other.ranges.intersect(&category_ranges(self.categories)));
        }
        let base = CharSet {
            ranges,
            categories: self.categories.intersect(other.categories),
            excluded: None,
        };
        match (&self.excluded, &other.excluded) {
            (None, None) => base,
            (Some(e), None) | (None, Some(e)) => base.minus((**e).clone()),
            (Some(e), Some(f)) => base.minus(e.union(f)),
        }
    }

    pub fn subtract(&self, other: &CharSet) -> CharSet {
        if other.is_empty() {
            return self.clone();
        }
        match &self.excluded {
            None => self.clone().minus(other.clone()),
            Some(e) => self.positive().minus(e.union(other)),
        }
    }

    /// Complement relative to all code points outside the surrogate gap.
    pub fn negate(&self) -> CharSet {
        if self.excluded.is_some() {
            return CharSet::from_ranges(self.flatten().negate());
        }
        // Surrogate code points are only ever reached through the Cs category.
        let categories = self.categories.negate().intersect(Self::every_category());
        let complement = CharSet::from_categories(categories);
        if self.ranges.is_empty() {
            complement
        } else {
            complement.minus(CharSet::from_ranges(self.ranges.clone()))
        }
    }

    /// Case-insensitive closure of ranges, categories and exclusion.
    pub fn to_any_case(&self) -> CharSet {
        CharSet {
            ranges: self.ranges.to_any_case(),
            categories: self.categories.to_any_case(),
            excluded: self.excluded.as_ref().map(|e| Box::new(e.to_any_case())),
        }
    }

    /// Every member as explicit ranges.
    pub fn flatten(&self) -> RangeList {
        let mut ranges = self.ranges.clone();
        if !self.categories.is_empty() {
            ranges = ranges.union(&category_ranges(self.categories));
        }
        match &self.excluded {
            Some(e) => ranges.subtract(&e.flatten()),
            None => ranges,
        }
    }

    /// Members above `U+FFFF`, as explicit ranges.
    pub fn supplementary(&self) -> RangeList {
        self.flatten().clamp_to(SUPPLEMENTARY_START, MAX_CODE_POINT)
    }

    /// The part addressable by a single UTF-16 unit: ranges clamped to the
    /// BMP without the surrogate gap, categories without `Cs`.
    pub(crate) fn to_bmp(&self) -> CharSet {
        let ranges = self
            .ranges
            .clamp_to(0, SUPPLEMENTARY_START - 1)
            .subtract(&RangeList::surrogates());
        CharSet {
            ranges,
            categories: self.categories.intersect(Self::every_category()),
            excluded: self.excluded.as_ref().map(|e| Box::new(e.to_bmp())),
        }
        .normalized()
    }

    fn every_category() -> Categories {
        let mut cats = Categories::ALL;
        cats.remove(Category::Surrogate);
        cats
    }

    fn normalized(mut self) -> CharSet {
        if self.excluded.as_ref().is_some_and(|e| e.is_empty()) {
            self.excluded = None;
        }
        self
    }

    fn positive(&self) -> CharSet {
        CharSet {
            ranges: self.ranges.clone(),
            categories: self.categories,
            excluded: None,
        }
    }

    fn minus(mut self, excluded: CharSet) -> CharSet {
        if excluded.is_empty() {
            self.excluded = None;
        } else {
            self.excluded = Some(Box::new(excluded));
        }
        self
    }
}

impl From<char> for CharSet {
    fn from(c: char) -> Self {
        CharSet::from_char(c)
    }
}

impl From<CodeRange> for CharSet {
    fn from(r: CodeRange) -> Self {
        CharSet::from_ranges(RangeList::from_ranges([r]))
    }
}

impl fmt::Display for CharSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[")?;
        for (i, r) in self.ranges.iter().enumerate() {
            if i > 0 {
                write!(f, " ")?;
            }
            write!(f, "{}", r)?;
        }
        if !self.categories.is_empty() {
            if !self.ranges.is_empty() {
                write!(f, " ")?;
            }
            write!(f, "\\p{{{}}}", self.categories)?;
        }
        if let Some(e) = &self.excluded {
            write!(f, "-{}", e)?;
        }
        write!(f, "]")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn set(text: &str) -> CharSet {
        CharSet::parse(text).unwrap()
    }

    #[test]
    fn parses_ranges_and_categories() {
        let s = set("[a-z_\\p{Lu}]");
        assert!(s.contains_char('q'));
        assert!(s.contains_char('_'));
        assert!(s.contains_char('Q'));
        assert!(!s.contains_char('7'));
    }

    #[test]
    fn parses_hex_code_points() {
        let s = set("[\\x41-\\u005A\\u{1F600}-\\u{1F64F}]");
        assert!(s.contains_char('M'));
        assert!(s.contains(0x1F600));
        assert!(!s.contains(0x1F650));
    }

    #[test]
    fn nested_exclusion_chain() {
        let letters_bmp = set("[\\p{L}-[\\u{10000}-\\u{10FFFF}]]");
        assert!(letters_bmp.contains_char('é'));
        assert!(!letters_bmp.contains(0x1D400));

        let s = set("[a-z-[d-w-[m-o]]]");
        assert!(s.contains_char('a'));
        assert!(!s.contains_char('e'));
        assert!(s.contains_char('n'));
        assert!(s.contains_char('z'));
    }

    #[test]
    fn negated_class() {
        let s = set("[^\\s]");
        assert!(s.contains_char('x'));
        assert!(!s.contains_char(' '));
        assert!(!s.contains_char('\n'));
        assert!(!s.contains(0xD800));
    }

    #[test]
    fn single_escapes_and_chars() {
        assert!(set("\\d").contains_char('3'));
        assert!(set("x").contains_char('x'));
        assert!(set("\\P{L}").contains_char('1'));
        assert!(!set("\\P{L}").contains_char('a'));
    }

    #[test]
    fn syntax_errors() {
        for bad in ["[a-", "[]", "[z-a]", "\\p{Nope}", "[\\q]", "ab", "[a-[b]x]", "\\u{110000}"] {
            let err = CharSet::parse(bad).unwrap_err();
            assert_eq!(err.pattern.as_str(), bad);
        }
    }

    #[test]
    fn algebra_is_exact() {
        let a = set("[\\p{Lu}0-9-[A-C]]");
        let b = set("[B-F\\p{Nd}-[5]]");
        let u = a.union(&b);
        let i = a.intersect(&b);
        let d = a.subtract(&b);
        let n = a.negate();
        for cp in ['A', 'B', 'D', 'G', '0', '5', 'x', '٣', 'Ω'] {
            let (x, y) = (a.contains_char(cp), b.contains_char(cp));
            assert_eq!(u.contains_char(cp), x || y, "union at {cp}");
            assert_eq!(i.contains_char(cp), x && y, "intersect at {cp}");
            assert_eq!(d.contains_char(cp), x && !y, "subtract at {cp}");
            assert_eq!(n.contains_char(cp), !x, "negate at {cp}");
        }
    }

    #[test]
    fn any_case_closes_exclusions_too() {
        let s = set("[a-z-[aeiou]]").to_any_case();
        assert!(s.contains_char('B'));
        assert!(!s.contains_char('E'));
    }

    #[test]
    fn negation_stays_symbolic() {
        let s = set("[^a-f]");
        assert!(s.ranges().is_empty());
        assert!(!s.categories().contains(Category::Surrogate));
        assert!(s.excluded().is_some());
        assert!(s.contains(0x1F600));
        assert!(!s.contains_char('c'));
    }

    #[test]
    fn bmp_part_drops_surrogates() {
        let s = set("[\\u{10000}-\\u{10FFFF}a]").union(&CharSet::any()).to_bmp();
        assert!(s.contains_char('a'));
        assert!(!s.contains(0xDC00));
        assert!(s.ranges().iter().all(|r| r.end < SUPPLEMENTARY_START));
    }

    #[test]
    fn supplementary_part_keeps_only_astral_ranges() {
        let s = set("[a\\u{1F600}-\\u{1F64F}]");
        let astral = s.supplementary();
        assert!(astral.contains(0x1F600) && astral.contains(0x1F64F));
        assert!(!astral.contains('a' as u32));
        assert_eq!(astral.ranges().len(), 1);
    }

    #[test]
    fn flatten_matches_membership() {
        let s = set("[\\p{Nd}-[0-4]]");
        let flat = s.flatten();
        assert!(flat.contains('7' as u32));
        assert!(!flat.contains('3' as u32));
        assert!(flat.contains(0x0663));
    }
}
