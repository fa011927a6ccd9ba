//! Unicode general categories as a 30-flag bit set.

use super::range::{CodeRange, RangeList, MAX_CODE_POINT, SURROGATE_END, SURROGATE_START};
use once_cell::sync::Lazy;
use std::fmt;
use unicode_general_category::{get_general_category, GeneralCategory};

/// A Unicode general category.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(u8)]
pub enum Category {
    UppercaseLetter,
    LowercaseLetter,
    TitlecaseLetter,
    ModifierLetter,
    OtherLetter,
    NonspacingMark,
    SpacingMark,
    EnclosingMark,
    DecimalNumber,
    LetterNumber,
    OtherNumber,
    ConnectorPunctuation,
    DashPunctuation,
    OpenPunctuation,
    ClosePunctuation,
    InitialPunctuation,
    FinalPunctuation,
    OtherPunctuation,
    MathSymbol,
    CurrencySymbol,
    ModifierSymbol,
    OtherSymbol,
    SpaceSeparator,
    LineSeparator,
    ParagraphSeparator,
    Control,
    Format,
    Surrogate,
    PrivateUse,
    Unassigned,
}

impl Category {
    pub const COUNT: usize = 30;

    /// All categories in declaration order.
    pub const ALL: [Category; Category::COUNT] = [
        Category::UppercaseLetter,
        Category::LowercaseLetter,
        Category::TitlecaseLetter,
        Category::ModifierLetter,
        Category::OtherLetter,
        Category::NonspacingMark,
        Category::SpacingMark,
        Category::EnclosingMark,
        Category::DecimalNumber,
        Category::LetterNumber,
        Category::OtherNumber,
        Category::ConnectorPunctuation,
        Category::DashPunctuation,
        Category::OpenPunctuation,
        Category::ClosePunctuation,
        Category::InitialPunctuation,
        Category::FinalPunctuation,
        Category::OtherPunctuation,
        Category::MathSymbol,
        Category::CurrencySymbol,
        Category::ModifierSymbol,
        Category::OtherSymbol,
        Category::SpaceSeparator,
        Category::LineSeparator,
        Category::ParagraphSeparator,
        Category::Control,
        Category::Format,
        Category::Surrogate,
        Category::PrivateUse,
        Category::Unassigned,
    ];

    /// Two-letter abbreviation (`Lu`, `Nd`, ...).
    pub fn abbr(self) -> &'static str {
        ABBREVIATIONS[self as usize]
    }

    /// General category of a code point. Surrogate code points and values
    /// outside the code space map to `Surrogate` and `Unassigned`.
    pub fn of(cp: u32) -> Category {
        if (SURROGATE_START..=SURROGATE_END).contains(&cp) {
            return Category::Surrogate;
        }
        match char::from_u32(cp) {
            Some(c) => get_general_category(c).into(),
            None => Category::Unassigned,
        }
    }

    #[inline]
    pub fn bit(self) -> u32 {
        1 << (self as u8)
    }
}

const ABBREVIATIONS: [&str; Category::COUNT] = [
    "Lu", "Ll", "Lt", "Lm", "Lo", "Mn", "Mc", "Me", "Nd", "Nl", "No", "Pc", "Pd", "Ps", "Pe", "Pi",
    "Pf", "Po", "Sm", "Sc", "Sk", "So", "Zs", "Zl", "Zp", "Cc", "Cf", "Cs", "Co", "Cn",
];

const LONG_NAMES: [&str; Category::COUNT] = [
    "uppercaseletter",
    "lowercaseletter",
    "titlecaseletter",
    "modifierletter",
    "otherletter",
    "nonspacingmark",
    "spacingmark",
    "enclosingmark",
    "decimalnumber",
    "letternumber",
    "othernumber",
    "connectorpunctuation",
    "dashpunctuation",
    "openpunctuation",
    "closepunctuation",
    "initialpunctuation",
    "finalpunctuation",
    "otherpunctuation",
    "mathsymbol",
    "currencysymbol",
    "modifiersymbol",
    "othersymbol",
    "spaceseparator",
    "lineseparator",
    "paragraphseparator",
    "control",
    "format",
    "surrogate",
    "privateuse",
    "unassigned",
];

impl From<GeneralCategory> for Category {
    fn from(gc: GeneralCategory) -> Self {
        use GeneralCategory as G;
        #[allow(unreachable_patterns)]
        match gc {
            G::UppercaseLetter => Category::UppercaseLetter,
            G::LowercaseLetter => Category::LowercaseLetter,
            G::TitlecaseLetter => Category::TitlecaseLetter,
            G::ModifierLetter => Category::ModifierLetter,
            G::OtherLetter => Category::OtherLetter,
            G::NonspacingMark => Category::NonspacingMark,
            G::SpacingMark => Category::SpacingMark,
            G::EnclosingMark => Category::EnclosingMark,
            G::DecimalNumber => Category::DecimalNumber,
            G::LetterNumber => Category::LetterNumber,
            G::OtherNumber => Category::OtherNumber,
            G::ConnectorPunctuation => Category::ConnectorPunctuation,
            G::DashPunctuation => Category::DashPunctuation,
            G::OpenPunctuation => Category::OpenPunctuation,
            G::ClosePunctuation => Category::ClosePunctuation,
            G::InitialPunctuation => Category::InitialPunctuation,
            G::FinalPunctuation => Category::FinalPunctuation,
            G::OtherPunctuation => Category::OtherPunctuation,
            G::MathSymbol => Category::MathSymbol,
            G::CurrencySymbol => Category::CurrencySymbol,
            G::ModifierSymbol => Category::ModifierSymbol,
            G::OtherSymbol => Category::OtherSymbol,
            G::SpaceSeparator => Category::SpaceSeparator,
            G::LineSeparator => Category::LineSeparator,
            G::ParagraphSeparator => Category::ParagraphSeparator,
            G::Control => Category::Control,
            G::Format => Category::Format,
            G::Surrogate => Category::Surrogate,
            G::PrivateUse => Category::PrivateUse,
            G::Unassigned => Category::Unassigned,
            _ => Category::Unassigned,
        }
    }
}

/// A set of general categories.
#[derive(Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Categories(u32);

impl Categories {
    pub const EMPTY: Categories = Categories(0);
    pub const ALL: Categories = Categories((1 << Category::COUNT) - 1);
    /// `Lu`, `Ll` and `Lt`: the letters that have case variants.
    pub const CASED_LETTERS: Categories = Categories(0b111);

    pub fn of(cat: Category) -> Categories {
        Categories(cat.bit())
    }

    #[inline]
    pub fn contains(self, cat: Category) -> bool {
        self.0 & cat.bit() != 0
    }

    #[inline]
    pub fn is_empty(self) -> bool {
        self.0 == 0
    }

    pub fn is_all(self) -> bool {
        self == Self::ALL
    }

    pub fn len(self) -> usize {
        self.0.count_ones() as usize
    }

    pub fn insert(&mut self, cat: Category) {
        self.0 |= cat.bit();
    }

    pub fn remove(&mut self, cat: Category) {
        self.0 &= !cat.bit();
    }

    pub fn union(self, other: Categories) -> Categories {
        Categories(self.0 | other.0)
    }

    pub fn intersect(self, other: Categories) -> Categories {
        Categories(self.0 & other.0)
    }

    pub fn subtract(self, other: Categories) -> Categories {
        Categories(self.0 & !other.0)
    }

    pub fn negate(self) -> Categories {
        Categories(Self::ALL.0 & !self.0)
    }

    /// Any one of the cased letter categories implies all three.
    pub fn to_any_case(self) -> Categories {
        if self.0 & Self::CASED_LETTERS.0 != 0 {
            Categories(self.0 | Self::CASED_LETTERS.0)
        } else {
            self
        }
    }

    pub fn iter(self) -> impl Iterator<Item = Category> {
        Category::ALL.into_iter().filter(move |c| self.contains(*c))
    }

    /// Resolves a category name: a two-letter abbreviation (`Lu`), a
    /// one-letter group (`L`, `N`, ...), `LC`/`L&` for cased letters, or a
    /// long name (`UppercaseLetter`, `Letter`, ...). Long names ignore case,
    /// spaces, underscores and hyphens.
    pub fn parse(name: &str) -> Option<Categories> {
        if let Some(i) = ABBREVIATIONS.iter().position(|a| *a == name) {
            return Some(Categories::of(Category::ALL[i]));
        }
        let group = |range: std::ops::RangeInclusive<usize>| {
            Some(range.map(|i| Category::ALL[i]).collect::<Categories>())
        };
        match name {
            "L" => return group(0..=4),
            "LC" | "L&" => return Some(Self::CASED_LETTERS),
            "M" => return group(5..=7),
            "N" => return group(8..=10),
            "P" => return group(11..=17),
            "S" => return group(18..=21),
            "Z" => return group(22..=24),
            "C" => return group(25..=29),
            _ => {}
        }
        let key: String = name
            .chars()
            .filter(|c| !matches!(c, ' ' | '_' | '-'))
            .flat_map(char::to_lowercase)
            .collect();
        if let Some(i) = LONG_NAMES.iter().position(|n| *n == key) {
            return Some(Categories::of(Category::ALL[i]));
        }
        match key.as_str() {
            "letter" => group(0..=4),
            "casedletter" => Some(Self::CASED_LETTERS),
            "mark" => group(5..=7),
            "number" => group(8..=10),
            "punctuation" => group(11..=17),
            "symbol" => group(18..=21),
            "separator" => group(22..=24),
            "other" => group(25..=29),
            _ => None,
        }
    }
}

impl From<Category> for Categories {
    fn from(cat: Category) -> Self {
        Categories::of(cat)
    }
}

impl FromIterator<Category> for Categories {
    fn from_iter<I: IntoIterator<Item = Category>>(iter: I) -> Self {
        let mut set = Categories::EMPTY;
        for c in iter {
            set.insert(c);
        }
        set
    }
}

impl fmt::Debug for Categories {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}

impl fmt::Display for Categories {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_all() {
            return write!(f, "*");
        }
        let names: Vec<&str> = self.iter().map(Category::abbr).collect();
        write!(f, "{}", names.join("|"))
    }
}

/// Code point ranges of every category, computed once by a full scan of the
/// code space.
static CATEGORY_RANGES: Lazy<Vec<RangeList>> = Lazy::new(|| {
    let mut runs: Vec<Vec<CodeRange>> = vec![Vec::new(); Category::COUNT];
    let mut start = 0;
    let mut current = Category::of(0);
    for cp in 1..=MAX_CODE_POINT {
        let cat = Category::of(cp);
        if cat != current {
            runs[current as usize].push(CodeRange::new(start, cp - 1));
            start = cp;
            current = cat;
        }
    }
    runs[current as usize].push(CodeRange::new(start, MAX_CODE_POINT));
    log::debug!("category range tables built");
    runs.into_iter().map(RangeList::from_ranges).collect()
});

/// Every code point whose general category is in `cats`.
pub fn category_ranges(cats: Categories) -> RangeList {
    cats.iter().fold(RangeList::new(), |acc, c| {
        acc.union(&CATEGORY_RANGES[c as usize])
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classifies_code_points() {
        assert_eq!(Category::of('A' as u32), Category::UppercaseLetter);
        assert_eq!(Category::of('z' as u32), Category::LowercaseLetter);
        assert_eq!(Category::of('7' as u32), Category::DecimalNumber);
        assert_eq!(Category::of(' ' as u32), Category::SpaceSeparator);
        assert_eq!(Category::of(0xD800), Category::Surrogate);
        assert_eq!(Category::of(0x1D400), Category::UppercaseLetter);
    }

    #[test]
    fn parses_names() {
        assert_eq!(
            Categories::parse("Lu"),
            Some(Categories::of(Category::UppercaseLetter))
        );
        assert_eq!(Categories::parse("L").map(|c| c.len()), Some(5));
        assert_eq!(Categories::parse("Letter"), Categories::parse("L"));
        assert_eq!(
            Categories::parse("decimal_number"),
            Categories::parse("Nd")
        );
        assert_eq!(Categories::parse("LC"), Some(Categories::CASED_LETTERS));
        assert_eq!(Categories::parse("Xx"), None);
    }

    #[test]
    fn set_algebra() {
        let lu = Categories::of(Category::UppercaseLetter);
        let nd = Categories::of(Category::DecimalNumber);
        let both = lu.union(nd);
        assert_eq!(both.len(), 2);
        assert_eq!(both.intersect(lu), lu);
        assert_eq!(both.subtract(lu), nd);
        assert_eq!(both.negate().negate(), both);
        assert_eq!(Categories::EMPTY.negate(), Categories::ALL);
        assert_eq!(lu.negate().len(), Category::COUNT - 1);
    }

    #[test]
    fn any_case_closure() {
        let ll = Categories::of(Category::LowercaseLetter);
        assert_eq!(ll.to_any_case(), Categories::CASED_LETTERS);
        let nd = Categories::of(Category::DecimalNumber);
        assert_eq!(nd.to_any_case(), nd);
    }

    #[test]
    fn range_tables_agree_with_lookup() {
        let nd = category_ranges(Categories::of(Category::DecimalNumber));
        assert!(nd.contains('5' as u32));
        assert!(nd.contains(0x1D7CE));
        assert!(!nd.contains('x' as u32));
        let cs = category_ranges(Categories::of(Category::Surrogate));
        assert_eq!(cs, RangeList::surrogates());
    }
}
