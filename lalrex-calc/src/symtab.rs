//! # symtab
//!
//! Variables of a calculator session, built on [`indexmap::IndexMap`].
//!
//! Names are interned when the scanner first sees them, so each variable
//! has a stable index from then on. A variable has no value until it is
//! assigned; reading it before that is an error.
//!
//! ## Example
//! ```rust
//! # use lalrex_calc::SymTab;
//! let mut st = SymTab::new();
//! let i = st.intern("foo");
//! assert!(st.get(i).is_err());
//! st.set(i, 42).unwrap();
//! assert_eq!(st.get(i).unwrap(), 42);
//! assert_eq!(st.intern("foo"), i);
//! assert_eq!(st.lookup("foo"), Some(42));
//! ```

use indexmap::{IndexMap, map::Entry};
use smartstring::alias::String;
use thiserror::Error;

/// Errors that can occur when operating on a [`SymTab`].
#[derive(Debug, Error)]
pub enum SymTabError {
    #[error("invalid symbol index {index} (table length {len})")]
    InvalidIndex { index: usize, len: usize },

    #[error("variable {name:?} is used before it is assigned")]
    Unassigned { name: String },
}

#[derive(Debug, Default, Clone)]
pub struct SymTab {
    tab: IndexMap<String, Option<i64>>,
}

impl SymTab {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.tab.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tab.is_empty()
    }

    /// Returns the index of `name`, adding it unassigned if it is new.
    pub fn intern(&mut self, name: impl AsRef<str>) -> usize {
        match self.tab.entry(String::from(name.as_ref())) {
            Entry::Occupied(o) => o.index(),
            Entry::Vacant(v) => v.insert_entry(None).index(),
        }
    }

    pub fn set(&mut self, index: usize, new_value: i64) -> Result<(), SymTabError> {
        let len = self.tab.len();
        let (_, value) = self
            .tab
            .get_index_mut(index)
            .ok_or(SymTabError::InvalidIndex { index, len })?;
        *value = Some(new_value);
        Ok(())
    }

    pub fn get(&self, index: usize) -> Result<i64, SymTabError> {
        let (name, value) = self.tab.get_index(index).ok_or(SymTabError::InvalidIndex {
            index,
            len: self.tab.len(),
        })?;
        value.ok_or_else(|| SymTabError::Unassigned { name: name.clone() })
    }

    /// Value of `name`, if it exists and is assigned.
    pub fn lookup(&self, name: &str) -> Option<i64> {
        self.tab.get(name).copied().flatten()
    }

    /// Assigned variables in order of first appearance.
    pub fn iter(&self) -> impl Iterator<Item = (&str, i64)> {
        self.tab
            .iter()
            .filter_map(|(name, value)| value.map(|v| (name.as_str(), v)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn intern_assigns_sequential_indices() {
        let mut st = SymTab::new();
        assert!(st.is_empty());
        let a = st.intern("a");
        let b = st.intern("b");
        let c = st.intern("c");
        assert_eq!((a, b, c), (0, 1, 2));
        assert_eq!(st.len(), 3);
        assert_eq!(st.intern("b"), 1);
    }

    #[test]
    fn re_intern_preserves_value() {
        let mut st = SymTab::new();
        let i = st.intern("x");
        st.set(i, 42).unwrap();
        assert_eq!(st.intern("x"), i);
        assert_eq!(st.get(i).unwrap(), 42);
    }

    #[test]
    fn unassigned_and_invalid_reads_fail() {
        let mut st = SymTab::new();
        let i = st.intern("later");
        match st.get(i) {
            Err(SymTabError::Unassigned { name }) => assert_eq!(name.as_str(), "later"),
            other => panic!("expected Unassigned, got {:?}", other),
        }
        match st.get(5) {
            Err(SymTabError::InvalidIndex { index, len }) => assert_eq!((index, len), (5, 1)),
            other => panic!("expected InvalidIndex, got {:?}", other),
        }
        assert!(matches!(st.set(9, 1), Err(SymTabError::InvalidIndex { .. })));
        assert_eq!(st.lookup("later"), None);
        assert_eq!(st.lookup("nothing"), None);
    }

    #[test]
    fn iter_skips_unassigned() {
        let mut st = SymTab::new();
        let a = st.intern("a");
        st.intern("b");
        let c = st.intern("c");
        st.set(c, 3).unwrap();
        st.set(a, 1).unwrap();
        let vars: Vec<_> = st.iter().collect();
        assert_eq!(vars, [("a", 1), ("c", 3)]);
    }
}
