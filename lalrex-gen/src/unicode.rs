//! Unicode substrate: code point range algebra and general categories.

pub mod category;
pub mod range;

pub use category::{category_ranges, Categories, Category};
pub use range::{
    CodeRange, RangeList, LOW_SURROGATE_START, MAX_CODE_POINT, SUPPLEMENTARY_START,
    SURROGATE_END, SURROGATE_START,
};

/// High and low surrogate units of a supplementary code point.
#[inline]
pub fn split_surrogates(cp: u32) -> (u32, u32) {
    debug_assert!(cp >= SUPPLEMENTARY_START);
    let v = cp - SUPPLEMENTARY_START;
    (SURROGATE_START + (v >> 10), LOW_SURROGATE_START + (v & 0x3FF))
}
