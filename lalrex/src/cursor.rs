//! Source positions and line tracking over a stream whose history is
//! discarded as it is consumed.

/// A 1-based line/column position in source text. Columns count UTF-16
/// code units.
#[derive(Debug, Clone, Default, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Position {
    pub line: usize,
    pub column: usize,
}

impl Position {
    #[inline]
    pub const fn new(line: usize, column: usize) -> Self {
        Self { line, column }
    }
}

impl std::fmt::Display for Position {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

/// Maps absolute unit offsets to line/column positions.
///
/// Line starts are recorded as units arrive. Records that can no longer be
/// asked about are dropped with [`discard_before`](Self::discard_before);
/// their count is kept in `line_offset` so line numbers stay absolute.
#[derive(Debug, Clone)]
pub struct LineCounter {
    /// Absolute offsets of retained line starts, ascending; never empty.
    line_starts: Vec<usize>,
    /// Lines dropped from the front of `line_starts`.
    line_offset: usize,
    /// Offset just past the last observed `\r`, while it is the last unit seen.
    after_cr: Option<usize>,
}

/// Line feed, carriage return, line separator and paragraph separator.
pub(crate) fn is_line_break(u: u16) -> bool {
    matches!(u, 0x0A | 0x0D | 0x2028 | 0x2029)
}

impl Default for LineCounter {
    fn default() -> Self {
        Self::new()
    }
}

impl LineCounter {
    pub fn new() -> Self {
        Self {
            line_starts: vec![0],
            line_offset: 0,
            after_cr: None,
        }
    }

    /// Records the line breaks in `units`, which start at absolute offset
    /// `base`. `\r\n` is one break, also when split between calls.
    pub fn observe(&mut self, base: usize, units: &[u16]) {
        for (i, u) in units.iter().enumerate() {
            let pos = base + i;
            let after_cr = self.after_cr.take();
            if *u == 0x0A && after_cr == Some(pos) {
                if let Some(last) = self.line_starts.last_mut() {
                    *last = pos + 1;
                }
            } else if is_line_break(*u) {
                self.line_starts.push(pos + 1);
                if *u == 0x0D {
                    self.after_cr = Some(pos + 1);
                }
            }
        }
    }

    /// Drops line starts that no offset at or after `pos` can refer to.
    pub fn discard_before(&mut self, pos: usize) {
        let keep_from = self.line_starts.partition_point(|s| *s <= pos).saturating_sub(1);
        if keep_from > 0 {
            self.line_starts.drain(..keep_from);
            self.line_offset += keep_from;
        }
    }

    /// Position of absolute offset `pos`, or `None` if that part of the
    /// history was discarded.
    pub fn location(&self, pos: usize) -> Option<Position> {
        let idx = self.line_starts.partition_point(|s| *s <= pos).checked_sub(1)?;
        Some(Position::new(
            self.line_offset + idx + 1,
            pos - self.line_starts[idx] + 1,
        ))
    }

    /// Number of line starts currently retained.
    pub fn retained(&self) -> usize {
        self.line_starts.len()
    }
}
