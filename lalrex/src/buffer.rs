//! The streaming window the scanner reads from.

/// A growable window of UTF-16 code units over a longer stream.
///
/// `data[start..len]` is the pending input: units received but not yet
/// consumed by a completed lexeme. Refilling moves the pending part to the
/// front, so a lexeme in progress is never split, and doubles the window
/// when the pending part fills more than half of it. `base` is the absolute
/// offset of `data[0]`.
#[derive(Debug, Clone)]
pub struct CharBuffer {
    data: Vec<u16>,
    len: usize,
    start: usize,
    base: usize,
    at_end: bool,
    shifts: usize,
}

impl CharBuffer {
    /// An empty window; a capacity of zero is raised to one.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            data: vec![0; capacity.max(1)],
            len: 0,
            start: 0,
            base: 0,
            at_end: false,
            shifts: 0,
        }
    }

    /// A window holding the whole input.
    pub fn from_units(units: Vec<u16>) -> Self {
        let len = units.len();
        let data = if units.is_empty() { vec![0] } else { units };
        Self {
            data,
            len,
            start: 0,
            base: 0,
            at_end: true,
            shifts: 0,
        }
    }

    #[inline]
    pub fn pending(&self) -> &[u16] {
        &self.data[self.start..self.len]
    }

    /// Absolute offset of the first pending unit.
    #[inline]
    pub fn position(&self) -> usize {
        self.base + self.start
    }

    #[inline]
    pub fn at_end(&self) -> bool {
        self.at_end
    }

    pub fn capacity(&self) -> usize {
        self.data.len()
    }

    /// Number of times pending input was moved to the front.
    pub fn shifts(&self) -> usize {
        self.shifts
    }

    /// Marks `n` pending units as consumed.
    pub fn consume(&mut self, n: usize) {
        debug_assert!(n <= self.len - self.start);
        self.start += n;
    }

    /// Makes room for more input and returns the free tail. Never empty.
    pub fn prepare_fill(&mut self) -> &mut [u16] {
        if self.len == self.data.len() {
            if self.start > 0 {
                self.data.copy_within(self.start..self.len, 0);
                self.len -= self.start;
                self.base += self.start;
                self.start = 0;
                self.shifts += 1;
            }
            if self.len * 2 > self.data.len() {
                let cap = self.data.len() * 2;
                log::trace!("growing buffer to {} units", cap);
                self.data.resize(cap, 0);
            }
        }
        &mut self.data[self.len..]
    }

    /// Accepts `n` units written into the tail from [`prepare_fill`](Self::prepare_fill);
    /// zero marks the end of the stream.
    pub fn commit(&mut self, n: usize) {
        if n == 0 {
            self.at_end = true;
        } else {
            self.len += n;
        }
    }

    /// Refills from a blocking source.
    pub fn fill<S: crate::CharSource + ?Sized>(&mut self, src: &mut S) -> std::io::Result<usize> {
        let n = src.read_units(self.prepare_fill())?;
        self.commit(n);
        Ok(n)
    }
}
