//! Input sources delivering UTF-16 code units.

use std::io::{self, Read};
use tokio::io::{AsyncRead, AsyncReadExt};

/// A blocking supplier of UTF-16 code units.
pub trait CharSource {
    /// Fills a prefix of `buf` and returns its length; `0` means the
    /// source is exhausted. `buf` is never empty.
    fn read_units(&mut self, buf: &mut [u16]) -> io::Result<usize>;
}

/// In-memory text.
#[derive(Debug, Clone)]
pub struct StrSource {
    units: Vec<u16>,
    pos: usize,
}

impl StrSource {
    pub fn new(text: &str) -> Self {
        Self {
            units: text.encode_utf16().collect(),
            pos: 0,
        }
    }

    /// Total length in units.
    pub fn len(&self) -> usize {
        self.units.len()
    }

    pub fn is_empty(&self) -> bool {
        self.units.is_empty()
    }
}

impl CharSource for StrSource {
    fn read_units(&mut self, buf: &mut [u16]) -> io::Result<usize> {
        let n = buf.len().min(self.units.len() - self.pos);
        buf[..n].copy_from_slice(&self.units[self.pos..self.pos + n]);
        self.pos += n;
        Ok(n)
    }
}

const CHUNK: usize = 4096;

fn invalid_utf8() -> io::Error {
    io::Error::new(io::ErrorKind::InvalidData, "stream did not contain valid UTF-8")
}

fn utf8_width(lead: u8) -> Option<usize> {
    match lead {
        0x00..=0x7F => Some(1),
        0xC2..=0xDF => Some(2),
        0xE0..=0xEF => Some(3),
        0xF0..=0xF4 => Some(4),
        _ => None,
    }
}

/// Incremental UTF-8 to UTF-16 decoding over byte chunks that may split
/// characters anywhere.
#[derive(Debug, Default)]
struct Utf8Decoder {
    bytes: Vec<u8>,
    start: usize,
    /// Low surrogate that did not fit into the previous output buffer.
    carry: Option<u16>,
    eof: bool,
}

impl Utf8Decoder {
    fn drain(&mut self, out: &mut [u16]) -> io::Result<usize> {
        let mut n = 0;
        if let Some(low) = self.carry.take() {
            out[0] = low;
            n = 1;
        }
        while n < out.len() {
            let rest = &self.bytes[self.start..];
            let Some(&lead) = rest.first() else {
                break;
            };
            let width = utf8_width(lead).unwrap_or(1);
            if rest.len() < width {
                break;
            }
            let decoded = std::str::from_utf8(&rest[..width])
                .ok()
                .and_then(|s| s.chars().next());
            let Some(c) = decoded else {
                // Report the bad sequence on the next call, after what was decoded.
                if n > 0 {
                    break;
                }
                return Err(invalid_utf8());
            };
            let mut pair = [0u16; 2];
            let encoded = c.encode_utf16(&mut pair);
            out[n] = encoded[0];
            n += 1;
            if let Some(&low) = encoded.get(1) {
                if n < out.len() {
                    out[n] = low;
                    n += 1;
                } else {
                    self.carry = Some(low);
                }
            }
            self.start += width;
        }
        if n == 0 && self.eof && self.start < self.bytes.len() {
            return Err(invalid_utf8());
        }
        Ok(n)
    }

    /// Room for the next chunk of raw bytes.
    fn spare(&mut self) -> &mut [u8] {
        self.bytes.drain(..self.start);
        self.start = 0;
        let len = self.bytes.len();
        self.bytes.resize(len + CHUNK, 0);
        &mut self.bytes[len..]
    }

    /// Gives back the room of a read that failed.
    fn unused(&mut self) {
        let len = self.bytes.len() - CHUNK;
        self.bytes.truncate(len);
    }

    fn filled(&mut self, n: usize) {
        let len = self.bytes.len() - CHUNK + n;
        self.bytes.truncate(len);
        if n == 0 {
            self.eof = true;
        }
    }
}

/// Decodes UTF-8 from any [`Read`].
pub struct Utf8Reader<R> {
    inner: R,
    decoder: Utf8Decoder,
}

impl<R: Read> Utf8Reader<R> {
    pub fn new(inner: R) -> Self {
        Self {
            inner,
            decoder: Utf8Decoder::default(),
        }
    }
}

impl<R: Read> CharSource for Utf8Reader<R> {
    fn read_units(&mut self, buf: &mut [u16]) -> io::Result<usize> {
        loop {
            let n = self.decoder.drain(buf)?;
            if n > 0 || self.decoder.eof {
                return Ok(n);
            }
            let read = loop {
                match self.inner.read(self.decoder.spare()) {
                    Ok(k) => break k,
                    Err(e) if e.kind() == io::ErrorKind::Interrupted => self.decoder.unused(),
                    Err(e) => {
                        self.decoder.unused();
                        return Err(e);
                    }
                }
            };
            self.decoder.filled(read);
        }
    }
}

/// Decodes UTF-8 from any [`AsyncRead`]; the async counterpart of
/// [`Utf8Reader`].
pub struct AsyncUtf8Reader<R> {
    inner: R,
    decoder: Utf8Decoder,
}

impl<R: AsyncRead + Unpin> AsyncUtf8Reader<R> {
    pub fn new(inner: R) -> Self {
        Self {
            inner,
            decoder: Utf8Decoder::default(),
        }
    }

    /// Same contract as [`CharSource::read_units`]; suspends only while
    /// waiting for bytes.
    pub async fn read_units(&mut self, buf: &mut [u16]) -> io::Result<usize> {
        loop {
            let n = self.decoder.drain(buf)?;
            if n > 0 || self.decoder.eof {
                return Ok(n);
            }
            let read = match self.inner.read(self.decoder.spare()).await {
                Ok(k) => k,
                Err(e) => {
                    self.decoder.unused();
                    return Err(e);
                }
            };
            self.decoder.filled(read);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Hands out its bytes in fixed-size pieces.
    struct Trickle<'a> {
        data: &'a [u8],
        step: usize,
    }

    impl Read for Trickle<'_> {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            let n = self.step.min(buf.len()).min(self.data.len());
            buf[..n].copy_from_slice(&self.data[..n]);
            self.data = &self.data[n..];
            Ok(n)
        }
    }

    fn read_all<S: CharSource>(src: &mut S, chunk: usize) -> io::Result<Vec<u16>> {
        let mut out = Vec::new();
        let mut buf = vec![0u16; chunk];
        loop {
            let n = src.read_units(&mut buf)?;
            if n == 0 {
                return Ok(out);
            }
            out.extend_from_slice(&buf[..n]);
        }
    }

    #[test]
    fn decodes_split_sequences() {
        let text = "a\u{e9}\u{20ac}\u{1F600}z";
        let expected: Vec<u16> = text.encode_utf16().collect();
        for step in 1..5 {
            for chunk in 1..4 {
                let mut r = Utf8Reader::new(Trickle {
                    data: text.as_bytes(),
                    step,
                });
                assert_eq!(read_all(&mut r, chunk).unwrap(), expected, "step {step} chunk {chunk}");
            }
        }
    }

    #[test]
    fn rejects_invalid_and_truncated_input() {
        let mut r = Utf8Reader::new(&[b'a', 0xFF][..]);
        assert!(read_all(&mut r, 8).is_err());
        let mut r = Utf8Reader::new(&[b'a', 0xE2, 0x82][..]);
        let err = read_all(&mut r, 8).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::InvalidData);
    }

    #[test]
    fn str_source_reads_in_pieces() {
        let mut s = StrSource::new("hello");
        assert_eq!(s.len(), 5);
        assert_eq!(read_all(&mut s, 2).unwrap(), "hello".encode_utf16().collect::<Vec<_>>());
    }

    #[tokio::test]
    async fn async_reader_matches_sync() {
        let text = "x = \u{1F600};\n";
        let mut r = AsyncUtf8Reader::new(text.as_bytes());
        let mut out = Vec::new();
        let mut buf = [0u16; 1];
        loop {
            let n = r.read_units(&mut buf).await.unwrap();
            if n == 0 {
                break;
            }
            out.extend_from_slice(&buf[..n]);
        }
        assert_eq!(out, text.encode_utf16().collect::<Vec<_>>());
    }
}
