//! Random-access cursor over fixed-length records of 4-byte words.
//!
//! All numeric words are IEEE-754 single-precision floats (or raw 32-bit
//! integers) in whichever byte order the file was produced with. The byte
//! order is chosen once per cursor, either by the caller for writing or by
//! [`RecordCursor::detect_byte_order`] for reading.

use std::io::{self, Read, Seek, SeekFrom, Write};

use tracing::{debug, trace, warn};

/// Size of one word in bytes.
pub const WORD_BYTES: u64 = 4;

/// Default record length in words (31 days x 4 values).
pub const DEFAULT_RECORD_WORDS: usize = 124;

/// Zero-based word offset of the interval field in record 1.
const INTERVAL_WORD_OFFSET: u64 = 6;

/// Byte order of every numeric word in a trace file.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum ByteOrder {
    /// Most significant byte first (legacy workstation producers).
    #[default]
    Big,
    /// Least significant byte first.
    Little,
}

impl ByteOrder {
    fn decode_f32(self, bytes: [u8; 4]) -> f32 {
        match self {
            Self::Big => f32::from_be_bytes(bytes),
            Self::Little => f32::from_le_bytes(bytes),
        }
    }

    fn encode_f32(self, value: f32) -> [u8; 4] {
        match self {
            Self::Big => value.to_be_bytes(),
            Self::Little => value.to_le_bytes(),
        }
    }

    fn decode_i32(self, bytes: [u8; 4]) -> i32 {
        match self {
            Self::Big => i32::from_be_bytes(bytes),
            Self::Little => i32::from_le_bytes(bytes),
        }
    }

    fn encode_i32(self, value: i32) -> [u8; 4] {
        match self {
            Self::Big => value.to_be_bytes(),
            Self::Little => value.to_le_bytes(),
        }
    }

    /// Returns the opposite byte order.
    pub fn swapped(self) -> Self {
        match self {
            Self::Big => Self::Little,
            Self::Little => Self::Big,
        }
    }
}

impl std::fmt::Display for ByteOrder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Big => f.write_str("big-endian"),
            Self::Little => f.write_str("little-endian"),
        }
    }
}

/// Recovers an integer from a float word the way legacy writers expect.
///
/// Values are nudged 0.1 away from zero before truncation so that words
/// such as 5.999999 decode as 6.
pub(crate) fn word_to_int(value: f32) -> i32 {
    if value >= 0.0 {
        (value + 0.1) as i32
    } else {
        (value - 0.1) as i32
    }
}

/// Classifies the big-endian reading of the interval word.
///
/// Only 1..=24 is a usable interval; anything else (including the tiny
/// denormal a little-endian small integer becomes) means little-endian.
fn order_from_interval_word(bytes: [u8; 4]) -> ByteOrder {
    let as_big = f32::from_be_bytes(bytes);
    if as_big.is_finite() && (1.0..=24.0).contains(&as_big.round()) {
        ByteOrder::Big
    } else {
        ByteOrder::Little
    }
}

fn swap_word([a, b, c, d]: [u8; 4]) -> [u8; 4] {
    [d, c, b, a]
}

/// Random-access cursor over a stream of fixed-length word records.
///
/// Record numbers are 1-based; word offsets are 0-based from the start of
/// the stream.
#[derive(Debug)]
pub struct RecordCursor<S> {
    inner: S,
    order: ByteOrder,
    record_words: usize,
    position: u64,
}

impl<S> RecordCursor<S> {
    /// Wraps `inner`, positioned at the start of the stream.
    pub fn new(inner: S, order: ByteOrder, record_words: usize) -> Self {
        Self {
            inner,
            order,
            record_words,
            position: 0,
        }
    }

    /// Returns the active byte order.
    pub fn byte_order(&self) -> ByteOrder {
        self.order
    }

    /// Returns the record length in words.
    pub fn record_words(&self) -> usize {
        self.record_words
    }

    /// Returns the current byte offset.
    pub fn position(&self) -> u64 {
        self.position
    }

    /// Byte offset of the first word of 1-based `record`.
    pub fn record_start(&self, record: usize) -> u64 {
        record.saturating_sub(1) as u64 * self.record_words as u64 * WORD_BYTES
    }

    /// Consumes the cursor and returns the wrapped stream.
    pub fn into_inner(self) -> S {
        self.inner
    }
}

impl<S: Seek> RecordCursor<S> {
    /// Seeks to a 0-based word offset from the start of the stream.
    pub fn seek_word(&mut self, word: u64) -> io::Result<()> {
        let offset = word * WORD_BYTES;
        self.inner.seek(SeekFrom::Start(offset))?;
        self.position = offset;
        Ok(())
    }

    /// Seeks to the first word of 1-based `record`.
    pub fn seek_record(&mut self, record: usize) -> io::Result<()> {
        let offset = self.record_start(record);
        self.inner.seek(SeekFrom::Start(offset))?;
        self.position = offset;
        Ok(())
    }
}

impl<S: Read + Seek> RecordCursor<S> {
    /// Detects and adopts the byte order of the stream.
    ///
    /// The interval word of record 1 is read as a big-endian float; if its
    /// rounded value is not a valid interval the file is little-endian.
    /// The cursor is left at the start of the stream.
    pub fn detect_byte_order(&mut self) -> io::Result<ByteOrder> {
        self.seek_word(INTERVAL_WORD_OFFSET)?;
        let bytes = self.read_bytes::<4>()?;
        self.order = order_from_interval_word(bytes);
        if self.order == ByteOrder::Little
            && order_from_interval_word(swap_word(bytes)) != ByteOrder::Big
        {
            warn!(
                word = ?bytes,
                "interval word is not valid in either byte order, assuming little-endian"
            );
        } else {
            debug!(byte_order = %self.order, "detected byte order");
        }
        self.seek_word(0)?;
        Ok(self.order)
    }

    fn read_bytes<const N: usize>(&mut self) -> io::Result<[u8; N]> {
        let mut buf = [0u8; N];
        self.inner.read_exact(&mut buf)?;
        self.position += N as u64;
        Ok(buf)
    }

    /// Reads one float word.
    pub fn read_f32(&mut self) -> io::Result<f32> {
        let bytes = self.read_bytes::<4>()?;
        Ok(self.order.decode_f32(bytes))
    }

    /// Reads one raw 32-bit integer word.
    pub fn read_i32(&mut self) -> io::Result<i32> {
        let bytes = self.read_bytes::<4>()?;
        Ok(self.order.decode_i32(bytes))
    }

    /// Reads one float word holding an integer.
    pub fn read_word_int(&mut self) -> io::Result<i32> {
        let value = self.read_f32()?;
        Ok(word_to_int(value))
    }

    /// Fills `buf` with consecutive float words.
    pub fn read_f32_block(&mut self, buf: &mut [f32]) -> io::Result<()> {
        let mut raw = vec![0u8; buf.len() * WORD_BYTES as usize];
        self.inner.read_exact(&mut raw)?;
        self.position += raw.len() as u64;
        for (value, chunk) in buf.iter_mut().zip(raw.chunks_exact(4)) {
            *value = self.order.decode_f32([chunk[0], chunk[1], chunk[2], chunk[3]]);
        }
        Ok(())
    }

    /// Reads exactly `n` bytes as text with trailing blanks and NULs removed.
    ///
    /// The result never holds more than `n` characters.
    pub fn read_fixed_string(&mut self, n: usize) -> io::Result<String> {
        let mut raw = vec![0u8; n];
        self.inner.read_exact(&mut raw)?;
        self.position += n as u64;
        let text = String::from_utf8_lossy(&raw);
        let trimmed = text.trim_end_matches(|c: char| c.is_whitespace() || c == '\0');
        trace!(n, value = trimmed, "read fixed string");
        Ok(trimmed.to_string())
    }
}

impl<S: Write + Seek> RecordCursor<S> {
    fn write_bytes(&mut self, bytes: &[u8]) -> io::Result<()> {
        self.inner.write_all(bytes)?;
        self.position += bytes.len() as u64;
        Ok(())
    }

    /// Writes one float word.
    pub fn write_f32(&mut self, value: f32) -> io::Result<()> {
        let bytes = self.order.encode_f32(value);
        self.write_bytes(&bytes)
    }

    /// Writes one raw 32-bit integer word.
    pub fn write_i32(&mut self, value: i32) -> io::Result<()> {
        let bytes = self.order.encode_i32(value);
        self.write_bytes(&bytes)
    }

    /// Writes an integer as a float word.
    pub fn write_word_int(&mut self, value: i32) -> io::Result<()> {
        self.write_f32(value as f32)
    }

    /// Writes consecutive float words.
    pub fn write_f32_block(&mut self, values: &[f32]) -> io::Result<()> {
        let mut raw = Vec::with_capacity(values.len() * WORD_BYTES as usize);
        for &value in values {
            raw.extend_from_slice(&self.order.encode_f32(value));
        }
        self.write_bytes(&raw)
    }

    /// Writes `s` left-justified in exactly `n` bytes, blank padded.
    ///
    /// Overlong input is truncated; non-ASCII characters become `?`.
    pub fn write_fixed_string(&mut self, s: &str, n: usize) -> io::Result<()> {
        let mut field: Vec<u8> = s
            .chars()
            .map(|c| if c.is_ascii() { c as u8 } else { b'?' })
            .take(n)
            .collect();
        field.resize(n, b' ');
        self.write_bytes(&field)
    }

    /// Flushes the wrapped stream.
    pub fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }
}
