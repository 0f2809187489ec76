//! Printable-character histogram.
//!
//! Fixed table of 95 counters, one per ASCII byte in `[32, 126]` (space
//! through `~`), indexed by `byte - 32`. The server keeps two instances:
//! a connection-local one that is reset before every connection, and a
//! global one that accumulates the local tables as connections complete.
//!
//! Classification is byte-oriented: a multi-byte encoded character
//! contributes one observation per byte in range, matching the wire
//! protocol's definition of "printable".

use std::io::{self, Write};
use tracing::trace;

/// Lowest printable ASCII byte (space).
pub const PRINTABLE_MIN: u8 = 32;

/// Highest printable ASCII byte (`~`).
pub const PRINTABLE_MAX: u8 = 126;

/// Number of histogram buckets.
pub const BUCKET_COUNT: usize = (PRINTABLE_MAX - PRINTABLE_MIN + 1) as usize;

/// Whether a byte falls in the printable ASCII range.
#[inline]
pub fn is_printable(byte: u8) -> bool {
    (PRINTABLE_MIN..=PRINTABLE_MAX).contains(&byte)
}

/// A 95-bucket printable-character frequency table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Histogram {
    buckets: [u32; BUCKET_COUNT],
}

impl Default for Histogram {
    fn default() -> Self {
        Self::new()
    }
}

impl Histogram {
    /// Create a zeroed histogram.
    pub fn new() -> Self {
        Self {
            buckets: [0; BUCKET_COUNT],
        }
    }

    /// Record every printable byte of `chunk`.
    ///
    /// Returns how many of the chunk's bytes were printable.
    pub fn observe(&mut self, chunk: &[u8]) -> u32 {
        let mut printable = 0u32;
        for &byte in chunk {
            if is_printable(byte) {
                self.buckets[(byte - PRINTABLE_MIN) as usize] += 1;
                printable += 1;
            }
        }
        trace!(bytes = chunk.len(), printable, "Observed chunk");
        printable
    }

    /// Fold another histogram into this one, bucket by bucket.
    pub fn merge(&mut self, other: &Histogram) {
        for (bucket, &count) in self.buckets.iter_mut().zip(other.buckets.iter()) {
            *bucket += count;
        }
    }

    /// Zero all buckets.
    pub fn reset(&mut self) {
        self.buckets = [0; BUCKET_COUNT];
    }

    /// Sum over all buckets: the scalar printable count for one frame.
    ///
    /// Cannot overflow: a frame carries at most `u32::MAX` payload bytes,
    /// so at most that many observations.
    pub fn total(&self) -> u32 {
        self.buckets.iter().sum()
    }

    /// Count recorded for a single printable byte.
    ///
    /// Returns 0 for bytes outside the printable range.
    pub fn count_of(&self, byte: u8) -> u32 {
        if is_printable(byte) {
            self.buckets[(byte - PRINTABLE_MIN) as usize]
        } else {
            0
        }
    }

    /// Write the full table, one line per character in ascending code
    /// order: `char '<c>' : <count> times`.
    ///
    /// This exact format is relied on by existing tooling; do not change
    /// it.
    pub fn report<W: Write>(&self, writer: &mut W) -> io::Result<()> {
        for (index, count) in self.buckets.iter().enumerate() {
            let c = (index as u8 + PRINTABLE_MIN) as char;
            writeln!(writer, "char '{c}' : {count} times")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_observe_counts_printables_only() {
        let mut hist = Histogram::new();
        // 'H', 'i', '!' printable; '\n' not
        let count = hist.observe(b"Hi!\n");
        assert_eq!(count, 3);
        assert_eq!(hist.total(), 3);
        assert_eq!(hist.count_of(b'H'), 1);
        assert_eq!(hist.count_of(b'i'), 1);
        assert_eq!(hist.count_of(b'!'), 1);
        assert_eq!(hist.count_of(b'\n'), 0);
    }

    #[test]
    fn test_observe_range_boundaries() {
        let mut hist = Histogram::new();
        let count = hist.observe(&[31, 32, 126, 127]);
        assert_eq!(count, 2);
        assert_eq!(hist.count_of(32), 1);
        assert_eq!(hist.count_of(126), 1);
    }

    #[test]
    fn test_observe_empty_chunk() {
        let mut hist = Histogram::new();
        assert_eq!(hist.observe(b""), 0);
        assert_eq!(hist.total(), 0);
    }

    #[test]
    fn test_observe_all_nonprintable() {
        let mut hist = Histogram::new();
        assert_eq!(hist.observe(&[0, 1, 7, 27, 127, 200, 255]), 0);
        assert_eq!(hist.total(), 0);
    }

    #[test]
    fn test_observe_accumulates_across_chunks() {
        let mut hist = Histogram::new();
        hist.observe(b"aa");
        hist.observe(b"a");
        assert_eq!(hist.count_of(b'a'), 3);
        assert_eq!(hist.total(), 3);
    }

    #[test]
    fn test_merge_adds_bucket_by_bucket() {
        let mut global = Histogram::new();
        let mut local = Histogram::new();

        local.observe(b"abc");
        global.merge(&local);
        local.reset();
        local.observe(b"bcd");
        global.merge(&local);

        assert_eq!(global.count_of(b'a'), 1);
        assert_eq!(global.count_of(b'b'), 2);
        assert_eq!(global.count_of(b'c'), 2);
        assert_eq!(global.count_of(b'd'), 1);
        assert_eq!(global.total(), 6);
    }

    #[test]
    fn test_reset_zeroes_everything() {
        let mut hist = Histogram::new();
        hist.observe(b"some text");
        hist.reset();
        assert_eq!(hist, Histogram::new());
        assert_eq!(hist.total(), 0);
    }

    #[test]
    fn test_report_format_and_line_count() {
        let mut hist = Histogram::new();
        hist.observe(b"Hi!");

        let mut out = Vec::new();
        hist.report(&mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        let lines: Vec<&str> = text.lines().collect();

        assert_eq!(lines.len(), BUCKET_COUNT);
        assert_eq!(lines[0], "char ' ' : 0 times");
        assert_eq!(lines[(b'!' - PRINTABLE_MIN) as usize], "char '!' : 1 times");
        assert_eq!(lines[(b'H' - PRINTABLE_MIN) as usize], "char 'H' : 1 times");
        assert_eq!(lines[BUCKET_COUNT - 1], "char '~' : 0 times");
    }

    #[test]
    fn test_report_ascending_order() {
        let hist = Histogram::new();
        let mut out = Vec::new();
        hist.report(&mut out).unwrap();
        let text = String::from_utf8(out).unwrap();

        let chars: Vec<char> = text
            .lines()
            .map(|line| line.chars().nth(6).unwrap())
            .collect();
        let mut sorted = chars.clone();
        sorted.sort_unstable();
        assert_eq!(chars, sorted);
    }
}
