//! Deterministic byte stream with typed consume primitives.
//!
//! Keep this crate dependency-free (std-only): it sits on the hot path of
//! every generated value and is pulled into fuzz workspaces that are
//! intentionally tiny.
//!
//! Every operation is a pure function of the stream position and is total:
//! an exhausted stream yields zero-equivalent values (`0`, `false`, `'\0'`,
//! empty strings) rather than failing. Replay of a recorded input therefore
//! reproduces the exact same decisions.

/// Source of typed pseudo-random data for value generation.
///
/// Scalar decoders, bounded integers and picks must be deterministic given
/// the stream position, and must tolerate exhaustion by returning defaults.
/// A provider instance is owned by exactly one in-flight generation call;
/// consumption order is observable and must be stable for replay.
pub trait DataProvider {
    fn consume_byte(&mut self) -> i8;
    fn consume_short(&mut self) -> i16;
    fn consume_int(&mut self) -> i32;
    fn consume_long(&mut self) -> i64;
    fn consume_float(&mut self) -> f32;
    fn consume_double(&mut self) -> f64;
    fn consume_bool(&mut self) -> bool;
    fn consume_char(&mut self) -> char;

    /// Consume up to `max_chars` characters of UTF-8 text.
    fn consume_string(&mut self, max_chars: usize) -> String;

    /// Bulk decoders always return exactly `count` elements; elements past
    /// exhaustion are zero.
    fn consume_bytes(&mut self, count: usize) -> Vec<u8>;
    fn consume_shorts(&mut self, count: usize) -> Vec<i16>;
    fn consume_ints(&mut self, count: usize) -> Vec<i32>;
    fn consume_longs(&mut self, count: usize) -> Vec<i64>;
    fn consume_bools(&mut self, count: usize) -> Vec<bool>;

    /// Bounded integer in `[min, max]` (inclusive). `min == max` consumes no
    /// bytes; an inverted range collapses to `min`.
    fn consume_int_in_range(&mut self, min: i32, max: i32) -> i32;

    /// Uniform index in `[0, len)` derived from stream state.
    ///
    /// Callers are expected to handle empty sequences before picking; for
    /// `len == 0` this returns `0` so the operation stays total.
    fn pick_index(&mut self, len: usize) -> usize;

    fn remaining_bytes(&self) -> usize;
}

/// Uniformly pick a reference out of `values`, or `None` when empty.
pub fn pick_value<'a, T>(data: &mut dyn DataProvider, values: &'a [T]) -> Option<&'a T> {
    if values.is_empty() {
        None
    } else {
        Some(&values[data.pick_index(values.len())])
    }
}

/// Finite byte stream feeding the [`DataProvider`] primitives.
///
/// Scalars, bounded integers and picks decode from the back of the buffer;
/// strings and bulk blocks consume from the front. Appending bytes to an
/// input therefore perturbs scalar decisions without shifting previously
/// decoded prefix data, which keeps mutated corpus entries close to their
/// parents.
#[derive(Debug)]
pub struct ByteStream<'a> {
    data: &'a [u8],
    /// Next unread index from the front.
    front: usize,
    /// One past the last unread index; scalars consume downwards from here.
    back: usize,
}

impl<'a> ByteStream<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self {
            data,
            front: 0,
            back: data.len(),
        }
    }

    /// Read up to `width` bytes off the back as an unsigned accumulator.
    ///
    /// Missing bytes (exhaustion) leave the high end zero, so an empty
    /// stream decodes every scalar as `0`.
    fn take_back_raw(&mut self, width: usize) -> u64 {
        let take = width.min(self.back - self.front);
        let mut out = 0u64;
        for _ in 0..take {
            self.back -= 1;
            out = (out << 8) | u64::from(self.data[self.back]);
        }
        out
    }

    /// Read up to `count` bytes off the front.
    fn take_front(&mut self, count: usize) -> &'a [u8] {
        let take = count.min(self.back - self.front);
        let slice = &self.data[self.front..self.front + take];
        self.front += take;
        slice
    }
}

impl DataProvider for ByteStream<'_> {
    fn consume_byte(&mut self) -> i8 {
        self.take_back_raw(1) as u8 as i8
    }

    fn consume_short(&mut self) -> i16 {
        self.take_back_raw(2) as u16 as i16
    }

    fn consume_int(&mut self) -> i32 {
        self.take_back_raw(4) as u32 as i32
    }

    fn consume_long(&mut self) -> i64 {
        self.take_back_raw(8) as i64
    }

    fn consume_float(&mut self) -> f32 {
        f32::from_bits(self.take_back_raw(4) as u32)
    }

    fn consume_double(&mut self) -> f64 {
        f64::from_bits(self.take_back_raw(8))
    }

    fn consume_bool(&mut self) -> bool {
        self.take_back_raw(1) & 1 == 1
    }

    fn consume_char(&mut self) -> char {
        let unit = self.take_back_raw(2) as u32;
        // UTF-16 surrogate code units are not valid `char`s; fold them back
        // into the BMP instead of rejecting the input.
        let folded = if (0xD800..=0xDFFF).contains(&unit) {
            unit - 0xD800
        } else {
            unit
        };
        char::from_u32(folded).unwrap_or('\0')
    }

    fn consume_string(&mut self, max_chars: usize) -> String {
        // A byte decodes to at most one char, so the byte take is also the
        // char budget.
        let raw = self.take_front(max_chars);
        String::from_utf8_lossy(raw).into_owned()
    }

    fn consume_bytes(&mut self, count: usize) -> Vec<u8> {
        let mut out = self.take_front(count).to_vec();
        out.resize(count, 0);
        out
    }

    fn consume_shorts(&mut self, count: usize) -> Vec<i16> {
        self.consume_block(count, 2, |chunk| {
            i16::from_le_bytes([chunk[0], chunk[1]])
        })
    }

    fn consume_ints(&mut self, count: usize) -> Vec<i32> {
        self.consume_block(count, 4, |chunk| {
            i32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]])
        })
    }

    fn consume_longs(&mut self, count: usize) -> Vec<i64> {
        self.consume_block(count, 8, |chunk| {
            i64::from_le_bytes([
                chunk[0], chunk[1], chunk[2], chunk[3], chunk[4], chunk[5], chunk[6], chunk[7],
            ])
        })
    }

    fn consume_bools(&mut self, count: usize) -> Vec<bool> {
        self.consume_block(count, 1, |chunk| chunk[0] & 1 == 1)
    }

    fn consume_int_in_range(&mut self, min: i32, max: i32) -> i32 {
        if min >= max {
            return min;
        }
        let width = (i64::from(max) - i64::from(min) + 1) as u64;
        // Consume only as many bytes as the range needs, so small choices
        // (enum picks, constructor picks) stay cheap on short inputs.
        let bits = 64 - (width - 1).leading_zeros();
        let bytes = ((bits + 7) / 8).max(1) as usize;
        let raw = self.take_back_raw(bytes);
        (i64::from(min) + (raw % width) as i64) as i32
    }

    fn pick_index(&mut self, len: usize) -> usize {
        if len <= 1 {
            return 0;
        }
        let bound = (len - 1).min(i32::MAX as usize) as i32;
        self.consume_int_in_range(0, bound) as usize
    }

    fn remaining_bytes(&self) -> usize {
        self.back - self.front
    }
}

impl ByteStream<'_> {
    /// Shared bulk decoder: exactly `count` elements of fixed `width`, each
    /// from the front; elements past exhaustion decode from all-zero chunks.
    fn consume_block<T>(&mut self, count: usize, width: usize, decode: fn(&[u8]) -> T) -> Vec<T> {
        let mut out = Vec::with_capacity(count);
        for _ in 0..count {
            let raw = self.take_front(width);
            if raw.len() == width {
                out.push(decode(raw));
            } else {
                let mut chunk = [0u8; 8];
                chunk[..raw.len()].copy_from_slice(raw);
                out.push(decode(&chunk[..width]));
            }
        }
        out
    }
}
