// src/container/bit_stream.rs

//! Budgeted bit container.
//!
//! A `BitStream` is written once by an encoder and read back by a decoder.
//! Bits are stored in 16-bit words, least-significant bit first, so logical
//! bit `k` lives in word `k / 16` at position `k % 16`. The `total_bits`
//! budget never grows: a failed `put` or an explicit `close` freezes it to
//! the number of bits actually written, and a decoder may clamp it further.

use bitvec::prelude::*;

/// Storage word of the bitstream.
pub type Word = u16;

/// Number of bits per storage word, as recorded in the container header.
pub const WORD_BITS: u8 = Word::BITS as u8;

/// Budget used when the caller does not want the stream to truncate.
pub const UNBOUNDED: u32 = u32::MAX;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BitStream {
    max_steps: u8,
    total_bits: u32,
    level: u8,
    bits: BitVec<Word, Lsb0>,
    cursor: usize,
    closed: bool,
}

impl BitStream {
    /// Creates an empty, writable stream with room for `total_bits` bits.
    pub fn new(max_steps: u8, total_bits: u32, level: u8) -> Self {
        Self {
            max_steps,
            total_bits,
            level,
            bits: BitVec::new(),
            cursor: 0,
            closed: false,
        }
    }

    /// Wraps words read from a container. The stream is closed immediately;
    /// only reads are expected.
    pub fn from_words(max_steps: u8, total_bits: u32, level: u8, words: Vec<Word>) -> Self {
        Self {
            max_steps,
            total_bits,
            level,
            bits: BitVec::from_vec(words),
            cursor: 0,
            closed: true,
        }
    }

    /// Appends one bit. Returns `false`, closing the stream, once the budget
    /// is exhausted; a closed stream never accepts bits again.
    pub fn put(&mut self, bit: bool) -> bool {
        if self.closed {
            return false;
        }
        if self.bits.len() >= self.total_bits as usize {
            self.close();
            return false;
        }
        self.bits.push(bit);
        true
    }

    /// Reads the next bit, or `None` once the cursor reaches `total_bits` or
    /// the stored data. End of stream is sticky until [`rewind`](Self::rewind).
    pub fn get(&mut self) -> Option<bool> {
        if self.cursor >= self.total_bits as usize || self.cursor >= self.bits.len() {
            // freeze without rewinding
            if !self.closed {
                self.bits.set_uninitialized(false);
                self.total_bits = self.total_bits.min(self.bits.len() as u32);
                self.closed = true;
            }
            return None;
        }
        let bit = self.bits[self.cursor];
        self.cursor += 1;
        Some(bit)
    }

    /// Freezes the stream. On first call `total_bits` shrinks to the number
    /// of bits written and the read cursor rewinds to the start.
    pub fn close(&mut self) {
        if !self.closed {
            self.bits.set_uninitialized(false);
            self.total_bits = self.bits.len() as u32;
            self.cursor = 0;
            self.closed = true;
        }
    }

    /// Moves the read cursor back to the first bit.
    pub fn rewind(&mut self) {
        self.cursor = 0;
    }

    /// Clamps the readable length for a partial decode.
    ///
    /// `0`, or anything not below the current total, keeps the full stream.
    /// Returns the number of bits that will be decoded.
    pub fn limit(&mut self, bits: u32) -> u32 {
        if bits > 0 && bits < self.total_bits {
            log::info!("Only {} out of {} bits will be decoded", bits, self.total_bits);
            self.total_bits = bits;
        }
        self.total_bits
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    pub fn max_steps(&self) -> u8 {
        self.max_steps
    }

    pub fn total_bits(&self) -> u32 {
        self.total_bits
    }

    pub fn level(&self) -> u8 {
        self.level
    }

    /// Number of bits physically present.
    pub fn len(&self) -> usize {
        self.bits.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bits.is_empty()
    }

    /// Backing words, last one zero-padded.
    pub fn words(&self) -> &[Word] {
        self.bits.as_raw_slice()
    }
}
