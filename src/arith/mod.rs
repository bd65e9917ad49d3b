// Copyright (c) 2026 Christoph Gaffga
// SPDX-License-Identifier: GPL-3.0-only
// https://github.com/cgaffga/pjgcore

//! Adaptive binary-renormalising arithmetic coder.
//!
//! Range coder over `[0, 2^31)` with the classic three-case renormalisation
//! (emit 0, emit 1, defer a pending bit on near misses). Symbol statistics
//! live entirely in the models; the coder only consumes cumulative frequency
//! intervals, so encoder and decoder stay in lockstep as long as both sides
//! drive their models through the identical call sequence.

pub mod models;

pub use self::models::{BinaryModel, Model, UniversalModel};

use crate::io::{ByteReader, ByteWriter};

const CODER_USE_BITS: u32 = 31;
const CODER_LIMIT100: u32 = 1 << CODER_USE_BITS;
const CODER_LIMIT025: u32 = CODER_LIMIT100 / 4;
const CODER_LIMIT050: u32 = CODER_LIMIT100 / 2;
const CODER_LIMIT075: u32 = 3 * (CODER_LIMIT100 / 4);

/// Arithmetic encoder writing bits MSB-first into a byte sink.
pub struct ArithmeticEncoder<'a, W: ByteWriter> {
    writer: &'a mut W,
    low: u32,
    high: u32,
    /// Deferred near-miss bits, resolved by the next emitted bit.
    pending: u32,
    curr_byte: u8,
    curr_bit: u8,
}

impl<'a, W: ByteWriter> ArithmeticEncoder<'a, W> {
    pub fn new(writer: &'a mut W) -> Self {
        Self {
            writer,
            low: 0,
            high: CODER_LIMIT100 - 1,
            pending: 0,
            curr_byte: 0,
            curr_bit: 0,
        }
    }

    fn emit_raw_bit(&mut self, bit: u8) {
        self.curr_byte = (self.curr_byte << 1) | bit;
        self.curr_bit += 1;
        if self.curr_bit == 8 {
            self.writer.write_byte(self.curr_byte);
            self.curr_byte = 0;
            self.curr_bit = 0;
        }
    }

    fn emit_bit(&mut self, bit: u8) {
        self.emit_raw_bit(bit);
        while self.pending > 0 {
            self.emit_raw_bit(bit ^ 1);
            self.pending -= 1;
        }
    }

    /// Encode one symbol under the model's current context, then adapt it.
    pub fn encode<M: Model>(&mut self, model: &mut M, symbol: usize) {
        let total = model.total();
        let (lo, hi) = model.interval(symbol);
        debug_assert!(lo < hi && hi <= total);

        let step = (self.high - self.low + 1) / total;
        self.high = self.low + step * hi - 1;
        self.low += step * lo;

        loop {
            if self.high < CODER_LIMIT050 {
                self.emit_bit(0);
            } else if self.low >= CODER_LIMIT050 {
                self.emit_bit(1);
                self.low -= CODER_LIMIT050;
                self.high -= CODER_LIMIT050;
            } else if self.low >= CODER_LIMIT025 && self.high < CODER_LIMIT075 {
                self.pending += 1;
                self.low -= CODER_LIMIT025;
                self.high -= CODER_LIMIT025;
            } else {
                break;
            }
            self.low <<= 1;
            self.high = (self.high << 1) + 1;
        }

        model.update(symbol);
    }

    /// Disambiguate the final interval and flush the last byte.
    ///
    /// The chosen tail (a quarter-boundary value inside `[low, high]`)
    /// stays valid under the zero padding the decoder reads past the end.
    pub fn finish(mut self) {
        self.pending += 1;
        if self.low < CODER_LIMIT025 {
            self.emit_bit(0);
        } else {
            self.emit_bit(1);
        }
        while self.curr_bit != 0 {
            self.emit_raw_bit(0);
        }
    }
}

/// Arithmetic decoder mirroring [`ArithmeticEncoder`] bit for bit.
pub struct ArithmeticDecoder<'a, R: ByteReader> {
    reader: &'a mut R,
    low: u32,
    high: u32,
    code: u32,
    curr_byte: u8,
    curr_bit: u8,
    /// Zero bits fabricated past the end of the stream.
    fabricated: u32,
}

impl<'a, R: ByteReader> ArithmeticDecoder<'a, R> {
    pub fn new(reader: &'a mut R) -> Self {
        let mut dec = Self {
            reader,
            low: 0,
            high: CODER_LIMIT100 - 1,
            code: 0,
            curr_byte: 0,
            curr_bit: 0,
            fabricated: 0,
        };
        for _ in 0..CODER_USE_BITS {
            dec.code = (dec.code << 1) | dec.next_bit();
        }
        dec
    }

    fn next_bit(&mut self) -> u32 {
        if self.curr_bit == 0 {
            // Reads past the end of the stream yield zero bits.
            self.curr_byte = match self.reader.read_byte() {
                Some(byte) => byte,
                None => {
                    self.fabricated += 8;
                    0
                }
            };
            self.curr_bit = 8;
        }
        self.curr_bit -= 1;
        u32::from((self.curr_byte >> self.curr_bit) & 0x1)
    }

    /// A well-formed stream consumes at most the initial window plus the
    /// final padding past its end; anything further means the stream was
    /// truncated or never terminated.
    pub fn overread(&self) -> bool {
        self.fabricated > 256
    }

    /// Decode one symbol under the model's current context, then adapt it.
    pub fn decode<M: Model>(&mut self, model: &mut M) -> usize {
        let total = model.total();
        let step = (self.high - self.low + 1) / total;
        let target = ((self.code - self.low) / step).min(total - 1);
        let (symbol, lo, hi) = model.lookup(target);

        self.high = self.low + step * hi - 1;
        self.low += step * lo;

        loop {
            if self.high < CODER_LIMIT050 {
                // Renormalise without offset.
            } else if self.low >= CODER_LIMIT050 {
                self.low -= CODER_LIMIT050;
                self.high -= CODER_LIMIT050;
                self.code -= CODER_LIMIT050;
            } else if self.low >= CODER_LIMIT025 && self.high < CODER_LIMIT075 {
                self.low -= CODER_LIMIT025;
                self.high -= CODER_LIMIT025;
                self.code -= CODER_LIMIT025;
            } else {
                break;
            }
            self.low <<= 1;
            self.high = (self.high << 1) + 1;
            self.code = (self.code << 1) | self.next_bit();
        }

        model.update(symbol);
        symbol
    }
}
