// Copyright (c) 2026 Christoph Gaffga
// SPDX-License-Identifier: GPL-3.0-only
// https://github.com/cgaffga/pjgcore

//! Error types for JPEG parsing, entropy decoding and re-encoding.

use std::fmt;

/// Errors that can occur while splitting, decoding or re-encoding a JPEG.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JpegError {
    /// Input data is too short or truncated.
    UnexpectedEof,
    /// A marker segment's length field does not match its content.
    SegmentSizeMismatch(u8),
    /// DHT segment content is inconsistent with its length.
    DhtSizeMismatch,
    /// DQT segment content is inconsistent with its length.
    DqtSizeMismatch,
    /// Unsupported coding process (lossless, differential, arithmetic).
    UnsupportedSof(u8),
    /// Sample precision other than 8 bit.
    UnsupportedPrecision(u8),
    /// Image resolution is zero in at least one dimension.
    InvalidDimensions(u16, u16),
    /// More than 4 colour components.
    TooManyComponents(u8),
    /// SOI, EOI or RSTn encountered inside the header stream.
    OutOfPlaceMarker(u8),
    /// Header is missing SOF, quantisers or sampling information.
    IncompleteHeader,
    /// SOS references a component id not declared in SOF.
    ComponentIdMismatch,
    /// Huffman table destination outside 0..3.
    BadHuffmanDestination,
    /// Quantisation table destination outside 0..3.
    BadQuantDestination(u8),
    /// Sampling factor outside 1..4.
    InvalidSamplingFactors,
    /// More components in a scan than in the frame.
    TooManyScanComponents(u8),
    /// Spectral selection outside `from <= to <= 63`.
    SpectralSelectionOutOfRange,
    /// Successive approximation parameter >= 12.
    SuccessiveApproxOutOfRange,
    /// A scan needs a Huffman table that was never defined.
    MissingHuffmanTable { scan: usize },
    /// A symbol has no code in the active Huffman table.
    MissingHuffmanCode(u8),
    /// Huffman-coded image data could not be decoded.
    DecodeError { scan: usize, unit: usize },
    /// Huffman-coded image data could not be re-encoded.
    EncodeError { scan: usize, unit: usize },
    /// A decoded coefficient lies outside the quantiser-implied range.
    ValueOutOfRange { cmp: usize, freq: usize, val: i32, max: i32 },
}

impl fmt::Display for JpegError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnexpectedEof => write!(f, "unexpected end of data encountered"),
            Self::SegmentSizeMismatch(t) => write!(f, "size mismatch in marker segment FF {t:02X}"),
            Self::DhtSizeMismatch => write!(f, "size mismatch in dht marker"),
            Self::DqtSizeMismatch => write!(f, "size mismatch in dqt marker"),
            Self::UnsupportedSof(t) => write!(f, "sof{} marker found, coding process not supported", t - 0xC0),
            Self::UnsupportedPrecision(p) => write!(f, "{p} bit data precision is not supported"),
            Self::InvalidDimensions(w, h) => {
                write!(f, "resolution is {w}x{h}, possible malformed JPEG")
            }
            Self::TooManyComponents(n) => write!(f, "image has {n} components, max 4 are supported"),
            Self::OutOfPlaceMarker(m) => write!(f, "marker FF {m:02X} found out of place"),
            Self::IncompleteHeader => write!(f, "header information is incomplete"),
            Self::ComponentIdMismatch => write!(f, "component id mismatch in start-of-scan"),
            Self::BadHuffmanDestination => write!(f, "huffman table number mismatch"),
            Self::BadQuantDestination(d) => write!(f, "quantization table number {d} out of range"),
            Self::InvalidSamplingFactors => write!(f, "invalid sampling factors"),
            Self::TooManyScanComponents(n) => write!(f, "{n} components in scan, more than in frame"),
            Self::SpectralSelectionOutOfRange => {
                write!(f, "spectral selection parameter out of range")
            }
            Self::SuccessiveApproxOutOfRange => {
                write!(f, "successive approximation parameter out of range")
            }
            Self::MissingHuffmanTable { scan } => write!(f, "huffman table missing in scan{scan}"),
            Self::MissingHuffmanCode(sym) => {
                write!(f, "huffman table has no code for symbol {sym:02X}")
            }
            Self::DecodeError { scan, unit } => write!(f, "decode error in scan{scan} / mcu{unit}"),
            Self::EncodeError { scan, unit } => write!(f, "encode error in scan{scan} / mcu{unit}"),
            Self::ValueOutOfRange { cmp, freq, val, max } => write!(
                f,
                "value out of range error: cmp{cmp}, frq{freq}, val {val}, max {max}"
            ),
        }
    }
}

impl std::error::Error for JpegError {}

pub type Result<T> = std::result::Result<T, JpegError>;
