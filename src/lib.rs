// Copyright (c) 2026 Christoph Gaffga
// SPDX-License-Identifier: GPL-3.0-only
// https://github.com/cgaffga/pjgcore

//! # pjg-core
//!
//! Lossless JPEG recompression. Compresses Huffman-coded baseline and
//! progressive JPEG files into the compact PJG container (typically ~20%
//! smaller) and reconstructs the original JPEG byte for byte.
//!
//! The codec works entirely in the DCT domain: the JPEG is split into
//! header, entropy data and trailing garbage, the Huffman-coded scans are
//! decoded into per-frequency coefficient collections, the DC plane is
//! predicted, and everything is re-coded with context-modelled adaptive
//! arithmetic coding. Reconstruction replays the exact original Huffman
//! bitstream, including restart markers, padding bits and any garbage after
//! EOI.
//!
//! # Quick start
//!
//! ```rust,ignore
//! use pjg_core::{compress, decompress, Config};
//!
//! let jpeg = std::fs::read("photo.jpg").unwrap();
//! let pjg = compress(&jpeg, &Config::default()).unwrap();
//! let restored = decompress(&pjg, &Config::default()).unwrap();
//! assert_eq!(jpeg, restored);
//! ```
//!
//! Inputs are recognised by content: `FF D8` is a JPEG, `J S` a PJG
//! container; [`convert`] dispatches automatically. Containers are only
//! readable by the format version that wrote them.

pub mod arith;
pub mod dct;
pub mod io;
pub mod jpeg;
pub mod pipeline;
pub mod pjg;
pub mod predictor;
pub mod tables;

pub use crate::jpeg::error::JpegError;
pub use crate::pipeline::{compress, convert, decompress, detect, Config, FileKind, Settings};
pub use crate::pjg::error::PjgError;
pub use crate::predictor::Predictor;

use std::io::{Read, Write};
use std::path::Path;

/// Container format version byte.
pub const APP_VERSION: u8 = pjg::APP_VERSION;

/// PJG container magic bytes.
pub const PJG_MAGIC: [u8; 2] = pjg::PJG_MAGIC;

/// One-line version description.
pub fn version_info() -> String {
    format!(
        "pjgcore library v{}.{}",
        APP_VERSION / 10,
        APP_VERSION % 10
    )
}

/// Short program name with version.
pub fn short_name() -> String {
    format!("pjgcore v{}.{}", APP_VERSION / 10, APP_VERSION % 10)
}

/// Convert between a reader and a writer.
///
/// The input is buffered up-front (the codec needs random access), so this
/// also covers stdin/stdout pipes. Returns the detected input kind.
pub fn convert_stream<R: Read, W: Write>(
    input: &mut R,
    output: &mut W,
    cfg: &Config,
) -> Result<FileKind, PjgError> {
    let mut data = Vec::new();
    input.read_to_end(&mut data)?;
    let (kind, converted) = convert(&data, cfg)?;
    output.write_all(&converted)?;
    Ok(kind)
}

/// Convert a file into another file.
///
/// The output is written only after a successful conversion, so a failing
/// run leaves no partial file behind.
pub fn convert_file<P: AsRef<Path>, Q: AsRef<Path>>(
    input: P,
    output: Q,
    cfg: &Config,
) -> Result<FileKind, PjgError> {
    let data = std::fs::read(input)?;
    let (kind, converted) = convert(&data, cfg)?;
    std::fs::write(output, converted)?;
    Ok(kind)
}
