// Copyright (c) 2026 Christoph Gaffga
// SPDX-License-Identifier: GPL-3.0-only
// https://github.com/cgaffga/pjgcore

//! Error type for the container and pipeline layer.

use crate::jpeg::error::JpegError;
use std::fmt;

/// Errors from container coding, the pipeline driver or I/O.
#[derive(Debug)]
pub enum PjgError {
    /// The JPEG side failed.
    Jpeg(JpegError),
    /// Reading or writing a file or stream failed.
    Io(std::io::Error),
    /// The input starts with neither a JPEG nor a PJG magic.
    UnknownFileType,
    /// The container was written by a different format version.
    VersionMismatch { found: u8 },
    /// The container starts with a header code this version does not know.
    UnknownHeaderCode(u8),
    /// The container ended before its structure was complete.
    UnexpectedEof,
    /// The arithmetic stream decoded a symbol outside its model range.
    DecodedGarbage(&'static str),
    /// A recoverable condition occurred and proceeding was not requested.
    Warning(String),
    /// The verification pass produced different sizes.
    VerificationSizeMismatch { original: usize, rebuilt: usize },
    /// The verification pass found a differing byte.
    VerificationFailed { offset: usize },
}

impl fmt::Display for PjgError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Jpeg(e) => write!(f, "{e}"),
            Self::Io(e) => write!(f, "i/o error: {e}"),
            Self::UnknownFileType => write!(f, "filetype of input is unknown"),
            Self::VersionMismatch { found } => write!(
                f,
                "incompatible file, use pjgcore v{}.{}",
                found / 10,
                found % 10
            ),
            Self::UnknownHeaderCode(c) => {
                write!(f, "unknown header code 0x{c:02X}, use newer version of pjgcore")
            }
            Self::UnexpectedEof => write!(f, "unexpected end of container data"),
            Self::DecodedGarbage(what) => write!(f, "corrupted container stream: {what}"),
            Self::Warning(msg) => write!(f, "{msg}"),
            Self::VerificationSizeMismatch { original, rebuilt } => write!(
                f,
                "verification failed: size {rebuilt} differs from original {original}"
            ),
            Self::VerificationFailed { offset } => {
                write!(f, "verification failed: difference found at 0x{offset:X}")
            }
        }
    }
}

impl std::error::Error for PjgError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Jpeg(e) => Some(e),
            Self::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<JpegError> for PjgError {
    fn from(e: JpegError) -> Self {
        Self::Jpeg(e)
    }
}

impl From<std::io::Error> for PjgError {
    fn from(e: std::io::Error) -> Self {
        Self::Io(e)
    }
}

pub type Result<T> = std::result::Result<T, PjgError>;
