// Copyright (c) 2026 Christoph Gaffga
// SPDX-License-Identifier: GPL-3.0-only
// https://github.com/cgaffga/pjgcore

//! Fixed-point IDCT bases and their per-component quantiser adaptation.
//!
//! The DC predictor and the low-AC context need partial inverse transforms
//! over quantized coefficients. Multiplying the cosine bases by the
//! quantisers once per file turns every transform into a plain dot product
//! over collection columns. All tables are integer with
//! [`DCT_RSC_FACTOR`]-scaled fixed point.

use crate::jpeg::zigzag::NATURAL_TO_ZIGZAG;
use crate::jpeg::{Component, JpegImage};

/// Fixed-point scale of the adapted transforms.
pub(crate) const DCT_RSC_FACTOR: i32 = 8192;

/// One-dimensional IDCT basis, indexed `[position * 8 + frequency]`.
///
/// Scaled so a DC-only block transforms to `DCT_RSC_FACTOR / 8` per tap,
/// which makes the edge-difference predictor come out in DC units.
const ICOS_IDCT_1X8: [i32; 64] = [
    1024,  1420,  1338,  1204,  1024,   805,   554,   283,
    1024,  1204,   554,  -283, -1024, -1420, -1338,  -805,
    1024,   805,  -554, -1420, -1024,   283,  1338,  1204,
    1024,   283, -1338,  -805,  1024,  1204,  -554, -1420,
    1024,  -283, -1338,   805,  1024, -1204,  -554,  1420,
    1024,  -805,  -554,  1420, -1024,  -283,  1338, -1204,
    1024, -1204,   554,   283, -1024,  1420, -1338,   805,
    1024, -1420,  1338, -1204,  1024,  -805,   554,  -283,
];

/// Unadapted cosine base, indexed `[frequency * 8 + position]`, scale 8192.
///
/// Only boundary columns feed the LAKHANI prediction multipliers, but the
/// table is kept whole since it is the reference the 1-D bases derive from.
pub(crate) const ICOS_BASE_8X8: [i32; 64] = [
    5793,  5793,  5793,  5793,  5793,  5793,  5793,  5793,
    8035,  6811,  4551,  1598, -1598, -4551, -6811, -8035,
    7568,  3135, -3135, -7568, -7568, -3135,  3135,  7568,
    6811, -1598, -8035, -4551,  4551,  8035,  1598, -6811,
    5793, -5793, -5793,  5793,  5793, -5793, -5793,  5793,
    4551, -8035,  1598,  6811, -6811, -1598,  8035, -4551,
    3135, -7568,  7568, -3135, -3135,  7568, -7568,  3135,
    1598, -4551,  6811, -8035,  8035, -6811,  4551, -1598,
];

/// Axis factor of the two-dimensional basis, indexed `[position * 8 + freq]`.
///
/// The product of two axis entries is one 8x8 basis value at scale 8192
/// (45^2 ~ 2048 per axis pair, doubled by the DC normalisation).
const ICOS_AXIS_8X8: [i32; 64] = [
    32,  44,  42,  38,  32,  25,  17,   9,
    32,  38,  17,  -9, -32, -44, -42, -25,
    32,  25, -17, -44, -32,   9,  42,  38,
    32,   9, -42, -25,  32,  38, -17, -44,
    32,  -9, -42,  25,  32, -38, -17,  44,
    32, -25, -17,  44, -32,  -9,  42, -38,
    32, -38,  17,   9, -32,  44, -42,  25,
    32, -44,  42, -38,  32, -25,  17,  -9,
];

/// Rescale a fixed-point value back to coefficient units, rounding half away
/// from zero.
pub(crate) fn rescale(v: i64) -> i32 {
    let half = i64::from(DCT_RSC_FACTOR) / 2;
    let rounded = if v < 0 { v - half } else { v + half };
    (rounded / i64::from(DCT_RSC_FACTOR)) as i32
}

/// Multiply the IDCT bases by each component's quantisers.
///
/// Quantiser entries of 2048 and above force provably-zero coefficients on
/// 8-bit data and are treated as zero.
pub(crate) fn adapt_icos(img: &mut JpegImage) {
    for cmp in 0..img.cmpc {
        let cmpt = &mut img.components[cmp];

        // Local quantiser copy in natural order.
        let mut quant = [0i32; 64];
        for (ipos, q) in quant.iter_mut().enumerate() {
            let v = cmpt.quant(NATURAL_TO_ZIGZAG[ipos]);
            *q = if v >= 2048 { 0 } else { v };
        }

        cmpt.adpt_idct_8x8 = vec![0i32; 64 * 64];
        for ipos in 0..64 * 64 {
            let pix = ipos / 64; // y * 8 + x
            let freq = ipos % 64; // v * 8 + u
            let (y, x) = (pix / 8, pix % 8);
            let (v, u) = (freq / 8, freq % 8);
            cmpt.adpt_idct_8x8[ipos] =
                ICOS_AXIS_8X8[x * 8 + u] * ICOS_AXIS_8X8[y * 8 + v] * quant[freq];
        }
        for ipos in 0..64 {
            cmpt.adpt_idct_1x8[ipos] = ICOS_IDCT_1X8[ipos] * quant[(ipos % 8) * 8];
            cmpt.adpt_idct_8x1[ipos] = ICOS_IDCT_1X8[ipos] * quant[ipos % 8];
        }
    }
}

/// Fast partial IDCT: one output row position of the first-row frequencies.
pub fn idct_2d_fst_8x1(cmpt: &Component, dpos: usize, ix: usize) -> i64 {
    let ixy = ix << 3;
    let mut idct = 0i64;
    for u in 0..8 {
        idct += i64::from(cmpt.colldata[NATURAL_TO_ZIGZAG[u]][dpos])
            * i64::from(cmpt.adpt_idct_8x1[ixy + u]);
    }
    idct
}

/// Fast partial IDCT: one output column position of the first-column
/// frequencies.
pub fn idct_2d_fst_1x8(cmpt: &Component, dpos: usize, iy: usize) -> i64 {
    let ixy = iy << 3;
    let mut idct = 0i64;
    for v in 0..8 {
        idct += i64::from(cmpt.colldata[NATURAL_TO_ZIGZAG[v * 8]][dpos])
            * i64::from(cmpt.adpt_idct_1x8[ixy + v]);
    }
    idct
}

/// Fast full IDCT for a single output pixel.
pub fn idct_2d_fst_8x8(cmpt: &Component, dpos: usize, ix: usize, iy: usize) -> i64 {
    let ixy = ((iy << 3) + ix) << 6;
    let mut idct = 0i64;
    for k in 0..64 {
        idct += i64::from(cmpt.colldata[NATURAL_TO_ZIGZAG[k]][dpos])
            * i64::from(cmpt.adpt_idct_8x8[ixy + k]);
    }
    idct
}
