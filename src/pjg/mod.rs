// Copyright (c) 2026 Christoph Gaffga
// SPDX-License-Identifier: GPL-3.0-only
// https://github.com/cgaffga/pjgcore

//! PJG container coding: context-modelled arithmetic compression of the
//! split JPEG parts.
//!
//! The encoder and decoder in this module are exact mirrors; every model
//! construction, context shift and coding call happens in the same order on
//! both sides. This module root holds the shared context math: neighbour
//! coordinates, the weighted absolute-average context, the LAKHANI
//! prediction context and the zero-distribution lists.

pub mod decoder;
pub mod encoder;
pub mod error;
pub mod header;

use crate::jpeg::zigzag::ZIGZAG_TO_NATURAL;
use crate::jpeg::JpegImage;
use crate::tables::ABS_CTX_WEIGHTS;

/// Container magic bytes.
pub const PJG_MAGIC: [u8; 2] = [b'J', b'S'];

/// Container format version; a decoder only accepts its own.
pub const APP_VERSION: u8 = 25;

/// Nearest-neighbour coordinates for a simple 2-D context.
///
/// Returns up to two block positions whose values average into the context;
/// edges substitute the nearest available neighbour, the first block has
/// none.
pub(crate) fn get_context_nnb(pos: usize, w: usize) -> (Option<usize>, Option<usize>) {
    if pos == 0 {
        (None, None)
    } else if pos % w == 0 {
        if pos >= 2 * w {
            (Some(pos - 2 * w), Some(pos - w))
        } else {
            (Some(pos - w), Some(pos - w))
        }
    } else if pos < w {
        if pos >= 2 {
            (Some(pos - 1), Some(pos - 2))
        } else {
            (Some(pos - 1), Some(pos - 1))
        }
    } else {
        (Some(pos - 1), Some(pos - w))
    }
}

/// Weighted average of previously coded absolute values around a block.
///
/// Taps: top-top, top-left, top, top-right, left-left, left; each is used
/// only where the block position admits it.
pub(crate) fn aavrg_context(
    abs_store: &[u16],
    w: usize,
    pos: usize,
    p_y: usize,
    p_x: usize,
    r_x: usize,
) -> i32 {
    let mut ctx_avr = 0i32;
    let mut w_ctx = 0i32;
    let mut tap = |idx: usize, weight: i32| {
        ctx_avr += i32::from(abs_store[idx]) * weight;
        w_ctx += weight;
    };

    if p_y >= 2 {
        tap(pos - 2 * w, ABS_CTX_WEIGHTS[0]);
    }
    if p_y >= 1 {
        if p_x >= 1 {
            tap(pos - w - 1, ABS_CTX_WEIGHTS[1]);
        }
        tap(pos - w, ABS_CTX_WEIGHTS[2]);
        if r_x >= 1 {
            tap(pos - w + 1, ABS_CTX_WEIGHTS[3]);
        }
    }
    if p_x >= 2 {
        tap(pos - 2, ABS_CTX_WEIGHTS[4]);
    }
    if p_x >= 1 {
        tap(pos - 1, ABS_CTX_WEIGHTS[5]);
    }

    if w_ctx != 0 {
        (ctx_avr + w_ctx / 2) / w_ctx
    } else {
        0
    }
}

/// LAKHANI context: predict a first-row/first-column coefficient from the
/// same-axis frequencies of this block and the coded neighbour block.
///
/// `bands` are the eight collection indices along the prediction axis with
/// the target band first, `off` is the neighbour offset (1 = left block,
/// row width = upper block), and `pred_cf` the basis-times-quantiser
/// multipliers.
pub(crate) fn lakh_context(
    colldata: &[Vec<i16>],
    bands: &[usize; 8],
    off: usize,
    pred_cf: &[i64; 8],
    pos: usize,
) -> i32 {
    if pred_cf[0] == 0 {
        return 0;
    }

    let mut pred = 0i64;
    for k in 1..8 {
        let x = i64::from(colldata[bands[k]][pos]);
        let a = i64::from(colldata[bands[k]][pos - off]);
        // Boundary cosine parity alternates the neighbour sign.
        let term = if k % 2 == 1 { x + a } else { x - a };
        pred -= term * pred_cf[k];
    }

    // Normalise and complete with the neighbour's own coefficient.
    pred = if pred > 0 {
        pred + pred_cf[0] / 2
    } else {
        pred - pred_cf[0] / 2
    };
    pred /= pred_cf[0];
    pred += i64::from(colldata[bands[0]][pos - off]);

    pred as i32
}

/// Count, per block, the nonzero coefficients of the three AC regions.
pub(crate) fn calc_zdst_lists(img: &mut JpegImage) {
    for cmp in 0..img.cmpc {
        calc_zdst_component(&mut img.components[cmp]);
    }
}

pub(crate) fn calc_zdst_component(cmpt: &mut crate::jpeg::Component) {
    cmpt.zdstdata.fill(0);
    cmpt.zdstxlow.fill(0);
    cmpt.zdstylow.fill(0);

    for bpos in 1..64 {
        let b_x = ZIGZAG_TO_NATURAL[bpos] % 8;
        let b_y = ZIGZAG_TO_NATURAL[bpos] / 8;
        for dpos in 0..cmpt.bc {
            if cmpt.colldata[bpos][dpos] != 0 {
                if b_x == 0 {
                    cmpt.zdstylow[dpos] += 1;
                } else if b_y == 0 {
                    cmpt.zdstxlow[dpos] += 1;
                } else {
                    cmpt.zdstdata[dpos] += 1;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::jpeg::zigzag::NATURAL_TO_ZIGZAG;

    #[test]
    fn nnb_context_coordinates() {
        let w = 4;
        assert_eq!(get_context_nnb(0, w), (None, None));
        // First row: left and left-left.
        assert_eq!(get_context_nnb(3, w), (Some(2), Some(1)));
        assert_eq!(get_context_nnb(1, w), (Some(0), Some(0)));
        // First column: up and up-up.
        assert_eq!(get_context_nnb(8, w), (Some(0), Some(4)));
        assert_eq!(get_context_nnb(4, w), (Some(0), Some(0)));
        // Interior: left and up.
        assert_eq!(get_context_nnb(6, w), (Some(5), Some(2)));
    }

    #[test]
    fn aavrg_uses_available_taps_only() {
        // 3x3 grid with uniform value 10 everywhere.
        let store = [10u16; 9];
        // Interior block (1,1) with all but top-top taps available.
        let ctx = aavrg_context(&store, 3, 4, 1, 1, 1);
        assert_eq!(ctx, 10);
        // First block has no context.
        assert_eq!(aavrg_context(&store, 3, 0, 0, 0, 2), 0);
        // Second block sees only the left tap.
        assert_eq!(aavrg_context(&store, 3, 1, 0, 1, 1), 10);
    }

    #[test]
    fn zdst_lists_split_by_region() {
        let mut img = JpegImage::new();
        img.cmpc = 1;
        let cmpt = &mut img.components[0];
        cmpt.bc = 2;
        cmpt.bch = 2;
        cmpt.bcv = 1;
        cmpt.colldata = vec![vec![0i16; 2]; 64];
        cmpt.zdstdata = vec![0; 2];
        cmpt.eobxhigh = vec![0; 2];
        cmpt.eobyhigh = vec![0; 2];
        cmpt.zdstxlow = vec![0; 2];
        cmpt.zdstylow = vec![0; 2];

        // Block 0: natural (1,0) is first row, (0,2) first column, (2,3) high.
        cmpt.colldata[NATURAL_TO_ZIGZAG[1]][0] = 5; // first row
        cmpt.colldata[NATURAL_TO_ZIGZAG[16]][0] = -3; // first column
        cmpt.colldata[NATURAL_TO_ZIGZAG[26]][0] = 2; // high region
        cmpt.colldata[NATURAL_TO_ZIGZAG[27]][1] = 1; // high region, block 1

        calc_zdst_lists(&mut img);
        let cmpt = &img.components[0];
        assert_eq!(cmpt.zdstxlow, vec![1, 0]);
        assert_eq!(cmpt.zdstylow, vec![1, 0]);
        assert_eq!(cmpt.zdstdata, vec![1, 1]);
    }

    #[test]
    fn lakh_smooth_column_predicts_neighbour_dc_band() {
        // Neighbouring block with identical same-band coefficient and no
        // other frequency content predicts exactly that coefficient.
        let mut colldata = vec![vec![0i16; 2]; 64];
        let bands = [1usize, 8, 16, 24, 32, 40, 48, 56];
        colldata[1][0] = 7;
        let pred_cf = [5793i64 * 16, 8035 * 16, 7568 * 16, 6811 * 16, 5793 * 16, 4551 * 16, 3135 * 16, 1598 * 16];
        let ctx = lakh_context(&colldata, &bands, 1, &pred_cf, 1);
        assert_eq!(ctx, 7);
    }
}
