// Copyright (c) 2026 Christoph Gaffga
// SPDX-License-Identifier: GPL-3.0-only
// https://github.com/cgaffga/pjgcore

//! Fixed tables conditioning the component coders.
//!
//! Coefficient range bounds, automatic per-component settings and the
//! zero-count segmentation used to split arithmetic model statistics by
//! block sparsity.

use crate::jpeg::zigzag::ZIGZAG_TO_NATURAL;

/// Exact per-axis DCT bound classes for 8-bit samples (amplitude 128):
/// `A(f) = C(f) * sum_p |cos((2p+1) f pi/16)|` falls into three classes,
/// and the 2-D bound is `ceil(32 * A(u) * A(v))`.
const FREQ_MAX_CLASS: [usize; 8] = [0, 1, 2, 1, 0, 1, 2, 1];
const FREQ_MAX_MATRIX: [[i32; 3]; 3] = [
    [1024, 928, 947],
    [928, 841, 858],
    [947, 858, 875],
];

/// Largest absolute DCT coefficient possible at a zig-zag frequency.
pub(crate) fn freq_max(bpos: usize) -> i32 {
    let nat = ZIGZAG_TO_NATURAL[bpos];
    FREQ_MAX_MATRIX[FREQ_MAX_CLASS[nat / 8]][FREQ_MAX_CLASS[nat % 8]]
}

/// Segment count used by the automatic settings.
pub(crate) const CONF_SEGM: u8 = 10;

/// Block-count thresholds per statistical id, descending; the first row
/// whose threshold fits the component's block count selects the noise
/// threshold row below. The zero row terminates the lookup.
const CONF_SETS: [[usize; 4]; 6] = [
    [1500000, 1500000, 1500000, 1500000],
    [700000, 700000, 700000, 700000],
    [300000, 300000, 300000, 300000],
    [100000, 100000, 100000, 100000],
    [32000, 32000, 32000, 32000],
    [0, 0, 0, 0],
];

const CONF_NTRS: [[u8; 4]; 6] = [
    [7, 8, 8, 7],
    [7, 7, 7, 7],
    [6, 7, 7, 6],
    [6, 6, 6, 6],
    [5, 6, 6, 5],
    [4, 5, 5, 4],
];

/// Automatic noise threshold for a component of `bc` blocks.
pub(crate) fn auto_noise_threshold(bc: usize, sid: usize) -> u8 {
    let mut i = 0;
    while CONF_SETS[i][sid] > bc {
        i += 1;
    }
    CONF_NTRS[i][sid]
}

/// Segmentation table: maps a zero-distribution count (0..=49) to a segment
/// number below `segm_cnt`, partitioning the range evenly.
pub(crate) fn segm_table(segm_cnt: u8) -> [u8; 50] {
    let s = usize::from(segm_cnt.clamp(1, 49));
    let mut table = [0u8; 50];
    for (z, seg) in table.iter_mut().enumerate() {
        *seg = ((z * s) / 50).min(s - 1) as u8;
    }
    table
}

/// Weights of the six absolute-value prediction taps, in the order
/// top-top, top-left, top, top-right, left-left, left.
pub(crate) const ABS_CTX_WEIGHTS: [i32; 6] = [1, 1, 2, 1, 1, 2];
