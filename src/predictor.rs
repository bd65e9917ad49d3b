// Copyright (c) 2026 Christoph Gaffga
// SPDX-License-Identifier: GPL-3.0-only
// https://github.com/cgaffga/pjgcore

//! Block-to-block DC prediction.
//!
//! Applied after decoding (and reversed before re-encoding), the DC plane of
//! each component is replaced by prediction errors against the left/upper
//! neighbours. Two predictors exist; the choice is bitstream-affecting and
//! must match between compression and reconstruction.

use crate::dct;
use crate::jpeg::{Component, JpegImage};

/// DC predictor selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Predictor {
    /// Edge-matching predictor built on partial 1-D inverse transforms.
    #[default]
    OneDimDct,
    /// Median predictor of LOCO-I / JPEG-LS.
    LocoI,
}

/// Replace DC coefficients by prediction errors.
///
/// Runs from the last block backwards so every prediction sees the original
/// neighbour values.
pub(crate) fn predict_dc(img: &mut JpegImage, predictor: Predictor) {
    for cmp in 0..img.cmpc {
        let cmpt = &mut img.components[cmp];
        let absmax = cmpt.max_v(0);
        let corr = 2 * absmax + 1;

        for dpos in (1..cmpt.bc).rev() {
            let pred = predict(cmpt, predictor, dpos);
            let mut coef = i32::from(cmpt.colldata[0][dpos]) - pred;
            // Wrap the error back into the coefficient range.
            if coef > absmax {
                coef -= corr;
            } else if coef < -absmax {
                coef += corr;
            }
            cmpt.colldata[0][dpos] = coef as i16;
        }
    }
}

/// Restore DC coefficients from prediction errors.
///
/// Runs forwards so every prediction sees already-restored neighbours.
pub(crate) fn unpredict_dc(img: &mut JpegImage, predictor: Predictor) {
    for cmp in 0..img.cmpc {
        let cmpt = &mut img.components[cmp];
        let absmax = cmpt.max_v(0);
        let corr = 2 * absmax + 1;

        for dpos in 1..cmpt.bc {
            let pred = predict(cmpt, predictor, dpos);
            let mut coef = i32::from(cmpt.colldata[0][dpos]) + pred;
            if coef > absmax {
                coef -= corr;
            } else if coef < -absmax {
                coef += corr;
            }
            cmpt.colldata[0][dpos] = coef as i16;
        }
    }
}

fn predict(cmpt: &mut Component, predictor: Predictor, dpos: usize) -> i32 {
    match predictor {
        Predictor::OneDimDct => dc_1ddct_predictor(cmpt, dpos),
        Predictor::LocoI => dc_coll_predictor(cmpt, dpos),
    }
}

/// 1-D DCT predictor: match the boundary rows/columns of the neighbouring
/// blocks against this block's opposite edge, with the DC zeroed out.
fn dc_1ddct_predictor(cmpt: &mut Component, dpos: usize) -> i32 {
    let w = cmpt.bch;
    let px = dpos % w;
    let py = dpos / w;

    // The partial transforms must not see this block's DC.
    let swap = cmpt.colldata[0][dpos];
    cmpt.colldata[0][dpos] = 0;

    let mut pred: i64 = 0;
    if px > 0 && py > 0 {
        let pa = dct::idct_2d_fst_8x1(cmpt, dpos - 1, 7);
        let xa = dct::idct_2d_fst_8x1(cmpt, dpos, 0);
        let pb = dct::idct_2d_fst_1x8(cmpt, dpos - w, 7);
        let xb = dct::idct_2d_fst_1x8(cmpt, dpos, 0);
        pred = ((pa - xa) + (pb - xb)) * 4;
    } else if px > 0 {
        let pa = dct::idct_2d_fst_8x1(cmpt, dpos - 1, 7);
        let xa = dct::idct_2d_fst_8x1(cmpt, dpos, 0);
        pred = (pa - xa) * 8;
    } else if py > 0 {
        let pb = dct::idct_2d_fst_1x8(cmpt, dpos - w, 7);
        let xb = dct::idct_2d_fst_1x8(cmpt, dpos, 0);
        pred = (pb - xb) * 8;
    }

    cmpt.colldata[0][dpos] = swap;

    // Clamp to the dequantized DC range, then return to quantized units.
    let rsc = i64::from(dct::DCT_RSC_FACTOR);
    pred = pred.clamp(-1024 * rsc, 1016 * rsc);
    pred /= i64::from(cmpt.quant(0));
    dct::rescale(pred)
}

/// LOCO-I predictor over the raw DC collection.
fn dc_coll_predictor(cmpt: &Component, dpos: usize) -> i32 {
    let coeffs = &cmpt.colldata[0];
    let w = cmpt.bch;
    let mut a = 0i32;
    let mut b = 0i32;
    let mut c = 0i32;

    if dpos < w {
        a = i32::from(coeffs[dpos - 1]);
    } else if dpos % w == 0 {
        b = i32::from(coeffs[dpos - w]);
    } else {
        a = i32::from(coeffs[dpos - 1]);
        b = i32::from(coeffs[dpos - w]);
        c = i32::from(coeffs[dpos - 1 - w]);
    }

    plocoi(a, b, c)
}

/// Median predictor: `a` left, `b` above, `c` above-left.
pub(crate) fn plocoi(a: i32, b: i32, c: i32) -> i32 {
    let min = a.min(b);
    let max = a.max(b);

    if c >= max {
        min
    } else if c <= min {
        max
    } else {
        a + b - c
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dct::adapt_icos;

    fn test_image(w: usize, h: usize, q: u16) -> JpegImage {
        let mut img = JpegImage::new();
        img.cmpc = 1;
        let cmpt = &mut img.components[0];
        cmpt.qtable = [q; 64];
        cmpt.bch = w;
        cmpt.bcv = h;
        cmpt.bc = w * h;
        cmpt.colldata = vec![vec![0i16; w * h]; 64];
        img
    }

    #[test]
    fn plocoi_median_property() {
        for a in -8i32..=8 {
            for b in -8i32..=8 {
                for c in -8i32..=8 {
                    let p = plocoi(a, b, c);
                    if c >= a.min(b) && c <= a.max(b) {
                        assert!(p >= a.min(b) && p <= a.max(b), "({a},{b},{c}) -> {p}");
                    }
                }
            }
        }
        assert_eq!(plocoi(3, 7, 9), 3); // c above both: take min
        assert_eq!(plocoi(3, 7, 1), 7); // c below both: take max
        assert_eq!(plocoi(3, 7, 5), 5); // in between: plane prediction
    }

    #[test]
    fn loco_round_trip() {
        let mut img = test_image(4, 3, 16);
        let values: Vec<i16> = (0..12).map(|i| (i * 7 % 23) as i16 - 11).collect();
        img.components[0].colldata[0].copy_from_slice(&values);

        predict_dc(&mut img, Predictor::LocoI);
        assert_ne!(img.components[0].colldata[0], values);
        // First block is never predicted.
        assert_eq!(img.components[0].colldata[0][0], values[0]);

        unpredict_dc(&mut img, Predictor::LocoI);
        assert_eq!(img.components[0].colldata[0], values);
    }

    #[test]
    fn one_d_dct_round_trip() {
        let mut img = test_image(3, 3, 8);
        adapt_icos(&mut img);
        let values: Vec<i16> = vec![50, 48, 47, 45, 44, 40, 38, 36, 30];
        img.components[0].colldata[0].copy_from_slice(&values);
        // Some AC content so the edge transforms are non-trivial.
        img.components[0].colldata[1][4] = 3;
        img.components[0].colldata[2][4] = -2;

        predict_dc(&mut img, Predictor::OneDimDct);
        unpredict_dc(&mut img, Predictor::OneDimDct);
        assert_eq!(img.components[0].colldata[0], values);
    }

    #[test]
    fn smooth_gradient_predicts_well() {
        // On a smooth DC ramp the 1-D DCT predictor should leave only small
        // errors.
        let mut img = test_image(4, 4, 4);
        adapt_icos(&mut img);
        for dpos in 0..16 {
            img.components[0].colldata[0][dpos] = (100 + 2 * (dpos % 4) + 2 * (dpos / 4)) as i16;
        }
        predict_dc(&mut img, Predictor::OneDimDct);
        for dpos in 1..16 {
            assert!(
                img.components[0].colldata[0][dpos].abs() <= 4,
                "large residual at {dpos}: {}",
                img.components[0].colldata[0][dpos]
            );
        }
    }
}
