// Copyright (c) 2026 Christoph Gaffga
// SPDX-License-Identifier: GPL-3.0-only
// https://github.com/cgaffga/pjgcore

//! PJG container encoding.
//!
//! Packs the split JPEG parts into the container: two magic bytes, an
//! optional settings block, the format version, then one arithmetic-coded
//! stream holding the optimised header, the pad bit, restart bookkeeping,
//! every component's coefficient data and any trailing garbage. The decoder
//! must consume in exactly this order.

use crate::arith::{ArithmeticEncoder, BinaryModel, UniversalModel};
use crate::dct::ICOS_BASE_8X8;
use crate::io::ByteWriter;
use crate::jpeg::zigzag::{NATURAL_TO_ZIGZAG, ZIGZAG_TO_NATURAL};
use crate::jpeg::{bitlen, marker, Component, JpegImage};
use crate::pjg::error::Result;
use crate::pjg::{aavrg_context, get_context_nnb, header, lakh_context, APP_VERSION, PJG_MAGIC};
use crate::tables;

/// Encode the whole per-file context into a PJG container.
pub(crate) fn encode<W: ByteWriter>(
    img: &mut JpegImage,
    str_out: &mut W,
    auto_set: bool,
    discard_meta: bool,
) -> Result<()> {
    str_out.write(&PJG_MAGIC);

    // Fixed user settings travel in front of the coded stream; in auto mode
    // the decoder rederives them from the block counts.
    if !auto_set {
        str_out.write_byte(0x00);
        for cmp in 0..4 {
            str_out.write_byte(img.components[cmp].nois_trs);
        }
        for cmp in 0..4 {
            str_out.write_byte(img.components[cmp].segm_cnt);
        }
    }

    str_out.write_byte(APP_VERSION);

    let mut enc = ArithmeticEncoder::new(str_out);

    if discard_meta {
        marker::rebuild_header(img);
    }
    header::optimize_header(img);

    // The pad bit cannot be recovered from the header; store it, defaulting
    // to 1 when no scan ever needed padding.
    if img.padbit.is_none() {
        img.padbit = Some(1);
    }

    generic(&mut enc, &img.hdrdata);
    bit(&mut enc, img.padbit.unwrap_or(1));

    bit(&mut enc, u8::from(!img.rst_err.is_empty()));
    if !img.rst_err.is_empty() {
        img.rst_err.truncate(img.scan_count);
        generic(&mut enc, &img.rst_err);
    }

    for cmp in 0..img.cmpc {
        encode_component(&mut enc, &mut img.components[cmp]);
    }

    bit(&mut enc, u8::from(!img.grbgdata.is_empty()));
    if !img.grbgdata.is_empty() {
        generic(&mut enc, &img.grbgdata);
    }

    enc.finish();
    Ok(())
}

/// Encode one component: scan order, zero lists, AC regions, DC.
pub(crate) fn encode_component<W: ByteWriter>(enc: &mut ArithmeticEncoder<W>, cmpt: &mut Component) {
    cmpt.freqscan = zstscan(enc, cmpt);
    zdst_high(enc, cmpt);
    ac_high(enc, cmpt);
    zdst_low(enc, cmpt);
    ac_low(enc, cmpt);
    dc(enc, cmpt);
}

/// Zero-sorted frequency scan: collection indices ordered by ascending
/// zero count, the DC slot pinned first.
pub(crate) fn get_zerosort_scan(cmpt: &Component) -> [u8; 64] {
    let mut index = [0u8; 64];
    for (i, slot) in index.iter_mut().enumerate() {
        *slot = i as u8;
    }

    let zero_dist: Vec<usize> = (0..64)
        .map(|bpos| cmpt.colldata[bpos].iter().filter(|&&c| c == 0).count())
        .collect();

    // Stable sort keeps the zig-zag order between equal zero counts.
    index[1..].sort_by_key(|&bpos| zero_dist[usize::from(bpos)]);
    index
}

/// Encode the zero-sort scan as ranks into the shrinking zig-zag list.
pub(crate) fn zstscan<W: ByteWriter>(enc: &mut ArithmeticEncoder<W>, cmpt: &Component) -> [u8; 64] {
    let zsrtscan = get_zerosort_scan(cmpt);

    // Remaining candidates; value 0 marks a removed entry (and slot 0, the
    // DC position, starts removed by carrying the value 0).
    let mut freqlist = [0u8; 64];
    for (i, slot) in freqlist.iter_mut().enumerate() {
        *slot = i as u8;
    }

    let mut model = UniversalModel::new(64, 64, 1);

    for i in 1..64 {
        model.exclude_symbols(64 - i);

        // If the remaining candidates already match the remaining scan, a
        // rank of zero terminates the coding early.
        let mut tpos = 0usize;
        let mut c = i;
        while c < 64 {
            tpos += 1;
            while freqlist[tpos] == 0 {
                tpos += 1;
            }
            if freqlist[tpos] != zsrtscan[c] {
                break;
            }
            c += 1;
        }
        if c == 64 {
            enc.encode(&mut model, 0);
            break;
        }

        // Rank of the next scan entry among the remaining candidates.
        let mut cpos = 1usize;
        tpos = 0;
        while freqlist[tpos] != zsrtscan[i] {
            if freqlist[tpos] != 0 {
                cpos += 1;
            }
            tpos += 1;
        }
        freqlist[tpos] = 0;

        enc.encode(&mut model, cpos);
        model.shift_context(cpos);
    }

    zsrtscan
}

/// Encode the high-region zero-distribution list.
fn zdst_high<W: ByteWriter>(enc: &mut ArithmeticEncoder<W>, cmpt: &Component) {
    let mut model = UniversalModel::new(49 + 1, 25 + 1, 1);
    let zdstls = &cmpt.zdstdata;
    let w = cmpt.bch;

    for dpos in 0..zdstls.len() {
        let (above, left) = get_context_nnb(dpos, w);
        let above = above.map_or(0, |i| usize::from(zdstls[i]));
        let left = left.map_or(0, |i| usize::from(zdstls[i]));
        model.shift_context((above + left + 2) / 4);
        enc.encode(&mut model, usize::from(zdstls[dpos]));
    }
}

/// Encode the first-row and first-column zero-distribution lists.
fn zdst_low<W: ByteWriter>(enc: &mut ArithmeticEncoder<W>, cmpt: &Component) {
    let mut model = UniversalModel::new(8, 8, 2);

    for dpos in 0..cmpt.bc {
        model.shift_context((usize::from(cmpt.zdstdata[dpos]) + 3) / 7);
        model.shift_context(usize::from(cmpt.eobxhigh[dpos]));
        enc.encode(&mut model, usize::from(cmpt.zdstxlow[dpos]));
    }
    for dpos in 0..cmpt.bc {
        model.shift_context((usize::from(cmpt.zdstdata[dpos]) + 3) / 7);
        model.shift_context(usize::from(cmpt.eobyhigh[dpos]));
        enc.encode(&mut model, usize::from(cmpt.zdstylow[dpos]));
    }
}

/// Encode the DC prediction errors.
fn dc<W: ByteWriter>(enc: &mut ArithmeticEncoder<W>, cmpt: &Component) {
    let segm_tab = tables::segm_table(cmpt.segm_cnt);
    let max_val = cmpt.max_v(0);
    let max_len = bitlen(max_val) as usize;

    let mut mod_len = UniversalModel::new(
        max_len + 1,
        usize::from(cmpt.segm_cnt).max(max_len + 1),
        2,
    );
    let mut mod_res = BinaryModel::new(usize::from(cmpt.segm_cnt).max(16), 2);
    let mut mod_sgn = BinaryModel::new(1, 0);

    let bc = cmpt.bc;
    let w = cmpt.bch;
    let mut absv_store = vec![0u16; bc];
    let coeffs = &cmpt.colldata[0];
    let zdstls = &cmpt.zdstdata;

    for dpos in 0..bc {
        let p_y = dpos / w;
        let p_x = dpos % w;
        let r_x = w - p_x - 1;

        let snum = usize::from(segm_tab[usize::from(zdstls[dpos])]);
        let ctx_avr = aavrg_context(&absv_store, w, dpos, p_y, p_x, r_x);
        let ctx_len = bitlen(ctx_avr) as usize;
        mod_len.shift_model(&[ctx_len, snum]);

        if coeffs[dpos] == 0 {
            enc.encode(&mut mod_len, 0);
        } else {
            let absv = i32::from(coeffs[dpos]).abs();
            let clen = bitlen(absv);
            let sgn = usize::from(coeffs[dpos] < 0);
            enc.encode(&mut mod_len, clen as usize);
            // The first set bit is implied, residual starts at clen - 2.
            let mut bp = clen - 2;
            while bp >= 0 {
                mod_res.shift_model(&[snum, bp as usize]);
                enc.encode(&mut mod_res, ((absv >> bp) & 0x1) as usize);
                bp -= 1;
            }
            enc.encode(&mut mod_sgn, sgn);
            absv_store[dpos] = absv as u16;
        }
    }
}

/// Encode the high (7x7) AC coefficients in zero-sort scan order.
fn ac_high<W: ByteWriter>(enc: &mut ArithmeticEncoder<W>, cmpt: &mut Component) {
    let segm_tab = tables::segm_table(cmpt.segm_cnt);

    let mut mod_len = UniversalModel::new(11, usize::from(cmpt.segm_cnt).max(11), 2);
    let mut mod_res = BinaryModel::new(usize::from(cmpt.segm_cnt).max(16), 2);
    let mut mod_sgn = BinaryModel::new(9, 1);

    let bc = cmpt.bc;
    let w = cmpt.bch;
    let mut absv_store = vec![0u16; bc];
    let mut sgn_store = vec![0u8; bc];
    // Worked on a copy; the DC coder still needs the full list afterwards.
    let mut zdstls = cmpt.zdstdata.clone();

    cmpt.eobxhigh.fill(0);
    cmpt.eobyhigh.fill(0);

    let freqscan = cmpt.freqscan;
    for i in 1..64 {
        let bpos = usize::from(freqscan[i]);
        let b_x = ZIGZAG_TO_NATURAL[bpos] % 8;
        let b_y = ZIGZAG_TO_NATURAL[bpos] / 8;
        if b_x == 0 || b_y == 0 {
            continue; // first row/column coded by the low-AC coder
        }

        absv_store.fill(0);
        sgn_store.fill(0);

        let max_val = cmpt.max_v(bpos);
        let max_len = bitlen(max_val) as usize;

        for dpos in 0..bc {
            if zdstls[dpos] == 0 {
                continue; // block has no high coefficients left
            }

            let p_y = dpos / w;
            let p_x = dpos % w;
            let r_x = w - p_x - 1;

            let snum = usize::from(segm_tab[usize::from(zdstls[dpos])]);
            let ctx_avr = aavrg_context(&absv_store, w, dpos, p_y, p_x, r_x);
            let ctx_len = bitlen(ctx_avr) as usize;
            mod_len.shift_model(&[ctx_len, snum]);
            mod_len.exclude_symbols(max_len);

            let coef = cmpt.colldata[bpos][dpos];
            if coef == 0 {
                enc.encode(&mut mod_len, 0);
            } else {
                let absv = i32::from(coef).abs();
                let clen = bitlen(absv);
                let sgn = usize::from(coef < 0);
                enc.encode(&mut mod_len, clen as usize);
                let mut bp = clen - 2;
                while bp >= 0 {
                    mod_res.shift_model(&[snum, bp as usize]);
                    enc.encode(&mut mod_res, ((absv >> bp) & 0x1) as usize);
                    bp -= 1;
                }
                let mut ctx_sgn = if p_x > 0 {
                    usize::from(sgn_store[dpos - 1])
                } else {
                    0
                };
                if p_y > 0 {
                    ctx_sgn += 3 * usize::from(sgn_store[dpos - w]);
                }
                mod_sgn.shift_context(ctx_sgn);
                enc.encode(&mut mod_sgn, sgn);

                absv_store[dpos] = absv as u16;
                sgn_store[dpos] = sgn as u8 + 1;
                zdstls[dpos] -= 1;
                if (b_x as u8) > cmpt.eobxhigh[dpos] {
                    cmpt.eobxhigh[dpos] = b_x as u8;
                }
                if (b_y as u8) > cmpt.eobyhigh[dpos] {
                    cmpt.eobyhigh[dpos] = b_y as u8;
                }
            }
        }

        mod_len.flush_model();
        mod_res.flush_model();
        mod_sgn.flush_model();
    }
}

/// Encode the first-row and first-column AC coefficients with the LAKHANI
/// prediction context.
fn ac_low<W: ByteWriter>(enc: &mut ArithmeticEncoder<W>, cmpt: &mut Component) {
    let mut mod_len = UniversalModel::new(11, usize::from(cmpt.segm_cnt).max(11), 2);
    let mut mod_res = BinaryModel::new(1 << 4, 2);
    let mut mod_top = BinaryModel::new(1 << usize::from(cmpt.nois_trs).max(4), 3);
    let mut mod_sgn = BinaryModel::new(11, 1);

    let bc = cmpt.bc;
    let w = cmpt.bch;

    // Alternate first-column and first-row bands outward from the DC.
    for i in 2..16 {
        let band_x = if i % 2 == 0 { i / 2 } else { 0 };
        let band_y = if i % 2 == 1 { i / 2 } else { 0 };
        let bpos = NATURAL_TO_ZIGZAG[band_x + 8 * band_y];
        let first_col = band_x == 0;

        // Prediction axis: the eight same-direction bands with their
        // basis-times-quantiser multipliers, target band first.
        let mut bands = [0usize; 8];
        let mut pred_cf = [0i64; 8];
        for k in 0..8 {
            let nat = if first_col { k + 8 * band_y } else { band_x + 8 * k };
            bands[k] = NATURAL_TO_ZIGZAG[nat];
            pred_cf[k] = i64::from(ICOS_BASE_8X8[k * 8]) * i64::from(cmpt.quant(bands[k]));
        }
        let off = if first_col { 1 } else { w };

        let max_valp = cmpt.max_v(bpos);
        let max_len = bitlen(max_valp);
        let thrs_bp = (max_len - i32::from(cmpt.nois_trs)).max(0);

        for dpos in 0..bc {
            let zd = if first_col {
                cmpt.zdstylow[dpos]
            } else {
                cmpt.zdstxlow[dpos]
            };
            if zd == 0 {
                continue;
            }

            let p_y = dpos / w;
            let p_x = dpos % w;
            let edge = if first_col { p_x } else { p_y };

            let mut ctx_lak = if edge > 0 {
                lakh_context(&cmpt.colldata, &bands, off, &pred_cf, dpos)
            } else {
                0
            };
            ctx_lak = ctx_lak.clamp(-max_valp, max_valp);
            let ctx_len = bitlen(ctx_lak.abs()) as usize;

            mod_len.shift_model(&[ctx_len, usize::from(zd)]);
            mod_len.exclude_symbols(max_len as usize);

            let coef = cmpt.colldata[bpos][dpos];
            if coef == 0 {
                enc.encode(&mut mod_len, 0);
                continue;
            }

            let absv = i32::from(coef).abs();
            let clen = bitlen(absv);
            let sgn = usize::from(coef < 0);
            enc.encode(&mut mod_len, clen as usize);

            let mut bp = clen - 2;
            let mut ctx_res: i32 = i32::from(bp >= thrs_bp);
            let ctx_abs = ctx_lak.abs();
            let ctx_sgn = if ctx_lak == 0 {
                0
            } else if ctx_lak > 0 {
                1
            } else {
                2
            };

            // Bitplanes above the noise threshold track the prediction.
            while bp >= thrs_bp {
                mod_top.shift_model(&[
                    (ctx_abs >> thrs_bp) as usize,
                    ctx_res as usize,
                    (clen - thrs_bp) as usize,
                ]);
                let bt = (absv >> bp) & 0x1;
                enc.encode(&mut mod_top, bt as usize);
                ctx_res = (ctx_res << 1) | bt;
                bp -= 1;
            }
            while bp >= 0 {
                mod_res.shift_model(&[usize::from(zd), bp as usize]);
                let bt = (absv >> bp) & 0x1;
                enc.encode(&mut mod_res, bt as usize);
                bp -= 1;
            }

            mod_sgn.shift_model(&[ctx_len, ctx_sgn]);
            enc.encode(&mut mod_sgn, sgn);

            if first_col {
                cmpt.zdstylow[dpos] -= 1;
            } else {
                cmpt.zdstxlow[dpos] -= 1;
            }
        }

        mod_len.flush_model();
        mod_res.flush_model();
        mod_top.flush_model();
        mod_sgn.flush_model();
    }
}

/// Encode a generic byte stream with a previous-byte context, terminated by
/// the out-of-band symbol 256.
pub(crate) fn generic<W: ByteWriter>(enc: &mut ArithmeticEncoder<W>, data: &[u8]) {
    let mut model = UniversalModel::new(256 + 1, 256, 1);
    for &byte in data {
        enc.encode(&mut model, usize::from(byte));
        model.shift_context(usize::from(byte));
    }
    enc.encode(&mut model, 256);
}

/// Encode a single bit under a plain binary model.
pub(crate) fn bit<W: ByteWriter>(enc: &mut ArithmeticEncoder<W>, bit: u8) {
    let mut model = BinaryModel::new(1, 0);
    enc.encode(&mut model, usize::from(bit));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zerosort_scan_is_permutation_with_fixed_dc() {
        let mut cmpt = Component::default();
        cmpt.bc = 4;
        cmpt.colldata = vec![vec![0i16; 4]; 64];
        // Band 5 densest, band 9 next, the rest all zero.
        cmpt.colldata[5] = vec![1, 2, 3, 4];
        cmpt.colldata[9] = vec![1, 0, 2, 0];

        let scan = get_zerosort_scan(&cmpt);
        assert_eq!(scan[0], 0);
        assert_eq!(scan[1], 5);
        assert_eq!(scan[2], 9);

        let mut seen = [false; 64];
        for &f in &scan {
            assert!(!seen[usize::from(f)]);
            seen[usize::from(f)] = true;
        }
        assert!(seen.iter().all(|&s| s));
    }

    #[test]
    fn zerosort_scan_is_stable_for_equal_counts() {
        let mut cmpt = Component::default();
        cmpt.bc = 2;
        cmpt.colldata = vec![vec![0i16; 2]; 64];
        let scan = get_zerosort_scan(&cmpt);
        // All-equal zero counts leave the natural order untouched.
        for (i, &f) in scan.iter().enumerate() {
            assert_eq!(usize::from(f), i);
        }
    }
}
