// Copyright (c) 2026 Christoph Gaffga
// SPDX-License-Identifier: GPL-3.0-only
// https://github.com/cgaffga/pjgcore

//! PJG container decoding: the exact mirror of the encoder.
//!
//! Consumes the header codes, then replays the arithmetic stream in the
//! encoder's order, rebuilding header data, restart bookkeeping and all
//! coefficient collections. Model constructions and context shifts must
//! match the encoder call for call; any asymmetry desynchronises the coder.

use crate::arith::{ArithmeticDecoder, BinaryModel, UniversalModel};
use crate::dct::ICOS_BASE_8X8;
use crate::io::ByteReader;
use crate::jpeg::zigzag::{NATURAL_TO_ZIGZAG, ZIGZAG_TO_NATURAL};
use crate::jpeg::{bitlen, marker, Component, JpegImage};
use crate::pjg::error::{PjgError, Result};
use crate::pjg::{aavrg_context, get_context_nnb, header, lakh_context, APP_VERSION};
use crate::tables;

/// Decode a PJG container (positioned after the two magic bytes) into the
/// per-file context.
///
/// Returns whether the container carried a fixed settings block.
pub(crate) fn decode<R: ByteReader>(
    img: &mut JpegImage,
    str_in: &mut R,
    discard_meta: bool,
) -> Result<bool> {
    // Header codes precede the arithmetic stream: an optional settings
    // block, then the version byte.
    let mut auto_set = true;
    loop {
        let hcode = str_in.read_byte().ok_or(PjgError::UnexpectedEof)?;
        if hcode == 0x00 {
            let mut settings = [0u8; 8];
            if str_in.read(&mut settings) != 8 {
                return Err(PjgError::UnexpectedEof);
            }
            for cmp in 0..4 {
                img.components[cmp].nois_trs = settings[cmp].min(10);
                img.components[cmp].segm_cnt = settings[4 + cmp].clamp(1, 49);
            }
            auto_set = false;
        } else if hcode >= 0x14 {
            if hcode != APP_VERSION {
                return Err(PjgError::VersionMismatch { found: hcode });
            }
            break;
        } else {
            return Err(PjgError::UnknownHeaderCode(hcode));
        }
    }

    let mut dec = ArithmeticDecoder::new(str_in);

    img.hdrdata = generic(&mut dec)?;
    img.padbit = Some(bit(&mut dec));
    if bit(&mut dec) == 1 {
        img.rst_err = generic(&mut dec)?;
    }

    header::deoptimize_header(img);
    if discard_meta {
        marker::rebuild_header(img);
    }
    marker::setup_imginfo(img, auto_set)?;

    for cmp in 0..img.cmpc {
        decode_component(&mut dec, &mut img.components[cmp]);
    }

    if bit(&mut dec) == 1 {
        img.grbgdata = generic(&mut dec)?;
    }

    Ok(!auto_set)
}

/// Decode one component: the exact mirror of `encoder::encode_component`.
pub(crate) fn decode_component<R: ByteReader>(dec: &mut ArithmeticDecoder<R>, cmpt: &mut Component) {
    cmpt.freqscan = zstscan(dec);
    zdst_high(dec, cmpt);
    ac_high(dec, cmpt);
    zdst_low(dec, cmpt);
    ac_low(dec, cmpt);
    dc(dec, cmpt);
}

/// Decode the zero-sort scan from ranks into the shrinking zig-zag list.
pub(crate) fn zstscan<R: ByteReader>(dec: &mut ArithmeticDecoder<R>) -> [u8; 64] {
    let mut zsrtscan = [0u8; 64];

    let mut freqlist = [0u8; 64];
    for (i, slot) in freqlist.iter_mut().enumerate() {
        *slot = i as u8;
    }

    let mut model = UniversalModel::new(64, 64, 1);

    let mut i = 1;
    while i < 64 {
        model.exclude_symbols(64 - i);

        let cpos = dec.decode(&mut model);
        model.shift_context(cpos);

        if cpos == 0 {
            // The remaining candidates are already in scan order.
            let mut tpos = 0usize;
            for slot in zsrtscan.iter_mut().skip(i) {
                tpos += 1;
                while freqlist[tpos] == 0 {
                    tpos += 1;
                }
                *slot = freqlist[tpos];
            }
            break;
        }

        // Resolve the rank against the remaining candidates.
        let mut tpos = 0usize;
        let mut c = cpos;
        loop {
            if freqlist[tpos] != 0 {
                c -= 1;
            }
            if c == 0 {
                break;
            }
            tpos += 1;
        }

        zsrtscan[i] = freqlist[tpos];
        freqlist[tpos] = 0;
        i += 1;
    }

    zsrtscan[0] = 0;
    zsrtscan
}

/// Decode the high-region zero-distribution list.
fn zdst_high<R: ByteReader>(dec: &mut ArithmeticDecoder<R>, cmpt: &mut Component) {
    let mut model = UniversalModel::new(49 + 1, 25 + 1, 1);
    let w = cmpt.bch;

    for dpos in 0..cmpt.bc {
        let (above, left) = get_context_nnb(dpos, w);
        let above = above.map_or(0, |i| usize::from(cmpt.zdstdata[i]));
        let left = left.map_or(0, |i| usize::from(cmpt.zdstdata[i]));
        model.shift_context((above + left + 2) / 4);
        cmpt.zdstdata[dpos] = dec.decode(&mut model) as u8;
    }
}

/// Decode the first-row and first-column zero-distribution lists.
fn zdst_low<R: ByteReader>(dec: &mut ArithmeticDecoder<R>, cmpt: &mut Component) {
    let mut model = UniversalModel::new(8, 8, 2);

    for dpos in 0..cmpt.bc {
        model.shift_context((usize::from(cmpt.zdstdata[dpos]) + 3) / 7);
        model.shift_context(usize::from(cmpt.eobxhigh[dpos]));
        cmpt.zdstxlow[dpos] = dec.decode(&mut model) as u8;
    }
    for dpos in 0..cmpt.bc {
        model.shift_context((usize::from(cmpt.zdstdata[dpos]) + 3) / 7);
        model.shift_context(usize::from(cmpt.eobyhigh[dpos]));
        cmpt.zdstylow[dpos] = dec.decode(&mut model) as u8;
    }
}

/// Decode the DC prediction errors.
fn dc<R: ByteReader>(dec: &mut ArithmeticDecoder<R>, cmpt: &mut Component) {
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

    for dpos in 0..bc {
        let p_y = dpos / w;
        let p_x = dpos % w;
        let r_x = w - p_x - 1;

        let snum = usize::from(segm_tab[usize::from(cmpt.zdstdata[dpos])]);
        let ctx_avr = aavrg_context(&absv_store, w, dpos, p_y, p_x, r_x);
        let ctx_len = bitlen(ctx_avr) as usize;
        mod_len.shift_model(&[ctx_len, snum]);

        let clen = dec.decode(&mut mod_len) as i32;
        if clen > 0 {
            let mut absv = 1i32;
            let mut bp = clen - 2;
            while bp >= 0 {
                mod_res.shift_model(&[snum, bp as usize]);
                let bt = dec.decode(&mut mod_res) as i32;
                absv = (absv << 1) | bt;
                bp -= 1;
            }
            let sgn = dec.decode(&mut mod_sgn);
            cmpt.colldata[0][dpos] = if sgn == 0 { absv as i16 } else { -absv as i16 };
            absv_store[dpos] = absv as u16;
        }
    }
}

/// Decode the high (7x7) AC coefficients in zero-sort scan order.
fn ac_high<R: ByteReader>(dec: &mut ArithmeticDecoder<R>, cmpt: &mut Component) {
    let segm_tab = tables::segm_table(cmpt.segm_cnt);

    let mut mod_len = UniversalModel::new(11, usize::from(cmpt.segm_cnt).max(11), 2);
    let mut mod_res = BinaryModel::new(usize::from(cmpt.segm_cnt).max(16), 2);
    let mut mod_sgn = BinaryModel::new(9, 1);

    let bc = cmpt.bc;
    let w = cmpt.bch;
    let mut absv_store = vec![0u16; bc];
    let mut sgn_store = vec![0u8; bc];
    let mut zdstls = cmpt.zdstdata.clone();

    cmpt.eobxhigh.fill(0);
    cmpt.eobyhigh.fill(0);

    let freqscan = cmpt.freqscan;
    for i in 1..64 {
        let bpos = usize::from(freqscan[i]);
        let b_x = ZIGZAG_TO_NATURAL[bpos] % 8;
        let b_y = ZIGZAG_TO_NATURAL[bpos] / 8;
        if b_x == 0 || b_y == 0 {
            continue; // first row/column decoded by the low-AC coder
        }

        absv_store.fill(0);
        sgn_store.fill(0);

        let max_val = cmpt.max_v(bpos);
        let max_len = bitlen(max_val) as usize;

        for dpos in 0..bc {
            if zdstls[dpos] == 0 {
                continue;
            }

            let p_y = dpos / w;
            let p_x = dpos % w;
            let r_x = w - p_x - 1;

            let snum = usize::from(segm_tab[usize::from(zdstls[dpos])]);
            let ctx_avr = aavrg_context(&absv_store, w, dpos, p_y, p_x, r_x);
            let ctx_len = bitlen(ctx_avr) as usize;
            mod_len.shift_model(&[ctx_len, snum]);
            mod_len.exclude_symbols(max_len);

            let clen = dec.decode(&mut mod_len) as i32;
            if clen > 0 {
                let mut absv = 1i32;
                let mut bp = clen - 2;
                while bp >= 0 {
                    mod_res.shift_model(&[snum, bp as usize]);
                    let bt = dec.decode(&mut mod_res) as i32;
                    absv = (absv << 1) | bt;
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
                let sgn = dec.decode(&mut mod_sgn);

                cmpt.colldata[bpos][dpos] = if sgn == 0 { absv as i16 } else { -absv as i16 };
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

/// Decode the first-row and first-column AC coefficients.
fn ac_low<R: ByteReader>(dec: &mut ArithmeticDecoder<R>, cmpt: &mut Component) {
    let mut mod_len = UniversalModel::new(11, usize::from(cmpt.segm_cnt).max(11), 2);
    let mut mod_res = BinaryModel::new(1 << 4, 2);
    let mut mod_top = BinaryModel::new(1 << usize::from(cmpt.nois_trs).max(4), 3);
    let mut mod_sgn = BinaryModel::new(11, 1);

    let bc = cmpt.bc;
    let w = cmpt.bch;

    for i in 2..16 {
        let band_x = if i % 2 == 0 { i / 2 } else { 0 };
        let band_y = if i % 2 == 1 { i / 2 } else { 0 };
        let bpos = NATURAL_TO_ZIGZAG[band_x + 8 * band_y];
        let first_col = band_x == 0;

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

            let clen = dec.decode(&mut mod_len) as i32;
            if clen == 0 {
                continue;
            }

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

            while bp >= thrs_bp {
                mod_top.shift_model(&[
                    (ctx_abs >> thrs_bp) as usize,
                    ctx_res as usize,
                    (clen - thrs_bp) as usize,
                ]);
                let bt = dec.decode(&mut mod_top) as i32;
                ctx_res = (ctx_res << 1) | bt;
                bp -= 1;
            }
            // The top bits carry the implicit leading one when present.
            let mut absv = if ctx_res == 0 { 1 } else { ctx_res };
            while bp >= 0 {
                mod_res.shift_model(&[usize::from(zd), bp as usize]);
                let bt = dec.decode(&mut mod_res) as i32;
                absv = (absv << 1) | bt;
                bp -= 1;
            }

            mod_sgn.shift_model(&[ctx_len, ctx_sgn]);
            let sgn = dec.decode(&mut mod_sgn);

            cmpt.colldata[bpos][dpos] = if sgn == 0 { absv as i16 } else { -absv as i16 };
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

/// Decode a generic byte stream up to its 256 terminator.
pub(crate) fn generic<R: ByteReader>(dec: &mut ArithmeticDecoder<R>) -> Result<Vec<u8>> {
    let mut model = UniversalModel::new(256 + 1, 256, 1);
    let mut data = Vec::new();
    loop {
        if dec.overread() {
            return Err(PjgError::DecodedGarbage("unterminated generic stream"));
        }
        let c = dec.decode(&mut model);
        if c == 256 {
            break;
        }
        data.push(c as u8);
        model.shift_context(c);
    }
    Ok(data)
}

/// Decode a single bit under a plain binary model.
pub(crate) fn bit<R: ByteReader>(dec: &mut ArithmeticDecoder<R>) -> u8 {
    let mut model = BinaryModel::new(1, 0);
    dec.decode(&mut model) as u8
}

#[cfg(test)]
mod tests {
    use crate::arith::{ArithmeticDecoder, ArithmeticEncoder};
    use crate::io::{MemReader, MemWriter};
    use crate::jpeg::Component;
    use crate::pjg::encoder;

    fn coded_component(bc: usize, bch: usize) -> Component {
        let mut cmpt = Component::default();
        cmpt.qtable = [4; 64];
        cmpt.bc = bc;
        cmpt.bch = bch;
        cmpt.bcv = bc / bch;
        cmpt.colldata = vec![vec![0i16; bc]; 64];
        cmpt.zdstdata = vec![0; bc];
        cmpt.eobxhigh = vec![0; bc];
        cmpt.eobyhigh = vec![0; bc];
        cmpt.zdstxlow = vec![0; bc];
        cmpt.zdstylow = vec![0; bc];
        cmpt
    }

    #[test]
    fn generic_stream_round_trip() {
        let payload: Vec<u8> = (0..500u32).map(|i| (i * 31 % 251) as u8).collect();
        let mut writer = MemWriter::new();
        {
            let mut enc = ArithmeticEncoder::new(&mut writer);
            encoder::generic(&mut enc, &payload);
            encoder::bit(&mut enc, 1);
            encoder::generic(&mut enc, &[]);
            enc.finish();
        }

        let mut reader = MemReader::new(writer.into_data());
        let mut dec = ArithmeticDecoder::new(&mut reader);
        assert_eq!(super::generic(&mut dec).unwrap(), payload);
        assert_eq!(super::bit(&mut dec), 1);
        assert_eq!(super::generic(&mut dec).unwrap(), Vec::<u8>::new());
    }

    #[test]
    fn zstscan_round_trip() {
        let mut cmpt = coded_component(6, 3);
        // Give a few bands distinct zero counts to force a non-trivial scan.
        cmpt.colldata[7] = vec![1, 2, 3, 4, 5, 6];
        cmpt.colldata[23] = vec![1, 2, 3, 4, 0, 0];
        cmpt.colldata[41] = vec![1, 0, 0, 0, 0, 0];

        let mut writer = MemWriter::new();
        let scan;
        {
            let mut enc = ArithmeticEncoder::new(&mut writer);
            scan = encoder::zstscan(&mut enc, &cmpt);
            enc.finish();
        }

        let mut reader = MemReader::new(writer.into_data());
        let mut dec = ArithmeticDecoder::new(&mut reader);
        let decoded = super::zstscan(&mut dec);
        assert_eq!(decoded, scan);
        assert_eq!(decoded[0], 0);
        assert_eq!(decoded[1], 7);
        assert_eq!(decoded[2], 23);
    }

    #[test]
    fn component_coders_round_trip() {
        let mut cmpt = coded_component(9, 3);
        // DC plane plus a few coefficients in every region.
        cmpt.colldata[0] = vec![12, -3, 0, 7, 1, -1, 0, 2, -9];
        cmpt.colldata[1][0] = 4; // first row band
        cmpt.colldata[2][3] = -2; // first column band
        cmpt.colldata[4][0] = 3; // high band (1,1)
        cmpt.colldata[13][4] = -1; // high band
        crate::pjg::calc_zdst_component(&mut cmpt);

        let original = cmpt.colldata.clone();
        let zdst = cmpt.zdstdata.clone();

        let mut writer = MemWriter::new();
        {
            let mut enc = ArithmeticEncoder::new(&mut writer);
            encoder::encode_component(&mut enc, &mut cmpt);
            enc.finish();
        }

        let mut decoded = coded_component(9, 3);
        let mut reader = MemReader::new(writer.into_data());
        let mut dec = ArithmeticDecoder::new(&mut reader);
        super::decode_component(&mut dec, &mut decoded);

        assert_eq!(decoded.colldata, original);
        assert_eq!(decoded.zdstdata, zdst);
        assert_eq!(decoded.freqscan, cmpt.freqscan);
        // The low lists are consumed by the low-AC coders on both sides.
        assert_eq!(decoded.eobxhigh, cmpt.eobxhigh);
        assert_eq!(decoded.eobyhigh, cmpt.eobyhigh);
    }
}
