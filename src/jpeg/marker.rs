// Copyright (c) 2026 Christoph Gaffga
// SPDX-License-Identifier: GPL-3.0-only
// https://github.com/cgaffga/pjgcore

//! Marker segment parsing over the collected header data.
//!
//! `hdrdata` holds complete segments (`0xFF`, type, 16-bit length, payload)
//! back to back, exactly as they appeared between SOI and EOI. The parsers
//! here extract quantisation tables, Huffman tables, restart interval, frame
//! and scan parameters from it; [`setup_imginfo`] derives all per-component
//! geometry afterwards.

use super::error::{JpegError, Result};
use super::huffman::{HuffCodes, HuffTree};
use super::{JpegImage, JpegType, ScanInfo};
use crate::tables;

pub const SOI: u8 = 0xD8;
pub const EOI: u8 = 0xD9;
pub const SOS: u8 = 0xDA;
pub const DHT: u8 = 0xC4;
pub const DQT: u8 = 0xDB;
pub const DRI: u8 = 0xDD;
pub const SOF0: u8 = 0xC0;
pub const SOF1: u8 = 0xC1;
pub const SOF2: u8 = 0xC2;

fn pack(hi: u8, lo: u8) -> usize {
    (usize::from(hi) << 8) | usize::from(lo)
}

/// Segment type and total length at `hpos`, or `None` past the end.
pub(crate) fn segment_at(hdrdata: &[u8], hpos: usize) -> Option<(u8, usize)> {
    if hpos + 4 > hdrdata.len() {
        return None;
    }
    let ty = hdrdata[hpos + 1];
    let len = 2 + pack(hdrdata[hpos + 2], hdrdata[hpos + 3]);
    if len < 4 || hpos + len > hdrdata.len() {
        return None;
    }
    Some((ty, len))
}

/// Parse a DHT segment, building Huffman codes and decode trees.
pub(crate) fn parse_dht(img: &mut JpegImage, seg: &[u8]) -> Result<()> {
    let mut hpos = 4;
    while hpos < seg.len() {
        let class = usize::from(seg[hpos] >> 4);
        let dest = usize::from(seg[hpos] & 0x0F);
        if class >= 2 || dest >= 4 {
            break;
        }
        hpos += 1;

        if hpos + 16 > seg.len() {
            return Err(JpegError::DhtSizeMismatch);
        }
        let counts = &seg[hpos..hpos + 16];
        let total: usize = counts.iter().map(|&c| usize::from(c)).sum();
        if hpos + 16 + total > seg.len() {
            return Err(JpegError::DhtSizeMismatch);
        }

        let codes = HuffCodes::new(counts, &seg[hpos + 16..hpos + 16 + total]);
        img.htrees[class][dest] = Some(HuffTree::new(&codes));
        img.hcodes[class][dest] = Some(codes);

        hpos += 16 + total;
    }

    if hpos != seg.len() {
        return Err(JpegError::DhtSizeMismatch);
    }
    Ok(())
}

/// Parse a DQT segment into the table store.
///
/// Entries arrive in zig-zag order; a zero entry terminates the copy of that
/// table but the segment cursor still advances over the full table size.
pub(crate) fn parse_dqt(img: &mut JpegImage, seg: &[u8]) -> Result<()> {
    let mut hpos = 4;
    while hpos < seg.len() {
        let precision = seg[hpos] >> 4;
        let dest = usize::from(seg[hpos] & 0x0F);
        if precision >= 2 || dest >= 4 {
            break;
        }
        hpos += 1;

        if precision == 0 {
            if hpos + 64 > seg.len() {
                return Err(JpegError::DqtSizeMismatch);
            }
            for i in 0..64 {
                img.qtables[dest][i] = u16::from(seg[hpos + i]);
                if img.qtables[dest][i] == 0 {
                    break;
                }
            }
            hpos += 64;
        } else {
            if hpos + 128 > seg.len() {
                return Err(JpegError::DqtSizeMismatch);
            }
            for i in 0..64 {
                img.qtables[dest][i] = ((u16::from(seg[hpos + 2 * i])) << 8) | u16::from(seg[hpos + 2 * i + 1]);
                if img.qtables[dest][i] == 0 {
                    break;
                }
            }
            hpos += 128;
        }
    }

    if hpos != seg.len() {
        return Err(JpegError::DqtSizeMismatch);
    }
    Ok(())
}

/// Parse a DRI segment (restart interval in MCUs).
pub(crate) fn parse_dri(img: &mut JpegImage, seg: &[u8]) -> Result<()> {
    if seg.len() < 6 {
        return Err(JpegError::UnexpectedEof);
    }
    img.rsti = pack(seg[4], seg[5]);
    Ok(())
}

/// Parse a SOF0/SOF1/SOF2 segment into frame state.
pub(crate) fn parse_sof(img: &mut JpegImage, ty: u8, seg: &[u8]) -> Result<()> {
    img.jpegtype = if ty == SOF2 {
        JpegType::Progressive
    } else {
        JpegType::Sequential
    };

    if seg.len() < 10 {
        return Err(JpegError::UnexpectedEof);
    }
    let precision = seg[4];
    if precision != 8 {
        return Err(JpegError::UnsupportedPrecision(precision));
    }

    img.height = ((u16::from(seg[5])) << 8) | u16::from(seg[6]);
    img.width = ((u16::from(seg[7])) << 8) | u16::from(seg[8]);
    if img.width == 0 || img.height == 0 {
        return Err(JpegError::InvalidDimensions(img.width, img.height));
    }
    let cmpc = seg[9];
    if cmpc > 4 {
        return Err(JpegError::TooManyComponents(cmpc));
    }
    img.cmpc = usize::from(cmpc);
    if seg.len() < 10 + img.cmpc * 3 {
        return Err(JpegError::UnexpectedEof);
    }

    let mut hpos = 10;
    for cmp in 0..img.cmpc {
        let cmpt = &mut img.components[cmp];
        cmpt.jid = seg[hpos];
        // High nibble into sfv, low nibble into sfh: the original's naming
        // convention, which all derived geometry follows.
        cmpt.sfv = usize::from(seg[hpos + 1] >> 4);
        cmpt.sfh = usize::from(seg[hpos + 1] & 0x0F);
        if cmpt.sfv == 0 || cmpt.sfv > 4 || cmpt.sfh == 0 || cmpt.sfh > 4 {
            return Err(JpegError::InvalidSamplingFactors);
        }
        let qdest = seg[hpos + 2];
        if qdest > 3 {
            return Err(JpegError::BadQuantDestination(qdest));
        }
        cmpt.qtable = img.qtables[usize::from(qdest)];
        hpos += 3;
    }

    Ok(())
}

/// Parse an SOS segment: per-component table selectors and band parameters.
pub(crate) fn parse_sos(img: &mut JpegImage, seg: &[u8]) -> Result<ScanInfo> {
    if seg.len() < 5 {
        return Err(JpegError::UnexpectedEof);
    }
    let cmpc = usize::from(seg[4]);
    if cmpc > img.cmpc || cmpc > 4 {
        return Err(JpegError::TooManyScanComponents(seg[4]));
    }
    if seg.len() < 5 + cmpc * 2 + 3 {
        return Err(JpegError::UnexpectedEof);
    }

    let mut scan = ScanInfo {
        cmpc,
        ..Default::default()
    };
    let mut hpos = 5;
    for i in 0..cmpc {
        let cmp = img.components[..img.cmpc]
            .iter()
            .position(|c| c.jid == seg[hpos])
            .ok_or(JpegError::ComponentIdMismatch)?;
        scan.cmp[i] = cmp;
        let huffdc = usize::from(seg[hpos + 1] >> 4);
        let huffac = usize::from(seg[hpos + 1] & 0x0F);
        if huffdc >= 4 || huffac >= 4 {
            return Err(JpegError::BadHuffmanDestination);
        }
        img.components[cmp].huffdc = huffdc;
        img.components[cmp].huffac = huffac;
        hpos += 2;
    }

    scan.from = usize::from(seg[hpos]);
    scan.to = usize::from(seg[hpos + 1]);
    scan.sah = seg[hpos + 2] >> 4;
    scan.sal = seg[hpos + 2] & 0x0F;

    if scan.from > scan.to || scan.from > 63 || scan.to > 63 {
        return Err(JpegError::SpectralSelectionOutOfRange);
    }
    if scan.sah >= 12 || scan.sal >= 12 {
        return Err(JpegError::SuccessiveApproxOutOfRange);
    }

    Ok(scan)
}

/// Dispatch a non-scan header segment during image setup.
///
/// DHT, DRI and SOS are handled separately by the entropy coding passes.
fn parse_header_segment(img: &mut JpegImage, ty: u8, seg: &[u8]) -> Result<()> {
    match ty {
        DQT => parse_dqt(img, seg),
        SOF0 | SOF1 | SOF2 => parse_sof(img, ty, seg),
        0xC3 | 0xC5..=0xC7 | 0xC9..=0xCB | 0xCD..=0xCF => Err(JpegError::UnsupportedSof(ty)),
        0xE0..=0xEF | 0xFE => Ok(()), // APPn / COM preserved verbatim
        0xD0..=0xD7 | SOI | EOI => Err(JpegError::OutOfPlaceMarker(ty)),
        _ => {
            img.warn(format!("unknown marker found: FF {ty:02X}"));
            Ok(())
        }
    }
}

/// Parse the header for image info and derive all component geometry.
///
/// When `auto_settings` is set, per-component segment counts and noise
/// thresholds are chosen from the block count; otherwise the values already
/// present on the components (from the caller or the container) are kept.
pub(crate) fn setup_imginfo(img: &mut JpegImage, auto_settings: bool) -> Result<()> {
    let hdrdata = std::mem::take(&mut img.hdrdata);
    let mut parse_result = Ok(());
    let mut hpos = 0;
    while let Some((ty, len)) = segment_at(&hdrdata, hpos) {
        if ty != SOS && ty != DHT && ty != DRI {
            parse_result = parse_header_segment(img, ty, &hdrdata[hpos..hpos + len]);
            if parse_result.is_err() {
                break;
            }
        }
        hpos += len;
    }
    img.hdrdata = hdrdata;
    parse_result?;

    // Check if the collected information is complete.
    if img.cmpc == 0 {
        return Err(JpegError::IncompleteHeader);
    }
    for cmp in 0..img.cmpc {
        let cmpt = &img.components[cmp];
        if cmpt.sfv == 0 || cmpt.sfh == 0 || cmpt.qtable[0] == 0 || img.jpegtype == JpegType::Unknown
        {
            return Err(JpegError::IncompleteHeader);
        }
    }

    // MCU geometry from the maximum sampling factors.
    img.sfhm = img.components[..img.cmpc].iter().map(|c| c.sfh).max().unwrap_or(0);
    img.sfvm = img.components[..img.cmpc].iter().map(|c| c.sfv).max().unwrap_or(0);
    let h = usize::from(img.height);
    let w = usize::from(img.width);
    img.mcuv = h.div_ceil(8 * img.sfhm);
    img.mcuh = w.div_ceil(8 * img.sfvm);
    img.mcuc = img.mcuv * img.mcuh;

    for cmp in 0..img.cmpc {
        let (sfhm, sfvm, mcuv, mcuh) = (img.sfhm, img.sfvm, img.mcuv, img.mcuh);
        let cmpt = &mut img.components[cmp];
        cmpt.mbs = cmpt.sfv * cmpt.sfh;
        cmpt.bcv = mcuv * cmpt.sfh;
        cmpt.bch = mcuh * cmpt.sfv;
        cmpt.bc = cmpt.bcv * cmpt.bch;
        cmpt.ncv = (h * cmpt.sfh).div_ceil(8 * sfhm);
        cmpt.nch = (w * cmpt.sfv).div_ceil(8 * sfvm);
        cmpt.nc = cmpt.ncv * cmpt.nch;
    }

    // Statistical ids: per-component up to 3 components, shared beyond.
    for cmp in 0..img.cmpc {
        img.components[cmp].sid = if img.cmpc <= 3 { cmp } else { 0 };
    }

    // Allocate collections and zero-distribution side data.
    for cmp in 0..img.cmpc {
        let cmpt = &mut img.components[cmp];
        cmpt.colldata = vec![vec![0i16; cmpt.bc]; 64];
        cmpt.zdstdata = vec![0; cmpt.bc];
        cmpt.eobxhigh = vec![0; cmpt.bc];
        cmpt.eobyhigh = vec![0; cmpt.bc];
        cmpt.zdstxlow = vec![0; cmpt.bc];
        cmpt.zdstylow = vec![0; cmpt.bc];
    }

    if auto_settings {
        for cmp in 0..img.cmpc {
            let cmpt = &mut img.components[cmp];
            cmpt.segm_cnt = tables::CONF_SEGM;
            cmpt.nois_trs = tables::auto_noise_threshold(cmpt.bc, cmpt.sid);
        }
    }

    Ok(())
}

/// Strip meta information, keeping only the segments the codec needs.
pub(crate) fn rebuild_header(img: &mut JpegImage) {
    let mut kept = Vec::with_capacity(img.hdrdata.len());
    let mut hpos = 0;
    while let Some((ty, len)) = segment_at(&img.hdrdata, hpos) {
        if matches!(ty, SOS | DHT | DQT | SOF0 | SOF1 | SOF2 | DRI) {
            kept.extend_from_slice(&img.hdrdata[hpos..hpos + len]);
        }
        hpos += len;
    }
    img.hdrdata = kept;
}
