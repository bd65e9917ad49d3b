// Copyright (c) 2026 Christoph Gaffga
// SPDX-License-Identifier: GPL-3.0-only
// https://github.com/cgaffga/pjgcore

//! JPEG reading and entropy decoding.
//!
//! [`read`] splits the input byte stream into header data, de-stuffed
//! entropy-coded data and trailing garbage, tallying misplaced restart
//! markers on the way. [`decode`] then runs the Huffman decode over all
//! scans, filling the per-component coefficient collections. Sequential and
//! all four progressive scan kinds (DC/AC x first/refinement) are handled.

use super::bitio::BitReader;
use super::error::{JpegError, Result};
use super::huffman::HuffTree;
use super::marker;
use super::{
    devli, e_devli, CodingStatus, Component, JpegImage, JpegType, McuState, ScanInfo,
};
use crate::io::ByteReader;

/// Read a JPEG stream (positioned after the SOI marker) into the context.
///
/// Header segments are collected verbatim into `hdrdata`; entropy-coded
/// bytes are de-stuffed into `huffdata` with restart markers stripped;
/// anything after EOI lands in `grbgdata`. When `auto_settings` is set,
/// image setup derives per-component coder settings from the block counts.
pub(crate) fn read<R: ByteReader>(
    img: &mut JpegImage,
    str_in: &mut R,
    auto_settings: bool,
) -> Result<()> {
    img.scan_count = 0;

    let mut hdrw: Vec<u8> = Vec::with_capacity(4096);
    let mut huffw: Vec<u8> = Vec::new();
    let mut complete = false;
    let mut ty: u8 = 0x00;

    'reader: loop {
        if ty == marker::SOS {
            // Switch to entropy data reading mode until the next real marker.
            let mut cpos = 0usize; // restart marker cadence counter
            let mut crst = 0u32; // trailing cadence restarts before scan end
            let mut next_marker: Option<u8> = None;

            'scan: loop {
                let Some(mut tmp) = str_in.read_byte() else {
                    break 'scan;
                };
                if tmp != 0xFF {
                    crst = 0;
                    loop {
                        huffw.push(tmp);
                        match str_in.read_byte() {
                            Some(b) => tmp = b,
                            None => break 'scan,
                        }
                        if tmp == 0xFF {
                            break;
                        }
                    }
                }
                // 0xFF seen: stuffing, cadence restart, or scan end.
                let Some(nxt) = str_in.read_byte() else {
                    break 'scan;
                };
                if nxt == 0x00 {
                    crst = 0;
                    huffw.push(0xFF);
                } else if nxt == 0xD0 + (cpos % 8) as u8 {
                    cpos += 1;
                    crst += 1;
                } else {
                    // End of the current scan; any cadence restarts counted
                    // right before it were set wrongly by the producer.
                    if crst > 0 {
                        if img.rst_err.is_empty() {
                            img.rst_err.resize(img.scan_count + 1, 0);
                        }
                        if crst > 255 {
                            img.warn(format!("Severe false use of RST markers ({crst})"));
                            crst = 255;
                        } else {
                            img.warn(format!(
                                "{crst} ill-placed RST marker(s) in scan{}",
                                img.scan_count
                            ));
                        }
                    }
                    if !img.rst_err.is_empty() {
                        img.rst_err.resize(img.scan_count + 1, 0);
                        img.rst_err[img.scan_count] = crst as u8;
                    }
                    img.scan_count += 1;
                    next_marker = Some(nxt);
                    break 'scan;
                }
            }

            match next_marker {
                Some(m) => ty = m,
                None => break 'reader,
            }
        } else {
            let mut mk = [0u8; 2];
            if str_in.read(&mut mk) != 2 {
                break 'reader;
            }
            if mk[0] != 0xFF {
                // Incorrect marker segment sizes: retry once after COM, some
                // writers get the comment length wrong.
                let mut recovered = false;
                if ty == 0xFE {
                    if str_in.read(&mut mk) != 2 {
                        break 'reader;
                    }
                    recovered = mk[0] == 0xFF;
                }
                if !recovered {
                    return Err(JpegError::SegmentSizeMismatch(ty));
                }
                img.warn("size mismatch in marker segment FF FE".into());
            }
            ty = mk[1];
        }

        if ty == marker::EOI {
            img.hdrdata = hdrw;
            img.huffdata = huffw;
            complete = true;
            break 'reader;
        }

        // Collect the complete segment into the header blob.
        let mut lenb = [0u8; 2];
        if str_in.read(&mut lenb) != 2 {
            break 'reader;
        }
        let len = 2 + ((usize::from(lenb[0]) << 8) | usize::from(lenb[1]));
        if len < 4 {
            break 'reader;
        }
        let mut seg = vec![0u8; len];
        seg[0] = 0xFF;
        seg[1] = ty;
        seg[2] = lenb[0];
        seg[3] = lenb[1];
        if str_in.read(&mut seg[4..]) != len - 4 {
            break 'reader;
        }
        hdrw.extend_from_slice(&seg);
    }

    if !complete || img.hdrdata.is_empty() || img.huffdata.is_empty() {
        return Err(JpegError::UnexpectedEof);
    }

    // Preserve anything trailing the EOI marker.
    if let Some(first) = str_in.read_byte() {
        let mut grbgw = vec![first];
        let mut chunk = [0u8; 1024];
        loop {
            let n = str_in.read(&mut chunk);
            if n == 0 {
                break;
            }
            grbgw.extend_from_slice(&chunk[..n]);
        }
        img.grbgdata = grbgw;
    }

    marker::setup_imginfo(img, auto_settings)
}

/// Huffman-decode all scans into the coefficient collections.
pub(crate) fn decode(img: &mut JpegImage) -> Result<()> {
    let hdrdata = std::mem::take(&mut img.hdrdata);
    let huffdata = std::mem::take(&mut img.huffdata);
    let result = decode_scans(img, &hdrdata, &huffdata);
    img.hdrdata = hdrdata;
    img.huffdata = huffdata;
    result
}

fn decode_scans(img: &mut JpegImage, hdrdata: &[u8], huffdata: &[u8]) -> Result<()> {
    img.scan_count = 0;
    let mut huffr = BitReader::new(huffdata);
    let mut hpos = 0usize;

    loop {
        // Seek to the next SOS, parsing only DHT, DRI and SOS on the way.
        let mut scan: Option<ScanInfo> = None;
        while let Some((ty, len)) = marker::segment_at(hdrdata, hpos) {
            let seg = &hdrdata[hpos..hpos + len];
            match ty {
                marker::DHT => marker::parse_dht(img, seg)?,
                marker::DRI => marker::parse_dri(img, seg)?,
                marker::SOS => scan = Some(marker::parse_sos(img, seg)?),
                _ => {}
            }
            hpos += len;
            if scan.is_some() {
                break;
            }
        }
        let Some(scan) = scan else {
            break;
        };

        check_tables_available(img, &scan)?;
        decode_one_scan(img, &scan, &mut huffr)?;
        img.scan_count += 1;
    }

    if huffr.overread() {
        img.warn("coded image data truncated / too short".into());
    }
    if !huffr.eof() {
        img.warn("surplus data found after coded image data".into());
    }

    Ok(())
}

/// Every scan path needs its Huffman trees defined up front.
fn check_tables_available(img: &JpegImage, scan: &ScanInfo) -> Result<()> {
    let err = JpegError::MissingHuffmanTable {
        scan: img.scan_count,
    };
    for csc in 0..scan.cmpc {
        let cmpt = &img.components[scan.cmp[csc]];
        let needs_dc = img.jpegtype == JpegType::Sequential || (scan.to == 0 && scan.sah == 0);
        let needs_ac = img.jpegtype == JpegType::Sequential || scan.to > 0;
        if needs_dc && img.htrees[0][cmpt.huffdc].is_none() {
            return Err(err);
        }
        if needs_ac && img.htrees[1][cmpt.huffac].is_none() {
            return Err(err);
        }
    }
    Ok(())
}

fn decode_one_scan(img: &mut JpegImage, scan: &ScanInfo, huffr: &mut BitReader) -> Result<()> {
    let mut st = McuState {
        cmp: scan.cmp[0],
        rstw: img.rsti,
        ..Default::default()
    };

    // Restart segment loop: predictors, EOB runs and the restart wait
    // counter reset at each boundary, the block cursor persists.
    loop {
        let mut lastdc = [0i32; 4];
        let mut eobrun: u32 = 0;
        let mut peobrun: u32 = 0;
        st.rstw = img.rsti;

        let status = if img.jpegtype == JpegType::Sequential {
            decode_seq_segment(img, scan, huffr, &mut st, &mut lastdc)?
        } else if scan.to == 0 {
            if scan.sah == 0 {
                decode_dc_first_segment(img, scan, huffr, &mut st, &mut lastdc)?
            } else {
                decode_dc_refine_segment(img, scan, huffr, &mut st)?
            }
        } else if scan.sah == 0 {
            decode_ac_first_segment(img, scan, huffr, &mut st, &mut eobrun, &mut peobrun)?
        } else {
            decode_ac_refine_segment(img, scan, huffr, &mut st, &mut eobrun, &mut peobrun)?
        };

        // Scans and restart segments are padded to byte boundaries; the pad
        // bit must be consistent across the whole file.
        if let Some(pad) = huffr.unpad() {
            match img.padbit {
                None if pad.uniform => img.padbit = Some(pad.first),
                Some(p) if p == pad.first && pad.uniform => {}
                _ => {
                    img.warn("inconsistent use of padbits".into());
                    img.padbit = Some(1);
                }
            }
        }

        match status {
            CodingStatus::Restart => continue,
            CodingStatus::Done => return Ok(()),
            CodingStatus::Okay => unreachable!("segment decode returns only Restart or Done"),
        }
    }
}

fn decode_err(img: &JpegImage, scan: &ScanInfo, st: &McuState) -> JpegError {
    JpegError::DecodeError {
        scan: img.scan_count,
        unit: if scan.cmpc > 1 { st.mcu } else { st.dpos },
    }
}

fn next_pos(img: &JpegImage, scan: &ScanInfo, st: &mut McuState) -> CodingStatus {
    if scan.cmpc > 1 {
        img.next_mcupos(scan, st)
    } else {
        let cmp = scan.cmp[0];
        img.next_mcuposn(cmp, &mut st.dpos, &mut st.rstw)
    }
}

fn decode_seq_segment(
    img: &mut JpegImage,
    scan: &ScanInfo,
    huffr: &mut BitReader,
    st: &mut McuState,
    lastdc: &mut [i32; 4],
) -> Result<CodingStatus> {
    loop {
        let cmp = st.cmp;
        let cmpt = &img.components[cmp];
        let dctree = img.htrees[0][cmpt.huffdc].as_ref().unwrap();
        let actree = img.htrees[1][cmpt.huffac].as_ref().unwrap();

        let mut block = [0i16; 64];
        let eob =
            block_seq(huffr, dctree, actree, &mut block).ok_or_else(|| decode_err(img, scan, st))?;

        if eob > 1 && block[eob - 1] == 0 {
            img.warn("reconstruction of inefficient coding not supported".into());
        }

        // Undo DC difference coding.
        let dc = i32::from(block[0]) + lastdc[cmp];
        lastdc[cmp] = dc;
        block[0] = dc as i16;

        let coll = &mut img.components[cmp].colldata;
        for (bpos, &v) in block.iter().enumerate().take(eob) {
            coll[bpos][st.dpos] = v;
        }

        match next_pos(img, scan, st) {
            CodingStatus::Okay => {}
            status => return Ok(status),
        }
    }
}

fn decode_dc_first_segment(
    img: &mut JpegImage,
    scan: &ScanInfo,
    huffr: &mut BitReader,
    st: &mut McuState,
    lastdc: &mut [i32; 4],
) -> Result<CodingStatus> {
    loop {
        let cmp = st.cmp;
        let dctree = img.htrees[0][img.components[cmp].huffdc].as_ref().unwrap();

        let mut block = [0i16; 64];
        dc_prg_fs(huffr, dctree, &mut block).ok_or_else(|| decode_err(img, scan, st))?;

        // Difference coding happens before the successive approximation shift.
        let dc = (i32::from(block[0]) + lastdc[cmp]) as i16;
        lastdc[cmp] = i32::from(dc);
        img.components[cmp].colldata[0][st.dpos] = ((i32::from(dc)) << scan.sal) as i16;

        match next_pos(img, scan, st) {
            CodingStatus::Okay => {}
            status => return Ok(status),
        }
    }
}

fn decode_dc_refine_segment(
    img: &mut JpegImage,
    scan: &ScanInfo,
    huffr: &mut BitReader,
    st: &mut McuState,
) -> Result<CodingStatus> {
    loop {
        let bit = i32::from(huffr.read_bit());
        let coef = &mut img.components[st.cmp].colldata[0][st.dpos];
        *coef = (i32::from(*coef) + (bit << scan.sal)) as i16;

        match next_pos(img, scan, st) {
            CodingStatus::Okay => {}
            status => return Ok(status),
        }
    }
}

fn decode_ac_first_segment(
    img: &mut JpegImage,
    scan: &ScanInfo,
    huffr: &mut BitReader,
    st: &mut McuState,
    eobrun: &mut u32,
    peobrun: &mut u32,
) -> Result<CodingStatus> {
    let cmp = scan.cmp[0];
    loop {
        if *eobrun == 0 {
            let cmpt = &img.components[cmp];
            let actree = img.htrees[1][cmpt.huffac].as_ref().unwrap();
            let max_eobrun = u32::from(img.hcodes[1][cmpt.huffac].as_ref().unwrap().max_eobrun);

            let mut block = [0i16; 64];
            let eob = ac_prg_fs(huffr, actree, &mut block, eobrun, scan.from, scan.to)
                .ok_or_else(|| decode_err(img, scan, st))?;

            if *eobrun > 0 {
                // An EOB run opened while the previous one still had headroom.
                if eob == scan.from && *peobrun > 0 && *peobrun < max_eobrun.saturating_sub(1) {
                    img.warn("reconstruction of inefficient coding not supported".into());
                }
                *peobrun = *eobrun;
                *eobrun -= 1;
            } else {
                *peobrun = 0;
            }

            let coll = &mut img.components[cmp].colldata;
            for (bpos, &v) in block.iter().enumerate().take(eob).skip(scan.from) {
                coll[bpos][st.dpos] = ((i32::from(v)) << scan.sal) as i16;
            }
        } else {
            *eobrun -= 1;
        }

        let cmpt = &img.components[cmp];
        let status = skip_eobrun(cmpt, img.rsti, &mut st.dpos, &mut st.rstw, eobrun)
            .ok_or_else(|| decode_err(img, scan, st))?;
        match status {
            CodingStatus::Okay => {}
            status => return Ok(status),
        }

        match img.next_mcuposn(cmp, &mut st.dpos, &mut st.rstw) {
            CodingStatus::Okay => {}
            status => return Ok(status),
        }
    }
}

fn decode_ac_refine_segment(
    img: &mut JpegImage,
    scan: &ScanInfo,
    huffr: &mut BitReader,
    st: &mut McuState,
    eobrun: &mut u32,
    peobrun: &mut u32,
) -> Result<CodingStatus> {
    let cmp = scan.cmp[0];
    loop {
        // The refinement pass routes correction bits by the coefficients
        // already present, so work on a copy holding only the deltas after.
        let mut block = [0i16; 64];
        {
            let coll = &img.components[cmp].colldata;
            for bpos in scan.from..=scan.to {
                block[bpos] = coll[bpos][st.dpos];
            }
        }

        if *eobrun == 0 {
            let cmpt = &img.components[cmp];
            let actree = img.htrees[1][cmpt.huffac].as_ref().unwrap();
            let max_eobrun = u32::from(img.hcodes[1][cmpt.huffac].as_ref().unwrap().max_eobrun);

            let eob = ac_prg_sa(huffr, actree, &mut block, eobrun, scan.from, scan.to)
                .ok_or_else(|| decode_err(img, scan, st))?;

            if *eobrun > 0 {
                if eob == scan.from && *peobrun > 0 && *peobrun < max_eobrun.saturating_sub(1) {
                    img.warn("reconstruction of inefficient coding not supported".into());
                }
                *peobrun = *eobrun;
                *eobrun -= 1;
            } else {
                *peobrun = 0;
            }
        } else {
            eobrun_sa(huffr, &mut block, scan.from, scan.to);
            *eobrun -= 1;
        }

        let coll = &mut img.components[cmp].colldata;
        for bpos in scan.from..=scan.to {
            let v = i32::from(coll[bpos][st.dpos]) + ((i32::from(block[bpos])) << scan.sal);
            coll[bpos][st.dpos] = v as i16;
        }

        match img.next_mcuposn(cmp, &mut st.dpos, &mut st.rstw) {
            CodingStatus::Okay => {}
            status => return Ok(status),
        }
    }
}

/// Verify every decoded coefficient lies within its quantiser-implied range.
pub(crate) fn check_value_range(img: &JpegImage) -> Result<()> {
    for cmp in 0..img.cmpc {
        let cmpt = &img.components[cmp];
        for bpos in 0..64 {
            let absmax = cmpt.max_v(bpos);
            for dpos in 0..cmpt.bc {
                let val = i32::from(cmpt.colldata[bpos][dpos]);
                if val.abs() > absmax {
                    return Err(JpegError::ValueOutOfRange {
                        cmp,
                        freq: bpos,
                        val,
                        max: absmax,
                    });
                }
            }
        }
    }
    Ok(())
}

// --- Block decoding routines ---

/// Decode one sequential block; returns the end-of-block position.
fn block_seq(
    huffr: &mut BitReader,
    dctree: &HuffTree,
    actree: &HuffTree,
    block: &mut [i16; 64],
) -> Option<usize> {
    dc_prg_fs(huffr, dctree, block)?;

    let mut eob = 64;
    let mut bpos = 1;
    while bpos < 64 {
        let hc = actree.next_huffcode(huffr)?;
        if hc > 0 {
            let z = usize::from(hc >> 4);
            let s = hc & 0x0F;
            let n = huffr.read(s);
            if z + bpos >= 64 {
                return None; // run is too long
            }
            for _ in 0..z {
                block[bpos] = 0;
                bpos += 1;
            }
            block[bpos] = devli(s, n) as i16;
            bpos += 1;
        } else {
            eob = bpos;
            break;
        }
    }

    Some(eob)
}

/// Decode a DC coefficient (also the first stage of progressive DC).
fn dc_prg_fs(huffr: &mut BitReader, dctree: &HuffTree, block: &mut [i16; 64]) -> Option<()> {
    let s = dctree.next_huffcode(huffr)?;
    if s > 16 {
        return None;
    }
    let n = huffr.read(s);
    block[0] = devli(s, n) as i16;
    Some(())
}

/// Decode the first stage of a progressive AC band; returns the eob position.
fn ac_prg_fs(
    huffr: &mut BitReader,
    actree: &HuffTree,
    block: &mut [i16; 64],
    eobrun: &mut u32,
    from: usize,
    to: usize,
) -> Option<usize> {
    let mut eob = to + 1;
    let mut bpos = from;

    while bpos <= to {
        let hc = actree.next_huffcode(huffr)?;
        let l = usize::from(hc >> 4);
        let r = hc & 0x0F;
        if l == 15 || r > 0 {
            // Run/level combination.
            let n = huffr.read(r);
            if l + bpos > to {
                return None; // run is too long
            }
            for _ in 0..l {
                block[bpos] = 0;
                bpos += 1;
            }
            block[bpos] = devli(r, n) as i16;
            bpos += 1;
        } else {
            // End-of-band run.
            eob = bpos;
            let n = huffr.read(l as u8);
            *eobrun = e_devli(l as u8, n);
            break;
        }
    }

    Some(eob)
}

/// Decode the refinement stage of a progressive AC band.
///
/// `block` holds the band's current coefficients on entry and only the
/// per-coefficient deltas (correction bits and new +/-1 values) on exit.
fn ac_prg_sa(
    huffr: &mut BitReader,
    actree: &HuffTree,
    block: &mut [i16; 64],
    eobrun: &mut u32,
    from: usize,
    to: usize,
) -> Option<usize> {
    let mut bpos = from;
    let mut eob = to;

    if *eobrun == 0 {
        while bpos <= to {
            let hc = actree.next_huffcode(huffr)?;
            let l = hc >> 4;
            let r = hc & 0x0F;
            if l == 15 || r > 0 {
                let mut z = i32::from(l);
                let v: i16 = match r {
                    0 => 0,
                    1 => {
                        if huffr.read_bit() == 0 {
                            -1
                        } else {
                            1
                        }
                    }
                    _ => return None,
                };
                // Skip zero positions, handing correction bits to the
                // nonzero coefficients passed over.
                loop {
                    if block[bpos] == 0 {
                        if z > 0 {
                            z -= 1;
                        } else {
                            block[bpos] = v;
                            bpos += 1;
                            break;
                        }
                    } else {
                        let n = i16::from(huffr.read_bit());
                        block[bpos] = if block[bpos] > 0 { n } else { -n };
                    }
                    if bpos >= to {
                        return None;
                    }
                    bpos += 1;
                }
            } else {
                eob = bpos;
                let n = huffr.read(l);
                *eobrun = e_devli(l, n);
                break;
            }
        }
    }

    // Correction bits for the remainder of the band.
    if *eobrun > 0 {
        while bpos <= to {
            if block[bpos] != 0 {
                let n = i16::from(huffr.read_bit());
                block[bpos] = if block[bpos] > 0 { n } else { -n };
            }
            bpos += 1;
        }
    }

    Some(eob)
}

/// Correction-bits-only decoding while inside an EOB run.
fn eobrun_sa(huffr: &mut BitReader, block: &mut [i16; 64], from: usize, to: usize) {
    for bpos in from..=to {
        if block[bpos] != 0 {
            let n = i16::from(huffr.read_bit());
            block[bpos] = if block[bpos] > 0 { n } else { -n };
        }
    }
}

/// Skip over the blocks covered by an EOB run, fixing up the cursor for the
/// padding region of non-interleaved components.
fn skip_eobrun(
    cmpt: &Component,
    rsti: usize,
    dpos: &mut usize,
    rstw: &mut usize,
    eobrun: &mut u32,
) -> Option<CodingStatus> {
    if *eobrun == 0 {
        return Some(CodingStatus::Okay);
    }

    let run = *eobrun as usize;
    if rsti > 0 {
        if run > *rstw {
            return None; // run crosses a restart boundary
        }
        *rstw -= run;
    }

    if cmpt.bch != cmpt.nch {
        *dpos += (((*dpos % cmpt.bch) + run) / cmpt.nch) * (cmpt.bch - cmpt.nch);
    }
    if cmpt.bcv != cmpt.ncv && *dpos / cmpt.bch >= cmpt.ncv {
        *dpos += (cmpt.bcv - cmpt.ncv) * cmpt.bch;
    }

    *dpos += run;
    *eobrun = 0;

    if *dpos == cmpt.bc {
        Some(CodingStatus::Done)
    } else if *dpos > cmpt.bc {
        None
    } else if rsti > 0 && *rstw == 0 {
        Some(CodingStatus::Restart)
    } else {
        Some(CodingStatus::Okay)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::jpeg::huffman::HuffCodes;

    fn std_dc_tree() -> (HuffCodes, HuffTree) {
        let bits = [0u8, 1, 5, 1, 1, 1, 1, 1, 1, 0, 0, 0, 0, 0, 0, 0];
        let vals: Vec<u8> = (0..12).collect();
        let codes = HuffCodes::new(&bits, &vals);
        let tree = HuffTree::new(&codes);
        (codes, tree)
    }

    fn std_ac_tree() -> HuffTree {
        let bits = [0u8, 2, 1, 3, 3, 2, 4, 3, 5, 5, 4, 4, 0, 0, 1, 0x7D];
        let vals = crate::pjg::header::STD_HUFF_TABLES[2][16..].to_vec();
        let codes = HuffCodes::new(&bits, &vals);
        HuffTree::new(&codes)
    }

    #[test]
    fn sequential_block_all_zero() {
        // DC category 0 ("00") then EOB ("1010"), padded with ones.
        let (_, dctree) = std_dc_tree();
        let actree = std_ac_tree();
        let data = [0b0010_1011];
        let mut huffr = BitReader::new(&data);
        let mut block = [0i16; 64];
        let eob = block_seq(&mut huffr, &dctree, &actree, &mut block).unwrap();
        assert_eq!(eob, 1);
        assert_eq!(block[0], 0);
    }

    #[test]
    fn sequential_block_dc_value() {
        // DC category 2 ("011") + bits "10" (value 2), then EOB.
        let (_, dctree) = std_dc_tree();
        let actree = std_ac_tree();
        let data = [0b0111_0101, 0b0111_1111];
        let mut huffr = BitReader::new(&data);
        let mut block = [0i16; 64];
        block_seq(&mut huffr, &dctree, &actree, &mut block).unwrap();
        assert_eq!(block[0], 2);
    }

    #[test]
    fn eobrun_skip_covers_padding_region() {
        let mut cmpt = Component::default();
        cmpt.bch = 4;
        cmpt.bcv = 4;
        cmpt.bc = 16;
        cmpt.nch = 3;
        cmpt.ncv = 3;
        cmpt.nc = 9;

        // Run of 8 from position 0 covers the 3x3 data region (skipping
        // the fourth column) ending exactly at the padding rows.
        let mut dpos = 0usize;
        let mut rstw = 0usize;
        let mut eobrun = 8u32;
        let status = skip_eobrun(&cmpt, 0, &mut dpos, &mut rstw, &mut eobrun).unwrap();
        assert_eq!(eobrun, 0);
        assert_eq!(status, CodingStatus::Okay);
        assert_eq!(dpos, 10);
    }
}
