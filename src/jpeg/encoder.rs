// Copyright (c) 2026 Christoph Gaffga
// SPDX-License-Identifier: GPL-3.0-only
// https://github.com/cgaffga/pjgcore

//! JPEG entropy re-encoding and final byte-stream assembly.
//!
//! [`recode`] regenerates the exact original Huffman bitstream from the
//! coefficient collections, recording scan boundaries and restart positions.
//! [`merge`] then interleaves header segments, stuffed entropy bytes,
//! restart markers (including the miscounted ones) and trailing garbage
//! into the output JPEG.

use super::bitio::BitWriter;
use super::error::{JpegError, Result};
use super::huffman::HuffCodes;
use super::marker;
use super::{
    bitlen, e_envli, envli, fdiv2, CodingStatus, JpegImage, JpegType, McuState, ScanInfo,
};
use crate::io::ByteWriter;

/// Re-encode all scans from the coefficient collections into `huffdata`.
pub(crate) fn recode(img: &mut JpegImage) -> Result<()> {
    let hdrdata = std::mem::take(&mut img.hdrdata);
    let result = recode_scans(img, &hdrdata);
    img.hdrdata = hdrdata;
    result
}

fn recode_scans(img: &mut JpegImage, hdrdata: &[u8]) -> Result<()> {
    img.scan_count = 0;
    img.scnp.clear();
    img.rstp.clear();

    let mut huffw = BitWriter::new();
    huffw.set_fillbit(img.padbit.unwrap_or(1));
    let mut storw: Vec<u8> = Vec::new(); // correction bit store
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
        img.scnp.push(huffw.num_bytes());
        encode_one_scan(img, &scan, &mut huffw, &mut storw)?;
        img.scan_count += 1;
    }

    img.huffdata = huffw.into_data();
    img.scnp.push(img.huffdata.len());
    if !img.rstp.is_empty() {
        img.rstp.push(img.huffdata.len());
    }

    Ok(())
}

/// Every scan path needs its Huffman codes defined up front; header data
/// from a container is not trusted to guarantee that.
fn check_tables_available(img: &JpegImage, scan: &ScanInfo) -> Result<()> {
    let err = JpegError::MissingHuffmanTable {
        scan: img.scan_count,
    };
    for csc in 0..scan.cmpc {
        let cmpt = &img.components[scan.cmp[csc]];
        let needs_dc = img.jpegtype == JpegType::Sequential || (scan.to == 0 && scan.sah == 0);
        let needs_ac = img.jpegtype == JpegType::Sequential || scan.to > 0;
        if needs_dc && img.hcodes[0][cmpt.huffdc].is_none() {
            return Err(err);
        }
        if needs_ac && img.hcodes[1][cmpt.huffac].is_none() {
            return Err(err);
        }
    }
    Ok(())
}

fn encode_one_scan(
    img: &mut JpegImage,
    scan: &ScanInfo,
    huffw: &mut BitWriter,
    storw: &mut Vec<u8>,
) -> Result<()> {
    let mut st = McuState {
        cmp: scan.cmp[0],
        rstw: img.rsti,
        ..Default::default()
    };

    loop {
        let mut lastdc = [0i32; 4];
        let mut eobrun: u32 = 0;
        st.rstw = img.rsti;

        let status = if img.jpegtype == JpegType::Sequential {
            encode_seq_segment(img, scan, huffw, &mut st, &mut lastdc)?
        } else if scan.to == 0 {
            if scan.sah == 0 {
                encode_dc_first_segment(img, scan, huffw, &mut st, &mut lastdc)?
            } else {
                encode_dc_refine_segment(img, scan, huffw, &mut st)?
            }
        } else {
            let status = if scan.sah == 0 {
                encode_ac_first_segment(img, scan, huffw, &mut st, &mut eobrun)?
            } else {
                encode_ac_refine_segment(img, scan, huffw, storw, &mut st, &mut eobrun)?
            };
            // Flush whatever end-of-band run is still buffered at the
            // segment boundary (plus pending correction bits in refinement).
            let cmpt = &img.components[scan.cmp[0]];
            let actbl = img.hcodes[1][cmpt.huffac].as_ref().unwrap();
            encode_eobrun(huffw, actbl, &mut eobrun)?;
            if scan.sah > 0 {
                crbits(huffw, storw);
            }
            status
        };

        huffw.pad();

        match status {
            CodingStatus::Restart => {
                if img.rsti > 0 {
                    img.rstp.push(huffw.num_bytes() - 1);
                }
            }
            CodingStatus::Done => return Ok(()),
            CodingStatus::Okay => unreachable!("segment encode returns only Restart or Done"),
        }
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

fn encode_seq_segment(
    img: &mut JpegImage,
    scan: &ScanInfo,
    huffw: &mut BitWriter,
    st: &mut McuState,
    lastdc: &mut [i32; 4],
) -> Result<CodingStatus> {
    loop {
        let cmp = st.cmp;
        let cmpt = &img.components[cmp];
        let dctbl = img.hcodes[0][cmpt.huffdc].as_ref().unwrap();
        let actbl = img.hcodes[1][cmpt.huffac].as_ref().unwrap();

        let mut block = [0i16; 64];
        for (bpos, slot) in block.iter_mut().enumerate() {
            *slot = cmpt.colldata[bpos][st.dpos];
        }

        // DC difference coding.
        let dc = i32::from(block[0]);
        block[0] = (dc - lastdc[cmp]) as i16;
        lastdc[cmp] = dc;

        block_seq(huffw, dctbl, actbl, &block)?;

        match next_pos(img, scan, st) {
            CodingStatus::Okay => {}
            status => return Ok(status),
        }
    }
}

fn encode_dc_first_segment(
    img: &mut JpegImage,
    scan: &ScanInfo,
    huffw: &mut BitWriter,
    st: &mut McuState,
    lastdc: &mut [i32; 4],
) -> Result<CodingStatus> {
    loop {
        let cmp = st.cmp;
        let cmpt = &img.components[cmp];
        let dctbl = img.hcodes[0][cmpt.huffdc].as_ref().unwrap();

        // Difference coding on the bit-shifted DC value.
        let tmp = fdiv2(i32::from(cmpt.colldata[0][st.dpos]), scan.sal);
        let diff = tmp - lastdc[cmp];
        lastdc[cmp] = tmp;

        dc_prg_fs(huffw, dctbl, diff)?;

        match next_pos(img, scan, st) {
            CodingStatus::Okay => {}
            status => return Ok(status),
        }
    }
}

fn encode_dc_refine_segment(
    img: &mut JpegImage,
    scan: &ScanInfo,
    huffw: &mut BitWriter,
    st: &mut McuState,
) -> Result<CodingStatus> {
    loop {
        let coef = i32::from(img.components[st.cmp].colldata[0][st.dpos]);
        huffw.write_bit(((coef >> scan.sal) & 0x1) as u8);

        match next_pos(img, scan, st) {
            CodingStatus::Okay => {}
            status => return Ok(status),
        }
    }
}

fn encode_ac_first_segment(
    img: &mut JpegImage,
    scan: &ScanInfo,
    huffw: &mut BitWriter,
    st: &mut McuState,
    eobrun: &mut u32,
) -> Result<CodingStatus> {
    let cmp = scan.cmp[0];
    loop {
        let cmpt = &img.components[cmp];
        let actbl = img.hcodes[1][cmpt.huffac].as_ref().unwrap();

        let mut block = [0i16; 64];
        for bpos in scan.from..=scan.to {
            block[bpos] = fdiv2(i32::from(cmpt.colldata[bpos][st.dpos]), scan.sal) as i16;
        }

        ac_prg_fs(huffw, actbl, &block, eobrun, scan.from, scan.to)?;

        match img.next_mcuposn(cmp, &mut st.dpos, &mut st.rstw) {
            CodingStatus::Okay => {}
            status => return Ok(status),
        }
    }
}

fn encode_ac_refine_segment(
    img: &mut JpegImage,
    scan: &ScanInfo,
    huffw: &mut BitWriter,
    storw: &mut Vec<u8>,
    st: &mut McuState,
    eobrun: &mut u32,
) -> Result<CodingStatus> {
    let cmp = scan.cmp[0];
    loop {
        let cmpt = &img.components[cmp];
        let actbl = img.hcodes[1][cmpt.huffac].as_ref().unwrap();

        let mut block = [0i16; 64];
        for bpos in scan.from..=scan.to {
            block[bpos] = fdiv2(i32::from(cmpt.colldata[bpos][st.dpos]), scan.sal) as i16;
        }

        ac_prg_sa(huffw, storw, actbl, &block, eobrun, scan.from, scan.to)?;

        match img.next_mcuposn(cmp, &mut st.dpos, &mut st.rstw) {
            CodingStatus::Okay => {}
            status => return Ok(status),
        }
    }
}

/// Assemble the output JPEG from header, entropy data and garbage.
pub(crate) fn merge<W: ByteWriter>(img: &JpegImage, str_out: &mut W) -> Result<()> {
    let mut hpos = 0usize; // current position in the header
    let mut rpos = 0usize; // current restart marker index
    let mut scan = 1usize; // number of the current scan

    str_out.write(&[0xFF, marker::SOI]);

    loop {
        // Seek to just past the next SOS, emitting the header verbatim.
        let seg_start = hpos;
        let mut ty = 0x00u8;
        while ty != marker::SOS {
            let Some((t, len)) = marker::segment_at(&img.hdrdata, hpos) else {
                break;
            };
            ty = t;
            hpos += len;
        }
        str_out.write(&img.hdrdata[seg_start..hpos]);

        if ty != marker::SOS {
            break;
        }

        // Entropy data for this scan: re-stuff 0xFF bytes and re-insert
        // restart markers at their recorded positions.
        let mut cpos = 0usize; // corrected restart cadence within the scan
        for ipos in img.scnp[scan - 1]..img.scnp[scan] {
            str_out.write_byte(img.huffdata[ipos]);
            if img.huffdata[ipos] == 0xFF {
                str_out.write_byte(0x00);
            }
            if rpos < img.rstp.len() && ipos == img.rstp[rpos] {
                str_out.write(&[0xFF, 0xD0 + (cpos % 8) as u8]);
                rpos += 1;
                cpos += 1;
            }
        }
        // Re-emit the extraneous restart markers the producer wrote.
        if let Some(&surplus) = img.rst_err.get(scan - 1) {
            for _ in 0..surplus {
                str_out.write(&[0xFF, 0xD0 + (cpos % 8) as u8]);
                cpos += 1;
            }
        }

        scan += 1;
    }

    str_out.write(&[0xFF, marker::EOI]);
    if !img.grbgdata.is_empty() {
        str_out.write(&img.grbgdata);
    }

    Ok(())
}

// --- Block encoding routines ---

fn write_code(huffw: &mut BitWriter, tbl: &HuffCodes, sym: u8) -> Result<()> {
    let clen = tbl.clen[usize::from(sym)];
    if clen == 0 {
        return Err(JpegError::MissingHuffmanCode(sym));
    }
    huffw.write(u32::from(tbl.cval[usize::from(sym)]), clen as u8);
    Ok(())
}

/// Encode one sequential block.
fn block_seq(
    huffw: &mut BitWriter,
    dctbl: &HuffCodes,
    actbl: &HuffCodes,
    block: &[i16; 64],
) -> Result<()> {
    dc_prg_fs(huffw, dctbl, i32::from(block[0]))?;

    // AC run-length coding.
    let mut z = 0u32;
    for bpos in 1..64 {
        if block[bpos] != 0 {
            while z >= 16 {
                write_code(huffw, actbl, 0xF0)?;
                z -= 16;
            }
            let s = bitlen(i32::from(block[bpos]).abs()) as u8;
            let n = envli(s, i32::from(block[bpos]));
            write_code(huffw, actbl, ((z as u8) << 4) | s)?;
            huffw.write(n, s);
            z = 0;
        } else {
            z += 1;
        }
    }
    if z > 0 {
        write_code(huffw, actbl, 0x00)?; // EOB
    }

    Ok(())
}

/// Encode a DC coefficient (also the first stage of progressive DC).
fn dc_prg_fs(huffw: &mut BitWriter, dctbl: &HuffCodes, val: i32) -> Result<()> {
    let s = bitlen(val.abs()) as u8;
    let n = envli(s, val);
    write_code(huffw, dctbl, s)?;
    huffw.write(n, s);
    Ok(())
}

/// Encode the first stage of a progressive AC band.
fn ac_prg_fs(
    huffw: &mut BitWriter,
    actbl: &HuffCodes,
    block: &[i16; 64],
    eobrun: &mut u32,
    from: usize,
    to: usize,
) -> Result<()> {
    let mut z = 0u32;
    for bpos in from..=to {
        if block[bpos] != 0 {
            // A nonzero value flushes any buffered end-of-band run first.
            encode_eobrun(huffw, actbl, eobrun)?;
            while z >= 16 {
                write_code(huffw, actbl, 0xF0)?;
                z -= 16;
            }
            let s = bitlen(i32::from(block[bpos]).abs()) as u8;
            let n = envli(s, i32::from(block[bpos]));
            write_code(huffw, actbl, ((z as u8) << 4) | s)?;
            huffw.write(n, s);
            z = 0;
        } else {
            z += 1;
        }
    }

    if z > 0 {
        *eobrun += 1;
        if *eobrun == u32::from(actbl.max_eobrun) {
            encode_eobrun(huffw, actbl, eobrun)?;
        }
    }

    Ok(())
}

/// Encode the refinement stage of a progressive AC band.
///
/// Correction bits for already-nonzero coefficients are deferred into
/// `storw` and flushed right after each coded symbol.
fn ac_prg_sa(
    huffw: &mut BitWriter,
    storw: &mut Vec<u8>,
    actbl: &HuffCodes,
    block: &[i16; 64],
    eobrun: &mut u32,
    from: usize,
    to: usize,
) -> Result<()> {
    // Position past the last newly-nonzero coefficient.
    let mut eob = from;
    for bpos in (from..=to).rev() {
        if block[bpos] == 1 || block[bpos] == -1 {
            eob = bpos + 1;
            break;
        }
    }

    // A block with new coefficients ends any buffered end-of-band run.
    if eob > from && *eobrun > 0 {
        encode_eobrun(huffw, actbl, eobrun)?;
        crbits(huffw, storw);
    }

    let mut z = 0u32;
    let mut bpos = from;
    while bpos < eob {
        let coef = block[bpos];
        if coef == 0 {
            z += 1;
            if z == 16 {
                write_code(huffw, actbl, 0xF0)?;
                crbits(huffw, storw);
                z = 0;
            }
        } else if coef == 1 || coef == -1 {
            let s = bitlen(i32::from(coef).abs()) as u8;
            let n = envli(s, i32::from(coef));
            write_code(huffw, actbl, ((z as u8) << 4) | s)?;
            huffw.write(n, s);
            crbits(huffw, storw);
            z = 0;
        } else {
            // Already-nonzero coefficient: defer its correction bit.
            storw.push((coef & 0x1) as u8);
        }
        bpos += 1;
    }

    // Correction bits past the end-of-block position.
    while bpos <= to {
        if block[bpos] != 0 {
            storw.push((block[bpos] & 0x1) as u8);
        }
        bpos += 1;
    }

    if eob <= to {
        *eobrun += 1;
        if *eobrun == u32::from(actbl.max_eobrun) {
            encode_eobrun(huffw, actbl, eobrun)?;
            crbits(huffw, storw);
        }
    }

    Ok(())
}

/// Flush a buffered end-of-band run.
fn encode_eobrun(huffw: &mut BitWriter, actbl: &HuffCodes, eobrun: &mut u32) -> Result<()> {
    if *eobrun > 0 {
        let max_eobrun = u32::from(actbl.max_eobrun);
        if max_eobrun == 0 {
            return Err(JpegError::MissingHuffmanCode(0x00));
        }
        while *eobrun > max_eobrun {
            write_code(huffw, actbl, 0xE0)?;
            huffw.write(e_envli(14, 32767), 14);
            *eobrun -= max_eobrun;
        }
        let s = (bitlen(*eobrun as i32) - 1) as u8;
        let n = e_envli(s, *eobrun);
        write_code(huffw, actbl, s << 4)?;
        huffw.write(n, s);
        *eobrun = 0;
    }
    Ok(())
}

/// Flush deferred correction bits.
fn crbits(huffw: &mut BitWriter, storw: &mut Vec<u8>) {
    for &bit in storw.iter() {
        huffw.write_bit(bit);
    }
    storw.clear();
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::jpeg::huffman::HuffTree;
    use crate::jpeg::bitio::BitReader;

    fn std_dc_codes() -> HuffCodes {
        let bits = [0u8, 1, 5, 1, 1, 1, 1, 1, 1, 0, 0, 0, 0, 0, 0, 0];
        let vals: Vec<u8> = (0..12).collect();
        HuffCodes::new(&bits, &vals)
    }

    fn std_ac_codes() -> HuffCodes {
        let bits = [0u8, 2, 1, 3, 3, 2, 4, 3, 5, 5, 4, 4, 0, 0, 1, 0x7D];
        let vals = crate::pjg::header::STD_HUFF_TABLES[2][16..].to_vec();
        HuffCodes::new(&bits, &vals)
    }

    #[test]
    fn all_zero_block_is_dc0_plus_eob() {
        let dctbl = std_dc_codes();
        let actbl = std_ac_codes();
        let mut huffw = BitWriter::new();
        let block = [0i16; 64];
        block_seq(&mut huffw, &dctbl, &actbl, &block).unwrap();
        // "00" (DC category 0) + "1010" (EOB) + two fill bits.
        assert_eq!(huffw.into_data(), vec![0b0010_1011]);
    }

    #[test]
    fn block_round_trips_through_decoder_tables() {
        let dctbl = std_dc_codes();
        let actbl = std_ac_codes();
        let dctree = HuffTree::new(&dctbl);
        let actree = HuffTree::new(&actbl);

        let mut block = [0i16; 64];
        block[0] = -37;
        block[1] = 5;
        block[20] = -1;
        block[63] = 2;

        let mut huffw = BitWriter::new();
        block_seq(&mut huffw, &dctbl, &actbl, &block).unwrap();
        let data = huffw.into_data();

        // Feed the bytes back through the decode-side tables.
        let mut huffr = BitReader::new(&data);
        let mut decoded = [0i16; 64];
        let s = dctree.next_huffcode(&mut huffr).unwrap();
        decoded[0] = crate::jpeg::devli(s, huffr.read(s)) as i16;
        let mut bpos = 1;
        while bpos < 64 {
            let hc = actree.next_huffcode(&mut huffr).unwrap();
            if hc == 0 {
                break; // EOB
            }
            bpos += usize::from(hc >> 4);
            let s = hc & 0x0F;
            decoded[bpos] = crate::jpeg::devli(s, huffr.read(s)) as i16;
            bpos += 1;
        }
        assert_eq!(decoded, block);
    }

    #[test]
    fn eobrun_encoding_uses_log2_symbol() {
        let actbl = std_ac_codes();
        let mut huffw = BitWriter::new();
        let mut eobrun = 1u32;
        // A run of 1 is coded with the plain EOB symbol and no extra bits.
        encode_eobrun(&mut huffw, &actbl, &mut eobrun).unwrap();
        assert_eq!(eobrun, 0);
        assert_eq!(huffw.into_data(), vec![0b1010_1111]);
    }
}
