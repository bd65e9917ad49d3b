// Copyright (c) 2026 Christoph Gaffga
// SPDX-License-Identifier: GPL-3.0-only
// https://github.com/cgaffga/pjgcore

//! Header optimisation: reversible rewrites of DQT and DHT segments that
//! make the generic byte coder's job easier.
//!
//! 8-bit quantisation tables become forward differences of their zig-zag
//! neighbours; Huffman tables matching one of the four T.81 Annex K standard
//! tables collapse into a three-byte sentinel. Both transforms are exactly
//! undone on decode, and only DHT and DQT segments are ever touched.

use crate::jpeg::marker::{self, DHT, DQT};
use crate::jpeg::JpegImage;

/// The four standard Huffman tables of ITU-T T.81 Annex K, each as the raw
/// DHT table body (16 length counts followed by the symbol values), in the
/// order DC luminance, DC chrominance, AC luminance, AC chrominance.
pub(crate) const STD_HUFF_TABLES: [&[u8]; 4] = [
    // DC luminance (Table K.3).
    &[
        0x00, 0x01, 0x05, 0x01, 0x01, 0x01, 0x01, 0x01, 0x01, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
        0x00, 0x00, 0x01, 0x02, 0x03, 0x04, 0x05, 0x06, 0x07, 0x08, 0x09, 0x0A, 0x0B,
    ],
    // DC chrominance (Table K.4).
    &[
        0x00, 0x03, 0x01, 0x01, 0x01, 0x01, 0x01, 0x01, 0x01, 0x01, 0x01, 0x00, 0x00, 0x00, 0x00,
        0x00, 0x00, 0x01, 0x02, 0x03, 0x04, 0x05, 0x06, 0x07, 0x08, 0x09, 0x0A, 0x0B,
    ],
    // AC luminance (Table K.5).
    &[
        0x00, 0x02, 0x01, 0x03, 0x03, 0x02, 0x04, 0x03, 0x05, 0x05, 0x04, 0x04, 0x00, 0x00, 0x01,
        0x7D, 0x01, 0x02, 0x03, 0x00, 0x04, 0x11, 0x05, 0x12, 0x21, 0x31, 0x41, 0x06, 0x13, 0x51,
        0x61, 0x07, 0x22, 0x71, 0x14, 0x32, 0x81, 0x91, 0xA1, 0x08, 0x23, 0x42, 0xB1, 0xC1, 0x15,
        0x52, 0xD1, 0xF0, 0x24, 0x33, 0x62, 0x72, 0x82, 0x09, 0x0A, 0x16, 0x17, 0x18, 0x19, 0x1A,
        0x25, 0x26, 0x27, 0x28, 0x29, 0x2A, 0x34, 0x35, 0x36, 0x37, 0x38, 0x39, 0x3A, 0x43, 0x44,
        0x45, 0x46, 0x47, 0x48, 0x49, 0x4A, 0x53, 0x54, 0x55, 0x56, 0x57, 0x58, 0x59, 0x5A, 0x63,
        0x64, 0x65, 0x66, 0x67, 0x68, 0x69, 0x6A, 0x73, 0x74, 0x75, 0x76, 0x77, 0x78, 0x79, 0x7A,
        0x83, 0x84, 0x85, 0x86, 0x87, 0x88, 0x89, 0x8A, 0x92, 0x93, 0x94, 0x95, 0x96, 0x97, 0x98,
        0x99, 0x9A, 0xA2, 0xA3, 0xA4, 0xA5, 0xA6, 0xA7, 0xA8, 0xA9, 0xAA, 0xB2, 0xB3, 0xB4, 0xB5,
        0xB6, 0xB7, 0xB8, 0xB9, 0xBA, 0xC2, 0xC3, 0xC4, 0xC5, 0xC6, 0xC7, 0xC8, 0xC9, 0xCA, 0xD2,
        0xD3, 0xD4, 0xD5, 0xD6, 0xD7, 0xD8, 0xD9, 0xDA, 0xE1, 0xE2, 0xE3, 0xE4, 0xE5, 0xE6, 0xE7,
        0xE8, 0xE9, 0xEA, 0xF1, 0xF2, 0xF3, 0xF4, 0xF5, 0xF6, 0xF7, 0xF8, 0xF9, 0xFA,
    ],
    // AC chrominance (Table K.6).
    &[
        0x00, 0x02, 0x01, 0x02, 0x04, 0x04, 0x03, 0x04, 0x07, 0x05, 0x04, 0x04, 0x00, 0x01, 0x02,
        0x77, 0x00, 0x01, 0x02, 0x03, 0x11, 0x04, 0x05, 0x21, 0x31, 0x06, 0x12, 0x41, 0x51, 0x07,
        0x61, 0x71, 0x13, 0x22, 0x32, 0x81, 0x08, 0x14, 0x42, 0x91, 0xA1, 0xB1, 0xC1, 0x09, 0x23,
        0x33, 0x52, 0xF0, 0x15, 0x62, 0x72, 0xD1, 0x0A, 0x16, 0x24, 0x34, 0xE1, 0x25, 0xF1, 0x17,
        0x18, 0x19, 0x1A, 0x26, 0x27, 0x28, 0x29, 0x2A, 0x35, 0x36, 0x37, 0x38, 0x39, 0x3A, 0x43,
        0x44, 0x45, 0x46, 0x47, 0x48, 0x49, 0x4A, 0x53, 0x54, 0x55, 0x56, 0x57, 0x58, 0x59, 0x5A,
        0x63, 0x64, 0x65, 0x66, 0x67, 0x68, 0x69, 0x6A, 0x73, 0x74, 0x75, 0x76, 0x77, 0x78, 0x79,
        0x7A, 0x82, 0x83, 0x84, 0x85, 0x86, 0x87, 0x88, 0x89, 0x8A, 0x92, 0x93, 0x94, 0x95, 0x96,
        0x97, 0x98, 0x99, 0x9A, 0xA2, 0xA3, 0xA4, 0xA5, 0xA6, 0xA7, 0xA8, 0xA9, 0xAA, 0xB2, 0xB3,
        0xB4, 0xB5, 0xB6, 0xB7, 0xB8, 0xB9, 0xBA, 0xC2, 0xC3, 0xC4, 0xC5, 0xC6, 0xC7, 0xC8, 0xC9,
        0xCA, 0xD2, 0xD3, 0xD4, 0xD5, 0xD6, 0xD7, 0xD8, 0xD9, 0xDA, 0xE2, 0xE3, 0xE4, 0xE5, 0xE6,
        0xE7, 0xE8, 0xE9, 0xEA, 0xF2, 0xF3, 0xF4, 0xF5, 0xF6, 0xF7, 0xF8, 0xF9, 0xFA,
    ],
];

/// Fold standard Huffman tables and difference-code 8-bit DQT entries.
pub(crate) fn optimize_header(img: &mut JpegImage) {
    let mut hpos = 0usize;
    while let Some((ty, len)) = marker::segment_at(&img.hdrdata, hpos) {
        if ty == DHT {
            optimize_dht(&mut img.hdrdata, hpos, len);
        } else if ty == DQT {
            optimize_dqt(&mut img.hdrdata, hpos, len);
        }
        hpos += len;
    }
}

/// Undo both header optimisations.
pub(crate) fn deoptimize_header(img: &mut JpegImage) {
    let mut hpos = 0usize;
    while let Some((ty, len)) = marker::segment_at(&img.hdrdata, hpos) {
        if ty == DHT {
            deoptimize_dht(&mut img.hdrdata, hpos, len);
        } else if ty == DQT {
            deoptimize_dqt(&mut img.hdrdata, hpos, len);
        }
        hpos += len;
    }
}

fn optimize_dqt(hdrdata: &mut [u8], hpos: usize, segment_length: usize) {
    let fpos = hpos + segment_length;
    let mut hpos = hpos + 4;
    while hpos < fpos {
        let precision = hdrdata[hpos] >> 4;
        hpos += 1;
        if precision == 1 {
            // 16-bit tables stay as they are.
            hpos += 128;
            continue;
        }
        if hpos + 64 > fpos {
            break;
        }
        // Difference-code backwards so each entry keeps its left neighbour.
        for sub_pos in (1..64).rev() {
            hdrdata[hpos + sub_pos] =
                hdrdata[hpos + sub_pos].wrapping_sub(hdrdata[hpos + sub_pos - 1]);
        }
        hpos += 64;
    }
}

fn deoptimize_dqt(hdrdata: &mut [u8], hpos: usize, segment_length: usize) {
    let fpos = hpos + segment_length;
    let mut hpos = hpos + 4;
    while hpos < fpos {
        let precision = hdrdata[hpos] >> 4;
        hpos += 1;
        if precision == 1 {
            hpos += 128;
            continue;
        }
        if hpos + 64 > fpos {
            break;
        }
        for sub_pos in 1..64 {
            hdrdata[hpos + sub_pos] =
                hdrdata[hpos + sub_pos].wrapping_add(hdrdata[hpos + sub_pos - 1]);
        }
        hpos += 64;
    }
}

fn optimize_dht(hdrdata: &mut [u8], hpos: usize, segment_length: usize) {
    let fpos = hpos + segment_length;
    let mut hpos = hpos + 4;
    while hpos < fpos {
        hpos += 1; // skip the class/destination byte

        // Compare the table body against each standard table.
        for (i, std_table) in STD_HUFF_TABLES.iter().enumerate() {
            if hpos + std_table.len() > fpos {
                continue;
            }
            if &hdrdata[hpos..hpos + std_table.len()] != *std_table {
                continue;
            }
            // Replace by the sentinel: residual length, table index, zeros.
            hdrdata[hpos] = (std_table.len() - 16 - i) as u8;
            hdrdata[hpos + 1] = i as u8;
            for byte in &mut hdrdata[hpos + 2..hpos + std_table.len()] {
                *byte = 0x00;
            }
            break;
        }

        if hpos + 16 > fpos {
            break;
        }
        let skip: usize = 16 + hdrdata[hpos..hpos + 16]
            .iter()
            .map(|&b| usize::from(b))
            .sum::<usize>();
        hpos += skip;
    }
}

fn deoptimize_dht(hdrdata: &mut [u8], hpos: usize, segment_length: usize) {
    let fpos = hpos + segment_length;
    let mut hpos = hpos + 4;
    while hpos < fpos {
        hpos += 1; // skip the class/destination byte
        if hpos + 16 > fpos {
            break;
        }

        // A first length bucket above 2 cannot occur in a real table and
        // marks a folded standard table.
        if hdrdata[hpos] > 2 {
            let i = usize::from(hdrdata[hpos + 1]);
            if i < 4 {
                let std_table = STD_HUFF_TABLES[i];
                if hpos + std_table.len() <= fpos {
                    hdrdata[hpos..hpos + std_table.len()].copy_from_slice(std_table);
                }
            }
        }

        let skip: usize = 16 + hdrdata[hpos..hpos + 16]
            .iter()
            .map(|&b| usize::from(b))
            .sum::<usize>();
        hpos += skip;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dht_segment(table: &[u8], class_dest: u8) -> Vec<u8> {
        let mut seg = vec![0xFF, DHT];
        let len = (table.len() + 3) as u16;
        seg.push((len >> 8) as u8);
        seg.push(len as u8);
        seg.push(class_dest);
        seg.extend_from_slice(table);
        seg
    }

    fn dqt_segment(values: &[u8; 64]) -> Vec<u8> {
        let mut seg = vec![0xFF, DQT, 0x00, 0x43, 0x00];
        seg.extend_from_slice(values);
        seg
    }

    #[test]
    fn std_tables_have_annex_k_sizes() {
        assert_eq!(STD_HUFF_TABLES[0].len(), 28);
        assert_eq!(STD_HUFF_TABLES[1].len(), 28);
        assert_eq!(STD_HUFF_TABLES[2].len(), 178);
        assert_eq!(STD_HUFF_TABLES[3].len(), 178);
        for table in STD_HUFF_TABLES {
            let total: usize = table[..16].iter().map(|&b| usize::from(b)).sum();
            assert_eq!(total, table.len() - 16);
        }
    }

    #[test]
    fn standard_dht_folds_to_sentinel() {
        let mut img = JpegImage::new();
        img.hdrdata = dht_segment(STD_HUFF_TABLES[2], 0x10);
        optimize_header(&mut img);

        // Sentinel: (178 - 16 - 2), table index, zero padding.
        assert_eq!(img.hdrdata[5], 160);
        assert_eq!(img.hdrdata[6], 2);
        assert!(img.hdrdata[7..].iter().all(|&b| b == 0));

        deoptimize_header(&mut img);
        assert_eq!(img.hdrdata, dht_segment(STD_HUFF_TABLES[2], 0x10));
    }

    #[test]
    fn nonstandard_dht_passes_through() {
        let mut table = STD_HUFF_TABLES[0].to_vec();
        table[20] ^= 0x01; // perturb one symbol value
        let mut img = JpegImage::new();
        img.hdrdata = dht_segment(&table, 0x00);
        let original = img.hdrdata.clone();
        optimize_header(&mut img);
        assert_eq!(img.hdrdata, original);
    }

    #[test]
    fn dqt_differences_are_self_inverse() {
        let mut values = [0u8; 64];
        for (i, v) in values.iter_mut().enumerate() {
            *v = (3 + i * 5 % 200) as u8;
        }
        let mut img = JpegImage::new();
        img.hdrdata = dqt_segment(&values);
        let original = img.hdrdata.clone();

        optimize_header(&mut img);
        assert_ne!(img.hdrdata, original);
        // First entry stays, the rest are differences.
        assert_eq!(img.hdrdata[5], values[0]);
        assert_eq!(img.hdrdata[6], values[1].wrapping_sub(values[0]));

        deoptimize_header(&mut img);
        assert_eq!(img.hdrdata, original);
    }

    #[test]
    fn multiple_tables_in_one_segment() {
        // Two DHT tables in one segment: standard DC lum + standard AC lum.
        let mut body = vec![0x00u8];
        body.extend_from_slice(STD_HUFF_TABLES[0]);
        body.push(0x10);
        body.extend_from_slice(STD_HUFF_TABLES[2]);
        let mut seg = vec![0xFF, DHT];
        let len = (body.len() + 2) as u16;
        seg.push((len >> 8) as u8);
        seg.push(len as u8);
        seg.extend_from_slice(&body);

        let mut img = JpegImage::new();
        img.hdrdata = seg.clone();
        optimize_header(&mut img);
        assert_eq!(img.hdrdata[5], 12); // 28 - 16 - 0
        assert_eq!(img.hdrdata[6], 0);
        deoptimize_header(&mut img);
        assert_eq!(img.hdrdata, seg);
    }
}
