// Copyright (c) 2026 Christoph Gaffga
// SPDX-License-Identifier: GPL-3.0-only
// https://github.com/cgaffga/pjgcore

//! Round-trip tests for progressive JPEG: successive approximation on DC
//! and AC, end-of-band runs and non-interleaved scans over a subsampled
//! YCbCr image.

use pjg_core::{compress, decompress, Config, Predictor};

const STD_DC_LUM: [u8; 28] = [
    0x00, 0x01, 0x05, 0x01, 0x01, 0x01, 0x01, 0x01, 0x01, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
    0x00, 0x00, 0x01, 0x02, 0x03, 0x04, 0x05, 0x06, 0x07, 0x08, 0x09, 0x0A, 0x0B,
];

const STD_DC_CHROMA: [u8; 28] = [
    0x00, 0x03, 0x01, 0x01, 0x01, 0x01, 0x01, 0x01, 0x01, 0x01, 0x01, 0x00, 0x00, 0x00, 0x00,
    0x00, 0x00, 0x01, 0x02, 0x03, 0x04, 0x05, 0x06, 0x07, 0x08, 0x09, 0x0A, 0x0B,
];

const STD_AC_LUM: [u8; 178] = [
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
];

const STD_AC_CHROMA: [u8; 178] = [
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
];

fn segment(ty: u8, payload: &[u8]) -> Vec<u8> {
    let mut seg = vec![0xFF, ty];
    let len = (payload.len() + 2) as u16;
    seg.push((len >> 8) as u8);
    seg.push(len as u8);
    seg.extend_from_slice(payload);
    seg
}

fn dqt_flat(dest: u8, q: u8) -> Vec<u8> {
    let mut payload = vec![dest];
    payload.extend(std::iter::repeat(q).take(64));
    segment(0xDB, &payload)
}

fn dht(class_dest: u8, table: &[u8]) -> Vec<u8> {
    let mut payload = vec![class_dest];
    payload.extend_from_slice(table);
    segment(0xC4, &payload)
}

fn sos(components: &[(u8, u8)], ss: u8, se: u8, ah_al: u8) -> Vec<u8> {
    let mut payload = vec![components.len() as u8];
    for &(id, tables) in components {
        payload.push(id);
        payload.push(tables);
    }
    payload.extend_from_slice(&[ss, se, ah_al]);
    segment(0xDA, &payload)
}

/// 8x8 progressive YCbCr 4:2:0 with six scans:
///
/// 1. interleaved DC first stage (Al = 1), Y block 0 carries value 1
/// 2. Y AC first stage (Al = 1), one coefficient
/// 3. Y AC refinement (Ah = 1), one correction bit
/// 4. Cb AC first stage (all zero, end-of-band)
/// 5. Cr AC first stage (all zero, end-of-band)
/// 6. interleaved DC refinement, one set bit on Y block 0
///
/// Final coefficients: Y DC 3, Y zig-zag 1 = 3, everything else zero.
fn progressive_420() -> Vec<u8> {
    let mut jpeg = vec![0xFF, 0xD8];
    jpeg.extend(dqt_flat(0, 16));
    jpeg.extend(dqt_flat(1, 17));
    let mut sof_payload = vec![8, 0, 8, 0, 8, 3];
    sof_payload.extend_from_slice(&[1, 0x22, 0]); // Y 2x2
    sof_payload.extend_from_slice(&[2, 0x11, 1]); // Cb 1x1
    sof_payload.extend_from_slice(&[3, 0x11, 1]); // Cr 1x1
    jpeg.extend(segment(0xC2, &sof_payload));
    jpeg.extend(dht(0x00, &STD_DC_LUM));
    jpeg.extend(dht(0x01, &STD_DC_CHROMA));
    jpeg.extend(dht(0x10, &STD_AC_LUM));
    jpeg.extend(dht(0x11, &STD_AC_CHROMA));

    // Scan 1: DC first, interleaved, Al = 1.
    jpeg.extend(sos(&[(1, 0x00), (2, 0x10), (3, 0x10)], 0, 0, 0x01));
    jpeg.extend_from_slice(&[0x50, 0x03]);

    // Scan 2: Y AC first, band 1..63, Al = 1.
    jpeg.extend(sos(&[(1, 0x00)], 1, 63, 0x01));
    jpeg.extend_from_slice(&[0x35]);

    // Scan 3: Y AC refinement, Ah = 1, Al = 0.
    jpeg.extend(sos(&[(1, 0x00)], 1, 63, 0x10));
    jpeg.extend_from_slice(&[0xAF]);

    // Scans 4 and 5: chroma AC, all zero.
    jpeg.extend(sos(&[(2, 0x01)], 1, 63, 0x00));
    jpeg.extend_from_slice(&[0x3F]);
    jpeg.extend(sos(&[(3, 0x01)], 1, 63, 0x00));
    jpeg.extend_from_slice(&[0x3F]);

    // Scan 6: DC refinement, interleaved, Ah = 1, Al = 0.
    jpeg.extend(sos(&[(1, 0x00), (2, 0x00), (3, 0x00)], 0, 0, 0x10));
    jpeg.extend_from_slice(&[0x83]);

    jpeg.extend_from_slice(&[0xFF, 0xD9]);
    jpeg
}

fn roundtrip(jpeg: &[u8], cfg: &Config) {
    let pjg = compress(jpeg, cfg).expect("compression failed");
    assert_eq!(&pjg[..2], &[0x4A, 0x53]);
    let restored = decompress(&pjg, cfg).expect("reconstruction failed");
    assert_eq!(
        jpeg,
        &restored[..],
        "round-trip is not byte-identical ({} vs {} bytes)",
        jpeg.len(),
        restored.len()
    );
}

#[test]
fn roundtrip_progressive_420() {
    roundtrip(&progressive_420(), &Config::default());
}

#[test]
fn roundtrip_progressive_with_verification() {
    let cfg = Config {
        verify: true,
        ..Config::default()
    };
    roundtrip(&progressive_420(), &cfg);
}

#[test]
fn roundtrip_progressive_loco_predictor() {
    let cfg = Config {
        predictor: Predictor::LocoI,
        ..Config::default()
    };
    roundtrip(&progressive_420(), &cfg);
}

#[test]
fn progressive_compresses() {
    // The container should not be larger than the original for this input.
    let jpeg = progressive_420();
    let pjg = compress(&jpeg, &Config::default()).unwrap();
    assert!(
        pjg.len() < jpeg.len(),
        "container ({}) larger than input ({})",
        pjg.len(),
        jpeg.len()
    );
}

#[test]
fn progressive_with_garbage_roundtrips() {
    let mut jpeg = progressive_420();
    jpeg.extend_from_slice(b"trailing!");
    roundtrip(&jpeg, &Config::default());
}
