// Copyright (c) 2026 Christoph Gaffga
// SPDX-License-Identifier: GPL-3.0-only
// https://github.com/cgaffga/pjgcore

//! Conversion pipeline: stage sequencing, warning gating and verification.
//!
//! A JPEG compresses through read -> decode -> range check -> IDCT
//! adaptation -> DC prediction -> zero lists -> PJG encode; a PJG
//! reconstructs through the inverse chain. Every stage works on one
//! per-file [`JpegImage`] context which is dropped at the end, so no state
//! leaks between files. Recoverable conditions collect as warnings and
//! become errors unless proceeding was requested; with proceeding enabled,
//! bit-exact reconstruction is no longer guaranteed.

use crate::io::{MemReader, MemWriter};
use crate::jpeg::JpegImage;
use crate::pjg::error::{PjgError, Result};
use crate::predictor::Predictor;
use crate::{dct, jpeg, pjg, predictor};

/// Fixed per-component coder settings.
///
/// Stored in the container so reconstruction uses the same models; in auto
/// mode (the default) both sides derive them from the block counts instead.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Settings {
    /// Bit-pattern noise thresholds, one per component slot (0..=10).
    pub nois_trs: [u8; 4],
    /// Arithmetic-coder segment counts, one per component slot (1..=49).
    pub segm_cnt: [u8; 4],
}

/// Conversion options.
#[derive(Debug, Clone, Copy)]
pub struct Config {
    /// Run the inverse conversion afterwards and compare byte-for-byte.
    pub verify: bool,
    /// Drop APPn/COM meta segments (the result is no longer bit-identical).
    pub discard_meta: bool,
    /// Continue over recoverable conditions instead of failing.
    pub proceed_on_warnings: bool,
    /// DC predictor; affects the container bitstream and must match between
    /// compression and reconstruction.
    pub predictor: Predictor,
    /// Fixed coder settings; `None` selects automatic per-component values.
    pub settings: Option<Settings>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            verify: false,
            discard_meta: false,
            proceed_on_warnings: false,
            predictor: Predictor::default(),
            settings: None,
        }
    }
}

/// Input kind determined from the magic bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileKind {
    Jpeg,
    Pjg,
}

/// Determine the input kind by content, not by name.
pub fn detect(data: &[u8]) -> Option<FileKind> {
    match data {
        [0xFF, 0xD8, ..] => Some(FileKind::Jpeg),
        [b'J', b'S', ..] => Some(FileKind::Pjg),
        _ => None,
    }
}

/// Convert either direction, dispatching on the magic bytes.
///
/// Returns the detected input kind together with the converted bytes.
pub fn convert(data: &[u8], cfg: &Config) -> Result<(FileKind, Vec<u8>)> {
    match detect(data).ok_or(PjgError::UnknownFileType)? {
        FileKind::Jpeg => Ok((FileKind::Jpeg, compress(data, cfg)?)),
        FileKind::Pjg => Ok((FileKind::Pjg, decompress(data, cfg)?)),
    }
}

/// Losslessly compress a JPEG into a PJG container.
pub fn compress(jpeg_data: &[u8], cfg: &Config) -> Result<Vec<u8>> {
    if detect(jpeg_data) != Some(FileKind::Jpeg) {
        return Err(PjgError::UnknownFileType);
    }

    let pjg_data = compress_stages(jpeg_data, cfg)?;

    if cfg.verify {
        log::debug!("Verifying output stream");
        let (rebuilt, _) = decompress_stages(&pjg_data, cfg)?;
        compare_output(jpeg_data, &rebuilt)?;
    }

    Ok(pjg_data)
}

/// Losslessly reconstruct the original JPEG from a PJG container.
pub fn decompress(pjg_data: &[u8], cfg: &Config) -> Result<Vec<u8>> {
    if detect(pjg_data) != Some(FileKind::Pjg) {
        return Err(PjgError::UnknownFileType);
    }

    let (jpeg_data, file_settings) = decompress_stages(pjg_data, cfg)?;

    if cfg.verify {
        log::debug!("Verifying output stream");
        // Recompression must reuse exactly the settings the container
        // carried (auto stays auto).
        let verify_cfg = Config {
            verify: false,
            settings: file_settings,
            ..*cfg
        };
        let rebuilt = compress_stages(&jpeg_data, &verify_cfg)?;
        compare_output(pjg_data, &rebuilt)?;
    }

    Ok(jpeg_data)
}

fn compress_stages(jpeg_data: &[u8], cfg: &Config) -> Result<Vec<u8>> {
    let mut img = JpegImage::new();
    apply_settings(&mut img, cfg);

    let mut str_in = MemReader::new(jpeg_data.to_vec());
    str_in.seek(2); // past the SOI magic
    let mut str_out = MemWriter::new();

    log::debug!("Reading header & image data");
    jpeg::decoder::read(&mut img, &mut str_in, cfg.settings.is_none())?;
    check_warnings(&img, cfg)?;

    log::debug!("Decompressing JPEG image data");
    jpeg::decoder::decode(&mut img)?;
    check_warnings(&img, cfg)?;

    log::debug!("Checking values range");
    jpeg::decoder::check_value_range(&img)?;

    log::debug!("Adapting DCT precalc. tables");
    dct::adapt_icos(&mut img);

    log::debug!("Applying prediction to DC");
    predictor::predict_dc(&mut img, cfg.predictor);

    log::debug!("Calculating zero dist lists");
    pjg::calc_zdst_lists(&mut img);

    log::debug!("Compressing data to PJG");
    pjg::encoder::encode(&mut img, &mut str_out, cfg.settings.is_none(), cfg.discard_meta)?;
    check_warnings(&img, cfg)?;

    Ok(str_out.into_data())
}

fn decompress_stages(pjg_data: &[u8], cfg: &Config) -> Result<(Vec<u8>, Option<Settings>)> {
    let mut img = JpegImage::new();

    let mut str_in = MemReader::new(pjg_data.to_vec());
    str_in.seek(2); // past the container magic
    let mut str_out = MemWriter::new();

    log::debug!("Uncompressing data from PJG");
    let had_settings = pjg::decoder::decode(&mut img, &mut str_in, cfg.discard_meta)?;
    check_warnings(&img, cfg)?;

    log::debug!("Adapting DCT precalc. tables");
    dct::adapt_icos(&mut img);

    log::debug!("Removing prediction from DC");
    predictor::unpredict_dc(&mut img, cfg.predictor);

    log::debug!("Recompressing JPEG image data");
    jpeg::encoder::recode(&mut img)?;
    check_warnings(&img, cfg)?;

    log::debug!("Merging header & image data");
    jpeg::encoder::merge(&img, &mut str_out)?;

    let settings = had_settings.then(|| Settings {
        nois_trs: [
            img.components[0].nois_trs,
            img.components[1].nois_trs,
            img.components[2].nois_trs,
            img.components[3].nois_trs,
        ],
        segm_cnt: [
            img.components[0].segm_cnt,
            img.components[1].segm_cnt,
            img.components[2].segm_cnt,
            img.components[3].segm_cnt,
        ],
    });

    Ok((str_out.into_data(), settings))
}

fn apply_settings(img: &mut JpegImage, cfg: &Config) {
    if let Some(settings) = &cfg.settings {
        for cmp in 0..4 {
            img.components[cmp].nois_trs = settings.nois_trs[cmp].min(10);
            img.components[cmp].segm_cnt = settings.segm_cnt[cmp].clamp(1, 49);
        }
    }
}

fn check_warnings(img: &JpegImage, cfg: &Config) -> Result<()> {
    if !cfg.proceed_on_warnings {
        if let Some(warning) = img.warnings.first() {
            return Err(PjgError::Warning(warning.clone()));
        }
    }
    Ok(())
}

fn compare_output(original: &[u8], rebuilt: &[u8]) -> Result<()> {
    if original.len() != rebuilt.len() {
        return Err(PjgError::VerificationSizeMismatch {
            original: original.len(),
            rebuilt: rebuilt.len(),
        });
    }
    if let Some(offset) = original
        .iter()
        .zip(rebuilt.iter())
        .position(|(a, b)| a != b)
    {
        return Err(PjgError::VerificationFailed { offset });
    }
    Ok(())
}


// Per-stage state invariants over a complete minimal file, checked against
// the internal context (the integration tests only see bytes).
#[cfg(test)]
mod state_tests {
    use super::*;
    use crate::jpeg;

    const STD_DC_LUM: [u8; 28] = [
        0x00, 0x01, 0x05, 0x01, 0x01, 0x01, 0x01, 0x01, 0x01, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
        0x00, 0x00, 0x01, 0x02, 0x03, 0x04, 0x05, 0x06, 0x07, 0x08, 0x09, 0x0A, 0x0B,
    ];

    fn segment(ty: u8, payload: &[u8]) -> Vec<u8> {
        let mut seg = vec![0xFF, ty];
        let len = (payload.len() + 2) as u16;
        seg.push((len >> 8) as u8);
        seg.push(len as u8);
        seg.extend_from_slice(payload);
        seg
    }

    // 16x8 grayscale, DRI = 1, compact non-standard AC table; scan data:
    // "DC 5, AC[1] -3, EOB" / RST0 / "DC diff 0, EOB".
    fn rst_jpeg(extra_rst: bool) -> Vec<u8> {
        let mut jpeg = vec![0xFF, 0xD8];
        let mut dqt = vec![0u8];
        dqt.extend(std::iter::repeat(16u8).take(64));
        jpeg.extend(segment(0xDB, &dqt));
        let mut dc = vec![0x00];
        dc.extend_from_slice(&STD_DC_LUM);
        jpeg.extend(segment(0xC4, &dc));
        // Minimal AC table: EOB "0", (0,2) "10", ZRL "110".
        let mut ac = vec![0x10u8];
        let mut bits = [0u8; 16];
        bits[0] = 1;
        bits[1] = 1;
        bits[2] = 1;
        ac.extend_from_slice(&bits);
        ac.extend_from_slice(&[0x00, 0x02, 0xF0]);
        jpeg.extend(segment(0xC4, &ac));
        jpeg.extend(segment(0xDD, &[0, 1]));
        jpeg.extend(segment(0xC0, &[8, 0, 8, 0, 16, 1, 1, 0x11, 0]));
        jpeg.extend(segment(0xDA, &[1, 1, 0x00, 0, 63, 0]));
        // MCU 0: "100 101" (DC 5) + "10 00" (AC -3) + "0" (EOB) + pad "11111".
        jpeg.extend_from_slice(&[0x96, 0x3F]);
        jpeg.extend_from_slice(&[0xFF, 0xD0]);
        // MCU 1: "00" (DC diff 0) + "0" (EOB) + pad.
        jpeg.extend_from_slice(&[0x1F]);
        if extra_rst {
            jpeg.extend_from_slice(&[0xFF, 0xD1]);
        }
        jpeg.extend_from_slice(&[0xFF, 0xD9]);
        jpeg
    }

    fn split_and_decode(data: &[u8]) -> JpegImage {
        let mut img = JpegImage::new();
        let mut reader = MemReader::new(data.to_vec());
        reader.seek(2);
        jpeg::decoder::read(&mut img, &mut reader, true).unwrap();
        jpeg::decoder::decode(&mut img).unwrap();
        img
    }

    #[test]
    fn split_collects_blobs_and_restart_state() {
        let img = split_and_decode(&rst_jpeg(false));
        assert_eq!(img.scan_count, 1);
        assert_eq!(img.rsti, 1);
        assert!(img.rst_err.is_empty());
        assert!(img.grbgdata.is_empty());
        // De-stuffed scan bytes without the restart marker.
        assert_eq!(img.huffdata, vec![0x96, 0x3F, 0x1F]);
        assert_eq!(img.padbit, Some(1));
        // The restart marker resets the DC predictor before the second MCU.
        assert_eq!(img.components[0].colldata[0], vec![5, 0]);
        assert_eq!(img.components[0].colldata[1], vec![-3, 0]);
        jpeg::decoder::check_value_range(&img).unwrap();
    }

    #[test]
    fn extraneous_rst_is_tallied_and_warned() {
        let img = split_and_decode(&rst_jpeg(true));
        assert_eq!(img.rst_err, vec![1]);
        assert!(!img.warnings.is_empty());
    }

    #[test]
    fn recode_restores_scan_and_restart_positions() {
        let mut img = split_and_decode(&rst_jpeg(false));
        jpeg::encoder::recode(&mut img).unwrap();
        // scnp brackets the single scan; rstp ends with the size sentinel.
        assert_eq!(img.scnp, vec![0, img.huffdata.len()]);
        assert_eq!(img.rstp, vec![1, img.huffdata.len()]);
        assert_eq!(img.huffdata, vec![0x96, 0x3F, 0x1F]);

        let mut out = MemWriter::new();
        jpeg::encoder::merge(&img, &mut out).unwrap();
        assert_eq!(out.into_data(), rst_jpeg(false));
    }

    #[test]
    fn coefficients_stay_in_range_and_scan_is_permutation() {
        let mut img = split_and_decode(&rst_jpeg(false));
        dct::adapt_icos(&mut img);
        predictor::predict_dc(&mut img, Predictor::default());
        pjg::calc_zdst_lists(&mut img);
        let mut out = MemWriter::new();
        pjg::encoder::encode(&mut img, &mut out, true, false).unwrap();

        let cmpt = &img.components[0];
        // Zero-sort scan invariant: slot 0 fixed, the rest a permutation.
        assert_eq!(cmpt.freqscan[0], 0);
        let mut seen = [false; 64];
        for &f in &cmpt.freqscan {
            assert!(!seen[usize::from(f)]);
            seen[usize::from(f)] = true;
        }
        // Prediction errors stay inside the coefficient range.
        let absmax = cmpt.max_v(0) as i16;
        assert!(cmpt.colldata[0].iter().all(|&v| v.abs() <= absmax));
    }
}
