#![allow(dead_code)]

use image::codecs::jpeg::JpegEncoder;
use image::ExtendedColorType;
use jpeg_encoder::{ColorType, SamplingFactor};

/// Baseline grayscale JPEG of `width` x `height` pixels.
pub fn gray_jpeg(width: u32, height: u32, quality: u8, pixel: impl Fn(u32, u32) -> u8) -> Vec<u8> {
    let mut samples = Vec::with_capacity((width * height) as usize);
    for y in 0..height {
        for x in 0..width {
            samples.push(pixel(x, y));
        }
    }

    let mut out = Vec::new();
    JpegEncoder::new_with_quality(&mut out, quality)
        .encode(&samples, width, height, ExtendedColorType::L8)
        .expect("Failed to encode gray fixture");
    out
}

/// Baseline YCbCr JPEG of a single RGB color.
pub fn rgb_jpeg(width: u32, height: u32, quality: u8, rgb: [u8; 3]) -> Vec<u8> {
    let samples: Vec<u8> = (0..width * height).flat_map(|_| rgb).collect();

    let mut out = Vec::new();
    JpegEncoder::new_with_quality(&mut out, quality)
        .encode(&samples, width, height, ExtendedColorType::Rgb8)
        .expect("Failed to encode color fixture");
    out
}

/// 4:2:0 YCbCr JPEG of a single RGB color, baseline or progressive, with an
/// optional restart interval in MCUs.
pub fn subsampled_jpeg(
    width: u16,
    height: u16,
    rgb: [u8; 3],
    progressive: bool,
    restart_interval: u16,
) -> Vec<u8> {
    let samples: Vec<u8> = (0..width as usize * height as usize)
        .flat_map(|_| rgb)
        .collect();

    let mut out = Vec::new();
    let mut encoder = jpeg_encoder::Encoder::new(&mut out, 100);
    encoder.set_sampling_factor(SamplingFactor::F_2_2);
    encoder.set_progressive(progressive);
    if restart_interval > 0 {
        encoder.set_restart_interval(restart_interval);
    }
    encoder
        .encode(&samples, width, height, ColorType::Rgb)
        .expect("Failed to encode subsampled fixture");
    out
}

/// Offset of the first byte of entropy-coded data after the first SOS.
pub fn scan_data_offset(jpeg: &[u8]) -> usize {
    let sos = jpeg
        .windows(2)
        .position(|w| w == [0xFF, 0xDA])
        .expect("fixture has a scan");
    let length = u16::from_be_bytes([jpeg[sos + 2], jpeg[sos + 3]]) as usize;
    sos + 2 + length
}

/// Assert two gray levels are within `tolerance` of each other.
pub fn assert_close(actual: u8, expected: u8, tolerance: u8) {
    assert!(
        actual.abs_diff(expected) <= tolerance,
        "{} is not within {} of {}",
        actual,
        tolerance,
        expected
    );
}
