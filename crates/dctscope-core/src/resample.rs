//! Chroma Resampler.

use crate::error::{DctError, Result};
use crate::intensity::IntensityImage;

/// Nearest-neighbor scaling with integer arithmetic only.
///
/// Target pixel `(x, y)` copies source pixel
/// `(x * src_width / dst_width, y * src_height / dst_height)`.
pub fn resample_nearest(
    source: &IntensityImage,
    dst_width: usize,
    dst_height: usize,
) -> Result<IntensityImage> {
    if dst_width == 0 || dst_height == 0 {
        return Err(DctError::InvalidArgument(format!(
            "resample target {}x{}",
            dst_width, dst_height
        )));
    }

    let (src_width, src_height) = (source.width(), source.height());
    let mut samples = Vec::with_capacity(dst_width * dst_height);
    for y in 0..dst_height {
        let sy = y * src_height / dst_height;
        for x in 0..dst_width {
            let sx = x * src_width / dst_width;
            samples.push(source.get(sx, sy));
        }
    }

    IntensityImage::new(dst_width, dst_height, samples)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ramp(width: usize, height: usize) -> IntensityImage {
        let samples = (0..width * height).map(|i| (i * 7 % 256) as u8).collect();
        IntensityImage::new(width, height, samples).unwrap()
    }

    #[test]
    fn test_same_size_is_identity() {
        let source = ramp(5, 3);
        assert_eq!(resample_nearest(&source, 5, 3).unwrap(), source);
    }

    #[test]
    fn test_doubling_repeats_samples() {
        let source = IntensityImage::new(2, 1, vec![10, 20]).unwrap();
        let scaled = resample_nearest(&source, 4, 2).unwrap();
        assert_eq!(scaled.samples(), &[10, 10, 20, 20, 10, 10, 20, 20]);
    }

    #[test]
    fn test_odd_ratio_source_indices_stay_in_bounds() {
        // 5x3 chroma grid against a 10x6 luma grid, and the reverse
        for (sw, sh, dw, dh) in [(5, 3, 10, 6), (3, 2, 10, 6), (10, 6, 3, 2), (1, 1, 7, 5)] {
            let source = ramp(sw, sh);
            let scaled = resample_nearest(&source, dw, dh).unwrap();
            assert_eq!((scaled.width(), scaled.height()), (dw, dh));
            for y in 0..dh {
                for x in 0..dw {
                    assert!(x * sw / dw < sw && y * sh / dh < sh);
                }
            }
        }
    }

    #[test]
    fn test_zero_target_is_rejected() {
        let source = ramp(2, 2);
        assert!(matches!(
            resample_nearest(&source, 0, 2),
            Err(DctError::InvalidArgument(_))
        ));
        assert!(resample_nearest(&source, 2, 0).is_err());
    }
}
