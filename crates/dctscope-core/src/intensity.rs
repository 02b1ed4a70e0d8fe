use crate::error::{DctError, Result};

/// Single-channel 8-bit image, row-major.
///
/// Owns its samples and holds no reference to the session it was built from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IntensityImage {
    width: usize,
    height: usize,
    samples: Vec<u8>,
}

impl IntensityImage {
    pub fn new(width: usize, height: usize, samples: Vec<u8>) -> Result<Self> {
        if width == 0 || height == 0 {
            return Err(DctError::InvalidArgument(format!(
                "image dimensions {}x{}",
                width, height
            )));
        }
        if samples.len() != width * height {
            return Err(DctError::InvalidArgument(format!(
                "{}x{} image needs {} samples, got {}",
                width,
                height,
                width * height,
                samples.len()
            )));
        }
        Ok(IntensityImage {
            width,
            height,
            samples,
        })
    }

    /// Image with every sample set to `value`.
    pub fn filled(width: usize, height: usize, value: u8) -> Result<Self> {
        IntensityImage::new(width, height, vec![value; width * height])
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn samples(&self) -> &[u8] {
        &self.samples
    }

    #[inline]
    pub fn get(&self, x: usize, y: usize) -> u8 {
        self.samples[y * self.width + x]
    }
}
