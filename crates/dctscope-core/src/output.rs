//! Grayscale artifacts: PGM bitmaps and recompressed JPEGs.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use image::codecs::jpeg::JpegEncoder;
use image::codecs::pnm::{PnmEncoder, PnmSubtype, SampleEncoding};
use image::ExtendedColorType;

use crate::error::{DctError, Result};
use crate::intensity::IntensityImage;

/// JPEG quality used when none is given.
pub const DEFAULT_JPEG_QUALITY: u8 = 90;

fn create(path: &Path) -> Result<BufWriter<File>> {
    let file = File::create(path).map_err(|source| DctError::Output {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(BufWriter::new(file))
}

fn finish(mut writer: BufWriter<File>, path: &Path) -> Result<()> {
    writer.flush().map_err(|source| DctError::Output {
        path: path.to_path_buf(),
        source,
    })
}

fn dimensions(image: &IntensityImage) -> Result<(u32, u32)> {
    let width = u32::try_from(image.width())
        .map_err(|_| DctError::InvalidArgument(format!("width {} too large", image.width())))?;
    let height = u32::try_from(image.height())
        .map_err(|_| DctError::InvalidArgument(format!("height {} too large", image.height())))?;
    Ok((width, height))
}

/// Write a binary PGM (P5, maxval 255).
pub fn save_pgm<P: AsRef<Path>>(image: &IntensityImage, path: P) -> Result<()> {
    let path = path.as_ref();
    let (width, height) = dimensions(image)?;
    let mut writer = create(path)?;

    let mut encoder =
        PnmEncoder::new(&mut writer).with_subtype(PnmSubtype::Graymap(SampleEncoding::Binary));
    encoder.encode(image.samples(), width, height, ExtendedColorType::L8)?;

    finish(writer, path)?;
    log::info!("wrote {}", path.display());
    Ok(())
}

/// Write a single-channel JPEG at `quality` (1 to 100).
pub fn save_jpeg<P: AsRef<Path>>(image: &IntensityImage, path: P, quality: u8) -> Result<()> {
    if !(1..=100).contains(&quality) {
        return Err(DctError::InvalidArgument(format!(
            "JPEG quality {} is outside 1..=100",
            quality
        )));
    }

    let path = path.as_ref();
    let (width, height) = dimensions(image)?;
    let mut writer = create(path)?;

    let mut encoder = JpegEncoder::new_with_quality(&mut writer, quality);
    encoder.encode(image.samples(), width, height, ExtendedColorType::L8)?;

    finish(writer, path)?;
    log::info!("wrote {} (quality {})", path.display(), quality);
    Ok(())
}
