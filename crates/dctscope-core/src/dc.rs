//! DC Extractor: one gray sample per block, taken from the DC term only.

use crate::error::{DctError, Result};
use crate::intensity::IntensityImage;
use crate::session::{DecodeSession, QuantTable};
use crate::store::{row_requests, BlockSlot, BlockSource};

/// What the DC extractor does with a block that has no decoded data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AbsentBlockPolicy {
    /// Fail the extraction on the first absent block.
    #[default]
    Fail,
    /// Use the given gray level for absent blocks.
    Fill(u8),
}

/// Approximate 8-bit level of a block from its DC term:
/// `clamp(dc * q0 / 8 + 128, 0, 255)` with truncating division.
#[inline]
pub fn dc_intensity(dc: i16, q0: u16) -> u8 {
    let level = (dc as i32 * q0 as i32) / 8 + 128;
    level.clamp(0, 255) as u8
}

/// Build a `width_in_blocks × height_in_blocks` image from a component's DC terms.
pub fn extract_dc<S: BlockSource + ?Sized>(
    source: &S,
    quant: &QuantTable,
    policy: AbsentBlockPolicy,
) -> Result<IntensityImage> {
    let info = source.component();
    let (width, height) = (info.width_in_blocks, info.height_in_blocks);
    let q0 = quant.dc();

    log::debug!(
        "extracting DC of component {}: {}x{} blocks, q0 = {}\n{}",
        info.index,
        width,
        height,
        q0,
        quant.to_ascii_table()
    );

    let mut samples = vec![0u8; width * height];
    let mut filled = 0usize;

    for (start, count) in row_requests(height, source.row_stride()) {
        let rows = source.rows(start, count)?;

        for (row, column, slot) in rows.iter() {
            samples[row * width + column] = match slot {
                BlockSlot::Present(block) => dc_intensity(block.dc(), q0),
                BlockSlot::Absent => match policy {
                    AbsentBlockPolicy::Fail => {
                        return Err(DctError::AbsentBlock {
                            component: info.index,
                            row,
                            column,
                        })
                    }
                    AbsentBlockPolicy::Fill(level) => {
                        filled += 1;
                        level
                    }
                },
            };
        }

        if log::log_enabled!(log::Level::Trace) {
            for row in start..start + count {
                let dcs: Vec<String> = (0..width)
                    .map(|column| match rows.get(row, column) {
                        Some(BlockSlot::Present(block)) => block.dc().to_string(),
                        _ => "-".to_string(),
                    })
                    .collect();
                log::trace!("component {} row {}: {}", info.index, row, dcs.join(" "));
            }
        }
    }

    if filled > 0 {
        log::warn!(
            "component {}: {} of {} blocks absent, filled with gray",
            info.index,
            filled,
            width * height
        );
    }

    IntensityImage::new(width, height, samples)
}

/// [`extract_dc`] for one component of a session.
pub fn extract_component(
    session: &DecodeSession,
    index: usize,
    policy: AbsentBlockPolicy,
) -> Result<IntensityImage> {
    let store = session.store(index)?;
    let quant = session.quant_table(index)?;
    extract_dc(&store, quant, policy)
}
