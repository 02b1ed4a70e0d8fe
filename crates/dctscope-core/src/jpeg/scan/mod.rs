//! Entropy decoding of scan data into quantized DCT coefficients.
//!
//! Coefficients are neither dequantized nor transformed. Each component gets
//! a [`CoefficientGrid`] padded to whole MCUs, in natural order, together with
//! a presence flag per block.
//!
//! # Module Structure
//!
//! - `sequential` - Baseline and extended sequential scans (SOF0, SOF1)
//! - `progressive` - Spectral selection and successive approximation (SOF2)

mod progressive;
mod sequential;

use super::huffman::BitReader;
use super::parser::{FrameInfo, JpegSegments, Scan};
use crate::error::{DctError, Result};

pub use progressive::ProgressiveDecoder;
pub use sequential::SequentialDecoder;

/// Quantized coefficients of one component.
#[derive(Debug, Clone)]
pub struct CoefficientGrid {
    /// Blocks per row, padded to whole MCUs.
    pub width: usize,
    /// Block rows, padded to whole MCUs.
    pub height: usize,
    /// Natural-order coefficients, row-major.
    pub blocks: Vec<[i16; 64]>,
    /// Whether a scan has decoded the DC term of the block.
    pub present: Vec<bool>,
}

impl CoefficientGrid {
    pub fn new(width: usize, height: usize) -> Self {
        CoefficientGrid {
            width,
            height,
            blocks: vec![[0; 64]; width * height],
            present: vec![false; width * height],
        }
    }

    #[inline]
    pub fn index(&self, row: usize, col: usize) -> usize {
        row * self.width + col
    }

    #[inline]
    pub fn block_mut(&mut self, row: usize, col: usize) -> &mut [i16; 64] {
        let idx = self.index(row, col);
        &mut self.blocks[idx]
    }

    #[inline]
    pub fn mark_present(&mut self, row: usize, col: usize) {
        let idx = self.index(row, col);
        self.present[idx] = true;
    }

    /// Number of present blocks.
    pub fn present_count(&self) -> usize {
        self.present.iter().filter(|&&p| p).count()
    }
}

/// Per-scan decoding state, driven block by block by [`walk_scan`].
pub trait BlockDecoder {
    /// Decode one block of the `slot`-th scan component.
    fn decode_block(
        &mut self,
        reader: &mut BitReader<'_>,
        slot: usize,
        block: &mut [i16; 64],
    ) -> Result<BlockOutcome>;

    /// Reset predictors and EOB runs at a restart marker.
    fn reset(&mut self);
}

/// What decoding a block did to its presence state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockOutcome {
    /// The DC term was decoded, the block is now present.
    DcDecoded,
    /// Only refinement or AC data, presence unchanged.
    Refined,
}

/// Decode every scan of a parsed JPEG.
///
/// A scan that fails part way is logged and left as far as it got: blocks it
/// did not reach keep their previous presence state. The returned grids are
/// indexed like `frame.components`.
pub fn decode_coefficients(segments: &JpegSegments) -> Result<Vec<CoefficientGrid>> {
    let frame = segments
        .frame
        .as_ref()
        .ok_or_else(|| DctError::format("missing frame info (SOF)"))?;

    let mut grids: Vec<CoefficientGrid> = (0..frame.components.len())
        .map(|i| {
            CoefficientGrid::new(frame.padded_width_in_blocks(i), frame.padded_height_in_blocks(i))
        })
        .collect();

    for (n, scan) in segments.scans.iter().enumerate() {
        let result = if frame.is_progressive() {
            ProgressiveDecoder::for_scan(scan)
                .and_then(|mut decoder| walk_scan(frame, scan, &mut grids, &mut decoder))
        } else {
            SequentialDecoder::for_scan(scan)
                .and_then(|mut decoder| walk_scan(frame, scan, &mut grids, &mut decoder))
        };

        if let Err(e) = result {
            log::warn!(
                "scan {} (Ss={}, Se={}, Ah={}, Al={}) stopped early: {}",
                n,
                scan.ss,
                scan.se,
                scan.ah,
                scan.al,
                e
            );
        }
    }

    for (i, grid) in grids.iter().enumerate() {
        log::debug!(
            "component {}: {} of {} padded blocks decoded",
            i,
            grid.present_count(),
            grid.blocks.len()
        );
    }

    Ok(grids)
}

/// Visit the blocks of one scan in bitstream order.
///
/// A single-component scan is non-interleaved: it covers the component's
/// unpadded block grid in raster order, one block per MCU. A scan with more
/// components walks whole MCUs.
pub fn walk_scan<D: BlockDecoder>(
    frame: &FrameInfo,
    scan: &Scan,
    grids: &mut [CoefficientGrid],
    decoder: &mut D,
) -> Result<()> {
    let mut reader = BitReader::new(&scan.data);
    let restart_interval = scan.restart_interval as usize;

    let (mcu_cols, mcu_rows) = if scan.components.len() == 1 {
        let c = scan.components[0].component_index;
        (frame.width_in_blocks(c), frame.height_in_blocks(c))
    } else {
        (frame.mcu_cols(), frame.mcu_rows())
    };
    let total_mcus = mcu_cols * mcu_rows;

    for mcu in 0..total_mcus {
        if restart_interval > 0 && mcu > 0 && mcu % restart_interval == 0 {
            let n = reader.restart()?;
            let expected = ((mcu / restart_interval - 1) % 8) as u8;
            if n != expected {
                log::warn!("found RST{} where RST{} was expected", n, expected);
            }
            decoder.reset();
        }

        let mcu_row = mcu / mcu_cols;
        let mcu_col = mcu % mcu_cols;

        if scan.components.len() == 1 {
            decode_at(decoder, grids, scan, &mut reader, 0, mcu_row, mcu_col)?;
            continue;
        }

        for (slot, sc) in scan.components.iter().enumerate() {
            let component = &frame.components[sc.component_index];
            let h = component.h_sampling as usize;
            let v = component.v_sampling as usize;
            for by in 0..v {
                for bx in 0..h {
                    let (row, col) = (mcu_row * v + by, mcu_col * h + bx);
                    decode_at(decoder, grids, scan, &mut reader, slot, row, col)?;
                }
            }
        }
    }

    Ok(())
}

fn decode_at<D: BlockDecoder>(
    decoder: &mut D,
    grids: &mut [CoefficientGrid],
    scan: &Scan,
    reader: &mut BitReader<'_>,
    slot: usize,
    row: usize,
    col: usize,
) -> Result<()> {
    let grid = &mut grids[scan.components[slot].component_index];
    let outcome = decoder.decode_block(reader, slot, grid.block_mut(row, col))?;
    if outcome == BlockOutcome::DcDecoded {
        grid.mark_present(row, col);
    }
    Ok(())
}

/// Saturate a decoded value into the coefficient range.
#[inline]
pub(crate) fn to_coefficient(value: i32) -> i16 {
    value.clamp(i16::MIN as i32, i16::MAX as i32) as i16
}

/// Add a DC difference to a component's predictor and return the new value.
pub(crate) fn advance_predictor(predictor: &mut i32, diff: i32) -> Result<i32> {
    *predictor = predictor
        .checked_add(diff)
        .ok_or_else(|| DctError::format("DC predictor out of range"))?;
    Ok(*predictor)
}
