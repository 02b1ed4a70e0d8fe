//! Coefficient Block Store: read-only, row-addressable access to one
//! component's quantized DCT blocks.
//!
//! Rows are handed out in requests aligned to the component's vertical
//! sampling factor, the granularity at which an MCU-oriented decoder
//! produces them. A malformed request is a [`DctError::StoreAccess`] error;
//! a block that simply has no decoded data is [`BlockSlot::Absent`].

use crate::error::{DctError, Result};
use crate::session::{ComponentCoefficients, ComponentInfo};
use crate::zigzag::to_zigzag;

/// 64 quantized coefficients in natural (row-major) order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CoefficientBlock([i16; 64]);

impl CoefficientBlock {
    pub const fn new(natural: [i16; 64]) -> Self {
        CoefficientBlock(natural)
    }

    /// Block whose only non-zero coefficient is the DC term.
    pub fn from_dc(dc: i16) -> Self {
        let mut natural = [0; 64];
        natural[0] = dc;
        CoefficientBlock(natural)
    }

    /// The DC term, not dequantized.
    #[inline]
    pub fn dc(&self) -> i16 {
        self.0[0]
    }

    #[inline]
    pub fn coefficients(&self) -> &[i16; 64] {
        &self.0
    }

    /// Coefficients in zigzag (frequency) order.
    pub fn zigzag(&self) -> [i16; 64] {
        to_zigzag(&self.0)
    }
}

/// One grid position inside a fetched row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockSlot<'a> {
    Present(&'a CoefficientBlock),
    /// No scan decoded this block; a valid state, not an error.
    Absent,
}

impl<'a> From<&'a Option<CoefficientBlock>> for BlockSlot<'a> {
    fn from(block: &'a Option<CoefficientBlock>) -> Self {
        match block {
            Some(b) => BlockSlot::Present(b),
            None => BlockSlot::Absent,
        }
    }
}

/// A run of consecutive block rows, borrowed from the store that produced it.
#[derive(Debug, Clone, Copy)]
pub struct BlockRows<'a> {
    first_row: usize,
    width: usize,
    slots: &'a [Option<CoefficientBlock>],
}

impl<'a> BlockRows<'a> {
    /// `slots` holds whole rows of `width` blocks, starting at `first_row`.
    pub fn new(first_row: usize, width: usize, slots: &'a [Option<CoefficientBlock>]) -> Self {
        debug_assert!(width > 0 && slots.len() % width == 0);
        BlockRows {
            first_row,
            width,
            slots,
        }
    }

    pub fn first_row(&self) -> usize {
        self.first_row
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn row_count(&self) -> usize {
        self.slots.len() / self.width.max(1)
    }

    /// Slot at an absolute (row, column) position, `None` outside these rows.
    pub fn get(&self, row: usize, column: usize) -> Option<BlockSlot<'a>> {
        if row < self.first_row || column >= self.width {
            return None;
        }
        self.slots
            .get((row - self.first_row) * self.width + column)
            .map(BlockSlot::from)
    }

    /// All slots as `(row, column, slot)`, rows top to bottom, columns left to right.
    pub fn iter(&self) -> impl Iterator<Item = (usize, usize, BlockSlot<'a>)> + 'a {
        let first_row = self.first_row;
        let width = self.width.max(1);
        self.slots
            .iter()
            .enumerate()
            .map(move |(i, block)| (first_row + i / width, i % width, BlockSlot::from(block)))
    }
}

/// Row-addressable source of one component's blocks.
pub trait BlockSource {
    fn component(&self) -> &ComponentInfo;

    /// Row alignment and maximum row count of a single request.
    fn row_stride(&self) -> usize;

    /// Fetch `count` rows starting at `start_row`.
    fn rows(&self, start_row: usize, count: usize) -> Result<BlockRows<'_>>;

    /// Check a request against stride and grid bounds.
    fn check_request(&self, start_row: usize, count: usize) -> Result<()> {
        let info = self.component();
        let stride = self.row_stride().max(1);
        let refuse = |reason: String| DctError::StoreAccess {
            component: info.index,
            row: start_row,
            reason,
        };

        if count == 0 || count > stride {
            return Err(refuse(format!(
                "requested {} rows, a request covers 1 to {}",
                count, stride
            )));
        }
        if start_row % stride != 0 {
            return Err(refuse(format!("row is not aligned to stride {}", stride)));
        }
        if start_row + count > info.height_in_blocks {
            return Err(refuse(format!(
                "rows {}..{} exceed the grid height of {}",
                start_row,
                start_row + count,
                info.height_in_blocks
            )));
        }
        Ok(())
    }
}

/// The `(start_row, count)` requests that cover a grid of `height` rows.
pub fn row_requests(height: usize, stride: usize) -> impl Iterator<Item = (usize, usize)> {
    let stride = stride.max(1);
    (0..height)
        .step_by(stride)
        .map(move |start| (start, stride.min(height - start)))
}

/// Block store over a [`DecodeSession`](crate::DecodeSession) component.
#[derive(Debug, Clone, Copy)]
pub struct CoefficientStore<'s> {
    coefficients: &'s ComponentCoefficients,
}

impl<'s> CoefficientStore<'s> {
    pub(crate) fn new(coefficients: &'s ComponentCoefficients) -> Self {
        CoefficientStore { coefficients }
    }
}

impl<'s> BlockSource for CoefficientStore<'s> {
    fn component(&self) -> &ComponentInfo {
        self.coefficients.info()
    }

    fn row_stride(&self) -> usize {
        self.coefficients.info().v_sampling as usize
    }

    fn rows(&self, start_row: usize, count: usize) -> Result<BlockRows<'_>> {
        self.check_request(start_row, count)?;
        let width = self.component().width_in_blocks;
        let slots = &self.coefficients.blocks()[start_row * width..(start_row + count) * width];
        Ok(BlockRows::new(start_row, width, slots))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::DecodeSession;

    fn session(v_sampling: u8, blocks: Vec<Option<CoefficientBlock>>, w: usize, h: usize) -> DecodeSession {
        let info = ComponentInfo {
            index: 0,
            id: 1,
            width_in_blocks: w,
            height_in_blocks: h,
            h_sampling: 1,
            v_sampling,
            quant_table_id: 0,
        };
        let component = ComponentCoefficients::new(info, None, blocks).expect("valid component");
        DecodeSession::from_components(w as u32 * 8, h as u32 * 8, vec![component])
            .expect("valid session")
    }

    #[test]
    fn test_zigzag_of_block() {
        let mut natural = [0i16; 64];
        natural[8] = 5;
        natural[1] = -2;
        let block = CoefficientBlock::new(natural);
        let zz = block.zigzag();
        assert_eq!(zz[1], -2);
        assert_eq!(zz[2], 5);
        assert_eq!(block.dc(), 0);
        assert_eq!(CoefficientBlock::from_dc(-7).dc(), -7);
    }

    #[test]
    fn test_rows_report_presence() {
        let blocks = vec![
            Some(CoefficientBlock::from_dc(1)),
            None,
            Some(CoefficientBlock::from_dc(3)),
            Some(CoefficientBlock::from_dc(4)),
        ];
        let session = session(1, blocks, 2, 2);
        let store = session.store(0).unwrap();

        let rows = store.rows(1, 1).expect("aligned request");
        assert_eq!(rows.first_row(), 1);
        assert_eq!(rows.row_count(), 1);
        assert!(matches!(rows.get(1, 1), Some(BlockSlot::Present(b)) if b.dc() == 4));
        assert_eq!(rows.get(0, 0), None);

        let first = store.rows(0, 1).unwrap();
        let slots: Vec<_> = first.iter().collect();
        assert_eq!(slots.len(), 2);
        assert_eq!(slots[1], (0, 1, BlockSlot::Absent));
    }

    #[test]
    fn test_requests_must_respect_stride() {
        let session = session(2, vec![None; 5], 1, 5);
        let store = session.store(0).unwrap();
        assert_eq!(store.row_stride(), 2);

        assert!(store.rows(0, 2).is_ok());
        assert!(store.rows(4, 1).is_ok(), "last partial request");

        for (start, count) in [(1, 1), (0, 3), (0, 0), (4, 2), (6, 1)] {
            let err = store.rows(start, count).unwrap_err();
            assert!(
                matches!(err, DctError::StoreAccess { component: 0, row, .. } if row == start),
                "({}, {}) gave {:?}",
                start,
                count,
                err
            );
        }
    }

    #[test]
    fn test_row_requests_cover_the_grid() {
        let requests: Vec<_> = row_requests(5, 2).collect();
        assert_eq!(requests, vec![(0, 2), (2, 2), (4, 1)]);
        assert_eq!(row_requests(3, 1).count(), 3);
    }
}
