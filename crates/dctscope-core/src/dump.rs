//! Zigzag Coefficient Serializer.
//!
//! Text format, one component after the other:
//!
//! ```text
//! component 0 y 2x1 blocks
//! -12 3 0 0 ... (64 values in zigzag order, one line per present block)
//! skipped 1 blocks (1 absent, 0 in unavailable rows)
//! ```
//!
//! The `skipped` line is written once, after the last component.

use std::io::{self, Write};

use crate::store::{row_requests, BlockSlot, BlockSource, CoefficientBlock};

/// Block counts of a coefficient dump.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DumpReport {
    /// Blocks written as a record.
    pub emitted: usize,
    /// Blocks inside fetched rows that had no decoded data.
    pub absent: usize,
    /// Blocks in rows the store refused to hand out.
    pub unavailable: usize,
}

impl DumpReport {
    /// Blocks that produced no record, for either reason.
    pub fn skipped(&self) -> usize {
        self.absent + self.unavailable
    }

    fn add(&mut self, other: DumpReport) {
        self.emitted += other.emitted;
        self.absent += other.absent;
        self.unavailable += other.unavailable;
    }
}

/// Write one block as 64 space separated integers in zigzag order.
pub fn write_block<W: Write>(out: &mut W, block: &CoefficientBlock) -> io::Result<()> {
    let zigzag = block.zigzag();
    let mut line = String::with_capacity(64 * 4);
    for (i, value) in zigzag.iter().enumerate() {
        if i > 0 {
            line.push(' ');
        }
        line.push_str(&value.to_string());
    }
    line.push('\n');
    out.write_all(line.as_bytes())
}

/// Dump every block of one component, rows top to bottom.
///
/// A row request the store refuses is logged and its blocks counted as
/// unavailable; only write failures end the dump.
pub fn dump_component<S: BlockSource + ?Sized, W: Write>(
    source: &S,
    out: &mut W,
) -> io::Result<DumpReport> {
    let info = source.component();
    writeln!(
        out,
        "component {} {} {}x{} blocks",
        info.index,
        info.plane_name(),
        info.width_in_blocks,
        info.height_in_blocks
    )?;

    let mut report = DumpReport::default();
    for (start, count) in row_requests(info.height_in_blocks, source.row_stride()) {
        let rows = match source.rows(start, count) {
            Ok(rows) => rows,
            Err(e) => {
                log::warn!(
                    "skipping block rows {}..{} of component {}: {}",
                    start,
                    start + count,
                    info.index,
                    e
                );
                report.unavailable += count * info.width_in_blocks;
                continue;
            }
        };

        for (_, _, slot) in rows.iter() {
            match slot {
                BlockSlot::Present(block) => {
                    write_block(out, block)?;
                    report.emitted += 1;
                }
                BlockSlot::Absent => report.absent += 1,
            }
        }
    }

    log::debug!(
        "component {}: {} records, {} absent, {} unavailable",
        info.index,
        report.emitted,
        report.absent,
        report.unavailable
    );
    Ok(report)
}

/// Dump all components followed by the skipped-block summary.
pub fn dump_all<S: BlockSource, W: Write>(sources: &[S], out: &mut W) -> io::Result<DumpReport> {
    let mut report = DumpReport::default();
    for source in sources {
        report.add(dump_component(source, out)?);
    }
    writeln!(
        out,
        "skipped {} blocks ({} absent, {} in unavailable rows)",
        report.skipped(),
        report.absent,
        report.unavailable
    )?;
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{DctError, Result};
    use crate::session::ComponentInfo;
    use crate::store::BlockRows;

    /// Source that refuses the rows listed in `broken`.
    struct FlakySource {
        info: ComponentInfo,
        blocks: Vec<Option<CoefficientBlock>>,
        broken: Vec<usize>,
    }

    impl BlockSource for FlakySource {
        fn component(&self) -> &ComponentInfo {
            &self.info
        }

        fn row_stride(&self) -> usize {
            1
        }

        fn rows(&self, start_row: usize, count: usize) -> Result<BlockRows<'_>> {
            self.check_request(start_row, count)?;
            if self.broken.contains(&start_row) {
                return Err(DctError::StoreAccess {
                    component: self.info.index,
                    row: start_row,
                    reason: "buffer unavailable".to_string(),
                });
            }
            let w = self.info.width_in_blocks;
            Ok(BlockRows::new(start_row, w, &self.blocks[start_row * w..(start_row + count) * w]))
        }
    }

    fn source(w: usize, h: usize, blocks: Vec<Option<CoefficientBlock>>) -> FlakySource {
        FlakySource {
            info: ComponentInfo {
                index: 0,
                id: 1,
                width_in_blocks: w,
                height_in_blocks: h,
                h_sampling: 1,
                v_sampling: 1,
                quant_table_id: 0,
            },
            blocks,
            broken: Vec::new(),
        }
    }

    #[test]
    fn test_block_line_is_zigzag_ordered() {
        let mut natural = [0i16; 64];
        for (i, v) in natural.iter_mut().enumerate() {
            *v = i as i16;
        }
        let mut out = Vec::new();
        write_block(&mut out, &CoefficientBlock::new(natural)).unwrap();

        let line = String::from_utf8(out).unwrap();
        let values: Vec<i16> = line.split_whitespace().map(|v| v.parse().unwrap()).collect();
        assert_eq!(values.len(), 64);
        assert_eq!(&values[..6], &[0, 1, 8, 16, 9, 2]);
        assert!(line.ends_with("62 63\n"));
    }

    #[test]
    fn test_absent_blocks_are_counted_not_written() {
        let mut blocks = vec![Some(CoefficientBlock::from_dc(-5)); 6];
        blocks[1] = None;
        blocks[4] = None;
        let source = source(3, 2, blocks);

        let mut out = Vec::new();
        let report = dump_all(&[source], &mut out).unwrap();
        assert_eq!(report.emitted, 4);
        assert_eq!(report.absent, 2);
        assert_eq!(report.skipped(), 2);

        let text = String::from_utf8(out).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "component 0 y 3x2 blocks");
        assert_eq!(lines.len(), 1 + 4 + 1);
        assert!(lines[1].starts_with("-5 0 0"));
        assert_eq!(lines[5], "skipped 2 blocks (2 absent, 0 in unavailable rows)");
    }

    #[test]
    fn test_unavailable_row_is_skipped_and_dump_continues() {
        let mut source = source(2, 3, vec![Some(CoefficientBlock::from_dc(1)); 6]);
        source.broken = vec![1];

        let mut out = Vec::new();
        let report = dump_component(&source, &mut out).unwrap();
        assert_eq!(report.emitted, 4);
        assert_eq!(report.unavailable, 2);
        assert_eq!(report.absent, 0);
    }
}
