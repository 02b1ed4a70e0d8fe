//! Sequential (baseline and extended) scan decoding.
//!
//! Every block carries its DC difference followed by the full run-length coded
//! AC range, so a decoded block is always present.

use super::{advance_predictor, to_coefficient, BlockDecoder, BlockOutcome};
use crate::error::{DctError, Result};
use crate::jpeg::huffman::{BitReader, HuffmanLookup};
use crate::jpeg::parser::Scan;
use crate::zigzag::ZIGZAG_TO_NATURAL;

/// Decoder state for one sequential scan.
pub struct SequentialDecoder {
    dc_tables: Vec<HuffmanLookup>,
    ac_tables: Vec<HuffmanLookup>,
    predictors: Vec<i32>,
}

impl SequentialDecoder {
    pub fn for_scan(scan: &Scan) -> Result<Self> {
        let mut dc_tables = Vec::with_capacity(scan.components.len());
        let mut ac_tables = Vec::with_capacity(scan.components.len());
        for sc in &scan.components {
            dc_tables.push(HuffmanLookup::from_slot(&scan.dc_tables, sc.dc_table_id, "DC")?);
            ac_tables.push(HuffmanLookup::from_slot(&scan.ac_tables, sc.ac_table_id, "AC")?);
        }

        Ok(SequentialDecoder {
            dc_tables,
            ac_tables,
            predictors: vec![0; scan.components.len()],
        })
    }
}

impl BlockDecoder for SequentialDecoder {
    fn decode_block(
        &mut self,
        reader: &mut BitReader<'_>,
        slot: usize,
        block: &mut [i16; 64],
    ) -> Result<BlockOutcome> {
        let size = reader.decode_huffman(&self.dc_tables[slot])?;
        if size > 11 {
            return Err(DctError::format(format!("invalid DC magnitude category {}", size)));
        }
        let diff = reader.receive_extend(size)?;
        block[0] = to_coefficient(advance_predictor(&mut self.predictors[slot], diff)?);

        let ac = &self.ac_tables[slot];
        let mut k = 1;
        while k < 64 {
            let rs = reader.decode_huffman(ac)?;
            let run = (rs >> 4) as usize;
            let size = rs & 0x0F;

            if size == 0 {
                if run == 15 {
                    // ZRL: sixteen zeros
                    k += 16;
                    continue;
                }
                break; // EOB
            }

            k += run;
            if k > 63 {
                return Err(DctError::format("AC coefficient index out of range"));
            }
            block[ZIGZAG_TO_NATURAL[k]] = to_coefficient(reader.receive_extend(size)?);
            k += 1;
        }

        Ok(BlockOutcome::DcDecoded)
    }

    fn reset(&mut self) {
        self.predictors.fill(0);
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_support::*;
    use super::super::{walk_scan, CoefficientGrid};
    use super::*;
    use crate::jpeg::parser::HuffmanTable;

    /// DC: "0" -> category 0, "10" -> category 1, "110" -> category 2.
    /// AC: "0" -> EOB, "10" -> run 0 size 1, "110" -> run 2 size 1.
    fn tables() -> (HuffmanTable, HuffmanTable) {
        let dc = huffman_table(0, &[1, 1, 1], &[0, 1, 2]);
        let ac = huffman_table(1, &[1, 1, 1], &[0x00, 0x01, 0x21]);
        (dc, ac)
    }

    #[test]
    fn test_decode_dc_prediction_and_ac() {
        let (dc, ac) = tables();
        let frame = frame(0, 16, 8, &[(1, 1)]);
        // block 0: DC cat 2 "11" (+3), AC run0/size1 "1" (+1), run2/size1 "0" (-1), EOB
        // block 1: DC cat 1 "0" (-1), EOB
        let data = bits("110 11  10 1  110 0  0    10 0  0");
        let scan = scan(&[0], (0, 63, 0, 0), Some(dc), Some(ac), data);

        let mut grids = vec![CoefficientGrid::new(2, 1)];
        let mut decoder = SequentialDecoder::for_scan(&scan).expect("tables are present");
        walk_scan(&frame, &scan, &mut grids, &mut decoder).expect("scan decodes");

        let first = &grids[0].blocks[0];
        assert_eq!(first[0], 3);
        assert_eq!(first[ZIGZAG_TO_NATURAL[1]], 1);
        assert_eq!(first[ZIGZAG_TO_NATURAL[4]], -1);
        assert_eq!(first.iter().filter(|&&c| c != 0).count(), 3);

        // DC is predicted from the previous block
        assert_eq!(grids[0].blocks[1][0], 2);
        assert_eq!(grids[0].present, vec![true, true]);
    }

    #[test]
    fn test_restart_resets_prediction() {
        let (dc, ac) = tables();
        let frame = frame(0, 16, 8, &[(1, 1)]);
        // block 0: +3, EOB, padding, RST0, block 1: +3, EOB
        let mut data = bits("110 11 0");
        data.extend_from_slice(&[0xFF, 0xD0]);
        data.extend(bits("110 11 0"));
        let mut scan = scan(&[0], (0, 63, 0, 0), Some(dc), Some(ac), data);
        scan.restart_interval = 1;

        let mut grids = vec![CoefficientGrid::new(2, 1)];
        let mut decoder = SequentialDecoder::for_scan(&scan).expect("tables are present");
        walk_scan(&frame, &scan, &mut grids, &mut decoder).expect("scan decodes");

        assert_eq!(grids[0].blocks[0][0], 3);
        assert_eq!(grids[0].blocks[1][0], 3);
    }

    #[test]
    fn test_truncated_data_leaves_later_blocks_absent() {
        let (dc, ac) = tables();
        let frame = frame(0, 24, 8, &[(1, 1)]);
        let data = bits("10 1 0");
        let scan = scan(&[0], (0, 63, 0, 0), Some(dc), Some(ac), data);

        let mut grids = vec![CoefficientGrid::new(3, 1)];
        let mut decoder = SequentialDecoder::for_scan(&scan).expect("tables are present");
        let result = walk_scan(&frame, &scan, &mut grids, &mut decoder);

        assert!(result.is_err());
        assert!(grids[0].present[0]);
        assert!(!grids[0].present[2]);
    }

    #[test]
    fn test_missing_table_is_rejected() {
        let (dc, _) = tables();
        let scan = scan(&[0], (0, 63, 0, 0), Some(dc), None, Vec::new());
        assert!(SequentialDecoder::for_scan(&scan).is_err());
    }
}
