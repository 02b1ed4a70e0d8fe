//! Progressive scan decoding (ITU T.81 G.1.2).
//!
//! A progressive frame spreads every block over several scans: DC first and
//! refinement scans (possibly interleaved), then AC band scans for one
//! component at a time, each either a first pass or a successive
//! approximation refinement.

use super::{advance_predictor, to_coefficient, BlockDecoder, BlockOutcome};
use crate::error::{DctError, Result};
use crate::jpeg::huffman::{BitReader, HuffmanLookup};
use crate::jpeg::parser::Scan;
use crate::zigzag::ZIGZAG_TO_NATURAL;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ScanKind {
    DcFirst,
    DcRefine,
    AcFirst,
    AcRefine,
}

/// Decoder state for one progressive scan.
pub struct ProgressiveDecoder {
    kind: ScanKind,
    ss: usize,
    se: usize,
    al: u8,
    dc_tables: Vec<HuffmanLookup>,
    ac_tables: Vec<HuffmanLookup>,
    predictors: Vec<i32>,
    /// Blocks left in the current end-of-band run.
    eobrun: u32,
}

impl ProgressiveDecoder {
    pub fn for_scan(scan: &Scan) -> Result<Self> {
        let kind = match (scan.ss == 0, scan.ah == 0) {
            (true, true) => ScanKind::DcFirst,
            (true, false) => ScanKind::DcRefine,
            (false, true) => ScanKind::AcFirst,
            (false, false) => ScanKind::AcRefine,
        };

        let mut dc_tables = Vec::new();
        let mut ac_tables = Vec::new();
        for sc in &scan.components {
            match kind {
                ScanKind::DcFirst => {
                    dc_tables.push(HuffmanLookup::from_slot(&scan.dc_tables, sc.dc_table_id, "DC")?)
                }
                ScanKind::DcRefine => {}
                ScanKind::AcFirst | ScanKind::AcRefine => {
                    ac_tables.push(HuffmanLookup::from_slot(&scan.ac_tables, sc.ac_table_id, "AC")?)
                }
            }
        }

        Ok(ProgressiveDecoder {
            kind,
            ss: scan.ss as usize,
            se: scan.se as usize,
            al: scan.al,
            dc_tables,
            ac_tables,
            predictors: vec![0; scan.components.len()],
            eobrun: 0,
        })
    }

    fn decode_dc_first(
        &mut self,
        reader: &mut BitReader<'_>,
        slot: usize,
        block: &mut [i16; 64],
    ) -> Result<()> {
        let size = reader.decode_huffman(&self.dc_tables[slot])?;
        if size > 11 {
            return Err(DctError::format(format!("invalid DC magnitude category {}", size)));
        }
        let diff = reader.receive_extend(size)?;
        let predictor = advance_predictor(&mut self.predictors[slot], diff)?;
        let scaled = predictor
            .checked_mul(1 << self.al)
            .ok_or_else(|| DctError::format("DC predictor out of range"))?;
        block[0] = to_coefficient(scaled);
        Ok(())
    }

    fn decode_dc_refine(&mut self, reader: &mut BitReader<'_>, block: &mut [i16; 64]) -> Result<()> {
        if reader.read_bit()? {
            block[0] |= 1 << self.al;
        }
        Ok(())
    }

    fn decode_ac_first(
        &mut self,
        reader: &mut BitReader<'_>,
        slot: usize,
        block: &mut [i16; 64],
    ) -> Result<()> {
        if self.eobrun > 0 {
            self.eobrun -= 1;
            return Ok(());
        }

        let table = &self.ac_tables[slot];
        let mut k = self.ss;
        while k <= self.se {
            let rs = reader.decode_huffman(table)?;
            let run = rs >> 4;
            let size = rs & 0x0F;

            if size == 0 {
                if run < 15 {
                    // EOBn: this block and the next (2^n - 1 + extra) are done
                    self.eobrun = (1u32 << run) - 1;
                    if run > 0 {
                        self.eobrun += reader.read_bits(run)? as u32;
                    }
                    break;
                }
                k += 16;
                continue;
            }

            k += run as usize;
            if k > self.se {
                return Err(DctError::format("AC coefficient index out of band"));
            }
            let value = reader.receive_extend(size)?;
            block[ZIGZAG_TO_NATURAL[k]] = to_coefficient(value * (1 << self.al));
            k += 1;
        }

        Ok(())
    }

    fn decode_ac_refine(
        &mut self,
        reader: &mut BitReader<'_>,
        slot: usize,
        block: &mut [i16; 64],
    ) -> Result<()> {
        let p1: i16 = 1 << self.al;
        let m1: i16 = -1 << self.al;
        let mut k = self.ss;

        if self.eobrun == 0 {
            let table = &self.ac_tables[slot];
            while k <= self.se {
                let rs = reader.decode_huffman(table)?;
                let mut run = (rs >> 4) as i32;
                let size = rs & 0x0F;

                let mut value = 0i16;
                if size != 0 {
                    if size != 1 {
                        return Err(DctError::format(format!(
                            "invalid refinement coefficient size {}",
                            size
                        )));
                    }
                    value = if reader.read_bit()? { p1 } else { m1 };
                } else if run != 15 {
                    self.eobrun = 1u32 << run;
                    if run > 0 {
                        self.eobrun += reader.read_bits(run as u8)? as u32;
                    }
                    break;
                }

                // Skip `run` zero coefficients, refining the non-zero ones passed on the way
                while k <= self.se {
                    let coef = &mut block[ZIGZAG_TO_NATURAL[k]];
                    if *coef != 0 {
                        refine(reader, coef, p1, m1)?;
                    } else {
                        run -= 1;
                        if run < 0 {
                            break;
                        }
                    }
                    k += 1;
                }

                if value != 0 {
                    if k > self.se {
                        return Err(DctError::format("refinement coefficient out of band"));
                    }
                    block[ZIGZAG_TO_NATURAL[k]] = value;
                }
                k += 1;
            }
        }

        if self.eobrun > 0 {
            while k <= self.se {
                let coef = &mut block[ZIGZAG_TO_NATURAL[k]];
                if *coef != 0 {
                    refine(reader, coef, p1, m1)?;
                }
                k += 1;
            }
            self.eobrun -= 1;
        }

        Ok(())
    }
}

/// Apply one correction bit to a coefficient that is already non-zero.
#[inline]
fn refine(reader: &mut BitReader<'_>, coef: &mut i16, p1: i16, m1: i16) -> Result<()> {
    if reader.read_bit()? && (*coef & p1) == 0 {
        *coef = coef.saturating_add(if *coef >= 0 { p1 } else { m1 });
    }
    Ok(())
}

impl BlockDecoder for ProgressiveDecoder {
    fn decode_block(
        &mut self,
        reader: &mut BitReader<'_>,
        slot: usize,
        block: &mut [i16; 64],
    ) -> Result<BlockOutcome> {
        match self.kind {
            ScanKind::DcFirst => {
                self.decode_dc_first(reader, slot, block)?;
                return Ok(BlockOutcome::DcDecoded);
            }
            ScanKind::DcRefine => self.decode_dc_refine(reader, block)?,
            ScanKind::AcFirst => self.decode_ac_first(reader, slot, block)?,
            ScanKind::AcRefine => self.decode_ac_refine(reader, slot, block)?,
        }
        Ok(BlockOutcome::Refined)
    }

    fn reset(&mut self) {
        self.predictors.fill(0);
        self.eobrun = 0;
    }
}
