//! Huffman decoding of entropy-coded scan data.

use super::parser::HuffmanTable;
use crate::error::{DctError, Result};

/// Prefix width resolved by a single table lookup.
const FAST_BITS: u8 = 8;

/// Decoding form of a DHT table.
///
/// Codes of up to [`FAST_BITS`] bits resolve with one lookup. Longer codes go
/// through the per-length `maxcode` comparison of T.81 F.2.2.3.
#[derive(Debug, Clone)]
pub struct HuffmanLookup {
    /// `(length << 8) | symbol` for every 8-bit prefix, 0 when the code is longer.
    fast: [u16; 1 << FAST_BITS],
    /// Largest code of each length, -1 when the length is unused.
    maxcode: [i32; 17],
    /// Offset from a code to its index in `values`, per length.
    valoffset: [i32; 17],
    values: Vec<u8>,
}

impl HuffmanLookup {
    pub fn from_table(table: &HuffmanTable) -> Result<Self> {
        let codes = canonical_codes(&table.code_lengths)?;
        if table.values.len() < codes.len() {
            return Err(DctError::format(format!(
                "Huffman table {} defines {} codes but only {} symbols",
                table.id,
                codes.len(),
                table.values.len()
            )));
        }

        let mut lookup = HuffmanLookup {
            fast: [0; 1 << FAST_BITS],
            maxcode: [-1; 17],
            valoffset: [0; 17],
            values: table.values[..codes.len()].to_vec(),
        };

        for (index, &(length, code)) in codes.iter().enumerate() {
            let l = length as usize;
            if lookup.maxcode[l] < 0 {
                lookup.valoffset[l] = index as i32 - code as i32;
            }
            lookup.maxcode[l] = code as i32;

            if length <= FAST_BITS {
                let spare = FAST_BITS - length;
                let first = (code as usize) << spare;
                let entry = ((length as u16) << 8) | lookup.values[index] as u16;
                lookup.fast[first..first + (1 << spare)].fill(entry);
            }
        }

        Ok(lookup)
    }

    /// Build the lookup of table slot `id`, failing if the slot is empty.
    pub fn from_slot(tables: &[Option<HuffmanTable>; 4], id: u8, class: &str) -> Result<Self> {
        let table = tables
            .get(id as usize)
            .and_then(|t| t.as_ref())
            .ok_or_else(|| DctError::format(format!("missing {} Huffman table {}", class, id)))?;
        HuffmanLookup::from_table(table)
    }
}

/// Canonical code assignment (T.81 Figures C.1 and C.2) as `(length, code)`
/// pairs in symbol order.
fn canonical_codes(counts: &[u8; 16]) -> Result<Vec<(u8, u16)>> {
    let total: usize = counts.iter().map(|&n| n as usize).sum();
    if total > 256 {
        return Err(DctError::format(format!("Huffman table with {} symbols", total)));
    }

    let mut codes = Vec::with_capacity(total);
    let mut next: u32 = 0;
    for (i, &count) in counts.iter().enumerate() {
        let length = i as u8 + 1;
        for _ in 0..count {
            if next >= 1 << length {
                return Err(DctError::format(format!(
                    "too many Huffman codes of length {}",
                    length
                )));
            }
            codes.push((length, next as u16));
            next += 1;
        }
        next <<= 1;
    }

    Ok(codes)
}

/// MSB-first reader over the entropy-coded bytes of one scan.
///
/// A stuffed `FF 00` reads as `FF`. Any other `FF xx` ends the bits
/// available until [`BitReader::restart`] moves past it, so decoding never
/// reads across a restart marker.
pub struct BitReader<'a> {
    data: &'a [u8],
    pos: usize,
    acc: u32,
    /// Valid low bits in `acc`.
    acc_len: u8,
}

impl<'a> BitReader<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        BitReader {
            data,
            pos: 0,
            acc: 0,
            acc_len: 0,
        }
    }

    fn fill(&mut self) {
        while self.acc_len <= 24 {
            let Some(&byte) = self.data.get(self.pos) else {
                return;
            };
            if byte == 0xFF {
                if self.data.get(self.pos + 1) != Some(&0x00) {
                    return;
                }
                self.pos += 2;
            } else {
                self.pos += 1;
            }
            self.acc = (self.acc << 8) | u32::from(byte);
            self.acc_len += 8;
        }
    }

    /// The next `count` (at most 16) bits, without consuming them.
    pub fn peek_bits(&mut self, count: u8) -> Result<u16> {
        if count == 0 {
            return Ok(0);
        }
        if self.acc_len < count {
            self.fill();
            if self.acc_len < count {
                return Err(DctError::format(format!(
                    "entropy-coded data ends {} bits short",
                    count - self.acc_len
                )));
            }
        }
        let bits = self.acc >> (self.acc_len - count);
        Ok((bits & ((1u32 << count) - 1)) as u16)
    }

    #[inline]
    pub fn consume_bits(&mut self, count: u8) {
        debug_assert!(count <= self.acc_len);
        self.acc_len -= count;
    }

    pub fn read_bits(&mut self, count: u8) -> Result<u16> {
        let bits = self.peek_bits(count)?;
        self.consume_bits(count);
        Ok(bits)
    }

    pub fn read_bit(&mut self) -> Result<bool> {
        Ok(self.read_bits(1)? == 1)
    }

    /// Decode one Huffman symbol.
    ///
    /// In front of a marker fewer than 8 bits may be left; the window is then
    /// padded with 1-bits, and a code that needs the padding is an error.
    pub fn decode_huffman(&mut self, table: &HuffmanLookup) -> Result<u8> {
        self.fill();
        if self.acc_len == 0 {
            return Err(DctError::format("no entropy-coded data left"));
        }

        let available = self.acc_len.min(FAST_BITS);
        let pad = FAST_BITS - available;
        let window = (self.peek_bits(available)? << pad) | ((1 << pad) - 1);
        let entry = table.fast[window as usize];
        let length = (entry >> 8) as u8;
        if length > 0 {
            if length > available {
                return Err(DctError::format("Huffman code cut off by end of data"));
            }
            self.consume_bits(length);
            return Ok(entry as u8);
        }

        for length in FAST_BITS + 1..=16 {
            if length > self.acc_len {
                break;
            }
            let code = self.peek_bits(length)? as i32;
            if code <= table.maxcode[length as usize] {
                let index = (code + table.valoffset[length as usize]) as usize;
                self.consume_bits(length);
                return table
                    .values
                    .get(index)
                    .copied()
                    .ok_or_else(|| DctError::format("Huffman code without symbol"));
            }
        }

        Err(DctError::format(format!(
            "invalid Huffman code ({} bits available)",
            self.acc_len
        )))
    }

    /// Read a `size`-bit magnitude and extend its sign (T.81 Figure F.12).
    pub fn receive_extend(&mut self, size: u8) -> Result<i32> {
        match size {
            0 => Ok(0),
            1..=16 => {
                let value = i32::from(self.read_bits(size)?);
                // leading 0 bit: negative
                if value < 1 << (size - 1) {
                    Ok(value - (1 << size) + 1)
                } else {
                    Ok(value)
                }
            }
            _ => Err(DctError::format(format!("invalid coefficient size {}", size))),
        }
    }

    /// Handle a restart boundary: drop buffered bits and consume the next RSTn.
    ///
    /// Returns the restart marker number.
    pub fn restart(&mut self) -> Result<u8> {
        self.acc = 0;
        self.acc_len = 0;

        let start = self.pos;
        while self.pos + 1 < self.data.len() {
            if self.data[self.pos] == 0xFF && (0xD0..=0xD7).contains(&self.data[self.pos + 1]) {
                let n = self.data[self.pos + 1] - 0xD0;
                if self.pos > start {
                    log::debug!("skipped {} bytes in front of RST{}", self.pos - start, n);
                }
                self.pos += 2;
                return Ok(n);
            }
            self.pos += 1;
        }

        Err(DctError::format("expected restart marker"))
    }
}
