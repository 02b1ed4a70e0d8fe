//! JPEG header and scan segmentation.
//!
//! Collects what is needed to reach the quantized coefficients:
//! - Quantization tables (DQT), converted to natural order
//! - Huffman tables (DHT)
//! - Frame info (SOF0, SOF1, SOF2)
//! - Every scan (SOS) with its entropy-coded data and the tables in effect
//!   when it started
//!
//! A stream that ends inside the entropy-coded data keeps the scans read so
//! far; a stream that ends before the first scan is an error.

use byteorder::{BigEndian, ReadBytesExt};
use std::io::{Cursor, Read};

use super::marker::Marker;
use crate::error::{DctError, Result};
use crate::zigzag::to_natural;

/// A JPEG quantization table (8x8 = 64 values).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuantizationTable {
    /// Table ID (0-3).
    pub id: u8,
    /// Precision: 0 = 8-bit, 1 = 16-bit.
    pub precision: u8,
    /// Table values in natural (row-major) order, index 0 scales the DC term.
    pub values: [u16; 64],
}

impl QuantizationTable {
    /// DC scale factor.
    #[inline]
    pub fn dc(&self) -> u16 {
        self.values[0]
    }

    /// Value at natural (row, col) position.
    #[inline]
    pub fn get_natural(&self, row: usize, col: usize) -> u16 {
        self.values[row * 8 + col]
    }

    /// Format table as ASCII art for display, in natural order.
    pub fn to_ascii_table(&self) -> String {
        let mut out = String::new();

        out.push_str("|    |");
        for x in 0..8 {
            out.push_str(&format!("   x{} |", x));
        }
        out.push('\n');

        out.push_str("|----|");
        for _ in 0..8 {
            out.push_str("------|");
        }
        out.push('\n');

        for y in 0..8 {
            out.push_str(&format!("| y{} ", y));
            for x in 0..8 {
                out.push_str(&format!("| {:4} ", self.get_natural(y, x)));
            }
            out.push_str("|\n");
        }

        out
    }
}

/// Huffman table as defined by a DHT segment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HuffmanTable {
    /// Table class: 0 = DC, 1 = AC.
    pub class: u8,
    /// Table ID (0-3).
    pub id: u8,
    /// Number of codes of each length (1-16 bits).
    pub code_lengths: [u8; 16],
    /// Symbol values in code order.
    pub values: Vec<u8>,
}

/// Component as declared by the frame header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrameComponent {
    /// Component ID as used by SOS.
    pub id: u8,
    /// Horizontal sampling factor (1-4).
    pub h_sampling: u8,
    /// Vertical sampling factor (1-4).
    pub v_sampling: u8,
    /// Quantization table ID (0-3).
    pub quant_table_id: u8,
}

/// Frame information from the SOF marker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrameInfo {
    /// SOF type (0 = baseline, 1 = extended sequential, 2 = progressive).
    pub sof_type: u8,
    /// Sample precision, always 8 for supported frames.
    pub precision: u8,
    /// Image height in pixels.
    pub height: u16,
    /// Image width in pixels.
    pub width: u16,
    pub components: Vec<FrameComponent>,
}

impl FrameInfo {
    pub fn is_progressive(&self) -> bool {
        self.sof_type == 2
    }

    pub fn max_h_sampling(&self) -> usize {
        self.components
            .iter()
            .map(|c| c.h_sampling as usize)
            .max()
            .unwrap_or(1)
    }

    pub fn max_v_sampling(&self) -> usize {
        self.components
            .iter()
            .map(|c| c.v_sampling as usize)
            .max()
            .unwrap_or(1)
    }

    /// Number of MCUs per row of an interleaved scan.
    pub fn mcu_cols(&self) -> usize {
        div_ceil(self.width as usize, self.max_h_sampling() * 8)
    }

    /// Number of MCU rows of an interleaved scan.
    pub fn mcu_rows(&self) -> usize {
        div_ceil(self.height as usize, self.max_v_sampling() * 8)
    }

    /// Blocks per row of a component, without MCU padding.
    pub fn width_in_blocks(&self, index: usize) -> usize {
        let c = &self.components[index];
        let samples = div_ceil(
            self.width as usize * c.h_sampling as usize,
            self.max_h_sampling(),
        );
        div_ceil(samples, 8)
    }

    /// Block rows of a component, without MCU padding.
    pub fn height_in_blocks(&self, index: usize) -> usize {
        let c = &self.components[index];
        let samples = div_ceil(
            self.height as usize * c.v_sampling as usize,
            self.max_v_sampling(),
        );
        div_ceil(samples, 8)
    }

    /// Blocks per row of a component, padded to whole MCUs.
    pub fn padded_width_in_blocks(&self, index: usize) -> usize {
        self.mcu_cols() * self.components[index].h_sampling as usize
    }

    /// Block rows of a component, padded to whole MCUs.
    pub fn padded_height_in_blocks(&self, index: usize) -> usize {
        self.mcu_rows() * self.components[index].v_sampling as usize
    }
}

/// One component selector of a scan header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanComponent {
    /// Index into `FrameInfo::components`.
    pub component_index: usize,
    pub dc_table_id: u8,
    pub ac_table_id: u8,
}

/// One scan: header parameters, the tables in effect and its entropy-coded data.
#[derive(Debug, Clone)]
pub struct Scan {
    pub components: Vec<ScanComponent>,
    /// Spectral selection start (zigzag index).
    pub ss: u8,
    /// Spectral selection end (zigzag index).
    pub se: u8,
    /// Successive approximation high bit.
    pub ah: u8,
    /// Successive approximation low bit.
    pub al: u8,
    /// Restart interval in MCUs (0 if not set).
    pub restart_interval: u16,
    pub dc_tables: [Option<HuffmanTable>; 4],
    pub ac_tables: [Option<HuffmanTable>; 4],
    /// Entropy-coded data with byte stuffing and RST markers preserved.
    pub data: Vec<u8>,
    /// The data ended without a terminating marker.
    pub truncated: bool,
}

/// Parsed JPEG structure.
#[derive(Debug, Clone, Default)]
pub struct JpegSegments {
    /// Quantization tables indexed by ID.
    pub quant_tables: [Option<QuantizationTable>; 4],
    pub frame: Option<FrameInfo>,
    pub scans: Vec<Scan>,
    /// The stream ended before EOI.
    pub truncated: bool,
}

#[derive(Default)]
struct ParseState {
    segments: JpegSegments,
    dc_huff_tables: [Option<HuffmanTable>; 4],
    ac_huff_tables: [Option<HuffmanTable>; 4],
    restart_interval: u16,
}

enum Step {
    Continue,
    /// A scan ended on this marker, which still has to be handled.
    Pending(Marker),
    Done,
}

/// Parse a complete (or truncated) JPEG file.
pub fn parse_jpeg(data: &[u8]) -> Result<JpegSegments> {
    let mut reader = Cursor::new(data);

    let mut soi = [0u8; 2];
    reader
        .read_exact(&mut soi)
        .map_err(|_| DctError::truncated("missing SOI marker"))?;
    if soi != [0xFF, 0xD8] {
        return Err(DctError::format("not a JPEG file (missing SOI marker)"));
    }

    let mut state = ParseState::default();
    let mut pending = None;

    loop {
        let marker = match pending.take() {
            Some(marker) => Ok(marker),
            None => read_marker(&mut reader),
        };
        let step = match marker {
            Ok(marker) => parse_segment(&mut reader, marker, &mut state),
            Err(e) => Err(e),
        };

        match step {
            Ok(Step::Continue) => {}
            Ok(Step::Pending(marker)) => pending = Some(marker),
            Ok(Step::Done) => break,
            Err(DctError::Truncated { reason }) if !state.segments.scans.is_empty() => {
                log::warn!("JPEG stream ends early ({}), keeping the scans read so far", reason);
                state.segments.truncated = true;
                break;
            }
            Err(e) => return Err(e),
        }
    }

    Ok(state.segments)
}

/// Parse a JPEG stream from any reader.
pub fn parse_jpeg_reader<R: Read>(mut reader: R) -> Result<JpegSegments> {
    let mut data = Vec::new();
    reader
        .read_to_end(&mut data)
        .map_err(|e| DctError::truncated(format!("reading JPEG stream: {}", e)))?;
    parse_jpeg(&data)
}

/// Parse quantization tables only, in ID order.
pub fn parse_quantization_tables(data: &[u8]) -> Result<Vec<QuantizationTable>> {
    let segments = parse_jpeg(data)?;
    Ok(segments.quant_tables.into_iter().flatten().collect())
}

fn parse_segment(reader: &mut Cursor<&[u8]>, marker: Marker, state: &mut ParseState) -> Result<Step> {
    match marker {
        Marker::EOI => return Ok(Step::Done),

        Marker::SOS => {
            let header = read_segment(reader)?;
            let scan_template = parse_sos(&header, state)?;
            let (data, end) = read_scan_data(reader);

            let truncated = end.is_none();
            state.segments.scans.push(Scan {
                data,
                truncated,
                ..scan_template
            });

            return match end {
                Some(marker) => Ok(Step::Pending(marker)),
                None => Err(DctError::truncated("scan data without terminating marker")),
            };
        }

        Marker::DQT => {
            let data = read_segment(reader)?;
            parse_dqt(&data, &mut state.segments)?;
        }

        Marker::DHT => {
            let data = read_segment(reader)?;
            parse_dht(&data, state)?;
        }

        Marker::SOF(n) => {
            let data = read_segment(reader)?;
            if state.segments.frame.is_some() {
                return Err(DctError::format("more than one SOF marker"));
            }
            state.segments.frame = Some(parse_sof(n, &data)?);
        }

        Marker::DRI => {
            let data = read_segment(reader)?;
            if data.len() < 2 {
                return Err(DctError::format("DRI segment too short"));
            }
            state.restart_interval = u16::from_be_bytes([data[0], data[1]]);
        }

        Marker::DAC => return Err(DctError::UnsupportedFrame(9)),

        Marker::DNL => {
            return Err(DctError::format("DNL marker (height defined after scan) is not supported"))
        }

        _ if marker.has_length() => {
            // APPn, COM and friends carry nothing we need
            let _ = read_segment(reader)?;
        }

        _ => {
            log::debug!("ignoring stray marker {:?} outside of scan data", marker);
        }
    }

    Ok(Step::Continue)
}

/// Read the next marker, skipping garbage and fill bytes.
fn read_marker(reader: &mut Cursor<&[u8]>) -> Result<Marker> {
    loop {
        let byte = reader.read_u8().map_err(|_| DctError::truncated("expected a marker"))?;
        if byte != 0xFF {
            continue;
        }

        let mut code = 0xFF;
        while code == 0xFF {
            code = reader.read_u8().map_err(|_| DctError::truncated("expected a marker"))?;
        }

        if let Some(marker) = Marker::from_u8(code) {
            return Ok(marker);
        }
        // 0xFF00 outside of scan data: keep searching
    }
}

/// Read a length-prefixed segment body.
fn read_segment(reader: &mut Cursor<&[u8]>) -> Result<Vec<u8>> {
    let length = reader
        .read_u16::<BigEndian>()
        .map_err(|_| DctError::truncated("segment length"))? as usize;
    if length < 2 {
        return Err(DctError::format("segment length too small"));
    }

    let mut data = vec![0u8; length - 2];
    reader
        .read_exact(&mut data)
        .map_err(|_| DctError::truncated("segment body"))?;
    Ok(data)
}

/// Read entropy-coded data up to the next non-RST marker.
///
/// Byte stuffing and RST markers are kept, the bit reader handles both.
/// Returns the terminating marker, or `None` if the stream ended first.
fn read_scan_data(reader: &mut Cursor<&[u8]>) -> (Vec<u8>, Option<Marker>) {
    let mut data = Vec::new();

    loop {
        let Ok(byte) = reader.read_u8() else {
            return (data, None);
        };
        if byte != 0xFF {
            data.push(byte);
            continue;
        }

        let mut code = 0xFF;
        while code == 0xFF {
            match reader.read_u8() {
                Ok(b) => code = b,
                Err(_) => return (data, None),
            }
        }

        match code {
            0x00 | 0xD0..=0xD7 => {
                data.push(0xFF);
                data.push(code);
            }
            _ => return (data, Marker::from_u8(code)),
        }
    }
}

/// Parse DQT (Define Quantization Table) segment.
fn parse_dqt(data: &[u8], segments: &mut JpegSegments) -> Result<()> {
    let mut pos = 0;

    while pos < data.len() {
        let pq_tq = data[pos];
        let precision = (pq_tq >> 4) & 0x0F;
        let id = pq_tq & 0x0F;
        pos += 1;

        if id > 3 || precision > 1 {
            return Err(DctError::format(format!(
                "invalid quantization table: precision={}, id={}",
                precision, id
            )));
        }

        let entry_size = if precision == 0 { 1 } else { 2 };
        if pos + 64 * entry_size > data.len() {
            return Err(DctError::format("DQT segment too short"));
        }

        let mut zigzag = [0u16; 64];
        for value in zigzag.iter_mut() {
            *value = if precision == 0 {
                data[pos] as u16
            } else {
                u16::from_be_bytes([data[pos], data[pos + 1]])
            };
            pos += entry_size;
        }

        if zigzag.iter().any(|&v| v == 0) {
            log::warn!("quantization table {} contains zero entries", id);
        }

        segments.quant_tables[id as usize] = Some(QuantizationTable {
            id,
            precision,
            values: to_natural(&zigzag),
        });
    }

    Ok(())
}

/// Parse DHT (Define Huffman Table) segment.
fn parse_dht(data: &[u8], state: &mut ParseState) -> Result<()> {
    let mut pos = 0;

    while pos < data.len() {
        let tc_th = data[pos];
        let class = (tc_th >> 4) & 0x0F;
        let id = tc_th & 0x0F;
        pos += 1;

        if class > 1 || id > 3 {
            return Err(DctError::format(format!(
                "invalid Huffman table: class={}, id={}",
                class, id
            )));
        }

        if pos + 16 > data.len() {
            return Err(DctError::format("DHT segment too short for code lengths"));
        }
        let mut code_lengths = [0u8; 16];
        code_lengths.copy_from_slice(&data[pos..pos + 16]);
        pos += 16;

        let total_codes: usize = code_lengths.iter().map(|&n| n as usize).sum();
        if pos + total_codes > data.len() {
            return Err(DctError::format("DHT segment too short for symbol values"));
        }
        let values = data[pos..pos + total_codes].to_vec();
        pos += total_codes;

        let table = HuffmanTable {
            class,
            id,
            code_lengths,
            values,
        };

        if class == 0 {
            state.dc_huff_tables[id as usize] = Some(table);
        } else {
            state.ac_huff_tables[id as usize] = Some(table);
        }
    }

    Ok(())
}

/// Parse SOF (Start of Frame) segment.
fn parse_sof(sof_type: u8, data: &[u8]) -> Result<FrameInfo> {
    if !matches!(sof_type, 0..=2) {
        return Err(DctError::UnsupportedFrame(sof_type));
    }

    if data.len() < 6 {
        return Err(DctError::format("SOF segment too short"));
    }

    let precision = data[0];
    let height = u16::from_be_bytes([data[1], data[2]]);
    let width = u16::from_be_bytes([data[3], data[4]]);
    let num_components = data[5] as usize;

    if precision != 8 {
        return Err(DctError::format(format!(
            "unsupported sample precision: {} bits",
            precision
        )));
    }
    if width == 0 || height == 0 {
        return Err(DctError::format(format!(
            "invalid image dimensions {}x{}",
            width, height
        )));
    }
    if !(1..=4).contains(&num_components) {
        return Err(DctError::format(format!(
            "unsupported number of components: {}",
            num_components
        )));
    }
    if data.len() < 6 + num_components * 3 {
        return Err(DctError::format("SOF segment too short for components"));
    }

    let mut components = Vec::with_capacity(num_components);
    for i in 0..num_components {
        let offset = 6 + i * 3;
        let id = data[offset];
        let sampling = data[offset + 1];
        let h_sampling = (sampling >> 4) & 0x0F;
        let v_sampling = sampling & 0x0F;
        let quant_table_id = data[offset + 2];

        if !(1..=4).contains(&h_sampling) || !(1..=4).contains(&v_sampling) {
            return Err(DctError::format(format!(
                "invalid sampling factors {}x{} for component {}",
                h_sampling, v_sampling, id
            )));
        }
        if quant_table_id > 3 {
            return Err(DctError::format(format!(
                "invalid quantization table ID {} for component {}",
                quant_table_id, id
            )));
        }
        if components.iter().any(|c: &FrameComponent| c.id == id) {
            return Err(DctError::format(format!("duplicate component ID {}", id)));
        }

        components.push(FrameComponent {
            id,
            h_sampling,
            v_sampling,
            quant_table_id,
        });
    }

    Ok(FrameInfo {
        sof_type,
        precision,
        height,
        width,
        components,
    })
}

/// Parse SOS (Start of Scan) header. The returned scan carries no data yet.
fn parse_sos(data: &[u8], state: &ParseState) -> Result<Scan> {
    let frame = state
        .segments
        .frame
        .as_ref()
        .ok_or_else(|| DctError::format("SOS before SOF"))?;

    let num_components = *data
        .first()
        .ok_or_else(|| DctError::format("SOS header empty"))? as usize;
    if !(1..=4).contains(&num_components) {
        return Err(DctError::format(format!(
            "invalid number of scan components: {}",
            num_components
        )));
    }
    if data.len() < 1 + num_components * 2 + 3 {
        return Err(DctError::format("SOS header too short"));
    }

    let mut components = Vec::with_capacity(num_components);
    for i in 0..num_components {
        let offset = 1 + i * 2;
        let component_id = data[offset];
        let table_ids = data[offset + 1];

        let component_index = frame
            .components
            .iter()
            .position(|c| c.id == component_id)
            .ok_or_else(|| {
                DctError::format(format!("scan references unknown component {}", component_id))
            })?;

        components.push(ScanComponent {
            component_index,
            dc_table_id: (table_ids >> 4) & 0x0F,
            ac_table_id: table_ids & 0x0F,
        });
    }

    let offset = 1 + num_components * 2;
    let ss = data[offset];
    let se = data[offset + 1];
    let ah = (data[offset + 2] >> 4) & 0x0F;
    let al = data[offset + 2] & 0x0F;

    if ss > 63 || se > 63 || ss > se {
        return Err(DctError::format(format!(
            "invalid spectral selection {}..={}",
            ss, se
        )));
    }
    if frame.is_progressive() && ss > 0 && num_components != 1 {
        return Err(DctError::format("progressive AC scan with more than one component"));
    }
    if frame.is_progressive() && ss == 0 && se != 0 {
        return Err(DctError::format("progressive DC scan with AC coefficients"));
    }
    if ah > 13 || al > 13 {
        return Err(DctError::format(format!(
            "invalid successive approximation Ah={}, Al={}",
            ah, al
        )));
    }

    for sc in &components {
        let needs_dc = ss == 0 && ah == 0;
        let needs_ac = se > 0;
        if sc.dc_table_id > 3 || sc.ac_table_id > 3 {
            return Err(DctError::format("invalid Huffman table ID in scan header"));
        }
        if needs_dc && state.dc_huff_tables[sc.dc_table_id as usize].is_none() {
            return Err(DctError::format(format!(
                "missing DC Huffman table {}",
                sc.dc_table_id
            )));
        }
        if needs_ac && state.ac_huff_tables[sc.ac_table_id as usize].is_none() {
            return Err(DctError::format(format!(
                "missing AC Huffman table {}",
                sc.ac_table_id
            )));
        }
    }

    Ok(Scan {
        components,
        ss,
        se,
        ah,
        al,
        restart_interval: state.restart_interval,
        dc_tables: state.dc_huff_tables.clone(),
        ac_tables: state.ac_huff_tables.clone(),
        data: Vec::new(),
        truncated: false,
    })
}

fn div_ceil(a: usize, b: usize) -> usize {
    (a + b - 1) / b
}

/// Quantization table stored in zigzag order, as found inside a DQT segment.
#[cfg(test)]
pub(crate) fn dqt_payload(table: &QuantizationTable) -> Vec<u8> {
    let mut out = vec![table.id];
    let mut zigzag = [0u8; 64];
    for (n, &z) in crate::zigzag::NATURAL_TO_ZIGZAG.iter().enumerate() {
        zigzag[z] = table.values[n] as u8;
    }
    out.extend_from_slice(&zigzag);
    out
}
