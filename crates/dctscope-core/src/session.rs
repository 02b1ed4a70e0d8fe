//! Decode session: header metadata plus the decoded coefficient storage.
//!
//! A session is created from a JPEG (file or bytes) or from components the
//! caller decoded elsewhere. Coefficient access goes through
//! [`DecodeSession::store`], whose views borrow the session and therefore
//! cannot outlive it.

use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use crate::error::{DctError, Result};
use crate::jpeg::{decode_coefficients, parse_jpeg, parse_jpeg_reader, FrameInfo, JpegSegments};
use crate::store::{CoefficientBlock, CoefficientStore};

pub use crate::jpeg::QuantizationTable as QuantTable;

/// Geometry and table assignment of one color component.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComponentInfo {
    /// Position in the frame, 0 is luma by convention.
    pub index: usize,
    /// Component ID from the frame header.
    pub id: u8,
    pub width_in_blocks: usize,
    pub height_in_blocks: usize,
    pub h_sampling: u8,
    pub v_sampling: u8,
    pub quant_table_id: u8,
}

impl ComponentInfo {
    pub fn total_blocks(&self) -> usize {
        self.width_in_blocks * self.height_in_blocks
    }

    /// Short plane name used in file names and dumps.
    pub fn plane_name(&self) -> String {
        match self.index {
            0 => "y".to_string(),
            1 => "cb".to_string(),
            2 => "cr".to_string(),
            n => format!("c{}", n),
        }
    }

    fn from_frame(frame: &FrameInfo, index: usize) -> Self {
        let fc = &frame.components[index];
        ComponentInfo {
            index,
            id: fc.id,
            width_in_blocks: frame.width_in_blocks(index),
            height_in_blocks: frame.height_in_blocks(index),
            h_sampling: fc.h_sampling,
            v_sampling: fc.v_sampling,
            quant_table_id: fc.quant_table_id,
        }
    }
}

/// Coefficients of one component: a row-major `width_in_blocks ×
/// height_in_blocks` grid where `None` marks an absent block.
#[derive(Debug, Clone)]
pub struct ComponentCoefficients {
    info: ComponentInfo,
    quant_table: Option<QuantTable>,
    blocks: Vec<Option<CoefficientBlock>>,
}

impl ComponentCoefficients {
    pub fn new(
        info: ComponentInfo,
        quant_table: Option<QuantTable>,
        blocks: Vec<Option<CoefficientBlock>>,
    ) -> Result<Self> {
        if info.width_in_blocks == 0 || info.height_in_blocks == 0 {
            return Err(DctError::InvalidArgument(format!(
                "component {} has an empty block grid",
                info.index
            )));
        }
        if !(1..=4).contains(&info.h_sampling) || !(1..=4).contains(&info.v_sampling) {
            return Err(DctError::InvalidArgument(format!(
                "component {} has sampling factors {}x{}",
                info.index, info.h_sampling, info.v_sampling
            )));
        }
        if blocks.len() != info.total_blocks() {
            return Err(DctError::InvalidArgument(format!(
                "component {} expects {} blocks, got {}",
                info.index,
                info.total_blocks(),
                blocks.len()
            )));
        }

        Ok(ComponentCoefficients {
            info,
            quant_table,
            blocks,
        })
    }

    pub fn info(&self) -> &ComponentInfo {
        &self.info
    }

    pub(crate) fn blocks(&self) -> &[Option<CoefficientBlock>] {
        &self.blocks
    }

    /// Number of present blocks.
    pub fn present_blocks(&self) -> usize {
        self.blocks.iter().filter(|b| b.is_some()).count()
    }
}

/// An opened image: dimensions, components and their coefficients.
#[derive(Debug, Clone)]
pub struct DecodeSession {
    width: u32,
    height: u32,
    components: Vec<ComponentCoefficients>,
}

impl DecodeSession {
    /// Read and decode a JPEG file.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|source| DctError::Open {
            path: path.to_path_buf(),
            source,
        })?;

        log::debug!("opened {}", path.display());
        DecodeSession::from_reader(BufReader::new(file))
    }

    /// Decode a JPEG from any reader, e.g. stdin.
    pub fn from_reader<R: Read>(reader: R) -> Result<Self> {
        DecodeSession::from_segments(parse_jpeg_reader(reader)?)
    }

    /// Decode a JPEG held in memory.
    pub fn from_jpeg(data: &[u8]) -> Result<Self> {
        DecodeSession::from_segments(parse_jpeg(data)?)
    }

    fn from_segments(segments: JpegSegments) -> Result<Self> {
        let frame = segments
            .frame
            .as_ref()
            .ok_or_else(|| DctError::format("no frame header (SOF)"))?;
        if segments.scans.is_empty() {
            return Err(DctError::format("no scan data"));
        }

        log::debug!(
            "frame SOF{} {}x{}, {} components, {} scans{}",
            frame.sof_type,
            frame.width,
            frame.height,
            frame.components.len(),
            segments.scans.len(),
            if segments.truncated { " (truncated)" } else { "" }
        );

        let grids = decode_coefficients(&segments)?;

        let mut components = Vec::with_capacity(grids.len());
        for (index, grid) in grids.iter().enumerate() {
            let info = ComponentInfo::from_frame(frame, index);
            let quant_table = segments.quant_tables[info.quant_table_id as usize].clone();

            let mut blocks = Vec::with_capacity(info.total_blocks());
            for row in 0..info.height_in_blocks {
                for col in 0..info.width_in_blocks {
                    let idx = grid.index(row, col);
                    blocks.push(grid.present[idx].then(|| CoefficientBlock::new(grid.blocks[idx])));
                }
            }

            let coefficients = ComponentCoefficients::new(info, quant_table, blocks)?;
            let info = coefficients.info();
            log::debug!(
                "component {} (id {}): {}x{} blocks ({} present), sampling {}x{}, quant table {}",
                index,
                info.id,
                info.width_in_blocks,
                info.height_in_blocks,
                coefficients.present_blocks(),
                info.h_sampling,
                info.v_sampling,
                info.quant_table_id
            );
            components.push(coefficients);
        }

        Ok(DecodeSession {
            width: frame.width as u32,
            height: frame.height as u32,
            components,
        })
    }

    /// Session over coefficients decoded by the caller.
    pub fn from_components(
        width: u32,
        height: u32,
        components: Vec<ComponentCoefficients>,
    ) -> Result<Self> {
        if width == 0 || height == 0 {
            return Err(DctError::InvalidArgument(format!(
                "image dimensions {}x{}",
                width, height
            )));
        }
        if components.is_empty() {
            return Err(DctError::InvalidArgument("session without components".to_string()));
        }
        for (i, c) in components.iter().enumerate() {
            if c.info.index != i {
                return Err(DctError::InvalidArgument(format!(
                    "component at position {} claims index {}",
                    i, c.info.index
                )));
            }
        }

        Ok(DecodeSession {
            width,
            height,
            components,
        })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn components(&self) -> impl Iterator<Item = &ComponentInfo> {
        self.components.iter().map(|c| &c.info)
    }

    pub fn component_count(&self) -> usize {
        self.components.len()
    }

    pub fn component(&self, index: usize) -> Result<&ComponentInfo> {
        self.coefficients(index).map(|c| &c.info)
    }

    /// Quantization table of a component.
    pub fn quant_table(&self, index: usize) -> Result<&QuantTable> {
        let c = self.coefficients(index)?;
        c.quant_table.as_ref().ok_or(DctError::MissingQuantTable {
            component: index,
            table: c.info.quant_table_id,
        })
    }

    /// Row-addressable view over a component's blocks.
    pub fn store(&self, index: usize) -> Result<CoefficientStore<'_>> {
        Ok(CoefficientStore::new(self.coefficients(index)?))
    }

    fn coefficients(&self, index: usize) -> Result<&ComponentCoefficients> {
        self.components.get(index).ok_or_else(|| {
            DctError::InvalidArgument(format!(
                "component {} does not exist ({} components)",
                index,
                self.components.len()
            ))
        })
    }
}
