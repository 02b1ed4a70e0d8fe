//! Marker codes that structure a JPEG stream (ITU T.81 Table B.1).
//!
//! Only markers the coefficient reader acts on get a variant of their own.
//! Everything else is either a segment to skip or a code without payload.

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[allow(clippy::upper_case_acronyms)]
pub enum Marker {
    SOI,
    EOI,
    /// Start of frame, with the frame type (the low nibble of the code).
    SOF(u8),
    DHT,
    DQT,
    DRI,
    SOS,
    /// Restart marker 0-7, only meaningful inside scan data.
    RST(u8),
    /// Arithmetic coding conditioning.
    DAC,
    /// Number of lines, sent after the first scan.
    DNL,
    /// Segment without coefficient relevance (APPn, COM, DHP, EXP, JPGn,
    /// reserved codes), holding the raw code.
    Skipped(u8),
    /// Code without length field (TEM).
    Standalone(u8),
}

impl Marker {
    /// Classify the byte following a 0xFF.
    ///
    /// 0x00 (stuffed byte) and 0xFF (fill byte) are not markers.
    pub fn from_u8(code: u8) -> Option<Marker> {
        let marker = match code {
            0x00 | 0xFF => return None,
            0x01 => Marker::Standalone(code),
            0xC4 => Marker::DHT,
            0xC8 => Marker::Skipped(code),
            0xCC => Marker::DAC,
            0xC0..=0xCF => Marker::SOF(code & 0x0F),
            0xD0..=0xD7 => Marker::RST(code & 0x07),
            0xD8 => Marker::SOI,
            0xD9 => Marker::EOI,
            0xDA => Marker::SOS,
            0xDB => Marker::DQT,
            0xDC => Marker::DNL,
            0xDD => Marker::DRI,
            _ => Marker::Skipped(code),
        };
        Some(marker)
    }

    /// Whether a big-endian segment length follows the code.
    pub fn has_length(self) -> bool {
        !matches!(
            self,
            Marker::SOI | Marker::EOI | Marker::RST(_) | Marker::Standalone(_)
        )
    }
}
