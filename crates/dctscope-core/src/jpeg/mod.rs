//! JPEG coefficient decoding.
//!
//! Parses the marker structure and entropy-decodes every scan into quantized
//! DCT coefficients. There is no dequantization, IDCT or color conversion.

pub mod huffman;
pub mod marker;
pub mod parser;
pub mod scan;

pub use parser::{
    parse_jpeg, parse_jpeg_reader, parse_quantization_tables, FrameComponent, FrameInfo,
    HuffmanTable, JpegSegments, QuantizationTable, Scan, ScanComponent,
};
pub use scan::{decode_coefficients, CoefficientGrid};
