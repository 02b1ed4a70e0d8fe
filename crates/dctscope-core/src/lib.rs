//! # dctscope core
//!
//! Looks at a JPEG in the coefficient domain, without reconstructing pixels:
//! - DC previews: one gray sample per 8x8 block, taken from the DC term and
//!   its quantization factor, with chroma planes resampled to the luma grid
//! - Coefficient dumps: all 64 quantized coefficients of every block, in
//!   zigzag order
//!
//! Everything goes through a [`DecodeSession`], whose per-component
//! [`CoefficientStore`] hands out block rows as [`BlockSlot`]s.
//!
//! # Usage Examples
//!
//! ## Write DC previews and a coefficient dump
//!
//! ```rust,no_run
//! use dctscope_core::api::inspect::InspectOptions;
//!
//! let report = dctscope_core::api::inspect::prepare()
//!     .with_jpeg("photo.jpg")
//!     .into_output_folder("out")
//!     .with_options(InspectOptions {
//!         dump_coefficients: true,
//!         ..InspectOptions::default()
//!     })
//!     .execute()
//!     .expect("Failed to inspect JPEG");
//!
//! for plane in &report.planes {
//!     println!("{}: {}x{} blocks", plane.name, plane.block_width, plane.block_height);
//! }
//! ```
//!
//! ## Work with a session directly
//!
//! ```rust,no_run
//! use dctscope_core::{extract_component, AbsentBlockPolicy, DecodeSession};
//!
//! let session = DecodeSession::open("photo.jpg").expect("Failed to open JPEG");
//! let luma = extract_component(&session, 0, AbsentBlockPolicy::Fill(128))
//!     .expect("Failed to extract DC plane");
//! assert_eq!(luma.width(), session.component(0).unwrap().width_in_blocks);
//! ```

#![warn(clippy::redundant_else)]

pub mod api;
pub mod commands;
pub mod dc;
pub mod dump;
pub mod error;
pub mod intensity;
pub mod jpeg;
pub mod output;
pub mod resample;
pub mod session;
pub mod store;
pub mod zigzag;

pub use crate::dc::{dc_intensity, extract_component, extract_dc, AbsentBlockPolicy};
pub use crate::dump::{dump_all, dump_component, DumpReport};
pub use crate::error::{DctError, ErrorCategory, Result};
pub use crate::intensity::IntensityImage;
pub use crate::output::{save_jpeg, save_pgm, DEFAULT_JPEG_QUALITY};
pub use crate::resample::resample_nearest;
pub use crate::session::{ComponentCoefficients, ComponentInfo, DecodeSession, QuantTable};
pub use crate::store::{BlockRows, BlockSlot, BlockSource, CoefficientBlock, CoefficientStore};
pub use crate::zigzag::{NATURAL_TO_ZIGZAG, ZIGZAG_TO_NATURAL};
