use std::path::PathBuf;

use clap::Args;
use dctscope_core::api::inspect::InspectOptions;
use dctscope_core::{AbsentBlockPolicy, DEFAULT_JPEG_QUALITY};

use crate::CliResult;

/// Writes DC previews (and optionally a coefficient dump) of JPEG images
#[derive(Args, Debug)]
pub struct ExtractArgs {
    /// JPEG file(s) to inspect, used readonly.
    #[arg(
        short = 'i',
        long = "in",
        value_name = "jpeg file",
        required = true,
        num_args = 1..
    )]
    pub jpeg_files: Vec<PathBuf>,

    /// All artifacts will be stored in that folder
    #[arg(
        short = 'o',
        long = "out",
        value_name = "output folder",
        required = true
    )]
    pub output_folder: PathBuf,

    /// Do not write PGM bitmaps of the DC planes
    #[arg(long)]
    pub no_pgm: bool,

    /// Do not write JPEG recompressions of the DC planes
    #[arg(long)]
    pub no_jpeg: bool,

    /// Quality of the DC plane JPEGs
    #[arg(
        short,
        long,
        value_name = "1-100",
        default_value_t = DEFAULT_JPEG_QUALITY,
        value_parser = clap::value_parser!(u8).range(1..=100)
    )]
    pub quality: u8,

    /// Also dump the coefficients of every block in zigzag order
    #[arg(short, long)]
    pub coefficients: bool,

    /// Use this gray level for blocks without decoded data instead of failing
    #[arg(
        long,
        value_name = "gray",
        num_args = 0..=1,
        default_missing_value = "128"
    )]
    pub fill_absent: Option<u8>,
}

impl ExtractArgs {
    pub fn options(&self) -> InspectOptions {
        InspectOptions {
            write_pgm: !self.no_pgm,
            write_jpeg: !self.no_jpeg,
            jpeg_quality: self.quality,
            dump_coefficients: self.coefficients,
            absent_blocks: self
                .fill_absent
                .map_or(AbsentBlockPolicy::Fail, AbsentBlockPolicy::Fill),
        }
    }

    /// Processes every input; a failing input is logged and the first
    /// failure is returned once all inputs were attempted.
    pub fn run(self) -> CliResult<()> {
        let options = self.options();
        let mut first_error = None;

        for jpeg in &self.jpeg_files {
            match dctscope_core::commands::inspect(jpeg, &self.output_folder, &options) {
                Ok(report) => {
                    for plane in &report.planes {
                        log::info!(
                            "{}: plane {} has {}x{} blocks",
                            jpeg.display(),
                            plane.name,
                            plane.block_width,
                            plane.block_height
                        );
                    }
                    if let Some(dump) = report.dump {
                        println!(
                            "{}: {} blocks dumped, {} skipped",
                            jpeg.display(),
                            dump.emitted,
                            dump.skipped()
                        );
                    }
                    println!(
                        "{}: {} planes, {} files written",
                        jpeg.display(),
                        report.planes.len(),
                        report.written.len()
                    );
                }
                Err(e) => {
                    log::error!("{}: {}", jpeg.display(), e);
                    first_error.get_or_insert(e);
                }
            }
        }

        first_error.map_or(Ok(()), Err)
    }
}
