use std::path::PathBuf;

use clap::Args;

use crate::CliResult;

/// Shows the quantization tables of JPEG files
#[derive(Args, Debug)]
pub struct QuantizationArgs {
    /// The JPEG image file(s) to inspect
    #[arg(value_name = "jpeg file", required = true)]
    pub jpeg_files: Vec<PathBuf>,
}

impl QuantizationArgs {
    pub fn run(self) -> CliResult<()> {
        let mut first_error = None;

        for jpeg in &self.jpeg_files {
            let tables = match dctscope_core::commands::quantization_tables(jpeg) {
                Ok(tables) => tables,
                Err(e) => {
                    log::error!("{}: {}", jpeg.display(), e);
                    first_error.get_or_insert(e);
                    continue;
                }
            };

            let name = jpeg
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_else(|| jpeg.display().to_string());
            println!("# Quantization Tables of `{}`", name);
            println!();
            for table in &tables {
                println!(
                    "## Table {} (precision: {}-bit)",
                    table.id,
                    if table.precision == 0 { 8 } else { 16 }
                );
                print!("{}", table.to_ascii_table());
                println!();
            }
        }

        first_error.map_or(Ok(()), Err)
    }
}
