use std::fs;
use std::path::Path;

use crate::api::inspect::{InspectOptions, InspectReport};
use crate::jpeg::parse_quantization_tables;
use crate::{DctError, QuantTable, Result};

pub fn inspect(
    jpeg: &Path,
    output_folder: &Path,
    options: &InspectOptions,
) -> Result<InspectReport> {
    crate::api::inspect::prepare()
        .with_jpeg(jpeg)
        .into_output_folder(output_folder)
        .with_options(options.clone())
        .execute()
}

/// Quantization tables defined by a JPEG, in table ID order.
pub fn quantization_tables(jpeg: &Path) -> Result<Vec<QuantTable>> {
    let data = fs::read(jpeg).map_err(|source| DctError::Open {
        path: jpeg.to_path_buf(),
        source,
    })?;
    parse_quantization_tables(&data)
}
