use std::{
    fs::{self, File},
    io::{BufWriter, Write},
    path::{Path, PathBuf},
};

use crate::{
    dc::{extract_component, AbsentBlockPolicy},
    dump::{dump_all, DumpReport},
    error::{DctError, Result},
    intensity::IntensityImage,
    output::{save_jpeg, save_pgm, DEFAULT_JPEG_QUALITY},
    resample::resample_nearest,
    session::DecodeSession,
};

pub fn prepare() -> InspectApi {
    InspectApi::default()
}

/// What `execute` produces besides the DC planes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InspectOptions {
    /// Write `<stem>_<plane>.pgm` per component.
    pub write_pgm: bool,

    /// Write `<stem>_<plane>_dc.jpg` per component.
    pub write_jpeg: bool,

    /// Quality of the JPEG artifacts, 1 to 100.
    pub jpeg_quality: u8,

    /// Write `<stem>_coefficients.txt` with every block in zigzag order.
    pub dump_coefficients: bool,

    /// Handling of blocks without decoded data during DC extraction.
    pub absent_blocks: AbsentBlockPolicy,
}

impl Default for InspectOptions {
    fn default() -> Self {
        Self {
            write_pgm: true,
            write_jpeg: true,
            jpeg_quality: DEFAULT_JPEG_QUALITY,
            dump_coefficients: false,
            absent_blocks: AbsentBlockPolicy::Fail,
        }
    }
}

/// One DC plane, aligned to the luma block grid.
#[derive(Debug, Clone)]
pub struct PlaneReport {
    pub component: usize,
    pub name: String,
    /// Block grid of the component itself, before resampling.
    pub block_width: usize,
    pub block_height: usize,
    pub image: IntensityImage,
}

#[derive(Debug, Clone)]
pub struct InspectReport {
    pub planes: Vec<PlaneReport>,
    /// Artifacts written, in order.
    pub written: Vec<PathBuf>,
    /// Present when the coefficient dump was requested and written.
    pub dump: Option<DumpReport>,
}

#[derive(Default, Debug)]
pub struct InspectApi {
    jpeg: Option<PathBuf>,
    output_folder: Option<PathBuf>,
    options: InspectOptions,
}

impl InspectApi {
    /// Use the given inspection options
    pub fn with_options(mut self, options: InspectOptions) -> Self {
        self.options = options;
        self
    }

    /// This is the JPEG to inspect
    pub fn with_jpeg(mut self, jpeg: impl AsRef<Path>) -> Self {
        self.jpeg = Some(jpeg.as_ref().to_path_buf());
        self
    }

    /// This is the folder where the artifacts will be saved to, it is created if missing
    pub fn into_output_folder(mut self, output_folder: impl AsRef<Path>) -> Self {
        self.output_folder = Some(output_folder.as_ref().to_path_buf());
        self
    }

    /// Execute the inspection and block until it is finished
    ///
    /// Decoding and DC extraction failures abort before anything is written.
    /// A failing artifact does not stop the others; the first such failure is
    /// returned once everything was attempted.
    pub fn execute(self) -> Result<InspectReport> {
        let Some(jpeg) = self.jpeg else {
            return Err(DctError::InvalidArgument("no input JPEG given".to_string()));
        };
        let Some(output_folder) = self.output_folder else {
            return Err(DctError::InvalidArgument("no output folder given".to_string()));
        };
        let options = self.options;
        if options.write_jpeg && !(1..=100).contains(&options.jpeg_quality) {
            return Err(DctError::InvalidArgument(format!(
                "JPEG quality {} is outside 1..=100",
                options.jpeg_quality
            )));
        }

        let session = DecodeSession::open(&jpeg)?;
        let planes = extract_planes(&session, options.absent_blocks)?;

        fs::create_dir_all(&output_folder).map_err(|source| DctError::Output {
            path: output_folder.clone(),
            source,
        })?;
        let stem = jpeg
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "image".to_string());

        let mut written = Vec::new();
        let mut first_error = None;
        let mut record = |result: Result<()>, path: PathBuf| match result {
            Ok(()) => written.push(path),
            Err(e) => {
                log::warn!("cannot write {}: {}", path.display(), e);
                first_error.get_or_insert(e);
            }
        };

        for plane in &planes {
            if options.write_pgm {
                let path = output_folder.join(format!("{}_{}.pgm", stem, plane.name));
                record(save_pgm(&plane.image, &path), path);
            }
            if options.write_jpeg {
                let path = output_folder.join(format!("{}_{}_dc.jpg", stem, plane.name));
                record(save_jpeg(&plane.image, &path, options.jpeg_quality), path);
            }
        }

        let mut dump = None;
        if options.dump_coefficients {
            let path = output_folder.join(format!("{}_coefficients.txt", stem));
            let result = write_dump(&session, &path).map(|report| {
                dump = Some(report);
            });
            record(result, path);
        }

        if let Some(e) = first_error {
            return Err(e);
        }

        Ok(InspectReport {
            planes,
            written,
            dump,
        })
    }
}

/// DC image of every component, chroma resampled to the luma grid.
fn extract_planes(session: &DecodeSession, policy: AbsentBlockPolicy) -> Result<Vec<PlaneReport>> {
    let luma = session.component(0)?;
    let (target_width, target_height) = (luma.width_in_blocks, luma.height_in_blocks);

    let mut planes = Vec::with_capacity(session.component_count());
    for info in session.components() {
        let dc = extract_component(session, info.index, policy)?;
        let image = if info.index == 0 {
            dc
        } else {
            resample_nearest(&dc, target_width, target_height)?
        };

        planes.push(PlaneReport {
            component: info.index,
            name: info.plane_name(),
            block_width: info.width_in_blocks,
            block_height: info.height_in_blocks,
            image,
        });
    }

    Ok(planes)
}

fn write_dump(session: &DecodeSession, path: &Path) -> Result<DumpReport> {
    let stores = (0..session.component_count())
        .map(|index| session.store(index))
        .collect::<Result<Vec<_>>>()?;

    let output_error = |source| DctError::Output {
        path: path.to_path_buf(),
        source,
    };
    let mut writer = BufWriter::new(File::create(path).map_err(output_error)?);
    let report = dump_all(&stores, &mut writer).map_err(output_error)?;
    writer.flush().map_err(output_error)?;

    if report.skipped() > 0 {
        log::warn!(
            "{}: skipped {} blocks ({} absent, {} in unavailable rows)",
            path.display(),
            report.skipped(),
            report.absent,
            report.unavailable
        );
    }
    log::info!("wrote {} ({} blocks)", path.display(), report.emitted);
    Ok(report)
}
