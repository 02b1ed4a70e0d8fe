use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for dctscope operations.
pub type Result<T> = std::result::Result<T, DctError>;

/// Coarse failure category, used to tell failure kinds apart without matching
/// on every variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// The input could not be opened or read far enough to obtain a header.
    Open,
    /// The header or coefficient structure is not decodable.
    Format,
    /// A block row (or a block inside it) could not be obtained from an open session.
    StoreAccess,
    /// An output artifact could not be written.
    Output,
    /// Caller-level contract violation.
    InvalidArgument,
}

#[derive(Error, Debug)]
pub enum DctError {
    /// Represents a failure to open or read the input file
    #[error("Cannot open `{path}`")]
    Open {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Represents an input that ended before its header was complete
    #[error("Truncated JPEG: {reason}")]
    Truncated { reason: String },

    /// Represents a header or coefficient structure that is not decodable
    #[error("Invalid JPEG: {reason}")]
    Format { reason: String },

    /// Represents a frame type that is valid JPEG but not supported, e.g. arithmetic coding
    #[error("Unsupported JPEG frame type SOF{0}")]
    UnsupportedFrame(u8),

    /// Represents a block row that the decode session refused to hand out
    #[error("Block row {row} of component {component} is unavailable: {reason}")]
    StoreAccess {
        component: usize,
        row: usize,
        reason: String,
    },

    /// Represents a block without decoded data where data was required
    #[error("Block ({row}, {column}) of component {component} has no decoded coefficients")]
    AbsentBlock {
        component: usize,
        row: usize,
        column: usize,
    },

    /// Represents a component that references an undefined quantization table
    #[error("Component {component} references undefined quantization table {table}")]
    MissingQuantTable { component: usize, table: u8 },

    /// Represents a failure to write an output artifact
    #[error("Cannot write `{path}`")]
    Output {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Represents a failure of the image encoder while producing an artifact
    #[error("Image encoding error")]
    Encoding(#[from] image::ImageError),

    /// Represents a caller-level contract violation
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
}

impl DctError {
    pub(crate) fn format(reason: impl Into<String>) -> Self {
        DctError::Format {
            reason: reason.into(),
        }
    }

    pub(crate) fn truncated(reason: impl Into<String>) -> Self {
        DctError::Truncated {
            reason: reason.into(),
        }
    }

    pub fn category(&self) -> ErrorCategory {
        match self {
            DctError::Open { .. } | DctError::Truncated { .. } => ErrorCategory::Open,
            DctError::Format { .. }
            | DctError::UnsupportedFrame(_)
            | DctError::MissingQuantTable { .. } => ErrorCategory::Format,
            DctError::StoreAccess { .. } | DctError::AbsentBlock { .. } => {
                ErrorCategory::StoreAccess
            }
            DctError::Output { .. } | DctError::Encoding(_) => ErrorCategory::Output,
            DctError::InvalidArgument(_) => ErrorCategory::InvalidArgument,
        }
    }
}
