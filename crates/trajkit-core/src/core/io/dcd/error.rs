use crate::core::io::record::RecordError;
use crate::core::utils::geometry::GeometryError;
use std::io;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DcdError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("Invalid DCD file: {0}")]
    Format(String),

    #[error(
        "Corrupt record at byte {offset}: leading length {leading} does not match trailing length {trailing}"
    )]
    CorruptRecord {
        offset: u64,
        leading: u32,
        trailing: u32,
    },

    #[error("Unexpected end of stream in record at byte {offset} (last indexed frame: {})", describe_frame(.last_indexed))]
    UnexpectedEof {
        offset: u64,
        last_indexed: Option<usize>,
    },

    #[error(
        "Coordinate block at byte {offset} holds {found} particles, the header declares {expected}"
    )]
    InconsistentParticleCount {
        offset: u64,
        expected: usize,
        found: usize,
    },

    #[error("Unsupported angle-convention marker {0}")]
    UnsupportedVariant(u32),

    #[error("Invalid unit cell: {0}")]
    Geometry(#[from] GeometryError),
}

fn describe_frame(frame: &Option<usize>) -> String {
    match frame {
        Some(frame) => frame.to_string(),
        None => "none".to_string(),
    }
}

impl DcdError {
    /// Attaches the last fully indexed frame to an end-of-stream error.
    pub(crate) fn with_last_indexed(self, last: Option<usize>) -> Self {
        match self {
            DcdError::UnexpectedEof { offset, .. } => DcdError::UnexpectedEof {
                offset,
                last_indexed: last,
            },
            other => other,
        }
    }
}

impl From<RecordError> for DcdError {
    fn from(err: RecordError) -> Self {
        match err {
            RecordError::Io(e) => DcdError::Io(e),
            RecordError::UnexpectedEof { offset } => DcdError::UnexpectedEof {
                offset,
                last_indexed: None,
            },
            RecordError::Corrupt {
                offset,
                leading,
                trailing,
            } => DcdError::CorruptRecord {
                offset,
                leading,
                trailing,
            },
            short @ RecordError::ShortPayload { .. } => DcdError::Format(short.to_string()),
        }
    }
}
