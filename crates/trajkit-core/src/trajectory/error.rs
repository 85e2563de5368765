use super::config::ConfigError;
use crate::core::io::dcd::DcdError;
use crate::core::models::frame::FrameError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum TrajectoryError {
    #[error(transparent)]
    Dcd(#[from] DcdError),

    #[error(transparent)]
    Frame(#[from] FrameError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Frame index {index} is out of range for a trajectory of {len} frames")]
    Index { index: isize, len: usize },

    #[error("Slice step must not be zero")]
    InvalidSlice,

    #[error("Trajectory has been closed")]
    Closed,

    #[error("Configured {found} particle types, but the trajectory holds {expected} particles")]
    TypeCount { expected: usize, found: usize },

    #[error("Frames carry no unit cell; configure a fallback box to read this file")]
    MissingUnitCell,
}
