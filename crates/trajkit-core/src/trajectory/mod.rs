//! Lazy, random-access trajectories built on the DCD offset index.

mod arrays;
mod config;
mod error;
mod lazy;

pub use arrays::{TrajectoryArrays, TypeTable};
pub use config::{ConfigError, ReaderConfig, ReaderConfigBuilder};
pub use error::TrajectoryError;
pub use lazy::{Frames, LazyTrajectory};
