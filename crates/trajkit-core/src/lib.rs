//! # trajkit Core Library
//!
//! Readers for molecular-simulation trajectories that index a file once and
//! then decode individual frames on demand, starting with the CHARMM/NAMD/HOOMD
//! DCD binary format.
//!
//! ## Architectural Philosophy
//!
//! The library is split into three layers, each depending only on the ones below it.
//!
//! - **[`core`]: The Foundation.** Stateless data models (`SimBox`, `Frame`), the
//!   unit-cell geometry that turns stored DCD cells into box matrices, the Fortran
//!   record codec, and the DCD scanner and frame decoder.
//!
//! - **[`trajectory`]: The Access Layer.** `LazyTrajectory` owns a stream and the
//!   offset index built by the scanner. It supports indexing, Python-style slicing,
//!   and iteration, decoding exactly one frame per access and sharing the stream
//!   between all views of the same file.
//!
//! - **[`workflows`]: The Public API.** Path-based entry points that open,
//!   validate, and bulk-load trajectory files, with progress reporting for
//!   long-running operations.
//!
//! ```no_run
//! use std::path::Path;
//! use trajkit::trajectory::ReaderConfig;
//! use trajkit::workflows::read::open_path;
//!
//! # fn main() -> Result<(), trajkit::trajectory::TrajectoryError> {
//! let trajectory = open_path(Path::new("run.dcd"), ReaderConfig::default())?;
//! let last = trajectory.get(-1)?;
//! println!("{} particles in {}", last.len(), last.simbox());
//! for frame in &trajectory.slice(None, None, 10)? {
//!     let frame = frame?;
//!     println!("volume {}", frame.simbox().volume());
//! }
//! # Ok(())
//! # }
//! ```

pub mod core;
pub mod trajectory;
pub mod workflows;
