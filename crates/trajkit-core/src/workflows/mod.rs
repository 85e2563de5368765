//! # Workflows Module
//!
//! High-level entry points that work on trajectory files by path.
//!
//! - [`read`] opens, validates, and bulk-loads DCD files, including a
//!   parallel loader that gives each rayon worker its own file handle.
//! - [`progress`] carries progress events from long-running workflows to
//!   whatever front end is driving them.

pub mod progress;
pub mod read;
