//! Data models shared by every trajectory reader.
//!
//! [`frame::Frame`] is the normalized per-frame representation: readers produce
//! it and writers consume it. [`simbox::SimBox`] describes the periodic cell
//! each frame lives in.

pub mod frame;
pub mod simbox;
