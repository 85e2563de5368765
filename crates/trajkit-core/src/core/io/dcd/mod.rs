//! Reader for the DCD binary trajectory format.
//!
//! A DCD file is a sequence of Fortran records: an 84-byte header record
//! opening with the `CORD` tag, a block of fixed-width titles, the particle
//! count, and then per frame an optional unit-cell record followed by one
//! record each for the x, y and z coordinates as 32-bit floats.
//!
//! Reading is split in two passes. [`scan`] walks the file once, checking
//! record lengths and collecting one [`FrameIndexEntry`] per frame without
//! touching coordinate payloads. [`FrameDecoder`] then seeks to any indexed
//! offset and decodes that single frame on demand.

mod decoder;
mod error;
mod header;
mod scanner;

#[cfg(test)]
pub(crate) mod fixtures;

pub use decoder::{DecodedFrame, FrameDecoder};
pub use error::DcdError;
pub use header::{FileHeader, LEADING_RECORD_LEN, MAGIC, UNIT_CELL_RECORD_LEN};
pub use scanner::{FrameIndexEntry, scan};
