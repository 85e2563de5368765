//! Binary trajectory input.
//!
//! [`record`] implements the length-bracketed Fortran record primitive that
//! every structural read goes through, and [`dcd`] builds the DCD reader on top
//! of it.

pub mod dcd;
pub mod record;
