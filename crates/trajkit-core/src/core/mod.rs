//! # Core Module
//!
//! Stateless building blocks of the library.
//!
//! - **Data models** ([`models`]) - the normalized [`Frame`](models::frame::Frame)
//!   every reader produces and the [`SimBox`](models::simbox::SimBox) it lives in
//! - **File I/O** ([`io`]) - the Fortran record codec and the DCD scanner and decoder
//! - **Geometry** ([`utils`]) - box-matrix reconstruction from stored unit cells

pub mod io;
pub mod models;
pub mod utils;
