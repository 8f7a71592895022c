//! Core types and the flat file format.

pub mod errors;
pub mod format;
pub mod model;
