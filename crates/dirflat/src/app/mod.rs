//! Application layer orchestrating the flatten and reconstruct pipelines.

pub mod flatten;
pub mod reconstruct;
