//! File system operations module
//!
//! The extension bucket rule and the per-file copy step used by the pool.

mod bucket;
mod operations;

pub use bucket::*;
pub use operations::*;
