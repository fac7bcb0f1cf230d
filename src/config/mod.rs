//! Configuration module for SortCopy
//!
//! CLI arguments and the runtime settings built from them.

mod settings;

pub use settings::*;
