//! # SortCopy - sort a folder tree by file extension
//!
//! SortCopy walks a source folder recursively and copies every file it finds
//! into `<output>/<extension>/<filename>`. Subfolders are scanned
//! concurrently on scoped threads while a fixed pool of copy workers does the
//! I/O. A run only finishes once every scan has been joined and the pool has
//! drained.
//!
//! ## Quick Start
//!
//! ```no_run
//! use sortcopy::core::sort_folder;
//!
//! let report = sort_folder("picture", "dist").unwrap();
//! println!("Copied {} files ({} bytes)", report.files_copied, report.bytes_copied);
//! ```
//!
//! ## Custom Settings
//!
//! ```no_run
//! use sortcopy::config::SortConfig;
//! use sortcopy::core::SortEngine;
//! use std::path::PathBuf;
//!
//! let config = SortConfig {
//!     source: PathBuf::from("picture"),
//!     output: PathBuf::from("sorted"),
//!     workers: 16,
//!     max_walkers: Some(32),
//!     ..Default::default()
//! };
//!
//! let report = SortEngine::new(config).execute().unwrap();
//! report.print_summary();
//! ```
//!
//! ## Using the walker directly
//!
//! [`core::Walker`] only needs something implementing [`core::CopySink`], so a
//! traversal can be tested or reused without a real copy pool.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod config;
pub mod core;
pub mod error;
pub mod fs;

// Re-export commonly used types
pub use config::SortConfig;
pub use core::{SortEngine, SortReport};
pub use error::{Result, SortCopyError};
