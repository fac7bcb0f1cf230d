//! Configuration settings for SortCopy
//!
//! Defines the CLI arguments and the runtime configuration derived from them.

use crate::error::{IoResultExt, Result, SortCopyError};
use clap::Parser;
use std::path::{Component, Path, PathBuf};

/// Default output root
pub const DEFAULT_OUTPUT: &str = "dist";

/// Default number of copy workers
pub const DEFAULT_WORKERS: usize = 8;

/// Default cap on concurrently running traversal threads
pub const DEFAULT_MAX_WALKERS: usize = 64;

/// Default bucket for files without an extension
pub const DEFAULT_NO_EXT_BUCKET: &str = "noext";

/// SortCopy - sort a folder tree into per-extension folders
#[derive(Parser, Debug, Clone)]
#[command(name = "sortcopy")]
#[command(author = "SortCopy Team")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Sorting folder: copy every file into a folder named after its extension")]
#[command(long_about = r#"
SortCopy walks a source folder recursively and copies every file it finds
into <OUTPUT>/<extension>/<filename>. Subfolders are scanned concurrently and
files are copied by a fixed pool of workers.

Examples:
  sortcopy -s picture                 # Sort into ./dist
  sortcopy -s picture -o sorted       # Sort into ./sorted
  sortcopy -s picture --workers 16    # Wider copy pool
"#)]
pub struct CliArgs {
    /// Source folder
    #[arg(short = 's', long, value_name = "DIR")]
    pub source: PathBuf,

    /// Output folder
    #[arg(short = 'o', long, default_value = DEFAULT_OUTPUT, env = "SORTCOPY_OUTPUT", value_name = "DIR")]
    pub output: PathBuf,

    /// Number of copy workers
    #[arg(short = 'w', long, default_value_t = DEFAULT_WORKERS, value_name = "NUM")]
    pub workers: usize,

    /// Maximum concurrent folder scanners (0 = unbounded)
    #[arg(long, default_value_t = DEFAULT_MAX_WALKERS, value_name = "NUM")]
    pub max_walkers: usize,

    /// Folder name for files without an extension
    #[arg(long, default_value = DEFAULT_NO_EXT_BUCKET, value_name = "NAME")]
    pub no_ext_bucket: String,

    /// Verbose output (-v for per-task debug lines)
    #[arg(short = 'v', long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Quiet mode (only warnings and errors)
    #[arg(short = 'q', long)]
    pub quiet: bool,
}

impl CliArgs {
    /// Log filter directive implied by -v / -q
    pub fn log_directive(&self) -> &'static str {
        if self.quiet {
            "sortcopy=warn,warn"
        } else if self.verbose > 0 {
            "sortcopy=debug,warn"
        } else {
            "sortcopy=info,warn"
        }
    }
}

/// Runtime configuration derived from CLI args
#[derive(Debug, Clone)]
pub struct SortConfig {
    /// Folder to scan
    pub source: PathBuf,
    /// Root of the extension buckets
    pub output: PathBuf,
    /// Copy pool capacity
    pub workers: usize,
    /// Traversal thread cap (None = unbounded)
    pub max_walkers: Option<usize>,
    /// Bucket name for files without an extension
    pub no_ext_bucket: String,
}

impl Default for SortConfig {
    fn default() -> Self {
        Self {
            source: PathBuf::new(),
            output: PathBuf::from(DEFAULT_OUTPUT),
            workers: DEFAULT_WORKERS,
            max_walkers: Some(DEFAULT_MAX_WALKERS),
            no_ext_bucket: DEFAULT_NO_EXT_BUCKET.to_string(),
        }
    }
}

impl SortConfig {
    /// Build configuration from CLI arguments
    pub fn from_cli(args: &CliArgs) -> Result<Self> {
        let config = Self {
            source: args.source.clone(),
            output: args.output.clone(),
            workers: args.workers,
            max_walkers: match args.max_walkers {
                0 => None,
                n => Some(n),
            },
            no_ext_bucket: args.no_ext_bucket.clone(),
        };
        config.check_settings()?;
        Ok(config)
    }

    /// Check settings that do not touch the filesystem
    pub fn check_settings(&self) -> Result<()> {
        if self.workers == 0 {
            return Err(SortCopyError::config("workers must be at least 1"));
        }

        let mut components = Path::new(&self.no_ext_bucket).components();
        match (components.next(), components.next()) {
            (Some(Component::Normal(_)), None) => Ok(()),
            _ => Err(SortCopyError::config(format!(
                "invalid no-extension bucket name '{}'",
                self.no_ext_bucket
            ))),
        }
    }

    /// Validate the source folder before any traversal starts.
    ///
    /// Never creates anything on disk.
    pub fn validate(&self) -> Result<()> {
        self.check_settings()?;

        if !self.source.exists() {
            return Err(SortCopyError::SourceNotFound(self.source.clone()));
        }
        if !self.source.is_dir() {
            return Err(SortCopyError::NotADirectory(self.source.clone()));
        }

        if let Some(output) = self.resolved_output() {
            let source = self.source.canonicalize().with_path(&self.source)?;
            if output == source {
                return Err(SortCopyError::SameSourceAndDestination(self.output.clone()));
            }
        }

        Ok(())
    }

    /// Output root as an absolute path, resolving symlinks on the part that
    /// already exists.
    pub fn resolved_output(&self) -> Option<PathBuf> {
        let absolute = std::path::absolute(&self.output).ok()?;

        let mut existing = absolute.as_path();
        let mut missing = Vec::new();
        loop {
            if let Ok(resolved) = existing.canonicalize() {
                return Some(missing.iter().rev().fold(resolved, |acc, part| acc.join(part)));
            }
            missing.push(existing.file_name()?.to_os_string());
            existing = existing.parent()?;
        }
    }
}
