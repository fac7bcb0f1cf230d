//! Sort engine
//!
//! Runs one sort: validates input, starts the copy pool, walks the source
//! tree from the calling thread, then drains the pool. The pool is only shut
//! down after the root traversal has returned, so nothing is submitted once
//! draining starts.

use crate::config::SortConfig;
use crate::core::{CancellationToken, CopyFailure, CopyPool, TraversalLimiter, WalkReport, Walker};
use crate::error::{Result, SortCopyError};
use crate::fs::BucketLayout;
use std::path::PathBuf;
use std::time::{Duration, Instant};
use tracing::{info, warn};

/// Sort operation result
#[derive(Debug, Clone)]
pub struct SortReport {
    /// Source folder
    pub source: PathBuf,
    /// Output root
    pub output: PathBuf,
    /// Traversal counters
    pub walk: WalkReport,
    /// Files copied
    pub files_copied: u64,
    /// Files that failed to copy
    pub files_failed: u64,
    /// Files skipped after cancellation
    pub files_skipped: u64,
    /// Total bytes copied
    pub bytes_copied: u64,
    /// Failed copies
    pub failures: Vec<CopyFailure>,
    /// Whether cancellation was requested during the run
    pub cancelled: bool,
    /// Total duration
    pub duration: Duration,
}

impl SortReport {
    /// Every found file was copied and every folder listed
    pub fn is_success(&self) -> bool {
        self.files_failed == 0
            && self.files_skipped == 0
            && self.walk.dirs_failed == 0
            && self.walk.entries_skipped == 0
            && !self.cancelled
    }

    /// Print summary to console
    pub fn print_summary(&self) {
        println!("\n=== Sort Summary ===");
        println!("Folders scanned: {}", self.walk.dirs_visited);
        println!("Files found:     {}", self.walk.files_submitted);
        println!("Files copied:    {}", self.files_copied);
        println!("Bytes copied:    {}", humansize::format_size(self.bytes_copied, humansize::BINARY));
        println!("Duration:        {}", humantime::format_duration(round_millis(self.duration)));

        if self.walk.dirs_failed > 0 {
            println!("Folders skipped: {}", self.walk.dirs_failed);
        }
        if self.files_skipped > 0 {
            println!("Files skipped:   {}", self.files_skipped);
        }

        if !self.failures.is_empty() {
            println!("\nFailures: {}", self.failures.len());
            for failure in &self.failures {
                println!("  {} - {}", failure.source.display(), failure.error);
            }
        }
    }
}

fn round_millis(duration: Duration) -> Duration {
    Duration::from_millis(duration.as_millis() as u64)
}

/// Main sort engine
pub struct SortEngine {
    config: SortConfig,
    cancel: CancellationToken,
}

impl SortEngine {
    /// Create a new sort engine
    pub fn new(config: SortConfig) -> Self {
        Self {
            config,
            cancel: CancellationToken::new(),
        }
    }

    /// Token for cancelling from another thread
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Cancel the operation
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    /// Execute the sort.
    ///
    /// Returns a fatal input error before touching the output tree, or the
    /// root listing error after the pool has drained.
    pub fn execute(&self) -> Result<SortReport> {
        let start_time = Instant::now();
        let config = &self.config;

        config.validate()?;

        info!("Starting to process: {}", config.source.display());

        let layout = BucketLayout::new(&config.output, &config.no_ext_bucket);
        let pool = CopyPool::new(config.workers, layout, self.cancel.clone())?;

        let limiter = match config.max_walkers {
            Some(max) => TraversalLimiter::new(max),
            None => TraversalLimiter::unbounded(),
        };

        let (walk_result, walk) = {
            let walker = Walker::new(&pool, limiter, self.cancel.clone())
                .with_excluded(config.resolved_output());
            let result = walker.traverse(&config.source);
            (result, walker.report())
        };

        let pool_report = pool.shutdown_and_wait()?;

        match walk_result {
            Ok(()) | Err(SortCopyError::Cancelled) => {}
            Err(e) => return Err(e),
        }

        let cancelled = self.cancel.is_cancelled();
        if cancelled {
            warn!("Processing cancelled; output in {} is incomplete", config.output.display());
        } else {
            info!("Processing complete. Sorted files are in: {}", config.output.display());
        }

        Ok(SortReport {
            source: config.source.clone(),
            output: config.output.clone(),
            walk,
            files_copied: pool_report.copied,
            files_failed: pool_report.failed,
            files_skipped: pool_report.skipped,
            bytes_copied: pool_report.bytes_copied,
            failures: pool_report.failures,
            cancelled,
            duration: start_time.elapsed(),
        })
    }
}

/// Sort `source` into `output` with default settings
pub fn sort_folder(source: impl Into<PathBuf>, output: impl Into<PathBuf>) -> Result<SortReport> {
    let config = SortConfig {
        source: source.into(),
        output: output.into(),
        ..Default::default()
    };

    SortEngine::new(config).execute()
}
