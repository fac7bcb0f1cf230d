//! Recursive concurrent directory walker
//!
//! Each directory is visited by one traversal unit. Subdirectories get their
//! own scoped thread while a traversal permit is available and are walked
//! inline on the current thread otherwise, so fan-out is capped without ever
//! blocking on a permit. Files are handed to a [`CopySink`].
//!
//! Every spawned traversal is joined by its parent before the parent
//! returns, so when [`Walker::traverse`] returns on the root no traversal is
//! still running and no further files will be submitted.

use crate::core::{CancellationToken, CopySink};
use crate::error::{Result, SortCopyError};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::thread;
use tracing::{debug, error, info, warn};

/// Stack for walker threads. Inline traversal recurses once per directory
/// level, so this bounds the depth a walker thread can descend.
const WALKER_STACK_SIZE: usize = 8 * 1024 * 1024;

/// Caps the number of concurrently running traversal threads
#[derive(Debug)]
pub struct TraversalLimiter {
    available: Option<AtomicUsize>,
    active: AtomicUsize,
    peak: AtomicUsize,
}

impl TraversalLimiter {
    /// Allow at most `max` extra traversal threads
    pub fn new(max: usize) -> Self {
        Self {
            available: Some(AtomicUsize::new(max)),
            active: AtomicUsize::new(0),
            peak: AtomicUsize::new(0),
        }
    }

    /// One thread per directory, no cap
    pub fn unbounded() -> Self {
        Self {
            available: None,
            active: AtomicUsize::new(0),
            peak: AtomicUsize::new(0),
        }
    }

    /// Take a permit if one is free
    pub fn try_acquire(&self) -> Option<TraversalPermit<'_>> {
        if let Some(available) = &self.available {
            available
                .fetch_update(Ordering::AcqRel, Ordering::Acquire, |n| n.checked_sub(1))
                .ok()?;
        }

        let active = self.active.fetch_add(1, Ordering::AcqRel) + 1;
        self.peak.fetch_max(active, Ordering::Relaxed);
        Some(TraversalPermit { limiter: self })
    }

    /// Highest number of permits held at once
    pub fn peak(&self) -> usize {
        self.peak.load(Ordering::Relaxed)
    }
}

/// A held traversal slot, released on drop
#[derive(Debug)]
pub struct TraversalPermit<'a> {
    limiter: &'a TraversalLimiter,
}

impl Drop for TraversalPermit<'_> {
    fn drop(&mut self) {
        self.limiter.active.fetch_sub(1, Ordering::AcqRel);
        if let Some(available) = &self.limiter.available {
            available.fetch_add(1, Ordering::AcqRel);
        }
    }
}

/// Walk counters
#[derive(Debug, Default)]
pub struct WalkStats {
    /// Directories listed
    pub dirs_visited: AtomicU64,
    /// Subdirectories that could not be listed
    pub dirs_failed: AtomicU64,
    /// Entries that could not be read
    pub entries_skipped: AtomicU64,
    /// Files handed to the sink
    pub files_submitted: AtomicU64,
    /// Traversal threads spawned
    pub threads_spawned: AtomicU64,
}

/// Snapshot of [`WalkStats`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WalkReport {
    /// Directories listed
    pub dirs_visited: u64,
    /// Subdirectories that could not be listed
    pub dirs_failed: u64,
    /// Entries that could not be read
    pub entries_skipped: u64,
    /// Files handed to the sink
    pub files_submitted: u64,
    /// Traversal threads spawned
    pub threads_spawned: u64,
    /// Most traversal threads alive at once
    pub peak_threads: usize,
}

/// Recursive directory walker feeding a copy sink
pub struct Walker<'s, S: CopySink + ?Sized> {
    sink: &'s S,
    limiter: TraversalLimiter,
    cancel: CancellationToken,
    excluded: Option<PathBuf>,
    stats: WalkStats,
}

impl<'s, S: CopySink + ?Sized> Walker<'s, S> {
    /// Create a walker submitting files to `sink`
    pub fn new(sink: &'s S, limiter: TraversalLimiter, cancel: CancellationToken) -> Self {
        Self {
            sink,
            limiter,
            cancel,
            excluded: None,
            stats: WalkStats::default(),
        }
    }

    /// Never descend into `dir`. Expects a canonical path.
    pub fn with_excluded(mut self, dir: Option<PathBuf>) -> Self {
        self.excluded = dir;
        self
    }

    /// Current counters
    pub fn report(&self) -> WalkReport {
        WalkReport {
            dirs_visited: self.stats.dirs_visited.load(Ordering::Relaxed),
            dirs_failed: self.stats.dirs_failed.load(Ordering::Relaxed),
            entries_skipped: self.stats.entries_skipped.load(Ordering::Relaxed),
            files_submitted: self.stats.files_submitted.load(Ordering::Relaxed),
            threads_spawned: self.stats.threads_spawned.load(Ordering::Relaxed),
            peak_threads: self.limiter.peak(),
        }
    }

    /// Walk `dir` and everything below it.
    ///
    /// Fails only when `dir` itself cannot be listed or the sink refuses a
    /// file; unreadable subdirectories are logged and skipped.
    pub fn traverse(&self, dir: &Path) -> Result<()> {
        if self.cancel.is_cancelled() {
            return Err(SortCopyError::Cancelled);
        }

        info!("Processing folder: {}", dir.display());
        let entries = std::fs::read_dir(dir).map_err(|e| SortCopyError::list(dir, e))?;
        self.stats.dirs_visited.fetch_add(1, Ordering::Relaxed);

        thread::scope(|scope| -> Result<()> {
            let mut children = Vec::new();

            for entry in entries {
                if self.cancel.is_cancelled() {
                    debug!("Stopping scan of {}: cancelled", dir.display());
                    break;
                }

                let entry = match entry {
                    Ok(entry) => entry,
                    Err(e) => {
                        self.skip_entry(dir, &e);
                        continue;
                    }
                };

                let path = entry.path();
                let is_dir = match entry.file_type() {
                    Ok(file_type) => file_type.is_dir(),
                    Err(e) => {
                        self.skip_entry(&path, &e);
                        continue;
                    }
                };

                if !is_dir {
                    self.sink.submit(path)?;
                    self.stats.files_submitted.fetch_add(1, Ordering::Relaxed);
                    continue;
                }

                if self.is_excluded(&path) {
                    debug!("Skipping output folder {}", path.display());
                    continue;
                }

                let Some(permit) = self.limiter.try_acquire() else {
                    self.visit_inline(&path)?;
                    continue;
                };

                let id = self.stats.threads_spawned.fetch_add(1, Ordering::Relaxed) + 1;
                let child = path.clone();
                let spawned = thread::Builder::new()
                    .name(format!("walker-{}", id))
                    .stack_size(WALKER_STACK_SIZE)
                    .spawn_scoped(scope, move || {
                        let _permit = permit;
                        self.traverse(&child)
                    });

                match spawned {
                    Ok(handle) => children.push((path, handle)),
                    Err(e) => {
                        warn!("Cannot start walker for {}: {}; scanning inline", path.display(), e);
                        self.visit_inline(&path)?;
                    }
                }
            }

            for (path, handle) in children {
                let result = handle.join().map_err(|_| {
                    SortCopyError::ThreadPoolError(format!("walker for {} panicked", path.display()))
                })?;
                self.absorb(&path, result)?;
            }

            Ok(())
        })
    }

    fn visit_inline(&self, dir: &Path) -> Result<()> {
        self.absorb(dir, self.traverse(dir))
    }

    /// Apply the subdirectory failure policy: listing errors are logged and
    /// skipped, cancellation stops quietly, anything else propagates.
    fn absorb(&self, dir: &Path, result: Result<()>) -> Result<()> {
        match result {
            Ok(()) | Err(SortCopyError::Cancelled) => Ok(()),
            Err(e @ SortCopyError::DirectoryList { .. }) => {
                self.stats.dirs_failed.fetch_add(1, Ordering::Relaxed);
                error!("Skipping folder {}: {}", dir.display(), e);
                Ok(())
            }
            Err(e) => Err(e),
        }
    }

    fn skip_entry(&self, path: &Path, e: &std::io::Error) {
        self.stats.entries_skipped.fetch_add(1, Ordering::Relaxed);
        warn!("Skipping unreadable entry in {}: {}", path.display(), e);
    }

    fn is_excluded(&self, path: &Path) -> bool {
        let Some(excluded) = &self.excluded else {
            return false;
        };
        // Only pay for canonicalize when the name could match.
        path.file_name() == excluded.file_name()
            && path.canonicalize().map(|p| &p == excluded).unwrap_or(false)
    }
}
