//! Copy worker pool
//!
//! A fixed set of named worker threads pulling copy tasks from an unbounded
//! crossbeam channel. Submitting never blocks, so walkers can enqueue files
//! freely while the pool caps I/O concurrency.
//!
//! Lifecycle: `Accepting` until [`CopyPool::shutdown_and_wait`] drops the
//! sender (`Draining`); workers exit once the channel is empty and
//! disconnected, and the pool is `Closed` after every worker is joined.
//! Concurrent shutdown callers all wait for `Closed`.

use crate::core::CancellationToken;
use crate::error::{Result, SortCopyError};
use crate::fs::{copy_into_bucket, BucketLayout};
use crossbeam::channel::{unbounded, Receiver, Sender};
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Condvar, Mutex, MutexGuard, RwLock};
use std::thread::{self, JoinHandle};
use tracing::{debug, error, info};

/// A single file waiting to be copied
#[derive(Debug, Clone)]
pub struct CopyTask {
    /// Unique task ID
    pub id: u64,
    /// Source file path
    pub source: PathBuf,
}

/// Anything that accepts copy requests from a walker
pub trait CopySink: Sync {
    /// Queue a file for copying. Fire-and-forget: copy failures are logged
    /// by the sink, only a refused submission is an error.
    fn submit(&self, source: PathBuf) -> Result<()>;
}

/// Pool lifecycle state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PoolState {
    /// Accepting new tasks
    Accepting,
    /// No new tasks; finishing queued and in-flight ones
    Draining,
    /// All workers have exited
    Closed,
}

/// A copy that failed
#[derive(Debug, Clone)]
pub struct CopyFailure {
    /// Source file
    pub source: PathBuf,
    /// Error description
    pub error: String,
}

/// Live pool counters
#[derive(Debug, Default)]
struct PoolStats {
    /// Tasks accepted
    submitted: AtomicU64,
    /// Tasks copied successfully
    copied: AtomicU64,
    /// Tasks that failed
    failed: AtomicU64,
    /// Tasks skipped after cancellation
    skipped: AtomicU64,
    /// Total bytes copied
    bytes_copied: AtomicU64,
    failures: Mutex<Vec<CopyFailure>>,
}

impl PoolStats {
    fn record_success(&self, bytes: u64) {
        self.copied.fetch_add(1, Ordering::Relaxed);
        self.bytes_copied.fetch_add(bytes, Ordering::Relaxed);
    }

    fn record_failure(&self, source: PathBuf, error: &SortCopyError) {
        self.failed.fetch_add(1, Ordering::Relaxed);
        if let Ok(mut failures) = self.failures.lock() {
            failures.push(CopyFailure {
                source,
                error: error.to_string(),
            });
        }
    }

    /// Tasks finished one way or another
    fn finished(&self) -> u64 {
        self.copied.load(Ordering::Relaxed)
            + self.failed.load(Ordering::Relaxed)
            + self.skipped.load(Ordering::Relaxed)
    }

    fn snapshot(&self) -> PoolReport {
        PoolReport {
            submitted: self.submitted.load(Ordering::Relaxed),
            copied: self.copied.load(Ordering::Relaxed),
            failed: self.failed.load(Ordering::Relaxed),
            skipped: self.skipped.load(Ordering::Relaxed),
            bytes_copied: self.bytes_copied.load(Ordering::Relaxed),
            failures: self
                .failures
                .lock()
                .map(|failures| failures.clone())
                .unwrap_or_default(),
        }
    }
}

/// Final pool counters
#[derive(Debug, Clone, Default)]
pub struct PoolReport {
    /// Tasks accepted
    pub submitted: u64,
    /// Tasks copied successfully
    pub copied: u64,
    /// Tasks that failed
    pub failed: u64,
    /// Tasks skipped after cancellation
    pub skipped: u64,
    /// Total bytes copied
    pub bytes_copied: u64,
    /// Failed copies with their causes
    pub failures: Vec<CopyFailure>,
}

struct Lifecycle {
    state: PoolState,
    workers: Vec<JoinHandle<()>>,
}

/// Fixed-capacity pool of copy workers
pub struct CopyPool {
    // Read-locked by submitters, write-locked once to begin draining.
    sender: RwLock<Option<Sender<CopyTask>>>,
    lifecycle: Mutex<Lifecycle>,
    closed: Condvar,
    stats: Arc<PoolStats>,
    next_task_id: AtomicU64,
}

impl CopyPool {
    /// Start `workers` copy threads writing into `layout`
    pub fn new(workers: usize, layout: BucketLayout, cancel: CancellationToken) -> Result<Self> {
        if workers == 0 {
            return Err(SortCopyError::config("copy pool needs at least one worker"));
        }

        let (sender, receiver) = unbounded();
        let layout = Arc::new(layout);
        let stats = Arc::new(PoolStats::default());

        let mut handles = Vec::with_capacity(workers);
        for worker_id in 0..workers {
            let receiver = receiver.clone();
            let layout = Arc::clone(&layout);
            let stats = Arc::clone(&stats);
            let cancel = cancel.clone();

            let spawned = thread::Builder::new()
                .name(format!("copy-worker-{}", worker_id))
                .spawn(move || run_worker(worker_id, receiver, &layout, &cancel, &stats));

            match spawned {
                Ok(handle) => handles.push(handle),
                Err(e) => {
                    // Disconnect so the workers already started can exit.
                    drop(sender);
                    for handle in handles {
                        let _ = handle.join();
                    }
                    return Err(SortCopyError::ThreadPoolError(format!(
                        "failed to spawn copy worker {}: {}",
                        worker_id, e
                    )));
                }
            }
        }

        debug!(workers, output = %layout.output_root().display(), "Copy pool started");

        Ok(Self {
            sender: RwLock::new(Some(sender)),
            lifecycle: Mutex::new(Lifecycle {
                state: PoolState::Accepting,
                workers: handles,
            }),
            closed: Condvar::new(),
            stats,
            next_task_id: AtomicU64::new(0),
        })
    }

    /// Current lifecycle state
    pub fn state(&self) -> Result<PoolState> {
        Ok(self.lock()?.state)
    }

    /// Stop accepting tasks and block until every queued task has run.
    ///
    /// Every caller blocks until the pool is `Closed`; only the first one
    /// joins the workers.
    pub fn shutdown_and_wait(&self) -> Result<PoolReport> {
        self.sender
            .write()
            .map_err(|_| poisoned())?
            .take();

        let workers = {
            let mut lifecycle = self.lock()?;
            let state = lifecycle.state;
            match state {
                PoolState::Accepting => {
                    lifecycle.state = PoolState::Draining;
                    debug!(pending = self.pending(), "Copy pool draining");
                    std::mem::take(&mut lifecycle.workers)
                }
                PoolState::Draining => {
                    let _closed = self
                        .closed
                        .wait_while(lifecycle, |l| l.state != PoolState::Closed)
                        .map_err(|_| poisoned())?;
                    return Ok(self.stats.snapshot());
                }
                PoolState::Closed => return Ok(self.stats.snapshot()),
            }
        };

        let mut panicked = 0usize;
        for handle in workers {
            if handle.join().is_err() {
                panicked += 1;
            }
        }

        self.lock()?.state = PoolState::Closed;
        self.closed.notify_all();
        debug!("Copy pool closed");

        if panicked > 0 {
            return Err(SortCopyError::ThreadPoolError(format!(
                "{} copy worker(s) panicked",
                panicked
            )));
        }

        Ok(self.stats.snapshot())
    }

    fn pending(&self) -> u64 {
        self.stats
            .submitted
            .load(Ordering::Relaxed)
            .saturating_sub(self.stats.finished())
    }

    fn lock(&self) -> Result<MutexGuard<'_, Lifecycle>> {
        self.lifecycle.lock().map_err(|_| poisoned())
    }
}

fn poisoned() -> SortCopyError {
    SortCopyError::ThreadPoolError("pool state lock poisoned".to_string())
}

impl CopySink for CopyPool {
    fn submit(&self, source: PathBuf) -> Result<()> {
        let sender = self.sender.read().map_err(|_| poisoned())?;
        let sender = sender.as_ref().ok_or(SortCopyError::PoolClosed)?;

        let task = CopyTask {
            id: self.next_task_id.fetch_add(1, Ordering::Relaxed),
            source,
        };
        self.stats.submitted.fetch_add(1, Ordering::Relaxed);
        sender.send(task).map_err(|_| SortCopyError::PoolClosed)
    }
}

impl Drop for CopyPool {
    fn drop(&mut self) {
        let _ = self.shutdown_and_wait();
    }
}

fn run_worker(
    worker_id: usize,
    receiver: Receiver<CopyTask>,
    layout: &BucketLayout,
    cancel: &CancellationToken,
    stats: &PoolStats,
) {
    for task in receiver.iter() {
        if cancel.is_cancelled() {
            stats.skipped.fetch_add(1, Ordering::Relaxed);
            debug!(worker = worker_id, task = task.id, "Skipped {}", task.source.display());
            continue;
        }

        match copy_into_bucket(layout, &task.source) {
            Ok(copied) => {
                stats.record_success(copied.bytes_copied);
                info!(
                    worker = worker_id,
                    task = task.id,
                    "Copied: {} to {}",
                    copied.source.display(),
                    copied.destination.display()
                );
            }
            Err(e) => {
                error!(worker = worker_id, task = task.id, "{}", e);
                stats.record_failure(task.source, &e);
            }
        }
    }

    debug!("Copy worker {} shutting down", worker_id);
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn pool_into(dir: &TempDir, workers: usize) -> CopyPool {
        let layout = BucketLayout::new(dir.path().join("dist"), "noext");
        CopyPool::new(workers, layout, CancellationToken::new()).unwrap()
    }

    #[test]
    fn test_copies_every_submitted_file() {
        let src = TempDir::new().unwrap();
        let dst = TempDir::new().unwrap();
        let pool = pool_into(&dst, 8);

        for i in 0..50 {
            let file = src.path().join(format!("file_{}.txt", i));
            std::fs::write(&file, format!("content {}", i)).unwrap();
            pool.submit(file).unwrap();
        }

        let report = pool.shutdown_and_wait().unwrap();
        assert_eq!(report.submitted, 50);
        assert_eq!(report.copied, 50);
        assert_eq!(report.failed, 0);

        for i in 0..50 {
            let copied = dst.path().join(format!("dist/txt/file_{}.txt", i));
            assert_eq!(std::fs::read_to_string(copied).unwrap(), format!("content {}", i));
        }
    }

    #[test]
    fn test_failure_is_isolated() {
        let src = TempDir::new().unwrap();
        let dst = TempDir::new().unwrap();
        let pool = pool_into(&dst, 2);

        let good = src.path().join("good.md");
        std::fs::write(&good, b"# ok").unwrap();

        pool.submit(src.path().join("missing.md")).unwrap();
        pool.submit(good).unwrap();

        let report = pool.shutdown_and_wait().unwrap();
        assert_eq!(report.copied, 1);
        assert_eq!(report.failed, 1);
        assert_eq!(report.failures[0].source, src.path().join("missing.md"));
        assert!(dst.path().join("dist/md/good.md").exists());
    }

    #[test]
    fn test_submit_after_shutdown_is_refused() {
        let dst = TempDir::new().unwrap();
        let pool = pool_into(&dst, 1);

        assert_eq!(pool.state().unwrap(), PoolState::Accepting);
        pool.shutdown_and_wait().unwrap();
        assert_eq!(pool.state().unwrap(), PoolState::Closed);

        let err = pool.submit(PathBuf::from("late.txt")).unwrap_err();
        assert!(matches!(err, SortCopyError::PoolClosed));
    }

    #[test]
    fn test_shutdown_is_idempotent() {
        let dst = TempDir::new().unwrap();
        let pool = pool_into(&dst, 3);

        let first = pool.shutdown_and_wait().unwrap();
        let second = pool.shutdown_and_wait().unwrap();
        assert_eq!(first.submitted, second.submitted);
    }

    #[test]
    fn test_concurrent_shutdown_waits_for_drain() {
        let src = TempDir::new().unwrap();
        let dst = TempDir::new().unwrap();
        let pool = pool_into(&dst, 1);

        let payload = vec![0x5Au8; 1024 * 1024];
        for i in 0..40 {
            let file = src.path().join(format!("chunk_{}.bin", i));
            std::fs::write(&file, &payload).unwrap();
            pool.submit(file).unwrap();
        }

        std::thread::scope(|scope| {
            let first = scope.spawn(|| pool.shutdown_and_wait().unwrap());
            std::thread::sleep(std::time::Duration::from_millis(5));

            let second = pool.shutdown_and_wait().unwrap();
            assert_eq!(second.copied, 40);
            assert_eq!(pool.state().unwrap(), PoolState::Closed);

            assert_eq!(first.join().unwrap().copied, 40);
        });
    }

    #[test]
    fn test_submit_from_many_threads() {
        let src = TempDir::new().unwrap();
        let dst = TempDir::new().unwrap();
        let pool = pool_into(&dst, 4);

        std::thread::scope(|scope| {
            for t in 0..8 {
                let pool = &pool;
                let dir = src.path();
                scope.spawn(move || {
                    for i in 0..10 {
                        let file = dir.join(format!("t{}_{}.csv", t, i));
                        std::fs::write(&file, b"a,b").unwrap();
                        pool.submit(file).unwrap();
                    }
                });
            }
        });

        let report = pool.shutdown_and_wait().unwrap();
        assert_eq!(report.submitted, 80);
        assert_eq!(report.copied, 80);
        assert_eq!(std::fs::read_dir(dst.path().join("dist/csv")).unwrap().count(), 80);
    }

    #[test]
    fn test_cancelled_pool_skips_queued_tasks() {
        let src = TempDir::new().unwrap();
        let dst = TempDir::new().unwrap();
        let cancel = CancellationToken::new();
        cancel.cancel();

        let layout = BucketLayout::new(dst.path().join("dist"), "noext");
        let pool = CopyPool::new(2, layout, cancel).unwrap();

        for i in 0..5 {
            let file = src.path().join(format!("{}.bin", i));
            std::fs::write(&file, b"x").unwrap();
            pool.submit(file).unwrap();
        }

        let report = pool.shutdown_and_wait().unwrap();
        assert_eq!(report.skipped, 5);
        assert_eq!(report.copied, 0);
        assert!(!dst.path().join("dist").exists());
    }

    #[test]
    fn test_zero_workers_rejected() {
        let dst = TempDir::new().unwrap();
        let layout = BucketLayout::new(dst.path(), "noext");
        assert!(CopyPool::new(0, layout, CancellationToken::new()).is_err());
    }
}
