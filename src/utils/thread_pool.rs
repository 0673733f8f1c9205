use once_cell::sync::OnceCell;
use rayon::ThreadPoolBuilder;
use std::sync::Arc;

/// Upper bound on default workers; digesting is I/O bound and more threads
/// than this mostly contend on the disk.
const DEFAULT_MAX_WORKERS: usize = 8;

static HASH_POOL: OnceCell<Arc<rayon::ThreadPool>> = OnceCell::new();

/// Build the shared hashing pool with a fixed number of workers.
///
/// Only the first call wins; later calls fail because the pool is
/// process-wide and already serving scans.
///
/// # Errors
///
/// Returns an error if the pool cannot be built or was already initialized.
pub fn init_hash_pool(workers: usize) -> anyhow::Result<()> {
    let pool = build_pool(workers.max(1))?;

    HASH_POOL
        .set(Arc::new(pool))
        .map_err(|_| anyhow::anyhow!("Hash worker pool already initialized"))?;

    tracing::debug!(workers, "Initialized hash worker pool");
    Ok(())
}

/// Get the shared hashing pool, creating it with CPU-bounded defaults if
/// nothing configured it first.
///
/// # Panics
///
/// Panics if the operating system refuses to spawn any worker thread.
pub fn hash_pool() -> Arc<rayon::ThreadPool> {
    HASH_POOL
        .get_or_init(|| {
            let pool = build_pool(default_workers()).expect("Failed to create hash worker pool");
            Arc::new(pool)
        })
        .clone()
}

/// Run a closure inside the hashing pool so its `par_iter` calls are bounded
/// by the configured worker count.
pub fn run_in_pool<F, R>(f: F) -> R
where
    F: FnOnce() -> R + Send,
    R: Send,
{
    hash_pool().install(f)
}

/// Configure the pool from the loaded configuration.
///
/// # Errors
///
/// Returns an error if the pool has already been initialized.
pub fn configure_from_config(config: &crate::config::Config) -> anyhow::Result<()> {
    if config.performance.parallel_threads > 0 {
        init_hash_pool(config.performance.parallel_threads)?;
    }
    Ok(())
}

/// Default worker count: available CPUs, capped.
#[must_use]
pub fn default_workers() -> usize {
    std::thread::available_parallelism()
        .map(std::num::NonZeroUsize::get)
        .unwrap_or(1)
        .min(DEFAULT_MAX_WORKERS)
}

fn build_pool(workers: usize) -> Result<rayon::ThreadPool, rayon::ThreadPoolBuildError> {
    ThreadPoolBuilder::new()
        .num_threads(workers)
        .thread_name(|i| format!("witness-worker-{i}"))
        .build()
}
