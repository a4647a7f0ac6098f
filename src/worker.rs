use std::cell::Cell;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::thread::JoinHandle;

use tokio::sync::{Mutex, mpsc};
use zeroize::Zeroizing;

use crate::hasher::Hasher;

/// Receives the upgraded hash. Runs on a worker thread, possibly concurrently
/// with other callbacks.
pub type RehashCallback = Box<dyn FnOnce(String) + Send + 'static>;

pub struct RehashJob {
    pub password: Zeroizing<String>,
    pub callback: RehashCallback,
}

type SharedReceiver = Arc<Mutex<mpsc::Receiver<RehashJob>>>;

static NEXT_POOL_ID: AtomicUsize = AtomicUsize::new(1);

thread_local! {
    /// Id of the pool owning the current thread, if any.
    static CURRENT_POOL: Cell<Option<usize>> = const { Cell::new(None) };
}

/// Handle to a running rehash pool.
#[derive(Debug)]
pub struct Pool {
    id: usize,
    thread: JoinHandle<()>,
}

impl Pool {
    /// Wait for the pool to drain and exit.
    ///
    /// Called from one of the pool's own threads (a callback dropping the last
    /// engine handle) it returns at once: the pool finishes after the current
    /// job returns, and waiting here would never end.
    pub fn join(self) {
        if CURRENT_POOL.with(Cell::get) == Some(self.id) {
            tracing::debug!("Rehash pool {} stopping from its own thread, not waiting", self.id);
            return;
        }

        if self.thread.join().is_err() {
            tracing::error!("Rehash worker pool {} panicked during shutdown", self.id);
        }
    }
}

/// Start the rehash pool on a dedicated Tokio runtime with its own threads.
/// The pool exits once every sender is dropped and the queue is drained.
pub fn run_pool(
    hasher: Arc<Hasher>,
    jobs: mpsc::Receiver<RehashJob>,
    worker_count: usize,
) -> std::io::Result<Pool> {
    let id = NEXT_POOL_ID.fetch_add(1, Ordering::Relaxed);
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(worker_count)
        .thread_name("rehash-worker")
        .on_thread_start(move || CURRENT_POOL.with(|pool| pool.set(Some(id))))
        .build()?;

    let thread = std::thread::Builder::new()
        .name("rehash-pool".into())
        .spawn(move || {
            CURRENT_POOL.with(|pool| pool.set(Some(id)));
            let jobs: SharedReceiver = Arc::new(Mutex::new(jobs));

            runtime.block_on(async {
                let mut handles = Vec::with_capacity(worker_count);

                for id in 0..worker_count {
                    handles.push(tokio::spawn(run(id, hasher.clone(), jobs.clone())));
                }

                tracing::info!("Rehash worker pool started ({worker_count} workers)");

                for (worker, handle) in handles.into_iter().enumerate() {
                    if let Err(e) = handle.await {
                        tracing::error!("Rehash worker {worker} ended abnormally: {e}");
                    }
                }

                tracing::info!("Rehash worker pool stopped");
            });
        })?;

    Ok(Pool { id, thread })
}

/// A single worker loop. Ends when the queue is closed and empty.
async fn run(id: usize, hasher: Arc<Hasher>, jobs: SharedReceiver) {
    tracing::debug!("Rehash worker {id} started");

    loop {
        // Hold the lock only while waiting, so other workers can pick up the next job.
        let job = jobs.lock().await.recv().await;
        let Some(job) = job else {
            break;
        };

        process(id, hasher.clone(), job).await;
    }

    tracing::debug!("Rehash worker {id} stopped");
}

async fn process(id: usize, hasher: Arc<Hasher>, job: RehashJob) {
    let result = tokio::task::spawn_blocking(move || {
        let RehashJob { password, callback } = job;
        match hasher.hash(&password) {
            Ok(encoded) => {
                drop(password);
                callback(encoded);
                true
            }
            Err(e) => {
                tracing::warn!("Rehash failed, dropping job: {e}");
                false
            }
        }
    })
    .await;

    match result {
        Ok(true) => tracing::debug!("Worker {id} delivered upgraded hash"),
        Ok(false) => {}
        Err(e) => tracing::error!("Worker {id} rehash task aborted: {e}"),
    }
}
