use std::sync::{Arc, Mutex, RwLock};

use subtle::ConstantTimeEq;
use tokio::sync::mpsc;
use zeroize::Zeroizing;

use crate::codec::{self, Params};
use crate::config::Config;
use crate::context::Context;
use crate::error::{Error, Result};
use crate::hasher::{self, Hasher};
use crate::worker::{self, Pool, RehashCallback, RehashJob};

/// Password hashing engine with best-effort background upgrades of stale hashes.
///
/// `hash` and `verify` run on the caller's thread. Upgrades run on a fixed pool
/// of `workers` threads fed by a queue of the same capacity; when the queue is
/// full the upgrade is skipped.
pub struct Engine {
    config: Config,
    hasher: Arc<Hasher>,
    queue: RwLock<Option<mpsc::Sender<RehashJob>>>,
    pool: Mutex<Option<Pool>>,
}

impl Engine {
    /// Build an engine and start its workers. `None` uses `Config::default()`.
    pub fn new(config: Option<Config>) -> Result<Self> {
        let config = config.unwrap_or_default();
        config.validate()?;

        let hasher = Arc::new(Hasher::new(&config));
        let (tx, rx) = mpsc::channel(config.workers);
        let pool = worker::run_pool(hasher.clone(), rx, config.workers)
            .map_err(|e| Error::Internal(format!("Failed to start rehash pool: {e}")))?;

        Ok(Self {
            config,
            hasher,
            queue: RwLock::new(Some(tx)),
            pool: Mutex::new(Some(pool)),
        })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Work factors applied to new hashes.
    pub fn params(&self) -> Params {
        self.hasher.params()
    }

    pub fn hash(&self, password: &str) -> Result<String> {
        self.hasher.hash(password)
    }

    /// Check `password` against a stored hash.
    ///
    /// A wrong password is `Ok(false)`, not an error. On a match, if
    /// `auto_rehash` is set and the stored work factors differ from the current
    /// ones, an upgrade is queued and `callback` later receives the new hash.
    /// The upgrade is dropped silently when the queue is full or shut down.
    ///
    /// `ctx` is checked before and after the derivation; once it is done the
    /// call returns `Error::Cancelled` without comparing digests.
    pub fn verify(
        &self,
        ctx: &Context,
        password: &str,
        encoded: &str,
        auto_rehash: bool,
        callback: Option<RehashCallback>,
    ) -> Result<bool> {
        let stored = codec::decode(encoded)?;

        if ctx.is_done() {
            return Err(Error::Cancelled);
        }

        let computed = hasher::derive(
            password.as_bytes(),
            &stored.salt,
            &stored.params,
            stored.digest.len(),
        )?;

        if ctx.is_done() {
            return Err(Error::Cancelled);
        }

        if !bool::from(computed.as_slice().ct_eq(stored.digest.as_slice())) {
            return Ok(false);
        }

        let upgrade = auto_rehash && stored.params != self.params();
        if let Some(callback) = callback.filter(|_| upgrade) {
            self.enqueue(RehashJob {
                password: Zeroizing::new(password.to_string()),
                callback,
            });
        }

        Ok(true)
    }

    /// Whether a stored hash was made with different work factors than the current ones.
    pub fn needs_rehash(&self, encoded: &str) -> Result<bool> {
        let stored = codec::decode(encoded)?;
        Ok(stored.params != self.params())
    }

    /// Stop accepting upgrades and wait for queued and running ones to finish.
    /// Safe to call more than once.
    ///
    /// From inside a rehash callback (including dropping the last handle there)
    /// the queue is closed but the call does not wait; the pool drains and exits
    /// on its own once the callback returns.
    pub fn shutdown(&self) {
        let sender = match self.queue.write() {
            Ok(mut queue) => queue.take(),
            Err(poisoned) => poisoned.into_inner().take(),
        };
        drop(sender);

        let pool = match self.pool.lock() {
            Ok(mut pool) => pool.take(),
            Err(poisoned) => poisoned.into_inner().take(),
        };

        if let Some(pool) = pool {
            pool.join();
        }
    }

    fn enqueue(&self, job: RehashJob) {
        let queue = match self.queue.read() {
            Ok(queue) => queue,
            Err(poisoned) => poisoned.into_inner(),
        };

        let Some(sender) = queue.as_ref() else {
            tracing::debug!("Rehash queue closed, skipping upgrade");
            return;
        };

        match sender.try_send(job) {
            Ok(()) => {}
            Err(mpsc::error::TrySendError::Full(_)) => {
                tracing::debug!("Rehash queue full, skipping upgrade");
            }
            Err(mpsc::error::TrySendError::Closed(_)) => {
                tracing::debug!("Rehash queue closed, skipping upgrade");
            }
        }
    }
}

impl Drop for Engine {
    fn drop(&mut self) {
        self.shutdown();
    }
}

impl std::fmt::Debug for Engine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Engine")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}
