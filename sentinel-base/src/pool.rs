//! Recycling pool for token results.
//!
//! The pool is a free list of neutral [`ResultCell`]s behind a mutex. Leasing pops a cell
//! (or allocates one when the list is empty) and wraps it in a [`TokenResult`]. When the
//! result is surrendered the cell is reset first and only then pushed back under the
//! lock, so the next borrower always observes a neutral cell.

use std::borrow::Cow;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, LazyLock, Mutex, MutexGuard, PoisonError};

use crate::block::{BlockError, BlockType, SentinelRule, Snapshot};
use crate::config::ResultPoolConfig;
use crate::result::{ResultCell, TokenResult};

static GLOBAL: LazyLock<ResultPool> = LazyLock::new(|| {
    let config = ResultPoolConfig::from_env();
    tracing::debug!(
        max_idle = config.max_idle,
        prewarm = config.prewarm,
        "Initializing global token result pool"
    );
    ResultPool::new(config)
});

struct PoolShared {
    idle: Mutex<Vec<Box<ResultCell>>>,
    created: AtomicUsize,
    config: ResultPoolConfig,
}

/// Pool of reusable [`TokenResult`] cells.
///
/// Cloning is cheap and yields a handle to the same pool.
#[derive(Clone)]
pub struct ResultPool {
    shared: Arc<PoolShared>,
}

impl ResultPool {
    pub fn new(config: ResultPoolConfig) -> Self {
        let prewarm = config.prewarm.min(config.max_idle);
        let mut idle = Vec::with_capacity(prewarm);
        idle.resize_with(prewarm, Box::<ResultCell>::default);

        Self {
            shared: Arc::new(PoolShared {
                idle: Mutex::new(idle),
                created: AtomicUsize::new(prewarm),
                config,
            }),
        }
    }

    /// Process-wide pool, built from [`ResultPoolConfig::from_env`] on first use.
    pub fn global() -> &'static ResultPool {
        &GLOBAL
    }

    pub fn pass(&self) -> TokenResult {
        TokenResult::pooled(self.acquire(), self.clone())
    }

    pub fn blocked(
        &self,
        block_type: BlockType,
        block_msg: impl Into<Cow<'static, str>>,
    ) -> TokenResult {
        self.lease_blocked(BlockError::new(block_type, block_msg))
    }

    pub fn blocked_with_cause(
        &self,
        block_type: BlockType,
        block_msg: impl Into<Cow<'static, str>>,
        rule: Arc<dyn SentinelRule>,
        snapshot: Snapshot,
    ) -> TokenResult {
        self.lease_blocked(BlockError::with_cause(block_type, block_msg, rule, snapshot))
    }

    pub fn should_wait(&self, wait_ms: u64) -> TokenResult {
        let mut cell = self.acquire();
        cell.fill_should_wait(wait_ms);
        TokenResult::pooled(cell, self.clone())
    }

    fn lease_blocked(&self, err: BlockError) -> TokenResult {
        let mut cell = self.acquire();
        cell.fill_blocked(err);
        TokenResult::pooled(cell, self.clone())
    }

    fn acquire(&self) -> Box<ResultCell> {
        if let Some(cell) = self.lock_idle().pop() {
            return cell;
        }
        let created = self.shared.created.fetch_add(1, Ordering::Relaxed) + 1;
        tracing::trace!(created, "Result pool empty - allocating");
        Box::default()
    }

    pub(crate) fn release(&self, mut cell: Box<ResultCell>) {
        cell.reset();

        let mut idle = self.lock_idle();
        if idle.len() >= self.shared.config.max_idle {
            drop(idle);
            tracing::debug!(
                max_idle = self.shared.config.max_idle,
                "Result pool full - discarding returned result"
            );
            return;
        }
        idle.push(cell);
    }

    // Cells are reset before they are pushed, so a poisoned list is still consistent.
    fn lock_idle(&self) -> MutexGuard<'_, Vec<Box<ResultCell>>> {
        self.shared
            .idle
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    /// Results currently idle in the pool.
    pub fn idle(&self) -> usize {
        self.lock_idle().len()
    }

    /// Cells allocated by this pool over its lifetime, prewarmed ones included.
    pub fn created(&self) -> usize {
        self.shared.created.load(Ordering::Relaxed)
    }

    pub fn config(&self) -> &ResultPoolConfig {
        &self.shared.config
    }

    /// Free every idle cell. Returns how many were freed.
    pub fn drain(&self) -> usize {
        let drained = std::mem::take(&mut *self.lock_idle());
        drained.len()
    }
}

impl std::fmt::Debug for ResultPool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResultPool")
            .field("idle", &self.idle())
            .field("created", &self.created())
            .field("config", &self.shared.config)
            .finish()
    }
}
