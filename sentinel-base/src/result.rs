//! Admission check outcomes.
//!
//! A [`TokenResult`] is a uniquely owned handle to a pooled cell. Constructors borrow a
//! neutral cell from a [`ResultPool`] and fill it; dropping or refurbishing the handle
//! resets the cell and hands it back. Because surrendering the handle consumes it, a
//! result cannot be read after it has gone back to the pool.

use std::borrow::Cow;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;

use crate::block::{BlockError, BlockType, SentinelRule, Snapshot};
use crate::pool::ResultPool;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize)]
pub enum TokenResultStatus {
    /// Proceed unconditionally.
    #[default]
    Pass,
    /// Reject the call.
    Blocked,
    /// Proceed only after the wait time has elapsed.
    ShouldWait,
}

impl TokenResultStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pass => "Pass",
            Self::Blocked => "Blocked",
            Self::ShouldWait => "ShouldWait",
        }
    }
}

impl fmt::Display for TokenResultStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Recyclable state behind a [`TokenResult`].
///
/// Every `fill_*` writes all three fields, so a cell never carries a block error and a
/// wait time at once.
#[derive(Debug, Default)]
pub(crate) struct ResultCell {
    status: TokenResultStatus,
    block_err: Option<BlockError>,
    wait_ms: u64,
}

static NEUTRAL: ResultCell = ResultCell {
    status: TokenResultStatus::Pass,
    block_err: None,
    wait_ms: 0,
};

impl ResultCell {
    pub(crate) fn reset(&mut self) {
        self.status = TokenResultStatus::Pass;
        self.block_err = None;
        self.wait_ms = 0;
    }

    pub(crate) fn is_neutral(&self) -> bool {
        self.status == TokenResultStatus::Pass && self.block_err.is_none() && self.wait_ms == 0
    }

    pub(crate) fn fill_blocked(&mut self, err: BlockError) {
        self.status = TokenResultStatus::Blocked;
        self.block_err = Some(err);
        self.wait_ms = 0;
    }

    pub(crate) fn fill_should_wait(&mut self, wait_ms: u64) {
        self.status = TokenResultStatus::ShouldWait;
        self.block_err = None;
        self.wait_ms = wait_ms;
    }
}

/// Outcome of one admission check.
pub struct TokenResult {
    cell: Option<Box<ResultCell>>,
    home: Option<ResultPool>,
}

impl TokenResult {
    pub(crate) fn pooled(cell: Box<ResultCell>, pool: ResultPool) -> Self {
        debug_assert!(
            cell.status != TokenResultStatus::Pass || cell.is_neutral(),
            "pass result leased with leftover payload"
        );
        Self {
            cell: Some(cell),
            home: Some(pool),
        }
    }

    /// Fresh, unpooled pass result. Dropping it frees the allocation.
    pub fn empty() -> Self {
        Self {
            cell: Some(Box::default()),
            home: None,
        }
    }

    /// Pass result from the process-wide pool.
    pub fn pass() -> Self {
        ResultPool::global().pass()
    }

    /// Blocked result from the process-wide pool.
    pub fn blocked(block_type: BlockType, block_msg: impl Into<Cow<'static, str>>) -> Self {
        ResultPool::global().blocked(block_type, block_msg)
    }

    /// Blocked result from the process-wide pool, recording the rule that fired.
    pub fn blocked_with_cause(
        block_type: BlockType,
        block_msg: impl Into<Cow<'static, str>>,
        rule: Arc<dyn SentinelRule>,
        snapshot: Snapshot,
    ) -> Self {
        ResultPool::global().blocked_with_cause(block_type, block_msg, rule, snapshot)
    }

    /// Wait result from the process-wide pool. `wait_ms` is taken as given.
    pub fn should_wait(wait_ms: u64) -> Self {
        ResultPool::global().should_wait(wait_ms)
    }

    fn cell(&self) -> &ResultCell {
        self.cell.as_deref().unwrap_or(&NEUTRAL)
    }

    pub fn status(&self) -> TokenResultStatus {
        self.cell().status
    }

    pub fn is_pass(&self) -> bool {
        self.status() == TokenResultStatus::Pass
    }

    pub fn is_blocked(&self) -> bool {
        self.status() == TokenResultStatus::Blocked
    }

    pub fn is_should_wait(&self) -> bool {
        self.status() == TokenResultStatus::ShouldWait
    }

    pub fn block_error(&self) -> Option<&BlockError> {
        self.cell().block_err.as_ref()
    }

    pub fn wait_ms(&self) -> u64 {
        self.cell().wait_ms
    }

    pub fn wait_duration(&self) -> Duration {
        Duration::from_millis(self.wait_ms())
    }

    /// Whether this result goes back to a pool when surrendered.
    pub fn is_pooled(&self) -> bool {
        self.home.is_some()
    }

    /// Move the block error out. The result itself still returns to its pool.
    pub fn into_block_error(mut self) -> Option<BlockError> {
        self.cell.as_mut().and_then(|cell| cell.block_err.take())
    }

    /// Structured view of the outcome for logging and metrics.
    pub fn summary(&self) -> OutcomeSummary<'_> {
        let block_err = self.block_error();
        let rule = block_err.and_then(BlockError::triggered_rule);
        OutcomeSummary {
            status: self.status(),
            block_type: block_err.map(BlockError::block_type),
            block_msg: block_err.map(BlockError::block_msg).filter(|msg| !msg.is_empty()),
            rule_resource: rule.map(|rule| rule.resource_name()),
            rule_id: rule.and_then(|rule| rule.rule_id()),
            wait_ms: self.wait_ms(),
        }
    }

    /// Reset this result and return it to its pool.
    ///
    /// The handle is consumed, so it cannot be used again:
    ///
    /// ```compile_fail
    /// use sentinel_base::TokenResult;
    ///
    /// let result = TokenResult::should_wait(5);
    /// result.refurbish();
    /// let _ = result.wait_ms();
    /// ```
    pub fn refurbish(self) {
        drop(self);
    }

    #[cfg(test)]
    pub(crate) fn cell_addr(&self) -> usize {
        self.cell
            .as_deref()
            .map_or(0, |cell| cell as *const ResultCell as usize)
    }
}

impl Drop for TokenResult {
    fn drop(&mut self) {
        if let (Some(cell), Some(pool)) = (self.cell.take(), self.home.as_ref()) {
            pool.release(cell);
        }
    }
}

/// Refurbish `result` if there is one.
pub fn refurbish_token_result(result: Option<TokenResult>) {
    if let Some(result) = result {
        result.refurbish();
    }
}

impl fmt::Display for TokenResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TokenResult{{status={}, blockErr=", self.status())?;
        match self.block_error() {
            Some(err) => write!(f, "{err}")?,
            None => f.write_str("none")?,
        }
        write!(f, ", waitMs={}}}", self.wait_ms())
    }
}

impl fmt::Debug for TokenResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenResult")
            .field("status", &self.status())
            .field("block_err", &self.block_error())
            .field("wait_ms", &self.wait_ms())
            .field("pooled", &self.is_pooled())
            .finish()
    }
}

/// Borrowed, serializable view of a [`TokenResult`].
#[derive(Debug, Clone, Copy, Serialize)]
pub struct OutcomeSummary<'a> {
    pub status: TokenResultStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub block_type: Option<BlockType>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub block_msg: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rule_resource: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rule_id: Option<&'a str>,
    pub wait_ms: u64,
}
