//! sentinel-base: admission check results for flow control.
//!
//! Every guarded call gets one [`TokenResult`]: pass, blocked (with a [`BlockError`]
//! describing why), or should-wait (with a delay in milliseconds). Results are leased
//! from a [`ResultPool`] and go back to it when refurbished or dropped, so the hot pass
//! path does not allocate per call.
//!
//! ```
//! use sentinel_base::{BlockType, TokenResult};
//!
//! let result = TokenResult::blocked(BlockType::FlowControl, "qps exceeded");
//! if let Some(err) = result.block_error() {
//!     assert_eq!(err.block_type(), BlockType::FlowControl);
//! }
//! result.refurbish();
//! ```

mod block;
mod config;
mod error;
mod pool;
mod result;

#[cfg(test)]
mod testing;

pub use block::{BlockError, BlockType, SentinelRule, Snapshot};
pub use config::{MAX_IDLE_ENV, PREWARM_ENV, ResultPoolConfig};
pub use error::ConfigError;
pub use pool::ResultPool;
pub use result::{OutcomeSummary, TokenResult, TokenResultStatus, refurbish_token_result};
