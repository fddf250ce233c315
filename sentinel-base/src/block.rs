//! Block causes: why an admission check rejected a call.
//!
//! A [`BlockError`] names the category of the rejection ([`BlockType`]), carries a
//! message, and optionally the rule that fired together with a snapshot of that
//! rule's evaluation state. Rules and snapshots are produced by the rule engine;
//! this module stores and forwards them without looking inside.

use std::any::Any;
use std::borrow::Cow;
use std::fmt;
use std::sync::Arc;

use serde::{Serialize, Serializer};

/// Category of an admission failure.
///
/// Raw codes map onto the known variants with [`BlockType::from`]; any other code is
/// kept as [`BlockType::Other`] so newer rule kinds still render.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum BlockType {
    #[default]
    Unknown,
    /// Rejected by a rate/flow rule.
    FlowControl,
    /// Rejected because a circuit is open.
    CircuitBreaking,
    /// Rejected by system-level load shedding.
    SystemFlow,
    /// A code outside the known set. Build it with `BlockType::from(code)`.
    Other(i32),
}

impl BlockType {
    pub fn code(&self) -> i32 {
        match self {
            Self::Unknown => 0,
            Self::FlowControl => 1,
            Self::CircuitBreaking => 2,
            Self::SystemFlow => 3,
            Self::Other(code) => *code,
        }
    }

    /// Display name for known variants, `None` for [`BlockType::Other`].
    pub fn name(&self) -> Option<&'static str> {
        match self {
            Self::Unknown => Some("Unknown"),
            Self::FlowControl => Some("FlowControl"),
            Self::CircuitBreaking => Some("CircuitBreaking"),
            Self::SystemFlow => Some("System"),
            Self::Other(_) => None,
        }
    }
}

impl From<i32> for BlockType {
    fn from(code: i32) -> Self {
        match code {
            0 => Self::Unknown,
            1 => Self::FlowControl,
            2 => Self::CircuitBreaking,
            3 => Self::SystemFlow,
            other => Self::Other(other),
        }
    }
}

impl fmt::Display for BlockType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.name() {
            Some(name) => f.write_str(name),
            None => write!(f, "{}", self.code()),
        }
    }
}

impl Serialize for BlockType {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// A configured rule that can reject calls.
///
/// `Display` is the rule's human-readable description.
pub trait SentinelRule: fmt::Display + fmt::Debug + Send + Sync {
    /// Resource the rule guards.
    fn resource_name(&self) -> &str;

    /// Stable identifier of the rule, if the rule source assigns one.
    fn rule_id(&self) -> Option<&str> {
        None
    }
}

/// Rule-specific evaluation state captured when a call was blocked.
pub type Snapshot = Arc<dyn Any + Send + Sync>;

/// Why a call was blocked.
///
/// Cloning shares the triggering rule and snapshot rather than copying them.
#[derive(Debug, Clone, thiserror::Error)]
#[error("SentinelBlockError: {block_type}{}", MessageSuffix(.block_msg))]
pub struct BlockError {
    block_type: BlockType,
    block_msg: Cow<'static, str>,
    rule: Option<Arc<dyn SentinelRule>>,
    snapshot: Option<Snapshot>,
}

impl BlockError {
    pub fn new(block_type: BlockType, block_msg: impl Into<Cow<'static, str>>) -> Self {
        Self {
            block_type,
            block_msg: block_msg.into(),
            rule: None,
            snapshot: None,
        }
    }

    /// Block error that records the rule that fired and its state at decision time.
    pub fn with_cause(
        block_type: BlockType,
        block_msg: impl Into<Cow<'static, str>>,
        rule: Arc<dyn SentinelRule>,
        snapshot: Snapshot,
    ) -> Self {
        Self {
            block_type,
            block_msg: block_msg.into(),
            rule: Some(rule),
            snapshot: Some(snapshot),
        }
    }

    pub fn block_type(&self) -> BlockType {
        self.block_type
    }

    pub fn block_msg(&self) -> &str {
        &self.block_msg
    }

    pub fn triggered_rule(&self) -> Option<&Arc<dyn SentinelRule>> {
        self.rule.as_ref()
    }

    pub fn triggered_value(&self) -> Option<&Snapshot> {
        self.snapshot.as_ref()
    }

    /// Snapshot downcast to the concrete type the rule stored, if it matches.
    pub fn triggered_value_as<T: Any>(&self) -> Option<&T> {
        self.snapshot.as_deref()?.downcast_ref::<T>()
    }
}

struct MessageSuffix<'a>(&'a str);

impl fmt::Display for MessageSuffix<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.is_empty() {
            Ok(())
        } else {
            write!(f, ", message: {}", self.0)
        }
    }
}
