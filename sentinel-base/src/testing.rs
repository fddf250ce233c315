//! Shared fixtures for unit tests.

use std::fmt;

use crate::block::SentinelRule;

#[derive(Debug)]
pub(crate) struct TestRule {
    resource: String,
    id: Option<String>,
}

impl TestRule {
    pub(crate) fn new(resource: &str) -> Self {
        Self {
            resource: resource.to_string(),
            id: None,
        }
    }

    pub(crate) fn with_id(resource: &str, id: &str) -> Self {
        Self {
            resource: resource.to_string(),
            id: Some(id.to_string()),
        }
    }
}

impl fmt::Display for TestRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TestRule{{resource={}}}", self.resource)
    }
}

impl SentinelRule for TestRule {
    fn resource_name(&self) -> &str {
        &self.resource
    }

    fn rule_id(&self) -> Option<&str> {
        self.id.as_deref()
    }
}

/// Route library logs through the test harness. Honors `RUST_LOG`.
pub(crate) fn init_test_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}
