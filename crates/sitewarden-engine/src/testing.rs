//! Capability doubles shared across engine tests

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::{json, Value};

use sitewarden_core::{CapabilityError, CapabilityId, PageData};

use crate::capability::{Capability, CapabilityContext, CapabilityOutput};
use crate::executor::CapabilityExecutor;
use crate::registry::CapabilityRegistry;

/// Crawl stand-in; can fail unconditionally or for one host
pub struct StubCrawl {
    fail_all: bool,
    fail_host: Option<String>,
}

impl StubCrawl {
    pub fn ok() -> Self {
        Self {
            fail_all: false,
            fail_host: None,
        }
    }

    pub fn failing() -> Self {
        Self {
            fail_all: true,
            fail_host: None,
        }
    }

    pub fn failing_for(host: impl Into<String>) -> Self {
        Self {
            fail_all: false,
            fail_host: Some(host.into()),
        }
    }
}

#[async_trait]
impl Capability for StubCrawl {
    fn id(&self) -> CapabilityId {
        CapabilityId::Crawl
    }

    async fn compute(&self, ctx: CapabilityContext) -> Result<CapabilityOutput, CapabilityError> {
        let host = ctx.target.host_str().unwrap_or_default().to_string();
        if self.fail_all || self.fail_host.as_deref() == Some(host.as_str()) {
            return Err(CapabilityError::Fetch(format!("connection refused: {host}")));
        }

        let mut page = PageData::new(ctx.target.to_string(), 200);
        page.title = Some("Stub page".to_string());
        page.word_count = 120;
        Ok(CapabilityOutput::Page {
            page: Arc::new(page),
            summary: json!({"status": 200, "url": ctx.target.to_string()}),
        })
    }
}

/// Returns a fixed payload
pub struct StaticAnalysis {
    id: CapabilityId,
    value: Value,
}

impl StaticAnalysis {
    pub fn new(id: CapabilityId, value: Value) -> Self {
        Self { id, value }
    }
}

#[async_trait]
impl Capability for StaticAnalysis {
    fn id(&self) -> CapabilityId {
        self.id
    }

    async fn compute(&self, _ctx: CapabilityContext) -> Result<CapabilityOutput, CapabilityError> {
        Ok(CapabilityOutput::Analysis(self.value.clone()))
    }
}

/// Always fails with a fixed message
pub struct FailingAnalysis {
    id: CapabilityId,
    message: String,
}

impl FailingAnalysis {
    pub fn new(id: CapabilityId, message: impl Into<String>) -> Self {
        Self {
            id,
            message: message.into(),
        }
    }
}

#[async_trait]
impl Capability for FailingAnalysis {
    fn id(&self) -> CapabilityId {
        self.id
    }

    async fn compute(&self, _ctx: CapabilityContext) -> Result<CapabilityOutput, CapabilityError> {
        Err(CapabilityError::Analysis(self.message.clone()))
    }
}

/// Counts invocations; used to assert a capability was never called
pub struct CountingAnalysis {
    id: CapabilityId,
    calls: Arc<AtomicUsize>,
}

impl CountingAnalysis {
    pub fn new(id: CapabilityId, calls: Arc<AtomicUsize>) -> Self {
        Self { id, calls }
    }
}

#[async_trait]
impl Capability for CountingAnalysis {
    fn id(&self) -> CapabilityId {
        self.id
    }

    async fn compute(&self, _ctx: CapabilityContext) -> Result<CapabilityOutput, CapabilityError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(CapabilityOutput::Analysis(json!({})))
    }
}

/// Executor with the given bindings and a generous test timeout
pub fn executor_with(
    registry: Arc<CapabilityRegistry>,
    capabilities: Vec<Arc<dyn Capability>>,
) -> Arc<CapabilityExecutor> {
    let mut executor = CapabilityExecutor::new(registry, Duration::from_secs(30));
    executor.bind_all(capabilities);
    Arc::new(executor)
}
