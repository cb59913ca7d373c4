//! Per-capability execution with failure containment

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use tracing::{debug, warn};

use sitewarden_core::{CapabilityId, PageData, ResultRecord};

use crate::capability::{Capability, CapabilityContext};
use crate::registry::CapabilityRegistry;

/// Terminal outcome of one capability execution.
///
/// `fatal` is the signal the coordinator uses to abort the task when a
/// foundational capability fails; for optional capabilities it is
/// always false.
#[derive(Debug, Clone)]
pub struct ExecutionVerdict {
    pub id: CapabilityId,
    pub record: ResultRecord,
    /// Page data produced by the crawl capability, if any
    pub page: Option<Arc<PageData>>,
    pub fatal: bool,
}

/// Invokes the computation bound to a capability id and converts every
/// failure mode into data. `run` never returns an error and never lets
/// one capability's failure reach its siblings.
pub struct CapabilityExecutor {
    registry: Arc<CapabilityRegistry>,
    bindings: HashMap<CapabilityId, Arc<dyn Capability>>,
    timeout: Duration,
}

impl CapabilityExecutor {
    /// Create an executor with no bindings
    pub fn new(registry: Arc<CapabilityRegistry>, timeout: Duration) -> Self {
        Self {
            registry,
            bindings: HashMap::new(),
            timeout,
        }
    }

    /// Bind a capability implementation to its id
    pub fn bind(&mut self, capability: Arc<dyn Capability>) {
        self.bindings.insert(capability.id(), capability);
    }

    /// Bind several capability implementations
    pub fn bind_all(&mut self, capabilities: impl IntoIterator<Item = Arc<dyn Capability>>) {
        for capability in capabilities {
            self.bind(capability);
        }
    }

    /// Check if a computation is bound for an id
    pub fn is_bound(&self, id: CapabilityId) -> bool {
        self.bindings.contains_key(&id)
    }

    /// Execute one capability. Errors, timeouts and missing bindings all
    /// become `Failure` records; no retries are attempted here.
    pub async fn run(&self, id: CapabilityId, ctx: CapabilityContext) -> ExecutionVerdict {
        let fatal_on_failure = self.registry.is_foundational(id).unwrap_or(false);

        let Some(capability) = self.bindings.get(&id) else {
            warn!(capability = %id, "no computation bound");
            return ExecutionVerdict {
                id,
                record: ResultRecord::failure(format!("no computation bound for '{id}'")),
                page: None,
                fatal: fatal_on_failure,
            };
        };

        let started = Instant::now();
        match tokio::time::timeout(self.timeout, capability.compute(ctx)).await {
            Ok(Ok(output)) => {
                debug!(
                    capability = %id,
                    elapsed_ms = started.elapsed().as_millis() as u64,
                    "capability succeeded"
                );
                let (summary, page) = output.into_parts();
                ExecutionVerdict {
                    id,
                    record: ResultRecord::success(summary),
                    page,
                    fatal: false,
                }
            }
            Ok(Err(err)) => {
                warn!(capability = %id, error = %err, "capability failed");
                ExecutionVerdict {
                    id,
                    record: ResultRecord::failure(err.to_string()),
                    page: None,
                    fatal: fatal_on_failure,
                }
            }
            Err(_) => {
                warn!(capability = %id, timeout_secs = self.timeout.as_secs(), "capability timed out");
                ExecutionVerdict {
                    id,
                    record: ResultRecord::failure(format!(
                        "timed out after {}s",
                        self.timeout.as_secs()
                    )),
                    page: None,
                    fatal: fatal_on_failure,
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{FailingAnalysis, StaticAnalysis, StubCrawl};
    use sitewarden_core::FailureKind;

    fn executor(capabilities: Vec<Arc<dyn Capability>>) -> CapabilityExecutor {
        let registry = Arc::new(CapabilityRegistry::standard());
        let mut executor = CapabilityExecutor::new(registry, Duration::from_secs(5));
        executor.bind_all(capabilities);
        executor
    }

    fn ctx() -> CapabilityContext {
        CapabilityContext::new("https://ok.example".parse().unwrap())
    }

    #[tokio::test]
    async fn test_run_success() {
        let executor = executor(vec![Arc::new(StaticAnalysis::new(
            CapabilityId::Keyword,
            serde_json::json!({"terms": 3}),
        ))]);

        let verdict = executor.run(CapabilityId::Keyword, ctx()).await;
        assert!(verdict.record.is_success());
        assert!(!verdict.fatal);
        assert!(verdict.page.is_none());
    }

    #[tokio::test]
    async fn test_run_crawl_yields_page() {
        let executor = executor(vec![Arc::new(StubCrawl::ok())]);

        let verdict = executor.run(CapabilityId::Crawl, ctx()).await;
        assert!(verdict.record.is_success());
        assert!(verdict.page.is_some());
    }

    #[tokio::test]
    async fn test_run_failure_is_contained() {
        let executor = executor(vec![Arc::new(FailingAnalysis::new(
            CapabilityId::Technical,
            "probe exploded",
        ))]);

        let verdict = executor.run(CapabilityId::Technical, ctx()).await;
        let failure = verdict.record.as_failure().unwrap();
        assert_eq!(failure.kind, FailureKind::Execution);
        assert!(failure.message.contains("probe exploded"));
        assert!(!verdict.fatal, "technical is optional");
    }

    #[tokio::test]
    async fn test_foundational_failure_is_fatal() {
        let executor = executor(vec![Arc::new(StubCrawl::failing())]);

        let verdict = executor.run(CapabilityId::Crawl, ctx()).await;
        assert!(!verdict.record.is_success());
        assert!(verdict.fatal);
    }

    #[tokio::test]
    async fn test_unbound_capability_fails_softly() {
        let executor = executor(vec![]);

        let verdict = executor.run(CapabilityId::Image, ctx()).await;
        assert!(!verdict.record.is_success());
        assert!(!verdict.fatal);
    }

    #[tokio::test(start_paused = true)]
    async fn test_timeout_becomes_failure() {
        struct Stalls;

        #[async_trait::async_trait]
        impl Capability for Stalls {
            fn id(&self) -> CapabilityId {
                CapabilityId::Schema
            }

            async fn compute(
                &self,
                _ctx: CapabilityContext,
            ) -> Result<crate::capability::CapabilityOutput, sitewarden_core::CapabilityError>
            {
                tokio::time::sleep(Duration::from_secs(600)).await;
                Ok(crate::capability::CapabilityOutput::Analysis(
                    serde_json::json!({}),
                ))
            }
        }

        let executor = executor(vec![Arc::new(Stalls)]);
        let verdict = executor.run(CapabilityId::Schema, ctx()).await;

        let failure = verdict.record.as_failure().unwrap();
        assert!(failure.message.contains("timed out"));
    }
}
