//! Sequential multi-target job driver

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use tracing::{info, warn};
use url::Url;

use sitewarden_core::{CapabilityId, EngineError, Task, TaskStatus};

use crate::coordinator::TaskCoordinator;
use crate::executor::CapabilityExecutor;
use crate::plan::ExecutionPlan;
use crate::progress::{ProgressEvent, ProgressSink, WindowedSink};
use crate::registry::CapabilityRegistry;

/// Final result of a multi-target job: one task per target, keyed by URL
#[derive(Debug, Clone, Default)]
pub struct AuditOutcome {
    pub tasks: BTreeMap<String, Task>,
}

impl AuditOutcome {
    /// Number of targets whose task failed fatally
    pub fn failed_targets(&self) -> usize {
        self.tasks
            .values()
            .filter(|task| task.status == TaskStatus::Failed)
            .count()
    }

    /// Number of recorded capability failures across all targets
    pub fn failed_capabilities(&self) -> usize {
        self.tasks
            .values()
            .flat_map(|task| task.results.values())
            .filter(|record| !record.is_success())
            .count()
    }
}

/// Runs one coordinator per target, strictly sequentially, rescaling
/// each target's progress into its share of the overall 0-100 range.
///
/// Sequential processing bounds concurrent outbound fetches to one
/// target's stage width; one target's fatal failure never aborts the
/// remaining targets.
pub struct MultiTargetDriver {
    registry: Arc<CapabilityRegistry>,
    executor: Arc<CapabilityExecutor>,
    sink: Arc<dyn ProgressSink>,
}

impl MultiTargetDriver {
    pub fn new(
        registry: Arc<CapabilityRegistry>,
        executor: Arc<CapabilityExecutor>,
        sink: Arc<dyn ProgressSink>,
    ) -> Self {
        Self {
            registry,
            executor,
            sink,
        }
    }

    /// Audit every target with the same requested capability set.
    ///
    /// Fails fast on registry misconfiguration before any task starts;
    /// per-target failures are recorded in the outcome instead.
    pub async fn run(
        &self,
        targets: &[Url],
        requested: &BTreeSet<CapabilityId>,
    ) -> Result<AuditOutcome, EngineError> {
        if targets.is_empty() {
            return Err(EngineError::NoTargets);
        }
        let plan = ExecutionPlan::resolve(&self.registry, requested)?;

        self.sink
            .publish(ProgressEvent::targets_discovered(targets.len()));
        info!(targets = targets.len(), capabilities = plan.total(), "audit job started");

        let total = targets.len();
        let mut outcome = AuditOutcome::default();

        for (index, target) in targets.iter().enumerate() {
            let base = (index * 100 / total) as u8;
            let next = ((index + 1) * 100 / total) as u8;
            let window: Arc<dyn ProgressSink> = Arc::new(WindowedSink::new(
                Arc::clone(&self.sink),
                base,
                next - base,
            ));

            let coordinator = TaskCoordinator::new(
                Arc::clone(&self.registry),
                Arc::clone(&self.executor),
                window,
            );
            let task = coordinator
                .run(target.clone(), requested.clone(), &plan)
                .await;

            if task.status == TaskStatus::Failed {
                warn!(target = %target, "target failed, continuing with remaining targets");
            }
            outcome.tasks.insert(target.to_string(), task);
        }

        info!(
            targets = total,
            failed = outcome.failed_targets(),
            "audit job finished"
        );
        self.sink
            .publish(ProgressEvent::complete("all targets processed"));
        self.sink.close();
        Ok(outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::progress::{CollectingSink, ProgressKind};
    use crate::testing::{executor_with, StaticAnalysis, StubCrawl};

    fn driver(
        capabilities: Vec<Arc<dyn crate::capability::Capability>>,
    ) -> (MultiTargetDriver, Arc<CollectingSink>) {
        let registry = Arc::new(CapabilityRegistry::standard());
        let executor = executor_with(Arc::clone(&registry), capabilities);
        let sink = Arc::new(CollectingSink::default());
        (
            MultiTargetDriver::new(registry, executor, sink.clone()),
            sink,
        )
    }

    fn targets(urls: &[&str]) -> Vec<Url> {
        urls.iter().map(|u| u.parse().unwrap()).collect()
    }

    #[tokio::test]
    async fn test_failed_target_does_not_stop_the_job() {
        let (driver, sink) = driver(vec![
            Arc::new(StubCrawl::failing_for("b.example")),
            Arc::new(StaticAnalysis::new(
                CapabilityId::Technical,
                serde_json::json!({"score": 90}),
            )),
        ]);

        let outcome = driver
            .run(
                &targets(&["https://a.example", "https://b.example", "https://c.example"]),
                &[CapabilityId::Technical].into_iter().collect(),
            )
            .await
            .unwrap();

        assert_eq!(outcome.tasks.len(), 3);
        assert_eq!(outcome.failed_targets(), 1);
        assert_eq!(
            outcome.tasks["https://b.example/"].status,
            TaskStatus::Failed
        );
        assert_eq!(
            outcome.tasks["https://a.example/"].status,
            TaskStatus::Completed
        );
        assert_eq!(
            outcome.tasks["https://c.example/"].status,
            TaskStatus::Completed
        );

        // Both surviving targets end with a local Complete inside their
        // window; the job adds one more at 100.
        let completes: Vec<u8> = sink
            .events()
            .iter()
            .filter(|e| e.kind == ProgressKind::Complete)
            .map(|e| e.percent)
            .collect();
        assert_eq!(completes, vec![33, 100, 100]);
    }

    #[tokio::test]
    async fn test_progress_windows_are_monotonic_across_targets() {
        let (driver, sink) = driver(vec![
            Arc::new(StubCrawl::ok()),
            Arc::new(StaticAnalysis::new(
                CapabilityId::Keyword,
                serde_json::json!({}),
            )),
        ]);

        driver
            .run(
                &targets(&["https://a.example", "https://b.example"]),
                &[CapabilityId::Keyword].into_iter().collect(),
            )
            .await
            .unwrap();

        let events = sink.events();
        let mut last = 0u8;
        for event in &events {
            assert!(event.percent >= last, "percent regressed: {event:?}");
            last = event.percent;
        }
    }

    #[tokio::test]
    async fn test_targets_discovered_is_published_first() {
        let (driver, sink) = driver(vec![Arc::new(StubCrawl::ok())]);

        driver
            .run(&targets(&["https://a.example"]), &BTreeSet::new())
            .await
            .unwrap();

        let first = &sink.events()[0];
        assert_eq!(first.kind, ProgressKind::TargetsDiscovered);
        assert_eq!(first.message, "1");
    }

    #[tokio::test]
    async fn test_empty_target_list_is_an_error() {
        let (driver, _) = driver(vec![Arc::new(StubCrawl::ok())]);

        let err = driver.run(&[], &BTreeSet::new()).await.unwrap_err();
        assert!(matches!(err, EngineError::NoTargets));
    }
}
