//! Result aggregation

use std::collections::BTreeMap;

use serde::Serialize;

use sitewarden_core::{CapabilityId, FailureKind, ResultRecord, Task, TaskStatus};

use crate::registry::CapabilityRegistry;

/// Per-target classification of every registered capability.
///
/// "Not requested" (no entry in the task's results) and "failed"
/// (explicit `Failure` record) are distinct states and stay distinct
/// here.
#[derive(Debug, Clone, Serialize)]
pub struct AuditSummary {
    pub target: String,
    pub status: TaskStatus,
    pub succeeded: Vec<CapabilityId>,
    pub failed: Vec<CapabilityId>,
    pub unmet: Vec<CapabilityId>,
    pub not_requested: Vec<CapabilityId>,
}

/// Merges per-capability outputs for a completed task
pub struct ResultAggregator;

impl ResultAggregator {
    /// Snapshot of the task's keyed result map
    pub fn merge(task: &Task) -> BTreeMap<CapabilityId, ResultRecord> {
        task.results.clone()
    }

    /// Classify every registered capability for a task
    pub fn summarize(registry: &CapabilityRegistry, task: &Task) -> AuditSummary {
        let mut summary = AuditSummary {
            target: task.target.to_string(),
            status: task.status,
            succeeded: Vec::new(),
            failed: Vec::new(),
            unmet: Vec::new(),
            not_requested: Vec::new(),
        };

        for id in registry.all_ids() {
            match task.results.get(&id) {
                None => summary.not_requested.push(id),
                Some(ResultRecord::Success(_)) => summary.succeeded.push(id),
                Some(ResultRecord::Failure(failure)) => match failure.kind {
                    FailureKind::DependencyUnmet => summary.unmet.push(id),
                    FailureKind::Execution => summary.failed.push(id),
                },
            }
        }

        summary
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;

    #[test]
    fn test_summarize_keeps_states_distinct() {
        let registry = CapabilityRegistry::standard();
        let mut task = Task::new(
            "https://example.com".parse().unwrap(),
            BTreeSet::from([CapabilityId::Meta]),
        );
        task.record(
            CapabilityId::Crawl,
            ResultRecord::success(serde_json::json!({})),
        );
        task.record(CapabilityId::Keyword, ResultRecord::failure("no terms"));
        task.record(
            CapabilityId::Meta,
            ResultRecord::dependency_unmet(CapabilityId::Keyword),
        );
        task.complete();

        let summary = ResultAggregator::summarize(&registry, &task);
        assert_eq!(summary.succeeded, vec![CapabilityId::Crawl]);
        assert_eq!(summary.failed, vec![CapabilityId::Keyword]);
        assert_eq!(summary.unmet, vec![CapabilityId::Meta]);
        assert_eq!(summary.not_requested.len(), 7);
        assert!(!summary.not_requested.contains(&CapabilityId::Meta));
    }

    #[test]
    fn test_merge_is_a_snapshot() {
        let mut task = Task::new("https://example.com".parse().unwrap(), BTreeSet::new());
        task.record(
            CapabilityId::Crawl,
            ResultRecord::success(serde_json::json!({"status": 200})),
        );

        let merged = ResultAggregator::merge(&task);
        assert_eq!(merged.len(), 1);
        assert!(merged[&CapabilityId::Crawl].is_success());
    }
}
