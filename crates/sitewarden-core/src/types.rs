//! Shared types for the audit pipeline

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::EngineError;

/// Identifier for one analysis capability.
///
/// The set is fixed in this system, but the registry and resolver only
/// require the ids to form a finite acyclic graph.
#[derive(
    Debug, Clone, Copy, Hash, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum CapabilityId {
    /// Fetches the target page; every other capability depends on it
    Crawl,
    /// Keyword extraction and density
    Keyword,
    /// Technical health checks
    Technical,
    /// Structured data (JSON-LD) analysis
    Schema,
    /// Image alt-text coverage
    Image,
    /// Content quality heuristics
    Content,
    /// Title and meta description checks
    Meta,
    /// Cross-check of technical findings
    Validation,
    /// Merged recommendations and overall score
    Report,
    /// Recurring-theme hints derived from the report
    Learning,
}

impl CapabilityId {
    /// All capability ids, in stable order
    pub const ALL: [CapabilityId; 10] = [
        CapabilityId::Crawl,
        CapabilityId::Keyword,
        CapabilityId::Technical,
        CapabilityId::Schema,
        CapabilityId::Image,
        CapabilityId::Content,
        CapabilityId::Meta,
        CapabilityId::Validation,
        CapabilityId::Report,
        CapabilityId::Learning,
    ];

    /// String form used on the wire and in the CLI
    pub fn as_str(&self) -> &'static str {
        match self {
            CapabilityId::Crawl => "crawl",
            CapabilityId::Keyword => "keyword",
            CapabilityId::Technical => "technical",
            CapabilityId::Schema => "schema",
            CapabilityId::Image => "image",
            CapabilityId::Content => "content",
            CapabilityId::Meta => "meta",
            CapabilityId::Validation => "validation",
            CapabilityId::Report => "report",
            CapabilityId::Learning => "learning",
        }
    }
}

impl fmt::Display for CapabilityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CapabilityId {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        CapabilityId::ALL
            .iter()
            .find(|id| id.as_str() == s)
            .copied()
            .ok_or_else(|| EngineError::UnknownCapability(s.to_string()))
    }
}

/// Why a capability's result is a failure
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    /// The capability itself failed (error, timeout or panic)
    Execution,
    /// A declared hard dependency recorded a failure; the capability
    /// was never invoked
    DependencyUnmet,
}

/// Details of a failed capability execution
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CapabilityFailure {
    pub kind: FailureKind,
    pub message: String,
}

/// Outcome of one capability for one target.
///
/// Absence from `Task::results` means the capability was never requested;
/// an explicit `Failure` means it was requested but did not produce output.
/// The two states are deliberately distinct.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResultRecord {
    /// Capability-specific output payload
    Success(serde_json::Value),
    /// Recorded failure; soft unless the capability is foundational
    Failure(CapabilityFailure),
}

impl ResultRecord {
    /// Build a success record
    pub fn success(output: serde_json::Value) -> Self {
        Self::Success(output)
    }

    /// Build an execution-failure record
    pub fn failure(message: impl Into<String>) -> Self {
        Self::Failure(CapabilityFailure {
            kind: FailureKind::Execution,
            message: message.into(),
        })
    }

    /// Build a dependency-unmet record naming the failed dependency
    pub fn dependency_unmet(dep: CapabilityId) -> Self {
        Self::Failure(CapabilityFailure {
            kind: FailureKind::DependencyUnmet,
            message: format!("dependency unmet: {dep}"),
        })
    }

    /// Check if this record is a success
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success(_))
    }

    /// The success payload, if any
    pub fn output(&self) -> Option<&serde_json::Value> {
        match self {
            Self::Success(value) => Some(value),
            Self::Failure(_) => None,
        }
    }

    /// The failure details, if any
    pub fn as_failure(&self) -> Option<&CapabilityFailure> {
        match self {
            Self::Success(_) => None,
            Self::Failure(failure) => Some(failure),
        }
    }
}

/// Lifecycle state of one audit task
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    /// Created but no stage has started
    Pending,
    /// First stage has started
    Running,
    /// All stages finished (optional capabilities may still have failed)
    Completed,
    /// A foundational capability failed or setup was unrecoverable
    Failed,
}

impl TaskStatus {
    /// Check if this status is terminal
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Failed)
    }
}

/// One audit task: a single target URL driven through the stage plan.
///
/// Owned exclusively by the coordinator processing it; results are
/// populated incrementally and never removed once written.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Task {
    /// Opaque unique identifier assigned at submission
    pub id: String,
    /// The URL being processed
    pub target: Url,
    /// Capability ids the caller asked for, before dependency expansion
    pub requested: BTreeSet<CapabilityId>,
    /// Lifecycle state
    pub status: TaskStatus,
    /// Per-capability outcomes, populated as stages complete
    pub results: BTreeMap<CapabilityId, ResultRecord>,
    pub created_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
}

impl Task {
    /// Create a pending task for a target
    pub fn new(target: Url, requested: BTreeSet<CapabilityId>) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            target,
            requested,
            status: TaskStatus::Pending,
            results: BTreeMap::new(),
            created_at: Utc::now(),
            completed_at: None,
        }
    }

    /// Record a capability outcome. The first write wins; records are
    /// append-only.
    pub fn record(&mut self, id: CapabilityId, record: ResultRecord) {
        self.results.entry(id).or_insert(record);
    }

    /// Mark the task running
    pub fn begin(&mut self) {
        self.status = TaskStatus::Running;
    }

    /// Mark the task completed
    pub fn complete(&mut self) {
        self.status = TaskStatus::Completed;
        self.completed_at = Some(Utc::now());
    }

    /// Mark the task failed
    pub fn fail(&mut self) {
        self.status = TaskStatus::Failed;
        self.completed_at = Some(Utc::now());
    }
}

/// A heading extracted from the page
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Heading {
    /// 1 for h1 through 6 for h6
    pub level: u8,
    pub text: String,
}

/// An image reference extracted from the page
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageRef {
    pub src: String,
    pub alt: Option<String>,
}

/// Structured page data produced by the crawl capability.
///
/// Opaque to the engine; analyzers read it through the capability context.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PageData {
    pub url: String,
    /// HTTP status of the fetch
    pub status: u16,
    pub title: Option<String>,
    pub description: Option<String>,
    pub canonical: Option<String>,
    pub headings: Vec<Heading>,
    pub links: Vec<String>,
    pub images: Vec<ImageRef>,
    /// Raw JSON-LD script blocks
    pub json_ld: Vec<String>,
    /// Visible text with tags stripped
    pub text: String,
    pub word_count: usize,
    pub fetched_at: DateTime<Utc>,
    pub elapsed_ms: u64,
}

impl PageData {
    /// Create an empty page record for a fetched URL
    pub fn new(url: impl Into<String>, status: u16) -> Self {
        Self {
            url: url.into(),
            status,
            title: None,
            description: None,
            canonical: None,
            headings: Vec::new(),
            links: Vec::new(),
            images: Vec::new(),
            json_ld: Vec::new(),
            text: String::new(),
            word_count: 0,
            fetched_at: Utc::now(),
            elapsed_ms: 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_capability_id_roundtrip() {
        for id in CapabilityId::ALL {
            let parsed: CapabilityId = id.as_str().parse().unwrap();
            assert_eq!(parsed, id);
        }
    }

    #[test]
    fn test_capability_id_unknown() {
        let err = "unheard-of".parse::<CapabilityId>().unwrap_err();
        assert!(matches!(err, EngineError::UnknownCapability(ref s) if s == "unheard-of"));
    }

    #[test]
    fn test_capability_id_display() {
        assert_eq!(CapabilityId::Meta.to_string(), "meta");
        assert_eq!(CapabilityId::Crawl.to_string(), "crawl");
    }

    #[test]
    fn test_result_record_accessors() {
        let ok = ResultRecord::success(serde_json::json!({"score": 80}));
        assert!(ok.is_success());
        assert!(ok.output().is_some());
        assert!(ok.as_failure().is_none());

        let failed = ResultRecord::failure("boom");
        assert!(!failed.is_success());
        assert_eq!(failed.as_failure().unwrap().kind, FailureKind::Execution);
    }

    #[test]
    fn test_dependency_unmet_is_distinct() {
        let unmet = ResultRecord::dependency_unmet(CapabilityId::Keyword);
        let failure = unmet.as_failure().unwrap();
        assert_eq!(failure.kind, FailureKind::DependencyUnmet);
        assert!(failure.message.contains("keyword"));
    }

    #[test]
    fn test_task_record_is_append_only() {
        let target: Url = "https://example.com".parse().unwrap();
        let mut task = Task::new(target, BTreeSet::new());

        task.record(CapabilityId::Crawl, ResultRecord::failure("first"));
        task.record(
            CapabilityId::Crawl,
            ResultRecord::success(serde_json::json!({})),
        );

        let record = &task.results[&CapabilityId::Crawl];
        assert!(!record.is_success());
    }

    #[test]
    fn test_task_lifecycle() {
        let target: Url = "https://example.com".parse().unwrap();
        let mut task = Task::new(target, BTreeSet::new());
        assert_eq!(task.status, TaskStatus::Pending);
        assert!(!task.status.is_terminal());

        task.begin();
        assert_eq!(task.status, TaskStatus::Running);

        task.complete();
        assert_eq!(task.status, TaskStatus::Completed);
        assert!(task.status.is_terminal());
        assert!(task.completed_at.is_some());
    }
}
