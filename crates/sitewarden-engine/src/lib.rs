//! Sitewarden Engine - audit orchestration
//!
//! Given a target URL (or a list expanded from a sitemap) and a
//! requested capability set, the engine resolves hard dependencies
//! into concurrent stages, executes each stage with per-capability
//! failure isolation, streams ordered progress events to a single
//! observer and aggregates all outputs into one result record per
//! target.

pub mod aggregate;
pub mod capability;
pub mod coordinator;
pub mod driver;
pub mod executor;
pub mod plan;
pub mod progress;
pub mod registry;

#[cfg(test)]
pub(crate) mod testing;

pub use aggregate::{AuditSummary, ResultAggregator};
pub use capability::{Capability, CapabilityContext, CapabilityOutput};
pub use coordinator::TaskCoordinator;
pub use driver::{AuditOutcome, MultiTargetDriver};
pub use executor::{CapabilityExecutor, ExecutionVerdict};
pub use plan::ExecutionPlan;
pub use progress::{
    ChannelEmitter, CollectingSink, ProgressEvent, ProgressKind, ProgressSink, TracingSink,
    WindowedSink,
};
pub use registry::{CapabilityDescriptor, CapabilityRegistry};
