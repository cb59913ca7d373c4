//! Dependency resolution into concurrent execution stages

use std::collections::{BTreeMap, BTreeSet};

use sitewarden_core::{CapabilityId, EngineError};
use tracing::debug;

use crate::registry::CapabilityRegistry;

/// Ordered list of stages for one task.
///
/// Every capability in stage *k* depends only on capabilities in stages
/// `0..k`, so all capabilities within a stage can run concurrently.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutionPlan {
    stages: Vec<Vec<CapabilityId>>,
}

impl ExecutionPlan {
    /// Resolve a requested capability set into a stage plan.
    ///
    /// The requested set is expanded with every transitive hard
    /// dependency, the registry's root capability is force-included,
    /// and the closure is grouped by dependency depth. An empty request
    /// resolves to a single stage containing only the root.
    pub fn resolve(
        registry: &CapabilityRegistry,
        requested: &BTreeSet<CapabilityId>,
    ) -> Result<Self, EngineError> {
        // Transitive closure over hard dependencies
        let mut closure: BTreeSet<CapabilityId> = BTreeSet::new();
        let mut pending: Vec<CapabilityId> = requested.iter().copied().collect();
        pending.push(registry.root());

        while let Some(id) = pending.pop() {
            if closure.insert(id) {
                pending.extend(registry.dependencies_of(id)?.iter().copied());
            }
        }

        // Topological order via Kahn's algorithm, restricted to the
        // closure. The registry invariant should rule out cycles; this
        // defends against a misconfigured table anyway.
        let mut in_degree: BTreeMap<CapabilityId, usize> = BTreeMap::new();
        let mut queue: Vec<CapabilityId> = Vec::new();
        for &id in &closure {
            let degree = registry.dependencies_of(id)?.len();
            in_degree.insert(id, degree);
            if degree == 0 {
                queue.push(id);
            }
        }

        let mut sorted: Vec<CapabilityId> = Vec::with_capacity(closure.len());
        let mut cursor = 0usize;
        while cursor < queue.len() {
            let id = queue[cursor];
            cursor += 1;
            sorted.push(id);

            for &other in &closure {
                if registry.dependencies_of(other)?.contains(&id) {
                    let degree = in_degree.get_mut(&other).expect("closure member");
                    *degree -= 1;
                    if *degree == 0 {
                        queue.push(other);
                    }
                }
            }
        }

        if sorted.len() != closure.len() {
            let cyclic: Vec<String> = closure
                .iter()
                .filter(|id| !sorted.contains(id))
                .map(|id| id.to_string())
                .collect();
            return Err(EngineError::DependencyCycle(cyclic.join(", ")));
        }

        // Group by dependency depth: a capability's stage is one past
        // the deepest of its dependencies.
        let mut depth: BTreeMap<CapabilityId, usize> = BTreeMap::new();
        for &id in &sorted {
            let stage = registry
                .dependencies_of(id)?
                .iter()
                .filter_map(|dep| depth.get(dep))
                .max()
                .map(|d| d + 1)
                .unwrap_or(0);
            depth.insert(id, stage);
        }

        let stage_count = depth.values().max().map(|d| d + 1).unwrap_or(0);
        let mut stages: Vec<Vec<CapabilityId>> = vec![Vec::new(); stage_count];
        for &id in &closure {
            stages[depth[&id]].push(id);
        }

        debug!(
            requested = requested.len(),
            resolved = closure.len(),
            stages = stages.len(),
            "execution plan resolved"
        );

        Ok(Self { stages })
    }

    /// The ordered stages
    pub fn stages(&self) -> &[Vec<CapabilityId>] {
        &self.stages
    }

    /// Total number of capabilities across all stages
    pub fn total(&self) -> usize {
        self.stages.iter().map(Vec::len).sum()
    }

    /// Check if a capability is part of the plan
    pub fn contains(&self, id: CapabilityId) -> bool {
        self.stages.iter().any(|stage| stage.contains(&id))
    }

    /// Human-readable stage listing
    pub fn describe(&self, registry: &CapabilityRegistry) -> String {
        let mut out = String::new();
        for (index, stage) in self.stages.iter().enumerate() {
            out.push_str(&format!(
                "Stage {} ({} capabilit{}):\n",
                index,
                stage.len(),
                if stage.len() == 1 { "y" } else { "ies" }
            ));
            for id in stage {
                let deps: Vec<String> = registry
                    .dependencies_of(*id)
                    .map(|deps| deps.iter().map(|d| d.to_string()).collect())
                    .unwrap_or_default();
                if deps.is_empty() {
                    out.push_str(&format!("  {id}\n"));
                } else {
                    out.push_str(&format!("  {} (after: {})\n", id, deps.join(", ")));
                }
            }
        }
        out
    }
}
