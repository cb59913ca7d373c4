//! Capability registry — declared dependencies and failure semantics

use std::collections::{BTreeMap, BTreeSet, VecDeque};

use sitewarden_core::{CapabilityId, EngineError};

/// Static description of one capability: its hard dependencies and
/// whether its failure is fatal to the whole task.
#[derive(Debug, Clone)]
pub struct CapabilityDescriptor {
    /// Capability identifier
    pub id: CapabilityId,
    /// Capabilities whose results must be available before this one runs
    pub hard_dependencies: BTreeSet<CapabilityId>,
    /// If true, this capability's failure aborts the target
    pub foundational: bool,
}

impl CapabilityDescriptor {
    /// Create a descriptor with no dependencies
    pub fn new(id: CapabilityId) -> Self {
        Self {
            id,
            hard_dependencies: BTreeSet::new(),
            foundational: false,
        }
    }

    /// Add hard dependencies
    pub fn with_dependencies(mut self, deps: impl IntoIterator<Item = CapabilityId>) -> Self {
        self.hard_dependencies.extend(deps);
        self
    }

    /// Mark the capability foundational
    pub fn foundational(mut self) -> Self {
        self.foundational = true;
        self
    }
}

/// Read-only table of capability descriptors.
///
/// Built once at startup, validated before any task starts, then safe
/// for unsynchronized concurrent reads.
#[derive(Debug, Clone)]
pub struct CapabilityRegistry {
    descriptors: BTreeMap<CapabilityId, CapabilityDescriptor>,
    root: CapabilityId,
}

impl CapabilityRegistry {
    /// Build a registry from descriptors. Call [`validate`](Self::validate)
    /// before use.
    pub fn new(
        root: CapabilityId,
        descriptors: impl IntoIterator<Item = CapabilityDescriptor>,
    ) -> Self {
        Self {
            descriptors: descriptors.into_iter().map(|d| (d.id, d)).collect(),
            root,
        }
    }

    /// The built-in registry covering the full capability vocabulary.
    ///
    /// Crawl is the designated root and the only foundational capability.
    pub fn standard() -> Self {
        use CapabilityId::*;
        Self::new(
            Crawl,
            [
                CapabilityDescriptor::new(Crawl).foundational(),
                CapabilityDescriptor::new(Keyword).with_dependencies([Crawl]),
                CapabilityDescriptor::new(Technical).with_dependencies([Crawl]),
                CapabilityDescriptor::new(Schema).with_dependencies([Crawl]),
                CapabilityDescriptor::new(Image).with_dependencies([Crawl]),
                CapabilityDescriptor::new(Content).with_dependencies([Crawl, Keyword]),
                CapabilityDescriptor::new(Meta).with_dependencies([Crawl, Keyword]),
                CapabilityDescriptor::new(Validation).with_dependencies([Crawl, Technical]),
                CapabilityDescriptor::new(Report)
                    .with_dependencies([Crawl, Keyword, Technical, Meta]),
                CapabilityDescriptor::new(Learning).with_dependencies([Crawl, Report]),
            ],
        )
    }

    /// Validate the registry: every referenced dependency must be
    /// registered and the dependency graph must be acyclic.
    pub fn validate(&self) -> Result<(), EngineError> {
        self.get(self.root)?;

        for descriptor in self.descriptors.values() {
            for dep in &descriptor.hard_dependencies {
                if !self.descriptors.contains_key(dep) {
                    return Err(EngineError::UnknownCapability(dep.to_string()));
                }
            }
        }

        // Kahn's algorithm over the full table
        let mut in_degree: BTreeMap<CapabilityId, usize> = BTreeMap::new();
        let mut queue: VecDeque<CapabilityId> = VecDeque::new();
        for (id, descriptor) in &self.descriptors {
            let degree = descriptor.hard_dependencies.len();
            in_degree.insert(*id, degree);
            if degree == 0 {
                queue.push_back(*id);
            }
        }

        let mut visited = 0usize;
        while let Some(id) = queue.pop_front() {
            visited += 1;
            for (other, descriptor) in &self.descriptors {
                if descriptor.hard_dependencies.contains(&id) {
                    let degree = in_degree.get_mut(other).expect("registered id");
                    *degree -= 1;
                    if *degree == 0 {
                        queue.push_back(*other);
                    }
                }
            }
        }

        if visited != self.descriptors.len() {
            let cyclic: Vec<String> = in_degree
                .iter()
                .filter(|(_, degree)| **degree > 0)
                .map(|(id, _)| id.to_string())
                .collect();
            return Err(EngineError::DependencyCycle(cyclic.join(", ")));
        }

        Ok(())
    }

    /// Look up a descriptor
    pub fn get(&self, id: CapabilityId) -> Result<&CapabilityDescriptor, EngineError> {
        self.descriptors
            .get(&id)
            .ok_or_else(|| EngineError::UnknownCapability(id.to_string()))
    }

    /// Hard dependencies of a capability
    pub fn dependencies_of(&self, id: CapabilityId) -> Result<&BTreeSet<CapabilityId>, EngineError> {
        self.get(id).map(|d| &d.hard_dependencies)
    }

    /// Whether a capability's failure aborts the task
    pub fn is_foundational(&self, id: CapabilityId) -> Result<bool, EngineError> {
        self.get(id).map(|d| d.foundational)
    }

    /// All registered capability ids
    pub fn all_ids(&self) -> BTreeSet<CapabilityId> {
        self.descriptors.keys().copied().collect()
    }

    /// The designated root capability, force-included in every plan
    pub fn root(&self) -> CapabilityId {
        self.root
    }

    /// Check if a capability is registered
    pub fn contains(&self, id: CapabilityId) -> bool {
        self.descriptors.contains_key(&id)
    }
}
