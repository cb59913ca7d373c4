//! The uniform capability seam invoked by the executor

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use url::Url;

use sitewarden_core::{CapabilityError, CapabilityId, PageData};

/// Output of one capability execution
#[derive(Debug, Clone)]
pub enum CapabilityOutput {
    /// Produced by the crawl capability: the structured page data plus a
    /// summary payload for the result record
    Page { page: Arc<PageData>, summary: Value },
    /// Produced by every analysis capability
    Analysis(Value),
}

impl CapabilityOutput {
    /// The payload stored in the result record and attached to the
    /// completion event
    pub fn summary(&self) -> &Value {
        match self {
            Self::Page { summary, .. } => summary,
            Self::Analysis(value) => value,
        }
    }

    /// Split into the stored payload and, for crawl, the page data
    pub fn into_parts(self) -> (Value, Option<Arc<PageData>>) {
        match self {
            Self::Page { page, summary } => (summary, Some(page)),
            Self::Analysis(value) => (value, None),
        }
    }
}

/// Inputs available to one capability execution.
///
/// `prior` holds only the successful outputs of the capability's declared
/// hard dependencies; the coordinator never invokes a capability whose
/// dependencies did not all succeed.
#[derive(Clone)]
pub struct CapabilityContext {
    /// The URL being audited
    pub target: Url,
    page: Option<Arc<PageData>>,
    prior: Arc<BTreeMap<CapabilityId, Value>>,
}

impl CapabilityContext {
    /// Context with no page data and no prior results (stage 0)
    pub fn new(target: Url) -> Self {
        Self {
            target,
            page: None,
            prior: Arc::new(BTreeMap::new()),
        }
    }

    /// Attach crawled page data
    pub fn with_page(mut self, page: Arc<PageData>) -> Self {
        self.page = Some(page);
        self
    }

    /// Attach dependency outputs
    pub fn with_prior(mut self, prior: BTreeMap<CapabilityId, Value>) -> Self {
        self.prior = Arc::new(prior);
        self
    }

    /// The crawled page. Available to every capability scheduled after
    /// the root stage.
    pub fn page(&self) -> Result<&PageData, CapabilityError> {
        self.page.as_deref().ok_or(CapabilityError::PageUnavailable)
    }

    /// Successful output of a declared dependency
    pub fn dependency(&self, id: CapabilityId) -> Result<&Value, CapabilityError> {
        self.prior
            .get(&id)
            .ok_or(CapabilityError::MissingDependency(id))
    }
}

/// One independently invokable analysis unit.
///
/// Implementations must be side-effect free with respect to their
/// siblings: capabilities in the same stage run concurrently with no
/// ordering guarantee between them.
#[async_trait]
pub trait Capability: Send + Sync {
    /// The id this computation is bound to
    fn id(&self) -> CapabilityId;

    /// Run the analysis with the declared inputs
    async fn compute(&self, ctx: CapabilityContext) -> Result<CapabilityOutput, CapabilityError>;
}
