//! Image alt-text coverage

use async_trait::async_trait;
use serde_json::json;

use sitewarden_core::{CapabilityError, CapabilityId};
use sitewarden_engine::{Capability, CapabilityContext, CapabilityOutput};

const MAX_LISTED: usize = 10;

/// Flags images without alternative text
pub struct ImageAnalyzer;

#[async_trait]
impl Capability for ImageAnalyzer {
    fn id(&self) -> CapabilityId {
        CapabilityId::Image
    }

    async fn compute(
        &self,
        ctx: CapabilityContext,
    ) -> Result<CapabilityOutput, CapabilityError> {
        let page = ctx.page()?;

        let missing: Vec<&str> = page
            .images
            .iter()
            .filter(|image| image.alt.is_none())
            .map(|image| image.src.as_str())
            .collect();

        let recommendation = if missing.is_empty() {
            None
        } else {
            Some(format!(
                "add alt text to {} of {} images",
                missing.len(),
                page.images.len()
            ))
        };

        Ok(CapabilityOutput::Analysis(json!({
            "total": page.images.len(),
            "missing_alt": missing.len(),
            "missing_alt_srcs": missing.iter().take(MAX_LISTED).collect::<Vec<_>>(),
            "recommendation": recommendation,
        })))
    }
}
