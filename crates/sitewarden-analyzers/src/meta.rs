//! Meta tag quality: title and description checks

use async_trait::async_trait;
use serde_json::json;

use sitewarden_core::{CapabilityError, CapabilityId};
use sitewarden_engine::{Capability, CapabilityContext, CapabilityOutput};

const TITLE_RANGE: std::ops::RangeInclusive<usize> = 10..=60;
const DESCRIPTION_RANGE: std::ops::RangeInclusive<usize> = 50..=160;

/// Checks title and meta-description length and keyword alignment
pub struct MetaAnalyzer;

#[async_trait]
impl Capability for MetaAnalyzer {
    fn id(&self) -> CapabilityId {
        CapabilityId::Meta
    }

    async fn compute(
        &self,
        ctx: CapabilityContext,
    ) -> Result<CapabilityOutput, CapabilityError> {
        let page = ctx.page()?;
        let keywords = ctx.dependency(CapabilityId::Keyword)?;
        let top_term = keywords["keywords"][0]["term"].as_str().unwrap_or("");

        let mut issues: Vec<String> = Vec::new();

        let title_len = page.title.as_deref().map(str::len).unwrap_or(0);
        match &page.title {
            None => issues.push("missing <title>".to_string()),
            Some(title) => {
                if !TITLE_RANGE.contains(&title.len()) {
                    issues.push(format!(
                        "title length {} outside {}-{} characters",
                        title.len(),
                        TITLE_RANGE.start(),
                        TITLE_RANGE.end()
                    ));
                }
                if !top_term.is_empty() && !title.to_lowercase().contains(top_term) {
                    issues.push(format!("top keyword \"{top_term}\" missing from title"));
                }
            }
        }

        let description_len = page.description.as_deref().map(str::len).unwrap_or(0);
        match &page.description {
            None => issues.push("missing meta description".to_string()),
            Some(description) => {
                if !DESCRIPTION_RANGE.contains(&description.len()) {
                    issues.push(format!(
                        "description length {} outside {}-{} characters",
                        description.len(),
                        DESCRIPTION_RANGE.start(),
                        DESCRIPTION_RANGE.end()
                    ));
                }
            }
        }

        Ok(CapabilityOutput::Analysis(json!({
            "title": page.title,
            "title_length": title_len,
            "description_length": description_len,
            "issues": issues,
        })))
    }
}
