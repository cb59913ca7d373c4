//! Cross-checks the technical results against the raw page data

use async_trait::async_trait;
use serde_json::json;

use sitewarden_core::{CapabilityError, CapabilityId};
use sitewarden_engine::{Capability, CapabilityContext, CapabilityOutput};

/// Sanity-checks the technical report for internal consistency
pub struct ValidationAnalyzer;

#[async_trait]
impl Capability for ValidationAnalyzer {
    fn id(&self) -> CapabilityId {
        CapabilityId::Validation
    }

    async fn compute(
        &self,
        ctx: CapabilityContext,
    ) -> Result<CapabilityOutput, CapabilityError> {
        let page = ctx.page()?;
        let technical = ctx.dependency(CapabilityId::Technical)?;

        let mut problems: Vec<String> = Vec::new();

        let checks = technical["checks"].as_array().cloned().unwrap_or_default();
        let passed = checks
            .iter()
            .filter(|c| c["passed"].as_bool().unwrap_or(false))
            .count();
        let reported_passed = technical["passed"].as_u64().unwrap_or(0) as usize;
        if passed != reported_passed {
            problems.push(format!(
                "reported pass count {reported_passed} disagrees with checks ({passed})"
            ));
        }

        let reported_score = technical["score"].as_u64().unwrap_or(0) as usize;
        let expected_score = passed * 100 / checks.len().max(1);
        if reported_score != expected_score {
            problems.push(format!(
                "score {reported_score} does not match {passed}/{} checks",
                checks.len()
            ));
        }

        let empty_links = page.links.iter().filter(|l| l.trim().is_empty()).count();
        if empty_links > 0 {
            problems.push(format!("{empty_links} links with an empty href"));
        }

        Ok(CapabilityOutput::Analysis(json!({
            "consistent": problems.is_empty(),
            "checks_reviewed": checks.len(),
            "problems": problems,
        })))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use sitewarden_core::PageData;

    fn ctx_with(page: PageData, technical: serde_json::Value) -> CapabilityContext {
        let prior = std::collections::BTreeMap::from([(CapabilityId::Technical, technical)]);
        CapabilityContext::new("https://example.com".parse().unwrap())
            .with_page(Arc::new(page))
            .with_prior(prior)
    }

    #[tokio::test]
    async fn test_consistent_report_passes() {
        let technical = json!({
            "score": 50,
            "passed": 1,
            "checks": [
                { "name": "https", "passed": true },
                { "name": "status_ok", "passed": false },
            ],
        });
        let output = ValidationAnalyzer
            .compute(ctx_with(PageData::new("https://example.com", 200), technical))
            .await
            .unwrap();

        assert_eq!(output.summary()["consistent"], true);
        assert_eq!(output.summary()["checks_reviewed"], 2);
    }

    #[tokio::test]
    async fn test_mismatched_counts_are_flagged() {
        let technical = json!({
            "score": 100,
            "passed": 2,
            "checks": [{ "name": "https", "passed": true }],
        });
        let mut page = PageData::new("https://example.com", 200);
        page.links = vec!["".to_string(), "/about".to_string()];

        let output = ValidationAnalyzer
            .compute(ctx_with(page, technical))
            .await
            .unwrap();
        let value = output.summary();

        assert_eq!(value["consistent"], false);
        let problems = value["problems"].as_array().unwrap();
        assert!(problems.iter().any(|p| p.as_str().unwrap().contains("pass count")));
        assert!(problems.iter().any(|p| p.as_str().unwrap().contains("empty href")));
    }
}
