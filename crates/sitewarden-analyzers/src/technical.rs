//! Technical health checks

use async_trait::async_trait;
use serde_json::{json, Value};

use sitewarden_core::{CapabilityError, CapabilityId, PageData};
use sitewarden_engine::{Capability, CapabilityContext, CapabilityOutput};

const MIN_WORDS: usize = 300;

/// Pass/fail checks over protocol, status and document structure
pub struct TechnicalAnalyzer;

#[async_trait]
impl Capability for TechnicalAnalyzer {
    fn id(&self) -> CapabilityId {
        CapabilityId::Technical
    }

    async fn compute(
        &self,
        ctx: CapabilityContext,
    ) -> Result<CapabilityOutput, CapabilityError> {
        let page = ctx.page()?;
        let checks = run_checks(&ctx.target, page);
        let passed = checks
            .iter()
            .filter(|c| c["passed"].as_bool().unwrap_or(false))
            .count();
        let score = passed * 100 / checks.len().max(1);

        Ok(CapabilityOutput::Analysis(json!({
            "score": score,
            "passed": passed,
            "total": checks.len(),
            "checks": checks,
        })))
    }
}

fn check(name: &str, passed: bool, detail: String) -> Value {
    json!({ "name": name, "passed": passed, "detail": detail })
}

/// The full check list for one page
pub fn run_checks(target: &url::Url, page: &PageData) -> Vec<Value> {
    let h1_count = page.headings.iter().filter(|h| h.level == 1).count();

    vec![
        check(
            "https",
            target.scheme() == "https",
            format!("scheme is {}", target.scheme()),
        ),
        check("status_ok", page.status == 200, format!("HTTP {}", page.status)),
        check(
            "has_title",
            page.title.is_some(),
            page.title.clone().unwrap_or_else(|| "missing".to_string()),
        ),
        check(
            "has_canonical",
            page.canonical.is_some(),
            page.canonical
                .clone()
                .unwrap_or_else(|| "missing".to_string()),
        ),
        check(
            "single_h1",
            h1_count == 1,
            format!("{h1_count} h1 headings"),
        ),
        check(
            "sufficient_content",
            page.word_count >= MIN_WORDS,
            format!("{} words", page.word_count),
        ),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use sitewarden_core::Heading;

    fn healthy_page() -> PageData {
        let mut page = PageData::new("https://example.com/", 200);
        page.title = Some("A title".to_string());
        page.canonical = Some("https://example.com/".to_string());
        page.headings.push(Heading {
            level: 1,
            text: "One".to_string(),
        });
        page.word_count = 500;
        page
    }

    #[tokio::test]
    async fn test_healthy_page_scores_full() {
        let ctx = CapabilityContext::new("https://example.com/".parse().unwrap())
            .with_page(Arc::new(healthy_page()));
        let output = TechnicalAnalyzer.compute(ctx).await.unwrap();
        let value = output.summary();

        assert_eq!(value["score"], 100);
        assert_eq!(value["passed"], value["total"]);
    }

    #[tokio::test]
    async fn test_failing_checks_lower_the_score() {
        let mut page = healthy_page();
        page.canonical = None;
        page.headings.push(Heading {
            level: 1,
            text: "Two".to_string(),
        });

        let ctx = CapabilityContext::new("http://example.com/".parse().unwrap())
            .with_page(Arc::new(page));
        let output = TechnicalAnalyzer.compute(ctx).await.unwrap();
        let value = output.summary();

        // https, canonical and single_h1 all fail
        assert_eq!(value["passed"], 3);
        assert_eq!(value["score"], 50);
    }
}
