//! Aggregate report: overall score and prioritized recommendations

use async_trait::async_trait;
use serde_json::{json, Value};

use sitewarden_core::{CapabilityError, CapabilityId};
use sitewarden_engine::{Capability, CapabilityContext, CapabilityOutput};

/// Folds keyword, technical and meta findings into one scored report
pub struct ReportAnalyzer;

#[async_trait]
impl Capability for ReportAnalyzer {
    fn id(&self) -> CapabilityId {
        CapabilityId::Report
    }

    async fn compute(
        &self,
        ctx: CapabilityContext,
    ) -> Result<CapabilityOutput, CapabilityError> {
        let page = ctx.page()?;
        let keywords = ctx.dependency(CapabilityId::Keyword)?;
        let technical = ctx.dependency(CapabilityId::Technical)?;
        let meta = ctx.dependency(CapabilityId::Meta)?;

        let mut recommendations: Vec<Value> = Vec::new();

        for check in technical["checks"].as_array().into_iter().flatten() {
            if !check["passed"].as_bool().unwrap_or(true) {
                recommendations.push(recommendation(
                    CapabilityId::Technical,
                    "high",
                    format!(
                        "fix {}: {}",
                        check["name"].as_str().unwrap_or("check"),
                        check["detail"].as_str().unwrap_or("")
                    ),
                ));
            }
        }

        for issue in meta["issues"].as_array().into_iter().flatten() {
            recommendations.push(recommendation(
                CapabilityId::Meta,
                "medium",
                issue.as_str().unwrap_or("").to_string(),
            ));
        }

        if keywords["keywords"].as_array().map(Vec::len).unwrap_or(0) == 0 {
            recommendations.push(recommendation(
                CapabilityId::Keyword,
                "low",
                "no recurring keywords found, the page may lack topical focus".to_string(),
            ));
        }

        let technical_score = technical["score"].as_u64().unwrap_or(0);
        let meta_issues = meta["issues"].as_array().map(Vec::len).unwrap_or(0) as u64;
        let meta_score = 100u64.saturating_sub(meta_issues * 25);
        let score = (technical_score + meta_score) / 2;

        Ok(CapabilityOutput::Analysis(json!({
            "url": page.url,
            "score": score,
            "technical_score": technical_score,
            "meta_score": meta_score,
            "recommendations": recommendations,
        })))
    }
}

fn recommendation(capability: CapabilityId, priority: &str, message: String) -> Value {
    json!({
        "capability": capability,
        "priority": priority,
        "message": message,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use sitewarden_core::PageData;

    fn ctx_with(
        keywords: serde_json::Value,
        technical: serde_json::Value,
        meta: serde_json::Value,
    ) -> CapabilityContext {
        let prior = std::collections::BTreeMap::from([
            (CapabilityId::Keyword, keywords),
            (CapabilityId::Technical, technical),
            (CapabilityId::Meta, meta),
        ]);
        CapabilityContext::new("https://example.com".parse().unwrap())
            .with_page(Arc::new(PageData::new("https://example.com", 200)))
            .with_prior(prior)
    }

    #[tokio::test]
    async fn test_clean_inputs_produce_full_score() {
        let ctx = ctx_with(
            json!({ "keywords": [{ "term": "rust", "count": 3 }] }),
            json!({ "score": 100, "checks": [] }),
            json!({ "issues": [] }),
        );
        let output = ReportAnalyzer.compute(ctx).await.unwrap();

        assert_eq!(output.summary()["score"], 100);
        assert!(output.summary()["recommendations"].as_array().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_failures_become_prioritized_recommendations() {
        let ctx = ctx_with(
            json!({ "keywords": [] }),
            json!({
                "score": 50,
                "checks": [
                    { "name": "https", "passed": false, "detail": "scheme is http" },
                    { "name": "status_ok", "passed": true, "detail": "HTTP 200" },
                ],
            }),
            json!({ "issues": ["missing <title>"] }),
        );
        let output = ReportAnalyzer.compute(ctx).await.unwrap();
        let value = output.summary();

        let recs = value["recommendations"].as_array().unwrap();
        assert_eq!(recs.len(), 3);
        assert_eq!(recs[0]["priority"], "high");
        assert_eq!(recs[0]["capability"], "technical");
        assert_eq!(recs[1]["priority"], "medium");
        assert_eq!(recs[2]["priority"], "low");
        // (50 + 75) / 2
        assert_eq!(value["score"], 62);
    }

    #[tokio::test]
    async fn test_requires_all_three_dependencies() {
        let prior = std::collections::BTreeMap::from([(
            CapabilityId::Keyword,
            json!({ "keywords": [] }),
        )]);
        let ctx = CapabilityContext::new("https://example.com".parse().unwrap())
            .with_page(Arc::new(PageData::new("https://example.com", 200)))
            .with_prior(prior);

        let err = ReportAnalyzer.compute(ctx).await.unwrap_err();
        assert!(matches!(
            err,
            CapabilityError::MissingDependency(CapabilityId::Technical)
        ));
    }
}
