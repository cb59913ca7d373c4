//! The crawl capability: fetches the target page over HTTP

use std::sync::Arc;
use std::time::Instant;

use async_trait::async_trait;
use serde_json::json;
use tracing::debug;

use sitewarden_core::{CapabilityError, CapabilityId, CrawlerConfig, Result, SitewardenError};
use sitewarden_engine::{Capability, CapabilityContext, CapabilityOutput};

use crate::page::parse_page;

/// Fetches a URL and extracts structured page data.
///
/// This is the foundational capability: when it fails the whole target
/// is aborted by the coordinator.
pub struct HttpCrawler {
    client: reqwest::Client,
}

impl HttpCrawler {
    /// Build a crawler from configuration
    pub fn new(config: &CrawlerConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(config.user_agent.clone())
            .timeout(config.request_timeout())
            .build()
            .map_err(|e| SitewardenError::other(format!("failed to build HTTP client: {e}")))?;
        Ok(Self { client })
    }
}

#[async_trait]
impl Capability for HttpCrawler {
    fn id(&self) -> CapabilityId {
        CapabilityId::Crawl
    }

    async fn compute(&self, ctx: CapabilityContext) -> std::result::Result<CapabilityOutput, CapabilityError> {
        let started = Instant::now();

        let response = self
            .client
            .get(ctx.target.clone())
            .send()
            .await
            .map_err(|e| CapabilityError::Fetch(e.to_string()))?;

        let status = response.status().as_u16();
        let final_url = response.url().to_string();
        if status >= 400 {
            return Err(CapabilityError::Fetch(format!(
                "HTTP {status} for {final_url}"
            )));
        }

        let body = response
            .text()
            .await
            .map_err(|e| CapabilityError::Fetch(e.to_string()))?;

        let mut page = parse_page(&final_url, status, &body);
        page.elapsed_ms = started.elapsed().as_millis() as u64;
        debug!(
            url = %final_url,
            status,
            words = page.word_count,
            elapsed_ms = page.elapsed_ms,
            "page crawled"
        );

        let summary = json!({
            "url": page.url,
            "status": page.status,
            "title": page.title,
            "word_count": page.word_count,
            "elapsed_ms": page.elapsed_ms,
        });
        Ok(CapabilityOutput::Page {
            page: Arc::new(page),
            summary,
        })
    }
}
