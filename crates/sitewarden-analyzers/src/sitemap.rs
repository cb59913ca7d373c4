//! Sitemap expansion: one site URL into a list of audit targets

use regex::Regex;
use std::sync::OnceLock;
use tracing::{debug, warn};
use url::Url;

use sitewarden_core::{CrawlerConfig, Result, SitewardenError};

fn loc_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?is)<loc>\s*(.*?)\s*</loc>").expect("static regex"))
}

/// Expands a target into the URL list from its sitemap.
///
/// Runs once, upstream of the driver. Best-effort: any fetch or parse
/// problem falls back to auditing the bare target.
pub struct SitemapExpander {
    client: reqwest::Client,
    max_targets: usize,
}

impl SitemapExpander {
    pub fn new(config: &CrawlerConfig, max_targets: usize) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(config.user_agent.clone())
            .timeout(config.request_timeout())
            .build()
            .map_err(|e| SitewardenError::other(format!("failed to build HTTP client: {e}")))?;
        Ok(Self {
            client,
            max_targets,
        })
    }

    /// Expand a target URL into sitemap entries, capped at `max_targets`
    pub async fn expand(&self, target: &Url) -> Vec<Url> {
        let sitemap_url = if target.path().ends_with(".xml") {
            target.clone()
        } else {
            match target.join("/sitemap.xml") {
                Ok(url) => url,
                Err(_) => return vec![target.clone()],
            }
        };

        match self.fetch(&sitemap_url).await {
            Ok(body) => {
                let mut urls = parse_locations(&body);
                if urls.is_empty() {
                    debug!(sitemap = %sitemap_url, "sitemap had no entries, auditing target only");
                    return vec![target.clone()];
                }
                urls.truncate(self.max_targets);
                debug!(sitemap = %sitemap_url, targets = urls.len(), "sitemap expanded");
                urls
            }
            Err(err) => {
                warn!(sitemap = %sitemap_url, error = %err, "sitemap fetch failed, auditing target only");
                vec![target.clone()]
            }
        }
    }

    async fn fetch(&self, url: &Url) -> std::result::Result<String, reqwest::Error> {
        self.client
            .get(url.clone())
            .send()
            .await?
            .error_for_status()?
            .text()
            .await
    }
}

/// Extract `<loc>` entries that parse as URLs
fn parse_locations(body: &str) -> Vec<Url> {
    loc_re()
        .captures_iter(body)
        .filter_map(|c| c[1].trim().parse().ok())
        .collect()
}
